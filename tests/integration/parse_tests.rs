//! End-to-end static parsing

use ripple_parse::config::ParserConfig;
use ripple_parse::{ContentParser, Page, StaticContentParser};

const ARTICLE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="description" content="A page about crawling">
  <meta property="og:type" content="article">
  <title>
    Crawling 101
  </title>
  <link rel="stylesheet" href="/static/site.css">
  <style>.hero { background: url("../img/hero.jpg") }</style>
</head>
<body>
  <nav>
    <a href="/">Home</a>
    <a href="/docs/">Docs</a>
    <a href="javascript:void(0)">Menu</a>
    <a href="mailto:webmaster@h.example">Contact</a>
  </nav>
  <h1>Crawling 101</h1>
  <p>Crawlers follow <a href="intro.html#part-2">links</a>.</p>
  <img src="/img/diagram.png" alt="diagram">
  <a href="/docs/">Docs again</a>
  <a href="HTTP://H.EXAMPLE:80/search?b=2&a=1">Search</a>
  <script>document.write("not text");</script>
</body>
</html>"#;

fn parse(page: &mut Page) -> ripple_parse::ParseResult {
    StaticContentParser::new(&ParserConfig::default())
        .parse(page, "http://h.example/guide/index.html")
        .unwrap()
}

#[test]
fn test_article_page() {
    let mut page = Page::new("http://h.example/guide/index.html", ARTICLE)
        .with_content_type("text/html; charset=utf-8");
    let result = parse(&mut page);

    assert_eq!(result.title.as_deref(), Some("Crawling 101"));
    assert!(result.text.starts_with("Home Docs Menu Contact Crawling 101"));
    assert!(!result.text.contains("not text"));
    assert_eq!(
        result.meta_tags.get("description").map(String::as_str),
        Some("A page about crawling")
    );
    assert_eq!(result.meta_tags.get("og:type").map(String::as_str), Some("article"));
    assert_eq!(result.content_charset, "utf-8");

    assert_eq!(
        result.link_urls(),
        vec![
            "http://h.example/static/site.css",
            "http://h.example/img/hero.jpg",
            "http://h.example/",
            "http://h.example/docs/",
            "http://h.example/guide/intro.html",
            "http://h.example/img/diagram.png",
            "http://h.example/search?a=1&b=2",
        ]
    );

    let docs = &result.outgoing_links[3];
    assert_eq!(docs.tag, "a");
    assert_eq!(docs.anchor, "Docs");
}

#[test]
fn test_results_are_independent_per_call() {
    let parser = StaticContentParser::new(&ParserConfig::default());

    let mut first = Page::new("http://a.example/", r#"<a href="/one">1</a>"#);
    let mut second = Page::new("http://b.example/", r#"<a href="/two">2</a>"#);

    let a = parser.parse_page(&mut first).unwrap();
    let b = parser.parse_page(&mut second).unwrap();
    assert_eq!(a.link_urls(), vec!["http://a.example/one"]);
    assert_eq!(b.link_urls(), vec!["http://b.example/two"]);
}

#[test]
fn test_parser_shared_across_threads() {
    let parser = std::sync::Arc::new(StaticContentParser::new(&ParserConfig::default()));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let parser = std::sync::Arc::clone(&parser);
            std::thread::spawn(move || {
                let mut page = Page::new(
                    format!("http://h{}.example/", i),
                    format!(r#"<a href="/p{}">p</a>"#, i),
                );
                let result = parser.parse_page(&mut page).unwrap();
                assert_eq!(
                    result.link_urls(),
                    vec![format!("http://h{}.example/p{}", i, i)]
                );
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_legacy_charset_page() {
    let mut page = Page::new(
        "http://h.example/",
        b"<html><head><title>Caf\xe9</title></head><body><a href=\"/s?q=cr\xe8me\">x</a></body></html>"
            .to_vec(),
    )
    .with_content_type("text/html; charset=windows-1252")
    .with_charset("windows-1252");

    let result = StaticContentParser::new(&ParserConfig::default())
        .parse_page(&mut page)
        .unwrap();

    assert_eq!(result.title.as_deref(), Some("Caf\u{e9}"));
    assert!(result.html.contains("Caf\u{e9}"));
    assert_eq!(result.link_urls(), vec!["http://h.example/s?q=cr%E8me"]);
}

#[test]
fn test_stylesheet_page_with_embedded_data_urls() {
    let css = r#"
.navbar-toggler-icon{background-image:url("data:image/svg+xml,%3csvg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 30 30'%3e%3cpath stroke='rgba(0, 0, 0, 0.55)' d='M4 7h22'/%3e%3c/svg%3e")}
@font-face{font-family:'Sanchez';src:url(https://fonts.gstatic.com/s/sanchez/v13/Ycm2sZJORluHnXbIfmdR_Tk.woff2) format('woff2')}
.logo{background:url('../img/logo.svg')}
"#;
    let mut page = Page::new("http://www.test.com/path/to/bootstrap.min.css", css)
        .with_content_type("text/css");

    let result = StaticContentParser::new(&ParserConfig::default())
        .parse_page(&mut page)
        .unwrap();

    assert_eq!(
        result.link_urls(),
        vec![
            "https://fonts.gstatic.com/s/sanchez/v13/Ycm2sZJORluHnXbIfmdR_Tk.woff2",
            "http://www.test.com/path/img/logo.svg",
        ]
    );
    assert!(result.outgoing_links.iter().all(|link| link.tag == "style"));
}
