//! Render-aware parsing against scripted sessions

use crate::common::{fast_config, ScriptedSession, SessionLog};
use ripple_parse::config::{Config, DEFAULT_MAX_DOWNLOAD_SIZE};
use ripple_parse::render::{Locator, WorkerId};
use ripple_parse::{
    ContentError, ContentParser, DynamicContentParser, Page, ParseError, RenderSessionRegistry,
    WaitStrategy,
};
use std::sync::Arc;
use std::thread;

const SHELL: &str = r#"<html><body><div id="app"></div><script src="/app.js"></script></body></html>"#;

const RENDERED: &str = r#"<html><head><title>Dashboard</title></head><body>
<div id="app"><a href="/reports">Reports</a><a href="javascript:void(0)">Menu</a></div>
</body></html>"#;

fn parser(registry: &Arc<RenderSessionRegistry>, max_download_size: usize) -> DynamicContentParser {
    DynamicContentParser::new(
        fast_config(max_download_size),
        Arc::clone(registry),
        WaitStrategy::locator(Locator::Css("#app a".into())),
    )
}

fn shell_page() -> Page {
    Page::new("http://h.example/app/", SHELL).with_content_type("text/html")
}

#[test]
fn test_parses_rendered_source() {
    let log = Arc::new(SessionLog::default());
    let registry = Arc::new(RenderSessionRegistry::new());
    let worker = WorkerId::new("worker-1");
    registry.bind(worker.clone(), ScriptedSession::new(RENDERED, &log).boxed());

    let mut page = shell_page();
    let result = parser(&registry, DEFAULT_MAX_DOWNLOAD_SIZE)
        .parse_as(&worker, &mut page, "http://h.example/app/")
        .unwrap();

    assert_eq!(log.visited(), vec!["http://h.example/app/"]);
    assert_eq!(result.title.as_deref(), Some("Dashboard"));
    assert_eq!(result.link_urls(), vec!["http://h.example/reports"]);
    assert_eq!(page.content, RENDERED.as_bytes());
}

#[test]
fn test_missing_session_is_content_error() {
    let registry = Arc::new(RenderSessionRegistry::new());
    let mut page = shell_page();

    let err = parser(&registry, DEFAULT_MAX_DOWNLOAD_SIZE)
        .parse_as(&WorkerId::new("never-started"), &mut page, "http://h.example/app/")
        .unwrap_err();

    assert!(err.is_setup_defect());
    assert!(matches!(
        err,
        ParseError::Content {
            source: ContentError::NoSession(_),
            ..
        }
    ));
    assert_eq!(page.content, SHELL.as_bytes());
}

#[test]
fn test_wait_timeout_still_parses() {
    let log = Arc::new(SessionLog::default());
    let registry = Arc::new(RenderSessionRegistry::new());
    let worker = WorkerId::new("worker-1");
    registry.bind(
        worker.clone(),
        ScriptedSession::new(RENDERED, &log).never_ready().boxed(),
    );

    let mut page = shell_page();
    let result = parser(&registry, DEFAULT_MAX_DOWNLOAD_SIZE)
        .parse_as(&worker, &mut page, "http://h.example/app/")
        .unwrap();

    assert_eq!(result.link_urls(), vec!["http://h.example/reports"]);
}

#[test]
fn test_predicate_strategy() {
    let log = Arc::new(SessionLog::default());
    let registry = Arc::new(RenderSessionRegistry::new());
    let worker = WorkerId::new("worker-1");
    registry.bind(worker.clone(), ScriptedSession::new(RENDERED, &log).boxed());

    let parser = DynamicContentParser::new(
        fast_config(DEFAULT_MAX_DOWNLOAD_SIZE),
        Arc::clone(&registry),
        WaitStrategy::predicate(|_, page, session| {
            page.url.ends_with("/app/")
                && session
                    .evaluate("return !!window.appReady")
                    .map(|ready| ready.as_bool() == Some(true))
                    .unwrap_or(false)
        }),
    );

    let mut page = shell_page();
    let context = page.url.clone();
    let result = parser.parse_as(&worker, &mut page, &context).unwrap();
    assert_eq!(result.title.as_deref(), Some("Dashboard"));
}

#[test]
fn test_oversized_render_skipped_and_session_survives() {
    let log = Arc::new(SessionLog::default());
    let registry = Arc::new(RenderSessionRegistry::new());
    let worker = WorkerId::new("worker-1");
    registry.bind(worker.clone(), ScriptedSession::new(RENDERED, &log).boxed());

    let small = parser(&registry, 16);
    let mut page = shell_page();
    let err = small
        .parse_as(&worker, &mut page, "http://h.example/app/")
        .unwrap_err();

    match err {
        ParseError::PageTooLarge { size, max, .. } => {
            assert_eq!(size, RENDERED.len());
            assert_eq!(max, 16);
        }
        other => panic!("expected PageTooLarge, got {:?}", other),
    }
    assert_eq!(page.content, SHELL.as_bytes());

    // The next page on the same worker still renders
    let mut next = shell_page();
    let result = parser(&registry, DEFAULT_MAX_DOWNLOAD_SIZE)
        .parse_as(&worker, &mut next, "http://h.example/app/")
        .unwrap();
    assert_eq!(result.link_urls(), vec!["http://h.example/reports"]);
    assert_eq!(log.closes(), 0);
}

#[test]
fn test_exact_size_limit_allowed() {
    let log = Arc::new(SessionLog::default());
    let registry = Arc::new(RenderSessionRegistry::new());
    let worker = WorkerId::new("worker-1");
    registry.bind(worker.clone(), ScriptedSession::new(RENDERED, &log).boxed());

    let mut page = shell_page();
    assert!(parser(&registry, RENDERED.len())
        .parse_as(&worker, &mut page, "http://h.example/app/")
        .is_ok());
}

#[test]
fn test_navigation_failure_keeps_binding() {
    let log = Arc::new(SessionLog::default());
    let registry = Arc::new(RenderSessionRegistry::new());
    let worker = WorkerId::new("worker-1");
    registry.bind(
        worker.clone(),
        ScriptedSession::new(RENDERED, &log).failing_navigation().boxed(),
    );

    let mut page = shell_page();
    let err = parser(&registry, DEFAULT_MAX_DOWNLOAD_SIZE)
        .parse_as(&worker, &mut page, "http://h.example/app/")
        .unwrap_err();

    assert!(matches!(
        err,
        ParseError::Content {
            source: ContentError::Render(_),
            ..
        }
    ));
    assert!(!err.is_setup_defect());
    assert!(registry.is_bound(&worker));
}

#[test]
fn test_rendered_source_encoded_with_declared_charset() {
    let log = Arc::new(SessionLog::default());
    let registry = Arc::new(RenderSessionRegistry::new());
    let worker = WorkerId::new("worker-1");
    let rendered = "<html><head><title>Caf\u{e9}</title></head><body></body></html>";
    registry.bind(worker.clone(), ScriptedSession::new(rendered, &log).boxed());

    let mut page = shell_page().with_charset("windows-1252");
    let result = parser(&registry, DEFAULT_MAX_DOWNLOAD_SIZE)
        .parse_as(&worker, &mut page, "http://h.example/app/")
        .unwrap();

    assert!(page.content.windows(4).any(|w| w == b"Caf\xe9"));
    assert_eq!(result.content_charset, "windows-1252");
    assert!(result.html.contains("Caf\u{e9}"));
}

#[test]
fn test_undeclared_render_uses_default_charset_throughout() {
    let log = Arc::new(SessionLog::default());
    let registry = Arc::new(RenderSessionRegistry::new());
    let worker = WorkerId::new("worker-1");
    let rendered = "<html><head><title>Caf\u{e9}</title></head><body>Caf\u{e9} menu</body></html>";
    registry.bind(worker.clone(), ScriptedSession::new(rendered, &log).boxed());

    let mut config = Config::clone(&fast_config(DEFAULT_MAX_DOWNLOAD_SIZE));
    config.parser.default_charset = "windows-1252".to_string();
    let parser = DynamicContentParser::new(
        Arc::new(config),
        Arc::clone(&registry),
        WaitStrategy::locator(Locator::TagName("body".into())),
    );

    let mut page = Page::new("http://h.example/app/", SHELL);
    let result = parser
        .parse_as(&worker, &mut page, "http://h.example/app/")
        .unwrap();

    assert!(page.content.windows(4).any(|w| w == b"Caf\xe9"));
    assert_eq!(result.content_charset, "windows-1252");
    assert_eq!(result.title.as_deref(), Some("Caf\u{e9}"));
    assert_eq!(result.text, "Caf\u{e9} menu");
    assert!(result.html.contains("<title>Caf\u{e9}</title>"));
}

#[test]
fn test_each_worker_thread_uses_its_own_session() {
    let registry = Arc::new(RenderSessionRegistry::new());
    let parser = Arc::new(parser(&registry, DEFAULT_MAX_DOWNLOAD_SIZE));

    let handles: Vec<_> = (0..6)
        .map(|i| {
            let registry = Arc::clone(&registry);
            let parser = Arc::clone(&parser);
            thread::spawn(move || {
                let log = Arc::new(SessionLog::default());
                let rendered = format!(r#"<html><body><a href="/from-worker-{}">x</a></body></html>"#, i);
                let session = ScriptedSession::new(rendered, &log).boxed();
                registry.bind(WorkerId::current(), session);

                for _ in 0..5 {
                    let mut page = shell_page();
                    let result = parser.parse(&mut page, "http://h.example/").unwrap();
                    assert_eq!(
                        result.link_urls(),
                        vec![format!("http://h.example/from-worker-{}", i)]
                    );
                }

                registry.release(&WorkerId::current()).unwrap();
                assert_eq!(log.closes(), 1);
                assert_eq!(log.visited().len(), 5);
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    assert!(registry.is_empty());
}

#[test]
fn test_thread_without_binding_cannot_borrow_another_session() {
    let log = Arc::new(SessionLog::default());
    let registry = Arc::new(RenderSessionRegistry::new());
    registry.bind(WorkerId::current(), ScriptedSession::new(RENDERED, &log).boxed());
    let parser = Arc::new(parser(&registry, DEFAULT_MAX_DOWNLOAD_SIZE));

    let other = {
        let parser = Arc::clone(&parser);
        thread::spawn(move || {
            let mut page = shell_page();
            parser
                .parse(&mut page, "http://h.example/")
                .map(|_| ())
                .map_err(|e| e.is_setup_defect())
        })
    };

    assert_eq!(other.join().unwrap(), Err(true));
    assert!(log.visited().is_empty());
}
