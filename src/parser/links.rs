//! Outgoing link extraction
//!
//! Turns raw link candidates into a bounded set of canonical links.

use crate::parser::charset;
use crate::parser::{ExtractedLink, RawAnchor};
use crate::url::canonicalize_url;
use std::collections::HashSet;
use tracing::trace;

/// Substrings (matched case-insensitively) that disqualify an href
const REJECTED_HREF_PATTERNS: &[&str] = &["javascript:", "mailto:", "@"];

/// Extracts canonical outgoing links from raw candidates
///
/// Candidates are processed in source order:
///
/// **Dropped:**
/// - Missing, empty or whitespace-only hrefs
/// - Hrefs containing `javascript:`, `mailto:` or `@` (any letter case)
/// - Hrefs that fail canonicalization (silently, not an error)
/// - Repeats of an already accepted canonical URL; the first occurrence keeps
///   its tag, anchor text and attributes
///
/// Extraction stops as soon as `max_links` links have been accepted.
///
/// # Arguments
///
/// * `candidates` - Raw candidates in source order
/// * `context_url` - URL relative hrefs are resolved against
/// * `charset` - Page charset label used for query encoding; blank or unknown
///   labels fall back to UTF-8
/// * `max_links` - Maximum number of links returned
pub fn extract_links(
    candidates: &[RawAnchor],
    context_url: &str,
    charset: &str,
    max_links: usize,
) -> Vec<ExtractedLink> {
    let mut links = Vec::new();
    if max_links == 0 {
        return links;
    }

    let encoding = charset::lookup(charset).unwrap_or(encoding_rs::UTF_8);
    let mut seen = HashSet::new();

    for candidate in candidates {
        let Some(href) = candidate.href.as_deref() else {
            continue;
        };
        let href = href.trim();
        if href.is_empty() {
            continue;
        }

        let lowered = href.to_lowercase();
        if REJECTED_HREF_PATTERNS
            .iter()
            .any(|pattern| lowered.contains(pattern))
        {
            trace!("Skipping non-crawlable href: {}", href);
            continue;
        }

        let url = match canonicalize_url(href, context_url, encoding) {
            Ok(url) => url.to_string(),
            Err(e) => {
                trace!("Dropping href {}: {}", href, e);
                continue;
            }
        };

        if !seen.insert(url.clone()) {
            continue;
        }

        links.push(ExtractedLink {
            url,
            tag: candidate.tag.clone(),
            anchor: candidate.anchor_text.clone(),
            attributes: candidate.attributes.clone(),
        });

        if links.len() >= max_links {
            break;
        }
    }

    links
}
