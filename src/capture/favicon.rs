//! Best-effort favicon lookup for captured pages

use url::Url;

/// Link relations checked in order of preference
const ICON_RELS: [&str; 3] = ["icon", "shortcut icon", "apple-touch-icon"];

/// An icon `<link>` declared by the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconLink {
    pub rel: String,
    pub href: String,
}

impl IconLink {
    pub fn new(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            rel: rel.into(),
            href: href.into(),
        }
    }
}

/// Pick the page's icon URL.
///
/// Declared links win in `icon`, `shortcut icon`, `apple-touch-icon` order.
/// Without one, the conventional `/favicon.ico` at the page origin is used.
/// Returns `None` when nothing can be derived.
pub fn resolve_favicon(page_url: &str, links: &[IconLink]) -> Option<String> {
    let base = Url::parse(page_url).ok();

    for rel in ICON_RELS {
        let declared = links
            .iter()
            .find(|link| link.rel.trim().eq_ignore_ascii_case(rel) && !link.href.trim().is_empty());

        if let Some(link) = declared {
            let href = link.href.trim();
            let resolved = match &base {
                Some(base) => base.join(href).map(String::from).unwrap_or_else(|_| href.to_string()),
                None => href.to_string(),
            };
            return Some(resolved);
        }
    }

    base.and_then(|url| default_favicon(&url))
}

fn default_favicon(url: &Url) -> Option<String> {
    let origin = url.origin();
    if !origin.is_tuple() {
        return None;
    }
    Some(format!("{}/favicon.ico", origin.ascii_serialization()))
}
