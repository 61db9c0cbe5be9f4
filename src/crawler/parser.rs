//! HTML extraction for internal pages
//!
//! Pulls the fields the metadata record needs out of a rendered page:
//! anchors, title, meta description, social fields, and per-resource-type
//! URL lists.

use crate::metadata::ResourceLists;
use scraper::{Html, Selector};
use std::collections::BTreeMap;
use url::Url;

/// Everything extracted from one page
#[derive(Debug, Clone, Default)]
pub struct ExtractedPage {
    /// The page title (from the <title> tag)
    pub title: Option<String>,

    /// Meta description content
    pub description: Option<String>,

    /// og:* and twitter:* meta fields keyed by property name
    pub social: BTreeMap<String, String>,

    /// All followable links found on the page (absolute URLs, raw form)
    pub anchors: Vec<String>,

    /// Sub-resource URLs grouped by type
    pub resources: ResourceLists,
}

/// Parses HTML content and extracts anchors plus metadata fields
///
/// # Link Extraction Rules
///
/// **Include:** `<a href="...">` anywhere in the document.
///
/// **Exclude:** anchors with the `download` attribute; `javascript:`,
/// `mailto:`, `tel:` links; data URIs; hrefs that fail to resolve against
/// the base URL.
pub fn extract_page(html: &str, base_url: &Url) -> ExtractedPage {
    let document = Html::parse_document(html);

    ExtractedPage {
        title: extract_title(&document),
        description: extract_description(&document),
        social: extract_social(&document),
        anchors: extract_anchors(&document, base_url),
        resources: extract_resources(&document, base_url),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;

    document
        .select(&selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts the meta description
fn extract_description(document: &Html) -> Option<String> {
    let selector = Selector::parse("meta[name='description'][content]").ok()?;

    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts og:* and twitter:* meta fields
fn extract_social(document: &Html) -> BTreeMap<String, String> {
    let mut social = BTreeMap::new();

    let Ok(selector) = Selector::parse("meta[content]") else {
        return social;
    };

    for element in document.select(&selector) {
        let value = element.value();
        let key = value.attr("property").or_else(|| value.attr("name"));
        let Some(key) = key else { continue };

        if key.starts_with("og:") || key.starts_with("twitter:") {
            if let Some(content) = value.attr("content") {
                // First occurrence wins for repeated properties
                social
                    .entry(key.to_string())
                    .or_insert_with(|| content.trim().to_string());
            }
        }
    }

    social
}

/// Extracts all followable links from the HTML document
fn extract_anchors(document: &Html, base_url: &Url) -> Vec<String> {
    let mut anchors = Vec::new();

    let Ok(selector) = Selector::parse("a[href]") else {
        return anchors;
    };

    for element in document.select(&selector) {
        if element.value().attr("download").is_some() {
            continue;
        }

        if let Some(href) = element.value().attr("href") {
            if let Some(absolute_url) = resolve_link(href, base_url) {
                anchors.push(absolute_url);
            }
        }
    }

    anchors
}

/// Extracts script, stylesheet, and image URLs
fn extract_resources(document: &Html, base_url: &Url) -> ResourceLists {
    let mut resources = ResourceLists::default();

    let groups: [(&str, &str, &mut Vec<String>); 3] = [
        ("script[src]", "src", &mut resources.scripts),
        ("link[rel='stylesheet'][href]", "href", &mut resources.stylesheets),
        ("img[src]", "src", &mut resources.images),
    ];

    for (css, attr, out) in groups {
        let Ok(selector) = Selector::parse(css) else {
            continue;
        };
        for element in document.select(&selector) {
            if let Some(value) = element.value().attr(attr) {
                if let Ok(resolved) = base_url.join(value.trim()) {
                    let resolved = resolved.to_string();
                    if !out.contains(&resolved) {
                        out.push(resolved);
                    }
                }
            }
        }
    }

    resources
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None for links that should be excluded: javascript:, mailto:,
/// tel: schemes, data: URIs, and hrefs that don't resolve.
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    let lowered = href.to_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let resolved = base_url.join(href).ok()?;

    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}
