//! Raw catalog payload → [`ProductRecord`] projection.
//!
//! The upstream API returns a large JSON object per product. Only a fixed
//! set of attributes is kept; the HTML description is reduced to its visible
//! text and image objects are reduced to their `base_url`.

use scraper::{ElementRef, Html, Node};
use serde_json::{Number, Value};

use crate::models::ProductRecord;

/// Elements whose text content is never rendered.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "template"];

/// Elements that break the text flow, so their neighbours never fuse.
const BREAKING_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Project a raw catalog payload into a [`ProductRecord`].
///
/// Returns `None` when the payload lacks an `id` or a `description` key, or
/// when `id` is not an integer. A partially filled record is never produced.
pub fn normalize(raw: &Value) -> Option<ProductRecord> {
    let (Some(raw_id), Some(raw_description)) = (raw.get("id"), raw.get("description")) else {
        tracing::warn!(
            id = ?raw.get("id"),
            "payload missing required field (id or description)"
        );
        return None;
    };

    let Some(id) = raw_id.as_i64() else {
        tracing::warn!(id = %raw_id, "payload id is not an integer");
        return None;
    };

    let description = match raw_description {
        Value::String(html) => strip_markup(html),
        Value::Null => String::new(),
        other => strip_markup(&other.to_string()),
    };

    Some(ProductRecord {
        id,
        name: string_field(raw, "name"),
        url_key: string_field(raw, "url_key"),
        price: price_field(raw, id),
        description,
        images_url: image_urls(raw.get("images")),
    })
}

/// Extract the visible text of an HTML fragment.
///
/// Text nodes are concatenated as-is, block elements and `<br>` act as
/// separators, then whitespace runs collapse to a single space. Parsing is
/// lenient, so malformed markup degrades to whatever text the parser
/// recovers.
pub fn strip_markup(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut text = String::new();
    collect_visible_text(fragment.root_element(), &mut text);

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_visible_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => {
                let name = el.name();
                if HIDDEN_ELEMENTS.contains(&name) {
                    continue;
                }
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                let breaking = BREAKING_ELEMENTS.contains(&name);
                if breaking {
                    out.push(' ');
                }
                collect_visible_text(child_el, out);
                if breaking {
                    out.push(' ');
                }
            }
            _ => {}
        }
    }
}

/// Upstream price kept exactly as sent. Numeric strings are accepted;
/// anything else is dropped with a warning.
fn price_field(raw: &Value, id: i64) -> Option<Number> {
    match raw.get("price")? {
        Value::Number(n) => Some(n.clone()),
        Value::Null => None,
        Value::String(s) => match s.trim().parse::<Number>() {
            Ok(n) => Some(n),
            Err(_) => {
                tracing::warn!(id, price = %s, "dropping non-numeric price");
                None
            }
        },
        other => {
            tracing::warn!(id, price = %other, "dropping non-numeric price");
            None
        }
    }
}

/// Collect `base_url` from each image object, skipping entries without one.
fn image_urls(images: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(images)) = images else {
        return Vec::new();
    };

    images
        .iter()
        .filter_map(|img| img.get("base_url").and_then(Value::as_str))
        .filter(|url| !url.trim().is_empty())
        .map(str::to_string)
        .collect()
}

fn string_field(raw: &Value, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}
