//! HTML signal extraction: title, preview image, visible text, and a
//! schema.org price hint.

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use shopbot_core::{PriceHint, ScrapedPage};

use crate::origin::resolve_url;

/// Elements whose text is never user-visible content.
const SKIPPED_ELEMENTS: &[&str] = &[
    "head", "script", "style", "noscript", "svg", "template", "iframe", "canvas",
];

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid css selector")
}

/// Parse `html` fetched from `url` into a [`ScrapedPage`].
///
/// `text_content` is whitespace-collapsed and capped at `max_text_chars`
/// characters.
#[must_use]
pub fn extract_page(url: &str, html: &str, max_text_chars: usize) -> ScrapedPage {
    let document = Html::parse_document(html);

    let title = extract_title(&document).unwrap_or_else(|| ScrapedPage::UNTITLED.to_string());
    let image_url = extract_image(&document, url).unwrap_or_default();
    let text_content = truncate_chars(&visible_text(&document), max_text_chars);
    let price_hint = extract_price_hint(&document);

    ScrapedPage {
        url: url.to_string(),
        title,
        image_url,
        text_content,
        price_hint,
    }
}

fn meta_content(document: &Html, css: &str) -> Option<String> {
    document
        .select(&selector(css))
        .filter_map(|el| el.value().attr("content"))
        .map(collapse_whitespace)
        .find(|c| !c.is_empty())
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

/// `<title>`, then `og:title`, then the first `<h1>`.
fn extract_title(document: &Html) -> Option<String> {
    document
        .select(&selector("title"))
        .map(element_text)
        .find(|t| !t.is_empty())
        .or_else(|| meta_content(document, r#"meta[property="og:title"]"#))
        .or_else(|| {
            document
                .select(&selector("h1"))
                .map(element_text)
                .find(|t| !t.is_empty())
        })
}

/// Open Graph image, then Twitter card image, then `image_src`, then the
/// first `<img>` with a usable `src`, resolved against `page_url`.
fn extract_image(document: &Html, page_url: &str) -> Option<String> {
    let meta = meta_content(document, r#"meta[property="og:image"]"#)
        .or_else(|| meta_content(document, r#"meta[property="og:image:url"]"#))
        .or_else(|| meta_content(document, r#"meta[name="twitter:image"]"#))
        .or_else(|| {
            document
                .select(&selector(r#"link[rel="image_src"]"#))
                .find_map(|el| el.value().attr("href").map(str::to_owned))
        });

    if let Some(found) = meta.and_then(|href| resolve_url(page_url, &href)) {
        return Some(found);
    }

    document
        .select(&selector("img"))
        .filter_map(|el| {
            el.value()
                .attr("src")
                .or_else(|| el.value().attr("data-src"))
        })
        .find_map(|src| resolve_url(page_url, src))
}

/// Concatenate text nodes outside [`SKIPPED_ELEMENTS`].
fn visible_text(document: &Html) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| SKIPPED_ELEMENTS.contains(&el.name()))
        });
        if !hidden {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                parts.push(trimmed);
            }
        }
    }
    collapse_whitespace(&parts.join(" "))
}

/// Look for a schema.org `Product` / `Offer` price in JSON-LD blocks.
fn extract_price_hint(document: &Html) -> Option<PriceHint> {
    document
        .select(&selector(r#"script[type="application/ld+json"]"#))
        .filter_map(|el| {
            let raw = el.text().collect::<String>();
            serde_json::from_str::<Value>(raw.trim()).ok()
        })
        .find_map(|value| find_offer_price(&value))
}

fn find_offer_price(value: &Value) -> Option<PriceHint> {
    match value {
        Value::Array(items) => items.iter().find_map(find_offer_price),
        Value::Object(map) => {
            if let Some(graph) = map.get("@graph") {
                if let Some(hint) = find_offer_price(graph) {
                    return Some(hint);
                }
            }
            if type_matches(map.get("@type"), "Product") {
                if let Some(hint) = map.get("offers").and_then(offer_price) {
                    return Some(hint);
                }
            }
            None
        }
        _ => None,
    }
}

fn type_matches(value: Option<&Value>, wanted: &str) -> bool {
    match value {
        Some(Value::String(s)) => s.eq_ignore_ascii_case(wanted),
        Some(Value::Array(items)) => items
            .iter()
            .any(|v| v.as_str().is_some_and(|s| s.eq_ignore_ascii_case(wanted))),
        _ => false,
    }
}

/// Accepts `Offer`, `AggregateOffer` (uses `lowPrice`), or an array of offers.
fn offer_price(offers: &Value) -> Option<PriceHint> {
    match offers {
        Value::Array(items) => items.iter().find_map(offer_price),
        Value::Object(map) => {
            let amount = map
                .get("price")
                .or_else(|| map.get("lowPrice"))
                .and_then(number_or_numeric_string)?;
            let currency = map
                .get("priceCurrency")
                .and_then(Value::as_str)
                .map(|c| c.trim().to_ascii_uppercase())
                .filter(|c| !c.is_empty());
            Some(PriceHint { amount, currency })
        }
        _ => None,
    }
}

fn number_or_numeric_string(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().ok()?,
        _ => return None,
    };
    (amount.is_finite() && amount >= 0.0).then_some(amount)
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
