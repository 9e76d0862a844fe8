//! Versioned prompt templates, one per LLM call site.
//!
//! Bump the version constant whenever a template's wording or schema changes;
//! it is logged with every call so verdict drift can be traced to a template.

use shopbot_core::{ImageInput, ScrapedPage};

use crate::client::Prompt;

pub const ENHANCE_VERSION: &str = "enhance-v3";
pub const JUDGE_VERSION: &str = "judge-v5";
pub const FALLBACK_VERSION: &str = "fallback-v2";
pub const VISION_VERSION: &str = "vision-v2";

/// Market facts the judge and query prompts are parameterized with.
#[derive(Debug, Clone, Copy)]
pub struct MarketContext<'a> {
    pub target_market: &'a str,
    pub reference_currency: &'a str,
}

#[must_use]
pub fn enhance(raw_query: &str, market: MarketContext<'_>) -> Prompt {
    let system = format!(
        "You turn a shopper's request into one web search query that finds \
         product pages selling exactly that item in {market}.\n\
         - Translate the request to English if needed.\n\
         - Keep brand, model, size, quantity and color words the shopper gave.\n\
         - Add the generic product-type noun if it is missing.\n\
         - Do not add store names, prices, quotes or search operators.\n\
         Reply with the query text only, on one line.",
        market = market.target_market,
    );
    Prompt {
        version: ENHANCE_VERSION,
        system,
        user: raw_query.trim().to_string(),
        json_output: false,
        image: None,
        temperature: 0.3,
    }
}

#[must_use]
pub fn judge(page: &ScrapedPage, original_query: &str, market: MarketContext<'_>) -> Prompt {
    let system = format!(
        "You evaluate one web page as a possible listing for what a shopper asked for.\n\
         1. price / currency: the price of the primary product on the page and its \
         ISO 4217 three-letter currency code. If the currency is ambiguous use {currency}.\n\
         2. relevance_score (integer 1-10): how well that product matches the request. \
         Be strict: a different model, size or variant scores 4 or lower; an accessory, \
         part or refill for the requested product scores 2 or lower.\n\
         3. price_accuracy_score (integer 1-10): confidence that the price is the real \
         price of a single unit of that product, not a bundle, multipack, subscription, \
         installment, price range, shipping fee or unrelated item.\n\
         4. is_region_fit (boolean): true only if the store sells and ships to shoppers \
         in {market}.\n\
         5. reasoning: one short sentence.\n\
         If the page sells nothing or shows no price, use price 0 and relevance_score 1.\n\
         Answer with exactly one JSON object and nothing else:\n\
         {{\"price\": number, \"currency\": string, \"relevance_score\": integer, \
         \"price_accuracy_score\": integer, \"is_region_fit\": boolean, \"reasoning\": string}}",
        currency = market.reference_currency,
        market = market.target_market,
    );

    let mut user = format!(
        "Shopper's request: \"{query}\"\nPage URL: {url}\nPage title: {title}\n",
        query = original_query.trim(),
        url = page.url,
        title = page.title,
    );
    if let Some(hint) = &page.price_hint {
        user.push_str(&format!(
            "Price found in page markup (may be stale or for another item): {amount} {currency}\n",
            amount = hint.amount,
            currency = hint.currency.as_deref().unwrap_or("unknown currency"),
        ));
    }
    user.push_str(&format!(
        "Page text:\n\"\"\"\n{text}\n\"\"\"",
        text = page.text_content
    ));

    Prompt {
        version: JUDGE_VERSION,
        system,
        user,
        json_output: true,
        image: None,
        temperature: 0.0,
    }
}

#[must_use]
pub fn fallback(raw_query: &str, enhanced_query: &str, market: MarketContext<'_>) -> Prompt {
    let system = format!(
        "A product search in {market} found no acceptable listings. Suggest one \
         slightly broader but still relevant search query: drop the most restrictive \
         detail (exact model number, size, color or brand) and keep the product type.\n\
         Answer with exactly one JSON object: {{\"query\": string}}",
        market = market.target_market,
    );
    let user = format!(
        "Shopper's request: \"{raw}\"\nQuery that found nothing: \"{enhanced}\"",
        raw = raw_query.trim(),
        enhanced = enhanced_query.trim(),
    );
    Prompt {
        version: FALLBACK_VERSION,
        system,
        user,
        json_output: true,
        image: None,
        temperature: 0.4,
    }
}

#[must_use]
pub fn vision(image: &ImageInput) -> Prompt {
    Prompt {
        version: VISION_VERSION,
        system: "You identify the main product in a photo so it can be searched for in \
                 online stores. Answer with exactly one JSON object: \
                 {\"product\": string, \"keywords\": [string]} where product is a short \
                 generic name with brand and model if visible, and keywords are up to \
                 eight single words describing type, brand, material, color and size."
            .to_string(),
        user: "What product is shown in this image?".to_string(),
        json_output: true,
        image: Some(image.clone()),
        temperature: 0.2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopbot_core::PriceHint;

    const MARKET: MarketContext<'static> = MarketContext {
        target_market: "United States",
        reference_currency: "USD",
    };

    fn page() -> ScrapedPage {
        ScrapedPage {
            url: "https://shop.example.com/p/tape".to_string(),
            title: "Blue Tape".to_string(),
            image_url: String::new(),
            text_content: "Blue painter's tape $4.99".to_string(),
            price_hint: None,
        }
    }

    #[test]
    fn judge_prompt_carries_original_query_page_and_schema() {
        let p = judge(&page(), "blue painter's tape 2 inch", MARKET);
        assert_eq!(p.version, JUDGE_VERSION);
        assert!(p.json_output);
        assert!(p.user.contains("\"blue painter's tape 2 inch\""));
        assert!(p.user.contains("https://shop.example.com/p/tape"));
        assert!(p.user.contains("$4.99"));
        assert!(p.system.contains("\"price_accuracy_score\": integer"));
        assert!(p.system.contains("United States"));
        assert!(p.system.contains("use USD"));
        assert!(!p.user.contains("markup"));
    }

    #[test]
    fn judge_prompt_mentions_structured_price_hint() {
        let mut pg = page();
        pg.price_hint = Some(PriceHint {
            amount: 4.99,
            currency: Some("USD".to_string()),
        });
        let p = judge(&pg, "tape", MARKET);
        assert!(p.user.contains("markup"));
        assert!(p.user.contains("4.99 USD"));
    }

    #[test]
    fn enhance_prompt_is_plain_text_mode() {
        let p = enhance("  cinta azul  ", MARKET);
        assert!(!p.json_output);
        assert_eq!(p.user, "cinta azul");
    }

    #[test]
    fn fallback_prompt_includes_both_queries() {
        let p = fallback("widget", "acme widget x100", MARKET);
        assert!(p.json_output);
        assert!(p.user.contains("\"widget\""));
        assert!(p.user.contains("\"acme widget x100\""));
    }

    #[test]
    fn vision_prompt_attaches_image() {
        let image = ImageInput {
            bytes: vec![0xFF, 0xD8],
            mime_type: "image/jpeg".to_string(),
        };
        let p = vision(&image);
        assert!(p.image.is_some());
        assert!(p.json_output);
    }
}
