//! Offer acceptance (thresholds, currency, price floor) and final ranking.

use std::cmp::Ordering;
use std::collections::HashSet;

use shopbot_core::{
    CurrencyNormalizer, JudgmentVerdict, PipelineConfig, ProductOffer, RankingStrategy,
    ScrapedPage, MIN_OFFER_PRICE,
};
use shopbot_scraper::store_name;

/// Why a judged candidate did not become an offer.
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    OutOfRegion,
    LowRelevance(u8),
    LowPriceAccuracy(u8),
    UnsupportedCurrency(String),
    BelowPriceFloor(f64),
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::OutOfRegion => write!(f, "store does not serve the target market"),
            Rejection::LowRelevance(score) => write!(f, "relevance {score} below threshold"),
            Rejection::LowPriceAccuracy(score) => {
                write!(f, "price accuracy {score} below threshold")
            }
            Rejection::UnsupportedCurrency(code) => write!(f, "unsupported currency {code}"),
            Rejection::BelowPriceFloor(price) => write!(f, "price {price:.2} below floor"),
        }
    }
}

/// Turn one verdict into an offer if it clears every acceptance rule.
///
/// # Errors
///
/// Returns the first [`Rejection`] that applies.
pub fn accept(
    page: &ScrapedPage,
    verdict: &JudgmentVerdict,
    normalizer: &CurrencyNormalizer,
    config: &PipelineConfig,
    is_fallback: bool,
) -> Result<ProductOffer, Rejection> {
    if !verdict.is_region_fit {
        return Err(Rejection::OutOfRegion);
    }
    if verdict.relevance_score < config.relevance_threshold {
        return Err(Rejection::LowRelevance(verdict.relevance_score));
    }
    if verdict.price_accuracy_score < config.price_accuracy_threshold {
        return Err(Rejection::LowPriceAccuracy(verdict.price_accuracy_score));
    }

    let converted = normalizer
        .to_reference(verdict.price, &verdict.currency)
        .map_err(|_| Rejection::UnsupportedCurrency(verdict.currency.clone()))?;
    let price = round_cents(converted);
    if price < MIN_OFFER_PRICE {
        return Err(Rejection::BelowPriceFloor(price));
    }

    Ok(ProductOffer {
        name: page.title.clone(),
        store: store_name(&page.url),
        url: page.url.clone(),
        image_url: page.image_url.clone(),
        price_in_reference_currency: price,
        original_price: verdict.price,
        original_currency: verdict.currency.clone(),
        relevance_score: verdict.relevance_score,
        price_accuracy_score: verdict.price_accuracy_score,
        reasoning: verdict.reasoning.clone(),
        is_fallback_suggestion: is_fallback,
    })
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Sort by `strategy`, keep the best-ranked offer per URL, and truncate to
/// `max_results`.
///
/// - [`RankingStrategy::PriceAscending`]: cheapest first; ties go to the more
///   relevant offer.
/// - [`RankingStrategy::RelevanceWeighted`]: highest `relevance² / price`
///   first; ties go to the cheaper offer.
#[must_use]
pub fn rank(
    mut offers: Vec<ProductOffer>,
    strategy: RankingStrategy,
    max_results: usize,
) -> Vec<ProductOffer> {
    offers.sort_by(|a, b| compare(a, b, strategy));
    let mut seen = HashSet::new();
    offers.retain(|offer| seen.insert(offer.url.clone()));
    offers.truncate(max_results);
    offers
}

fn compare(a: &ProductOffer, b: &ProductOffer, strategy: RankingStrategy) -> Ordering {
    let by_price = a
        .price_in_reference_currency
        .total_cmp(&b.price_in_reference_currency);
    let by_relevance = b.relevance_score.cmp(&a.relevance_score);
    let primary = match strategy {
        RankingStrategy::PriceAscending => by_price.then(by_relevance),
        RankingStrategy::RelevanceWeighted => weighted_score(b)
            .total_cmp(&weighted_score(a))
            .then(by_price),
    };
    primary
        .then(b.price_accuracy_score.cmp(&a.price_accuracy_score))
        .then_with(|| a.url.cmp(&b.url))
}

fn weighted_score(offer: &ProductOffer) -> f64 {
    let relevance = f64::from(offer.relevance_score);
    relevance * relevance / offer.price_in_reference_currency.max(MIN_OFFER_PRICE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str) -> ScrapedPage {
        ScrapedPage {
            url: url.to_string(),
            title: "Blue Painter's Tape".to_string(),
            image_url: "https://shop.example.com/tape.jpg".to_string(),
            text_content: "tape".to_string(),
            price_hint: None,
        }
    }

    fn verdict(price: f64, currency: &str, relevance: u8, accuracy: u8) -> JudgmentVerdict {
        JudgmentVerdict {
            price,
            currency: currency.to_string(),
            relevance_score: relevance,
            price_accuracy_score: accuracy,
            is_region_fit: true,
            reasoning: "ok".to_string(),
        }
    }

    fn usd() -> CurrencyNormalizer {
        CurrencyNormalizer::new("USD").unwrap()
    }

    fn offer(url: &str, price: f64, relevance: u8) -> ProductOffer {
        accept(
            &page(url),
            &verdict(price, "USD", relevance, 9),
            &usd(),
            &PipelineConfig {
                relevance_threshold: 1,
                price_accuracy_threshold: 1,
                ..PipelineConfig::default()
            },
            false,
        )
        .unwrap()
    }

    #[test]
    fn accepted_offer_carries_page_and_verdict_fields() {
        let o = accept(
            &page("https://www.walmart.com/ip/123"),
            &verdict(4.99, "USD", 9, 9),
            &usd(),
            &PipelineConfig::default(),
            false,
        )
        .unwrap();
        assert_eq!(o.store, "walmart.com");
        assert_eq!(o.name, "Blue Painter's Tape");
        assert!((o.price_in_reference_currency - 4.99).abs() < 1e-9);
        assert!(!o.is_fallback_suggestion);
    }

    #[test]
    fn euro_price_is_converted() {
        let o = accept(
            &page("https://shop.example.de/p"),
            &verdict(10.0, "EUR", 9, 9),
            &usd(),
            &PipelineConfig::default(),
            true,
        )
        .unwrap();
        assert!((o.price_in_reference_currency - 10.80).abs() < 1e-9);
        assert!((o.original_price - 10.0).abs() < f64::EPSILON);
        assert_eq!(o.original_currency, "EUR");
        assert!(o.is_fallback_suggestion);
    }

    #[test]
    fn unsupported_currency_is_rejected() {
        let err = accept(
            &page("https://shop.example.com/p"),
            &verdict(10.0, "XYZ", 9, 9),
            &usd(),
            &PipelineConfig::default(),
            false,
        )
        .unwrap_err();
        assert_eq!(err, Rejection::UnsupportedCurrency("XYZ".to_string()));
    }

    #[test]
    fn thresholds_region_and_floor_are_enforced() {
        let config = PipelineConfig::default();
        let p = page("https://shop.example.com/p");

        let mut out_of_region = verdict(5.0, "USD", 9, 9);
        out_of_region.is_region_fit = false;
        assert_eq!(
            accept(&p, &out_of_region, &usd(), &config, false),
            Err(Rejection::OutOfRegion)
        );
        assert_eq!(
            accept(&p, &verdict(5.0, "USD", 6, 9), &usd(), &config, false),
            Err(Rejection::LowRelevance(6))
        );
        assert_eq!(
            accept(&p, &verdict(5.0, "USD", 9, 6), &usd(), &config, false),
            Err(Rejection::LowPriceAccuracy(6))
        );
        assert_eq!(
            accept(&p, &verdict(0.49, "USD", 9, 9), &usd(), &config, false),
            Err(Rejection::BelowPriceFloor(0.49))
        );
        assert!(accept(&p, &verdict(0.50, "USD", 7, 7), &usd(), &config, false).is_ok());
    }

    #[test]
    fn price_ranking_sorts_ascending_with_relevance_tiebreak() {
        let ranked = rank(
            vec![
                offer("https://a.example/1", 9.0, 9),
                offer("https://a.example/2", 3.0, 7),
                offer("https://a.example/3", 3.0, 9),
            ],
            RankingStrategy::PriceAscending,
            30,
        );
        let urls: Vec<&str> = ranked.iter().map(|o| o.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://a.example/3", "https://a.example/2", "https://a.example/1"]
        );
    }

    #[test]
    fn weighted_ranking_prefers_relevant_cheap_offers() {
        let ranked = rank(
            vec![
                offer("https://a.example/cheap-weak", 2.0, 3),
                offer("https://a.example/mid-strong", 5.0, 10),
                offer("https://a.example/pricey-strong", 50.0, 10),
            ],
            RankingStrategy::RelevanceWeighted,
            30,
        );
        assert_eq!(ranked[0].url, "https://a.example/mid-strong");
        assert_eq!(ranked[2].url, "https://a.example/pricey-strong");
    }

    #[test]
    fn duplicates_keep_best_ranked_copy_and_result_is_truncated() {
        let ranked = rank(
            vec![
                offer("https://a.example/dup", 8.0, 9),
                offer("https://a.example/dup", 4.0, 9),
                offer("https://a.example/x", 5.0, 9),
                offer("https://a.example/y", 6.0, 9),
            ],
            RankingStrategy::PriceAscending,
            2,
        );
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].url, "https://a.example/dup");
        assert!((ranked[0].price_in_reference_currency - 4.0).abs() < f64::EPSILON);
        assert_eq!(ranked[1].url, "https://a.example/x");
    }
}
