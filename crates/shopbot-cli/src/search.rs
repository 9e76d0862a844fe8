//! `shopbot search`: wires the concrete providers into the pipeline and
//! prints the outcome.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use shopbot_core::{AppConfig, ImageInput, SearchOutcome, SearchRequest};
use shopbot_judge::{OpenAiClient, OpenAiConfig};
use shopbot_pipeline::{PipelineDeps, ShoppingPipeline};
use shopbot_scraper::{ReqwestTransport, SerpApiClient, SerpApiConfig};

const CONNECT_TIMEOUT_SECS: u64 = 10;
const NAME_COLUMN_CHARS: usize = 48;

pub(crate) async fn run_search(
    config: &AppConfig,
    query: Option<String>,
    image: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let image = image.map(load_image).transpose()?;
    if query.as_deref().map_or(true, |q| q.trim().is_empty()) && image.is_none() {
        anyhow::bail!("provide --query, --image, or both");
    }

    let pipeline = build_pipeline(config)?;
    let outcome = pipeline
        .search(SearchRequest {
            text_query: query,
            image,
        })
        .await;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!(
            "{}",
            render_table(&outcome, &config.pipeline.reference_currency)
        );
    }
    Ok(())
}

fn build_pipeline(config: &AppConfig) -> anyhow::Result<ShoppingPipeline> {
    let search = SerpApiClient::new(SerpApiConfig {
        api_key: config.serpapi_api_key.clone(),
        base_url: config.serpapi_base_url.clone(),
        results_per_page: config.search_results_per_page,
        country: config.search_country.clone(),
        language: config.search_language.clone(),
        timeout_secs: config.pipeline.search_timeout_secs,
    })
    .context("failed to build search client")?;

    let transport =
        ReqwestTransport::new(CONNECT_TIMEOUT_SECS).context("failed to build fetch transport")?;

    let llm_config = |model: &str| OpenAiConfig {
        api_key: config.openai_api_key.clone(),
        base_url: config.openai_base_url.clone(),
        model: model.to_string(),
        timeout_secs: config.pipeline.judge_timeout_secs,
    };
    let llm = OpenAiClient::new(llm_config(&config.llm_model))
        .context("failed to build LLM client")?;
    let vision = OpenAiClient::new(llm_config(&config.vision_model))
        .context("failed to build vision client")?;

    tracing::debug!(
        llm_model = llm.model(),
        vision_model = vision.model(),
        "built LLM clients"
    );

    let pipeline = ShoppingPipeline::new(
        config.pipeline.clone(),
        PipelineDeps {
            search: Arc::new(search),
            transport: Arc::new(transport),
            llm: Arc::new(llm),
            vision_llm: Arc::new(vision),
        },
    )?;
    Ok(pipeline)
}

fn load_image(path: &Path) -> anyhow::Result<ImageInput> {
    let mime_type = mime_for_path(path)
        .with_context(|| format!("unsupported image type: {}", path.display()))?;
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read image {}", path.display()))?;
    Ok(ImageInput {
        bytes,
        mime_type: mime_type.to_string(),
    })
}

pub(crate) fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

/// Human-readable listing: warnings first, then one line per offer.
pub(crate) fn render_table(outcome: &SearchOutcome, reference_currency: &str) -> String {
    let mut out = String::new();
    for warning in &outcome.warnings {
        let _ = writeln!(out, "! {warning}");
    }
    if outcome.offers.is_empty() {
        return out;
    }
    if !outcome.warnings.is_empty() {
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "{:>3}  {:>10}  {:<4}  {:<nw$}  {:<20}  URL",
        "#",
        format!("PRICE {reference_currency}"),
        "REL",
        "NAME",
        "STORE",
        nw = NAME_COLUMN_CHARS,
    );
    for (i, offer) in outcome.offers.iter().enumerate() {
        let name: String = offer.name.chars().take(NAME_COLUMN_CHARS).collect();
        let _ = writeln!(
            out,
            "{:>3}  {:>10.2}  {:<4}  {:<nw$}  {:<20}  {}",
            i + 1,
            offer.price_in_reference_currency,
            format!("{}/10", offer.relevance_score),
            name,
            offer.store,
            offer.url,
            nw = NAME_COLUMN_CHARS,
        );
    }
    if outcome.is_alternative {
        out.push_str("\n(alternative suggestions from a broader search)\n");
    }
    out
}
