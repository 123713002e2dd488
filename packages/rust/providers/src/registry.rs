//! Formula → registry number resolver.
//!
//! The provider has no JSON API; the registry number is scraped off its
//! results page. Extraction is strictly best-effort: the contract is "parse
//! whatever body came back", and every way the page can disappoint maps to
//! a typed parse-miss rather than an error.

use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, error, info, instrument};

use chemfuse_shared::{ChemFuseError, Result};

use crate::{build_client, normalize_base};

/// Client for the scraped registry-number lookup.
#[derive(Clone)]
pub struct RegistryClient {
    client: Client,
    base_url: String,
}

impl RegistryClient {
    /// Create a client for the given provider base URL.
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: normalize_base(base_url)?,
        })
    }

    /// Resolve a chemical formula to its registry number.
    ///
    /// `Ok(None)` is a parse-miss (no number on the page); `Err` is reserved
    /// for transport failures, so callers can tell the two apart.
    #[instrument(skip_all, fields(formula = %formula))]
    pub async fn registry_number(&self, formula: &str) -> Result<Option<String>> {
        let url = format!("{}/cgi/cbook.cgi", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("Formula", formula), ("NoIon", "on"), ("Units", "SI")])
            .send()
            .await
            .map_err(|e| ChemFuseError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            // Best effort: log, but still parse whatever body was returned
            error!(%formula, %status, "registry lookup returned non-success status");
        }

        let body = response
            .text()
            .await
            .map_err(|e| ChemFuseError::Network(format!("{url}: failed to read body: {e}")))?;

        let number = extract_registry_number(&body);
        match &number {
            Some(rn) => info!(%formula, registry_number = %rn, "registry number resolved"),
            None => debug!(%formula, "no registry number found on results page"),
        }

        Ok(number)
    }
}

/// Best-effort extraction of the registry number from a results page.
///
/// The number lives in the third list item of the summary list that follows
/// the top heading, after a colon. Any missing step is a parse-miss.
fn extract_registry_number(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);

    let h1_sel = Selector::parse("h1#Top").unwrap();
    let li_sel = Selector::parse("li").unwrap();

    let heading = doc.select(&h1_sel).next()?;
    let list = heading
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "ul")?;
    let third_item = list.select(&li_sel).nth(2)?;

    let text = third_item.text().collect::<String>();
    let (_, after_colon) = text.split_once(':')?;
    let value = after_colon.trim();

    (!value.is_empty()).then(|| value.to_string())
}
