//! Postal code (CEP) lookup.
//!
//! Resolves a Brazilian postal code to street, neighborhood, city and state
//! using the public `ViaCEP` service. Every failure collapses to "not found";
//! the caller decides how to tell the user.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::config::PostalConfig;
use crate::error::Result;
use crate::record::AddressFields;

/// Default `ViaCEP` endpoint.
pub const DEFAULT_BASE_URL: &str = "https://viacep.com.br/ws";

/// Number of digits in a CEP.
const CEP_DIGITS: usize = 8;

/// Something that can resolve a postal code to address fields.
#[async_trait]
pub trait PostalLookup: Send + Sync {
    /// Resolve `code`. `None` means not found, for any reason.
    async fn lookup(&self, code: &str) -> Option<AddressFields>;
}

/// Strip formatting from a CEP; `None` unless exactly eight digits remain.
#[must_use]
pub fn normalize_cep(code: &str) -> Option<String> {
    let digits: String = code.chars().filter(char::is_ascii_digit).collect();
    let only_digits_and_separators = code
        .chars()
        .all(|c| c.is_ascii_digit() || c == '-' || c == '.' || c.is_whitespace());
    (only_digits_and_separators && digits.len() == CEP_DIGITS).then_some(digits)
}

/// `ViaCEP` JSON body.
#[derive(Debug, Default, Deserialize)]
struct ViaCepResponse {
    #[serde(default)]
    logradouro: Option<String>,
    #[serde(default)]
    bairro: Option<String>,
    #[serde(default)]
    localidade: Option<String>,
    #[serde(default)]
    uf: Option<String>,
    /// Present on unknown codes; `true` or `"true"` depending on API version.
    #[serde(default)]
    erro: Option<serde_json::Value>,
}

impl ViaCepResponse {
    fn is_error(&self) -> bool {
        match &self.erro {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::Bool(flag)) => *flag,
            Some(serde_json::Value::String(flag)) => flag.eq_ignore_ascii_case("true"),
            Some(_) => true,
        }
    }

    fn into_address(self) -> Option<AddressFields> {
        if self.is_error() {
            return None;
        }
        Some(AddressFields {
            rua: self.logradouro.unwrap_or_default(),
            bairro: self.bairro.unwrap_or_default(),
            cidade: self.localidade.unwrap_or_default(),
            uf: self.uf.unwrap_or_default(),
        })
    }
}

/// HTTP client for the `ViaCEP` service.
#[derive(Debug, Clone)]
pub struct ViaCepClient {
    /// HTTP client.
    client: Client,
    /// Service base URL, without trailing slash.
    base_url: String,
}

impl ViaCepClient {
    /// Create a client for `base_url` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from the postal section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &PostalConfig) -> Result<Self> {
        Self::new(&config.base_url, config.timeout())
    }

    /// The service base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL queried for an already-normalized code.
    #[must_use]
    pub fn url_for(&self, cep: &str) -> String {
        format!("{}/{cep}/json/", self.base_url)
    }

    /// Query the service, keeping transport failures as errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not JSON.
    async fn fetch(&self, cep: &str) -> Result<Option<AddressFields>> {
        let response = self.client.get(self.url_for(cep)).send().await?;
        let status = response.status();
        if !status.is_success() {
            debug!(%status, "CEP service returned non-success status");
            return Ok(None);
        }
        let body: ViaCepResponse = response.json().await?;
        Ok(body.into_address())
    }
}

#[async_trait]
impl PostalLookup for ViaCepClient {
    #[instrument(skip(self))]
    async fn lookup(&self, code: &str) -> Option<AddressFields> {
        let Some(cep) = normalize_cep(code) else {
            debug!("Malformed CEP, not querying service");
            return None;
        };
        match self.fetch(&cep).await {
            Ok(Some(address)) => {
                debug!(cidade = %address.cidade, uf = %address.uf, "CEP resolved");
                Some(address)
            }
            Ok(None) => {
                debug!("CEP not found");
                None
            }
            Err(e) => {
                warn!(error = %e, "CEP lookup failed");
                None
            }
        }
    }
}
