use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;
use yui_core::{Error, GenerationOracle, Result};
use crate::OracleConfig;

const DEFAULT_URL: &str = "http://localhost:11434/gemma3:12b";
const DEFAULT_MODEL: &str = "gemma3:12b";
const DEFAULT_PORT: u16 = 11434;

#[derive(Debug, Clone, PartialEq)]
pub struct OllamaModelConfig {
    base_url: String,
    model_name: String,
}

impl Default for OllamaModelConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model_name: DEFAULT_MODEL.to_string(),
        }
    }
}

impl OllamaModelConfig {
    /// `http://host:port/<model>`; the path names the model. Plain `http`
    /// without a port means Ollama's own port.
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).map_err(|e| Error::Config(format!("Invalid model URL {}: {}", url, e)))?;
        let model_name = parsed.path().trim_start_matches('/').to_string();
        let host = parsed
            .host_str()
            .ok_or_else(|| Error::Config(format!("Model URL has no host: {}", url)))?;
        Ok(Self {
            base_url: format!("{}://{}:{}", parsed.scheme(), host, port_of(&parsed, url)),
            model_name: if model_name.is_empty() { DEFAULT_MODEL.to_string() } else { model_name },
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

/// `Url::port` hides a scheme's default port even when it was written out.
fn port_of(parsed: &Url, raw: &str) -> u16 {
    if let Some(port) = parsed.port() {
        return port;
    }
    if parsed.scheme() == "http" && !has_explicit_port(raw) {
        return DEFAULT_PORT;
    }
    parsed.port_or_known_default().unwrap_or(DEFAULT_PORT)
}

fn has_explicit_port(raw: &str) -> bool {
    let rest = raw.split_once("://").map_or(raw, |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    let host_port = authority.rsplit('@').next().unwrap_or(authority);
    match host_port.rfind(']') {
        Some(i) => host_port[i..].contains(':'),
        None => host_port.contains(':'),
    }
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    repeat_penalty: f32,
    num_predict: u32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Local model served by Ollama's `/api/generate`.
pub struct OllamaModel {
    client: Client,
    config: OllamaModelConfig,
}

impl fmt::Debug for OllamaModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OllamaModel")
            .field("client", &"<reqwest::Client>")
            .field("config", &self.config)
            .finish()
    }
}

impl OllamaModel {
    pub fn new(config: &OracleConfig) -> Result<Self> {
        let mut model_config = OllamaModelConfig::from_url(config.model_url.as_deref().unwrap_or(DEFAULT_URL))?;
        if let Some(name) = &config.model_name {
            model_config.model_name = name.clone();
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            config: model_config,
        })
    }
}

#[async_trait::async_trait]
impl GenerationOracle for OllamaModel {
    fn name(&self) -> &str {
        "Ollama"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            model: self.config.model_name(),
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: 0.9,
                top_p: 0.95,
                repeat_penalty: 1.15,
                num_predict: 700,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.config.base_url()))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<GenerateResponse>()
            .await?;

        let text = response.response.trim();
        if text.is_empty() {
            return Err(Error::Inference("empty output".to_string()));
        }
        tracing::debug!("Ollama returned {} chars", text.chars().count());
        Ok(text.to_string())
    }
}
