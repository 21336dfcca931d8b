use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

const MIN_TEMPERATURE: f32 = 0.3;
const MAX_TEMPERATURE: f32 = 0.7;

/// Which endpoint contract `/api/analyze-food` speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStrategy {
    /// `{ image }` in, full JSON report out.
    Structured,
    /// `{ imageUrl, userGoals? }` in, `{ success, analysis }` out.
    Extraction,
}

impl AnalysisStrategy {
    pub fn from_string(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "structured" | "json" => Some(AnalysisStrategy::Structured),
            "extraction" | "text" => Some(AnalysisStrategy::Extraction),
            _ => None,
        }
    }
}

impl std::fmt::Display for AnalysisStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisStrategy::Structured => write!(f, "structured"),
            AnalysisStrategy::Extraction => write!(f, "extraction"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub strategy: AnalysisStrategy,
    /// Name of the environment variable holding the bearer token. The
    /// value itself is looked up on every request.
    pub api_key_var: String,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Decoded image cap; `None` disables the check.
    pub max_image_bytes: Option<u64>,
}

impl AnalyzerConfig {
    pub fn for_strategy(strategy: AnalysisStrategy) -> Self {
        let (max_tokens, temperature) = match strategy {
            AnalysisStrategy::Structured => (2000, 0.3),
            AnalysisStrategy::Extraction => (1000, 0.7),
        };
        Self {
            strategy,
            api_key_var: "OPENAI_API_KEY".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            max_tokens,
            temperature,
            max_image_bytes: Some(DEFAULT_MAX_IMAGE_BYTES),
        }
    }

    /// Read the credential now. Empty values count as missing.
    pub fn credential(&self) -> Option<String> {
        env::var(&self.api_key_var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn from_env() -> Result<Self> {
        let strategy = match env::var("ANALYSIS_STRATEGY") {
            Ok(raw) => AnalysisStrategy::from_string(&raw)
                .with_context(|| format!("ANALYSIS_STRATEGY must be 'structured' or 'extraction', got '{}'", raw))?,
            Err(_) => AnalysisStrategy::Structured,
        };

        let mut config = Self::for_strategy(strategy);

        if let Ok(var) = env::var("OPENAI_API_KEY_VAR") {
            config.api_key_var = var;
        }
        if let Ok(url) = env::var("OPENAI_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(model) = env::var("OPENAI_MODEL") {
            config.model = model;
        }
        if let Ok(raw) = env::var("ANALYSIS_MAX_TOKENS") {
            config.max_tokens = raw
                .parse()
                .with_context(|| format!("ANALYSIS_MAX_TOKENS is not a number: '{}'", raw))?;
        }
        if let Ok(raw) = env::var("ANALYSIS_TEMPERATURE") {
            let requested: f32 = raw
                .parse()
                .with_context(|| format!("ANALYSIS_TEMPERATURE is not a number: '{}'", raw))?;
            config.temperature = clamp_temperature(requested);
        }
        if let Ok(raw) = env::var("MAX_IMAGE_BYTES") {
            config.max_image_bytes = parse_image_limit(&raw)?;
        }

        Ok(config)
    }
}

fn clamp_temperature(requested: f32) -> f32 {
    let clamped = requested.clamp(MIN_TEMPERATURE, MAX_TEMPERATURE);
    if clamped != requested {
        log::warn!(
            "⚠️ ANALYSIS_TEMPERATURE {} outside [{}, {}], using {}",
            requested,
            MIN_TEMPERATURE,
            MAX_TEMPERATURE,
            clamped
        );
    }
    clamped
}

fn parse_image_limit(raw: &str) -> Result<Option<u64>> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    let bytes: u64 = raw
        .parse()
        .with_context(|| format!("MAX_IMAGE_BYTES is not a number: '{}'", raw))?;
    Ok(if bytes == 0 { None } else { Some(bytes) })
}

/// Where sign-in and subscription requests go.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderMode {
    Simulated { delay: Duration },
    Gateway { base_url: String },
}

impl ProviderMode {
    fn from_env(url_var: &str, delay_var: &str, default_delay_ms: u64) -> Result<Self> {
        if let Ok(url) = env::var(url_var) {
            if !url.trim().is_empty() {
                return Ok(ProviderMode::Gateway {
                    base_url: url.trim().trim_end_matches('/').to_string(),
                });
            }
        }
        let delay_ms = match env::var(delay_var) {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("{} is not a number: '{}'", delay_var, raw))?,
            Err(_) => default_delay_ms,
        };
        Ok(ProviderMode::Simulated {
            delay: Duration::from_millis(delay_ms),
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub analyzer: AnalyzerConfig,
    pub identity: ProviderMode,
    pub payment: ProviderMode,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            analyzer: AnalyzerConfig::from_env()?,
            identity: ProviderMode::from_env("AUTH_GATEWAY_URL", "AUTH_DELAY_MS", 1500)?,
            payment: ProviderMode::from_env("PAYMENT_GATEWAY_URL", "PAYMENT_DELAY_MS", 2000)?,
        })
    }

    /// Request body cap: the image limit after base64 inflation, plus room
    /// for the rest of the JSON body.
    pub fn body_limit(&self) -> usize {
        const ENVELOPE: u64 = 64 * 1024;
        const UNCAPPED: u64 = 32 * 1024 * 1024;
        let image = self.analyzer.max_image_bytes.unwrap_or(UNCAPPED);
        (image.div_ceil(3) * 4 + ENVELOPE) as usize
    }
}
