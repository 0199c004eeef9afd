//! Service configuration.
//!
//! Read once at startup from a TOML file, then overridden by environment
//! variables. Every field has a default so an absent or partial file is valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub generative: GenerativeConfig,
    #[serde(default)]
    pub grammar_check: GrammarCheckConfig,
    #[serde(default)]
    pub polish: PolishConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
    #[serde(default = "default_true")]
    pub cors: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerativeConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_generative_base_url")]
    pub base_url: String,
    #[serde(default = "default_generative_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Unset means a slow model blocks the request indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub prompt: PromptConfig,
}

/// Prompt text sent to the generative engine.
///
/// `style_directive` layers a phrasing preference on top of grammar
/// correction; set it to an empty string for grammar-only prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptConfig {
    #[serde(default = "default_markup_instruction")]
    pub markup_instruction: String,
    #[serde(default = "default_text_instruction")]
    pub text_instruction: String,
    #[serde(default = "default_markup_system")]
    pub markup_system: String,
    #[serde(default = "default_text_system")]
    pub text_system: String,
    #[serde(default = "default_style_directive")]
    pub style_directive: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrammarCheckConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_grammar_check_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Stages of the rule-based polisher. Whitespace normalization always runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolishConfig {
    #[serde(default = "default_true")]
    pub lexical_fixes: bool,
    #[serde(default = "default_true")]
    pub agreement_nudge: bool,
    #[serde(default = "default_true")]
    pub sentence_casing: bool,
}

fn default_true() -> bool { true }

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 4000 }
fn default_body_limit_bytes() -> usize { 1024 * 1024 }

fn default_generative_base_url() -> String { "http://localhost:11434".to_string() }
fn default_generative_model() -> String { "llama3.1:8b".to_string() }
fn default_temperature() -> f64 { 0.2 }

fn default_markup_instruction() -> String {
    "Correct the grammar and phrasing of the following HTML.\n\
     Return ONLY the corrected HTML. No explanations, no markdown fences, no extra text."
        .to_string()
}
fn default_text_instruction() -> String {
    "Correct the grammar and phrasing of the following text.\n\
     Return ONLY the corrected text. No explanations, no markdown fences, no quotes."
        .to_string()
}
fn default_markup_system() -> String { "Return only corrected HTML.".to_string() }
fn default_text_system() -> String { "Return only corrected text.".to_string() }
fn default_style_directive() -> String {
    "Prefer natural quantifier phrasing, e.g. rewrite \"multiple numbers of X\" as \"many X\"."
        .to_string()
}

fn default_grammar_check_endpoint() -> String {
    "https://api.languagetool.org/v2/check".to_string()
}
fn default_language() -> String { "en-US".to_string() }
fn default_level() -> String { "picky".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit_bytes(),
            cors: default_true(),
        }
    }
}

impl Default for GenerativeConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            base_url: default_generative_base_url(),
            model: default_generative_model(),
            temperature: default_temperature(),
            timeout_secs: None,
            prompt: PromptConfig::default(),
        }
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            markup_instruction: default_markup_instruction(),
            text_instruction: default_text_instruction(),
            markup_system: default_markup_system(),
            text_system: default_text_system(),
            style_directive: default_style_directive(),
        }
    }
}

impl Default for GrammarCheckConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            endpoint: default_grammar_check_endpoint(),
            language: default_language(),
            level: default_level(),
            timeout_secs: None,
        }
    }
}

impl Default for PolishConfig {
    fn default() -> Self {
        Self {
            lexical_fixes: default_true(),
            agreement_nudge: default_true(),
            sentence_casing: default_true(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl GenerativeConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl GrammarCheckConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit `path` must exist and parse. Without one the default
    /// location is tried and any problem falls back to defaults. Environment
    /// overrides are applied last in both cases.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let expanded = shellexpand::full(path)
                    .with_context(|| format!("Failed to expand config path {}", path))?;
                Self::from_file(Path::new(expanded.as_ref()))?
            }
            None => Self::load_default(),
        };

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// `~/.config/improve-server/config.toml` on Linux.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("improve-server").join("config.toml"))
    }

    fn load_default() -> Self {
        let Some(path) = Self::default_path() else {
            warn!("No config directory available, using default config");
            return Self::default();
        };

        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Self::default();
        }

        match Self::from_file(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{:#}, using defaults", e);
                Self::default()
            }
        }
    }

    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Apply overrides from `lookup`; invalid values are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("OLLAMA_URL") {
            self.generative.base_url = url;
        }
        if let Some(model) = lookup("OLLAMA_MODEL") {
            self.generative.model = model;
        }
        if let Some(host) = lookup("IMPROVE_HOST") {
            self.server.host = host;
        }
        if let Some(endpoint) = lookup("LANGUAGETOOL_URL") {
            self.grammar_check.endpoint = endpoint;
        }
        if let Some(port) = parse_override(&lookup, "PORT") {
            self.server.port = port;
        }
        if let Some(secs) = parse_override(&lookup, "GENERATIVE_TIMEOUT_SECS") {
            self.generative.timeout_secs = Some(secs);
        }
        if let Some(secs) = parse_override(&lookup, "GRAMMAR_CHECK_TIMEOUT_SECS") {
            self.grammar_check.timeout_secs = Some(secs);
        }
    }
}

fn parse_override<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let raw = lookup(key)?;
    raw.trim()
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value {raw:?}: {e}, keeping configured value");
        })
        .ok()
}
