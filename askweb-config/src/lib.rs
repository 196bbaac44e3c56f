//! Loader for askweb configuration with YAML + environment overlays.
//!
//! Precedence, lowest first: built-in defaults, the YAML file (if any),
//! `ASKWEB__`-prefixed environment variables (`ASKWEB__LLM__MODEL=...`).
//! After merging, every string value goes through `${VAR}` expansion, and the
//! result is validated into an immutable [`AskwebConfig`].
//!
//! The model credential is mandatory. When `llm.api_key` is absent it falls
//! back to the provider's conventional variable (`GROQ_API_KEY`,
//! `OPENAI_API_KEY`); Brave search likewise falls back to `BRAVE_API_KEY`.
use askweb_llm::{LlmProvider, LlmSettings};
use config::{Config, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
pub const DEFAULT_CONFIG_FILE: &str = "askweb.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),
    #[error("missing credential: set {env_var} or `{key}` in the config file")]
    MissingCredential {
        key: &'static str,
        env_var: &'static str,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchProvider {
    Duckduckgo,
    Brave,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    llm: RawLlm,
    #[serde(default)]
    search: RawSearch,
    #[serde(default)]
    fetch: RawFetch,
}

#[derive(Debug, Deserialize)]
struct RawLlm {
    #[serde(default = "default_llm_provider")]
    provider: LlmProvider,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    endpoint: Option<String>,
    #[serde(default)]
    temperature: Option<f32>,
    #[serde(default)]
    max_tokens: Option<u32>,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: None,
            api_key: None,
            endpoint: None,
            temperature: None,
            max_tokens: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawSearch {
    #[serde(default = "default_search_provider")]
    provider: SearchProvider,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default = "default_max_results")]
    max_results: usize,
}

impl Default for RawSearch {
    fn default() -> Self {
        Self {
            provider: default_search_provider(),
            api_key: None,
            max_results: default_max_results(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawFetch {
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
    #[serde(default = "default_max_article_chars")]
    max_article_chars: usize,
}

impl Default for RawFetch {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_article_chars: default_max_article_chars(),
        }
    }
}

fn default_llm_provider() -> LlmProvider {
    LlmProvider::Groq
}
fn default_search_provider() -> SearchProvider {
    SearchProvider::Duckduckgo
}
fn default_max_results() -> usize {
    5
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_max_article_chars() -> usize {
    3000
}

/// Sampling knobs forwarded with every model call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ModelTuning {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub provider: SearchProvider,
    pub api_key: Option<String>,
    pub max_results: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    pub timeout: Duration,
    pub max_article_chars: usize,
}

/// Validated, immutable process configuration.
#[derive(Debug, Clone)]
pub struct AskwebConfig {
    pub llm: LlmSettings,
    pub tuning: ModelTuning,
    pub search: SearchSettings,
    pub fetch: FetchSettings,
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// A value that is blank or still holds an unresolved `${VAR}` counts as unset.
fn usable(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && !v.contains("${"))
}

fn from_env(var: &str) -> Option<String> {
    usable(std::env::var(var).ok())
}

fn credential_env_var(provider: LlmProvider) -> &'static str {
    match provider {
        LlmProvider::Groq => "GROQ_API_KEY",
        LlmProvider::OpenAi => "OPENAI_API_KEY",
    }
}

impl RawConfig {
    fn validate(self) -> Result<AskwebConfig, ConfigError> {
        let provider = self.llm.provider;
        let env_var = credential_env_var(provider);
        let api_key = usable(self.llm.api_key)
            .or_else(|| from_env(env_var))
            .ok_or(ConfigError::MissingCredential {
                key: "llm.api_key",
                env_var,
            })?;

        let model = usable(self.llm.model).unwrap_or_else(|| provider.default_model().to_string());
        if let Some(t) = self.llm.temperature {
            if !(0.0..=2.0).contains(&t) {
                return Err(ConfigError::Invalid(format!(
                    "llm.temperature must be within 0.0..=2.0, got {t}"
                )));
            }
        }

        if self.search.max_results == 0 {
            return Err(ConfigError::Invalid(
                "search.max_results must be at least 1".into(),
            ));
        }
        let search_key = usable(self.search.api_key);
        let search_key = match self.search.provider {
            SearchProvider::Brave => Some(search_key.or_else(|| from_env("BRAVE_API_KEY")).ok_or(
                ConfigError::MissingCredential {
                    key: "search.api_key",
                    env_var: "BRAVE_API_KEY",
                },
            )?),
            SearchProvider::Duckduckgo => search_key,
        };

        if self.fetch.timeout_secs == 0 || self.fetch.max_article_chars == 0 {
            return Err(ConfigError::Invalid(
                "fetch.timeout_secs and fetch.max_article_chars must be positive".into(),
            ));
        }

        Ok(AskwebConfig {
            llm: LlmSettings {
                provider,
                model,
                api_key,
                endpoint: usable(self.llm.endpoint),
            },
            tuning: ModelTuning {
                temperature: self.llm.temperature,
                max_tokens: self.llm.max_tokens,
            },
            search: SearchSettings {
                provider: self.search.provider,
                api_key: search_key,
                max_results: self.search.max_results,
            },
            fetch: FetchSettings {
                timeout: Duration::from_secs(self.fetch.timeout_secs),
                max_article_chars: self.fetch.max_article_chars,
            },
        })
    }
}

/// First existing of `./askweb.yaml` and `<config dir>/askweb/askweb.yaml`.
pub fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|d| d.join("askweb").join(DEFAULT_CONFIG_FILE))
        .filter(|p| p.is_file())
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct AskwebConfigLoader {
    files: Vec<config::File<config::FileSourceFile, config::FileFormat>>,
    inline: Vec<String>,
}

impl Default for AskwebConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl AskwebConfigLoader {
    /// Start with built-in defaults; `ASKWEB__` env overrides are applied last.
    ///
    /// ```
    /// use askweb_config::AskwebConfigLoader;
    ///
    /// let config = AskwebConfigLoader::new()
    ///     .with_yaml_str("llm:\n  api_key: gsk_inline\nsearch:\n  max_results: 3")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.search.max_results, 3);
    /// assert_eq!(config.llm.model, "mixtral-8x7b-32768");
    /// ```
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            inline: Vec::new(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.files.push(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file only if it exists.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.files.push(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.inline.push(yaml.to_string());
        self
    }

    /// Merge sources, expand `${VAR}` placeholders and validate.
    ///
    /// ```
    /// use askweb_config::{AskwebConfigLoader, SearchProvider};
    ///
    /// unsafe { std::env::set_var("DOC_BRAVE_TOKEN", "brv-from-env"); }
    ///
    /// let config = AskwebConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// llm:
    ///   provider: openai
    ///   api_key: sk-doc
    /// search:
    ///   provider: brave
    ///   api_key: "${DOC_BRAVE_TOKEN}"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.llm.model, "gpt-4o-mini");
    /// assert_eq!(config.search.provider, SearchProvider::Brave);
    /// assert_eq!(config.search.api_key.as_deref(), Some("brv-from-env"));
    ///
    /// unsafe { std::env::remove_var("DOC_BRAVE_TOKEN"); }
    /// ```
    pub fn load(self) -> Result<AskwebConfig, ConfigError> {
        let mut builder = Config::builder();
        for file in self.files {
            builder = builder.add_source(file);
        }
        for yaml in &self.inline {
            builder = builder.add_source(File::from_str(yaml, config::FileFormat::Yaml));
        }
        builder = builder.add_source(
            Environment::with_prefix("ASKWEB")
                .separator("__")
                .try_parsing(true),
        );
        let cfg = builder.build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let raw: RawConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let validated = raw.validate()?;
        tracing::debug!(
            llm_provider = ?validated.llm.provider,
            model = %validated.llm.model,
            search_provider = ?validated.search.provider,
            max_results = validated.search.max_results,
            "config.loaded"
        );
        Ok(validated)
    }
}
