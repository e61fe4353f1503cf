use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::config::io::ConfigError;
use crate::core::gateway::DEFAULT_BASE_URL;
use crate::core::params::{
    model_index, ParameterSnapshot, MAX_TOKENS_LIMIT, MODELS, TEMPERATURE_RANGE, TOP_P_RANGE,
};

/// Keys accepted by `playground set` / `playground unset`.
pub const CONFIG_KEYS: [&str; 8] = [
    "base-url",
    "default-model",
    "temperature",
    "max-tokens",
    "stream",
    "json-mode",
    "top-p",
    "stop-sequence",
];

/// Startup defaults. Every field is optional; anything left unset falls back
/// to the built-in parameter defaults.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// OpenAI-compatible API root, e.g. "https://api.groq.com/openai/v1"
    pub base_url: Option<String>,
    pub default_model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub stream: Option<bool>,
    pub json_mode: Option<bool>,
    pub top_p: Option<f32>,
    pub stop_sequence: Option<String>,
}

/// Get a user-friendly display string for a path, abbreviating the home
/// directory to `~` on Unix-like systems.
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

impl Config {
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn default_model(&self) -> &str {
        self.default_model
            .as_deref()
            .filter(|model| model_index(model).is_some())
            .unwrap_or(MODELS[0])
    }

    /// Initial parameter values; the panel clamps them again on load.
    pub fn parameter_seed(&self) -> ParameterSnapshot {
        let defaults = ParameterSnapshot::default();
        ParameterSnapshot {
            model: self.default_model().to_string(),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            streaming: self.stream.unwrap_or(defaults.streaming),
            json_mode: self.json_mode.unwrap_or(defaults.json_mode),
            top_p: self.top_p.unwrap_or(defaults.top_p),
            stop_sequence: self.stop_sequence.clone().unwrap_or_default(),
        }
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason,
        };

        match key {
            "base-url" => {
                let trimmed = value.trim();
                if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
                    return Err(invalid("expected an http:// or https:// URL".into()));
                }
                self.base_url = Some(trimmed.to_string());
            }
            "default-model" => {
                if model_index(value).is_none() {
                    return Err(invalid(format!("expected one of: {}", MODELS.join(", "))));
                }
                self.default_model = Some(value.to_string());
            }
            "temperature" => {
                self.temperature = Some(parse_in_range(value, TEMPERATURE_RANGE).map_err(invalid)?)
            }
            "top-p" => self.top_p = Some(parse_in_range(value, TOP_P_RANGE).map_err(invalid)?),
            "max-tokens" => {
                let parsed: u32 = value
                    .trim()
                    .parse()
                    .map_err(|_| invalid("expected a whole number".into()))?;
                if parsed > MAX_TOKENS_LIMIT {
                    return Err(invalid(format!("must be at most {MAX_TOKENS_LIMIT}")));
                }
                self.max_tokens = Some(parsed);
            }
            "stream" => self.stream = Some(parse_bool(value).map_err(invalid)?),
            "json-mode" => self.json_mode = Some(parse_bool(value).map_err(invalid)?),
            "stop-sequence" => self.stop_sequence = Some(value.to_string()),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    pub fn unset_value(&mut self, key: &str) -> Result<(), ConfigError> {
        match key {
            "base-url" => self.base_url = None,
            "default-model" => self.default_model = None,
            "temperature" => self.temperature = None,
            "max-tokens" => self.max_tokens = None,
            "stream" => self.stream = None,
            "json-mode" => self.json_mode = None,
            "top-p" => self.top_p = None,
            "stop-sequence" => self.stop_sequence = None,
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// Effective value of every key, marking the ones that come from defaults.
    pub fn entries(&self) -> Vec<(&'static str, String, bool)> {
        let seed = self.parameter_seed();
        vec![
            ("base-url", self.base_url().to_string(), self.base_url.is_none()),
            (
                "default-model",
                seed.model.clone(),
                self.default_model.is_none(),
            ),
            (
                "temperature",
                format!("{:.2}", seed.temperature),
                self.temperature.is_none(),
            ),
            (
                "max-tokens",
                seed.max_tokens.to_string(),
                self.max_tokens.is_none(),
            ),
            ("stream", seed.streaming.to_string(), self.stream.is_none()),
            (
                "json-mode",
                seed.json_mode.to_string(),
                self.json_mode.is_none(),
            ),
            ("top-p", format!("{:.2}", seed.top_p), self.top_p.is_none()),
            (
                "stop-sequence",
                format!("{:?}", seed.stop_sequence),
                self.stop_sequence.is_none(),
            ),
        ]
    }
}

fn parse_in_range(value: &str, (min, max): (f32, f32)) -> Result<f32, String> {
    let parsed: f32 = value
        .trim()
        .parse()
        .map_err(|_| "expected a number".to_string())?;
    if !(min..=max).contains(&parsed) {
        return Err(format!("must be between {min} and {max}"));
    }
    Ok(parsed)
}

fn parse_bool(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        _ => Err("expected true or false".to_string()),
    }
}
