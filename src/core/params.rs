//! Generation parameters and the panel that owns them.
//!
//! Every mutation goes through a clamping setter, so a [`ParameterSnapshot`]
//! handed to the gateway is always within the ranges the controls advertise.

/// Models offered by the selector, in display order. The first entry is the
/// default.
pub const MODELS: [&str; 4] = [
    "llama-3.1-8b-instant",
    "llama-3.3-70b-versatile",
    "openai/gpt-oss-20b",
    "openai/gpt-oss-120b",
];

pub const TEMPERATURE_RANGE: (f32, f32) = (0.0, 2.0);
pub const MAX_TOKENS_LIMIT: u32 = 131_072;
pub const TOP_P_RANGE: (f32, f32) = (0.0, 1.0);

pub const DEFAULT_TEMPERATURE: f32 = 1.0;
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_TOP_P: f32 = 1.0;

/// Read-only view of the panel handed to the controller at request time.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSnapshot {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub streaming: bool,
    pub json_mode: bool,
    pub top_p: f32,
    /// Empty means "no stop sequence".
    pub stop_sequence: String,
}

impl ParameterSnapshot {
    pub fn stop(&self) -> Option<&str> {
        if self.stop_sequence.is_empty() {
            None
        } else {
            Some(self.stop_sequence.as_str())
        }
    }
}

impl Default for ParameterSnapshot {
    fn default() -> Self {
        Self {
            model: MODELS[0].to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            streaming: true,
            json_mode: false,
            top_p: DEFAULT_TOP_P,
            stop_sequence: String::new(),
        }
    }
}

/// Emitted when the model control changes value. The session reacts by
/// clearing the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelChanged {
    pub previous: String,
    pub model: String,
}

#[derive(Debug, Clone, Default)]
pub struct ParameterPanel {
    values: ParameterSnapshot,
}

impl ParameterPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a panel from possibly out-of-range seed values (for example a
    /// hand-edited config file). Unknown models fall back to the default.
    pub fn seeded(seed: ParameterSnapshot) -> Self {
        let mut panel = Self::new();
        if model_index(&seed.model).is_some() {
            panel.values.model = seed.model;
        } else {
            tracing::warn!(model = %seed.model, "unknown model in seed, using default");
        }
        panel.set_temperature(seed.temperature);
        panel.set_max_tokens(seed.max_tokens);
        panel.set_streaming(seed.streaming);
        panel.set_json_mode(seed.json_mode);
        panel.set_top_p(seed.top_p);
        panel.set_stop_sequence(seed.stop_sequence);
        panel
    }

    pub fn snapshot(&self) -> &ParameterSnapshot {
        &self.values
    }

    pub fn model(&self) -> &str {
        &self.values.model
    }

    pub fn model_index(&self) -> usize {
        model_index(&self.values.model).unwrap_or(0)
    }

    /// Select a model by name. Returns `None` when the name is unknown or
    /// already selected, so re-selecting the current model never resets.
    pub fn select_model(&mut self, model: &str) -> Option<ModelChanged> {
        let index = model_index(model)?;
        self.select_model_index(index)
    }

    pub fn select_model_index(&mut self, index: usize) -> Option<ModelChanged> {
        let model = MODELS.get(index)?;
        if self.values.model == *model {
            return None;
        }
        let previous = std::mem::replace(&mut self.values.model, model.to_string());
        Some(ModelChanged {
            previous,
            model: model.to_string(),
        })
    }

    /// Move the selector by `delta` entries, wrapping at either end.
    pub fn cycle_model(&mut self, delta: isize) -> Option<ModelChanged> {
        let len = MODELS.len() as isize;
        let next = (self.model_index() as isize + delta).rem_euclid(len);
        self.select_model_index(next as usize)
    }

    pub fn set_temperature(&mut self, value: f32) {
        self.values.temperature = clamp_f32(value, TEMPERATURE_RANGE);
    }

    pub fn set_max_tokens(&mut self, value: u32) {
        self.values.max_tokens = value.min(MAX_TOKENS_LIMIT);
    }

    pub fn set_streaming(&mut self, value: bool) {
        self.values.streaming = value;
    }

    pub fn set_json_mode(&mut self, value: bool) {
        self.values.json_mode = value;
    }

    pub fn set_top_p(&mut self, value: f32) {
        self.values.top_p = clamp_f32(value, TOP_P_RANGE);
    }

    pub fn set_stop_sequence(&mut self, value: impl Into<String>) {
        self.values.stop_sequence = value.into();
    }

    pub fn step_temperature(&mut self, delta: f32) {
        self.set_temperature(round_step(self.values.temperature + delta));
    }

    pub fn step_top_p(&mut self, delta: f32) {
        self.set_top_p(round_step(self.values.top_p + delta));
    }

    pub fn step_max_tokens(&mut self, delta: i64) {
        let next = (self.values.max_tokens as i64 + delta).clamp(0, MAX_TOKENS_LIMIT as i64);
        self.set_max_tokens(next as u32);
    }
}

pub fn model_index(model: &str) -> Option<usize> {
    MODELS.iter().position(|candidate| *candidate == model)
}

fn clamp_f32(value: f32, (min, max): (f32, f32)) -> f32 {
    if value.is_nan() {
        return min;
    }
    value.clamp(min, max)
}

// Keeps repeated 0.1 steps from drifting to values like 0.70000005.
fn round_step(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}
