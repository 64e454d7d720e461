//! Value coercion for model-invocation parameters.
//!
//! Every function here is total. Malformed or out-of-range input is replaced
//! by a safe value instead of producing an error, so editing settings never
//! blocks the UI.

use serde_json::Value as JsonValue;

use crate::catalog::ModelCatalog;
use crate::schema::ModelConfig;

pub const MAX_TOKENS_RANGE: (f64, f64) = (0.0, 32000.0);
pub const MAX_TOKENS_FALLBACK: f64 = 2000.0;

pub const PRESENCE_PENALTY_RANGE: (f64, f64) = (-2.0, 2.0);
pub const PRESENCE_PENALTY_FALLBACK: f64 = 0.0;

pub const TEMPERATURE_RANGE: (f64, f64) = (0.0, 1.0);
/// Differs from the schema default (0.5); invalid input maps to 1.
pub const TEMPERATURE_FALLBACK: f64 = 1.0;

/// Clamps `value` into `[min, max]`, or returns `fallback` if it is not finite.
pub fn clamp_number(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if !value.is_finite() {
        return fallback;
    }
    value.max(min).min(max)
}

/// Same as [`clamp_number`] for raw, untyped input.
///
/// Anything other than a JSON number (strings, booleans, null, objects)
/// yields `fallback`.
pub fn clamp_json_number(value: &JsonValue, min: f64, max: f64, fallback: f64) -> f64 {
    match value.as_f64() {
        Some(n) => clamp_number(n, min, max, fallback),
        None => fallback,
    }
}

/// Returns `name` if the catalog lists it as available, else the default.
pub fn resolve_model(catalog: &ModelCatalog, name: &str) -> String {
    if catalog.is_available(name) {
        name.to_string()
    } else {
        tracing::debug!(
            "Model '{}' is not available, falling back to '{}'",
            name,
            catalog.default_model()
        );
        catalog.default_model().to_string()
    }
}

/// Per-field validators for [`ModelConfig`], bound to a catalog.
#[derive(Debug, Clone, Copy)]
pub struct ModelConfigValidator<'a> {
    catalog: &'a ModelCatalog,
}

impl Default for ModelConfigValidator<'static> {
    fn default() -> Self {
        Self::new(ModelCatalog::builtin())
    }
}

impl<'a> ModelConfigValidator<'a> {
    pub fn new(catalog: &'a ModelCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &'a ModelCatalog {
        self.catalog
    }

    pub fn model(&self, name: &str) -> String {
        resolve_model(self.catalog, name)
    }

    /// Clamps to `[0, 32000]` and rounds to the nearest whole token.
    pub fn max_tokens(&self, value: f64) -> u32 {
        let (min, max) = MAX_TOKENS_RANGE;
        // In range after clamping, so the cast cannot saturate.
        clamp_number(value, min, max, MAX_TOKENS_FALLBACK).round() as u32
    }

    pub fn presence_penalty(&self, value: f64) -> f64 {
        let (min, max) = PRESENCE_PENALTY_RANGE;
        clamp_number(value, min, max, PRESENCE_PENALTY_FALLBACK)
    }

    pub fn temperature(&self, value: f64) -> f64 {
        let (min, max) = TEMPERATURE_RANGE;
        clamp_number(value, min, max, TEMPERATURE_FALLBACK)
    }

    /// Runs every constrained field through its validator.
    ///
    /// Unconstrained fields (memory settings) are returned untouched.
    pub fn sanitize(&self, config: ModelConfig) -> ModelConfig {
        let sanitized = ModelConfig {
            model: self.model(&config.model),
            temperature: self.temperature(config.temperature),
            max_tokens: self.max_tokens(f64::from(config.max_tokens)),
            presence_penalty: self.presence_penalty(config.presence_penalty),
            ..config.clone()
        };

        if sanitized != config {
            tracing::debug!("Model config coerced: {:?} -> {:?}", config, sanitized);
        }

        sanitized
    }

    /// Like [`Self::sanitize`], but only for the constrained fields whose
    /// value differs from `before`.
    ///
    /// Values that were already stored out of their domain stay as they are
    /// until they are edited.
    pub fn sanitize_changes(&self, before: &ModelConfig, after: ModelConfig) -> ModelConfig {
        let mut sanitized = after.clone();
        if after.model != before.model {
            sanitized.model = self.model(&after.model);
        }
        if after.temperature != before.temperature {
            sanitized.temperature = self.temperature(after.temperature);
        }
        if after.max_tokens != before.max_tokens {
            sanitized.max_tokens = self.max_tokens(f64::from(after.max_tokens));
        }
        if after.presence_penalty != before.presence_penalty {
            sanitized.presence_penalty = self.presence_penalty(after.presence_penalty);
        }

        if sanitized != after {
            tracing::debug!("Model config coerced: {:?} -> {:?}", after, sanitized);
        }

        sanitized
    }
}
