// Error type for the composition engine.
//
// Only configuration resolution can fail: looking up a named progression,
// style or rhythm pattern, parsing a key or time signature, deserializing
// strategy options, and the I/O around presets and the MIDI sink. Generation
// itself never fails; out-of-range numeric parameters are clamped with a
// warning instead (see `clamp_param`).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComposeError {
    /// A named entity (progression, style, rhythm pattern, preset) is absent.
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },
    #[error("invalid key name: {0}")]
    InvalidKey(String),
    #[error("invalid time signature: {0}")]
    InvalidTimeSignature(String),
    #[error("invalid options for strategy '{strategy}': {source}")]
    Options {
        strategy: String,
        source: serde_json::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("preset parse error: {0}")]
    PresetToml(#[from] toml::de::Error),
    #[error("JSON parse error: {0}")]
    PresetJson(#[from] serde_json::Error),
    #[error("MIDI write error: {0}")]
    Midi(String),
}

impl ComposeError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        ComposeError::NotFound {
            kind,
            name: name.into(),
        }
    }
}

/// Clamp an out-of-range parameter to its nearest bound, logging when the
/// value had to move.
pub fn clamp_param(name: &str, value: f64, low: f64, high: f64) -> f64 {
    let clamped = value.clamp(low, high);
    if clamped != value {
        log::warn!("{name} = {value} is outside [{low}, {high}]; using {clamped}");
    }
    clamped
}
