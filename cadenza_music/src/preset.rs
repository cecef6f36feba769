// Preset files: everything needed to compose one piece.
//
// A `Preset` names the key, tempo, meter, length and humanization of a
// piece plus a list of `TrackSpec`s, each selecting a strategy by role and
// name with a free-form options table that the strategy deserializes itself
// (strategy.rs). Presets are TOML (`.toml`) or JSON (anything else); three
// built-ins (`pop`, `jazz`, `classical`) are compiled into the binary from
// `presets/`.
//
// Key and time signature strings are parsed during deserialization, so a
// bad value fails the load with `InvalidKey` / `InvalidTimeSignature`.

use crate::arrange::DEFAULT_HUMANIZE;
use crate::error::ComposeError;
use crate::melody::VelocityCurve;
use crate::rhythm::VelocityPattern;
use crate::scale::{Key, TimeSignature};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

const BUILTINS: [(&str, &str); 3] = [
    ("pop", include_str!("../presets/pop.toml")),
    ("jazz", include_str!("../presets/jazz.toml")),
    ("classical", include_str!("../presets/classical.toml")),
];

/// Which strategy family a track draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackRole {
    Melody,
    Harmony,
    Rhythm,
}

impl TrackRole {
    /// Channel used when a track does not name one.
    pub fn default_channel(self) -> u8 {
        match self {
            TrackRole::Melody => 0,
            TrackRole::Harmony => 1,
            TrackRole::Rhythm => 9,
        }
    }
}

fn default_base_duration() -> f64 {
    0.5
}

fn default_harmony_velocity() -> u8 {
    80
}

fn default_drum_note() -> u8 {
    36
}

/// One track of a preset.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackSpec {
    pub name: String,
    pub role: TrackRole,
    /// Strategy name; the family's default when absent.
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub channel: Option<u8>,
    #[serde(default)]
    pub program: u8,
    /// Strategy options, passed through untouched.
    #[serde(default)]
    pub options: Value,

    // Melody
    /// Note count; defaults to filling the piece at `base_duration`.
    #[serde(default)]
    pub length: Option<usize>,
    #[serde(default = "default_base_duration")]
    pub base_duration: f64,
    #[serde(default)]
    pub velocity_curve: VelocityCurve,

    // Harmony
    #[serde(default = "default_harmony_velocity")]
    pub velocity: u8,

    // Rhythm
    #[serde(default = "default_drum_note")]
    pub drum_note: u8,
    #[serde(default)]
    pub velocity_pattern: VelocityPattern,
    #[serde(default)]
    pub rest_probability: f64,
}

impl TrackSpec {
    pub fn channel(&self) -> u8 {
        self.channel.unwrap_or(self.role.default_channel())
    }
}

fn default_tempo() -> u32 {
    120
}

fn default_bars() -> usize {
    16
}

fn default_humanize() -> f64 {
    DEFAULT_HUMANIZE
}

#[derive(Debug, Clone, Deserialize)]
pub struct Preset {
    pub name: String,
    pub key: Key,
    /// Beats per minute.
    #[serde(default = "default_tempo")]
    pub tempo: u32,
    #[serde(default = "default_bars")]
    pub bars: usize,
    #[serde(default)]
    pub time_signature: TimeSignature,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_humanize")]
    pub humanize: f64,
    #[serde(default)]
    pub tracks: Vec<TrackSpec>,
}

impl Preset {
    pub fn from_toml_str(text: &str) -> Result<Self, ComposeError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ComposeError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a preset file, TOML when the extension is `.toml` and JSON
    /// otherwise.
    pub fn load(path: &Path) -> Result<Self, ComposeError> {
        let text = std::fs::read_to_string(path)?;
        let preset = if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("toml")) {
            Preset::from_toml_str(&text)?
        } else {
            Preset::from_json_str(&text)?
        };
        log::info!(
            "loaded preset '{}' from {} ({} tracks)",
            preset.name,
            path.display(),
            preset.tracks.len()
        );
        Ok(preset)
    }

    /// One of the presets shipped with the crate.
    pub fn builtin(name: &str) -> Result<Self, ComposeError> {
        let (_, text) = BUILTINS
            .iter()
            .find(|(n, _)| *n == name)
            .ok_or_else(|| ComposeError::not_found("preset", name))?;
        Preset::from_toml_str(text)
    }

    pub fn builtin_names() -> Vec<&'static str> {
        BUILTINS.iter().map(|(n, _)| *n).collect()
    }

    /// A built-in name, or else a path to a preset file.
    pub fn resolve(name_or_path: &str) -> Result<Self, ComposeError> {
        if Preset::builtin_names().contains(&name_or_path) {
            Preset::builtin(name_or_path)
        } else {
            Preset::load(Path::new(name_or_path))
        }
    }

    pub fn beats_per_bar(&self) -> f64 {
        self.time_signature.beats_per_bar()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::ScaleType;

    #[test]
    fn test_builtins_parse() {
        for name in Preset::builtin_names() {
            let preset = Preset::builtin(name).unwrap();
            assert_eq!(preset.name, name);
            assert!(!preset.tracks.is_empty());
            let roles: Vec<TrackRole> = preset.tracks.iter().map(|t| t.role).collect();
            assert!(roles.contains(&TrackRole::Melody));
            assert!(roles.contains(&TrackRole::Harmony));
            assert!(roles.contains(&TrackRole::Rhythm));
        }
        assert!(matches!(
            Preset::builtin("polka"),
            Err(ComposeError::NotFound { kind: "preset", .. })
        ));
    }

    #[test]
    fn test_toml_defaults() {
        let preset = Preset::from_toml_str(
            r#"
            name = "tiny"
            key = "F#m"

            [[tracks]]
            name = "Lead"
            role = "melody"
            "#,
        )
        .unwrap();
        assert_eq!(preset.key, Key::minor(6));
        assert_eq!(preset.tempo, 120);
        assert_eq!(preset.bars, 16);
        assert_eq!(preset.time_signature, TimeSignature::FourFour);
        assert_eq!(preset.humanize, 0.05);
        let track = &preset.tracks[0];
        assert_eq!(track.strategy, None);
        assert_eq!(track.channel(), 0);
        assert_eq!(track.base_duration, 0.5);
        assert!(track.options.is_null());
    }

    #[test]
    fn test_toml_options_table() {
        let preset = Preset::from_toml_str(
            r#"
            name = "opts"
            key = "D dorian"
            time_signature = "6/8"

            [[tracks]]
            name = "Kit"
            role = "rhythm"
            strategy = "pattern"
            velocity_pattern = "accent_downbeats"
            [tracks.options]
            custom = [1.0, 0.5, 0.5]
            "#,
        )
        .unwrap();
        assert_eq!(preset.key, Key::new(2, ScaleType::Dorian));
        assert_eq!(preset.beats_per_bar(), 3.0);
        let track = &preset.tracks[0];
        assert_eq!(track.channel(), 9);
        assert_eq!(track.drum_note, 36);
        assert_eq!(track.velocity_pattern, VelocityPattern::AccentDownbeats);
        assert_eq!(track.options["custom"][1], 0.5);
    }

    #[test]
    fn test_json_and_bad_values() {
        let preset = Preset::from_json_str(
            r#"{"name": "j", "key": "Bb", "tracks": [{"name": "H", "role": "harmony", "velocity": 70}]}"#,
        )
        .unwrap();
        assert_eq!(preset.key, Key::major(10));
        assert_eq!(preset.tracks[0].velocity, 70);

        assert!(Preset::from_toml_str("name = \"x\"\nkey = \"H\"").is_err());
        assert!(Preset::from_toml_str("name = \"x\"\nkey = \"C\"\ntime_signature = \"5/4\"").is_err());
    }

    #[test]
    fn test_load_by_extension() {
        let dir = std::env::temp_dir();
        let stem = format!("cadenza_preset_{}", std::process::id());
        let toml_path = dir.join(format!("{stem}.toml"));
        let json_path = dir.join(format!("{stem}.json"));
        std::fs::write(&toml_path, "name = \"t\"\nkey = \"G\"\n").unwrap();
        std::fs::write(&json_path, r#"{"name": "j", "key": "Am"}"#).unwrap();

        let t = Preset::load(&toml_path).unwrap();
        let j = Preset::resolve(json_path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&toml_path).ok();
        std::fs::remove_file(&json_path).ok();

        assert_eq!(t.key, Key::major(7));
        assert_eq!(j.key, Key::minor(9));
        assert!(Preset::load(Path::new("/nonexistent/preset.toml")).is_err());
    }
}
