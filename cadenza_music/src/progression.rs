// Named chord progressions and the library that holds them.
//
// A `ChordProgression` is a list of (scale degree 1-7, quality) pairs plus a
// style tag and a complexity rating (1-5). `ProgressionLibrary` starts from ten
// built-in progressions and can be extended at runtime (`register`) or from a
// JSON file (`load`), the same way motif libraries are loaded elsewhere.
//
// The library is owned by the `Composer` (compose.rs) and lent to strategies
// through `GenerationContext` (strategy.rs); strategies resolve progression and
// style names at construction time so a missing name fails before any
// generation starts.

use crate::chord::{Chord, ChordQuality};
use crate::error::ComposeError;
use cadenza_prng::ComposerRng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A named sequence of diatonic chords.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordProgression {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// (scale degree 1-7, quality) pairs.
    pub chords: Vec<(usize, ChordQuality)>,
    #[serde(default = "default_style")]
    pub style: String,
    /// 1 (plain) to 5 (dense).
    #[serde(default = "default_complexity")]
    pub complexity: u8,
}

fn default_style() -> String {
    "general".to_string()
}

fn default_complexity() -> u8 {
    1
}

impl ChordProgression {
    fn builtin(
        name: &str,
        description: &str,
        chords: &[(usize, ChordQuality)],
        style: &str,
        complexity: u8,
    ) -> Self {
        ChordProgression {
            name: name.to_string(),
            description: description.to_string(),
            chords: chords.to_vec(),
            style: style.to_string(),
            complexity,
        }
    }

    /// Root-position chords, with degree `d` mapped to scale index `d - 1`.
    pub fn chords(&self) -> Vec<Chord> {
        self.chords
            .iter()
            .map(|&(degree, quality)| Chord::new((degree + 6) % 7, quality))
            .collect()
    }
}

/// An ordered, name-addressable set of progressions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressionLibrary {
    pub progressions: Vec<ChordProgression>,
}

impl ProgressionLibrary {
    /// Load from JSON (`{"progressions": [...]}`).
    pub fn load(path: &Path) -> Result<Self, ComposeError> {
        let data = std::fs::read_to_string(path)?;
        let lib: ProgressionLibrary = serde_json::from_str(&data)?;
        log::info!(
            "loaded {} progressions from {}",
            lib.progressions.len(),
            path.display()
        );
        Ok(lib)
    }

    /// The ten built-in progressions.
    pub fn default_library() -> Self {
        use ChordQuality::*;
        ProgressionLibrary {
            progressions: vec![
                ChordProgression::builtin(
                    "pop_basic",
                    "I-V-vi-IV",
                    &[(1, Major), (5, Major), (6, Minor), (4, Major)],
                    "pop",
                    1,
                ),
                ChordProgression::builtin(
                    "pop_50s",
                    "Fifties doo-wop I-vi-IV-V",
                    &[(1, Major), (6, Minor), (4, Major), (5, Major)],
                    "pop",
                    1,
                ),
                ChordProgression::builtin(
                    "jazz_251",
                    "ii-V-I turnaround",
                    &[(2, Minor), (5, DominantSeventh), (1, MajorSeventh)],
                    "jazz",
                    2,
                ),
                ChordProgression::builtin(
                    "jazz_rhythm",
                    "Rhythm changes I-vi-ii-V",
                    &[
                        (1, MajorSeventh),
                        (6, MinorSeventh),
                        (2, MinorSeventh),
                        (5, DominantSeventh),
                    ],
                    "jazz",
                    2,
                ),
                ChordProgression::builtin(
                    "rock_basic",
                    "I-IV-V",
                    &[(1, Major), (4, Major), (5, Major)],
                    "rock",
                    1,
                ),
                ChordProgression::builtin(
                    "blues_basic",
                    "Condensed twelve-bar blues",
                    &[
                        (1, DominantSeventh),
                        (4, DominantSeventh),
                        (1, DominantSeventh),
                        (5, DominantSeventh),
                        (4, DominantSeventh),
                        (1, DominantSeventh),
                    ],
                    "blues",
                    2,
                ),
                ChordProgression::builtin(
                    "classical_authentic",
                    "Authentic cadence V-I",
                    &[(5, Major), (1, Major)],
                    "classical",
                    1,
                ),
                ChordProgression::builtin(
                    "classical_plagal",
                    "Plagal cadence IV-I",
                    &[(4, Major), (1, Major)],
                    "classical",
                    1,
                ),
                ChordProgression::builtin(
                    "modern_trending",
                    "vi-IV-I-V",
                    &[(6, Minor), (4, Major), (1, Major), (5, Major)],
                    "pop",
                    2,
                ),
                ChordProgression::builtin(
                    "complex_cycle",
                    "Circle of fifths with sevenths",
                    &[
                        (1, MajorSeventh),
                        (4, DominantSeventh),
                        (7, DiminishedSeventh),
                        (3, MinorSeventh),
                        (6, MinorSeventh),
                        (2, MinorSeventh),
                        (5, DominantSeventh),
                        (1, MajorSeventh),
                    ],
                    "jazz",
                    4,
                ),
            ],
        }
    }

    pub fn get(&self, name: &str) -> Result<&ChordProgression, ComposeError> {
        self.progressions
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ComposeError::not_found("progression", name))
    }

    pub fn by_style(&self, style: &str) -> Vec<&ChordProgression> {
        self.progressions
            .iter()
            .filter(|p| p.style == style)
            .collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.progressions.iter().map(|p| p.name.as_str())
    }

    /// Pick a progression at random among those matching `style` (any style
    /// when `None`) with complexity at most `max_complexity` (clamped to 1-5).
    /// Falls back to `pop_basic` when nothing matches.
    pub fn random(
        &self,
        style: Option<&str>,
        max_complexity: u8,
        rng: &mut ComposerRng,
    ) -> ChordProgression {
        let max_complexity =
            crate::error::clamp_param("max_complexity", max_complexity as f64, 1.0, 5.0) as u8;
        let candidates: Vec<&ChordProgression> = self
            .progressions
            .iter()
            .filter(|p| style.is_none_or(|s| p.style == s) && p.complexity <= max_complexity)
            .collect();
        match rng.choose(&candidates) {
            Some(p) => (*p).clone(),
            None => {
                log::debug!("no progression matches style {style:?}; using pop_basic");
                self.get("pop_basic")
                    .cloned()
                    .unwrap_or_else(|_| ProgressionLibrary::pop_basic())
            }
        }
    }

    fn pop_basic() -> ChordProgression {
        use ChordQuality::*;
        ChordProgression::builtin(
            "pop_basic",
            "I-V-vi-IV",
            &[(1, Major), (5, Major), (6, Minor), (4, Major)],
            "pop",
            1,
        )
    }

    /// Add a progression, replacing any existing one with the same name.
    pub fn register(&mut self, progression: ChordProgression) {
        match self
            .progressions
            .iter_mut()
            .find(|p| p.name == progression.name)
        {
            Some(existing) => *existing = progression,
            None => self.progressions.push(progression),
        }
    }

    /// Merge every progression of `other` into this library.
    pub fn extend(&mut self, other: ProgressionLibrary) {
        for p in other.progressions {
            self.register(p);
        }
    }

    /// Build a progression from parallel degree and quality lists. Extra
    /// entries in the longer list are ignored.
    pub fn from_degrees(
        name: &str,
        style: &str,
        degrees: &[usize],
        qualities: &[ChordQuality],
    ) -> ChordProgression {
        ChordProgression {
            name: name.to_string(),
            description: format!("Custom {name} progression"),
            chords: degrees.iter().copied().zip(qualities.iter().copied()).collect(),
            style: style.to_string(),
            complexity: 1,
        }
    }
}

impl Default for ProgressionLibrary {
    fn default() -> Self {
        ProgressionLibrary::default_library()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_library_contents() {
        let lib = ProgressionLibrary::default_library();
        assert_eq!(lib.progressions.len(), 10);
        let jazz = lib.get("jazz_251").unwrap();
        assert_eq!(jazz.chords[1], (5, ChordQuality::DominantSeventh));
        assert_eq!(lib.get("complex_cycle").unwrap().complexity, 4);
        for p in &lib.progressions {
            assert!((1..=5).contains(&p.complexity));
            assert!(p.chords.iter().all(|&(d, _)| (1..=7).contains(&d)));
        }
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let lib = ProgressionLibrary::default_library();
        let err = lib.get("nope").unwrap_err();
        assert!(matches!(err, ComposeError::NotFound { kind: "progression", .. }));
    }

    #[test]
    fn test_by_style() {
        let lib = ProgressionLibrary::default_library();
        let names: Vec<&str> = lib.by_style("pop").iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["pop_basic", "pop_50s", "modern_trending"]);
        assert!(lib.by_style("polka").is_empty());
    }

    #[test]
    fn test_random_respects_filters() {
        let lib = ProgressionLibrary::default_library();
        let mut rng = ComposerRng::new(5);
        for _ in 0..50 {
            let p = lib.random(Some("jazz"), 2, &mut rng);
            assert_eq!(p.style, "jazz");
            assert!(p.complexity <= 2);
        }
        let fallback = lib.random(Some("polka"), 5, &mut rng);
        assert_eq!(fallback.name, "pop_basic");
        // Complexity 0 is clamped to 1, so simple progressions still match.
        let p = lib.random(None, 0, &mut rng);
        assert_eq!(p.complexity, 1);
    }

    #[test]
    fn test_register_replaces_by_name() {
        let mut lib = ProgressionLibrary::default_library();
        let custom = ProgressionLibrary::from_degrees(
            "pop_basic",
            "pop",
            &[1, 4],
            &[ChordQuality::Major, ChordQuality::Major],
        );
        lib.register(custom);
        assert_eq!(lib.progressions.len(), 10);
        assert_eq!(lib.get("pop_basic").unwrap().chords.len(), 2);

        lib.register(ProgressionLibrary::from_degrees("x", "test", &[2], &[]));
        assert_eq!(lib.progressions.len(), 11);
        assert!(lib.get("x").unwrap().chords.is_empty());
    }

    #[test]
    fn test_chords_map_degrees_to_indices() {
        let lib = ProgressionLibrary::default_library();
        let chords = lib.get("pop_basic").unwrap().chords();
        let roots: Vec<usize> = chords.iter().map(|c| c.root).collect();
        assert_eq!(roots, vec![0, 4, 5, 3]);
    }

    #[test]
    fn test_json_round_trip_through_file() {
        let dir = std::env::temp_dir().join("cadenza_progression_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("lib.json");
        let json = r#"{"progressions": [
            {"name": "andalusian", "chords": [[6, "minor"], [5, "major"], [4, "major"], [3, "7"]], "style": "flamenco"}
        ]}"#;
        std::fs::write(&path, json).unwrap();
        let lib = ProgressionLibrary::load(&path).unwrap();
        let p = lib.get("andalusian").unwrap();
        assert_eq!(p.complexity, 1);
        assert_eq!(p.chords[3], (3, ChordQuality::DominantSeventh));
    }
}
