// Phrase-level structure: motif-based melody phrases and functional harmony
// skeletons.
//
// `PhraseBuilder` assembles a melody from a motif, its repetitions, one
// transformed variation and a closing cadence on the tonic, then fits the
// result to the requested length (truncate, or pad by cycling the phrase).
// Used by the structured melody strategy (melody.rs).
//
// Functional skeletons map a phrase letter to four harmonic functions
// (Tonic / Subdominant / Dominant), each of which is a small set of scale
// indices. Used by the functional harmony strategy (harmony.rs).

use crate::scale::{Key, Pitch};
use serde::Deserialize;

/// How the structured strategy transforms its motif for the variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum Variation {
    /// Transpose every note up two semitones.
    #[default]
    Interval,
    /// Play the motif twice in a row.
    Rhythm,
    /// Transpose the even-indexed notes up two semitones.
    Alternate,
}

impl From<String> for Variation {
    fn from(value: String) -> Self {
        match value.as_str() {
            "interval" => Variation::Interval,
            "rhythm" => Variation::Rhythm,
            _ => Variation::Alternate,
        }
    }
}

impl Variation {
    pub fn apply(self, motif: &[Pitch]) -> Vec<Pitch> {
        match self {
            Variation::Interval => motif.iter().map(|p| p + 2).collect(),
            Variation::Rhythm => motif.iter().chain(motif).copied().collect(),
            Variation::Alternate => motif
                .iter()
                .enumerate()
                .map(|(i, &p)| if i % 2 == 0 { p + 2 } else { p })
                .collect(),
        }
    }
}

/// Accumulates phrase pieces, then fits them to a target length.
#[derive(Debug, Clone)]
pub struct PhraseBuilder {
    length: usize,
    pieces: Vec<Pitch>,
}

impl PhraseBuilder {
    pub fn new(length: usize) -> Self {
        PhraseBuilder {
            length,
            pieces: Vec::new(),
        }
    }

    pub fn add_motif(&mut self, motif: &[Pitch], repeat: usize) -> &mut Self {
        for _ in 0..repeat {
            self.pieces.extend_from_slice(motif);
        }
        self
    }

    pub fn add_variation(&mut self, motif: &[Pitch], variation: Variation) -> &mut Self {
        self.pieces.extend(variation.apply(motif));
        self
    }

    /// Two notes on the tonic.
    pub fn add_cadence(&mut self, key: &Key) -> &mut Self {
        let tonic = key.tonic_pitch();
        self.pieces.extend([tonic, tonic]);
        self
    }

    /// Exactly `length` pitches: truncated, or padded by cycling the phrase
    /// from its start.
    pub fn build(&self) -> Vec<Pitch> {
        if self.pieces.is_empty() {
            return Vec::new();
        }
        self.pieces
            .iter()
            .cycle()
            .take(self.length)
            .copied()
            .collect()
    }
}

/// Harmonic function of a chord slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarmonicFunction {
    Tonic,
    Subdominant,
    Dominant,
}

impl HarmonicFunction {
    /// 0-based scale indices a slot of this function may use.
    pub fn scale_indices(self) -> &'static [usize] {
        match self {
            HarmonicFunction::Tonic => &[0],
            HarmonicFunction::Subdominant => &[3, 4],
            HarmonicFunction::Dominant => &[4, 6],
        }
    }
}

/// The four-slot functional pattern for a phrase letter.
///
/// `A` is a statement (T S D T), `B` a contrast (S T S D); any other letter
/// falls back to the statement pattern.
pub fn phrase_skeleton(letter: char) -> [HarmonicFunction; 4] {
    use HarmonicFunction::*;
    match letter.to_ascii_uppercase() {
        'B' => [Subdominant, Tonic, Subdominant, Dominant],
        _ => [Tonic, Subdominant, Dominant, Tonic],
    }
}
