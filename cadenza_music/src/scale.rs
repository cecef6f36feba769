// Scales, keys and time signatures.
//
// The bottom of the theory model. A `ScaleType` is an interval pattern of
// semitone steps (summing to one octave), a `Key` pairs a tonic pitch class
// with a scale type, and `scale_notes` expands a key into concrete ascending
// MIDI pitches. Every generation strategy starts from the pitch list this
// module produces.
//
// Pitches are carried as `i32` (`Pitch`) throughout generation so that
// transposition and extrapolation never wrap; they are clipped to 0-127 only
// when the arranger emits note events (arrange.rs).

use crate::error::ComposeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// A MIDI pitch number during generation (may temporarily leave 0-127).
pub type Pitch = i32;

/// Middle C.
pub const C4: Pitch = 60;
/// Concert A.
pub const A4: Pitch = 69;

/// Named intervals in semitones.
pub mod interval {
    pub const UNISON: i32 = 0;
    pub const MINOR_SECOND: i32 = 1;
    pub const MAJOR_SECOND: i32 = 2;
    pub const MINOR_THIRD: i32 = 3;
    pub const MAJOR_THIRD: i32 = 4;
    pub const PERFECT_FOURTH: i32 = 5;
    pub const TRITONE: i32 = 6;
    pub const PERFECT_FIFTH: i32 = 7;
    pub const MINOR_SIXTH: i32 = 8;
    pub const MAJOR_SIXTH: i32 = 9;
    pub const MINOR_SEVENTH: i32 = 10;
    pub const MAJOR_SEVENTH: i32 = 11;
    pub const OCTAVE: i32 = 12;
}

/// Scale types, each defined by its step pattern from the tonic.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ScaleType {
    Major,
    Minor,
    HarmonicMinor,
    MelodicMinor,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Locrian,
    PentatonicMajor,
    PentatonicMinor,
    Blues,
    Chromatic,
    WholeTone,
}

impl ScaleType {
    /// Semitone steps between consecutive scale degrees, one octave's worth.
    pub fn intervals(self) -> &'static [i32] {
        match self {
            ScaleType::Major => &[2, 2, 1, 2, 2, 2, 1],
            ScaleType::Minor => &[2, 1, 2, 2, 1, 2, 2],
            ScaleType::HarmonicMinor => &[2, 1, 2, 2, 1, 3, 1],
            ScaleType::MelodicMinor => &[2, 1, 2, 2, 2, 2, 1],
            ScaleType::Dorian => &[2, 1, 2, 2, 2, 1, 2],
            ScaleType::Phrygian => &[1, 2, 2, 2, 1, 2, 2],
            ScaleType::Lydian => &[2, 2, 2, 1, 2, 2, 1],
            ScaleType::Mixolydian => &[2, 2, 1, 2, 2, 1, 2],
            ScaleType::Locrian => &[1, 2, 2, 1, 2, 2, 2],
            ScaleType::PentatonicMajor => &[2, 2, 3, 2, 3],
            ScaleType::PentatonicMinor => &[3, 2, 2, 3, 2],
            ScaleType::Blues => &[3, 2, 1, 1, 3, 2],
            ScaleType::Chromatic => &[1; 12],
            ScaleType::WholeTone => &[2; 6],
        }
    }

    /// Pitch classes (relative to the tonic) that belong to the scale.
    pub fn pitch_classes(self) -> [bool; 12] {
        let mut pcs = [false; 12];
        let mut offset = 0;
        pcs[0] = true;
        for &step in self.intervals() {
            offset = (offset + step) % 12;
            pcs[offset as usize] = true;
        }
        pcs
    }

    pub fn name(self) -> &'static str {
        self.into()
    }
}

/// A key: tonic pitch class plus scale type. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Key {
    /// Tonic pitch class (0 = C, 2 = D, ... 11 = B).
    pub tonic: u8,
    pub scale: ScaleType,
}

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "Eb", "E", "F", "F#", "G", "Ab", "A", "Bb", "B",
];

impl Key {
    pub fn new(tonic: u8, scale: ScaleType) -> Self {
        Key {
            tonic: tonic % 12,
            scale,
        }
    }

    pub fn major(tonic: u8) -> Self {
        Key::new(tonic, ScaleType::Major)
    }

    pub fn minor(tonic: u8) -> Self {
        Key::new(tonic, ScaleType::Minor)
    }

    /// MIDI pitch of the tonic in the fourth octave (C4 = 60 ... B4 = 71).
    pub fn tonic_pitch(&self) -> Pitch {
        C4 + self.tonic as Pitch
    }

    /// True when the scale's third lies a minor third above the tonic.
    pub fn is_minor(&self) -> bool {
        let pcs = self.scale.pitch_classes();
        pcs[3] && !pcs[4]
    }

    /// Whether a pitch's class belongs to this key's scale.
    pub fn contains(&self, pitch: Pitch) -> bool {
        let pc = (pitch - self.tonic as Pitch).rem_euclid(12);
        self.scale.pitch_classes()[pc as usize]
    }

    /// Scale pitches of this key's own scale type.
    pub fn scale_notes(&self, octave: i32, num_octaves: usize) -> Vec<Pitch> {
        scale_notes(self, None, octave, num_octaves)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", NOTE_NAMES[self.tonic as usize], self.scale.name())
    }
}

fn parse_tonic(name: &str) -> Option<(u8, &str)> {
    let mut chars = name.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let base: i32 = match letter {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };
    let rest = &name[1..];
    let (accidental, rest) = if let Some(r) = rest.strip_prefix('#') {
        (1, r)
    } else if let Some(r) = rest.strip_prefix("_sharp") {
        (1, r)
    } else if let Some(r) = rest.strip_prefix("_flat") {
        (-1, r)
    } else if let Some(r) = rest.strip_prefix('b') {
        (-1, r)
    } else {
        (0, rest)
    };
    Some(((base + accidental).rem_euclid(12) as u8, rest))
}

impl FromStr for Key {
    type Err = ComposeError;

    /// Accepts `"C"`, `"F#"`, `"Bb"`, `"Am"`, `"C#m"`, `"D dorian"`,
    /// `"a_minor"` and `"C_SHARP_MAJOR"` style names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lowered = trimmed.to_ascii_lowercase();
        // Preserve a lowercase 'b' flat only right after the letter.
        let normalized: String = trimmed
            .chars()
            .take(1)
            .chain(lowered.chars().skip(1))
            .collect();
        let (tonic, rest) =
            parse_tonic(&normalized).ok_or_else(|| ComposeError::InvalidKey(s.to_string()))?;
        let rest = rest.trim_start_matches([' ', '_', '-']);
        let scale = match rest {
            "" => ScaleType::Major,
            "m" => ScaleType::Minor,
            other => ScaleType::from_str(other)
                .map_err(|_| ComposeError::InvalidKey(s.to_string()))?,
        };
        Ok(Key::new(tonic, scale))
    }
}

impl TryFrom<String> for Key {
    type Error = ComposeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Expand a key into ascending scale pitches.
///
/// Starts at `tonic + (octave - 4) * 12`, walks the scale's step pattern
/// `num_octaves` times and drops the final repeated tonic. `scale` overrides
/// the key's own scale type.
pub fn scale_notes(
    key: &Key,
    scale: Option<ScaleType>,
    octave: i32,
    num_octaves: usize,
) -> Vec<Pitch> {
    let scale = scale.unwrap_or(key.scale);
    let start = key.tonic_pitch() + (octave - 4) * 12;
    let mut notes = vec![start];
    let mut current = start;
    for _ in 0..num_octaves {
        for &step in scale.intervals() {
            current += step;
            notes.push(current);
        }
    }
    notes.pop();
    notes
}

/// Index of the pitch in `scale` closest to `pitch` (lowest index on ties).
/// Returns 0 for an empty list.
pub fn nearest_index(scale: &[Pitch], pitch: Pitch) -> usize {
    let mut best = 0;
    for (i, &p) in scale.iter().enumerate() {
        if (p - pitch).abs() < (scale[best] - pitch).abs() {
            best = i;
        }
    }
    best
}

/// Find the key a piece would modulate to when moving to `target_degree`.
///
/// Walks `target_degree - 1` steps of the key's scale from the tonic, folds
/// the result into the C4 octave, then returns the key of the same scale type
/// whose tonic pitch is nearest (lowest pitch class wins ties).
pub fn modulate(key: &Key, target_degree: usize) -> Key {
    let steps = key.scale.intervals();
    let walked = key.tonic_pitch()
        + steps
            .iter()
            .take(target_degree.saturating_sub(1))
            .sum::<i32>();
    let target = C4 + (walked - C4).rem_euclid(12);

    let mut best = *key;
    let mut best_distance = i32::MAX;
    for pc in 0..12u8 {
        let candidate = Key::new(pc, key.scale);
        let distance = (candidate.tonic_pitch() - target).abs();
        if distance < best_distance {
            best_distance = distance;
            best = candidate;
        }
    }
    best
}

/// Every major and natural minor key, the enumeration presets draw from.
pub fn common_keys() -> Vec<Key> {
    [ScaleType::Major, ScaleType::Minor]
        .into_iter()
        .flat_map(|scale| (0..12u8).map(move |pc| Key::new(pc, scale)))
        .collect()
}

/// All scale types, in declaration order.
pub fn all_scale_types() -> Vec<ScaleType> {
    ScaleType::iter().collect()
}

/// Supported meters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum TimeSignature {
    TwoFour,
    ThreeFour,
    #[default]
    FourFour,
    SixEight,
    ThreeEight,
    NineEight,
    TwelveEight,
}

impl TimeSignature {
    /// (numerator, denominator).
    pub fn parts(self) -> (u8, u8) {
        match self {
            TimeSignature::TwoFour => (2, 4),
            TimeSignature::ThreeFour => (3, 4),
            TimeSignature::FourFour => (4, 4),
            TimeSignature::SixEight => (6, 8),
            TimeSignature::ThreeEight => (3, 8),
            TimeSignature::NineEight => (9, 8),
            TimeSignature::TwelveEight => (12, 8),
        }
    }

    /// Bar length in quarter-note beats.
    pub fn beats_per_bar(self) -> f64 {
        let (num, den) = self.parts();
        num as f64 * 4.0 / den as f64
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (num, den) = self.parts();
        write!(f, "{num}/{den}")
    }
}

impl FromStr for TimeSignature {
    type Err = ComposeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "2/4" => Ok(TimeSignature::TwoFour),
            "3/4" => Ok(TimeSignature::ThreeFour),
            "4/4" => Ok(TimeSignature::FourFour),
            "6/8" => Ok(TimeSignature::SixEight),
            "3/8" => Ok(TimeSignature::ThreeEight),
            "9/8" => Ok(TimeSignature::NineEight),
            "12/8" => Ok(TimeSignature::TwelveEight),
            other => Err(ComposeError::InvalidTimeSignature(other.to_string())),
        }
    }
}

impl TryFrom<String> for TimeSignature {
    type Error = ComposeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
