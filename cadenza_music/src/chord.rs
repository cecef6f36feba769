// Chord qualities, chords built on scale degrees, and chord analysis.
//
// A `Chord` is stored relative to a key: `root` is a 0-based index into the
// key's two-octave scale list, so the same chord value renders differently in
// C major and in F# minor. `Chord::pitches` turns it into concrete MIDI
// pitches, applying inversion (raise the lowest tones an octave) and an
// optional explicit bass note.
//
// The analysis helpers at the bottom (`diatonic_chord`,
// `suitable_chords_for_note`, `melody_congruence`) feed the harmony strategies
// (harmony.rs) and the genetic melody fitness (scoring.rs).

use crate::scale::{Key, Pitch};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{EnumIter, EnumString, IntoStaticStr};

/// Chord qualities from triads up to thirteenths.
///
/// Parsed and serialized by their chord symbol (`"major"`, `"m7b5"`, `"13"`,
/// ...). Unknown symbols deserialize to a plain major triad.
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
#[serde(from = "String", into = "&'static str")]
pub enum ChordQuality {
    #[strum(to_string = "major", serialize = "maj")]
    Major,
    #[strum(to_string = "minor", serialize = "min", serialize = "m")]
    Minor,
    #[strum(to_string = "diminished", serialize = "dim")]
    Diminished,
    #[strum(to_string = "augmented", serialize = "aug")]
    Augmented,
    #[strum(to_string = "sus2")]
    Suspended2,
    #[strum(to_string = "sus4")]
    Suspended4,
    #[strum(to_string = "major7", serialize = "maj7")]
    MajorSeventh,
    #[strum(to_string = "minor7", serialize = "m7")]
    MinorSeventh,
    #[strum(to_string = "7", serialize = "dom7")]
    DominantSeventh,
    #[strum(to_string = "dim7")]
    DiminishedSeventh,
    #[strum(to_string = "m7b5")]
    HalfDiminishedSeventh,
    #[strum(to_string = "mM7")]
    MinorMajorSeventh,
    #[strum(to_string = "augM7")]
    AugmentedMajorSeventh,
    #[strum(to_string = "aug7")]
    AugmentedSeventh,
    #[strum(to_string = "maj9")]
    MajorNinth,
    #[strum(to_string = "m9")]
    MinorNinth,
    #[strum(to_string = "9")]
    DominantNinth,
    #[strum(to_string = "mM9")]
    MinorMajorNinth,
    #[strum(to_string = "maj11")]
    MajorEleventh,
    #[strum(to_string = "m11")]
    MinorEleventh,
    #[strum(to_string = "11")]
    DominantEleventh,
    #[strum(to_string = "maj13")]
    MajorThirteenth,
    #[strum(to_string = "m13")]
    MinorThirteenth,
    #[strum(to_string = "13")]
    DominantThirteenth,
}

impl ChordQuality {
    /// Semitone offsets of each chord tone above the root.
    pub fn intervals(self) -> &'static [i32] {
        use ChordQuality::*;
        match self {
            Major => &[0, 4, 7],
            Minor => &[0, 3, 7],
            Diminished => &[0, 3, 6],
            Augmented => &[0, 4, 8],
            Suspended2 => &[0, 2, 7],
            Suspended4 => &[0, 5, 7],
            MajorSeventh => &[0, 4, 7, 11],
            MinorSeventh => &[0, 3, 7, 10],
            DominantSeventh => &[0, 4, 7, 10],
            DiminishedSeventh => &[0, 3, 6, 9],
            HalfDiminishedSeventh => &[0, 3, 6, 10],
            MinorMajorSeventh => &[0, 3, 7, 11],
            AugmentedMajorSeventh => &[0, 4, 8, 11],
            AugmentedSeventh => &[0, 4, 8, 10],
            MajorNinth => &[0, 4, 7, 11, 14],
            MinorNinth => &[0, 3, 7, 10, 14],
            DominantNinth => &[0, 4, 7, 10, 14],
            MinorMajorNinth => &[0, 3, 7, 11, 14],
            MajorEleventh => &[0, 4, 7, 11, 14, 17],
            MinorEleventh => &[0, 3, 7, 10, 14, 17],
            DominantEleventh => &[0, 4, 7, 10, 14, 17],
            MajorThirteenth => &[0, 4, 7, 11, 14, 17, 21],
            MinorThirteenth => &[0, 3, 7, 10, 14, 17, 21],
            DominantThirteenth => &[0, 4, 7, 10, 14, 17, 21],
        }
    }

    /// Chord symbol, e.g. `"m7b5"`.
    pub fn symbol(self) -> &'static str {
        self.into()
    }

    /// Parse a chord symbol, falling back to a major triad for anything
    /// unrecognized.
    pub fn parse_or_major(symbol: &str) -> Self {
        ChordQuality::from_str(symbol.trim()).unwrap_or(ChordQuality::Major)
    }
}

impl From<String> for ChordQuality {
    fn from(value: String) -> Self {
        ChordQuality::parse_or_major(&value)
    }
}

/// A chord relative to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chord {
    /// 0-based index into the key's scale list (0 = tonic).
    pub root: usize,
    pub quality: ChordQuality,
    /// 0 = root position, 1 = first inversion, up to 3.
    #[serde(default)]
    pub inversion: u8,
    /// Explicit bass pitch placed below the chord tones.
    #[serde(default)]
    pub bass: Option<Pitch>,
}

const ROMAN_DEGREES: [&str; 7] = ["I", "II", "III", "IV", "V", "VI", "VII"];

impl Chord {
    pub fn new(root: usize, quality: ChordQuality) -> Self {
        Chord {
            root,
            quality,
            inversion: 0,
            bass: None,
        }
    }

    pub fn with_inversion(self, inversion: u8) -> Self {
        Chord { inversion, ..self }
    }

    /// Concrete MIDI pitches of the chord in `key`, starting from `octave`.
    ///
    /// The root comes from the key's two-octave scale list; a root index past
    /// the end of that list is approximated as `first + root * 2`.
    pub fn pitches(&self, key: &Key, octave: i32) -> Vec<Pitch> {
        let scale = key.scale_notes(octave, 2);
        let first = scale.first().copied().unwrap_or(key.tonic_pitch());
        let root_pitch = scale
            .get(self.root)
            .copied()
            .unwrap_or(first + self.root as Pitch * 2);

        let mut notes: Vec<Pitch> = self
            .quality
            .intervals()
            .iter()
            .map(|&offset| root_pitch + offset)
            .collect();

        let raised = (self.inversion as usize).min(notes.len().saturating_sub(1));
        for note in notes.iter_mut().take(raised) {
            *note += 12;
        }

        if let Some(bass) = self.bass {
            let mut with_bass = Vec::with_capacity(notes.len() + 1);
            with_bass.push(bass);
            with_bass.extend(notes.into_iter().filter(|&n| n != bass));
            notes = with_bass;
        }
        notes
    }

    /// Pitch classes (0-11) sounded by the chord in `key`.
    pub fn pitch_classes(&self, key: &Key) -> [bool; 12] {
        let mut pcs = [false; 12];
        for p in self.pitches(key, 4) {
            pcs[p.rem_euclid(12) as usize] = true;
        }
        pcs
    }

    /// Roman-numeral name: degree, quality symbol, then `6` / `64` for first
    /// and second inversion. `Chord::new(4, Major).name()` is `"Vmajor"`.
    pub fn name(&self) -> String {
        let degree = ROMAN_DEGREES[self.root % 7];
        let suffix = match self.inversion {
            1 => "6",
            2 => "64",
            _ => "",
        };
        format!("{degree}{}{suffix}", self.quality.symbol())
    }
}

/// Which diatonic quality table `diatonic_chord` draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityContext {
    #[default]
    Major,
    Minor,
}

const MAJOR_QUALITIES: [ChordQuality; 7] = [
    ChordQuality::Major,
    ChordQuality::Minor,
    ChordQuality::Minor,
    ChordQuality::Major,
    ChordQuality::Major,
    ChordQuality::Minor,
    ChordQuality::Diminished,
];

// VII is major here (harmonic minor leading-tone chord root).
const MINOR_QUALITIES: [ChordQuality; 7] = [
    ChordQuality::Minor,
    ChordQuality::Diminished,
    ChordQuality::Major,
    ChordQuality::Minor,
    ChordQuality::Minor,
    ChordQuality::Major,
    ChordQuality::Major,
];

/// The diatonic triad on `degree` (1-7; other values wrap).
///
/// Uses the minor quality table only when both the context and the key are
/// minor; otherwise the major table.
pub fn diatonic_chord(degree: usize, key: &Key, context: QualityContext) -> Chord {
    let root = (degree + 6) % 7;
    let table = if context == QualityContext::Minor && key.is_minor() {
        &MINOR_QUALITIES
    } else {
        &MAJOR_QUALITIES
    };
    Chord::new(root, table[root])
}

/// Diatonic chords (degrees 1-7, major table) containing the note's pitch
/// class.
pub fn suitable_chords_for_note(pitch: Pitch, key: &Key) -> Vec<Chord> {
    let pc = pitch.rem_euclid(12) as usize;
    (1..=7)
        .map(|degree| diatonic_chord(degree, key, QualityContext::Major))
        .filter(|chord| chord.pitch_classes(key)[pc])
        .collect()
}

/// How well a melody sits over a chord: 1.0 per chord tone, 0.5 per other
/// scale tone, averaged over the notes. An empty melody scores 0.0.
pub fn melody_congruence(melody: &[Pitch], chord: &Chord, key: &Key) -> f64 {
    if melody.is_empty() {
        return 0.0;
    }
    let chord_pcs = chord.pitch_classes(key);
    let total: f64 = melody
        .iter()
        .map(|&note| {
            if chord_pcs[note.rem_euclid(12) as usize] {
                1.0
            } else if key.contains(note) {
                0.5
            } else {
                0.0
            }
        })
        .sum();
    total / melody.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::ScaleType;
    use strum::IntoEnumIterator;

    #[test]
    fn test_quality_count_and_roots() {
        assert_eq!(ChordQuality::iter().count(), 24);
        for q in ChordQuality::iter() {
            assert_eq!(q.intervals()[0], 0, "{q:?} must start on the root");
        }
    }

    #[test]
    fn test_quality_symbols() {
        assert_eq!(ChordQuality::DominantSeventh.symbol(), "7");
        assert_eq!(ChordQuality::parse_or_major("m7b5"), ChordQuality::HalfDiminishedSeventh);
        assert_eq!(ChordQuality::parse_or_major("maj7"), ChordQuality::MajorSeventh);
        assert_eq!(ChordQuality::parse_or_major("wobble"), ChordQuality::Major);
        let q: ChordQuality = serde_json::from_str("\"13\"").unwrap();
        assert_eq!(q, ChordQuality::DominantThirteenth);
        assert_eq!(serde_json::to_string(&ChordQuality::Minor).unwrap(), "\"minor\"");
    }

    #[test]
    fn test_tonic_triad_pitches() {
        let key = Key::major(0);
        let chord = Chord::new(0, ChordQuality::Major);
        assert_eq!(chord.pitches(&key, 4), vec![60, 64, 67]);
        assert_eq!(chord.with_inversion(1).pitches(&key, 4), vec![72, 64, 67]);
        assert_eq!(chord.with_inversion(3).pitches(&key, 4), vec![72, 76, 67]);
    }

    #[test]
    fn test_root_past_scale_is_approximated() {
        let key = Key::major(0);
        let chord = Chord::new(20, ChordQuality::Major);
        assert_eq!(chord.pitches(&key, 4)[0], 60 + 40);
    }

    #[test]
    fn test_bass_note_goes_first() {
        let key = Key::major(0);
        let mut chord = Chord::new(0, ChordQuality::Major);
        chord.bass = Some(64);
        assert_eq!(chord.pitches(&key, 4), vec![64, 60, 67]);
        chord.bass = Some(55);
        assert_eq!(chord.pitches(&key, 4), vec![55, 60, 64, 67]);
    }

    #[test]
    fn test_chord_name() {
        assert_eq!(Chord::new(4, ChordQuality::DominantSeventh).name(), "V7");
        assert_eq!(
            Chord::new(0, ChordQuality::Major).with_inversion(2).name(),
            "Imajor64"
        );
        assert_eq!(Chord::new(8, ChordQuality::Minor).name(), "IIminor");
    }

    #[test]
    fn test_diatonic_chord_tables() {
        let c = Key::major(0);
        let a = Key::minor(9);
        assert_eq!(diatonic_chord(1, &c, QualityContext::Major).quality, ChordQuality::Major);
        assert_eq!(diatonic_chord(7, &c, QualityContext::Major).quality, ChordQuality::Diminished);
        assert_eq!(diatonic_chord(2, &c, QualityContext::Major).root, 1);
        // Minor table needs both a minor context and a minor key.
        assert_eq!(diatonic_chord(1, &a, QualityContext::Minor).quality, ChordQuality::Minor);
        assert_eq!(diatonic_chord(1, &c, QualityContext::Minor).quality, ChordQuality::Major);
        assert_eq!(diatonic_chord(1, &a, QualityContext::Major).quality, ChordQuality::Major);
        assert_eq!(diatonic_chord(0, &c, QualityContext::Major).root, 6);
    }

    #[test]
    fn test_suitable_chords_for_note() {
        let key = Key::major(0);
        let roots: Vec<usize> = suitable_chords_for_note(60, &key)
            .iter()
            .map(|c| c.root)
            .collect();
        // C belongs to I, IV and vi.
        assert_eq!(roots, vec![0, 3, 5]);
        assert!(suitable_chords_for_note(61, &key).is_empty());
    }

    #[test]
    fn test_melody_congruence() {
        let key = Key::new(0, ScaleType::Major);
        let tonic = Chord::new(0, ChordQuality::Major);
        assert_eq!(melody_congruence(&[60, 64, 67], &tonic, &key), 1.0);
        assert_eq!(melody_congruence(&[62], &tonic, &key), 0.5);
        assert_eq!(melody_congruence(&[61], &tonic, &key), 0.0);
        assert_eq!(melody_congruence(&[60, 62], &tonic, &key), 0.75);
        assert_eq!(melody_congruence(&[], &tonic, &key), 0.0);
    }
}
