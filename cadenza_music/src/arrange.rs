// Arrangement assembler: strategy output -> timed note events.
//
// Strategies return bare pitches, (pitch, duration) pairs or full
// (pitch, duration, velocity) triples. `StrategyOutput` normalizes all three
// into `Note`s (duration 1 beat and velocity 100 when missing). The
// `Arranger` then walks a track's notes in order and:
// - scales each velocity by `structural_envelope(p)`, where `p` is the share
//   of the track's total beats elapsed before the note (fade in, body, swell,
//   fade out);
// - converts beats to ticks at `TICKS_PER_BEAT`, jitters the tick count by up
//   to +/- `humanize` (a fraction), and floors it at one tick;
// - lays the notes back to back, so a track is a single non-overlapping
//   voice. Rests advance the clock without emitting an event.
//
// The result (`Arrangement`: a `SongHeader` plus `Track`s of `NoteEvent`s) is
// the hand-off to the MIDI sink (midi.rs).

use crate::error::clamp_param;
use crate::scale::{Key, Pitch, TimeSignature};
use cadenza_prng::ComposerRng;
use serde::Serialize;

/// Tick resolution of every arrangement.
pub const TICKS_PER_BEAT: u32 = 480;
pub const DEFAULT_DURATION: f64 = 1.0;
pub const DEFAULT_VELOCITY: u8 = 100;
/// Default timing jitter, as a fraction of each note's length.
pub const DEFAULT_HUMANIZE: f64 = 0.05;

/// One note in beats, before timing is resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub pitch: Pitch,
    pub duration: f64,
    pub velocity: u8,
    /// Silent: occupies time but emits no event.
    pub rest: bool,
}

impl Note {
    pub fn new(pitch: Pitch, duration: f64, velocity: u8) -> Self {
        Note {
            pitch,
            duration,
            velocity,
            rest: false,
        }
    }

    pub fn rest(duration: f64) -> Self {
        Note {
            pitch: 0,
            duration,
            velocity: 0,
            rest: true,
        }
    }
}

/// The three shapes strategies hand to the arranger.
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyOutput {
    Pitches(Vec<Pitch>),
    Timed(Vec<(Pitch, f64)>),
    Full(Vec<(Pitch, f64, u8)>),
}

impl StrategyOutput {
    pub fn into_notes(self) -> Vec<Note> {
        match self {
            StrategyOutput::Pitches(pitches) => pitches
                .into_iter()
                .map(|p| Note::new(p, DEFAULT_DURATION, DEFAULT_VELOCITY))
                .collect(),
            StrategyOutput::Timed(pairs) => pairs
                .into_iter()
                .map(|(p, d)| Note::new(p, d, DEFAULT_VELOCITY))
                .collect(),
            StrategyOutput::Full(triples) => triples
                .into_iter()
                .map(|(p, d, v)| Note::new(p, d, v))
                .collect(),
        }
    }
}

impl From<Vec<Pitch>> for StrategyOutput {
    fn from(pitches: Vec<Pitch>) -> Self {
        StrategyOutput::Pitches(pitches)
    }
}

impl From<Vec<(Pitch, f64)>> for StrategyOutput {
    fn from(pairs: Vec<(Pitch, f64)>) -> Self {
        StrategyOutput::Timed(pairs)
    }
}

impl From<Vec<(Pitch, f64, u8)>> for StrategyOutput {
    fn from(triples: Vec<(Pitch, f64, u8)>) -> Self {
        StrategyOutput::Full(triples)
    }
}

/// Velocity factor at progress `p` (0..=1) through a track.
///
/// Rises 0.6 -> 1.0 over the first 15%, holds 1.0 until 70%, swells to 1.2
/// at 90%, then falls to 0.7 at the end.
pub fn structural_envelope(p: f64) -> f64 {
    if p < 0.15 {
        0.6 + (p / 0.15) * 0.4
    } else if p < 0.70 {
        1.0
    } else if p < 0.90 {
        1.0 + ((p - 0.70) / 0.20) * 0.2
    } else {
        1.2 - ((p - 0.90) / 0.10) * 0.5
    }
}

/// A resolved note: MIDI pitch and velocity, times in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NoteEvent {
    pub pitch: u8,
    pub velocity: u8,
    pub start: u32,
    pub duration: u32,
}

impl NoteEvent {
    pub fn end(&self) -> u32 {
        self.start.saturating_add(self.duration)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    pub name: String,
    /// MIDI channel 0-15 (9 is General MIDI percussion).
    pub channel: u8,
    /// General MIDI program 0-127.
    pub program: u8,
    pub events: Vec<NoteEvent>,
}

impl Track {
    pub fn end_tick(&self) -> u32 {
        self.events.last().map_or(0, NoteEvent::end)
    }
}

/// Track-independent song data, written as header meta events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SongHeader {
    /// Beats per minute.
    pub tempo: u32,
    #[serde(serialize_with = "serialize_display")]
    pub time_signature: TimeSignature,
    #[serde(serialize_with = "serialize_display")]
    pub key: Key,
}

fn serialize_display<T: std::fmt::Display, S: serde::Serializer>(
    value: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Arrangement {
    pub header: SongHeader,
    pub tracks: Vec<Track>,
}

impl Arrangement {
    pub fn new(header: SongHeader) -> Self {
        Arrangement {
            header,
            tracks: Vec::new(),
        }
    }

    pub fn note_count(&self) -> usize {
        self.tracks.iter().map(|t| t.events.len()).sum()
    }

    /// Tick at which the last note of any track ends.
    pub fn end_tick(&self) -> u32 {
        self.tracks.iter().map(Track::end_tick).max().unwrap_or(0)
    }
}

/// Turns notes into tick-timed events.
#[derive(Debug, Clone)]
pub struct Arranger {
    humanize: f64,
}

impl Default for Arranger {
    fn default() -> Self {
        Arranger {
            humanize: DEFAULT_HUMANIZE,
        }
    }
}

impl Arranger {
    /// `humanize` is the largest relative timing jitter, clamped to [0, 0.5].
    pub fn new(humanize: f64) -> Self {
        Arranger {
            humanize: clamp_param("humanize", humanize, 0.0, 0.5),
        }
    }

    /// Resolve `notes` into back-to-back events starting at tick 0.
    pub fn assemble(&self, notes: &[Note], rng: &mut ComposerRng) -> Vec<NoteEvent> {
        let total: f64 = notes.iter().map(|n| n.duration.max(0.0)).sum();
        let mut events = Vec::with_capacity(notes.len());
        let mut elapsed = 0.0;
        let mut cursor: u32 = 0;

        for note in notes {
            let beats = note.duration.max(0.0);
            let progress = if total > 0.0 { elapsed / total } else { 0.0 };
            elapsed += beats;

            let mut ticks = (beats * TICKS_PER_BEAT as f64).round();
            if self.humanize > 0.0 {
                let jitter = rng.range_f64(-self.humanize, self.humanize);
                ticks = (ticks * (1.0 + jitter)).round();
            }
            let ticks = (ticks as u32).max(1);

            if !note.rest {
                let factor = structural_envelope(progress);
                let velocity = (note.velocity as f64 * factor).round().clamp(1.0, 127.0) as u8;
                events.push(NoteEvent {
                    pitch: note.pitch.clamp(0, 127) as u8,
                    velocity,
                    start: cursor,
                    duration: ticks,
                });
            }
            cursor = cursor.saturating_add(ticks);
        }
        events
    }

    /// Normalize one strategy's output and assemble it into a named track.
    pub fn track(
        &self,
        name: &str,
        channel: u8,
        program: u8,
        output: impl Into<StrategyOutput>,
        rng: &mut ComposerRng,
    ) -> Track {
        let notes = output.into().into_notes();
        self.track_from_notes(name, channel, program, &notes, rng)
    }

    pub fn track_from_notes(
        &self,
        name: &str,
        channel: u8,
        program: u8,
        notes: &[Note],
        rng: &mut ComposerRng,
    ) -> Track {
        if channel > 15 {
            log::warn!("track '{name}': channel {channel} is out of range, using 15");
        }
        if program > 127 {
            log::warn!("track '{name}': program {program} is out of range, using 127");
        }
        let events = self.assemble(notes, rng);
        log::debug!("track '{name}': {} events", events.len());
        Track {
            name: name.to_string(),
            channel: channel.min(15),
            program: program.min(127),
            events,
        }
    }
}
