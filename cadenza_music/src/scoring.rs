// Scoring functions for the search-based melody strategies.
//
// Two measures:
// - `chord_fitness`: how well a melody fits a chord sequence. The melody is
//   divided evenly into one segment per chord; each note earns 1.0 on a chord
//   tone, 0.5 on another scale tone, 0.0 otherwise; the result is the mean.
//   Drives the genetic search.
// - `continuation_score`: a cheap shape heuristic (completion, interval
//   variety, pitch range) that only scores melodies at full length; partial
//   ones score 0.0. Drives the simulation search.
//
// Both are pure and return values in [0, 1]. Consumed by search.rs.

use crate::chord::Chord;
use crate::scale::{Key, Pitch};

/// Mean per-note congruence of `melody` against `chords`.
///
/// Segment length is `max(1, len / chords)`; notes past the last full
/// segment use the final chord. Empty melody or chord list scores 0.0.
pub fn chord_fitness(melody: &[Pitch], chords: &[Chord], key: &Key) -> f64 {
    if melody.is_empty() || chords.is_empty() {
        return 0.0;
    }
    let chord_pcs: Vec<[bool; 12]> = chords.iter().map(|c| c.pitch_classes(key)).collect();
    let segment = (melody.len() / chords.len()).max(1);

    let total: f64 = melody
        .iter()
        .enumerate()
        .map(|(i, &note)| {
            let pcs = &chord_pcs[(i / segment).min(chords.len() - 1)];
            if pcs[note.rem_euclid(12) as usize] {
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

/// Shape heuristic for a melody aiming at `target_len` notes:
/// `completion * 0.4 + interval variety * 0.4 + range * 0.2`. Melodies
/// shorter than the target score 0.0.
///
/// Interval variety is the share of distinct absolute intervals among all
/// consecutive intervals (0.0 for fewer than two notes). Range saturates at
/// two octaves.
pub fn continuation_score(notes: &[Pitch], target_len: usize) -> f64 {
    if notes.is_empty() || notes.len() < target_len {
        return 0.0;
    }
    let completion = notes.len() as f64 / target_len.max(1) as f64;

    let variety = if notes.len() > 1 {
        let mut intervals: Vec<i32> = notes.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
        let count = intervals.len();
        intervals.sort_unstable();
        intervals.dedup();
        intervals.len() as f64 / count as f64
    } else {
        0.0
    };

    let (lo, hi) = notes
        .iter()
        .fold((Pitch::MAX, Pitch::MIN), |(lo, hi), &p| (lo.min(p), hi.max(p)));
    let range = ((hi - lo) as f64 / 24.0).min(1.0);

    completion * 0.4 + variety * 0.4 + range * 0.2
}
