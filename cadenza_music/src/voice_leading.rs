// Greedy voice-leading optimizer.
//
// For a chord sequence, choose each chord's inversion so the voices move as
// little as possible from the previous chord. Movement is the sum of absolute
// pitch differences between same-index voices over the overlapping range.
// The search is greedy (one chord at a time, never revisited): O(n * 4 * k)
// for n chords of k tones.
//
// The input slice is left untouched; callers get a new list.

use crate::chord::Chord;
use crate::scale::{Key, Pitch};
use serde::{Deserialize, Serialize};

/// Voicing policies. Only `Smooth` changes anything today; the others pass
/// chords through as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceLeading {
    Close,
    Open,
    Mixed,
    #[default]
    Smooth,
}

/// Sum of |a[j] - b[j]| over the shorter of the two voicings.
pub fn movement(a: &[Pitch], b: &[Pitch]) -> i32 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}

/// Return `chords` with inversions rewritten per `strategy`.
///
/// With `Smooth`, the first chord is kept as is; every later chord gets the
/// inversion in 0..=3 (bass override dropped for the trial) that minimizes
/// movement from the previously chosen chord, first minimum winning ties.
pub fn apply_voice_leading(chords: &[Chord], key: &Key, strategy: VoiceLeading) -> Vec<Chord> {
    let mut result = chords.to_vec();
    if strategy != VoiceLeading::Smooth || chords.len() < 2 {
        return result;
    }

    let mut previous = result[0].pitches(key, 4);
    for chord in result.iter_mut().skip(1) {
        let mut best_inversion = chord.inversion;
        let mut best_movement = i32::MAX;
        for inversion in 0..=3u8 {
            let trial = Chord {
                inversion,
                bass: None,
                ..*chord
            };
            let moved = movement(&trial.pitches(key, 4), &previous);
            if moved < best_movement {
                best_movement = moved;
                best_inversion = inversion;
            }
        }
        chord.inversion = best_inversion;
        previous = chord.pitches(key, 4);
    }
    result
}
