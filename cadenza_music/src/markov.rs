// Pitch-to-pitch Markov transitions for the random-walk melody strategy.
//
// One row per scale pitch: the reachable in-scale pitches weighted by the
// interval needed to get there. Small steps dominate (seconds carry the most
// weight, then thirds, then fourths and fifths); each row is normalized to sum
// to 1. Rows can also be supplied wholesale through strategy options, in which
// case they are used as given.
//
// Consumed by melody.rs (`RandomWalk`). Sampling is a cumulative-weight draw
// through `ComposerRng::choose_weighted`.

use crate::scale::Pitch;
use cadenza_prng::ComposerRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Next pitch -> probability (or unnormalized weight).
pub type TransitionTable = BTreeMap<Pitch, f64>;

/// Interval (semitones) -> weight used to build the default rows.
pub const INTERVAL_WEIGHTS: [(i32, f64); 13] = [
    (0, 0.1),
    (1, 0.2),
    (-1, 0.2),
    (2, 0.3),
    (-2, 0.3),
    (3, 0.15),
    (-3, 0.15),
    (4, 0.1),
    (-4, 0.1),
    (5, 0.05),
    (-5, 0.05),
    (7, 0.05),
    (-7, 0.05),
];

/// First-order transition matrix over absolute pitches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PitchTransitions {
    pub rows: BTreeMap<Pitch, TransitionTable>,
}

impl PitchTransitions {
    /// Build the default matrix for a scale pitch list.
    ///
    /// Targets outside `scale` are dropped before normalizing, so a row only
    /// ever points back into the scale.
    pub fn from_scale(scale: &[Pitch]) -> Self {
        let mut rows = BTreeMap::new();
        for &pitch in scale {
            let mut row = TransitionTable::new();
            for &(step, weight) in &INTERVAL_WEIGHTS {
                let target = pitch + step;
                if scale.contains(&target) {
                    row.insert(target, weight);
                }
            }
            let total: f64 = row.values().sum();
            if total > 0.0 {
                for w in row.values_mut() {
                    *w /= total;
                }
            }
            rows.insert(pitch, row);
        }
        PitchTransitions { rows }
    }

    pub fn row(&self, pitch: Pitch) -> Option<&TransitionTable> {
        self.rows.get(&pitch)
    }

    /// Sample the successor of `pitch`. `None` when the pitch has no row or
    /// its row has no positive weight.
    pub fn sample(&self, pitch: Pitch, rng: &mut ComposerRng) -> Option<Pitch> {
        self.row(pitch).and_then(|table| sample_from_table(table, rng))
    }
}

/// Sample a key from a weighted table, in ascending key order. Consumes one
/// draw when the table has positive total weight, none otherwise.
pub fn sample_from_table(table: &TransitionTable, rng: &mut ComposerRng) -> Option<Pitch> {
    let weights: Vec<f64> = table.values().copied().collect();
    let index = rng.choose_weighted(&weights)?;
    table.keys().nth(index).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scale::Key;

    #[test]
    fn test_rows_stay_in_scale_and_normalize() {
        let scale = Key::major(0).scale_notes(4, 2);
        let transitions = PitchTransitions::from_scale(&scale);
        assert_eq!(transitions.rows.len(), scale.len());
        for (pitch, row) in &transitions.rows {
            let total: f64 = row.values().sum();
            assert!((total - 1.0).abs() < 1e-9, "row {pitch} sums to {total}");
            assert!(row.keys().all(|t| scale.contains(t)));
        }
    }

    #[test]
    fn test_c4_row_weights() {
        let scale = Key::major(0).scale_notes(4, 2);
        let transitions = PitchTransitions::from_scale(&scale);
        let row = transitions.row(60).unwrap();
        // From C4 upward only: C (0), D (+2), E (+4), F (+5), G (+7).
        let keys: Vec<Pitch> = row.keys().copied().collect();
        assert_eq!(keys, vec![60, 62, 64, 65, 67]);
        let total = 0.1 + 0.3 + 0.1 + 0.05 + 0.05;
        assert!((row[&62] - 0.3 / total).abs() < 1e-9);
    }

    #[test]
    fn test_sample_from_table() {
        let mut table = TransitionTable::new();
        table.insert(62, 1.0);
        table.insert(64, 3.0);
        table.insert(65, 0.0);

        let mut rng = ComposerRng::new(11);
        let mut reference = ComposerRng::new(11);
        let mut high = 0;
        for _ in 0..4000 {
            let picked = sample_from_table(&table, &mut rng);
            // Same draw as a direct weighted choice over the row.
            let index = reference.choose_weighted(&[1.0, 3.0, 0.0]).unwrap();
            assert_eq!(picked, Some([62, 64, 65][index]));
            assert_ne!(picked, Some(65));
            if picked == Some(64) {
                high += 1;
            }
        }
        assert!((2800..3200).contains(&high), "64 drawn {high} times");

        assert_eq!(sample_from_table(&TransitionTable::new(), &mut rng), None);
    }

    #[test]
    fn test_unmapped_pitch_has_no_sample() {
        let transitions = PitchTransitions::from_scale(&[60, 62, 64]);
        let mut rng = ComposerRng::new(3);
        assert_eq!(transitions.sample(61, &mut rng), None);
        assert!(transitions.sample(60, &mut rng).is_some());
    }
}
