// The composition pipeline: preset -> arrangement.
//
// `Composer` owns one registry per strategy family and the progression
// library. `compose` builds a `GenerationContext` from the preset, then for
// each track in order builds its strategy (any name-lookup failure aborts
// the whole run), generates, and hands the notes to the `Arranger`:
// - melody: `length` pitches (default: enough to fill the piece at
//   `base_duration`) with per-note timing variation and a velocity curve;
// - harmony: (root, beats) pairs at the track's fixed velocity;
// - rhythm: durations on one drum note, with a velocity pattern and
//   optional rests.
//
// All randomness comes from the single `ComposerRng` passed in, consumed
// track by track, so a seed reproduces the whole arrangement.

use crate::arrange::{Arrangement, Arranger, Note, SongHeader, StrategyOutput, Track};
use crate::error::ComposeError;
use crate::harmony::{self, HarmonyGenerator, HarmonyRegistry};
use crate::melody::{self, MelodyGenerator, MelodyRegistry, velocity_curve};
use crate::preset::{Preset, TrackRole, TrackSpec};
use crate::progression::ProgressionLibrary;
use crate::rhythm::{self, RhythmGenerator, RhythmRegistry, velocity_pattern};
use crate::strategy::GenerationContext;
use cadenza_prng::ComposerRng;

/// Shortest base duration a melody track may ask for (a 64th note).
const MIN_BASE_DURATION: f64 = 0.0625;

pub struct Composer {
    melody: MelodyRegistry,
    harmony: HarmonyRegistry,
    rhythm: RhythmRegistry,
    progressions: ProgressionLibrary,
}

impl Default for Composer {
    fn default() -> Self {
        Composer::new(ProgressionLibrary::default_library())
    }
}

impl Composer {
    pub fn new(progressions: ProgressionLibrary) -> Self {
        Composer {
            melody: melody::default_registry(),
            harmony: harmony::default_registry(),
            rhythm: rhythm::default_registry(),
            progressions,
        }
    }

    pub fn melody_registry(&self) -> &MelodyRegistry {
        &self.melody
    }

    pub fn harmony_registry(&self) -> &HarmonyRegistry {
        &self.harmony
    }

    pub fn rhythm_registry(&self) -> &RhythmRegistry {
        &self.rhythm
    }

    /// For registering additional melody strategies.
    pub fn melody_registry_mut(&mut self) -> &mut MelodyRegistry {
        &mut self.melody
    }

    pub fn harmony_registry_mut(&mut self) -> &mut HarmonyRegistry {
        &mut self.harmony
    }

    pub fn rhythm_registry_mut(&mut self) -> &mut RhythmRegistry {
        &mut self.rhythm
    }

    pub fn progressions(&self) -> &ProgressionLibrary {
        &self.progressions
    }

    pub fn progressions_mut(&mut self) -> &mut ProgressionLibrary {
        &mut self.progressions
    }

    /// Compose every track of `preset`.
    pub fn compose(
        &self,
        preset: &Preset,
        rng: &mut ComposerRng,
    ) -> Result<Arrangement, ComposeError> {
        let ctx = GenerationContext::new(preset.key, preset.beats_per_bar(), &self.progressions);
        let arranger = Arranger::new(preset.humanize);
        log::info!(
            "composing '{}': {}, {} bars of {}, {} tracks",
            preset.name,
            preset.key,
            preset.bars,
            preset.time_signature,
            preset.tracks.len()
        );

        let mut arrangement = Arrangement::new(SongHeader {
            tempo: preset.tempo,
            time_signature: preset.time_signature,
            key: preset.key,
        });
        for spec in &preset.tracks {
            let track = match spec.role {
                TrackRole::Melody => self.melody_track(spec, &ctx, preset.bars, &arranger, rng)?,
                TrackRole::Harmony => {
                    self.harmony_track(spec, &ctx, preset.bars, &arranger, rng)?
                }
                TrackRole::Rhythm => self.rhythm_track(spec, &ctx, preset.bars, &arranger, rng)?,
            };
            log::debug!(
                "track '{}' ({:?}): {} notes, ends at tick {}",
                track.name,
                spec.role,
                track.events.len(),
                track.end_tick()
            );
            arrangement.tracks.push(track);
        }

        log::info!(
            "composed {} notes across {} tracks",
            arrangement.note_count(),
            arrangement.tracks.len()
        );
        Ok(arrangement)
    }

    fn strategy_name<'s>(spec: &'s TrackSpec, default: &'s str) -> &'s str {
        spec.strategy.as_deref().unwrap_or(default)
    }

    fn melody_track(
        &self,
        spec: &TrackSpec,
        ctx: &GenerationContext<'_>,
        bars: usize,
        arranger: &Arranger,
        rng: &mut ComposerRng,
    ) -> Result<Track, ComposeError> {
        let name = Composer::strategy_name(spec, self.melody.default_name());
        let generator = MelodyGenerator::from_registry(&self.melody, name, ctx, &spec.options)?;

        let base = spec.base_duration.max(MIN_BASE_DURATION);
        let length = spec
            .length
            .unwrap_or_else(|| (ctx.total_beats(bars) / base).round() as usize);
        let timed = generator.generate_with_timing(ctx, length, base, rng);
        let velocities = velocity_curve(timed.len(), spec.velocity_curve, rng);
        let triples: Vec<_> = timed
            .into_iter()
            .zip(velocities)
            .map(|((pitch, duration), velocity)| (pitch, duration, velocity))
            .collect();

        Ok(arranger.track(
            &spec.name,
            spec.channel(),
            spec.program,
            StrategyOutput::Full(triples),
            rng,
        ))
    }

    fn harmony_track(
        &self,
        spec: &TrackSpec,
        ctx: &GenerationContext<'_>,
        bars: usize,
        arranger: &Arranger,
        rng: &mut ComposerRng,
    ) -> Result<Track, ComposeError> {
        let name = Composer::strategy_name(spec, self.harmony.default_name());
        let generator = HarmonyGenerator::from_registry(&self.harmony, name, ctx, &spec.options)?;
        let triples: Vec<_> = generator
            .generate(ctx, bars, rng)
            .into_iter()
            .map(|(root, beats)| (root, beats, spec.velocity))
            .collect();

        Ok(arranger.track(
            &spec.name,
            spec.channel(),
            spec.program,
            StrategyOutput::Full(triples),
            rng,
        ))
    }

    fn rhythm_track(
        &self,
        spec: &TrackSpec,
        ctx: &GenerationContext<'_>,
        bars: usize,
        arranger: &Arranger,
        rng: &mut ComposerRng,
    ) -> Result<Track, ComposeError> {
        let name = Composer::strategy_name(spec, self.rhythm.default_name());
        let generator = RhythmGenerator::from_registry(&self.rhythm, name, ctx, &spec.options)?;
        let marked = if spec.rest_probability > 0.0 {
            generator.generate_with_rests(ctx, bars, spec.rest_probability, rng)
        } else {
            generator
                .generate(ctx, bars, rng)
                .into_iter()
                .map(|d| (d, true))
                .collect()
        };

        let durations: Vec<f64> = marked.iter().map(|&(d, _)| d).collect();
        let velocities = velocity_pattern(&durations, spec.velocity_pattern, ctx.beats_per_bar);
        let notes: Vec<Note> = marked
            .iter()
            .zip(velocities)
            .map(|(&(duration, sounding), velocity)| {
                if sounding {
                    Note::new(spec.drum_note as i32, duration, velocity)
                } else {
                    Note::rest(duration)
                }
            })
            .collect();

        Ok(arranger.track_from_notes(&spec.name, spec.channel(), spec.program, &notes, rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arrange::TICKS_PER_BEAT;
    use crate::chord::ChordQuality;

    fn preset(toml: &str) -> Preset {
        Preset::from_toml_str(toml).unwrap()
    }

    const SIMPLE: &str = r#"
        name = "simple"
        key = "C"
        bars = 4
        humanize = 0.0

        [[tracks]]
        name = "Lead"
        role = "melody"
        base_duration = 1.0

        [[tracks]]
        name = "Chords"
        role = "harmony"
        velocity = 100
        [tracks.options]
        progression = "pop_basic"

        [[tracks]]
        name = "Kick"
        role = "rhythm"
        [tracks.options]
        pattern = "steady_quarters"
    "#;

    #[test]
    fn test_compose_simple() {
        let composer = Composer::default();
        let song = composer.compose(&preset(SIMPLE), &mut ComposerRng::new(1)).unwrap();
        assert_eq!(song.tracks.len(), 3);

        let chords = &song.tracks[1];
        assert_eq!(chords.channel, 1);
        let roots: Vec<u8> = chords.events.iter().map(|e| e.pitch).collect();
        assert_eq!(roots, vec![60, 67, 69, 65]);
        assert!(chords.events.iter().all(|e| e.duration == 4 * TICKS_PER_BEAT));
        // First chord at the intro level of the envelope.
        assert_eq!(chords.events[0].velocity, 60);

        let kick = &song.tracks[2];
        assert_eq!(kick.channel, 9);
        assert_eq!(kick.events.len(), 16);
        assert!(kick.events.iter().all(|e| e.pitch == 36));
        assert_eq!(kick.end_tick(), 16 * TICKS_PER_BEAT);

        // Default melody length fills 16 beats at one beat per note.
        assert_eq!(song.tracks[0].events.len(), 16);
    }

    #[test]
    fn test_compose_is_deterministic() {
        let composer = Composer::default();
        for name in Preset::builtin_names() {
            let p = Preset::builtin(name).unwrap();
            let a = composer.compose(&p, &mut ComposerRng::new(5)).unwrap();
            let b = composer.compose(&p, &mut ComposerRng::new(5)).unwrap();
            assert_eq!(a, b, "{name}");
        }
    }

    #[test]
    fn test_missing_name_aborts() {
        let composer = Composer::default();
        let bad = preset(
            r#"
            name = "bad"
            key = "C"
            [[tracks]]
            name = "Chords"
            role = "harmony"
            [tracks.options]
            progression = "nope"
            "#,
        );
        let err = composer.compose(&bad, &mut ComposerRng::new(1)).unwrap_err();
        assert!(matches!(err, ComposeError::NotFound { kind: "progression", .. }));
    }

    #[test]
    fn test_unknown_strategy_uses_default() {
        let composer = Composer::default();
        let p = preset(
            r#"
            name = "fallback"
            key = "G"
            bars = 2
            [[tracks]]
            name = "Lead"
            role = "melody"
            strategy = "quantum"
            length = 8
            "#,
        );
        let song = composer.compose(&p, &mut ComposerRng::new(1)).unwrap();
        assert_eq!(song.tracks[0].events.len(), 8);
    }

    #[test]
    fn test_rests_and_custom_progressions() {
        let mut composer = Composer::default();
        composer.progressions_mut().register(ProgressionLibrary::from_degrees(
            "two_five",
            "jazz",
            &[2, 5],
            &[ChordQuality::MinorSeventh, ChordQuality::DominantSeventh],
        ));
        let p = preset(
            r#"
            name = "custom"
            key = "C"
            bars = 2
            humanize = 0.0
            [[tracks]]
            name = "Chords"
            role = "harmony"
            [tracks.options]
            progression = "two_five"
            [[tracks]]
            name = "Hats"
            role = "rhythm"
            rest_probability = 1.0
            [tracks.options]
            pattern = "steady_eighths"
            "#,
        );
        let song = composer.compose(&p, &mut ComposerRng::new(3)).unwrap();
        let roots: Vec<u8> = song.tracks[0].events.iter().map(|e| e.pitch).collect();
        assert_eq!(roots, vec![62, 67]);
        assert!(song.tracks[1].events.is_empty());
    }
}
