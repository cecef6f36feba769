// Harmony strategies and the harmony generator.
//
// Each strategy turns a bar count into (root pitch, duration in beats) pairs.
// Registered by name (default `progression`):
// - `progression`: tile a named, styled or random progression over the bars,
//   with optional inversions, smooth voice leading and a duration pattern.
// - `diatonic`: a half-beat stochastic fill of diatonic chords, with an
//   optional closing cadence.
// - `functional`: phrase letters (e.g. "AABA") expanded into four-slot
//   Tonic / Subdominant / Dominant skeletons (structure.rs).
// - `hybrid`: two sub-strategies splitting the bars by ratio.
//
// Name lookups (progression, style) happen when the strategy is built; the
// random choice among a style's progressions happens per `generate` call.

use crate::chord::{Chord, ChordQuality, QualityContext, diatonic_chord};
use crate::error::{ComposeError, clamp_param};
use crate::progression::ChordProgression;
use crate::scale::{Pitch, nearest_index};
use crate::strategy::{GenerationContext, Registry, StrategySpec, parse_options};
use crate::structure::phrase_skeleton;
use crate::voice_leading::{VoiceLeading, apply_voice_leading};
use cadenza_prng::ComposerRng;
use serde::Deserialize;
use serde_json::Value;

/// Produces (root pitch, beats) pairs for a number of bars.
pub trait HarmonyStrategy {
    fn generate(
        &self,
        ctx: &GenerationContext<'_>,
        bars: usize,
        rng: &mut ComposerRng,
    ) -> Vec<(Pitch, f64)>;
}

pub type HarmonyRegistry = Registry<dyn HarmonyStrategy>;

/// Registry with the four built-in strategies; `progression` is the default.
pub fn default_registry() -> HarmonyRegistry {
    let mut registry = HarmonyRegistry::new("harmony", "progression");
    registry
        .register("progression", build_progression)
        .register("diatonic", build_diatonic)
        .register("functional", build_functional)
        .register("hybrid", build_hybrid);
    registry
}

fn root_pitch(chord: &Chord, ctx: &GenerationContext<'_>) -> Pitch {
    chord
        .pitches(&ctx.key, 4)
        .first()
        .copied()
        .unwrap_or(ctx.key.tonic_pitch())
}

// ---------------------------------------------------------------------------
// Progression based
// ---------------------------------------------------------------------------

/// Duration pattern across chord slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum ChordRhythm {
    #[default]
    Steady,
    /// Even slots 1.5x, odd slots 0.5x.
    Syncopated,
    /// Each slot scaled by a uniform factor in [0.5, 1.5).
    Random,
}

impl From<String> for ChordRhythm {
    fn from(value: String) -> Self {
        match value.as_str() {
            "syncopated" => ChordRhythm::Syncopated,
            "random" => ChordRhythm::Random,
            _ => ChordRhythm::Steady,
        }
    }
}

/// Inversion policy for tiled chords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum InversionMode {
    #[default]
    None,
    /// Uniform inversion 0-2 for every chord.
    Random,
    /// Invert (1 or 2) when the bass would leap more than `BASS_LEAP_LIMIT`.
    BassMotion,
}

impl From<String> for InversionMode {
    fn from(value: String) -> Self {
        match value.as_str() {
            "random" => InversionMode::Random,
            "bass_motion" => InversionMode::BassMotion,
            _ => InversionMode::None,
        }
    }
}

/// Largest bass leap (semitones) tolerated before `BassMotion` re-inverts.
pub const BASS_LEAP_LIMIT: i32 = 7;

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ProgressionOptions {
    #[serde(alias = "progression_name")]
    progression: Option<String>,
    style: Option<String>,
    max_complexity: u8,
    chords_per_bar: usize,
    rhythm: ChordRhythm,
    #[serde(alias = "inversion_mode")]
    inversion: InversionMode,
    #[serde(alias = "apply_voice_leading")]
    voice_leading: bool,
}

impl Default for ProgressionOptions {
    fn default() -> Self {
        ProgressionOptions {
            progression: None,
            style: None,
            max_complexity: 5,
            chords_per_bar: 1,
            rhythm: ChordRhythm::Steady,
            inversion: InversionMode::None,
            voice_leading: false,
        }
    }
}

/// Tiles one progression (picked per call among `candidates`) over the bars.
#[derive(Debug, Clone)]
pub struct ProgressionStrategy {
    pub candidates: Vec<ChordProgression>,
    pub chords_per_bar: usize,
    pub rhythm: ChordRhythm,
    pub inversion: InversionMode,
    pub voice_leading: bool,
}

fn build_progression(
    _: &HarmonyRegistry,
    ctx: &GenerationContext<'_>,
    options: &Value,
) -> Result<Box<dyn HarmonyStrategy>, ComposeError> {
    let opts: ProgressionOptions = parse_options("progression", options)?;
    let library = ctx.progressions;

    let candidates: Vec<ChordProgression> = if let Some(name) = &opts.progression {
        vec![library.get(name)?.clone()]
    } else if let Some(style) = &opts.style {
        let styled: Vec<ChordProgression> =
            library.by_style(style).into_iter().cloned().collect();
        if styled.is_empty() {
            return Err(ComposeError::not_found("style", style.clone()));
        }
        styled
    } else {
        let max = clamp_param("max_complexity", opts.max_complexity as f64, 1.0, 5.0) as u8;
        let simple: Vec<ChordProgression> = library
            .progressions
            .iter()
            .filter(|p| p.complexity <= max)
            .cloned()
            .collect();
        if simple.is_empty() {
            vec![library.get("pop_basic")?.clone()]
        } else {
            simple
        }
    };

    Ok(Box::new(ProgressionStrategy {
        candidates,
        chords_per_bar: opts.chords_per_bar.max(1),
        rhythm: opts.rhythm,
        inversion: opts.inversion,
        voice_leading: opts.voice_leading,
    }))
}

impl HarmonyStrategy for ProgressionStrategy {
    fn generate(
        &self,
        ctx: &GenerationContext<'_>,
        bars: usize,
        rng: &mut ComposerRng,
    ) -> Vec<(Pitch, f64)> {
        let Some(progression) = rng.choose(&self.candidates) else {
            return Vec::new();
        };
        log::debug!("tiling progression '{}'", progression.name);
        let base = progression.chords();
        if base.is_empty() {
            return Vec::new();
        }

        let slots = bars * self.chords_per_bar;
        let mut chords: Vec<Chord> = Vec::with_capacity(slots);
        let mut previous_bass: Option<Pitch> = None;
        for i in 0..slots {
            let mut chord = base[i % base.len()];
            match self.inversion {
                InversionMode::None => {}
                InversionMode::Random => {
                    chord.inversion = rng.range_usize_inclusive(0, 2) as u8;
                }
                InversionMode::BassMotion => {
                    if let Some(prev) = previous_bass {
                        if (root_pitch(&chord, ctx) - prev).abs() > BASS_LEAP_LIMIT {
                            chord.inversion = rng.range_usize_inclusive(1, 2) as u8;
                        }
                    }
                }
            }
            previous_bass = Some(root_pitch(&chord, ctx));
            chords.push(chord);
        }

        if self.voice_leading {
            chords = apply_voice_leading(&chords, &ctx.key, VoiceLeading::Smooth);
        }

        let slot_beats = ctx.beats_per_bar / self.chords_per_bar as f64;
        chords
            .iter()
            .enumerate()
            .map(|(i, chord)| {
                let duration = match self.rhythm {
                    ChordRhythm::Steady => slot_beats,
                    ChordRhythm::Syncopated if i % 2 == 1 => slot_beats * 0.5,
                    ChordRhythm::Syncopated => slot_beats * 1.5,
                    ChordRhythm::Random => slot_beats * rng.range_f64(0.5, 1.5),
                };
                (root_pitch(chord, ctx), duration)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Diatonic
// ---------------------------------------------------------------------------

/// Chord lengths the diatonic fill chooses from.
pub const DIATONIC_DURATIONS: [f64; 4] = [0.5, 1.0, 2.0, 4.0];

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DiatonicOptions {
    density: f64,
    avoid_repetition: bool,
    #[serde(alias = "cadence_pattern")]
    cadence: Option<Vec<usize>>,
}

impl Default for DiatonicOptions {
    fn default() -> Self {
        DiatonicOptions {
            density: 0.5,
            avoid_repetition: true,
            cadence: None,
        }
    }
}

/// Random diatonic chords on a half-beat grid.
#[derive(Debug, Clone)]
pub struct DiatonicStrategy {
    pub chords: Vec<Chord>,
    pub density: f64,
    pub avoid_repetition: bool,
    pub cadence: Option<(usize, usize)>,
}

fn build_diatonic(
    _: &HarmonyRegistry,
    ctx: &GenerationContext<'_>,
    options: &Value,
) -> Result<Box<dyn HarmonyStrategy>, ComposeError> {
    let opts: DiatonicOptions = parse_options("diatonic", options)?;
    let cadence = match opts.cadence.as_deref() {
        Some([a, b, ..]) => Some((*a, *b)),
        _ => None,
    };
    Ok(Box::new(DiatonicStrategy {
        chords: (1..=7)
            .map(|d| diatonic_chord(d, &ctx.key, QualityContext::Major))
            .collect(),
        density: clamp_param("density", opts.density, 0.1, 1.0),
        avoid_repetition: opts.avoid_repetition,
        cadence,
    }))
}

impl HarmonyStrategy for DiatonicStrategy {
    fn generate(
        &self,
        ctx: &GenerationContext<'_>,
        bars: usize,
        rng: &mut ComposerRng,
    ) -> Vec<(Pitch, f64)> {
        let total = ctx.total_beats(bars);
        let mut result: Vec<(Pitch, f64)> = Vec::new();
        let mut last: Option<usize> = None;
        let mut beat = 0.0;

        while beat < total {
            if !rng.random_bool(self.density) {
                beat += 0.5;
                continue;
            }
            let index = if self.avoid_repetition {
                let options: Vec<usize> = (0..7).filter(|&i| Some(i) != last).collect();
                options[rng.range_usize(0, options.len())]
            } else {
                rng.range_usize(0, 7)
            };
            let wanted = DIATONIC_DURATIONS[rng.range_usize(0, DIATONIC_DURATIONS.len())];
            let duration = wanted.min(total - beat);
            result.push((root_pitch(&self.chords[index], ctx), duration));
            last = Some(index);
            beat += duration;
        }

        if let Some((penultimate, last_degree)) = self.cadence {
            let n = result.len();
            if n >= 2 {
                result[n - 2].0 = root_pitch(&self.chords[(penultimate + 6) % 7], ctx);
                result[n - 1].0 = root_pitch(&self.chords[(last_degree + 6) % 7], ctx);
            }
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Functional
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(default)]
struct FunctionalOptions {
    phrase_structure: String,
}

impl Default for FunctionalOptions {
    fn default() -> Self {
        FunctionalOptions {
            phrase_structure: "AABA".to_string(),
        }
    }
}

/// Tonic / Subdominant / Dominant skeletons per phrase letter.
#[derive(Debug, Clone)]
pub struct FunctionalStrategy {
    pub phrase_structure: String,
}

fn build_functional(
    _: &HarmonyRegistry,
    _: &GenerationContext<'_>,
    options: &Value,
) -> Result<Box<dyn HarmonyStrategy>, ComposeError> {
    let opts: FunctionalOptions = parse_options("functional", options)?;
    Ok(Box::new(FunctionalStrategy {
        phrase_structure: opts.phrase_structure,
    }))
}

impl HarmonyStrategy for FunctionalStrategy {
    fn generate(
        &self,
        ctx: &GenerationContext<'_>,
        bars: usize,
        rng: &mut ComposerRng,
    ) -> Vec<(Pitch, f64)> {
        let phrases: Vec<char> = self.phrase_structure.chars().collect();
        if bars == 0 || phrases.is_empty() {
            return Vec::new();
        }
        // The whole budget is shared out, so short pieces still get chords.
        let phrase_beats = ctx.total_beats(bars) / phrases.len() as f64;

        let mut result = Vec::with_capacity(phrases.len() * 4);
        for letter in phrases {
            let skeleton = phrase_skeleton(letter);
            let slot_beats = phrase_beats / skeleton.len() as f64;
            for function in skeleton {
                let indices = function.scale_indices();
                let index = indices[rng.range_usize(0, indices.len())];
                let chord = diatonic_chord(index + 1, &ctx.key, QualityContext::Major);
                result.push((root_pitch(&chord, ctx), slot_beats));
            }
        }
        result
    }
}

// ---------------------------------------------------------------------------
// Hybrid
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(default)]
struct HybridOptions {
    split_ratio: f64,
    first: StrategySpec,
    second: StrategySpec,
}

impl Default for HybridOptions {
    fn default() -> Self {
        HybridOptions {
            split_ratio: 0.7,
            first: StrategySpec::named("progression"),
            second: StrategySpec::named("diatonic"),
        }
    }
}

/// First `split_ratio` of the bars from one strategy, the rest from another.
pub struct HybridHarmony {
    pub split_ratio: f64,
    pub first: Box<dyn HarmonyStrategy>,
    pub second: Box<dyn HarmonyStrategy>,
}

fn build_hybrid(
    registry: &HarmonyRegistry,
    ctx: &GenerationContext<'_>,
    options: &Value,
) -> Result<Box<dyn HarmonyStrategy>, ComposeError> {
    let opts: HybridOptions = parse_options("hybrid", options)?;
    Ok(Box::new(HybridHarmony {
        split_ratio: clamp_param("split_ratio", opts.split_ratio, 0.0, 1.0),
        first: opts.first.build(registry, ctx)?,
        second: opts.second.build(registry, ctx)?,
    }))
}

impl HarmonyStrategy for HybridHarmony {
    fn generate(
        &self,
        ctx: &GenerationContext<'_>,
        bars: usize,
        rng: &mut ComposerRng,
    ) -> Vec<(Pitch, f64)> {
        let first_bars = (bars as f64 * self.split_ratio) as usize;
        let mut result = self.first.generate(ctx, first_bars, rng);
        result.extend(self.second.generate(ctx, bars - first_bars, rng));
        result
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// A built harmony strategy plus chord-object conversion.
pub struct HarmonyGenerator {
    strategy: Box<dyn HarmonyStrategy>,
}

impl HarmonyGenerator {
    pub fn new(strategy: Box<dyn HarmonyStrategy>) -> Self {
        HarmonyGenerator { strategy }
    }

    pub fn from_registry(
        registry: &HarmonyRegistry,
        name: &str,
        ctx: &GenerationContext<'_>,
        options: &Value,
    ) -> Result<Self, ComposeError> {
        Ok(HarmonyGenerator::new(registry.build(name, ctx, options)?))
    }

    pub fn generate(
        &self,
        ctx: &GenerationContext<'_>,
        bars: usize,
        rng: &mut ComposerRng,
    ) -> Vec<(Pitch, f64)> {
        self.strategy.generate(ctx, bars, rng)
    }

    /// The generated roots as root-position major triads on the nearest
    /// scale index.
    pub fn generate_chords(
        &self,
        ctx: &GenerationContext<'_>,
        bars: usize,
        rng: &mut ComposerRng,
    ) -> Vec<Chord> {
        let scale = ctx.scale();
        self.generate(ctx, bars, rng)
            .into_iter()
            .map(|(root, _)| Chord::new(nearest_index(&scale, root), ChordQuality::Major))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::ProgressionLibrary;
    use crate::scale::Key;
    use serde_json::json;

    fn run_with(key: Key, name: &str, options: Value, bars: usize, seed: u64) -> Vec<(Pitch, f64)> {
        let lib = ProgressionLibrary::default_library();
        let ctx = GenerationContext::new(key, 4.0, &lib);
        let strategy = default_registry().build(name, &ctx, &options).unwrap();
        strategy.generate(&ctx, bars, &mut ComposerRng::new(seed))
    }

    fn run(name: &str, options: Value, bars: usize, seed: u64) -> Vec<(Pitch, f64)> {
        run_with(Key::major(0), name, options, bars, seed)
    }

    fn total(pairs: &[(Pitch, f64)]) -> f64 {
        pairs.iter().map(|p| p.1).sum()
    }

    #[test]
    fn test_pop_basic_steady() {
        let out = run("progression", json!({"progression": "pop_basic"}), 4, 1);
        assert_eq!(out, vec![(60, 4.0), (67, 4.0), (69, 4.0), (65, 4.0)]);
    }

    #[test]
    fn test_progression_tiles_and_splits_bars() {
        let out = run(
            "progression",
            json!({"progression": "rock_basic", "chords_per_bar": 2}),
            4,
            1,
        );
        let roots: Vec<Pitch> = out.iter().map(|p| p.0).collect();
        assert_eq!(roots, vec![60, 65, 67, 60, 65, 67, 60, 65]);
        assert!(out.iter().all(|p| p.1 == 2.0));
    }

    #[test]
    fn test_syncopated_durations() {
        let out = run(
            "progression",
            json!({"progression": "pop_basic", "rhythm": "syncopated"}),
            4,
            1,
        );
        let durations: Vec<f64> = out.iter().map(|p| p.1).collect();
        assert_eq!(durations, vec![6.0, 2.0, 6.0, 2.0]);
    }

    #[test]
    fn test_random_durations_in_range() {
        let out = run(
            "progression",
            json!({"progression": "pop_basic", "rhythm": "random"}),
            8,
            3,
        );
        assert!(out.iter().all(|p| (2.0..6.0).contains(&p.1)));
    }

    #[test]
    fn test_random_inversions_raise_bass() {
        let out = run(
            "progression",
            json!({"progression": "pop_basic", "inversion": "random"}),
            16,
            5,
        );
        // Root-position roots lie in 60..72; inverted chords start an octave up.
        assert!(out.iter().any(|p| p.0 >= 72));
        assert!(out.iter().all(|p| p.0 >= 60 && p.0 < 84));
    }

    #[test]
    fn test_bass_motion_keeps_leaps_of_a_fifth() {
        let out = run(
            "progression",
            json!({"progression": "classical_authentic", "inversion": "bass_motion"}),
            2,
            1,
        );
        assert_eq!(out[0].0, 67);
        // V (67) -> I (60): leap of exactly 7, kept in root position.
        assert_eq!(out[1].0, 60);
    }

    #[test]
    fn test_bass_motion_inverts_after_wide_leaps() {
        let mut lib = ProgressionLibrary::default_library();
        lib.register(ProgressionLibrary::from_degrees(
            "one_seven",
            "test",
            &[1, 7],
            &[ChordQuality::Major, ChordQuality::Diminished],
        ));
        let ctx = GenerationContext::new(Key::major(0), 4.0, &lib);
        let strategy = default_registry()
            .build(
                "progression",
                &ctx,
                &json!({"progression": "one_seven", "inversion": "bass_motion"}),
            )
            .unwrap();

        for seed in 0..10 {
            let out = strategy.generate(&ctx, 4, &mut ComposerRng::new(seed));
            let roots: Vec<Pitch> = out.iter().map(|p| p.0).collect();
            // I (60) -> vii° (71) leaps 11: inverted, so its root sounds an
            // octave up. The next I leaps 23 down and is inverted too; the
            // closing vii° is 1 below that and stays in root position.
            assert_eq!(roots, vec![60, 83, 72, 71], "seed {seed}");
        }

        // Either inversion (1 or 2) raises the root of the triad.
        let base = Chord::new(6, ChordQuality::Diminished);
        for inversion in 1..=2 {
            let pitches = base.with_inversion(inversion).pitches(&ctx.key, 4);
            assert_eq!(pitches[0], 83);
        }
    }

    #[test]
    fn test_voice_leading_option() {
        let out = run(
            "progression",
            json!({"progression": "classical_authentic", "voice_leading": true}),
            2,
            1,
        );
        // V then I in second inversion, whose first tone is C5.
        assert_eq!(out, vec![(67, 4.0), (72, 4.0)]);
    }

    #[test]
    fn test_style_and_missing_names() {
        let out = run("progression", json!({"style": "jazz"}), 8, 4);
        assert_eq!(out.len(), 8);

        let lib = ProgressionLibrary::default_library();
        let ctx = GenerationContext::new(Key::major(0), 4.0, &lib);
        let registry = default_registry();
        for options in [json!({"progression": "nope"}), json!({"style": "polka"})] {
            let err = registry.build("progression", &ctx, &options).err().unwrap();
            assert!(matches!(err, ComposeError::NotFound { .. }));
        }
    }

    #[test]
    fn test_diatonic_fills_budget_without_repeats() {
        let out = run("diatonic", json!({"density": 1.0, "avoid_repetition": true}), 1, 8);
        assert_eq!(total(&out), 4.0);
        for w in out.windows(2) {
            assert_ne!(w[0].0, w[1].0);
        }
        let long = run("diatonic", json!({"density": 0.3}), 8, 8);
        assert!(total(&long) <= 32.0);
    }

    #[test]
    fn test_diatonic_cadence_override() {
        let out = run(
            "diatonic",
            json!({"density": 1.0, "cadence": [5, 1]}),
            8,
            2,
        );
        let n = out.len();
        assert!(n >= 2);
        assert_eq!(out[n - 2].0, 67);
        assert_eq!(out[n - 1].0, 60);
    }

    #[test]
    fn test_diatonic_density_clamped() {
        // A density of 0 is raised to 0.1, so chords still appear eventually.
        let out = run("diatonic", json!({"density": 0.0}), 32, 1);
        assert!(!out.is_empty());
    }

    #[test]
    fn test_functional_aaba() {
        let out = run("functional", Value::Null, 8, 6);
        assert_eq!(out.len(), 16);
        assert_eq!(total(&out), 32.0);
        // Each A phrase opens on the tonic; the B phrase opens on IV or V.
        assert_eq!(out[0].0, 60);
        assert_eq!(out[3].0, 60);
        assert!(out[8].0 == 65 || out[8].0 == 67);
        // Dominant slots use V or vii.
        assert!(out[2].0 == 67 || out[2].0 == 71);
    }

    #[test]
    fn test_functional_short_piece() {
        let out = run("functional", json!({"phrase_structure": "AABA"}), 2, 6);
        assert_eq!(out.len(), 16);
        assert!(out.iter().all(|p| p.1 == 0.5));
        assert!(run("functional", Value::Null, 0, 6).is_empty());
    }

    #[test]
    fn test_hybrid_split() {
        let out = run(
            "hybrid",
            json!({
                "split_ratio": 0.5,
                "first": {"strategy": "progression", "options": {"progression": "pop_basic"}},
                "second": {"strategy": "progression", "options": {"progression": "rock_basic"}}
            }),
            6,
            2,
        );
        let roots: Vec<Pitch> = out.iter().map(|p| p.0).collect();
        assert_eq!(roots, vec![60, 67, 69, 60, 65, 67]);
    }

    #[test]
    fn test_hybrid_defaults_and_clamp() {
        let out = run("hybrid", json!({"split_ratio": 3.0}), 4, 2);
        // Everything goes to the first (progression) strategy.
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|p| p.1 == 4.0));
    }

    #[test]
    fn test_zero_bars_is_empty() {
        for name in ["progression", "diatonic", "functional", "hybrid"] {
            assert!(run(name, Value::Null, 0, 1).is_empty(), "{name}");
        }
    }

    #[test]
    fn test_generate_chords() {
        let lib = ProgressionLibrary::default_library();
        let ctx = GenerationContext::new(Key::major(0), 4.0, &lib);
        let generator = HarmonyGenerator::from_registry(
            &default_registry(),
            "progression",
            &ctx,
            &json!({"progression": "pop_basic"}),
        )
        .unwrap();
        let chords = generator.generate_chords(&ctx, 4, &mut ComposerRng::new(1));
        let roots: Vec<usize> = chords.iter().map(|c| c.root).collect();
        assert_eq!(roots, vec![0, 4, 5, 3]);
        assert!(chords.iter().all(|c| c.quality == ChordQuality::Major));
    }

    #[test]
    fn test_minor_key_roots() {
        let out = run_with(Key::minor(9), "progression", json!({"progression": "pop_basic"}), 4, 1);
        let roots: Vec<Pitch> = out.iter().map(|p| p.0).collect();
        // A minor scale: A B C D E F G.
        assert_eq!(roots, vec![69, 76, 77, 74]);
    }
}
