// Melody strategies and the melody generator.
//
// Five strategies, registered by name (default `structured`):
// - `random`: Markov random walk over the scale (markov.rs), with a 10%
//   chance per step of a chromatic excursion to a nearby pitch outside the
//   transition row.
// - `structured`: motif, repetitions, one variation and a tonic cadence
//   (structure.rs).
// - `neural`: a per-style heuristic stand-in for a learned model. `jazz`
//   favors chord tones of random diatonic chords, `pop` walks by small steps,
//   anything else walks by random intervals.
// - `genetic`: evolves a melody against a chord progression (search.rs).
// - `mcts`: greedy simulation search on a shape heuristic (search.rs).
//
// Every strategy draws pitches from the key's two-octave scale
// (`GenerationContext::scale`) and returns exactly `length` pitches.
// `MelodyGenerator` adds per-note timing variation and velocity curves on
// top of the raw pitch sequence.

use crate::chord::{Chord, QualityContext, diatonic_chord};
use crate::error::{ComposeError, clamp_param};
use crate::markov::{PitchTransitions, TransitionTable, sample_from_table};
use crate::scale::{Pitch, nearest_index};
use crate::search::{GeneticConfig, MctsConfig, evolve, simulate};
use crate::strategy::{GenerationContext, Registry, parse_options};
use crate::structure::{PhraseBuilder, Variation};
use cadenza_prng::ComposerRng;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Produces a pitch sequence of a requested length.
pub trait MelodyStrategy {
    fn generate(
        &self,
        ctx: &GenerationContext<'_>,
        length: usize,
        rng: &mut ComposerRng,
    ) -> Vec<Pitch>;
}

pub type MelodyRegistry = Registry<dyn MelodyStrategy>;

/// Registry with the five built-in strategies; `structured` is the default.
pub fn default_registry() -> MelodyRegistry {
    let mut registry = MelodyRegistry::new("melody", "structured");
    registry
        .register("random", build_random_walk)
        .register("structured", build_structured)
        .register("neural", build_style_heuristic)
        .register("genetic", build_genetic)
        .register("mcts", build_mcts);
    registry
}

// ---------------------------------------------------------------------------
// Random walk
// ---------------------------------------------------------------------------

/// Chance per step of leaving the transition table for a nearby pitch.
pub const EXCURSION_RATE: f64 = 0.1;
/// Pitch bounds for chromatic excursions.
pub const EXCURSION_RANGE: (Pitch, Pitch) = (48, 84);

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RandomWalkOptions {
    start_note: Option<Pitch>,
    /// Custom rows, pitch -> (next pitch -> weight). Replaces the default
    /// interval-weighted matrix.
    transitions: Option<BTreeMap<Pitch, TransitionTable>>,
}

/// Markov random walk.
#[derive(Debug, Clone)]
pub struct RandomWalk {
    transitions: PitchTransitions,
    start_note: Option<Pitch>,
}

impl RandomWalk {
    pub fn new(ctx: &GenerationContext<'_>, start_note: Option<Pitch>) -> Self {
        RandomWalk {
            transitions: PitchTransitions::from_scale(&ctx.scale()),
            start_note,
        }
    }

    pub fn with_transitions(transitions: PitchTransitions, start_note: Option<Pitch>) -> Self {
        RandomWalk {
            transitions,
            start_note,
        }
    }
}

fn build_random_walk(
    _: &MelodyRegistry,
    ctx: &GenerationContext<'_>,
    options: &Value,
) -> Result<Box<dyn MelodyStrategy>, ComposeError> {
    let opts: RandomWalkOptions = parse_options("random", options)?;
    Ok(Box::new(match opts.transitions {
        Some(rows) => RandomWalk::with_transitions(PitchTransitions { rows }, opts.start_note),
        None => RandomWalk::new(ctx, opts.start_note),
    }))
}

impl MelodyStrategy for RandomWalk {
    fn generate(
        &self,
        ctx: &GenerationContext<'_>,
        length: usize,
        rng: &mut ComposerRng,
    ) -> Vec<Pitch> {
        let scale = ctx.scale();
        let Some(&first) = scale.first() else {
            return Vec::new();
        };
        let mut current = self.start_note.unwrap_or(first);
        let mut melody = Vec::with_capacity(length);

        for _ in 0..length {
            melody.push(current);
            match self.transitions.row(current) {
                Some(row) => {
                    let sample = sample_from_table(row, rng);
                    if rng.random_bool(EXCURSION_RATE) {
                        let (lo, hi) = EXCURSION_RANGE;
                        let nearby: Vec<Pitch> = (current - 3..=current + 3)
                            .filter(|p| !row.contains_key(p) && (lo..=hi).contains(p))
                            .collect();
                        if let Some(&p) = rng.choose(&nearby) {
                            current = p;
                        }
                    } else if let Some(next) = sample {
                        current = next;
                    }
                }
                None => {
                    // Off the matrix: step through scale indices from the
                    // nearest scale pitch.
                    let idx = nearest_index(&scale, current) as i32;
                    let step = rng.range_i32_inclusive(-2, 2);
                    let next = (idx + step).clamp(0, scale.len() as i32 - 1);
                    current = scale[next as usize];
                }
            }
        }
        melody
    }
}

// ---------------------------------------------------------------------------
// Structured (motif based)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(default)]
struct StructuredOptions {
    motif_size: usize,
    repeat_count: usize,
    #[serde(alias = "variation_type")]
    variation: Variation,
}

impl Default for StructuredOptions {
    fn default() -> Self {
        StructuredOptions {
            motif_size: 4,
            repeat_count: 2,
            variation: Variation::Interval,
        }
    }
}

/// Motif-and-variation phrase builder.
#[derive(Debug, Clone)]
pub struct Structured {
    pub motif_size: usize,
    pub repeat_count: usize,
    pub variation: Variation,
}

fn build_structured(
    _: &MelodyRegistry,
    ctx: &GenerationContext<'_>,
    options: &Value,
) -> Result<Box<dyn MelodyStrategy>, ComposeError> {
    let opts: StructuredOptions = parse_options("structured", options)?;
    let scale_len = ctx.scale().len();
    let motif_size =
        clamp_param("motif_size", opts.motif_size as f64, 1.0, scale_len as f64) as usize;
    Ok(Box::new(Structured {
        motif_size,
        repeat_count: opts.repeat_count,
        variation: opts.variation,
    }))
}

impl MelodyStrategy for Structured {
    fn generate(
        &self,
        ctx: &GenerationContext<'_>,
        length: usize,
        rng: &mut ComposerRng,
    ) -> Vec<Pitch> {
        let scale = ctx.scale();
        let motif: Vec<Pitch> = rng
            .sample_indices(scale.len(), self.motif_size)
            .into_iter()
            .map(|i| scale[i])
            .collect();

        let mut builder = PhraseBuilder::new(length);
        builder
            .add_motif(&motif, self.repeat_count)
            .add_variation(&motif, self.variation)
            .add_cadence(&ctx.key);
        builder.build()
    }
}

// ---------------------------------------------------------------------------
// Style heuristic ("neural")
// ---------------------------------------------------------------------------

const WALK_INTERVALS: [i32; 10] = [-2, -1, 1, 2, -3, 3, -4, 4, -5, 5];

#[derive(Debug, Deserialize)]
#[serde(default)]
struct StyleOptions {
    style: String,
}

impl Default for StyleOptions {
    fn default() -> Self {
        StyleOptions {
            style: "classical".to_string(),
        }
    }
}

/// Deterministic per-style heuristic; no model is loaded.
#[derive(Debug, Clone)]
pub struct StyleHeuristic {
    pub style: String,
}

fn build_style_heuristic(
    _: &MelodyRegistry,
    _: &GenerationContext<'_>,
    options: &Value,
) -> Result<Box<dyn MelodyStrategy>, ComposeError> {
    let opts: StyleOptions = parse_options("neural", options)?;
    log::debug!("style heuristic melody for '{}'", opts.style);
    Ok(Box::new(StyleHeuristic { style: opts.style }))
}

impl MelodyStrategy for StyleHeuristic {
    fn generate(
        &self,
        ctx: &GenerationContext<'_>,
        length: usize,
        rng: &mut ComposerRng,
    ) -> Vec<Pitch> {
        let scale = ctx.scale();
        let Some(&tonic) = scale.first() else {
            return Vec::new();
        };
        let random_scale_tone = |rng: &mut ComposerRng| scale[rng.range_usize(0, scale.len())];
        let mut melody = Vec::with_capacity(length);

        match self.style.as_str() {
            "jazz" => {
                for _ in 0..length {
                    if rng.random_bool(0.6) {
                        let degree = rng.range_usize_inclusive(1, 7);
                        let chord = diatonic_chord(degree, &ctx.key, QualityContext::Major);
                        let tones = chord.pitches(&ctx.key, 4);
                        let pick = rng.choose(&tones).copied().unwrap_or(tonic);
                        melody.push(pick);
                    } else {
                        melody.push(random_scale_tone(rng));
                    }
                }
            }
            "pop" => {
                if length > 0 {
                    melody.push(tonic);
                }
                while melody.len() < length {
                    let prev = melody[melody.len() - 1];
                    let neighbors: Vec<Pitch> =
                        scale.iter().copied().filter(|p| (p - prev).abs() <= 4).collect();
                    let next = match rng.choose(&neighbors) {
                        Some(&p) => p,
                        None => random_scale_tone(rng),
                    };
                    melody.push(next);
                }
            }
            _ => {
                let mut current = tonic;
                for _ in 0..length {
                    melody.push(current);
                    let step = WALK_INTERVALS[rng.range_usize(0, WALK_INTERVALS.len())];
                    let next = current + step;
                    current = if scale.contains(&next) {
                        next
                    } else {
                        random_scale_tone(rng)
                    };
                }
            }
        }
        melody
    }
}

// ---------------------------------------------------------------------------
// Genetic
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeneticOptions {
    #[serde(alias = "progression_name")]
    progression: Option<String>,
    /// Explicit scale degrees (1-7); overrides `progression`.
    chords: Option<Vec<usize>>,
    #[serde(flatten)]
    search: GeneticConfig,
}

/// Genetic search against a fixed chord sequence.
#[derive(Debug, Clone)]
pub struct Genetic {
    pub chords: Vec<Chord>,
    pub config: GeneticConfig,
}

fn build_genetic(
    _: &MelodyRegistry,
    ctx: &GenerationContext<'_>,
    options: &Value,
) -> Result<Box<dyn MelodyStrategy>, ComposeError> {
    let opts: GeneticOptions = parse_options("genetic", options)?;
    let chords = match opts.chords {
        Some(degrees) => degrees
            .into_iter()
            .map(|d| diatonic_chord(d, &ctx.key, QualityContext::Major))
            .collect(),
        None => {
            let name = opts.progression.as_deref().unwrap_or("pop_basic");
            ctx.progressions.get(name)?.chords()
        }
    };
    Ok(Box::new(Genetic {
        chords,
        config: opts.search,
    }))
}

impl MelodyStrategy for Genetic {
    fn generate(
        &self,
        ctx: &GenerationContext<'_>,
        length: usize,
        rng: &mut ComposerRng,
    ) -> Vec<Pitch> {
        let result = evolve(&ctx.scale(), &self.chords, &ctx.key, length, &self.config, rng);
        log::debug!(
            "genetic melody: fitness {:.3} after {} generations ({} evaluations)",
            result.fitness,
            result.generations,
            result.evaluations
        );
        result.melody
    }
}

/// Re-fit a melody's length against `chords` with a larger population and
/// `iterations` generations. Only the melody's length is reused.
pub fn optimize_melody_for_chords(
    ctx: &GenerationContext<'_>,
    melody: &[Pitch],
    chords: &[Chord],
    iterations: usize,
    rng: &mut ComposerRng,
) -> Vec<Pitch> {
    let config = GeneticConfig {
        population_size: 100,
        generations: iterations,
        ..GeneticConfig::default()
    };
    evolve(&ctx.scale(), chords, &ctx.key, melody.len(), &config, rng).melody
}

// ---------------------------------------------------------------------------
// Simulation search
// ---------------------------------------------------------------------------

/// Greedy rollouts scored by melodic shape.
#[derive(Debug, Clone)]
pub struct Mcts {
    pub config: MctsConfig,
}

fn build_mcts(
    _: &MelodyRegistry,
    _: &GenerationContext<'_>,
    options: &Value,
) -> Result<Box<dyn MelodyStrategy>, ComposeError> {
    let config: MctsConfig = parse_options("mcts", options)?;
    Ok(Box::new(Mcts { config }))
}

impl MelodyStrategy for Mcts {
    fn generate(
        &self,
        ctx: &GenerationContext<'_>,
        length: usize,
        rng: &mut ComposerRng,
    ) -> Vec<Pitch> {
        let result = simulate(&ctx.scale(), length, &self.config, rng);
        log::debug!(
            "mcts melody: score {:.3} over {} simulations",
            result.score,
            result.simulations
        );
        result.melody
    }
}

// ---------------------------------------------------------------------------
// Generator: timing and dynamics
// ---------------------------------------------------------------------------

/// Per-note duration multipliers for `generate_with_timing`.
pub const TIMING_FACTORS: [f64; 5] = [0.5, 0.75, 1.0, 1.25, 1.5];

/// Velocity shapes over a melody.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum VelocityCurve {
    #[default]
    Flat,
    Arch,
    Rising,
    Falling,
    Random,
}

impl From<String> for VelocityCurve {
    fn from(value: String) -> Self {
        match value.as_str() {
            "arch" => VelocityCurve::Arch,
            "rising" => VelocityCurve::Rising,
            "falling" => VelocityCurve::Falling,
            "random" => VelocityCurve::Random,
            _ => VelocityCurve::Flat,
        }
    }
}

/// One velocity per note following `curve`.
///
/// Flat is 80 throughout; arch peaks at 127 mid-phrase and bottoms out at 50;
/// rising goes 64 -> 127 and falling 127 -> 64; random is uniform in 60-120.
pub fn velocity_curve(len: usize, curve: VelocityCurve, rng: &mut ComposerRng) -> Vec<u8> {
    let n = len as f64;
    (0..len)
        .map(|i| match curve {
            VelocityCurve::Flat => 80,
            VelocityCurve::Arch => {
                let mid = len / 2;
                let distance = (i as f64 - mid as f64).abs() / mid.max(1) as f64;
                ((127.0 * (1.0 - distance * 0.6)) as i32).clamp(50, 127) as u8
            }
            VelocityCurve::Rising => (64.0 + i as f64 / n * 63.0) as u8,
            VelocityCurve::Falling => (127.0 - i as f64 / n * 63.0) as u8,
            VelocityCurve::Random => rng.range_i32_inclusive(60, 120) as u8,
        })
        .collect()
}

/// A built melody strategy plus the timing and dynamics helpers.
pub struct MelodyGenerator {
    strategy: Box<dyn MelodyStrategy>,
}

impl MelodyGenerator {
    pub fn new(strategy: Box<dyn MelodyStrategy>) -> Self {
        MelodyGenerator { strategy }
    }

    /// Build by registry name.
    pub fn from_registry(
        registry: &MelodyRegistry,
        name: &str,
        ctx: &GenerationContext<'_>,
        options: &Value,
    ) -> Result<Self, ComposeError> {
        Ok(MelodyGenerator::new(registry.build(name, ctx, options)?))
    }

    pub fn generate(
        &self,
        ctx: &GenerationContext<'_>,
        length: usize,
        rng: &mut ComposerRng,
    ) -> Vec<Pitch> {
        self.strategy.generate(ctx, length, rng)
    }

    /// Pitches paired with `base_duration` scaled by a random factor from
    /// `TIMING_FACTORS`.
    pub fn generate_with_timing(
        &self,
        ctx: &GenerationContext<'_>,
        length: usize,
        base_duration: f64,
        rng: &mut ComposerRng,
    ) -> Vec<(Pitch, f64)> {
        let pitches = self.generate(ctx, length, rng);
        pitches
            .into_iter()
            .map(|p| {
                let factor = TIMING_FACTORS[rng.range_usize(0, TIMING_FACTORS.len())];
                (p, base_duration * factor)
            })
            .collect()
    }
}
