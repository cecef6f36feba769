// Rhythm strategies, named rhythm patterns and rhythm post-processing.
//
// Rhythm strategies produce durations only (in beats); the composer pairs
// them with a fixed drum note. Registered by name (default `pattern`):
// - `random`: fill the beat budget from a set of allowed durations, shrinking
//   the choice near the end so nothing overflows.
// - `pattern`: tile a named `RhythmPattern` (or a custom list) and normalize
//   to the exact budget.
// - `swing`: split every beat into a long/short pair.
// - `groove`: map a style name onto a pattern.
// - `hybrid`: first half of the bars from one strategy, the rest from
//   another.
//
// Output durations sum to the beat budget (`bars * beats_per_bar`), exactly
// for dyadic values and within float rounding otherwise.
//
// `RhythmGenerator` adds rest marking, `velocity_pattern` assigns dynamics to
// a duration list and `RhythmStats` summarizes one.

use crate::error::{ComposeError, clamp_param};
use crate::strategy::{GenerationContext, Registry, StrategySpec, parse_options};
use cadenza_prng::ComposerRng;
use serde::Deserialize;
use serde_json::{Value, json};
use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Tolerance for beat-budget comparisons.
const EPSILON: f64 = 1e-9;

/// Produces durations (beats) filling a number of bars.
pub trait RhythmStrategy {
    fn generate(
        &self,
        ctx: &GenerationContext<'_>,
        bars: usize,
        rng: &mut ComposerRng,
    ) -> Vec<f64>;
}

pub type RhythmRegistry = Registry<dyn RhythmStrategy>;

/// Registry with the five built-in strategies; `pattern` is the default.
pub fn default_registry() -> RhythmRegistry {
    let mut registry = RhythmRegistry::new("rhythm", "pattern");
    registry
        .register("random", build_random)
        .register("pattern", build_pattern)
        .register("swing", build_swing)
        .register("groove", build_groove)
        .register("hybrid", build_hybrid);
    registry
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

/// Built-in one-bar (4/4) rhythm patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum RhythmPattern {
    SteadyQuarters,
    SteadyEighths,
    HalfQuarter,
    #[strum(serialize = "syncopated_8")]
    Syncopated8,
    #[strum(serialize = "syncopated_16")]
    Syncopated16,
    Anticipation,
    RockBeat,
    Disco,
    HipHop,
    House,
    SwingEighths,
    JazzComp,
    BossaNova,
    Samba,
    Salsa,
    Techno,
    Trance,
    Dubstep,
}

const QUARTERS: [f64; 4] = [1.0; 4];
const EIGHTHS: [f64; 8] = [0.5; 8];
const SIXTEENTHS: [f64; 16] = [0.25; 16];

impl RhythmPattern {
    pub fn durations(self) -> &'static [f64] {
        use RhythmPattern::*;
        match self {
            SteadyQuarters => &QUARTERS,
            SteadyEighths | RockBeat => &EIGHTHS,
            HalfQuarter => &[2.0, 1.0, 1.0],
            Syncopated8 => &[1.0, 0.5, 0.5, 1.0, 1.0],
            Syncopated16 => &[0.5, 0.25, 0.25, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5],
            Anticipation => &[0.5, 0.5, 1.0, 0.5, 0.5, 1.0],
            Disco => &[0.5, 0.5, 0.25, 0.25, 0.5, 0.5, 0.5, 0.5, 0.25, 0.25],
            HipHop => &[0.5, 0.5, 0.5, 0.25, 0.25, 0.5, 0.5, 0.5, 0.5],
            House | Techno | Trance => &SIXTEENTHS,
            SwingEighths => &[0.66, 0.33, 0.66, 0.33, 0.66, 0.33, 0.66, 0.33],
            JazzComp => &[1.0, 0.5, 0.5, 1.0, 0.5, 0.5],
            BossaNova => &[0.5, 0.5, 0.5, 0.25, 0.25, 0.5, 0.5, 0.5],
            Samba => &[0.5, 0.5, 0.25, 0.25, 0.5, 0.25, 0.25, 0.5, 0.25, 0.25],
            Salsa => &[0.5, 0.5, 0.5, 0.5, 0.25, 0.25, 0.5, 0.5],
            Dubstep => &[1.0, 0.25, 0.75, 1.0, 0.5, 0.5, 0.25, 0.25, 0.5],
        }
    }

    pub fn name(self) -> &'static str {
        self.into()
    }

    /// Look a pattern up by its snake_case name.
    pub fn from_name(name: &str) -> Result<Self, ComposeError> {
        name.parse()
            .map_err(|_| ComposeError::not_found("rhythm pattern", name))
    }

    /// The pattern a groove style plays; unknown styles get steady quarters.
    pub fn for_style(style: &str) -> Self {
        use RhythmPattern::*;
        match style.to_ascii_lowercase().as_str() {
            "rock" => RockBeat,
            "disco" => Disco,
            "hiphop" => HipHop,
            "house" => House,
            "techno" => Techno,
            "trance" => Trance,
            "jazz" => SwingEighths,
            "bossa" => BossaNova,
            "samba" => Samba,
            "salsa" => Salsa,
            "dubstep" => Dubstep,
            _ => SteadyQuarters,
        }
    }
}

pub fn all_patterns() -> Vec<RhythmPattern> {
    RhythmPattern::iter().collect()
}

fn fill_quarters(total: f64) -> Vec<f64> {
    let whole = (total + EPSILON).floor();
    let mut out = vec![1.0; whole as usize];
    if total - whole > EPSILON {
        out.push(total - whole);
    }
    out
}

/// Fit `durations` to exactly `total` beats.
///
/// Too long: keep whole values while they fit, then a final partial value for
/// the remainder. Too short: append copies of the last value while they fit,
/// then the remainder. A list summing to zero becomes quarter notes.
pub fn normalize_to_beats(mut durations: Vec<f64>, total: f64) -> Vec<f64> {
    let sum: f64 = durations.iter().sum();
    if sum <= EPSILON {
        return fill_quarters(total);
    }

    if sum < total - EPSILON {
        let last = durations
            .last()
            .copied()
            .filter(|&d| d > EPSILON)
            .unwrap_or(1.0);
        let mut current = sum;
        while current + last <= total + EPSILON {
            durations.push(last);
            current += last;
        }
        if total - current > EPSILON {
            durations.push(total - current);
        }
        durations
    } else if sum > total + EPSILON {
        let mut trimmed = Vec::with_capacity(durations.len());
        let mut current = 0.0;
        for d in durations {
            if current + d <= total + EPSILON {
                trimmed.push(d);
                current += d;
            } else {
                if total - current > EPSILON {
                    trimmed.push(total - current);
                }
                break;
            }
        }
        trimmed
    } else {
        durations
    }
}

/// Repeat `pattern` past `total` beats and normalize.
fn tile(pattern: &[f64], total: f64) -> Vec<f64> {
    let pattern_beats: f64 = pattern.iter().sum();
    if pattern_beats <= EPSILON {
        return fill_quarters(total);
    }
    let repetitions = (total / pattern_beats) as usize + 1;
    let mut durations = Vec::with_capacity(pattern.len() * repetitions);
    for _ in 0..repetitions {
        durations.extend_from_slice(pattern);
    }
    normalize_to_beats(durations, total)
}

// ---------------------------------------------------------------------------
// Random
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RandomOptions {
    #[serde(alias = "allowed_durations")]
    allowed: Vec<f64>,
}

impl Default for RandomOptions {
    fn default() -> Self {
        RandomOptions {
            allowed: vec![0.5, 1.0, 1.5, 2.0],
        }
    }
}

/// Random durations from an allowed set.
#[derive(Debug, Clone)]
pub struct RandomRhythm {
    pub allowed: Vec<f64>,
}

fn build_random(
    _: &RhythmRegistry,
    _: &GenerationContext<'_>,
    options: &Value,
) -> Result<Box<dyn RhythmStrategy>, ComposeError> {
    let opts: RandomOptions = parse_options("random", options)?;
    let mut allowed: Vec<f64> = opts.allowed.into_iter().filter(|&d| d > 0.0).collect();
    if allowed.is_empty() {
        log::warn!("random rhythm has no positive durations, using defaults");
        allowed = RandomOptions::default().allowed;
    }
    Ok(Box::new(RandomRhythm { allowed }))
}

impl RhythmStrategy for RandomRhythm {
    fn generate(
        &self,
        ctx: &GenerationContext<'_>,
        bars: usize,
        rng: &mut ComposerRng,
    ) -> Vec<f64> {
        let total = ctx.total_beats(bars);
        let mut durations = Vec::new();
        let mut current = 0.0;
        while total - current > EPSILON {
            let remaining = total - current;
            let mut duration = self.allowed[rng.range_usize(0, self.allowed.len())];
            if duration > remaining + EPSILON {
                let smaller: Vec<f64> = self
                    .allowed
                    .iter()
                    .copied()
                    .filter(|&d| d <= remaining + EPSILON)
                    .collect();
                duration = rng.choose(&smaller).copied().unwrap_or(remaining);
            }
            durations.push(duration);
            current += duration;
        }
        durations
    }
}

// ---------------------------------------------------------------------------
// Pattern
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PatternOptions {
    pattern: Option<String>,
    custom: Option<Vec<f64>>,
}

/// Which durations a pattern strategy tiles.
#[derive(Debug, Clone, PartialEq)]
pub enum PatternSource {
    Named(RhythmPattern),
    Custom(Vec<f64>),
    /// A random built-in, chosen on each `generate` call.
    Any,
}

#[derive(Debug, Clone)]
pub struct PatternRhythm {
    pub source: PatternSource,
}

fn build_pattern(
    _: &RhythmRegistry,
    _: &GenerationContext<'_>,
    options: &Value,
) -> Result<Box<dyn RhythmStrategy>, ComposeError> {
    let opts: PatternOptions = parse_options("pattern", options)?;
    let source = match (opts.custom, opts.pattern) {
        (Some(custom), _) => {
            PatternSource::Custom(custom.into_iter().filter(|&d| d > 0.0).collect())
        }
        (None, Some(name)) => PatternSource::Named(RhythmPattern::from_name(&name)?),
        (None, None) => PatternSource::Any,
    };
    Ok(Box::new(PatternRhythm { source }))
}

impl RhythmStrategy for PatternRhythm {
    fn generate(
        &self,
        ctx: &GenerationContext<'_>,
        bars: usize,
        rng: &mut ComposerRng,
    ) -> Vec<f64> {
        let total = ctx.total_beats(bars);
        match &self.source {
            PatternSource::Named(pattern) => tile(pattern.durations(), total),
            PatternSource::Custom(durations) => tile(durations, total),
            PatternSource::Any => {
                let patterns = all_patterns();
                let pattern = patterns[rng.range_usize(0, patterns.len())];
                log::debug!("pattern rhythm picked '{}'", pattern.name());
                tile(pattern.durations(), total)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Swing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SwingOptions {
    #[serde(alias = "swing_ratio")]
    ratio: f64,
}

impl Default for SwingOptions {
    fn default() -> Self {
        SwingOptions { ratio: 0.66 }
    }
}

/// Each beat split into `[ratio, 1 - ratio]`.
#[derive(Debug, Clone)]
pub struct SwingRhythm {
    pub ratio: f64,
}

fn build_swing(
    _: &RhythmRegistry,
    _: &GenerationContext<'_>,
    options: &Value,
) -> Result<Box<dyn RhythmStrategy>, ComposeError> {
    let opts: SwingOptions = parse_options("swing", options)?;
    Ok(Box::new(SwingRhythm {
        ratio: clamp_param("swing_ratio", opts.ratio, 0.5, 0.9),
    }))
}

impl RhythmStrategy for SwingRhythm {
    fn generate(&self, ctx: &GenerationContext<'_>, bars: usize, _: &mut ComposerRng) -> Vec<f64> {
        let total = ctx.total_beats(bars);
        let beats = (total + EPSILON).floor();
        let mut durations = Vec::with_capacity(beats as usize * 2 + 1);
        for _ in 0..beats as usize {
            durations.push(self.ratio);
            durations.push(1.0 - self.ratio);
        }
        if total - beats > EPSILON {
            durations.push(total - beats);
        }
        durations
    }
}

// ---------------------------------------------------------------------------
// Groove
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(default)]
struct GrooveOptions {
    style: String,
}

impl Default for GrooveOptions {
    fn default() -> Self {
        GrooveOptions {
            style: "rock".to_string(),
        }
    }
}

fn build_groove(
    _: &RhythmRegistry,
    _: &GenerationContext<'_>,
    options: &Value,
) -> Result<Box<dyn RhythmStrategy>, ComposeError> {
    let opts: GrooveOptions = parse_options("groove", options)?;
    let pattern = RhythmPattern::for_style(&opts.style);
    log::debug!("groove style '{}' plays '{}'", opts.style, pattern.name());
    Ok(Box::new(PatternRhythm {
        source: PatternSource::Named(pattern),
    }))
}

// ---------------------------------------------------------------------------
// Hybrid
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(default)]
struct HybridOptions {
    first: StrategySpec,
    second: StrategySpec,
}

impl Default for HybridOptions {
    fn default() -> Self {
        HybridOptions {
            first: StrategySpec {
                strategy: "pattern".to_string(),
                options: json!({"pattern": "steady_quarters"}),
            },
            second: StrategySpec::named("random"),
        }
    }
}

/// `bars / 2` bars from `first`, the rest from `second`.
pub struct HybridRhythm {
    pub first: Box<dyn RhythmStrategy>,
    pub second: Box<dyn RhythmStrategy>,
}

fn build_hybrid(
    registry: &RhythmRegistry,
    ctx: &GenerationContext<'_>,
    options: &Value,
) -> Result<Box<dyn RhythmStrategy>, ComposeError> {
    let opts: HybridOptions = parse_options("hybrid", options)?;
    Ok(Box::new(HybridRhythm {
        first: opts.first.build(registry, ctx)?,
        second: opts.second.build(registry, ctx)?,
    }))
}

impl RhythmStrategy for HybridRhythm {
    fn generate(
        &self,
        ctx: &GenerationContext<'_>,
        bars: usize,
        rng: &mut ComposerRng,
    ) -> Vec<f64> {
        let first_bars = bars / 2;
        let mut durations = self.first.generate(ctx, first_bars, rng);
        durations.extend(self.second.generate(ctx, bars - first_bars, rng));
        durations
    }
}

// ---------------------------------------------------------------------------
// Dynamics and statistics
// ---------------------------------------------------------------------------

/// Velocity shapes for a rhythm track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum VelocityPattern {
    #[default]
    Flat,
    AccentDownbeats,
    Syncopated,
    Crescendo,
    Diminuendo,
}

impl From<String> for VelocityPattern {
    fn from(value: String) -> Self {
        match value.as_str() {
            "accent_downbeats" => VelocityPattern::AccentDownbeats,
            "syncopated" => VelocityPattern::Syncopated,
            "crescendo" => VelocityPattern::Crescendo,
            "diminuendo" => VelocityPattern::Diminuendo,
            _ => VelocityPattern::Flat,
        }
    }
}

/// One velocity per duration.
///
/// Flat is 90; accent_downbeats gives 110 to notes starting on a bar line and
/// 75 elsewhere; syncopated gives 100 to odd-indexed notes and 70 to even;
/// crescendo ramps 60 -> 120 and diminuendo 120 -> 60.
pub fn velocity_pattern(
    durations: &[f64],
    pattern: VelocityPattern,
    beats_per_bar: f64,
) -> Vec<u8> {
    let n = durations.len() as f64;
    let mut position = 0.0;
    durations
        .iter()
        .enumerate()
        .map(|(i, &d)| {
            let velocity = match pattern {
                VelocityPattern::Flat => 90,
                VelocityPattern::AccentDownbeats => {
                    if position % beats_per_bar < 0.1 {
                        110
                    } else {
                        75
                    }
                }
                VelocityPattern::Syncopated if i % 2 == 1 => 100,
                VelocityPattern::Syncopated => 70,
                VelocityPattern::Crescendo => (60.0 + i as f64 / n * 60.0) as u8,
                VelocityPattern::Diminuendo => (120.0 - i as f64 / n * 60.0) as u8,
            };
            position += d;
            velocity
        })
        .collect()
}

/// Summary of a duration list.
#[derive(Debug, Clone, PartialEq)]
pub struct RhythmStats {
    pub total_beats: f64,
    pub note_count: usize,
    pub average_duration: f64,
    pub shortest: f64,
    pub longest: f64,
    pub distinct_durations: usize,
}

impl RhythmStats {
    /// `None` for an empty list.
    pub fn from_durations(durations: &[f64]) -> Option<Self> {
        if durations.is_empty() {
            return None;
        }
        let total: f64 = durations.iter().sum();
        let mut sorted = durations.to_vec();
        sorted.sort_by(f64::total_cmp);
        let shortest = sorted[0];
        let longest = sorted[sorted.len() - 1];
        sorted.dedup();
        Some(RhythmStats {
            total_beats: total,
            note_count: durations.len(),
            average_duration: total / durations.len() as f64,
            shortest,
            longest,
            distinct_durations: sorted.len(),
        })
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// A built rhythm strategy plus rest marking.
pub struct RhythmGenerator {
    strategy: Box<dyn RhythmStrategy>,
}

impl RhythmGenerator {
    pub fn new(strategy: Box<dyn RhythmStrategy>) -> Self {
        RhythmGenerator { strategy }
    }

    pub fn from_registry(
        registry: &RhythmRegistry,
        name: &str,
        ctx: &GenerationContext<'_>,
        options: &Value,
    ) -> Result<Self, ComposeError> {
        Ok(RhythmGenerator::new(registry.build(name, ctx, options)?))
    }

    pub fn generate(
        &self,
        ctx: &GenerationContext<'_>,
        bars: usize,
        rng: &mut ComposerRng,
    ) -> Vec<f64> {
        self.strategy.generate(ctx, bars, rng)
    }

    /// Durations paired with `true` for a sounding note and `false` for a
    /// rest (each independently with `rest_probability`).
    pub fn generate_with_rests(
        &self,
        ctx: &GenerationContext<'_>,
        bars: usize,
        rest_probability: f64,
        rng: &mut ComposerRng,
    ) -> Vec<(f64, bool)> {
        let durations = self.generate(ctx, bars, rng);
        durations
            .into_iter()
            .map(|d| (d, rng.next_f64() >= rest_probability))
            .collect()
    }
}
