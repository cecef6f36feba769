// Cadenza Composition Engine
//
// Procedurally composes multi-track material (melody, harmony, rhythm) from
// a key, a meter and per-track strategy choices, and renders it as timed
// note events for a Standard MIDI File. A music-theory model feeds three
// families of interchangeable generation strategies, each selected by name
// from a registry; an assembler shapes the results into a performance
// timeline with structural dynamics and humanized timing.
//
// Architecture:
// - scale.rs: Scale types, keys (parsing, modulation), time signatures
// - chord.rs: Chord qualities, chord spelling with inversions, diatonic lookup
// - progression.rs: Named chord progressions and the progression library
// - voice_leading.rs: Greedy inversion choice minimizing voice movement
// - strategy.rs: Generation context, strategy registries, options parsing
// - markov.rs: Interval-weighted pitch transition tables
// - structure.rs: Motif/variation phrase building, harmonic-function skeletons
// - scoring.rs: Chord-fit and melodic-shape scores for the search strategies
// - search.rs: Genetic search and greedy simulation search
// - melody.rs: Melody strategies, timing variation, velocity curves
// - harmony.rs: Harmony strategies (progression, diatonic, functional, hybrid)
// - rhythm.rs: Rhythm strategies, named patterns, rests, velocity patterns
// - arrange.rs: Note normalization, velocity envelope, tick timing
// - midi.rs: MIDI file output from arrangements
// - preset.rs: TOML/JSON presets and the built-in preset set
// - compose.rs: The preset -> arrangement pipeline
// - error.rs: Error type and parameter clamping
//
// Output is deterministic given a seed: every random draw comes from the
// `ComposerRng` (cadenza_prng) threaded through each call.

pub mod arrange;
pub mod chord;
pub mod compose;
pub mod error;
pub mod harmony;
pub mod markov;
pub mod melody;
pub mod midi;
pub mod preset;
pub mod progression;
pub mod rhythm;
pub mod scale;
pub mod scoring;
pub mod search;
pub mod strategy;
pub mod structure;
pub mod voice_leading;

pub use cadenza_prng::ComposerRng;
pub use compose::Composer;
pub use error::ComposeError;
pub use preset::Preset;
