// Shared plumbing for the three strategy families.
//
// Every melody, harmony and rhythm strategy is built by name from a
// `Registry`: a name -> constructor map with a documented default. A
// constructor receives the registry itself (so hybrid strategies can build
// their sub-strategies by name), the generation context, and a JSON options
// bag that it deserializes into its own typed options struct. Name lookups
// inside options (progressions, styles, patterns) happen at construction, so
// a bad preset fails before any note is generated.
//
// Unknown strategy names do not fail: the registry logs a warning and builds
// its default strategy instead.
//
// See melody.rs, harmony.rs and rhythm.rs for the registered strategies and
// compose.rs for where registries are consulted.

use crate::error::ComposeError;
use crate::progression::ProgressionLibrary;
use crate::scale::{Key, Pitch};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Read-only inputs every strategy sees.
#[derive(Debug, Clone, Copy)]
pub struct GenerationContext<'a> {
    pub key: Key,
    /// Quarter-note beats per bar (4.0 in 4/4, 3.0 in 6/8).
    pub beats_per_bar: f64,
    pub progressions: &'a ProgressionLibrary,
}

impl<'a> GenerationContext<'a> {
    pub fn new(key: Key, beats_per_bar: f64, progressions: &'a ProgressionLibrary) -> Self {
        GenerationContext {
            key,
            beats_per_bar,
            progressions,
        }
    }

    /// The key's scale over two octaves from C4's octave, the pitch pool
    /// melody strategies draw from.
    pub fn scale(&self) -> Vec<Pitch> {
        self.key.scale_notes(4, 2)
    }

    pub fn total_beats(&self, bars: usize) -> f64 {
        bars as f64 * self.beats_per_bar
    }
}

/// Builds one strategy from its options.
pub type Constructor<S> =
    fn(&Registry<S>, &GenerationContext<'_>, &Value) -> Result<Box<S>, ComposeError>;

/// Name -> constructor map for one strategy family.
pub struct Registry<S: ?Sized> {
    family: &'static str,
    default: String,
    constructors: BTreeMap<String, Constructor<S>>,
}

impl<S: ?Sized> Registry<S> {
    /// An empty registry whose fallback is `default` (register it before
    /// building anything).
    pub fn new(family: &'static str, default: &str) -> Self {
        Registry {
            family,
            default: default.to_string(),
            constructors: BTreeMap::new(),
        }
    }

    /// Add or replace a strategy.
    pub fn register(&mut self, name: &str, constructor: Constructor<S>) -> &mut Self {
        self.constructors.insert(name.to_string(), constructor);
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    pub fn default_name(&self) -> &str {
        &self.default
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Build the strategy registered as `name`, or the default strategy when
    /// the name is unknown.
    pub fn build(
        &self,
        name: &str,
        ctx: &GenerationContext<'_>,
        options: &Value,
    ) -> Result<Box<S>, ComposeError> {
        let constructor = match self.constructors.get(name) {
            Some(c) => c,
            None => {
                log::warn!(
                    "unknown {} strategy '{name}', using '{}'",
                    self.family,
                    self.default
                );
                self.constructors
                    .get(&self.default)
                    .ok_or_else(|| ComposeError::not_found("strategy", self.default.clone()))?
            }
        };
        log::debug!("building {} strategy '{name}'", self.family);
        constructor(self, ctx, options)
    }
}

/// A nested strategy reference inside hybrid options.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StrategySpec {
    pub strategy: String,
    #[serde(default)]
    pub options: Value,
}

impl StrategySpec {
    pub fn named(strategy: &str) -> Self {
        StrategySpec {
            strategy: strategy.to_string(),
            options: Value::Null,
        }
    }

    pub fn build<S: ?Sized>(
        &self,
        registry: &Registry<S>,
        ctx: &GenerationContext<'_>,
    ) -> Result<Box<S>, ComposeError> {
        registry.build(&self.strategy, ctx, &self.options)
    }
}

/// Deserialize a strategy's typed options; a missing (`null`) bag yields the
/// defaults.
pub fn parse_options<T: DeserializeOwned + Default>(
    strategy: &str,
    options: &Value,
) -> Result<T, ComposeError> {
    if options.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(options.clone()).map_err(|source| ComposeError::Options {
        strategy: strategy.to_string(),
        source,
    })
}
