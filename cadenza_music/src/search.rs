// Search-based melody construction: a genetic algorithm and a greedy
// simulation search.
//
// Genetic search (`evolve`): a population of random scale-pitch sequences is
// scored by `chord_fitness` (scoring.rs). Each generation keeps the top half
// by fitness (stable descending sort, so earlier individuals win ties), then
// refills the population from pairs of distinct survivors with single-point
// crossover and per-gene mutation. The best final individual is returned.
//
// Simulation search (`simulate`): each simulation extends a melody one note
// at a time, picking the candidate with the best `continuation_score` and
// occasionally a uniformly random candidate instead. The best complete
// melody across simulations wins.
//
// Both take an explicit `ComposerRng`; nothing here holds state between
// calls. Consumed by the `genetic` and `mcts` melody strategies (melody.rs).

use crate::chord::Chord;
use crate::error::clamp_param;
use crate::scale::{Key, Pitch};
use crate::scoring::{chord_fitness, continuation_score};
use cadenza_prng::ComposerRng;
use serde::Deserialize;

/// Genetic search parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    /// Individuals per generation (at least 2).
    pub population_size: usize,
    pub generations: usize,
    /// Probability a parent pair is recombined rather than copied.
    pub crossover_rate: f64,
    /// Per-gene probability of replacement by a random scale pitch.
    pub mutation_rate: f64,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        GeneticConfig {
            population_size: 50,
            generations: 100,
            crossover_rate: 0.7,
            mutation_rate: 0.1,
        }
    }
}

/// Result of a genetic run.
#[derive(Debug, Clone)]
pub struct GeneticResult {
    pub melody: Vec<Pitch>,
    pub fitness: f64,
    pub generations: usize,
    pub evaluations: usize,
}

/// Evolve a melody of `length` pitches drawn from `scale` to fit `chords`.
pub fn evolve(
    scale: &[Pitch],
    chords: &[Chord],
    key: &Key,
    length: usize,
    config: &GeneticConfig,
    rng: &mut ComposerRng,
) -> GeneticResult {
    if length == 0 || scale.is_empty() {
        return GeneticResult {
            melody: Vec::new(),
            fitness: 0.0,
            generations: 0,
            evaluations: 0,
        };
    }

    let pop_size = clamp_param(
        "population_size",
        config.population_size as f64,
        2.0,
        f64::MAX,
    ) as usize;
    let survivors = (pop_size / 2).max(2);
    let random_pitch = |rng: &mut ComposerRng| scale[rng.range_usize(0, scale.len())];

    let mut population: Vec<Vec<Pitch>> = Vec::with_capacity(pop_size);
    for _ in 0..pop_size {
        let mut individual = Vec::with_capacity(length);
        for _ in 0..length {
            individual.push(random_pitch(rng));
        }
        population.push(individual);
    }
    let mut evaluations = 0;

    for _ in 0..config.generations {
        let scores: Vec<f64> = population
            .iter()
            .map(|m| chord_fitness(m, chords, key))
            .collect();
        evaluations += scores.len();

        let mut order: Vec<usize> = (0..population.len()).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
        let selected: Vec<Vec<Pitch>> = order
            .iter()
            .take(survivors)
            .map(|&i| population[i].clone())
            .collect();

        let mut next = selected.clone();
        while next.len() < pop_size {
            let pair = rng.sample_indices(selected.len(), 2);
            let (p1, p2) = (&selected[pair[0]], &selected[pair[1]]);
            let (mut c1, mut c2) = if length > 1 && rng.random_bool(config.crossover_rate) {
                let cut = rng.range_usize_inclusive(1, length - 1);
                (
                    [&p1[..cut], &p2[cut..]].concat(),
                    [&p2[..cut], &p1[cut..]].concat(),
                )
            } else {
                (p1.clone(), p2.clone())
            };
            for child in [&mut c1, &mut c2] {
                for gene in child.iter_mut() {
                    if rng.random_bool(config.mutation_rate) {
                        *gene = random_pitch(rng);
                    }
                }
            }
            next.push(c1);
            next.push(c2);
        }
        next.truncate(pop_size);
        population = next;
    }

    let mut best = 0;
    let mut best_fitness = f64::MIN;
    for (i, m) in population.iter().enumerate() {
        let f = chord_fitness(m, chords, key);
        evaluations += 1;
        if f > best_fitness {
            best_fitness = f;
            best = i;
        }
    }

    GeneticResult {
        melody: population.swap_remove(best),
        fitness: best_fitness,
        generations: config.generations,
        evaluations,
    }
}

/// Simulation search parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MctsConfig {
    pub simulations: usize,
    /// Probability a step ignores the heuristic and picks uniformly.
    pub exploration_rate: f64,
    /// Largest leap (semitones) from the previous note.
    pub max_leap: i32,
    pub low: Pitch,
    pub high: Pitch,
}

impl Default for MctsConfig {
    fn default() -> Self {
        MctsConfig {
            simulations: 1000,
            exploration_rate: 0.2,
            max_leap: 8,
            low: 48,
            high: 84,
        }
    }
}

/// Result of a simulation search.
#[derive(Debug, Clone)]
pub struct MctsResult {
    pub melody: Vec<Pitch>,
    pub score: f64,
    pub simulations: usize,
}

fn candidates(scale: &[Pitch], so_far: &[Pitch], config: &MctsConfig) -> Vec<Pitch> {
    let Some(&last) = so_far.last() else {
        return scale.first().copied().into_iter().collect();
    };
    let near: Vec<Pitch> = scale
        .iter()
        .copied()
        .filter(|&p| (config.low..=config.high).contains(&p) && (p - last).abs() <= config.max_leap)
        .collect();
    if near.is_empty() { vec![last] } else { near }
}

/// Run `config.simulations` greedy rollouts and keep the best melody.
pub fn simulate(
    scale: &[Pitch],
    length: usize,
    config: &MctsConfig,
    rng: &mut ComposerRng,
) -> MctsResult {
    let mut best: Vec<Pitch> = Vec::new();
    let mut best_score = -1.0;
    if length == 0 || scale.is_empty() {
        return MctsResult {
            melody: best,
            score: 0.0,
            simulations: 0,
        };
    }

    for _ in 0..config.simulations {
        let mut melody: Vec<Pitch> = Vec::with_capacity(length);
        for _ in 0..length {
            let options = candidates(scale, &melody, config);
            let mut choice = options[0];
            let mut choice_score = -1.0;
            for &candidate in &options {
                melody.push(candidate);
                let score = continuation_score(&melody, length);
                melody.pop();
                if score > choice_score {
                    choice_score = score;
                    choice = candidate;
                }
            }
            if rng.random_bool(config.exploration_rate) {
                if let Some(&random) = rng.choose(&options) {
                    choice = random;
                }
            }
            melody.push(choice);
        }

        let score = continuation_score(&melody, length);
        if score > best_score {
            best_score = score;
            best = melody;
        }
    }

    MctsResult {
        melody: best,
        score: best_score.max(0.0),
        simulations: config.simulations,
    }
}
