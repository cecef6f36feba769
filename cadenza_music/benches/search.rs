// Benchmarks for the search-based melody strategies, the dominant cost of a
// composition run: genetic search scales with population x generations,
// simulation search with simulations x length x candidates per step.

use cadenza_music::ComposerRng;
use cadenza_music::progression::ProgressionLibrary;
use cadenza_music::scale::Key;
use cadenza_music::search::{GeneticConfig, MctsConfig, evolve, simulate};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

fn bench_genetic(c: &mut Criterion) {
    let key = Key::major(0);
    let scale = key.scale_notes(4, 2);
    let library = ProgressionLibrary::default_library();
    let chords = match library.get("pop_basic") {
        Ok(p) => p.chords(),
        Err(_) => return,
    };

    let mut group = c.benchmark_group("genetic");
    for generations in [10usize, 50, 100] {
        let config = GeneticConfig {
            generations,
            ..Default::default()
        };
        group.bench_with_input(
            BenchmarkId::from_parameter(generations),
            &config,
            |b, config| {
                b.iter(|| {
                    let mut rng = ComposerRng::new(42);
                    black_box(evolve(&scale, &chords, &key, 16, config, &mut rng))
                })
            },
        );
    }
    group.finish();
}

fn bench_simulation(c: &mut Criterion) {
    let scale = Key::minor(9).scale_notes(4, 2);

    let mut group = c.benchmark_group("simulation");
    for simulations in [100usize, 1000] {
        let config = MctsConfig {
            simulations,
            ..Default::default()
        };
        group.bench_with_input(
            BenchmarkId::from_parameter(simulations),
            &config,
            |b, config| {
                b.iter(|| {
                    let mut rng = ComposerRng::new(42);
                    black_box(simulate(&scale, 16, config, &mut rng))
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_genetic, bench_simulation);
criterion_main!(benches);
