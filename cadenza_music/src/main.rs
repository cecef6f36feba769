// Cadenza composition CLI.
//
// Loads a preset (built-in name or file path), applies command-line
// overrides, composes every track, and writes a Standard MIDI File.
//
// Usage:
//   cargo run -p cadenza_music --bin generate -- --output song.mid
//     [--preset pop|jazz|classical|PATH] [--bars N] [--seed N] [--tempo BPM]
//     [--progressions FILE.json] [-v...]
//   cargo run -p cadenza_music --bin generate -- --list

use anyhow::{Context, Result, bail};
use cadenza_music::midi::write_midi;
use cadenza_music::progression::ProgressionLibrary;
use cadenza_music::{Composer, ComposerRng, Preset};
use clap::Parser;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser)]
#[command(name = "generate", version, about = "Algorithmic multi-track MIDI composer")]
struct Cli {
    /// Built-in preset name or path to a .toml/.json preset
    #[arg(short, long, default_value = "pop")]
    preset: String,

    /// Output MIDI file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override the preset's bar count
    #[arg(long)]
    bars: Option<usize>,

    /// Random seed (overrides the preset's seed)
    #[arg(long)]
    seed: Option<u64>,

    /// Override the preset's tempo (BPM)
    #[arg(long)]
    tempo: Option<u32>,

    /// Extra progression library (JSON) merged over the built-ins
    #[arg(long)]
    progressions: Option<PathBuf>,

    /// List strategies, progressions and presets, then exit
    #[arg(long)]
    list: bool,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let mut library = ProgressionLibrary::default_library();
    if let Some(path) = &cli.progressions {
        let extra = ProgressionLibrary::load(path)
            .with_context(|| format!("loading progressions from {}", path.display()))?;
        library.extend(extra);
    }
    let composer = Composer::new(library);

    if cli.list {
        print_listing(&composer);
        return Ok(());
    }

    let Some(output) = cli.output else {
        bail!("--output is required unless --list is given");
    };

    let mut preset =
        Preset::resolve(&cli.preset).with_context(|| format!("loading preset '{}'", cli.preset))?;
    if let Some(bars) = cli.bars {
        preset.bars = bars;
    }
    if let Some(tempo) = cli.tempo {
        preset.tempo = tempo;
    }
    let seed = cli.seed.or(preset.seed).unwrap_or_else(clock_seed);

    println!("=== Cadenza ===");
    println!("Preset: {} ({} tracks)", preset.name, preset.tracks.len());
    println!("Key: {}  Meter: {}  Tempo: {} BPM", preset.key, preset.time_signature, preset.tempo);
    println!("Bars: {}  Seed: {}", preset.bars, seed);

    let mut rng = ComposerRng::new(seed);
    let arrangement = composer
        .compose(&preset, &mut rng)
        .with_context(|| format!("composing preset '{}'", preset.name))?;

    for track in &arrangement.tracks {
        println!(
            "  {:<10} ch {:>2}  program {:>3}  {:>4} notes",
            track.name,
            track.channel,
            track.program,
            track.events.len()
        );
    }

    write_midi(&arrangement, &output)
        .with_context(|| format!("writing MIDI to {}", output.display()))?;

    let beats = arrangement.end_tick() as f64 / cadenza_music::arrange::TICKS_PER_BEAT as f64;
    println!(
        "Wrote {} ({:.0}s at {} BPM)",
        output.display(),
        beats * 60.0 / preset.tempo.max(1) as f64,
        preset.tempo
    );
    Ok(())
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn print_listing(composer: &Composer) {
    println!("Melody strategies:  {}", composer.melody_registry().names().join(", "));
    println!("Harmony strategies: {}", composer.harmony_registry().names().join(", "));
    println!("Rhythm strategies:  {}", composer.rhythm_registry().names().join(", "));
    println!("Rhythm patterns:    {}", {
        let names: Vec<&str> = cadenza_music::rhythm::all_patterns()
            .into_iter()
            .map(|p| p.name())
            .collect();
        names.join(", ")
    });
    println!("Presets:            {}", Preset::builtin_names().join(", "));
    println!("Progressions:");
    for p in &composer.progressions().progressions {
        println!("  {:<20} {:<10} complexity {}  {}", p.name, p.style, p.complexity, p.description);
    }
}
