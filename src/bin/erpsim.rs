//! erpsim: run the oddball → fake EEG → ERP pipeline, either stage by stage
//! (each stage reading its predecessor's CSV) or end to end.
//!
//! Files written by `run` inside `--out-dir`:
//!   oddball_input.csv   step,time_sec,is_target
//!   epoch_p300.csv      timestamp_sec,ch0..ch{C-1}
//!   erp.csv             time_sec,average,epoch_0..epoch_{E-1}
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use erpsim::{
    average_epochs, extract_epochs, generate_timeline, io, synthesize, EpochStack, EventTimeline,
    Evoked, PipelineConfig,
};

#[derive(Parser, Debug)]
#[command(name = "erpsim", about = "Oddball timeline, synthetic EEG and P300 averaging")]
struct Cli {
    /// Random seed (a fresh one is drawn and logged when omitted).
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// JSON pipeline configuration; missing fields use the defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the oddball timeline table.
    Timeline {
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        overrides: TimelineOverrides,
    },
    /// Synthesize the signal table from a timeline table.
    Synth {
        #[arg(long)]
        timeline: PathBuf,
        #[arg(long)]
        out: PathBuf,
    },
    /// Epoch and average a signal table around the timeline's targets.
    Erp {
        #[arg(long)]
        signal: PathBuf,
        #[arg(long)]
        timeline: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        overrides: EpochOverrides,
    },
    /// Run all three stages, writing every table into `out_dir`.
    Run {
        #[arg(long, default_value = "results")]
        out_dir: PathBuf,
        #[command(flatten)]
        timeline: TimelineOverrides,
        #[command(flatten)]
        epochs: EpochOverrides,
    },
}

#[derive(Args, Debug)]
struct TimelineOverrides {
    /// Fraction of target frames, in [0, 1].
    #[arg(long)]
    ratio: Option<f64>,
}

#[derive(Args, Debug)]
struct EpochOverrides {
    /// Channel to epoch (index).
    #[arg(long)]
    channel: Option<usize>,

    /// Window start in seconds (≤ 0).
    #[arg(long, allow_hyphen_values = true)]
    tmin: Option<f64>,

    /// Window end in seconds (> 0).
    #[arg(long)]
    tmax: Option<f64>,
}

impl TimelineOverrides {
    fn apply(&self, cfg: &mut PipelineConfig) {
        if let Some(r) = self.ratio {
            cfg.timeline.target_ratio = r;
        }
    }
}

impl EpochOverrides {
    fn apply(&self, cfg: &mut PipelineConfig) {
        if let Some(c) = self.channel {
            cfg.epochs.channel = c;
        }
        if let Some(t) = self.tmin {
            cfg.epochs.tmin = t;
        }
        if let Some(t) = self.tmax {
            cfg.epochs.tmax = t;
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut cfg = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?
        }
        None => PipelineConfig::default(),
    };

    let seed = cli.seed.unwrap_or_else(rand::random);
    info!(seed, "random source");
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    match &cli.command {
        Command::Timeline { out, overrides } => {
            overrides.apply(&mut cfg);
            stage_timeline(&cfg, out, &mut rng)?;
        }
        Command::Synth { timeline, out } => {
            let tl = io::read_timeline_csv(timeline)?;
            stage_synth(&cfg, &tl, out, &mut rng)?;
        }
        Command::Erp { signal, timeline, out, overrides } => {
            overrides.apply(&mut cfg);
            stage_erp(&cfg, signal, timeline, out)?;
        }
        Command::Run { out_dir, timeline, epochs } => {
            timeline.apply(&mut cfg);
            epochs.apply(&mut cfg);
            cfg.validate()?;
            std::fs::create_dir_all(out_dir)
                .with_context(|| format!("creating {}", out_dir.display()))?;

            let tl_path = out_dir.join("oddball_input.csv");
            let sig_path = out_dir.join("epoch_p300.csv");
            let erp_path = out_dir.join("erp.csv");

            let tl = stage_timeline(&cfg, &tl_path, &mut rng)?;
            stage_synth(&cfg, &tl, &sig_path, &mut rng)?;
            stage_erp(&cfg, &sig_path, &tl_path, &erp_path)?;
        }
    }
    Ok(())
}

fn stage_timeline(
    cfg: &PipelineConfig,
    out: &Path,
    rng: &mut ChaCha8Rng,
) -> Result<EventTimeline> {
    let tl = generate_timeline(&cfg.timeline, rng)?;
    io::write_timeline_csv(&tl, out)?;
    info!(
        frames = tl.len(),
        targets = tl.n_targets(),
        path = %out.display(),
        "[1] oddball timeline written"
    );
    Ok(tl)
}

fn stage_synth(
    cfg: &PipelineConfig,
    tl: &EventTimeline,
    out: &Path,
    rng: &mut ChaCha8Rng,
) -> Result<()> {
    let signal = synthesize(&tl.target_times(), &cfg.synth, rng)?;
    io::write_signal_csv(&signal, out)?;
    info!(
        samples = signal.n_samples(),
        channels = signal.n_channels(),
        path = %out.display(),
        "[2] synthetic EEG written"
    );
    Ok(())
}

fn stage_erp(cfg: &PipelineConfig, signal: &Path, timeline: &Path, out: &Path) -> Result<()> {
    let signal = io::read_signal_csv(signal)?;
    let tl = io::read_timeline_csv(timeline)?;
    let epochs = extract_epochs(&signal, cfg.epochs.channel, &tl.target_times(), &cfg.epochs)?;
    let evoked = average_epochs(&epochs)?;
    io::write_evoked_csv(&evoked, &epochs, out)?;
    report(cfg, &epochs, &evoked);
    info!(path = %out.display(), "[3] evoked response written");
    Ok(())
}

fn report(cfg: &PipelineConfig, epochs: &EpochStack, evoked: &Evoked) {
    info!(
        channel = %format!("ch{}", cfg.epochs.channel),
        kept = epochs.n_epochs(),
        dropped = epochs.n_dropped(),
        window = epochs.window_len(),
        sfreq = epochs.sfreq,
        "epochs averaged"
    );
    let (lo, hi) = cfg.epochs.component_window;
    match evoked.peak_in_window(lo, hi) {
        Some((latency, amplitude)) => {
            info!(latency, amplitude, window = ?(lo, hi), "P300 peak")
        }
        None => info!(window = ?(lo, hi), "component window outside epoch range"),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr);
    Registry::default().with(filter).with(fmt_layer).init();
}
