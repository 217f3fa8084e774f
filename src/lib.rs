//! # erpsim — oddball simulation and evoked-response averaging
//!
//! `erpsim` builds an oddball stimulus timeline, synthesizes a multichannel
//! EEG-like signal whose P300-like deflections are placed at the target
//! events, and recovers the evoked response by event-locked epoching and
//! averaging.  It exists to validate epoching logic against a signal whose
//! ground truth is known by construction.
//!
//! ## Pipeline overview
//!
//! ```text
//! TimelineConfig
//!   │
//!   ├─ timeline::generate_timeline()  round(N × ratio) targets, no replacement
//!   │       └─→ EventTimeline  (step, time_sec, is_target)
//!   │
//!   ├─ synth::synthesize()            N(0, σ²) noise + Gaussian bump per target
//!   │       └─→ DenseSignal    [T, C] + timestamp_sec
//!   │
//!   ├─ epoch::extract_epochs()        sfreq = 1 / median(Δt), nearest-sample
//!   │       └─→ EpochStack     [E, n_pre + n_post]   (edge events dropped)
//!   │
//!   └─ epoch::average_epochs()        mean over E
//!           └─→ Evoked         [n_pre + n_post] on linspace(tmin, tmax)
//! ```
//!
//! ## Quick start
//!
//! ```
//! use erpsim::{run_pipeline, PipelineConfig};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(7);
//! let out = run_pipeline(&PipelineConfig::default(), &mut rng).unwrap();
//!
//! assert_eq!(out.timeline.n_targets(), 6);
//! assert_eq!(out.signal.data().dim(), (2500, 24));
//! assert_eq!(out.evoked.data.len(), 250);
//! ```
//!
//! ## Running individual steps
//!
//! ```
//! use erpsim::{average_epochs, extract_epochs, generate_timeline, synthesize};
//! use erpsim::{EpochConfig, SynthConfig, TimelineConfig};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(0);
//! let timeline = generate_timeline(&TimelineConfig::default(), &mut rng).unwrap();
//! let targets = timeline.target_times();
//!
//! let signal = synthesize(&targets, &SynthConfig::default(), &mut rng).unwrap();
//!
//! let epochs = extract_epochs(&signal, 3, &targets, &EpochConfig::default()).unwrap();
//! let evoked = average_epochs(&epochs).unwrap();
//! assert_eq!(evoked.n_averaged, epochs.n_epochs());
//! ```

pub mod config;
pub mod epoch;
pub mod error;
pub mod io;
pub mod synth;
pub mod timeline;

use rand::Rng;
use tracing::info;

// ── Crate-root re-exports ─────────────────────────────────────────────────

// config
pub use config::{EpochConfig, PipelineConfig, SynthConfig, TimelineConfig};

// error
pub use error::{ErpError, Result};

// timeline
pub use timeline::{generate_timeline, target_count, Event, EventTimeline};

// synth
pub use synth::{
    gaussian_noise, gaussian_template, render_template, synthesize, synthesize_with_noise,
    time_axis, DenseSignal,
};

// epoch
pub use epoch::{
    average_epochs, extract_epochs, infer_sfreq, nearest_sample, relative_time_axis, EpochStack,
    Evoked,
};

// io — CSV tables
pub use io::{
    read_signal_csv, read_timeline_csv, write_evoked_csv, write_signal_csv, write_timeline_csv,
};

/// Everything produced by one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub timeline: EventTimeline,
    pub signal: DenseSignal,
    pub epochs: EpochStack,
    pub evoked: Evoked,
}

/// Run the **full simulation-and-analysis pipeline** in memory.
///
/// 1. Generate the oddball timeline from [`PipelineConfig::timeline`].
/// 2. Synthesize the signal from the target timestamps with
///    [`PipelineConfig::synth`] (noise drawn from `rng` after the targets).
/// 3. Epoch channel [`EpochConfig::channel`] around every target.
/// 4. Average the surviving epochs.
///
/// # Errors
///
/// * [`ErpError::InvalidParameter`] if any configuration section is invalid.
/// * [`ErpError::EmptyEpochSet`] if no target event yields a complete window
///   (including a timeline with zero targets).
pub fn run_pipeline<R: Rng + ?Sized>(
    cfg: &PipelineConfig,
    rng: &mut R,
) -> Result<PipelineOutput> {
    cfg.validate()?;

    let timeline = generate_timeline(&cfg.timeline, rng)?;
    let targets = timeline.target_times();

    let signal = synthesize(&targets, &cfg.synth, rng)?;

    let epochs = extract_epochs(&signal, cfg.epochs.channel, &targets, &cfg.epochs)?;
    let evoked = average_epochs(&epochs)?;

    info!(
        n_targets = targets.len(),
        n_epochs = epochs.n_epochs(),
        dropped = epochs.n_dropped(),
        "pipeline finished"
    );

    Ok(PipelineOutput { timeline, signal, epochs, evoked })
}
