//! Oddball timeline generation.
//!
//! A timeline is a run of equally spaced frames, each labelled target
//! (oddball) or standard.  Targets are drawn uniformly without replacement;
//! there is no minimum spacing between them.
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TimelineConfig;
use crate::error::{invalid, Result};

/// One frame of the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub step: usize,
    pub time_sec: f64,
    pub is_target: bool,
}

/// Ordered, immutable frame sequence with contiguous steps `0..len`.
#[derive(Debug, Clone, PartialEq)]
pub struct EventTimeline {
    events: Vec<Event>,
}

impl EventTimeline {
    /// Build a timeline from records, checking that steps are contiguous
    /// from 0 and timestamps strictly increase.
    pub fn from_events(events: Vec<Event>) -> Result<Self> {
        for (i, ev) in events.iter().enumerate() {
            if ev.step != i {
                return Err(invalid(format!(
                    "timeline step {} found at position {i}",
                    ev.step
                )));
            }
            if !ev.time_sec.is_finite() {
                return Err(invalid(format!(
                    "non-finite timestamp at step {i}"
                )));
            }
        }
        if let Some(w) = events.windows(2).find(|w| w[1].time_sec <= w[0].time_sec) {
            return Err(invalid(format!(
                "timestamps not strictly increasing at step {}",
                w[1].step
            )));
        }
        Ok(Self { events })
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn n_targets(&self) -> usize {
        self.events.iter().filter(|e| e.is_target).count()
    }

    /// Timestamps of target frames, in step order.
    pub fn target_times(&self) -> Vec<f64> {
        self.events
            .iter()
            .filter(|e| e.is_target)
            .map(|e| e.time_sec)
            .collect()
    }
}

/// Number of targets for a timeline: `round(total_frames × ratio)`, ties to even.
pub fn target_count(total_frames: usize, target_ratio: f64) -> usize {
    (total_frames as f64 * target_ratio).round_ties_even() as usize
}

/// Generate an oddball timeline from `cfg` using `rng` for target selection.
///
/// # Errors
///
/// [`ErpError::InvalidParameter`](crate::ErpError::InvalidParameter) when
/// `total_frames` is zero, `frame_period` is not positive, or
/// `target_ratio` is outside `[0, 1]`.
pub fn generate_timeline<R: Rng + ?Sized>(
    cfg: &TimelineConfig,
    rng: &mut R,
) -> Result<EventTimeline> {
    cfg.validate()?;
    let n = cfg.total_frames;
    let n_targets = target_count(n, cfg.target_ratio).min(n);

    let mut is_target = vec![false; n];
    for idx in rand::seq::index::sample(rng, n, n_targets) {
        is_target[idx] = true;
    }

    let events = is_target
        .into_iter()
        .enumerate()
        .map(|(step, is_target)| Event {
            step,
            time_sec: step as f64 * cfg.frame_period,
            is_target,
        })
        .collect();

    debug!(n_frames = n, n_targets, "generated oddball timeline");
    Ok(EventTimeline { events })
}
