//! Detects and repairs disagreement between the clock's elapsed time and its spatial progress.
//! The clock keeps them consistent itself, but restored savestates and stale tables can still
//! leave them apart.

use serde::Serialize;

use crate::AnimationClock;

/// More drift than this in seconds counts as out of sync
pub const TIME_TOLERANCE: f64 = 1.0;
/// More drift than this fraction of the route counts as out of sync
pub const PROGRESS_TOLERANCE: f64 = 0.02;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SyncReport {
    pub in_sync: bool,
    /// The elapsed time matching the current spatial progress
    pub expected_time: f64,
    /// The spatial progress matching the current elapsed time
    pub expected_progress: f64,
    pub time_delta: f64,
    pub progress_delta: f64,
}

pub fn check(clock: &AnimationClock) -> SyncReport {
    let table = clock.table();
    let state = clock.state();

    // Inside a pause at a zero-length segment, many times share one position. Any of them is
    // fine, so measure against the closest.
    let (low, high) = table.progress_time_span(state.spatial_progress);
    let expected_time = state.elapsed_time.max(low).min(high);
    let expected_progress = table.time_to_progress(state.elapsed_time);

    let time_delta = state.elapsed_time - expected_time;
    let progress_delta = state.spatial_progress - expected_progress;
    SyncReport {
        in_sync: time_delta.abs() <= TIME_TOLERANCE && progress_delta.abs() <= PROGRESS_TOLERANCE,
        expected_time,
        expected_progress,
        time_delta,
        progress_delta,
    }
}

/// Spatial progress is what's visible on the map, so it wins. Elapsed time is recalculated from
/// it. Playing or paused doesn't change.
pub fn force_resync(clock: &mut AnimationClock) -> SyncReport {
    let report = check(clock);
    if !report.in_sync {
        warn!(
            "Clock drifted: elapsed time off by {:.3}s, progress off by {:.4}. Snapping time to {:.3}s",
            report.time_delta, report.progress_delta, report.expected_time
        );
    }
    clock.set_elapsed_time_keeping_progress(report.expected_time);
    report
}
