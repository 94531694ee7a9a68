use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{ranges_are_contiguous, Segment, TimingConfig};

/// Tolerance for checking the table's own invariants
const EPSILON: f64 = 1e-9;

/// When one segment plays, and which slice of the route it covers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimingEntry {
    /// Seconds. Always resolved, even if the user never picked one.
    pub duration: f64,
    pub start_time: f64,
    pub end_time: f64,
    /// Fractions of the total coordinate count
    pub progress_start: f64,
    pub progress_end: f64,
}

impl TimingEntry {
    pub fn progress_width(&self) -> f64 {
        self.progress_end - self.progress_start
    }
}

/// A sequence of segments with contiguous, sorted time and progress intervals. Both axes start at 0;
/// progress ends at 1 and time ends at `total_duration`.
///
/// Rebuilt from scratch whenever the segments change; never patched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimingTable {
    pub entries: Vec<TimingEntry>,
    pub total_duration: f64,
}

impl TimingTable {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            total_duration: 0.0,
        }
    }

    pub fn build(segments: &[Segment], config: &TimingConfig) -> Self {
        if segments.is_empty() {
            return Self::empty();
        }
        if !ranges_are_contiguous(segments) {
            warn!(
                "Coordinate ranges of {} segments aren't contiguous; nothing to play",
                segments.len()
            );
            return Self::empty();
        }

        let total_count: usize = segments.iter().map(|s| s.num_coordinates()).sum();

        let mut entries = Vec::with_capacity(segments.len());
        let mut time = 0.0;
        let mut count_so_far = 0;
        for (idx, segment) in segments.iter().enumerate() {
            let duration = config.resolve_duration(segment);

            // Always divide integer counts, so neighbors share the exact same bound and the last
            // entry ends at exactly 1
            let (progress_start, progress_end) = if total_count == 0 {
                // Nothing has coordinates; split evenly
                (
                    idx as f64 / segments.len() as f64,
                    (idx + 1) as f64 / segments.len() as f64,
                )
            } else {
                let start = count_so_far as f64 / total_count as f64;
                count_so_far += segment.num_coordinates();
                (start, count_so_far as f64 / total_count as f64)
            };

            entries.push(TimingEntry {
                duration,
                start_time: time,
                end_time: time + duration,
                progress_start,
                progress_end,
            });
            time += duration;
        }

        let table = Self {
            entries,
            total_duration: time,
        };
        if let Err(err) = table.check_invariants() {
            // No caller can do anything sensible with a broken table
            if cfg!(debug_assertions) {
                panic!("Built a malformed timing table: {err}");
            }
            error!("Built a malformed timing table, dropping it: {err}");
            return Self::empty();
        }
        debug!(
            "Built a timing table for {} segments, lasting {}s",
            table.entries.len(),
            table.total_duration
        );
        table
    }

    pub fn check_invariants(&self) -> Result<()> {
        if self.entries.is_empty() {
            if self.total_duration != 0.0 {
                bail!("Empty table lasts {}s", self.total_duration);
            }
            return Ok(());
        }

        let first = &self.entries[0];
        if first.start_time != 0.0 || first.progress_start != 0.0 {
            bail!(
                "First entry starts at time {} and progress {}",
                first.start_time,
                first.progress_start
            );
        }
        for (idx, entry) in self.entries.iter().enumerate() {
            if !entry.duration.is_finite() || entry.duration < 0.0 {
                bail!("Entry {idx} has duration {}", entry.duration);
            }
            if (entry.end_time - (entry.start_time + entry.duration)).abs() > EPSILON {
                bail!(
                    "Entry {idx} goes from {} to {}, but lasts {}",
                    entry.start_time,
                    entry.end_time,
                    entry.duration
                );
            }
            if entry.progress_end < entry.progress_start {
                bail!(
                    "Entry {idx} covers progress {} to {}",
                    entry.progress_start,
                    entry.progress_end
                );
            }
        }
        for (idx, pair) in self.entries.windows(2).enumerate() {
            if pair[0].end_time != pair[1].start_time {
                bail!(
                    "Time gap between entries {} and {}: {} then {}",
                    idx,
                    idx + 1,
                    pair[0].end_time,
                    pair[1].start_time
                );
            }
            if pair[0].progress_end != pair[1].progress_start {
                bail!(
                    "Progress gap between entries {} and {}: {} then {}",
                    idx,
                    idx + 1,
                    pair[0].progress_end,
                    pair[1].progress_start
                );
            }
        }
        let last = &self.entries[self.entries.len() - 1];
        if (last.progress_end - 1.0).abs() > EPSILON {
            bail!("Last entry ends at progress {}", last.progress_end);
        }
        if (last.end_time - self.total_duration).abs() > EPSILON {
            bail!(
                "Last entry ends at {}, but the total is {}",
                last.end_time,
                self.total_duration
            );
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
