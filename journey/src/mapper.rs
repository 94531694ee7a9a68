//! Converting between spatial progress and elapsed time. The two axes aren't proportional: each
//! entry's share of time is independent from its share of coordinates.
//!
//! At a boundary shared by two entries, lookups always resolve to the earlier entry.

use crate::TimingTable;

impl TimingTable {
    /// Index of the first entry whose time interval ends at or after `time`.
    pub fn entry_index_at_time(&self, time: f64) -> Option<usize> {
        if self.entries.is_empty() {
            return None;
        }
        let time = clamp(time, 0.0, self.total_duration);
        let idx = self.entries.partition_point(|e| e.end_time < time);
        Some(idx.min(self.entries.len() - 1))
    }

    /// Index of the first entry whose progress slice ends at or after `progress`.
    pub fn entry_index_at_progress(&self, progress: f64) -> Option<usize> {
        if self.entries.is_empty() {
            return None;
        }
        let progress = clamp(progress, 0.0, 1.0);
        let idx = self.entries.partition_point(|e| e.progress_end < progress);
        Some(idx.min(self.entries.len() - 1))
    }

    pub fn time_to_progress(&self, time: f64) -> f64 {
        let idx = match self.entry_index_at_time(time) {
            Some(idx) => idx,
            None => return 0.0,
        };
        let entry = &self.entries[idx];
        let time = clamp(time, 0.0, self.total_duration);

        let local = if entry.duration == 0.0 {
            1.0
        } else {
            clamp((time - entry.start_time) / entry.duration, 0.0, 1.0)
        };
        if local == 1.0 {
            // Land exactly on the bound, so the final tick reports exactly 1
            return entry.progress_end;
        }
        entry.progress_start + local * entry.progress_width()
    }

    pub fn progress_to_time(&self, progress: f64) -> f64 {
        let idx = match self.entry_index_at_progress(progress) {
            Some(idx) => idx,
            None => return 0.0,
        };
        let entry = &self.entries[idx];
        let progress = clamp(progress, 0.0, 1.0);

        let width = entry.progress_width();
        let local = if width == 0.0 {
            0.0
        } else {
            clamp((progress - entry.progress_start) / width, 0.0, 1.0)
        };
        if local == 1.0 {
            return entry.end_time;
        }
        entry.start_time + local * entry.duration
    }

    /// Every elapsed time that maps to this progress. Usually a single instant, but when the
    /// progress sits on a zero-width entry, the marker stays put for that entry's whole duration.
    pub fn progress_time_span(&self, progress: f64) -> (f64, f64) {
        let low = self.progress_to_time(progress);
        let mut high = low;
        if let Some(start_idx) = self.entry_index_at_progress(progress) {
            let progress = clamp(progress, 0.0, 1.0);
            for entry in &self.entries[start_idx..] {
                if entry.progress_start > progress {
                    break;
                }
                if entry.progress_width() == 0.0 {
                    high = entry.end_time;
                } else if entry.progress_start == progress {
                    high = entry.start_time;
                }
            }
        }
        (low, high)
    }
}

// NaN becomes the lower bound, so a bad drag event can't poison the clock
fn clamp(x: f64, low: f64, high: f64) -> f64 {
    if x.is_nan() {
        return low;
    }
    x.max(low).min(high)
}
