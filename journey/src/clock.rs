use serde::{Deserialize, Serialize};

use crate::sync::{self, SyncReport};
use crate::TimingTable;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackStatus {
    /// At the very beginning, never played or explicitly reset
    Stopped,
    Paused,
    Playing,
}

/// Where playback is. `elapsed_time` and `spatial_progress` always describe the same moment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClockState {
    pub elapsed_time: f64,
    pub status: PlaybackStatus,
    pub spatial_progress: f64,
    /// None only when there's nothing to play
    pub current_segment: Option<usize>,
}

impl ClockState {
    fn stopped(table: &TimingTable) -> Self {
        Self {
            elapsed_time: 0.0,
            status: PlaybackStatus::Stopped,
            spatial_progress: 0.0,
            current_segment: table.entry_index_at_time(0.0),
        }
    }
}

/// Sent to every listener after each change to the clock.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProgressUpdate {
    pub elapsed_time: f64,
    pub total_duration: f64,
    pub spatial_progress: f64,
    pub current_segment: Option<usize>,
    pub status: PlaybackStatus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerID(usize);

pub type Listener = Box<dyn FnMut(&ProgressUpdate)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SpeedSetting {
    /// 1 playback second per 2 real seconds
    Half,
    /// 1 playback second per real second
    Realtime,
    /// 2 playback seconds per real second
    Double,
    /// 4 playback seconds per real second
    Quadruple,
    /// 16 playback seconds per real second
    Fastest,
}

impl SpeedSetting {
    pub fn multiplier(self) -> f64 {
        match self {
            SpeedSetting::Half => 0.5,
            SpeedSetting::Realtime => 1.0,
            SpeedSetting::Double => 2.0,
            SpeedSetting::Quadruple => 4.0,
            SpeedSetting::Fastest => 16.0,
        }
    }

    pub fn faster(self) -> Self {
        match self {
            SpeedSetting::Half => SpeedSetting::Realtime,
            SpeedSetting::Realtime => SpeedSetting::Double,
            SpeedSetting::Double => SpeedSetting::Quadruple,
            SpeedSetting::Quadruple | SpeedSetting::Fastest => SpeedSetting::Fastest,
        }
    }

    pub fn slower(self) -> Self {
        match self {
            SpeedSetting::Half | SpeedSetting::Realtime => SpeedSetting::Half,
            SpeedSetting::Double => SpeedSetting::Realtime,
            SpeedSetting::Quadruple => SpeedSetting::Double,
            SpeedSetting::Fastest => SpeedSetting::Quadruple,
        }
    }
}

const MIN_SPEED: f64 = 0.1;
const MAX_SPEED: f64 = 64.0;

/// The single source of truth for playback. Owns the timing table for the loaded journey and
/// advances elapsed time once per frame while playing. Everything that displays the current
/// position or time subscribes here instead of keeping its own copy.
pub struct AnimationClock {
    table: TimingTable,
    state: ClockState,
    speed_multiplier: f64,
    listeners: Vec<(ListenerID, Listener)>,
    next_listener: usize,
}

impl AnimationClock {
    pub fn new(table: TimingTable) -> Self {
        let state = ClockState::stopped(&table);
        Self {
            table,
            state,
            speed_multiplier: 1.0,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn subscribe(&mut self, listener: Listener) -> ListenerID {
        let id = ListenerID(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerID) {
        self.listeners.retain(|(x, _)| *x != id);
    }

    pub fn play(&mut self) {
        if self.table.is_empty() {
            warn!("Can't play a journey with no segments");
            return;
        }
        if self.state.status == PlaybackStatus::Playing {
            return;
        }
        self.state.status = PlaybackStatus::Playing;
        debug!("Playing from {}s", self.state.elapsed_time);
        self.emit();
    }

    pub fn pause(&mut self) {
        if self.state.status != PlaybackStatus::Playing {
            return;
        }
        self.state.status = PlaybackStatus::Paused;
        debug!("Paused at {}s", self.state.elapsed_time);
        self.emit();
    }

    pub fn toggle_play_pause(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn reset(&mut self) {
        self.state = ClockState::stopped(&self.table);
        debug!("Reset to the start");
        self.emit();
    }

    /// Advance by `dt` real seconds. Returns false once playback isn't running anymore, so the
    /// caller knows to stop scheduling ticks. Does nothing unless playing.
    pub fn tick(&mut self, dt: f64) -> bool {
        if self.state.status != PlaybackStatus::Playing {
            return false;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        self.state.elapsed_time += dt * self.speed_multiplier;
        if self.state.elapsed_time >= self.table.total_duration {
            // Stay on the last frame instead of jumping back to the start
            self.state.elapsed_time = self.table.total_duration;
            self.state.status = PlaybackStatus::Paused;
            info!("Playback reached the end at {}s", self.table.total_duration);
        }
        self.sync_from_time();
        self.emit();
        self.is_playing()
    }

    /// For spatial controls: the progress bar, elevation profile, or clicking the map.
    pub fn seek_to_progress(&mut self, progress: f64) {
        self.state.spatial_progress = if self.table.is_empty() {
            0.0
        } else {
            clamp_progress(progress)
        };
        self.state.elapsed_time = self.table.progress_to_time(self.state.spatial_progress);
        self.state.current_segment = self.table.entry_index_at_time(self.state.elapsed_time);
        self.after_seek();
    }

    /// For time-based controls, like a timeline scrubber.
    pub fn seek_to_time(&mut self, time: f64) {
        self.state.elapsed_time = self.clamp_time(time);
        self.sync_from_time();
        self.after_seek();
    }

    /// Swap in a table built from edited segments. The marker stays where it is; elapsed time is
    /// recalculated against the new durations.
    pub fn rebuild_timing_table(&mut self, table: TimingTable) {
        let progress = self.state.spatial_progress;
        self.table = table;
        if self.table.is_empty() {
            self.state = ClockState::stopped(&self.table);
        } else {
            self.state.elapsed_time = self.table.progress_to_time(progress);
            self.state.current_segment = self.table.entry_index_at_time(self.state.elapsed_time);
        }
        debug!(
            "Rebuilt timing table: {} segments, {}s total, now at {}s",
            self.table.len(),
            self.table.total_duration,
            self.state.elapsed_time
        );
        self.emit();
    }

    /// Load a previously saved state as-is. It might not agree with the current table; use
    /// `validate_sync` and `force_resync` to check and fix.
    pub fn restore(&mut self, state: ClockState) {
        if self.table.is_empty() {
            self.state = ClockState::stopped(&self.table);
        } else {
            let elapsed_time = self.clamp_time(state.elapsed_time);
            let status = if state.status == PlaybackStatus::Stopped && elapsed_time > 0.0 {
                PlaybackStatus::Paused
            } else {
                state.status
            };
            self.state = ClockState {
                elapsed_time,
                status,
                spatial_progress: clamp_progress(state.spatial_progress),
                current_segment: self.table.entry_index_at_time(elapsed_time),
            };
        }
        self.emit();
    }

    pub fn set_speed(&mut self, setting: SpeedSetting) {
        self.set_speed_multiplier(setting.multiplier());
    }

    pub fn set_speed_multiplier(&mut self, multiplier: f64) {
        if !multiplier.is_finite() {
            warn!("Ignoring speed multiplier {multiplier}");
            return;
        }
        self.speed_multiplier = multiplier.max(MIN_SPEED).min(MAX_SPEED);
    }

    pub fn validate_sync(&self) -> SyncReport {
        sync::check(self)
    }

    pub fn force_resync(&mut self) -> SyncReport {
        sync::force_resync(self)
    }

    pub fn elapsed_time(&self) -> f64 {
        self.state.elapsed_time
    }

    pub fn spatial_progress(&self) -> f64 {
        self.state.spatial_progress
    }

    pub fn total_duration(&self) -> f64 {
        self.table.total_duration
    }

    pub fn is_playing(&self) -> bool {
        self.state.status == PlaybackStatus::Playing
    }

    pub fn status(&self) -> PlaybackStatus {
        self.state.status
    }

    pub fn current_segment(&self) -> Option<usize> {
        self.state.current_segment
    }

    pub fn speed_multiplier(&self) -> f64 {
        self.speed_multiplier
    }

    pub fn state(&self) -> &ClockState {
        &self.state
    }

    pub fn table(&self) -> &TimingTable {
        &self.table
    }

    pub fn snapshot(&self) -> ProgressUpdate {
        ProgressUpdate {
            elapsed_time: self.state.elapsed_time,
            total_duration: self.table.total_duration,
            spatial_progress: self.state.spatial_progress,
            current_segment: self.state.current_segment,
            status: self.state.status,
        }
    }

    /// Only the validator overrides elapsed time without deriving it from progress.
    pub(crate) fn set_elapsed_time_keeping_progress(&mut self, time: f64) {
        let time = self.clamp_time(time);
        let current_segment = self.table.entry_index_at_time(time);
        if time == self.state.elapsed_time && current_segment == self.state.current_segment {
            return;
        }
        self.state.elapsed_time = time;
        self.state.current_segment = current_segment;
        self.emit();
    }

    fn sync_from_time(&mut self) {
        self.state.spatial_progress = self.table.time_to_progress(self.state.elapsed_time);
        self.state.current_segment = self.table.entry_index_at_time(self.state.elapsed_time);
    }

    fn after_seek(&mut self) {
        // Stopped means sitting at 0
        if self.state.status == PlaybackStatus::Stopped && self.state.elapsed_time > 0.0 {
            self.state.status = PlaybackStatus::Paused;
        }
        self.emit();
    }

    fn clamp_time(&self, time: f64) -> f64 {
        if time.is_nan() {
            return 0.0;
        }
        time.max(0.0).min(self.table.total_duration)
    }

    fn emit(&mut self) {
        let update = self.snapshot();
        for (_, listener) in &mut self.listeners {
            listener(&update);
        }
    }
}

fn clamp_progress(progress: f64) -> f64 {
    if progress.is_nan() {
        return 0.0;
    }
    progress.max(0.0).min(1.0)
}
