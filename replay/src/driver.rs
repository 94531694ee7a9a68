use std::cell::RefCell;
use std::rc::Rc;

use journey::{format_progress, JourneyPlayer, ProgressUpdate};

/// Plays a journey without a window, one fixed-length frame at a time, and logs what a viewer
/// would see.
pub struct Driver {
    player: JourneyPlayer,
    /// Real seconds per frame
    frame: f64,
    /// Journey seconds between progress lines
    report_every: f64,
    /// Frames between sync checks
    sync_every: usize,
}

/// What happened during one run
#[derive(Debug, Default)]
pub struct Summary {
    pub frames: usize,
    pub updates: usize,
    pub resyncs: usize,
    pub segments_entered: usize,
}

impl Driver {
    /// `fps` must be positive.
    pub fn new(player: JourneyPlayer, fps: f64, report_every: f64) -> Self {
        Self {
            player,
            frame: 1.0 / fps,
            report_every: report_every.max(0.0),
            // About once per real second, but at least every frame
            sync_every: (fps.round() as usize).max(1),
        }
    }

    pub fn player(&self) -> &JourneyPlayer {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut JourneyPlayer {
        &mut self.player
    }

    /// Plays from wherever the clock is until the end of the journey.
    pub fn run(&mut self) -> Summary {
        let mut summary = Summary::default();

        // Announce each segment as playback enters it
        let names: Vec<String> = self
            .player
            .segments()
            .iter()
            .map(|s| format!("{} ({})", s.name, s.kind))
            .collect();
        let seen = Rc::new(RefCell::new((0, self.player.clock().current_segment())));
        let listener_seen = seen.clone();
        let id = self
            .player
            .clock_mut()
            .subscribe(Box::new(move |update: &ProgressUpdate| {
                let mut seen = listener_seen.borrow_mut();
                seen.0 += 1;
                if update.current_segment != seen.1 {
                    seen.1 = update.current_segment;
                    if let Some(name) = update.current_segment.and_then(|idx| names.get(idx)) {
                        info!("Now playing {name}");
                    }
                }
            }));

        self.player.clock_mut().play();
        let mut next_report = self.player.clock().elapsed_time();
        let mut segments_entered = 0;
        let mut last_segment = self.player.clock().current_segment();
        loop {
            if self.player.clock().elapsed_time() >= next_report {
                self.report();
                next_report += self.report_every.max(self.frame);
            }
            if !self.player.clock_mut().tick(self.frame) {
                break;
            }
            summary.frames += 1;

            if self.player.clock().current_segment() != last_segment {
                last_segment = self.player.clock().current_segment();
                segments_entered += 1;
            }
            if summary.frames % self.sync_every == 0 {
                if !self.player.clock().validate_sync().in_sync {
                    self.player.clock_mut().force_resync();
                    summary.resyncs += 1;
                }
            }
        }
        self.report();

        self.player.clock_mut().unsubscribe(id);
        summary.updates = seen.borrow().0;
        summary.segments_entered = segments_entered;
        summary
    }

    fn report(&self) {
        let clock = self.player.clock();
        let mut line = format_progress(clock.elapsed_time(), clock.total_duration());
        line.push_str(&format!(" ({:.1}%)", clock.spatial_progress() * 100.0));
        if let Some(label) = self.player.current_label() {
            line.push_str(&format!(", {label}"));
        }
        if let Some(pos) = self.player.marker_position() {
            line.push_str(&format!(" at {:.5}, {:.5}", pos.y(), pos.x()));
        }
        if let Some(elevation) = self.player.current_elevation() {
            line.push_str(&format!(", {elevation:.0}m"));
        }
        info!("{line}");
    }
}
