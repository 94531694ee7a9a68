use abstutil::Timer;
use serde::{Deserialize, Serialize};

use journey::{AnimationClock, ClockState};

/// Where playback was when the last run ended
#[derive(Serialize, Deserialize)]
pub struct Savestate {
    /// Only restored for the same journey file
    pub journey: String,
    pub clock: ClockState,
    pub speed_multiplier: f64,
}

impl Savestate {
    pub fn capture(journey: &str, clock: &AnimationClock) -> Self {
        Self {
            journey: journey.to_string(),
            clock: clock.state().clone(),
            speed_multiplier: clock.speed_multiplier(),
        }
    }

    /// Returns false if there's nothing usable at `path`
    pub fn restore(path: &str, journey: &str, clock: &mut AnimationClock) -> bool {
        let savestate =
            match abstio::maybe_read_json::<Savestate>(path.to_string(), &mut Timer::throwaway()) {
                Ok(ss) => ss,
                Err(err) => {
                    info!("Not restoring from {path}: {err}");
                    return false;
                }
            };
        if savestate.journey != journey {
            warn!(
                "{path} is for {}, not {journey}; starting from the beginning",
                savestate.journey
            );
            return false;
        }

        clock.set_speed_multiplier(savestate.speed_multiplier);
        clock.restore(savestate.clock);
        // The journey or config may have changed since the save
        let report = clock.validate_sync();
        if !report.in_sync {
            clock.force_resync();
        }
        info!(
            "Restored playback from {path} at {}s",
            clock.elapsed_time()
        );
        true
    }

    pub fn save(&self, path: &str) {
        abstio::write_json(path.to_string(), self);
    }
}

#[cfg(test)]
mod tests {
    use journey::{PlaybackStatus, TimingEntry, TimingTable};

    use super::*;

    // Progress [0, 0.5] over 20 seconds, then [0.5, 1] over 20 more
    fn clock() -> AnimationClock {
        let entry = |start_time: f64, progress_start: f64| TimingEntry {
            duration: 20.0,
            start_time,
            end_time: start_time + 20.0,
            progress_start,
            progress_end: progress_start + 0.5,
        };
        AnimationClock::new(TimingTable {
            entries: vec![entry(0.0, 0.0), entry(20.0, 0.5)],
            total_duration: 40.0,
        })
    }

    fn temp_path(name: &str) -> String {
        std::env::temp_dir()
            .join(format!("replay_savestate_{}_{name}.json", std::process::id()))
            .to_string_lossy()
            .to_string()
    }

    fn write(path: &str, journey: &str, elapsed_time: f64, spatial_progress: f64) {
        abstio::write_json(
            path.to_string(),
            &Savestate {
                journey: journey.to_string(),
                clock: ClockState {
                    elapsed_time,
                    status: PlaybackStatus::Paused,
                    spatial_progress,
                    current_segment: Some(0),
                },
                speed_multiplier: 4.0,
            },
        );
    }

    #[test]
    fn other_journeys_are_ignored() {
        let path = temp_path("other");
        write(&path, "beach.json", 10.0, 0.25);

        let mut clock = clock();
        assert!(!Savestate::restore(&path, "mountains.json", &mut clock));
        assert_eq!(clock.elapsed_time(), 0.0);
        assert_eq!(clock.status(), PlaybackStatus::Stopped);
        assert_eq!(clock.speed_multiplier(), 1.0);

        fs_err::remove_file(&path).unwrap();
        assert!(!Savestate::restore(&path, "beach.json", &mut clock));
    }

    #[test]
    fn stale_time_is_resynced_to_the_saved_position() {
        let path = temp_path("stale");
        // 0.25 of the way is 10 seconds in, not 30
        write(&path, "beach.json", 30.0, 0.25);

        let mut clock = clock();
        assert!(Savestate::restore(&path, "beach.json", &mut clock));
        assert_eq!(clock.spatial_progress(), 0.25);
        assert_eq!(clock.elapsed_time(), clock.table().progress_to_time(0.25));
        assert_eq!(clock.elapsed_time(), 10.0);
        assert_eq!(clock.current_segment(), Some(0));
        assert_eq!(clock.status(), PlaybackStatus::Paused);
        assert_eq!(clock.speed_multiplier(), 4.0);
        assert!(clock.validate_sync().in_sync);

        fs_err::remove_file(&path).unwrap();
    }

    #[test]
    fn capture_then_restore() {
        let path = temp_path("roundtrip");
        let mut before = clock();
        before.set_speed_multiplier(2.0);
        before.seek_to_progress(0.75);
        Savestate::capture("beach.json", &before).save(&path);

        let mut after = clock();
        assert!(Savestate::restore(&path, "beach.json", &mut after));
        assert_eq!(after.state(), before.state());
        assert_eq!(after.speed_multiplier(), 2.0);

        fs_err::remove_file(&path).unwrap();
    }
}
