use std::collections::BTreeMap;

use anyhow::Result;
use geom::{Distance, Speed};
use serde::{Deserialize, Serialize};

use crate::{Activity, Segment, SegmentKind, TravelMode};

/// Controls how long each segment plays for when the user hasn't picked a duration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// No segment plays for less than this, even with zero distance.
    pub minimum_seconds: f64,
    /// Playback rate for tracks under `TrackEstimate::Distance`
    pub seconds_per_km: f64,
    /// Playback rate for transportation legs. Modes missing here use `seconds_per_km`.
    pub transport_seconds_per_km: BTreeMap<TravelMode, f64>,
    pub track_estimate: TrackEstimate,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TrackEstimate {
    /// Only distance matters. Always available.
    Distance,
    /// Estimate how long the activity really took from a base speed and the elevation gained,
    /// then play back `seconds_per_hour` for every hour of that.
    ActivityPace { seconds_per_hour: f64 },
}

impl Default for TimingConfig {
    fn default() -> Self {
        let mut transport_seconds_per_km = BTreeMap::new();
        // Faster modes cover more ground per second of playback, so long flights don't dominate
        for (mode, rate) in [
            (TravelMode::Walk, 3.0),
            (TravelMode::Cycling, 2.5),
            (TravelMode::Boat, 2.0),
            (TravelMode::Car, 1.5),
            (TravelMode::Train, 1.0),
            (TravelMode::Plane, 0.25),
        ] {
            transport_seconds_per_km.insert(mode, rate);
        }

        Self {
            minimum_seconds: 10.0,
            seconds_per_km: 3.0,
            transport_seconds_per_km,
            track_estimate: TrackEstimate::Distance,
        }
    }
}

impl TimingConfig {
    pub fn load(path: &str) -> Result<Self> {
        let config: TimingConfig = serde_json::from_slice(&fs_err::read(path)?)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.minimum_seconds.is_finite() || self.minimum_seconds <= 0.0 {
            bail!("minimum_seconds must be positive, not {}", self.minimum_seconds);
        }
        if !self.seconds_per_km.is_finite() || self.seconds_per_km < 0.0 {
            bail!("seconds_per_km can't be {}", self.seconds_per_km);
        }
        for (mode, rate) in &self.transport_seconds_per_km {
            if !rate.is_finite() || *rate < 0.0 {
                bail!("Playback rate for {mode} can't be {rate}");
            }
        }
        if let TrackEstimate::ActivityPace { seconds_per_hour } = self.track_estimate {
            if !seconds_per_hour.is_finite() || seconds_per_hour <= 0.0 {
                bail!("seconds_per_hour must be positive, not {seconds_per_hour}");
            }
        }
        Ok(())
    }

    /// The seconds this segment plays for. An explicit user duration always wins.
    pub fn resolve_duration(&self, segment: &Segment) -> f64 {
        if let Some(seconds) = segment.duration {
            if seconds.is_finite() && seconds > 0.0 {
                return seconds;
            }
            warn!(
                "Ignoring invalid duration {} on {}, using the default",
                seconds, segment.name
            );
        }
        self.default_duration(segment)
    }

    pub fn default_duration(&self, segment: &Segment) -> f64 {
        let km = segment.distance_km();
        let seconds = match segment.kind {
            SegmentKind::Track(activity) => match self.track_estimate {
                TrackEstimate::Distance => km * self.seconds_per_km,
                TrackEstimate::ActivityPace { seconds_per_hour } => {
                    let hours =
                        activity_hours(activity, segment.distance, segment.elevation_gain);
                    hours * seconds_per_hour
                }
            },
            SegmentKind::Transport(mode) => {
                km * self
                    .transport_seconds_per_km
                    .get(&mode)
                    .cloned()
                    .unwrap_or(self.seconds_per_km)
            }
        };
        self.minimum_seconds.max(seconds.round())
    }
}

/// How long the activity probably took in reality, in hours.
fn activity_hours(activity: Activity, distance: Distance, elevation_gain: Distance) -> f64 {
    let (base_speed, climb_meters_per_hour) = match activity {
        Activity::Running => (Speed::km_per_hour(10.0), 800.0),
        Activity::Cycling => (Speed::km_per_hour(20.0), 1000.0),
        Activity::Walking => (Speed::km_per_hour(5.0), 600.0),
        // Naismith's rule
        Activity::Hiking => (Speed::km_per_hour(4.0), 600.0),
        Activity::Skiing => (Speed::km_per_hour(15.0), 1500.0),
        Activity::Swimming => (Speed::km_per_hour(2.5), f64::INFINITY),
        Activity::Other => (Speed::km_per_hour(8.0), 700.0),
    };
    let moving = (distance / base_speed).inner_seconds() / 3600.0;
    let climbing = elevation_gain.inner_meters().max(0.0) / climb_meters_per_hour;
    moving + climbing
}
