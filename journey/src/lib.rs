#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod clock;
mod edit;
mod estimate;
mod export;
mod format;
mod load;
mod mapper;
mod player;
mod route;
mod segment;
pub mod sync;
mod timing;

use geom::Distance;
use serde::{Deserialize, Serialize};

pub use self::clock::{
    AnimationClock, ClockState, Listener, ListenerID, PlaybackStatus, ProgressUpdate,
    SpeedSetting,
};
pub use self::estimate::{TimingConfig, TrackEstimate};
pub use self::format::{format_clock, format_progress};
pub use self::load::{load_track_csv, JourneyFile, LegSpec};
pub use self::player::JourneyPlayer;
pub use self::route::{elevation_gain, path_length, Route, RoutePoint};
pub use self::segment::{ranges_are_contiguous, Activity, Segment, SegmentKind, TravelMode};
pub use self::sync::SyncReport;
pub use self::timing::{TimingEntry, TimingTable};

/// Roughly how far apart interpolated points on a transportation leg are
const KM_PER_TRANSPORT_POINT: f64 = 1.0;
const MAX_TRANSPORT_POINTS: usize = 200;

/// A recorded GPS track
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub name: String,
    pub activity: Activity,
    pub points: Vec<RoutePoint>,
    /// Seconds, if the user picked a playback duration
    pub duration: Option<f64>,
}

impl Track {
    pub fn new(name: String, activity: Activity, points: Vec<RoutePoint>) -> Self {
        Self {
            name,
            activity,
            points,
            duration: None,
        }
    }
}

/// Joins the end of one track to the start of the next
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transport {
    pub mode: TravelMode,
    pub duration: Option<f64>,
}

/// Identifies one leg of a journey. Transports are named by the track they follow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LegID {
    Track(usize),
    TransportAfter(usize),
}

/// Tracks in playback order, optionally joined by transportation legs. A transport can only
/// exist between two adjacent tracks, so `transports[i]` joins `tracks[i]` and `tracks[i + 1]`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Journey {
    tracks: Vec<Track>,
    transports: Vec<Option<Transport>>,
}

impl Journey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn transport_after(&self, track: usize) -> Option<&Transport> {
        self.transports.get(track).and_then(|t| t.as_ref())
    }

    /// Every leg in playback order. Indices match `segments()`.
    pub fn legs(&self) -> Vec<LegID> {
        let mut legs = Vec::new();
        for idx in 0..self.tracks.len() {
            legs.push(LegID::Track(idx));
            if self.transport_after(idx).is_some() {
                legs.push(LegID::TransportAfter(idx));
            }
        }
        legs
    }

    pub fn segments(&self) -> Vec<Segment> {
        self.flatten().0
    }

    pub fn route(&self) -> Route {
        self.flatten().1
    }

    /// Produces the segments for the timing calculator and the flattened coordinates they index
    /// into.
    pub fn flatten(&self) -> (Vec<Segment>, Route) {
        let mut segments = Vec::new();
        let mut points = Vec::new();
        for leg in self.legs() {
            let start = points.len();
            let segment = match leg {
                LegID::Track(idx) => {
                    let track = &self.tracks[idx];
                    points.extend(track.points.iter().cloned());
                    Segment {
                        name: track.name.clone(),
                        kind: SegmentKind::Track(track.activity),
                        coordinates: start..points.len(),
                        duration: track.duration,
                        distance: path_length(&track.points),
                        elevation_gain: elevation_gain(&track.points),
                    }
                }
                LegID::TransportAfter(idx) => {
                    // legs() only yields transports that exist
                    let transport = match self.transport_after(idx) {
                        Some(t) => t,
                        None => continue,
                    };
                    let (distance, between) = self.transport_geometry(idx);
                    points.extend(between);
                    Segment {
                        name: format!(
                            "{} from {} to {}",
                            transport.mode,
                            self.tracks[idx].name,
                            self.tracks[idx + 1].name
                        ),
                        kind: SegmentKind::Transport(transport.mode),
                        coordinates: start..points.len(),
                        duration: transport.duration,
                        distance,
                        elevation_gain: Distance::ZERO,
                    }
                }
            };
            segments.push(segment);
        }
        (segments, Route::new(points))
    }

    /// The great-circle distance between the tracks a transport joins, and the points to draw
    /// between them. The tracks' own endpoints aren't included, so a transport between two
    /// touching tracks has no points at all.
    fn transport_geometry(&self, after_track: usize) -> (Distance, Vec<RoutePoint>) {
        let from = self.tracks[after_track].points.last();
        let to = self
            .tracks
            .get(after_track + 1)
            .and_then(|t| t.points.first());
        let (from, to) = match (from, to) {
            (Some(from), Some(to)) => (from, to),
            _ => return (Distance::ZERO, Vec::new()),
        };

        let distance = from.pos().gps_dist(to.pos());
        if distance == Distance::ZERO {
            return (distance, Vec::new());
        }
        let km = distance.inner_meters() / 1000.0;
        let n = ((km / KM_PER_TRANSPORT_POINT).ceil() as usize).clamp(1, MAX_TRANSPORT_POINTS);

        let mut between = Vec::with_capacity(n);
        for i in 1..=n {
            let frac = i as f64 / (n + 1) as f64;
            between.push(RoutePoint::new(
                from.longitude + (to.longitude - from.longitude) * frac,
                from.latitude + (to.latitude - from.latitude) * frac,
                None,
            ));
        }
        (distance, between)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(name: &str, start: (f64, f64), n: usize) -> Track {
        let points = (0..n)
            .map(|i| RoutePoint::new(start.0 + 0.001 * i as f64, start.1, Some(i as f64)))
            .collect();
        Track::new(name.to_string(), Activity::Running, points)
    }

    #[test]
    fn flatten_tracks_and_transport() {
        let mut journey = Journey::new();
        journey.add_track(track("a", (0.0, 0.0), 10));
        journey.add_track(track("b", (0.0, 0.1), 20));
        journey.add_track(track("c", (0.0, 0.1), 5));
        journey.insert_transport(0, TravelMode::Train).unwrap();

        assert_eq!(
            journey.legs(),
            vec![
                LegID::Track(0),
                LegID::TransportAfter(0),
                LegID::Track(1),
                LegID::Track(2)
            ]
        );
        let (segments, route) = journey.flatten();
        assert!(ranges_are_contiguous(&segments));
        assert_eq!(segments[0].coordinates, 0..10);
        // About 11km between the tracks
        let transport = &segments[1];
        assert_eq!(transport.kind, SegmentKind::Transport(TravelMode::Train));
        assert_eq!(transport.num_coordinates(), 12);
        assert!(transport.distance_km() > 10.0 && transport.distance_km() < 12.0);
        assert_eq!(transport.name, "train from a to b");
        assert_eq!(segments[2].coordinates, 22..42);
        assert_eq!(segments[3].coordinates, 42..47);
        assert_eq!(route.len(), 47);
        assert_eq!(segments[0].elevation_gain, Distance::meters(9.0));
    }

    #[test]
    fn touching_tracks_give_a_zero_length_transport() {
        let mut journey = Journey::new();
        journey.add_track(track("a", (0.0, 0.0), 10));
        // Starts exactly where "a" ends
        let end = journey.tracks()[0].points[9];
        journey.add_track(track("b", (end.longitude, end.latitude), 10));
        journey.insert_transport(0, TravelMode::Car).unwrap();

        let segments = journey.segments();
        assert_eq!(segments[1].coordinates, 10..10);
        assert_eq!(segments[1].distance, Distance::ZERO);

        let table = TimingTable::build(&segments, &TimingConfig::default());
        assert_eq!(table.entries[1].duration, 10.0);
        assert_eq!(table.entries[1].progress_width(), 0.0);
    }
}
