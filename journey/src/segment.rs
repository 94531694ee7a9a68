use std::fmt;
use std::ops::Range;

use geom::Distance;
use serde::{Deserialize, Serialize};

/// What somebody was doing along a recorded track. Only used to estimate a default duration and to
/// label the activity icon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Running,
    Cycling,
    Walking,
    Hiking,
    Skiing,
    Swimming,
    Other,
}

/// How a transportation leg between two tracks was traveled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    Car,
    Boat,
    Plane,
    Train,
    Walk,
    Cycling,
}

impl TravelMode {
    pub fn all() -> Vec<TravelMode> {
        vec![
            TravelMode::Car,
            TravelMode::Boat,
            TravelMode::Plane,
            TravelMode::Train,
            TravelMode::Walk,
            TravelMode::Cycling,
        ]
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            Activity::Running => "running",
            Activity::Cycling => "cycling",
            Activity::Walking => "walking",
            Activity::Hiking => "hiking",
            Activity::Skiing => "skiing",
            Activity::Swimming => "swimming",
            Activity::Other => "other",
        };
        write!(f, "{label}")
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            TravelMode::Car => "car",
            TravelMode::Boat => "boat",
            TravelMode::Plane => "plane",
            TravelMode::Train => "train",
            TravelMode::Walk => "walk",
            TravelMode::Cycling => "cycling",
        };
        write!(f, "{label}")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentKind {
    Track(Activity),
    Transport(TravelMode),
}

impl fmt::Display for SegmentKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SegmentKind::Track(activity) => write!(f, "{activity}"),
            SegmentKind::Transport(mode) => write!(f, "{mode} transport"),
        }
    }
}

/// One leg of a journey, as seen by the timing calculator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub name: String,
    pub kind: SegmentKind,
    /// Half-open range into the journey's flattened coordinates. Consecutive segments are
    /// contiguous. The range may be empty for a transport leg whose ends coincide.
    pub coordinates: Range<usize>,
    /// Seconds, if the user picked a duration. None means use the computed default.
    pub duration: Option<f64>,
    pub distance: Distance,
    pub elevation_gain: Distance,
}

impl Segment {
    pub fn num_coordinates(&self) -> usize {
        self.coordinates.len()
    }

    pub fn distance_km(&self) -> f64 {
        self.distance.inner_meters() / 1000.0
    }

    /// The inclusive index range, or None if the segment has no coordinates of its own.
    pub fn first_and_last_index(&self) -> Option<(usize, usize)> {
        if self.coordinates.is_empty() {
            None
        } else {
            Some((self.coordinates.start, self.coordinates.end - 1))
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self.kind, SegmentKind::Transport(_))
    }
}

/// True if the ranges start at 0, never go backwards, and leave no gaps.
pub fn ranges_are_contiguous(segments: &[Segment]) -> bool {
    let mut expected_start = 0;
    for segment in segments {
        let range = &segment.coordinates;
        if range.start != expected_start || range.end < range.start {
            return false;
        }
        expected_start = range.end;
    }
    true
}
