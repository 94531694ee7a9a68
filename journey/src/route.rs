use std::ops::Range;

use geom::{Distance, LonLat};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub longitude: f64,
    pub latitude: f64,
    /// Meters
    pub elevation: Option<f64>,
}

impl RoutePoint {
    pub fn new(longitude: f64, latitude: f64, elevation: Option<f64>) -> Self {
        Self {
            longitude,
            latitude,
            elevation,
        }
    }

    pub fn pos(&self) -> LonLat {
        LonLat::new(self.longitude, self.latitude)
    }
}

/// Every coordinate of the journey, flattened in playback order. Spatial progress is measured
/// along this.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    points: Vec<RoutePoint>,
}

impl Route {
    pub fn new(points: Vec<RoutePoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[RoutePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Where the marker goes, with progress spread evenly over every coordinate.
    pub fn position_at(&self, progress: f64) -> Option<LonLat> {
        self.position_in(0..self.points.len(), progress)
    }

    /// `frac` of the way through the points in `range`, never leaving them. An empty range holds
    /// the point just before it.
    pub fn position_in(&self, range: Range<usize>, frac: f64) -> Option<LonLat> {
        let (idx1, idx2, frac) = self.locate(range, frac)?;
        let pt1 = &self.points[idx1];
        let pt2 = &self.points[idx2];
        Some(LonLat::new(
            lerp(pt1.longitude, pt2.longitude, frac),
            lerp(pt1.latitude, pt2.latitude, frac),
        ))
    }

    /// For the elevation profile cursor. None if the points there have no elevation.
    pub fn elevation_at(&self, progress: f64) -> Option<f64> {
        self.elevation_in(0..self.points.len(), progress)
    }

    pub fn elevation_in(&self, range: Range<usize>, frac: f64) -> Option<f64> {
        let (idx1, idx2, frac) = self.locate(range, frac)?;
        let e1 = self.points[idx1].elevation?;
        match self.points[idx2].elevation {
            Some(e2) => Some(lerp(e1, e2, frac)),
            None => Some(e1),
        }
    }

    pub fn length(&self) -> Distance {
        self.slice_length(0..self.points.len())
    }

    /// Length of the path through these points
    pub fn slice_length(&self, range: Range<usize>) -> Distance {
        path_length(self.slice(range))
    }

    pub fn slice_elevation_gain(&self, range: Range<usize>) -> Distance {
        elevation_gain(self.slice(range))
    }

    fn slice(&self, range: Range<usize>) -> &[RoutePoint] {
        let end = range.end.min(self.points.len());
        let start = range.start.min(end);
        &self.points[start..end]
    }

    // (point at or before, the next point inside the range, fraction of the way between them)
    fn locate(&self, range: Range<usize>, frac: f64) -> Option<(usize, usize, f64)> {
        let end = range.end.min(self.points.len());
        let start = range.start.min(end);
        if start == end {
            if start > 0 {
                return Some((start - 1, start - 1, 0.0));
            }
            if start < self.points.len() {
                return Some((start, start, 0.0));
            }
            return None;
        }

        let frac = if frac.is_nan() {
            0.0
        } else {
            frac.max(0.0).min(1.0)
        };
        let last = end - start - 1;
        let exact = frac * last as f64;
        let offset = (exact.floor() as usize).min(last);
        let idx1 = start + offset;
        Some((idx1, (idx1 + 1).min(end - 1), exact - offset as f64))
    }
}

pub fn path_length(points: &[RoutePoint]) -> Distance {
    let mut total = Distance::ZERO;
    for pair in points.windows(2) {
        total += pair[0].pos().gps_dist(pair[1].pos());
    }
    total
}

/// Sum of every climb, ignoring descents and missing elevations
pub fn elevation_gain(points: &[RoutePoint]) -> Distance {
    let mut gain = 0.0;
    let mut last = None;
    for pt in points {
        if let Some(elevation) = pt.elevation {
            if let Some(prev) = last {
                if elevation > prev {
                    gain += elevation - prev;
                }
            }
            last = Some(elevation);
        }
    }
    Distance::meters(gain)
}

fn lerp(a: f64, b: f64, frac: f64) -> f64 {
    a + (b - a) * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lon: f64, lat: f64, elevation: Option<f64>) -> RoutePoint {
        RoutePoint::new(lon, lat, elevation)
    }

    #[test]
    fn marker_position() {
        let route = Route::new(vec![
            pt(0.0, 0.0, Some(100.0)),
            pt(1.0, 0.0, Some(200.0)),
            pt(1.0, 2.0, None),
        ]);
        let pos = route.position_at(0.25).unwrap();
        assert!((pos.x() - 0.5).abs() < 1e-9);
        assert!((pos.y() - 0.0).abs() < 1e-9);

        let pos = route.position_at(0.75).unwrap();
        assert!((pos.x() - 1.0).abs() < 1e-9);
        assert!((pos.y() - 1.0).abs() < 1e-9);

        let end = route.position_at(1.0).unwrap();
        assert!((end.y() - 2.0).abs() < 1e-9);
        let start = route.position_at(-1.0).unwrap();
        assert!(start.x().abs() < 1e-9);

        assert_eq!(route.elevation_at(0.25), Some(150.0));
        // No elevation at the far end, so hold the known value
        assert_eq!(route.elevation_at(0.5), Some(200.0));
        assert_eq!(route.elevation_at(1.0), None);

        assert!(Route::default().position_at(0.5).is_none());
    }

    #[test]
    fn position_within_a_range() {
        let route = Route::new(vec![
            pt(0.0, 0.0, Some(10.0)),
            pt(1.0, 0.0, Some(20.0)),
            pt(5.0, 0.0, Some(30.0)),
            pt(6.0, 0.0, None),
        ]);
        // Only the first two points, so the end of the range stays on them
        let end = route.position_in(0..2, 1.0).unwrap();
        assert!((end.x() - 1.0).abs() < 1e-9);
        let middle = route.position_in(0..2, 0.5).unwrap();
        assert!((middle.x() - 0.5).abs() < 1e-9);
        assert_eq!(route.elevation_in(0..2, 0.5), Some(15.0));

        let second = route.position_in(2..4, 0.5).unwrap();
        assert!((second.x() - 5.5).abs() < 1e-9);
        let single = route.position_in(3..4, 0.7).unwrap();
        assert!((single.x() - 6.0).abs() < 1e-9);

        // An empty range holds the point before it
        let held = route.position_in(2..2, 0.5).unwrap();
        assert!((held.x() - 1.0).abs() < 1e-9);
        assert_eq!(route.elevation_in(2..2, 0.9), Some(20.0));
        let first = route.position_in(0..0, 0.5).unwrap();
        assert!(first.x().abs() < 1e-9);
        assert!(Route::default().position_in(0..0, 0.5).is_none());
    }

    #[test]
    fn gain() {
        let points = vec![
            pt(0.0, 0.0, Some(100.0)),
            pt(0.0, 0.0, Some(150.0)),
            pt(0.0, 0.0, None),
            pt(0.0, 0.0, Some(120.0)),
            pt(0.0, 0.0, Some(130.0)),
        ];
        assert_eq!(elevation_gain(&points), Distance::meters(60.0));
        assert_eq!(elevation_gain(&[]), Distance::ZERO);
    }

    #[test]
    fn lengths() {
        // One degree of latitude is about 111km
        let route = Route::new(vec![pt(0.0, 0.0, None), pt(0.0, 1.0, None)]);
        let km = route.length().inner_meters() / 1000.0;
        assert!(km > 110.0 && km < 112.5, "{km}");
        assert_eq!(route.slice_length(1..1), Distance::ZERO);
        assert_eq!(route.slice_length(5..9), Distance::ZERO);
    }
}
