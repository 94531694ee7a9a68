use anyhow::Result;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};
use serde::Serialize;

use crate::{Journey, Segment, TimingTable};

impl TimingTable {
    /// One row per segment. `segments` must be what the table was built from.
    pub fn export_to_csv(&self, segments: &[Segment]) -> Result<String> {
        if segments.len() != self.entries.len() {
            bail!(
                "The timing table has {} entries, but there are {} segments",
                self.entries.len(),
                segments.len()
            );
        }

        let mut out = Vec::new();
        {
            let mut writer = csv::Writer::from_writer(&mut out);
            for (segment, entry) in segments.iter().zip(self.entries.iter()) {
                writer.serialize(ExportTimingRow {
                    segment: segment.name.clone(),
                    kind: segment.kind.to_string(),
                    first_coordinate: segment.coordinates.start,
                    num_coordinates: segment.num_coordinates(),
                    distance_km: segment.distance_km(),
                    duration: entry.duration,
                    start_time: entry.start_time,
                    end_time: entry.end_time,
                    progress_start: entry.progress_start,
                    progress_end: entry.progress_end,
                })?;
            }
            writer.flush()?;
        }
        let out = String::from_utf8(out)?;
        Ok(out)
    }
}

#[derive(Serialize)]
struct ExportTimingRow {
    segment: String,
    kind: String,
    first_coordinate: usize,
    num_coordinates: usize,
    distance_km: f64,
    duration: f64,
    start_time: f64,
    end_time: f64,
    progress_start: f64,
    progress_end: f64,
}

impl Journey {
    /// One LineString per segment, carrying its timing. Transportation legs are drawn from the
    /// end of one track to the start of the next.
    pub fn export_to_geojson(&self, table: &TimingTable) -> Result<String> {
        let (segments, route) = self.flatten();
        if segments.len() != table.entries.len() {
            bail!(
                "The timing table has {} entries, but the journey has {} segments",
                table.entries.len(),
                segments.len()
            );
        }

        let points = route.points();
        let mut features = Vec::new();
        for (idx, (segment, entry)) in segments.iter().zip(table.entries.iter()).enumerate() {
            let mut range = segment.coordinates.clone();
            if segment.is_transport() {
                range.start = range.start.saturating_sub(1);
                range.end = (range.end + 1).min(points.len());
            }
            let coords: Vec<Vec<f64>> = points[range]
                .iter()
                .map(|pt| vec![pt.longitude, pt.latitude])
                .collect();
            let geometry = match coords.len() {
                0 => None,
                1 => Some(Geometry::new(Value::Point(coords[0].clone()))),
                _ => Some(Geometry::new(Value::LineString(coords))),
            };

            let mut feature = Feature {
                bbox: None,
                geometry,
                id: None,
                properties: None,
                foreign_members: None,
            };
            feature.set_property("segment", idx);
            feature.set_property("name", segment.name.clone());
            feature.set_property("kind", segment.kind.to_string());
            feature.set_property("duration", entry.duration);
            feature.set_property("start_time", entry.start_time);
            feature.set_property("end_time", entry.end_time);
            feature.set_property("progress_start", entry.progress_start);
            feature.set_property("progress_end", entry.progress_end);
            features.push(feature);
        }

        let gj = GeoJson::FeatureCollection(FeatureCollection {
            features,
            bbox: None,
            foreign_members: None,
        });
        Ok(serde_json::to_string_pretty(&gj)?)
    }
}
