use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{Activity, Journey, LegID, RoutePoint, Track, TravelMode};

/// Describes a journey on disk. Tracks point to CSV files, relative to the journey file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JourneyFile {
    pub legs: Vec<LegSpec>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LegSpec {
    Track {
        /// Defaults to the CSV's filename
        #[serde(default)]
        name: Option<String>,
        activity: Activity,
        path: String,
        #[serde(default)]
        duration: Option<f64>,
    },
    Transport {
        mode: TravelMode,
        #[serde(default)]
        duration: Option<f64>,
    },
}

#[derive(Deserialize)]
struct Record {
    longitude: f64,
    latitude: f64,
    #[serde(default)]
    elevation: Option<f64>,
}

/// Reads `longitude,latitude[,elevation]` rows.
pub fn load_track_csv<R: std::io::Read>(reader: R) -> Result<Vec<RoutePoint>> {
    let mut points = Vec::new();
    for rec in csv::Reader::from_reader(reader).deserialize() {
        let rec: Record = rec?;
        if !rec.longitude.is_finite() || !rec.latitude.is_finite() {
            bail!(
                "Bad coordinate on row {}: {}, {}",
                points.len() + 1,
                rec.longitude,
                rec.latitude
            );
        }
        points.push(RoutePoint::new(
            rec.longitude,
            rec.latitude,
            rec.elevation.filter(|e| e.is_finite()),
        ));
    }
    Ok(points)
}

impl Journey {
    pub fn load_file(path: &str) -> Result<Journey> {
        let file: JourneyFile = serde_json::from_slice(&fs_err::read(path)?)?;
        let base = Path::new(path).parent().unwrap_or_else(|| Path::new(""));
        Journey::from_file(file, base)
    }

    /// Track paths are resolved against `base`.
    pub fn from_file(file: JourneyFile, base: &Path) -> Result<Journey> {
        let mut journey = Journey::new();
        // A transport waits here until the track after it shows up
        let mut pending: Option<(TravelMode, Option<f64>)> = None;

        for (idx, leg) in file.legs.into_iter().enumerate() {
            match leg {
                LegSpec::Track {
                    name,
                    activity,
                    path,
                    duration,
                } => {
                    let full_path = base.join(&path);
                    let points = load_track_csv(fs_err::File::open(&full_path)?)
                        .with_context(|| format!("loading track {}", full_path.display()))?;
                    if points.is_empty() {
                        bail!("Track {} has no points", full_path.display());
                    }
                    let name = name.unwrap_or_else(|| {
                        Path::new(&path)
                            .file_stem()
                            .map(|s| s.to_string_lossy().to_string())
                            .unwrap_or_else(|| path.clone())
                    });
                    journey.add_track(Track::new(name, activity, points));
                    let track_idx = journey.tracks().len() - 1;
                    journey.set_duration(LegID::Track(track_idx), duration)?;

                    if let Some((mode, duration)) = pending.take() {
                        let id = journey.insert_transport(track_idx - 1, mode)?;
                        journey.set_duration(id, duration)?;
                    }
                }
                LegSpec::Transport { mode, duration } => {
                    if journey.tracks().is_empty() {
                        bail!("Leg {} is a transport, but it doesn't follow a track", idx);
                    }
                    if pending.is_some() {
                        bail!("Leg {} is a second transport in a row", idx);
                    }
                    pending = Some((mode, duration));
                }
            }
        }

        if pending.is_some() {
            bail!("The last leg is a transport, but no track follows it");
        }
        info!(
            "Loaded a journey with {} tracks and {} legs",
            journey.tracks().len(),
            journey.legs().len()
        );
        Ok(journey)
    }

    pub fn to_file(&self, track_paths: &[String]) -> Result<JourneyFile> {
        if track_paths.len() != self.tracks().len() {
            bail!(
                "Need {} track paths, but got {}",
                self.tracks().len(),
                track_paths.len()
            );
        }
        let mut legs = Vec::new();
        for (idx, track) in self.tracks().iter().enumerate() {
            legs.push(LegSpec::Track {
                name: Some(track.name.clone()),
                activity: track.activity,
                path: track_paths[idx].clone(),
                duration: track.duration,
            });
            if let Some(transport) = self.transport_after(idx) {
                legs.push(LegSpec::Transport {
                    mode: transport.mode,
                    duration: transport.duration,
                });
            }
        }
        Ok(JourneyFile { legs })
    }
}
