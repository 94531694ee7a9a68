use std::ops::Range;

use anyhow::Result;
use geom::LonLat;

use crate::{
    AnimationClock, Journey, LegID, Route, Segment, TimingConfig, TimingTable, Track, TravelMode,
};

/// A journey being edited and played back. Every edit recalculates the timing table and hands
/// it to the clock, so the marker never runs against stale durations.
pub struct JourneyPlayer {
    journey: Journey,
    config: TimingConfig,
    segments: Vec<Segment>,
    route: Route,
    clock: AnimationClock,
}

impl JourneyPlayer {
    pub fn new(journey: Journey, config: TimingConfig) -> JourneyPlayer {
        let (segments, route) = journey.flatten();
        let table = TimingTable::build(&segments, &config);
        JourneyPlayer {
            journey,
            config,
            segments,
            route,
            clock: AnimationClock::new(table),
        }
    }

    pub fn journey(&self) -> &Journey {
        &self.journey
    }

    pub fn config(&self) -> &TimingConfig {
        &self.config
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn clock(&self) -> &AnimationClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut AnimationClock {
        &mut self.clock
    }

    pub fn add_track(&mut self, track: Track) -> LegID {
        let id = self.journey.add_track(track);
        self.retime();
        id
    }

    pub fn remove_track(&mut self, idx: usize) -> Result<Track> {
        let track = self.journey.remove_track(idx)?;
        self.retime();
        Ok(track)
    }

    pub fn move_track(&mut self, from: usize, to: usize) -> Result<()> {
        self.journey.move_track(from, to)?;
        self.retime();
        Ok(())
    }

    pub fn insert_transport(&mut self, after_track: usize, mode: TravelMode) -> Result<LegID> {
        let id = self.journey.insert_transport(after_track, mode)?;
        self.retime();
        Ok(id)
    }

    pub fn set_transport_mode(&mut self, after_track: usize, mode: TravelMode) -> Result<()> {
        self.journey.set_transport_mode(after_track, mode)?;
        self.retime();
        Ok(())
    }

    pub fn remove_transport(&mut self, after_track: usize) -> Result<()> {
        self.journey.remove_transport(after_track)?;
        self.retime();
        Ok(())
    }

    pub fn set_duration(&mut self, leg: LegID, duration: Option<f64>) -> Result<()> {
        self.journey.set_duration(leg, duration)?;
        self.retime();
        Ok(())
    }

    pub fn set_segment_duration(&mut self, segment: usize, duration: Option<f64>) -> Result<()> {
        self.journey.set_segment_duration(segment, duration)?;
        self.retime();
        Ok(())
    }

    pub fn set_config(&mut self, config: TimingConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        self.retime();
        Ok(())
    }

    /// Where to draw the marker right now. It stays on the points of the segment owning the
    /// current progress.
    pub fn marker_position(&self) -> Option<LonLat> {
        let (range, frac) = self.locate_marker()?;
        self.route.position_in(range, frac)
    }

    pub fn current_elevation(&self) -> Option<f64> {
        let (range, frac) = self.locate_marker()?;
        self.route.elevation_in(range, frac)
    }

    pub fn current_label(&self) -> Option<String> {
        let segment = self.segments.get(self.clock.current_segment()?)?;
        Some(format!("{} ({})", segment.name, segment.kind))
    }

    // The coordinates of the segment owning the current progress, and how far through its
    // progress slice the clock is. A zero-width slice reports 0, holding the point before it.
    fn locate_marker(&self) -> Option<(Range<usize>, f64)> {
        let table = self.clock.table();
        let progress = self.clock.spatial_progress();
        let idx = table.entry_index_at_progress(progress)?;
        let entry = &table.entries[idx];
        let segment = self.segments.get(idx)?;

        let width = entry.progress_width();
        let frac = if width > 0.0 {
            ((progress - entry.progress_start) / width).max(0.0).min(1.0)
        } else {
            0.0
        };
        Some((segment.coordinates.clone(), frac))
    }

    fn retime(&mut self) {
        let (segments, route) = self.journey.flatten();
        let table = TimingTable::build(&segments, &self.config);
        self.segments = segments;
        self.route = route;
        self.clock.rebuild_timing_table(table);
    }
}
