use anyhow::Result;

use crate::{Journey, LegID, Track, Transport, TravelMode};

impl Journey {
    /// Appends a track to the end of the journey. It isn't joined to the previous track by any
    /// transport.
    pub fn add_track(&mut self, track: Track) -> LegID {
        if !self.tracks.is_empty() {
            self.transports.push(None);
        }
        self.tracks.push(track);
        LegID::Track(self.tracks.len() - 1)
    }

    /// Joins `tracks[after_track]` to the next track.
    pub fn insert_transport(&mut self, after_track: usize, mode: TravelMode) -> Result<LegID> {
        if after_track + 1 >= self.tracks.len() {
            bail!(
                "A transport after track {} needs a track on both sides, but there are only {} tracks",
                after_track,
                self.tracks.len()
            );
        }
        if let Some(existing) = &self.transports[after_track] {
            bail!(
                "Track {} is already followed by a {} transport",
                after_track,
                existing.mode
            );
        }
        self.transports[after_track] = Some(Transport {
            mode,
            duration: None,
        });
        Ok(LegID::TransportAfter(after_track))
    }

    pub fn set_transport_mode(&mut self, after_track: usize, mode: TravelMode) -> Result<()> {
        match self.transports.get_mut(after_track) {
            Some(Some(transport)) => {
                transport.mode = mode;
                Ok(())
            }
            _ => bail!("No transport after track {}", after_track),
        }
    }

    pub fn remove_transport(&mut self, after_track: usize) -> Result<()> {
        match self.transports.get_mut(after_track) {
            Some(slot) if slot.is_some() => {
                *slot = None;
                Ok(())
            }
            _ => bail!("No transport after track {}", after_track),
        }
    }

    /// Removes a track along with any transport touching it. Its neighbors aren't joined
    /// afterwards.
    pub fn remove_track(&mut self, idx: usize) -> Result<Track> {
        if idx >= self.tracks.len() {
            bail!(
                "Can't remove track {}, there are only {}",
                idx,
                self.tracks.len()
            );
        }
        let track = self.tracks.remove(idx);
        self.detach_gaps(idx);
        Ok(track)
    }

    /// Both are leg-independent track indices. Transports touching the moved track, or joining
    /// the tracks it lands between, are dropped.
    pub fn move_track(&mut self, from: usize, to: usize) -> Result<()> {
        if from >= self.tracks.len() || to >= self.tracks.len() {
            bail!(
                "Can't move track {} to {}, there are only {}",
                from,
                to,
                self.tracks.len()
            );
        }
        if from == to {
            return Ok(());
        }
        let track = self.tracks.remove(from);
        self.detach_gaps(from);

        // Open a gap for the track at its new position
        if to == 0 {
            self.transports.insert(0, None);
        } else if to == self.tracks.len() {
            self.transports.push(None);
        } else {
            self.drop_transport(to - 1);
            self.transports.insert(to, None);
        }
        self.tracks.insert(to, track);
        Ok(())
    }

    /// Use None to go back to the estimated duration.
    pub fn set_duration(&mut self, leg: LegID, duration: Option<f64>) -> Result<()> {
        if let Some(seconds) = duration {
            if !seconds.is_finite() || seconds <= 0.0 {
                bail!("A duration must be a positive number of seconds, not {}", seconds);
            }
        }
        match leg {
            LegID::Track(idx) => match self.tracks.get_mut(idx) {
                Some(track) => track.duration = duration,
                None => bail!("No track {}", idx),
            },
            LegID::TransportAfter(idx) => match self.transports.get_mut(idx) {
                Some(Some(transport)) => transport.duration = duration,
                _ => bail!("No transport after track {}", idx),
            },
        }
        Ok(())
    }

    /// Like `set_duration`, but by position in `segments()`.
    pub fn set_segment_duration(&mut self, segment: usize, duration: Option<f64>) -> Result<()> {
        match self.legs().get(segment) {
            Some(leg) => self.set_duration(*leg, duration),
            None => bail!("No segment {}", segment),
        }
    }

    // Called after tracks[idx] was removed. Fixes up the gaps on either side of it.
    fn detach_gaps(&mut self, idx: usize) {
        // There was only the one track
        if self.tracks.is_empty() {
            self.transports.clear();
            return;
        }
        if idx == 0 {
            self.drop_transport(0);
            self.transports.remove(0);
        } else if idx == self.tracks.len() {
            self.drop_transport(idx - 1);
            self.transports.remove(idx - 1);
        } else {
            self.drop_transport(idx);
            self.transports.remove(idx);
            self.drop_transport(idx - 1);
        }
    }

    fn drop_transport(&mut self, gap: usize) {
        if let Some(transport) = self.transports[gap].take() {
            info!(
                "Dropping the {} transport after track {}, its tracks changed",
                transport.mode, gap
            );
        }
    }
}
