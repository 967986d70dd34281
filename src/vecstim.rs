//! This module provides the playback primitive replaying a fixed sequence of spike times, and the boundary with the
//! simulation engine creating such primitives.

use log::debug;

use super::error::SNNError;

/// The boundary with a simulation engine able to replay spike trains.
pub trait PlaybackEngine {
    /// The engine-side object replaying a train.
    type Handle;

    /// Create a playback object replaying the provided train.
    /// The train is sorted in ascending order and contains finite non-negative times only.
    fn vecstim(&mut self, train: &[f64]) -> Result<Self::Handle, SNNError>;
}

/// Replays a fixed sequence of times as spike events.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct VecStim {
    /// The (sorted) times of the events to replay.
    times: Vec<f64>,
}

impl VecStim {
    /// Create a new playback object without events.
    pub fn new() -> Self {
        VecStim { times: vec![] }
    }

    /// Load the train to replay, replacing the previous one.
    /// The function returns an error if the train is not sorted or contains negative or non-finite times.
    pub fn play(&mut self, times: &[f64]) -> Result<(), SNNError> {
        if let Some(t) = times.iter().find(|t| !t.is_finite() || **t < 0.0) {
            return Err(SNNError::InvalidTrain(format!(
                "event times must be finite and non-negative, got {}",
                t
            )));
        }
        if let Some(ts) = times.windows(2).find(|ts| ts[0] > ts[1]) {
            return Err(SNNError::InvalidTrain(format!(
                "event times must be sorted, got {} before {}",
                ts[0], ts[1]
            )));
        }

        self.times = times.to_vec();
        Ok(())
    }

    /// Returns a slice of the event times.
    pub fn times(&self) -> &[f64] {
        &self.times[..]
    }

    /// Returns the number of events.
    pub fn num_events(&self) -> usize {
        self.times.len()
    }

    /// Returns the time of the first event strictly after `t`, if any.
    pub fn next_event(&self, t: f64) -> Option<f64> {
        let pos = self.times.partition_point(|s| *s <= t);
        self.times.get(pos).copied()
    }

    /// Returns the times of the events in the interval [start, end).
    pub fn events_in(&self, start: f64, end: f64) -> &[f64] {
        let lo = self.times.partition_point(|s| *s < start);
        let hi = self.times.partition_point(|s| *s < end).max(lo);
        &self.times[lo..hi]
    }

    /// Returns an iterator over the event times, in order.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.times.iter().copied()
    }
}

/// A playback engine creating native `VecStim` objects.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct VecStimEngine {
    num_created: usize,
}

impl VecStimEngine {
    /// Create a new engine.
    pub fn new() -> Self {
        VecStimEngine { num_created: 0 }
    }

    /// Returns the number of playback objects created so far.
    pub fn num_created(&self) -> usize {
        self.num_created
    }
}

impl PlaybackEngine for VecStimEngine {
    type Handle = VecStim;

    fn vecstim(&mut self, train: &[f64]) -> Result<VecStim, SNNError> {
        let mut vecstim = VecStim::new();
        vecstim.play(train)?;
        self.num_created += 1;
        debug!("VecStim #{} created with {} events", self.num_created, train.len());
        Ok(vecstim)
    }
}
