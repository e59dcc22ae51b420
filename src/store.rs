//! The storage contract for tracked entities.
//!
//! No store ships with the crate. Implementers hold their own tracks and use
//! [`TrackQuery::matches`] for the filtering rules every store shares.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use geo::{Intersects, Polygon};
use uuid::Uuid;

use crate::{
    track::{DurableIdentifier, DurableTrackable, Plot, TimeWindow, Trackable, TransientTrackable},
    Error,
};

/// Filters for track lookups. Unset filters match everything.
///
/// `aoi` is a polygon in the geographic frame, compared against the polygon
/// of each entity's last known position.
#[derive(Clone, Debug, Default)]
pub struct TrackQuery {
    pub identifiers: Option<HashSet<DurableIdentifier>>,
    pub aoi: Option<Polygon<f64>>,
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
}

impl TrackQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identifiers(mut self, identifiers: impl IntoIterator<Item = DurableIdentifier>) -> Self {
        self.identifiers = Some(identifiers.into_iter().collect());
        self
    }

    pub fn within(mut self, aoi: Polygon<f64>) -> Self {
        self.aoi = Some(aoi);
        self
    }

    pub fn after(mut self, after: DateTime<Utc>) -> Self {
        self.after = Some(after);
        self
    }

    pub fn before(mut self, before: DateTime<Utc>) -> Self {
        self.before = Some(before);
        self
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.after, self.before)
    }

    /// Applies the time window and the AOI to `track`. Identifiers are not
    /// considered here, see [`TrackQuery::matches_durable`].
    ///
    /// # Errors
    ///
    /// Propagates a failure to build the track's position polygon.
    pub fn matches<T: Trackable + ?Sized>(&self, track: &T) -> Result<bool, Error> {
        if !self.window().overlaps(track.first_observed(), track.last_observed()) {
            return Ok(false);
        }

        match &self.aoi {
            Some(aoi) => Ok(track.last_known_position().polygon()?.intersects(aoi)),
            None => Ok(true),
        }
    }

    /// Like [`TrackQuery::matches`], additionally requiring that the track
    /// shares at least one identifier with the query, if identifiers are set.
    ///
    /// # Errors
    ///
    /// Propagates a failure to build the track's position polygon.
    pub fn matches_durable<T: DurableTrackable + ?Sized>(&self, track: &T) -> Result<bool, Error> {
        if let Some(identifiers) = &self.identifiers {
            if track.identifiers().is_disjoint(identifiers) {
                return Ok(false);
            }
        }

        self.matches(track)
    }
}

/// Either kind of entity a [`TrackStore`] holds.
#[derive(Clone, Debug)]
pub enum Track<D, T> {
    Durable(D),
    Transient(T),
}

impl<D: DurableTrackable, T: TransientTrackable> Track<D, T> {
    pub fn guid(&self) -> Uuid {
        match self {
            Track::Durable(track) => track.guid(),
            Track::Transient(track) => track.guid(),
        }
    }
}

/// Persistence for tracked entities.
pub trait TrackStore {
    type Durable: DurableTrackable;
    type Transient: TransientTrackable;

    /// Stores an existing entity, returning its id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] if the entity cannot be stored, for example
    /// because its id is taken.
    fn create(&self, track: Track<Self::Durable, Self::Transient>) -> Result<Uuid, Error>;

    /// Starts and stores a new durable entity from its first plot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] if the entity cannot be stored.
    fn new_durable_track(
        &self,
        identifiers: HashSet<DurableIdentifier>,
        first_plot: Plot,
    ) -> Result<Self::Durable, Error>;

    /// Starts and stores a new transient entity from its first plot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] if the entity cannot be stored.
    fn new_transient_track(&self, first_plot: Plot) -> Result<Self::Transient, Error>;

    /// # Errors
    ///
    /// Returns [`Error::Store`] on lookup failures and propagates polygon
    /// errors from AOI filtering.
    fn durable_tracks(&self, query: &TrackQuery) -> Result<Vec<Self::Durable>, Error>;

    /// Transient tracks matching the query. Identifier filters do not apply.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] on lookup failures and propagates polygon
    /// errors from AOI filtering.
    fn transient_tracks(&self, query: &TrackQuery) -> Result<Vec<Self::Transient>, Error>;
}
