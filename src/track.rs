//! Tracked entities and their observation history.
//!
//! Entities only need the ellipse machinery from the rest of the crate: every
//! plot and every track carries an [`Ellipse`] and asks it for a polygon when
//! a geometry is needed.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    ellipse::Ellipse,
    shape::Shape,
    table::{GeoRow, GeoTable},
    Error,
};

/// The system that reported a plot.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlotSource {
    pub system: String,
    pub version: u32,
}

/// A reporting system that also names the entity it observed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DurableSource {
    pub system: String,
    pub version: u32,
    pub identifier: String,
}

impl DurableSource {
    pub fn durable_identifier(&self) -> DurableIdentifier {
        DurableIdentifier {
            identifier: self.identifier.clone(),
            system: self.system.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Source {
    Anonymous(PlotSource),
    Durable(DurableSource),
}

impl Source {
    pub fn system(&self) -> &str {
        match self {
            Source::Anonymous(source) => &source.system,
            Source::Durable(source) => &source.system,
        }
    }

    pub fn version(&self) -> u32 {
        match self {
            Source::Anonymous(source) => source.version,
            Source::Durable(source) => source.version,
        }
    }
}

impl From<PlotSource> for Source {
    fn from(value: PlotSource) -> Self {
        Source::Anonymous(value)
    }
}

impl From<DurableSource> for Source {
    fn from(value: DurableSource) -> Self {
        Source::Durable(value)
    }
}

/// A single observation of an entity.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Plot {
    pub location: Ellipse,
    pub first_observed: DateTime<Utc>,
    pub last_observed: DateTime<Utc>,
    pub source: Source,
}

/// An identifier an external system uses for an entity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DurableIdentifier {
    pub identifier: String,
    pub system: String,
}

impl DurableIdentifier {
    pub fn new(identifier: impl Into<String>, system: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            system: system.into(),
        }
    }
}

/// An optional `[after, before]` bound on observation times. Open on either
/// side when unset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeWindow {
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn new(after: Option<DateTime<Utc>>, before: Option<DateTime<Utc>>) -> Self {
        Self { after, before }
    }

    /// Whether an observation spanning `[first, last]` touches the window.
    pub fn overlaps(&self, first: DateTime<Utc>, last: DateTime<Utc>) -> bool {
        self.after.map_or(true, |after| last >= after)
            && self.before.map_or(true, |before| first <= before)
    }
}

/// The bookkeeping every tracked entity carries.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrackState {
    pub guid: Uuid,
    pub first_observed: DateTime<Utc>,
    pub last_observed: DateTime<Utc>,
    pub last_known_position: Ellipse,
}

impl TrackState {
    /// Starts a new entity from its first plot, with a fresh random id.
    pub fn from_plot(plot: &Plot) -> Self {
        Self {
            guid: Uuid::new_v4(),
            first_observed: plot.first_observed,
            last_observed: plot.last_observed,
            last_known_position: plot.location.clone(),
        }
    }

    /// Folds a later observation in. Older plots only widen the window.
    pub fn observe(&mut self, plot: &Plot) {
        self.first_observed = self.first_observed.min(plot.first_observed);

        if plot.last_observed >= self.last_observed {
            self.last_observed = plot.last_observed;
            self.last_known_position = plot.location.clone();
        }
    }
}

/// Plot attributes kept alongside the polygon in [`TrackHistory::to_table`].
#[derive(Clone, Debug, PartialEq)]
pub struct PlotAttributes {
    pub first_observed: DateTime<Utc>,
    pub last_observed: DateTime<Utc>,
    pub source: Source,
}

/// The plots of one entity within a time window.
pub trait TrackHistory {
    fn window(&self) -> TimeWindow;

    fn plots(&self) -> Box<dyn Iterator<Item = &Plot> + '_>;

    /// One row per plot, holding the plot's ellipse polygon.
    ///
    /// # Errors
    ///
    /// Propagates the first ellipse that fails to build.
    fn to_table(&self) -> Result<GeoTable<PlotAttributes>, Error> {
        self.plots()
            .map(|plot| -> Result<GeoRow<PlotAttributes>, Error> {
                let polygon = plot.location.polygon()?;

                Ok(GeoRow {
                    geometry: Shape::Polygon(polygon.as_ref().clone()),
                    attributes: PlotAttributes {
                        first_observed: plot.first_observed,
                        last_observed: plot.last_observed,
                        source: plot.source.clone(),
                    },
                })
            })
            .collect()
    }
}

/// A [`TrackHistory`] over plots held in memory.
#[derive(Clone, Debug, Default)]
pub struct PlotHistory {
    window: TimeWindow,
    plots: Vec<Plot>,
}

impl PlotHistory {
    /// Keeps the plots that overlap `window`, ordered by first observation.
    pub fn new<'a>(window: TimeWindow, plots: impl IntoIterator<Item = &'a Plot>) -> Self {
        let mut plots: Vec<Plot> = plots
            .into_iter()
            .filter(|plot| window.overlaps(plot.first_observed, plot.last_observed))
            .cloned()
            .collect();
        plots.sort_by_key(|plot| plot.first_observed);

        Self { window, plots }
    }

    pub fn len(&self) -> usize {
        self.plots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plots.is_empty()
    }
}

impl TrackHistory for PlotHistory {
    fn window(&self) -> TimeWindow {
        self.window
    }

    fn plots(&self) -> Box<dyn Iterator<Item = &Plot> + '_> {
        Box::new(self.plots.iter())
    }
}

/// Something whose position is tracked over time.
pub trait Trackable {
    fn state(&self) -> &TrackState;

    fn plots(&self, window: TimeWindow) -> Box<dyn TrackHistory + '_>;

    fn guid(&self) -> Uuid {
        self.state().guid
    }

    fn first_observed(&self) -> DateTime<Utc> {
        self.state().first_observed
    }

    fn last_observed(&self) -> DateTime<Utc> {
        self.state().last_observed
    }

    fn last_known_position(&self) -> &Ellipse {
        &self.state().last_known_position
    }
}

/// An entity known to external systems by one or more identifiers.
pub trait DurableTrackable: Trackable {
    fn identifiers(&self) -> &HashSet<DurableIdentifier>;
}

/// An entity known only through anonymous plots.
pub trait TransientTrackable: Trackable {}
