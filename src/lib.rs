//! Geodetic uncertainty ellipses and true-to-scale planar operations on
//! WGS84 geometry.
//!
//! Geographic coordinates are not locally Euclidean, so every metric
//! construction here happens in a locally accurate projected frame picked per
//! geometry (a UTM zone, or a world azimuthal equidistant frame near the
//! poles) and is mapped back to longitude/latitude afterwards.
//!
//! # Usage
//!
//! ```
//! use geo::point;
//! use trackmarks::{Distance, Ellipse, LengthUnit};
//!
//! let ellipse = Ellipse::create(
//!     point!(x: -84.39, y: 33.75),
//!     Distance::new(2.0, LengthUnit::NauticalMile),
//!     Distance::new(1.0, LengthUnit::NauticalMile),
//!     10.0,
//! ).unwrap();
//!
//! let polygon = ellipse.polygon().unwrap();
//! assert_eq!(polygon.exterior().0.len(), 33);
//! ```

#![warn(clippy::pedantic)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::module_name_repetitions
)]

use thiserror::Error;

pub mod cache;
pub mod distance;
pub mod ellipse;
pub mod frame;
pub mod reproject;
pub mod shape;
pub mod store;
pub mod table;
pub mod track;

pub use cache::PolygonCache;
pub use constants::{DEFAULT_ELLIPSE_ORIENTATION, DEFAULT_ELLIPSE_RESOLUTION, DEFAULT_EPSG_CRS};
pub use distance::{Distance, LengthUnit};
pub use ellipse::{construct_ellipse, Ellipse};
pub use frame::{resolve_optimal_frame, Hemisphere, ProjectionFrame};
pub use reproject::{build_transformers, OptimalReprojector, Transformer, TransformerPair};
pub use shape::{geographic_point, Shape};
pub use table::{GeoRow, GeoTable};

pub(crate) mod projections {
    pub mod azimuthal_equidistant;
    pub mod transverse_mercator;
}

pub(crate) mod constants;
pub(crate) mod utility;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Projection error: {0}")]
    Projection(String),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Unsupported geometry: {0}")]
    UnsupportedGeometry(String),
    #[error("Coordinate parameters are not valid: {0}")]
    InvalidCoord(String),
    #[error("Track store error: {0}")]
    Store(String),
}

trait ThisOrThat {
    fn ternary<T>(&self, r#true: T, r#false: T) -> T;
    fn ternary_lazy<F, E, T>(&self, r#true: F, r#false: E) -> T
    where
        F: Fn() -> T,
        E: Fn() -> T;
}

impl ThisOrThat for bool {
    fn ternary<T>(&self, r#true: T, r#false: T) -> T {
        if *self { r#true } else { r#false }
    }

    fn ternary_lazy<F, E, T>(&self, r#true: F, r#false: E) -> T
    where
        F: Fn() -> T,
        E: Fn() -> T,
    {
        if *self { r#true() } else { r#false() }
    }
}
