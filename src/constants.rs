// Semi-major axis a
pub(crate) const WGS84_A: f64 = 6_378_137.;
// Flattening
#[allow(clippy::unreadable_literal)]
pub(crate) const WGS84_F: f64 = 1.0 / 298.257223563;

/// Mean radius of Earth in meters
///
/// <https://en.wikipedia.org/wiki/Earth_radius#Arithmetic_mean_radius>
pub(crate) const EARTH_MEAN_RADIUS_M: f64 = 6371.0088 * 1000.0;

// UTM central scale factor
pub(crate) const UTM_K0: f64 = 9996.0 / 10_000.;
pub(crate) const UTM_FALSE_EASTING: f64 = 500_000.;
pub(crate) const UTM_FALSE_NORTHING_SOUTH: f64 = 10_000_000.;
pub(crate) const MIN_UTM_ZONE: u8 = 1;
pub(crate) const MAX_UTM_ZONE: u8 = 60;

// UTM is used strictly between these latitudes, the polar fallback elsewhere
pub(crate) const UTM_MIN_LATITUDE: f64 = -80.;
pub(crate) const UTM_MAX_LATITUDE: f64 = 84.;

pub(crate) const METERS_PER_NAUTICAL_MILE: f64 = 1852.;
pub(crate) const METERS_PER_STATUTE_MILE: f64 = 1609.344;
pub(crate) const METERS_PER_FOOT: f64 = 0.3048;

/// Segments per quarter of an ellipse boundary when none is requested.
pub const DEFAULT_ELLIPSE_RESOLUTION: u32 = 8;
/// Orientation, in degrees, of an ellipse built without one.
pub const DEFAULT_ELLIPSE_ORIENTATION: f64 = 0.0;
/// EPSG code of the frame callers supply geometry in unless told otherwise.
pub const DEFAULT_EPSG_CRS: u32 = 4326;
