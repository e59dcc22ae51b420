use std::{fmt::Display, str::FromStr};

use geo::{Coord, Point};
use tracing::trace;

use crate::{
    constants::{
        DEFAULT_EPSG_CRS, MAX_UTM_ZONE, MIN_UTM_ZONE, UTM_FALSE_EASTING, UTM_FALSE_NORTHING_SOUTH,
        UTM_MAX_LATITUDE, UTM_MIN_LATITUDE,
    },
    projections::{azimuthal_equidistant::AzimuthalEquidistant, transverse_mercator::TransverseMercator},
    utility::GeoMath,
    Error, ThisOrThat,
};

const ESRI_WORLD_AEQD: u32 = 54032;
const EPSG_UTM_NORTH: u32 = 32600;
const EPSG_UTM_SOUTH: u32 = 32700;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Hemisphere {
    North,
    South,
}

impl Hemisphere {
    /// The equator itself belongs to the northern hemisphere.
    pub fn of_latitude(lat: f64) -> Hemisphere {
        (lat < 0.).ternary(Hemisphere::South, Hemisphere::North)
    }
}

/// A coordinate reference system the reprojection pipeline can map between.
/// Two frames are equal iff they denote the same definition.
///
/// # Usage
///
/// ```
/// use trackmarks::{Hemisphere, ProjectionFrame};
///
/// let frame: ProjectionFrame = "EPSG:32716".parse().unwrap();
/// assert_eq!(frame, ProjectionFrame::utm(16, Hemisphere::South).unwrap());
/// assert_eq!(frame.to_string(), "EPSG:32716");
///
/// let same: ProjectionFrame = "+proj=utm +zone=16 +south +datum=WGS84 +units=m".parse().unwrap();
/// assert_eq!(same, frame);
///
/// assert!("EPSG:99999".parse::<ProjectionFrame>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProjectionFrame {
    /// Longitude/latitude in degrees on WGS84 (EPSG:4326).
    #[default]
    Wgs84,
    /// WGS84 / UTM, meters (EPSG:326zz north, EPSG:327zz south).
    Utm { zone: u8, hemisphere: Hemisphere },
    /// World azimuthal equidistant centred on (0, 0), meters (ESRI:54032).
    WorldAzimuthalEquidistant,
}

impl ProjectionFrame {
    /// # Errors
    ///
    /// Returns [`Error::Projection`] if `zone` is outside `[1, 60]`.
    pub fn utm(zone: u8, hemisphere: Hemisphere) -> Result<ProjectionFrame, Error> {
        if (MIN_UTM_ZONE..=MAX_UTM_ZONE).contains(&zone) {
            Ok(ProjectionFrame::Utm { zone, hemisphere })
        } else {
            Err(Error::Projection(format!("UTM zone {zone} not in range [1, 60]")))
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::Projection`] for codes other than 4326 and the WGS84
    /// UTM series 32601-32660 / 32701-32760.
    pub fn from_epsg(code: u32) -> Result<ProjectionFrame, Error> {
        let unknown = || Error::Projection(format!("Unknown projection frame EPSG:{code}"));

        match code {
            DEFAULT_EPSG_CRS => Ok(ProjectionFrame::Wgs84),
            32601..=32660 => Ok(ProjectionFrame::Utm {
                zone: u8::try_from(code - EPSG_UTM_NORTH).map_err(|_| unknown())?,
                hemisphere: Hemisphere::North,
            }),
            32701..=32760 => Ok(ProjectionFrame::Utm {
                zone: u8::try_from(code - EPSG_UTM_SOUTH).map_err(|_| unknown())?,
                hemisphere: Hemisphere::South,
            }),
            _ => Err(unknown()),
        }
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self, ProjectionFrame::Wgs84)
    }

    /// The PROJ definition string of this frame.
    pub fn to_proj_string(&self) -> String {
        match self {
            ProjectionFrame::Wgs84 => "+proj=longlat +datum=WGS84 +no_defs".to_string(),
            ProjectionFrame::Utm { zone, hemisphere } => format!(
                "+proj=utm +zone={zone}{} +ellps=WGS84 +datum=WGS84 +units=m +no_defs",
                (*hemisphere == Hemisphere::South).ternary(" +south", ""),
            ),
            ProjectionFrame::WorldAzimuthalEquidistant => {
                "+proj=aeqd +lat_0=0 +lon_0=0 +x_0=0 +y_0=0 +datum=WGS84 +units=m +no_defs".to_string()
            }
        }
    }

    /// Whether a geographic point lies in this frame's area of use. The world
    /// azimuthal frame covers everything but the antipode of its centre.
    pub fn contains(&self, point: Point<f64>) -> bool {
        let on_globe =
            (-90_f64..=90_f64).contains(&point.y()) && (-180_f64..=180_f64).contains(&point.x());

        match self {
            ProjectionFrame::Wgs84 => on_globe,
            ProjectionFrame::WorldAzimuthalEquidistant => {
                on_globe && AzimuthalEquidistant::world().from_latlon(point.y(), point.x()).is_ok()
            }
            ProjectionFrame::Utm { zone, hemisphere } => {
                let lat = point.y();
                let lat_range = match hemisphere {
                    Hemisphere::North => 0_f64..=UTM_MAX_LATITUDE,
                    Hemisphere::South => UTM_MIN_LATITUDE..=0_f64,
                };
                let offset = central_meridian(*zone).ang_diff(point.x());

                lat_range.contains(&lat) && offset.abs() <= 3.
            }
        }
    }

    /// Maps a coordinate in this frame to longitude/latitude degrees.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Projection`] if the coordinate has no geographic
    /// image.
    pub fn to_geographic(&self, coord: Coord<f64>) -> Result<Coord<f64>, Error> {
        let (lat, lon) = match self {
            ProjectionFrame::Wgs84 => return Ok(coord),
            ProjectionFrame::Utm { zone, hemisphere } => {
                let x = coord.x - UTM_FALSE_EASTING;
                let y = coord.y - false_northing(*hemisphere);

                TransverseMercator::utm().to_latlon(central_meridian(*zone), x, y)
            }
            ProjectionFrame::WorldAzimuthalEquidistant => {
                AzimuthalEquidistant::world().to_latlon(coord.x, coord.y)?
            }
        };

        self.checked(coord, Coord { x: lon, y: lat })
    }

    /// Maps longitude/latitude degrees into this frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Projection`] if the point cannot be represented in
    /// this frame.
    pub fn from_geographic(&self, coord: Coord<f64>) -> Result<Coord<f64>, Error> {
        let (x, y) = match self {
            ProjectionFrame::Wgs84 => return Ok(coord),
            ProjectionFrame::Utm { zone, hemisphere } => {
                let (x, y) = TransverseMercator::utm().from_latlon(central_meridian(*zone), coord.y, coord.x);

                (x + UTM_FALSE_EASTING, y + false_northing(*hemisphere))
            }
            ProjectionFrame::WorldAzimuthalEquidistant => {
                AzimuthalEquidistant::world().from_latlon(coord.y, coord.x)?
            }
        };

        self.checked(coord, Coord { x, y })
    }

    fn checked(&self, input: Coord<f64>, output: Coord<f64>) -> Result<Coord<f64>, Error> {
        if output.x.is_finite() && output.y.is_finite() {
            Ok(output)
        } else {
            Err(Error::Projection(format!(
                "({}, {}) has no finite image in {self}",
                input.x, input.y
            )))
        }
    }
}

pub(crate) fn central_meridian(zone: u8) -> f64 {
    6.0 * f64::from(zone) - 183.
}

fn false_northing(hemisphere: Hemisphere) -> f64 {
    (hemisphere == Hemisphere::South).ternary(UTM_FALSE_NORTHING_SOUTH, 0.)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn utm_zone(lon: f64) -> u8 {
    let zone = ((lon.ang_normalize() + 180.) / 6.).floor() as i32 + 1;

    // Longitude 180 folds back into the last zone
    zone.clamp(i32::from(MIN_UTM_ZONE), i32::from(MAX_UTM_ZONE)) as u8
}

/// Picks a locally accurate projected frame for a geographic point.
///
/// Between latitudes -80 and 84 (exclusive) this is the UTM zone
/// `floor((lon + 180) / 6) + 1` in the point's hemisphere; elsewhere the world
/// azimuthal equidistant frame. The choice depends on the coordinates alone.
///
/// # Usage
///
/// ```
/// use geo::point;
/// use trackmarks::{resolve_optimal_frame, Hemisphere, ProjectionFrame};
///
/// let frame = resolve_optimal_frame(point!(x: -84.39, y: 33.75));
/// assert_eq!(frame, ProjectionFrame::Utm { zone: 16, hemisphere: Hemisphere::North });
///
/// let polar = resolve_optimal_frame(point!(x: 10.0, y: 85.0));
/// assert_eq!(polar, ProjectionFrame::WorldAzimuthalEquidistant);
/// ```
pub fn resolve_optimal_frame(point: Point<f64>) -> ProjectionFrame {
    let lon = point.x();
    let lat = point.y();

    let frame = if lat > UTM_MIN_LATITUDE && lat < UTM_MAX_LATITUDE {
        ProjectionFrame::Utm {
            zone: utm_zone(lon),
            hemisphere: Hemisphere::of_latitude(lat),
        }
    } else {
        ProjectionFrame::WorldAzimuthalEquidistant
    };

    trace!(lon, lat, %frame, "Resolved optimal frame");
    frame
}

impl Display for ProjectionFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectionFrame::Wgs84 => write!(f, "EPSG:{DEFAULT_EPSG_CRS}"),
            ProjectionFrame::Utm { zone, hemisphere } => write!(
                f,
                "EPSG:{}",
                u32::from(*zone) + (*hemisphere == Hemisphere::North).ternary(EPSG_UTM_NORTH, EPSG_UTM_SOUTH),
            ),
            ProjectionFrame::WorldAzimuthalEquidistant => write!(f, "ESRI:{ESRI_WORLD_AEQD}"),
        }
    }
}

impl FromStr for ProjectionFrame {
    type Err = Error;

    /// Accepts `EPSG:<code>`, `ESRI:54032`, the names `WGS84`/`CRS84`, and
    /// PROJ strings for `utm`, `aeqd` and `longlat` on WGS84.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        let upper = value.to_ascii_uppercase();
        let unknown = || Error::Projection(format!("Unknown projection frame '{value}'"));

        if value.starts_with('+') {
            return parse_proj_string(value).ok_or_else(unknown);
        }

        match upper.as_str() {
            "WGS84" | "CRS84" | "OGC:CRS84" => return Ok(ProjectionFrame::Wgs84),
            "ESRI:54032" => return Ok(ProjectionFrame::WorldAzimuthalEquidistant),
            _ => {}
        }

        let code = upper
            .strip_prefix("EPSG:")
            .ok_or_else(unknown)?
            .parse::<u32>()
            .map_err(|_| unknown())?;

        ProjectionFrame::from_epsg(code)
    }
}

fn parse_proj_string(value: &str) -> Option<ProjectionFrame> {
    let mut proj = None;
    let mut zone = None;
    let mut south = false;
    let mut origin_is_zero = true;

    for token in value.split_whitespace() {
        let token = token.strip_prefix('+')?;
        let (key, val) = token.split_once('=').map_or((token, None), |(k, v)| (k, Some(v)));

        match (key, val) {
            ("proj", Some(name)) => proj = Some(name.to_ascii_lowercase()),
            ("zone", Some(z)) => zone = Some(z.parse::<u8>().ok()?),
            ("south", None) => south = true,
            ("ellps" | "datum", Some(datum)) if !datum.eq_ignore_ascii_case("WGS84") => return None,
            ("lat_0" | "lon_0" | "x_0" | "y_0", Some(v)) => {
                origin_is_zero &= v.parse::<f64>().ok()?.is_zero();
            }
            ("units", Some(units)) if units != "m" => return None,
            _ => {}
        }
    }

    match proj.as_deref()? {
        "utm" => ProjectionFrame::utm(zone?, south.ternary(Hemisphere::South, Hemisphere::North)).ok(),
        "aeqd" if origin_is_zero => Some(ProjectionFrame::WorldAzimuthalEquidistant),
        "longlat" | "latlong" | "lonlat" | "latlon" => Some(ProjectionFrame::Wgs84),
        _ => None,
    }
}
