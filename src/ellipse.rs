use std::{f64::consts::TAU, sync::Arc};

use geo::{Coord, LineString, MapCoords, Point, Polygon, Rotate, Scale};

use crate::{
    cache::PolygonCache,
    constants::DEFAULT_ELLIPSE_RESOLUTION,
    distance::Distance,
    reproject::OptimalReprojector,
    shape::{geographic_point, Shape},
    Error,
};

fn axis_meters(name: &str, axis: Distance) -> Result<f64, Error> {
    let meters = axis.meters();

    if meters.is_finite() && meters >= 0. {
        Ok(meters)
    } else {
        Err(Error::InvalidParameter(format!(
            "{name} must be a finite, non-negative length, got {axis}"
        )))
    }
}

fn check_orientation(orientation: f64) -> Result<f64, Error> {
    if orientation.is_finite() {
        Ok(orientation)
    } else {
        Err(Error::InvalidParameter(format!("Orientation {orientation} is not a finite angle")))
    }
}

/// Builds the ellipse ring around `center` in a metric frame.
///
/// The ring starts on the positive x axis and has `4 * resolution` segments.
/// Positive `orientation` (degrees) turns the major axis clockwise.
#[allow(clippy::float_cmp)]
pub(crate) fn local_ellipse(
    center: Point<f64>,
    semi_major: f64,
    semi_minor: f64,
    orientation: f64,
    resolution: u32,
) -> Polygon<f64> {
    let segments = 4 * resolution;
    let step = TAU / f64::from(segments);

    let mut ring: Vec<Coord<f64>> = (0..segments)
        .map(|i| {
            let (sin, cos) = (step * f64::from(i)).sin_cos();
            Coord {
                x: center.x() + cos,
                y: center.y() + sin,
            }
        })
        .collect();
    if let Some(&first) = ring.first() {
        ring.push(first);
    }

    let ellipse = Polygon::new(LineString::new(ring), vec![])
        .scale_around_point(semi_major, semi_minor, center);

    if orientation == 0. {
        ellipse
    } else {
        // geo rotates counter-clockwise
        ellipse.rotate_around_point(-orientation, center)
    }
}

/// Shifts vertices by a whole turn wherever they sit more than 180° of
/// longitude away from `lon`, so the ring stays continuous around it.
fn unwrap_longitudes(polygon: Polygon<f64>, lon: f64) -> Polygon<f64> {
    polygon.map_coords(|c| {
        let offset = c.x - lon;
        let x = if offset > 180. {
            c.x - 360.
        } else if offset < -180. {
            c.x + 360.
        } else {
            c.x
        };
        Coord { x, y: c.y }
    })
}

/// Builds the geographic polygon of an uncertainty ellipse centred on a
/// WGS84 point. The boundary is laid out in the point's optimal projected
/// frame so the semi-axes are true lengths on the ground.
///
/// `resolution` is the number of segments per quarter of the boundary.
///
/// Longitudes are kept within 180° of the centroid rather than normalised, so
/// an ellipse that crosses the antimeridian comes back as one continuous ring
/// with some vertices beyond ±180.
///
/// # Errors
///
/// * [`Error::InvalidParameter`] if `resolution` is 0 or too large, a
///   semi-axis is negative or not finite, or the orientation is not finite
/// * [`Error::InvalidCoord`] if the centroid is not a valid geographic point
/// * [`Error::Projection`] if the ellipse cannot be mapped back to WGS84
///
/// # Usage
///
/// ```
/// use geo::point;
/// use trackmarks::{construct_ellipse, Distance};
///
/// let polygon = construct_ellipse(
///     point!(x: -84.39, y: 33.75),
///     "2 nmi".parse().unwrap(),
///     "1 nmi".parse().unwrap(),
///     10.0,
///     8,
/// ).unwrap();
/// assert_eq!(polygon.exterior().0.len(), 33);
///
/// let error = construct_ellipse(
///     point!(x: -84.39, y: 33.75),
///     Distance::from_meters(-1.0),
///     Distance::from_meters(1.0),
///     0.0,
///     8,
/// );
/// assert!(error.is_err());
/// ```
pub fn construct_ellipse(
    centroid: Point<f64>,
    semi_major: Distance,
    semi_minor: Distance,
    orientation: f64,
    resolution: u32,
) -> Result<Polygon<f64>, Error> {
    if resolution == 0 || resolution.checked_mul(4).is_none() {
        return Err(Error::InvalidParameter(format!(
            "Resolution must be a positive number of segments per quarter, got {resolution}"
        )));
    }
    let major = axis_meters("Semi-major axis", semi_major)?;
    let minor = axis_meters("Semi-minor axis", semi_minor)?;
    let orientation = check_orientation(orientation)?;
    let centroid = geographic_point(centroid.x(), centroid.y())?;

    let polygon = OptimalReprojector::default()
        .apply_in_optimal_frame(&Shape::Point(centroid), |shape| {
            let center = shape.into_point()?;
            Ok(local_ellipse(center, major, minor, orientation, resolution).into())
        })?
        .into_polygon()?;

    Ok(unwrap_longitudes(polygon, centroid.x()))
}

/// A geodetic uncertainty region: a centroid, two semi-axes and the clockwise
/// orientation of the major axis in degrees.
///
/// The polygon is built on first access and kept until a regeneration is
/// persisted. Deserialising runs the same checks as [`Ellipse::create`].
#[derive(Clone, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "EllipseParameters", into = "EllipseParameters")
)]
pub struct Ellipse {
    centroid: Point<f64>,
    semi_major: Distance,
    semi_minor: Distance,
    orientation: f64,
    cache: PolygonCache,
}

/// The serialised form of an [`Ellipse`], without its polygon.
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
struct EllipseParameters {
    centroid: Point<f64>,
    semi_major: Distance,
    semi_minor: Distance,
    orientation: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<EllipseParameters> for Ellipse {
    type Error = Error;

    fn try_from(value: EllipseParameters) -> Result<Self, Self::Error> {
        Ellipse::create(value.centroid, value.semi_major, value.semi_minor, value.orientation)
    }
}

#[cfg(feature = "serde")]
impl From<Ellipse> for EllipseParameters {
    fn from(value: Ellipse) -> Self {
        Self {
            centroid: value.centroid,
            semi_major: value.semi_major,
            semi_minor: value.semi_minor,
            orientation: value.orientation,
        }
    }
}

impl Ellipse {
    /// # Errors
    ///
    /// Returns [`Error::InvalidCoord`] for a centroid outside the geographic
    /// bounds and [`Error::InvalidParameter`] for a negative or non-finite
    /// semi-axis or orientation.
    pub fn create(
        centroid: Point<f64>,
        semi_major: Distance,
        semi_minor: Distance,
        orientation: f64,
    ) -> Result<Ellipse, Error> {
        let centroid = geographic_point(centroid.x(), centroid.y())?;
        axis_meters("Semi-major axis", semi_major)?;
        axis_meters("Semi-minor axis", semi_minor)?;
        let orientation = check_orientation(orientation)?;

        Ok(Self {
            centroid,
            semi_major,
            semi_minor,
            orientation,
            cache: PolygonCache::new(),
        })
    }

    #[inline]
    pub fn centroid(&self) -> Point<f64> {
        self.centroid
    }

    #[inline]
    pub fn semi_major(&self) -> Distance {
        self.semi_major
    }

    #[inline]
    pub fn semi_minor(&self) -> Distance {
        self.semi_minor
    }

    #[inline]
    pub fn orientation(&self) -> f64 {
        self.orientation
    }

    /// The ellipse polygon at the default resolution. Built on first call;
    /// later calls hand out the same allocation.
    ///
    /// # Errors
    ///
    /// See [`construct_ellipse`]. A failed build leaves nothing cached.
    pub fn polygon(&self) -> Result<Arc<Polygon<f64>>, Error> {
        self.cache
            .get_or_try_init(|| self.build(DEFAULT_ELLIPSE_RESOLUTION))
    }

    /// Builds a fresh polygon at `resolution`. It replaces the cached polygon
    /// only when `persist` is set.
    ///
    /// # Errors
    ///
    /// See [`construct_ellipse`]. The cache is untouched on error.
    pub fn regenerate(&self, resolution: u32, persist: bool) -> Result<Arc<Polygon<f64>>, Error> {
        let polygon = Arc::new(self.build(resolution)?);

        if persist {
            self.cache.replace(Arc::clone(&polygon));
        }

        Ok(polygon)
    }

    pub fn is_polygon_cached(&self) -> bool {
        self.cache.is_populated()
    }

    fn build(&self, resolution: u32) -> Result<Polygon<f64>, Error> {
        construct_ellipse(
            self.centroid,
            self.semi_major,
            self.semi_minor,
            self.orientation,
            resolution,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use approx::assert_abs_diff_eq;
    use geo::{point, polygon, Area};

    use super::*;

    #[test]
    fn ring_is_closed_with_four_segments_per_resolution() {
        for resolution in [1, 2, 8, 32] {
            let polygon = local_ellipse(point!(x: 0., y: 0.), 2., 1., 0., resolution);
            let ring = &polygon.exterior().0;
            assert_eq!(ring.len(), 4 * resolution as usize + 1);
            assert_eq!(ring.first(), ring.last());
        }
    }

    #[test]
    fn area_grows_towards_pi_a_b() {
        let (a, b) = (3704., 1852.);
        let mut previous = 0.;
        for resolution in 1..=64 {
            let area = local_ellipse(point!(x: 5e5, y: 4e6), a, b, 0., resolution).unsigned_area();
            assert!(area > previous, "resolution {resolution}");
            assert!(area < PI * a * b, "resolution {resolution}");
            previous = area;
        }
        assert_abs_diff_eq!(previous / (PI * a * b), 1.0, epsilon = 1e-3);
    }

    #[test]
    fn zero_orientation_skips_rotation() {
        let center = point!(x: 741_000., y: 3_738_000.);
        let polygon = local_ellipse(center, 3704., 1852., 0., 8);
        let scaled = local_ellipse(center, 1., 1., 0., 8).scale_around_point(3704., 1852., center);
        assert_eq!(polygon, scaled);
    }

    #[test]
    fn positive_orientation_turns_clockwise() {
        let polygon = local_ellipse(point!(x: 0., y: 0.), 10., 1., 90., 4);
        // The first vertex starts at (+a, 0) and ends up pointing south.
        let first = polygon.exterior().0[0];
        assert_abs_diff_eq!(first.x, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(first.y, -10.0, epsilon = 1e-9);
    }

    #[test]
    fn zero_axes_are_degenerate_not_errors() {
        let polygon = construct_ellipse(
            point!(x: 10., y: 10.),
            Distance::from_meters(0.),
            Distance::from_meters(0.),
            0.,
            4,
        )
        .unwrap();
        assert_eq!(polygon.exterior().0.len(), 17);
        assert_abs_diff_eq!(polygon.unsigned_area(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn invalid_parameters_build_nothing() {
        let center = point!(x: -84.39, y: 33.75);
        let one = Distance::from_nautical_miles(1.);

        for result in [
            construct_ellipse(center, one, one, 0., 0),
            construct_ellipse(center, Distance::from_meters(-1.), one, 0., 8),
            construct_ellipse(center, one, Distance::from_meters(f64::NAN), 0., 8),
            construct_ellipse(center, one, one, f64::INFINITY, 8),
        ] {
            assert!(matches!(result, Err(Error::InvalidParameter(_))));
        }

        let ellipse = Ellipse::create(center, one, one, 0.).unwrap();
        assert!(matches!(ellipse.regenerate(0, true), Err(Error::InvalidParameter(_))));
        assert!(!ellipse.is_polygon_cached());
    }

    #[test]
    fn create_validates_centroid() {
        let one = Distance::from_nautical_miles(1.);
        assert!(matches!(
            Ellipse::create(point!(x: 33.75, y: -184.39), one, one, 0.),
            Err(Error::InvalidCoord(_))
        ));
    }

    #[test]
    fn unwrap_keeps_ring_on_the_centroid_side() {
        let ring = polygon![(x: 179.99, y: 10.), (x: -179.98, y: 10.), (x: 179.97, y: 10.01)];
        let unwrapped = unwrap_longitudes(ring, 179.99);
        for (c, x) in unwrapped.exterior().coords().zip([179.99, 180.02, 179.97, 179.99]) {
            assert_abs_diff_eq!(c.x, x, epsilon = 1e-9);
        }

        let west = polygon![(x: -179.99, y: 0.), (x: 179.99, y: 0.), (x: -179.98, y: 1.)];
        let unwrapped = unwrap_longitudes(west, -179.99);
        for (c, x) in unwrapped.exterior().coords().zip([-179.99, -180.01, -179.98, -179.99]) {
            assert_abs_diff_eq!(c.x, x, epsilon = 1e-9);
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialising_applies_create_checks() {
        let ellipse = Ellipse::create(
            point!(x: -84.39, y: 33.75),
            Distance::from_nautical_miles(2.),
            Distance::from_nautical_miles(1.),
            10.,
        )
        .unwrap();
        ellipse.polygon().unwrap();

        let mut value = serde_json::to_value(&ellipse).unwrap();
        assert!(value.get("cache").is_none());

        let back: Ellipse = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(back.centroid(), ellipse.centroid());
        assert_eq!(back.orientation(), 10.);
        assert!(!back.is_polygon_cached());

        value["semi_major"]["value"] = serde_json::json!(-1.0);
        let error = serde_json::from_value::<Ellipse>(value).unwrap_err();
        assert!(error.to_string().contains("Semi-major axis"), "{error}");
    }
}
