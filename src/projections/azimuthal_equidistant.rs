use std::f64::consts::PI;

use lazy_static::lazy_static;

use crate::{constants::EARTH_MEAN_RADIUS_M, utility::GeoMath, Error};

lazy_static! {
    static ref WORLD: AzimuthalEquidistant = AzimuthalEquidistant::new(0., 0.);
}

/// Spherical azimuthal equidistant projection. Distances and azimuths from
/// the centre are true to scale; everything else is stretched with distance
/// from it.
pub(crate) struct AzimuthalEquidistant {
    lat0: f64,
    lon0: f64,
    sin_lat0: f64,
    cos_lat0: f64,
    radius: f64,
}

impl AzimuthalEquidistant {
    /// The world frame (ESRI:54032), centred on the equator at Greenwich.
    pub fn world() -> &'static AzimuthalEquidistant {
        &WORLD
    }

    pub fn new(lat0: f64, lon0: f64) -> AzimuthalEquidistant {
        let (sin_lat0, cos_lat0) = lat0.to_radians().sin_cos();

        Self {
            lat0,
            lon0,
            sin_lat0,
            cos_lat0,
            radius: EARTH_MEAN_RADIUS_M,
        }
    }

    /// Projects `lat`/`lon` (degrees) to `(x, y)` meters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Projection`] for the antipode of the centre, which has
    /// no single image.
    pub fn from_latlon(&self, lat: f64, lon: f64) -> Result<(f64, f64), Error> {
        let (sin_lat, cos_lat) = lat.to_radians().sin_cos();
        let dlon = self.lon0.ang_diff(lon).to_radians();
        let (sin_dlon, cos_dlon) = dlon.sin_cos();

        // Angular distance from the centre via the haversine form, which
        // stays accurate close to it.
        let dlat = (lat - self.lat0).to_radians() / 2.;
        let hav = dlat.sin().powi(2) + self.cos_lat0 * cos_lat * (dlon / 2.).sin().powi(2);
        let c = 2. * hav.clamp(0., 1.).sqrt().asin();

        if (PI - c).abs() < 1e-12 {
            return Err(Error::Projection(format!(
                "Point ({lon}, {lat}) is antipodal to the azimuthal equidistant centre"
            )));
        }

        let azimuth = (sin_dlon * cos_lat)
            .atan2(self.cos_lat0 * sin_lat - self.sin_lat0 * cos_lat * cos_dlon);
        let rho = self.radius * c;
        let (sin_az, cos_az) = azimuth.sin_cos();

        Ok((rho * sin_az, rho * cos_az))
    }

    /// Inverse of [`AzimuthalEquidistant::from_latlon`]. Returns `(lat, lon)`
    /// in degrees.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Projection`] if `(x, y)` lies beyond the antipode.
    pub fn to_latlon(&self, x: f64, y: f64) -> Result<(f64, f64), Error> {
        let rho = x.hypot(y);
        let c = rho / self.radius;

        if c > PI {
            return Err(Error::Projection(format!(
                "({x}, {y}) lies outside the azimuthal equidistant disc"
            )));
        }
        if rho.is_zero() {
            return Ok((self.lat0, self.lon0));
        }

        let azimuth = x.atan2(y);
        let (sin_az, cos_az) = azimuth.sin_cos();
        let (sin_c, cos_c) = c.sin_cos();

        let sin_lat = (self.sin_lat0 * cos_c + self.cos_lat0 * sin_c * cos_az).clamp(-1., 1.);
        let lat = sin_lat.asin();
        let dlon = (sin_az * sin_c * self.cos_lat0).atan2(cos_c - self.sin_lat0 * sin_lat);

        Ok((lat.to_degrees(), (self.lon0 + dlon.to_degrees()).ang_normalize()))
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn centre_maps_to_origin() {
        let (x, y) = AzimuthalEquidistant::world().from_latlon(0., 0.).unwrap();
        assert_abs_diff_eq!(x, 0.0);
        assert_abs_diff_eq!(y, 0.0);
    }

    #[test]
    fn north_pole_is_a_quarter_meridian_up() {
        let (x, y) = AzimuthalEquidistant::world().from_latlon(90., 0.).unwrap();
        assert_abs_diff_eq!(x, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(y, EARTH_MEAN_RADIUS_M * PI / 2., epsilon = 1e-6);
    }

    #[test]
    fn distances_from_centre_are_true() {
        // 10 degrees east along the equator
        let (x, y) = AzimuthalEquidistant::world().from_latlon(0., 10.).unwrap();
        assert_abs_diff_eq!(x, EARTH_MEAN_RADIUS_M * 10_f64.to_radians(), epsilon = 1e-6);
        assert_abs_diff_eq!(y, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn round_trips_polar_points() {
        let proj = AzimuthalEquidistant::world();
        for &(lat, lon) in &[(85.0, 0.0), (85.0, 170.0), (-82.5, -45.0), (88.0, -120.0)] {
            let (x, y) = proj.from_latlon(lat, lon).unwrap();
            let (lat2, lon2) = proj.to_latlon(x, y).unwrap();
            assert_abs_diff_eq!(lat2, lat, epsilon = 1e-9);
            assert_abs_diff_eq!(lon2, lon, epsilon = 1e-9);
        }
    }

    #[test]
    fn antipode_is_rejected() {
        assert!(AzimuthalEquidistant::world().from_latlon(0., 180.).is_err());
    }

    #[test]
    fn off_centre_projection_round_trips() {
        let proj = AzimuthalEquidistant::new(45., 10.);
        let (x, y) = proj.from_latlon(60., 40.).unwrap();
        let (lat, lon) = proj.to_latlon(x, y).unwrap();
        assert_abs_diff_eq!(lat, 60.0, epsilon = 1e-9);
        assert_abs_diff_eq!(lon, 40.0, epsilon = 1e-9);
    }
}
