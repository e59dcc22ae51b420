use geo::{Centroid, Coord, CoordsIter, Geometry, MapCoords, MultiPolygon, Point, Polygon};

use crate::Error;

/// Tries to create a geographic point (EPSG:4326) from a longitude/latitude
/// pair in degrees. Axis order is always `x = longitude`, `y = latitude`.
///
/// * Latitude must be in range [-90,90]
/// * Longitude must be in range [-180,180]
///
/// # Errors
///
/// Returns [`Error::InvalidCoord`] if either value is out of range or not a
/// number.
///
/// # Usage
///
/// ```
/// use trackmarks::geographic_point;
///
/// let atlanta = geographic_point(-84.39, 33.75).unwrap();
/// assert_eq!(atlanta.x(), -84.39);
/// assert_eq!(atlanta.y(), 33.75);
///
/// assert!(geographic_point(33.75, -184.39).is_err());
/// assert!(geographic_point(0.0, 91.0).is_err());
/// ```
pub fn geographic_point(lon: f64, lat: f64) -> Result<Point<f64>, Error> {
    if !(-90_f64..=90_f64).contains(&lat) {
        Err(Error::InvalidCoord(format!("Latitude {lat} outside of valid range [-90, 90].")))
    } else if !(-180_f64..=180_f64).contains(&lon) {
        Err(Error::InvalidCoord(format!("Longitude {lon} outside of valid range [-180, 180].")))
    } else {
        Ok(Point::new(lon, lat))
    }
}

/// The geometry variants the reprojection pipeline knows how to anchor.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Point(Point<f64>),
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl Shape {
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Point(_) => "Point",
            Shape::Polygon(_) => "Polygon",
            Shape::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// The point used to pick a projection for this shape: the point itself,
    /// or the centroid of anything with area.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Projection`] if the shape has no coordinates or any
    /// coordinate is not finite.
    pub fn anchor(&self) -> Result<Point<f64>, Error> {
        if self.coords_count() == 0 {
            return Err(Error::Projection(format!("Empty {} has no anchor point", self.kind())));
        }
        if !self.coords().all(|c| c.x.is_finite() && c.y.is_finite()) {
            return Err(Error::Projection(format!(
                "{} has non-finite coordinates",
                self.kind()
            )));
        }

        let anchor = match self {
            Shape::Point(point) => Some(*point),
            Shape::Polygon(polygon) => polygon.centroid(),
            Shape::MultiPolygon(polygons) => polygons.centroid(),
        };

        anchor.ok_or_else(|| Error::Projection(format!("{} has no centroid", self.kind())))
    }

    pub fn coords_count(&self) -> usize {
        match self {
            Shape::Point(point) => point.coords_count(),
            Shape::Polygon(polygon) => polygon.coords_count(),
            Shape::MultiPolygon(polygons) => polygons.coords_count(),
        }
    }

    /// Every vertex of every ring, exterior first.
    pub fn coords(&self) -> Box<dyn Iterator<Item = Coord<f64>> + '_> {
        match self {
            Shape::Point(point) => Box::new(point.coords_iter()),
            Shape::Polygon(polygon) => Box::new(polygon.coords_iter()),
            Shape::MultiPolygon(polygons) => Box::new(polygons.coords_iter()),
        }
    }

    /// Maps every vertex through `func`, keeping the structure intact.
    ///
    /// # Errors
    ///
    /// Propagates the first error `func` returns.
    pub fn try_map_coords<F>(&self, func: F) -> Result<Shape, Error>
    where
        F: Fn(Coord<f64>) -> Result<Coord<f64>, Error> + Copy,
    {
        let mapped = match self {
            Shape::Point(point) => Shape::Point(point.try_map_coords(func)?),
            Shape::Polygon(polygon) => Shape::Polygon(polygon.try_map_coords(func)?),
            Shape::MultiPolygon(polygons) => Shape::MultiPolygon(polygons.try_map_coords(func)?),
        };

        Ok(mapped)
    }

    /// # Errors
    ///
    /// Returns [`Error::UnsupportedGeometry`] unless this is a polygon.
    pub fn into_polygon(self) -> Result<Polygon<f64>, Error> {
        match self {
            Shape::Polygon(polygon) => Ok(polygon),
            other => Err(Error::UnsupportedGeometry(format!(
                "Expected a Polygon, found a {}",
                other.kind()
            ))),
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::UnsupportedGeometry`] unless this is a point.
    pub fn into_point(self) -> Result<Point<f64>, Error> {
        match self {
            Shape::Point(point) => Ok(point),
            other => Err(Error::UnsupportedGeometry(format!(
                "Expected a Point, found a {}",
                other.kind()
            ))),
        }
    }
}

impl From<Point<f64>> for Shape {
    fn from(value: Point<f64>) -> Self {
        Shape::Point(value)
    }
}

impl From<Polygon<f64>> for Shape {
    fn from(value: Polygon<f64>) -> Self {
        Shape::Polygon(value)
    }
}

impl From<MultiPolygon<f64>> for Shape {
    fn from(value: MultiPolygon<f64>) -> Self {
        Shape::MultiPolygon(value)
    }
}

impl From<Shape> for Geometry<f64> {
    fn from(value: Shape) -> Self {
        match value {
            Shape::Point(point) => Geometry::Point(point),
            Shape::Polygon(polygon) => Geometry::Polygon(polygon),
            Shape::MultiPolygon(polygons) => Geometry::MultiPolygon(polygons),
        }
    }
}

impl TryFrom<Geometry<f64>> for Shape {
    type Error = Error;

    /// Rectangles and triangles are accepted as polygons. Lines and
    /// collections have no anchor rule.
    fn try_from(value: Geometry<f64>) -> Result<Self, Self::Error> {
        let shape = match value {
            Geometry::Point(point) => Shape::Point(point),
            Geometry::Polygon(polygon) => Shape::Polygon(polygon),
            Geometry::MultiPolygon(polygons) => Shape::MultiPolygon(polygons),
            Geometry::Rect(rect) => Shape::Polygon(rect.to_polygon()),
            Geometry::Triangle(triangle) => Shape::Polygon(triangle.to_polygon()),
            other => {
                let kind = match other {
                    Geometry::Line(_) => "Line",
                    Geometry::LineString(_) => "LineString",
                    Geometry::MultiPoint(_) => "MultiPoint",
                    Geometry::MultiLineString(_) => "MultiLineString",
                    _ => "GeometryCollection",
                };
                return Err(Error::UnsupportedGeometry(format!(
                    "{kind} has no anchor point rule"
                )));
            }
        };

        Ok(shape)
    }
}
