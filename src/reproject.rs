use geo::Coord;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::{
    frame::{resolve_optimal_frame, ProjectionFrame},
    shape::Shape,
    table::{GeoRow, GeoTable},
    Error,
};

/// A one-way coordinate mapping between two frames. Coordinates are always
/// `(x, y)`: longitude then latitude in geographic frames, easting then
/// northing in projected ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transformer {
    source: ProjectionFrame,
    target: ProjectionFrame,
}

impl Transformer {
    pub fn new(source: ProjectionFrame, target: ProjectionFrame) -> Self {
        Self { source, target }
    }

    pub fn source(&self) -> ProjectionFrame {
        self.source
    }

    pub fn target(&self) -> ProjectionFrame {
        self.target
    }

    /// # Errors
    ///
    /// Returns [`Error::Projection`] if the coordinate cannot be represented
    /// in the target frame.
    pub fn transform(&self, coord: Coord<f64>) -> Result<Coord<f64>, Error> {
        if self.source == self.target {
            return Ok(coord);
        }

        let geographic = self.source.to_geographic(coord)?;
        self.target.from_geographic(geographic)
    }

    /// Maps every vertex of every ring of `shape`.
    ///
    /// # Errors
    ///
    /// Propagates the first vertex that fails to transform.
    pub fn transform_shape(&self, shape: &Shape) -> Result<Shape, Error> {
        shape.try_map_coords(|c| self.transform(c))
    }

    pub fn inverse(&self) -> Transformer {
        Transformer::new(self.target, self.source)
    }
}

/// Forward (input to optimal) and inverse (optimal to input) mappings for a
/// single call. Not meant to be kept around.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransformerPair {
    pub forward: Transformer,
    pub inverse: Transformer,
}

impl TransformerPair {
    /// The locally accurate frame the forward mapping projects into.
    pub fn frame(&self) -> ProjectionFrame {
        self.forward.target()
    }
}

/// Builds the mappings between `input_frame` and the optimal frame for
/// `shape`, or `None` when the shape is already in its optimal frame.
///
/// # Errors
///
/// Returns [`Error::Projection`] if the shape has no anchor point or the
/// anchor cannot be mapped to geographic coordinates.
pub fn build_transformers(
    input_frame: ProjectionFrame,
    shape: &Shape,
) -> Result<Option<TransformerPair>, Error> {
    let anchor = shape.anchor()?;
    let geographic = input_frame.to_geographic(anchor.0)?;
    let optimal = resolve_optimal_frame(geographic.into());

    if optimal == input_frame {
        debug!(frame = %optimal, "Shape is already in its optimal frame");
        return Ok(None);
    }

    debug!(input = %input_frame, optimal = %optimal, "Built transformer pair");

    let forward = Transformer::new(input_frame, optimal);
    Ok(Some(TransformerPair {
        forward,
        inverse: forward.inverse(),
    }))
}

/// Runs planar operations on geometries in a locally accurate projected frame
/// and hands the results back in the input frame.
///
/// # Usage
///
/// ```
/// use geo::{point, Area, Polygon};
/// use trackmarks::{OptimalReprojector, Shape};
///
/// let reprojector = OptimalReprojector::default();
/// let point = Shape::from(point!(x: -84.39, y: 33.75));
///
/// // Buffer the point by a 100 m square in UTM zone 16N
/// let square = reprojector
///     .apply_in_optimal_frame(&point, |shape| {
///         let c = shape.into_point()?;
///         let ring = vec![
///             (c.x() - 50.0, c.y() - 50.0),
///             (c.x() + 50.0, c.y() - 50.0),
///             (c.x() + 50.0, c.y() + 50.0),
///             (c.x() - 50.0, c.y() + 50.0),
///         ];
///         Ok(Polygon::new(ring.into(), vec![]).into())
///     })
///     .unwrap()
///     .into_polygon()
///     .unwrap();
///
/// // Back in degrees
/// assert!(square.unsigned_area() < 1e-5);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OptimalReprojector {
    input_frame: ProjectionFrame,
}

impl OptimalReprojector {
    pub fn new(input_frame: ProjectionFrame) -> Self {
        Self { input_frame }
    }

    /// # Errors
    ///
    /// Returns [`Error::Projection`] if `identifier` does not name a known
    /// frame.
    pub fn from_identifier(identifier: &str) -> Result<Self, Error> {
        Ok(Self::new(identifier.parse()?))
    }

    pub fn input_frame(&self) -> ProjectionFrame {
        self.input_frame
    }

    /// # Errors
    ///
    /// See [`build_transformers`].
    pub fn transformers(&self, shape: &Shape) -> Result<Option<TransformerPair>, Error> {
        build_transformers(self.input_frame, shape)
    }

    /// Applies `operation` to `shape` in its optimal frame. Any extra
    /// arguments the operation needs are captured by the closure. When no
    /// reprojection is needed the operation sees the input unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Projection`] for shapes without an anchor or vertices
    /// that cannot be mapped, and propagates errors from `operation`.
    pub fn apply_in_optimal_frame<F>(&self, shape: &Shape, operation: F) -> Result<Shape, Error>
    where
        F: FnOnce(Shape) -> Result<Shape, Error>,
    {
        let Some(pair) = self.transformers(shape)? else {
            return operation(shape.clone());
        };

        let projected = pair.forward.transform_shape(shape)?;
        let result = operation(projected)?;

        debug!(
            frame = %pair.frame(),
            vertices = result.coords_count(),
            "Mapping operation result back to input frame"
        );
        pair.inverse.transform_shape(&result)
    }

    /// Applies `operation` to every row in parallel, replacing the geometry
    /// column. Row order and attributes are preserved.
    ///
    /// # Errors
    ///
    /// Returns the error of a failing row; no table is produced in that case.
    pub fn apply_table<A, F>(&self, table: GeoTable<A>, operation: F) -> Result<GeoTable<A>, Error>
    where
        A: Send,
        F: Fn(Shape) -> Result<Shape, Error> + Sync,
    {
        let rows = table
            .into_rows()
            .into_par_iter()
            .map(|row| self.apply_row(row, &operation))
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(GeoTable::new(rows))
    }

    /// Like [`OptimalReprojector::apply_table`], but failing rows are left out
    /// of the output table and returned with their original row index.
    pub fn apply_table_lossy<A, F>(
        &self,
        table: GeoTable<A>,
        operation: F,
    ) -> (GeoTable<A>, Vec<(usize, Error)>)
    where
        A: Send,
        F: Fn(Shape) -> Result<Shape, Error> + Sync,
    {
        let results: Vec<_> = table
            .into_rows()
            .into_par_iter()
            .enumerate()
            .map(|(index, row)| self.apply_row(row, &operation).map_err(|e| (index, e)))
            .collect();

        let mut rows = Vec::with_capacity(results.len());
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(row) => rows.push(row),
                Err((index, error)) => {
                    warn!(row = index, %error, "Skipping row");
                    failures.push((index, error));
                }
            }
        }

        (GeoTable::new(rows), failures)
    }

    fn apply_row<A, F>(&self, row: GeoRow<A>, operation: &F) -> Result<GeoRow<A>, Error>
    where
        F: Fn(Shape) -> Result<Shape, Error>,
    {
        let geometry = self.apply_in_optimal_frame(&row.geometry, operation)?;

        Ok(GeoRow {
            geometry,
            attributes: row.attributes,
        })
    }
}
