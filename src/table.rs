use crate::shape::Shape;

/// One row of a [`GeoTable`]: a geometry column plus whatever attributes the
/// caller carries alongside it.
#[derive(Clone, Debug, PartialEq)]
pub struct GeoRow<A> {
    pub geometry: Shape,
    pub attributes: A,
}

impl<A> GeoRow<A> {
    pub fn new(geometry: impl Into<Shape>, attributes: A) -> Self {
        Self {
            geometry: geometry.into(),
            attributes,
        }
    }
}

/// An ordered table of geometries. Batch operations replace the geometry
/// column and keep row order and attributes untouched.
///
/// # Usage
///
/// ```
/// use geo::point;
/// use trackmarks::{GeoRow, GeoTable};
///
/// let table: GeoTable<&str> = vec![
///     GeoRow::new(point!(x: -84.39, y: 33.75), "ATL"),
///     GeoRow::new(point!(x: 151.2, y: -33.87), "SYD"),
/// ]
/// .into_iter()
/// .collect();
///
/// assert_eq!(table.len(), 2);
/// assert_eq!(table.rows()[1].attributes, "SYD");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct GeoTable<A> {
    rows: Vec<GeoRow<A>>,
}

impl<A> Default for GeoTable<A> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<A> GeoTable<A> {
    pub fn new(rows: Vec<GeoRow<A>>) -> Self {
        Self { rows }
    }

    pub fn push(&mut self, row: GeoRow<A>) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[GeoRow<A>] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GeoRow<A>> {
        self.rows.iter()
    }

    pub fn geometries(&self) -> impl Iterator<Item = &Shape> {
        self.rows.iter().map(|row| &row.geometry)
    }

    pub fn into_rows(self) -> Vec<GeoRow<A>> {
        self.rows
    }
}

impl<A> FromIterator<GeoRow<A>> for GeoTable<A> {
    fn from_iter<T: IntoIterator<Item = GeoRow<A>>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<A> IntoIterator for GeoTable<A> {
    type Item = GeoRow<A>;
    type IntoIter = std::vec::IntoIter<GeoRow<A>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a, A> IntoIterator for &'a GeoTable<A> {
    type Item = &'a GeoRow<A>;
    type IntoIter = std::slice::Iter<'a, GeoRow<A>>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
