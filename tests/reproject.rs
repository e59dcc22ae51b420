use std::cell::Cell;

use approx::assert_abs_diff_eq;
use geo::{point, polygon, Coord, LineString, MultiPolygon, Polygon};
use trackmarks::{
    reproject::build_transformers, Error, GeoRow, GeoTable, Hemisphere, OptimalReprojector,
    ProjectionFrame, Shape,
};

const ATLANTA: (f64, f64) = (-84.39, 33.75);

fn atlanta() -> Shape {
    Shape::from(point!(x: ATLANTA.0, y: ATLANTA.1))
}

fn utm16n() -> ProjectionFrame {
    ProjectionFrame::utm(16, Hemisphere::North).unwrap()
}

#[test]
fn forward_keeps_longitude_then_latitude() {
    let pair = build_transformers(ProjectionFrame::Wgs84, &atlanta())
        .unwrap()
        .unwrap();
    assert_eq!(pair.frame(), utm16n());

    let projected = pair.forward.transform(Coord { x: ATLANTA.0, y: ATLANTA.1 }).unwrap();
    // Swapped axes would put the point far outside zone 16
    assert!((166_000.0..834_000.0).contains(&projected.x), "easting {}", projected.x);
    assert!((3_700_000.0..3_800_000.0).contains(&projected.y), "northing {}", projected.y);

    let back = pair.inverse.transform(projected).unwrap();
    assert_abs_diff_eq!(back.x, ATLANTA.0, epsilon = 1e-9);
    assert_abs_diff_eq!(back.y, ATLANTA.1, epsilon = 1e-9);
}

#[test]
fn shapes_already_in_their_optimal_frame_are_not_transformed() {
    let projected = utm16n().from_geographic(Coord { x: ATLANTA.0, y: ATLANTA.1 }).unwrap();
    let shape = Shape::from(geo::Point::from(projected));

    let reprojector = OptimalReprojector::from_identifier("EPSG:32616").unwrap();
    assert!(reprojector.transformers(&shape).unwrap().is_none());

    let seen = Cell::new(None);
    let result = reprojector
        .apply_in_optimal_frame(&shape, |input| {
            seen.set(Some(input.clone()));
            Ok(input)
        })
        .unwrap();

    // The operation sees the input untouched, and so does the caller
    assert_eq!(seen.take(), Some(shape.clone()));
    assert_eq!(result, shape);
}

#[test]
fn projected_input_frames_anchor_through_geographic() {
    // Zone 17 coordinates of a point that belongs to zone 16
    let zone17 = ProjectionFrame::utm(17, Hemisphere::North).unwrap();
    let projected = zone17.from_geographic(Coord { x: ATLANTA.0, y: ATLANTA.1 }).unwrap();
    let shape = Shape::from(geo::Point::from(projected));

    let pair = build_transformers(zone17, &shape).unwrap().unwrap();
    assert_eq!(pair.frame(), utm16n());
    assert_eq!(pair.inverse.target(), zone17);
}

#[test]
fn operation_results_come_back_in_input_frame() {
    let reprojector = OptimalReprojector::default();
    let square = reprojector
        .apply_in_optimal_frame(&atlanta(), |shape| {
            let c = shape.into_point()?;
            Ok(Shape::from(polygon![
                (x: c.x() - 1000.0, y: c.y() - 1000.0),
                (x: c.x() + 1000.0, y: c.y() - 1000.0),
                (x: c.x() + 1000.0, y: c.y() + 1000.0),
                (x: c.x() - 1000.0, y: c.y() + 1000.0),
            ]))
        })
        .unwrap()
        .into_polygon()
        .unwrap();

    for c in &square.exterior().0 {
        assert!((c.x - ATLANTA.0).abs() < 0.02, "{c:?}");
        assert!((c.y - ATLANTA.1).abs() < 0.02, "{c:?}");
    }
}

#[test]
fn every_ring_of_a_multipolygon_is_mapped() {
    let a: Polygon<f64> = polygon![(x: -84.4, y: 33.7), (x: -84.3, y: 33.7), (x: -84.3, y: 33.8)];
    let b: Polygon<f64> = polygon![(x: -84.5, y: 33.6), (x: -84.45, y: 33.6), (x: -84.45, y: 33.65)];
    let shape = Shape::from(MultiPolygon::new(vec![a, b]));

    let pair = build_transformers(ProjectionFrame::Wgs84, &shape).unwrap().unwrap();
    let projected = pair.forward.transform_shape(&shape).unwrap();
    assert_eq!(projected.coords_count(), shape.coords_count());
    assert!(projected.coords().all(|c| c.x > 100_000.0 && c.y > 1_000_000.0));

    let back = pair.inverse.transform_shape(&projected).unwrap();
    for (original, returned) in shape.coords().zip(back.coords()) {
        assert_abs_diff_eq!(original.x, returned.x, epsilon = 1e-9);
        assert_abs_diff_eq!(original.y, returned.y, epsilon = 1e-9);
    }
}

#[test]
fn empty_geometry_is_a_projection_error() {
    let empty = Shape::from(MultiPolygon::<f64>::new(vec![]));
    let result = OptimalReprojector::default().apply_in_optimal_frame(&empty, Ok);
    assert!(matches!(result, Err(Error::Projection(_))));
}

#[test]
fn unknown_input_frames_are_projection_errors() {
    assert!(matches!(
        OptimalReprojector::from_identifier("EPSG:32661"),
        Err(Error::Projection(_))
    ));
    assert!(matches!(
        OptimalReprojector::from_identifier("not a crs"),
        Err(Error::Projection(_))
    ));
}

fn city_table() -> GeoTable<&'static str> {
    [
        ("ATL", -84.39, 33.75),
        ("SYD", 151.2, -33.87),
        ("LYR", 15.6, 78.2),
        ("ALT", 10.0, 86.0),
        ("MCM", 166.7, -77.8),
    ]
    .into_iter()
    .map(|(name, lon, lat)| GeoRow::new(point!(x: lon, y: lat), name))
    .collect()
}

#[test]
fn batch_preserves_order_and_attributes() {
    let table = city_table();
    let result = OptimalReprojector::default()
        .apply_table(table.clone(), |shape| {
            let c = shape.into_point()?;
            Ok(Shape::from(point!(x: c.x() + 10.0, y: c.y())))
        })
        .unwrap();

    assert_eq!(result.len(), table.len());
    for (before, after) in table.iter().zip(result.iter()) {
        assert_eq!(before.attributes, after.attributes);

        // A 10 m shift barely moves the point
        let b = before.geometry.anchor().unwrap();
        let a = after.geometry.anchor().unwrap();
        assert_ne!(a, b, "{}", before.attributes);
        assert!((a.x() - b.x()).abs() < 0.01, "{}", before.attributes);
        assert!((a.y() - b.y()).abs() < 1e-3, "{}", before.attributes);
    }
}

#[test]
fn batch_fails_fast_or_skips_failing_rows() {
    let mut table = city_table();
    table.push(GeoRow::new(Polygon::new(LineString::new(vec![]), vec![]), "EMPTY"));
    table.push(GeoRow::new(point!(x: 0.0, y: 0.0), "NULL ISLAND"));

    let reprojector = OptimalReprojector::default();
    assert!(reprojector.apply_table(table.clone(), Ok).is_err());

    let (kept, failures) = reprojector.apply_table_lossy(table, Ok);
    assert_eq!(kept.len(), 6);
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, 5);
    assert!(matches!(failures[0].1, Error::Projection(_)));

    let names: Vec<_> = kept.iter().map(|row| row.attributes).collect();
    assert_eq!(names, ["ATL", "SYD", "LYR", "ALT", "MCM", "NULL ISLAND"]);
}
