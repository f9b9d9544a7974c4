use approx::relative_eq;
use itertools::Itertools;

use crate::diagram::{Diagram, Edge};
use crate::geometry::{self, Point};

/// Is there an edge whose two faces sit at these coordinates?
pub fn edge_between(diagram: &Diagram, a: (f64, f64), b: (f64, f64)) -> bool {
    diagram.edges().iter().any(|edge| {
        let left = diagram.site_point(edge.left_face);
        let right = diagram.site_point(edge.right_face);
        (same_point(left, a) && same_point(right, b))
            || (same_point(left, b) && same_point(right, a))
    })
}

fn same_point(point: Point, raw: (f64, f64)) -> bool {
    relative_eq!(point.x, raw.0) && relative_eq!(point.y, raw.1)
}

/// Distinct interior vertices of a finalized diagram: endpoints that are
/// finite and not on the far-x envelope, deduplicated and sorted.
pub fn finite_vertices(diagram: &Diagram) -> Vec<(f64, f64)> {
    diagram
        .edges()
        .iter()
        .flat_map(|edge| [edge.first_vertex, edge.last_vertex])
        .flatten()
        .filter(|v| v.is_finite() && v.x.abs() != 100.0)
        .map(|v| ((v.x * 1e9).round() / 1e9, (v.y * 1e9).round() / 1e9))
        .unique_by(|&(x, y)| (x.to_bits(), y.to_bits()))
        .sorted_by(|a, b| a.partial_cmp(b).expect("finite coordinates"))
        .collect()
}

/// Both endpoints of a finalized edge, for tests that expect them present.
pub fn envelope_endpoints(edge: &Edge) -> (Point, Point) {
    (
        edge.first_vertex.expect("finalized edge"),
        edge.last_vertex.expect("finalized edge"),
    )
}

/// Assert that each endpoint of `edge` either lies on the perpendicular
/// bisector of its two faces (equidistant from both) or sits on the far-x
/// envelope.
pub fn on_bisector_of_faces(diagram: &Diagram, edge: &Edge) {
    let left = diagram.site_point(edge.left_face);
    let right = diagram.site_point(edge.right_face);
    for vertex in [edge.first_vertex, edge.last_vertex].into_iter().flatten() {
        if vertex.x.abs() == 100.0 || !vertex.is_finite() {
            continue;
        }
        let to_left = geometry::distance(vertex, left);
        let to_right = geometry::distance(vertex, right);
        assert!(
            relative_eq!(to_left, to_right, max_relative = 1e-6),
            "endpoint {vertex:?} of edge between {left:?} and {right:?} is off the bisector"
        );
    }
}
