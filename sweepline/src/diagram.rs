//! Output side of the sweep: the site table, the growing edge list and the
//! rules for attaching vertices to edges.

use thiserror::Error;

use crate::geometry::{self, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SiteId(pub(crate) u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeId(pub(crate) u32);

/// Non-fatal oddities met during the sweep. None of these abort the build;
/// they are recorded on the builder and mirrored to the `log` facade.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Anomaly {
    #[error("candidate triple is collinear or coincident")]
    DegenerateCircle,
    #[error("vertex event at y {event_y} popped behind the sweepline at y {sweep_y}")]
    StaleVertexEvent { event_y: f64, sweep_y: f64 },
    #[error("edge {edge:?} already carries a vertex in the chosen slot")]
    DoubleVertexAssignment { edge: EdgeId },
    #[error("edge {edge:?} reached finalization with no vertices")]
    UnboundEdgeMissingBothVertices { edge: EdgeId },
}

/// One Voronoi edge: the pair of sites whose cells it separates and up to
/// two endpoints, filled in as vertex events fire. Which endpoint is
/// `first_vertex` is decided by the side of the directed line
/// `left_face -> right_face` the vertex falls on; that split is the only
/// notion of direction an edge carries.
#[derive(Debug, Clone)]
pub struct Edge {
    pub left_face: SiteId,
    pub right_face: SiteId,
    pub first_vertex: Option<Point>,
    pub last_vertex: Option<Point>,
}

impl Edge {
    fn new(left_face: SiteId, right_face: SiteId) -> Self {
        Self {
            left_face,
            right_face,
            first_vertex: None,
            last_vertex: None,
        }
    }

    /// Both endpoints assigned.
    pub fn is_complete(&self) -> bool {
        self.first_vertex.is_some() && self.last_vertex.is_some()
    }

    /// The face on the other side of the edge.
    pub fn other_face(&self, face: SiteId) -> Option<SiteId> {
        if face == self.left_face {
            Some(self.right_face)
        } else if face == self.right_face {
            Some(self.left_face)
        } else {
            None
        }
    }

    pub fn joins(&self, a: SiteId, b: SiteId) -> bool {
        (self.left_face == a && self.right_face == b)
            || (self.left_face == b && self.right_face == a)
    }
}

#[derive(Debug, Default)]
pub struct Diagram {
    sites: Vec<Point>,
    edges: Vec<Edge>,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_site(&mut self, point: Point) -> SiteId {
        self.sites.push(point);
        SiteId(self.sites.len() as u32 - 1)
    }

    pub fn site_point(&self, site: SiteId) -> Point {
        self.sites[site.0 as usize]
    }

    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    pub(crate) fn add_edge(&mut self, left_face: SiteId, right_face: SiteId) -> EdgeId {
        self.edges.push(Edge::new(left_face, right_face));
        EdgeId(self.edges.len() as u32 - 1)
    }

    /// The earliest edge bounding both faces, in insertion order.
    pub(crate) fn find_edge(&self, a: SiteId, b: SiteId) -> Option<EdgeId> {
        self.edges
            .iter()
            .position(|e| e.joins(a, b))
            .map(|i| EdgeId(i as u32))
    }

    pub fn edge(&self, edge: EdgeId) -> &Edge {
        &self.edges[edge.0 as usize]
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Attach `vertex` to one end of `edge`: the `first_vertex` slot when the
    /// vertex lies on the positive side of `left_face -> right_face`, the
    /// `last_vertex` slot otherwise. At most two vertices ever belong to an
    /// edge; a write into an occupied slot is dropped and reported.
    pub(crate) fn assign_vertex(&mut self, edge: EdgeId, vertex: Point) -> Result<(), Anomaly> {
        let e = &mut self.edges[edge.0 as usize];
        let left = self.sites[e.left_face.0 as usize];
        let right = self.sites[e.right_face.0 as usize];
        let slot = if geometry::signed_distance(left, right, vertex) > 0.0 {
            &mut e.first_vertex
        } else {
            &mut e.last_vertex
        };
        if slot.is_some() {
            return Err(Anomaly::DoubleVertexAssignment { edge });
        }
        *slot = Some(vertex);
        Ok(())
    }

    pub(crate) fn set_first_vertex(&mut self, edge: EdgeId, vertex: Point) {
        self.edges[edge.0 as usize].first_vertex = Some(vertex);
    }

    pub(crate) fn set_last_vertex(&mut self, edge: EdgeId, vertex: Point) {
        self.edges[edge.0 as usize].last_vertex = Some(vertex);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_site_diagram() -> (Diagram, SiteId, SiteId, EdgeId) {
        let mut d = Diagram::new();
        let a = d.add_site(Point::new(0.0, 0.0));
        let b = d.add_site(Point::new(4.0, 0.0));
        let e = d.add_edge(a, b);
        (d, a, b, e)
    }

    #[test]
    fn vertex_slots_split_by_side() {
        let (mut d, ..) = two_site_diagram();
        let e = EdgeId(0);
        // below the +x directed line is the positive side
        d.assign_vertex(e, Point::new(2.0, -1.0)).unwrap();
        assert!(d.edge(e).first_vertex.is_some());
        assert!(d.edge(e).last_vertex.is_none());
        d.assign_vertex(e, Point::new(2.0, 3.0)).unwrap();
        assert!(d.edge(e).is_complete());
    }

    #[test]
    fn third_write_is_dropped() {
        let (mut d, ..) = two_site_diagram();
        let e = EdgeId(0);
        d.assign_vertex(e, Point::new(2.0, -1.0)).unwrap();
        let err = d.assign_vertex(e, Point::new(2.0, -2.0)).unwrap_err();
        assert_eq!(err, Anomaly::DoubleVertexAssignment { edge: e });
        // the original endpoint survives
        assert_eq!(d.edge(e).first_vertex, Some(Point::new(2.0, -1.0)));
    }

    #[test]
    fn find_edge_ignores_face_order() {
        let (d, a, b, e) = two_site_diagram();
        assert_eq!(d.find_edge(a, b), Some(e));
        assert_eq!(d.find_edge(b, a), Some(e));
        assert_eq!(d.edge(e).other_face(a), Some(b));
    }
}
