#![warn(clippy::all)]
#![forbid(unsafe_code)]
//! Planar Voronoi diagrams by plane sweep.
//!
//! The sweepline rises through the site set, maintaining the beachline of
//! parabolic arcs, and emits one [`diagram::Edge`] for every pair of sites
//! whose cells touch. Edges carry their two bounding sites ("faces") and up
//! to two endpoints; rays that never gain a second endpoint are extended to
//! a far-x envelope during finalization.
//!
//! ```rust
//! use sweepline::geometry::Point;
//!
//! let sites = [Point::new(0.0, 0.0), Point::new(4.0, 0.0), Point::new(2.0, 4.0)];
//! let diagram = sweepline::build_diagram(&sites);
//! assert_eq!(diagram.edges().len(), 3);
//! ```

pub mod beachline;
pub mod diagram;
pub mod geometry;
mod queue;
#[cfg(test)]
mod test_utils;

use log::{debug, trace, warn};

use beachline::{ArcId, Beachline};
use diagram::{Anomaly, Diagram, EdgeId, SiteId};
use geometry::Point;
use queue::{EventQueue, PoppedEvent, VertexEvent};

/// Build knobs. The far-x envelope bounds are the only tunable: unbounded
/// edges are cut off at `x = -far_x` and `x = far_x`.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub far_x: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self { far_x: 100.0 }
    }
}

/// What a single [`DiagramBuilder::step`] consumed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    /// A site entered the beachline.
    Site(SiteId),
    /// Three arcs converged; the diagram gained this vertex.
    Vertex(Point),
    /// A vertex event had fallen behind the sweepline and was discarded.
    Stale,
    /// The queue is drained.
    Done,
}

/// Convenience wrapper: sweep the whole site set and finalize.
pub fn build_diagram(points: &[Point]) -> Diagram {
    let mut builder = DiagramBuilder::new(points);
    builder.compute();
    builder.into_diagram()
}

/// The sweep itself: event queue, beachline and the diagram under
/// construction. Drive it event by event with [`step`](Self::step) or run it
/// to completion with [`compute`](Self::compute).
pub struct DiagramBuilder {
    diagram: Diagram,
    beachline: Beachline,
    queue: EventQueue,
    sweep_y: f64,
    anomalies: Vec<Anomaly>,
    config: Config,
}

impl DiagramBuilder {
    pub fn new(points: &[Point]) -> Self {
        Self::with_config(points, Config::default())
    }

    pub fn with_config(points: &[Point], config: Config) -> Self {
        let mut diagram = Diagram::new();
        let mut queue = EventQueue::new();
        queue.push_sites(points.iter().map(|&p| (diagram.add_site(p), p)));
        let mut builder = Self {
            diagram,
            beachline: Beachline::new(),
            queue,
            sweep_y: f64::NEG_INFINITY,
            anomalies: Vec::new(),
            config,
        };
        builder.bootstrap();
        builder
    }

    /// Seed the beachline from the first two sites in sweep order. In the
    /// regular case the first site contributes two arcs around the second
    /// site's single arc. When both share a height neither parabola exists
    /// yet, so each site contributes one arc, ordered by x.
    fn bootstrap(&mut self) {
        let Some(PoppedEvent::Site(first)) = self.queue.pop() else {
            return;
        };
        self.sweep_y = self.diagram.site_point(first).y;
        let Some(PoppedEvent::Site(second)) = self.queue.pop() else {
            self.beachline.create_arc(first);
            return;
        };
        let first_point = self.diagram.site_point(first);
        let second_point = self.diagram.site_point(second);
        self.sweep_y = second_point.y;
        if first_point.y == second_point.y {
            let (left, right) = if first_point.x < second_point.x {
                (first, second)
            } else {
                (second, first)
            };
            let left_arc = self.beachline.create_arc(left);
            let right_arc = self.beachline.create_arc(right);
            self.beachline.link(left_arc, right_arc);
            self.diagram.add_edge(left, right);
        } else {
            let left_arc = self.beachline.create_arc(first);
            let middle_arc = self.beachline.create_arc(second);
            let right_arc = self.beachline.create_arc(first);
            self.beachline.link(left_arc, middle_arc);
            self.beachline.link(middle_arc, right_arc);
            self.diagram.add_edge(first, second);
        }
        trace!("bootstrapped beachline from two lowest sites");
    }

    /// Consume the next event. Returns what was processed; `Done` once the
    /// queue is empty.
    pub fn step(&mut self) -> StepOutcome {
        match self.queue.pop() {
            None => StepOutcome::Done,
            Some(PoppedEvent::Site(site)) => {
                self.sweep_y = self.diagram.site_point(site).y;
                trace!("site event {:?} at {:?}", site, self.diagram.site_point(site));
                self.handle_site_event(site);
                trace!("beachline now {}", self.beachline_summary());
                StepOutcome::Site(site)
            }
            Some(PoppedEvent::Vertex(event)) => {
                if event.event_point.y < self.sweep_y {
                    self.record(Anomaly::StaleVertexEvent {
                        event_y: event.event_point.y,
                        sweep_y: self.sweep_y,
                    });
                    return StepOutcome::Stale;
                }
                self.sweep_y = event.event_point.y;
                trace!("vertex event at {:?}", event.vertex_point);
                let vertex = event.vertex_point;
                self.handle_vertex_event(event);
                trace!("beachline now {}", self.beachline_summary());
                StepOutcome::Vertex(vertex)
            }
        }
    }

    /// Run the sweep to completion and extend the unbounded edges.
    pub fn compute(&mut self) {
        while self.step() != StepOutcome::Done {}
        self.finalize();
    }

    fn handle_site_event(&mut self, site: SiteId) {
        let point = self.diagram.site_point(site);
        let Some(target) = self.beachline.locate_arc(point.x, self.sweep_y, &self.diagram) else {
            // every active site still sits on the sweepline; the beachline is
            // a row of degenerate arcs, so the new one slots in by x
            let anchor = self.beachline.nearest_arc_by_x(point.x, &self.diagram);
            let new_arc = self.beachline.create_arc(site);
            if let Some(anchor) = anchor {
                let owner = self.beachline.owner(anchor);
                self.beachline.insert_beside(anchor, new_arc, point.x, &self.diagram);
                self.diagram.add_edge(site, owner);
            }
            return;
        };
        let owner = self.beachline.owner(target);
        let new_arc = self.beachline.create_arc(site);
        self.beachline.split_arc(target, new_arc, &self.diagram);
        self.diagram.add_edge(site, owner);

        let dropped = self.queue.remove_events_referencing(target);
        if dropped > 0 {
            debug!("split invalidated {dropped} vertex events");
        }

        let left = self.beachline.left(new_arc);
        let right = self.beachline.right(new_arc);
        let candidates = [
            left,
            left.and_then(|arc| self.beachline.left(arc)),
            right,
            right.and_then(|arc| self.beachline.right(arc)),
        ];
        for candidate in candidates.into_iter().flatten() {
            self.try_vertex_event(candidate);
        }
    }

    fn handle_vertex_event(&mut self, event: VertexEvent) {
        let VertexEvent {
            left,
            middle,
            right,
            vertex_point,
            ..
        } = event;
        let left_owner = self.beachline.owner(left);
        let middle_owner = self.beachline.owner(middle);
        let right_owner = self.beachline.owner(right);

        self.beachline.remove_arc(middle);
        let dropped = self.queue.remove_events_referencing(middle);
        if dropped > 0 {
            debug!("collapse invalidated {dropped} vertex events");
        }

        let edge = self.diagram.add_edge(left_owner, right_owner);
        self.assign_vertex(edge, vertex_point);
        // both boundary edges were created when their arc adjacencies formed
        for (a, b) in [(left_owner, middle_owner), (middle_owner, right_owner)] {
            let existing = self
                .diagram
                .find_edge(a, b)
                .expect("edge exists between adjacent arcs' faces");
            self.assign_vertex(existing, vertex_point);
        }

        // the outer neighbors are adjacent now; look for new convergences,
        // but never rebuild the triple whose circle was just consumed
        let repeats_left = self
            .beachline
            .left(left)
            .map(|arc| self.beachline.owner(arc) == middle_owner)
            .unwrap_or(false);
        if !repeats_left {
            self.try_vertex_event(left);
        }
        let repeats_right = self
            .beachline
            .right(right)
            .map(|arc| self.beachline.owner(arc) == middle_owner)
            .unwrap_or(false);
        if !repeats_right {
            self.try_vertex_event(right);
        }
    }

    /// Queue a vertex event for `middle` if its triple can converge: three
    /// distinct sites, a finite circumcircle whose bottom has not been passed,
    /// and breakpoints that actually move toward the center.
    fn try_vertex_event(&mut self, middle: ArcId) {
        let (Some(left), Some(right)) = (self.beachline.left(middle), self.beachline.right(middle))
        else {
            return;
        };
        let left_site = self.beachline.owner(left);
        let middle_site = self.beachline.owner(middle);
        let right_site = self.beachline.owner(right);
        if left_site == middle_site || middle_site == right_site || left_site == right_site {
            return;
        }
        let left_point = self.diagram.site_point(left_site);
        let middle_point = self.diagram.site_point(middle_site);
        let right_point = self.diagram.site_point(right_site);
        if left_point.x > right_point.x {
            return;
        }
        let (center, radius) = geometry::circumcircle(left_point, middle_point, right_point);
        if !center.is_finite() {
            self.record(Anomaly::DegenerateCircle);
            return;
        }
        let event_y = center.y + radius;
        if event_y < self.sweep_y {
            return;
        }
        if !breakpoints_converge(left_point, middle_point, right_point, center.x) {
            return;
        }
        trace!("queueing vertex event for {middle:?} at y {event_y}");
        self.queue.push_vertex_event(VertexEvent {
            left,
            middle,
            right,
            event_point: Point::new(center.x, event_y),
            vertex_point: center,
        });
    }

    fn assign_vertex(&mut self, edge: EdgeId, vertex: Point) {
        if let Err(anomaly) = self.diagram.assign_vertex(edge, vertex) {
            self.record(anomaly);
        }
    }

    /// Extend every edge that is still missing an endpoint out to the far-x
    /// envelope, following the perpendicular bisector of its faces. The side
    /// is chosen away from the endpoint already present, or by default
    /// leftward for an edge with no endpoints at all. Running this on a
    /// finished diagram changes nothing.
    pub fn finalize(&mut self) {
        let far_x = self.config.far_x;
        for index in 0..self.diagram.edges().len() {
            let edge_id = EdgeId(index as u32);
            let (left_face, right_face) = {
                let edge = self.diagram.edge(edge_id);
                (edge.left_face, edge.right_face)
            };
            let missing_both = {
                let edge = self.diagram.edge(edge_id);
                edge.first_vertex.is_none() && edge.last_vertex.is_none()
            };
            if missing_both {
                self.record(Anomaly::UnboundEdgeMissingBothVertices { edge: edge_id });
            }
            let left = self.diagram.site_point(left_face);
            let right = self.diagram.site_point(right_face);
            let mid = geometry::midpoint(left, right);

            if self.diagram.edge(edge_id).first_vertex.is_none() {
                let beyond_last = self
                    .diagram
                    .edge(edge_id)
                    .last_vertex
                    .is_some_and(|v| mid.x > v.x);
                let x = if beyond_last { far_x } else { -far_x };
                let vertex = Point::new(x, geometry::bisector_y(left, right, x));
                self.diagram.set_first_vertex(edge_id, vertex);
                debug!("extended first vertex of {edge_id:?} to {vertex:?}");
            }
            if self.diagram.edge(edge_id).last_vertex.is_none() {
                if let Some(first) = self.diagram.edge(edge_id).first_vertex {
                    let x = if mid.x > first.x { far_x } else { -far_x };
                    let vertex = Point::new(x, geometry::bisector_y(left, right, x));
                    self.diagram.set_last_vertex(edge_id, vertex);
                    debug!("extended last vertex of {edge_id:?} to {vertex:?}");
                }
            }
        }
    }

    fn record(&mut self, anomaly: Anomaly) {
        warn!("{anomaly}");
        self.anomalies.push(anomaly);
    }

    fn beachline_summary(&self) -> String {
        let owners: Vec<String> = self
            .beachline
            .sequence()
            .iter()
            .map(|&arc| format!("{:?}", self.diagram.site_point(self.beachline.owner(arc))))
            .collect();
        owners.join(" | ")
    }

    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    pub fn into_diagram(self) -> Diagram {
        self.diagram
    }

    pub fn edges(&self) -> &[diagram::Edge] {
        self.diagram.edges()
    }

    pub fn active_sites(&self) -> &[beachline::ActiveSite] {
        self.beachline.active_sites()
    }

    pub fn sweep_y(&self) -> f64 {
        self.sweep_y
    }

    pub fn anomalies(&self) -> &[Anomaly] {
        &self.anomalies
    }
}

/// Do the breakpoints on either side of the middle site move toward
/// `center_x` as the sweep proceeds? Each breakpoint drifts toward the x of
/// whichever focus sits lower; a triple whose breakpoints drift apart never
/// collapses even though its circumcircle exists.
fn breakpoints_converge(left: Point, middle: Point, right: Point, center_x: f64) -> bool {
    let left_moving_right = left.y > middle.y;
    let right_moving_right = middle.y > right.y;
    let left_x = if left_moving_right { left.x } else { middle.x };
    let right_x = if right_moving_right { middle.x } else { right.x };
    ((left_moving_right && left_x <= center_x) || (!left_moving_right && left_x >= center_x))
        && ((right_moving_right && right_x <= center_x)
            || (!right_moving_right && right_x >= center_x))
}
