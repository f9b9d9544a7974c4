//! The event queue: two ordered sequences, one of site events and one of
//! vertex events, merged at pop time. Events drain bottom-up: lowest y
//! first, ties by lowest x, and a site event beats a vertex event at the
//! same height. Vertex events are removed by identity, never by value,
//! because invalidation happens while the event is still queued.

use std::cmp::Reverse;

use fnv::FnvHashMap;
use ordered_float::OrderedFloat;
use priority_queue::PriorityQueue;

use crate::beachline::ArcId;
use crate::diagram::SiteId;
use crate::geometry::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexEventId(u32);

/// Three adjacent arcs whose breakpoints converge: when the sweepline
/// reaches `event_point.y` the middle arc has shrunk to nothing and the
/// diagram gains a vertex at `vertex_point`, the circumcenter of the three
/// owning sites.
#[derive(Debug, Clone)]
pub struct VertexEvent {
    pub left: ArcId,
    pub middle: ArcId,
    pub right: ArcId,
    pub event_point: Point,
    pub vertex_point: Point,
}

impl VertexEvent {
    pub fn references(&self, arc: ArcId) -> bool {
        self.left == arc || self.middle == arc || self.right == arc
    }
}

#[derive(Debug)]
pub enum PoppedEvent {
    Site(SiteId),
    Vertex(VertexEvent),
}

// max-queue over Reverse == min-queue over (y, x)
type EventKey = Reverse<(OrderedFloat<f64>, OrderedFloat<f64>)>;

fn event_key(point: Point) -> EventKey {
    Reverse((OrderedFloat(point.y), OrderedFloat(point.x)))
}

#[derive(Default)]
pub struct EventQueue {
    sites: PriorityQueue<SiteId, EventKey>,
    vertex_events: PriorityQueue<VertexEventId, EventKey>,
    pending: FnvHashMap<VertexEventId, VertexEvent>,
    next_id: u32,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the site sequence with the given sites.
    pub fn push_sites(&mut self, sites: impl IntoIterator<Item = (SiteId, Point)>) {
        self.sites.clear();
        for (site, point) in sites {
            self.sites.push(site, event_key(point));
        }
    }

    pub fn push_vertex_event(&mut self, event: VertexEvent) -> VertexEventId {
        let id = VertexEventId(self.next_id);
        self.next_id += 1;
        self.vertex_events.push(id, event_key(event.event_point));
        self.pending.insert(id, event);
        id
    }

    /// Drop every queued vertex event whose triple contains `arc`. Returns
    /// how many were removed.
    pub fn remove_events_referencing(&mut self, arc: ArcId) -> usize {
        let doomed: Vec<VertexEventId> = self
            .pending
            .iter()
            .filter(|(_, event)| event.references(arc))
            .map(|(&id, _)| id)
            .collect();
        for id in &doomed {
            self.vertex_events.remove(id);
            self.pending.remove(id);
        }
        doomed.len()
    }

    /// Take the next event in sweep order. A vertex event is preferred only
    /// when it is strictly below the next site.
    pub fn pop(&mut self) -> Option<PoppedEvent> {
        let site_y = self.sites.peek().map(|(_, &Reverse((y, _)))| y);
        let vertex_y = self
            .vertex_events
            .peek()
            .map(|(_, &Reverse((y, _)))| y);
        let take_vertex = match (site_y, vertex_y) {
            (None, None) => return None,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (Some(sy), Some(vy)) => vy < sy,
        };
        if take_vertex {
            let (id, _) = self.vertex_events.pop().expect("peeked vertex event");
            let event = self.pending.remove(&id).expect("pending vertex event");
            Some(PoppedEvent::Vertex(event))
        } else {
            let (site, _) = self.sites.pop().expect("peeked site event");
            Some(PoppedEvent::Site(site))
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty() && self.vertex_events.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn pending_vertex_events(&self) -> impl Iterator<Item = &VertexEvent> {
        self.pending.values()
    }
}
