//! The beachline: a doubly linked sequence of parabolic arcs held in a
//! handle-keyed arena, plus the per-site index into it. An active site may
//! own several arcs when later sites have split its parabola; the owner's
//! arc list is kept in left-to-right beachline order.

use fnv::FnvHashMap;
use ordered_float::OrderedFloat;

use crate::diagram::{Diagram, SiteId};
use crate::geometry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArcId(u32);

#[derive(Debug)]
struct Arc {
    owner: SiteId,
    left: Option<ArcId>,
    right: Option<ArcId>,
}

/// A site that has entered the beachline, with the arcs it currently owns.
/// Entries are never removed, even when a site loses its last arc.
#[derive(Debug)]
pub struct ActiveSite {
    pub site: SiteId,
    arcs: Vec<ArcId>,
}

impl ActiveSite {
    pub fn arcs(&self) -> &[ArcId] {
        &self.arcs
    }
}

#[derive(Debug, Default)]
pub struct Beachline {
    arcs: FnvHashMap<ArcId, Arc>,
    next_arc: u32,
    active: Vec<ActiveSite>,
    index: FnvHashMap<SiteId, usize>,
}

impl Beachline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    pub fn active_sites(&self) -> &[ActiveSite] {
        &self.active
    }

    pub fn owner(&self, arc: ArcId) -> SiteId {
        self.arcs[&arc].owner
    }

    pub fn left(&self, arc: ArcId) -> Option<ArcId> {
        self.arcs[&arc].left
    }

    pub fn right(&self, arc: ArcId) -> Option<ArcId> {
        self.arcs[&arc].right
    }

    fn alloc(&mut self, owner: SiteId) -> ArcId {
        let id = ArcId(self.next_arc);
        self.next_arc += 1;
        self.arcs.insert(
            id,
            Arc {
                owner,
                left: None,
                right: None,
            },
        );
        id
    }

    fn active_entry(&mut self, site: SiteId) -> &mut ActiveSite {
        let slot = *self.index.entry(site).or_insert_with(|| {
            self.active.push(ActiveSite { site, arcs: vec![] });
            self.active.len() - 1
        });
        &mut self.active[slot]
    }

    /// Allocate a fresh unlinked arc for `owner`, activating the site on its
    /// first arc.
    pub fn create_arc(&mut self, owner: SiteId) -> ArcId {
        let id = self.alloc(owner);
        self.active_entry(owner).arcs.push(id);
        id
    }

    /// Chain `left` and `right` as beachline neighbors.
    pub fn link(&mut self, left: ArcId, right: ArcId) {
        self.arcs.get_mut(&left).expect("live arc").right = Some(right);
        self.arcs.get_mut(&right).expect("live arc").left = Some(left);
    }

    /// The arc sitting above `x` with the sweepline at `sweep_y`: the active
    /// site whose parabola is highest there, then — if that site owns several
    /// arcs — the leftmost of them whose right neighbor belongs to another
    /// site lying beyond `x`. Sites whose parabola degenerates (focus on the
    /// sweepline) do not compete. Returns `None` only while every active
    /// site is still on the sweepline itself.
    pub fn locate_arc(&self, x: f64, sweep_y: f64, diagram: &Diagram) -> Option<ArcId> {
        let mut best: Option<(usize, f64)> = None;
        for (slot, entry) in self.active.iter().enumerate() {
            if entry.arcs.is_empty() {
                continue;
            }
            let y = geometry::parabola_y(diagram.site_point(entry.site), sweep_y, x);
            if !y.is_finite() {
                continue;
            }
            if best.map_or(true, |(_, best_y)| y > best_y) {
                best = Some((slot, y));
            }
        }
        let entry = &self.active[best?.0];
        if entry.arcs.len() == 1 {
            return Some(entry.arcs[0]);
        }
        let mut found = None;
        for &arc in &entry.arcs {
            if let Some(right) = self.right(arc) {
                let neighbor = self.owner(right);
                if neighbor != entry.site && diagram.site_point(neighbor).x > x {
                    found = Some(arc);
                    break;
                }
            }
        }
        found.or_else(|| entry.arcs.last().copied())
    }

    /// The live arc whose owner is horizontally closest to `x`. Fallback for
    /// sites arriving while the whole beachline is degenerate.
    pub fn nearest_arc_by_x(&self, x: f64, diagram: &Diagram) -> Option<ArcId> {
        let mut best: Option<(ArcId, f64)> = None;
        for entry in &self.active {
            for &arc in &entry.arcs {
                let dx = (diagram.site_point(entry.site).x - x).abs();
                if best.map_or(true, |(_, best_dx)| dx < best_dx) {
                    best = Some((arc, dx));
                }
            }
        }
        best.map(|(arc, _)| arc)
    }

    /// Replace `target` with the triple (copy, `new_arc`, copy), both copies
    /// owned by `target`'s site. Returns the two copies.
    pub fn split_arc(
        &mut self,
        target: ArcId,
        new_arc: ArcId,
        diagram: &Diagram,
    ) -> (ArcId, ArcId) {
        let owner = self.owner(target);
        let outer_left = self.left(target);
        let outer_right = self.right(target);

        let left_copy = self.alloc(owner);
        let right_copy = self.alloc(owner);
        if let Some(left) = outer_left {
            self.link(left, left_copy);
        }
        self.link(left_copy, new_arc);
        self.link(new_arc, right_copy);
        if let Some(right) = outer_right {
            self.link(right_copy, right);
        }

        let entry = self.active_entry(owner);
        entry.arcs.retain(|&a| a != target);
        entry.arcs.push(left_copy);
        entry.arcs.push(right_copy);
        self.arcs.remove(&target);
        self.resort_owner(owner, diagram);

        (left_copy, right_copy)
    }

    /// Insert `arc` directly beside `anchor`, on the side `x` falls on.
    pub fn insert_beside(&mut self, anchor: ArcId, arc: ArcId, x: f64, diagram: &Diagram) {
        if x < diagram.site_point(self.owner(anchor)).x {
            if let Some(left) = self.left(anchor) {
                self.link(left, arc);
            }
            self.link(arc, anchor);
        } else {
            if let Some(right) = self.right(anchor) {
                self.link(arc, right);
            }
            self.link(anchor, arc);
        }
    }

    /// Unlink `arc` and drop it from its owner's set. Returns the former
    /// neighbors, now adjacent to each other.
    pub fn remove_arc(&mut self, arc: ArcId) -> (Option<ArcId>, Option<ArcId>) {
        let owner = self.owner(arc);
        let left = self.left(arc);
        let right = self.right(arc);
        if let Some(left) = left {
            self.arcs.get_mut(&left).expect("live arc").right = right;
        }
        if let Some(right) = right {
            self.arcs.get_mut(&right).expect("live arc").left = left;
        }
        self.active_entry(owner).arcs.retain(|&a| a != arc);
        self.arcs.remove(&arc);
        (left, right)
    }

    /// Re-establish left-to-right order of a site's arcs. The x of the right
    /// neighbor's site stands in for the breakpoint to the right of each
    /// arc; the rightmost arc (no right neighbor) sorts last.
    fn resort_owner(&mut self, site: SiteId, diagram: &Diagram) {
        let slot = self.index[&site];
        let mut arcs = std::mem::take(&mut self.active[slot].arcs);
        arcs.sort_by_key(|&arc| {
            OrderedFloat(match self.arcs[&arc].right {
                Some(right) => diagram.site_point(self.arcs[&right].owner).x,
                None => f64::INFINITY,
            })
        });
        self.active[slot].arcs = arcs;
    }

    /// Arcs in beachline order, leftmost first.
    pub fn sequence(&self) -> Vec<ArcId> {
        let Some(&start) = self.arcs.keys().next() else {
            return vec![];
        };
        let mut head = start;
        while let Some(left) = self.left(head) {
            head = left;
        }
        let mut order = vec![head];
        while let Some(right) = self.right(*order.last().expect("nonempty")) {
            order.push(right);
        }
        order
    }

    #[cfg(test)]
    pub(crate) fn contains_arc(&self, arc: ArcId) -> bool {
        self.arcs.contains_key(&arc)
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self, sweep_y: f64, diagram: &Diagram) {
        // link symmetry
        for (&id, arc) in &self.arcs {
            if let Some(right) = arc.right {
                assert_eq!(self.arcs[&right].left, Some(id), "broken right link");
            }
            if let Some(left) = arc.left {
                assert_eq!(self.arcs[&left].right, Some(id), "broken left link");
            }
        }
        // every owner's set holds exactly its beachline arcs
        let mut counted = 0;
        for entry in &self.active {
            for &arc in &entry.arcs {
                assert_eq!(self.arcs[&arc].owner, entry.site, "arc in wrong set");
                counted += 1;
            }
        }
        assert_eq!(counted, self.arcs.len(), "arc sets out of sync with arena");
        // the chain from the leftmost arc visits everything
        let order = self.sequence();
        assert_eq!(order.len(), self.arcs.len(), "beachline chain is split");
        // breakpoints increase left to right
        let mut previous: Option<f64> = None;
        for pair in order.windows(2) {
            let left = diagram.site_point(self.owner(pair[0]));
            let right = diagram.site_point(self.owner(pair[1]));
            if left.y == sweep_y || right.y == sweep_y {
                previous = None;
                continue;
            }
            let x = breakpoint_x(left, right, sweep_y);
            if let Some(prev) = previous {
                assert!(prev <= x + 1e-9, "breakpoints out of order: {prev} > {x}");
            }
            previous = Some(x);
        }
    }
}

/// Intersection of the parabolas of `left` and `right` that bounds the
/// `left` arc on its right. Test support only.
#[cfg(test)]
fn breakpoint_x(left: crate::geometry::Point, right: crate::geometry::Point, sweep_y: f64) -> f64 {
    if left.y == right.y {
        return (left.x + right.x) / 2.0;
    }
    let z0 = 2.0 * (left.y - sweep_y);
    let z1 = 2.0 * (right.y - sweep_y);
    let a = 1.0 / z0 - 1.0 / z1;
    let b = -2.0 * (left.x / z0 - right.x / z1);
    let c = (left.x * left.x + left.y * left.y - sweep_y * sweep_y) / z0
        - (right.x * right.x + right.y * right.y - sweep_y * sweep_y) / z1;
    (-b - (b * b - 4.0 * a * c).sqrt()) / (2.0 * a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn diagram(points: &[(f64, f64)]) -> (Diagram, Vec<SiteId>) {
        let mut d = Diagram::new();
        let ids = points
            .iter()
            .map(|&(x, y)| d.add_site(Point::new(x, y)))
            .collect();
        (d, ids)
    }

    fn owners(beach: &Beachline) -> Vec<SiteId> {
        beach.sequence().iter().map(|&a| beach.owner(a)).collect()
    }

    #[test]
    fn split_produces_a_sandwich() {
        let (d, s) = diagram(&[(0.0, 0.0), (2.0, 4.0)]);
        let mut beach = Beachline::new();
        let target = beach.create_arc(s[0]);
        let incoming = beach.create_arc(s[1]);
        let (left_copy, right_copy) = beach.split_arc(target, incoming, &d);

        assert_eq!(owners(&beach), vec![s[0], s[1], s[0]]);
        assert_eq!(beach.right(left_copy), Some(incoming));
        assert_eq!(beach.left(right_copy), Some(incoming));
        // the split owner's set is ordered left to right
        assert_eq!(beach.active_sites()[0].arcs(), &[left_copy, right_copy]);
        beach.check_invariants(4.0, &d);
    }

    #[test]
    fn remove_middle_relinks_neighbors() {
        let (d, s) = diagram(&[(0.0, 0.0), (2.0, 4.0)]);
        let mut beach = Beachline::new();
        let target = beach.create_arc(s[0]);
        let incoming = beach.create_arc(s[1]);
        let (left_copy, right_copy) = beach.split_arc(target, incoming, &d);

        let (left, right) = beach.remove_arc(incoming);
        assert_eq!((left, right), (Some(left_copy), Some(right_copy)));
        assert_eq!(beach.right(left_copy), Some(right_copy));
        assert_eq!(owners(&beach), vec![s[0], s[0]]);
        // the incoming arc's site stays active with an empty set
        assert!(beach.active_sites()[1].arcs().is_empty());
        beach.check_invariants(4.0, &d);
    }

    #[test]
    fn locate_picks_the_highest_parabola() {
        let (d, s) = diagram(&[(0.0, 2.0), (6.0, 1.0)]);
        let mut beach = Beachline::new();
        let a = beach.create_arc(s[0]);
        let b = beach.create_arc(s[1]);
        beach.link(a, b);
        // directly above x = 5.5 the parabola of the nearer (6, 1) wins
        assert_eq!(beach.locate_arc(5.5, 3.0, &d), Some(b));
        assert_eq!(beach.locate_arc(0.5, 3.0, &d), Some(a));
    }

    #[test]
    fn locate_skips_degenerate_parabolas() {
        let (d, s) = diagram(&[(0.0, 2.0), (6.0, 3.0)]);
        let mut beach = Beachline::new();
        let a = beach.create_arc(s[0]);
        let b = beach.create_arc(s[1]);
        beach.link(a, b);
        // sweep passes through (6, 3): that site cannot host the new arc
        assert_eq!(beach.locate_arc(5.9, 3.0, &d), Some(a));
    }

    #[test]
    fn locate_among_multiple_arcs_uses_right_neighbors() {
        // beachline [A, B, A] after B splits A; the sweep still sits on B,
        // so A is the only candidate and owns two arcs
        let (d, s) = diagram(&[(2.0, 0.0), (0.0, 4.0)]);
        let mut beach = Beachline::new();
        let a0 = beach.create_arc(s[0]);
        let b = beach.create_arc(s[1]);
        let (a_left, a_right) = beach.split_arc(a0, b, &d);

        // left of the breakpoint: the first arc's right neighbor is B at
        // x = 0, which lies beyond the probe
        assert_eq!(beach.locate_arc(-3.0, 4.0, &d), Some(a_left));
        // right of every right-neighbor breakpoint: rightmost arc wins
        assert_eq!(beach.locate_arc(5.0, 4.0, &d), Some(a_right));
        beach.check_invariants(4.0, &d);
    }
}
