/// Player traversal state machine.
///
/// ## States
///
///   - `OnBoundary { edge }`: bound to edge `edge` of the active outline.
///     Motion is locked to that edge's axis.
///   - `Incursing { path }`: free two-axis motion inside the field.
///     `path[0]` is the outline point the incursion left from.
///
/// ## Transitions
///
///   OnBoundary --start intent-->      Incursing   (`path = [pos]`)
///   Incursing  --touches an edge-->   OnBoundary  (via the resolver)
///   Incursing  --discarded-->         OnBoundary  (back at `path[0]`)
///
/// Corner handling is shared with boundary-bound enemies; the only
/// difference is the `CornerPolicy` passed in.

use log::debug;

use super::boundary::{Boundary, Field};
use super::geometry::{self, Axis, Point, Segment};

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Traversal {
    OnBoundary { edge: usize },
    Incursing { path: Vec<Point> },
}

/// What happens to velocity after turning a corner.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CornerPolicy {
    /// Velocity drops to zero (player).
    Stop,
    /// Velocity becomes a unit step along the new edge, away from the corner.
    Continue,
}

/// Result of one boundary-bound movement step.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Slide {
    pub pos: Point,
    pub edge: usize,
    pub vel: Point,
    pub turned: bool,
}

// ══════════════════════════════════════════════════════════════
// Boundary-bound movement
// ══════════════════════════════════════════════════════════════

/// Advance `pos` along edge `edge` by `vel * step`, on that edge's axis only.
///
/// Leaving the edge's span clamps onto its endpoint; arriving at the endpoint
/// in the direction of travel runs corner handling.
pub fn slide(
    boundary: &Boundary,
    edge: usize,
    pos: Point,
    vel: Point,
    step: i32,
    policy: CornerPolicy,
) -> Slide {
    let unchanged = Slide { pos, edge, vel, turned: false };
    if boundary.len() < 2 {
        return unchanged;
    }
    let seg = boundary.edge(edge);
    let axis = match seg.axis() {
        Some(a) => a,
        None => return unchanged,
    };

    let (delta, mut next) = match axis {
        Axis::Horizontal => (vel.x.signum(), Point::new(pos.x + vel.x.signum() * step, seg.a.y)),
        Axis::Vertical => (vel.y.signum(), Point::new(seg.a.x, pos.y + vel.y.signum() * step)),
    };
    if delta == 0 {
        return unchanged;
    }

    if !geometry::point_on_segment(next, seg) {
        next = geometry::nearest_on_segment(seg, next);
    }

    let heading = match axis {
        Axis::Horizontal => Point::new(delta, 0),
        Axis::Vertical => Point::new(0, delta),
    };
    match corner_transition(boundary, edge, next, heading, policy) {
        Some((new_edge, new_vel)) => Slide { pos: next, edge: new_edge, vel: new_vel, turned: true },
        None => Slide { pos: next, edge, vel, turned: false },
    }
}

/// Corner handling at the current position.
///
/// Fires only when `pos` is the endpoint of edge `edge` that `heading`
/// points toward: the end vertex leads to the next edge, the start vertex
/// to the previous one. Returns the new edge and velocity.
pub fn corner_transition(
    boundary: &Boundary,
    edge: usize,
    pos: Point,
    heading: Point,
    policy: CornerPolicy,
) -> Option<(usize, Point)> {
    let seg = boundary.edge(edge);
    let forward = seg.direction();
    if heading.is_zero() || seg.a == seg.b {
        return None;
    }

    let (new_edge, away) = if pos == seg.b && heading == forward {
        let e = boundary.next_edge(edge);
        (e, boundary.edge(e).direction())
    } else if pos == seg.a && heading == Point::new(-forward.x, -forward.y) {
        let e = boundary.prev_edge(edge);
        (e, boundary.edge(e).reversed().direction())
    } else {
        return None;
    };

    let vel = match policy {
        CornerPolicy::Stop => Point::ZERO,
        CornerPolicy::Continue => away,
    };
    debug!("corner at ({}, {}): edge {} -> {}", pos.x, pos.y, edge, new_edge);
    Some((new_edge, vel))
}

/// At a vertex, pick the incident edge along which `dir` actually leads.
/// Anywhere else the edge is kept.
pub fn steer(boundary: &Boundary, edge: usize, pos: Point, dir: Point) -> usize {
    if dir.is_zero() || boundary.len() < 2 {
        return edge;
    }
    let seg = boundary.edge(edge);
    let other = if pos == seg.b {
        boundary.next_edge(edge)
    } else if pos == seg.a {
        boundary.prev_edge(edge)
    } else {
        return edge;
    };

    let probe = pos.offset(dir.x, dir.y);
    if geometry::point_on_segment(probe, seg) {
        edge
    } else if geometry::point_on_segment(probe, boundary.edge(other)) {
        other
    } else {
        edge
    }
}

// ══════════════════════════════════════════════════════════════
// Incursion movement
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IncursionStep {
    /// Still inside; `path` may have grown.
    Moving,
    /// The last point touches edge `edge` of the active outline.
    Touched { edge: usize },
}

/// Move freely by `vel * step`, clamp to the field, extend the path, and
/// test the new position against every edge of the active outline.
///
/// A move that reaches or crosses an outline edge stops on the first point
/// of contact, so walls off the step grid are still struck. The path may
/// not cross itself: a move onto an earlier path point is refused. With
/// `confine` set, so is a move whose target lies outside the outline.
/// Touching `path[0]` never ends the incursion.
pub fn advance_incursion(
    field: &Field,
    boundary: &Boundary,
    path: &mut Vec<Point>,
    pos: &mut Point,
    vel: Point,
    step: i32,
    confine: bool,
) -> IncursionStep {
    let target = stop_point(boundary, *pos, field.clamp(pos.offset(vel.x * step, vel.y * step)));
    let crosses_path = target != *pos && path.contains(&target);
    if !crosses_path && (!confine || boundary.contains(target)) {
        *pos = target;
    }

    if path.last() != Some(pos) {
        path.push(*pos);
    }

    let start = match path.first() {
        Some(&p) => p,
        None => return IncursionStep::Moving,
    };
    if *pos == start {
        return IncursionStep::Moving;
    }
    match boundary.edge_at(*pos) {
        Some(edge) => IncursionStep::Touched { edge },
        None => IncursionStep::Moving,
    }
}

/// Nearest outline point met on the way from `from` to `to`, other than
/// `from` itself; `to` when nothing is in between.
fn stop_point(boundary: &Boundary, from: Point, to: Point) -> Point {
    if from == to {
        return to;
    }
    let travel = Segment::new(from, to);
    boundary
        .edges()
        .filter_map(|e| geometry::first_contact(travel, e))
        .filter(|&p| p != from)
        .min_by_key(|p| p.dist2(from))
        .unwrap_or(to)
}
