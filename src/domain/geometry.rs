/// Integer plane geometry for axis-aligned territory.
///
/// Everything here is a pure function over `Point` values.
/// Coordinates follow screen convention: `y` grows downward.

use serde::Deserialize;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    pub fn is_zero(self) -> bool {
        self == Point::ZERO
    }

    /// Squared euclidean distance (no sqrt, no float).
    pub fn dist2(self, other: Point) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Point::new(x, y)
    }
}

/// Orientation of a segment. Boundary edges are always one of the first two.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Axis {
    Horizontal,
    Vertical,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Segment {
    pub a: Point,
    pub b: Point,
}

impl Segment {
    pub const fn new(a: Point, b: Point) -> Self {
        Segment { a, b }
    }

    /// `None` for diagonal or zero-length segments.
    pub fn axis(&self) -> Option<Axis> {
        if self.a == self.b {
            None
        } else if self.a.y == self.b.y {
            Some(Axis::Horizontal)
        } else if self.a.x == self.b.x {
            Some(Axis::Vertical)
        } else {
            None
        }
    }

    /// Unit step pointing from `a` toward `b` (axis-aligned segments only).
    pub fn direction(&self) -> Point {
        Point::new((self.b.x - self.a.x).signum(), (self.b.y - self.a.y).signum())
    }

    pub fn reversed(&self) -> Segment {
        Segment::new(self.b, self.a)
    }
}

// ══════════════════════════════════════════════════════════════
// Point / segment predicates
// ══════════════════════════════════════════════════════════════

/// Is `p` on the axis-aligned segment `seg` (endpoints inclusive)?
///
/// Only horizontal and vertical segments are recognised. A point that is
/// collinear with a diagonal segment still answers `false`.
pub fn point_on_segment(p: Point, seg: Segment) -> bool {
    let (a, b) = (seg.a, seg.b);
    if p.x == a.x && p.x == b.x {
        p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
    } else if p.y == a.y && p.y == b.y {
        p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x)
    } else {
        false
    }
}

fn orient(a: Point, b: Point, c: Point) -> i64 {
    let v = (b.x - a.x) as i64 * (c.y - a.y) as i64 - (b.y - a.y) as i64 * (c.x - a.x) as i64;
    v.signum()
}

fn within_box(a: Point, b: Point, p: Point) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Do two segments share at least one point? Touching endpoints and
/// collinear overlap both count.
pub fn segments_intersect(s: Segment, t: Segment) -> bool {
    let o1 = orient(s.a, s.b, t.a);
    let o2 = orient(s.a, s.b, t.b);
    let o3 = orient(t.a, t.b, s.a);
    let o4 = orient(t.a, t.b, s.b);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    (o1 == 0 && within_box(s.a, s.b, t.a))
        || (o2 == 0 && within_box(s.a, s.b, t.b))
        || (o3 == 0 && within_box(t.a, t.b, s.a))
        || (o4 == 0 && within_box(t.a, t.b, s.b))
}

/// First point shared with `t` when travelling along `s` from `s.a` to
/// `s.b`. Both segments must be axis-aligned.
pub fn first_contact(s: Segment, t: Segment) -> Option<Point> {
    if !segments_intersect(s, t) {
        return None;
    }
    let dir = s.direction();
    let hit = match (s.axis()?, t.axis()?) {
        (Axis::Horizontal, Axis::Vertical) => Point::new(t.a.x, s.a.y),
        (Axis::Vertical, Axis::Horizontal) => Point::new(s.a.x, t.a.y),
        // collinear overlap: the nearer end of the shared stretch
        (Axis::Horizontal, Axis::Horizontal) => {
            let x = if dir.x > 0 { s.a.x.max(t.a.x.min(t.b.x)) } else { s.a.x.min(t.a.x.max(t.b.x)) };
            Point::new(x, s.a.y)
        }
        (Axis::Vertical, Axis::Vertical) => {
            let y = if dir.y > 0 { s.a.y.max(t.a.y.min(t.b.y)) } else { s.a.y.min(t.a.y.max(t.b.y)) };
            Point::new(s.a.x, y)
        }
    };
    Some(hit)
}

/// Closest point of an axis-aligned segment to `p`.
pub fn nearest_on_segment(seg: Segment, p: Point) -> Point {
    Point::new(
        p.x.clamp(seg.a.x.min(seg.b.x), seg.a.x.max(seg.b.x)),
        p.y.clamp(seg.a.y.min(seg.b.y), seg.a.y.max(seg.b.y)),
    )
}

// ══════════════════════════════════════════════════════════════
// Polygon helpers (closed loops, last vertex joins the first)
// ══════════════════════════════════════════════════════════════

/// Twice the signed shoelace area. Positive = clockwise on screen.
pub fn signed_area2(points: &[Point]) -> i64 {
    let n = points.len();
    if n < 3 {
        return 0;
    }
    let mut acc = 0i64;
    for i in 0..n {
        let p = points[i];
        let q = points[(i + 1) % n];
        acc += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    acc
}

/// Unsigned area in whole square units.
pub fn polygon_area(points: &[Point]) -> i64 {
    signed_area2(points).abs() / 2
}

/// Boundary-inclusive point-in-polygon (crossing number).
pub fn contains_point(points: &[Point], p: Point) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        if point_on_segment(p, Segment::new(a, b)) {
            return true;
        }
        if (a.y > p.y) != (b.y > p.y) {
            // x of the edge at height p.y, compared without division
            let lhs = (p.x - a.x) as i64 * (b.y - a.y) as i64;
            let rhs = (b.x - a.x) as i64 * (p.y - a.y) as i64;
            let crosses = if b.y > a.y { lhs < rhs } else { lhs > rhs };
            if crosses {
                inside = !inside;
            }
        }
    }
    inside
}

/// Drop repeated vertices and the middle vertex of collinear runs.
/// The loop is treated as closed.
pub fn simplify_loop(points: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for &p in points {
        if out.last() != Some(&p) {
            out.push(p);
        }
    }
    while out.len() > 1 && out.first() == out.last() {
        out.pop();
    }

    let mut changed = true;
    while changed && out.len() >= 3 {
        changed = false;
        let n = out.len();
        for i in 0..n {
            let prev = out[(i + n - 1) % n];
            let next = out[(i + 1) % n];
            if orient(prev, out[i], next) == 0 {
                out.remove(i);
                changed = true;
                break;
            }
        }
    }
    out
}

// ══════════════════════════════════════════════════════════════
// Bounding boxes
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Aabb {
    pub min: Point,
    pub max: Point,
}

impl Aabb {
    pub fn around(center: Point, radius: i32) -> Self {
        Aabb {
            min: center.offset(-radius, -radius),
            max: center.offset(radius, radius),
        }
    }

    /// Strict overlap: boxes that only share an edge do not collide.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(ax: i32, ay: i32, bx: i32, by: i32) -> Segment {
        Segment::new(Point::new(ax, ay), Point::new(bx, by))
    }

    // ── point_on_segment ──

    #[test]
    fn on_horizontal_segment_either_order() {
        let s = seg(200, 400, 400, 400);
        assert!(point_on_segment(Point::new(300, 400), s));
        assert!(point_on_segment(Point::new(300, 400), s.reversed()));
        assert!(point_on_segment(Point::new(200, 400), s));
        assert!(point_on_segment(Point::new(400, 400), s));
    }

    #[test]
    fn on_vertical_segment_inclusive() {
        let s = seg(400, 200, 400, 400);
        for y in [200, 250, 300, 400] {
            assert!(point_on_segment(Point::new(400, y), s));
        }
        assert!(!point_on_segment(Point::new(400, 199), s));
        assert!(!point_on_segment(Point::new(400, 401), s));
    }

    #[test]
    fn off_line_points_rejected() {
        let s = seg(200, 400, 400, 400);
        assert!(!point_on_segment(Point::new(300, 399), s));
        assert!(!point_on_segment(Point::new(199, 400), s));
        assert!(!point_on_segment(Point::new(401, 400), s));
    }

    #[test]
    fn diagonal_segments_never_match() {
        let s = seg(0, 0, 10, 10);
        assert!(!point_on_segment(Point::new(5, 5), s));
        assert!(!point_on_segment(Point::new(0, 0), s));
    }

    // ── segments_intersect ──

    #[test]
    fn crossing_segments_intersect() {
        assert!(segments_intersect(seg(0, 5, 10, 5), seg(5, 0, 5, 10)));
    }

    #[test]
    fn touching_endpoint_counts() {
        assert!(segments_intersect(seg(0, 0, 10, 0), seg(10, 0, 10, 10)));
    }

    #[test]
    fn parallel_disjoint_do_not_intersect() {
        assert!(!segments_intersect(seg(0, 0, 10, 0), seg(0, 1, 10, 1)));
        assert!(!segments_intersect(seg(0, 0, 10, 0), seg(11, 0, 20, 0)));
    }

    #[test]
    fn collinear_overlap_counts() {
        assert!(segments_intersect(seg(0, 0, 10, 0), seg(5, 0, 20, 0)));
    }

    #[test]
    fn first_contact_along_travel() {
        // moving right across a vertical wall
        assert_eq!(first_contact(seg(294, 347, 301, 347), seg(300, 400, 300, 302)), Some(Point::new(300, 347)));
        // moving up onto a horizontal wall
        assert_eq!(first_contact(seg(250, 310, 250, 295), seg(200, 302, 400, 302)), Some(Point::new(250, 302)));
        // sliding into a collinear stretch from either side
        assert_eq!(first_contact(seg(190, 0, 230, 0), seg(200, 0, 220, 0)), Some(Point::new(200, 0)));
        assert_eq!(first_contact(seg(230, 0, 190, 0), seg(200, 0, 220, 0)), Some(Point::new(220, 0)));
        // short of the wall
        assert_eq!(first_contact(seg(287, 347, 294, 347), seg(300, 400, 300, 302)), None);
    }

    // ── polygons ──

    fn square() -> Vec<Point> {
        vec![
            Point::new(400, 400),
            Point::new(200, 400),
            Point::new(200, 200),
            Point::new(400, 200),
        ]
    }

    #[test]
    fn square_area() {
        assert_eq!(polygon_area(&square()), 40_000);
        let mut rev = square();
        rev.reverse();
        assert_eq!(polygon_area(&rev), 40_000);
    }

    #[test]
    fn degenerate_area_is_zero() {
        assert_eq!(polygon_area(&[Point::new(0, 0), Point::new(5, 0)]), 0);
        assert_eq!(
            polygon_area(&[Point::new(0, 0), Point::new(5, 0), Point::new(10, 0)]),
            0
        );
    }

    #[test]
    fn contains_interior_edge_and_exterior() {
        let sq = square();
        assert!(contains_point(&sq, Point::new(300, 300)));
        assert!(contains_point(&sq, Point::new(200, 300)));
        assert!(contains_point(&sq, Point::new(400, 400)));
        assert!(!contains_point(&sq, Point::new(401, 300)));
        assert!(!contains_point(&sq, Point::new(300, 150)));
    }

    #[test]
    fn contains_l_shape_notch() {
        // L-shape: the top-right quadrant is cut away
        let l = vec![
            Point::new(400, 400),
            Point::new(200, 400),
            Point::new(200, 200),
            Point::new(300, 200),
            Point::new(300, 300),
            Point::new(400, 300),
        ];
        assert!(contains_point(&l, Point::new(250, 250)));
        assert!(contains_point(&l, Point::new(350, 350)));
        assert!(!contains_point(&l, Point::new(350, 250)));
    }

    #[test]
    fn simplify_drops_collinear_and_duplicates() {
        let pts = vec![
            Point::new(300, 400),
            Point::new(300, 395),
            Point::new(300, 395),
            Point::new(300, 300),
            Point::new(350, 300),
            Point::new(400, 300),
            Point::new(400, 400),
        ];
        let s = simplify_loop(&pts);
        assert_eq!(
            s,
            vec![
                Point::new(300, 400),
                Point::new(300, 300),
                Point::new(400, 300),
                Point::new(400, 400),
            ]
        );
    }

    #[test]
    fn nearest_clamps_onto_segment() {
        let s = seg(200, 400, 400, 400);
        assert_eq!(nearest_on_segment(s, Point::new(250, 300)), Point::new(250, 400));
        assert_eq!(nearest_on_segment(s, Point::new(500, 500)), Point::new(400, 400));
    }

    // ── aabb ──

    #[test]
    fn aabb_overlap_is_strict() {
        let a = Aabb::around(Point::new(300, 400), 10);
        assert!(a.overlaps(&Aabb::around(Point::new(315, 400), 10)));
        assert!(!a.overlaps(&Aabb::around(Point::new(320, 400), 10)));
    }
}
