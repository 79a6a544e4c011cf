/// Playfield outline and claimed territory.
///
/// ## Layers
///
///   - `Field`: fixed rectangular bounds of the level. Never changes.
///   - `Boundary`: the active outline the player travels along.
///     Replaced wholesale after every capture, never edited in place by
///     gameplay code.
///   - `captured`: loops already claimed. Append-only.
///
/// Edge `i` of a boundary joins vertex `i` and vertex `(i + 1) % n`.
/// The initial loop is `[BR, BL, TL, TR]`, so on a fresh field the edge
/// indices are bottom = 0, left = 1, top = 2, right = 3.

use serde::Deserialize;

use super::geometry::{self, Point, Segment};

// ══════════════════════════════════════════════════════════════
// Field
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
pub struct Field {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

/// Canonical edge slots of the initial rectangle.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeSlot {
    Bottom,
    Left,
    Top,
    Right,
}

impl EdgeSlot {
    pub fn index(self) -> usize {
        match self {
            EdgeSlot::Bottom => 0,
            EdgeSlot::Left => 1,
            EdgeSlot::Top => 2,
            EdgeSlot::Right => 3,
        }
    }
}

impl Field {
    pub const fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Field { min_x, min_y, max_x, max_y }
    }

    pub fn width(&self) -> i32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> i32 {
        self.max_y - self.min_y
    }

    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    pub fn is_valid(&self) -> bool {
        self.width() > 0 && self.height() > 0
    }

    /// `[bottom-right, bottom-left, top-left, top-right]`.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.max_x, self.max_y),
            Point::new(self.min_x, self.max_y),
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.min_y),
        ]
    }

    pub fn clamp(&self, p: Point) -> Point {
        Point::new(p.x.clamp(self.min_x, self.max_x), p.y.clamp(self.min_y, self.max_y))
    }
}

// ══════════════════════════════════════════════════════════════
// Boundary: a closed vertex loop
// ══════════════════════════════════════════════════════════════

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Boundary {
    vertices: Vec<Point>,
}

impl Boundary {
    pub fn new(vertices: Vec<Point>) -> Self {
        Boundary { vertices }
    }

    pub fn from_field(field: &Field) -> Self {
        Boundary::new(field.corners().to_vec())
    }

    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Edge `i` (wrapping). An empty boundary yields a zero-length segment.
    pub fn edge(&self, i: usize) -> Segment {
        let n = self.vertices.len();
        if n == 0 {
            return Segment::new(Point::ZERO, Point::ZERO);
        }
        Segment::new(self.vertices[i % n], self.vertices[(i + 1) % n])
    }

    pub fn edges(&self) -> impl Iterator<Item = Segment> + '_ {
        (0..self.vertices.len()).map(move |i| self.edge(i))
    }

    pub fn next_edge(&self, i: usize) -> usize {
        (i + 1) % self.len().max(1)
    }

    pub fn prev_edge(&self, i: usize) -> usize {
        let n = self.len().max(1);
        (i + n - 1) % n
    }

    /// First edge whose segment contains `p`.
    pub fn edge_at(&self, p: Point) -> Option<usize> {
        self.edges().position(|e| geometry::point_on_segment(p, e))
    }

    /// Index of the edge equal to `seg` (same endpoints, same order).
    pub fn edge_index_of(&self, seg: Segment) -> Option<usize> {
        self.edges().position(|e| e == seg)
    }

    pub fn vertex_index(&self, p: Point) -> Option<usize> {
        self.vertices.iter().position(|&v| v == p)
    }

    /// Make `p` a vertex, splitting the edge it lies on.
    /// Returns its index, or `None` when `p` is not on the outline.
    pub fn insert_vertex(&mut self, p: Point) -> Option<usize> {
        if let Some(i) = self.vertex_index(p) {
            return Some(i);
        }
        let edge = self.edge_at(p)?;
        self.vertices.insert(edge + 1, p);
        Some(edge + 1)
    }

    /// Closest outline point to `p`, with the edge it belongs to.
    pub fn nearest(&self, p: Point) -> Option<(usize, Point)> {
        self.edges()
            .enumerate()
            .map(|(i, e)| (i, geometry::nearest_on_segment(e, p)))
            .min_by_key(|&(_, q)| q.dist2(p))
    }

    pub fn contains(&self, p: Point) -> bool {
        geometry::contains_point(&self.vertices, p)
    }

    pub fn area(&self) -> i64 {
        geometry::polygon_area(&self.vertices)
    }
}

// ══════════════════════════════════════════════════════════════
// Territory: active boundary + captured regions
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct Territory {
    pub field: Field,
    boundary: Boundary,
    captured: Vec<Boundary>,
    area_total: i64,
    area_remaining: i64,
    target_percent: u32,
}

impl Territory {
    pub fn new(field: Field, target_percent: u32) -> Self {
        let boundary = Boundary::from_field(&field);
        let area_total = field.area();
        Territory {
            field,
            boundary,
            captured: Vec::new(),
            area_total,
            area_remaining: area_total,
            target_percent,
        }
    }

    pub fn current_boundary(&self) -> &Boundary {
        &self.boundary
    }

    pub fn captured_regions(&self) -> &[Boundary] {
        &self.captured
    }

    /// Record a claimed loop. The caller guarantees it is well formed.
    pub fn commit_captured_region(&mut self, region: Boundary) {
        self.captured.push(region);
    }

    /// Swap in a new active outline and recompute the open area.
    pub fn replace_boundary(&mut self, boundary: Boundary) {
        self.area_remaining = boundary.area().min(self.area_total);
        self.boundary = boundary;
    }

    pub fn area_remaining(&self) -> i64 {
        self.area_remaining
    }

    pub fn captured_percent(&self) -> u32 {
        if self.area_total <= 0 {
            return 0;
        }
        ((self.area_total - self.area_remaining) * 100 / self.area_total) as u32
    }

    pub fn is_complete(&self) -> bool {
        self.captured_percent() >= self.target_percent
    }
}
