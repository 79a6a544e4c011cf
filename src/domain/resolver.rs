/// Incursion resolver: fuses a finished path into the outline.
///
/// Input is the path (`path[0]` on the old outline, last point on the edge
/// that was struck) and the struck segment. Two rules are available:
///
///   - `Stitch`: path, then the old vertices walked forward from the
///     start vertex to the end vertex. When either endpoint is not an exact
///     old vertex the loop is closed minimally (`path ++ [path[0]]`) and
///     the result is flagged `degraded`. The new loop is both the active
///     outline and the recorded capture. The edge index is looked up in
///     the *old* outline.
///   - `Area`: both endpoints become vertices, the two loops on either
///     side of the path are built, the smaller one is captured and the
///     larger stays open. The edge index is looked up in the new outline.

use log::warn;
use serde::Deserialize;

use super::boundary::Boundary;
use super::geometry::{self, Point, Segment};

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitRule {
    /// Forward walk of the old vertex list. The player's edge index is looked
    /// up in the old outline and reused as is, so on the new loop it can name
    /// a stretch of the drawn path.
    Stitch,
    #[default]
    Area,
}

#[derive(Clone, Debug)]
pub struct Resolution {
    /// New active outline.
    pub boundary: Boundary,
    /// Loop to append to the captured regions.
    pub captured: Boundary,
    /// Player edge after resolution; `None` leaves the old index in place.
    pub edge: Option<usize>,
    /// Minimal-closure fallback was used.
    pub degraded: bool,
}

/// Fuse `path` into `old`. `None` means nothing was captured and the
/// incursion should be dropped (too short, or zero area under `Area`).
pub fn resolve(old: &Boundary, path: &[Point], hit: Segment, rule: SplitRule) -> Option<Resolution> {
    if path.len() < 2 {
        return None;
    }
    match rule {
        SplitRule::Stitch => Some(stitch(old, path, hit)),
        SplitRule::Area => split_by_area(old, path),
    }
}

// ══════════════════════════════════════════════════════════════
// Stitch
// ══════════════════════════════════════════════════════════════

fn stitch(old: &Boundary, path: &[Point], hit: Segment) -> Resolution {
    let edge = old.edge_index_of(hit);
    let start = path[0];
    let end = path[path.len() - 1];

    let mut pts = path.to_vec();
    let degraded = match (old.vertex_index(start), old.vertex_index(end)) {
        (Some(i), Some(j)) => {
            let v = old.vertices();
            let n = v.len();
            let mut k = i;
            while k != j {
                k = (k + 1) % n;
                pts.push(v[k]);
            }
            false
        }
        _ => {
            warn!(
                "stitch: ({}, {}) -> ({}, {}) not both vertices, closing minimally",
                start.x, start.y, end.x, end.y
            );
            pts.push(start);
            true
        }
    };

    Resolution {
        boundary: Boundary::new(pts.clone()),
        captured: Boundary::new(pts),
        edge,
        degraded,
    }
}

// ══════════════════════════════════════════════════════════════
// Area split
// ══════════════════════════════════════════════════════════════

fn split_by_area(old: &Boundary, path: &[Point]) -> Option<Resolution> {
    let start = path[0];
    let end = path[path.len() - 1];
    if start == end {
        return None;
    }

    let mut outline = old.clone();
    outline.insert_vertex(start)?;
    outline.insert_vertex(end)?;
    let ia = outline.vertex_index(start)?;
    let ib = outline.vertex_index(end)?;
    let v = outline.vertices();
    let n = v.len();

    // Both loops run A..B along the path, then back to A along the outline.
    let mut forward = path.to_vec();
    let mut k = (ib + 1) % n;
    while k != ia {
        forward.push(v[k]);
        k = (k + 1) % n;
    }

    let mut backward = path.to_vec();
    let mut k = (ib + n - 1) % n;
    while k != ia {
        backward.push(v[k]);
        k = (k + n - 1) % n;
    }

    let forward = geometry::simplify_loop(&forward);
    let backward = geometry::simplify_loop(&backward);
    let area_f = geometry::polygon_area(&forward);
    let area_b = geometry::polygon_area(&backward);
    if area_f == 0 || area_b == 0 {
        return None;
    }

    let (open, claimed) = if area_f >= area_b { (forward, backward) } else { (backward, forward) };
    let boundary = Boundary::new(open);
    let edge = boundary.edge_at(end);
    Some(Resolution {
        boundary,
        captured: Boundary::new(claimed),
        edge,
        degraded: false,
    })
}
