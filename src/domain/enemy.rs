/// Enemy motion policies.
///
/// Two variants behind one enum:
///   1. **Wanderer**: straight-line runs in a random 4-way direction for a
///      random number of ticks, then re-rolls. Reads the outline only when
///      `confined`.
///   2. **Chaser**: bound to the outline like the player. Steers toward
///      the player while within `chase_radius`, and keeps moving through
///      corners (`CornerPolicy::Continue`).
///
/// Enemies read player and outline state; they never mutate either.

use rand::Rng;

use super::boundary::Boundary;
use super::entity::{Body, MoveDir};
use super::geometry::{Aabb, Axis, Point, Segment};
use super::traversal::{self, CornerPolicy};

/// Read-only view handed to `Enemy::advance` each tick.
pub struct MotionCtx<'a> {
    pub boundary: &'a Boundary,
    pub player: Point,
    pub chase_radius: i32,
    pub wander_ticks: (u32, u32),
}

#[derive(Clone, Debug)]
pub struct Wanderer {
    pub body: Body,
    pub vel: Point,
    pub step: i32,
    /// Ticks left on the current run; 0 = roll a new one.
    pub remaining: u32,
    pub confined: bool,
}

#[derive(Clone, Debug)]
pub struct Chaser {
    pub body: Body,
    pub vel: Point,
    pub step: i32,
    pub edge: usize,
}

#[derive(Clone, Debug)]
pub enum Enemy {
    Wanderer(Wanderer),
    Chaser(Chaser),
}

impl Enemy {
    pub fn body(&self) -> &Body {
        match self {
            Enemy::Wanderer(w) => &w.body,
            Enemy::Chaser(c) => &c.body,
        }
    }

    pub fn pos(&self) -> Point {
        self.body().pos
    }

    pub fn aabb(&self) -> Aabb {
        self.body().aabb()
    }

    pub fn advance<R: Rng>(&mut self, ctx: &MotionCtx, rng: &mut R) {
        match self {
            Enemy::Wanderer(w) => w.advance(ctx, rng),
            Enemy::Chaser(c) => c.advance(ctx),
        }
    }

    /// Put the enemy back on (or inside) a freshly replaced outline.
    pub fn reattach(&mut self, boundary: &Boundary) {
        match self {
            Enemy::Wanderer(w) => {
                if w.confined && !boundary.contains(w.body.pos) {
                    if let Some((_, q)) = boundary.nearest(w.body.pos) {
                        w.body.pos = q;
                    }
                    w.remaining = 0;
                }
            }
            Enemy::Chaser(c) => {
                if let Some((edge, q)) = boundary.nearest(c.body.pos) {
                    c.body.pos = q;
                    c.edge = edge;
                    c.vel = along(boundary.edge(edge), c.vel);
                }
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Wanderer
// ══════════════════════════════════════════════════════════════

impl Wanderer {
    pub fn new(pos: Point, radius: i32, step: i32, confined: bool) -> Self {
        Wanderer { body: Body::new(pos, radius), vel: Point::ZERO, step, remaining: 0, confined }
    }

    fn advance<R: Rng>(&mut self, ctx: &MotionCtx, rng: &mut R) {
        if self.remaining == 0 {
            self.reroll(ctx.wander_ticks, rng);
        }
        self.remaining -= 1;

        let next = self.body.pos.offset(self.vel.x * self.step, self.vel.y * self.step);
        if self.confined && !ctx.boundary.contains(next) {
            // blocked: pick something else next tick
            self.remaining = 0;
            return;
        }
        self.body.pos = next;
    }

    fn reroll<R: Rng>(&mut self, (lo, hi): (u32, u32), rng: &mut R) {
        let dir = MoveDir::ALL[rng.gen_range(0..MoveDir::ALL.len())];
        self.vel = dir.unit();
        self.remaining = rng.gen_range(lo.max(1)..=hi.max(lo.max(1)));
    }
}

// ══════════════════════════════════════════════════════════════
// Chaser
// ══════════════════════════════════════════════════════════════

impl Chaser {
    /// Starts patrolling edge `edge` of `boundary` in that edge's direction.
    pub fn new(pos: Point, radius: i32, step: i32, boundary: &Boundary, edge: usize) -> Self {
        let vel = along(boundary.edge(edge), Point::ZERO);
        Chaser { body: Body::new(pos, radius), vel, step, edge }
    }

    fn advance(&mut self, ctx: &MotionCtx) {
        self.vel = self.chase_velocity(ctx);
        let s = traversal::slide(
            ctx.boundary,
            self.edge,
            self.body.pos,
            self.vel,
            self.step,
            CornerPolicy::Continue,
        );
        self.body.pos = s.pos;
        self.edge = s.edge;
        self.vel = s.vel;
    }

    /// Unit step toward the player along the current edge's axis, when the
    /// player is within range and not level with us on that axis.
    /// Otherwise the previous velocity is kept.
    fn chase_velocity(&self, ctx: &MotionCtx) -> Point {
        let here = self.body.pos;
        let r = ctx.chase_radius as i64;
        if here.dist2(ctx.player) > r * r {
            return self.vel;
        }
        let toward = match ctx.boundary.edge(self.edge).axis() {
            Some(Axis::Horizontal) => Point::new((ctx.player.x - here.x).signum(), 0),
            Some(Axis::Vertical) => Point::new(0, (ctx.player.y - here.y).signum()),
            None => Point::ZERO,
        };
        if toward.is_zero() { self.vel } else { toward }
    }
}

/// Unit velocity on `seg`'s axis. Keeps the sign of `vel` when it already
/// runs along that axis, otherwise follows the segment's direction.
fn along(seg: Segment, vel: Point) -> Point {
    match seg.axis() {
        Some(Axis::Horizontal) if vel.x != 0 => Point::new(vel.x.signum(), 0),
        Some(Axis::Vertical) if vel.y != 0 => Point::new(0, vel.y.signum()),
        Some(_) => seg.direction(),
        None => Point::ZERO,
    }
}
