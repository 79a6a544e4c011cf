/// Actors: the Player and the shared positional body used by enemies.

use super::geometry::{Aabb, Point};
use super::traversal::Traversal;

/// Movement intent (continuous while key held). At most one per tick.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum MoveDir {
    Left,
    Right,
    Up,
    Down,
}

impl MoveDir {
    pub const ALL: [MoveDir; 4] = [MoveDir::Left, MoveDir::Right, MoveDir::Up, MoveDir::Down];

    pub fn unit(self) -> Point {
        match self {
            MoveDir::Left => Point::new(-1, 0),
            MoveDir::Right => Point::new(1, 0),
            MoveDir::Up => Point::new(0, -1),
            MoveDir::Down => Point::new(0, 1),
        }
    }
}

/// Frame input: movement is held-state, incursion start is edge-triggered.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameInput {
    pub movement: Option<MoveDir>,
    pub start_incursion: bool,
}

/// Position plus collision radius.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Body {
    pub pos: Point,
    pub radius: i32,
}

impl Body {
    pub fn new(pos: Point, radius: i32) -> Self {
        Body { pos, radius }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::around(self.pos, self.radius)
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    pub body: Body,
    /// Unit step per axis; scaled by the configured step each tick.
    pub vel: Point,
    pub lives: u32,
    pub traversal: Traversal,
    /// Ticks of invulnerability left after a hit.
    pub hit_cooldown: u32,
}

impl Player {
    pub fn new(pos: Point, radius: i32, lives: u32, edge: usize) -> Self {
        Player {
            body: Body::new(pos, radius),
            vel: Point::ZERO,
            lives,
            traversal: Traversal::OnBoundary { edge },
            hit_cooldown: 0,
        }
    }

    pub fn pos(&self) -> Point {
        self.body.pos
    }

    pub fn is_incursing(&self) -> bool {
        matches!(self.traversal, Traversal::Incursing { .. })
    }

    pub fn is_alive(&self) -> bool {
        self.lives > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_box_from_radius() {
        let p = Player::new(Point::new(300, 400), 10, 3, 0);
        let b = p.body.aabb();
        assert_eq!(b.min, Point::new(290, 390));
        assert_eq!(b.max, Point::new(310, 410));
        assert!(!p.is_incursing());
        assert!(p.is_alive());
    }

    #[test]
    fn move_dir_units_are_axis_locked() {
        for d in MoveDir::ALL {
            let u = d.unit();
            assert_eq!(u.x.abs() + u.y.abs(), 1);
        }
    }
}
