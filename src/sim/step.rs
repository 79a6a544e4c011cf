/// The step function: advances the world by one tick.
///
/// Processing order:
///   1. Message timer
///   2. Enemy motion
///   3. Player motion (slide along the outline, or extend the incursion)
///   4. Incursion resolution (capture or discard)
///   5. Enemy contact / lives
///   6. Completion check
///
/// Domain code never sees `WorldState`: each resolver hands the outline,
/// player and enemies to the domain layer by reference.

use log::{debug, info};

use crate::domain::enemy::MotionCtx;
use crate::domain::entity::{FrameInput, MoveDir};
use crate::domain::geometry::Point;
use crate::domain::resolver::{self, Resolution, SplitRule};
use crate::domain::traversal::{self, CornerPolicy, IncursionStep, Traversal};
use super::event::GameEvent;
use super::world::{Phase, WorldState};

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn step(world: &mut WorldState, input: FrameInput) -> Vec<GameEvent> {
    if world.phase != Phase::Playing { return vec![]; }

    let mut events: Vec<GameEvent> = Vec::new();
    world.tick += 1;

    if world.message_timer > 0 {
        world.message_timer -= 1;
        if world.message_timer == 0 { world.message.clear(); }
    }

    resolve_enemy_motion(world);
    resolve_player_motion(world, input, &mut events);
    resolve_enemy_collision(world, &mut events);
    if world.phase != Phase::Playing { return events; }
    resolve_completion(world, &mut events);

    events
}

// ══════════════════════════════════════════════════════════════
// Enemies
// ══════════════════════════════════════════════════════════════

fn resolve_enemy_motion(world: &mut WorldState) {
    let ctx = MotionCtx {
        boundary: world.territory.current_boundary(),
        player: world.player.pos(),
        chase_radius: world.rules.chase_radius,
        wander_ticks: (world.rules.wander_min_ticks, world.rules.wander_max_ticks),
    };
    for enemy in &mut world.enemies {
        enemy.advance(&ctx, &mut world.rng);
    }
}

// ══════════════════════════════════════════════════════════════
// Player
// ══════════════════════════════════════════════════════════════

fn resolve_player_motion(world: &mut WorldState, input: FrameInput, events: &mut Vec<GameEvent>) {
    let dir = input.movement.map(MoveDir::unit).unwrap_or(Point::ZERO);
    let on_edge = match world.player.traversal {
        Traversal::OnBoundary { edge } => Some(edge),
        Traversal::Incursing { .. } => None,
    };

    match on_edge {
        Some(_) if input.start_incursion => start_incursion(world, events),
        Some(edge) => move_on_boundary(world, edge, dir),
        None => move_incursion(world, dir, events),
    }
}

fn move_on_boundary(world: &mut WorldState, edge: usize, dir: Point) {
    let outline = world.territory.current_boundary();
    let player = &mut world.player;

    let edge = traversal::steer(outline, edge, player.body.pos, dir);
    let s = traversal::slide(outline, edge, player.body.pos, dir, world.speed.player_step, CornerPolicy::Stop);
    player.body.pos = s.pos;
    player.vel = s.vel;
    player.traversal = Traversal::OnBoundary { edge: s.edge };
}

fn start_incursion(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let start = world.player.pos();
    world.player.traversal = Traversal::Incursing { path: vec![start] };
    world.player.vel = Point::ZERO;
    debug!("incursion started at ({}, {})", start.x, start.y);
    events.push(GameEvent::IncursionStarted);
}

fn move_incursion(world: &mut WorldState, dir: Point, events: &mut Vec<GameEvent>) {
    let rule = world.rules.split_rule;
    let territory = &world.territory;
    let player = &mut world.player;
    player.vel = dir;

    let path = match &mut player.traversal {
        Traversal::Incursing { path } => path,
        Traversal::OnBoundary { .. } => return,
    };
    // Under the area rule the open outline is the only place left to draw.
    let confine = rule == SplitRule::Area;
    let outcome = traversal::advance_incursion(
        &territory.field,
        territory.current_boundary(),
        path,
        &mut player.body.pos,
        dir,
        world.speed.player_step,
        confine,
    );

    let touched = match outcome {
        IncursionStep::Moving => return,
        IncursionStep::Touched { edge } => edge,
    };
    let old = territory.current_boundary();
    let resolution = resolver::resolve(old, path, old.edge(touched), rule);
    match resolution {
        Some(res) => finish_capture(world, res, touched, events),
        None => discard_incursion(world, events),
    }
}

fn finish_capture(world: &mut WorldState, res: Resolution, touched: usize, events: &mut Vec<GameEvent>) {
    let area = res.captured.area();
    let edge = res.edge.unwrap_or(touched);

    world.territory.commit_captured_region(res.captured);
    world.territory.replace_boundary(res.boundary);
    world.player.traversal = Traversal::OnBoundary { edge };
    world.player.vel = Point::ZERO;

    let outline = world.territory.current_boundary();
    for enemy in &mut world.enemies {
        enemy.reattach(outline);
    }

    let percent = world.territory.captured_percent();
    info!(
        "captured {} units, {}% claimed, {} region(s)",
        area,
        percent,
        world.territory.captured_regions().len()
    );
    world.set_message(&format!("Claimed {percent}%"), 60);
    events.push(GameEvent::RegionCaptured { area, percent });
}

/// Drop the current incursion and put the player back where it began.
fn discard_incursion(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    let start = match &world.player.traversal {
        Traversal::Incursing { path } => path.first().copied(),
        Traversal::OnBoundary { .. } => None,
    };
    let start = match start {
        Some(p) => p,
        None => return,
    };

    let edge = world.territory.current_boundary().edge_at(start).unwrap_or(0);
    world.player.body.pos = start;
    world.player.vel = Point::ZERO;
    world.player.traversal = Traversal::OnBoundary { edge };
    debug!("incursion discarded, back at ({}, {})", start.x, start.y);
    world.set_message("Incursion lost", 30);
    events.push(GameEvent::IncursionDiscarded);
}

// ══════════════════════════════════════════════════════════════
// Collisions
// ══════════════════════════════════════════════════════════════

fn resolve_enemy_collision(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if !world.player.is_alive() { return; }
    if world.player.hit_cooldown > 0 {
        world.player.hit_cooldown -= 1;
        return;
    }

    let player_box = world.player.body.aabb();
    if !world.enemies.iter().any(|e| e.aabb().overlaps(&player_box)) {
        return;
    }

    // One life per tick, however many enemies overlap.
    world.player.lives -= 1;
    world.player.hit_cooldown = world.rules.hit_cooldown_ticks;
    let lives = world.player.lives;
    events.push(GameEvent::PlayerHit { lives });

    if world.player.is_incursing() {
        discard_incursion(world, events);
    }

    if lives == 0 {
        info!("game over on level {} ({})", world.current_level + 1, world.level_name);
        world.phase = Phase::GameOver;
        world.set_message("GAME OVER", 0);
        events.push(GameEvent::GameOver);
    } else {
        world.set_message(&format!("Hit! {lives} left"), 40);
    }
}

// ══════════════════════════════════════════════════════════════
// Completion
// ══════════════════════════════════════════════════════════════

fn resolve_completion(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    if !world.territory.is_complete() { return; }

    let percent = world.territory.captured_percent();
    info!("level {} cleared at {}%", world.current_level + 1, percent);
    world.phase = Phase::LevelComplete;
    world.set_message(&format!("Level {} Complete! {percent}%", world.current_level + 1), 0);
    events.push(GameEvent::LevelCleared);
}

/// Reset the level from its template. A live player keeps its lives;
/// after game over the template's lives are restored.
pub fn restart_level(world: &mut WorldState) {
    let lives = if world.player.is_alive() { Some(world.player.lives) } else { None };
    world.reset_from_template(lives);
    world.message.clear();
    world.message_timer = 0;
    world.phase = Phase::Playing;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::boundary::EdgeSlot;
    use crate::domain::enemy::{Enemy, Wanderer};
    use crate::sim::level::{EnemyDef, EnemyKind};

    fn playing(config: &str, enemies: Vec<EnemyDef>) -> WorldState {
        let cfg = GameConfig::from_toml_str(config).expect("config");
        let mut w = WorldState::new(&cfg);
        w.template.enemies = enemies;
        w.reset_from_template(None);
        w.phase = Phase::Playing;
        w
    }

    fn wanderer_at(x: i32, y: i32) -> EnemyDef {
        EnemyDef { kind: EnemyKind::Wanderer, start: Point::new(x, y), start_edge: None, confined: true }
    }

    fn held(d: MoveDir) -> FrameInput {
        FrameInput { movement: Some(d), start_incursion: false }
    }

    const IDLE: FrameInput = FrameInput { movement: None, start_incursion: false };
    const START: FrameInput = FrameInput { movement: None, start_incursion: true };

    fn run(w: &mut WorldState, input: FrameInput, ticks: usize) -> Vec<GameEvent> {
        (0..ticks).flat_map(|_| step(w, input)).collect()
    }

    /// Start at (300,400), go up to (300,300), then right to (400,300).
    fn draw_l(w: &mut WorldState) -> Vec<GameEvent> {
        let mut events = step(w, START);
        events.extend(run(w, held(MoveDir::Up), 20));
        events.extend(run(w, held(MoveDir::Right), 20));
        events
    }

    #[test]
    fn no_op_outside_playing() {
        let mut w = playing("", vec![]);
        w.phase = Phase::Title;
        assert!(step(&mut w, held(MoveDir::Left)).is_empty());
        assert_eq!(w.player.pos(), Point::new(300, 400));
        assert_eq!(w.tick, 0);
    }

    #[test]
    fn player_slides_along_bottom_edge() {
        let mut w = playing("", vec![]);
        run(&mut w, held(MoveDir::Left), 3);
        assert_eq!(w.player.pos(), Point::new(285, 400));
        // vertical intent on a horizontal edge does nothing
        run(&mut w, held(MoveDir::Up), 3);
        assert_eq!(w.player.pos(), Point::new(285, 400));
    }

    #[test]
    fn player_stops_at_corner_then_turns() {
        let mut w = playing("", vec![]);
        run(&mut w, held(MoveDir::Left), 20);
        assert_eq!(w.player.pos(), Point::new(200, 400));
        assert_eq!(w.player.traversal, Traversal::OnBoundary { edge: EdgeSlot::Left.index() });
        assert_eq!(w.player.vel, Point::ZERO);
        run(&mut w, held(MoveDir::Up), 2);
        assert_eq!(w.player.pos(), Point::new(200, 390));
    }

    #[test]
    fn incursion_does_not_end_on_its_own_start() {
        let mut w = playing("", vec![]);
        let events = step(&mut w, START);
        assert_eq!(events, vec![GameEvent::IncursionStarted]);
        assert_eq!(w.incursion_path(), Some(&[Point::new(300, 400)][..]));

        // zero displacement: still incursing, nothing appended
        step(&mut w, IDLE);
        assert!(w.player.is_incursing());
        assert_eq!(w.incursion_path().map(|p| p.len()), Some(1));
    }

    #[test]
    fn area_rule_captures_the_smaller_side() {
        let mut w = playing("", vec![]);
        let events = draw_l(&mut w);

        assert!(events.contains(&GameEvent::RegionCaptured { area: 10_000, percent: 25 }));
        assert!(!events.contains(&GameEvent::LevelCleared));
        assert_eq!(w.territory.captured_regions().len(), 1);
        assert_eq!(w.territory.area_remaining(), 30_000);
        assert_eq!(w.player.pos(), Point::new(400, 300));
        match w.player.traversal {
            Traversal::OnBoundary { edge } => {
                let seg = w.territory.current_boundary().edge(edge);
                assert!(crate::domain::geometry::point_on_segment(Point::new(400, 300), seg));
            }
            Traversal::Incursing { .. } => panic!("incursion should have ended"),
        }
    }

    #[test]
    fn each_capture_adds_one_region() {
        let mut w = playing("", vec![]);
        draw_l(&mut w);
        assert_eq!(w.territory.captured_regions().len(), 1);

        // up the right wall, then straight across to the left wall
        run(&mut w, held(MoveDir::Up), 10);
        assert_eq!(w.player.pos(), Point::new(400, 250));
        step(&mut w, START);
        let events = run(&mut w, held(MoveDir::Left), 40);

        assert!(events.contains(&GameEvent::RegionCaptured { area: 10_000, percent: 50 }));
        assert_eq!(w.territory.captured_regions().len(), 2);
        assert_eq!(w.territory.area_remaining(), 20_000);
    }

    #[test]
    fn odd_step_reaches_an_off_grid_wall() {
        let mut w = playing("[speed]\nplayer_step = 7", vec![]);
        step(&mut w, START);
        run(&mut w, held(MoveDir::Up), 14);
        assert_eq!(w.player.pos(), Point::new(300, 302));
        let events = run(&mut w, held(MoveDir::Right), 15);
        assert!(events.contains(&GameEvent::RegionCaptured { area: 9_800, percent: 24 }));

        // from the left wall straight at the cut, whose x is not a multiple of 7 away
        let from = Point::new(200, 347);
        let edge = w.territory.current_boundary().edge_at(from).expect("left wall");
        w.player.body.pos = from;
        w.player.traversal = Traversal::OnBoundary { edge };
        step(&mut w, START);
        let events = run(&mut w, held(MoveDir::Right), 15);

        assert!(events.contains(&GameEvent::RegionCaptured { area: 5_300, percent: 37 }));
        assert!(!w.player.is_incursing());
        assert_eq!(w.player.pos(), Point::new(300, 347));
        assert_eq!(w.territory.captured_regions().len(), 2);
    }

    #[test]
    fn capture_and_hit_leave_a_message() {
        let mut w = playing("", vec![]);
        draw_l(&mut w);
        assert_eq!(w.message, "Claimed 25%");

        w.enemies = vec![Enemy::Wanderer(Wanderer::new(Point::new(400, 290), 12, 3, true))];
        step(&mut w, IDLE);
        assert_eq!(w.player.lives, 2);
        assert_eq!(w.message, "Hit! 2 left");
    }

    #[test]
    fn stitch_rule_keeps_the_literal_degraded_loop() {
        let mut w = playing("[rules]\nsplit_rule = \"stitch\"", vec![]);
        let events = draw_l(&mut w);

        let outline = w.territory.current_boundary().vertices().to_vec();
        assert_eq!(outline.len(), 42);
        assert_eq!(outline[0], Point::new(300, 400));
        assert_eq!(outline[40], Point::new(400, 300));
        assert_eq!(outline[41], Point::new(300, 400));
        assert_eq!(w.player.traversal, Traversal::OnBoundary { edge: EdgeSlot::Right.index() });
        // that index was taken from the old outline; on the new loop it is a drawn stretch
        let seg = w.territory.current_boundary().edge(EdgeSlot::Right.index());
        assert_eq!((seg.a, seg.b), (Point::new(300, 385), Point::new(300, 380)));
        assert_eq!(w.territory.captured_regions().len(), 1);
        assert!(events.contains(&GameEvent::RegionCaptured { area: 5_000, percent: 87 }));
        // the closed triangle leaves under a quarter open
        assert!(events.contains(&GameEvent::LevelCleared));
        assert_eq!(w.phase, Phase::LevelComplete);
    }

    #[test]
    fn overlap_costs_one_life_per_tick() {
        let mut w = playing("", vec![wanderer_at(300, 390)]);
        let events = step(&mut w, IDLE);
        assert_eq!(events, vec![GameEvent::PlayerHit { lives: 2 }]);
        assert_eq!(w.player.lives, 2);

        // no invulnerability by default
        step(&mut w, IDLE);
        assert_eq!(w.player.lives, 1);
    }

    #[test]
    fn cooldown_skips_repeated_hits() {
        let mut w = playing("[rules]\nhit_cooldown_ticks = 60", vec![wanderer_at(300, 390)]);
        step(&mut w, IDLE);
        step(&mut w, IDLE);
        assert_eq!(w.player.lives, 2);
        assert_eq!(w.player.hit_cooldown, 59);
    }

    #[test]
    fn last_life_ends_the_game() {
        let mut w = playing("", vec![wanderer_at(300, 390)]);
        w.player.lives = 1;
        let events = step(&mut w, IDLE);
        assert!(events.contains(&GameEvent::GameOver));
        assert_eq!(w.phase, Phase::GameOver);
        assert!(step(&mut w, IDLE).is_empty());
    }

    #[test]
    fn hit_while_incursing_discards_path() {
        let mut w = playing("", vec![]);
        step(&mut w, START);
        run(&mut w, held(MoveDir::Up), 2);
        assert_eq!(w.player.pos(), Point::new(300, 390));

        w.enemies = vec![Enemy::Wanderer(Wanderer::new(Point::new(300, 375), 12, 3, true))];

        let events = step(&mut w, IDLE);
        assert!(events.contains(&GameEvent::PlayerHit { lives: 2 }));
        assert!(events.contains(&GameEvent::IncursionDiscarded));
        assert_eq!(w.player.pos(), Point::new(300, 400));
        assert_eq!(w.player.traversal, Traversal::OnBoundary { edge: EdgeSlot::Bottom.index() });
        assert!(w.incursion_path().is_none());
    }

    #[test]
    fn restart_rebuilds_territory_and_keeps_lives() {
        let mut w = playing("", vec![]);
        draw_l(&mut w);
        w.player.lives = 2;
        restart_level(&mut w);
        assert_eq!(w.territory.captured_regions().len(), 0);
        assert_eq!(w.territory.current_boundary().len(), 4);
        assert_eq!(w.player.pos(), Point::new(300, 400));
        assert_eq!(w.player.lives, 2);
        assert_eq!(w.phase, Phase::Playing);
    }

    #[test]
    fn restart_after_game_over_restores_lives() {
        let mut w = playing("", vec![]);
        w.player.lives = 0;
        w.phase = Phase::GameOver;
        restart_level(&mut w);
        assert_eq!(w.player.lives, 3);
    }
}
