/// WorldState: the complete snapshot of a running game.
///
/// ## Level Template
///
/// Two layers, as with any restartable level:
///   - `template`: the level as defined. **Never mutated** after load.
///   - everything else (`territory`, `player`, `enemies`): live state,
///     rebuilt from `template` by `reset_from_template()`.
///
/// The territory owns the active outline and the captured regions; the
/// step function hands it, the player and the enemies to the domain layer
/// by reference each tick.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::config::{GameConfig, RulesConfig, SpeedConfig};
use crate::domain::boundary::{EdgeSlot, Field, Territory};
use crate::domain::enemy::{Chaser, Enemy, Wanderer};
use crate::domain::entity::Player;
use crate::domain::geometry::Point;
use crate::domain::traversal::Traversal;
use crate::sim::level::{self, EnemyKind, LevelDef, PlayerDef};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    Playing,
    LevelComplete,
    GameOver,
    GameComplete,
}

pub struct WorldState {
    // ── Level ──
    /// Level as loaded. Never mutated after `load_level`.
    pub template: LevelDef,
    pub territory: Territory,

    // ── Entities ──
    pub player: Player,
    pub enemies: Vec<Enemy>,

    // ── Config ──
    pub speed: SpeedConfig,
    pub rules: RulesConfig,
    seed: u64,
    pub rng: ChaCha8Rng,

    // ── Meta ──
    pub phase: Phase,
    pub current_level: usize,
    pub total_levels: usize,
    pub level_name: String,
    pub tick: u64,

    // ── UI ──
    pub message: String,
    pub message_timer: u32,

    // ── Pause ──
    pub paused: bool,
}

// ── Construction ──

impl WorldState {
    /// A world on the title screen, holding the first built-in level.
    pub fn new(config: &GameConfig) -> Self {
        let template = level::embedded_levels()
            .into_iter()
            .next()
            .unwrap_or_else(fallback_level);
        let mut world = WorldState {
            territory: Territory::new(template.field, config.rules.capture_target_percent),
            player: Player::new(template.player.start, config.rules.player_radius, template.player.lives, 0),
            enemies: vec![],
            level_name: template.name.clone(),
            template,
            speed: config.speed.clone(),
            rules: config.rules.clone(),
            seed: config.seed,
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            phase: Phase::Title,
            current_level: 0,
            total_levels: 0,
            tick: 0,
            message: String::new(),
            message_timer: 0,
            paused: false,
        };
        world.reset_from_template(None);
        world
    }

    pub fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    /// Rebuild territory, player and enemies from `template` (deep copy).
    /// `lives` overrides the template's starting lives.
    pub fn reset_from_template(&mut self, lives: Option<u32>) {
        let def = &self.template;
        let rules = &self.rules;
        let speed = &self.speed;

        let territory = Territory::new(def.field, rules.capture_target_percent);
        let outline = territory.current_boundary();

        let player = Player::new(
            def.player.start,
            rules.player_radius,
            lives.unwrap_or(def.player.lives),
            def.player.start_edge.index(),
        );

        let enemies = def
            .enemies
            .iter()
            .map(|e| match e.kind {
                EnemyKind::Wanderer => Enemy::Wanderer(Wanderer::new(
                    e.start,
                    rules.wanderer_radius,
                    speed.wanderer_step,
                    e.confined,
                )),
                EnemyKind::Chaser => {
                    let (edge, pos) = match e.start_edge {
                        Some(slot) => (slot.index(), e.start),
                        None => outline.nearest(e.start).unwrap_or((0, e.start)),
                    };
                    Enemy::Chaser(Chaser::new(pos, rules.chaser_radius, speed.chaser_step, outline, edge))
                }
            })
            .collect();

        self.territory = territory;
        self.player = player;
        self.enemies = enemies;
        // same level + same seed = same enemy motion
        self.rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(self.current_level as u64));
        self.tick = 0;
        self.paused = false;
    }

    pub fn incursion_path(&self) -> Option<&[Point]> {
        match &self.player.traversal {
            Traversal::Incursing { path } => Some(path),
            _ => None,
        }
    }
}

fn fallback_level() -> LevelDef {
    LevelDef {
        name: String::from("Untitled"),
        field: Field::new(200, 200, 400, 400),
        player: PlayerDef { lives: 3, start: Point::new(300, 400), start_edge: EdgeSlot::Bottom },
        enemies: vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> WorldState {
        WorldState::new(&GameConfig::from_toml_str("").expect("defaults"))
    }

    #[test]
    fn new_world_is_on_title_with_level_one() {
        let w = world();
        assert_eq!(w.phase, Phase::Title);
        assert_eq!(w.player.pos(), Point::new(300, 400));
        assert_eq!(w.player.lives, 3);
        assert_eq!(w.territory.current_boundary().len(), 4);
        assert_eq!(w.enemies.len(), 1);
        assert!(w.incursion_path().is_none());
    }

    #[test]
    fn reset_is_a_deep_copy_of_the_template() {
        let mut w = world();
        w.player.body.pos = Point::new(200, 300);
        w.player.lives = 1;
        w.enemies.clear();
        w.reset_from_template(None);
        assert_eq!(w.player.pos(), w.template.player.start);
        assert_eq!(w.player.lives, 3);
        assert_eq!(w.enemies.len(), w.template.enemies.len());
    }

    #[test]
    fn reset_can_carry_lives() {
        let mut w = world();
        w.reset_from_template(Some(2));
        assert_eq!(w.player.lives, 2);
    }
}
