/// Level definitions and loading.
///
/// ## Sources (priority order):
///   1. `levels/` directory (one `.toml` file per level, sorted by file name)
///   2. Built-in embedded levels
///
/// ## Level format (`.toml`):
///   ```toml
///   name = "Open Field"
///   field = { min_x = 200, min_y = 200, max_x = 400, max_y = 400 }
///
///   [player]
///   lives = 3
///   start = { x = 300, y = 400 }
///   start_edge = "bottom"
///
///   [[enemies]]
///   kind = "wanderer"
///   start = { x = 300, y = 300 }
///
///   [[enemies]]
///   kind = "chaser"
///   start = { x = 300, y = 200 }
///   start_edge = "top"
///   ```
///
/// Edge slots name the sides of the initial rectangle:
/// `bottom`, `left`, `top`, `right`.

use std::path::Path;

use log::{info, warn};
use serde::Deserialize;

use crate::config::GameConfig;
use crate::domain::boundary::{Boundary, EdgeSlot, Field};
use crate::domain::geometry::{self, Point};
use crate::sim::world::{Phase, WorldState};

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LevelDef {
    pub name: String,
    pub field: Field,
    pub player: PlayerDef,
    #[serde(default)]
    pub enemies: Vec<EnemyDef>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PlayerDef {
    #[serde(default = "default_lives")]
    pub lives: u32,
    pub start: Point,
    pub start_edge: EdgeSlot,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyKind {
    Wanderer,
    Chaser,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct EnemyDef {
    pub kind: EnemyKind,
    pub start: Point,
    /// Chasers only. Missing = the edge nearest to `start`.
    #[serde(default)]
    pub start_edge: Option<EdgeSlot>,
    /// Wanderers only. Confined wanderers never leave the open outline.
    #[serde(default = "default_confined")]
    pub confined: bool,
}

fn default_lives() -> u32 { 3 }
fn default_confined() -> bool { true }

#[derive(thiserror::Error, Debug)]
pub enum LevelError {
    #[error("could not read level file: {0}")]
    Read(#[from] std::io::Error),

    #[error("level file parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("level \"{0}\": field is empty or inverted")]
    BadField(String),

    #[error("level \"{0}\": player starts with zero lives")]
    NoLives(String),

    #[error("level \"{name}\": player start ({x}, {y}) is not on the {edge:?} edge")]
    StartOffEdge { name: String, x: i32, y: i32, edge: EdgeSlot },

    #[error("level \"{name}\": enemy {index} starts outside the field")]
    EnemyOutside { name: String, index: usize },
}

impl LevelDef {
    /// Check the definition against its own field.
    pub fn validate(&self) -> Result<(), LevelError> {
        if !self.field.is_valid() {
            return Err(LevelError::BadField(self.name.clone()));
        }
        if self.player.lives == 0 {
            return Err(LevelError::NoLives(self.name.clone()));
        }

        let outline = Boundary::from_field(&self.field);
        let start = self.player.start;
        if !geometry::point_on_segment(start, outline.edge(self.player.start_edge.index())) {
            return Err(LevelError::StartOffEdge {
                name: self.name.clone(),
                x: start.x,
                y: start.y,
                edge: self.player.start_edge,
            });
        }

        for (index, e) in self.enemies.iter().enumerate() {
            let on_edge = match e.start_edge {
                Some(slot) => geometry::point_on_segment(e.start, outline.edge(slot.index())),
                None => outline.contains(e.start),
            };
            let needs_field = e.kind == EnemyKind::Chaser || e.confined;
            if needs_field && !on_edge {
                return Err(LevelError::EnemyOutside { name: self.name.clone(), index });
            }
        }
        Ok(())
    }

    pub fn from_toml_str(text: &str) -> Result<Self, LevelError> {
        let def: LevelDef = toml::from_str(text)?;
        def.validate()?;
        Ok(def)
    }
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// All playable levels: the `levels_dir` files if any load, else built-ins.
pub fn load_levels(config: &GameConfig) -> Vec<LevelDef> {
    let from_dir = load_from_directory(&config.levels_dir);
    if from_dir.is_empty() {
        embedded_levels()
    } else {
        info!("loaded {} level(s) from {}", from_dir.len(), config.levels_dir.display());
        from_dir
    }
}

/// Load level `level_idx` into the world. `keep_lives` carries the
/// current lives count over instead of the level's starting lives.
pub fn load_level(world: &mut WorldState, level_idx: usize, levels: &[LevelDef], keep_lives: bool) {
    let def = match levels.get(level_idx) {
        Some(d) => d,
        None => {
            world.phase = Phase::GameComplete;
            return;
        }
    };

    let lives = if keep_lives && world.player.lives > 0 { Some(world.player.lives) } else { None };
    world.template = def.clone();
    world.current_level = level_idx;
    world.total_levels = levels.len();
    world.level_name = def.name.clone();
    world.reset_from_template(lives);
    info!("level {} loaded: {}", level_idx + 1, def.name);
}

// ══════════════════════════════════════════════════════════════
// Directory loading (individual .toml files)
// ══════════════════════════════════════════════════════════════

fn load_from_directory(dir: &Path) -> Vec<LevelDef> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return vec![],
    };

    let mut paths: Vec<_> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |e| e == "toml"))
        .collect();
    paths.sort();

    let mut results = vec![];
    for path in paths {
        match read_level_file(&path) {
            Ok(def) => results.push(def),
            Err(e) => warn!("skipping {}: {e}", path.display()),
        }
    }
    results
}

fn read_level_file(path: &Path) -> Result<LevelDef, LevelError> {
    let text = std::fs::read_to_string(path)?;
    LevelDef::from_toml_str(&text)
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

pub fn embedded_levels() -> Vec<LevelDef> {
    let small = Field::new(200, 200, 400, 400);
    let wide = Field::new(100, 150, 500, 450);
    vec![
        LevelDef {
            name: "Open Field".into(),
            field: small,
            player: player_at(300, 400, EdgeSlot::Bottom),
            enemies: vec![wanderer(300, 300)],
        },
        LevelDef {
            name: "Border Patrol".into(),
            field: small,
            player: player_at(300, 400, EdgeSlot::Bottom),
            enemies: vec![wanderer(300, 300), chaser(300, 200, EdgeSlot::Top)],
        },
        LevelDef {
            name: "Crossfire".into(),
            field: wide,
            player: player_at(300, 450, EdgeSlot::Bottom),
            enemies: vec![
                wanderer(220, 260),
                wanderer(380, 340),
                chaser(300, 150, EdgeSlot::Top),
                chaser(100, 300, EdgeSlot::Left),
            ],
        },
    ]
}

fn player_at(x: i32, y: i32, start_edge: EdgeSlot) -> PlayerDef {
    PlayerDef { lives: default_lives(), start: Point::new(x, y), start_edge }
}

fn wanderer(x: i32, y: i32) -> EnemyDef {
    EnemyDef { kind: EnemyKind::Wanderer, start: Point::new(x, y), start_edge: None, confined: true }
}

fn chaser(x: i32, y: i32, edge: EdgeSlot) -> EnemyDef {
    EnemyDef { kind: EnemyKind::Chaser, start: Point::new(x, y), start_edge: Some(edge), confined: true }
}
