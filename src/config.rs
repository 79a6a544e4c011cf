/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::resolver::SplitRule;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub speed: SpeedConfig,
    pub rules: RulesConfig,
    pub gamepad: GamepadConfig,
    pub levels_dir: PathBuf,
    pub seed: u64,
    pub log_file: Option<PathBuf>,
    pub log_level: String,
}

#[derive(Clone, Debug)]
pub struct SpeedConfig {
    pub tick_rate_ms: u64,
    pub player_step: i32,
    pub wanderer_step: i32,
    pub chaser_step: i32,
}

#[derive(Clone, Debug)]
pub struct RulesConfig {
    pub split_rule: SplitRule,
    pub capture_target_percent: u32,
    pub hit_cooldown_ticks: u32,   // 0 = every overlapping tick costs a life
    pub chase_radius: i32,
    pub player_radius: i32,
    pub wanderer_radius: i32,
    pub chaser_radius: i32,
    pub wander_min_ticks: u32,
    pub wander_max_ticks: u32,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub incursion: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub restart: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_player_step")]
    player_step: i32,
    #[serde(default = "default_wanderer_step")]
    wanderer_step: i32,
    #[serde(default = "default_chaser_step")]
    chaser_step: i32,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default)]
    split_rule: SplitRule,
    #[serde(default = "default_capture_target")]
    capture_target_percent: u32,
    #[serde(default)]
    hit_cooldown_ticks: u32,
    #[serde(default = "default_chase_radius")]
    chase_radius: i32,
    #[serde(default = "default_player_radius")]
    player_radius: i32,
    #[serde(default = "default_wanderer_radius")]
    wanderer_radius: i32,
    #[serde(default = "default_chaser_radius")]
    chaser_radius: i32,
    #[serde(default = "default_wander_min")]
    wander_min_ticks: u32,
    #[serde(default = "default_wander_max")]
    wander_max_ticks: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_incursion")]
    incursion: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_restart")]
    restart: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default = "default_seed")]
    seed: u64,
    #[serde(default)]
    log_file: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 16 }       // ~60 Hz
fn default_player_step() -> i32 { 5 }
fn default_wanderer_step() -> i32 { 3 }
fn default_chaser_step() -> i32 { 2 }
fn default_capture_target() -> u32 { 75 }
fn default_chase_radius() -> i32 { 100 }
fn default_player_radius() -> i32 { 10 }
fn default_wanderer_radius() -> i32 { 12 }
fn default_chaser_radius() -> i32 { 6 }
fn default_wander_min() -> u32 { 20 }
fn default_wander_max() -> u32 { 80 }

fn default_incursion() -> Vec<String> { vec!["A".into(), "X".into()] }
fn default_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }
fn default_restart() -> Vec<String> { vec!["Y".into()] }
fn default_levels_dir() -> String { "levels".into() }
fn default_seed() -> u64 { 0x51_78 }
fn default_log_level() -> String { "info".into() }

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            tick_rate_ms: default_tick_rate(),
            player_step: default_player_step(),
            wanderer_step: default_wanderer_step(),
            chaser_step: default_chaser_step(),
        }
    }
}

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules {
            split_rule: SplitRule::default(),
            capture_target_percent: default_capture_target(),
            hit_cooldown_ticks: 0,
            chase_radius: default_chase_radius(),
            player_radius: default_player_radius(),
            wanderer_radius: default_wanderer_radius(),
            chaser_radius: default_chaser_radius(),
            wander_min_ticks: default_wander_min(),
            wander_max_ticks: default_wander_max(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            incursion: default_incursion(),
            confirm: default_confirm(),
            cancel: default_cancel(),
            restart: default_restart(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            seed: default_seed(),
            log_file: String::new(),
            log_level: default_log_level(),
        }
    }
}

impl Default for SpeedConfig {
    fn default() -> Self {
        TomlSpeed::default().into()
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        TomlRules::default().into()
    }
}

impl From<TomlSpeed> for SpeedConfig {
    fn from(t: TomlSpeed) -> Self {
        SpeedConfig {
            tick_rate_ms: t.tick_rate_ms.max(1),
            player_step: t.player_step.max(1),
            wanderer_step: t.wanderer_step.max(1),
            chaser_step: t.chaser_step.max(1),
        }
    }
}

impl From<TomlRules> for RulesConfig {
    fn from(t: TomlRules) -> Self {
        RulesConfig {
            split_rule: t.split_rule,
            capture_target_percent: t.capture_target_percent.min(100),
            hit_cooldown_ticks: t.hit_cooldown_ticks,
            chase_radius: t.chase_radius,
            player_radius: t.player_radius,
            wanderer_radius: t.wanderer_radius,
            chaser_radius: t.chaser_radius,
            wander_min_ticks: t.wander_min_ticks.max(1),
            wander_max_ticks: t.wander_max_ticks.max(t.wander_min_ticks.max(1)),
        }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::resolve(toml_cfg, &search_dirs)
    }

    /// Parse a config document directly (no filesystem search for the file).
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        let toml_cfg = toml::from_str::<TomlConfig>(text)?;
        Ok(Self::resolve(toml_cfg, &[]))
    }

    fn resolve(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        let general = toml_cfg.general;

        // Relative levels dir: first candidate dir that has it, else CWD-relative
        let levels_dir = if PathBuf::from(&general.levels_dir).is_absolute() {
            PathBuf::from(&general.levels_dir)
        } else {
            search_dirs.iter()
                .map(|d| d.join(&general.levels_dir))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(&general.levels_dir))
        };

        let log_file = if general.log_file.trim().is_empty() {
            None
        } else {
            Some(PathBuf::from(general.log_file.trim()))
        };

        GameConfig {
            speed: toml_cfg.speed.into(),
            rules: toml_cfg.rules.into(),
            gamepad: GamepadConfig {
                incursion: toml_cfg.gamepad.incursion,
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
                restart: toml_cfg.gamepad.restart,
            },
            levels_dir,
            seed: general.seed,
            log_file,
            log_level: general.log_level,
        }
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
/// Runs before logging is up, so problems go to stderr.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        eprintln!("Warning: config.toml parse error: {e}");
                        eprintln!("Using default settings.");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let cfg = GameConfig::from_toml_str("").expect("parses");
        assert_eq!(cfg.speed.tick_rate_ms, 16);
        assert_eq!(cfg.speed.player_step, 5);
        assert_eq!(cfg.rules.split_rule, SplitRule::Area);
        assert_eq!(cfg.rules.chase_radius, 100);
        assert_eq!(cfg.rules.player_radius, 10);
        assert_eq!(cfg.rules.hit_cooldown_ticks, 0);
        assert_eq!(cfg.rules.capture_target_percent, 75);
        assert_eq!(cfg.levels_dir, PathBuf::from("levels"));
        assert!(cfg.log_file.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::from_toml_str(
            r#"
            [rules]
            split_rule = "stitch"
            hit_cooldown_ticks = 60

            [general]
            seed = 99
            log_file = "qixline.log"
            "#,
        )
        .expect("parses");
        assert_eq!(cfg.rules.split_rule, SplitRule::Stitch);
        assert_eq!(cfg.rules.hit_cooldown_ticks, 60);
        assert_eq!(cfg.rules.wander_max_ticks, 80);
        assert_eq!(cfg.speed.player_step, 5);
        assert_eq!(cfg.seed, 99);
        assert_eq!(cfg.log_file, Some(PathBuf::from("qixline.log")));
    }

    #[test]
    fn bad_values_are_sanitized() {
        let cfg = GameConfig::from_toml_str(
            r#"
            [speed]
            player_step = 0
            [rules]
            capture_target_percent = 250
            wander_min_ticks = 50
            wander_max_ticks = 10
            "#,
        )
        .expect("parses");
        assert_eq!(cfg.speed.player_step, 1);
        assert_eq!(cfg.rules.capture_target_percent, 100);
        assert!(cfg.rules.wander_max_ticks >= cfg.rules.wander_min_ticks);
    }

    #[test]
    fn unknown_split_rule_is_an_error() {
        assert!(GameConfig::from_toml_str("[rules]\nsplit_rule = \"magic\"").is_err());
    }
}
