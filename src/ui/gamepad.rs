/// Gamepad input tracker using gilrs.
///
/// Button roles come from the `[gamepad]` section of config.toml.
/// Default mapping:
///   D-pad / Left Stick    →  Movement
///   A / X                 →  Start incursion
///   Start                 →  Confirm
///   Select                →  Back / Quit
///   Y                     →  Restart level

use std::collections::HashSet;

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::entity::MoveDir;

const STICK_DEADZONE: f32 = 0.25;

/// Physical controls we track. D-pad and stick directions share `Dir`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Control {
    A,
    B,
    X,
    Y,
    L1,
    R1,
    Start,
    Select,
    Dir(MoveDir),
}

impl Control {
    fn from_name(s: &str) -> Option<Control> {
        match s.trim().to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Control::A),
            "B" | "EAST" => Some(Control::B),
            "X" | "WEST" => Some(Control::X),
            "Y" | "NORTH" => Some(Control::Y),
            "L1" | "LB" => Some(Control::L1),
            "R1" | "RB" => Some(Control::R1),
            "START" => Some(Control::Start),
            "SELECT" | "BACK" => Some(Control::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Control> {
        match btn {
            Button::South => Some(Control::A),
            Button::East => Some(Control::B),
            Button::West => Some(Control::X),
            Button::North => Some(Control::Y),
            Button::LeftTrigger => Some(Control::L1),
            Button::RightTrigger => Some(Control::R1),
            Button::Start => Some(Control::Start),
            Button::Select => Some(Control::Select),
            Button::DPadUp => Some(Control::Dir(MoveDir::Up)),
            Button::DPadDown => Some(Control::Dir(MoveDir::Down)),
            Button::DPadLeft => Some(Control::Dir(MoveDir::Left)),
            Button::DPadRight => Some(Control::Dir(MoveDir::Right)),
            _ => None,
        }
    }
}

/// Which controls trigger each action.
struct ActionMap {
    incursion: Vec<Control>,
    confirm: Vec<Control>,
    cancel: Vec<Control>,
    restart: Vec<Control>,
}

impl ActionMap {
    /// Unknown names are ignored; a role left empty keeps its default.
    fn from_config(cfg: &GamepadConfig) -> Self {
        fn pick(names: &[String], fallback: Vec<Control>) -> Vec<Control> {
            let parsed: Vec<Control> = names.iter().filter_map(|s| Control::from_name(s)).collect();
            if parsed.is_empty() { fallback } else { parsed }
        }
        ActionMap {
            incursion: pick(&cfg.incursion, vec![Control::A, Control::X]),
            confirm: pick(&cfg.confirm, vec![Control::Start]),
            cancel: pick(&cfg.cancel, vec![Control::Select]),
            restart: pick(&cfg.restart, vec![Control::Y]),
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    /// Buttons and D-pad directions currently down.
    buttons: HashSet<Control>,
    /// Controls that went down since the last `update`.
    fresh: Vec<Control>,
    /// Left stick (x, y).
    stick: (f32, f32),

    actions: ActionMap,

    pub connected: bool,
}

impl GamepadState {
    pub fn new(cfg: &GamepadConfig) -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(_) => (None, false),
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs,
            buttons: HashSet::new(),
            fresh: Vec::new(),
            stick: (0.0, 0.0),
            actions: ActionMap::from_config(cfg),
            connected,
        }
    }

    pub fn update(&mut self) {
        self.fresh.clear();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };
        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    if let Some(c) = Control::from_gilrs(btn) { self.press(c); }
                }
                EventType::ButtonReleased(btn, _) => {
                    if let Some(c) = Control::from_gilrs(btn) { self.buttons.remove(&c); }
                }
                EventType::AxisChanged(Axis::LeftStickX, v, _) => self.stick.0 = v,
                EventType::AxisChanged(Axis::LeftStickY, v, _) => self.stick.1 = v,
                EventType::Connected => self.connected = true,
                EventType::Disconnected => {
                    self.connected = false;
                    self.buttons.clear();
                    self.stick = (0.0, 0.0);
                }
                _ => {}
            }
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn press(&mut self, c: Control) {
        if self.buttons.insert(c) {
            self.fresh.push(c);
        }
    }

    // ── Action queries ──

    fn any_fresh(&self, controls: &[Control]) -> bool {
        controls.iter().any(|c| self.fresh.contains(c))
    }

    pub fn incursion_pressed(&self) -> bool {
        self.any_fresh(&self.actions.incursion)
    }
    pub fn confirm_pressed(&self) -> bool {
        self.any_fresh(&self.actions.confirm)
    }
    pub fn cancel_pressed(&self) -> bool {
        self.any_fresh(&self.actions.cancel)
    }
    pub fn restart_pressed(&self) -> bool {
        self.any_fresh(&self.actions.restart)
    }

    /// Held direction: D-pad first, then the stick.
    pub fn movement(&self) -> Option<MoveDir> {
        MoveDir::ALL
            .into_iter()
            .find(|&d| self.buttons.contains(&Control::Dir(d)))
            .or_else(|| stick_direction(self.stick.0, self.stick.1))
    }
}

/// Dominant stick axis past the deadzone. gilrs reports +Y as up.
fn stick_direction(x: f32, y: f32) -> Option<MoveDir> {
    if x.abs() < STICK_DEADZONE && y.abs() < STICK_DEADZONE {
        return None;
    }
    if x.abs() >= y.abs() {
        Some(if x < 0.0 { MoveDir::Left } else { MoveDir::Right })
    } else {
        Some(if y > 0.0 { MoveDir::Up } else { MoveDir::Down })
    }
}
