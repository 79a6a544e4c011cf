/// Keyboard input tracker.
///
/// Keys are folded into `Key` actions as they arrive:
///   - Movement is held-state: continuous while a direction key is held.
///     When several are held the most recently pressed one wins.
///   - Everything else (incursion, pause, restart, confirm, back) is
///     edge-triggered and fires once per press.
///
/// Terminals that report key Release events (keyboard enhancement on)
/// release held keys explicitly; elsewhere a hold expires after
/// `HOLD_TIMEOUT` without a Press/Repeat.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::MoveDir;

const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Key {
    Move(MoveDir),
    Incursion,
    Pause,
    Restart,
    Confirm,
    Back,
    Quit,
}

impl Key {
    pub fn from_event(key: &KeyEvent) -> Option<Key> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') | KeyCode::Char('C') => Some(Key::Quit),
                _ => None,
            };
        }
        match key.code {
            KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Key::Move(MoveDir::Left)),
            KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Key::Move(MoveDir::Right)),
            KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Some(Key::Move(MoveDir::Up)),
            KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(Key::Move(MoveDir::Down)),
            KeyCode::Char(' ') => Some(Key::Incursion),
            KeyCode::F(1) => Some(Key::Pause),
            KeyCode::Char('r') | KeyCode::Char('R') => Some(Key::Restart),
            KeyCode::Enter => Some(Key::Confirm),
            KeyCode::Esc => Some(Key::Back),
            _ => None,
        }
    }
}

pub struct InputState {
    /// Last Press/Repeat time of each held key.
    held: HashMap<Key, Instant>,
    /// Press order of held directions, newest last.
    dir_order: Vec<MoveDir>,
    /// Keys that went from released to held during the last drain.
    fresh: Vec<Key>,
    /// Only true when keyboard enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            held: HashMap::with_capacity(8),
            dir_order: Vec::with_capacity(4),
            fresh: Vec::with_capacity(4),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events. Call once per frame, before the tick.
    pub fn drain_events(&mut self) {
        self.begin_frame();
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.handle_key(&key, Instant::now());
            }
        }
        self.expire(Instant::now());
    }

    pub fn begin_frame(&mut self) {
        self.fresh.clear();
    }

    pub fn handle_key(&mut self, key: &KeyEvent, now: Instant) {
        let k = match Key::from_event(key) {
            Some(k) => k,
            None => return,
        };
        match key.kind {
            KeyEventKind::Release if self.honor_release => self.release(k),
            KeyEventKind::Release => {}
            _ => {
                if self.held.insert(k, now).is_none() {
                    self.fresh.push(k);
                    if let Key::Move(d) = k {
                        self.dir_order.retain(|&o| o != d);
                        self.dir_order.push(d);
                    }
                }
            }
        }
    }

    /// Drop holds with no Press/Repeat inside `HOLD_TIMEOUT`.
    pub fn expire(&mut self, now: Instant) {
        let stale: Vec<Key> = self
            .held
            .iter()
            .filter(|(_, t)| now.duration_since(**t) >= HOLD_TIMEOUT)
            .map(|(k, _)| *k)
            .collect();
        for k in stale {
            self.release(k);
        }
    }

    /// Newest held direction, if any.
    pub fn movement(&self) -> Option<MoveDir> {
        self.dir_order.last().copied()
    }

    /// Edge trigger: was `key` freshly pressed this frame?
    pub fn pressed(&self, key: Key) -> bool {
        self.fresh.contains(&key)
    }

    fn release(&mut self, k: Key) {
        self.held.remove(&k);
        if let Key::Move(d) = k {
            self.dir_order.retain(|&o| o != d);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn release(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Release)
    }

    #[test]
    fn keys_map_to_actions() {
        assert_eq!(Key::from_event(&press(KeyCode::Left)), Some(Key::Move(MoveDir::Left)));
        assert_eq!(Key::from_event(&press(KeyCode::Char('w'))), Some(Key::Move(MoveDir::Up)));
        assert_eq!(Key::from_event(&press(KeyCode::Char(' '))), Some(Key::Incursion));
        assert_eq!(Key::from_event(&press(KeyCode::F(1))), Some(Key::Pause));
        assert_eq!(Key::from_event(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)), Some(Key::Quit));
        assert_eq!(Key::from_event(&press(KeyCode::Char('z'))), None);
    }

    #[test]
    fn newest_direction_wins() {
        let mut input = InputState::new();
        let now = Instant::now();
        input.handle_key(&press(KeyCode::Left), now);
        input.handle_key(&press(KeyCode::Up), now);
        assert_eq!(input.movement(), Some(MoveDir::Up));

        input.honor_release = true;
        input.handle_key(&release(KeyCode::Up), now);
        assert_eq!(input.movement(), Some(MoveDir::Left));
    }

    #[test]
    fn repeat_is_not_a_fresh_press() {
        let mut input = InputState::new();
        let now = Instant::now();
        input.handle_key(&press(KeyCode::Char(' ')), now);
        assert!(input.pressed(Key::Incursion));

        input.begin_frame();
        input.handle_key(&press(KeyCode::Char(' ')), now);
        assert!(!input.pressed(Key::Incursion));
    }

    #[test]
    fn holds_expire_without_release_events() {
        let mut input = InputState::new();
        let t0 = Instant::now();
        input.handle_key(&press(KeyCode::Right), t0);
        input.handle_key(&release(KeyCode::Right), t0);
        assert_eq!(input.movement(), Some(MoveDir::Right));

        input.expire(t0 + HOLD_TIMEOUT);
        assert_eq!(input.movement(), None);
    }
}
