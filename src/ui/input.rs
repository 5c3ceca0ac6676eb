/// Keyboard tracker.
///
/// Two views of the same key stream:
///   - held        → continuous movement (WASD / arrows)
///   - fresh press → one-shot actions (blockade, menu keys, editor painting)
///
/// Terminals rarely report key releases, so a key counts as held until
/// `HOLD_TIMEOUT` passes without a Press/Repeat for it. When the renderer
/// enables keyboard enhancement, Release events are honored directly and
/// a key stays held until it is released.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, poll};

use crate::domain::entity::MoveDir;

/// After this long without a Press/Repeat event the key is considered released.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

// ── Key bindings ──

const UP_KEYS: [KeyCode; 3] = [KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const DOWN_KEYS: [KeyCode; 3] = [KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const LEFT_KEYS: [KeyCode; 3] = [KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const RIGHT_KEYS: [KeyCode; 3] = [KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const BLOCKADE_KEYS: [KeyCode; 3] = [KeyCode::Char('q'), KeyCode::Char('Q'), KeyCode::Char(' ')];

pub struct InputState {
    /// Timestamp of the last Press/Repeat per key.
    last_active: HashMap<KeyCode, Instant>,
    /// Keys that went from "not held" to "held" during the last drain.
    fresh_presses: Vec<KeyCode>,
    /// Raw key events from the last drain, for Ctrl+C detection.
    raw_events: Vec<KeyEvent>,
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events without blocking.
    /// Call once per frame, before the simulation tick.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key, Instant::now());
            }
        }
        self.expire(Instant::now());
    }

    /// Feed one key event, as read from the terminal.
    pub fn record(&mut self, key: KeyEvent, now: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            // Unconfirmed releases are left to the timeout
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.held_at(key.code, now);
                self.last_active.insert(key.code, now);
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    fn expire(&mut self, now: Instant) {
        if self.honor_release { return; }
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn held_at(&self, code: KeyCode, now: Instant) -> bool {
        self.last_active
            .get(&code)
            .is_some_and(|t| self.honor_release || now.duration_since(*t) < HOLD_TIMEOUT)
    }

    // ── Raw queries ──

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.held_at(code, Instant::now())
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    /// Fresh printable character, lower-cased.
    pub fn pressed_char(&self) -> Option<char> {
        self.fresh_presses.iter().find_map(|k| match k {
            KeyCode::Char(c) => Some(c.to_ascii_lowercase()),
            _ => None,
        })
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(k.code, KeyCode::Char('c') | KeyCode::Char('C'))
        })
    }

    // ── Game bindings ──

    /// Held movement direction, priority up > down > left > right.
    pub fn movement(&self) -> Option<MoveDir> {
        self.dir_where(|keys| self.any_held(keys))
    }

    /// Freshly pressed direction (editor cursor).
    pub fn pressed_dir(&self) -> Option<MoveDir> {
        self.dir_where(|keys| self.any_pressed(keys))
    }

    pub fn place_blockade_pressed(&self) -> bool {
        self.any_pressed(&BLOCKADE_KEYS)
    }

    fn dir_where(&self, test: impl Fn(&[KeyCode]) -> bool) -> Option<MoveDir> {
        [
            (&UP_KEYS, MoveDir::Up),
            (&DOWN_KEYS, MoveDir::Down),
            (&LEFT_KEYS, MoveDir::Left),
            (&RIGHT_KEYS, MoveDir::Right),
        ]
        .into_iter()
        .find(|(keys, _)| test(keys.as_slice()))
        .map(|(_, d)| d)
    }
}
