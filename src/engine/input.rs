use std::collections::HashMap;
use std::io;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};

/// Parse a key binding string from the config file.
///
/// Accepts named keys ("Up", "Down", "Left", "Right", "Enter", "Esc",
/// "Space", "Tab", "Backspace") case-insensitively, or a single character.
/// Letters are normalized to lowercase so bindings match with or without Shift.
pub fn parse_key(binding: &str) -> Result<KeyCode> {
    let trimmed = binding.trim();
    let code = match trimmed.to_ascii_lowercase().as_str() {
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "enter" | "return" => KeyCode::Enter,
        "esc" | "escape" => KeyCode::Esc,
        "space" => KeyCode::Char(' '),
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        _ => {
            let mut chars = trimmed.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c.to_ascii_lowercase()),
                _ => bail!("unrecognized key binding {:?}", binding),
            }
        }
    };
    Ok(code)
}

fn normalize(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

/// Tracks which keys are currently held.
///
/// Terminals only report key releases when keyboard enhancement is active.
/// Without it a key counts as held for `hold_window` after its last press or
/// auto-repeat event.
#[derive(Debug)]
pub struct KeyboardState {
    last_seen: HashMap<KeyCode, Instant>,
    reports_release: bool,
    hold_window: Duration,
    now: Instant,
}

impl KeyboardState {
    pub fn new(reports_release: bool, hold_window: Duration) -> Self {
        Self {
            last_seen: HashMap::new(),
            reports_release,
            hold_window,
            now: Instant::now(),
        }
    }

    /// Advance the clock used by `is_down` and drop expired holds.
    pub fn begin_frame(&mut self, now: Instant) {
        self.now = now;
        if !self.reports_release {
            let window = self.hold_window;
            self.last_seen
                .retain(|_, seen| now.saturating_duration_since(*seen) <= window);
        }
    }

    /// Record a key event. Returns the key if this was a fresh key-down.
    pub fn apply(&mut self, key: &KeyEvent) -> Option<KeyCode> {
        let code = normalize(key.code);
        match key.kind {
            KeyEventKind::Press => {
                let fresh = self.reports_release || !self.is_down(code);
                self.last_seen.insert(code, self.now);
                // Repeats arrive as Press when the terminal can't tell them apart
                fresh.then_some(code)
            }
            KeyEventKind::Repeat => {
                self.last_seen.insert(code, self.now);
                None
            }
            KeyEventKind::Release => {
                self.last_seen.remove(&code);
                None
            }
        }
    }

    pub fn is_down(&self, code: KeyCode) -> bool {
        match self.last_seen.get(&normalize(code)) {
            None => false,
            Some(_) if self.reports_release => true,
            Some(seen) => self.now.saturating_duration_since(*seen) <= self.hold_window,
        }
    }
}

/// Drain all pending key events without blocking.
pub fn poll_events() -> io::Result<Vec<KeyEvent>> {
    let mut keys = Vec::new();

    while event::poll(Duration::from_millis(0))? {
        if let Event::Key(key) = event::read()? {
            keys.push(key);
        }
    }

    Ok(keys)
}
