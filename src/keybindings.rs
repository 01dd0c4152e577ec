use std::collections::HashMap;
use std::hash::Hash;

use crossterm::event::{KeyCode, KeyModifiers};

// ─── Generic key binding infrastructure ────────────────────────────────

/// A key combination (key code + modifiers).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyBind {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

/// Reverse-lookup map: KeyBind → Action, plus display strings per action.
pub struct ActionMap<A> {
    map: HashMap<KeyBind, A>,
    display: HashMap<A, Vec<String>>,
}

impl<A: Copy + Eq + Hash> ActionMap<A> {
    pub fn build(bindings: &[(A, &[&str])]) -> Self {
        let mut map = HashMap::new();
        let mut display: HashMap<A, Vec<String>> = HashMap::new();

        for (action, key_strings) in bindings {
            for key_str in key_strings.iter() {
                for bind in parse_key(key_str) {
                    map.insert(bind, *action);
                }
                display
                    .entry(*action)
                    .or_default()
                    .push(format_key_display(key_str));
            }
        }

        Self { map, display }
    }

    pub fn keys(&self, action: A) -> &[String] {
        self.display.get(&action).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// First display key for an action, or "" when unbound.
    pub fn first_key(&self, action: A) -> &str {
        self.keys(action).first().map(|s| s.as_str()).unwrap_or("")
    }

    pub fn lookup(&self, code: KeyCode, modifiers: KeyModifiers) -> Option<A> {
        let bind = KeyBind { code, modifiers };
        if let Some(action) = self.map.get(&bind) {
            return Some(*action);
        }
        // crossterm may report SHIFT for uppercase letters and shifted symbols.
        if let KeyCode::Char(_) = code {
            if modifiers.contains(KeyModifiers::SHIFT) {
                let stripped = modifiers & !KeyModifiers::SHIFT;
                let bind2 = KeyBind { code, modifiers: stripped };
                return self.map.get(&bind2).copied();
            }
        }
        None
    }
}

// ─── Key string parsing ───────────────────────────────────────────────

/// Parse `"pageup"`, `"space"`, `"q"` into key binds. Letters bind both
/// cases.
pub fn parse_key(s: &str) -> Vec<KeyBind> {
    let key = s.trim().to_lowercase();
    let code = match key.as_str() {
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "enter" => KeyCode::Enter,
        "tab" => KeyCode::Tab,
        "space" => KeyCode::Char(' '),
        "backspace" => KeyCode::Backspace,
        "pageup" => KeyCode::PageUp,
        "pagedown" => KeyCode::PageDown,
        k => {
            let mut chars = k.chars();
            match (chars.next(), chars.next()) {
                (Some(ch), None) => KeyCode::Char(ch),
                _ => return Vec::new(),
            }
        }
    };

    let modifiers = KeyModifiers::NONE;
    match code {
        KeyCode::Char(ch) if ch.is_ascii_alphabetic() => vec![
            KeyBind { code: KeyCode::Char(ch.to_ascii_lowercase()), modifiers },
            KeyBind { code: KeyCode::Char(ch.to_ascii_uppercase()), modifiers },
        ],
        _ => vec![KeyBind { code, modifiers }],
    }
}

/// `"pageup"` → `"PgUp"`, `"up"` → `"↑"`, `"c"` → `"c"`.
pub fn format_key_display(s: &str) -> String {
    let key = s.trim().to_lowercase();
    match key.as_str() {
        "up" => "↑",
        "down" => "↓",
        "left" => "←",
        "right" => "→",
        "enter" => "Enter",
        "tab" => "Tab",
        "space" => "Space",
        "backspace" => "Backspace",
        "pageup" => "PgUp",
        "pagedown" => "PgDn",
        other => other,
    }
    .to_string()
}

// ─── Dashboard context ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DashboardAction {
    Quit,
    MoveUp,
    MoveDown,
    FocusSource,
    FocusDestination,
    SwitchPanel,
    Open,
    ParentDir,
    ToggleSelect,
    SetCopy,
    SetMove,
    OutputProgress,
    OutputLog,
    Attached,
    Detached,
    ScrollOutputUp,
    ScrollOutputDown,
    Run,
}

pub const DEFAULT_BINDINGS: &[(DashboardAction, &[&str])] = &[
    (DashboardAction::MoveUp, &["up"]),
    (DashboardAction::MoveDown, &["down"]),
    (DashboardAction::FocusSource, &["left"]),
    (DashboardAction::FocusDestination, &["right"]),
    (DashboardAction::SwitchPanel, &["tab"]),
    (DashboardAction::Open, &["enter"]),
    (DashboardAction::ParentDir, &["backspace"]),
    (DashboardAction::ToggleSelect, &["space"]),
    (DashboardAction::SetCopy, &["c"]),
    (DashboardAction::SetMove, &["m"]),
    (DashboardAction::OutputProgress, &["p"]),
    (DashboardAction::OutputLog, &["l"]),
    (DashboardAction::Attached, &["a"]),
    (DashboardAction::Detached, &["d"]),
    (DashboardAction::ScrollOutputUp, &["pageup"]),
    (DashboardAction::ScrollOutputDown, &["pagedown"]),
    (DashboardAction::Run, &["r"]),
    (DashboardAction::Quit, &["q"]),
];

pub type DashboardKeybindings = ActionMap<DashboardAction>;

pub fn dashboard_keybindings() -> DashboardKeybindings {
    ActionMap::build(DEFAULT_BINDINGS)
}

/// Legend entries in display order: (actions sharing one slot, label).
pub const LEGEND: &[(&[DashboardAction], &str)] = &[
    (&[DashboardAction::MoveUp, DashboardAction::MoveDown], "Navigate"),
    (&[DashboardAction::FocusSource, DashboardAction::FocusDestination], "Switch"),
    (&[DashboardAction::Open], "Open"),
    (&[DashboardAction::ParentDir], "Up"),
    (&[DashboardAction::ToggleSelect], "Select"),
    (&[DashboardAction::SetCopy], "Copy"),
    (&[DashboardAction::SetMove], "Move"),
    (&[DashboardAction::OutputProgress], "Progress"),
    (&[DashboardAction::OutputLog], "Log"),
    (&[DashboardAction::Attached], "Attached"),
    (&[DashboardAction::Detached], "Detached"),
    (&[DashboardAction::Run], "Run"),
    (&[DashboardAction::ScrollOutputUp], "Scroll Up"),
    (&[DashboardAction::ScrollOutputDown], "Scroll Down"),
    (&[DashboardAction::Quit], "Quit"),
];
