use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A shell command a key can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Undo,
    Redo,
    Yank,
    Cut,
    Delete,
    Paste,
    SelectNext,
    SelectPrev,
    DeselectAll,
    InsertRight,
    InsertBelow,
    Edit,
    Escape,
    ResetViewport,
    ScrollLeft,
    ScrollRight,
    ScrollUp,
    ScrollDown,
    BringToFront,
    SendToBack,
    ShowText,
    Quit,
}

/// Key names to actions.
#[derive(Debug, Clone)]
pub struct Keymap {
    bindings: HashMap<String, Action>,
}

impl Keymap {
    /// A keymap with no bindings.
    pub fn empty() -> Self {
        Self {
            bindings: HashMap::new(),
        }
    }

    /// Binds `key`, replacing any earlier binding. Returns the replaced action.
    pub fn bind(&mut self, key: &str, action: Action) -> Option<Action> {
        self.bindings.insert(normalize_key(key), action)
    }

    pub fn resolve(&self, key: &str) -> Option<Action> {
        self.bindings.get(&normalize_key(key)).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Default for Keymap {
    fn default() -> Self {
        let mut keymap = Self::empty();
        let defaults = [
            ("ctrl+z", Action::Undo),
            ("u", Action::Undo),
            ("ctrl+shift+z", Action::Redo),
            ("ctrl+y", Action::Redo),
            ("ctrl+r", Action::Redo),
            ("y", Action::Yank),
            ("x", Action::Cut),
            ("delete", Action::Delete),
            ("p", Action::Paste),
            ("ctrl+v", Action::Paste),
            ("tab", Action::SelectNext),
            ("j", Action::SelectNext),
            ("l", Action::SelectNext),
            ("shift+tab", Action::SelectPrev),
            ("k", Action::SelectPrev),
            ("h", Action::SelectPrev),
            ("shift+h", Action::ShowText),
            ("ctrl+h", Action::ScrollLeft),
            ("ctrl+j", Action::ScrollDown),
            ("ctrl+k", Action::ScrollUp),
            ("ctrl+l", Action::ScrollRight),
            ("q", Action::Quit),
            ("i", Action::InsertRight),
            ("o", Action::InsertBelow),
            ("e", Action::Edit),
            ("esc", Action::Escape),
            ("escape", Action::Escape),
            ("backspace", Action::ResetViewport),
        ];
        for (key, action) in defaults {
            keymap.bind(key, action);
        }
        keymap
    }
}

/// Canonical form of a key name: lowercase, no spaces, modifiers in a fixed order.
pub fn normalize_key(key: &str) -> String {
    let lowered = key.trim().to_lowercase().replace(' ', "");
    let mut parts: Vec<&str> = lowered.split('+').filter(|part| !part.is_empty()).collect();
    let Some(base) = parts.pop() else {
        return lowered.clone();
    };

    let mut modifiers: Vec<&str> = parts
        .into_iter()
        .map(|modifier| match modifier {
            "control" => "ctrl",
            "option" => "alt",
            other => other,
        })
        .collect();
    modifiers.sort_by_key(|modifier| match *modifier {
        "ctrl" => 0,
        "alt" => 1,
        "shift" => 2,
        _ => 3,
    });
    modifiers.dedup();

    modifiers.push(base);
    modifiers.join("+")
}
