// ── Menu bar layout ───────────────────────────────────────────────────────────
//
// Presentation-only description of the menu bar.  Each item points at a
// command by name; the platform layer turns this into native menus and an
// accelerator table.  No platform imports.

use std::fmt;

/// A keyboard shortcut: modifiers plus a single key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accelerator {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    /// An ASCII uppercase letter or digit.
    pub key: char,
}

impl Accelerator {
    const fn ctrl(key: char) -> Self {
        Self {
            ctrl: true,
            shift: false,
            alt: false,
            key,
        }
    }

    const fn ctrl_shift(key: char) -> Self {
        Self {
            ctrl: true,
            shift: true,
            alt: false,
            key,
        }
    }
}

/// Renders as `"Ctrl+Shift+S"`, the form shown after a tab in menu labels.
impl fmt::Display for Accelerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ctrl {
            f.write_str("Ctrl+")?;
        }
        if self.shift {
            f.write_str("Shift+")?;
        }
        if self.alt {
            f.write_str("Alt+")?;
        }
        write!(f, "{}", self.key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    Command {
        label: &'static str,
        command: &'static str,
        accelerator: Option<Accelerator>,
    },
    Separator,
}

impl MenuItem {
    /// The label with its accelerator appended after a tab, as native menus
    /// expect (`"&Save File\tCtrl+S"`).
    pub fn display_label(&self) -> Option<String> {
        match self {
            Self::Command {
                label,
                accelerator: Some(acc),
                ..
            } => Some(format!("{label}\t{acc}")),
            Self::Command { label, .. } => Some((*label).to_owned()),
            Self::Separator => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Submenu {
    pub label: &'static str,
    pub items: &'static [MenuItem],
}

const fn item(label: &'static str, command: &'static str, accelerator: Option<Accelerator>) -> MenuItem {
    MenuItem::Command {
        label,
        command,
        accelerator,
    }
}

// ── Layout ────────────────────────────────────────────────────────────────────

pub static MENU_BAR: &[Submenu] = &[
    Submenu {
        label: "&File",
        items: &[
            item("&New File", "new-file", Some(Accelerator::ctrl('N'))),
            item("&Open File...", "open-file", Some(Accelerator::ctrl('O'))),
            item("&Save File", "save-file", Some(Accelerator::ctrl('S'))),
            item("Save &As...", "save-as", Some(Accelerator::ctrl_shift('S'))),
            MenuItem::Separator,
            item("&Quit", "quit", Some(Accelerator::ctrl('Q'))),
        ],
    },
    Submenu {
        label: "&View",
        items: &[
            item("Toggle &Developer Tools", "toggle-devtools", Some(Accelerator::ctrl_shift('I'))),
            item("Toggle &Terminal", "toggle-terminal", Some(Accelerator::ctrl('T'))),
            item("Toggle Side&bar", "toggle-sidebar", Some(Accelerator::ctrl('B'))),
            item("&Clear Terminal", "clear-terminal", None),
        ],
    },
    Submenu {
        label: "&Help",
        items: &[item("&About Tandem", "about", None)],
    },
];

/// Every command item in menu order, flattened across submenus.
pub fn command_items(bar: &'static [Submenu]) -> impl Iterator<Item = &'static MenuItem> {
    bar.iter()
        .flat_map(|s| s.items.iter())
        .filter(|i| matches!(i, MenuItem::Command { .. }))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{lookup, COMMANDS};

    #[test]
    fn every_item_names_a_known_command() {
        for item in command_items(MENU_BAR) {
            if let MenuItem::Command { command, .. } = item {
                assert!(lookup(COMMANDS, command).is_some(), "{command} not in table");
            }
        }
    }

    #[test]
    fn every_command_is_reachable_from_the_menu() {
        for cmd in COMMANDS {
            let found = command_items(MENU_BAR)
                .any(|i| matches!(i, MenuItem::Command { command, .. } if *command == cmd.name));
            assert!(found, "{} has no menu item", cmd.name);
        }
    }

    #[test]
    fn accelerators_are_unique() {
        let accs: Vec<Accelerator> = command_items(MENU_BAR)
            .filter_map(|i| match i {
                MenuItem::Command { accelerator, .. } => *accelerator,
                MenuItem::Separator => None,
            })
            .collect();
        for (i, a) in accs.iter().enumerate() {
            assert!(!accs[i + 1..].contains(a), "{a} bound twice");
        }
    }

    #[test]
    fn display_label_appends_accelerator() {
        let save_as = item("Save &As...", "save-as", Some(Accelerator::ctrl_shift('S')));
        assert_eq!(save_as.display_label().as_deref(), Some("Save &As...\tCtrl+Shift+S"));
        assert_eq!(item("&About", "about", None).display_label().as_deref(), Some("&About"));
        assert_eq!(MenuItem::Separator.display_label(), None);
    }
}
