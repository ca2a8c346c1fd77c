// ── Static command table ──────────────────────────────────────────────────────
//
// Data-only mapping from command name to action.  Labels and accelerators
// live in `menu`; nothing here knows about presentation, so the router can
// be exercised without building any UI.

use crate::message::Notification;

/// Gateway operations that a command can trigger directly.  Opening goes
/// through the Primary's agent (`open-file`), so only Save As is here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayOp {
    /// Pick a destination and write the Primary's buffer to it.
    SaveAs,
}

/// What a command does once the router resolves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SendToPrimary(Notification),
    SendToSecondary(Notification),
    InvokeGateway(GatewayOp),
    /// Make the Secondary window Ready: construct it if absent, else show it.
    RevealSecondary,
    Quit,
    /// Flip diagnostic logging on or off.
    ToggleDiagnostics,
}

/// An immutable `{name, action}` descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub name: &'static str,
    pub action: Action,
}

const fn command(name: &'static str, action: Action) -> Command {
    Command { name, action }
}

/// Every command the shell understands.
pub static COMMANDS: &[Command] = &[
    command("new-file", Action::SendToPrimary(Notification::NewFile)),
    command("open-file", Action::SendToPrimary(Notification::OpenFile)),
    command("save-file", Action::SendToPrimary(Notification::SaveFile)),
    command("save-as", Action::InvokeGateway(GatewayOp::SaveAs)),
    command("quit", Action::Quit),
    command("toggle-devtools", Action::ToggleDiagnostics),
    command("toggle-terminal", Action::RevealSecondary),
    command("toggle-sidebar", Action::SendToPrimary(Notification::ToggleSidebar)),
    command("clear-terminal", Action::SendToSecondary(Notification::ClearTerminal)),
    command("about", Action::SendToPrimary(Notification::About)),
];

/// Look up `name` in `table`.
pub fn lookup(table: &'static [Command], name: &str) -> Option<&'static Command> {
    table.iter().find(|c| c.name == name)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
