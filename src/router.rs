// ── Command router ────────────────────────────────────────────────────────────
//
// Resolves command names against the static table and carries out the
// resulting action: a notification to one window, or a gateway task whose
// completion comes back through `complete`.

use crate::{
    command::{lookup, Action, Command},
    dispatcher::{EventSender, TaskRunner},
    error::{Result, ShellError},
    gateway::{Completion, FilesystemGateway, GatewayOutcome, GatewayRequest, TaskId},
    message::{Message, WindowKind},
    registry::{Delivery, WindowId, WindowRegistry},
};

/// What a dispatched command ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    /// A message reached its window, or was dropped because it was absent.
    Sent(WindowKind, Delivery),
    TaskStarted(TaskId),
    /// The runner could not start the task; it was completed as a failure.
    TaskFailed(TaskId),
    /// A gateway request had nothing to work on (no Primary window).
    Skipped,
    SecondaryReady(WindowId),
    Quit,
    ToggleDiagnostics,
}

pub struct CommandRouter {
    table: &'static [Command],
    gateway: FilesystemGateway,
    runner: Box<dyn TaskRunner>,
    events: EventSender,
    report_io_errors: bool,
    in_flight: usize,
}

impl CommandRouter {
    pub fn new(
        table: &'static [Command],
        gateway: FilesystemGateway,
        runner: Box<dyn TaskRunner>,
        events: EventSender,
        report_io_errors: bool,
    ) -> Self {
        Self {
            table,
            gateway,
            runner,
            events,
            report_io_errors,
            in_flight: 0,
        }
    }

    /// Gateway tasks started and not yet completed.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Look up `name` and perform its action.
    ///
    /// Unknown names fail with `UnknownCommand` before any window is touched.
    pub fn dispatch(&mut self, name: &str, windows: &mut WindowRegistry) -> Result<Routed> {
        let command = lookup(self.table, name)
            .ok_or_else(|| ShellError::UnknownCommand(name.to_owned()))?;
        log::debug!("command {} → {:?}", command.name, command.action);

        let routed = match command.action {
            Action::SendToPrimary(n) => {
                Routed::Sent(WindowKind::Primary, windows.send(WindowKind::Primary, &n.into()))
            }
            Action::SendToSecondary(n) => Routed::Sent(
                WindowKind::Secondary,
                windows.send(WindowKind::Secondary, &n.into()),
            ),
            Action::InvokeGateway(op) => self.request(op.into(), windows),
            Action::RevealSecondary => Routed::SecondaryReady(windows.get_or_create_secondary()?.id),
            Action::Quit => Routed::Quit,
            Action::ToggleDiagnostics => Routed::ToggleDiagnostics,
        };
        Ok(routed)
    }

    /// Start gateway work.  Save requests snapshot the Primary's buffer now;
    /// without a Primary there is nothing to save and the request is skipped.
    pub fn request(&mut self, request: GatewayRequest, windows: &WindowRegistry) -> Routed {
        let task = match request {
            GatewayRequest::Open => self.gateway.request_open(),
            GatewayRequest::SaveAs | GatewayRequest::Save(_) => {
                let Some(primary) = windows.primary() else {
                    log::warn!("save requested with no primary window; ignored");
                    return Routed::Skipped;
                };
                let content = primary.surface().buffer_text().unwrap_or_default();
                match request {
                    GatewayRequest::Save(path) => self.gateway.request_write(path, content),
                    _ => self.gateway.request_save(content),
                }
            }
        };
        let id = task.id;
        log::info!("gateway task {id:?} ({}) started", task.label);
        self.in_flight += 1;
        match self.runner.spawn(task, self.events.clone()) {
            Ok(()) => Routed::TaskStarted(id),
            Err(e) => {
                self.complete(
                    Completion {
                        task: id,
                        outcome: GatewayOutcome::Failed(e),
                    },
                    windows,
                );
                Routed::TaskFailed(id)
            }
        }
    }

    /// Turn a finished gateway task into a message for the Primary window.
    ///
    /// Returns `None` when nothing was sent (cancelled, or an unreported
    /// failure).
    pub fn complete(&mut self, completion: Completion, windows: &WindowRegistry) -> Option<Delivery> {
        self.in_flight = self.in_flight.saturating_sub(1);
        let message = match completion.outcome {
            GatewayOutcome::Opened(file) => {
                log::info!("task {:?}: opened {}", completion.task, file.path.display());
                Message::FileOpened {
                    path: file.path,
                    content: file.content,
                }
            }
            GatewayOutcome::Saved(path) => {
                log::info!("task {:?}: saved {}", completion.task, path.display());
                Message::FileSaved { path }
            }
            GatewayOutcome::Cancelled => {
                log::debug!("task {:?}: cancelled by user", completion.task);
                return None;
            }
            GatewayOutcome::Failed(e) => {
                log::error!("task {:?}: {e}", completion.task);
                if !self.report_io_errors {
                    return None;
                }
                Message::FileError {
                    path: e.path().map(|p| p.to_path_buf()),
                    reason: e.to_string(),
                }
            }
        };
        Some(windows.send(WindowKind::Primary, &message))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
