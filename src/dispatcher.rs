// ── Dispatcher ────────────────────────────────────────────────────────────────
//
// The single-threaded core loop.  Every input (menu commands, relay chunks,
// gateway completions, window closes) arrives as an `Event` on one FIFO queue
// and is handled to completion before the next one is looked at.  Handlers
// may post further events; those run afterwards, never nested.
//
// Gateway tasks are the only work done elsewhere.  A `TaskRunner` executes
// them and posts the `Completion` back through an `EventSender`, optionally
// nudging the platform message loop with a waker.

use std::{
    sync::{mpsc, Arc},
    time::Duration,
};

use crate::{
    command::COMMANDS,
    error::Result,
    gateway::{Completion, FileFilter, FilePicker, FilesystemGateway, GatewayRequest, GatewayTask},
    logging,
    message::{Chunk, WindowKind},
    registry::{WindowFactory, WindowRegistry},
    relay::EventRelay,
    router::{CommandRouter, Routed},
};

// ── Events ────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum Event {
    /// A named user command, usually a menu click.
    Command(String),
    /// A chunk emitted by one window for its peer.
    Relay(Chunk),
    /// Gateway work asked for by the Primary's agent.
    Request(GatewayRequest),
    Completed(Completion),
    /// The platform destroyed a window.
    Closed(WindowKind),
    /// The application was re-activated (e.g. relaunched while running).
    Activate,
}

/// Called after every post so a blocked platform loop can wake up.
pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// Cloneable handle for posting events from anywhere, including worker
/// threads.
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::Sender<Event>,
    waker: Option<Waker>,
}

impl EventSender {
    /// Queue `event`.  Returns `false` if the dispatcher is gone.
    pub fn post(&self, event: Event) -> bool {
        if self.tx.send(event).is_err() {
            log::debug!("event posted after dispatcher shut down");
            return false;
        }
        if let Some(wake) = &self.waker {
            wake();
        }
        true
    }

    pub fn command(&self, name: &str) -> bool {
        self.post(Event::Command(name.to_owned()))
    }

    /// Called by the agent hosted in a window to feed its peer.  The Win32
    /// front-end hosts no emitting agent yet.
    pub fn relay(&self, chunk: Chunk) -> bool {
        self.post(Event::Relay(chunk))
    }
}

impl std::fmt::Debug for EventSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSender")
            .field("waker", &self.waker.is_some())
            .finish()
    }
}

/// The dispatcher's inbox together with the sender side handed to
/// everything else.
pub struct EventQueue {
    sender: EventSender,
    inbox: mpsc::Receiver<Event>,
}

impl EventQueue {
    pub fn new(waker: Option<Waker>) -> Self {
        let (tx, inbox) = mpsc::channel();
        Self {
            sender: EventSender { tx, waker },
            inbox,
        }
    }

    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }
}

// ── Task runners ──────────────────────────────────────────────────────────────

/// Executes gateway tasks away from the dispatcher and posts their
/// completion as `Event::Completed`.
///
/// An `Err` means the task never started and no completion will follow.
pub trait TaskRunner {
    fn spawn(&self, task: GatewayTask, events: EventSender) -> Result<()>;
}

/// Runs each gateway task on its own named worker thread.
#[derive(Debug, Default)]
pub struct ThreadRunner;

impl TaskRunner for ThreadRunner {
    fn spawn(&self, task: GatewayTask, events: EventSender) -> Result<()> {
        std::thread::Builder::new()
            .name(format!("gateway-{}", task.id.0))
            .spawn(move || {
                let completion = task.run();
                events.post(Event::Completed(completion));
            })?;
        Ok(())
    }
}

// ── Options ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ShellOptions {
    pub save_filter: FileFilter,
    /// Send `file-error` to the Primary when gateway I/O fails.
    pub report_io_errors: bool,
    /// Quit once neither window is alive.
    pub quit_when_all_closed: bool,
}

impl ShellOptions {
    /// For front-ends that never post `Event::Activate`: nothing could bring
    /// a window back, so the last close always quits.
    pub fn without_reactivation(mut self) -> Self {
        if !self.quit_when_all_closed {
            log::info!("quit_when_all_closed=false needs re-activation; quitting on last close");
            self.quit_when_all_closed = true;
        }
        self
    }
}

impl Default for ShellOptions {
    fn default() -> Self {
        Self {
            save_filter: FileFilter::default(),
            report_io_errors: true,
            quit_when_all_closed: true,
        }
    }
}

// ── Dispatcher ────────────────────────────────────────────────────────────────

/// Whether the loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Dispatcher {
    windows: WindowRegistry,
    router: CommandRouter,
    relay: EventRelay,
    events: EventSender,
    inbox: mpsc::Receiver<Event>,
    quit_when_all_closed: bool,
    quitting: bool,
}

impl Dispatcher {
    pub fn new(
        queue: EventQueue,
        factory: Box<dyn WindowFactory>,
        picker: Arc<dyn FilePicker>,
        runner: Box<dyn TaskRunner>,
        options: ShellOptions,
    ) -> Self {
        let EventQueue { sender, inbox } = queue;
        let gateway = FilesystemGateway::new(picker, options.save_filter);
        let router = CommandRouter::new(COMMANDS, gateway, runner, sender.clone(), options.report_io_errors);
        Self {
            windows: WindowRegistry::new(factory),
            router,
            relay: EventRelay::new(),
            events: sender,
            inbox,
            quit_when_all_closed: options.quit_when_all_closed,
            quitting: false,
        }
    }

    /// Construct the Primary window.  Called once before the loop starts.
    pub fn start(&mut self) -> Result<()> {
        self.windows.open_primary()?;
        Ok(())
    }

    pub fn sender(&self) -> EventSender {
        self.events.clone()
    }

    pub fn windows(&self) -> &WindowRegistry {
        &self.windows
    }

    pub fn is_quitting(&self) -> bool {
        self.quitting
    }

    /// Handle every queued event, in order, until the queue is empty or a
    /// handler asks to quit.
    pub fn run_until_idle(&mut self) -> Flow {
        while !self.quitting {
            match self.inbox.try_recv() {
                Ok(event) => {
                    self.handle(event);
                }
                Err(_) => break,
            }
        }
        self.flow()
    }

    /// Block for at most `timeout` waiting for one event, then drain the
    /// queue.  Returns `None` if nothing arrived.
    pub fn wait_for_event(&mut self, timeout: Duration) -> Option<Flow> {
        if self.quitting {
            return Some(Flow::Quit);
        }
        let event = self.inbox.recv_timeout(timeout).ok()?;
        self.handle(event);
        Some(self.run_until_idle())
    }

    /// Handle a single event.
    pub fn handle(&mut self, event: Event) -> Flow {
        match event {
            Event::Command(name) => self.on_command(&name),
            Event::Relay(chunk) => {
                self.relay.relay(&self.windows, chunk);
            }
            Event::Request(request) => {
                self.router.request(request, &self.windows);
            }
            Event::Completed(completion) => {
                self.router.complete(completion, &self.windows);
            }
            Event::Closed(kind) => {
                self.windows.on_closed(kind);
                if self.windows.is_empty() && self.quit_when_all_closed {
                    log::info!("last window closed; quitting");
                    self.quitting = true;
                }
            }
            Event::Activate => {
                if self.windows.primary().is_none() {
                    if let Err(e) = self.windows.open_primary() {
                        log::error!("re-activation failed: {e}");
                    }
                }
            }
        }
        self.flow()
    }

    fn on_command(&mut self, name: &str) {
        match self.router.dispatch(name, &mut self.windows) {
            Ok(Routed::Quit) => {
                log::info!("quit requested");
                self.quitting = true;
            }
            Ok(Routed::ToggleDiagnostics) => {
                let verbose = logging::toggle_verbose();
                log::info!("diagnostics {}", if verbose { "on" } else { "off" });
                self.log_snapshot();
            }
            Ok(routed) => log::trace!("{name}: {routed:?}"),
            Err(e) => log::warn!("{e}"),
        }
    }

    fn log_snapshot(&self) {
        let stats = self.relay.stats();
        log::info!(
            "primary={:?} secondary={:?} ({:?}) tasks_in_flight={} relayed={} dropped={} bytes={}",
            self.windows.primary().map(|h| h.id),
            self.windows.secondary().map(|h| h.id),
            self.windows.secondary_state(),
            self.router.in_flight(),
            stats.forwarded,
            stats.dropped,
            stats.bytes_forwarded,
        );
    }

    fn flow(&self) -> Flow {
        if self.quitting {
            Flow::Quit
        } else {
            Flow::Continue
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
