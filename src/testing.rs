// ── Test doubles ──────────────────────────────────────────────────────────────
//
// Display-free stand-ins for the platform seams: recording surfaces, a
// counting window factory, scripted pickers and an inline task runner.

use std::{cell::RefCell, path::PathBuf, rc::Rc, sync::Arc};

use parking_lot::Mutex;

use crate::{
    dispatcher::{Dispatcher, Event, EventQueue, EventSender, ShellOptions, TaskRunner},
    error::{Result, ShellError},
    gateway::{FileFilter, FilePicker, FilesystemGateway, GatewayTask},
    message::{Message, WindowKind},
    registry::{Surface, WindowFactory, WindowId, WindowRegistry},
    command::COMMANDS,
    router::CommandRouter,
};

// ── Surfaces ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct SurfaceRecord {
    messages: Vec<Message>,
    reveals: u32,
    buffer: Option<String>,
}

/// Shared view of what one recording surface received.
#[derive(Debug, Clone, Default)]
pub(crate) struct SurfaceLog(Rc<RefCell<SurfaceRecord>>);

impl SurfaceLog {
    pub(crate) fn messages(&self) -> Vec<Message> {
        self.0.borrow().messages.clone()
    }

    pub(crate) fn reveals(&self) -> u32 {
        self.0.borrow().reveals
    }

    /// Payloads of every `terminal-data` message, in arrival order.
    pub(crate) fn terminal_data(&self) -> Vec<Vec<u8>> {
        self.0
            .borrow()
            .messages
            .iter()
            .filter_map(|m| match m {
                Message::TerminalData(d) => Some(d.clone()),
                _ => None,
            })
            .collect()
    }
}

struct RecordingSurface(SurfaceLog);

impl Surface for RecordingSurface {
    fn deliver(&self, message: &Message) {
        (self.0).0.borrow_mut().messages.push(message.clone());
    }

    fn reveal(&self) {
        (self.0).0.borrow_mut().reveals += 1;
    }

    fn buffer_text(&self) -> Option<String> {
        (self.0).0.borrow().buffer.clone()
    }
}

// ── Factory ───────────────────────────────────────────────────────────────────

#[derive(Default)]
struct FactoryState {
    created: [u32; 2],
    fail_next: Option<WindowKind>,
    primary_buffer: Option<String>,
    logs: Vec<(WindowKind, SurfaceLog)>,
}

/// Builds recording surfaces and counts constructions per kind.
#[derive(Clone, Default)]
pub(crate) struct CountingFactory(Rc<RefCell<FactoryState>>);

impl CountingFactory {
    pub(crate) fn created(&self, kind: WindowKind) -> u32 {
        self.0.borrow().created[kind as usize]
    }

    /// Make the next construction of `kind` fail.
    pub(crate) fn fail_next(&self, kind: WindowKind) {
        self.0.borrow_mut().fail_next = Some(kind);
    }

    fn latest(&self, kind: WindowKind) -> SurfaceLog {
        self.0
            .borrow()
            .logs
            .iter()
            .rev()
            .find(|(k, _)| *k == kind)
            .map(|(_, log)| log.clone())
            .unwrap_or_default()
    }
}

impl WindowFactory for CountingFactory {
    fn create(&mut self, kind: WindowKind, _id: WindowId) -> Result<Box<dyn Surface>> {
        let mut state = self.0.borrow_mut();
        if state.fail_next == Some(kind) {
            state.fail_next = None;
            return Err(ShellError::WindowCreation {
                kind,
                reason: "scripted failure".to_owned(),
            });
        }
        state.created[kind as usize] += 1;
        let log = SurfaceLog::default();
        if kind == WindowKind::Primary {
            log.0.borrow_mut().buffer = state.primary_buffer.clone();
        }
        state.logs.push((kind, log.clone()));
        Ok(Box::new(RecordingSurface(log)))
    }
}

// ── Picker ────────────────────────────────────────────────────────────────────

/// Returns canned answers; `None` plays the part of a dismissed dialog.
pub(crate) struct ScriptedPicker {
    open: Option<PathBuf>,
    save: Option<PathBuf>,
    seen_filters: Arc<Mutex<Vec<FileFilter>>>,
}

impl ScriptedPicker {
    pub(crate) fn open(choice: Option<PathBuf>) -> Self {
        Self {
            open: choice,
            save: None,
            seen_filters: Arc::default(),
        }
    }

    pub(crate) fn save(choice: Option<PathBuf>) -> Self {
        Self {
            open: None,
            save: choice,
            seen_filters: Arc::default(),
        }
    }

    /// Filters passed to `pick_save`, shared with the test.
    pub(crate) fn seen_filters(&self) -> Arc<Mutex<Vec<FileFilter>>> {
        Arc::clone(&self.seen_filters)
    }
}

impl FilePicker for ScriptedPicker {
    fn pick_open(&self) -> Option<PathBuf> {
        self.open.clone()
    }

    fn pick_save(&self, filter: &FileFilter) -> Option<PathBuf> {
        self.seen_filters.lock().push(filter.clone());
        self.save.clone()
    }
}

// ── Runner ────────────────────────────────────────────────────────────────────

/// Runs gateway tasks on the calling thread but still reports completion
/// through the event queue, so it arrives as a separate event.
#[derive(Clone, Default)]
pub(crate) struct InlineRunner(Rc<RefCell<usize>>);

impl InlineRunner {
    pub(crate) fn spawned(&self) -> usize {
        *self.0.borrow()
    }
}

impl TaskRunner for InlineRunner {
    fn spawn(&self, task: GatewayTask, events: EventSender) -> Result<()> {
        *self.0.borrow_mut() += 1;
        events.post(Event::Completed(task.run()));
        Ok(())
    }
}

// ── Harness ───────────────────────────────────────────────────────────────────

/// Wires the doubles together and keeps handles to inspect them.
pub(crate) struct Harness {
    pub(crate) factory: CountingFactory,
    pub(crate) runner: InlineRunner,
    queue: EventQueue,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self {
            factory: CountingFactory::default(),
            runner: InlineRunner::default(),
            queue: EventQueue::new(None),
        }
    }

    /// Text every subsequently constructed Primary reports as its buffer.
    pub(crate) fn set_primary_buffer(&self, text: &str) {
        self.factory.0.borrow_mut().primary_buffer = Some(text.to_owned());
    }

    pub(crate) fn registry(&self) -> WindowRegistry {
        WindowRegistry::new(Box::new(self.factory.clone()))
    }

    pub(crate) fn router(&self, picker: ScriptedPicker) -> CommandRouter {
        self.router_with(picker, true)
    }

    pub(crate) fn router_with(&self, picker: ScriptedPicker, report_io_errors: bool) -> CommandRouter {
        self.build_router(picker, Box::new(self.runner.clone()), report_io_errors)
    }

    pub(crate) fn router_with_runner(
        &self,
        picker: ScriptedPicker,
        runner: Box<dyn TaskRunner>,
    ) -> CommandRouter {
        self.build_router(picker, runner, true)
    }

    fn build_router(
        &self,
        picker: ScriptedPicker,
        runner: Box<dyn TaskRunner>,
        report_io_errors: bool,
    ) -> CommandRouter {
        CommandRouter::new(
            COMMANDS,
            FilesystemGateway::new(Arc::new(picker), FileFilter::default()),
            runner,
            self.queue.sender(),
            report_io_errors,
        )
    }

    pub(crate) fn dispatcher(&self, picker: ScriptedPicker) -> Dispatcher {
        self.dispatcher_with(picker, ShellOptions::default())
    }

    pub(crate) fn dispatcher_with(&self, picker: ScriptedPicker, options: ShellOptions) -> Dispatcher {
        Dispatcher::new(
            EventQueue::new(None),
            Box::new(self.factory.clone()),
            Arc::new(picker),
            Box::new(self.runner.clone()),
            options,
        )
    }

    /// Log of the most recently constructed Primary.
    pub(crate) fn primary_log(&self) -> SurfaceLog {
        self.factory.latest(WindowKind::Primary)
    }

    /// Log of the most recently constructed Secondary.
    pub(crate) fn secondary_log(&self) -> SurfaceLog {
        self.factory.latest(WindowKind::Secondary)
    }
}
