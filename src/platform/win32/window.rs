// ── Windows, surfaces and the message loop ────────────────────────────────────
//
// Responsibilities in this file (unsafe confined here):
//   • Register the editor and terminal window classes.
//   • Build both windows on demand for the registry (`Win32Factory`).
//   • Attach the menu bar and accelerator table built from `menu::MENU_BAR`.
//   • Run the Win32 message loop and drain the dispatcher after each message.
//   • Expose a safe error-dialog helper for use by main().
//
// ── Re-entrancy model ─────────────────────────────────────────────────────────
//
// The `Dispatcher` lives in a thread-local and is only ever borrowed by
// `pump()`, which the message loop calls between messages.  Window procedures
// never borrow it: they post `Event`s and return.  Anything a window proc
// triggers while the dispatcher is busy (including inside a modal dialog
// opened during delivery) is therefore queued and handled afterwards.

#![allow(unsafe_code)]

use std::{
    cell::{Cell, RefCell},
    ffi::c_void,
    rc::Rc,
    sync::{
        atomic::{AtomicIsize, Ordering},
        Arc,
    },
};

use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::{GetLastError, HINSTANCE, HWND, LPARAM, LRESULT, RECT, TRUE, WPARAM},
        Graphics::Gdi::{GetStockObject, HBRUSH, WHITE_BRUSH},
        System::{LibraryLoader::GetModuleHandleW, Threading::GetCurrentThreadId},
        UI::{
            WindowsAndMessaging::{
                AppendMenuW, CreateAcceleratorTableW, CreateMenu, CreateWindowExW,
                DefWindowProcW, DestroyAcceleratorTable, EM_REPLACESEL, EM_SETLIMITTEXT, EM_SETSEL,
                EN_CHANGE, DestroyWindow, DispatchMessageW,
                GetAncestor, GetClientRect, GetMessageW, GetWindowTextLengthW, GetWindowTextW,
                LoadCursorW, LoadIconW, MessageBoxW, MoveWindow, PostQuitMessage,
                PostThreadMessageW, RegisterClassExW, SendMessageW, SetForegroundWindow, SetMenu,
                SetWindowTextW, ShowWindow, TranslateAcceleratorW, TranslateMessage, ACCEL,
                CS_HREDRAW, CS_VREDRAW, CW_USEDEFAULT, ES_AUTOVSCROLL, ES_MULTILINE,
                ES_READONLY, ES_WANTRETURN, FALT, FCONTROL, FSHIFT, FVIRTKEY, GA_ROOT, HACCEL,
                HMENU, IDC_ARROW, IDI_APPLICATION, MB_ICONERROR, MB_ICONINFORMATION, MB_OK,
                MF_POPUP, MF_SEPARATOR, MF_STRING, MSG, SW_HIDE, SW_RESTORE, SW_SHOW, WINDOW_EX_STYLE,
                WINDOW_STYLE, WM_APP, WM_CLOSE, WM_COMMAND, WM_DESTROY, WM_SIZE, WNDCLASSEXW,
                WS_BORDER, WS_CHILD, WS_OVERLAPPEDWINDOW, WS_VISIBLE, WS_VSCROLL,
            },
        },
    },
};

use super::{dialogs::Win32Picker, dpi};
use crate::{
    command::COMMANDS,
    config::{Settings, WindowSize},
    dispatcher::{Dispatcher, Event, EventQueue, EventSender, Flow, ThreadRunner, Waker},
    document::{Document, Reaction},
    error::{Result, ShellError},
    menu::{MenuItem, MENU_BAR},
    message::{Message, Notification, WindowKind},
    registry::{Surface, WindowFactory, WindowId},
};

// ── Window identity ───────────────────────────────────────────────────────────

const EDITOR_CLASS: PCWSTR = w!("TandemEditorWindow");
const TERMINAL_CLASS: PCWSTR = w!("TandemTerminalWindow");

const APP_TITLE: &str = "Tandem";
const TERMINAL_TITLE: &str = "Terminal";

/// Sidebar width in 96-DPI pixels.
const SIDEBAR_WIDTH: i32 = 180;

// ── Control and command IDs ───────────────────────────────────────────────────

const ID_EDITOR: usize = 100;
const ID_SIDEBAR: usize = 101;
const ID_TERMINAL: usize = 102;

/// Menu/accelerator IDs are `IDM_BASE + index into COMMANDS`.
const IDM_BASE: usize = 1000;

/// Posted to the UI thread by gateway workers so `GetMessageW` returns and
/// the dispatcher gets drained.
const WM_APP_WAKE: u32 = WM_APP + 1;

fn command_id(name: &str) -> Option<usize> {
    COMMANDS.iter().position(|c| c.name == name).map(|i| IDM_BASE + i)
}

fn command_for_id(id: usize) -> Option<&'static str> {
    id.checked_sub(IDM_BASE)
        .and_then(|i| COMMANDS.get(i))
        .map(|c| c.name)
}

// ── Thread-local state ────────────────────────────────────────────────────────

thread_local! {
    static SHELL: RefCell<Option<Dispatcher>> = const { RefCell::new(None) };
    static EVENTS: RefCell<Option<EventSender>> = const { RefCell::new(None) };
    static EDITOR_VIEW: RefCell<Option<Rc<EditorView>>> = const { RefCell::new(None) };
    static TERMINAL_VIEW: RefCell<Option<Rc<TerminalView>>> = const { RefCell::new(None) };
}

fn post(event: Event) {
    EVENTS.with(|e| {
        if let Some(events) = e.borrow().as_ref() {
            events.post(event);
        }
    });
}

fn editor_view() -> Option<Rc<EditorView>> {
    EDITOR_VIEW.with(|v| v.borrow().clone())
}

fn terminal_view() -> Option<Rc<TerminalView>> {
    TERMINAL_VIEW.with(|v| v.borrow().clone())
}

/// Drain the dispatcher unless it is already running further up the stack.
fn pump() -> Flow {
    SHELL.with(|s| match s.try_borrow_mut() {
        Ok(mut guard) => guard
            .as_mut()
            .map(Dispatcher::run_until_idle)
            .unwrap_or(Flow::Continue),
        Err(_) => Flow::Continue,
    })
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Register the window classes, create the Primary window, and drive the
/// message loop until the dispatcher quits.
pub fn run(settings: &Settings) -> Result<()> {
    // Startup timing, debug builds only.
    #[cfg(debug_assertions)]
    let t0 = std::time::Instant::now();

    dpi::init();

    // SAFETY: GetModuleHandleW(None) returns the .exe's own HMODULE, which is
    // always valid for the process lifetime and never fails in practice.
    let hmodule = unsafe { GetModuleHandleW(None) }?;
    let hinstance = HINSTANCE(hmodule.0);

    register_class(hinstance, EDITOR_CLASS, editor_proc)?;
    register_class(hinstance, TERMINAL_CLASS, terminal_proc)?;

    // SAFETY: GetCurrentThreadId has no preconditions.
    let ui_thread = unsafe { GetCurrentThreadId() };
    let waker: Waker = Arc::new(move || {
        // SAFETY: posting a thread message carries no pointers; if the UI
        // thread has exited the call fails harmlessly.
        unsafe {
            let _ = PostThreadMessageW(ui_thread, WM_APP_WAKE, WPARAM(0), LPARAM(0));
        }
    });

    let queue = EventQueue::new(Some(waker));
    let events = queue.sender();
    EVENTS.with(|e| *e.borrow_mut() = Some(events.clone()));

    let owner = Arc::new(AtomicIsize::new(0));
    let factory = Win32Factory {
        hinstance,
        dpi: dpi::get_system_dpi(),
        primary_size: settings.primary,
        secondary_size: settings.secondary,
        owner: Arc::clone(&owner),
        events,
    };
    let mut dispatcher = Dispatcher::new(
        queue,
        Box::new(factory),
        Arc::new(Win32Picker::new(owner)),
        Box::new(ThreadRunner),
        // Nothing on this front-end posts `Event::Activate`.
        settings.shell_options().without_reactivation(),
    );
    dispatcher.start()?;

    #[cfg(debug_assertions)]
    log::debug!("window visible in {:.1} ms", t0.elapsed().as_secs_f64() * 1000.0);

    let accel = build_accelerators()?;
    SHELL.with(|s| *s.borrow_mut() = Some(dispatcher));

    let result = message_loop(accel);

    SHELL.with(|s| s.borrow_mut().take());
    EVENTS.with(|e| e.borrow_mut().take());
    // SAFETY: accel was created by CreateAcceleratorTableW and is no longer
    // referenced by the (finished) message loop.
    unsafe {
        let _ = DestroyAcceleratorTable(accel);
    }
    result
}

/// Show a modal error dialog with the given message.
///
/// Safe to call from any context; performs the UTF-16 conversion internally.
/// Used by `main()` when `run()` returns an error.
pub fn show_error_dialog(message: &str) {
    message_box(HWND::default(), message, "Tandem \u{2014} Fatal Error", true);
}

// ── Window class registration ─────────────────────────────────────────────────

type WndProc = unsafe extern "system" fn(HWND, u32, WPARAM, LPARAM) -> LRESULT;

fn register_class(hinstance: HINSTANCE, class: PCWSTR, proc: WndProc) -> Result<()> {
    // SAFETY: LoadIconW with IDI_APPLICATION always succeeds; it loads the
    // built-in application icon resource, which exists on all Windows versions.
    let icon = unsafe { LoadIconW(None, IDI_APPLICATION) }?;

    // SAFETY: LoadCursorW with IDC_ARROW always succeeds; the arrow cursor is
    // a built-in resource guaranteed to exist on all Windows versions.
    let cursor = unsafe { LoadCursorW(None, IDC_ARROW) }?;

    // SAFETY: GetStockObject with WHITE_BRUSH always returns a valid HGDIOBJ.
    // Casting to HBRUSH is correct: stock brush objects are compatible types.
    let bg_brush = unsafe { HBRUSH(GetStockObject(WHITE_BRUSH).0) };

    let wndclass = WNDCLASSEXW {
        // WNDCLASSEXW is ~72 bytes; the cast to u32 is always lossless.
        cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
        style: CS_HREDRAW | CS_VREDRAW,
        lpfnWndProc: Some(proc),
        cbClsExtra: 0,
        cbWndExtra: 0,
        hInstance: hinstance,
        hIcon: icon,
        hCursor: cursor,
        hbrBackground: bg_brush,
        lpszMenuName: PCWSTR::null(),
        lpszClassName: class,
        hIconSm: icon,
    };

    // SAFETY: wndclass is fully initialised with valid handles; `class` is a
    // valid null-terminated UTF-16 string literal.
    let atom = unsafe { RegisterClassExW(&wndclass) };
    if atom == 0 {
        return Err(last_error("RegisterClassExW"));
    }
    Ok(())
}

// ── Window factory ────────────────────────────────────────────────────────────

struct Win32Factory {
    hinstance: HINSTANCE,
    dpi: u32,
    primary_size: WindowSize,
    secondary_size: WindowSize,
    /// Shared with `Win32Picker` so dialogs are owned by the live editor.
    owner: Arc<AtomicIsize>,
    events: EventSender,
}

impl WindowFactory for Win32Factory {
    fn create(&mut self, kind: WindowKind, id: WindowId) -> Result<Box<dyn Surface>> {
        log::debug!("creating {kind} window {id:?}");
        match kind {
            WindowKind::Primary => self.create_editor(),
            WindowKind::Secondary => self.create_terminal(),
        }
    }
}

impl Win32Factory {
    fn create_editor(&mut self) -> Result<Box<dyn Surface>> {
        let hwnd = self.top_level(WindowKind::Primary)?;
        let editor = child(
            self.hinstance,
            hwnd,
            w!("EDIT"),
            WS_VISIBLE | WS_VSCROLL | edit_style(ES_MULTILINE | ES_AUTOVSCROLL | ES_WANTRETURN),
            ID_EDITOR,
        )?;
        let sidebar = child(self.hinstance, hwnd, w!("STATIC"), WS_BORDER, ID_SIDEBAR)?;

        // SAFETY: editor is a valid EDIT control; a zero limit lifts the
        // default 32 K character cap on multiline edits.
        unsafe {
            let _ = SendMessageW(editor, EM_SETLIMITTEXT, WPARAM(0), LPARAM(0));
        }

        let view = Rc::new(EditorView {
            hwnd,
            editor,
            sidebar,
            dpi: self.dpi,
            doc: RefCell::new(Document::new()),
            loading: Cell::new(false),
            events: self.events.clone(),
        });
        EDITOR_VIEW.with(|v| *v.borrow_mut() = Some(Rc::clone(&view)));
        self.owner.store(hwnd.0 as isize, Ordering::Release);

        view.layout();
        show(hwnd);
        Ok(Box::new(EditorSurface(view)))
    }

    fn create_terminal(&mut self) -> Result<Box<dyn Surface>> {
        let hwnd = self.top_level(WindowKind::Secondary)?;
        let output = child(
            self.hinstance,
            hwnd,
            w!("EDIT"),
            WS_VISIBLE | WS_VSCROLL | edit_style(ES_MULTILINE | ES_AUTOVSCROLL | ES_READONLY),
            ID_TERMINAL,
        )?;
        // SAFETY: output is a valid EDIT control; see create_editor.
        unsafe {
            let _ = SendMessageW(output, EM_SETLIMITTEXT, WPARAM(0), LPARAM(0));
        }

        let view = Rc::new(TerminalView { hwnd, output });
        TERMINAL_VIEW.with(|v| *v.borrow_mut() = Some(Rc::clone(&view)));

        view.layout();
        show(hwnd);
        Ok(Box::new(TerminalSurface(view)))
    }

    fn top_level(&self, kind: WindowKind) -> Result<HWND> {
        let (class, title) = window_class(kind);
        let size = match kind {
            WindowKind::Primary => self.primary_size,
            WindowKind::Secondary => self.secondary_size,
        };
        let (width, height) = dpi::scale_size(size, self.dpi);
        let title_w = wide(title);

        // SAFETY: `class` was registered in run(); hinstance is the exe's
        // module; title_w is null-terminated and outlives the call.  The
        // window starts hidden and is shown once its children exist.
        let hwnd = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE(0),
                class,
                PCWSTR(title_w.as_ptr()),
                WS_OVERLAPPEDWINDOW,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                width,
                height,
                HWND::default(),
                HMENU::default(),
                self.hinstance,
                None,
            )
        }
        .map_err(|e| ShellError::WindowCreation {
            kind,
            reason: e.to_string(),
        })?;

        let menu = build_menu()?;
        // SAFETY: hwnd and menu are valid handles; the window takes ownership
        // of the menu and destroys it with itself.
        unsafe { SetMenu(hwnd, menu) }?;
        Ok(hwnd)
    }
}

/// Registered class and initial title for each kind of window.
fn window_class(kind: WindowKind) -> (PCWSTR, &'static str) {
    match kind {
        WindowKind::Primary => (EDITOR_CLASS, APP_TITLE),
        WindowKind::Secondary => (TERMINAL_CLASS, TERMINAL_TITLE),
    }
}

fn edit_style(es: i32) -> WINDOW_STYLE {
    // ES_* constants are plain i32 bit flags in the low word of the style.
    WINDOW_STYLE(es as u32)
}

fn child(hinstance: HINSTANCE, parent: HWND, class: PCWSTR, style: WINDOW_STYLE, id: usize) -> Result<HWND> {
    // SAFETY: parent is a live top-level window created on this thread;
    // `class` names a system control class; for child windows the HMENU
    // parameter carries the control ID.
    let hwnd = unsafe {
        CreateWindowExW(
            WINDOW_EX_STYLE(0),
            class,
            PCWSTR::null(),
            WS_CHILD | style,
            0,
            0,
            0,
            0,
            parent,
            HMENU(id as *mut c_void),
            hinstance,
            None,
        )
    }?;
    Ok(hwnd)
}

fn show(hwnd: HWND) {
    // SAFETY: hwnd is a valid top-level window; the return values (previous
    // visibility state) are intentionally ignored.
    unsafe {
        let _ = ShowWindow(hwnd, SW_SHOW);
        let _ = SetForegroundWindow(hwnd);
    }
}

fn reveal(hwnd: HWND) {
    // SAFETY: as in show(); SW_RESTORE also un-minimises.
    unsafe {
        let _ = ShowWindow(hwnd, SW_RESTORE);
        let _ = SetForegroundWindow(hwnd);
    }
}

// ── Editor (Primary) ──────────────────────────────────────────────────────────

struct EditorView {
    hwnd: HWND,
    editor: HWND,
    sidebar: HWND,
    dpi: u32,
    doc: RefCell<Document>,
    /// Set while the buffer is replaced programmatically so the resulting
    /// EN_CHANGE does not mark the document dirty.
    loading: Cell<bool>,
    events: EventSender,
}

impl EditorView {
    fn apply(&self, reaction: Reaction) {
        match reaction {
            Reaction::Nothing => {}
            Reaction::ClearBuffer => {
                self.load_buffer("");
                self.retitle();
            }
            Reaction::LoadBuffer(text) => {
                self.load_buffer(&to_crlf(&text));
                self.retitle();
            }
            Reaction::Request(request) => {
                self.events.post(Event::Request(request));
            }
            Reaction::Sidebar(visible) => {
                // SAFETY: sidebar is a child of this window.
                unsafe {
                    let _ = ShowWindow(self.sidebar, if visible { SW_SHOW } else { SW_HIDE });
                }
                self.layout();
            }
            Reaction::ShowAbout => message_box(
                self.hwnd,
                concat!(
                    "Tandem ",
                    env!("CARGO_PKG_VERSION"),
                    "\n\nA text editor with a relayed terminal window.\n\n",
                    "Licensed under MIT OR Apache-2.0.",
                ),
                "About Tandem",
                false,
            ),
            Reaction::ShowError(reason) => message_box(self.hwnd, &reason, APP_TITLE, true),
            Reaction::Retitle => self.retitle(),
        }
    }

    fn load_buffer(&self, text: &str) {
        self.loading.set(true);
        set_text(self.editor, text);
        self.loading.set(false);
    }

    /// EN_CHANGE from the edit control.
    fn on_edit(&self) {
        if self.loading.get() {
            return;
        }
        let changed = self.doc.borrow_mut().mark_dirty();
        if changed {
            self.retitle();
        }
    }

    fn retitle(&self) {
        let (title, name) = {
            let doc = self.doc.borrow();
            (doc.window_title(), doc.display_name())
        };
        set_text(self.hwnd, &title);
        set_text(self.sidebar, &name);
    }

    fn layout(&self) {
        let (w, h) = client_size(self.hwnd);
        let sidebar = if self.doc.borrow().sidebar_visible {
            dpi::scale(SIDEBAR_WIDTH, self.dpi).min(w)
        } else {
            0
        };
        // SAFETY: both children belong to this window; repaint requested.
        unsafe {
            let _ = MoveWindow(self.sidebar, 0, 0, sidebar, h, TRUE);
            let _ = MoveWindow(self.editor, sidebar, 0, w - sidebar, h, TRUE);
        }
    }
}

struct EditorSurface(Rc<EditorView>);

impl Surface for EditorSurface {
    fn deliver(&self, message: &Message) {
        // The borrow ends before any Win32 call can re-enter editor_proc.
        let reaction = self.0.doc.borrow_mut().react(message);
        self.0.apply(reaction);
    }

    fn reveal(&self) {
        reveal(self.0.hwnd);
    }

    fn buffer_text(&self) -> Option<String> {
        Some(get_text(self.0.editor))
    }
}

// ── Terminal (Secondary) ──────────────────────────────────────────────────────

struct TerminalView {
    hwnd: HWND,
    output: HWND,
}

impl TerminalView {
    /// Append relayed bytes at the end of the output.  Rendering is plain
    /// text; escape sequences are shown as-is.
    fn append(&self, data: &[u8]) {
        let text = wide(&to_crlf(&String::from_utf8_lossy(data)));
        let end = get_text_len(self.output);
        // SAFETY: output is a valid EDIT control; `text` is null-terminated
        // and outlives the synchronous EM_REPLACESEL call.
        unsafe {
            let _ = SendMessageW(self.output, EM_SETSEL, WPARAM(end), LPARAM(end as isize));
            let _ = SendMessageW(self.output, EM_REPLACESEL, WPARAM(0), LPARAM(text.as_ptr() as isize));
        }
    }

    fn layout(&self) {
        let (w, h) = client_size(self.hwnd);
        // SAFETY: output is a child of this window.
        unsafe {
            let _ = MoveWindow(self.output, 0, 0, w, h, TRUE);
        }
    }
}

struct TerminalSurface(Rc<TerminalView>);

impl Surface for TerminalSurface {
    fn deliver(&self, message: &Message) {
        match message {
            Message::TerminalData(data) => self.0.append(data),
            Message::Notify(Notification::ClearTerminal) => set_text(self.0.output, ""),
            other => log::debug!("terminal ignores {}", other.channel()),
        }
    }

    fn reveal(&self) {
        reveal(self.0.hwnd);
    }
}

// ── Menu and accelerators ─────────────────────────────────────────────────────

fn build_menu() -> Result<HMENU> {
    // SAFETY: CreateMenu has no preconditions; it always succeeds unless the
    // system is critically low on resources, in which case ? propagates the
    // error.  Label buffers outlive each AppendMenuW call.
    unsafe {
        let bar = CreateMenu()?;
        for submenu in MENU_BAR {
            let popup = CreateMenu()?;
            for item in submenu.items {
                match (item, item.display_label()) {
                    (MenuItem::Command { command, .. }, Some(label)) => {
                        let Some(id) = command_id(command) else {
                            log::warn!("menu item '{label}' names unknown command {command}");
                            continue;
                        };
                        let label_w = wide(&label);
                        AppendMenuW(popup, MF_STRING, id, PCWSTR(label_w.as_ptr()))?;
                    }
                    _ => AppendMenuW(popup, MF_SEPARATOR, 0, PCWSTR::null())?,
                }
            }
            // The uIDNewItem parameter for MF_POPUP is the child HMENU cast to usize.
            let label_w = wide(submenu.label);
            AppendMenuW(bar, MF_POPUP, popup.0 as usize, PCWSTR(label_w.as_ptr()))?;
        }
        Ok(bar)
    }
}

fn build_accelerators() -> Result<HACCEL> {
    let mut table = Vec::new();
    for submenu in MENU_BAR {
        for item in submenu.items {
            if let MenuItem::Command {
                command,
                accelerator: Some(acc),
                ..
            } = item
            {
                let Some(id) = command_id(command) else { continue };
                let mut flags = FVIRTKEY;
                if acc.ctrl {
                    flags |= FCONTROL;
                }
                if acc.shift {
                    flags |= FSHIFT;
                }
                if acc.alt {
                    flags |= FALT;
                }
                table.push(ACCEL {
                    fVirt: flags,
                    // Virtual-key codes for A–Z and 0–9 equal their ASCII codes.
                    key: acc.key as u16,
                    cmd: id as u16,
                });
            }
        }
    }
    // SAFETY: `table` is a valid slice of ACCEL entries for the call.
    let accel = unsafe { CreateAcceleratorTableW(&table) }?;
    Ok(accel)
}

// ── Message loop ──────────────────────────────────────────────────────────────

fn message_loop(accel: HACCEL) -> Result<()> {
    let mut msg = MSG::default();
    let mut quit_posted = false;

    loop {
        // SAFETY: &mut msg is a valid MSG pointer; HWND::default() retrieves
        // messages for all windows and the thread queue; 0,0 accepts all.
        let ret = unsafe { GetMessageW(&mut msg, HWND::default(), 0, 0) };

        match ret.0 {
            // GetMessageW returns -1 on error.
            -1 => return Err(last_error("GetMessageW")),
            // 0 means WM_QUIT.
            0 => break,
            _ => {
                // Thread messages (WM_APP_WAKE) have no window; they only
                // exist to get us to the pump below.
                if msg.hwnd != HWND::default() {
                    // SAFETY: msg was populated by a successful GetMessageW;
                    // accelerators are resolved against the top-level window
                    // so they work while focus is in a child control.
                    unsafe {
                        let root = GetAncestor(msg.hwnd, GA_ROOT);
                        if TranslateAcceleratorW(root, accel, &msg) == 0 {
                            let _ = TranslateMessage(&msg);
                            let _ = DispatchMessageW(&msg);
                        }
                    }
                }
            }
        }

        if pump() == Flow::Quit && !quit_posted {
            // SAFETY: posts WM_QUIT to this thread's queue.
            unsafe { PostQuitMessage(0) };
            quit_posted = true;
        }
    }

    Ok(())
}

// ── Window procedures ─────────────────────────────────────────────────────────

/// Split a WM_COMMAND WPARAM into (id, notification code).
fn command_parts(wparam: WPARAM) -> (usize, u32) {
    (wparam.0 & 0xFFFF, ((wparam.0 >> 16) & 0xFFFF) as u32)
}

/// Menu clicks (lparam 0) become dispatcher commands.
fn post_menu_command(id: usize) -> bool {
    match command_for_id(id) {
        Some(name) => {
            post(Event::Command(name.to_owned()));
            true
        }
        None => false,
    }
}

// SAFETY: editor_proc is registered as lpfnWndProc for EDITOR_CLASS.
// Windows guarantees that hwnd, msg, wparam, and lparam are valid for the
// lifetime of this call; we must not store hwnd beyond the message handler.
unsafe extern "system" fn editor_proc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    match msg {
        WM_SIZE => {
            if let Some(view) = editor_view().filter(|v| v.hwnd == hwnd) {
                view.layout();
            }
            LRESULT(0)
        }

        WM_COMMAND => {
            let (id, code) = command_parts(wparam);
            if lparam.0 != 0 {
                // Notification from a child control.
                if id == ID_EDITOR && code == EN_CHANGE {
                    if let Some(view) = editor_view() {
                        view.on_edit();
                    }
                }
                return LRESULT(0);
            }
            if post_menu_command(id) {
                LRESULT(0)
            } else {
                DefWindowProcW(hwnd, msg, wparam, lparam)
            }
        }

        WM_CLOSE => {
            // DestroyWindow triggers WM_DESTROY below.
            let _ = DestroyWindow(hwnd);
            LRESULT(0)
        }

        WM_DESTROY => {
            EDITOR_VIEW.with(|v| {
                let mut slot = v.borrow_mut();
                if slot.as_ref().is_some_and(|view| view.hwnd == hwnd) {
                    slot.take();
                }
            });
            post(Event::Closed(WindowKind::Primary));
            LRESULT(0)
        }

        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

// SAFETY: same contract as editor_proc, for TERMINAL_CLASS.
unsafe extern "system" fn terminal_proc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    match msg {
        WM_SIZE => {
            if let Some(view) = terminal_view().filter(|v| v.hwnd == hwnd) {
                view.layout();
            }
            LRESULT(0)
        }

        WM_COMMAND => {
            let (id, _) = command_parts(wparam);
            if lparam.0 == 0 && post_menu_command(id) {
                LRESULT(0)
            } else {
                DefWindowProcW(hwnd, msg, wparam, lparam)
            }
        }

        WM_CLOSE => {
            let _ = DestroyWindow(hwnd);
            LRESULT(0)
        }

        WM_DESTROY => {
            TERMINAL_VIEW.with(|v| {
                let mut slot = v.borrow_mut();
                if slot.as_ref().is_some_and(|view| view.hwnd == hwnd) {
                    slot.take();
                }
            });
            post(Event::Closed(WindowKind::Secondary));
            LRESULT(0)
        }

        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

// ── Text helpers ──────────────────────────────────────────────────────────────

/// Null-terminated UTF-16.
fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// EDIT controls only break lines on `\r\n`.
fn to_crlf(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + s.len() / 16);
    let mut prev = '\0';
    for c in s.chars() {
        if c == '\n' && prev != '\r' {
            out.push('\r');
        }
        out.push(c);
        prev = c;
    }
    out
}

fn set_text(hwnd: HWND, text: &str) {
    let text_w = wide(text);
    // SAFETY: text_w is null-terminated and outlives the call.
    unsafe {
        let _ = SetWindowTextW(hwnd, PCWSTR(text_w.as_ptr()));
    }
}

fn get_text_len(hwnd: HWND) -> usize {
    // SAFETY: any HWND is accepted; 0 is returned for invalid windows.
    let len = unsafe { GetWindowTextLengthW(hwnd) };
    len.max(0) as usize
}

fn get_text(hwnd: HWND) -> String {
    let mut buf = vec![0u16; get_text_len(hwnd) + 1];
    // SAFETY: buf has room for the text plus terminator.
    let copied = unsafe { GetWindowTextW(hwnd, &mut buf) };
    String::from_utf16_lossy(&buf[..copied.max(0) as usize])
}

fn client_size(hwnd: HWND) -> (i32, i32) {
    let mut rect = RECT::default();
    // SAFETY: rect is a valid out-pointer; on failure it stays zeroed.
    unsafe {
        let _ = GetClientRect(hwnd, &mut rect);
    }
    (rect.right - rect.left, rect.bottom - rect.top)
}

fn message_box(owner: HWND, body: &str, title: &str, error: bool) {
    let body_w = wide(body);
    let title_w = wide(title);
    let icon = if error { MB_ICONERROR } else { MB_ICONINFORMATION };
    // SAFETY: both strings are valid null-terminated UTF-16 that remain
    // allocated for the duration of the call.  A null owner means the dialog
    // has no owner window.  Return value (button pressed) is unused.
    unsafe {
        let _ = MessageBoxW(owner, PCWSTR(body_w.as_ptr()), PCWSTR(title_w.as_ptr()), MB_OK | icon);
    }
}

// ── Error helpers ─────────────────────────────────────────────────────────────

/// Capture the current Win32 last-error code and wrap it in a `ShellError`.
///
/// Call immediately after a Win32 function that signals failure; `GetLastError`
/// reads thread-local state that can be overwritten by any subsequent API call.
fn last_error(function: &'static str) -> ShellError {
    // SAFETY: GetLastError reads thread-local state set by the last Win32 call.
    // It is always safe to call and never fails.
    let code = unsafe { GetLastError() };
    ShellError::Win32 {
        function,
        code: code.0,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_ids_roundtrip() {
        for cmd in COMMANDS {
            let id = command_id(cmd.name).expect("id");
            assert_eq!(command_for_id(id), Some(cmd.name));
        }
        assert_eq!(command_for_id(IDM_BASE - 1), None);
        assert_eq!(command_for_id(IDM_BASE + COMMANDS.len()), None);
    }

    #[test]
    fn each_kind_gets_its_own_class() {
        let (editor, editor_title) = window_class(WindowKind::Primary);
        let (terminal, terminal_title) = window_class(WindowKind::Secondary);
        // SAFETY: both are `w!` literals, null-terminated and 'static.
        let (editor, terminal) = unsafe { (editor.to_string(), terminal.to_string()) };
        assert_eq!(editor.as_deref().ok(), Some("TandemEditorWindow"));
        assert_eq!(terminal.as_deref().ok(), Some("TandemTerminalWindow"));
        assert_eq!((editor_title, terminal_title), (APP_TITLE, TERMINAL_TITLE));
    }

    #[test]
    fn crlf_conversion_leaves_existing_pairs() {
        assert_eq!(to_crlf("a\nb\r\nc"), "a\r\nb\r\nc");
        assert_eq!(to_crlf("no newline"), "no newline");
    }

    #[test]
    fn command_parts_split_wparam() {
        assert_eq!(command_parts(WPARAM((1 << 16) | 1003)), (1003, 1));
    }
}
