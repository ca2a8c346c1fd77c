// ── Common dialogs ─────────────────────────────────────────────────────────────
//
// Win32 common-dialog implementation of `FilePicker`.  Each picker call
// returns `Some(path)` on user confirmation and `None` on cancel or error.
//
// Pickers run on gateway worker threads.  The owner window is shared as a raw
// `isize` so the picker stays `Send + Sync`; the window factory updates it
// whenever a Primary window is constructed.  It is only turned back into an
// `HWND` for the duration of the dialog call.

#![allow(unsafe_code)]

use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicIsize, Ordering},
        Arc,
    },
};

use windows::{
    core::{PCWSTR, PWSTR},
    Win32::{
        Foundation::HWND,
        UI::Controls::Dialogs::{
            GetOpenFileNameW, GetSaveFileNameW, OFN_FILEMUSTEXIST, OFN_HIDEREADONLY,
            OFN_OVERWRITEPROMPT, OFN_PATHMUSTEXIST, OPENFILENAMEW,
        },
    },
};

use crate::gateway::{FileFilter, FilePicker};

// ── Buffer size ───────────────────────────────────────────────────────────────

/// Maximum path length in `WCHAR`s, including the null terminator.
/// `MAX_PATH` (260) is too short for modern Windows paths; use 32 768 which
/// is the documented maximum for `\\?\` extended paths.
const PATH_BUF_LEN: usize = 32_768;

/// Filter shown by the Open dialog.
const OPEN_FILTER: &str = "All Files (*.*)\0*.*\0Text Files (*.txt)\0*.txt\0\0";

// ── Picker ────────────────────────────────────────────────────────────────────

/// Native pickers owned by the Primary window.
pub(crate) struct Win32Picker {
    owner: Arc<AtomicIsize>,
}

impl Win32Picker {
    pub(crate) fn new(owner: Arc<AtomicIsize>) -> Self {
        Self { owner }
    }

    /// The current Primary window, or null (no owner) if there is none.
    fn owner(&self) -> HWND {
        HWND(self.owner.load(Ordering::Acquire) as *mut core::ffi::c_void)
    }
}

impl FilePicker for Win32Picker {
    fn pick_open(&self) -> Option<PathBuf> {
        show_open_dialog(self.owner())
    }

    fn pick_save(&self, filter: &FileFilter) -> Option<PathBuf> {
        show_save_dialog(self.owner(), filter)
    }
}

// ── Open dialog ───────────────────────────────────────────────────────────────

/// Show the standard "Open File" dialog.
fn show_open_dialog(hwnd_owner: HWND) -> Option<PathBuf> {
    let mut buf = vec![0u16; PATH_BUF_LEN];

    // The filter string is null-separated pairs ending with a double null:
    // "Display\0*.ext\0Display2\0*.ext2\0\0"
    let filter: Vec<u16> = OPEN_FILTER.encode_utf16().collect();

    let mut ofn = OPENFILENAMEW {
        lStructSize: std::mem::size_of::<OPENFILENAMEW>() as u32,
        hwndOwner: hwnd_owner,
        lpstrFilter: PCWSTR(filter.as_ptr()),
        lpstrFile: PWSTR(buf.as_mut_ptr()),
        nMaxFile: PATH_BUF_LEN as u32,
        Flags: OFN_FILEMUSTEXIST | OFN_PATHMUSTEXIST | OFN_HIDEREADONLY,
        ..Default::default()
    };

    // SAFETY: `ofn` is fully initialised; `buf` and `filter` outlive this
    // call.  GetOpenFileNameW reads and writes only within the buffers we
    // provided.  A dialog on a worker thread with an owner on the UI thread
    // is permitted; the owner is disabled for the dialog's lifetime.
    let ok = unsafe { GetOpenFileNameW(&mut ofn) };

    if ok.as_bool() {
        Some(path_from_buf(&buf))
    } else {
        None
    }
}

// ── Save dialog ───────────────────────────────────────────────────────────────

/// Show the standard "Save As" dialog restricted to `filter`.
fn show_save_dialog(hwnd_owner: HWND, filter: &FileFilter) -> Option<PathBuf> {
    let mut buf = vec![0u16; PATH_BUF_LEN];

    let filter_w: Vec<u16> = filter_string(filter).encode_utf16().collect();
    // Appended to a bare filename the user types; "txt" for "*.txt".
    let default_ext: Vec<u16> = filter
        .extensions
        .first()
        .map(String::as_str)
        .unwrap_or("")
        .encode_utf16()
        .chain(std::iter::once(0))
        .collect();

    let mut ofn = OPENFILENAMEW {
        lStructSize: std::mem::size_of::<OPENFILENAMEW>() as u32,
        hwndOwner: hwnd_owner,
        lpstrFilter: PCWSTR(filter_w.as_ptr()),
        lpstrFile: PWSTR(buf.as_mut_ptr()),
        nMaxFile: PATH_BUF_LEN as u32,
        lpstrDefExt: PCWSTR(default_ext.as_ptr()),
        Flags: OFN_OVERWRITEPROMPT | OFN_PATHMUSTEXIST,
        ..Default::default()
    };

    // SAFETY: same invariants as show_open_dialog above; `default_ext` is a
    // null-terminated UTF-16 string that outlives the call.
    let ok = unsafe { GetSaveFileNameW(&mut ofn) };

    if ok.as_bool() {
        Some(path_from_buf(&buf))
    } else {
        None
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// `"Text Files (*.txt)\0*.txt\0\0"` for a single filter class.
fn filter_string(filter: &FileFilter) -> String {
    format!("{}\0{}\0\0", filter.label(), filter.pattern())
}

/// Convert a null-terminated UTF-16 buffer to a `PathBuf`.
fn path_from_buf(buf: &[u16]) -> PathBuf {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    PathBuf::from(String::from_utf16_lossy(&buf[..len]))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
