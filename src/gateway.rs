// ── Filesystem gateway ────────────────────────────────────────────────────────
//
// Native pickers plus whole-file read/write, packaged as tasks that run off
// the dispatcher thread.  A task never touches window state: it returns a
// `Completion`, which the task runner posts back to the dispatcher as a new
// event.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{Deserialize, Serialize};

use crate::error::ShellError;

// ── Picker seam ───────────────────────────────────────────────────────────────

/// A single filter class for the save picker, e.g. `Text Files (*.txt)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFilter {
    pub name: String,
    /// Extensions without the leading dot.
    pub extensions: Vec<String>,
}

impl FileFilter {
    /// The semicolon-separated glob list used by native dialogs: `*.txt;*.md`.
    pub fn pattern(&self) -> String {
        if self.extensions.is_empty() {
            return "*.*".to_owned();
        }
        self.extensions
            .iter()
            .map(|e| format!("*.{e}"))
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Display label with the pattern appended: `Text Files (*.txt)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.pattern())
    }
}

impl Default for FileFilter {
    fn default() -> Self {
        Self {
            name: "Text Files".to_owned(),
            extensions: vec!["txt".to_owned()],
        }
    }
}

/// Native open/save pickers.  `None` means the user dismissed the dialog.
///
/// Called from gateway worker threads, hence `Send + Sync`.
pub trait FilePicker: Send + Sync {
    fn pick_open(&self) -> Option<PathBuf>;
    fn pick_save(&self, filter: &FileFilter) -> Option<PathBuf>;
}

// ── Results ───────────────────────────────────────────────────────────────────

/// A file read in full.  Ephemeral: handed to the Primary and forgotten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResult {
    pub path: PathBuf,
    pub content: String,
}

#[derive(Debug)]
pub enum GatewayOutcome {
    Opened(FileResult),
    Saved(PathBuf),
    /// The user dismissed the picker.  Not an error.
    Cancelled,
    Failed(ShellError),
}

/// Identifies one gateway task for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

/// What a finished task reports back to the dispatcher.
#[derive(Debug)]
pub struct Completion {
    pub task: TaskId,
    pub outcome: GatewayOutcome,
}

// ── Requests ──────────────────────────────────────────────────────────────────

/// Gateway work as requested by a command or by the Primary's agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayRequest {
    Open,
    SaveAs,
    /// Write to a path that is already known; no picker.
    Save(PathBuf),
}

impl From<crate::command::GatewayOp> for GatewayRequest {
    fn from(op: crate::command::GatewayOp) -> Self {
        match op {
            crate::command::GatewayOp::SaveAs => Self::SaveAs,
        }
    }
}

// ── Tasks ─────────────────────────────────────────────────────────────────────

type Job = Box<dyn FnOnce() -> GatewayOutcome + Send + 'static>;

/// A unit of picker-and-I/O work, not yet started.
pub struct GatewayTask {
    pub id: TaskId,
    /// Short operation name for logs: `"open"`, `"save-as"`, `"save"`.
    pub label: &'static str,
    job: Job,
}

impl GatewayTask {
    /// Run the task to completion on the calling thread.
    pub fn run(self) -> Completion {
        log::debug!("gateway task {:?} ({}) running", self.id, self.label);
        Completion {
            task: self.id,
            outcome: (self.job)(),
        }
    }
}

impl std::fmt::Debug for GatewayTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayTask")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

// ── Gateway ───────────────────────────────────────────────────────────────────

pub struct FilesystemGateway {
    picker: Arc<dyn FilePicker>,
    save_filter: FileFilter,
    next_task: u64,
}

impl FilesystemGateway {
    pub fn new(picker: Arc<dyn FilePicker>, save_filter: FileFilter) -> Self {
        Self {
            picker,
            save_filter,
            next_task: 1,
        }
    }

    /// Pick a file and read it fully as text.
    pub fn request_open(&mut self) -> GatewayTask {
        let picker = Arc::clone(&self.picker);
        self.task("open", move || match picker.pick_open() {
            Some(path) => read_text(&path),
            None => GatewayOutcome::Cancelled,
        })
    }

    /// Pick a destination constrained to the save filter and write `content`.
    pub fn request_save(&mut self, content: String) -> GatewayTask {
        let picker = Arc::clone(&self.picker);
        let filter = self.save_filter.clone();
        self.task("save-as", move || match picker.pick_save(&filter) {
            Some(path) => write_text(path, &content),
            None => GatewayOutcome::Cancelled,
        })
    }

    /// Write `content` to an already-known `path`.
    pub fn request_write(&mut self, path: PathBuf, content: String) -> GatewayTask {
        self.task("save", move || write_text(path, &content))
    }

    fn task(
        &mut self,
        label: &'static str,
        job: impl FnOnce() -> GatewayOutcome + Send + 'static,
    ) -> GatewayTask {
        let id = TaskId(self.next_task);
        self.next_task += 1;
        GatewayTask {
            id,
            label,
            job: Box::new(job),
        }
    }
}

// ── File I/O ──────────────────────────────────────────────────────────────────

fn read_text(path: &Path) -> GatewayOutcome {
    match fs::read(path) {
        Ok(bytes) => GatewayOutcome::Opened(FileResult {
            path: path.to_path_buf(),
            content: decode_text(&bytes),
        }),
        Err(e) => GatewayOutcome::Failed(ShellError::file(path, e)),
    }
}

fn write_text(path: PathBuf, content: &str) -> GatewayOutcome {
    match fs::write(&path, content.as_bytes()) {
        Ok(()) => GatewayOutcome::Saved(path),
        Err(e) => GatewayOutcome::Failed(ShellError::file(path, e)),
    }
}

/// Decode file bytes to text.
///
/// Detection order:
/// 1. UTF-16 LE BOM (`FF FE`)
/// 2. UTF-16 BE BOM (`FE FF`)
/// 3. UTF-8 BOM (`EF BB BF`), stripped
/// 4. Anything else is UTF-8, with invalid sequences replaced by U+FFFD
pub fn decode_text(bytes: &[u8]) -> String {
    if let Some(payload) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        let units: Vec<u16> = payload
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    if let Some(payload) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = payload
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    let payload = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    String::from_utf8_lossy(payload).into_owned()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedPicker;

    fn gateway(picker: ScriptedPicker) -> FilesystemGateway {
        FilesystemGateway::new(Arc::new(picker), FileFilter::default())
    }

    #[test]
    fn filter_pattern_and_label() {
        let f = FileFilter::default();
        assert_eq!(f.pattern(), "*.txt");
        assert_eq!(f.label(), "Text Files (*.txt)");

        let md = FileFilter {
            name: "Docs".to_owned(),
            extensions: vec!["md".to_owned(), "txt".to_owned()],
        };
        assert_eq!(md.pattern(), "*.md;*.txt");

        let any = FileFilter {
            name: "All".to_owned(),
            extensions: vec![],
        };
        assert_eq!(any.pattern(), "*.*");
    }

    #[test]
    fn open_reads_whole_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("notes.txt");
        fs::write(&path, "line one\nline two\n").expect("seed");

        let mut gw = gateway(ScriptedPicker::open(Some(path.clone())));
        match gw.request_open().run().outcome {
            GatewayOutcome::Opened(r) => {
                assert_eq!(r.path, path);
                assert_eq!(r.content, "line one\nline two\n");
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn open_cancelled() {
        let mut gw = gateway(ScriptedPicker::open(None));
        assert!(matches!(gw.request_open().run().outcome, GatewayOutcome::Cancelled));
    }

    #[test]
    fn open_missing_file_fails_with_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("gone.txt");
        let mut gw = gateway(ScriptedPicker::open(Some(path.clone())));
        match gw.request_open().run().outcome {
            GatewayOutcome::Failed(e) => assert_eq!(e.path(), Some(path.as_path())),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn save_cancelled_after_picker_is_consulted() {
        let picker = ScriptedPicker::save(None);
        let seen = picker.seen_filters();
        let mut gw = gateway(picker);
        assert!(matches!(
            gw.request_save("unsaved".to_owned()).run().outcome,
            GatewayOutcome::Cancelled
        ));
        assert_eq!(*seen.lock(), vec![FileFilter::default()]);
    }

    #[test]
    fn save_writes_exact_content() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.txt");
        let picker = ScriptedPicker::save(Some(path.clone()));
        let seen = picker.seen_filters();
        let mut gw = gateway(picker);

        let content = "héllo\r\nworld\n".to_owned();
        match gw.request_save(content.clone()).run().outcome {
            GatewayOutcome::Saved(p) => assert_eq!(p, path),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(fs::read(&path).expect("read back"), content.as_bytes());
        assert_eq!(seen.lock().as_slice(), &[FileFilter::default()]);
    }

    #[test]
    fn write_to_known_path_skips_picker() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("known.txt");
        let mut gw = gateway(ScriptedPicker::save(None));
        match gw.request_write(path.clone(), "abc".to_owned()).run().outcome {
            GatewayOutcome::Saved(p) => assert_eq!(p, path),
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(fs::read_to_string(&path).expect("read back"), "abc");
    }

    #[test]
    fn task_ids_increase() {
        let mut gw = gateway(ScriptedPicker::open(None));
        let a = gw.request_open();
        let b = gw.request_open();
        assert!(b.id.0 > a.id.0);
        assert_eq!(a.label, "open");
    }

    #[test]
    fn decode_utf16le() {
        assert_eq!(decode_text(b"\xFF\xFEh\x00i\x00"), "hi");
    }

    #[test]
    fn decode_utf16be() {
        assert_eq!(decode_text(b"\xFE\xFF\x00h\x00i"), "hi");
    }

    #[test]
    fn decode_utf8_bom_is_stripped() {
        assert_eq!(decode_text(b"\xEF\xBB\xBFhello"), "hello");
    }

    #[test]
    fn decode_invalid_utf8_is_lossy() {
        assert_eq!(decode_text(b"a\x80b"), "a\u{FFFD}b");
    }
}
