use crate::error::{IoError, Result};
use settlers_core::events::{LifecycleEvent, LifecycleObserver};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;
use std::thread::JoinHandle;

const EVENTS_FILE: &str = "events.jsonl";

/// Appends lifecycle events to `<dir>/events.jsonl`.
///
/// Hooks only push onto a channel; a writer thread serializes and appends.
/// Write failures are logged and never reach the simulation.
pub struct HistoryLogger {
    sender: Mutex<Option<Sender<LifecycleEvent>>>,
    writer: Mutex<Option<JoinHandle<()>>>,
    path: Option<PathBuf>,
}

impl std::fmt::Debug for HistoryLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryLogger")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl HistoryLogger {
    pub fn new() -> Result<Self> {
        Self::new_at("logs")
    }

    pub fn new_at<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .map_err(|e| IoError::FileSystem(e).with_context(format!("creating {:?}", dir)))?;
        let path = dir.join(EVENTS_FILE);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| IoError::FileSystem(e).with_context(format!("opening {:?}", path)))?;

        let (sender, receiver) = mpsc::channel();
        let writer = std::thread::Builder::new()
            .name("history-writer".into())
            .spawn(move || write_events(receiver, BufWriter::new(file)))?;

        Ok(Self {
            sender: Mutex::new(Some(sender)),
            writer: Mutex::new(Some(writer)),
            path: Some(path),
        })
    }

    /// Logger that drops every event.
    #[must_use]
    pub fn new_dummy() -> Self {
        Self {
            sender: Mutex::new(None),
            writer: Mutex::new(None),
            path: None,
        }
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Stops accepting events and waits until everything queued is on disk.
    pub fn close(&self) {
        self.sender
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        let writer = self
            .writer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = writer {
            if handle.join().is_err() {
                tracing::warn!("History writer thread panicked");
            }
        }
    }

    /// Reads back a JSONL event log, skipping unparsable lines.
    pub fn read_events<P: AsRef<Path>>(path: P) -> Result<Vec<LifecycleEvent>> {
        let file = match File::open(path.as_ref()) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let events = BufReader::new(file)
            .lines()
            .map_while(std::io::Result::ok)
            .filter_map(|line| serde_json::from_str::<LifecycleEvent>(&line).ok())
            .collect();
        Ok(events)
    }
}

impl LifecycleObserver for HistoryLogger {
    fn record(&self, event: LifecycleEvent) {
        let sender = self.sender.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(tx) = sender.as_ref() {
            if tx.send(event).is_err() {
                tracing::warn!("History writer stopped; event dropped");
            }
        }
    }
}

impl Drop for HistoryLogger {
    fn drop(&mut self) {
        self.close();
    }
}

fn write_events(receiver: Receiver<LifecycleEvent>, mut out: BufWriter<File>) {
    while let Ok(event) = receiver.recv() {
        append(&mut out, &event);
        // Batch whatever else is queued before flushing.
        while let Ok(event) = receiver.try_recv() {
            append(&mut out, &event);
        }
        if let Err(e) = out.flush() {
            tracing::warn!(error = %e, "Failed to flush history");
        }
    }
}

fn append(out: &mut BufWriter<File>, event: &LifecycleEvent) {
    let line = match serde_json::to_string(event) {
        Ok(line) => line,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to serialize history event");
            return;
        }
    };
    if let Err(e) = writeln!(out, "{}", line) {
        tracing::warn!(error = %e, "Failed to write history event");
    }
}
