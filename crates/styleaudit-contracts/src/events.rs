use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

pub type EventPayload = Map<String, Value>;

pub type EventObserver = Arc<dyn Fn(&Value) + Send + Sync>;

/// Append-only writer for the audit event log.
///
/// - default fields are `type`, `run_id`, `ts`
/// - caller payload is merged last and can override defaults
/// - one compact JSON object per line when a log path is configured
/// - every observer sees every event, even when the log append fails
#[derive(Clone)]
pub struct EventWriter {
    inner: Arc<EventWriterInner>,
}

struct EventWriterInner {
    path: Option<PathBuf>,
    run_id: String,
    observers: Mutex<Vec<EventObserver>>,
    lock: Mutex<()>,
}

impl fmt::Debug for EventWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventWriter")
            .field("path", &self.inner.path)
            .field("run_id", &self.inner.run_id)
            .finish()
    }
}

impl EventWriter {
    pub fn new(path: impl Into<PathBuf>, run_id: impl Into<String>) -> Self {
        Self::build(Some(path.into()), run_id.into())
    }

    /// Like [`EventWriter::new`], but checks up front that the log file can be
    /// opened for appending.
    pub fn create(path: impl Into<PathBuf>, run_id: impl Into<String>) -> anyhow::Result<Self> {
        let path = path.into();
        open_log(&path)?;
        Ok(Self::build(Some(path), run_id.into()))
    }

    /// Writer that only notifies observers.
    pub fn in_memory(run_id: impl Into<String>) -> Self {
        Self::build(None, run_id.into())
    }

    fn build(path: Option<PathBuf>, run_id: String) -> Self {
        Self {
            inner: Arc::new(EventWriterInner {
                path,
                run_id,
                observers: Mutex::new(Vec::new()),
                lock: Mutex::new(()),
            }),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    pub fn run_id(&self) -> &str {
        &self.inner.run_id
    }

    pub fn subscribe(&self, observer: EventObserver) -> anyhow::Result<()> {
        self.inner
            .observers
            .lock()
            .map_err(|_| anyhow::anyhow!("event observer lock poisoned"))?
            .push(observer);
        Ok(())
    }

    pub fn emit(&self, event_type: &str, payload: EventPayload) -> anyhow::Result<Value> {
        let mut event = Map::new();
        event.insert("type".to_string(), Value::String(event_type.to_string()));
        event.insert(
            "run_id".to_string(),
            Value::String(self.inner.run_id.clone()),
        );
        event.insert("ts".to_string(), Value::String(now_utc_iso()));
        for (key, value) in payload {
            event.insert(key, value);
        }
        let event = Value::Object(event);

        let appended = match &self.inner.path {
            Some(path) => self.append(path, &event),
            None => Ok(()),
        };

        let observers = self
            .inner
            .observers
            .lock()
            .map_err(|_| anyhow::anyhow!("event observer lock poisoned"))?
            .clone();
        for observer in observers {
            observer(&event);
        }

        appended.map(|()| event)
    }

    fn append(&self, path: &Path, event: &Value) -> anyhow::Result<()> {
        let line = serde_json::to_string(event)?;
        let _guard = self
            .inner
            .lock
            .lock()
            .map_err(|_| anyhow::anyhow!("event writer lock poisoned"))?;
        let mut file = open_log(path)?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        Ok(())
    }
}

fn open_log(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed creating {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed opening event log {}", path.display()))
}

pub fn now_utc_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)
}
