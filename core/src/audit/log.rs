use crate::audit::event::{compute_event_hash, finalize_event, AuditEvent, ZERO_HASH_64};
use crate::error::{CoreError, CoreResult};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

enum Sink {
    Memory(Vec<AuditEvent>),
    File(PathBuf),
}

/// Append-only, hash-chained event log, held in memory or as NDJSON on disk.
pub struct AuditLog {
    sink: Sink,
    last_hash: String,
}

impl AuditLog {
    pub fn in_memory() -> Self {
        Self {
            sink: Sink::Memory(Vec::new()),
            last_hash: ZERO_HASH_64.to_string(),
        }
    }

    /// Opens an existing log and resumes its chain, or creates an empty one.
    pub fn open_or_create(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            File::create(&path)?;
            return Ok(Self {
                sink: Sink::File(path),
                last_hash: ZERO_HASH_64.to_string(),
            });
        }

        let last_hash = read_events(&path)?
            .last()
            .map(|e| e.event_hash.clone())
            .unwrap_or_else(|| ZERO_HASH_64.to_string());
        Ok(Self {
            sink: Sink::File(path),
            last_hash,
        })
    }

    pub fn append(&mut self, mut event: AuditEvent) -> CoreResult<AuditEvent> {
        event.prev_event_hash = self.last_hash.clone();
        let event = finalize_event(event)?;
        match &mut self.sink {
            Sink::Memory(events) => events.push(event.clone()),
            Sink::File(path) => {
                let line = serde_json::to_string(&event)?;
                let mut f = OpenOptions::new().append(true).open(path)?;
                f.write_all(line.as_bytes())?;
                f.write_all(b"\n")?;
            }
        }
        self.last_hash = event.event_hash.clone();
        Ok(event)
    }

    pub fn events(&self) -> CoreResult<Vec<AuditEvent>> {
        match &self.sink {
            Sink::Memory(events) => Ok(events.clone()),
            Sink::File(path) => read_events(path),
        }
    }

    pub fn last_hash(&self) -> &str {
        &self.last_hash
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.sink {
            Sink::Memory(_) => None,
            Sink::File(p) => Some(p),
        }
    }
}

pub fn read_events(path: &Path) -> CoreResult<Vec<AuditEvent>> {
    let reader = BufReader::new(File::open(path)?);
    let mut events = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        events.push(serde_json::from_str(&line)?);
    }
    Ok(events)
}

/// Checks every link and every hash, starting from the zero hash.
pub fn verify_chain(events: &[AuditEvent]) -> CoreResult<()> {
    let mut prev = ZERO_HASH_64.to_string();
    for (i, e) in events.iter().enumerate() {
        if e.prev_event_hash != prev {
            return Err(CoreError::InvalidInput(format!(
                "audit chain broken at event {}: prev_event_hash mismatch",
                i
            )));
        }
        if compute_event_hash(e)? != e.event_hash {
            return Err(CoreError::InvalidInput(format!(
                "audit chain broken at event {}: event_hash mismatch",
                i
            )));
        }
        prev = e.event_hash.clone();
    }
    Ok(())
}
