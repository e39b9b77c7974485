//! JSONL journal event store
//!
//! Layout: `<base>/YYYY-MM-DD.jsonl`, one JSON-serialized [`QueryEvent`] per
//! line. An event goes into the file of its own UTC day, so a range scan only
//! has to open files whose day is not before the day of `since`.
//!
//! File I/O is blocking and runs on the blocking pool. A single writer lock
//! serializes appends. Scans never take it: they read the files directly and
//! skip any line that does not parse (a torn write from a crash, or a line
//! still being written), logging it with its file and line number.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use callguard_core::{QueryEvent, StoreError, StoreResult};
use chrono::{DateTime, Utc};

use crate::store::EventStore;

const DAY_FORMAT: &str = "%Y-%m-%d";

/// Append-only JSONL event store
#[derive(Clone)]
pub struct JournalEventStore {
    base_path: PathBuf,
    writer: Arc<Mutex<JournalWriter>>,
}

struct JournalWriter {
    base_path: PathBuf,
    current_file: Option<BufWriter<File>>,
    current_date: Option<String>,
}

impl JournalWriter {
    fn append(&mut self, event: &QueryEvent) -> StoreResult<()> {
        let date = event.timestamp.format(DAY_FORMAT).to_string();

        // Rotate file if date changed
        if self.current_date.as_ref() != Some(&date) {
            self.rotate_file(&date)?;
        }

        if let Some(ref mut writer) = self.current_file {
            let json = serde_json::to_string(event)?;
            writeln!(writer, "{}", json)?;
            writer.flush()?;
        }

        Ok(())
    }

    fn rotate_file(&mut self, date: &str) -> StoreResult<()> {
        if let Some(ref mut writer) = self.current_file {
            writer.flush()?;
        }

        let file_path = self.base_path.join(format!("{}.jsonl", date));
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&file_path)?;

        // Terminate a torn last line so the next record starts on its own line
        if !ends_with_newline(&mut file)? {
            tracing::warn!(file = %file_path.display(), "Journal file ends mid-line, terminating it");
            file.write_all(b"\n")?;
        }

        self.current_file = Some(BufWriter::new(file));
        self.current_date = Some(date.to_string());

        Ok(())
    }
}

impl Drop for JournalWriter {
    fn drop(&mut self) {
        if let Some(ref mut writer) = self.current_file {
            let _ = writer.flush();
        }
    }
}

impl JournalEventStore {
    /// Open (or create) a journal rooted at `base_path`
    pub fn open(base_path: impl AsRef<Path>) -> StoreResult<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;

        Ok(Self {
            writer: Arc::new(Mutex::new(JournalWriter {
                base_path: base_path.clone(),
                current_file: None,
                current_date: None,
            })),
            base_path,
        })
    }

    /// Journal directory
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// All journal files, oldest day first
    pub fn list_files(&self) -> StoreResult<Vec<PathBuf>> {
        list_day_files(&self.base_path)
    }

    /// Run `f` on the blocking pool while holding the writer lock
    async fn with_writer<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut JournalWriter) -> StoreResult<T> + Send + 'static,
    {
        let writer = self.writer.clone();
        run_blocking(move || {
            let mut guard = writer
                .lock()
                .map_err(|_| StoreError::Unavailable("journal lock poisoned".to_string()))?;
            f(&mut *guard)
        })
        .await
    }
}

async fn run_blocking<T, F>(f: F) -> StoreResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> StoreResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Unavailable(format!("journal task failed: {}", e)))?
}

fn ends_with_newline(file: &mut File) -> StoreResult<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

fn list_day_files(base_path: &Path) -> StoreResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(base_path)? {
        let entry = entry?;
        let path = entry.path();
        if path.extension().map_or(false, |ext| ext == "jsonl") {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

fn read_since(
    base_path: &Path,
    phone_number: &str,
    since: DateTime<Utc>,
) -> StoreResult<Vec<QueryEvent>> {
    let first_day = since.format(DAY_FORMAT).to_string();
    let mut events = Vec::new();

    for file_path in list_day_files(base_path)? {
        let day = file_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        if day < first_day.as_str() {
            continue;
        }

        let reader = BufReader::new(File::open(&file_path)?);
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let event: QueryEvent = match serde_json::from_str(&line) {
                Ok(event) => event,
                Err(e) => {
                    tracing::warn!(
                        file = %file_path.display(),
                        line = index + 1,
                        error = %e,
                        "Skipping unreadable journal line"
                    );
                    continue;
                }
            };
            if event.phone_number == phone_number && event.is_since(since) {
                events.push(event);
            }
        }
    }

    Ok(events)
}

#[async_trait]
impl EventStore for JournalEventStore {
    async fn append(&self, event: &QueryEvent) -> StoreResult<()> {
        let owned = event.clone();
        self.with_writer(move |writer| writer.append(&owned)).await?;
        tracing::trace!(phone_number = %event.phone_number, "Query event journaled");
        Ok(())
    }

    async fn events_since(
        &self,
        phone_number: &str,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<QueryEvent>> {
        let base_path = self.base_path.clone();
        let phone_number = phone_number.to_string();
        run_blocking(move || read_since(&base_path, &phone_number, since)).await
    }
}
