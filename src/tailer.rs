use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use thiserror::Error;

use crate::events::{AppEvent, TriggerEvent};
use crate::triggers::TriggerSet;

#[derive(Debug, Error)]
pub enum TailError {
    #[error("failed to open log file {path}: {source}")]
    FileOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("log stream lost: {source}")]
    StreamLost {
        #[source]
        source: std::io::Error,
    },
}

/// Owns the open file handle and the byte offset of the next unread line.
/// Created positioned at end-of-file, so content written before the watch
/// began is never scanned.
pub struct TailCursor {
    reader: BufReader<File>,
    offset: u64,
}

impl TailCursor {
    pub fn open_at_end(path: &Path) -> Result<Self, TailError> {
        let file = File::open(path).map_err(|source| TailError::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);
        let offset = reader
            .seek(SeekFrom::End(0))
            .map_err(|source| TailError::FileOpen {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self { reader, offset })
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read the next complete appended line, without its terminator.
    /// Returns `Ok(None)` when no full line is available yet. A read that
    /// yields bytes with no trailing newline means the writer is mid-append;
    /// the cursor rewinds so the whole line is seen on a later poll.
    pub fn next_line(&mut self) -> std::io::Result<Option<String>> {
        let mut line = String::new();
        let bytes_read = self.reader.read_line(&mut line)?;
        if bytes_read == 0 {
            return Ok(None);
        }
        if !line.ends_with('\n') {
            self.reader.seek(SeekFrom::Start(self.offset))?;
            return Ok(None);
        }
        self.offset += bytes_read as u64;
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }
}

/// Tails a log file on a background thread, classifying each appended line
/// against the trigger set and pushing matches into the app event channel.
///
/// Events are emitted strictly in file order from this one thread; the
/// consumer end of the channel serializes them against ticks.
pub struct LogTailer {
    cancel: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl LogTailer {
    /// Open `path`, seek to its end, and start the watch thread.
    ///
    /// Open/seek failures are fatal and reported here, before any thread is
    /// spawned. After that the tailer runs until [`shutdown`](Self::shutdown)
    /// is called, the receiver is dropped, or the stream is lost (reported as
    /// [`AppEvent::StreamLost`] followed by thread exit).
    pub fn spawn(
        path: &Path,
        triggers: TriggerSet,
        poll_interval: Duration,
        event_tx: Sender<AppEvent>,
    ) -> Result<Self, TailError> {
        let mut cursor = TailCursor::open_at_end(path)?;
        let cancel = Arc::new(AtomicBool::new(false));
        let cancel_flag = Arc::clone(&cancel);
        let path = path.to_path_buf();

        let handle = thread::spawn(move || {
            tracing::info!("tailing {} from offset {}", path.display(), cursor.offset());

            while !cancel_flag.load(Ordering::SeqCst) {
                match cursor.next_line() {
                    Ok(Some(line)) => {
                        if let Some(kind) = triggers.classify(&line) {
                            tracing::debug!(?kind, "trigger line: {}", line);
                            let event = AppEvent::Trigger(TriggerEvent::new(kind, line));
                            if event_tx.send(event).is_err() {
                                break; // Receiver dropped, exit thread
                            }
                        }
                    }
                    Ok(None) => {
                        thread::sleep(poll_interval);
                    }
                    Err(source) => {
                        let err = TailError::StreamLost { source };
                        tracing::error!("{} while tailing {}", err, path.display());
                        let _ = event_tx.send(AppEvent::StreamLost(err.to_string()));
                        break;
                    }
                }
            }
        });

        Ok(Self {
            cancel,
            handle: Some(handle),
        })
    }

    /// Signal the watch thread to stop and wait for it to finish.
    /// Returns within roughly one poll interval.
    pub fn shutdown(mut self) {
        self.cancel.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for LogTailer {
    fn drop(&mut self) {
        self.cancel.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn cursor_starts_at_end_of_existing_content() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "old line one").unwrap();
        writeln!(file, "old line two").unwrap();
        file.flush().unwrap();

        let mut cursor = TailCursor::open_at_end(file.path()).unwrap();
        assert_eq!(cursor.next_line().unwrap(), None);

        writeln!(file, "new line").unwrap();
        file.flush().unwrap();
        assert_eq!(cursor.next_line().unwrap(), Some("new line".to_string()));
        assert_eq!(cursor.next_line().unwrap(), None);
    }

    #[test]
    fn cursor_rewinds_on_partial_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let mut cursor = TailCursor::open_at_end(file.path()).unwrap();

        write!(file, "half a li").unwrap();
        file.flush().unwrap();
        assert_eq!(cursor.next_line().unwrap(), None);

        writeln!(file, "ne").unwrap();
        file.flush().unwrap();
        assert_eq!(cursor.next_line().unwrap(), Some("half a line".to_string()));
    }

    #[test]
    fn cursor_strips_crlf() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let mut cursor = TailCursor::open_at_end(file.path()).unwrap();

        write!(file, "windows line\r\n").unwrap();
        file.flush().unwrap();
        assert_eq!(cursor.next_line().unwrap(), Some("windows line".to_string()));
    }

    #[test]
    fn open_missing_file_is_a_file_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such.log");
        match TailCursor::open_at_end(&missing) {
            Err(TailError::FileOpen { path, .. }) => assert_eq!(path, missing),
            Err(other) => panic!("expected FileOpen error, got {other:?}"),
            Ok(_) => panic!("opening a missing file should fail"),
        }
    }
}
