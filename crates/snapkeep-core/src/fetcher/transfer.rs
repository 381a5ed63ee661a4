//! Streaming HTTP GET into a snapshot temp file.
//!
//! The temp file is created on the first body chunk of a 2xx response, so a
//! non-2xx response never touches the disk.

use super::FetchError;
use crate::config::FetchConfig;
use crate::storage::SnapshotWriter;
use std::cell::{Cell, RefCell};
use std::path::Path;
use std::time::Duration;

fn is_success(code: u32) -> bool {
    (200..300).contains(&code)
}

/// Status code from a status line such as `HTTP/1.1 404 Not Found` or `HTTP/2 200`.
fn parse_status_line(line: &[u8]) -> Option<u32> {
    let line = std::str::from_utf8(line).ok()?;
    if !line.starts_with("HTTP/") {
        return None;
    }
    line.split_whitespace().nth(1)?.parse().ok()
}

fn configure(easy: &mut curl::easy::Easy, url: &str, opts: &FetchConfig) -> Result<(), curl::Error> {
    easy.url(url)?;
    easy.get(true)?;
    easy.follow_location(true)?;
    easy.max_redirections(opts.max_redirects)?;
    easy.connect_timeout(Duration::from_secs(opts.connect_timeout_secs))?;
    // Abort if throughput stays below the floor; keeps big files on slow links alive
    // while still failing a stalled transfer.
    easy.low_speed_limit(opts.low_speed_limit)?;
    easy.low_speed_time(Duration::from_secs(opts.low_speed_time_secs))?;
    easy.timeout(Duration::from_secs(opts.timeout_secs))?;
    if let Some(speed) = opts.max_bytes_per_sec {
        easy.max_recv_speed(speed)?;
    }
    if let Some(agent) = opts.user_agent.as_deref() {
        easy.useragent(agent)?;
    }
    Ok(())
}

/// GETs `url`, streaming the body to `temp`, then moves it to `final_path`.
/// Returns the number of bytes written. On any failure no file is left at
/// `final_path` and the temp file is removed.
pub(super) fn download_to(
    url: &str,
    temp: &Path,
    final_path: &Path,
    opts: &FetchConfig,
) -> Result<u64, FetchError> {
    let mut easy = curl::easy::Easy::new();
    configure(&mut easy, url, opts).map_err(FetchError::Transport)?;

    // Status of the most recent response; redirects and 1xx replace it.
    let status = Cell::new(0u32);
    let writer: RefCell<Option<SnapshotWriter>> = RefCell::new(None);
    let storage_error: RefCell<Option<anyhow::Error>> = RefCell::new(None);

    let performed = {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|line| {
                if let Some(code) = parse_status_line(line) {
                    status.set(code);
                }
                true
            })
            .map_err(FetchError::Transport)?;
        transfer
            .write_function(|data| {
                if !is_success(status.get()) {
                    // Short count aborts the transfer before any byte is stored.
                    return Ok(0);
                }
                let mut slot = writer.borrow_mut();
                if slot.is_none() {
                    match SnapshotWriter::create(temp) {
                        Ok(w) => *slot = Some(w),
                        Err(e) => {
                            *storage_error.borrow_mut() = Some(e);
                            return Ok(0);
                        }
                    }
                }
                let Some(w) = slot.as_mut() else {
                    return Ok(0);
                };
                match w.write_chunk(data) {
                    Ok(()) => Ok(data.len()),
                    Err(e) => {
                        *storage_error.borrow_mut() = Some(e);
                        Ok(0)
                    }
                }
            })
            .map_err(FetchError::Transport)?;
        transfer.perform()
    };

    let writer = writer.into_inner();
    let failure = match performed {
        Err(e) if e.is_write_error() => match storage_error.into_inner() {
            Some(io) => Some(FetchError::Storage(io)),
            None => Some(FetchError::Http(status.get())),
        },
        Err(e) => Some(FetchError::Transport(e)),
        Ok(()) => {
            let code = easy.response_code().map_err(FetchError::Transport)?;
            if is_success(code) {
                None
            } else {
                Some(FetchError::Http(code))
            }
        }
    };

    if let Some(err) = failure {
        if let Some(w) = writer {
            w.discard();
        }
        tracing::debug!(url, "fetch failed: {}", err);
        return Err(err);
    }

    // An empty 2xx body never reaches the write callback.
    let writer = match writer {
        Some(w) => w,
        None => SnapshotWriter::create(temp).map_err(FetchError::Storage)?,
    };
    writer.finalize(final_path).map_err(|e| {
        let exists = e
            .root_cause()
            .downcast_ref::<std::io::Error>()
            .is_some_and(|io| io.kind() == std::io::ErrorKind::AlreadyExists);
        if exists {
            FetchError::AlreadyExists(final_path.to_path_buf())
        } else {
            FetchError::Storage(e)
        }
    })
}
