//! Single-stream HTTP GET into a local sink.
//!
//! No retries: a failed transfer is reported once and the caller decides.
//! Timeouts bound how long a stalled server can hold the provisioning run.

mod error;

pub use error::TransferError;

use crate::config::TransferConfig;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str;
use std::time::Duration;

/// Suffix of the temp file a body is streamed into before it is renamed.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` (e.g. `installer.php` → `installer.php.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Curl limits applied to every transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOptions {
    pub connect_timeout: Duration,
    pub timeout: Duration,
    /// Abort when throughput stays below this many bytes/sec for `low_speed_time`.
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
}

impl Default for TransferOptions {
    fn default() -> Self {
        TransferOptions::from(&TransferConfig::default())
    }
}

impl From<&TransferConfig> for TransferOptions {
    fn from(cfg: &TransferConfig) -> Self {
        Self {
            connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
            timeout: Duration::from_secs(cfg.timeout_secs),
            low_speed_limit: cfg.low_speed_limit_bytes,
            low_speed_time: Duration::from_secs(cfg.low_speed_time_secs),
        }
    }
}

/// GETs `url` and writes the body to `sink`. Follows redirects.
/// Returns the number of body bytes written.
pub fn fetch_into<W: Write>(
    url: &str,
    sink: &mut W,
    opts: &TransferOptions,
) -> Result<u64, TransferError> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.connect_timeout(opts.connect_timeout)?;
    easy.low_speed_limit(opts.low_speed_limit)?;
    easy.low_speed_time(opts.low_speed_time)?;
    easy.timeout(opts.timeout)?;

    let mut written: u64 = 0;
    let mut write_err: Option<std::io::Error> = None;
    let performed = {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            if let Ok(line) = str::from_utf8(data) {
                let line = line.trim_end();
                if !line.is_empty() {
                    tracing::trace!(header = line, "response header");
                }
            }
            true
        })?;
        transfer.write_function(|data| match sink.write_all(data) {
            Ok(()) => {
                written += data.len() as u64;
                Ok(data.len())
            }
            Err(e) => {
                write_err = Some(e);
                Ok(0) // abort transfer
            }
        })?;
        transfer.perform()
    };

    if let Some(e) = write_err {
        return Err(TransferError::Write(e));
    }
    performed?;

    let code = easy.response_code()?;
    if !(200..300).contains(&code) {
        return Err(TransferError::Http(code));
    }
    sink.flush().map_err(TransferError::Write)?;
    tracing::debug!(url, bytes = written, "transfer complete");
    Ok(written)
}

/// Last path segment of a URL, used as a default local file name.
///
/// Returns `None` if the URL cannot be parsed or the path is empty/root.
pub fn filename_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path().split('/').filter(|s| !s.is_empty()).last()?;
    if segment == "." || segment == ".." {
        return None;
    }
    Some(segment.to_string())
}
