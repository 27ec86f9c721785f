use std::io::Read;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error_handling::types::ReaderError;

/// Where a render request reads its conn log from.
///
/// A file can be re-read on every request. Standard input is a one-shot
/// source: the first read consumes it, later reads get `SourceExhausted`
/// instead of an empty (and misleading) batch.
#[derive(Debug)]
pub enum LogSource {
    File(PathBuf),
    Stdin(Mutex<bool>),
}

impl LogSource {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        LogSource::File(path.into())
    }

    pub fn stdin() -> Self {
        LogSource::Stdin(Mutex::new(false))
    }

    /// Read the whole source to a string.
    pub fn read(&self) -> Result<String, ReaderError> {
        match self {
            LogSource::File(path) => Ok(std::fs::read_to_string(path)?),
            LogSource::Stdin(consumed) => read_once(consumed, || {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf)?;
                Ok(buf)
            }),
        }
    }
}

/// One-shot gate: the first caller gets to run `read`, every later caller is
/// refused. The flag flips before reading, so even a failed read consumes
/// the source.
fn read_once(
    consumed: &Mutex<bool>,
    read: impl FnOnce() -> Result<String, ReaderError>,
) -> Result<String, ReaderError> {
    let mut consumed = match consumed.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if *consumed {
        return Err(ReaderError::SourceExhausted);
    }
    *consumed = true;
    read()
}
