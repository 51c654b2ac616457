use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use thiserror::Error;

use crate::decoder::{DecodeOptions, Document, decode_with_observer};
use crate::format::error::DecodeError;
use crate::observer::{DecodeObserver, NoopObserver};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Open an SDF file as a buffered byte stream.
pub fn open_sdf_file(path: &Path) -> Result<BufReader<File>, SourceError> {
    Ok(BufReader::new(File::open(path)?))
}

/// Decode every ping of the file at `path`.
///
/// # Examples
/// ```no_run
/// use std::path::Path;
///
/// use sdfkit_core::{DecodeOptions, decode_sdf_file};
///
/// let document = decode_sdf_file(Path::new("survey.sdf"), DecodeOptions::lenient())?;
/// println!("{} pings", document.len());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn decode_sdf_file(path: &Path, options: DecodeOptions) -> Result<Document, SourceError> {
    decode_sdf_file_with_observer(path, options, NoopObserver)
}

pub fn decode_sdf_file_with_observer<O: DecodeObserver>(
    path: &Path,
    options: DecodeOptions,
    observer: O,
) -> Result<Document, SourceError> {
    let reader = open_sdf_file(path)?;
    Ok(decode_with_observer(reader, options, observer)?)
}
