use std::fmt;
use std::path::PathBuf;

/// One fully resolved unit of download work.
///
/// The destination is a pure function of the query and the slice, so the
/// same plan always points at the same files.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestItem {
    pub url: String,
    pub destination: PathBuf,
    /// Set for station datasets.
    pub station_id: Option<String>,
}

impl RequestItem {
    pub fn new(url: String, destination: PathBuf, station_id: Option<String>) -> Self {
        Self {
            url,
            destination,
            station_id,
        }
    }

    pub fn file_name(&self) -> String {
        self.destination
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

impl fmt::Display for RequestItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_name())
    }
}
