//! File-backed preference store.

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{BufReader, BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
};

use roomlink_client::{PreferenceError, PreferenceStore};
use tracing::debug;

/// Preferences kept in a CBOR-encoded map on disk.
///
/// The whole map is rewritten on every change through a temporary file
/// renamed over the original.
#[derive(Debug)]
pub struct FilePreferences {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FilePreferences {
    /// Load preferences from `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`PreferenceError::Storage`] if the file exists but cannot be
    /// read or decoded.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PreferenceError> {
        let path = path.into();
        let values = match File::open(&path) {
            Ok(file) => ciborium::from_reader(BufReader::new(file))
                .map_err(|error| storage_error(&path, &error))?,
            Err(error) if error.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(error) => return Err(storage_error(&path, &error)),
        };
        debug!(path = %path.display(), entries = values.len(), "preferences loaded");
        Ok(Self { path, values })
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), PreferenceError> {
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|error| storage_error(parent, &error))?;
        }

        let staging = self.path.with_extension("tmp");
        let file = File::create(&staging).map_err(|error| storage_error(&staging, &error))?;
        let mut writer = BufWriter::new(file);
        ciborium::into_writer(&self.values, &mut writer)
            .map_err(|error| storage_error(&staging, &error))?;
        writer.flush().map_err(|error| storage_error(&staging, &error))?;
        fs::rename(&staging, &self.path).map_err(|error| storage_error(&self.path, &error))
    }
}

impl PreferenceStore for FilePreferences {
    fn read(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn persist(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        if self.values.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }
        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }
}

fn storage_error(path: &Path, error: &impl std::fmt::Display) -> PreferenceError {
    PreferenceError::Storage(format!("{}: {error}", path.display()))
}
