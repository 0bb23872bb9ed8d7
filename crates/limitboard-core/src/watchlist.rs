use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::CoreError;

/// Ordered list of watched stock codes kept in a JSON array file.
///
/// The file is read once on open and rewritten after every change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watchlist {
    path: PathBuf,
    codes: Vec<String>,
}

impl Watchlist {
    /// Loads the list at `path`. A missing file is an empty list; an
    /// unreadable one is logged and treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let codes = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|error| {
                warn!(path = %path.display(), %error, "watchlist file is corrupt; starting empty");
                Vec::new()
            }),
            Err(error) if error.kind() == ErrorKind::NotFound => Vec::new(),
            Err(error) => return Err(error.into()),
        };
        debug!(path = %path.display(), count = codes.len(), "watchlist loaded");
        Ok(Self { path, codes })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn codes(&self) -> &[String] {
        &self.codes
    }

    pub fn is_watched(&self, code: &str) -> bool {
        self.codes.iter().any(|watched| watched == code.trim())
    }

    /// Appends `code`. Blank and already-watched codes are ignored.
    pub fn add(&mut self, code: &str) -> Result<bool, CoreError> {
        let code = code.trim();
        if code.is_empty() || self.is_watched(code) {
            return Ok(false);
        }
        self.codes.push(code.to_owned());
        self.save()?;
        Ok(true)
    }

    pub fn remove(&mut self, code: &str) -> Result<bool, CoreError> {
        let code = code.trim();
        let Some(position) = self.codes.iter().position(|watched| watched == code) else {
            return Ok(false);
        };
        self.codes.remove(position);
        self.save()?;
        Ok(true)
    }

    /// Flips the watched state and returns the new one.
    pub fn toggle(&mut self, code: &str) -> Result<bool, CoreError> {
        if self.is_watched(code) {
            self.remove(code)?;
            Ok(false)
        } else {
            self.add(code)
        }
    }

    pub fn clear(&mut self) -> Result<(), CoreError> {
        self.codes.clear();
        self.save()
    }

    fn save(&self) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec(&self.codes)?)?;
        Ok(())
    }
}
