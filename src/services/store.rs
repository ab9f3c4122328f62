use serde::de::DeserializeOwned;
use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};
use tracing::warn;

use crate::error::{GeneratorError, Result};
use crate::model::output::VersionState;
use crate::services::canonical;
use crate::services::version::VersionStore;

pub const VERSION_FILE: &str = "version.json";
pub const ETAG_FILE: &str = "etag.json";

/// `VersionState` kept as pretty JSON in the cache directory.
#[derive(Debug, Clone)]
pub struct FileVersionStore {
    path: PathBuf,
}

impl FileVersionStore {
    pub fn new(cache_dir: &Path) -> Self {
        FileVersionStore {
            path: cache_dir.join(VERSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl VersionStore for FileVersionStore {
    /// A missing file means no prior state. A file that cannot be read or
    /// parsed is an error, so the version never restarts from 1.
    fn load(&self) -> Result<Option<VersionState>> {
        read_json(&self.path)
    }

    fn save(&mut self, state: &VersionState) -> Result<()> {
        let json = canonical::to_pretty_string(state)?;
        write_atomic(&self.path, json.as_bytes())
    }
}

/// ETag per index URL, used for conditional fetches.
#[derive(Debug, Clone, Default)]
pub struct EtagCache {
    path: PathBuf,
    tags: BTreeMap<String, String>,
}

impl EtagCache {
    pub fn load(cache_dir: &Path) -> Self {
        let path = cache_dir.join(ETAG_FILE);
        let tags = match read_json(&path) {
            Ok(tags) => tags.unwrap_or_default(),
            Err(e) => {
                warn!(path = %path.display(), "ignoring etag cache: {e}");
                BTreeMap::new()
            }
        };
        EtagCache { path, tags }
    }

    pub fn get(&self, url: &str) -> Option<&str> {
        self.tags.get(url).map(String::as_str)
    }

    pub fn insert(&mut self, url: &str, etag: &str) {
        self.tags.insert(url.to_string(), etag.to_string());
    }

    pub fn save(&self) -> Result<()> {
        let json = canonical::to_pretty_string(&self.tags)?;
        write_atomic(&self.path, json.as_bytes())
    }
}

/// `Ok(None)` when the file does not exist.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let data = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(GeneratorError::io(path, e)),
    };

    Ok(Some(serde_json::from_str(&data)?))
}

/// Writes to a sibling temp file, then renames over the target.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = tmp_path(path);

    if let Some(parent) = tmp.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| GeneratorError::io(parent, e))?;
    }

    fs::write(&tmp, bytes).map_err(|e| GeneratorError::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| GeneratorError::io(path, e))?;

    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut p = path.to_path_buf();
    let file_name = match path.file_name().and_then(|s| s.to_str()) {
        Some(n) => n.to_string(),
        None => "output".to_string(),
    };
    p.set_file_name(format!("{file_name}.tmp"));
    p
}
