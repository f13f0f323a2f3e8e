// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed registry: one JSON document per app under `<root>/apps/`.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mirage_core::App;
use parking_lot::Mutex;

use crate::registry::{validate_app, validate_name, AppRegistry, RegistryError};

const MAX_BAK_FILES: u32 = 3;

/// Registry persisting each app as `<root>/apps/<name>.json`.
///
/// Writes go to a temp file in the same directory and are renamed into
/// place, so a crash never leaves a half-written record. A process-wide
/// mutex serializes writers within one daemon.
#[derive(Clone)]
pub struct FileRegistry {
    dir: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileRegistry {
    /// Open (and create if needed) the registry rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let dir = root.as_ref().join("apps");
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, write_lock: Arc::new(Mutex::new(())) })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    fn read(&self, name: &str) -> Result<App, RegistryError> {
        validate_name(name)?;
        let bytes = match fs::read(self.path_for(name)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(RegistryError::NotFound(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Move a corrupt record to a `.bak` file. Returns whether it was moved.
    ///
    /// Re-checked under the write lock: a writer may have replaced the
    /// record since it was read.
    fn quarantine(&self, name: &str, path: &Path) -> bool {
        let _guard = self.write_lock.lock();
        if !matches!(self.read(name), Err(RegistryError::Json(_))) {
            return false;
        }
        let bak = rotate_bak_path(path);
        match fs::rename(path, &bak) {
            Ok(()) => {
                tracing::warn!(path = %path.display(), backup = %bak.display(), "corrupt app record moved aside");
                true
            }
            Err(e) => {
                tracing::error!(path = %path.display(), backup = %bak.display(), error = %e, "failed to move corrupt app record aside");
                false
            }
        }
    }

    fn write(&self, app: &App) -> Result<(), RegistryError> {
        let path = self.path_for(&app.name);
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(app)?;
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

impl AppRegistry for FileRegistry {
    fn create(&self, app: &App) -> Result<(), RegistryError> {
        validate_app(app)?;
        let _guard = self.write_lock.lock();
        if self.path_for(&app.name).exists() {
            return Err(RegistryError::AlreadyExists(app.name.clone()));
        }
        self.write(app)?;
        tracing::debug!(app = %app.name, "app created");
        Ok(())
    }

    fn get(&self, name: &str) -> Result<App, RegistryError> {
        self.read(name)
    }

    fn update(&self, app: &App) -> Result<(), RegistryError> {
        validate_app(app)?;
        let _guard = self.write_lock.lock();
        if !self.path_for(&app.name).exists() {
            return Err(RegistryError::NotFound(app.name.clone()));
        }
        self.write(app)
    }

    fn delete(&self, name: &str) -> Result<App, RegistryError> {
        let _guard = self.write_lock.lock();
        let app = self.read(name)?;
        match fs::remove_file(self.path_for(name)) {
            Ok(()) => {
                tracing::debug!(app = %name, "app deleted");
                Ok(app)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(RegistryError::NotFound(name.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> Result<Vec<App>, RegistryError> {
        let mut apps = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match self.read(name) {
                Ok(app) => apps.push(app),
                Err(RegistryError::Json(e)) => {
                    tracing::warn!(path = %path.display(), error = %e, "corrupt app record");
                    self.quarantine(name, &path);
                }
                Err(RegistryError::NotFound(_)) | Err(RegistryError::Invalid(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        apps.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(apps)
    }
}

/// Pick the next `.bak` / `.bak.N` path, rotating older backups out.
///
/// Keeps up to [`MAX_BAK_FILES`] backups: `.bak`, `.bak.2`, `.bak.3`.
fn rotate_bak_path(path: &Path) -> PathBuf {
    let bak = |n: u32| {
        if n == 1 {
            path.with_extension("bak")
        } else {
            path.with_extension(format!("bak.{n}"))
        }
    };

    let oldest = bak(MAX_BAK_FILES);
    if oldest.exists() {
        let _ = fs::remove_file(&oldest);
    }
    for n in (1..MAX_BAK_FILES).rev() {
        let src = bak(n);
        if src.exists() {
            let _ = fs::rename(&src, bak(n + 1));
        }
    }
    bak(1)
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
