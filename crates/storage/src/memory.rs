// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory registry for tests

use std::collections::BTreeMap;
use std::sync::Arc;

use mirage_core::App;
use parking_lot::Mutex;

use crate::registry::{validate_app, AppRegistry, RegistryError};

/// Registry backed by a shared map. Clones see the same apps.
#[derive(Clone, Default)]
pub struct MemoryRegistry {
    apps: Arc<Mutex<BTreeMap<String, App>>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with `apps`.
    pub fn with_apps(apps: impl IntoIterator<Item = App>) -> Self {
        let registry = Self::new();
        {
            let mut map = registry.apps.lock();
            for app in apps {
                map.insert(app.name.clone(), app);
            }
        }
        registry
    }
}

impl AppRegistry for MemoryRegistry {
    fn create(&self, app: &App) -> Result<(), RegistryError> {
        validate_app(app)?;
        let mut apps = self.apps.lock();
        if apps.contains_key(&app.name) {
            return Err(RegistryError::AlreadyExists(app.name.clone()));
        }
        apps.insert(app.name.clone(), app.clone());
        Ok(())
    }

    fn get(&self, name: &str) -> Result<App, RegistryError> {
        self.apps.lock().get(name).cloned().ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    fn update(&self, app: &App) -> Result<(), RegistryError> {
        validate_app(app)?;
        match self.apps.lock().get_mut(&app.name) {
            Some(slot) => {
                *slot = app.clone();
                Ok(())
            }
            None => Err(RegistryError::NotFound(app.name.clone())),
        }
    }

    fn delete(&self, name: &str) -> Result<App, RegistryError> {
        self.apps.lock().remove(name).ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    fn list(&self) -> Result<Vec<App>, RegistryError> {
        Ok(self.apps.lock().values().cloned().collect())
    }
}
