// SPDX-License-Identifier: AGPL-3.0
// Haul Wizard Core - Settings persistence
//
// Page layouts and navigation policies are stored in a local JSON file.
// Answers are never persisted here.

use crate::types::{BackwardNavigation, PageLayout, WizardError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// Engine settings shared by every wizard screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardSettings {
    /// Page layout per catalog id
    #[serde(default = "default_layouts")]
    pub layouts: BTreeMap<String, PageLayout>,
    /// Layout for catalogs without an entry in `layouts`
    #[serde(default)]
    pub default_layout: PageLayout,
    #[serde(default)]
    pub backward_navigation: BackwardNavigation,
    /// Check select options, numbers and dates on input
    #[serde(default = "default_strict_values")]
    pub strict_values: bool,
}

fn default_layouts() -> BTreeMap<String, PageLayout> {
    BTreeMap::from([
        ("cmr".to_string(), PageLayout::uniform(2)),
        ("status".to_string(), PageLayout::new(2, 4)),
        ("modify-transport".to_string(), PageLayout::uniform(2)),
    ])
}

fn default_strict_values() -> bool {
    true
}

impl Default for WizardSettings {
    fn default() -> Self {
        Self {
            layouts: default_layouts(),
            default_layout: PageLayout::default(),
            backward_navigation: BackwardNavigation::default(),
            strict_values: default_strict_values(),
        }
    }
}

impl WizardSettings {
    pub fn layout_for(&self, catalog_id: &str) -> PageLayout {
        self.layouts
            .get(catalog_id)
            .copied()
            .unwrap_or(self.default_layout)
    }
}

const SETTINGS_FILE: &str = "settings.json";

/// Wizard settings kept in memory and written back on every change
pub struct SettingsStore {
    settings: RwLock<WizardSettings>,
    file_path: PathBuf,
}

impl SettingsStore {
    /// Open the store at the platform config location
    pub fn new() -> Result<Self, WizardError> {
        Self::open(Self::default_path()?)
    }

    /// Open the store backed by `file_path`, writing defaults if it is missing
    pub fn open(file_path: impl Into<PathBuf>) -> Result<Self, WizardError> {
        let file_path = file_path.into();
        let existing = file_path.exists();
        let settings = if existing {
            Self::load(&file_path)?
        } else {
            WizardSettings::default()
        };
        tracing::info!(
            path = %file_path.display(),
            existing,
            layouts = settings.layouts.len(),
            backward = ?settings.backward_navigation,
            strict_values = settings.strict_values,
            "Wizard settings opened"
        );

        let store = Self {
            settings: RwLock::new(settings),
            file_path,
        };
        if !existing {
            store.persist()?;
        }
        Ok(store)
    }

    /// `settings.json` in the platform config directory, which is created
    pub fn default_path() -> Result<PathBuf, WizardError> {
        let dirs = directories::ProjectDirs::from("com", "haulwizard", "wizard").ok_or_else(|| {
            WizardError::FileIo("No config directory on this platform".to_string())
        })?;
        let dir = dirs.config_dir();
        fs::create_dir_all(dir)
            .map_err(|e| WizardError::FileIo(format!("Cannot create {}: {}", dir.display(), e)))?;
        Ok(dir.join(SETTINGS_FILE))
    }

    fn load(path: &Path) -> Result<WizardSettings, WizardError> {
        let content = fs::read_to_string(path)
            .map_err(|e| WizardError::FileIo(format!("Cannot read {}: {}", path.display(), e)))?;
        Ok(serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), "Unreadable wizard settings, using defaults: {}", e);
            WizardSettings::default()
        }))
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn persist(&self) -> Result<(), WizardError> {
        let content = {
            let settings = self.settings.read().unwrap_or_else(PoisonError::into_inner);
            serde_json::to_string_pretty(&*settings)
                .map_err(|e| WizardError::Serialization(e.to_string()))?
        };
        fs::write(&self.file_path, content).map_err(|e| {
            WizardError::FileIo(format!("Cannot write {}: {}", self.file_path.display(), e))
        })
    }

    pub fn get(&self) -> WizardSettings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the settings and persist them.
    ///
    /// Layouts are validated first; an invalid layout leaves the store unchanged.
    pub fn update(&self, new_settings: WizardSettings) -> Result<(), WizardError> {
        new_settings.default_layout.validate()?;
        for (catalog_id, layout) in &new_settings.layouts {
            if let Err(e) = layout.validate() {
                tracing::warn!(catalog = %catalog_id, "Layout rejected: {}", e);
                return Err(e);
            }
        }

        let changed = {
            let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
            let changed = changed_layouts(&settings, &new_settings);
            *settings = new_settings;
            changed
        };

        match self.persist() {
            Ok(()) => {
                tracing::info!(?changed, "Page layouts saved");
                Ok(())
            }
            Err(e) => {
                tracing::error!(?changed, "Page layouts changed in memory only: {}", e);
                Err(e)
            }
        }
    }

    /// Set the layout for one catalog
    pub fn set_layout(&self, catalog_id: &str, layout: PageLayout) -> Result<(), WizardError> {
        let mut settings = self.get();
        settings.layouts.insert(catalog_id.to_string(), layout);
        self.update(settings)
    }
}

/// Catalog ids whose layout was added, changed or removed
fn changed_layouts(old: &WizardSettings, new: &WizardSettings) -> Vec<String> {
    let touched = new
        .layouts
        .iter()
        .filter(|(id, layout)| old.layouts.get(*id) != Some(*layout))
        .map(|(id, _)| id.clone());
    let removed = old
        .layouts
        .keys()
        .filter(|id| !new.layouts.contains_key(*id))
        .cloned();
    touched.chain(removed).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_settings_path(name: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("haul_wizard_settings_{name}_{nanos}.json"))
    }

    #[test]
    fn test_default_settings() {
        let settings = WizardSettings::default();
        assert_eq!(settings.layout_for("cmr"), PageLayout::uniform(2));
        assert_eq!(settings.layout_for("status"), PageLayout::new(2, 4));
        assert_eq!(settings.layout_for("unknown"), PageLayout::default());
        assert_eq!(settings.backward_navigation, BackwardNavigation::Symmetric);
        assert!(settings.strict_values);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings: WizardSettings =
            serde_json::from_str(r#"{ "backwardNavigation": "fixed-step" }"#).unwrap();
        assert_eq!(settings.backward_navigation, BackwardNavigation::FixedStep);
        assert_eq!(settings.layout_for("status"), PageLayout::new(2, 4));
        assert!(settings.strict_values);
    }

    #[test]
    fn test_store_persists_updates() {
        let path = temp_settings_path("persist");
        let store = SettingsStore::open(&path).unwrap();
        assert!(path.exists());

        store.set_layout("cmr", PageLayout::new(3, 6)).unwrap();
        assert!(matches!(
            store.set_layout("cmr", PageLayout::new(3, 1)),
            Err(WizardError::InvalidLayout(_))
        ));

        let reopened = SettingsStore::open(&path).unwrap();
        assert_eq!(reopened.get().layout_for("cmr"), PageLayout::new(3, 6));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_changed_layouts() {
        let old = WizardSettings::default();
        let mut new = old.clone();
        new.layouts.insert("status".to_string(), PageLayout::new(3, 3));
        new.layouts.insert("inspection".to_string(), PageLayout::uniform(4));
        new.layouts.remove("cmr");
        assert_eq!(changed_layouts(&old, &new), vec!["inspection", "status", "cmr"]);
        assert!(changed_layouts(&old, &old).is_empty());
    }

    #[test]
    fn test_invalid_update_leaves_store_unchanged() {
        let path = temp_settings_path("invalid");
        let store = SettingsStore::open(&path).unwrap();
        let mut settings = store.get();
        settings.strict_values = false;
        settings.layouts.insert("status".to_string(), PageLayout::new(0, 4));

        assert!(matches!(
            store.update(settings),
            Err(WizardError::InvalidLayout(_))
        ));
        assert_eq!(store.get(), WizardSettings::default());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_unreadable_file_falls_back_to_defaults() {
        let path = temp_settings_path("garbage");
        fs::write(&path, "not json").unwrap();
        let store = SettingsStore::open(&path).unwrap();
        assert_eq!(store.get(), WizardSettings::default());
        let _ = fs::remove_file(&path);
    }
}
