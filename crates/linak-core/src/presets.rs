//! Named height presets.

use tracing::info;

use linak_types::{Millimeters, Preset};

use crate::error::{Error, Result};
use crate::store::{ConfigStore, DeskSettings};

/// Check that `name` can be used as a preset name.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::EmptyPresetName);
    }
    Ok(())
}

/// Outcome of a preset mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresetChange {
    /// The preset was stored.
    Saved {
        /// The stored preset.
        preset: Preset,
        /// The height it replaced, if the name already existed.
        replaced: Option<Millimeters>,
    },
    /// The preset was removed, or was already absent.
    Deleted {
        /// Preset name.
        name: String,
        /// Whether an entry was actually removed.
        existed: bool,
    },
}

/// Presets stored under the `positions` settings key.
///
/// Every mutation rewrites the whole mapping.
#[derive(Debug)]
pub struct PresetRegistry<'a, S: ?Sized> {
    settings: DeskSettings<'a, S>,
}

impl<'a, S: ConfigStore + ?Sized> PresetRegistry<'a, S> {
    /// Open the registry held by `store`.
    pub fn new(store: &'a S) -> Self {
        Self {
            settings: DeskSettings::new(store),
        }
    }

    /// All presets, sorted by name.
    pub fn list(&self) -> Result<Vec<Preset>> {
        Ok(self
            .settings
            .positions()?
            .into_iter()
            .map(|(name, height)| Preset::new(name, height))
            .collect())
    }

    /// Look up one preset.
    pub fn get(&self, name: &str) -> Result<Option<Preset>> {
        Ok(self
            .settings
            .positions()?
            .remove(name)
            .map(|height| Preset::new(name, height)))
    }

    /// Save a preset. A height of zero or less deletes it instead.
    ///
    /// An empty name fails with [`Error::EmptyPresetName`] and nothing is
    /// written.
    pub fn save(&self, name: &str, height_mm: Millimeters) -> Result<PresetChange> {
        validate_name(name)?;

        let mut positions = self.settings.positions()?;

        if height_mm <= 0 {
            let existed = positions.remove(name).is_some();
            if existed {
                self.settings.set_positions(&positions)?;
                info!("Deleted position \"{}\"", name);
            }
            return Ok(PresetChange::Deleted {
                name: name.to_string(),
                existed,
            });
        }

        let replaced = positions.insert(name.to_string(), height_mm);
        self.settings.set_positions(&positions)?;
        info!("Saved position \"{}\" = {} mm", name, height_mm);

        Ok(PresetChange::Saved {
            preset: Preset::new(name, height_mm),
            replaced,
        })
    }

    /// Delete a preset. Deleting an absent name is a no-op.
    pub fn delete(&self, name: &str) -> Result<PresetChange> {
        self.save(name, 0)
    }
}
