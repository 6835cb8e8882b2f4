//! Standalone display flags.
//!
//! Theme, animation and sound toggles live under their own keys.  They are
//! read once at startup and again after every settings change; nothing in
//! the access layer interprets them.

use serde::{Deserialize, Serialize};

use coursegate_contracts::{config::DisplayConfig, error::CoursegateResult};

use crate::{
    store::{read_json, write_json},
    traits::KeyValueStore,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayPreferences {
    pub theme: String,
    pub animations_enabled: bool,
    pub sound_enabled: bool,
}

impl Default for DisplayPreferences {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            animations_enabled: true,
            sound_enabled: false,
        }
    }
}

impl DisplayPreferences {
    /// Read every flag, falling back to the default for missing keys.
    pub fn load(store: &dyn KeyValueStore, keys: &DisplayConfig) -> CoursegateResult<Self> {
        let defaults = Self::default();
        Ok(Self {
            theme: read_json(store, &keys.theme_key)?.unwrap_or(defaults.theme),
            animations_enabled: read_json(store, &keys.animations_key)?
                .unwrap_or(defaults.animations_enabled),
            sound_enabled: read_json(store, &keys.sound_key)?.unwrap_or(defaults.sound_enabled),
        })
    }

    pub fn save(&self, store: &dyn KeyValueStore, keys: &DisplayConfig) -> CoursegateResult<()> {
        write_json(store, &keys.theme_key, &self.theme)?;
        write_json(store, &keys.animations_key, &self.animations_enabled)?;
        write_json(store, &keys.sound_key, &self.sound_enabled)
    }
}
