//! The two persisted preferences: current grid item size and zoom stage.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Error;
use crate::zoom::{DEFAULT_ITEM_SIZE, DEFAULT_STAGE_INDEX};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Preferences {
    pub grid_item_size: f32,
    pub zoom_stage_index: usize,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            grid_item_size: DEFAULT_ITEM_SIZE,
            zoom_stage_index: DEFAULT_STAGE_INDEX,
        }
    }
}

impl Preferences {
    /// Load preferences from a YAML file. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, Error> {
        match fs::read_to_string(path) {
            Ok(raw) => Ok(serde_yaml::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no preferences file; using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let raw = serde_yaml::to_string(self)?;
        fs::write(path, raw)?;
        Ok(())
    }
}
