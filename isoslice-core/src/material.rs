//! Material display flags

use serde::{Deserialize, Serialize};

/// Per-material flags consulted when deciding which cells take part in a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialFlags {
    /// Material takes part in iso-surfaces and is colored by the field
    pub enabled: bool,
    /// Material is drawn
    pub visible: bool,
    /// Material may be cut by section planes
    pub clip: bool,
}

impl Default for MaterialFlags {
    fn default() -> Self {
        Self {
            enabled: true,
            visible: true,
            clip: true,
        }
    }
}

/// A named material entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub flags: MaterialFlags,
}

impl Material {
    /// Enabled, visible and clippable material
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: MaterialFlags::default(),
        }
    }

    /// Set whether the material takes part in iso-surfaces
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.flags.enabled = enabled;
        self
    }

    /// Set material visibility
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.flags.visible = visible;
        self
    }

    /// Set whether plane sections may cut the material
    pub fn with_clip(mut self, clip: bool) -> Self {
        self.flags.clip = clip;
        self
    }
}
