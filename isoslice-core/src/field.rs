//! Field selection

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the values of a scalar field are attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldLocation {
    /// One value per node
    Node,
    /// One value per element
    Element,
}

impl fmt::Display for FieldLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldLocation::Node => write!(f, "node"),
            FieldLocation::Element => write!(f, "element"),
        }
    }
}

/// Identifies a named scalar field and its attachment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldSelector {
    pub name: String,
    pub location: FieldLocation,
}

impl FieldSelector {
    /// Select a node-attached field
    pub fn node(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: FieldLocation::Node,
        }
    }

    /// Select an element-attached field
    pub fn element(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: FieldLocation::Element,
        }
    }

    pub fn is_nodal(&self) -> bool {
        self.location == FieldLocation::Node
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.location)
    }
}
