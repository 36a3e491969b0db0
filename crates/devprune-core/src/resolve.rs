use std::fmt;

use crate::error::{PruneError, Result};
use crate::index::RegistryIndex;

/// How the operator names the device to remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// `name` is the name flag given next to the id. It is never used for
    /// lookup, but a name shared by several devices still aborts.
    Id { id: String, name: Option<String> },
    Name(String),
}

impl Selector {
    pub fn by_id(id: impl Into<String>) -> Self {
        Selector::Id {
            id: id.into(),
            name: None,
        }
    }

    /// Build a selector from the two optional flags. The id wins when both are
    /// given; empty strings count as absent.
    pub fn from_flags(id: Option<String>, name: Option<String>) -> Option<Self> {
        let id = id.filter(|id| !id.is_empty());
        let name = name.filter(|name| !name.is_empty());
        match (id, name) {
            (Some(id), name) => Some(Selector::Id { id, name }),
            (None, Some(name)) => Some(Selector::Name(name)),
            (None, None) => None,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Id { id, .. } => write!(f, "id \"{}\"", id),
            Selector::Name(name) => write!(f, "name \"{}\"", name),
        }
    }
}

/// Map a selector to exactly one device id.
///
/// A name shared by several devices is refused outright, even when a
/// user-assigned name would have matched or an id was given alongside it.
/// The integration name is tried before the user-assigned one.
pub fn resolve_target(index: &RegistryIndex, selector: &Selector) -> Result<String> {
    match selector {
        Selector::Id { id, name } => {
            if let Some(name) = name {
                reject_duplicate(index, name)?;
            }
            if index.has_device(id) {
                Ok(id.clone())
            } else {
                Err(PruneError::DeviceNotFound(selector.to_string()))
            }
        }
        Selector::Name(name) => {
            reject_duplicate(index, name)?;
            index
                .device_by_name
                .get(name)
                .or_else(|| index.device_by_user_name.get(name))
                .cloned()
                .ok_or_else(|| PruneError::DeviceNotFound(selector.to_string()))
        }
    }
}

fn reject_duplicate(index: &RegistryIndex, name: &str) -> Result<()> {
    match index.duplicate_names.get(name) {
        Some(ids) => Err(PruneError::AmbiguousName {
            name: name.to_string(),
            ids: ids.clone(),
        }),
        None => Ok(()),
    }
}
