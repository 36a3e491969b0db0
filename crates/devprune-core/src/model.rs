use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::registry::RegistryKind;

/// A record type stored in one of the three registry documents.
///
/// Only the fields the pruner reads are modelled here; the raw JSON object
/// stays in the [`RegistryFile`](crate::registry::RegistryFile) and is written
/// back untouched.
pub trait Record: DeserializeOwned {
    const KIND: RegistryKind;

    fn id(&self) -> &str;
}

/// A device from `core.device_registry`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Device {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub name_by_user: Option<String>,
    /// Parent device, if this one is reached through a hub or bridge.
    #[serde(default)]
    pub via_device_id: Option<String>,
    #[serde(default)]
    pub config_entries: Vec<String>,
    #[serde(default)]
    pub disabled_by: Option<String>,
    #[serde(default)]
    pub connections: Vec<Value>,
}

impl Device {
    pub fn is_disabled(&self) -> bool {
        self.disabled_by.is_some()
    }

    /// Label shown in previews: the integration-assigned name first, then the
    /// user's name.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.name_by_user.as_deref())
            .unwrap_or("<unnamed>")
    }
}

impl Record for Device {
    const KIND: RegistryKind = RegistryKind::Devices;

    fn id(&self) -> &str {
        &self.id
    }
}

/// A config entry from `core.config_entries`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConfigEntry {
    pub entry_id: String,
    #[serde(default)]
    pub title: Option<String>,
}

impl Record for ConfigEntry {
    const KIND: RegistryKind = RegistryKind::ConfigEntries;

    fn id(&self) -> &str {
        &self.entry_id
    }
}

/// An entity from `core.entity_registry`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Entity {
    pub id: String,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub original_name: Option<String>,
}

impl Entity {
    /// Many entities carry no `name` but nearly all have `original_name`.
    pub fn display_name(&self) -> &str {
        self.original_name
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("None")
    }
}

impl Record for Entity {
    const KIND: RegistryKind = RegistryKind::Entities;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Typed views over the three collections, in registry order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    pub devices: Vec<Device>,
    pub config_entries: Vec<ConfigEntry>,
    pub entities: Vec<Entity>,
}
