use std::collections::{BTreeMap, HashMap, HashSet};

use crate::model::{Record, Registry};

/// Lookup tables derived from a [`Registry`].
///
/// Positions refer to the typed collections in the registry, which share
/// order with the raw documents. Nothing here reorders records.
#[derive(Debug, Clone, Default)]
pub struct RegistryIndex {
    pub device_pos: HashMap<String, usize>,
    pub config_entry_pos: HashMap<String, usize>,
    pub entity_pos: HashMap<String, usize>,
    pub device_by_name: HashMap<String, String>,
    /// Names used by two or more devices, with every id sharing the name in
    /// registry order.
    pub duplicate_names: BTreeMap<String, Vec<String>>,
    pub device_by_user_name: HashMap<String, String>,
    pub devices_by_config_entry: HashMap<String, HashSet<String>>,
    pub children_by_parent: HashMap<String, Vec<String>>,
    pub entities_by_device: HashMap<String, Vec<String>>,
}

impl RegistryIndex {
    pub fn build(registry: &Registry) -> Self {
        let mut index = RegistryIndex {
            device_pos: positions(&registry.devices),
            config_entry_pos: positions(&registry.config_entries),
            entity_pos: positions(&registry.entities),
            ..Default::default()
        };

        for device in &registry.devices {
            if let Some(name) = &device.name {
                if let Some(existing) = index.device_by_name.insert(name.clone(), device.id.clone()) {
                    index
                        .duplicate_names
                        .entry(name.clone())
                        .or_insert_with(|| vec![existing])
                        .push(device.id.clone());
                }
            }

            if let Some(user_name) = &device.name_by_user {
                index
                    .device_by_user_name
                    .insert(user_name.clone(), device.id.clone());
            }

            for entry_id in &device.config_entries {
                index
                    .devices_by_config_entry
                    .entry(entry_id.clone())
                    .or_default()
                    .insert(device.id.clone());
            }

            if let Some(parent) = &device.via_device_id {
                index
                    .children_by_parent
                    .entry(parent.clone())
                    .or_default()
                    .push(device.id.clone());
            }
        }

        for entity in &registry.entities {
            if let Some(device_id) = &entity.device_id {
                index
                    .entities_by_device
                    .entry(device_id.clone())
                    .or_default()
                    .push(entity.id.clone());
            }
        }

        log::debug!(
            "indexed {} devices ({} by unique name, {} by user name), {} config entries, {} entities",
            index.device_pos.len(),
            index.device_by_name.len(),
            index.device_by_user_name.len(),
            index.config_entry_pos.len(),
            index.entity_pos.len(),
        );
        index
    }

    pub fn has_device(&self, id: &str) -> bool {
        self.device_pos.contains_key(id)
    }

    /// Config entries referenced by more than one device, sorted by id.
    pub fn shared_config_entries(&self) -> Vec<(&str, usize)> {
        let mut shared: Vec<(&str, usize)> = self
            .devices_by_config_entry
            .iter()
            .filter(|(_, devices)| devices.len() > 1)
            .map(|(entry_id, devices)| (entry_id.as_str(), devices.len()))
            .collect();
        shared.sort_unstable();
        shared
    }
}

fn positions<T: Record>(records: &[T]) -> HashMap<String, usize> {
    records
        .iter()
        .enumerate()
        .map(|(i, record)| (record.id().to_string(), i))
        .collect()
}
