use std::collections::{HashMap, HashSet};

use crate::error::{PruneError, Result};
use crate::index::RegistryIndex;
use crate::model::Registry;

/// One record scheduled for removal, with a label for previews.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRemoval {
    pub id: String,
    pub label: String,
}

/// Everything removed together with a target device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalPlan {
    pub target: String,
    /// Target first, then its descendants depth-first.
    pub devices: Vec<PlannedRemoval>,
    /// Config entries no surviving device references, in registry order.
    pub config_entries: Vec<PlannedRemoval>,
    /// Entities owned by removed devices, in registry order.
    pub entities: Vec<PlannedRemoval>,
}

impl RemovalPlan {
    pub fn device_ids(&self) -> HashSet<&str> {
        ids(&self.devices)
    }

    pub fn config_entry_ids(&self) -> HashSet<&str> {
        ids(&self.config_entries)
    }

    pub fn entity_ids(&self) -> HashSet<&str> {
        ids(&self.entities)
    }
}

fn ids(removals: &[PlannedRemoval]) -> HashSet<&str> {
    removals.iter().map(|r| r.id.as_str()).collect()
}

/// The target plus every device reachable through `via_device_id` children.
///
/// Children are visited in registry order. Reaching a device a second time
/// means a cycle or two records sharing an id; either is reported instead of
/// looping.
pub fn device_closure(index: &RegistryIndex, target: &str) -> Result<Vec<String>> {
    fn descend(
        index: &RegistryIndex,
        device_id: &str,
        visited: &mut HashSet<String>,
        out: &mut Vec<String>,
    ) -> Result<()> {
        if !visited.insert(device_id.to_string()) {
            return Err(PruneError::CyclicHierarchy(device_id.to_string()));
        }
        out.push(device_id.to_string());
        if let Some(children) = index.children_by_parent.get(device_id) {
            for child in children {
                descend(index, child, visited, out)?;
            }
        }
        Ok(())
    }

    let mut visited = HashSet::new();
    let mut out = Vec::new();
    descend(index, target, &mut visited, &mut out)?;
    log::debug!("device closure of {}: {:?}", target, out);
    Ok(out)
}

/// Config entries left without any referencing device once `closure` is gone.
///
/// Entries referenced by devices outside the closure survive. Ids missing
/// from the config-entry document still count and sort last.
pub fn orphaned_config_entries(
    registry: &Registry,
    index: &RegistryIndex,
    closure: &[String],
) -> Vec<String> {
    let mut remaining: HashMap<&str, HashSet<&str>> = index
        .devices_by_config_entry
        .iter()
        .map(|(entry_id, devices)| {
            (
                entry_id.as_str(),
                devices.iter().map(String::as_str).collect(),
            )
        })
        .collect();

    let mut touched: Vec<&str> = Vec::new();
    for device_id in closure {
        let Some(&pos) = index.device_pos.get(device_id) else {
            continue;
        };
        for entry_id in &registry.devices[pos].config_entries {
            if let Some(devices) = remaining.get_mut(entry_id.as_str()) {
                devices.remove(device_id.as_str());
                if !touched.contains(&entry_id.as_str()) {
                    touched.push(entry_id);
                }
            }
        }
    }

    let mut orphaned: Vec<String> = touched
        .into_iter()
        .filter(|entry_id| remaining.get(entry_id).is_some_and(HashSet::is_empty))
        .map(str::to_string)
        .collect();
    orphaned.sort_by_key(|entry_id| {
        index
            .config_entry_pos
            .get(entry_id)
            .copied()
            .unwrap_or(usize::MAX)
    });
    orphaned
}

/// Entities whose owning device is in `closure`, in registry order.
pub fn owned_entities(index: &RegistryIndex, closure: &[String]) -> Vec<String> {
    let mut entities: Vec<String> = closure
        .iter()
        .filter_map(|device_id| index.entities_by_device.get(device_id))
        .flatten()
        .cloned()
        .collect();
    entities.sort_by_key(|entity_id| index.entity_pos.get(entity_id).copied());
    entities.dedup();
    entities
}

/// Compute the full removal set for `target`.
pub fn plan_removal(registry: &Registry, index: &RegistryIndex, target: &str) -> Result<RemovalPlan> {
    let closure = device_closure(index, target)?;
    let config_entries = orphaned_config_entries(registry, index, &closure);
    let entities = owned_entities(index, &closure);

    let devices = closure
        .into_iter()
        .map(|id| {
            let label = match index.device_pos.get(&id) {
                Some(&pos) => {
                    let device = &registry.devices[pos];
                    if device.is_disabled() {
                        format!("{} (disabled)", device.display_name())
                    } else {
                        device.display_name().to_string()
                    }
                }
                None => "<missing>".to_string(),
            };
            PlannedRemoval { id, label }
        })
        .collect();

    let config_entries = config_entries
        .into_iter()
        .map(|id| {
            let label = index
                .config_entry_pos
                .get(&id)
                .and_then(|&pos| registry.config_entries[pos].title.clone())
                .unwrap_or_else(|| "<missing>".to_string());
            PlannedRemoval { id, label }
        })
        .collect();

    let entities = entities
        .into_iter()
        .map(|id| {
            let label = index
                .entity_pos
                .get(&id)
                .map(|&pos| registry.entities[pos].display_name().to_string())
                .unwrap_or_else(|| "<missing>".to_string());
            PlannedRemoval { id, label }
        })
        .collect();

    let plan = RemovalPlan {
        target: target.to_string(),
        devices,
        config_entries,
        entities,
    };
    log::info!(
        "plan for {}: {} devices, {} config entries, {} entities",
        target,
        plan.devices.len(),
        plan.config_entries.len(),
        plan.entities.len()
    );
    Ok(plan)
}
