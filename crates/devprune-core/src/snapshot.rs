use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::closure::{plan_removal, RemovalPlan};
use crate::error::{PruneError, Result};
use crate::filter::without_ids;
use crate::index::RegistryIndex;
use crate::model::Registry;
use crate::registry::{RegistryFile, RegistryKind};
use crate::resolve::{resolve_target, Selector};

/// The three registry documents of one directory, loaded together, plus the
/// typed views and index derived from them.
#[derive(Debug, Clone)]
pub struct Snapshot {
    dir: PathBuf,
    config_entries: RegistryFile,
    entities: RegistryFile,
    devices: RegistryFile,
    registry: Registry,
    index: RegistryIndex,
}

impl Snapshot {
    /// Load `core.config_entries`, `core.entity_registry` and
    /// `core.device_registry` from `dir`.
    pub fn load(dir: &Path) -> Result<Self> {
        let config_entries = RegistryFile::open(dir, RegistryKind::ConfigEntries)?;
        let entities = RegistryFile::open(dir, RegistryKind::Entities)?;
        let devices = RegistryFile::open(dir, RegistryKind::Devices)?;
        Self::from_files(dir, config_entries, entities, devices)
    }

    pub fn from_files(
        dir: &Path,
        config_entries: RegistryFile,
        entities: RegistryFile,
        devices: RegistryFile,
    ) -> Result<Self> {
        let registry = Registry {
            devices: devices.typed()?,
            config_entries: config_entries.typed()?,
            entities: entities.typed()?,
        };
        let index = RegistryIndex::build(&registry);
        Ok(Self {
            dir: dir.to_path_buf(),
            config_entries,
            entities,
            devices,
            registry,
            index,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn index(&self) -> &RegistryIndex {
        &self.index
    }

    pub fn file(&self, kind: RegistryKind) -> &RegistryFile {
        match kind {
            RegistryKind::ConfigEntries => &self.config_entries,
            RegistryKind::Entities => &self.entities,
            RegistryKind::Devices => &self.devices,
        }
    }

    /// Resolve `selector` and compute what goes with it. Nothing is modified.
    pub fn plan(&self, selector: &Selector) -> Result<RemovalPlan> {
        let target = resolve_target(&self.index, selector)?;
        plan_removal(&self.registry, &self.index, &target)
    }

    /// Filter every collection by `plan` and refresh the typed views.
    pub fn apply(&mut self, plan: &RemovalPlan) -> Result<()> {
        let removals = [
            (&mut self.config_entries, plan.config_entry_ids()),
            (&mut self.entities, plan.entity_ids()),
            (&mut self.devices, plan.device_ids()),
        ];
        for (file, ids) in removals {
            let before = file.records().len();
            let kept = without_ids(file.records(), file.kind().id_field(), &ids);
            log::debug!(
                "{}: {} -> {} records",
                file.kind().file_name(),
                before,
                kept.len()
            );
            file.replace_records(kept);
        }

        self.registry = Registry {
            devices: self.devices.typed()?,
            config_entries: self.config_entries.typed()?,
            entities: self.entities.typed()?,
        };
        self.index = RegistryIndex::build(&self.registry);
        Ok(())
    }

    /// Write all three documents back.
    ///
    /// Every document is first written to a temporary file next to its
    /// target; the originals are replaced only after all three were staged.
    pub fn commit(&self) -> Result<()> {
        let mut staged = Vec::with_capacity(RegistryKind::ALL.len());
        for kind in RegistryKind::ALL {
            let file = self.file(kind);
            staged.push((stage(&self.dir, file)?, file.path()));
        }

        for (tmp, path) in staged {
            tmp.persist(path).map_err(|err| PruneError::Io {
                path: path.to_path_buf(),
                source: err.error,
            })?;
            log::info!("wrote {}", path.display());
        }
        Ok(())
    }
}

fn stage(dir: &Path, file: &RegistryFile) -> Result<NamedTempFile> {
    let bytes = file.render()?;
    let io_err = |source: std::io::Error| PruneError::Io {
        path: file.path().to_path_buf(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(&bytes).map_err(io_err)?;
    if let Ok(metadata) = fs::metadata(file.path()) {
        tmp.as_file()
            .set_permissions(metadata.permissions())
            .map_err(io_err)?;
    }
    tmp.as_file().sync_all().map_err(io_err)?;
    log::debug!(
        "staged {} ({} bytes) at {}",
        file.path().display(),
        bytes.len(),
        tmp.path().display()
    );
    Ok(tmp)
}
