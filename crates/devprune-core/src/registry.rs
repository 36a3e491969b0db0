use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

use crate::error::{PruneError, Result};
use crate::model::Record;

const BOM: char = '\u{feff}';

/// The three registry documents a prune touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryKind {
    ConfigEntries,
    Entities,
    Devices,
}

impl RegistryKind {
    /// Load and write order.
    pub const ALL: [RegistryKind; 3] = [
        RegistryKind::ConfigEntries,
        RegistryKind::Entities,
        RegistryKind::Devices,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            RegistryKind::ConfigEntries => "core.config_entries",
            RegistryKind::Entities => "core.entity_registry",
            RegistryKind::Devices => "core.device_registry",
        }
    }

    /// Key of the record array under `data`.
    pub fn collection_key(self) -> &'static str {
        match self {
            RegistryKind::ConfigEntries => "entries",
            RegistryKind::Entities => "entities",
            RegistryKind::Devices => "devices",
        }
    }

    pub fn id_field(self) -> &'static str {
        match self {
            RegistryKind::ConfigEntries => "entry_id",
            RegistryKind::Entities | RegistryKind::Devices => "id",
        }
    }
}

/// One registry document held in memory.
///
/// Document structure:
/// ```text
/// {
///   "version": ..., "minor_version": ..., "key": ...,
///   "data": {
///     <collection_key>: [ { <id_field>: ..., ... }, ... ],
///     ...other collections, e.g. deleted_devices
///   }
/// }
/// ```
///
/// The record array is held apart from the rest of the document so it can only
/// be replaced wholesale; everything else round-trips verbatim.
#[derive(Debug, Clone)]
pub struct RegistryFile {
    kind: RegistryKind,
    path: PathBuf,
    document: Value,
    records: Vec<Value>,
}

impl RegistryFile {
    /// Read `<dir>/<file_name>`, accepting a leading byte-order mark.
    pub fn open(dir: &Path, kind: RegistryKind) -> Result<Self> {
        let path = dir.join(kind.file_name());
        let text = fs::read_to_string(&path).map_err(|source| PruneError::Io {
            path: path.clone(),
            source,
        })?;
        Self::parse(path, kind, &text)
    }

    pub fn parse(path: PathBuf, kind: RegistryKind, text: &str) -> Result<Self> {
        let text = text.strip_prefix(BOM).unwrap_or(text);
        let mut document: Value = serde_json::from_str(text).map_err(|source| PruneError::Json {
            path: path.clone(),
            source,
        })?;

        let key = kind.collection_key();
        let slot = document
            .get_mut("data")
            .and_then(|data| data.get_mut(key))
            .filter(|slot| slot.is_array());
        let records = match slot.map(Value::take) {
            Some(Value::Array(records)) => records,
            _ => return Err(PruneError::MissingCollection { path, key }),
        };

        log::debug!(
            "loaded {} with {} {}",
            path.display(),
            records.len(),
            key
        );
        Ok(Self {
            kind,
            path,
            document,
            records,
        })
    }

    pub fn kind(&self) -> RegistryKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw records, in document order.
    pub fn records(&self) -> &[Value] {
        &self.records
    }

    /// Decode every record into its typed view.
    pub fn typed<T: Record>(&self) -> Result<Vec<T>> {
        debug_assert_eq!(T::KIND, self.kind);
        self.records
            .iter()
            .map(|record| {
                T::deserialize(record).map_err(|source| PruneError::Record {
                    path: self.path.clone(),
                    source,
                })
            })
            .collect()
    }

    pub fn replace_records(&mut self, records: Vec<Value>) {
        self.records = records;
    }

    /// Serialize the whole document with the current records put back in
    /// place: four-space indent, non-ASCII written as-is.
    pub fn render(&self) -> Result<Vec<u8>> {
        let mut document = self.document.clone();
        if let Some(data) = document.get_mut("data") {
            data[self.kind.collection_key()] = Value::Array(self.records.clone());
        }

        let mut out = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
        document
            .serialize(&mut serializer)
            .map_err(|source| PruneError::Json {
                path: self.path.clone(),
                source,
            })?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Device;

    fn parse(kind: RegistryKind, text: &str) -> Result<RegistryFile> {
        RegistryFile::parse(PathBuf::from(kind.file_name()), kind, text)
    }

    #[test]
    fn test_parse_strips_bom() {
        let text = "\u{feff}{\"data\": {\"devices\": [{\"id\": \"d1\"}]}}";
        let file = parse(RegistryKind::Devices, text).unwrap();
        assert_eq!(file.records().len(), 1);
        let devices: Vec<Device> = file.typed().unwrap();
        assert_eq!(devices[0].id, "d1");
    }

    #[test]
    fn test_parse_missing_collection() {
        let err = parse(RegistryKind::Entities, r#"{"data": {"devices": []}}"#).unwrap_err();
        assert!(matches!(err, PruneError::MissingCollection { key: "entities", .. }));
    }

    #[test]
    fn test_parse_collection_not_array() {
        let err = parse(RegistryKind::Devices, r#"{"data": {"devices": {}}}"#).unwrap_err();
        assert!(matches!(err, PruneError::MissingCollection { .. }));
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = parse(RegistryKind::Devices, "{not json").unwrap_err();
        assert!(matches!(err, PruneError::Json { .. }));
    }

    #[test]
    fn test_render_keeps_layout_and_unicode() {
        let text = r#"{"version": 1, "data": {"entries": [{"entry_id": "c1", "title": "Küche"}], "extra": true}, "key": "core.config_entries"}"#;
        let file = parse(RegistryKind::ConfigEntries, text).unwrap();
        let rendered = String::from_utf8(file.render().unwrap()).unwrap();
        let expected = r#"{
    "version": 1,
    "data": {
        "entries": [
            {
                "entry_id": "c1",
                "title": "Küche"
            }
        ],
        "extra": true
    },
    "key": "core.config_entries"
}"#;
        pretty_assertions::assert_eq!(rendered, expected);
    }

    #[test]
    fn test_render_keeps_float_digits() {
        let values = [
            "231.78736208625878",
            "370.63891675025076",
            "470.70310932798395",
            "1700000000.123456",
            "0.1",
        ];
        for value in values {
            let text = format!(r#"{{"data": {{"entities": [{{"id": "e", "v": {}}}]}}}}"#, value);
            let file = parse(RegistryKind::Entities, &text).unwrap();
            let rendered = String::from_utf8(file.render().unwrap()).unwrap();
            assert!(
                rendered.contains(&format!("\"v\": {}", value)),
                "float {} changed on rewrite:\n{}",
                value,
                rendered
            );
        }
    }

    #[test]
    fn test_replace_records() {
        let text = r#"{"data": {"entities": [{"id": "e1"}, {"id": "e2"}]}}"#;
        let mut file = parse(RegistryKind::Entities, text).unwrap();
        file.replace_records(vec![file.records()[1].clone()]);
        let rendered: Value = serde_json::from_slice(&file.render().unwrap()).unwrap();
        assert_eq!(rendered, serde_json::json!({"data": {"entities": [{"id": "e2"}]}}));
    }
}
