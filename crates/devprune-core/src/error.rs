use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PruneError {
    #[error("the name '{name}' is shared by {} devices ({}); select one by id instead", .ids.len(), .ids.join(", "))]
    AmbiguousName { name: String, ids: Vec<String> },

    #[error("no such device: {0}")]
    DeviceNotFound(String),

    #[error("device hierarchy is not a forest: device '{0}' is reachable twice (cycle or duplicate id)")]
    CyclicHierarchy(String),

    #[error("{} has no '{key}' array under 'data'", .path.display())]
    MissingCollection { path: PathBuf, key: &'static str },

    #[error("malformed record in {}: {source}", .path.display())]
    Record {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid json in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, PruneError>;
