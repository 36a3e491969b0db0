pub mod closure;
pub mod error;
pub mod filter;
pub mod index;
pub mod model;
pub mod registry;
pub mod resolve;
pub mod snapshot;

pub use closure::{plan_removal, PlannedRemoval, RemovalPlan};
pub use error::{PruneError, Result};
pub use index::RegistryIndex;
pub use model::{ConfigEntry, Device, Entity, Registry};
pub use registry::{RegistryFile, RegistryKind};
pub use resolve::{resolve_target, Selector};
pub use snapshot::Snapshot;
