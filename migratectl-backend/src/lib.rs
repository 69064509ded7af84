pub mod generic;
#[cfg(feature = "json-backend")]
pub mod json;
pub mod memory;

pub use generic::{AppliedLog, LedgerError, LedgerTrait, MigrationId};
#[cfg(feature = "json-backend")]
pub use json::JsonLedger;
pub use memory::MemoryLedger;
