//! Sequential migration runner.
//!
//! Migrations are files in one directory, ordered by name. The ledger records
//! which of them ran, in order, and must always be a prefix of that ordering.
//! A [`Migrator`] checks this, plans the steps for an `up` or `down` request,
//! runs them one at a time through a [`LoaderTrait`] and persists the new
//! ledger once every step succeeded.
//!
//! Nothing here locks the ledger. Callers running several migrators against
//! the same state must serialize them.

pub mod config;
pub mod discovery;
pub mod error;
pub mod loader;
pub mod migrator;
pub mod plan;
pub mod script;
pub mod target;

pub use config::Config;
pub use discovery::discover;
pub use error::{IntegrityError, MigrationError};
pub use loader::{ActionError, FnMigration, LoaderTrait, MigrationTrait, Registry};
pub use migrator::{Migrator, Report, Status, StepEvent};
pub use plan::{Plan, check_integrity};
pub use script::ScriptLoader;
pub use target::{Direction, Target};

pub use migratectl_backend::{AppliedLog, LedgerError, LedgerTrait, MemoryLedger, MigrationId};
#[cfg(feature = "json-backend")]
pub use migratectl_backend::JsonLedger;

#[cfg(feature = "json-backend")]
impl Migrator<JsonLedger, ScriptLoader> {
    /// Migrator over the configured state file, running migrations with `interpreter`.
    pub fn from_config(config: Config, interpreter: impl Into<std::ffi::OsString>) -> Self {
        let ledger = JsonLedger::new(config.state_file());
        Migrator::new(config, ledger, ScriptLoader::new(interpreter))
    }
}
