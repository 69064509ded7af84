use std::{
    fmt::{self, Display, Formatter},
    path::PathBuf,
};

use migratectl_backend::{AppliedLog, LedgerError, MigrationId};
use thiserror::Error;

use crate::{loader::ActionError, target::Direction};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("no migrations found: directory `{}` does not exist", .0.display())]
    NotFound(PathBuf),
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
    #[error("{}", diverged(.source, .applied, .available))]
    Diverged {
        #[source]
        source: IntegrityError,
        applied: AppliedLog,
        available: Vec<MigrationId>,
    },
    #[error("migration with provided name `{0}` not found")]
    TargetNotFound(String),
    #[error("direction `{0}` is invalid, expected `up` or `down`")]
    InvalidDirection(String),
    #[error("target `{0}` is invalid, a number of migrations must be positive")]
    InvalidTarget(String),
    #[error("migration `{id}` failed while running {direction}: {source}")]
    Execution {
        id: MigrationId,
        direction: Direction,
        #[source]
        source: ActionError,
    },
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The applied log is not a prefix of the migrations found on disk.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error(
    "migration order is corrupt at position {index}.\n\
     Expected `{applied}` in the directory.\n\
     Got {} instead.\n\
     You must resolve the conflict manually.",
    found(.available)
)]
pub struct IntegrityError {
    pub index: usize,
    /// Entry of the applied log at `index`.
    pub applied: MigrationId,
    /// Entry found in the directory at `index`, if any.
    pub available: Option<MigrationId>,
}

fn found(available: &Option<MigrationId>) -> String {
    match available {
        Some(id) => format!("`{id}`"),
        None => "nothing".to_owned(),
    }
}

fn diverged(source: &IntegrityError, applied: &AppliedLog, available: &[MigrationId]) -> String {
    format!("{source}\n{}", Listing { applied, available })
}

struct Listing<'a> {
    applied: &'a AppliedLog,
    available: &'a [MigrationId],
}

impl Display for Listing<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_section(f, "Applied migrations:", self.applied)?;
        write_section(f, "Available migrations:", self.available)
    }
}

pub(crate) fn write_section(f: &mut Formatter<'_>, header: &str, ids: &[MigrationId]) -> fmt::Result {
    if ids.is_empty() {
        return Ok(());
    }
    let rule = "-".repeat(header.len());
    writeln!(f, "{rule}\n{header}\n{rule}")?;
    ids.iter().try_for_each(|id| writeln!(f, "{id}"))
}
