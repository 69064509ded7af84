use serde::{Deserialize, Serialize};
#[cfg(feature = "json-backend")]
use std::path::PathBuf;
use std::{
    borrow::Borrow,
    fmt::{self, Display, Formatter},
    ops::Deref,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[cfg(feature = "json-backend")]
    #[error("state file `{}` is malformed: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[cfg(feature = "json-backend")]
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error("Other {0}")]
    Other(String),
}

/// Identifier of a single migration, usually `<unix-seconds>_<slug>.<ext>`.
///
/// Ordering is plain string ordering. Identifiers produced from timestamps
/// with a different number of digits will not sort chronologically.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MigrationId(String);

impl MigrationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for MigrationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MigrationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for MigrationId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MigrationId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for MigrationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl PartialEq<str> for MigrationId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for MigrationId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Migrations applied so far, in the order they were applied.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppliedLog(Vec<MigrationId>);

impl AppliedLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `ids` after the current tail.
    pub fn extend<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = MigrationId>,
    {
        self.0.extend(ids)
    }

    /// Drops the `count` most recently applied entries.
    pub fn truncate_tail(&mut self, count: usize) {
        let keep = self.0.len().saturating_sub(count);
        self.0.truncate(keep)
    }

    pub fn into_inner(self) -> Vec<MigrationId> {
        self.0
    }
}

impl Deref for AppliedLog {
    type Target = [MigrationId];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: Into<MigrationId>> FromIterator<T> for AppliedLog {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<MigrationId>> for AppliedLog {
    fn from(value: Vec<MigrationId>) -> Self {
        Self(value)
    }
}

impl<'a> IntoIterator for &'a AppliedLog {
    type Item = &'a MigrationId;
    type IntoIter = std::slice::Iter<'a, MigrationId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Durable record of applied migrations.
///
/// Implementations assume a single writer. Running two migrators against the
/// same ledger at once needs a lock held by the caller.
pub trait LedgerTrait {
    /// Human readable location of the ledger, used in logs and errors.
    fn location(&self) -> String;

    /// Loads the applied log, returning an empty log when nothing was persisted yet.
    fn retrieve(&self) -> Result<AppliedLog, LedgerError>;

    /// Replaces the persisted log with `log` as a whole.
    fn persist(&self, log: &AppliedLog) -> Result<(), LedgerError>;
}

impl<L: LedgerTrait + ?Sized> LedgerTrait for &L {
    fn location(&self) -> String {
        (**self).location()
    }

    fn retrieve(&self) -> Result<AppliedLog, LedgerError> {
        (**self).retrieve()
    }

    fn persist(&self, log: &AppliedLog) -> Result<(), LedgerError> {
        (**self).persist(log)
    }
}
