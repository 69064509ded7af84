use std::{
    fmt::{self, Display, Formatter},
    num::NonZeroUsize,
    str::FromStr,
};

use migratectl_backend::MigrationId;

use crate::error::MigrationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Self::Up => "Applying",
            Self::Down => "Reverting",
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            Self::Up => "applied",
            Self::Down => "reverted",
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = MigrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            other => Err(MigrationError::InvalidDirection(other.to_owned())),
        }
    }
}

/// How far an `up` or `down` run goes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    /// Run or revert this many migrations.
    Count(NonZeroUsize),
    /// Run or revert up to and including this migration.
    Id(MigrationId),
}

impl FromStr for Target {
    type Err = MigrationError;

    /// An all-digit string is always a count, so a migration whose identifier
    /// is purely numeric can only be reached by count.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let digits = raw.strip_prefix('-').unwrap_or(raw);
        let numeric = !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit());
        if !numeric {
            return Ok(Self::Id(raw.into()));
        }
        if raw.starts_with('-') || digits.bytes().all(|b| b == b'0') {
            return Err(MigrationError::InvalidTarget(raw.to_owned()));
        }
        // Counts past usize::MAX cannot be satisfied anyway, clamp them.
        let count = raw.parse::<usize>().unwrap_or(usize::MAX);
        NonZeroUsize::new(count)
            .map(Self::Count)
            .ok_or_else(|| MigrationError::InvalidTarget(raw.to_owned()))
    }
}

impl From<NonZeroUsize> for Target {
    fn from(value: NonZeroUsize) -> Self {
        Self::Count(value)
    }
}

impl From<MigrationId> for Target {
    fn from(value: MigrationId) -> Self {
        Self::Id(value)
    }
}
