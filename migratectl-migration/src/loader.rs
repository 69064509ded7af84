use std::{collections::HashMap, fmt::Debug, path::Path, process::ExitStatus};

use migratectl_backend::MigrationId;
use thiserror::Error;

use crate::target::Direction;

#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("`{0}` is not a known migration")]
    Unknown(MigrationId),
    #[error("script exited with {0}")]
    Exit(ExitStatus),
    #[error("{0}")]
    Other(String),
}

/// A loaded migration exposing its forward and reverse actions.
pub trait MigrationTrait: Debug {
    fn up(&self) -> Result<(), ActionError>;
    fn down(&self) -> Result<(), ActionError>;

    fn run(&self, direction: Direction) -> Result<(), ActionError> {
        match direction {
            Direction::Up => self.up(),
            Direction::Down => self.down(),
        }
    }
}

/// Resolves a discovered identifier into something that can be run.
pub trait LoaderTrait {
    fn load(&self, id: &MigrationId, dir: &Path) -> Result<Box<dyn MigrationTrait + '_>, ActionError>;
}

impl<L: LoaderTrait + ?Sized> LoaderTrait for &L {
    fn load(&self, id: &MigrationId, dir: &Path) -> Result<Box<dyn MigrationTrait + '_>, ActionError> {
        (**self).load(id, dir)
    }
}

type Action = Box<dyn Fn() -> Result<(), ActionError>>;

/// Migration built from a pair of closures.
pub struct FnMigration {
    up: Action,
    down: Action,
}

impl FnMigration {
    pub fn new<U, D>(up: U, down: D) -> Self
    where
        U: Fn() -> Result<(), ActionError> + 'static,
        D: Fn() -> Result<(), ActionError> + 'static,
    {
        Self {
            up: Box::new(up),
            down: Box::new(down),
        }
    }
}

impl Debug for FnMigration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnMigration").finish_non_exhaustive()
    }
}

impl MigrationTrait for FnMigration {
    fn up(&self) -> Result<(), ActionError> {
        (self.up)()
    }

    fn down(&self) -> Result<(), ActionError> {
        (self.down)()
    }
}

/// In-process loader for migrations compiled into the binary.
///
/// The directory is still scanned to decide what exists; the registry only
/// supplies the actions.
#[derive(Debug, Default)]
pub struct Registry {
    migrations: HashMap<MigrationId, Box<dyn MigrationTrait>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        id: impl Into<MigrationId>,
        migration: impl MigrationTrait + 'static,
    ) -> &mut Self {
        self.migrations.insert(id.into(), Box::new(migration));
        self
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}

#[derive(Debug)]
struct Borrowed<'a>(&'a dyn MigrationTrait);

impl MigrationTrait for Borrowed<'_> {
    fn up(&self) -> Result<(), ActionError> {
        self.0.up()
    }

    fn down(&self) -> Result<(), ActionError> {
        self.0.down()
    }
}

impl LoaderTrait for Registry {
    fn load(&self, id: &MigrationId, _dir: &Path) -> Result<Box<dyn MigrationTrait + '_>, ActionError> {
        self.migrations
            .get(id)
            .map(|migration| Box::new(Borrowed(migration.as_ref())) as Box<dyn MigrationTrait + '_>)
            .ok_or_else(|| ActionError::Unknown(id.clone()))
    }
}
