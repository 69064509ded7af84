use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Command,
};

use migratectl_backend::MigrationId;
use tracing::debug;

use crate::{
    loader::{ActionError, LoaderTrait, MigrationTrait},
    target::Direction,
};

pub const DEFAULT_INTERPRETER: &str = "sh";

/// Runs each migration file as `<interpreter> <file> up|down`.
///
/// The child inherits stdout and stderr and runs with the migrations
/// directory as its working directory.
#[derive(Clone, Debug)]
pub struct ScriptLoader {
    interpreter: OsString,
}

impl ScriptLoader {
    pub fn new(interpreter: impl Into<OsString>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }
}

impl Default for ScriptLoader {
    fn default() -> Self {
        Self::new(DEFAULT_INTERPRETER)
    }
}

impl LoaderTrait for ScriptLoader {
    fn load(&self, id: &MigrationId, dir: &Path) -> Result<Box<dyn MigrationTrait + '_>, ActionError> {
        let path = dir.join(id.as_str());
        if !path.is_file() {
            return Err(ActionError::Unknown(id.clone()));
        }
        Ok(Box::new(Script {
            interpreter: &self.interpreter,
            dir: dir.to_owned(),
            path,
        }))
    }
}

#[derive(Debug)]
struct Script<'a> {
    interpreter: &'a OsString,
    dir: PathBuf,
    path: PathBuf,
}

impl Script<'_> {
    fn invoke(&self, direction: Direction) -> Result<(), ActionError> {
        // Absolute so the script still resolves once the working directory changes.
        let script = std::path::absolute(&self.path)?;
        debug!(script = %script.display(), %direction, "spawning migration script");
        let status = Command::new(self.interpreter)
            .arg(&script)
            .arg(direction.as_str())
            .current_dir(&self.dir)
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(ActionError::Exit(status))
        }
    }
}

impl MigrationTrait for Script<'_> {
    fn up(&self) -> Result<(), ActionError> {
        self.invoke(Direction::Up)
    }

    fn down(&self) -> Result<(), ActionError> {
        self.invoke(Direction::Down)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const SCRIPT: &str = r#"
case "$1" in
  up) echo up >> log ;;
  down) echo down >> log ;;
esac
"#;

    #[test]
    fn runs_action_in_migrations_dir() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("1_a.sh"), SCRIPT).unwrap();

        let loader = ScriptLoader::default();
        let migration = loader.load(&"1_a.sh".into(), tmp.path()).unwrap();
        migration.up().unwrap();
        migration.down().unwrap();

        let log = fs::read_to_string(tmp.path().join("log")).unwrap();
        assert_eq!(log, "up\ndown\n");
    }

    #[test]
    fn failing_script_reports_exit_status() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("1_a.sh"), "exit 3\n").unwrap();

        let loader = ScriptLoader::default();
        let err = loader
            .load(&"1_a.sh".into(), tmp.path())
            .unwrap()
            .up()
            .unwrap_err();
        assert!(matches!(err, ActionError::Exit(status) if status.code() == Some(3)));
    }

    #[test]
    fn missing_file_is_unknown() {
        let tmp = tempdir().unwrap();
        let err = ScriptLoader::default()
            .load(&"9_gone.sh".into(), tmp.path())
            .unwrap_err();
        assert!(matches!(err, ActionError::Unknown(_)));
    }
}
