use std::path::{Path, PathBuf};

pub const DEFAULT_MIGRATIONS_DIR: &str = "migrations";
pub const DEFAULT_STATE_FILE_NAME: &str = ".state";
pub const DEFAULT_EXTENSION: &str = "sh";

/// Where migrations live and where their state is kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    migrations_dir: PathBuf,
    state_file: Option<PathBuf>,
    extension: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_MIGRATIONS_DIR)
    }
}

impl Config {
    pub fn new(migrations_dir: impl Into<PathBuf>) -> Self {
        Self {
            migrations_dir: migrations_dir.into(),
            state_file: None,
            extension: DEFAULT_EXTENSION.to_owned(),
        }
    }

    pub fn with_state_file(mut self, state_file: impl Into<PathBuf>) -> Self {
        self.state_file = Some(state_file.into());
        self
    }

    pub fn with_extension(mut self, extension: impl AsRef<str>) -> Self {
        self.extension = extension.as_ref().trim_start_matches('.').to_owned();
        self
    }

    pub fn migrations_dir(&self) -> &Path {
        &self.migrations_dir
    }

    /// Explicit state file, or `.state` inside the migrations directory.
    pub fn state_file(&self) -> PathBuf {
        self.state_file
            .clone()
            .unwrap_or_else(|| self.migrations_dir.join(DEFAULT_STATE_FILE_NAME))
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }
}
