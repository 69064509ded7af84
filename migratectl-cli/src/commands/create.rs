use chrono::{DateTime, Utc};
use lazy_regex::{Lazy, Regex, lazy_regex};
use migratectl_migration::Config;
use migratectl_template::{MigrationTemplate, RenderError};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::info;

const DATE_FMT: &str = "%Y-%m-%dT%H:%M:%S";

static SLUG_REGEX: Lazy<Regex> = lazy_regex!(r"^[A-Za-z0-9_.]+$");

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Template rendering failed: {0}")]
    Render(#[from] RenderError),
    #[error("invalid migration name `{0}`: {1}")]
    InvalidName(String, &'static str),
}

type Result<T> = std::result::Result<T, CommandError>;

/// Turns a user supplied name into the part of the file name after the timestamp.
pub fn migration_slug(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CommandError::InvalidName(raw.to_owned(), "must not be empty"));
    }
    if trimmed.contains(['/', '\\']) {
        return Err(CommandError::InvalidName(
            raw.to_owned(),
            "must not contain path separators",
        ));
    }
    let slug = trimmed.replace(' ', "_");
    if !SLUG_REGEX.is_match(&slug) {
        return Err(CommandError::InvalidName(
            raw.to_owned(),
            "only ASCII letters, digits, `_`, `.` and spaces are allowed",
        ));
    }
    Ok(slug)
}

/// `<unix-seconds>_<slug>.<ext>`. Seconds are not padded, so names only sort
/// chronologically while the timestamp keeps the same number of digits.
fn migration_id(now: DateTime<Utc>, slug: &str, extension: &str) -> String {
    format!("{}_{}.{}", now.timestamp(), slug, extension)
}

/// Scaffolds a new migration file and returns its path.
pub fn create_migration(config: &Config, name: &str, template_file: Option<&Path>) -> Result<PathBuf> {
    let slug = migration_slug(name)?;
    let now = Utc::now();
    let dir = config.migrations_dir();
    fs::create_dir_all(dir)?;

    let mut builder = MigrationTemplate::builder();
    builder
        .id(migration_id(now, &slug, config.extension()))
        .name(name.trim())
        .date(now.format(DATE_FMT).to_string());
    if let Some(template_file) = template_file {
        builder.template_file(template_file);
    }
    let path = builder.render(dir)?;

    info!(path = %path.display(), "created migration");
    Ok(path)
}
