use std::path::{Path, PathBuf};

use derive_builder::Builder;
use handlebars::{RenderError, RenderErrorReason};
use lazy_regex::{Lazy, Regex, lazy_regex};
use serde::Serialize;

use crate::registry::Registry;

static ID_REGEX: Lazy<Regex> = lazy_regex!(r"^[0-9]+_[A-Za-z0-9_.]+$");
static ISO_DATE_REGEX: Lazy<Regex> = lazy_regex!(r"^\d{4}-\d{2}-\d{2}(?:[ T]\d{2}:\d{2}:\d{2})?$");

/// A new migration file, rendered from the built-in or a user template.
#[derive(Builder, Serialize, Debug)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct MigrationTemplate {
    /// File name of the migration, `<unix-seconds>_<slug>.<ext>`.
    #[builder(setter(into))]
    id: String,
    /// Name as the user typed it.
    #[builder(setter(into))]
    name: String,
    #[builder(setter(into))]
    date: String,
    #[serde(skip)]
    #[builder(setter(into, strip_option), default)]
    template_file: Option<PathBuf>,
}

impl MigrationTemplate {
    pub fn builder() -> MigrationTemplateBuilder {
        MigrationTemplateBuilder::default()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn render_to_string(&self) -> Result<String, RenderError> {
        let registry = Registry::global()?;
        match self.template_file.as_deref() {
            Some(template) => registry.render_file(template, self),
            None => registry.render_default(self),
        }
    }

    /// Writes the migration into `out` and returns its path.
    pub fn render(&self, out: impl AsRef<Path>) -> Result<PathBuf, RenderError> {
        let path = out.as_ref().join(&self.id);
        let content = self.render_to_string()?;
        Registry::write_new(&path, content.as_bytes())?;
        Ok(path)
    }
}

impl MigrationTemplateBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(id) = self.id.as_ref() {
            if !ID_REGEX.is_match(id) {
                return Err(format!(
                    "Invalid migration id `{}`. It must match `{}`",
                    id,
                    ID_REGEX.as_str()
                ));
            }
        } else {
            return Err("id is required".into());
        }

        if let Some(name) = self.name.as_ref() {
            if name.trim().is_empty() {
                return Err("name cannot be empty".into());
            }
        } else {
            return Err("name is required".into());
        }

        if let Some(date) = self.date.as_ref() {
            if !ISO_DATE_REGEX.is_match(date) {
                return Err(format!(
                    "date `{}` must be ISO-8601: YYYY-MM-DD, YYYY-MM-DD HH:MM:SS, or YYYY-MM-DDTHH:MM:SS",
                    date
                ));
            }
        }

        Ok(())
    }

    pub fn render(&self, out: impl AsRef<Path>) -> Result<PathBuf, RenderError> {
        self.build()
            .map_err(|err| RenderErrorReason::Other(err.to_string()))?
            .render(out)
    }
}
