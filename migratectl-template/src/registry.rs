use handlebars::{Handlebars, RenderError, RenderErrorReason, no_escape};
use once_cell::sync::OnceCell;
use rust_embed::RustEmbed;
use serde::Serialize;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::Path,
};

static REGISTRY: OnceCell<Registry> = OnceCell::new();

/// Name of the built-in migration template.
pub const DEFAULT_TEMPLATE: &str = "migration";
const DEFAULT_TEMPLATE_ASSET: &str = "migration.sh.hbs";

#[derive(RustEmbed)]
#[folder = "assets"]
pub struct Assets;

pub struct Registry {
    handlebars: Handlebars<'static>,
}

impl Registry {
    pub fn new() -> Result<Self, RenderError> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(no_escape);
        let asset = Assets::get(DEFAULT_TEMPLATE_ASSET)
            .ok_or_else(|| RenderErrorReason::TemplateNotFound(DEFAULT_TEMPLATE_ASSET.into()))?;
        let source = std::str::from_utf8(&asset.data)
            .map_err(|err| RenderErrorReason::Other(err.to_string()))?;
        handlebars
            .register_template_string(DEFAULT_TEMPLATE, source)
            .map_err(|err| RenderErrorReason::Other(err.to_string()))?;
        Ok(Self { handlebars })
    }

    /// Shared registry, built on first use.
    pub fn global() -> Result<&'static Self, RenderError> {
        REGISTRY.get_or_try_init(Self::new)
    }

    pub fn render_default<D: Serialize>(&self, data: &D) -> Result<String, RenderError> {
        self.handlebars.render(DEFAULT_TEMPLATE, data)
    }

    /// Renders a template read from disk rather than the embedded one.
    pub fn render_file<D: Serialize>(&self, template: &Path, data: &D) -> Result<String, RenderError> {
        let source = fs::read_to_string(template)?;
        self.handlebars.render_template(&source, data)
    }

    /// Writes `bytes` to a new file at `path`, refusing to overwrite.
    pub fn write_new(path: &Path, bytes: &[u8]) -> Result<(), RenderError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?
            .write_all(bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use tempfile::tempdir;

    #[derive(Serialize)]
    struct Data {
        id: &'static str,
        name: &'static str,
        date: &'static str,
    }

    const DATA: Data = Data {
        id: "1700000000_add_users.sh",
        name: "add users",
        date: "2023-11-14T22:13:20",
    };

    #[test]
    fn default_template_mentions_id_and_dispatches() {
        let out = Registry::global().unwrap().render_default(&DATA).unwrap();
        assert!(out.starts_with("#!/bin/sh\n# add users\n"));
        assert!(out.contains("as 1700000000_add_users.sh."));
        assert!(out.contains("up) up ;;"));
        assert!(out.contains("down) down ;;"));
    }

    #[test]
    fn custom_template_is_not_html_escaped() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("tpl");
        fs::write(&path, "-- {{id}} <{{name}}> & more\n").unwrap();
        let out = Registry::global().unwrap().render_file(&path, &DATA).unwrap();
        assert_eq!(out, "-- 1700000000_add_users.sh <add users> & more\n");
    }

    #[test]
    fn write_new_refuses_to_overwrite() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("nested").join("a.sh");
        Registry::write_new(&path, b"one").unwrap();
        assert!(Registry::write_new(&path, b"two").is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "one");
    }
}
