pub mod migration;
pub mod registry;

pub use handlebars;

pub use handlebars::RenderError;
pub use migration::{MigrationTemplate, MigrationTemplateBuilder};
