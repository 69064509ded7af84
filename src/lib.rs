#[cfg(feature = "migration")]
pub use migratectl_migration::*;

#[cfg(feature = "backend")]
pub use migratectl_backend as backend;

#[cfg(feature = "template")]
pub use migratectl_template as template;

#[cfg(feature = "cli")]
pub use migratectl_cli as cli;
