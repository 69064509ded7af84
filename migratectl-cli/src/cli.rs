use clap::{ArgAction, Parser};
use migratectl_migration::{
    Config, Direction, MigrationError, Migrator,
    config::{DEFAULT_EXTENSION, DEFAULT_MIGRATIONS_DIR},
    script::DEFAULT_INTERPRETER,
};
use std::{
    io::{self, Write},
    path::PathBuf,
};
use thiserror::Error;

use crate::{
    commands::{CommandError, MigrateSubcommands, create_migration, perform, show},
    logging::init_logging,
};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Migrate(#[from] MigrationError),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Apply and revert ordered migration scripts.
///
/// Only one migratectl may run against a state file at a time; wrap
/// concurrent invocations in an external lock.
#[derive(Parser, Debug)]
#[command(version, author)]
pub struct Cli {
    #[arg(
        global = true,
        short = 'd',
        long,
        env = "MIGRATION_DIR",
        help = "directory where migrations are stored",
        default_value = DEFAULT_MIGRATIONS_DIR
    )]
    pub migrations_dir: PathBuf,

    #[arg(
        global = true,
        short = 's',
        long,
        env = "MIGRATION_STATE_FILE",
        help = "file which stores applied migrations [default: <migrations-dir>/.state]"
    )]
    pub state_file: Option<PathBuf>,

    #[arg(
        global = true,
        short = 't',
        long,
        env = "MIGRATION_TEMPLATE_FILE",
        help = "template used for new migrations"
    )]
    pub template_file: Option<PathBuf>,

    #[arg(
        global = true,
        short = 'x',
        long,
        env = "MIGRATION_EXTENSION",
        help = "extension of migration files",
        default_value = DEFAULT_EXTENSION
    )]
    pub extension: String,

    #[arg(
        global = true,
        short = 'i',
        long,
        env = "MIGRATION_INTERPRETER",
        help = "program used to run migration files",
        default_value = DEFAULT_INTERPRETER
    )]
    pub interpreter: String,

    #[arg(global = true, short = 'v', long, action = ArgAction::Count, help = "increase log verbosity")]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<MigrateSubcommands>,
}

impl Cli {
    pub fn config(&self) -> Config {
        let config = Config::new(&self.migrations_dir).with_extension(&self.extension);
        match &self.state_file {
            Some(state_file) => config.with_state_file(state_file),
            None => config,
        }
    }
}

pub fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli, &mut io::stdout().lock())
}

pub fn run<W: Write>(cli: Cli, out: &mut W) -> Result<(), CliError> {
    let config = cli.config();

    match cli.command {
        Some(MigrateSubcommands::Create { name }) => {
            let path = create_migration(&config, &name, cli.template_file.as_deref())?;
            writeln!(out, "File '{}' has been created.", path.display())?;
        }
        Some(MigrateSubcommands::Show) => {
            show(&Migrator::from_config(config, &cli.interpreter), out)?;
        }
        Some(MigrateSubcommands::Up { target }) => perform(
            &Migrator::from_config(config, &cli.interpreter),
            Direction::Up,
            target.as_deref(),
            out,
        )?,
        Some(MigrateSubcommands::Down { target }) => perform(
            &Migrator::from_config(config, &cli.interpreter),
            Direction::Down,
            target.as_deref(),
            out,
        )?,
        None => perform(
            &Migrator::from_config(config, &cli.interpreter),
            Direction::Up,
            None,
            out,
        )?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::path::Path;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_options_after_subcommand() {
        let cli = Cli::try_parse_from(["migratectl", "down", "2", "-d", "db", "-s", "db.json"]).unwrap();
        assert_eq!(
            cli.command,
            Some(MigrateSubcommands::Down {
                target: Some("2".into())
            })
        );
        let config = cli.config();
        assert_eq!(config.migrations_dir(), Path::new("db"));
        assert_eq!(config.state_file(), Path::new("db.json"));
    }

    #[test]
    fn no_subcommand_means_up() {
        let cli = Cli::try_parse_from(["migratectl"]).unwrap();
        assert_eq!(cli.command, None);
        assert_eq!(cli.config().state_file(), Path::new("migrations/.state"));
    }

    #[test]
    fn verbosity_counts() {
        let cli = Cli::try_parse_from(["migratectl", "-vv", "show"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
