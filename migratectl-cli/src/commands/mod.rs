mod create;

use clap::Subcommand;
use migratectl_migration::{
    Direction, LedgerTrait, LoaderTrait, MigrationError, MigrationId, Migrator, StepEvent, Target,
};
use owo_colors::{OwoColorize, Stream::Stdout};
use std::io::{self, Write};

pub use create::{CommandError, create_migration, migration_slug};

use crate::CliError;

#[derive(Subcommand, PartialEq, Eq, Debug)]
pub enum MigrateSubcommands {
    #[command(about = "Create a new migration file")]
    Create {
        #[arg(required = true, help = "name of the new migration, spaces become underscores")]
        name: String,
    },
    #[command(about = "Show applied and new migrations", visible_alias = "status")]
    Show,
    #[command(about = "Apply migrations")]
    Up {
        #[arg(help = "name of the last migration or number of migrations (by default perform all available)")]
        target: Option<String>,
    },
    #[command(about = "Revert migrations")]
    Down {
        #[arg(help = "name of the last migration or number of migrations (by default revert one)")]
        target: Option<String>,
    },
}

fn write_section<W: Write>(out: &mut W, header: &str, ids: &[MigrationId]) -> io::Result<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let rule = "-".repeat(header.len());
    writeln!(out, "{rule}")?;
    writeln!(out, "{}", header.if_supports_color(Stdout, |h| h.bold()))?;
    writeln!(out, "{rule}")?;
    ids.iter().try_for_each(|id| writeln!(out, "{id}"))
}

/// Prints applied and pending migrations.
pub fn show<L, X, W>(migrator: &Migrator<L, X>, out: &mut W) -> Result<(), CliError>
where
    L: LedgerTrait,
    X: LoaderTrait,
    W: Write,
{
    let status = migrator.status()?;
    write_section(out, "Applied migrations:", &status.applied)?;
    write_section(out, "New migrations:", &status.pending)?;
    Ok(())
}

/// Runs `up` or `down`, printing one progress line per migration.
pub fn perform<L, X, W>(
    migrator: &Migrator<L, X>,
    direction: Direction,
    target: Option<&str>,
    out: &mut W,
) -> Result<(), CliError>
where
    L: LedgerTrait,
    X: LoaderTrait,
    W: Write,
{
    let target: Option<Target> = target.map(str::parse).transpose()?;

    let mut write_error = None;
    let result = migrator.perform_with(direction, target.as_ref(), |event| {
        let written = match event {
            StepEvent::Started(id) => {
                write!(out, "{} {id}...", direction.verb()).and_then(|_| out.flush())
            }
            StepEvent::Finished(_, elapsed) => writeln!(
                out,
                "{} (time: {:.3}s)",
                "done".if_supports_color(Stdout, |d| d.green()),
                elapsed.as_secs_f64()
            ),
        };
        if let Err(err) = written {
            write_error.get_or_insert(err);
        }
    });
    if let Err(MigrationError::Execution { .. }) = &result {
        writeln!(out, "{}", "failed".if_supports_color(Stdout, |f| f.red()))?;
    }
    let report = result?;
    if let Some(err) = write_error {
        return Err(err.into());
    }

    if report.is_empty() {
        let action = match direction {
            Direction::Up => "apply",
            Direction::Down => "revert",
        };
        writeln!(out, "No migrations to {action}.")?;
    } else {
        writeln!(
            out,
            "\nMigrations have been {}. Total time: {:.3}s",
            direction.past_tense(),
            report.total().as_secs_f64()
        )?;
    }
    Ok(())
}
