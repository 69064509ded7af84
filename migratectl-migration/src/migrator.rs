use std::{
    fmt::{self, Display, Formatter},
    time::{Duration, Instant},
};

use migratectl_backend::{AppliedLog, LedgerTrait, MigrationId};
use tracing::{debug, info, info_span};

use crate::{
    config::Config,
    discovery::discover,
    error::{MigrationError, write_section},
    loader::LoaderTrait,
    plan::{Plan, check_integrity},
    target::{Direction, Target},
};

/// Split of the discovered migrations into applied and pending.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Status {
    pub applied: Vec<MigrationId>,
    pub pending: Vec<MigrationId>,
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_section(f, "Applied migrations:", &self.applied)?;
        write_section(f, "New migrations:", &self.pending)
    }
}

/// Progress notifications emitted while a plan runs.
#[derive(Clone, Copy, Debug)]
pub enum StepEvent<'a> {
    Started(&'a MigrationId),
    Finished(&'a MigrationId, Duration),
}

/// Outcome of a successful run.
#[derive(Clone, Debug)]
pub struct Report {
    pub direction: Direction,
    pub steps: Vec<(MigrationId, Duration)>,
    /// Log as persisted after the run.
    pub log: AppliedLog,
}

impl Report {
    pub fn total(&self) -> Duration {
        self.steps.iter().map(|(_, elapsed)| *elapsed).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Brings the ledger in line with a requested point in the migration sequence.
///
/// Runs are strictly sequential and assume exclusive access to the ledger.
#[derive(Debug)]
pub struct Migrator<L, X> {
    config: Config,
    ledger: L,
    loader: X,
}

impl<L, X> Migrator<L, X>
where
    L: LedgerTrait,
    X: LoaderTrait,
{
    pub fn new(config: Config, ledger: L, loader: X) -> Self {
        Self {
            config,
            ledger,
            loader,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    fn snapshot(&self) -> Result<(Vec<MigrationId>, AppliedLog), MigrationError> {
        let available = discover(self.config.migrations_dir(), self.config.extension())?;
        let applied = self.ledger.retrieve()?;
        Ok((available, applied))
    }

    pub fn status(&self) -> Result<Status, MigrationError> {
        let (available, applied) = self.snapshot()?;
        if let Err(source) = check_integrity(&available, &applied) {
            return Err(MigrationError::Diverged {
                source,
                applied,
                available,
            });
        }
        let pending = available[applied.len()..].to_vec();
        Ok(Status {
            applied: applied.into_inner(),
            pending,
        })
    }

    /// Computes what a run would execute without executing anything.
    pub fn plan(&self, direction: Direction, target: Option<&Target>) -> Result<Plan, MigrationError> {
        let (available, applied) = self.snapshot()?;
        check_integrity(&available, &applied)?;
        Plan::build(&available, &applied, direction, target)
    }

    pub fn up(&self, to: Option<&str>) -> Result<Report, MigrationError> {
        let target: Option<Target> = to.map(str::parse).transpose()?;
        self.perform(Direction::Up, target.as_ref())
    }

    pub fn down(&self, to: Option<&str>) -> Result<Report, MigrationError> {
        let target: Option<Target> = to.map(str::parse).transpose()?;
        self.perform(Direction::Down, target.as_ref())
    }

    pub fn perform(&self, direction: Direction, target: Option<&Target>) -> Result<Report, MigrationError> {
        self.perform_with(direction, target, |_| {})
    }

    /// Runs the plan for `direction` and `target`, then persists the new log.
    ///
    /// The ledger is written once, after every step succeeded. Steps that ran
    /// before a failure are not undone.
    pub fn perform_with<F>(
        &self,
        direction: Direction,
        target: Option<&Target>,
        mut on_step: F,
    ) -> Result<Report, MigrationError>
    where
        F: FnMut(StepEvent<'_>),
    {
        let (available, applied) = self.snapshot()?;
        check_integrity(&available, &applied)?;
        let plan = Plan::build(&available, &applied, direction, target)?;

        if plan.is_empty() {
            info!(%direction, "nothing to run");
            return Ok(Report {
                direction,
                steps: Vec::new(),
                log: applied,
            });
        }
        debug!(%direction, steps = plan.len(), "executing plan");

        let dir = self.config.migrations_dir();
        let mut steps = Vec::with_capacity(plan.len());
        for id in &plan.steps {
            let _span = info_span!("migration", %id, %direction).entered();
            on_step(StepEvent::Started(id));

            let started = Instant::now();
            self.loader
                .load(id, dir)
                .and_then(|migration| migration.run(direction))
                .map_err(|source| MigrationError::Execution {
                    id: id.clone(),
                    direction,
                    source,
                })?;
            let elapsed = started.elapsed();

            info!(elapsed_ms = elapsed.as_millis() as u64, "{} done", direction.verb());
            on_step(StepEvent::Finished(id, elapsed));
            steps.push((id.clone(), elapsed));
        }

        let log = plan.commit(applied);
        self.ledger.persist(&log)?;
        info!(
            %direction,
            count = steps.len(),
            ledger = %self.ledger.location(),
            "migrations have been {}",
            direction.past_tense()
        );

        Ok(Report {
            direction,
            steps,
            log,
        })
    }
}
