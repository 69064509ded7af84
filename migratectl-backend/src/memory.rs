use std::sync::{Mutex, MutexGuard};

use crate::generic::{AppliedLog, LedgerError, LedgerTrait};

#[derive(Debug, Default)]
struct Inner {
    log: AppliedLog,
    writes: usize,
}

/// Ledger kept in process memory. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryLedger(Mutex<Inner>);

impl MemoryLedger {
    pub fn new(log: AppliedLog) -> Self {
        Self(Mutex::new(Inner { log, writes: 0 }))
    }

    fn inner(&self) -> Result<MutexGuard<'_, Inner>, LedgerError> {
        self.0
            .lock()
            .map_err(|_| LedgerError::Other("memory ledger lock poisoned".into()))
    }

    /// Number of successful `persist` calls so far.
    pub fn writes(&self) -> usize {
        self.inner().map(|inner| inner.writes).unwrap_or_default()
    }
}

impl LedgerTrait for MemoryLedger {
    fn location(&self) -> String {
        "<memory>".into()
    }

    fn retrieve(&self) -> Result<AppliedLog, LedgerError> {
        Ok(self.inner()?.log.clone())
    }

    fn persist(&self, log: &AppliedLog) -> Result<(), LedgerError> {
        let mut inner = self.inner()?;
        inner.log = log.clone();
        inner.writes += 1;
        Ok(())
    }
}
