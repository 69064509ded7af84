use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::generic::{AppliedLog, LedgerError, LedgerTrait};

/// Ledger stored as a pretty-printed JSON array of identifiers.
#[derive(Clone, Debug)]
pub struct JsonLedger {
    path: PathBuf,
}

impl JsonLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl LedgerTrait for JsonLedger {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn retrieve(&self) -> Result<AppliedLog, LedgerError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no state file yet, starting empty");
                return Ok(AppliedLog::new());
            }
            Err(err) => return Err(err.into()),
        };
        let log: AppliedLog = serde_json::from_reader(BufReader::new(file)).map_err(|source| {
            LedgerError::Malformed {
                path: self.path.clone(),
                source,
            }
        })?;
        debug!(path = %self.path.display(), applied = log.len(), "loaded state file");
        Ok(log)
    }

    fn persist(&self, log: &AppliedLog) -> Result<(), LedgerError> {
        let dir = self.parent_dir();
        fs::create_dir_all(dir)?;

        // Temp file must live on the same filesystem for the rename to be atomic.
        let mut tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, log)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|err| LedgerError::Io(err.error))?;

        debug!(path = %self.path.display(), applied = log.len(), "state file written");
        Ok(())
    }
}
