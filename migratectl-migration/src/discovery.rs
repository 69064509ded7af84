use std::{fs, io, path::Path};

use migratectl_backend::MigrationId;
use tracing::{debug, warn};

use crate::error::MigrationError;

/// Lists migration files in `dir` whose name ends in `.<extension>`, sorted
/// as plain strings. The extension stays part of the identifier.
pub fn discover(dir: &Path, extension: &str) -> Result<Vec<MigrationId>, MigrationError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(MigrationError::NotFound(dir.to_owned()));
        }
        Err(err) => return Err(err.into()),
    };
    let suffix = format!(".{}", extension.trim_start_matches('.'));

    let mut ids = entries
        .map(|entry| -> io::Result<Option<MigrationId>> {
            let entry = entry?;
            // Follows symlinks, as the loader does.
            match fs::metadata(entry.path()) {
                Ok(meta) if meta.is_file() => {}
                Ok(_) => return Ok(None),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    warn!(path = %entry.path().display(), "skipping dangling symlink");
                    return Ok(None);
                }
                Err(err) => return Err(err),
            }
            let name = entry.file_name();
            match name.to_str() {
                Some(name) if name.ends_with(&suffix) && name.len() > suffix.len() => {
                    Ok(Some(MigrationId::from(name)))
                }
                Some(_) => Ok(None),
                None => {
                    warn!(name = ?name, "skipping entry with non UTF-8 name");
                    Ok(None)
                }
            }
        })
        .filter_map(Result::transpose)
        .collect::<io::Result<Vec<_>>>()?;
    ids.sort();

    debug!(dir = %dir.display(), found = ids.len(), "discovered migrations");
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn lists_matching_files_sorted() {
        let tmp = tempdir().unwrap();
        for name in ["1700000200_c.sh", "1700000000_a.sh", "1700000100_b.sh", "notes.txt", ".state"] {
            fs::write(tmp.path().join(name), "").unwrap();
        }
        fs::create_dir(tmp.path().join("1700000300_dir.sh")).unwrap();

        let ids = discover(tmp.path(), "sh").unwrap();
        assert_eq!(ids, vec!["1700000000_a.sh", "1700000100_b.sh", "1700000200_c.sh"]);
    }

    #[test]
    fn sort_is_lexicographic_not_numeric() {
        let tmp = tempdir().unwrap();
        for name in ["99_late.sh", "100_later.sh"] {
            fs::write(tmp.path().join(name), "").unwrap();
        }
        assert_eq!(
            discover(tmp.path(), ".sh").unwrap(),
            vec!["100_later.sh", "99_late.sh"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_files_are_listed() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("migrations");
        fs::create_dir(&dir).unwrap();
        let target = tmp.path().join("shared.sh");
        fs::write(&target, "").unwrap();
        std::os::unix::fs::symlink(&target, dir.join("1700000000_a.sh")).unwrap();
        std::os::unix::fs::symlink(tmp.path(), dir.join("1700000100_dir.sh")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("gone.sh"), dir.join("1700000200_gone.sh")).unwrap();

        assert_eq!(discover(&dir, "sh").unwrap(), vec!["1700000000_a.sh"]);
    }

    #[test]
    fn empty_dir_is_empty() {
        let tmp = tempdir().unwrap();
        assert!(discover(tmp.path(), "sh").unwrap().is_empty());
    }

    #[test]
    fn missing_dir_is_not_found() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("migrations");
        assert!(matches!(
            discover(&dir, "sh"),
            Err(MigrationError::NotFound(path)) if path == dir
        ));
    }
}
