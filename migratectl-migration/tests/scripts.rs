#![cfg(unix)]

use std::fs;

use migratectl_migration::{
    Config, Direction, LedgerTrait, MigrationError, Migrator, Target,
};
use tempfile::tempdir;

fn script(marker: &str) -> String {
    format!("case \"$1\" in up) touch {marker} ;; down) rm {marker} ;; esac\n")
}

#[test]
fn applies_and_reverts_against_state_file() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path().join("migrations");
    fs::create_dir(&dir).unwrap();
    for (name, marker) in [
        ("1700000000_a.sh", "a.done"),
        ("1700000100_b.sh", "b.done"),
        ("1700000200_c.sh", "c.done"),
    ] {
        fs::write(dir.join(name), script(marker)).unwrap();
    }
    let config = Config::new(&dir).with_state_file(tmp.path().join("state.json"));
    let migrator = Migrator::from_config(config, "sh");

    let report = migrator.up(Some("1700000100_b.sh")).unwrap();
    assert_eq!(report.steps.len(), 2);
    assert!(dir.join("a.done").exists() && dir.join("b.done").exists());
    assert!(!dir.join("c.done").exists());

    let raw = fs::read_to_string(tmp.path().join("state.json")).unwrap();
    assert_eq!(
        raw,
        "[\n  \"1700000000_a.sh\",\n  \"1700000100_b.sh\"\n]\n"
    );

    let status = migrator.status().unwrap();
    assert_eq!(status.pending, vec!["1700000200_c.sh"]);

    migrator
        .perform(Direction::Down, Some(&"2".parse::<Target>().unwrap()))
        .unwrap();
    assert!(!dir.join("a.done").exists() && !dir.join("b.done").exists());
    assert!(migrator.ledger().retrieve().unwrap().is_empty());
    assert_eq!(
        fs::read_to_string(tmp.path().join("state.json")).unwrap(),
        "[]\n"
    );
}

#[test]
fn renamed_file_is_an_integrity_error() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path().join("migrations");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("1700000000_a.sh"), script("a.done")).unwrap();
    let migrator = Migrator::from_config(Config::new(&dir), "sh");
    migrator.up(None).unwrap();

    fs::rename(dir.join("1700000000_a.sh"), dir.join("1700000000_renamed.sh")).unwrap();
    let err = migrator.up(None).unwrap_err();
    assert!(matches!(err, MigrationError::Integrity(_)));
    assert!(err.to_string().contains("You must resolve the conflict manually."));
}
