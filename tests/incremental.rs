//! Re-runs over a durable store append only what is new.

use anagram::{AnagramConfig, BackendConfig, Lookup, Pipeline, PipelineError};
use tempfile::TempDir;

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn redb_config(dir: &TempDir) -> AnagramConfig {
    AnagramConfig {
        store: BackendConfig::redb(dir.path().join("groups.redb").display().to_string()),
        ..AnagramConfig::default()
    }
}

#[test]
fn rerun_after_restart_appends_nothing() -> Result<(), PipelineError> {
    let dir = TempDir::new().expect("temp dir");
    let targets = words(&["tea", "dog"]);
    let candidates = words(&["eat", "ate", "god", "cat"]);

    {
        let pipeline = Pipeline::open(redb_config(&dir))?;
        let report = pipeline.classify(&targets, &candidates)?;
        assert_eq!(report.appended, 5);
    }

    let pipeline = Pipeline::open(redb_config(&dir))?;
    let report = pipeline.classify(&targets, &candidates)?;
    assert_eq!(report.appended, 0);
    assert_eq!(report.already_seen, 5);
    assert_eq!(
        pipeline.query_service()?.lookup("dog").unwrap(),
        Lookup::Found(vec!["dog".into(), "god".into()])
    );
    Ok(())
}

#[test]
fn new_candidates_are_appended_once() -> Result<(), PipelineError> {
    let dir = TempDir::new().expect("temp dir");
    let targets = words(&["tea"]);

    {
        let pipeline = Pipeline::open(redb_config(&dir))?;
        pipeline.classify(&targets, &words(&["eat"]))?;
    }

    let pipeline = Pipeline::open(redb_config(&dir))?;
    let report = pipeline.classify(&targets, &words(&["eat", "ate", "ate"]))?;
    assert_eq!(report.appended, 1);
    assert_eq!(report.already_seen, 3);

    let (_, key) = pipeline.canonicalizer()?.key_for_raw("tea")?;
    let members: Vec<String> = pipeline
        .store()
        .get_all(&key)?
        .into_iter()
        .map(|w| w.into_string())
        .collect();
    assert_eq!(members, vec!["tea", "eat", "ate"]);
    Ok(())
}

#[test]
fn ledger_snapshot_survives_a_store_swap() -> Result<(), PipelineError> {
    let dir = TempDir::new().expect("temp dir");
    let snapshot = dir.path().join("ledger.snap");

    let source = Pipeline::open(AnagramConfig::default())?;
    source.classify(&words(&["tea"]), &words(&["eat"]))?;
    let exported = source.export_ledger(&snapshot)?;
    assert_eq!(exported.entries.len(), 1);

    let target = Pipeline::open(AnagramConfig::default())?;
    let ledger = target.import_ledger(&snapshot)?;
    let (word, key) = target.canonicalizer()?.key_for_raw("eat")?;
    assert!(ledger.seen(&key, &word)?);
    Ok(())
}
