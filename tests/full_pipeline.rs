use std::io::Write;

use anagram::{AnagramConfig, BackendConfig, Lookup, Pipeline, PipelineError};
use tempfile::{NamedTempFile, TempDir};

fn word_file(words: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    for word in words {
        writeln!(file, "{word}").expect("write word");
    }
    file
}

#[test]
fn full_pipeline_executes_with_defaults() -> Result<(), PipelineError> {
    let pipeline = Pipeline::open(AnagramConfig::default())?;
    let targets = word_file(&["tea", "dog"]);
    let candidates = word_file(&["tea", "eat", "ate", "god", "cat", "act", "it's"]);

    let report = pipeline.classify_files(targets.path(), candidates.path())?;
    assert_eq!(report.targets, 2);
    assert_eq!(report.candidates, 6);
    assert_eq!(report.invalid, 1);
    assert_eq!(report.skipped_uninterested, 2);
    assert_eq!(report.appended, 5);
    assert!(report.is_complete());

    let service = pipeline.query_service()?;
    assert_eq!(
        service.lookup("tea").unwrap(),
        Lookup::Found(vec!["eat".into(), "tea".into(), "ate".into()])
    );
    assert_eq!(service.lookup("zzqx").unwrap(), Lookup::NotFound);
    assert_eq!(service.lookup("cat").unwrap(), Lookup::NotFound);
    Ok(())
}

#[test]
fn empty_candidate_list_still_groups_targets() -> Result<(), PipelineError> {
    let pipeline = Pipeline::open(AnagramConfig::default())?;
    pipeline.classify(&["stop".to_string(), "pots".to_string()], &[])?;
    assert_eq!(
        pipeline.query_service()?.lookup("pots").unwrap(),
        Lookup::Found(vec!["pots".into(), "stop".into()])
    );
    Ok(())
}

#[test]
fn yaml_config_drives_the_pipeline() -> Result<(), PipelineError> {
    let dir = TempDir::new().expect("temp dir");
    let db = dir.path().join("groups.redb");
    let yaml = format!(
        r#"
version: "1.0"
canonical:
  strategy: "prime_product"
store:
  backend: "redb"
  path: "{}"
classifier:
  workers: 2
query:
  order: "alphabetical"
"#,
        db.display()
    );
    let config_path = dir.path().join("anagram.yaml");
    std::fs::write(&config_path, yaml).expect("write config");

    let pipeline = Pipeline::from_config_file(&config_path)?;
    assert_eq!(pipeline.config().store, BackendConfig::redb(db.display().to_string()));
    pipeline.classify(
        &["listen".to_string()],
        &["silent".to_string(), "enlist".to_string()],
    )?;
    assert_eq!(
        pipeline.query_service()?.lookup("listen").unwrap(),
        Lookup::Found(vec!["enlist".into(), "listen".into(), "silent".into()])
    );
    Ok(())
}
