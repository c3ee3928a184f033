use std::fs;
use std::io::Cursor;

use flatrepo::config::RepoConfig;
use flatrepo::error::ApiError;
use flatrepo::tooling::cli::{CliContext, Commands, OutputFormat};
use tempfile::TempDir;

fn config_in(temp: &TempDir) -> RepoConfig {
    let mut config = RepoConfig::default();
    config.store.path = temp.path().join("store");
    config
}

fn source_dir(temp: &TempDir) -> std::path::PathBuf {
    let source = temp.path().join("source");
    fs::create_dir_all(source.join("tables")).unwrap();
    fs::write(source.join("main.xlsx"), b"main").unwrap();
    fs::write(source.join("tables/rates.xlsx"), b"rates").unwrap();
    source
}

fn import(path: &str, source: &std::path::Path, comment: &str) -> Commands {
    Commands::Import {
        source: source.to_path_buf(),
        path: path.to_string(),
        author: "tester".to_string(),
        comment: Some(comment.to_string()),
    }
}

#[test]
fn import_then_query_across_sessions() {
    let temp = TempDir::new().unwrap();
    let config = config_in(&temp);
    let source = source_dir(&temp);

    {
        let cli = CliContext::new(&config, OutputFormat::Text).unwrap();
        let out = cli.execute(&import("deploy/d1/pricing", &source, "v1")).unwrap();
        assert!(out.contains("revision 1"));
    }

    let cli = CliContext::new(&config, OutputFormat::Json).unwrap();
    let listing = cli
        .execute(&Commands::List {
            path: "deploy".to_string(),
        })
        .unwrap();
    let listing: serde_json::Value = serde_json::from_str(&listing).unwrap();
    assert_eq!(listing[0]["name"], "deploy/d1/pricing");
    assert_eq!(listing[0]["author"], "tester");
    assert_eq!(listing[0]["version"], "1");

    let history = cli
        .execute(&Commands::History {
            path: "deploy/d1/pricing".to_string(),
        })
        .unwrap();
    let history: serde_json::Value = serde_json::from_str(&history).unwrap();
    assert_eq!(history.as_array().unwrap().len(), 1);

    let out = temp.path().join("pricing.zip");
    cli.execute(&Commands::ReadHistory {
        path: "deploy/d1/pricing".to_string(),
        version: Some("1".to_string()),
        out: out.clone(),
    })
    .unwrap();
    let archive = zip::ZipArchive::new(Cursor::new(fs::read(&out).unwrap())).unwrap();
    let mut names: Vec<&str> = archive.file_names().collect();
    names.sort();
    assert_eq!(names, vec!["main.xlsx", "tables/rates.xlsx"]);
}

#[test]
fn check_reports_absence_and_bad_versions() {
    let temp = TempDir::new().unwrap();
    let config = config_in(&temp);
    let source = source_dir(&temp);
    let cli = CliContext::new(&config, OutputFormat::Text).unwrap();
    cli.execute(&import("rules/p", &source, "v1")).unwrap();

    let out = cli
        .execute(&Commands::Check {
            path: "rules/none".to_string(),
        })
        .unwrap();
    assert!(out.contains("No artifact"));

    let err = cli
        .execute(&Commands::CheckHistory {
            path: "rules/p".to_string(),
            version: Some("latest".to_string()),
        })
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidVersionFormat { .. }));

    let err = cli
        .execute(&Commands::CheckHistory {
            path: "rules/p".to_string(),
            version: Some("42".to_string()),
        })
        .unwrap_err();
    assert!(err.is_version_not_found());
}

#[test]
fn watch_counts_one_signal_per_saved_batch() {
    let temp = TempDir::new().unwrap();
    let config = config_in(&temp);
    let source = source_dir(&temp);
    let cli = CliContext::new(&config, OutputFormat::Json).unwrap();
    cli.execute(&import("rules/p", &source, "v1")).unwrap();

    let out = cli
        .execute(&Commands::Watch {
            source: source.clone(),
            path: "rules/p".to_string(),
            author: "tester".to_string(),
            comment: Some("v2".to_string()),
        })
        .unwrap();
    let out: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(out["import"]["revision"], 2);
    // content save, then check-in
    assert_eq!(out["change_signals"], 2);
}
