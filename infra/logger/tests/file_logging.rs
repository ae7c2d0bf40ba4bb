use dfort_domain::config::LoggingConfig;
use dfort_logger::Logger;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn config_driven_file_logging_writes_json_lines() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let log_dir = tmp_dir.path().join("logs");

    let config = LoggingConfig {
        level: "info".into(),
        console: false,
        json: true,
        directory: Some(log_dir.clone()),
        max_files: 2,
    };
    let logger = Logger::from_config("integration-file-logging", &config)?;
    assert!(logger.writes_files());

    tracing::info!(vault_id = "V1", "hello from integration test");

    std::thread::sleep(Duration::from_millis(30));
    drop(logger);

    let log_file = fs::read_dir(&log_dir)?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.extension().and_then(|ext| ext.to_str()) == Some("log"))
        .expect("log file should be created");

    let contents = fs::read_to_string(&log_file)?;
    let first = contents.lines().next().expect("at least one line");
    let line: serde_json::Value = serde_json::from_str(first)?;
    assert_eq!(line["fields"]["vault_id"], "V1");

    Ok(())
}
