use dfort_logger::{LevelFilter, Logger};

#[test]
fn console_only_logger_has_no_file_writer() {
    let logger = Logger::builder()
        .name("integration-console-only")
        .console(true)
        .level(LevelFilter::INFO)
        .init()
        .expect("logger should initialize");

    assert!(!logger.writes_files());
}
