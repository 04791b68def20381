//! Configuration file tests
//!
//! Loads TOML files from disk and checks that every section reaches the
//! stage it configures.

use std::io::Write;

use content_markdown_converter::{ConfigError, Pipeline, PipelineConfig};
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write config");
    file
}

#[test]
fn test_load_full_config_file() {
    let file = write_config(
        r##"
        [locator]
        selectors = ["article", "#content"]

        [sanitizer]
        strip_comments = false
        mark_links_nofollow = false
        max_depth = 64

        [markdown]
        escape_asterisks = false
        autolinks = false
        "##,
    );

    let config = PipelineConfig::load(file.path()).unwrap();

    assert_eq!(config.locator.selectors, vec!["article", "#content"]);
    assert!(!config.sanitizer.strip_comments);
    assert!(config.sanitizer.strip_scripts);
    assert_eq!(config.sanitizer.max_depth, 64);
    assert!(!config.markdown.escape_asterisks);
    assert!(!config.markdown.autolinks);
}

#[test]
fn test_loaded_config_drives_the_pipeline() {
    let file = write_config(
        r##"
        [locator]
        selectors = ["#content"]

        [sanitizer]
        mark_links_nofollow = false

        [markdown]
        escape_asterisks = false
        "##,
    );
    let config = PipelineConfig::load(file.path()).unwrap();
    let pipeline = Pipeline::from_config(&config).unwrap();

    let html = r#"<main>Not this</main><div id="content"><p>2 * 3 = 6</p></div>"#;
    assert_eq!(pipeline.run(html).unwrap(), "2 * 3 = 6");
}

#[test]
fn test_empty_file_is_default_config() {
    let file = write_config("");
    assert_eq!(
        PipelineConfig::load(file.path()).unwrap(),
        PipelineConfig::default()
    );
}

#[test]
fn test_missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.toml");

    let err = PipelineConfig::load(&path).unwrap_err();
    match err {
        ConfigError::Read { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("expected read error, got {other:?}"),
    }
}

#[test]
fn test_malformed_toml_is_parse_error() {
    let file = write_config("[locator\nselectors = 3");
    assert!(matches!(
        PipelineConfig::load(file.path()),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_invalid_selector_in_file() {
    let file = write_config("[locator]\nselectors = [\"main\", \"div > p\"]\n");
    let err = PipelineConfig::load(file.path()).unwrap_err();

    assert!(matches!(err, ConfigError::InvalidSelector { ref selector, .. } if selector == "div > p"));
    assert!(err.to_string().contains("div > p"));
}

/// Selectors given on the command line replace the configured ones
#[test]
fn test_selector_override_after_load() {
    let file = write_config("[locator]\nselectors = [\"main\"]\n");
    let mut config = PipelineConfig::load(file.path()).unwrap();
    config.locator.selectors = vec![".post".to_string()];
    config.validate().unwrap();

    let pipeline = Pipeline::from_config(&config).unwrap();
    let html = r#"<main>Main</main><div class="post">Post</div>"#;
    assert_eq!(pipeline.run(html).unwrap(), "Post");
}
