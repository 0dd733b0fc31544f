// tests/config_loading.rs
mod common;

use std::io::Write;

use tempfile::NamedTempFile;

use lanegraph::config::{ConfigFile, load_and_validate, load_or_default};
use lanegraph::errors::LaneGraphError;
use lanegraph::graph::{DEFAULT_PALETTE, LaneColor};
use lanegraph::types::DuplicateBatchBehaviour;

use crate::common::builders::ConfigFileBuilder;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn expect_config_error(contents: &str) -> String {
    let file = config_file(contents);
    match load_and_validate(file.path()) {
        Err(LaneGraphError::ConfigError(msg)) => msg,
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn empty_file_uses_defaults() {
    let file = config_file("");
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.history.batch_size, 200);
    assert_eq!(cfg.history.max_pending_batches, 64);
    assert_eq!(
        cfg.history.duplicate_batch_behaviour,
        DuplicateBatchBehaviour::Reject
    );
    assert_eq!(cfg.palette.colors.len(), DEFAULT_PALETTE.len());
}

#[test]
fn all_sections_are_read() {
    let file = config_file(
        r##"
[history]
batch_size = 50
max_pending_batches = 8
duplicate_batch_behaviour = "ignore"

[palette]
colors = ["#fff", "#00ff00", "#11223344"]
"##,
    );
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.history.batch_size, 50);
    assert_eq!(cfg.history.max_pending_batches, 8);
    assert_eq!(
        cfg.history.duplicate_batch_behaviour,
        DuplicateBatchBehaviour::Ignore
    );

    let options = cfg.sequencer_options();
    assert_eq!(options.max_pending_batches, 8);
    assert_eq!(options.duplicate_behaviour, DuplicateBatchBehaviour::Ignore);
    assert_eq!(
        options.palette,
        vec![
            LaneColor::new("#fff"),
            LaneColor::new("#00ff00"),
            LaneColor::new("#11223344")
        ]
    );
}

#[test]
fn zero_batch_size_is_rejected() {
    let msg = expect_config_error("[history]\nbatch_size = 0\n");
    assert!(msg.contains("batch_size must be >= 1"));
}

#[test]
fn zero_pending_window_is_rejected() {
    let msg = expect_config_error("[history]\nmax_pending_batches = 0\n");
    assert!(msg.contains("max_pending_batches must be >= 1"));
}

#[test]
fn empty_palette_is_rejected() {
    let msg = expect_config_error("[palette]\ncolors = []\n");
    assert!(msg.contains("at least one color"));
}

#[test]
fn non_hex_palette_entry_is_rejected() {
    let msg = expect_config_error("[palette]\ncolors = [\"#40b0a6\", \"teal\"]\n");
    assert!(msg.contains("'teal'"));
    assert!(msg.contains("is not a hex color"));
}

#[test]
fn unknown_duplicate_behaviour_is_a_toml_error() {
    let file = config_file("[history]\nduplicate_batch_behaviour = \"explode\"\n");
    let result = load_and_validate(file.path());
    assert!(matches!(result, Err(LaneGraphError::TomlError(_))));
}

#[test]
fn explicit_missing_path_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    let result = load_or_default(Some(&missing));
    assert!(matches!(result, Err(LaneGraphError::IoError(_))));
}

#[test]
fn builder_produces_validated_config() {
    let cfg: ConfigFile = ConfigFileBuilder::new()
        .batch_size(3)
        .max_pending_batches(2)
        .palette(&["#123456"])
        .build();

    assert_eq!(cfg.history.batch_size, 3);
    assert_eq!(cfg.palette_colors(), vec![LaneColor::new("#123456")]);
}

#[test]
fn builder_raw_config_fails_validation() {
    let raw = ConfigFileBuilder::new().batch_size(0).raw();
    assert!(matches!(
        ConfigFile::try_from(raw),
        Err(LaneGraphError::ConfigError(_))
    ));
}

#[test]
fn duplicate_behaviour_parses_from_str() {
    assert_eq!(
        " Ignore ".parse::<DuplicateBatchBehaviour>(),
        Ok(DuplicateBatchBehaviour::Ignore)
    );
    assert!("nope".parse::<DuplicateBatchBehaviour>().is_err());
}
