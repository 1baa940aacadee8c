//! # Configuration Tests
//!
//! Tests for configuration defaults, JSON deserialization and validation.

use std::io::Write;

use o3sim_core::common::{ConfigError, DEADLOCK_CYCLE, SimError};
use o3sim_core::config::*;
use o3sim_core::core::{CoreParts, O3Core};
use pretty_assertions::assert_eq;

// ══════════════════════════════════════════════════════════
// 1. Defaults
// ══════════════════════════════════════════════════════════

#[test]
fn test_core_config_defaults() {
    let core = CoreConfig::default();
    assert_eq!(core.ifetch_buffer_size, 64);
    assert_eq!(core.decode_buffer_size, 32);
    assert_eq!(core.dispatch_buffer_size, 32);
    assert_eq!(core.rob_size, 352);
    assert_eq!(core.lq_size, 128);
    assert_eq!(core.sq_size, 72);
    assert_eq!(core.fetch_width, 6);
    assert_eq!(core.execute_width, 4);
    assert_eq!(core.retire_width, 5);
    assert_eq!(core.deadlock_cycle, DEADLOCK_CYCLE);
    assert_eq!(core.log2_block_size, 6);
}

#[test]
fn test_general_config_defaults() {
    let general = GeneralConfig::default();
    assert_eq!(general.cpu, 0);
    assert_eq!(general.warmup_instructions, 0);
    assert_eq!(general.simulation_instructions, 0);
    assert!(!general.heartbeat);
}

#[test]
fn test_memory_levels_default_latencies() {
    let memory = MemoryConfig::default();
    assert_eq!(memory.l1i.latency, 4);
    assert_eq!(memory.l1d.latency, 5);
    assert_eq!(memory.l1d.max_read, 2);
}

#[test]
fn test_default_config_validates() {
    assert!(Config::default().validate().is_ok());
}

// ══════════════════════════════════════════════════════════
// 2. JSON loading
// ══════════════════════════════════════════════════════════

#[test]
fn test_empty_document_gives_defaults() {
    let config = Config::from_json_str("{}").unwrap();
    assert_eq!(config.core.rob_size, CoreConfig::default().rob_size);
    assert_eq!(config.dib.ways, DibConfig::default().ways);
}

#[test]
fn test_partial_section_keeps_other_defaults() {
    let config = Config::from_json_str(r#"{ "core": { "lq_size": 4, "execute_latency": 3 } }"#).unwrap();
    assert_eq!(config.core.lq_size, 4);
    assert_eq!(config.core.execute_latency, 3);
    assert_eq!(config.core.sq_size, 72);
    assert_eq!(config.branch.btb_size, 1024);
}

#[test]
fn test_from_file_reads_json() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, r#"{{ "general": {{ "warmup_instructions": 500, "cpu": 2 }} }}"#).unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.general.warmup_instructions, 500);
    assert_eq!(config.general.cpu, 2);
}

#[test]
fn test_from_file_missing_path_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::from_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }), "{err}");
}

#[test]
fn test_malformed_json_is_parse_error() {
    let err = Config::from_json_str("{ core: 1 }").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)), "{err}");
}

// ══════════════════════════════════════════════════════════
// 3. Validation
// ══════════════════════════════════════════════════════════

#[test]
fn test_zero_width_rejected_on_load() {
    let err = Config::from_json_str(r#"{ "core": { "fetch_width": 0 } }"#).unwrap_err();
    assert!(
        matches!(err, ConfigError::Invalid { field: "core.fetch_width", .. }),
        "{err}"
    );
}

#[test]
fn test_non_power_of_two_btb_rejected() {
    let mut config = Config::default();
    config.branch.btb_size = 1000;
    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { field: "branch.btb_size", .. }), "{err}");
}

#[test]
fn test_config_error_wraps_into_sim_error() {
    let mut config = Config::default();
    config.core.rob_size = 0;
    let err: SimError = config.validate().unwrap_err().into();
    assert!(err.to_string().contains("core.rob_size"), "{err}");
}

#[test]
fn test_queues_must_hold_one_instruction() {
    let err = Config::from_json_str(r#"{ "core": { "lq_size": 3 } }"#).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { field: "core.lq_size", .. }), "{err}");

    let err = Config::from_json_str(r#"{ "core": { "sq_size": 1 } }"#).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { field: "core.sq_size", .. }), "{err}");

    assert!(Config::from_json_str(r#"{ "core": { "lq_size": 4, "sq_size": 2 } }"#).is_ok());
}

#[test]
fn test_core_construction_validates() {
    let mut config = Config::default();
    config.dib.ways = 0;
    let err = O3Core::new(&config, CoreParts::reference(&Config::default())).unwrap_err();
    assert!(matches!(err, SimError::Config(ConfigError::Invalid { field: "dib.ways", .. })), "{err}");

    let mut config = Config::default();
    config.dib.sets = 0;
    let err = O3Core::new(&config, CoreParts::reference(&Config::default())).unwrap_err();
    assert!(err.to_string().contains("dib.sets"), "{err}");
}
