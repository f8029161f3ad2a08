//! Tests for loading generation configs from disk.

use questgrid::{
    Biome, GenerationConfig, GoalKind, GoalStack, LayoutStyle, LevelDefinition, LevelSession,
    LevelSpec, QuestGridError, TerrainLayout,
};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

#[test]
fn test_config_file_drives_session() {
    let file = write_config(r#"{"width": 20, "height": 14, "starting_gold": 100}"#);
    let config = GenerationConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.placement_search_radius, 12);

    let spec = LevelSpec::new(99, Biome::Beach, LayoutStyle::Coastline);
    let definition = LevelDefinition::with_defaults(spec, GoalStack::new([GoalKind::LostItem]), &config);
    let session = LevelSession::new(definition, config).unwrap();
    assert_eq!(session.bounds().width, 20);
    assert_eq!(session.bounds().height, 14);
    assert_eq!(session.inventory.gold, 100);
}

#[test]
fn test_too_small_grid_is_rejected() {
    let file = write_config(r#"{"width": 4}"#);
    let err = GenerationConfig::from_json_file(file.path()).unwrap_err();
    assert!(matches!(err, QuestGridError::InvalidConfig(_)));
}

#[test]
fn test_bad_probability_is_rejected() {
    let file = write_config(r#"{"fence_chance": 1.5}"#);
    let err = GenerationConfig::from_json_file(file.path()).unwrap_err();
    assert!(err.to_string().contains("fence_chance"));
}

#[test]
fn test_malformed_json_is_a_serde_error() {
    let file = write_config("{ width: ");
    let err = GenerationConfig::from_json_file(file.path()).unwrap_err();
    assert!(matches!(err, QuestGridError::Serde(_)));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = GenerationConfig::from_json_file(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, QuestGridError::Io(_)));
}

#[test]
fn test_session_rejects_invalid_config() {
    let config = GenerationConfig {
        width: 4,
        ..GenerationConfig::default()
    };
    let spec = LevelSpec::new(7, Biome::Meadow, LayoutStyle::Crossroads);
    let definition = LevelDefinition::with_defaults(spec, GoalStack::new([GoalKind::LostItem]), &config);
    let result = LevelSession::new(definition.clone(), config);
    assert!(matches!(result, Err(QuestGridError::InvalidConfig(_))));

    let config = GenerationConfig {
        placement_search_radius: 0,
        ..GenerationConfig::default()
    };
    let layout = TerrainLayout::empty(config.bounds());
    let result = LevelSession::from_layout(definition, config, layout);
    assert!(matches!(result, Err(QuestGridError::InvalidConfig(_))));
}
