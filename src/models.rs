//! Wire models for the content files (manifest entries, sprite rows)
//!
//! These mirror the on-disk JSON shapes. Table records in general stay
//! dynamic (`serde_json::Value`) because the schema registry drives them;
//! only the sprite pipeline gets typed rows, parsed per record so one
//! malformed row never poisons a whole table.

use serde::{Deserialize, Serialize};

/// One content file backing a table, as listed in the database manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct FileEntry {
    pub file: String,
    /// Sheet image served for this file's base sprites
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tilesheet: Option<String>,
}

/// One table's entry in the database manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableEntry {
    #[serde(rename = "TableName")]
    pub table_name: String,
    #[serde(rename = "JSON")]
    pub files: Vec<FileEntry>,
}

/// A sliced-rectangle definition row. Its `_filename` names the sheet the
/// rectangle is cut from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct BaseSpriteRow {
    #[serde(rename = "ID")]
    pub id: String,
    pub source_rectangle: String,
    #[serde(rename = "_filename", skip_serializing_if = "Option::is_none", default)]
    pub filename: Option<String>,
}

/// One layer of a combine stack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct LayerEntry {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub base_sprite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sprite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub offset: Option<String>,
}

/// One rotation choice. A missing source reuses the parent row's own ID
/// as a base-sprite reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct RotationEntry {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub base_sprite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub combine: Option<Vec<LayerEntry>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rotation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub effect: Option<String>,
}

/// One season choice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct SeasonEntry {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub season: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub base_sprite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rotations: Option<Vec<RotationEntry>>,
}

/// One weighted random choice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct RandomEntry {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub base_sprite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sprite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub weight: Option<u32>,
}

/// One per-material-type choice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct MaterialEntry {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub material_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sprite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub base_sprite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub sprites: Option<Vec<LayerEntry>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rotations: Option<Vec<RotationEntry>>,
}

/// A composite sprite definition row. At most one of the rule keys
/// applies; when several are present the resolver picks by fixed
/// priority.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct SpriteRow {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub base_sprite: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rotations: Option<Vec<RotationEntry>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub seasons: Option<Vec<SeasonEntry>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub combine: Option<Vec<LayerEntry>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub random: Option<Vec<RandomEntry>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub by_material_types: Option<Vec<MaterialEntry>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub frames: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub offset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub anim: Option<bool>,
    #[serde(rename = "_filename", skip_serializing_if = "Option::is_none", default)]
    pub filename: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_entry_roundtrip() {
        let json = r#"{"TableName": "BaseSprites", "JSON": [{"File": "sprites.json", "Tilesheet": "tilesheet.png"}]}"#;
        let entry: TableEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.table_name, "BaseSprites");
        assert_eq!(entry.files.len(), 1);
        assert_eq!(entry.files[0].file, "sprites.json");
        assert_eq!(entry.files[0].tilesheet.as_deref(), Some("tilesheet.png"));

        let back = serde_json::to_string(&entry).unwrap();
        let again: TableEntry = serde_json::from_str(&back).unwrap();
        assert_eq!(entry, again);
    }

    #[test]
    fn test_manifest_entry_without_tilesheet() {
        let json = r#"{"TableName": "Items", "JSON": [{"File": "items.json"}]}"#;
        let entry: TableEntry = serde_json::from_str(json).unwrap();
        assert!(entry.files[0].tilesheet.is_none());
        // None must not appear on the wire
        assert!(!serde_json::to_string(&entry).unwrap().contains("Tilesheet"));
    }

    #[test]
    fn test_base_sprite_row_fixture() {
        let json = r#"{"ID": "GrassFloor", "SourceRectangle": "0 0 32 32", "_filename": "floors.json"}"#;
        let row: BaseSpriteRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.id, "GrassFloor");
        assert_eq!(row.source_rectangle, "0 0 32 32");
        assert_eq!(row.filename.as_deref(), Some("floors.json"));
    }

    #[test]
    fn test_sprite_row_combine_fixture() {
        let json = r#"{
            "ID": "OakTree",
            "Combine": [
                {"BaseSprite": "OakTrunk"},
                {"Sprite": "OakCrown", "Offset": "0 -16"}
            ],
            "Offset": "0 8"
        }"#;
        let row: SpriteRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.id, "OakTree");
        let layers = row.combine.unwrap();
        assert_eq!(layers[0].base_sprite.as_deref(), Some("OakTrunk"));
        assert_eq!(layers[1].sprite.as_deref(), Some("OakCrown"));
        assert_eq!(layers[1].offset.as_deref(), Some("0 -16"));
        assert_eq!(row.offset.as_deref(), Some("0 8"));
    }

    #[test]
    fn test_sprite_row_seasons_fixture() {
        let json = r#"{
            "ID": "Bush",
            "Seasons": [
                {"Season": "Spring", "BaseSprite": "BushGreen"},
                {"Season": "Winter", "BaseSprite": "empty"},
                {"Season": "Fall", "Rotations": [{"BaseSprite": "BushRed", "Rotation": "FR"}]}
            ]
        }"#;
        let row: SpriteRow = serde_json::from_str(json).unwrap();
        let seasons = row.seasons.unwrap();
        assert_eq!(seasons.len(), 3);
        assert_eq!(seasons[1].base_sprite.as_deref(), Some("empty"));
        let rotations = seasons[2].rotations.as_ref().unwrap();
        assert_eq!(rotations[0].rotation.as_deref(), Some("FR"));
    }

    #[test]
    fn test_sprite_row_lenient_syntax() {
        // Content files are hand-edited and parse as JSON5
        let src = r#"{
            ID: 'RoughWall',
            Random: [
                {BaseSprite: 'RoughWall1', Weight: 3},
                {BaseSprite: 'RoughWall2'},
            ],
        }"#;
        let row: SpriteRow = json5::from_str(src).unwrap();
        let random = row.random.unwrap();
        assert_eq!(random[0].weight, Some(3));
        assert_eq!(random[1].weight, None);
    }

    #[test]
    fn test_sprite_row_ignores_unlisted_keys() {
        let json = r#"{"ID": "Lamp", "BaseSprite": "LampOff", "EditorNote": "wip"}"#;
        let row: SpriteRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.base_sprite.as_deref(), Some("LampOff"));
    }

    #[test]
    fn test_sprite_row_serializes_sparse() {
        let row = SpriteRow {
            id: "Lamp".to_string(),
            base_sprite: Some("LampOff".to_string()),
            rotations: None,
            seasons: None,
            combine: None,
            random: None,
            by_material_types: None,
            frames: None,
            offset: None,
            tint: None,
            anim: None,
            filename: None,
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"ID":"Lamp","BaseSprite":"LampOff"}"#);
    }
}
