//! The table schemas driving the content editor
//!
//! A process-wide registry mapping each table name to its ordered column
//! list. Built once on first access and immutable afterward. Field order
//! matters only for display; validation is order-independent.

use std::sync::OnceLock;

use crate::typedef::{Detector, FieldDef, OneOfVariant, SpriteIdTransform, TypeDef};

/// Tile predicates understood by placement tests (actions, workshops,
/// containers).
pub const TEST_TILE_VALUES: [&str; 17] = [
    "Floor",
    "FloorSoil",
    "Tree",
    "Plant",
    "PlantHasFruit",
    "Wall",
    "WallFree",
    "Construction",
    "Designation",
    "Job",
    "Ramp",
    "StairsTop",
    "Stairs",
    "TreeClip",
    "Stockpile",
    "Room",
    "AnyWall",
];

/// Ordered mapping from table name to column list.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    tables: Vec<(String, Vec<FieldDef>)>,
}

impl SchemaRegistry {
    pub fn get(&self, table: &str) -> Option<&[FieldDef]> {
        self.tables
            .iter()
            .find(|(name, _)| name == table)
            .map(|(_, fields)| fields.as_slice())
    }

    pub fn contains(&self, table: &str) -> bool {
        self.get(table).is_some()
    }

    /// Table names in declared (display) order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// The process-wide schema registry.
pub fn registry() -> &'static SchemaRegistry {
    static REGISTRY: OnceLock<SchemaRegistry> = OnceLock::new();
    REGISTRY.get_or_init(build)
}

fn state_modifier_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new("Type", TypeDef::choice(["Attribute", "Need"])),
        FieldDef::new("Attribute", TypeDef::Str),
        FieldDef::new("Value", TypeDef::Number),
    ]
}

fn needs_states_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new("ID", TypeDef::Str),
        FieldDef::new("Threshold", TypeDef::Number),
        FieldDef::new("Priority", TypeDef::Number),
        FieldDef::new(
            "ThoughtBubble",
            TypeDef::SpriteId {
                transform: Some(SpriteIdTransform::StatusPrefix),
            },
        ),
        FieldDef::new("Modifiers", TypeDef::NestedTable(state_modifier_fields())),
        FieldDef::new("Action", TypeDef::Str),
    ]
}

fn plants_states_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new("ID", TypeDef::Str),
        FieldDef::new("SpriteID", TypeDef::sprite_id()),
        FieldDef::new("Harvest", TypeDef::Boolean),
        FieldDef::new("Layout", TypeDef::Str),
        FieldDef::new("Fell", TypeDef::Boolean),
    ]
}

fn plants_harvested_item_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new("ItemID", TypeDef::Str),
        FieldDef::new("MaterialID", TypeDef::Str),
        FieldDef::new("Chance", TypeDef::Number),
    ]
}

fn plants_on_harvest_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new(
            "HarvestedItem",
            TypeDef::NestedTable(plants_harvested_item_fields()),
        ),
        FieldDef::new("Action", TypeDef::Str),
    ]
}

fn plants_on_fell_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new("ItemID", TypeDef::table_ref("Items")),
        FieldDef::new("MaterialID", TypeDef::table_ref("Materials")),
    ]
}

fn tree_layout_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new("SpriteID", TypeDef::sprite_id()),
        FieldDef::new("Offset", TypeDef::Str),
        FieldDef::new("Rotation", TypeDef::Str),
        FieldDef::new("FruitPos", TypeDef::Boolean),
    ]
}

fn action_sprite_id_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new("SpriteID", TypeDef::sprite_id()),
        FieldDef::new("Offset", TypeDef::Str),
        FieldDef::new("Rotate", TypeDef::Boolean),
        FieldDef::new("type", TypeDef::Str),
    ]
}

fn action_test_tile_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new("Offset", TypeDef::Str),
        FieldDef::new(
            "Required",
            TypeDef::array_of(TypeDef::choice(TEST_TILE_VALUES)),
        ),
        FieldDef::new(
            "Forbidden",
            TypeDef::array_of(TypeDef::choice(TEST_TILE_VALUES)),
        ),
    ]
}

fn constructions_sprites_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new("SpriteID", TypeDef::sprite_id()),
        FieldDef::new("Offset", TypeDef::Str),
        FieldDef::new("Type", TypeDef::Str),
    ]
}

fn construction_components_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new("ItemID", TypeDef::table_ref("Items")),
        FieldDef::new("Amount", TypeDef::Number),
        FieldDef::new("MaterialTypes", TypeDef::array_of(TypeDef::Str)),
    ]
}

fn constructions_intermediate_sprites_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new("SpriteID", TypeDef::sprite_id()),
        FieldDef::new("Offset", TypeDef::Str),
        FieldDef::new("Type", TypeDef::Str),
        FieldDef::new("Percent", TypeDef::Number),
    ]
}

fn crafts_components_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new("ItemID", TypeDef::table_ref("Items")),
        FieldDef::new("ClassID", TypeDef::Str),
        FieldDef::new("GroupID", TypeDef::Str),
        FieldDef::new("Amount", TypeDef::Number),
        FieldDef::new("AllowedMaterial", TypeDef::Str),
        FieldDef::new("AllowedMaterialType", TypeDef::array_of(TypeDef::Str)),
    ]
}

fn crafts_tech_gain_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new("TechID", TypeDef::table_ref("Tech")),
        FieldDef::new("Formula", TypeDef::Str),
        FieldDef::new("Args", TypeDef::CustomObject),
    ]
}

fn crafts_skill_gain_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new("SkillID", TypeDef::table_ref("Skills")),
        FieldDef::new("Formula", TypeDef::Str),
        FieldDef::new("Args", TypeDef::CustomObject),
    ]
}

fn crafts_prereqs_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new("Category", TypeDef::Str),
        FieldDef::new("TechGroup", TypeDef::Str),
        FieldDef::new("Value", TypeDef::Number),
    ]
}

fn jobs_tasks_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new("Task", TypeDef::Str),
        FieldDef::new("Duration", TypeDef::Number),
        FieldDef::new("Offset", TypeDef::Str),
        FieldDef::new("ConstructionID", TypeDef::Str),
        FieldDef::new("Material", TypeDef::Str),
    ]
}

fn jobs_sprite_id_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new("SpriteID", TypeDef::sprite_id()),
        FieldDef::new("Offset", TypeDef::Str),
        FieldDef::new("Type", TypeDef::Str),
        FieldDef::new("Rotate", TypeDef::Boolean),
        FieldDef::new("ConstructionID", TypeDef::table_ref("Construction")),
        FieldDef::new("Material", TypeDef::Str),
        FieldDef::new("Duration", TypeDef::Number),
    ]
}

fn workshops_components_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new("Offset", TypeDef::Str),
        FieldDef::new("SpriteID", TypeDef::sprite_id()),
        FieldDef::new("SpriteID2", TypeDef::sprite_id()),
        FieldDef::new("ItemID", TypeDef::table_ref("Items")),
        FieldDef::new("MaterialItem", TypeDef::array_of(TypeDef::Number)),
        FieldDef::new("WallRotation", TypeDef::Str),
        FieldDef::new(
            "Required",
            TypeDef::array_of(TypeDef::choice(TEST_TILE_VALUES)),
        ),
        FieldDef::new(
            "Forbidden",
            TypeDef::array_of(TypeDef::choice(TEST_TILE_VALUES)),
        ),
    ]
}

fn items_components_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new("ItemID", TypeDef::table_ref("Items")),
        FieldDef::new("NoMaterial", TypeDef::Boolean),
    ]
}

fn item_grouping_groups_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new("GroupID", TypeDef::Str),
        FieldDef::new("Items", TypeDef::array_of(TypeDef::table_ref("Items"))),
    ]
}

fn containers_sprites_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new("SpriteID", TypeDef::sprite_id()),
        FieldDef::new("Offset", TypeDef::Str),
        FieldDef::new("Type", TypeDef::Str),
        FieldDef::new("MaterialItem", TypeDef::Number),
    ]
}

fn container_components_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new("ItemID", TypeDef::table_ref("Items")),
        FieldDef::new("Type", TypeDef::Str),
    ]
}

fn container_test_tile_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new("Offset", TypeDef::Str),
        FieldDef::new("Construction", TypeDef::Boolean),
        FieldDef::new("Stockpile", TypeDef::Boolean),
        FieldDef::new("Job", TypeDef::Boolean),
    ]
}

fn build() -> SchemaRegistry {
    let tables: Vec<(&str, Vec<FieldDef>)> = vec![
        (
            "BaseSprites",
            vec![
                FieldDef::new("ID", TypeDef::Str),
                FieldDef::new("SourceRectangle", TypeDef::Str),
            ],
        ),
        ("Attributes", vec![FieldDef::new("ID", TypeDef::Str)]),
        (
            "Skills",
            vec![
                FieldDef::new("ID", TypeDef::Str),
                FieldDef::new("RequiredToolItemID", TypeDef::table_ref("Items")),
            ],
        ),
        (
            "SkillGroups",
            vec![
                FieldDef::new("ID", TypeDef::Str),
                FieldDef::new("Text", TypeDef::Str),
                FieldDef::new("Position", TypeDef::Number),
                FieldDef::new("Color", TypeDef::Color { hex: false }),
                FieldDef::new("SkillID", TypeDef::array_of(TypeDef::table_ref("Skills"))),
            ],
        ),
        (
            "Needs",
            vec![
                FieldDef::new("ID", TypeDef::Str),
                FieldDef::new("Max", TypeDef::Number),
                FieldDef::new("BarColor", TypeDef::Color { hex: true }),
                FieldDef::new("DecayPerMinute", TypeDef::Number),
                FieldDef::new("GainFromSleep", TypeDef::Number),
                FieldDef::new("States", TypeDef::NestedTable(needs_states_fields())),
            ],
        ),
        (
            "Names",
            vec![
                FieldDef::new("ID", TypeDef::Str),
                FieldDef::new("Names", TypeDef::array_of(TypeDef::Str)),
            ],
        ),
        (
            "Animals",
            vec![
                FieldDef::new("ID", TypeDef::Str),
                FieldDef::new("AllowInWild", TypeDef::Boolean),
                FieldDef::new("SpriteID", TypeDef::sprite_id()),
                FieldDef::new("Behavior", TypeDef::Str),
                FieldDef::new("Speed", TypeDef::Number),
                FieldDef::new("HungerPerTick", TypeDef::Number),
                FieldDef::new("EatTime", TypeDef::Number),
            ],
        ),
        (
            "Plants",
            vec![
                FieldDef::new("ID", TypeDef::Str),
                FieldDef::new("Material", TypeDef::Str),
                FieldDef::new("Type", TypeDef::Str),
                FieldDef::new("AllowInWild", TypeDef::Boolean),
                FieldDef::new("States", TypeDef::NestedTable(plants_states_fields())),
                FieldDef::new("OnHarvest", TypeDef::NestedObject(plants_on_harvest_fields())),
                FieldDef::new("SeedItemID", TypeDef::Str),
                FieldDef::new("GrowTimeMin", TypeDef::Number),
                FieldDef::new("GrowTimeMax", TypeDef::Number),
                FieldDef::new("LosesFruitInSeason", TypeDef::table_ref("Seasons")),
                FieldDef::new(
                    "GrowsInSeason",
                    TypeDef::array_of(TypeDef::table_ref("Seasons")),
                ),
                FieldDef::new("GrowsIn", TypeDef::Str),
                FieldDef::new("IsKilledInSeason", TypeDef::table_ref("Seasons")),
                FieldDef::new("ToolButtonSprite", TypeDef::Str),
                FieldDef::new("OnFell", TypeDef::NestedObject(plants_on_fell_fields())),
                FieldDef::new("FruitItemID", TypeDef::table_ref("Items")),
                FieldDef::new("NumFruitsPerSeason", TypeDef::Number),
            ],
        ),
        (
            "TreeLayouts",
            vec![
                FieldDef::new("ID", TypeDef::Str),
                FieldDef::new("Layout", TypeDef::NestedTable(tree_layout_fields())),
            ],
        ),
        (
            "Actions",
            vec![
                FieldDef::new("ID", TypeDef::Str),
                FieldDef::new("Job", TypeDef::Str),
                FieldDef::new("ConstructionType", TypeDef::Str),
                FieldDef::new("Multi", TypeDef::Boolean),
                FieldDef::new("MultiZ", TypeDef::Boolean),
                FieldDef::new("Rotate", TypeDef::Boolean),
                FieldDef::new("Floor", TypeDef::Boolean),
                FieldDef::new(
                    "SpriteID",
                    TypeDef::OneOf(vec![
                        OneOfVariant::new(Some(Detector::IsString), TypeDef::sprite_id()),
                        OneOfVariant::new(None, TypeDef::NestedTable(action_sprite_id_fields())),
                    ]),
                ),
                FieldDef::new("TestTile", TypeDef::NestedTable(action_test_tile_fields())),
                FieldDef::new("ConstructionSelect", TypeDef::Boolean),
            ],
        ),
        (
            "Constructions",
            vec![
                FieldDef::new("ID", TypeDef::Str),
                FieldDef::new("Type", TypeDef::Str),
                FieldDef::new("Sprites", TypeDef::NestedTable(constructions_sprites_fields())),
                FieldDef::new("Rotation", TypeDef::Boolean),
                FieldDef::new(
                    "Components",
                    TypeDef::NestedTable(construction_components_fields()),
                ),
                FieldDef::new(
                    "IntermediateSprites",
                    TypeDef::NestedTable(constructions_intermediate_sprites_fields()),
                ),
            ],
        ),
        ("ConstructionTypes", vec![FieldDef::new("ID", TypeDef::Str)]),
        (
            "Crafts",
            vec![
                FieldDef::new("ID", TypeDef::Str),
                FieldDef::new("ItemID", TypeDef::table_ref("Items")),
                FieldDef::new("SkillID", TypeDef::table_ref("Skills")),
                FieldDef::new("ProductionTime", TypeDef::Number),
                FieldDef::new("AttributeUsed", TypeDef::array_or_single(TypeDef::Str)),
                FieldDef::new("ConversionMaterial", TypeDef::Str),
                FieldDef::new("Components", TypeDef::NestedTable(crafts_components_fields())),
                FieldDef::new("TechGain", TypeDef::NestedObject(crafts_tech_gain_fields())),
                FieldDef::new("SkillGain", TypeDef::NestedObject(crafts_skill_gain_fields())),
                FieldDef::new("Prereqs", TypeDef::NestedTable(crafts_prereqs_fields())),
                FieldDef::new("Amount", TypeDef::Number),
                FieldDef::new("BlueprintID", TypeDef::Str),
                FieldDef::new("MaterialItems", TypeDef::array_of(TypeDef::Number)),
                FieldDef::new("AllowedMaterialType", TypeDef::array_of(TypeDef::Str)),
                FieldDef::new("AllowedMaterial", TypeDef::array_of(TypeDef::Str)),
            ],
        ),
        (
            "Jobs",
            vec![
                FieldDef::new("ID", TypeDef::Str),
                FieldDef::new("SkillID", TypeDef::table_ref("Skills")),
                FieldDef::new(
                    "WorkPosition",
                    TypeDef::array_of(TypeDef::array_of(TypeDef::Number)),
                ),
                FieldDef::new("Tasks", TypeDef::NestedTable(jobs_tasks_fields())),
                FieldDef::new("RequiredToolItemID", TypeDef::table_ref("Items")),
                FieldDef::new("RequiredToolLevel", TypeDef::Str),
                FieldDef::new("Ticks", TypeDef::Number),
                FieldDef::new("SpriteID", TypeDef::NestedTable(jobs_sprite_id_fields())),
                FieldDef::new("SkillGain", TypeDef::Str),
                FieldDef::new("TechGain", TypeDef::Str),
                FieldDef::new("ConstructionType", TypeDef::Str),
                FieldDef::new(
                    "Staging",
                    TypeDef::array_of(TypeDef::array_of(TypeDef::Number)),
                ),
            ],
        ),
        (
            "Workshops",
            vec![
                FieldDef::new("ID", TypeDef::Str),
                FieldDef::new("Size", TypeDef::Str),
                FieldDef::new("InputTile", TypeDef::Str),
                FieldDef::new("OutputTile", TypeDef::Str),
                FieldDef::new("Crafts", TypeDef::array_of(TypeDef::table_ref("Items"))),
                FieldDef::new(
                    "Components",
                    TypeDef::NestedTable(workshops_components_fields()),
                ),
                FieldDef::new("SpecialGui", TypeDef::Str),
            ],
        ),
        (
            "Items",
            vec![
                FieldDef::new("ID", TypeDef::Str),
                FieldDef::new("Value", TypeDef::Number),
                FieldDef::new("HasQuality", TypeDef::Boolean),
                FieldDef::new("SpriteID", TypeDef::sprite_id()),
                FieldDef::new("StackSize", TypeDef::Number),
                FieldDef::new("LightIntensity", TypeDef::Number),
                FieldDef::new("DrinkValue", TypeDef::Number),
                FieldDef::new("Components", TypeDef::NestedTable(items_components_fields())),
                FieldDef::new("IsContainer", TypeDef::Boolean),
                FieldDef::new("IsTool", TypeDef::Boolean),
                FieldDef::new("Nutrition", TypeDef::Number),
            ],
        ),
        ("Furniture", vec![FieldDef::new("ID", TypeDef::Str)]),
        ("Doors", vec![FieldDef::new("ID", TypeDef::Str)]),
        (
            "ItemGrouping",
            vec![
                FieldDef::new("ID", TypeDef::Str),
                FieldDef::new("Color", TypeDef::Color { hex: false }),
                FieldDef::new("ClassID", TypeDef::Str),
                FieldDef::new("Groups", TypeDef::NestedTable(item_grouping_groups_fields())),
            ],
        ),
        (
            "Materials",
            vec![
                FieldDef::new("ID", TypeDef::Str),
                FieldDef::new("Name", TypeDef::Str),
                FieldDef::new("Type", TypeDef::Str),
                FieldDef::new("Color", TypeDef::Color { hex: false }),
                FieldDef::new("Value", TypeDef::Number),
                FieldDef::new("Strength", TypeDef::Number),
                FieldDef::new("GroupName", TypeDef::Str),
            ],
        ),
        (
            "TerrainMaterials",
            vec![
                FieldDef::new("ID", TypeDef::Str),
                FieldDef::new("Type", TypeDef::Str),
                FieldDef::new("Highest", TypeDef::Number),
                FieldDef::new("Lowest", TypeDef::Number),
                FieldDef::new("RequiredToolLevel", TypeDef::Number),
                FieldDef::new("WallSprite", TypeDef::sprite_id()),
                FieldDef::new("FloorSprite", TypeDef::sprite_id()),
                FieldDef::new("ShortWallSprite", TypeDef::sprite_id()),
            ],
        ),
        (
            "EmbeddedMaterials",
            vec![
                FieldDef::new("ID", TypeDef::Str),
                FieldDef::new("Type", TypeDef::Str),
                FieldDef::new("Highest", TypeDef::Number),
                FieldDef::new("Lowest", TypeDef::Number),
                FieldDef::new("WallSprite", TypeDef::sprite_id()),
                FieldDef::new("RequiredToolLevel", TypeDef::Number),
            ],
        ),
        (
            "MaterialToToolLevel",
            vec![
                FieldDef::new("ID", TypeDef::Str),
                FieldDef::new("RequiredToolLevel", TypeDef::Number),
                FieldDef::new("ToolLevel", TypeDef::Number),
            ],
        ),
        (
            "Containers",
            vec![
                FieldDef::new("ID", TypeDef::Str),
                FieldDef::new("Type", TypeDef::Str),
                FieldDef::new("Buildable", TypeDef::Boolean),
                FieldDef::new("Capacity", TypeDef::Number),
                FieldDef::new("RequireSame", TypeDef::Boolean),
                FieldDef::new("Sprites", TypeDef::NestedTable(containers_sprites_fields())),
                FieldDef::new(
                    "Components",
                    TypeDef::NestedTable(container_components_fields()),
                ),
                FieldDef::new("TestTile", TypeDef::NestedTable(container_test_tile_fields())),
                FieldDef::new(
                    "AllowedItems",
                    TypeDef::array_of(TypeDef::table_ref("Items")),
                ),
            ],
        ),
        ("Tech", vec![FieldDef::new("ID", TypeDef::Str)]),
        (
            "Seasons",
            vec![
                FieldDef::new("ID", TypeDef::Str),
                FieldDef::new("NextSeason", TypeDef::table_ref("Seasons")),
                FieldDef::new("NumDays", TypeDef::Number),
                FieldDef::new("SunRiseFirst", TypeDef::Str),
                FieldDef::new("SunsetFirst", TypeDef::Str),
            ],
        ),
        (
            "Time",
            vec![
                FieldDef::new("ID", TypeDef::Str),
                FieldDef::new("Value", TypeDef::Number),
            ],
        ),
    ];

    SchemaRegistry {
        tables: tables
            .into_iter()
            .map(|(name, fields)| (name.to_string(), fields))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registry_table_set() {
        let reg = registry();
        assert_eq!(reg.len(), 27);
        assert!(reg.contains("BaseSprites"));
        assert!(reg.contains("Needs"));
        assert!(reg.contains("Time"));
        assert!(!reg.contains("needs"));
        assert!(reg.get("Nope").is_none());
    }

    #[test]
    fn test_table_names_in_declared_order() {
        let names: Vec<&str> = registry().table_names().collect();
        assert_eq!(names[0], "BaseSprites");
        assert_eq!(names[1], "Attributes");
        assert_eq!(*names.last().unwrap(), "Time");
    }

    #[test]
    fn test_needs_states_are_doubly_nested() {
        let fields = registry().get("Needs").unwrap();
        let states = fields.iter().find(|f| f.name == "States").unwrap();
        let inner = match &states.ty {
            TypeDef::NestedTable(inner) => inner,
            other => panic!("expected nested table, got {:?}", other),
        };
        let modifiers = inner.iter().find(|f| f.name == "Modifiers").unwrap();
        assert!(matches!(modifiers.ty, TypeDef::NestedTable(_)));
    }

    #[test]
    fn test_actions_sprite_id_union() {
        let fields = registry().get("Actions").unwrap();
        let sprite_id = fields.iter().find(|f| f.name == "SpriteID").unwrap();
        // String form and nested-table form both validate
        assert!(sprite_id.ty.validate(&json!("DigWall")));
        assert!(sprite_id
            .ty
            .validate(&json!([{"SpriteID": "DigWall", "Rotate": true}])));
        assert!(!sprite_id.ty.validate(&json!(42)));
    }

    #[test]
    fn test_crafts_attribute_used_accepts_bare_scalar() {
        let fields = registry().get("Crafts").unwrap();
        let attr = fields.iter().find(|f| f.name == "AttributeUsed").unwrap();
        assert!(attr.ty.validate(&json!("Strength")));
        assert!(attr.ty.validate(&json!(["Strength", "Agility"])));
    }

    #[test]
    fn test_thought_bubble_status_transform() {
        let fields = registry().get("Needs").unwrap();
        let states = match &fields.iter().find(|f| f.name == "States").unwrap().ty {
            TypeDef::NestedTable(inner) => inner,
            other => panic!("expected nested table, got {:?}", other),
        };
        let bubble = states.iter().find(|f| f.name == "ThoughtBubble").unwrap();
        assert_eq!(
            bubble.ty,
            TypeDef::SpriteId {
                transform: Some(SpriteIdTransform::StatusPrefix)
            }
        );
    }

    #[test]
    fn test_test_tile_choices() {
        let fields = registry().get("Actions").unwrap();
        let test_tile = fields.iter().find(|f| f.name == "TestTile").unwrap();
        assert!(test_tile
            .ty
            .validate(&json!([{"Required": ["Floor", "AnyWall"]}])));
        // Items inside a well-formed array are not re-checked at this level,
        // but a bare non-array is rejected
        assert!(!test_tile.ty.validate(&json!("Floor")));
    }
}
