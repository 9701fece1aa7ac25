//! Field type descriptors - the polymorphic capability set behind every
//! schema column
//!
//! Each descriptor knows how to validate a stored value, deep-copy it, and
//! describe it for display or editing. Rendering stays data-only here: the
//! [`Rendered`] and [`Widget`] types say which widget kind applies and what
//! data it receives, never how it draws.

use serde_json::{Map, Value};

/// Reserved record key carrying the owning file name. Injected by the data
/// source on select, allowed on any record, never part of a schema.
pub const FILENAME_KEY: &str = "_filename";

/// One schema column: a field name paired with its type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeDef,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: TypeDef) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Value predicate used to pick a [`TypeDef::OneOf`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detector {
    IsString,
    IsNumber,
    IsBool,
    IsArray,
    IsObject,
}

impl Detector {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Detector::IsString => value.is_string(),
            Detector::IsNumber => value.is_number(),
            Detector::IsBool => value.is_boolean(),
            Detector::IsArray => value.is_array(),
            Detector::IsObject => value.is_object(),
        }
    }
}

/// One alternative of a [`TypeDef::OneOf`] union, tried in declared order.
#[derive(Debug, Clone, PartialEq)]
pub struct OneOfVariant {
    /// `None` matches any value
    pub detector: Option<Detector>,
    pub def: TypeDef,
}

impl OneOfVariant {
    pub fn new(detector: Option<Detector>, def: TypeDef) -> Self {
        Self { detector, def }
    }

    fn accepts(&self, value: &Value) -> bool {
        self.detector.map(|d| d.matches(value)).unwrap_or(true)
    }
}

/// Deterministic rewrite applied to a sprite id before catalog lookup.
///
/// The rewrite is a pure string operation; lookup sites fall back to the
/// untransformed id when the rewritten one is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpriteIdTransform {
    /// Prepend `Status`, used by need-state thought bubbles
    StatusPrefix,
}

impl SpriteIdTransform {
    pub fn apply(&self, id: &str) -> String {
        match self {
            SpriteIdTransform::StatusPrefix => format!("Status{}", id),
        }
    }
}

/// The closed set of field types a schema column can declare.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDef {
    Str,
    /// Numeric field; content files store some numerics as strings, so
    /// validation accepts both forms
    Number,
    Boolean,
    /// String constrained to an enumerated set
    StringChoice(Vec<String>),
    /// Color in either wire encoding; `hex` selects the editor widget
    Color { hex: bool },
    /// Foreign key into another table, validated only as "is a string"
    TableRef(String),
    /// Embedded array of sub-records with their own schema
    NestedTable(Vec<FieldDef>),
    /// Zero-or-one sub-record, stored ungrouped
    NestedObject(Vec<FieldDef>),
    /// Uniform sequence; with `plain_single` a bare scalar is accepted as
    /// a one-element sequence
    ArrayOf {
        item: Box<TypeDef>,
        plain_single: bool,
    },
    /// Sprite or base-sprite id
    SpriteId {
        transform: Option<SpriteIdTransform>,
    },
    /// Tagged union resolved by running detectors in order; first match wins
    OneOf(Vec<OneOfVariant>),
    /// Free-form JSON escape hatch, edited as raw text
    CustomObject,
}

impl TypeDef {
    pub fn choice<I, S>(values: I) -> TypeDef
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TypeDef::StringChoice(values.into_iter().map(Into::into).collect())
    }

    pub fn table_ref(table: impl Into<String>) -> TypeDef {
        TypeDef::TableRef(table.into())
    }

    pub fn array_of(item: TypeDef) -> TypeDef {
        TypeDef::ArrayOf {
            item: Box::new(item),
            plain_single: false,
        }
    }

    /// Array that also accepts a bare scalar as a one-element sequence.
    pub fn array_or_single(item: TypeDef) -> TypeDef {
        TypeDef::ArrayOf {
            item: Box::new(item),
            plain_single: true,
        }
    }

    pub fn sprite_id() -> TypeDef {
        TypeDef::SpriteId { transform: None }
    }

    /// Check a stored value against this descriptor. Total: never errors,
    /// returns false on any mismatch.
    pub fn validate(&self, value: &Value) -> bool {
        match self {
            TypeDef::Str => value.is_string(),
            TypeDef::Number => value.is_number() || value.is_string(),
            TypeDef::Boolean => value.is_boolean(),
            TypeDef::StringChoice(values) => match value.as_str() {
                Some(s) => values.iter().any(|v| v == s),
                None => false,
            },
            TypeDef::Color { .. } => value.is_string(),
            TypeDef::TableRef(_) => value.is_string(),
            TypeDef::NestedTable(fields) => match value.as_array() {
                Some(rows) => rows.iter().all(|row| record_fields_valid(row, fields)),
                None => false,
            },
            TypeDef::NestedObject(fields) => match value {
                Value::Null => true,
                other => record_fields_valid(other, fields),
            },
            TypeDef::ArrayOf { item, plain_single } => {
                value.is_array() || (*plain_single && item.validate(value))
            }
            TypeDef::SpriteId { .. } => value.is_string(),
            TypeDef::OneOf(variants) => variants
                .iter()
                .any(|v| v.accepts(value) && v.def.validate(value)),
            TypeDef::CustomObject => value.is_object(),
        }
    }

    /// Produce a fresh value fully detached from the source record.
    ///
    /// Nested records are filtered down to their schema's fields; arrays
    /// with `plain_single` keep bare scalars bare. A `OneOf` value no
    /// variant matches is returned unchanged.
    pub fn copy(&self, value: &Value) -> Value {
        match self {
            TypeDef::Str
            | TypeDef::Number
            | TypeDef::Boolean
            | TypeDef::StringChoice(_)
            | TypeDef::Color { .. }
            | TypeDef::TableRef(_)
            | TypeDef::SpriteId { .. }
            | TypeDef::CustomObject => value.clone(),
            TypeDef::NestedTable(fields) => match value.as_array() {
                Some(rows) => Value::Array(copy_table(rows, fields)),
                None => value.clone(),
            },
            TypeDef::NestedObject(fields) => copy_record(value, fields),
            TypeDef::ArrayOf { item, plain_single } => match value {
                Value::Array(items) => {
                    Value::Array(items.iter().map(|v| item.copy(v)).collect())
                }
                bare if *plain_single => item.copy(bare),
                other => other.clone(),
            },
            TypeDef::OneOf(variants) => {
                for variant in variants {
                    if variant.accepts(value) {
                        return variant.def.copy(value);
                    }
                }
                value.clone()
            }
        }
    }

    /// Describe a stored value for display.
    pub fn render_value(&self, value: &Value) -> Rendered {
        match self {
            TypeDef::Str | TypeDef::StringChoice(_) => match value.as_str() {
                Some(s) => Rendered::Text(s.to_string()),
                None => Rendered::Empty,
            },
            TypeDef::Number => match value {
                Value::Number(n) => Rendered::Text(n.to_string()),
                Value::String(s) => Rendered::Text(s.clone()),
                _ => Rendered::Empty,
            },
            TypeDef::Boolean => match value.as_bool() {
                Some(b) => Rendered::Text(b.to_string()),
                None => Rendered::Empty,
            },
            TypeDef::Color { .. } => match value.as_str() {
                Some(s) => Rendered::Swatch(s.to_string()),
                None => Rendered::Empty,
            },
            TypeDef::TableRef(table) => match value.as_str() {
                Some(id) => Rendered::TableRef {
                    table: table.clone(),
                    id: id.to_string(),
                },
                None => Rendered::Empty,
            },
            TypeDef::NestedTable(fields) => match value.as_array() {
                Some(rows) => Rendered::Rows {
                    fields: fields.clone(),
                    rows: rows.clone(),
                },
                None => Rendered::Empty,
            },
            TypeDef::NestedObject(fields) => match value {
                Value::Null => Rendered::Empty,
                record => Rendered::Rows {
                    fields: fields.clone(),
                    rows: vec![record.clone()],
                },
            },
            TypeDef::ArrayOf { item, plain_single } => match value {
                Value::Array(items) => {
                    Rendered::List(items.iter().map(|v| item.render_value(v)).collect())
                }
                bare if *plain_single => Rendered::List(vec![item.render_value(bare)]),
                _ => Rendered::Empty,
            },
            TypeDef::SpriteId { transform } => match value.as_str() {
                Some(id) => Rendered::Sprite {
                    id: id.to_string(),
                    transform: *transform,
                },
                None => Rendered::Empty,
            },
            TypeDef::OneOf(variants) => {
                for variant in variants {
                    if variant.accepts(value) {
                        return variant.def.render_value(value);
                    }
                }
                Rendered::Error
            }
            TypeDef::CustomObject => Rendered::Json(value.to_string()),
        }
    }

    /// Describe the editing widget for a field holding `value`.
    ///
    /// Absent fields are passed as `Value::Null` and yield empty inputs.
    pub fn editor(&self, value: &Value) -> Widget {
        match self {
            TypeDef::Str => Widget::Text {
                value: value.as_str().unwrap_or_default().to_string(),
            },
            TypeDef::Number => Widget::Number {
                value: match value {
                    Value::Number(n) => n.to_string(),
                    Value::String(s) => s.clone(),
                    _ => String::new(),
                },
            },
            TypeDef::Boolean => Widget::Checkbox {
                checked: value.as_bool().unwrap_or(false),
            },
            TypeDef::StringChoice(values) => {
                let selected = value
                    .as_str()
                    .filter(|s| values.iter().any(|v| v == s))
                    .map(String::from);
                Widget::Choice {
                    choices: values.clone(),
                    selected,
                }
            }
            TypeDef::Color { hex } => Widget::Color {
                hex: *hex,
                value: value.as_str().unwrap_or_default().to_string(),
            },
            TypeDef::TableRef(table) => Widget::TableRef {
                table: table.clone(),
                id: value.as_str().unwrap_or_default().to_string(),
            },
            TypeDef::NestedTable(fields) => Widget::Rows {
                fields: fields.clone(),
                rows: value.as_array().cloned().unwrap_or_default(),
            },
            TypeDef::NestedObject(fields) => Widget::Record {
                fields: fields.clone(),
                record: match value {
                    Value::Null => None,
                    other => Some(other.clone()),
                },
            },
            TypeDef::ArrayOf { item, plain_single } => {
                let elements: Vec<Value> = match value {
                    Value::Array(items) => items.clone(),
                    Value::Null => Vec::new(),
                    bare if *plain_single => vec![bare.clone()],
                    _ => Vec::new(),
                };
                Widget::Array {
                    item: item.clone(),
                    items: elements.iter().map(|v| item.editor(v)).collect(),
                    plain_single: *plain_single,
                }
            }
            TypeDef::SpriteId { transform } => Widget::SpriteId {
                id: value.as_str().unwrap_or_default().to_string(),
                transform: *transform,
            },
            TypeDef::OneOf(variants) => {
                for variant in variants {
                    if variant.accepts(value) {
                        return variant.def.editor(value);
                    }
                }
                Widget::Error
            }
            TypeDef::CustomObject => Widget::Json {
                value: value.to_string(),
            },
        }
    }
}

/// Display-ready description of one field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    /// Nothing to show
    Empty,
    Text(String),
    /// Color swatch in either wire encoding
    Swatch(String),
    /// Link into another table
    TableRef { table: String, id: String },
    /// Sprite image resolved through the catalog at display time
    Sprite {
        id: String,
        transform: Option<SpriteIdTransform>,
    },
    /// One entry per array element
    List(Vec<Rendered>),
    /// Nested rows shown as an inline table
    Rows { fields: Vec<FieldDef>, rows: Vec<Value> },
    /// Raw JSON fallback
    Json(String),
    /// No `OneOf` variant matched
    Error,
}

/// Editing widget description for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Widget {
    Text {
        value: String,
    },
    Number {
        value: String,
    },
    Checkbox {
        checked: bool,
    },
    Color {
        hex: bool,
        value: String,
    },
    /// Dropdown over the declared choices plus a leading unset entry,
    /// selected when the stored value is absent or out of set
    Choice {
        choices: Vec<String>,
        selected: Option<String>,
    },
    /// Record picker scoped to the referenced table
    TableRef {
        table: String,
        id: String,
    },
    SpriteId {
        id: String,
        transform: Option<SpriteIdTransform>,
    },
    /// Editable grid of nested rows
    Rows {
        fields: Vec<FieldDef>,
        rows: Vec<Value>,
    },
    /// Editable single nested record, unwrapped on write-back
    Record {
        fields: Vec<FieldDef>,
        record: Option<Value>,
    },
    /// One element editor per current item; `item` drives new-element
    /// creation in the widget layer
    Array {
        item: Box<TypeDef>,
        items: Vec<Widget>,
        plain_single: bool,
    },
    /// Raw JSON text area
    Json {
        value: String,
    },
    /// No `OneOf` variant matched
    Error,
}

/// Whether every key of `record` is either a declared field whose value
/// validates, or the reserved `_filename` string.
fn record_fields_valid(record: &Value, fields: &[FieldDef]) -> bool {
    let map = match record.as_object() {
        Some(map) => map,
        None => return false,
    };
    for (key, value) in map {
        if key == FILENAME_KEY {
            if !value.is_string() {
                return false;
            }
            continue;
        }
        match fields.iter().find(|f| f.name == *key) {
            Some(field) => {
                if !field.ty.validate(value) {
                    return false;
                }
            }
            None => return false,
        }
    }
    true
}

/// Build a fresh record containing only schema-declared fields present on
/// the source, each passed through its descriptor's copy.
///
/// The reserved `_filename` tag is deliberately not carried over.
pub fn copy_record(record: &Value, fields: &[FieldDef]) -> Value {
    match record {
        Value::Null => Value::Null,
        Value::Object(map) => {
            let mut out = Map::new();
            for field in fields {
                if let Some(value) = map.get(&field.name) {
                    out.insert(field.name.clone(), field.ty.copy(value));
                }
            }
            Value::Object(out)
        }
        _ => Value::Object(Map::new()),
    }
}

/// Copy every record of a table. See [`copy_record`].
pub fn copy_table(table: &[Value], fields: &[FieldDef]) -> Vec<Value> {
    table.iter().map(|row| copy_record(row, fields)).collect()
}
