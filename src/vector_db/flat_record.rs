//! Flat, primitive-only encoding of chunk metadata
//!
//! Many vector stores accept only string/number metadata values and have no
//! null. [`encode`] maps [`ChunkMetadata`] onto such a record and [`decode`]
//! inverts it exactly:
//!
//! | metadata            | record                                      |
//! |---------------------|---------------------------------------------|
//! | `line_range`        | `start_line`, `end_line` (integers)         |
//! | `dependencies`      | comma-joined string, `""` for an empty set  |
//! | `parent_name: None` | no `parent_name` key at all                 |
//!
//! `parent_name` is the only key that may be absent.

use crate::error::{CodecError, DecodeError};
use crate::types::{ChunkKind, ChunkMetadata, LineRange};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Record field names
pub mod fields {
    pub const SOURCE_ID: &str = "source_id";
    pub const KIND: &str = "kind";
    pub const NAME: &str = "name";
    pub const START_LINE: &str = "start_line";
    pub const END_LINE: &str = "end_line";
    pub const DEPENDENCIES: &str = "dependencies";
    pub const PARENT_NAME: &str = "parent_name";
}

/// Joins dependency names in the `dependencies` field.
///
/// Safe only while dependency names are Python identifiers, which can never
/// contain a comma. Revisit this if names are ever allowed to be arbitrary
/// strings; [`encode`] rejects any name containing it.
pub const DEPENDENCY_DELIMITER: char = ',';

/// A primitive metadata value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Str(String),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            FieldValue::Int(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(i) => Some(*i),
            FieldValue::Str(_) => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

/// Store-level metadata: a map from field name to primitive value
///
/// Serializes as a plain JSON object, e.g.
/// `{"dependencies":"helper","end_line":3,"kind":"function",...}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl FlatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.fields.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FieldValue::as_str)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(FieldValue::as_int)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Encode metadata as a flat record
///
/// Fails with [`CodecError::SchemaViolation`] when the value has no lossless
/// flat form, instead of truncating or rewriting it.
pub fn encode(metadata: &ChunkMetadata) -> Result<FlatRecord, CodecError> {
    require_non_empty(fields::SOURCE_ID, &metadata.source_id)?;
    require_non_empty(fields::NAME, &metadata.name)?;

    let LineRange { start, end } = metadata.line_range;
    if !metadata.line_range.is_valid() {
        return Err(CodecError::schema_violation(
            "line_range",
            format!("{}..={} is not a 1-based ascending range", start, end),
        ));
    }
    let start_line = line_to_int(fields::START_LINE, start)?;
    let end_line = line_to_int(fields::END_LINE, end)?;

    for dependency in &metadata.dependencies {
        if dependency.is_empty() {
            return Err(CodecError::schema_violation(
                fields::DEPENDENCIES,
                "empty dependency name",
            ));
        }
        if dependency.contains(DEPENDENCY_DELIMITER) {
            return Err(CodecError::schema_violation(
                fields::DEPENDENCIES,
                format!(
                    "'{}' contains the reserved delimiter '{}'",
                    dependency, DEPENDENCY_DELIMITER
                ),
            ));
        }
    }
    let dependencies = metadata
        .dependencies
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(DEPENDENCY_DELIMITER.to_string().as_str());

    let mut record = FlatRecord::new();
    record.insert(fields::SOURCE_ID, metadata.source_id.as_str());
    record.insert(fields::KIND, metadata.kind.as_str());
    record.insert(fields::NAME, metadata.name.as_str());
    record.insert(fields::START_LINE, start_line);
    record.insert(fields::END_LINE, end_line);
    record.insert(fields::DEPENDENCIES, dependencies);

    if let Some(parent) = &metadata.parent_name {
        // An empty parent would read back as a real parent named ""
        require_non_empty(fields::PARENT_NAME, parent)?;
        record.insert(fields::PARENT_NAME, parent.as_str());
    }

    Ok(record)
}

/// Decode a flat record back into metadata
///
/// A missing `parent_name` key means "no parent". Every other field is
/// required. Keys this codec does not know are ignored.
pub fn decode(record: &FlatRecord) -> Result<ChunkMetadata, CodecError> {
    let source_id = required_str(record, fields::SOURCE_ID)?;
    non_empty_value(fields::SOURCE_ID, source_id)?;

    let kind_name = required_str(record, fields::KIND)?;
    let kind =
        ChunkKind::parse(kind_name).ok_or_else(|| DecodeError::UnknownKind(kind_name.to_string()))?;

    let name = required_str(record, fields::NAME)?;
    non_empty_value(fields::NAME, name)?;

    let start = required_int(record, fields::START_LINE)?;
    let end = required_int(record, fields::END_LINE)?;
    if start < 1 || start > end {
        return Err(DecodeError::InvalidLineRange { start, end }.into());
    }
    let line_range = LineRange::new(int_to_line(start, end)?, int_to_line(end, start)?);

    let dependencies = split_dependencies(required_str(record, fields::DEPENDENCIES)?)?;

    let parent_name = match record.get(fields::PARENT_NAME) {
        None => None,
        Some(FieldValue::Str(parent)) => {
            non_empty_value(fields::PARENT_NAME, parent)?;
            Some(parent.clone())
        }
        Some(FieldValue::Int(_)) => {
            return Err(DecodeError::WrongType {
                field: fields::PARENT_NAME.to_string(),
                expected: "a string".to_string(),
            }
            .into());
        }
    };

    Ok(ChunkMetadata {
        source_id: source_id.to_string(),
        kind,
        name: name.to_string(),
        line_range,
        parent_name,
        dependencies,
    })
}

fn split_dependencies(joined: &str) -> Result<BTreeSet<String>, CodecError> {
    let mut dependencies = BTreeSet::new();
    if joined.is_empty() {
        return Ok(dependencies);
    }

    for name in joined.split(DEPENDENCY_DELIMITER) {
        if name.is_empty() {
            return Err(invalid(fields::DEPENDENCIES, format!("empty member in '{}'", joined)));
        }
        if !dependencies.insert(name.to_string()) {
            return Err(invalid(fields::DEPENDENCIES, format!("duplicate member '{}'", name)));
        }
    }
    Ok(dependencies)
}

fn require_non_empty(field: &str, value: &str) -> Result<(), CodecError> {
    if value.is_empty() {
        return Err(CodecError::schema_violation(field, "must not be empty"));
    }
    Ok(())
}

fn line_to_int(field: &str, line: usize) -> Result<i64, CodecError> {
    i64::try_from(line)
        .map_err(|_| CodecError::schema_violation(field, format!("{} does not fit in i64", line)))
}

fn int_to_line(value: i64, other: i64) -> Result<usize, CodecError> {
    usize::try_from(value).map_err(|_| {
        DecodeError::InvalidLineRange {
            start: value.min(other),
            end: value.max(other),
        }
        .into()
    })
}

fn required_str<'a>(record: &'a FlatRecord, field: &str) -> Result<&'a str, CodecError> {
    match record.get(field) {
        Some(FieldValue::Str(value)) => Ok(value),
        Some(FieldValue::Int(_)) => Err(DecodeError::WrongType {
            field: field.to_string(),
            expected: "a string".to_string(),
        }
        .into()),
        None => Err(DecodeError::MissingField(field.to_string()).into()),
    }
}

fn required_int(record: &FlatRecord, field: &str) -> Result<i64, CodecError> {
    match record.get(field) {
        Some(FieldValue::Int(value)) => Ok(*value),
        Some(FieldValue::Str(_)) => Err(DecodeError::WrongType {
            field: field.to_string(),
            expected: "an integer".to_string(),
        }
        .into()),
        None => Err(DecodeError::MissingField(field.to_string()).into()),
    }
}

fn non_empty_value(field: &str, value: &str) -> Result<(), CodecError> {
    if value.is_empty() {
        return Err(invalid(field, "must not be empty"));
    }
    Ok(())
}

fn invalid(field: &str, reason: impl Into<String>) -> CodecError {
    DecodeError::InvalidValue {
        field: field.to_string(),
        reason: reason.into(),
    }
    .into()
}
