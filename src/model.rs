//! Canonical metadata record, partial updates, and request/result shapes.
//!
//! [`Metadata`] is the merged view of a document's Info dictionary and XMP
//! packet. An empty string means "absent". [`MetadataPatch`] keeps the
//! present/absent distinction per field: `Some("")` clears a value through a
//! patch, `None` leaves it alone.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A supported metadata key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Field {
    /// Document title
    #[serde(rename = "title")]
    Title,
    /// Document author
    #[serde(rename = "author")]
    Author,
    /// Document subject / description
    #[serde(rename = "subject")]
    Subject,
    /// Keywords
    #[serde(rename = "keywords")]
    Keywords,
    /// Creating application
    #[serde(rename = "creator")]
    Creator,
    /// Producing library
    #[serde(rename = "producer")]
    Producer,
    /// Creation timestamp
    #[serde(rename = "creation-date")]
    CreationDate,
    /// Last modification timestamp
    #[serde(rename = "mod-date")]
    ModDate,
}

/// Canonical field ordering used by validation and output.
pub const ALL_FIELDS: [Field; 8] = [
    Field::Title,
    Field::Author,
    Field::Subject,
    Field::Keywords,
    Field::Creator,
    Field::Producer,
    Field::CreationDate,
    Field::ModDate,
];

impl Field {
    /// Identifier used on the command line and in manifests.
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Author => "author",
            Field::Subject => "subject",
            Field::Keywords => "keywords",
            Field::Creator => "creator",
            Field::Producer => "producer",
            Field::CreationDate => "creation-date",
            Field::ModDate => "mod-date",
        }
    }

    /// Key of this field in a PDF Info dictionary.
    pub fn info_key(self) -> &'static str {
        match self {
            Field::Title => "Title",
            Field::Author => "Author",
            Field::Subject => "Subject",
            Field::Keywords => "Keywords",
            Field::Creator => "Creator",
            Field::Producer => "Producer",
            Field::CreationDate => "CreationDate",
            Field::ModDate => "ModDate",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no known field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown field {0:?}")]
pub struct UnknownField(pub String);

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ALL_FIELDS
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| UnknownField(s.to_string()))
    }
}

/// The canonical metadata record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Metadata {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub author: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub subject: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub keywords: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub creator: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub producer: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub creation_date: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub mod_date: String,
}

impl Metadata {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a field.
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title,
            Field::Author => &self.author,
            Field::Subject => &self.subject,
            Field::Keywords => &self.keywords,
            Field::Creator => &self.creator,
            Field::Producer => &self.producer,
            Field::CreationDate => &self.creation_date,
            Field::ModDate => &self.mod_date,
        }
    }

    /// Mutable access to a field.
    pub fn get_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Title => &mut self.title,
            Field::Author => &mut self.author,
            Field::Subject => &mut self.subject,
            Field::Keywords => &mut self.keywords,
            Field::Creator => &mut self.creator,
            Field::Producer => &mut self.producer,
            Field::CreationDate => &mut self.creation_date,
            Field::ModDate => &mut self.mod_date,
        }
    }

    /// Replace a field.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        *self.get_mut(field) = value.into();
    }

    /// Builder-style setter.
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// True when every field is empty.
    pub fn is_empty(&self) -> bool {
        ALL_FIELDS.iter().all(|f| self.get(*f).is_empty())
    }

    /// Fill empty fields of `self` from `fallback`.
    pub fn merged_with(mut self, fallback: &Metadata) -> Self {
        for field in ALL_FIELDS {
            if self.get(field).is_empty() {
                self.set(field, fallback.get(field));
            }
        }
        self
    }
}

/// A partial update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MetadataPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mod_date: Option<String>,
}

impl MetadataPatch {
    /// Create an empty patch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch entry for a field.
    pub fn get(&self, field: Field) -> Option<&str> {
        self.slot(field).as_deref()
    }

    /// Mutable patch entry for a field.
    pub fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Title => &mut self.title,
            Field::Author => &mut self.author,
            Field::Subject => &mut self.subject,
            Field::Keywords => &mut self.keywords,
            Field::Creator => &mut self.creator,
            Field::Producer => &mut self.producer,
            Field::CreationDate => &mut self.creation_date,
            Field::ModDate => &mut self.mod_date,
        }
    }

    fn slot(&self, field: Field) -> &Option<String> {
        match field {
            Field::Title => &self.title,
            Field::Author => &self.author,
            Field::Subject => &self.subject,
            Field::Keywords => &self.keywords,
            Field::Creator => &self.creator,
            Field::Producer => &self.producer,
            Field::CreationDate => &self.creation_date,
            Field::ModDate => &self.mod_date,
        }
    }

    /// Builder-style setter marking a field present.
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        *self.slot_mut(field) = Some(value.into());
        self
    }

    /// True when at least one field is present.
    pub fn has_any(&self) -> bool {
        ALL_FIELDS.iter().any(|f| self.slot(*f).is_some())
    }
}

/// Apply a patch: every present entry (including `""`) overwrites `cur`.
pub fn apply_patch(mut cur: Metadata, patch: &MetadataPatch) -> Metadata {
    for field in ALL_FIELDS {
        if let Some(value) = patch.get(field) {
            cur.set(field, value);
        }
    }
    cur
}

/// Clear the named fields, or everything when `all` is set.
pub fn apply_unset(mut cur: Metadata, fields: &[Field], all: bool) -> Metadata {
    if all {
        return Metadata::default();
    }
    for field in fields {
        cur.get_mut(*field).clear();
    }
    cur
}

/// Where a write reads from and writes to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IoOptions {
    pub input_path: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub output_path: String,
    pub in_place: bool,
}

impl IoOptions {
    /// Write `input` to `output`.
    pub fn to_output(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input_path: input.into(),
            output_path: output.into(),
            in_place: false,
        }
    }

    /// Rewrite `input` in place.
    pub fn in_place(input: impl Into<String>) -> Self {
        Self {
            input_path: input.into(),
            output_path: String::new(),
            in_place: true,
        }
    }

    /// Path the result ends up at.
    pub fn effective_output_path(&self) -> &str {
        if self.in_place || self.output_path.is_empty() {
            &self.input_path
        } else {
            &self.output_path
        }
    }
}

/// Execution flags shared by write requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecOptions {
    pub strict: bool,
    pub json: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShowRequest {
    pub input_path: String,
    pub json: bool,
}

/// Outcome of a read or a write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShowResult {
    pub input_path: String,
    pub encrypted: bool,
    pub metadata: Metadata,
    pub info_found: bool,
    pub xmp_found: bool,
    pub normalized: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetRequest {
    pub io: IoOptions,
    pub exec: ExecOptions,
    pub changes: MetadataPatch,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnsetRequest {
    pub io: IoOptions,
    pub exec: ExecOptions,
    pub fields: Vec<Field>,
    pub all: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateSaveRequest {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub note: String,
    pub force: bool,
    pub metadata: MetadataPatch,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateApplyRequest {
    pub name: String,
    pub io: IoOptions,
    pub exec: ExecOptions,
}

/// A named, persisted metadata patch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateRecord {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub note: String,
    pub metadata: MetadataPatch,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchRequest {
    pub manifest_path: String,
    pub continue_on_error: bool,
    pub strict: bool,
    pub json: bool,
}

/// Per-item batch status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Ok,
    Error,
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemStatus::Ok => f.write_str("ok"),
            ItemStatus::Error => f.write_str("error"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchItemResult {
    pub input_path: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub output_path: String,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchResult {
    pub items: Vec<BatchItemResult>,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// What a metadata store reports after a read or a write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadResult {
    pub encrypted: bool,
    pub metadata: Metadata,
    pub info_found: bool,
    pub xmp_found: bool,
    pub normalized: bool,
}

/// Low-level write request handed to a metadata store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataWriteRequest {
    pub input_path: String,
    pub output_path: String,
    pub in_place: bool,
    pub strict: bool,
    pub set: MetadataPatch,
    pub unset: Vec<Field>,
    pub unset_all: bool,
}
