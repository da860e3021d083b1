//! Rendering of results and errors for the command line.
//!
//! Text output is line oriented and meant for people. JSON output is
//! pretty-printed with two-space indentation and always ends in a newline.

use crate::error::{Error, ErrorCode, Result};
use crate::model::{BatchResult, ShowResult, TemplateRecord, ALL_FIELDS};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Output rendering strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Text,
    Json,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Text => "text",
            Format::Json => "json",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(Format::Text),
            "json" => Ok(Format::Json),
            other => Err(Error::validation(format!("unknown output format {:?}", other))),
        }
    }
}

/// Format selected by the `--json` toggle.
pub fn parse_format(json: bool) -> Format {
    if json {
        Format::Json
    } else {
        Format::Text
    }
}

/// Renders service responses and errors.
pub trait Formatter {
    fn show(&self, result: &ShowResult) -> Result<Vec<u8>>;
    fn batch(&self, result: &BatchResult) -> Result<Vec<u8>>;
    fn template(&self, record: &TemplateRecord) -> Result<Vec<u8>>;
    fn template_list(&self, records: &[TemplateRecord]) -> Result<Vec<u8>>;
    fn deleted(&self, name: &str) -> Result<Vec<u8>>;
    fn error(&self, err: &Error) -> Result<Vec<u8>>;
}

/// Formatter for `format`.
pub fn formatter(format: Format) -> Box<dyn Formatter> {
    match format {
        Format::Text => Box::new(TextFormatter),
        Format::Json => Box::new(JsonFormatter),
    }
}

/// Human readable output.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFormatter;

fn lines(lines: Vec<String>) -> Vec<u8> {
    let mut out = lines.join("\n");
    out.push('\n');
    out.into_bytes()
}

impl Formatter for TextFormatter {
    fn show(&self, result: &ShowResult) -> Result<Vec<u8>> {
        let mut out = vec![
            format!("Input: {}", result.input_path),
            format!("Encrypted: {}", result.encrypted),
            format!("InfoPresent: {}", result.info_found),
            format!("XMPPresent: {}", result.xmp_found),
            format!("Normalized: {}", result.normalized),
            "Metadata:".to_string(),
        ];
        for field in ALL_FIELDS {
            out.push(format!("  {}: {}", field.info_key(), result.metadata.get(field)));
        }
        Ok(lines(out))
    }

    fn batch(&self, result: &BatchResult) -> Result<Vec<u8>> {
        let mut out = vec![
            format!("Total: {}", result.total),
            format!("Succeeded: {}", result.succeeded),
            format!("Failed: {}", result.failed),
            "Items:".to_string(),
        ];
        for item in &result.items {
            let mut line = format!("  - {} [{}]", item.input_path, item.status);
            if !item.error.is_empty() {
                line.push_str(": ");
                line.push_str(&item.error);
            }
            if !item.output_path.is_empty() {
                line.push_str(" -> ");
                line.push_str(&item.output_path);
            }
            out.push(line);
        }
        Ok(lines(out))
    }

    fn template(&self, record: &TemplateRecord) -> Result<Vec<u8>> {
        let mut out = vec![
            format!("Name: {}", record.name),
            format!("Note: {}", record.note),
            "Metadata:".to_string(),
        ];
        for field in ALL_FIELDS {
            if let Some(value) = record.metadata.get(field) {
                out.push(format!("  {}: {}", field.info_key(), value));
            }
        }
        Ok(lines(out))
    }

    fn template_list(&self, records: &[TemplateRecord]) -> Result<Vec<u8>> {
        if records.is_empty() {
            return Ok(b"No templates found\n".to_vec());
        }
        Ok(lines(
            records
                .iter()
                .map(|r| format!("{}\t{}", r.name, r.note))
                .collect(),
        ))
    }

    fn deleted(&self, name: &str) -> Result<Vec<u8>> {
        Ok(format!("Deleted template {:?}\n", name).into_bytes())
    }

    fn error(&self, err: &Error) -> Result<Vec<u8>> {
        Ok(format!("error[{}]: {}\n", err.code, err).into_bytes())
    }
}

/// Machine readable output.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

#[derive(Serialize)]
struct ErrorPayload<'a> {
    error: String,
    code: &'a str,
}

#[derive(Serialize)]
struct DeletedPayload<'a> {
    deleted: &'a str,
}

fn json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut out = serde_json::to_vec_pretty(value)
        .map_err(|e| Error::with_cause(ErrorCode::Internal, "encode json output", e))?;
    out.push(b'\n');
    Ok(out)
}

impl Formatter for JsonFormatter {
    fn show(&self, result: &ShowResult) -> Result<Vec<u8>> {
        json_bytes(result)
    }

    fn batch(&self, result: &BatchResult) -> Result<Vec<u8>> {
        json_bytes(result)
    }

    fn template(&self, record: &TemplateRecord) -> Result<Vec<u8>> {
        json_bytes(record)
    }

    fn template_list(&self, records: &[TemplateRecord]) -> Result<Vec<u8>> {
        json_bytes(records)
    }

    fn deleted(&self, name: &str) -> Result<Vec<u8>> {
        json_bytes(&DeletedPayload { deleted: name })
    }

    fn error(&self, err: &Error) -> Result<Vec<u8>> {
        json_bytes(&ErrorPayload {
            error: err.to_string(),
            code: err.code.as_str(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BatchItemResult, Field, ItemStatus, Metadata, MetadataPatch};

    fn text(bytes: Result<Vec<u8>>) -> String {
        String::from_utf8(bytes.unwrap()).unwrap()
    }

    #[test]
    fn test_parse_format() {
        assert_eq!(parse_format(false), Format::Text);
        assert_eq!(parse_format(true), Format::Json);
        assert_eq!("json".parse::<Format>().unwrap(), Format::Json);
        assert!("xml".parse::<Format>().is_err());
    }

    #[test]
    fn test_json_show() {
        let result = ShowResult {
            input_path: "in.pdf".into(),
            ..Default::default()
        };
        let out = text(JsonFormatter.show(&result));
        assert!(out.contains(r#""inputPath": "in.pdf""#));
        assert!(out.contains(r#""xmpFound": false"#));
        assert!(out.ends_with("}\n"));
    }

    #[test]
    fn test_text_show() {
        let result = ShowResult {
            input_path: "in.pdf".into(),
            info_found: true,
            metadata: Metadata::new().with(Field::Title, "Hello"),
            ..Default::default()
        };
        let out = text(TextFormatter.show(&result));
        assert!(out.starts_with("Input: in.pdf\nEncrypted: false\nInfoPresent: true\n"));
        assert!(out.contains("\n  Title: Hello\n"));
        assert!(out.ends_with("  ModDate: \n"));
    }

    #[test]
    fn test_text_batch() {
        let result = BatchResult {
            items: vec![
                BatchItemResult {
                    input_path: "a.pdf".into(),
                    output_path: "b.pdf".into(),
                    status: ItemStatus::Ok,
                    error: String::new(),
                },
                BatchItemResult {
                    input_path: "c.pdf".into(),
                    output_path: String::new(),
                    status: ItemStatus::Error,
                    error: "boom".into(),
                },
            ],
            total: 2,
            succeeded: 1,
            failed: 1,
        };
        let out = text(TextFormatter.batch(&result));
        assert_eq!(
            out,
            "Total: 2\nSucceeded: 1\nFailed: 1\nItems:\n  - a.pdf [ok] -> b.pdf\n  - c.pdf [error]: boom\n"
        );
    }

    #[test]
    fn test_text_template() {
        let record = TemplateRecord {
            name: "release".into(),
            note: "v1".into(),
            metadata: MetadataPatch::new()
                .with(Field::Author, "Docs")
                .with(Field::ModDate, ""),
        };
        let out = text(TextFormatter.template(&record));
        assert_eq!(out, "Name: release\nNote: v1\nMetadata:\n  Author: Docs\n  ModDate: \n");
    }

    #[test]
    fn test_template_list() {
        let records = vec![TemplateRecord {
            name: "release".into(),
            note: "v1".into(),
            ..Default::default()
        }];
        assert!(text(TextFormatter.template_list(&records)).contains("release\tv1"));
        assert_eq!(text(TextFormatter.template_list(&[])), "No templates found\n");
        assert_eq!(text(JsonFormatter.template_list(&[])), "[]\n");
    }

    #[test]
    fn test_errors() {
        let err = Error::validation("bad request");
        assert_eq!(text(TextFormatter.error(&err)), "error[validation]: bad request\n");
        let json = text(JsonFormatter.error(&err));
        assert!(json.contains(r#""code": "validation""#));
        assert!(json.contains(r#""error": "bad request""#));
    }

    #[test]
    fn test_deleted() {
        assert_eq!(text(TextFormatter.deleted("release")), "Deleted template \"release\"\n");
        assert!(text(JsonFormatter.deleted("release")).contains(r#""deleted": "release""#));
    }
}
