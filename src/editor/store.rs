use crate::cancel::CancelToken;
use crate::config::DEFAULT_FILE_MODE;
use crate::document::Document;
use crate::error::{Error, ErrorCode, Result};
use crate::extractors::read_native_metadata;
use crate::filesafe;
use crate::model::{apply_patch, apply_unset, MetadataWriteRequest, ReadResult};
use crate::writer::{write_incremental, XmpWriter};

/// Reads and writes native PDF metadata.
pub trait MetadataStore {
    /// Read the merged Info/XMP metadata of a file.
    fn read(&self, cancel: &CancelToken, input_path: &str) -> Result<ReadResult>;

    /// Apply a patch and field removals, writing the result as an
    /// incremental update.
    fn write(&self, cancel: &CancelToken, req: &MetadataWriteRequest) -> Result<ReadResult>;
}

/// [`MetadataStore`] backed by the file system.
#[derive(Debug, Clone)]
pub struct PdfMetadataStore {
    file_mode: u32,
}

impl Default for PdfMetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfMetadataStore {
    /// Create a store writing files with mode 0o644.
    pub fn new() -> Self {
        Self {
            file_mode: DEFAULT_FILE_MODE,
        }
    }

    /// Permission bits for written files.
    pub fn with_file_mode(mut self, mode: u32) -> Self {
        self.file_mode = mode;
        self
    }
}

impl MetadataStore for PdfMetadataStore {
    fn read(&self, cancel: &CancelToken, input_path: &str) -> Result<ReadResult> {
        cancel.check()?;
        let doc = Document::open(input_path)?;
        let native = read_native_metadata(doc.bytes());
        Ok(ReadResult {
            encrypted: doc.is_encrypted(),
            metadata: native.metadata,
            info_found: native.info_found,
            xmp_found: native.xmp_found,
            normalized: false,
        })
    }

    fn write(&self, cancel: &CancelToken, req: &MetadataWriteRequest) -> Result<ReadResult> {
        cancel.check()?;
        if req.input_path.is_empty() {
            return Err(Error::validation("input path is required"));
        }
        let dst = write_target(req)?;

        let doc = Document::open(&req.input_path)?;
        if doc.is_encrypted() {
            return Err(Error::new(ErrorCode::PdfEncrypted, "cannot write encrypted pdf"));
        }

        let current = read_native_metadata(doc.bytes()).metadata;
        let next = apply_unset(apply_patch(current, &req.set), &req.unset, req.unset_all);

        let packet = XmpWriter::new(&next).build_bytes();
        let updated = write_incremental(doc.bytes(), &next, &packet)?;

        filesafe::write_atomic(dst, &updated, self.file_mode)
            .map_err(|e| Error::with_cause(ErrorCode::Io, format!("write {:?}", dst), e))?;
        log::info!("wrote metadata update to {} ({} bytes)", dst, updated.len());

        Ok(ReadResult {
            encrypted: false,
            metadata: next,
            info_found: true,
            xmp_found: true,
            normalized: false,
        })
    }
}

fn write_target(req: &MetadataWriteRequest) -> Result<&str> {
    if req.in_place {
        return Ok(&req.input_path);
    }
    if req.output_path.is_empty() {
        return Err(Error::validation(
            "output path is required when not writing in place",
        ));
    }
    Ok(&req.output_path)
}
