//! End-to-end tests for the metadata service.

mod common;

use common::{info_pdf, minimal_pdf, write_fixture};
use pdfmeta::editor::PdfMetadataStore;
use pdfmeta::{
    CancelToken, ErrorCode, Field, FileTemplateStore, IoOptions, MetadataPatch, MetadataService,
    Service, SetRequest, ShowRequest, TemplateApplyRequest, TemplateSaveRequest, UnsetRequest,
};
use std::fs;
use tempfile::{tempdir, TempDir};

fn service(dir: &TempDir) -> MetadataService {
    MetadataService::new(
        PdfMetadataStore::new(),
        FileTemplateStore::new(dir.path().join("templates.json")),
    )
}

fn out_path(dir: &TempDir, name: &str) -> String {
    dir.path().join(name).to_string_lossy().into_owned()
}

fn show(svc: &MetadataService, path: &str) -> pdfmeta::ShowResult {
    svc.show(
        &CancelToken::new(),
        &ShowRequest {
            input_path: path.to_string(),
            json: false,
        },
    )
    .unwrap()
}

mod set_and_show {
    use super::*;

    #[test]
    fn test_set_then_show_round_trip() {
        let dir = tempdir().unwrap();
        let svc = service(&dir);
        let input = write_fixture(dir.path(), "min.pdf", &minimal_pdf());
        let output = out_path(&dir, "out.pdf");

        let result = svc
            .set(
                &CancelToken::new(),
                &SetRequest {
                    io: IoOptions::to_output(&input, &output),
                    changes: MetadataPatch::new()
                        .with(Field::Title, "Release Notes")
                        .with(Field::Author, "Doc Bot"),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(result.input_path, output);

        let got = show(&svc, &output);
        assert_eq!(got.metadata.title, "Release Notes");
        assert_eq!(got.metadata.author, "Doc Bot");
        assert!(got.info_found);
        assert!(got.xmp_found);
        assert!(!got.normalized);
    }

    #[test]
    fn test_set_trims_values() {
        let dir = tempdir().unwrap();
        let svc = service(&dir);
        let input = write_fixture(dir.path(), "min.pdf", &minimal_pdf());

        let result = svc
            .set(
                &CancelToken::new(),
                &SetRequest {
                    io: IoOptions::in_place(&input),
                    changes: MetadataPatch::new().with(Field::Subject, "  padded  "),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(result.input_path, input);
        assert_eq!(result.metadata.subject, "padded");
        assert_eq!(show(&svc, &input).metadata.subject, "padded");
    }

    #[test]
    fn test_lenient_date_is_canonicalized() {
        let dir = tempdir().unwrap();
        let svc = service(&dir);
        let input = write_fixture(dir.path(), "min.pdf", &minimal_pdf());
        let output = out_path(&dir, "dated.pdf");

        let result = svc
            .set(
                &CancelToken::new(),
                &SetRequest {
                    io: IoOptions::to_output(&input, &output),
                    changes: MetadataPatch::new().with(Field::CreationDate, "2026/02/17"),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(result.metadata.creation_date, "2026-02-17T00:00:00Z");
        assert_eq!(show(&svc, &output).metadata.creation_date, "2026-02-17T00:00:00Z");
    }

    #[test]
    fn test_strict_date_is_rejected() {
        let dir = tempdir().unwrap();
        let svc = service(&dir);
        let input = write_fixture(dir.path(), "min.pdf", &minimal_pdf());
        let output = out_path(&dir, "dated.pdf");

        let mut req = SetRequest {
            io: IoOptions::to_output(&input, &output),
            changes: MetadataPatch::new().with(Field::CreationDate, "2026/02/17"),
            ..Default::default()
        };
        req.exec.strict = true;

        let err = svc.set(&CancelToken::new(), &req).unwrap_err();
        assert_eq!(err.code, ErrorCode::Validation);
        assert_eq!(err.code.exit_code(), 3);
        assert!(!std::path::Path::new(&output).exists());
    }

    #[test]
    fn test_show_reports_info_only_document() {
        let dir = tempdir().unwrap();
        let svc = service(&dir);
        let input = write_fixture(dir.path(), "info.pdf", &info_pdf());

        let got = show(&svc, &input);
        assert_eq!(got.input_path, input);
        assert!(got.info_found);
        assert!(!got.xmp_found);
        assert!(!got.encrypted);
        assert_eq!(got.metadata.title, "Info Title");
    }
}

mod unset {
    use super::*;

    #[test]
    fn test_unset_named_fields() {
        let dir = tempdir().unwrap();
        let svc = service(&dir);
        let input = write_fixture(dir.path(), "info.pdf", &info_pdf());
        let output = out_path(&dir, "out.pdf");

        let result = svc
            .unset(
                &CancelToken::new(),
                &UnsetRequest {
                    io: IoOptions::to_output(&input, &output),
                    fields: vec![Field::Producer, Field::Title],
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(result.metadata.title, "");
        assert_eq!(result.metadata.producer, "");
        assert_eq!(result.metadata.author, "Info Author");

        // the old Info dictionary is still in the file but no longer referenced
        let got = show(&svc, &output);
        assert_eq!(got.metadata.title, "");
        assert_eq!(got.metadata.author, "Info Author");
        assert!(fs::read(&output).unwrap().starts_with(&info_pdf()));
    }

    #[test]
    fn test_unset_duplicate_fields_rejected() {
        let dir = tempdir().unwrap();
        let svc = service(&dir);
        let input = write_fixture(dir.path(), "info.pdf", &info_pdf());

        let err = svc
            .unset(
                &CancelToken::new(),
                &UnsetRequest {
                    io: IoOptions::in_place(&input),
                    fields: vec![Field::Title, Field::Title],
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Validation);
        assert_eq!(fs::read(&input).unwrap(), info_pdf());
    }
}

mod templates {
    use super::*;

    fn save_request(title: &str, force: bool) -> TemplateSaveRequest {
        TemplateSaveRequest {
            name: "release".into(),
            note: " v1 ".into(),
            force,
            metadata: MetadataPatch::new().with(Field::Title, title),
        }
    }

    #[test]
    fn test_save_conflict_then_force() {
        let dir = tempdir().unwrap();
        let svc = service(&dir);
        let cancel = CancelToken::new();

        let saved = svc.template_save(&cancel, &save_request("One", false)).unwrap();
        assert_eq!(saved.note, "v1");

        let err = svc.template_save(&cancel, &save_request("Two", false)).unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.code.exit_code(), 5);

        svc.template_save(&cancel, &save_request("Two", true)).unwrap();
        let record = svc.template_show(&cancel, "release").unwrap();
        assert_eq!(record.metadata.get(Field::Title), Some("Two"));
        assert_eq!(svc.template_list(&cancel).unwrap().len(), 1);
    }

    #[test]
    fn test_save_normalizes_dates() {
        let dir = tempdir().unwrap();
        let svc = service(&dir);
        let req = TemplateSaveRequest {
            name: "dated".into(),
            metadata: MetadataPatch::new().with(Field::ModDate, "2024-03-04 05:06:07"),
            ..Default::default()
        };
        let record = svc.template_save(&CancelToken::new(), &req).unwrap();
        assert_eq!(record.metadata.get(Field::ModDate), Some("2024-03-04T05:06:07Z"));
    }

    #[test]
    fn test_apply_template() {
        let dir = tempdir().unwrap();
        let svc = service(&dir);
        let cancel = CancelToken::new();
        let input = write_fixture(dir.path(), "min.pdf", &minimal_pdf());
        let output = out_path(&dir, "templated.pdf");

        svc.template_save(&cancel, &save_request("Templated", false)).unwrap();
        let result = svc
            .template_apply(
                &cancel,
                &TemplateApplyRequest {
                    name: "release".into(),
                    io: IoOptions::to_output(&input, &output),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(result.metadata.title, "Templated");
        assert_eq!(show(&svc, &output).metadata.title, "Templated");
    }

    #[test]
    fn test_apply_missing_template() {
        let dir = tempdir().unwrap();
        let svc = service(&dir);
        let input = write_fixture(dir.path(), "min.pdf", &minimal_pdf());

        let err = svc
            .template_apply(
                &CancelToken::new(),
                &TemplateApplyRequest {
                    name: "ghost".into(),
                    io: IoOptions::in_place(&input),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(fs::read(&input).unwrap(), minimal_pdf());
    }

    #[test]
    fn test_delete_template() {
        let dir = tempdir().unwrap();
        let svc = service(&dir);
        let cancel = CancelToken::new();

        svc.template_save(&cancel, &save_request("x", false)).unwrap();
        svc.template_delete(&cancel, "release").unwrap();
        assert!(svc.template_list(&cancel).unwrap().is_empty());
        assert_eq!(
            svc.template_delete(&cancel, "release").unwrap_err().code,
            ErrorCode::NotFound
        );
    }
}

#[test]
fn test_canceled_operations_fail_internal() {
    let dir = tempdir().unwrap();
    let svc = service(&dir);
    let input = write_fixture(dir.path(), "min.pdf", &minimal_pdf());
    let cancel = CancelToken::new();
    cancel.cancel();

    let err = svc
        .show(
            &cancel,
            &ShowRequest {
                input_path: input,
                json: false,
            },
        )
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Internal);
    assert_eq!(svc.template_list(&cancel).unwrap_err().code, ErrorCode::Internal);
}
