use super::*;
use crate::types::Event;

#[tokio::test]
async fn nested_export_writes_one_directory_per_record() {
    let server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();

    mount_object_ids(&server, &[12, 40]).await;
    mount_attachments(
        &server,
        12,
        json!([
            {"id": 3, "name": "photo.jpg", "contentType": "image/jpeg", "size": 5},
            {"id": 4, "name": "site.plan.v2.pdf"},
        ]),
    )
    .await;
    mount_attachments(&server, 40, json!([{"id": 9, "name": "notes.txt"}])).await;
    mount_attachment_bytes(&server, 12, 3, b"jpeg-bytes").await;
    mount_attachment_bytes(&server, 12, 4, b"pdf-bytes").await;
    mount_attachment_bytes(&server, 40, 9, b"text-bytes").await;

    let exporter = AttachmentExporter::new(test_config(&server, &output)).unwrap();
    let summary = exporter.run().await.unwrap();

    assert_eq!(summary.records_total, 2);
    assert_eq!(summary.records_failed, 0);
    assert_eq!(summary.files_written, 3);
    assert_eq!(summary.files_failed, 0);
    assert!(summary.is_clean());

    assert_eq!(
        std::fs::read(output.path().join("record_12/photo_3.jpg")).unwrap(),
        b"jpeg-bytes"
    );
    // Last-dot split keeps the multi-dot stem intact
    assert_eq!(
        std::fs::read(output.path().join("record_12/site.plan.v2_4.pdf")).unwrap(),
        b"pdf-bytes"
    );
    assert_eq!(
        std::fs::read(output.path().join("record_40/notes_9.txt")).unwrap(),
        b"text-bytes"
    );

    // Exactly the expected tree, nothing else
    let files = walkdir::WalkDir::new(output.path())
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .count();
    assert_eq!(files, 3);
}

#[tokio::test]
async fn flat_export_without_context_prefixes_record_id() {
    let server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();

    mount_object_ids(&server, &[12]).await;
    mount_attachments(&server, 12, json!([{"id": 3, "name": "photo.jpg"}])).await;
    mount_attachment_bytes(&server, 12, 3, b"jpeg-bytes").await;

    let config = Config {
        flat: true,
        ..test_config(&server, &output)
    };
    let summary = AttachmentExporter::new(config).unwrap().run().await.unwrap();

    assert_eq!(summary.files_written, 1);
    assert!(output.path().join("12_photo_3.jpg").is_file());
}

#[tokio::test]
async fn flat_export_with_naming_context_prefixes_field_value() {
    let server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();

    mount_object_ids(&server, &[12]).await;
    mount_attachments(
        &server,
        12,
        json!([
            {"id": 3, "name": "photo.jpg"},
            {"id": 4, "name": "plan.pdf"},
        ]),
    )
    .await;
    // The record is fetched once per record, not once per attachment
    Mock::given(method("GET"))
        .and(path(format!("{LAYER}/12")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "feature": { "attributes": { "SITE": "SiteA" } } })),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_attachment_bytes(&server, 12, 3, b"jpeg-bytes").await;
    mount_attachment_bytes(&server, 12, 4, b"pdf-bytes").await;

    let config = Config {
        flat: true,
        prefix_field: Some("SITE".to_string()),
        ..test_config(&server, &output)
    };
    let summary = AttachmentExporter::new(config).unwrap().run().await.unwrap();

    assert_eq!(summary.files_written, 2);
    assert!(output.path().join("SiteA_photo_3.jpg").is_file());
    assert!(output.path().join("SiteA_plan_4.pdf").is_file());
}

#[tokio::test]
async fn missing_naming_field_falls_back_to_default_prefix() {
    let server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();

    mount_object_ids(&server, &[7]).await;
    mount_attachments(&server, 7, json!([{"id": 1, "name": "photo.jpg"}])).await;
    // Attribute map present but lacks the configured field
    mount_feature(&server, 7, json!({ "OTHER": "value" })).await;
    mount_attachment_bytes(&server, 7, 1, b"jpeg-bytes").await;

    let config = Config {
        prefix_field: Some("SITE".to_string()),
        ..test_config(&server, &output)
    };
    let summary = AttachmentExporter::new(config).unwrap().run().await.unwrap();

    assert_eq!(summary.files_written, 1);
    assert!(output.path().join("record_7/photo_1.jpg").is_file());
}

#[tokio::test]
async fn null_naming_field_value_falls_back_to_default_prefix() {
    let server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();

    mount_object_ids(&server, &[7]).await;
    mount_attachments(&server, 7, json!([{"id": 1, "name": "photo.jpg"}])).await;
    mount_feature(&server, 7, json!({ "SITE": null })).await;
    mount_attachment_bytes(&server, 7, 1, b"jpeg-bytes").await;

    let config = Config {
        flat: true,
        prefix_field: Some("SITE".to_string()),
        ..test_config(&server, &output)
    };
    AttachmentExporter::new(config).unwrap().run().await.unwrap();

    assert!(output.path().join("7_photo_1.jpg").is_file());
}

#[tokio::test]
async fn numeric_naming_field_value_is_stringified() {
    let server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();

    mount_object_ids(&server, &[7]).await;
    mount_attachments(&server, 7, json!([{"id": 1, "name": "photo.jpg"}])).await;
    mount_feature(&server, 7, json!({ "PARCEL": 1042 })).await;
    mount_attachment_bytes(&server, 7, 1, b"jpeg-bytes").await;

    let config = Config {
        prefix_field: Some("PARCEL".to_string()),
        ..test_config(&server, &output)
    };
    AttachmentExporter::new(config).unwrap().run().await.unwrap();

    assert!(output.path().join("1042_7/photo_1.jpg").is_file());
}

#[tokio::test]
async fn anonymous_requests_carry_no_token_parameter() {
    let server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();

    mount_object_ids(&server, &[12]).await;
    mount_attachments(&server, 12, json!([{"id": 3, "name": "photo.jpg"}])).await;
    Mock::given(method("GET"))
        .and(path(format!("{LAYER}/12/attachments/3")))
        .and(query_param_is_missing("token"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg-bytes".as_slice()))
        .expect(1)
        .mount(&server)
        .await;

    let summary = AttachmentExporter::new(test_config(&server, &output))
        .unwrap()
        .run()
        .await
        .unwrap();
    assert_eq!(summary.files_written, 1);
}

#[tokio::test]
async fn authenticated_run_appends_token_to_every_request() {
    let server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/sharing/rest/generateToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "tok-1" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{LAYER}/query")))
        .and(query_param("token", "tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objectIdFieldName": "OBJECTID",
            "objectIds": [12],
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{LAYER}/12/attachments")))
        .and(query_param("token", "tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "attachmentInfos": [{"id": 3, "name": "photo.jpg"}],
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{LAYER}/12/attachments/3")))
        .and(query_param("token", "tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg-bytes".as_slice()))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config {
        portal: Some(PortalConfig {
            url: server.uri(),
            username: "user".to_string(),
            password: "pass".to_string(),
        }),
        ..test_config(&server, &output)
    };
    let summary = AttachmentExporter::new(config).unwrap().run().await.unwrap();

    assert_eq!(summary.files_written, 1);
    assert!(output.path().join("record_12/photo_3.jpg").is_file());
}

#[tokio::test]
async fn events_report_lifecycle_and_files() {
    let server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();

    mount_object_ids(&server, &[12]).await;
    mount_attachments(&server, 12, json!([{"id": 3, "name": "photo.jpg"}])).await;
    mount_attachment_bytes(&server, 12, 3, b"jpeg-bytes").await;

    let exporter = AttachmentExporter::new(test_config(&server, &output)).unwrap();
    let mut events = exporter.subscribe();
    exporter.run().await.unwrap();

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }

    assert!(matches!(seen.first(), Some(Event::Enumerated { total: 1 })));
    assert!(seen.iter().any(|e| matches!(
        e,
        Event::FileWritten { record_id, attachment_id: 3, .. } if record_id.get() == 12
    )));
    assert!(matches!(
        seen.last(),
        Some(Event::Completed { summary }) if summary.files_written == 1
    ));
}

#[tokio::test]
async fn rerunning_overwrites_existing_files() {
    let server = MockServer::start().await;
    let output = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path(format!("{LAYER}/query")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "objectIdFieldName": "OBJECTID",
            "objectIds": [12],
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{LAYER}/12/attachments")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "attachmentInfos": [{"id": 3, "name": "photo.jpg"}],
        })))
        .mount(&server)
        .await;
    mount_attachment_bytes(&server, 12, 3, b"second-run").await;

    let target = output.path().join("record_12/photo_3.jpg");
    std::fs::create_dir_all(target.parent().unwrap()).unwrap();
    std::fs::write(&target, b"stale").unwrap();

    let summary = AttachmentExporter::new(test_config(&server, &output))
        .unwrap()
        .run()
        .await
        .unwrap();

    assert_eq!(summary.files_written, 1);
    assert_eq!(std::fs::read(&target).unwrap(), b"second-run");
}
