mod common;

use portal_core::RecordStatus;
use portal_storage::{EntityKind, PortalStorage, QueryBuilder};
use reqwest::multipart::{Form, Part};
use serde_json::Value;

fn file(name: &str, mime: &str, size: usize) -> Part {
    Part::bytes(vec![7u8; size])
        .file_name(name.to_string())
        .mime_str(mime)
        .unwrap()
}

fn form(email: &str, phone: &str) -> Form {
    Form::new()
        .text("companyName", "Acme Metalworks")
        .text("primaryPhoneNumber", phone.to_string())
        .text("email", email.to_string())
        .text("location", "Misurata")
        .text("industrialSector", "Manufacturing")
        .text("specialization", "Welding")
        .text("experienceProvided", "Steel structures")
}

async fn submit(client: &reqwest::Client, base: &str, form: Form) -> (u16, Value) {
    let resp = client
        .post(format!("{base}/api/collaborators"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn creates_collaborator_with_media_and_confirms_by_email() {
    let server = common::start_server().await;
    let client = reqwest::Client::new();

    let request = form("info@acme.ly", "0911111111")
        .part("image", file("logo.png", "image/png", 128))
        .part("experienceProvidedMedia", file("a.mp4", "video/mp4", 256))
        .part("experienceProvidedMedia", file("b.jpg", "image/jpeg", 64))
        .part("machineryAndEquipmentMedia", file("c.png", "image/png", 32))
        // Browsers send an empty part for an untouched file input.
        .part("machineryAndEquipmentMedia", file("", "application/octet-stream", 0));

    let (status, body) = submit(&client, &server.base, request).await;
    assert_eq!(status, 201, "{body}");
    assert_eq!(body["message"], "Collaborator created successfully");

    let counts = server.storage.counts();
    assert_eq!(counts.collaborators, 1);
    assert_eq!(counts.images, 1);
    assert_eq!(counts.media, 3);
    assert_eq!(counts.media_links, 3);

    let page = server
        .storage
        .search_collaborators(&QueryBuilder::new(EntityKind::Collaborators).build())
        .await
        .unwrap();
    let created = &page.items[0];
    assert_eq!(created.status, RecordStatus::Pending);
    assert!(!created.is_visible);
    assert_eq!(created.location.as_deref(), Some("Misurata"));

    let sent = common::wait_for_mail(&server.mail, 1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "info@acme.ly");
    assert!(sent[0].content.body.contains("Acme Metalworks"));

    server.stop().await;
}

#[tokio::test]
async fn rejects_duplicates_and_missing_fields() {
    let server = common::start_server().await;
    let client = reqwest::Client::new();

    let (status, _) = submit(&client, &server.base, form("info@acme.ly", "0911111111")).await;
    assert_eq!(status, 201);

    let (status, body) = submit(&client, &server.base, form("INFO@acme.ly", "0922222222")).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "EMAIL_EXISTS");
    assert_eq!(body["message"], "Email already exists");

    let (status, body) = submit(&client, &server.base, form("other@acme.ly", "0911111111")).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "PHONE_EXISTS");
    assert_eq!(body["message"], "Phone number already exists");

    let missing = Form::new()
        .text("companyName", "No Phone Ltd")
        .text("industrialSector", "Services")
        .text("specialization", "Consulting");
    let (status, body) = submit(&client, &server.base, missing).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    assert_eq!(server.storage.counts().collaborators, 1);
    server.stop().await;
}

#[tokio::test]
async fn invalid_media_is_rejected_before_any_write() {
    let server = common::start_server().await;
    let client = reqwest::Client::new();

    let request = form("info@acme.ly", "0911111111")
        .part("image", file("logo.png", "image/png", 128))
        .part("experienceProvidedMedia", file("a.mp4", "video/mp4", 256))
        .part("machineryAndEquipmentMedia", file("tools.zip", "application/zip", 64));

    let (status, body) = submit(&client, &server.base, request).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "INVALID_FILE");
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .starts_with("Machinery media: File 1: File type 'application/zip' is not allowed"),
        "{body}"
    );

    assert_eq!(server.storage.counts(), Default::default());
    assert!(server.mail.sent().is_empty());
    server.stop().await;
}

#[tokio::test]
async fn oversized_experience_media_is_rejected_before_any_write() {
    let mut cfg = common::test_config();
    cfg.uploads.media_max_bytes = 4096;
    let server = common::start_server_with(cfg).await;
    let client = reqwest::Client::new();

    let request = form("info@acme.ly", "0911111111")
        .part("experienceProvidedMedia", file("demo.mp4", "video/mp4", 4097));

    let (status, body) = submit(&client, &server.base, request).await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "INVALID_FILE");
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .starts_with("Experience media: File 1: File size exceeds"),
        "{body}"
    );

    assert_eq!(server.storage.counts(), Default::default());
    assert!(server.mail.sent().is_empty());
    server.stop().await;
}

#[tokio::test]
async fn storage_failure_mid_saga_leaves_nothing_behind() {
    let server = common::start_server().await;
    let client = reqwest::Client::new();
    server.storage.inject_fault("create_media_link");

    let request = form("info@acme.ly", "0911111111")
        .part("image", file("logo.png", "image/png", 128))
        .part("experienceProvidedMedia", file("a.mp4", "video/mp4", 256))
        .part("experienceProvidedMedia", file("b.mp4", "video/mp4", 256));

    let (status, body) = submit(&client, &server.base, request).await;
    assert_eq!(status, 500);
    assert_eq!(body["code"], "SERVER_ERROR");
    assert_eq!(body["message"], "Internal server error");

    assert_eq!(server.storage.counts(), Default::default());

    // The same applicant can retry once storage recovers.
    server.storage.clear_faults();
    let (status, _) = submit(&client, &server.base, form("info@acme.ly", "0911111111")).await;
    assert_eq!(status, 201);

    server.stop().await;
}

#[tokio::test]
async fn innovator_submission() {
    let server = common::start_server().await;
    let client = reqwest::Client::new();

    let payload = serde_json::json!({
        "name": "Salma",
        "email": "salma@example.ly",
        "phone": "0913333333",
        "projectTitle": "Solar dryer",
    });
    let resp = client
        .post(format!("{}/api/innovators", server.base))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let resp = client
        .post(format!("{}/api/innovators", server.base))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "EMAIL_EXISTS");

    let resp = client
        .post(format!("{}/api/innovators", server.base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_FAILED");

    let sent = common::wait_for_mail(&server.mail, 1).await;
    assert_eq!(sent[0].to, "salma@example.ly");

    server.stop().await;
}
