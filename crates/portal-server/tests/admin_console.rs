mod common;

use portal_core::RecordStatus;
use serde_json::{Value, json};

#[tokio::test]
async fn admin_endpoints_require_an_admin_session() {
    let server = common::start_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/api/admin", server.base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "UNAUTHORIZED");

    let resp = client
        .get(format!("{}/api/admin", server.base))
        .bearer_auth(common::token("VIEWER"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = client
        .get(format!("{}/api/admin", server.base))
        .bearer_auth("not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    for role in ["GENERAL_MANAGER", "NEWS_EDITOR", "REQUEST_REVIEWER"] {
        let resp = client
            .get(format!("{}/api/admin", server.base))
            .bearer_auth(common::token(role))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200, "{role}");
    }

    server.stop().await;
}

#[tokio::test]
async fn search_filters_and_paginates() {
    let server = common::start_server().await;
    let client = reqwest::Client::new();

    for i in 0..3 {
        common::seed_collaborator(
            &server.storage,
            &format!("Steel Works {i}"),
            &format!("09100000{i}"),
            RecordStatus::Pending,
            false,
        )
        .await;
    }common::seed_collaborator(
    &server.storage,
    "Olive Press",
    "0920000000",
    RecordStatus::Approved,
    true,
)
.await;

    let search = |query: &'static str| {
        let client = client.clone();
        let base = server.base.clone();
        async move {
            let resp = client
                .get(format!("{base}/api/admin{query}"))
                .bearer_auth(common::admin_token())
                .send()
                .await
                .unwrap();
            let status = resp.status().as_u16();
            (status, resp.json::<Value>().await.unwrap())
        }
    };

    let (status, body) = search("").await;
    assert_eq!(status, 200);
    assert_eq!(body["pagination"]["total"], 4);
    assert_eq!(body["pagination"]["limit"], 20);
    assert_eq!(body["data"][0]["companyName"], "Olive Press");

    let (_, body) = search("?q=steel&limit=2&page=2").await;
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["totalPages"], 2);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = search("?type=collaborators&status=approved").await;
    assert_eq!(body["pagination"]["total"], 1);

    let (_, body) = search("?type=innovators").await;
    assert_eq!(body["pagination"]["total"], 0);

    let (status, body) = search("?type=news").await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "INVALID_TYPE");

    let (status, body) = search("?status=ARCHIVED").await;
    assert_eq!(status, 400);
    assert_eq!(body["code"], "VALIDATION_FAILED");

    server.stop().await;
}

#[tokio::test]
async fn json_export_is_audited() {
    let server = common::start_server().await;
    let client = reqwest::Client::new();common::seed_collaborator(
    &server.storage,
    "Acme",
    "0911000001",
    RecordStatus::Approved,
    true,
)
.await;common::seed_collaborator(
    &server.storage,
    "Beta",
    "0911000002",
    RecordStatus::Pending,
    false,
)
.await;

    let resp = client
        .post(format!("{}/api/admin", server.base))
        .bearer_auth(common::admin_token())
        .header("x-forwarded-for", "10.9.8.7")
        .json(&json!({ "type": "collaborators", "filters": { "status": "APPROVED" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["exportedBy"], "manager@center.ly");
    assert!(body["exportedAt"].is_string());
    assert_eq!(body["data"][0]["companyName"], "Acme");
    assert_eq!(body["data"][0]["experienceProvidedMedia"], json!([]));

    let resp = client
        .get(format!("{}/api/admin/audit?action=EXPORT", server.base))
        .bearer_auth(common::admin_token())
        .send()
        .await
        .unwrap();
    let audit: Value = resp.json().await.unwrap();
    assert_eq!(audit["total"], 1);
    let entry = &audit["data"][0];
    assert_eq!(entry["entity"], "COLLABORATORS");
    assert_eq!(entry["userId"], "admin-1");
    assert_eq!(entry["ipAddress"], "10.9.8.7");
    assert_eq!(entry["details"]["count"], 1);
    assert_eq!(entry["details"]["filters"]["status"], "APPROVED");

    server.stop().await;
}

#[tokio::test]
async fn csv_export_and_bad_requests() {
    let server = common::start_server().await;
    let client = reqwest::Client::new();

    common::seed_innovator(&server.storage, "Salma, Eng.", "salma@example.ly").await;

    let resp = client
        .post(format!("{}/api/admin", server.base))
        .bearer_auth(common::admin_token())
        .json(&json!({ "type": "innovators", "format": "csv" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "text/csv");
    let disposition = resp.headers()["content-disposition"].to_str().unwrap().to_string();
    assert!(disposition.starts_with("attachment; filename=\"innovators_export_"));
    assert!(disposition.ends_with(".csv\""));

    let csv = resp.text().await.unwrap();
    let mut lines = csv.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("id,name,email,phone,projectTitle"));
    assert!(lines.next().unwrap().contains(",\"Salma, Eng.\",salma@example.ly,"));
    assert!(!csv.ends_with('\n'));

    let post = |body: Value| {
        client
            .post(format!("{}/api/admin", server.base))
            .bearer_auth(common::admin_token())
            .json(&body)
            .send()
    };

    let resp = post(json!({ "type": "innovators", "filters": { "password": "x" } }))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "VALIDATION_FAILED");

    let resp = post(json!({ "type": "innovators", "format": "xlsx" })).await.unwrap();
    assert_eq!(resp.status(), 400);

    let resp = post(json!({ "type": "users" })).await.unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_TYPE");

    server.stop().await;
}

#[tokio::test]
async fn review_workflow_updates_audits_and_notifies() {
    let server = common::start_server().await;
    let client = reqwest::Client::new();

    let approved = common::seed_collaborator(
        &server.storage,
        "Acme",
        "0911000001",
        RecordStatus::Pending,
        false,
    )
    .await;
    let rejected = common::seed_innovator(&server.storage, "Salma", "salma@example.ly").await;

    let resp = client
        .post(format!(
            "{}/api/admin/collaborators/{}/approve",
            server.base, approved.id
        ))
        .bearer_auth(common::token("REQUEST_REVIEWER"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "APPROVED");
    assert_eq!(body["isVisible"], true);

    let resp = client
        .post(format!(
            "{}/api/admin/innovators/{}/reject",
            server.base, rejected.id
        ))
        .bearer_auth(common::admin_token())
        .json(&json!({ "reason": "Incomplete business plan" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "REJECTED");
    assert_eq!(body["isVisible"], false);

    let resp = client
        .post(format!("{}/api/admin/collaborators/missing/approve", server.base))
        .bearer_auth(common::admin_token())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    let resp = client
        .post(format!("{}/api/admin/audit/x/approve", server.base))
        .bearer_auth(common::admin_token())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let sent = common::wait_for_mail(&server.mail, 2).await;
    assert_eq!(sent.len(), 2);
    let rejection = sent
        .iter()
        .find(|m| m.to == "salma@example.ly")
        .expect("rejection email");
    assert!(rejection.content.body.contains("Incomplete business plan"));

    let resp = client
        .get(format!("{}/api/admin/audit", server.base))
        .bearer_auth(common::admin_token())
        .send()
        .await
        .unwrap();
    let audit: Value = resp.json().await.unwrap();
    assert_eq!(audit["total"], 2);
    assert_eq!(audit["data"][0]["action"], "REJECT");
    assert_eq!(audit["data"][0]["entity"], "INNOVATOR");
    assert_eq!(audit["data"][0]["details"]["reason"], "Incomplete business plan");
    assert_eq!(audit["data"][1]["action"], "APPROVE");
    assert_eq!(audit["data"][1]["entityId"], approved.id.as_str());

    let resp = client
        .get(format!("{}/api/admin/audit?since=not-a-date", server.base))
        .bearer_auth(common::admin_token())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    server.stop().await;
}
