#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use portal_auth::{SessionClaims, SessionVerifier};
use portal_core::{Collaborator, Image, Innovator, RecordStatus, generate_id, now_utc};
use portal_db_memory::InMemoryStorage;
use portal_notifications::{MemoryAdapter, NotificationService, SentEmail};
use portal_server::{AppConfig, AppState, build_app};
use portal_storage::PortalStorage;
use tokio::task::JoinHandle;

pub const SECRET: &str = "integration-test-secret";

pub struct TestServer {
    pub base: String,
    pub storage: Arc<InMemoryStorage>,
    pub mail: Arc<MemoryAdapter>,
    pub state: AppState,
    shutdown: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl TestServer {
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.auth.session_secret = SECRET.into();
    cfg
}

pub async fn start_server() -> TestServer {
    start_server_with(test_config()).await
}

pub async fn start_server_with(cfg: AppConfig) -> TestServer {
    let storage = Arc::new(InMemoryStorage::new());
    let mail = Arc::new(MemoryAdapter::new());
    let notifications = Arc::new(NotificationService::new(mail.clone(), "https://portal.test"));
    let state = AppState::new(&cfg, storage.clone(), notifications);
    let app = build_app(state.clone());

    // Bind to an ephemeral port
    let listener = tokio::net::TcpListener::bind((std::net::Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();

    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.await;
            })
            .await;
    });

    TestServer {
        base: format!("http://{addr}"),
        storage,
        mail,
        state,
        shutdown: Some(tx),
        handle: Some(handle),
    }
}

pub fn token(role: &str) -> String {
    SessionVerifier::new(SECRET)
        .issue(&SessionClaims::new(
            "admin-1",
            "manager@center.ly",
            role,
            time::Duration::hours(1),
        ))
        .expect("issue token")
}

pub fn admin_token() -> String {
    token("GENERAL_MANAGER")
}

pub async fn seed_collaborator(
    storage: &InMemoryStorage,
    company: &str,
    phone: &str,
    status: RecordStatus,
    visible: bool,
) -> Collaborator {
    storage
        .create_collaborator(Collaborator {
            id: generate_id(),
            company_name: company.into(),
            primary_phone_number: phone.into(),
            optional_phone_number: None,
            email: Some(format!("{}@example.ly", company.to_lowercase().replace(' ', "."))),
            location: Some("Misurata".into()),
            site: None,
            industrial_sector: "Manufacturing".into(),
            specialization: "Welding".into(),
            experience_provided: None,
            machinery_and_equipment: None,
            image_id: None,
            status,
            is_visible: visible,
            created_at: now_utc(),
        })
        .await
        .expect("seed collaborator")
}

pub async fn seed_image(storage: &InMemoryStorage, data: Vec<u8>) -> Image {
    storage
        .create_image(Image {
            id: generate_id(),
            size: data.len(),
            content_type: "image/png".into(),
            data: data.into(),
        })
        .await
        .expect("seed image")
}

pub async fn seed_innovator(storage: &InMemoryStorage, name: &str, email: &str) -> Innovator {
    storage
        .create_innovator(Innovator {
            id: generate_id(),
            name: name.into(),
            email: email.into(),
            phone: "0915555555".into(),
            project_title: "Smart irrigation".into(),
            project_description: None,
            field: Some("Agriculture".into()),
            image_id: None,
            status: RecordStatus::Pending,
            is_visible: false,
            created_at: now_utc(),
        })
        .await
        .expect("seed innovator")
}

/// Emails are delivered in the background; waits until `count` have arrived.
pub async fn wait_for_mail(mail: &MemoryAdapter, count: usize) -> Vec<SentEmail> {
    for _ in 0..100 {
        let sent = mail.sent();
        if sent.len() >= count {
            return sent;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    mail.sent()
}
