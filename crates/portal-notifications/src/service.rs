use std::sync::Arc;

use portal_core::{Collaborator, Innovator};
use serde_json::json;
use time::OffsetDateTime;
use tokio::task::JoinHandle;

use crate::adapters::{EmailAdapter, LogAdapter, RenderedContent, SendResult, SmtpAdapter};
use crate::catalog::PortalTemplate;
use crate::config::NotificationConfig;
use crate::error::NotificationError;
use crate::templates::{TemplateData, TemplateRenderer};

/// Outcome of an admin review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

/// Renders portal emails and delivers them in the background.
pub struct NotificationService {
    renderer: TemplateRenderer,
    adapter: Arc<dyn EmailAdapter>,
    app_url: String,
}

impl NotificationService {
    pub fn new(adapter: Arc<dyn EmailAdapter>, app_url: impl Into<String>) -> Self {
        Self {
            renderer: TemplateRenderer::with_portal_templates(),
            adapter,
            app_url: app_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// SMTP delivery when enabled, logging otherwise.
    pub fn from_config(
        config: &NotificationConfig,
        app_url: impl Into<String>,
    ) -> Result<Self, NotificationError> {
        let adapter: Arc<dyn EmailAdapter> = if config.enabled {
            Arc::new(SmtpAdapter::new(&config.smtp, &config.from)?)
        } else {
            Arc::new(LogAdapter)
        };
        tracing::info!(adapter = adapter.name(), "email notifications configured");
        Ok(Self::new(adapter, app_url))
    }

    pub fn adapter_name(&self) -> &'static str {
        self.adapter.name()
    }

    pub fn render(
        &self,
        template: PortalTemplate,
        mut data: TemplateData,
    ) -> Result<RenderedContent, NotificationError> {
        data.entry("appUrl".to_string())
            .or_insert_with(|| json!(self.app_url));
        data.entry("year".to_string())
            .or_insert_with(|| json!(OffsetDateTime::now_utc().year()));
        self.renderer.render(template.id(), &data)
    }

    pub async fn send(
        &self,
        template: PortalTemplate,
        to: &str,
        data: TemplateData,
    ) -> Result<SendResult, NotificationError> {
        let content = self.render(template, data)?;
        self.adapter.send(to, &content).await
    }

    /// Sends without waiting. Failures are logged and never surface to the
    /// caller.
    pub fn dispatch(
        self: &Arc<Self>,
        template: PortalTemplate,
        to: impl Into<String>,
        data: TemplateData,
    ) -> JoinHandle<()> {
        let service = Arc::clone(self);
        let to = to.into();
        tokio::spawn(async move {
            match service.send(template, &to, data).await {
                Ok(result) if result.success => {
                    tracing::debug!(template = template.id(), to = %to, "email sent");
                }
                Ok(result) => {
                    tracing::warn!(
                        template = template.id(),
                        to = %to,
                        error = result.error.as_deref().unwrap_or_default(),
                        "email rejected by relay"
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        template = template.id(),
                        to = %to,
                        error = %e,
                        "email send failed"
                    );
                }
            }
        })
    }

    /// Confirms a collaborator application. Skipped when no email was given.
    pub fn collaborator_submitted(
        self: &Arc<Self>,
        collaborator: &Collaborator,
    ) -> Option<JoinHandle<()>> {
        let to = collaborator_email(collaborator)?;
        Some(self.dispatch(
            PortalTemplate::CollaboratorSubmission,
            to,
            collaborator_data(collaborator, None),
        ))
    }

    pub fn collaborator_reviewed(
        self: &Arc<Self>,
        collaborator: &Collaborator,
        decision: ReviewDecision,
        reason: Option<&str>,
    ) -> Option<JoinHandle<()>> {
        let to = collaborator_email(collaborator)?;
        let template = match decision {
            ReviewDecision::Approved => PortalTemplate::CollaboratorApproval,
            ReviewDecision::Rejected => PortalTemplate::CollaboratorRejection,
        };
        Some(self.dispatch(template, to, collaborator_data(collaborator, reason)))
    }

    pub fn innovator_submitted(self: &Arc<Self>, innovator: &Innovator) -> JoinHandle<()> {
        self.dispatch(
            PortalTemplate::InnovatorSubmission,
            innovator.email.clone(),
            innovator_data(innovator, None),
        )
    }

    pub fn innovator_reviewed(
        self: &Arc<Self>,
        innovator: &Innovator,
        decision: ReviewDecision,
        reason: Option<&str>,
    ) -> JoinHandle<()> {
        let template = match decision {
            ReviewDecision::Approved => PortalTemplate::InnovatorApproval,
            ReviewDecision::Rejected => PortalTemplate::InnovatorRejection,
        };
        self.dispatch(
            template,
            innovator.email.clone(),
            innovator_data(innovator, reason),
        )
    }
}

fn collaborator_email(collaborator: &Collaborator) -> Option<String> {
    collaborator
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(ToString::to_string)
}

fn collaborator_data(collaborator: &Collaborator, reason: Option<&str>) -> TemplateData {
    let mut data = TemplateData::new();
    data.insert("name".into(), json!(collaborator.company_name));
    data.insert("rejectionReason".into(), json!(reason));
    data
}

fn innovator_data(innovator: &Innovator, reason: Option<&str>) -> TemplateData {
    let mut data = TemplateData::new();
    data.insert("name".into(), json!(innovator.name));
    data.insert("projectTitle".into(), json!(innovator.project_title));
    data.insert("rejectionReason".into(), json!(reason));
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryAdapter;
    use portal_core::RecordStatus;

    fn collaborator(email: Option<&str>) -> Collaborator {
        Collaborator {
            id: "c1".into(),
            company_name: "Acme Metalworks".into(),
            primary_phone_number: "0911111111".into(),
            optional_phone_number: None,
            email: email.map(Into::into),
            location: None,
            site: None,
            industrial_sector: "Manufacturing".into(),
            specialization: "Welding".into(),
            experience_provided: None,
            machinery_and_equipment: None,
            image_id: None,
            status: RecordStatus::Pending,
            is_visible: false,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn innovator() -> Innovator {
        Innovator {
            id: "i1".into(),
            name: "Sara".into(),
            email: "sara@example.com".into(),
            phone: "0922222222".into(),
            project_title: "Solar Pump".into(),
            project_description: None,
            field: None,
            image_id: None,
            status: RecordStatus::Pending,
            is_visible: false,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn service(adapter: Arc<MemoryAdapter>) -> Arc<NotificationService> {
        Arc::new(NotificationService::new(adapter, "https://portal.example/"))
    }

    #[tokio::test]
    async fn test_submission_confirmation_sent() {
        let adapter = Arc::new(MemoryAdapter::new());
        let service = service(adapter.clone());

        service
            .collaborator_submitted(&collaborator(Some("info@acme.ly")))
            .unwrap()
            .await
            .unwrap();

        let sent = adapter.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "info@acme.ly");
        assert!(sent[0].content.body.starts_with("Dear Acme Metalworks,"));
    }

    #[tokio::test]
    async fn test_no_email_skips_collaborator() {
        let adapter = Arc::new(MemoryAdapter::new());
        let service = service(adapter.clone());

        assert!(service.collaborator_submitted(&collaborator(None)).is_none());
        assert!(
            service
                .collaborator_reviewed(&collaborator(Some("  ")), ReviewDecision::Approved, None)
                .is_none()
        );
        assert!(adapter.sent().is_empty());
    }

    #[tokio::test]
    async fn test_review_uses_app_url_and_reason() {
        let adapter = Arc::new(MemoryAdapter::new());
        let service = service(adapter.clone());

        service
            .collaborator_reviewed(
                &collaborator(Some("info@acme.ly")),
                ReviewDecision::Approved,
                None,
            )
            .unwrap()
            .await
            .unwrap();
        service
            .innovator_reviewed(&innovator(), ReviewDecision::Rejected, Some("Too early"))
            .await
            .unwrap();

        let sent = adapter.sent();
        assert!(sent[0].content.body.contains("https://portal.example/collaborators"));
        assert!(sent[1].content.body.contains("Feedback from Review Panel: Too early"));
        assert_eq!(sent[1].to, "sara@example.com");
    }

    #[tokio::test]
    async fn test_delivery_failure_is_contained() {
        let service = service(Arc::new(MemoryAdapter::failing()));
        let handle = service.innovator_submitted(&innovator());
        assert!(handle.await.is_ok());

        let err = service
            .send(PortalTemplate::InnovatorSubmission, "sara@example.com", TemplateData::new())
            .await
            .unwrap_err();
        assert!(matches!(err, NotificationError::SendFailed(_)));
    }

    #[test]
    fn test_disabled_config_logs() {
        let service = NotificationService::from_config(&NotificationConfig::default(), "http://x")
            .unwrap();
        assert_eq!(service.adapter_name(), "log");
    }
}
