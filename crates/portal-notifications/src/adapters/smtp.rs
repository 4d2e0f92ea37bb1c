use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, header::ContentType},
    transport::smtp::authentication::Credentials,
};

use super::{EmailAdapter, RenderedContent, SendResult};
use crate::config::SmtpSettings;
use crate::error::NotificationError;

/// Delivers emails through an SMTP relay.
pub struct SmtpAdapter {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpAdapter {
    /// Builds the transport. No connection is opened until the first send.
    pub fn new(settings: &SmtpSettings, from: &str) -> Result<Self, NotificationError> {
        let host = settings
            .host
            .as_deref()
            .ok_or_else(|| NotificationError::InvalidConfig("Missing smtp host".into()))?;

        let from = from
            .parse::<Mailbox>()
            .map_err(|e| NotificationError::InvalidConfig(format!("Invalid from: {}", e)))?;

        let mut mailer_builder = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| NotificationError::InvalidConfig(e.to_string()))?
            .port(settings.port);

        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            mailer_builder =
                mailer_builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            mailer: mailer_builder.build(),
            from,
        })
    }

    fn build_message(
        &self,
        to: &str,
        content: &RenderedContent,
    ) -> Result<Message, NotificationError> {
        let to = to
            .parse::<Mailbox>()
            .map_err(|e| NotificationError::InvalidRecipient(format!("{}: {}", to, e)))?;

        let builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(content.subject.as_deref().unwrap_or("Notification"));

        let message = match &content.html_body {
            Some(html) => builder.multipart(MultiPart::alternative_plain_html(
                content.body.clone(),
                html.clone(),
            )),
            None => builder
                .header(ContentType::TEXT_PLAIN)
                .body(content.body.clone()),
        };

        message.map_err(|e| NotificationError::SendFailed(e.to_string()))
    }
}

#[async_trait]
impl EmailAdapter for SmtpAdapter {
    async fn send(
        &self,
        to: &str,
        content: &RenderedContent,
    ) -> Result<SendResult, NotificationError> {
        let email = self.build_message(to, content)?;

        match self.mailer.send(email).await {
            Ok(response) => Ok(SendResult::delivered(Some(
                response.message().collect::<Vec<_>>().join(" "),
            ))),
            Err(e) => Ok(SendResult::failed(e.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}
