use serde::{Deserialize, Serialize};

/// Email delivery settings.
///
/// When `enabled` is false emails are rendered and logged but never sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub enabled: bool,
    /// Sender address, optionally with a display name.
    pub from: String,
    pub smtp: SmtpSettings,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            from: "Misurata Center for Entrepreneurship <noreply@localhost>".to_string(),
            smtp: SmtpSettings::default(),
        }
    }
}

impl NotificationConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.enabled {
            return Ok(());
        }
        if self.smtp.host.as_deref().is_none_or(|h| h.trim().is_empty()) {
            return Err("notifications.smtp.host is required when notifications are enabled".into());
        }
        if self.smtp.port == 0 {
            return Err("notifications.smtp.port must be greater than 0".into());
        }
        if self.from.parse::<lettre::message::Mailbox>().is_err() {
            return Err(format!("notifications.from is not a valid address: {}", self.from));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpSettings {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: None,
            port: 587,
            username: None,
            password: None,
        }
    }
}
