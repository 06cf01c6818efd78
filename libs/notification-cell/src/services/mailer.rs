// libs/notification-cell/src/services/mailer.rs
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, info, warn};

use shared_config::AppConfig;

use crate::models::{NotificationError, StatusUpdate};

/// Narrow seam to the message transport. Callers treat delivery as
/// best-effort: a failed send is logged by the caller and never rolls back
/// the transition that triggered it.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_status_update(&self, update: &StatusUpdate) -> Result<(), NotificationError>;
}

/// Posts a rendered status-update email to the configured mail relay API.
pub struct EmailNotifier {
    client: Client,
    configured: bool,
    api_url: String,
    api_key: String,
    from_address: String,
}

impl EmailNotifier {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            configured: config.is_mail_configured(),
            api_url: config.mail_api_url.clone(),
            api_key: config.mail_api_key.clone(),
            from_address: config.mail_from_address.clone(),
        }
    }

    fn status_message(update: &StatusUpdate) -> String {
        let service = update.service_type.replace('_', " ");
        match update.new_status.as_str() {
            "assigned" => format!(
                "Your {} consultation has been assigned to {}.",
                service, update.doctor_name
            ),
            "in_progress" => format!(
                "{} is now reviewing your {} consultation.",
                update.doctor_name, service
            ),
            "completed" => format!(
                "Your {} consultation has been completed. You can now download your documents from your dashboard.",
                service
            ),
            other => format!("Your consultation status has been updated to {}.", other),
        }
    }

    fn render_body(update: &StatusUpdate) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<body style="font-family: Arial, sans-serif; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        <div style="background-color: #0d6efd; color: white; text-align: center; padding: 20px;">
            <h1>FreeDoc Australia</h1>
            <p>Consultation Update</p>
        </div>
        <div style="background-color: #f8f9fa; padding: 30px;">
            <h2>Hello {patient_name},</h2>
            <div style="background-color: white; border-left: 4px solid #28a745; padding: 20px;">
                <p>{message}</p>
            </div>
            <p>You can view the full details and any available documents by logging into your FreeDoc dashboard.</p>
        </div>
        <div style="text-align: center; color: #6c757d; font-size: 14px;">
            <p>This is an automated message, please do not reply to this email.</p>
        </div>
    </div>
</body>
</html>
"#,
            patient_name = update.patient_name,
            message = Self::status_message(update),
        )
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn send_status_update(&self, update: &StatusUpdate) -> Result<(), NotificationError> {
        let recipient = update
            .patient_email
            .as_deref()
            .filter(|email| !email.is_empty())
            .ok_or(NotificationError::NoRecipient)?;

        if !self.configured {
            // No relay configured (local/dev). Log and treat as delivered.
            info!(
                "Mail relay not configured, skipping status update to {} ({} -> {})",
                recipient, update.service_type, update.new_status
            );
            return Ok(());
        }

        debug!(
            "Sending status update to {} ({} -> {})",
            recipient, update.service_type, update.new_status
        );

        let payload = json!({
            "from": { "name": "FreeDoc Australia", "address": self.from_address },
            "to": recipient,
            "subject": format!(
                "FreeDoc Consultation Update - {}",
                update.service_type.replace('_', " ")
            ),
            "html": Self::render_body(update),
        });

        let response = self
            .client
            .post(format!("{}/send", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotificationError::Delivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Mail relay rejected status update ({}): {}", status, body);
            return Err(NotificationError::Delivery(format!(
                "relay returned {}",
                status
            )));
        }

        info!("Consultation update email sent to {}", recipient);
        Ok(())
    }
}
