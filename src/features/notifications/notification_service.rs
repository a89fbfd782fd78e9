use std::sync::Arc;

use crate::features::reports::models::Report;
use crate::features::users::models::User;
use crate::modules::mail::Mailer;
use crate::shared::templates::{
    render_new_report_email, render_report_approved_email, RenderedEmail,
};

pub struct NotificationService {
    mailer: Arc<Mailer>,
    admin_email: Option<String>,
    public_url: String,
}

impl NotificationService {
    pub fn new(mailer: Arc<Mailer>, admin_email: Option<String>, public_url: &str) -> Self {
        Self {
            mailer,
            admin_email,
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn admin_url(&self) -> String {
        format!("{}/admin/relatos", self.public_url)
    }

    pub fn report_url(&self, report_id: i64) -> String {
        format!("{}/relato/{}", self.public_url, report_id)
    }

    /// Tell the moderators a report is waiting. Skipped when no admin
    /// address is configured.
    pub fn notify_new_report(&self, report: &Report, author: Option<&str>) {
        let Some(to) = self.admin_email.clone() else {
            tracing::debug!("ADMIN_EMAIL not set; skipping new report email");
            return;
        };

        let rendered = render_new_report_email(
            &report.title,
            &report.category,
            &report.location,
            &report.description,
            author,
            &self.admin_url(),
        );
        self.spawn_send(to, rendered, report.id);
    }

    /// Tell the owner their report was published
    pub fn notify_report_approved(&self, report: &Report, owner: &User) {
        if owner.email.trim().is_empty() {
            return;
        }

        let rendered =
            render_report_approved_email(&owner.name, &report.title, &self.report_url(report.id));
        self.spawn_send(owner.email.clone(), rendered, report.id);
    }

    fn spawn_send<E: std::fmt::Display>(
        &self,
        to: String,
        rendered: Result<RenderedEmail, E>,
        report_id: i64,
    ) {
        let email = match rendered {
            Ok(email) => email,
            Err(e) => {
                tracing::warn!("Failed to render email for report {}: {}", report_id, e);
                return;
            }
        };

        let mailer = Arc::clone(&self.mailer);
        tokio::spawn(async move {
            if let Err(e) = mailer.send(&to, &email.subject, &email.body).await {
                tracing::warn!("Failed to send email for report {} to {}: {}", report_id, to, e);
            }
        });
    }
}
