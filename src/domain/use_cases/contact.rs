use std::sync::Arc;

use chrono::Utc;
use tracing::debug;
use validator::Validate;

use crate::{
    email::{
        mailer::Mailer,
        templates::{self, SiteContext},
    },
    entities::contact::{ContactAck, ContactForm},
    errors::AppError,
    repositories::leads::LeadRepository,
};

use super::sequences::SequenceProcessor;

pub struct ContactHandler<R>
where
    R: LeadRepository,
{
    sequences: Arc<SequenceProcessor<R>>,
    mailer: Arc<dyn Mailer>,
    site: SiteContext,
}

impl<R> ContactHandler<R>
where
    R: LeadRepository,
{
    pub fn new(
        sequences: Arc<SequenceProcessor<R>>,
        mailer: Arc<dyn Mailer>,
        site: SiteContext,
    ) -> Self {
        ContactHandler {
            sequences,
            mailer,
            site,
        }
    }

    /// Full submission flow: validate, confirm to the visitor, notify the
    /// owner, queue the lead for the follow-up sequence. A repeat submission
    /// inside the de-duplication window still reads as success to the
    /// visitor; the lead is simply already queued.
    pub async fn handle_submission(&self, form: ContactForm) -> Result<ContactAck, AppError> {
        form.validate()?;

        let submitted_at = Utc::now();

        let confirmation = templates::confirmation_email(&form.email, &form.name, &self.site);
        self.mailer
            .send(confirmation)
            .await
            .map_err(|err| AppError::DeliveryError(err.to_string()))?;

        let notification = templates::owner_notification_email(&form, &self.site, submitted_at);
        self.mailer
            .send(notification)
            .await
            .map_err(|err| AppError::DeliveryError(err.to_string()))?;

        match self
            .sequences
            .add_lead(&form.email, &form.name, submitted_at)
            .await
        {
            Ok(lead) => debug!(lead_id = %lead.id, "lead recorded"),
            Err(AppError::DuplicateLead(_)) => {
                debug!("repeat submission inside the de-duplication window; lead already queued");
            }
            Err(err) => return Err(err),
        }

        Ok(ContactAck {
            success: true,
            message: "Thanks for reaching out! Check your inbox for a confirmation.".to_string(),
        })
    }
}
