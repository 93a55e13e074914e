use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    email::{
        mailer::Mailer,
        templates::{self, SiteContext},
    },
    entities::lead::{LeadOutcome, LeadRecord, LeadStatus, ProcessReport, SequenceStats},
    errors::AppError,
    repositories::leads::LeadRepository,
};

/// Drives the one-off follow-up sequence over the lead store.
///
/// The scheduler is expected not to overlap runs; the internal lock makes an
/// overlapping trigger wait instead of interleaving read-modify-write cycles
/// on the store.
pub struct SequenceProcessor<R>
where
    R: LeadRepository,
{
    repo: R,
    mailer: Arc<dyn Mailer>,
    site: SiteContext,
    follow_up_delay: Duration,
    dedup_window: Duration,
    run_lock: Mutex<()>,
}

impl<R> SequenceProcessor<R>
where
    R: LeadRepository,
{
    pub fn new(
        repo: R,
        mailer: Arc<dyn Mailer>,
        site: SiteContext,
        follow_up_delay: Duration,
        dedup_window: Duration,
    ) -> Self {
        SequenceProcessor {
            repo,
            mailer,
            site,
            follow_up_delay,
            dedup_window,
            run_lock: Mutex::new(()),
        }
    }

    /// Appends a new pending lead. Emails are compared case-insensitively; a
    /// pending lead with the same address inside the de-duplication window is
    /// rejected so a double-submitted form does not queue two follow-ups.
    pub async fn add_lead(
        &self,
        email: &str,
        name: &str,
        submitted_at: DateTime<Utc>,
    ) -> Result<LeadRecord, AppError> {
        let _run = self.run_lock.lock().await;

        let email = email.trim().to_lowercase();
        let mut leads = self.repo.load().await?;

        let duplicate = leads.iter().any(|lead| {
            lead.is_pending()
                && lead.email == email
                && (submitted_at - lead.submitted_at).abs() < self.dedup_window
        });
        if duplicate {
            return Err(AppError::DuplicateLead(
                "We already have your message and will follow up soon.".to_string(),
            ));
        }

        let lead = LeadRecord::new(email, name.trim(), submitted_at);
        leads.push(lead.clone());
        self.repo.save(&leads).await?;

        debug!(lead_id = %lead.id, "lead queued for follow-up");
        Ok(lead)
    }

    /// Runs one follow-up batch against the given clock.
    ///
    /// Every stored lead is examined and lands in the report: due leads are
    /// attempted oldest first, leads still inside the delay report `not_due`,
    /// and terminal leads report `skipped`. A failed delivery leaves its lead
    /// pending for the next run without aborting the batch. Each successful
    /// send is persisted before the next lead is attempted, so an interrupted
    /// run never repeats a delivery.
    pub async fn process_due(&self, now: DateTime<Utc>) -> Result<ProcessReport, AppError> {
        let _run = self.run_lock.lock().await;

        let mut leads = self.repo.load().await?;

        let mut results = Vec::with_capacity(leads.len());
        let mut due: Vec<usize> = Vec::new();
        for (index, lead) in leads.iter().enumerate() {
            match lead.status {
                LeadStatus::Pending if lead.is_due(now, self.follow_up_delay) => due.push(index),
                LeadStatus::Pending => results.push(LeadOutcome::not_due(lead.id)),
                _ => results.push(LeadOutcome::skipped(lead.id)),
            }
        }
        due.sort_by_key(|&index| leads[index].submitted_at);

        let mut sent = 0;
        let mut errors = 0;
        for index in due {
            let message = {
                let lead = &leads[index];
                templates::follow_up_email(&lead.email, &lead.name, &self.site)
            };
            match self.mailer.send(message).await {
                Ok(()) => {
                    leads[index].mark_followed_up(now);
                    self.repo.save(&leads).await?;
                    sent += 1;
                    results.push(LeadOutcome::sent(leads[index].id));
                }
                Err(err) => {
                    warn!(
                        lead_id = %leads[index].id,
                        error = %err,
                        "follow-up delivery failed; lead stays pending",
                    );
                    errors += 1;
                    results.push(LeadOutcome::failed(leads[index].id, err.to_string()));
                }
            }
        }

        let report = ProcessReport {
            processed: results.len(),
            sent,
            errors,
            results,
        };
        info!(
            processed = report.processed,
            sent = report.sent,
            errors = report.errors,
            "sequence run complete",
        );
        Ok(report)
    }

    /// Read-only aggregate over the store; never mutates.
    pub async fn stats(&self) -> Result<SequenceStats, AppError> {
        let leads = self.repo.load().await?;
        Ok(SequenceStats::from_leads(&leads))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::mailer::FakeMailer;
    use crate::entities::lead::SequenceOutcome;
    use crate::repositories::leads::{JsonLeadStore, MockLeadRepository};
    use tempfile::{TempDir, tempdir};
    use url::Url;

    fn site() -> SiteContext {
        SiteContext {
            owner_name: "Jordan Example".into(),
            owner_email: "jordan@example.dev".into(),
            site_url: Url::parse("https://example.dev").unwrap(),
        }
    }

    fn processor_with(
        mailer: Arc<FakeMailer>,
    ) -> (SequenceProcessor<JsonLeadStore>, JsonLeadStore, TempDir) {
        let dir = tempdir().unwrap();
        let store = JsonLeadStore::new(dir.path().join("leads.json"));
        let processor = SequenceProcessor::new(
            store.clone(),
            mailer,
            site(),
            Duration::hours(48),
            Duration::hours(24),
        );
        (processor, store, dir)
    }

    #[tokio::test]
    async fn lead_progresses_day_by_day() {
        let mailer = Arc::new(FakeMailer::new());
        let (processor, store, _dir) = processor_with(mailer.clone());

        let day0 = Utc::now();
        processor.add_lead("a@x.com", "Avery", day0).await.unwrap();

        // Day 1: not due yet.
        let report = processor.process_due(day0 + Duration::days(1)).await.unwrap();
        assert_eq!((report.processed, report.sent), (1, 0));
        assert_eq!(report.results[0].outcome, SequenceOutcome::NotDue);
        assert_eq!(mailer.sent_count(), 0);

        // Day 2: due, follow-up goes out.
        let day2 = day0 + Duration::days(2);
        let report = processor.process_due(day2).await.unwrap();
        assert_eq!((report.processed, report.sent), (1, 1));
        assert_eq!(report.results[0].outcome, SequenceOutcome::Sent);
        assert_eq!(mailer.sent_count(), 1);
        assert_eq!(mailer.last_message().unwrap().to, "a@x.com");

        let leads = store.load().await.unwrap();
        assert_eq!(leads[0].status, LeadStatus::FollowedUp);
        assert_eq!(leads[0].follow_up_sent_at, Some(day2));

        // Day 3: already followed up, skipped.
        let report = processor.process_due(day0 + Duration::days(3)).await.unwrap();
        assert_eq!((report.processed, report.sent), (1, 0));
        assert_eq!(report.results[0].outcome, SequenceOutcome::Skipped);
        assert_eq!(mailer.sent_count(), 1);
    }

    #[tokio::test]
    async fn delay_boundary_is_inclusive() {
        let mailer = Arc::new(FakeMailer::new());
        let (processor, _store, _dir) = processor_with(mailer.clone());

        let submitted = Utc::now();
        processor.add_lead("b@x.com", "Blair", submitted).await.unwrap();

        let just_before = submitted + Duration::hours(48) - Duration::milliseconds(1);
        let report = processor.process_due(just_before).await.unwrap();
        assert_eq!(report.sent, 0);
        assert_eq!(report.results[0].outcome, SequenceOutcome::NotDue);

        let report = processor.process_due(submitted + Duration::hours(48)).await.unwrap();
        assert_eq!(report.sent, 1);
        assert_eq!(mailer.sent_count(), 1);
    }

    #[tokio::test]
    async fn reprocessing_sends_at_most_once_per_lead() {
        let mailer = Arc::new(FakeMailer::new());
        let (processor, _store, _dir) = processor_with(mailer.clone());

        let day0 = Utc::now();
        processor.add_lead("one@x.com", "One", day0).await.unwrap();
        processor.add_lead("two@x.com", "Two", day0).await.unwrap();

        let now = day0 + Duration::days(3);
        let first = processor.process_due(now).await.unwrap();
        let second = processor.process_due(now).await.unwrap();

        assert_eq!(first.sent, 2);
        assert_eq!(second.sent, 0);
        assert_eq!(second.processed, 2);
        assert_eq!(mailer.sent_count(), 2);
    }

    #[tokio::test]
    async fn due_leads_go_out_oldest_first() {
        let mailer = Arc::new(FakeMailer::new());
        let (processor, store, _dir) = processor_with(mailer.clone());

        let base = Utc::now() - Duration::days(10);
        // Stored out of submission order on purpose.
        store
            .save(&[
                LeadRecord::new("middle@x.com", "Mid", base + Duration::days(1)),
                LeadRecord::new("oldest@x.com", "Old", base),
                LeadRecord::new("newest@x.com", "New", base + Duration::days(2)),
            ])
            .await
            .unwrap();

        processor.process_due(Utc::now()).await.unwrap();

        let recipients: Vec<String> = mailer
            .sent_messages()
            .into_iter()
            .map(|message| message.to)
            .collect();
        assert_eq!(recipients, vec!["oldest@x.com", "middle@x.com", "newest@x.com"]);
    }

    #[tokio::test]
    async fn one_failed_delivery_does_not_block_the_batch() {
        let mailer = Arc::new(FakeMailer::new());
        mailer.fail_for("a@x.com");
        let (processor, store, _dir) = processor_with(mailer.clone());

        let day0 = Utc::now() - Duration::days(5);
        processor.add_lead("a@x.com", "A", day0).await.unwrap();
        processor
            .add_lead("b@x.com", "B", day0 + Duration::hours(1))
            .await
            .unwrap();

        let report = processor.process_due(Utc::now()).await.unwrap();
        assert_eq!(report.processed, 2);
        assert_eq!(report.sent, 1);
        assert_eq!(report.errors, 1);

        let failed = report
            .results
            .iter()
            .find(|outcome| outcome.outcome == SequenceOutcome::Failed)
            .unwrap();
        assert!(failed.error.as_deref().unwrap().contains("a@x.com"));

        let leads = store.load().await.unwrap();
        let by_email = |email: &str| leads.iter().find(|l| l.email == email).unwrap();
        assert_eq!(by_email("a@x.com").status, LeadStatus::Pending);
        assert_eq!(by_email("b@x.com").status, LeadStatus::FollowedUp);

        // Next run with a healthy transport retries only the failed lead.
        let retry_mailer = Arc::new(FakeMailer::new());
        let retry = SequenceProcessor::new(
            store.clone(),
            retry_mailer.clone(),
            site(),
            Duration::hours(48),
            Duration::hours(24),
        );
        let report = retry.process_due(Utc::now()).await.unwrap();
        assert_eq!(report.sent, 1);
        assert_eq!(retry_mailer.last_message().unwrap().to, "a@x.com");
    }

    #[tokio::test]
    async fn duplicate_pending_lead_is_rejected_within_the_window() {
        let mailer = Arc::new(FakeMailer::new());
        let (processor, store, _dir) = processor_with(mailer);

        let now = Utc::now();
        processor.add_lead("Ada@X.com", "Ada", now).await.unwrap();

        let err = processor
            .add_lead("ada@x.com", "Ada again", now + Duration::hours(2))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateLead(_)));
        assert_eq!(store.load().await.unwrap().len(), 1);

        // Outside the window the same address may come back.
        processor
            .add_lead("ada@x.com", "Ada later", now + Duration::hours(25))
            .await
            .unwrap();
        assert_eq!(store.load().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn followed_up_lead_does_not_block_a_new_submission() {
        let mailer = Arc::new(FakeMailer::new());
        let (processor, _store, _dir) = processor_with(mailer);

        let day0 = Utc::now() - Duration::days(4);
        processor.add_lead("c@x.com", "Cam", day0).await.unwrap();
        processor.process_due(day0 + Duration::days(2)).await.unwrap();

        // The earlier lead is terminal, so the fresh submission is not a duplicate.
        let lead = processor.add_lead("c@x.com", "Cam", Utc::now()).await.unwrap();
        assert!(lead.is_pending());

        let stats = processor.stats().await.unwrap();
        assert_eq!(stats.total_leads, 2);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.followed_up, 1);
    }

    #[tokio::test]
    async fn a_failed_save_aborts_the_run() {
        let mut repo = MockLeadRepository::new();
        let submitted = Utc::now() - Duration::days(5);
        repo.expect_load()
            .returning(move || Ok(vec![LeadRecord::new("d@x.com", "Dee", submitted)]));
        repo.expect_save()
            .returning(|_| Err(crate::errors::StoreError::Io("disk full".into())));

        let processor = SequenceProcessor::new(
            repo,
            Arc::new(FakeMailer::new()),
            site(),
            Duration::hours(48),
            Duration::hours(24),
        );

        let err = processor.process_due(Utc::now()).await.unwrap_err();
        assert!(matches!(err, AppError::PersistenceError(_)));
    }

    #[tokio::test]
    async fn excluded_leads_are_reported_as_skipped() {
        let mailer = Arc::new(FakeMailer::new());
        let (processor, store, _dir) = processor_with(mailer.clone());

        let mut lead = LeadRecord::new("opted-out@x.com", "Out", Utc::now() - Duration::days(9));
        lead.mark_excluded();
        store.save(&[lead]).await.unwrap();

        let report = processor.process_due(Utc::now()).await.unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.sent, 0);
        assert_eq!(report.results[0].outcome, SequenceOutcome::Skipped);
        assert_eq!(mailer.sent_count(), 0);

        let stats = processor.stats().await.unwrap();
        assert_eq!(stats.excluded, 1);
    }
}
