use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a captured lead. A lead is created `Pending`, becomes
/// `FollowedUp` exactly once after the follow-up email goes out, and can be
/// parked as `Excluded` to opt it out of the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeadStatus {
    Pending,
    FollowedUp,
    Excluded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub submitted_at: DateTime<Utc>,
    pub status: LeadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_sent_at: Option<DateTime<Utc>>,
}

impl LeadRecord {
    pub fn new(email: impl Into<String>, name: impl Into<String>, submitted_at: DateTime<Utc>) -> Self {
        LeadRecord {
            id: Uuid::new_v4(),
            email: email.into(),
            name: name.into(),
            submitted_at,
            status: LeadStatus::Pending,
            follow_up_sent_at: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == LeadStatus::Pending
    }

    /// A pending lead becomes due the moment the delay has fully elapsed;
    /// `submitted_at + delay` itself counts as due.
    pub fn is_due(&self, now: DateTime<Utc>, delay: Duration) -> bool {
        self.is_pending() && now.signed_duration_since(self.submitted_at) >= delay
    }

    /// Records the follow-up send. The timestamp is written only once; a lead
    /// that somehow reaches this twice keeps its original send time.
    pub fn mark_followed_up(&mut self, sent_at: DateTime<Utc>) {
        self.status = LeadStatus::FollowedUp;
        if self.follow_up_sent_at.is_none() {
            self.follow_up_sent_at = Some(sent_at);
        }
    }

    /// Opts the lead out of the sequence without deleting its history.
    pub fn mark_excluded(&mut self) {
        self.status = LeadStatus::Excluded;
    }
}

/// Per-lead verdict from a sequence run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceOutcome {
    /// Follow-up delivered and the lead transitioned to `FollowedUp`.
    Sent,
    /// Still pending, delay not yet elapsed.
    NotDue,
    /// Not pending anymore (already followed up or excluded).
    Skipped,
    /// Delivery failed; the lead stays pending for the next run.
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadOutcome {
    pub lead_id: Uuid,
    pub outcome: SequenceOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl LeadOutcome {
    pub fn sent(lead_id: Uuid) -> Self {
        LeadOutcome {
            lead_id,
            outcome: SequenceOutcome::Sent,
            error: None,
        }
    }

    pub fn not_due(lead_id: Uuid) -> Self {
        LeadOutcome {
            lead_id,
            outcome: SequenceOutcome::NotDue,
            error: None,
        }
    }

    pub fn skipped(lead_id: Uuid) -> Self {
        LeadOutcome {
            lead_id,
            outcome: SequenceOutcome::Skipped,
            error: None,
        }
    }

    pub fn failed(lead_id: Uuid, error: impl Into<String>) -> Self {
        LeadOutcome {
            lead_id,
            outcome: SequenceOutcome::Failed,
            error: Some(error.into()),
        }
    }
}

/// Summary of one sequence run. `processed` counts every stored lead that was
/// examined, so it always equals `results.len()`.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessReport {
    pub processed: usize,
    pub sent: usize,
    pub errors: usize,
    pub results: Vec<LeadOutcome>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SequenceStats {
    pub total_leads: usize,
    pub pending: usize,
    pub followed_up: usize,
    pub excluded: usize,
}

impl SequenceStats {
    pub fn from_leads(leads: &[LeadRecord]) -> Self {
        let mut stats = SequenceStats {
            total_leads: leads.len(),
            pending: 0,
            followed_up: 0,
            excluded: 0,
        };
        for lead in leads {
            match lead.status {
                LeadStatus::Pending => stats.pending += 1,
                LeadStatus::FollowedUp => stats.followed_up += 1,
                LeadStatus::Excluded => stats.excluded += 1,
            }
        }
        stats
    }
}
