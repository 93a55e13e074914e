use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

/// Rate-limit bucket shared by requests whose client address cannot be resolved.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// File name of the lead store inside the data directory.
pub const LEADS_FILE: &str = "leads.json";
