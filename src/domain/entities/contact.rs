use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9\s\-().]{7,20}$").expect("phone pattern compiles"));

/// The contact form body. Only name, email and message are required; the rest
/// are the extended project-inquiry fields the frontend may or may not send.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ContactForm {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,

    #[validate(
        email(message = "Invalid email format"),
        length(max = 200, message = "Email must be at most 200 characters")
    )]
    pub email: String,

    /// Older frontend builds posted this field as `description`.
    #[serde(alias = "description")]
    #[validate(length(
        min = 10,
        max = 5000,
        message = "Message must be between 10 and 5000 characters"
    ))]
    pub message: String,

    #[validate(length(max = 200, message = "Company must be at most 200 characters"))]
    pub company: Option<String>,

    #[validate(regex(path = *PHONE_RE, message = "Invalid phone number"))]
    pub phone: Option<String>,

    #[serde(alias = "projectType")]
    #[validate(length(max = 100, message = "Project type must be at most 100 characters"))]
    pub project_type: Option<String>,

    #[validate(length(max = 100, message = "Budget must be at most 100 characters"))]
    pub budget: Option<String>,

    #[validate(length(max = 100, message = "Timeline must be at most 100 characters"))]
    pub timeline: Option<String>,

    #[validate(length(max = 200, message = "Source must be at most 200 characters"))]
    pub source: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ContactAck {
    pub success: bool,
    pub message: String,
}
