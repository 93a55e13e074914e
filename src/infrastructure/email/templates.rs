use chrono::{DateTime, Utc};
use url::Url;

use super::mailer::EmailMessage;
use crate::entities::contact::ContactForm;

/// Everything the templates need to sign and address mail.
#[derive(Debug, Clone)]
pub struct SiteContext {
    pub owner_name: String,
    pub owner_email: String,
    pub site_url: Url,
}

/// User-supplied text must never reach the HTML body unsanitized. The empty
/// builder strips every tag while leaving plain text readable.
fn escape(text: &str) -> String {
    ammonia::Builder::empty().clean(text).to_string()
}

fn multiline(text: &str) -> String {
    text.lines().map(escape).collect::<Vec<_>>().join("<br>\n")
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Instant acknowledgement sent to the visitor after a successful submission.
pub fn confirmation_email(to: &str, name: &str, site: &SiteContext) -> EmailMessage {
    let name = name.trim();
    let text = format!(
        "Hi {name},\n\n\
         Thanks for getting in touch! Your message just landed in my inbox.\n\
         I usually reply within a day or two.\n\n\
         {owner}\n{url}",
        owner = site.owner_name,
        url = site.site_url,
    );
    let html = format!(
        "<p>Hi {name},</p>\
         <p>Thanks for getting in touch! Your message just landed in my inbox.<br>\n\
         I usually reply within a day or two.</p>\
         <p>{owner}<br>\n<a href=\"{url}\">{url}</a></p>",
        name = escape(name),
        owner = escape(&site.owner_name),
        url = site.site_url,
    );

    EmailMessage {
        to: to.trim().to_string(),
        subject: "Thanks for reaching out!".to_string(),
        html,
        text,
    }
}

/// Full submission forwarded to the site owner.
pub fn owner_notification_email(
    form: &ContactForm,
    site: &SiteContext,
    received_at: DateTime<Utc>,
) -> EmailMessage {
    let mut text = format!(
        "New contact form submission\n\nName: {}\nEmail: {}\n",
        form.name.trim(),
        form.email.trim(),
    );
    let mut html = format!(
        "<h2>New contact form submission</h2>\
         <p><strong>Name:</strong> {}<br>\n\
         <strong>Email:</strong> {}<br>\n",
        escape(form.name.trim()),
        escape(form.email.trim()),
    );

    let optional_lines = [
        ("Company", &form.company),
        ("Phone", &form.phone),
        ("Project type", &form.project_type),
        ("Budget", &form.budget),
        ("Timeline", &form.timeline),
        ("Source", &form.source),
    ];
    for (label, value) in optional_lines {
        if let Some(value) = non_empty(value) {
            text.push_str(&format!("{}: {}\n", label, value));
            html.push_str(&format!("<strong>{}:</strong> {}<br>\n", label, escape(value)));
        }
    }

    text.push_str(&format!(
        "Received: {}\n\n{}\n",
        received_at.to_rfc3339(),
        form.message.trim(),
    ));
    html.push_str(&format!(
        "<strong>Received:</strong> {}</p>\
         <blockquote>{}</blockquote>",
        received_at.to_rfc3339(),
        multiline(form.message.trim()),
    ));

    EmailMessage {
        to: site.owner_email.clone(),
        subject: format!("New contact from {}", form.name.trim()),
        html,
        text,
    }
}

/// The one-off follow-up nudge sent once the delay has elapsed.
pub fn follow_up_email(to: &str, name: &str, site: &SiteContext) -> EmailMessage {
    let name = name.trim();
    let text = format!(
        "Hi {name},\n\n\
         Just checking in on the message you sent through {url} - \
         I didn't want it to slip through the cracks.\n\
         If you'd still like to talk, just reply to this email.\n\n\
         {owner}",
        url = site.site_url,
        owner = site.owner_name,
    );
    let html = format!(
        "<p>Hi {name},</p>\
         <p>Just checking in on the message you sent through \
         <a href=\"{url}\">{url}</a> - I didn't want it to slip through the cracks.<br>\n\
         If you'd still like to talk, just reply to this email.</p>\
         <p>{owner}</p>",
        name = escape(name),
        url = site.site_url,
        owner = escape(&site.owner_name),
    );

    EmailMessage {
        to: to.trim().to_string(),
        subject: "Following up on your message".to_string(),
        html,
        text,
    }
}
