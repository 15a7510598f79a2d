use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use super::delivery::EmailMessage;
use super::domain::Candidate;

/// Render the digest sent to one subscriber for a batch of matched
/// candidates.
pub fn render_digest(recipient: &str, candidates: &[Candidate]) -> EmailMessage {
    let subject = if candidates.len() == 1 {
        "1 new candidate matches your preferences".to_string()
    } else {
        format!(
            "{} new candidates match your preferences",
            candidates.len()
        )
    };

    let mut html = String::new();
    html.push_str("<h1>New candidates on Talentwire</h1>\n<ul>\n");
    for candidate in candidates {
        writeln!(html, "<li>{}</li>", escape_html(&candidate_line(candidate)))
            .expect("write digest entry");
    }
    html.push_str("</ul>\n");
    html.push_str(
        "<p>You are receiving this digest because these candidates match your saved \
         subscription preferences.</p>\n",
    );

    EmailMessage {
        to: recipient.to_string(),
        subject,
        html_body: html,
    }
}

/// Render the mailbox-ownership email carrying a verification code.
pub fn render_verification(
    recipient: &str,
    code: &str,
    expires_at: DateTime<Utc>,
) -> EmailMessage {
    let mut html = String::new();
    html.push_str("<h1>Confirm your Talentwire subscription</h1>\n");
    writeln!(
        html,
        "<p>Your verification code is <strong>{}</strong>.</p>",
        escape_html(code)
    )
    .expect("write code paragraph");
    writeln!(
        html,
        "<p>The code expires at {} and allows a limited number of attempts. \
         If you did not request this subscription, ignore this email.</p>",
        expires_at.format("%Y-%m-%d %H:%M UTC")
    )
    .expect("write expiry paragraph");

    EmailMessage {
        to: recipient.to_string(),
        subject: "Your Talentwire verification code".to_string(),
        html_body: html,
    }
}

fn candidate_line(candidate: &Candidate) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(city) = candidate.city.as_deref() {
        parts.push(city);
    }
    if let Some(category) = candidate.category.as_deref() {
        parts.push(category);
    }
    if let Some(kind) = candidate.employment_type.as_deref() {
        parts.push(kind);
    }

    let mut line = if parts.is_empty() {
        format!("Candidate {}", candidate.id.0)
    } else {
        format!("Candidate {}: {}", candidate.id.0, parts.join(", "))
    };

    if !candidate.languages.is_empty() {
        write!(line, " ({})", candidate.languages.join(", ")).expect("write languages");
    }
    if candidate.demanded {
        line.push_str(" [in demand]");
    }
    line
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
