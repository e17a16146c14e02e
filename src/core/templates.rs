//! HTML email bodies
//!
//! Every submitted value is HTML-escaped before interpolation. The message
//! body is additionally converted line-break to `<br />` after escaping.

use crate::models::{ContactConfig, MailMessage, ValidatedSubmission};
use crate::utils::constants::ADMIN_SUBJECT_PREFIX;
use crate::utils::html::{escape_html, escape_multiline};

/// Notification to the site admin, Reply-To the submitter
pub fn admin_notification(submission: &ValidatedSubmission, config: &ContactConfig) -> MailMessage {
    let body = format!(
        r#"<html>
<head>
  <title>New Contact Form Submission</title>
</head>
<body>
  <p><strong>Name:</strong> {name}</p>
  <p><strong>Email:</strong> {email}</p>
  <p><strong>Subject:</strong> {subject}</p>
  <p><strong>Message:</strong></p>
  <div>{message}</div>
</body>
</html>
"#,
        name = escape_html(&submission.name),
        email = escape_html(&submission.email),
        subject = escape_html(&submission.subject),
        message = escape_multiline(&submission.message),
    );

    MailMessage::html(
        config.admin_email.clone(),
        format!("{}{}", ADMIN_SUBJECT_PREFIX, submission.subject),
        body,
    )
    .with_reply_to(submission.email.clone())
}

/// Acknowledgement to the submitter, echoing their message back
pub fn submitter_confirmation(submission: &ValidatedSubmission, config: &ContactConfig) -> MailMessage {
    let site = escape_html(&config.site_name);
    let subject_line = format!("{} Got Your Message", config.site_name);

    let links = if config.resource_links.is_empty() {
        String::new()
    } else {
        let items: String = config
            .resource_links
            .iter()
            .map(|link| {
                format!(
                    "    <li><a href=\"{}\">{}</a></li>\n",
                    escape_html(&link.url),
                    escape_html(&link.label)
                )
            })
            .collect();
        format!(
            "  <p>While you're waiting, feel free to explore {site}:</p>\n  <ul>\n{items}  </ul>\n",
            site = site,
            items = items
        )
    };

    let body = format!(
        r#"<html>
<head>
  <title>{title}</title>
</head>
<body>
  <p>Hey {name},</p>
  <p>Thank you for reaching out to {site}! We've received your message and will get back to you within {window}.</p>
  <p>Here's a summary of what you sent:</p>
  <p><strong>Subject:</strong> {subject}</p>
  <blockquote>{message}</blockquote>
{links}  <p>Much love,<br />{site}</p>
</body>
</html>
"#,
        title = escape_html(&subject_line),
        name = escape_html(&submission.name),
        site = site,
        window = escape_html(&config.response_window),
        subject = escape_html(&submission.subject),
        message = escape_multiline(&submission.message),
        links = links,
    );

    MailMessage::html(submission.email.clone(), subject_line, body)
        .with_from(format!("{} <{}>", config.site_name, config.admin_email))
}
