//! Email bodies for each message kind.

use crate::email::EmailMessage;

const FOOTER_TEXT: &str = "---\nHerald\nThis email was sent automatically. Please do not reply.";

/// Escape the characters that matter inside HTML text nodes.
fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap body markup in the shared layout.
fn layout(accent: &str, heading: &str, body: &str) -> String {
    format!(
        r#"<html>
  <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
      <div style="text-align: center; padding: 20px 0; background-color: {accent}; border-radius: 8px 8px 0 0;">
        <h1 style="color: #ffffff; margin: 0; font-size: 26px;">{heading}</h1>
      </div>
      <div style="padding: 30px; background-color: #f9fafb;">
        {body}
      </div>
      <div style="text-align: center; padding: 16px; background-color: #f3f4f6; border-radius: 0 0 8px 8px;">
        <p style="font-size: 12px; color: #6b7280; margin: 0;">
          Sent automatically by <strong>Herald</strong>. Please do not reply.
        </p>
      </div>
    </div>
  </body>
</html>"#
    )
}

pub fn welcome(name: &str) -> EmailMessage {
    let html_body = format!(
        r#"<p>Hi <strong>{}</strong>,</p>
        <p>Thanks for joining Herald. You can now create events, register for events and get notified about them.</p>"#,
        escape_html(name)
    );

    EmailMessage {
        subject: "Welcome to Herald!".to_string(),
        html: layout("#10b981", "Welcome!", &html_body),
        text: format!(
            "Welcome!\n\nHi {},\n\nThanks for joining Herald. You can now create events, register for events and get notified about them.\n\n{}",
            name, FOOTER_TEXT
        ),
    }
}

pub fn reminder(name: &str, event_title: &str, event_date: &str) -> EmailMessage {
    let html_body = format!(
        r#"<p>Hi <strong>{}</strong>,</p>
        <p>This is a reminder that the following event starts soon:</p>
        <h2 style="color: #667eea;">{}</h2>
        <p><strong>When:</strong> {}</p>
        <p>See you there!</p>"#,
        escape_html(name),
        escape_html(event_title),
        escape_html(event_date)
    );

    EmailMessage {
        subject: format!("Reminder: '{}' starts soon", event_title),
        html: layout("#667eea", "Event Reminder", &html_body),
        text: format!(
            "Event Reminder\n\nHi {},\n\nThis is a reminder that '{}' starts at {}.\n\nSee you there!\n\n{}",
            name, event_title, event_date, FOOTER_TEXT
        ),
    }
}

pub fn registration_confirmation(
    name: &str,
    event_title: &str,
    event_date: &str,
    event_location: &str,
) -> EmailMessage {
    let html_body = format!(
        r#"<p>Hi <strong>{}</strong>,</p>
        <p>Your registration is confirmed for:</p>
        <h2 style="color: #059669;">{}</h2>
        <p><strong>When:</strong> {}</p>
        <p><strong>Where:</strong> {}</p>
        <p>We will send you a reminder before the event starts.</p>"#,
        escape_html(name),
        escape_html(event_title),
        escape_html(event_date),
        escape_html(event_location)
    );

    EmailMessage {
        subject: format!("Registration confirmed: {}", event_title),
        html: layout("#10b981", "Registration Confirmed", &html_body),
        text: format!(
            "Registration Confirmed\n\nHi {},\n\nYour registration is confirmed for:\n\n{}\nWhen: {}\nWhere: {}\n\nWe will send you a reminder before the event starts.\n\n{}",
            name, event_title, event_date, event_location, FOOTER_TEXT
        ),
    }
}

pub fn cancellation(name: &str, event_title: &str) -> EmailMessage {
    let html_body = format!(
        r#"<p>Hi <strong>{}</strong>,</p>
        <p>We are sorry to let you know that the following event has been cancelled:</p>
        <h2 style="color: #dc2626;">{}</h2>
        <p>We will let you know if a replacement is scheduled.</p>"#,
        escape_html(name),
        escape_html(event_title)
    );

    EmailMessage {
        subject: format!("Event cancelled: {}", event_title),
        html: layout("#ef4444", "Event Cancelled", &html_body),
        text: format!(
            "Event Cancelled\n\nHi {},\n\nWe are sorry to let you know that '{}' has been cancelled.\n\nWe will let you know if a replacement is scheduled.\n\n{}",
            name, event_title, FOOTER_TEXT
        ),
    }
}

pub fn update(name: &str, event_title: &str, update_message: &str) -> EmailMessage {
    let html_body = format!(
        r#"<p>Hi <strong>{}</strong>,</p>
        <p>There is news about:</p>
        <h2 style="color: #2563eb;">{}</h2>
        <div style="background-color: #dbeafe; padding: 16px; border-radius: 8px;">{}</div>"#,
        escape_html(name),
        escape_html(event_title),
        escape_html(update_message)
    );

    EmailMessage {
        subject: format!("Event update: {}", event_title),
        html: layout("#3b82f6", "Event Update", &html_body),
        text: format!(
            "Event Update\n\nHi {},\n\nThere is news about '{}':\n\n{}\n\n{}",
            name, event_title, update_message, FOOTER_TEXT
        ),
    }
}
