/// Email template functions
///
/// Builds the messages the portal sends.
use super::{EmailResult, OutgoingEmail};
use askama::Template;
use chrono::NaiveDateTime;

/// Details of a committed registration, as needed by the confirmation email.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Confirmation {
    pub attendee_id: i32,
    pub email: String,
    pub full_name: String,
    pub event_id: i32,
    pub event_name: String,
    pub event_start: NaiveDateTime,
}

#[derive(Template)]
#[template(path = "email/registration_confirmation.html")]
struct ConfirmationHtml<'a> {
    full_name: &'a str,
    event_name: &'a str,
    starts: &'a str,
    event_link: &'a str,
    site_name: &'a str,
}

#[derive(Template)]
#[template(path = "email/registration_confirmation.txt")]
struct ConfirmationText<'a> {
    full_name: &'a str,
    event_name: &'a str,
    starts: &'a str,
    event_link: &'a str,
    site_name: &'a str,
}

/// Registration confirmation sent once an attendee's signup has been saved.
///
/// Links to the event's registration page, which lists the stored answers.
pub fn registration_confirmation(
    confirmation: &Confirmation,
    site_name: &str,
    base_url: &str,
) -> EmailResult<OutgoingEmail> {
    let event_link = format!(
        "{}/events/{}/register",
        base_url.trim_end_matches('/'),
        confirmation.event_id
    );
    let starts = confirmation
        .event_start
        .format("%A %-d %B %Y, %H:%M")
        .to_string();

    let body_text = ConfirmationText {
        full_name: &confirmation.full_name,
        event_name: &confirmation.event_name,
        starts: &starts,
        event_link: &event_link,
        site_name,
    }
    .render()?;

    let body_html = ConfirmationHtml {
        full_name: &confirmation.full_name,
        event_name: &confirmation.event_name,
        starts: &starts,
        event_link: &event_link,
        site_name,
    }
    .render()?;

    Ok(OutgoingEmail {
        to: confirmation.email.clone(),
        subject: format!("Registration confirmed: {}", confirmation.event_name),
        body_text,
        body_html: Some(body_html),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn confirmation() -> Confirmation {
        Confirmation {
            attendee_id: 4,
            email: "jane@example.com".to_string(),
            full_name: "Jane Doe".to_string(),
            event_id: 9,
            event_name: "Fintech <Summit>".to_string(),
            event_start: NaiveDate::from_ymd_opt(2026, 11, 3)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
        }
    }

    #[test]
    fn test_confirmation_contents() {
        let email =
            registration_confirmation(&confirmation(), "EFS Portal", "https://efs.example.com/")
                .unwrap();

        assert_eq!(email.to, "jane@example.com");
        assert_eq!(email.subject, "Registration confirmed: Fintech <Summit>");
        assert!(email.body_text.contains("Hello Jane Doe"));
        assert!(email.body_text.contains("Tuesday 3 November 2026, 09:30"));
        assert!(email.body_text.contains("https://efs.example.com/events/9/register"));
        assert!(email.body_text.contains("You are registered for Fintech <Summit>."));

        let html = email.body_html.unwrap();
        assert!(html.contains("Fintech &lt;Summit&gt;"));
        assert!(!html.contains("<Summit>"));
        assert!(html.contains(r#"href="https://efs.example.com/events/9/register""#));
        assert!(!html.contains("/api/events/"));
    }
}
