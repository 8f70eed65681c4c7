/// Contact workflows shared by the sidebar and the dashboard
use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::models::{
    Contact, Interaction, InteractionKind, Meeting, MeetingStatus, NewContact, NewInteraction,
    NewMeeting,
};

/// Contact form input before validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactDraft {
    pub email: String,
    pub name: String,
    pub company: String,
    pub title: String,
    pub phone: String,
    pub notes: String,
}

impl ContactDraft {
    pub fn from_email(email: &str) -> ContactDraft {
        ContactDraft {
            email: email.to_string(),
            ..ContactDraft::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InteractionDraft {
    pub kind: InteractionKind,
    pub subject: String,
    pub content: String,
    /// Page the interaction happened on
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeetingDraft {
    pub title: String,
    pub description: String,
    pub scheduled_at: String,
    pub duration_minutes: u32,
    pub meeting_url: String,
}

/// Trimmed text, or `None` when nothing is left
pub fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Save a contact unless the user already has one with the same email
pub async fn add_contact<G: Gateway>(gateway: &G, draft: &ContactDraft) -> Result<Contact> {
    let email = non_empty(&draft.email)
        .ok_or_else(|| Error::Validation("Email is required".to_string()))?;
    let user = gateway.current_user().ok_or(Error::NotSignedIn)?;

    if gateway.find_contact_by_email(&email).await?.is_some() {
        log::debug!("Contact {} already exists", email);
        return Err(Error::DuplicateContact(email));
    }

    let contact = NewContact {
        user_id: user.id,
        email,
        name: non_empty(&draft.name),
        company: non_empty(&draft.company),
        title: non_empty(&draft.title),
        phone: non_empty(&draft.phone),
        notes: draft.notes.trim().to_string(),
    };

    let saved = gateway.insert_contact(&contact).await?;
    log::info!("Added contact {}", saved.email);
    Ok(saved)
}

/// Record an interaction, then mark the contact as recently contacted
pub async fn log_interaction<G: Gateway>(
    gateway: &G,
    contact_id: &str,
    draft: &InteractionDraft,
) -> Result<Interaction> {
    let user = gateway.current_user().ok_or(Error::NotSignedIn)?;

    let interaction = gateway
        .insert_interaction(&NewInteraction {
            user_id: user.id,
            contact_id: contact_id.to_string(),
            kind: draft.kind,
            subject: non_empty(&draft.subject),
            content: draft.content.trim().to_string(),
            url: draft.url.clone(),
        })
        .await?;

    if let Err(e) = gateway
        .touch_contact(contact_id, &interaction.created_at)
        .await
    {
        log::warn!("Could not update last contacted for {}: {}", contact_id, e);
    }

    Ok(interaction)
}

pub async fn schedule_meeting<G: Gateway>(
    gateway: &G,
    contact_id: &str,
    draft: &MeetingDraft,
) -> Result<Meeting> {
    let title = non_empty(&draft.title)
        .ok_or_else(|| Error::Validation("Meeting title is required".to_string()))?;
    let scheduled_at = non_empty(&draft.scheduled_at)
        .ok_or_else(|| Error::Validation("Meeting time is required".to_string()))?;
    if draft.duration_minutes == 0 {
        return Err(Error::Validation(
            "Duration must be at least one minute".to_string(),
        ));
    }
    let user = gateway.current_user().ok_or(Error::NotSignedIn)?;

    gateway
        .insert_meeting(&NewMeeting {
            user_id: user.id,
            contact_id: contact_id.to_string(),
            title,
            description: draft.description.trim().to_string(),
            scheduled_at,
            duration_minutes: draft.duration_minutes,
            meeting_url: non_empty(&draft.meeting_url),
            status: MeetingStatus::Scheduled,
        })
        .await
}

/// Case-insensitive match on name, email or company
pub fn filter_contacts(contacts: &[Contact], query: &str) -> Vec<Contact> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return contacts.to_vec();
    }

    let matches = |field: Option<&str>| field.is_some_and(|f| f.to_lowercase().contains(&query));

    contacts
        .iter()
        .filter(|c| {
            matches(Some(c.email.as_str())) || matches(c.name.as_deref()) || matches(c.company.as_deref())
        })
        .cloned()
        .collect()
}

pub fn display_name(contact: &Contact) -> &str {
    contact
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(&contact.email)
}

/// Upper-cased first letter of the display name
pub fn avatar_initial(contact: &Contact) -> String {
    display_name(contact)
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "?".to_string())
}

/// Detected emails minus one that was just saved
pub fn without_email(emails: &[String], saved: &str) -> Vec<String> {
    emails
        .iter()
        .filter(|email| email.as_str() != saved)
        .cloned()
        .collect()
}
