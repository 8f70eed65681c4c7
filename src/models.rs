/// Data structures for RelationHub rows and browser tabs
use serde::{Deserialize, Serialize};

/// Information about a browser tab, as returned by chrome.tabs.query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_id: Option<i32>,
    #[serde(default)]
    pub active: bool,
}

/// Name and email of a contact embedded in interaction/meeting listings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContactRef {
    pub name: Option<String>,
    pub email: String,
}

/// A saved contact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    pub id: String,
    pub user_id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub last_contacted: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Insert payload for a contact; absent optionals are left to column defaults
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct NewContact {
    pub user_id: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

impl NewContact {
    pub fn from_email(user_id: &str, email: &str) -> NewContact {
        NewContact {
            user_id: user_id.to_string(),
            email: email.to_string(),
            ..NewContact::default()
        }
    }
}

/// Editable contact fields; `None` clears the column
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ContactChanges {
    pub name: Option<String>,
    pub company: Option<String>,
    pub title: Option<String>,
    pub phone: Option<String>,
    pub linkedin_url: Option<String>,
    pub website: Option<String>,
    pub notes: String,
    pub tags: Vec<String>,
}

impl From<&Contact> for ContactChanges {
    fn from(contact: &Contact) -> Self {
        ContactChanges {
            name: contact.name.clone(),
            company: contact.company.clone(),
            title: contact.title.clone(),
            phone: contact.phone.clone(),
            linkedin_url: contact.linkedin_url.clone(),
            website: contact.website.clone(),
            notes: contact.notes.clone(),
            tags: contact.tags.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Email,
    Call,
    Meeting,
    Note,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::Email => "email",
            InteractionKind::Call => "call",
            InteractionKind::Meeting => "meeting",
            InteractionKind::Note => "note",
        }
    }
}

/// A logged touchpoint with a contact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    pub id: String,
    pub user_id: String,
    pub contact_id: String,
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub url: Option<String>,
    pub created_at: String,
    #[serde(default, rename = "contacts", skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactRef>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewInteraction {
    pub user_id: String,
    pub contact_id: String,
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MeetingStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingStatus::Scheduled => "scheduled",
            MeetingStatus::Completed => "completed",
            MeetingStatus::Cancelled => "cancelled",
        }
    }
}

/// A meeting scheduled with a contact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Meeting {
    pub id: String,
    pub user_id: String,
    pub contact_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub scheduled_at: String,
    pub duration_minutes: u32,
    #[serde(default)]
    pub meeting_url: Option<String>,
    pub status: MeetingStatus,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, rename = "contacts", skip_serializing_if = "Option::is_none")]
    pub contact: Option<ContactRef>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewMeeting {
    pub user_id: String,
    pub contact_id: String,
    pub title: String,
    pub description: String,
    pub scheduled_at: String,
    pub duration_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meeting_url: Option<String>,
    pub status: MeetingStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tab_info_from_chrome() {
        let tab: TabInfo = serde_json::from_value(json!({
            "id": 7,
            "url": "https://example.com/team",
            "title": "Team",
            "windowId": 2,
            "active": true,
            "favIconUrl": "https://example.com/favicon.ico",
            "pinned": false
        }))
        .unwrap();

        assert_eq!(tab.id, Some(7));
        assert_eq!(tab.window_id, Some(2));
        assert!(tab.active);
        assert_eq!(tab.url.as_deref(), Some("https://example.com/team"));
    }

    #[test]
    fn test_tab_info_without_id() {
        let tab: TabInfo = serde_json::from_value(json!({ "active": true })).unwrap();

        assert_eq!(tab.id, None);
        assert_eq!(serde_json::to_value(&tab).unwrap(), json!({ "active": true }));
    }

    #[test]
    fn test_contact_row_defaults() {
        let contact: Contact = serde_json::from_value(json!({
            "id": "c1",
            "user_id": "u1",
            "email": "a@b.com",
            "name": null,
            "created_at": "2024-10-28T10:30:00Z",
            "updated_at": "2024-10-28T10:30:00Z"
        }))
        .unwrap();

        assert_eq!(contact.name, None);
        assert_eq!(contact.notes, "");
        assert!(contact.tags.is_empty());
    }

    #[test]
    fn test_new_contact_skips_empty_fields() {
        let new = NewContact::from_email("u1", "a@b.com");
        assert_eq!(
            serde_json::to_value(&new).unwrap(),
            json!({ "user_id": "u1", "email": "a@b.com" })
        );
    }

    #[test]
    fn test_contact_changes_clear_with_null() {
        let changes = ContactChanges {
            name: Some("Ada".to_string()),
            company: None,
            title: None,
            phone: None,
            linkedin_url: None,
            website: None,
            notes: String::new(),
            tags: vec!["vip".to_string()],
        };
        let value = serde_json::to_value(&changes).unwrap();

        assert_eq!(value["name"], "Ada");
        assert!(value["company"].is_null());
        assert_eq!(value["tags"], json!(["vip"]));
    }

    #[test]
    fn test_interaction_with_embedded_contact() {
        let interaction: Interaction = serde_json::from_value(json!({
            "id": "i1",
            "user_id": "u1",
            "contact_id": "c1",
            "type": "call",
            "subject": null,
            "content": "Phone call",
            "url": "https://x",
            "created_at": "2024-10-28T10:30:00Z",
            "contacts": { "name": "Ada", "email": "ada@x.io" }
        }))
        .unwrap();

        assert_eq!(interaction.kind, InteractionKind::Call);
        assert_eq!(interaction.contact.unwrap().email, "ada@x.io");
    }

    #[test]
    fn test_new_interaction_serializes_type() {
        let new = NewInteraction {
            user_id: "u1".to_string(),
            contact_id: "c1".to_string(),
            kind: InteractionKind::Note,
            subject: None,
            content: "Met on website".to_string(),
            url: Some("https://x".to_string()),
        };
        let value = serde_json::to_value(&new).unwrap();

        assert_eq!(value["type"], "note");
        assert!(value.get("subject").is_none());
    }

    #[test]
    fn test_meeting_status_round_trip() {
        let meeting: Meeting = serde_json::from_value(json!({
            "id": "m1",
            "user_id": "u1",
            "contact_id": "c1",
            "title": "Intro",
            "description": "",
            "scheduled_at": "2024-11-01T15:00:00Z",
            "duration_minutes": 30,
            "meeting_url": null,
            "status": "cancelled",
            "created_at": "2024-10-28T10:30:00Z",
            "updated_at": "2024-10-28T10:30:00Z"
        }))
        .unwrap();

        assert_eq!(meeting.status, MeetingStatus::Cancelled);
        assert_eq!(meeting.status.as_str(), "cancelled");
        assert_eq!(meeting.contact, None);
    }
}
