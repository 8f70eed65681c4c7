/// Cross-context message kinds exchanged between the background worker,
/// the content script and the sidebar frame
use crate::error::Result;
use crate::models::TabInfo;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use wasm_bindgen::JsValue;

/// chrome.runtime / chrome.tabs messages, tagged by `action`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuntimeMessage {
    ToggleSidebar,
    DetectEmails,
    GetActiveTab,
    DetectEmailsInTab,
}

/// window.postMessage traffic between host page and sidebar frame, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FrameMessage {
    DetectedEmails(PageEmails),
    CloseSidebar,
    RefreshEmails,
}

/// Emails found on a page along with the page's URL
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PageEmails {
    pub emails: Vec<String>,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToggleReply {
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveTabReply {
    pub tab: Option<TabInfo>,
}

/// Sent back by the relay when the inner hop cannot complete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayFailure {
    pub error: String,
}

/// Serialize into a plain JS object (never an ES `Map`), safe for
/// postMessage and chrome messaging
pub fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    Ok(value.serialize(&serializer)?)
}

pub fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T> {
    Ok(serde_wasm_bindgen::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_runtime_message_wire_names() {
        assert_eq!(
            serde_json::to_value(RuntimeMessage::ToggleSidebar).unwrap(),
            json!({ "action": "TOGGLE_SIDEBAR" })
        );
        assert_eq!(
            serde_json::to_value(RuntimeMessage::DetectEmailsInTab).unwrap(),
            json!({ "action": "DETECT_EMAILS_IN_TAB" })
        );

        let parsed: RuntimeMessage =
            serde_json::from_value(json!({ "action": "GET_ACTIVE_TAB" })).unwrap();
        assert_eq!(parsed, RuntimeMessage::GetActiveTab);
    }

    #[test]
    fn test_runtime_message_unknown_action() {
        let parsed = serde_json::from_value::<RuntimeMessage>(json!({ "action": "OPEN_POPUP" }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_frame_message_detected_emails_is_flat() {
        let message = FrameMessage::DetectedEmails(PageEmails {
            emails: vec!["a@b.com".to_string()],
            url: "https://x".to_string(),
        });

        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({ "type": "DETECTED_EMAILS", "emails": ["a@b.com"], "url": "https://x" })
        );
    }

    #[test]
    fn test_frame_message_parse() {
        let close: FrameMessage = serde_json::from_value(json!({ "type": "CLOSE_SIDEBAR" })).unwrap();
        assert_eq!(close, FrameMessage::CloseSidebar);

        // Other scripts on the page post their own messages
        let foreign = serde_json::from_value::<FrameMessage>(json!({ "source": "react-devtools" }));
        assert!(foreign.is_err());
    }

    #[test]
    fn test_active_tab_reply_null_tab() {
        let reply = ActiveTabReply { tab: None };
        assert_eq!(serde_json::to_value(&reply).unwrap(), json!({ "tab": null }));
    }
}
