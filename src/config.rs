/// Extension-wide constants and backend configuration
use crate::error::{Error, Result};
use url::Url;

/// Page loaded inside the injected sidebar frame
pub const SIDEBAR_PAGE: &str = "sidebar.html";

/// Full-page dashboard, opened on install and from the sidebar
pub const DASHBOARD_PAGE: &str = "index.html";

pub const FRAME_ID: &str = "relationhub-sidebar";
pub const TOGGLE_BUTTON_ID: &str = "relationhub-toggle";

pub const SIDEBAR_WIDTH_PX: u32 = 400;

/// Delay between frame creation and the first email push, so the frame's
/// script has attached its message listener
pub const EMAIL_PUSH_DELAY_MS: u32 = 1000;

/// Upper bound on the relay's inner hop to a page
pub const RELAY_TIMEOUT_MS: u32 = 5000;

/// Keyboard shortcut name declared in manifest.json
pub const TOGGLE_COMMAND: &str = "toggle-sidebar";

/// chrome.storage.local key holding the auth session
pub const SESSION_STORAGE_KEY: &str = "relationhub_session";

pub const RECENT_CONTACTS_LIMIT: usize = 10;
pub const DETECTED_PREVIEW_LIMIT: usize = 5;

/// Log level: verbose in debug builds, quieter in release
pub fn log_level() -> log::Level {
    if cfg!(debug_assertions) {
        log::Level::Debug
    } else {
        log::Level::Info
    }
}

/// Connection details for the hosted backend
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    pub url: Url,
    pub anon_key: String,
}

impl BackendConfig {
    /// Read the values baked in at compile time
    pub fn from_env() -> Result<BackendConfig> {
        BackendConfig::new(option_env!("SUPABASE_URL"), option_env!("SUPABASE_ANON_KEY"))
    }

    pub fn new(url: Option<&str>, anon_key: Option<&str>) -> Result<BackendConfig> {
        let url = url.map(str::trim).filter(|s| !s.is_empty());
        let anon_key = anon_key.map(str::trim).filter(|s| !s.is_empty());

        match (url, anon_key) {
            (Some(url), Some(anon_key)) => {
                // Url::join treats a path without trailing slash as a file
                let normalized = format!("{}/", url.trim_end_matches('/'));
                Ok(BackendConfig {
                    url: Url::parse(&normalized)?,
                    anon_key: anon_key.to_string(),
                })
            }
            _ => Err(Error::Config(
                "Missing Supabase environment variables".to_string(),
            )),
        }
    }

    /// Endpoint under the backend root, e.g. `rest/v1/contacts`
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.url.join(path)?)
    }
}
