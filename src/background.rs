/// Background relay: routes icon clicks, shortcuts and cross-context
/// requests to the active page
use crate::chrome;
use crate::config::{DASHBOARD_PAGE, RELAY_TIMEOUT_MS, TOGGLE_COMMAND};
use crate::error::{Error, Result};
use crate::models::TabInfo;
use crate::protocol::{from_js, to_js, ActiveTabReply, RelayFailure, RuntimeMessage};
use futures::future::{self, Either};
use js_sys::Function;
use serde::Deserialize;
use serde_json::Value;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

/// The browser operations the relay depends on
#[allow(async_fn_in_trait)]
pub trait TabsApi {
    async fn active_tab(&self) -> Result<Option<TabInfo>>;
    async fn send_to_tab(&self, tab_id: i32, message: RuntimeMessage) -> Result<Value>;
    async fn open_page(&self, path: &str) -> Result<()>;
    async fn sleep(&self, delay_ms: u32);
}

/// TabsApi backed by chrome.tabs
pub struct ChromeTabs;

impl TabsApi for ChromeTabs {
    async fn active_tab(&self) -> Result<Option<TabInfo>> {
        chrome::active_tab().await
    }

    async fn send_to_tab(&self, tab_id: i32, message: RuntimeMessage) -> Result<Value> {
        let reply = chrome::send_to_tab(tab_id, &message).await?;
        if reply.is_undefined() {
            return Ok(Value::Null);
        }
        from_js(reply)
    }

    async fn open_page(&self, path: &str) -> Result<()> {
        chrome::open_extension_page(path).await
    }

    async fn sleep(&self, delay_ms: u32) {
        chrome::sleep(delay_ms).await
    }
}

#[derive(Debug, Deserialize)]
struct InstalledDetails {
    reason: String,
}

pub struct Relay<T> {
    tabs: T,
    timeout_ms: u32,
}

impl<T: TabsApi> Relay<T> {
    pub fn new(tabs: T, timeout_ms: u32) -> Relay<T> {
        Relay { tabs, timeout_ms }
    }

    /// Messages answered by the relay; everything else is left to other listeners
    pub fn accepts(message: RuntimeMessage) -> bool {
        matches!(
            message,
            RuntimeMessage::GetActiveTab | RuntimeMessage::DetectEmailsInTab
        )
    }

    /// Reply to an accepted message. `None` when the message is not the relay's.
    pub async fn handle_message(&self, message: RuntimeMessage) -> Option<Value> {
        match message {
            RuntimeMessage::GetActiveTab => Some(self.active_tab_reply().await),
            RuntimeMessage::DetectEmailsInTab => Some(self.detect_in_active_tab().await),
            RuntimeMessage::ToggleSidebar | RuntimeMessage::DetectEmails => None,
        }
    }

    /// Open the dashboard on first install. Returns whether a page was opened.
    pub async fn on_installed(&self, reason: &str) -> Result<bool> {
        if reason != "install" {
            log::debug!("Ignoring onInstalled reason {}", reason);
            return Ok(false);
        }

        log::info!("RelationHub extension installed");
        self.tabs.open_page(DASHBOARD_PAGE).await?;
        Ok(true)
    }

    pub async fn on_action_clicked(&self, tab: &TabInfo) {
        match tab.id {
            Some(tab_id) => self.toggle_tab(tab_id).await,
            None => self.toggle_active_tab().await,
        }
    }

    pub async fn on_command(&self, command: &str) {
        if command == TOGGLE_COMMAND {
            self.toggle_active_tab().await;
        } else {
            log::debug!("Ignoring unknown command {}", command);
        }
    }

    async fn toggle_active_tab(&self) {
        match self.active_tab_id().await {
            Ok(tab_id) => self.toggle_tab(tab_id).await,
            Err(e) => log::debug!("No tab to toggle: {}", e),
        }
    }

    async fn toggle_tab(&self, tab_id: i32) {
        // Pages without the content script (chrome://, the web store) never answer
        if let Err(e) = self.tabs.send_to_tab(tab_id, RuntimeMessage::ToggleSidebar).await {
            log::debug!("Tab {} did not take TOGGLE_SIDEBAR: {}", tab_id, e);
        }
    }

    async fn active_tab_reply(&self) -> Value {
        let tab = match self.tabs.active_tab().await {
            Ok(tab) => tab,
            Err(e) => {
                log::warn!("Active tab lookup failed: {}", e);
                None
            }
        };

        serde_json::to_value(ActiveTabReply { tab }).unwrap_or(Value::Null)
    }

    async fn detect_in_active_tab(&self) -> Value {
        match self.forward_detect().await {
            Ok(reply) => reply,
            Err(e) => {
                log::warn!("DETECT_EMAILS_IN_TAB failed: {}", e);
                serde_json::to_value(RelayFailure {
                    error: e.to_string(),
                })
                .unwrap_or(Value::Null)
            }
        }
    }

    async fn forward_detect(&self) -> Result<Value> {
        let tab_id = self.active_tab_id().await?;

        let send = Box::pin(self.tabs.send_to_tab(tab_id, RuntimeMessage::DetectEmails));
        let timeout = Box::pin(self.tabs.sleep(self.timeout_ms));

        match future::select(send, timeout).await {
            Either::Left((reply, _)) => reply,
            Either::Right(((), _)) => Err(Error::Timeout(self.timeout_ms)),
        }
    }

    async fn active_tab_id(&self) -> Result<i32> {
        self.tabs
            .active_tab()
            .await?
            .and_then(|tab| tab.id)
            .ok_or(Error::NoActiveTab)
    }
}

/// Wire the relay to the service worker's chrome events
pub fn start() -> std::result::Result<(), JsValue> {
    let relay = Rc::new(Relay::new(ChromeTabs, RELAY_TIMEOUT_MS));

    let installed = {
        let relay = Rc::clone(&relay);
        Closure::<dyn FnMut(JsValue)>::new(move |details: JsValue| {
            let relay = Rc::clone(&relay);
            spawn_local(async move {
                let reason = from_js::<InstalledDetails>(details)
                    .map(|d| d.reason)
                    .unwrap_or_default();
                if let Err(e) = relay.on_installed(&reason).await {
                    log::error!("Failed to open dashboard: {}", e);
                }
            });
        })
    };
    chrome::add_installed_listener(installed.as_ref().unchecked_ref());
    installed.forget();

    let clicked = {
        let relay = Rc::clone(&relay);
        Closure::<dyn FnMut(JsValue)>::new(move |tab: JsValue| {
            let relay = Rc::clone(&relay);
            let tab = from_js::<TabInfo>(tab).unwrap_or_default();
            spawn_local(async move { relay.on_action_clicked(&tab).await });
        })
    };
    chrome::add_action_listener(clicked.as_ref().unchecked_ref());
    clicked.forget();

    let command = {
        let relay = Rc::clone(&relay);
        Closure::<dyn FnMut(String)>::new(move |command: String| {
            let relay = Rc::clone(&relay);
            spawn_local(async move { relay.on_command(&command).await });
        })
    };
    if let Err(e) = chrome::add_command_listener(command.as_ref().unchecked_ref()) {
        log::debug!("Keyboard commands unavailable: {:?}", e);
    }
    command.forget();

    let message = {
        let relay = Rc::clone(&relay);
        Closure::<dyn FnMut(JsValue, JsValue, Function) -> bool>::new(
            move |message: JsValue, _sender: JsValue, send_response: Function| {
                let Ok(message) = from_js::<RuntimeMessage>(message) else {
                    return false;
                };
                if !Relay::<ChromeTabs>::accepts(message) {
                    return false;
                }

                let relay = Rc::clone(&relay);
                spawn_local(async move {
                    if let Some(reply) = relay.handle_message(message).await {
                        respond(&send_response, &reply);
                    }
                });
                // Keep the channel open for the asynchronous reply
                true
            },
        )
    };
    chrome::add_message_listener(message.as_ref().unchecked_ref());
    message.forget();

    let connect = Closure::<dyn FnMut(JsValue)>::new(|port: JsValue| {
        let name = js_sys::Reflect::get(&port, &JsValue::from_str("name"))
            .ok()
            .and_then(|n| n.as_string())
            .unwrap_or_default();
        log::info!("Port connected: {}", name);
    });
    chrome::add_connect_listener(connect.as_ref().unchecked_ref());
    connect.forget();

    log::debug!("Background relay started");
    Ok(())
}

fn respond(send_response: &Function, reply: &Value) {
    let result = to_js(reply).and_then(|js| Ok(send_response.call1(&JsValue::NULL, &js)?));
    if let Err(e) = result {
        log::warn!("Could not deliver relay reply: {}", e);
    }
}
