/// Bindings to the chrome.* extension APIs used across contexts
use crate::error::{Error, Result};
use crate::models::TabInfo;
use crate::protocol::{from_js, to_js};
use js_sys::{Function, Promise};
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["chrome", "runtime"], js_name = getURL)]
    pub fn runtime_get_url(path: &str) -> String;

    #[wasm_bindgen(js_namespace = ["chrome", "runtime", "onMessage"], js_name = addListener)]
    pub fn add_message_listener(callback: &Function);

    #[wasm_bindgen(js_namespace = ["chrome", "runtime", "onInstalled"], js_name = addListener)]
    pub fn add_installed_listener(callback: &Function);

    #[wasm_bindgen(js_namespace = ["chrome", "runtime", "onConnect"], js_name = addListener)]
    pub fn add_connect_listener(callback: &Function);

    #[wasm_bindgen(js_namespace = ["chrome", "action", "onClicked"], js_name = addListener)]
    pub fn add_action_listener(callback: &Function);

    // chrome.commands is absent when the manifest declares no commands
    #[wasm_bindgen(catch, js_namespace = ["chrome", "commands", "onCommand"], js_name = addListener)]
    pub fn add_command_listener(callback: &Function) -> std::result::Result<(), JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = query)]
    async fn tabs_query(query_info: JsValue) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = sendMessage)]
    async fn tabs_send_message(tab_id: i32, message: JsValue) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = create)]
    async fn tabs_create(properties: JsValue) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = get)]
    async fn storage_get(key: &str) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = set)]
    async fn storage_set(items: JsValue) -> std::result::Result<JsValue, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = remove)]
    async fn storage_remove(key: &str) -> std::result::Result<JsValue, JsValue>;

    // Global in both windows and service workers
    #[wasm_bindgen(js_name = setTimeout)]
    fn set_timeout(handler: &Function, timeout_ms: i32) -> JsValue;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ActiveTabQuery {
    active: bool,
    current_window: bool,
}

#[derive(Serialize)]
struct CreateProperties<'a> {
    url: &'a str,
}

/// Run `callback` once after `delay_ms`
pub fn schedule(delay_ms: u32, callback: impl FnOnce() + 'static) {
    let handler = Closure::once_into_js(callback);
    set_timeout(handler.unchecked_ref(), delay_ms as i32);
}

/// Resolve after `delay_ms`
pub async fn sleep(delay_ms: u32) {
    let promise = Promise::new(&mut |resolve, _reject| {
        set_timeout(&resolve, delay_ms as i32);
    });
    let _ = JsFuture::from(promise).await;
}

/// The active tab of the current window, if any
pub async fn active_tab() -> Result<Option<TabInfo>> {
    let query = to_js(&ActiveTabQuery {
        active: true,
        current_window: true,
    })?;
    let tabs: Vec<TabInfo> = from_js(tabs_query(query).await?)?;
    Ok(tabs.into_iter().next())
}

/// Send a message to a tab's content script and wait for its reply.
///
/// Rejects when the tab has no listener (e.g. chrome:// pages).
pub async fn send_to_tab<T: Serialize>(tab_id: i32, message: &T) -> Result<JsValue> {
    tabs_send_message(tab_id, to_js(message)?)
        .await
        .map_err(Error::from)
}

/// Open an extension page in a new tab
pub async fn open_extension_page(path: &str) -> Result<()> {
    let url = runtime_get_url(path);
    tabs_create(to_js(&CreateProperties { url: &url })?).await?;
    Ok(())
}

/// Read one key from chrome.storage.local; `undefined` when absent
pub async fn storage_read(key: &str) -> Result<JsValue> {
    let items = storage_get(key).await?;
    Ok(js_sys::Reflect::get(&items, &JsValue::from_str(key))?)
}

pub async fn storage_write(key: &str, value: JsValue) -> Result<()> {
    let items = js_sys::Object::new();
    js_sys::Reflect::set(&items, &JsValue::from_str(key), &value)?;
    storage_set(items.into()).await?;
    Ok(())
}

pub async fn storage_delete(key: &str) -> Result<()> {
    storage_remove(key).await?;
    Ok(())
}
