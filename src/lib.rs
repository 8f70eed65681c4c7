/// RelationHub - Chrome Extension for Personal Relationship Management
/// Built with Rust + WASM + Yew

pub mod background;
pub mod chrome;
pub mod config;
pub mod contacts;
pub mod content;
pub mod detector;
pub mod error;
pub mod gateway;
pub mod host;
pub mod models;
pub mod protocol;
pub mod rest;
pub mod storage;
pub mod ui;

use wasm_bindgen::prelude::*;

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(config::log_level()));
}

// Re-export the email detector for JavaScript access
#[wasm_bindgen]
pub fn detect_emails(text: Option<String>) -> Result<JsValue, JsValue> {
    let emails = detector::detect_emails(text.as_deref());
    Ok(protocol::to_js(&emails)?)
}

// Content script context: toggle button, sidebar frame and page messaging
#[wasm_bindgen]
pub fn start_content_script() -> Result<(), JsValue> {
    Ok(content::start()?)
}

// Service worker context: message relay, install, action and shortcut handlers
#[wasm_bindgen]
pub fn start_background() -> Result<(), JsValue> {
    background::start()
}

// Start the Yew app for the sidebar frame
#[wasm_bindgen]
pub fn start_sidebar() {
    yew::Renderer::<ui::sidebar::Sidebar>::new().render();
}

// Start the Yew app for the dashboard page
#[wasm_bindgen]
pub fn start_dashboard() {
    yew::Renderer::<ui::dashboard::Dashboard>::new().render();
}
