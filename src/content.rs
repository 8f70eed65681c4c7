/// Content script: email detection, the sidebar frame and the floating
/// toggle button on every visited page
use crate::chrome;
use crate::config::{
    EMAIL_PUSH_DELAY_MS, FRAME_ID, SIDEBAR_PAGE, SIDEBAR_WIDTH_PX, TOGGLE_BUTTON_ID,
};
use crate::detector::detect_emails;
use crate::error::{Error, Result};
use crate::host::{is_extension_origin, HostEffect, HostReply, SidebarHost};
use crate::protocol::{from_js, to_js, FrameMessage, PageEmails, RuntimeMessage};
use js_sys::Function;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, HtmlElement, HtmlIFrameElement, MessageEvent, Window};

const TOGGLE_ICON: &str = r#"
    <svg width="24" height="24" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2">
      <path d="M17 21v-2a4 4 0 0 0-4-4H5a4 4 0 0 0-4 4v2"></path>
      <circle cx="9" cy="7" r="4"></circle>
      <path d="M23 21v-2a4 4 0 0 0-3-3.87"></path>
      <path d="M16 3.13a4 4 0 0 1 0 7.75"></path>
    </svg>
"#;

const TOGGLE_STYLE: &str = "position: fixed; bottom: 20px; right: 20px; width: 56px; height: 56px; border-radius: 50%; background: linear-gradient(135deg, #0ea5e9 0%, #06b6d4 100%); border: none; color: white; cursor: pointer; box-shadow: 0 4px 12px rgba(14, 165, 233, 0.4); z-index: 2147483646; display: flex; align-items: center; justify-content: center; transition: all 0.3s ease;";

fn frame_style(width_px: u32) -> String {
    format!(
        "position: fixed; top: 0; right: -{w}px; width: {w}px; height: 100%; border: none; z-index: 2147483647; box-shadow: -2px 0 10px rgba(0, 0, 0, 0.1); transition: right 0.3s ease-in-out; background: white;",
        w = width_px
    )
}

/// Text of the rendered page, `None` before the body exists
pub fn page_text(document: &Document) -> Option<String> {
    document.body().map(|body| body.inner_text())
}

/// One per page: owns the host state and the frame element
pub struct ContentScript {
    window: Window,
    document: Document,
    host: RefCell<SidebarHost>,
    frame: RefCell<Option<HtmlIFrameElement>>,
    extension_base: String,
    sidebar_url: String,
}

impl ContentScript {
    /// `extension_base` is the origin frame messages must come from,
    /// `sidebar_url` the page loaded into the frame.
    pub fn new(extension_base: String, sidebar_url: String) -> Result<Rc<ContentScript>> {
        let window = web_sys::window().ok_or_else(|| Error::Js("no window".to_string()))?;
        let document = window
            .document()
            .ok_or_else(|| Error::Js("no document".to_string()))?;

        Ok(Rc::new(ContentScript {
            window,
            document,
            host: RefCell::new(SidebarHost::new(EMAIL_PUSH_DELAY_MS)),
            frame: RefCell::new(None),
            extension_base,
            sidebar_url,
        }))
    }

    /// Emails on the page right now, plus the page URL
    pub fn snapshot(&self) -> PageEmails {
        PageEmails {
            emails: detect_emails(page_text(&self.document).as_deref()),
            url: self.window.location().href().unwrap_or_default(),
        }
    }

    pub fn toggle(self: &Rc<Self>) {
        let effects = self.host.borrow_mut().toggle();
        self.apply(effects);
    }

    fn apply(self: &Rc<Self>, effects: Vec<HostEffect>) {
        for effect in effects {
            log::debug!("Sidebar effect {:?}", effect);
            if let Err(e) = self.apply_one(effect) {
                log::warn!("Sidebar update failed: {}", e);
            }
        }
    }

    fn apply_one(self: &Rc<Self>, effect: HostEffect) -> Result<()> {
        match effect {
            HostEffect::CreateFrame => self.create_frame(),
            HostEffect::Reveal => self.set_frame_right("0"),
            HostEffect::SlideOut => self.set_frame_right(&format!("-{}px", SIDEBAR_WIDTH_PX)),
            HostEffect::SchedulePush { delay_ms } => {
                let this = Rc::clone(self);
                chrome::schedule(delay_ms, move || {
                    let snapshot = this.snapshot();
                    if let Err(e) = this.push_emails(snapshot) {
                        log::warn!("Initial email push failed: {}", e);
                    }
                });
                Ok(())
            }
            HostEffect::PushEmails(emails) => self.push_emails(emails),
        }
    }

    fn create_frame(&self) -> Result<()> {
        let frame: HtmlIFrameElement = self
            .document
            .create_element("iframe")?
            .dyn_into()
            .map_err(|_| Error::Js("created element is not an iframe".to_string()))?;
        frame.set_id(FRAME_ID);
        frame.set_src(&self.sidebar_url);
        frame.set_attribute("style", &frame_style(SIDEBAR_WIDTH_PX))?;

        let body = self
            .document
            .body()
            .ok_or_else(|| Error::Js("page has no body".to_string()))?;
        body.append_child(&frame)?;

        *self.frame.borrow_mut() = Some(frame);
        Ok(())
    }

    fn set_frame_right(&self, right: &str) -> Result<()> {
        if let Some(frame) = self.frame.borrow().as_ref() {
            frame.style().set_property("right", right)?;
        }
        Ok(())
    }

    fn push_emails(&self, emails: PageEmails) -> Result<()> {
        let frame = self.frame.borrow();
        // A frame whose source failed to load has nothing listening; no retry
        let Some(target) = frame.as_ref().and_then(|f| f.content_window()) else {
            log::debug!("Sidebar frame not ready, dropping email push");
            return Ok(());
        };

        let count = emails.emails.len();
        target.post_message(&to_js(&FrameMessage::DetectedEmails(emails))?, "*")?;
        log::debug!("Pushed {} detected emails to sidebar", count);
        Ok(())
    }

    fn on_frame_message(self: &Rc<Self>, event: MessageEvent) {
        if !is_extension_origin(&event.origin(), &self.extension_base) {
            return;
        }
        let Ok(message) = from_js::<FrameMessage>(event.data()) else {
            return;
        };

        let effects = self
            .host
            .borrow_mut()
            .handle_frame_message(&message, || self.snapshot());
        self.apply(effects);
    }

    fn on_runtime_message(self: &Rc<Self>, message: JsValue, send_response: &Function) -> bool {
        let Ok(message) = from_js::<RuntimeMessage>(message) else {
            return false;
        };

        let (effects, reply) = self
            .host
            .borrow_mut()
            .handle_runtime_message(message, || self.snapshot());
        self.apply(effects);

        let Some(reply) = reply else {
            return false;
        };
        let payload = match &reply {
            HostReply::Toggled(toggled) => to_js(toggled),
            HostReply::Emails(emails) => to_js(emails),
        };
        match payload.and_then(|js| Ok(send_response.call1(&JsValue::NULL, &js)?)) {
            Ok(_) => true,
            Err(e) => {
                log::warn!("Could not answer {:?}: {}", message, e);
                false
            }
        }
    }

    fn listen(self: &Rc<Self>) -> Result<()> {
        let this = Rc::clone(self);
        let on_message = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
            this.on_frame_message(event);
        });
        self.window
            .add_event_listener_with_callback("message", on_message.as_ref().unchecked_ref())?;
        on_message.forget();

        let this = Rc::clone(self);
        let on_runtime = Closure::<dyn FnMut(JsValue, JsValue, Function) -> bool>::new(
            move |message: JsValue, _sender: JsValue, send_response: Function| {
                this.on_runtime_message(message, &send_response)
            },
        );
        chrome::add_message_listener(on_runtime.as_ref().unchecked_ref());
        on_runtime.forget();

        Ok(())
    }
}

/// Create the floating toggle button once. Returns `false` when it already exists.
pub fn mount_toggle_button(document: &Document, on_activate: impl Fn() + 'static) -> Result<bool> {
    if document.get_element_by_id(TOGGLE_BUTTON_ID).is_some() {
        return Ok(false);
    }

    let button: HtmlElement = document
        .create_element("button")?
        .dyn_into()
        .map_err(|_| Error::Js("created element is not an HTML element".to_string()))?;
    button.set_id(TOGGLE_BUTTON_ID);
    button.set_inner_html(TOGGLE_ICON);
    button.set_attribute("style", TOGGLE_STYLE)?;
    button.set_title("RelationHub");

    let hover = |button: &HtmlElement, scale: &'static str, shadow: &'static str| {
        let target = button.clone();
        Closure::<dyn FnMut()>::new(move || {
            let style = target.style();
            let _ = style.set_property("transform", scale);
            let _ = style.set_property("box-shadow", shadow);
        })
    };
    let enter = hover(&button, "scale(1.1)", "0 6px 16px rgba(14, 165, 233, 0.5)");
    let leave = hover(&button, "scale(1)", "0 4px 12px rgba(14, 165, 233, 0.4)");
    let click = Closure::<dyn FnMut()>::new(move || on_activate());

    button.add_event_listener_with_callback("mouseenter", enter.as_ref().unchecked_ref())?;
    button.add_event_listener_with_callback("mouseleave", leave.as_ref().unchecked_ref())?;
    button.add_event_listener_with_callback("click", click.as_ref().unchecked_ref())?;
    enter.forget();
    leave.forget();
    click.forget();

    let body = document
        .body()
        .ok_or_else(|| Error::Js("page has no body".to_string()))?;
    body.append_child(&button)?;
    Ok(true)
}

/// Entry point for the content script context
pub fn start() -> Result<()> {
    let script = ContentScript::new(
        chrome::runtime_get_url(""),
        chrome::runtime_get_url(SIDEBAR_PAGE),
    )?;
    script.listen()?;

    let mount = {
        let script = Rc::clone(&script);
        move || {
            let target = Rc::clone(&script);
            match mount_toggle_button(&script.document, move || target.toggle()) {
                Ok(true) => log::debug!("Toggle button mounted"),
                Ok(false) => log::debug!("Toggle button already present"),
                Err(e) => log::warn!("Could not mount toggle button: {}", e),
            }
        }
    };

    if script.document.ready_state() == "loading" {
        let on_ready = Closure::once(mount);
        script
            .document
            .add_event_listener_with_callback("DOMContentLoaded", on_ready.as_ref().unchecked_ref())?;
        on_ready.forget();
    } else {
        mount();
    }

    log::debug!("Content script started");
    Ok(())
}
