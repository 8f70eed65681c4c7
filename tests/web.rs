//! Browser tests, run with `wasm-pack test --headless --chrome`
#![cfg(target_arch = "wasm32")]

use relationhub::config::{FRAME_ID, TOGGLE_BUTTON_ID};
use relationhub::content::{mount_toggle_button, page_text, ContentScript};
use relationhub::detector::detect_emails;
use relationhub::ui::components::{format_timestamp, local_input_to_iso};
use std::cell::Cell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{Document, HtmlElement, HtmlIFrameElement};

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> Document {
    web_sys::window().unwrap().document().unwrap()
}

fn remove_toggle(document: &Document) {
    if let Some(existing) = document.get_element_by_id(TOGGLE_BUTTON_ID) {
        existing.remove();
    }
}

#[wasm_bindgen_test]
fn toggle_button_mounts_once() {
    let document = document();
    remove_toggle(&document);

    assert_eq!(mount_toggle_button(&document, || ()), Ok(true));
    assert_eq!(mount_toggle_button(&document, || ()), Ok(false));
    assert_eq!(
        document
            .query_selector_all(&format!("#{}", TOGGLE_BUTTON_ID))
            .unwrap()
            .length(),
        1
    );

    remove_toggle(&document);
}

#[wasm_bindgen_test]
fn toggle_button_click_runs_callback() {
    let document = document();
    remove_toggle(&document);

    let clicks = Rc::new(Cell::new(0));
    let counter = Rc::clone(&clicks);
    mount_toggle_button(&document, move || counter.set(counter.get() + 1)).unwrap();

    let button: HtmlElement = document
        .get_element_by_id(TOGGLE_BUTTON_ID)
        .unwrap()
        .dyn_into()
        .unwrap();
    button.click();
    button.click();

    assert_eq!(clicks.get(), 2);
    remove_toggle(&document);
}

fn remove_frame(document: &Document) {
    while let Some(existing) = document.get_element_by_id(FRAME_ID) {
        existing.remove();
    }
}

fn frame_count(document: &Document) -> u32 {
    document
        .query_selector_all(&format!("#{}", FRAME_ID))
        .unwrap()
        .length()
}

fn frame(document: &Document) -> HtmlIFrameElement {
    document
        .get_element_by_id(FRAME_ID)
        .unwrap()
        .dyn_into()
        .unwrap()
}

#[wasm_bindgen_test]
fn sidebar_frame_is_created_once_and_slides() {
    let document = document();
    remove_frame(&document);

    let script = ContentScript::new(
        "chrome-extension://relationhub-test".to_string(),
        "about:blank".to_string(),
    )
    .unwrap();
    assert_eq!(frame_count(&document), 0);

    script.toggle();
    assert_eq!(frame_count(&document), 1);
    let sidebar = frame(&document);
    assert_eq!(sidebar.id(), FRAME_ID);
    assert_eq!(sidebar.src(), "about:blank");
    assert_eq!(sidebar.style().get_property_value("right").unwrap(), "0px");

    script.toggle();
    assert_eq!(frame_count(&document), 1);
    assert_eq!(sidebar.style().get_property_value("right").unwrap(), "-400px");

    script.toggle();
    assert_eq!(frame_count(&document), 1);
    assert_eq!(sidebar.style().get_property_value("right").unwrap(), "0px");

    remove_frame(&document);
}

#[wasm_bindgen_test]
fn detects_emails_in_page_body() {
    let document = document();
    let section = document.create_element("section").unwrap();
    section.set_inner_html(
        "<p>Write to <a href=\"mailto:ada@example.com\">ada@example.com</a></p>\
         <p>or sales@acme.io, or again ada@example.com</p>",
    );
    document.body().unwrap().append_child(&section).unwrap();

    let emails = detect_emails(page_text(&document).as_deref());

    assert!(emails.contains(&"ada@example.com".to_string()));
    assert!(emails.contains(&"sales@acme.io".to_string()));
    assert_eq!(emails.iter().filter(|e| *e == "ada@example.com").count(), 1);

    section.remove();
}

#[wasm_bindgen_test]
fn formats_timestamps() {
    assert_eq!(format_timestamp("not a date"), "not a date");
    assert!(format_timestamp("2024-10-28T10:30:00Z").starts_with("2024-10-2"));
    assert_eq!(local_input_to_iso(""), None);
    assert!(local_input_to_iso("2024-11-01T15:00").is_some());
}
