/// Reusable UI components and form helpers

use patternfly_yew::prelude::{Alert, AlertType, Button, ButtonVariant};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Event, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct ContactAvatarProps {
    pub initial: String,
}

#[function_component(ContactAvatar)]
pub fn contact_avatar(props: &ContactAvatarProps) -> Html {
    html! {
        <div class="contact-avatar">{&props.initial}</div>
    }
}

#[derive(Properties, PartialEq)]
pub struct EmptyNoticeProps {
    pub message: String,
}

#[function_component(EmptyNotice)]
pub fn empty_notice(props: &EmptyNoticeProps) -> Html {
    html! {
        <p class="empty-notice">{&props.message}</p>
    }
}

/// Transient outcome of a user action
#[derive(Clone, PartialEq)]
pub enum Notice {
    Success(String),
    Failure(String),
}

#[derive(Properties, PartialEq)]
pub struct NoticeBannerProps {
    pub notice: Option<Notice>,
}

#[function_component(NoticeBanner)]
pub fn notice_banner(props: &NoticeBannerProps) -> Html {
    match &props.notice {
        Some(Notice::Success(text)) => html! {
            <Alert r#type={AlertType::Success} title={text.clone()} inline={true} />
        },
        Some(Notice::Failure(text)) => html! {
            <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                {text.clone()}
            </Alert>
        },
        None => html! {},
    }
}

#[derive(Properties, PartialEq)]
pub struct FormDialogProps {
    pub title: String,
    pub on_close: Callback<()>,
    pub children: Children,
}

/// Centered dialog over a backdrop; closes from its header button
#[function_component(FormDialog)]
pub fn form_dialog(props: &FormDialogProps) -> Html {
    let on_close = {
        let on_close = props.on_close.clone();
        Callback::from(move |_: MouseEvent| on_close.emit(()))
    };

    html! {
        <div class="pf-v5-c-backdrop">
            <div class="pf-v5-l-bullseye">
                <div class="pf-v5-c-modal-box pf-m-sm" role="dialog" aria-modal="true">
                    <div class="dialog-header">
                        <h2 class="pf-v5-c-modal-box__title">{&props.title}</h2>
                        <Button variant={ButtonVariant::Plain} onclick={on_close}>{"✕"}</Button>
                    </div>
                    <div class="pf-v5-c-modal-box__body">
                        {for props.children.iter()}
                    </div>
                </div>
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct TextFieldProps {
    pub label: String,
    pub value: String,
    pub oninput: Callback<InputEvent>,
    #[prop_or("text".to_string())]
    pub input_type: String,
    #[prop_or_default]
    pub placeholder: String,
    #[prop_or(false)]
    pub required: bool,
}

#[function_component(TextField)]
pub fn text_field(props: &TextFieldProps) -> Html {
    html! {
        <label class="form-field">
            <span class="form-label">
                {&props.label}
                if props.required { {" *"} }
            </span>
            <input
                class="pf-v5-c-form-control"
                type={props.input_type.clone()}
                value={props.value.clone()}
                placeholder={props.placeholder.clone()}
                required={props.required}
                oninput={props.oninput.clone()}
            />
        </label>
    }
}

#[derive(Properties, PartialEq)]
pub struct TextAreaFieldProps {
    pub label: String,
    pub value: String,
    pub oninput: Callback<InputEvent>,
}

#[function_component(TextAreaField)]
pub fn text_area_field(props: &TextAreaFieldProps) -> Html {
    html! {
        <label class="form-field">
            <span class="form-label">{&props.label}</span>
            <textarea
                class="pf-v5-c-form-control"
                rows="3"
                value={props.value.clone()}
                oninput={props.oninput.clone()}
            />
        </label>
    }
}

/// Current value of the input, textarea or select that fired the event
pub fn target_value(event: &Event) -> String {
    let Some(target) = event.target() else {
        return String::new();
    };

    if let Some(input) = target.dyn_ref::<HtmlInputElement>() {
        input.value()
    } else if let Some(area) = target.dyn_ref::<HtmlTextAreaElement>() {
        area.value()
    } else if let Some(select) = target.dyn_ref::<HtmlSelectElement>() {
        select.value()
    } else {
        String::new()
    }
}

/// `oninput` callback writing the field's text into a state handle
pub fn bind_text(state: &UseStateHandle<String>) -> Callback<InputEvent> {
    let state = state.clone();
    Callback::from(move |e: InputEvent| state.set(target_value(&e)))
}

/// `onchange` callback for select elements
pub fn bind_select(state: &UseStateHandle<String>) -> Callback<Event> {
    let state = state.clone();
    Callback::from(move |e: Event| state.set(target_value(&e)))
}

/// ISO timestamp rendered in local time; unparseable input comes back as is
pub fn format_timestamp(iso: &str) -> String {
    let date = js_sys::Date::new(&JsValue::from_str(iso));
    if date.get_time().is_nan() {
        return iso.to_string();
    }

    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}",
        date.get_full_year(),
        date.get_month() + 1,
        date.get_date(),
        date.get_hours(),
        date.get_minutes()
    )
}

/// Value of a `datetime-local` input as an ISO timestamp
pub fn local_input_to_iso(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        return None;
    }
    let date = js_sys::Date::new(&JsValue::from_str(value));
    if date.get_time().is_nan() {
        None
    } else {
        Some(date.to_iso_string().into())
    }
}
