/// Sidebar shown in the page frame: detected emails, recent contacts
/// and one-click interaction logging

use crate::chrome;
use crate::config::{DASHBOARD_PAGE, DETECTED_PREVIEW_LIMIT, RECENT_CONTACTS_LIMIT};
use crate::contacts::{
    add_contact, avatar_initial, display_name, log_interaction, without_email, ContactDraft,
    InteractionDraft,
};
use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::models::{Contact, InteractionKind};
use crate::protocol::{from_js, to_js, FrameMessage, PageEmails};
use crate::storage::AuthUser;
use crate::ui::components::{bind_text, ContactAvatar, EmptyNotice, Notice, NoticeBanner, TextField};
use crate::ui::{connect, now_secs, GatewayHandle};
use patternfly_yew::prelude::{Alert, AlertType, Button, ButtonVariant, Spinner};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::MessageEvent;
use yew::prelude::*;

#[derive(Clone, PartialEq)]
enum Phase {
    Loading,
    SignedOut,
    SignedIn(AuthUser),
}

/// Emails pushed by the host page, and the page they came from
#[derive(Clone, Debug, Default, PartialEq)]
struct PageScan {
    emails: Vec<String>,
    url: String,
}

enum ScanAction {
    /// A fresh scan replaces the list
    Detected(PageEmails),
    /// A saved address leaves whatever list is current
    Saved(String),
}

impl Reducible for PageScan {
    type Action = ScanAction;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        match action {
            ScanAction::Detected(found) => Rc::new(PageScan {
                emails: found.emails,
                url: found.url,
            }),
            ScanAction::Saved(email) => Rc::new(PageScan {
                emails: without_email(&self.emails, &email),
                url: self.url.clone(),
            }),
        }
    }
}

/// Quick-log note text for each interaction button
fn quick_note(kind: InteractionKind) -> &'static str {
    match kind {
        InteractionKind::Email => "Sent email",
        InteractionKind::Call => "Phone call",
        InteractionKind::Meeting => "Met in person",
        InteractionKind::Note => "Met on website",
    }
}

/// Message text for a failed add
fn add_failure(error: &Error) -> String {
    match error {
        Error::DuplicateContact(_) => "Contact already exists".to_string(),
        Error::Validation(message) => message.clone(),
        _ => "Failed to add contact".to_string(),
    }
}

fn post_to_host(message: &FrameMessage) -> Result<()> {
    let window = web_sys::window().ok_or_else(|| Error::Js("no window".to_string()))?;
    let parent = window
        .parent()?
        .ok_or_else(|| Error::Js("sidebar has no parent window".to_string()))?;
    parent.post_message(&to_js(message)?, "*")?;
    Ok(())
}

fn open_dashboard() -> Callback<MouseEvent> {
    Callback::from(|_| {
        spawn_local(async {
            if let Err(e) = chrome::open_extension_page(DASHBOARD_PAGE).await {
                log::error!("Could not open dashboard: {}", e);
            }
        });
    })
}

#[function_component(Sidebar)]
pub fn sidebar() -> Html {
    let gateway = use_memo((), |_| connect());

    let on_close = Callback::from(|_: MouseEvent| {
        if let Err(e) = post_to_host(&FrameMessage::CloseSidebar) {
            log::warn!("Could not close sidebar: {}", e);
        }
    });

    html! {
        <div class="sidebar">
            <div class="sidebar-header">
                <h1 class="sidebar-title">{"RelationHub"}</h1>
                <Button variant={ButtonVariant::Plain} onclick={on_close}>{"✕"}</Button>
            </div>
            {match &*gateway {
                Ok(gateway) => html! { <SidebarBody gateway={gateway.clone()} /> },
                Err(e) => html! {
                    <Alert r#type={AlertType::Danger} title={"Configuration error"} inline={true}>
                        {e.to_string()}
                    </Alert>
                },
            }}
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct SidebarBodyProps {
    pub gateway: GatewayHandle,
}

#[function_component(SidebarBody)]
pub fn sidebar_body(props: &SidebarBodyProps) -> Html {
    let phase = use_state(|| Phase::Loading);
    let scan = use_reducer(PageScan::default);
    let recent = use_state(Vec::<Contact>::new);
    let reload = use_state(|| 0u32);
    let notice = use_state(|| None::<Notice>);
    let busy = use_state(|| false);

    let email = use_state(String::new);
    let name = use_state(String::new);
    let company = use_state(String::new);

    // Restore the shared session on mount
    {
        let gateway = props.gateway.clone();
        let phase = phase.clone();
        use_effect_with((), move |_| {
            spawn_local(async move {
                match gateway.restore_session(now_secs()).await {
                    Ok(Some(user)) => phase.set(Phase::SignedIn(user)),
                    Ok(None) => phase.set(Phase::SignedOut),
                    Err(e) => {
                        log::warn!("Could not restore session: {}", e);
                        phase.set(Phase::SignedOut);
                    }
                }
            });
            || ()
        });
    }

    // Receive detected emails from the host page, then ask for a fresh scan
    {
        let scan = scan.dispatcher();
        use_effect_with((), move |_| {
            let listener = Closure::<dyn FnMut(MessageEvent)>::new(move |event: MessageEvent| {
                if let Ok(FrameMessage::DetectedEmails(found)) = from_js::<FrameMessage>(event.data()) {
                    log::debug!("Received {} detected emails", found.emails.len());
                    scan.dispatch(ScanAction::Detected(found));
                }
            });

            let window = web_sys::window();
            if let Some(window) = &window {
                if let Err(e) = window
                    .add_event_listener_with_callback("message", listener.as_ref().unchecked_ref())
                {
                    log::warn!("Could not listen for detected emails: {:?}", e);
                }
            }
            if let Err(e) = post_to_host(&FrameMessage::RefreshEmails) {
                log::debug!("Email refresh request failed: {}", e);
            }

            move || {
                if let Some(window) = window {
                    let _ = window.remove_event_listener_with_callback(
                        "message",
                        listener.as_ref().unchecked_ref(),
                    );
                }
                drop(listener);
            }
        });
    }

    // Recent contacts whenever the session or a mutation changes them
    {
        let gateway = props.gateway.clone();
        let recent = recent.clone();
        let signed_in = matches!(*phase, Phase::SignedIn(_));
        use_effect_with((signed_in, *reload), move |(signed_in, _)| {
            if *signed_in {
                spawn_local(async move {
                    match gateway.recent_contacts(RECENT_CONTACTS_LIMIT).await {
                        Ok(contacts) => recent.set(contacts),
                        Err(e) => log::error!("Failed to load contacts: {}", e),
                    }
                });
            }
            || ()
        });
    }

    let save_contact = {
        let gateway = props.gateway.clone();
        let scan = scan.dispatcher();
        let reload = reload.clone();
        let notice = notice.clone();
        let busy = busy.clone();
        move |draft: ContactDraft, on_saved: Box<dyn FnOnce()>| {
            let gateway = gateway.clone();
            let scan = scan.clone();
            let reload = reload.clone();
            let notice = notice.clone();
            let busy = busy.clone();

            busy.set(true);
            spawn_local(async move {
                match add_contact(&*gateway, &draft).await {
                    Ok(contact) => {
                        scan.dispatch(ScanAction::Saved(contact.email));
                        notice.set(Some(Notice::Success("Contact added".to_string())));
                        reload.set(*reload + 1);
                        on_saved();
                    }
                    Err(e) => {
                        log::error!("Failed to add contact: {}", e);
                        notice.set(Some(Notice::Failure(add_failure(&e))));
                    }
                }
                busy.set(false);
            });
        }
    };

    let on_add_detected = {
        let save_contact = save_contact.clone();
        move |address: String| {
            let save_contact = save_contact.clone();
            Callback::from(move |_: MouseEvent| {
                save_contact(ContactDraft::from_email(&address), Box::new(|| ()));
            })
        }
    };

    let on_submit = {
        let email = email.clone();
        let name = name.clone();
        let company = company.clone();
        Callback::from(move |_: MouseEvent| {
            let draft = ContactDraft {
                email: (*email).clone(),
                name: (*name).clone(),
                company: (*company).clone(),
                ..ContactDraft::default()
            };
            let (email, name, company) = (email.clone(), name.clone(), company.clone());
            save_contact(
                draft,
                Box::new(move || {
                    email.set(String::new());
                    name.set(String::new());
                    company.set(String::new());
                }),
            );
        })
    };

    let on_quick_log = {
        let gateway = props.gateway.clone();
        let page_url = scan.url.clone();
        let reload = reload.clone();
        let notice = notice.clone();
        move |contact_id: String, kind: InteractionKind| {
            let gateway = gateway.clone();
            let page_url = page_url.clone();
            let reload = reload.clone();
            let notice = notice.clone();
            Callback::from(move |_: MouseEvent| {
                let gateway = gateway.clone();
                let contact_id = contact_id.clone();
                let reload = reload.clone();
                let notice = notice.clone();
                let draft = InteractionDraft {
                    kind,
                    subject: String::new(),
                    content: quick_note(kind).to_string(),
                    url: (!page_url.is_empty()).then(|| page_url.clone()),
                };
                spawn_local(async move {
                    match log_interaction(&*gateway, &contact_id, &draft).await {
                        Ok(_) => {
                            notice.set(Some(Notice::Success("Interaction logged".to_string())));
                            reload.set(*reload + 1);
                        }
                        Err(e) => {
                            log::error!("Failed to log interaction: {}", e);
                            notice.set(Some(Notice::Failure("Failed to log interaction".to_string())));
                        }
                    }
                });
            })
        }
    };

    match &*phase {
        Phase::Loading => html! {
            <div class="loading-text-center">
                <Spinner />
            </div>
        },
        Phase::SignedOut => html! {
            <div class="sidebar-signed-out">
                <p>{"Sign in to use RelationHub"}</p>
                <Button variant={ButtonVariant::Primary} onclick={open_dashboard()}>
                    {"Open Dashboard"}
                </Button>
            </div>
        },
        Phase::SignedIn(_) => html! {
            <div class="flex-column-gap">
                <NoticeBanner notice={(*notice).clone()} />

                <section>
                    <h2 class="section-title">{"Detected on this page"}</h2>
                    if scan.emails.is_empty() {
                        <EmptyNotice message={"No emails found on this page"} />
                    } else {
                        <ul class="detected-list">
                            {for scan.emails.iter().take(DETECTED_PREVIEW_LIMIT).map(|address| html! {
                                <li class="detected-item">
                                    <span class="detected-email">{address}</span>
                                    <Button
                                        variant={ButtonVariant::Secondary}
                                        disabled={*busy}
                                        onclick={on_add_detected(address.clone())}
                                    >
                                        {"Add"}
                                    </Button>
                                </li>
                            })}
                        </ul>
                    }
                </section>

                <section>
                    <h2 class="section-title">{"Recent contacts"}</h2>
                    if recent.is_empty() {
                        <EmptyNotice message={"No contacts yet"} />
                    } else {
                        {for recent.iter().map(|contact| html! {
                            <div class="contact-row">
                                <ContactAvatar initial={avatar_initial(contact)} />
                                <div class="contact-summary">
                                    <span class="contact-name">{display_name(contact)}</span>
                                    if let Some(company) = &contact.company {
                                        <span class="contact-company">{company}</span>
                                    }
                                </div>
                                <div class="quick-actions">
                                    <Button variant={ButtonVariant::Plain} onclick={on_quick_log(contact.id.clone(), InteractionKind::Email)}>{"✉"}</Button>
                                    <Button variant={ButtonVariant::Plain} onclick={on_quick_log(contact.id.clone(), InteractionKind::Call)}>{"☎"}</Button>
                                    <Button variant={ButtonVariant::Plain} onclick={on_quick_log(contact.id.clone(), InteractionKind::Note)}>{"✎"}</Button>
                                </div>
                            </div>
                        })}
                    }
                </section>

                <section class="flex-column-gap">
                    <h2 class="section-title">{"Add contact"}</h2>
                    <TextField label={"Email"} input_type={"email"} required={true} value={(*email).clone()} oninput={bind_text(&email)} />
                    <TextField label={"Name"} value={(*name).clone()} oninput={bind_text(&name)} />
                    <TextField label={"Company"} value={(*company).clone()} oninput={bind_text(&company)} />
                    <Button variant={ButtonVariant::Primary} block={true} disabled={*busy || email.trim().is_empty()} onclick={on_submit}>
                        {"Save contact"}
                    </Button>
                </section>

                <section class="flex-column-gap">
                    <Button variant={ButtonVariant::Secondary} block={true} onclick={open_dashboard()}>
                        {"Open Dashboard"}
                    </Button>
                    <Button variant={ButtonVariant::Secondary} block={true} onclick={open_dashboard()}>
                        {"Schedule meeting"}
                    </Button>
                </section>
            </div>
        },
    }
}
