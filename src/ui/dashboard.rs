/// Dashboard page: sign-in plus full management of contacts,
/// interactions and meetings

use crate::contacts::{avatar_initial, display_name, filter_contacts};
use crate::gateway::{Gateway, SignUpOutcome};
use crate::models::{Contact, ContactRef, Interaction, Meeting, MeetingStatus};
use crate::storage::AuthUser;
use crate::ui::components::{
    bind_text, format_timestamp, ContactAvatar, EmptyNotice, Notice, NoticeBanner, TextField,
};
use crate::ui::dialogs::{
    AddContactDialog, ContactDetailDialog, DialogKind, InteractionDialog, MeetingDialog,
};
use crate::ui::{connect, now_secs, GatewayHandle};
use patternfly_yew::prelude::{Alert, AlertType, Button, ButtonVariant, Spinner};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

#[derive(Clone, PartialEq)]
enum Phase {
    Loading,
    SignedOut,
    SignedIn(AuthUser),
}

#[derive(Clone, Copy, PartialEq)]
enum ActiveTab {
    Contacts,
    Interactions,
    Meetings,
}

impl ActiveTab {
    fn label(&self) -> &'static str {
        match self {
            ActiveTab::Contacts => "Contacts",
            ActiveTab::Interactions => "Interactions",
            ActiveTab::Meetings => "Meetings",
        }
    }
}

/// Who an embedded contact reference should be shown as
fn contact_label(contact: Option<&ContactRef>) -> String {
    match contact {
        Some(ContactRef {
            name: Some(name), ..
        }) if !name.trim().is_empty() => name.clone(),
        Some(contact) => contact.email.clone(),
        None => "Unknown contact".to_string(),
    }
}

#[function_component(Dashboard)]
pub fn dashboard() -> Html {
    let gateway = use_memo((), |_| connect());

    match &*gateway {
        Ok(gateway) => html! { <DashboardShell gateway={gateway.clone()} /> },
        Err(e) => html! {
            <div class="padding-20">
                <Alert r#type={AlertType::Danger} title={"Configuration error"} inline={true}>
                    {e.to_string()}
                </Alert>
            </div>
        },
    }
}

#[derive(Properties, PartialEq)]
pub struct GatewayProps {
    pub gateway: GatewayHandle,
}

#[function_component(DashboardShell)]
pub fn dashboard_shell(props: &GatewayProps) -> Html {
    let phase = use_state(|| Phase::Loading);
    let active_tab = use_state(|| ActiveTab::Contacts);
    let error = use_state(|| None::<String>);

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

    let on_signed_in = {
        let phase = phase.clone();
        Callback::from(move |user: AuthUser| phase.set(Phase::SignedIn(user)))
    };

    let on_sign_out = {
        let gateway = props.gateway.clone();
        let phase = phase.clone();
        Callback::from(move |_: MouseEvent| {
            let gateway = gateway.clone();
            let phase = phase.clone();
            spawn_local(async move {
                if let Err(e) = gateway.sign_out().await {
                    log::error!("Sign out failed: {}", e);
                }
                phase.set(Phase::SignedOut);
            });
        })
    };

    let on_error = {
        let error = error.clone();
        Callback::from(move |message: String| error.set(Some(message)))
    };

    let on_tab_click = {
        let active_tab = active_tab.clone();
        let error = error.clone();
        move |tab: ActiveTab| {
            let active_tab = active_tab.clone();
            let error = error.clone();
            Callback::from(move |_: MouseEvent| {
                error.set(None);
                active_tab.set(tab);
            })
        }
    };

    let user = match &*phase {
        Phase::Loading => {
            return html! {
                <div class="loading-text-center">
                    <Spinner />
                </div>
            };
        }
        Phase::SignedOut => {
            return html! {
                <SignInForm gateway={props.gateway.clone()} on_signed_in={on_signed_in} />
            };
        }
        Phase::SignedIn(user) => user.clone(),
    };

    html! {
        <div class="dashboard">
            <header class="dashboard-header">
                <h1 class="dashboard-title">{"RelationHub"}</h1>
                <span class="dashboard-user">{user.email.clone().unwrap_or(user.id.clone())}</span>
                <Button variant={ButtonVariant::Secondary} onclick={on_sign_out}>{"Sign out"}</Button>
            </header>

            <div class="pf-v5-c-tabs tabs-nav">
                <ul class="pf-v5-c-tabs__list">
                    {for [ActiveTab::Contacts, ActiveTab::Interactions, ActiveTab::Meetings].into_iter().map(|tab| html! {
                        <li class={if *active_tab == tab { "pf-v5-c-tabs__item pf-m-current" } else { "pf-v5-c-tabs__item" }}>
                            <button class="pf-v5-c-tabs__link" onclick={on_tab_click(tab)}>
                                <span class="pf-v5-c-tabs__item-text">{tab.label()}</span>
                            </button>
                        </li>
                    })}
                </ul>
            </div>

            if let Some(message) = (*error).clone() {
                <NoticeBanner notice={Some(Notice::Failure(message))} />
            }

            <div class="tab-pane-content">
                {match *active_tab {
                    ActiveTab::Contacts => html! {
                        <ContactsTab gateway={props.gateway.clone()} on_error={on_error.clone()} />
                    },
                    ActiveTab::Interactions => html! {
                        <InteractionsTab gateway={props.gateway.clone()} on_error={on_error.clone()} />
                    },
                    ActiveTab::Meetings => html! {
                        <MeetingsTab gateway={props.gateway.clone()} on_error={on_error.clone()} />
                    },
                }}
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct SignInFormProps {
    pub gateway: GatewayHandle,
    pub on_signed_in: Callback<AuthUser>,
}

#[function_component(SignInForm)]
pub fn sign_in_form(props: &SignInFormProps) -> Html {
    let email = use_state(String::new);
    let password = use_state(String::new);
    let creating = use_state(|| false);
    let busy = use_state(|| false);
    let notice = use_state(|| None::<Notice>);

    let on_submit = {
        let gateway = props.gateway.clone();
        let on_signed_in = props.on_signed_in.clone();
        let (email, password) = (email.clone(), password.clone());
        let (creating, busy, notice) = (creating.clone(), busy.clone(), notice.clone());
        Callback::from(move |_: MouseEvent| {
            let gateway = gateway.clone();
            let on_signed_in = on_signed_in.clone();
            let (email, password) = (email.trim().to_string(), (*password).clone());
            let creating = *creating;
            let (busy, notice) = (busy.clone(), notice.clone());

            busy.set(true);
            notice.set(None);
            spawn_local(async move {
                let outcome = if creating {
                    gateway.sign_up(&email, &password).await
                } else {
                    gateway
                        .sign_in(&email, &password)
                        .await
                        .map(SignUpOutcome::SignedIn)
                };

                match outcome {
                    Ok(SignUpOutcome::SignedIn(user)) => on_signed_in.emit(user),
                    Ok(SignUpOutcome::ConfirmationRequired) => notice.set(Some(Notice::Success(
                        "Check your email to confirm your account, then sign in".to_string(),
                    ))),
                    Err(e) => {
                        log::error!("Authentication failed: {}", e);
                        notice.set(Some(Notice::Failure(e.to_string())));
                    }
                }
                busy.set(false);
            });
        })
    };

    let on_toggle_mode = {
        let creating = creating.clone();
        let notice = notice.clone();
        Callback::from(move |_: MouseEvent| {
            notice.set(None);
            creating.set(!*creating);
        })
    };

    let ready = !email.trim().is_empty() && !password.is_empty();

    html! {
        <div class="sign-in">
            <h1 class="dashboard-title">{"RelationHub"}</h1>
            <p>{if *creating { "Create your account" } else { "Sign in to your account" }}</p>
            <NoticeBanner notice={(*notice).clone()} />
            <div class="flex-column-gap">
                <TextField label={"Email"} input_type={"email"} required={true} value={(*email).clone()} oninput={bind_text(&email)} />
                <TextField label={"Password"} input_type={"password"} required={true} value={(*password).clone()} oninput={bind_text(&password)} />
                <Button variant={ButtonVariant::Primary} block={true} disabled={*busy || !ready} onclick={on_submit}>
                    {if *creating { "Sign up" } else { "Sign in" }}
                </Button>
                <Button variant={ButtonVariant::Plain} onclick={on_toggle_mode}>
                    {if *creating { "Already have an account? Sign in" } else { "No account yet? Sign up" }}
                </Button>
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct TabProps {
    pub gateway: GatewayHandle,
    pub on_error: Callback<String>,
}

#[derive(Clone, PartialEq)]
enum OpenDialog {
    Closed,
    Add,
    Detail(Contact),
    Interaction(Contact),
    Meeting(Contact),
}

#[function_component(ContactsTab)]
pub fn contacts_tab(props: &TabProps) -> Html {
    let contacts = use_state(Vec::<Contact>::new);
    let loading = use_state(|| true);
    let query = use_state(String::new);
    let reload = use_state(|| 0u32);
    let dialog = use_state(|| OpenDialog::Closed);

    {
        let gateway = props.gateway.clone();
        let on_error = props.on_error.clone();
        let (contacts, loading) = (contacts.clone(), loading.clone());
        use_effect_with(*reload, move |_| {
            loading.set(true);
            spawn_local(async move {
                match gateway.list_contacts().await {
                    Ok(rows) => contacts.set(rows),
                    Err(e) => {
                        log::error!("Failed to load contacts: {}", e);
                        on_error.emit(format!("Failed to load contacts: {}", e));
                    }
                }
                loading.set(false);
            });
            || ()
        });
    }

    let open = {
        let dialog = dialog.clone();
        move |next: OpenDialog| {
            let dialog = dialog.clone();
            Callback::from(move |_: MouseEvent| dialog.set(next.clone()))
        }
    };

    let on_close = {
        let dialog = dialog.clone();
        Callback::from(move |_: ()| dialog.set(OpenDialog::Closed))
    };

    let on_done = {
        let dialog = dialog.clone();
        let reload = reload.clone();
        Callback::from(move |_: ()| {
            dialog.set(OpenDialog::Closed);
            reload.set(*reload + 1);
        })
    };

    let visible = filter_contacts(&contacts, &query);

    let dialog_view = match &*dialog {
        OpenDialog::Closed => html! {},
        OpenDialog::Add => html! {
            <AddContactDialog
                gateway={props.gateway.clone()}
                on_done={on_done.clone()}
                on_close={on_close.clone()}
                on_error={props.on_error.clone()}
            />
        },
        OpenDialog::Detail(contact) => {
            let on_switch = {
                let dialog = dialog.clone();
                let contact = contact.clone();
                Callback::from(move |kind: DialogKind| {
                    dialog.set(match kind {
                        DialogKind::LogInteraction => OpenDialog::Interaction(contact.clone()),
                        DialogKind::ScheduleMeeting => OpenDialog::Meeting(contact.clone()),
                    })
                })
            };
            html! {
                <ContactDetailDialog
                    gateway={props.gateway.clone()}
                    contact={contact.clone()}
                    on_done={on_done.clone()}
                    on_close={on_close.clone()}
                    on_error={props.on_error.clone()}
                    on_switch={on_switch}
                />
            }
        }
        OpenDialog::Interaction(contact) => html! {
            <InteractionDialog
                gateway={props.gateway.clone()}
                contact={contact.clone()}
                on_done={on_done.clone()}
                on_close={on_close.clone()}
                on_error={props.on_error.clone()}
            />
        },
        OpenDialog::Meeting(contact) => html! {
            <MeetingDialog
                gateway={props.gateway.clone()}
                contact={contact.clone()}
                on_done={on_done.clone()}
                on_close={on_close.clone()}
                on_error={props.on_error.clone()}
            />
        },
    };

    html! {
        <div class="flex-column-gap">
            <div class="toolbar">
                <input
                    class="pf-v5-c-form-control"
                    type="search"
                    placeholder="Search by name, email or company"
                    value={(*query).clone()}
                    oninput={bind_text(&query)}
                />
                <Button variant={ButtonVariant::Primary} onclick={open(OpenDialog::Add)}>{"Add contact"}</Button>
            </div>

            if *loading {
                <Spinner />
            } else if visible.is_empty() {
                <EmptyNotice message={if query.trim().is_empty() { "No contacts yet" } else { "No contacts match your search" }} />
            } else {
                <table class="pf-v5-c-table pf-m-compact">
                    <thead>
                        <tr>
                            <th></th>
                            <th>{"Name"}</th>
                            <th>{"Email"}</th>
                            <th>{"Company"}</th>
                            <th>{"Last contacted"}</th>
                            <th></th>
                        </tr>
                    </thead>
                    <tbody>
                        {for visible.iter().map(|contact| html! {
                            <tr>
                                <td><ContactAvatar initial={avatar_initial(contact)} /></td>
                                <td>{display_name(contact)}</td>
                                <td>{&contact.email}</td>
                                <td>{contact.company.clone().unwrap_or_default()}</td>
                                <td>{contact.last_contacted.as_deref().map(format_timestamp).unwrap_or_default()}</td>
                                <td>
                                    <Button variant={ButtonVariant::Secondary} onclick={open(OpenDialog::Detail(contact.clone()))}>
                                        {"View"}
                                    </Button>
                                </td>
                            </tr>
                        })}
                    </tbody>
                </table>
            }

            {dialog_view}
        </div>
    }
}

#[function_component(InteractionsTab)]
pub fn interactions_tab(props: &TabProps) -> Html {
    let interactions = use_state(Vec::<Interaction>::new);
    let loading = use_state(|| true);

    {
        let gateway = props.gateway.clone();
        let on_error = props.on_error.clone();
        let (interactions, loading) = (interactions.clone(), loading.clone());
        use_effect_with((), move |_| {
            spawn_local(async move {
                match gateway.list_interactions().await {
                    Ok(rows) => interactions.set(rows),
                    Err(e) => {
                        log::error!("Failed to load interactions: {}", e);
                        on_error.emit(format!("Failed to load interactions: {}", e));
                    }
                }
                loading.set(false);
            });
            || ()
        });
    }

    if *loading {
        return html! { <Spinner /> };
    }
    if interactions.is_empty() {
        return html! { <EmptyNotice message={"No interactions logged yet"} /> };
    }

    html! {
        <ul class="timeline">
            {for interactions.iter().map(|interaction| html! {
                <li class="timeline-item">
                    <div class="timeline-meta">
                        <span class={classes!("type-badge", interaction.kind.as_str())}>{interaction.kind.as_str()}</span>
                        <span class="timeline-date">{format_timestamp(&interaction.created_at)}</span>
                        <span class="timeline-contact">{contact_label(interaction.contact.as_ref())}</span>
                    </div>
                    if let Some(subject) = &interaction.subject {
                        <h3 class="timeline-subject">{subject}</h3>
                    }
                    if !interaction.content.is_empty() {
                        <p class="timeline-content">{&interaction.content}</p>
                    }
                    if let Some(url) = &interaction.url {
                        <a class="timeline-link" href={url.clone()} target="_blank" rel="noopener noreferrer">{url}</a>
                    }
                </li>
            })}
        </ul>
    }
}

#[function_component(MeetingsTab)]
pub fn meetings_tab(props: &TabProps) -> Html {
    let meetings = use_state(Vec::<Meeting>::new);
    let loading = use_state(|| true);
    let reload = use_state(|| 0u32);
    let notice = use_state(|| None::<Notice>);

    {
        let gateway = props.gateway.clone();
        let on_error = props.on_error.clone();
        let (meetings, loading) = (meetings.clone(), loading.clone());
        use_effect_with(*reload, move |_| {
            spawn_local(async move {
                match gateway.list_meetings().await {
                    Ok(rows) => meetings.set(rows),
                    Err(e) => {
                        log::error!("Failed to load meetings: {}", e);
                        on_error.emit(format!("Failed to load meetings: {}", e));
                    }
                }
                loading.set(false);
            });
            || ()
        });
    }

    let set_status = {
        let gateway = props.gateway.clone();
        let on_error = props.on_error.clone();
        let reload = reload.clone();
        let notice = notice.clone();
        move |id: String, status: MeetingStatus| {
            let gateway = gateway.clone();
            let on_error = on_error.clone();
            let reload = reload.clone();
            let notice = notice.clone();
            Callback::from(move |_: MouseEvent| {
                let gateway = gateway.clone();
                let on_error = on_error.clone();
                let reload = reload.clone();
                let notice = notice.clone();
                let id = id.clone();
                spawn_local(async move {
                    match gateway.update_meeting_status(&id, status).await {
                        Ok(meeting) => {
                            notice.set(Some(Notice::Success(format!(
                                "Meeting marked {}",
                                meeting.status.as_str()
                            ))));
                            reload.set(*reload + 1);
                        }
                        Err(e) => {
                            log::error!("Failed to update meeting {}: {}", id, e);
                            on_error.emit(format!("Failed to update meeting: {}", e));
                        }
                    }
                });
            })
        }
    };

    if *loading {
        return html! { <Spinner /> };
    }

    html! {
        <div class="flex-column-gap">
            <NoticeBanner notice={(*notice).clone()} />
            if meetings.is_empty() {
                <EmptyNotice message={"No meetings scheduled"} />
            } else {
                {for meetings.iter().map(|meeting| html! {
                    <div class="meeting-card">
                        <div class="meeting-header">
                            <h3 class="meeting-title">{&meeting.title}</h3>
                            <span class={classes!("status-badge", meeting.status.as_str())}>{meeting.status.as_str()}</span>
                        </div>
                        <p class="meeting-when">
                            {format!(
                                "{} · {} min · {}",
                                format_timestamp(&meeting.scheduled_at),
                                meeting.duration_minutes,
                                contact_label(meeting.contact.as_ref())
                            )}
                        </p>
                        if !meeting.description.is_empty() {
                            <p class="meeting-description">{&meeting.description}</p>
                        }
                        if let Some(url) = &meeting.meeting_url {
                            <a href={url.clone()} target="_blank" rel="noopener noreferrer">{"Join link"}</a>
                        }
                        if meeting.status == MeetingStatus::Scheduled {
                            <div class="button-row">
                                <Button variant={ButtonVariant::Primary} onclick={set_status(meeting.id.clone(), MeetingStatus::Completed)}>
                                    {"Complete"}
                                </Button>
                                <Button variant={ButtonVariant::Danger} onclick={set_status(meeting.id.clone(), MeetingStatus::Cancelled)}>
                                    {"Cancel"}
                                </Button>
                            </div>
                        }
                    </div>
                })}
            }
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_label() {
        let named = ContactRef {
            name: Some("Ada Lovelace".to_string()),
            email: "ada@example.com".to_string(),
        };
        let unnamed = ContactRef {
            name: Some(" ".to_string()),
            email: "grace@navy.mil".to_string(),
        };

        assert_eq!(contact_label(Some(&named)), "Ada Lovelace");
        assert_eq!(contact_label(Some(&unnamed)), "grace@navy.mil");
        assert_eq!(contact_label(None), "Unknown contact");
    }

    #[test]
    fn test_tab_labels() {
        assert_eq!(ActiveTab::Contacts.label(), "Contacts");
        assert_eq!(ActiveTab::Meetings.label(), "Meetings");
    }
}
