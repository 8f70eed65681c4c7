/// Dashboard dialogs for creating and editing contacts, interactions and meetings

use crate::contacts::{
    add_contact, display_name, log_interaction, non_empty, schedule_meeting, ContactDraft,
    InteractionDraft, MeetingDraft,
};
use crate::error::Error;
use crate::gateway::Gateway;
use crate::models::{Contact, ContactChanges, InteractionKind};
use crate::ui::components::{
    bind_select, bind_text, local_input_to_iso, FormDialog, TextAreaField, TextField,
};
use crate::ui::GatewayHandle;
use patternfly_yew::prelude::{Button, ButtonVariant};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct AddContactProps {
    pub gateway: GatewayHandle,
    pub on_done: Callback<()>,
    pub on_close: Callback<()>,
    pub on_error: Callback<String>,
}

/// Props of the dialogs acting on one saved contact
#[derive(Properties, PartialEq)]
pub struct ContactDialogProps {
    pub gateway: GatewayHandle,
    pub contact: Contact,
    pub on_done: Callback<()>,
    pub on_close: Callback<()>,
    pub on_error: Callback<String>,
    /// Switch to another dialog for the same contact
    #[prop_or_default]
    pub on_switch: Callback<DialogKind>,
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum DialogKind {
    LogInteraction,
    ScheduleMeeting,
}

fn failure_text(action: &str, error: &Error) -> String {
    match error {
        Error::Validation(message) => message.clone(),
        Error::DuplicateContact(_) => "Contact already exists".to_string(),
        other => format!("Failed to {}: {}", action, other),
    }
}

#[function_component(AddContactDialog)]
pub fn add_contact_dialog(props: &AddContactProps) -> Html {
    let email = use_state(String::new);
    let name = use_state(String::new);
    let company = use_state(String::new);
    let title = use_state(String::new);
    let phone = use_state(String::new);
    let notes = use_state(String::new);
    let saving = use_state(|| false);

    let on_save = {
        let gateway = props.gateway.clone();
        let on_done = props.on_done.clone();
        let on_error = props.on_error.clone();
        let fields = (
            email.clone(),
            name.clone(),
            company.clone(),
            title.clone(),
            phone.clone(),
            notes.clone(),
        );
        let saving = saving.clone();
        Callback::from(move |_: MouseEvent| {
            let draft = ContactDraft {
                email: (*fields.0).clone(),
                name: (*fields.1).clone(),
                company: (*fields.2).clone(),
                title: (*fields.3).clone(),
                phone: (*fields.4).clone(),
                notes: (*fields.5).clone(),
            };
            let gateway = gateway.clone();
            let on_done = on_done.clone();
            let on_error = on_error.clone();
            let saving = saving.clone();

            saving.set(true);
            spawn_local(async move {
                match add_contact(&*gateway, &draft).await {
                    Ok(_) => on_done.emit(()),
                    Err(e) => {
                        log::error!("Failed to add contact: {}", e);
                        on_error.emit(failure_text("add contact", &e));
                    }
                }
                saving.set(false);
            });
        })
    };

    html! {
        <FormDialog title={"Add contact"} on_close={props.on_close.clone()}>
            <div class="flex-column-gap">
                <TextField label={"Email"} input_type={"email"} required={true} value={(*email).clone()} oninput={bind_text(&email)} />
                <TextField label={"Name"} value={(*name).clone()} oninput={bind_text(&name)} />
                <TextField label={"Company"} value={(*company).clone()} oninput={bind_text(&company)} />
                <TextField label={"Title"} value={(*title).clone()} oninput={bind_text(&title)} />
                <TextField label={"Phone"} input_type={"tel"} value={(*phone).clone()} oninput={bind_text(&phone)} />
                <TextAreaField label={"Notes"} value={(*notes).clone()} oninput={bind_text(&notes)} />
                <Button variant={ButtonVariant::Primary} block={true} disabled={*saving || email.trim().is_empty()} onclick={on_save}>
                    {"Add contact"}
                </Button>
            </div>
        </FormDialog>
    }
}

/// Contact details with inline editing, delete and follow-up actions
#[function_component(ContactDetailDialog)]
pub fn contact_detail_dialog(props: &ContactDialogProps) -> Html {
    let contact = props.contact.clone();

    let name = use_state(|| contact.name.clone().unwrap_or_default());
    let company = use_state(|| contact.company.clone().unwrap_or_default());
    let title = use_state(|| contact.title.clone().unwrap_or_default());
    let phone = use_state(|| contact.phone.clone().unwrap_or_default());
    let linkedin_url = use_state(|| contact.linkedin_url.clone().unwrap_or_default());
    let website = use_state(|| contact.website.clone().unwrap_or_default());
    let notes = use_state(|| contact.notes.clone());
    let editing = use_state(|| false);

    let on_edit = {
        let editing = editing.clone();
        Callback::from(move |_: MouseEvent| editing.set(true))
    };

    let on_save = {
        let gateway = props.gateway.clone();
        let on_done = props.on_done.clone();
        let on_error = props.on_error.clone();
        let contact = contact.clone();
        let fields = (
            name.clone(),
            company.clone(),
            title.clone(),
            phone.clone(),
            linkedin_url.clone(),
            website.clone(),
            notes.clone(),
        );
        Callback::from(move |_: MouseEvent| {
            let changes = ContactChanges {
                name: non_empty(&fields.0),
                company: non_empty(&fields.1),
                title: non_empty(&fields.2),
                phone: non_empty(&fields.3),
                linkedin_url: non_empty(&fields.4),
                website: non_empty(&fields.5),
                notes: fields.6.trim().to_string(),
                ..ContactChanges::from(&contact)
            };
            let gateway = gateway.clone();
            let on_done = on_done.clone();
            let on_error = on_error.clone();
            let id = contact.id.clone();
            spawn_local(async move {
                match gateway.update_contact(&id, &changes).await {
                    Ok(_) => on_done.emit(()),
                    Err(e) => {
                        log::error!("Failed to update contact {}: {}", id, e);
                        on_error.emit(failure_text("update contact", &e));
                    }
                }
            });
        })
    };

    let on_delete = {
        let gateway = props.gateway.clone();
        let on_done = props.on_done.clone();
        let on_error = props.on_error.clone();
        let id = contact.id.clone();
        let label = display_name(&contact).to_string();
        Callback::from(move |_: MouseEvent| {
            let confirmed = web_sys::window()
                .and_then(|w| {
                    w.confirm_with_message(&format!("Delete {}? This cannot be undone.", label))
                        .ok()
                })
                .unwrap_or(false);
            if !confirmed {
                return;
            }

            let gateway = gateway.clone();
            let on_done = on_done.clone();
            let on_error = on_error.clone();
            let id = id.clone();
            spawn_local(async move {
                match gateway.delete_contact(&id).await {
                    Ok(()) => on_done.emit(()),
                    Err(e) => {
                        log::error!("Failed to delete contact {}: {}", id, e);
                        on_error.emit(failure_text("delete contact", &e));
                    }
                }
            });
        })
    };

    let switch_to = |kind: DialogKind| {
        let on_switch = props.on_switch.clone();
        Callback::from(move |_: MouseEvent| on_switch.emit(kind))
    };

    let detail = |label: &'static str, value: Option<&String>| match value {
        Some(value) if !value.is_empty() => html! {
            <div class="detail-row">
                <span class="detail-label">{label}</span>
                <span class="detail-value">{value}</span>
            </div>
        },
        _ => html! {},
    };

    html! {
        <FormDialog title={display_name(&contact).to_string()} on_close={props.on_close.clone()}>
            <div class="flex-column-gap">
                if *editing {
                    <TextField label={"Name"} value={(*name).clone()} oninput={bind_text(&name)} />
                    <TextField label={"Company"} value={(*company).clone()} oninput={bind_text(&company)} />
                    <TextField label={"Title"} value={(*title).clone()} oninput={bind_text(&title)} />
                    <TextField label={"Phone"} input_type={"tel"} value={(*phone).clone()} oninput={bind_text(&phone)} />
                    <TextField label={"LinkedIn"} input_type={"url"} value={(*linkedin_url).clone()} oninput={bind_text(&linkedin_url)} />
                    <TextField label={"Website"} input_type={"url"} value={(*website).clone()} oninput={bind_text(&website)} />
                    <TextAreaField label={"Notes"} value={(*notes).clone()} oninput={bind_text(&notes)} />
                    <Button variant={ButtonVariant::Primary} block={true} onclick={on_save}>{"Save"}</Button>
                } else {
                    {detail("Email", Some(&contact.email))}
                    {detail("Company", contact.company.as_ref())}
                    {detail("Title", contact.title.as_ref())}
                    {detail("Phone", contact.phone.as_ref())}
                    {detail("LinkedIn", contact.linkedin_url.as_ref())}
                    {detail("Website", contact.website.as_ref())}
                    {detail("Notes", Some(&contact.notes))}
                    {detail("Last contacted", contact.last_contacted.as_ref())}
                    <div class="button-row">
                        <Button variant={ButtonVariant::Secondary} onclick={on_edit}>{"Edit"}</Button>
                        <Button variant={ButtonVariant::Secondary} onclick={switch_to(DialogKind::LogInteraction)}>{"Log interaction"}</Button>
                        <Button variant={ButtonVariant::Secondary} onclick={switch_to(DialogKind::ScheduleMeeting)}>{"Schedule meeting"}</Button>
                        <Button variant={ButtonVariant::Danger} onclick={on_delete}>{"Delete"}</Button>
                    </div>
                }
            </div>
        </FormDialog>
    }
}

fn parse_kind(value: &str) -> InteractionKind {
    match value {
        "call" => InteractionKind::Call,
        "meeting" => InteractionKind::Meeting,
        "note" => InteractionKind::Note,
        _ => InteractionKind::Email,
    }
}

#[function_component(InteractionDialog)]
pub fn interaction_dialog(props: &ContactDialogProps) -> Html {
    let kind = use_state(|| InteractionKind::Email.as_str().to_string());
    let subject = use_state(String::new);
    let content = use_state(String::new);
    let contact = &props.contact;

    let on_save = {
        let gateway = props.gateway.clone();
        let on_done = props.on_done.clone();
        let on_error = props.on_error.clone();
        let (kind, subject, content) = (kind.clone(), subject.clone(), content.clone());
        let contact_id = contact.id.clone();
        Callback::from(move |_: MouseEvent| {
            let draft = InteractionDraft {
                kind: parse_kind(&kind),
                subject: (*subject).clone(),
                content: (*content).clone(),
                url: None,
            };
            let gateway = gateway.clone();
            let on_done = on_done.clone();
            let on_error = on_error.clone();
            let contact_id = contact_id.clone();
            spawn_local(async move {
                match log_interaction(&*gateway, &contact_id, &draft).await {
                    Ok(_) => on_done.emit(()),
                    Err(e) => {
                        log::error!("Failed to log interaction: {}", e);
                        on_error.emit(failure_text("log interaction", &e));
                    }
                }
            });
        })
    };

    html! {
        <FormDialog title={format!("Log interaction with {}", display_name(&contact))} on_close={props.on_close.clone()}>
            <div class="flex-column-gap">
                <label class="form-field">
                    <span class="form-label">{"Type"}</span>
                    <select class="pf-v5-c-form-control" onchange={bind_select(&kind)}>
                        {for [InteractionKind::Email, InteractionKind::Call, InteractionKind::Meeting, InteractionKind::Note]
                            .into_iter()
                            .map(|option| html! {
                                <option value={option.as_str()} selected={*kind == option.as_str()}>
                                    {option.as_str()}
                                </option>
                            })}
                    </select>
                </label>
                <TextField label={"Subject"} value={(*subject).clone()} oninput={bind_text(&subject)} />
                <TextAreaField label={"Notes"} value={(*content).clone()} oninput={bind_text(&content)} />
                <Button variant={ButtonVariant::Primary} block={true} onclick={on_save}>{"Log interaction"}</Button>
            </div>
        </FormDialog>
    }
}

#[function_component(MeetingDialog)]
pub fn meeting_dialog(props: &ContactDialogProps) -> Html {
    let title = use_state(String::new);
    let description = use_state(String::new);
    let scheduled_at = use_state(String::new);
    let duration = use_state(|| "30".to_string());
    let meeting_url = use_state(String::new);
    let contact = &props.contact;

    let on_save = {
        let gateway = props.gateway.clone();
        let on_done = props.on_done.clone();
        let on_error = props.on_error.clone();
        let fields = (
            title.clone(),
            description.clone(),
            scheduled_at.clone(),
            duration.clone(),
            meeting_url.clone(),
        );
        let contact_id = contact.id.clone();
        Callback::from(move |_: MouseEvent| {
            let draft = MeetingDraft {
                title: (*fields.0).clone(),
                description: (*fields.1).clone(),
                scheduled_at: local_input_to_iso(&fields.2).unwrap_or_default(),
                duration_minutes: fields.3.trim().parse().unwrap_or(0),
                meeting_url: (*fields.4).clone(),
            };
            let gateway = gateway.clone();
            let on_done = on_done.clone();
            let on_error = on_error.clone();
            let contact_id = contact_id.clone();
            spawn_local(async move {
                match schedule_meeting(&*gateway, &contact_id, &draft).await {
                    Ok(_) => on_done.emit(()),
                    Err(e) => {
                        log::error!("Failed to schedule meeting: {}", e);
                        on_error.emit(failure_text("schedule meeting", &e));
                    }
                }
            });
        })
    };

    html! {
        <FormDialog title={format!("Schedule meeting with {}", display_name(&contact))} on_close={props.on_close.clone()}>
            <div class="flex-column-gap">
                <TextField label={"Title"} required={true} value={(*title).clone()} oninput={bind_text(&title)} />
                <TextAreaField label={"Description"} value={(*description).clone()} oninput={bind_text(&description)} />
                <TextField label={"When"} input_type={"datetime-local"} required={true} value={(*scheduled_at).clone()} oninput={bind_text(&scheduled_at)} />
                <TextField label={"Duration (minutes)"} input_type={"number"} value={(*duration).clone()} oninput={bind_text(&duration)} />
                <TextField label={"Meeting link"} input_type={"url"} value={(*meeting_url).clone()} oninput={bind_text(&meeting_url)} />
                <Button variant={ButtonVariant::Primary} block={true} disabled={title.trim().is_empty()} onclick={on_save}>
                    {"Schedule"}
                </Button>
            </div>
        </FormDialog>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind() {
        assert_eq!(parse_kind("call"), InteractionKind::Call);
        assert_eq!(parse_kind("note"), InteractionKind::Note);
        assert_eq!(parse_kind("meeting"), InteractionKind::Meeting);
        assert_eq!(parse_kind("email"), InteractionKind::Email);
        assert_eq!(parse_kind(""), InteractionKind::Email);
    }

    #[test]
    fn test_failure_text() {
        assert_eq!(
            failure_text("add contact", &Error::DuplicateContact("a@b.com".to_string())),
            "Contact already exists"
        );
        assert_eq!(
            failure_text("schedule meeting", &Error::Validation("Meeting title is required".to_string())),
            "Meeting title is required"
        );
        assert_eq!(
            failure_text("delete contact", &Error::NotSignedIn),
            "Failed to delete contact: not signed in"
        );
    }
}
