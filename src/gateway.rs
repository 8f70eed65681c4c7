/// Backend gateway: typed CRUD over contacts, interactions and meetings,
/// plus sign-in, on the hosted Supabase backend
use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::models::{
    Contact, ContactChanges, Interaction, Meeting, MeetingStatus, NewContact, NewInteraction,
    NewMeeting,
};
use crate::rest::{FetchTransport, Method, RestRequest, Transport};
use crate::storage::{AuthSession, AuthUser, ChromeSessionStore, SessionStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::cell::RefCell;

const CONTACTS: &str = "contacts";
const INTERACTIONS: &str = "interactions";
const MEETINGS: &str = "meetings";
const WITH_CONTACT: &str = "*,contacts(name,email)";

/// Storage operations the UI and contact workflows need
#[allow(async_fn_in_trait)]
pub trait Gateway {
    fn current_user(&self) -> Option<AuthUser>;

    async fn recent_contacts(&self, limit: usize) -> Result<Vec<Contact>>;
    async fn list_contacts(&self) -> Result<Vec<Contact>>;
    async fn find_contact_by_email(&self, email: &str) -> Result<Option<Contact>>;
    async fn insert_contact(&self, contact: &NewContact) -> Result<Contact>;
    async fn update_contact(&self, id: &str, changes: &ContactChanges) -> Result<Contact>;
    async fn touch_contact(&self, id: &str, last_contacted: &str) -> Result<()>;
    async fn delete_contact(&self, id: &str) -> Result<()>;

    async fn list_interactions(&self) -> Result<Vec<Interaction>>;
    async fn insert_interaction(&self, interaction: &NewInteraction) -> Result<Interaction>;

    async fn list_meetings(&self) -> Result<Vec<Meeting>>;
    async fn insert_meeting(&self, meeting: &NewMeeting) -> Result<Meeting>;
    async fn update_meeting_status(&self, id: &str, status: MeetingStatus) -> Result<Meeting>;
}

/// Result of creating an account
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    SignedIn(AuthUser),
    /// The project requires email confirmation before the first sign-in
    ConfirmationRequired,
}

pub struct SupabaseGateway<T = FetchTransport, S = ChromeSessionStore> {
    config: BackendConfig,
    transport: T,
    store: S,
    session: RefCell<Option<AuthSession>>,
}

impl SupabaseGateway {
    pub fn connect(config: BackendConfig) -> SupabaseGateway {
        SupabaseGateway::new(config, FetchTransport::default(), ChromeSessionStore)
    }
}

impl<T: Transport, S: SessionStore> SupabaseGateway<T, S> {
    pub fn new(config: BackendConfig, transport: T, store: S) -> SupabaseGateway<T, S> {
        SupabaseGateway {
            config,
            transport,
            store,
            session: RefCell::new(None),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.borrow().is_some()
    }

    /// Load the shared session; refresh it when it has expired
    pub async fn restore_session(&self, now_secs: i64) -> Result<Option<AuthUser>> {
        let Some(session) = self.store.load().await? else {
            return Ok(None);
        };

        *self.session.borrow_mut() = Some(session.clone());
        if session.is_expired(now_secs) && !self.refresh_session().await? {
            return Ok(None);
        }

        Ok(self.current_user())
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        let url = self.url("auth/v1/token", &[("grant_type", "password")])?;
        let body = json!({ "email": email, "password": password }).to_string();

        let response = self
            .transport
            .send(self.request(Method::Post, url, Some(body), None, &self.config.anon_key))
            .await?
            .into_result()
            .map_err(auth_error)?;

        let session: AuthSession = serde_json::from_str(&response)?;
        let user = session.user.clone();
        self.adopt(session).await?;

        log::info!("Signed in as {}", user.email.as_deref().unwrap_or(&user.id));
        Ok(user)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome> {
        let url = self.url("auth/v1/signup", &[])?;
        let body = json!({ "email": email, "password": password }).to_string();

        let response = self
            .transport
            .send(self.request(Method::Post, url, Some(body), None, &self.config.anon_key))
            .await?
            .into_result()
            .map_err(auth_error)?;

        let value: Value = serde_json::from_str(&response)?;
        if value.get("access_token").is_none() {
            return Ok(SignUpOutcome::ConfirmationRequired);
        }

        let session: AuthSession = serde_json::from_value(value)?;
        let user = session.user.clone();
        self.adopt(session).await?;
        Ok(SignUpOutcome::SignedIn(user))
    }

    /// Revoke the session server-side (best effort) and forget it locally
    pub async fn sign_out(&self) -> Result<()> {
        let token = self.session.borrow().as_ref().map(|s| s.access_token.clone());

        if let Some(token) = token {
            let url = self.url("auth/v1/logout", &[])?;
            match self
                .transport
                .send(self.request(Method::Post, url, None, None, &token))
                .await
                .and_then(|r| r.into_result())
            {
                Ok(_) => {}
                Err(e) => log::warn!("Logout request failed: {}", e),
            }
        }

        *self.session.borrow_mut() = None;
        self.store.clear().await
    }

    async fn adopt(&self, session: AuthSession) -> Result<()> {
        self.store.save(&session).await?;
        *self.session.borrow_mut() = Some(session);
        Ok(())
    }

    /// Exchange the refresh token. Returns `false` (and drops the session)
    /// when there is nothing to refresh or the backend refuses.
    async fn refresh_session(&self) -> Result<bool> {
        let refresh_token = self
            .session
            .borrow()
            .as_ref()
            .map(|s| s.refresh_token.clone());
        let Some(refresh_token) = refresh_token else {
            return Ok(false);
        };

        let url = self.url("auth/v1/token", &[("grant_type", "refresh_token")])?;
        let body = json!({ "refresh_token": refresh_token }).to_string();
        let refreshed = self
            .transport
            .send(self.request(Method::Post, url, Some(body), None, &self.config.anon_key))
            .await
            .and_then(|r| r.into_result())
            .and_then(|text| Ok(serde_json::from_str::<AuthSession>(&text)?));

        match refreshed {
            Ok(session) => {
                log::debug!("Session refreshed");
                self.adopt(session).await?;
                Ok(true)
            }
            Err(e) => {
                log::warn!("Session refresh failed, signing out: {}", e);
                *self.session.borrow_mut() = None;
                self.store.clear().await?;
                Ok(false)
            }
        }
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<String> {
        let mut url = self.config.endpoint(path)?;
        if !params.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        Ok(url.into())
    }

    fn rest_url(&self, table: &str, params: &[(&str, &str)]) -> Result<String> {
        self.url(&format!("rest/v1/{}", table), params)
    }

    fn request(
        &self,
        method: Method,
        url: String,
        body: Option<String>,
        prefer: Option<&str>,
        bearer: &str,
    ) -> RestRequest {
        let mut headers = vec![
            ("apikey".to_string(), self.config.anon_key.clone()),
            ("Authorization".to_string(), format!("Bearer {}", bearer)),
        ];
        if body.is_some() {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        if let Some(prefer) = prefer {
            headers.push(("Prefer".to_string(), prefer.to_string()));
        }

        RestRequest {
            method,
            url,
            headers,
            body,
        }
    }

    fn bearer(&self) -> String {
        self.session
            .borrow()
            .as_ref()
            .map(|s| s.access_token.clone())
            .unwrap_or_else(|| self.config.anon_key.clone())
    }

    /// Run a data request; an expired token gets one refresh and retry
    async fn execute(
        &self,
        method: Method,
        url: String,
        body: Option<String>,
        prefer: Option<&str>,
    ) -> Result<String> {
        let first = self
            .transport
            .send(self.request(method, url.clone(), body.clone(), prefer, &self.bearer()))
            .await?;

        if first.status == 401 && self.is_signed_in() && self.refresh_session().await? {
            return self
                .transport
                .send(self.request(method, url, body, prefer, &self.bearer()))
                .await?
                .into_result();
        }

        first.into_result()
    }

    async fn select<R: DeserializeOwned>(&self, table: &str, params: &[(&str, &str)]) -> Result<Vec<R>> {
        let url = self.rest_url(table, params)?;
        let text = self.execute(Method::Get, url, None, None).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn insert<B: Serialize, R: DeserializeOwned>(&self, table: &str, row: &B) -> Result<R> {
        let url = self.rest_url(table, &[])?;
        let body = serde_json::to_string(row)?;
        let text = self
            .execute(Method::Post, url, Some(body), Some("return=representation"))
            .await?;
        first_row(&text)
    }

    async fn patch<B: Serialize, R: DeserializeOwned>(&self, table: &str, id: &str, changes: &B) -> Result<R> {
        let filter = format!("eq.{}", id);
        let url = self.rest_url(table, &[("id", &filter)])?;
        let body = serde_json::to_string(changes)?;
        let text = self
            .execute(Method::Patch, url, Some(body), Some("return=representation"))
            .await?;
        first_row(&text)
    }

    fn require_user(&self) -> Result<AuthUser> {
        self.current_user().ok_or(Error::NotSignedIn)
    }
}

impl<T: Transport, S: SessionStore> Gateway for SupabaseGateway<T, S> {
    fn current_user(&self) -> Option<AuthUser> {
        self.session.borrow().as_ref().map(|s| s.user.clone())
    }

    async fn recent_contacts(&self, limit: usize) -> Result<Vec<Contact>> {
        self.require_user()?;
        let limit = limit.to_string();
        self.select(
            CONTACTS,
            &[("select", "*"), ("order", "created_at.desc"), ("limit", &limit)],
        )
        .await
    }

    async fn list_contacts(&self) -> Result<Vec<Contact>> {
        self.require_user()?;
        self.select(CONTACTS, &[("select", "*"), ("order", "created_at.desc")])
            .await
    }

    async fn find_contact_by_email(&self, email: &str) -> Result<Option<Contact>> {
        let user = self.require_user()?;
        let user_filter = format!("eq.{}", user.id);
        let email_filter = format!("eq.{}", email);
        let rows: Vec<Contact> = self
            .select(
                CONTACTS,
                &[
                    ("select", "*"),
                    ("user_id", &user_filter),
                    ("email", &email_filter),
                    ("limit", "1"),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_contact(&self, contact: &NewContact) -> Result<Contact> {
        self.require_user()?;
        self.insert(CONTACTS, contact).await
    }

    async fn update_contact(&self, id: &str, changes: &ContactChanges) -> Result<Contact> {
        self.require_user()?;
        self.patch(CONTACTS, id, changes).await
    }

    async fn touch_contact(&self, id: &str, last_contacted: &str) -> Result<()> {
        self.require_user()?;
        let _: Contact = self
            .patch(CONTACTS, id, &json!({ "last_contacted": last_contacted }))
            .await?;
        Ok(())
    }

    async fn delete_contact(&self, id: &str) -> Result<()> {
        self.require_user()?;
        let filter = format!("eq.{}", id);
        let url = self.rest_url(CONTACTS, &[("id", &filter)])?;
        self.execute(Method::Delete, url, None, None).await?;
        Ok(())
    }

    async fn list_interactions(&self) -> Result<Vec<Interaction>> {
        self.require_user()?;
        self.select(
            INTERACTIONS,
            &[("select", WITH_CONTACT), ("order", "created_at.desc")],
        )
        .await
    }

    async fn insert_interaction(&self, interaction: &NewInteraction) -> Result<Interaction> {
        self.require_user()?;
        self.insert(INTERACTIONS, interaction).await
    }

    async fn list_meetings(&self) -> Result<Vec<Meeting>> {
        self.require_user()?;
        self.select(
            MEETINGS,
            &[("select", WITH_CONTACT), ("order", "scheduled_at.asc")],
        )
        .await
    }

    async fn insert_meeting(&self, meeting: &NewMeeting) -> Result<Meeting> {
        self.require_user()?;
        self.insert(MEETINGS, meeting).await
    }

    async fn update_meeting_status(&self, id: &str, status: MeetingStatus) -> Result<Meeting> {
        self.require_user()?;
        self.patch(MEETINGS, id, &json!({ "status": status })).await
    }
}

/// Writes with `return=representation` answer with an array of rows
fn first_row<R: DeserializeOwned>(text: &str) -> Result<R> {
    let rows: Vec<R> = serde_json::from_str(text)?;
    rows.into_iter().next().ok_or_else(|| Error::Backend {
        status: 200,
        message: "no row returned".to_string(),
    })
}

fn auth_error(err: Error) -> Error {
    match err {
        Error::Backend { message, .. } => Error::Auth(message),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InteractionKind;
    use crate::rest::RestResponse;
    use crate::storage::MemorySessionStore;
    use futures::executor::block_on;
    use std::collections::VecDeque;

    /// Answers queued responses in order and records every request
    #[derive(Default)]
    struct ScriptedTransport {
        responses: RefCell<VecDeque<RestResponse>>,
        requests: RefCell<Vec<RestRequest>>,
    }

    impl ScriptedTransport {
        fn answering(responses: Vec<(u16, Value)>) -> ScriptedTransport {
            ScriptedTransport {
                responses: RefCell::new(
                    responses
                        .into_iter()
                        .map(|(status, body)| RestResponse {
                            status,
                            body: body.to_string(),
                        })
                        .collect(),
                ),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for ScriptedTransport {
        async fn send(&self, request: RestRequest) -> Result<RestResponse> {
            self.requests.borrow_mut().push(request);
            self.responses
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| Error::Js("unexpected request".to_string()))
        }
    }

    fn config() -> BackendConfig {
        BackendConfig::new(Some("https://abc.supabase.co"), Some("anon-key")).unwrap()
    }

    fn session(token: &str) -> AuthSession {
        AuthSession {
            access_token: token.to_string(),
            refresh_token: "refresh-1".to_string(),
            expires_at: Some(2_000),
            user: AuthUser {
                id: "user-1".to_string(),
                email: Some("me@example.com".to_string()),
            },
        }
    }

    fn contact_row(id: &str, email: &str) -> Value {
        json!({
            "id": id,
            "user_id": "user-1",
            "email": email,
            "name": null,
            "notes": "",
            "tags": [],
            "created_at": "2024-10-28T10:30:00Z",
            "updated_at": "2024-10-28T10:30:00Z"
        })
    }

    fn signed_in(
        responses: Vec<(u16, Value)>,
    ) -> SupabaseGateway<ScriptedTransport, MemorySessionStore> {
        let gateway = SupabaseGateway::new(
            config(),
            ScriptedTransport::answering(responses),
            MemorySessionStore::with_session(session("token-1")),
        );
        block_on(gateway.restore_session(1_000)).unwrap();
        gateway
    }

    #[test]
    fn test_restore_session_without_stored_session() {
        let gateway = SupabaseGateway::new(
            config(),
            ScriptedTransport::default(),
            MemorySessionStore::default(),
        );

        assert_eq!(block_on(gateway.restore_session(1_000)), Ok(None));
        assert!(!gateway.is_signed_in());
    }

    #[test]
    fn test_restore_expired_session_refreshes() {
        let gateway = SupabaseGateway::new(
            config(),
            ScriptedTransport::answering(vec![(
                200,
                json!({
                    "access_token": "token-2",
                    "refresh_token": "refresh-2",
                    "expires_at": 9_000,
                    "user": { "id": "user-1", "email": "me@example.com" }
                }),
            )]),
            MemorySessionStore::with_session(session("token-1")),
        );

        let user = block_on(gateway.restore_session(5_000)).unwrap();

        assert_eq!(user.unwrap().id, "user-1");
        assert_eq!(gateway.store.current().unwrap().access_token, "token-2");

        let requests = gateway.transport.requests.borrow();
        assert_eq!(
            requests[0].url,
            "https://abc.supabase.co/auth/v1/token?grant_type=refresh_token"
        );
        assert_eq!(requests[0].header("Authorization"), Some("Bearer anon-key"));
    }

    #[test]
    fn test_recent_contacts_query() {
        let gateway = signed_in(vec![(200, json!([contact_row("c1", "a@b.com")]))]);

        let contacts = block_on(gateway.recent_contacts(10)).unwrap();

        assert_eq!(contacts.len(), 1);
        let requests = gateway.transport.requests.borrow();
        assert_eq!(requests[0].method, Method::Get);
        assert_eq!(
            requests[0].url,
            "https://abc.supabase.co/rest/v1/contacts?select=*&order=created_at.desc&limit=10"
        );
        assert_eq!(requests[0].header("apikey"), Some("anon-key"));
        assert_eq!(requests[0].header("Authorization"), Some("Bearer token-1"));
        assert_eq!(requests[0].body, None);
    }

    #[test]
    fn test_find_contact_by_email_encodes_filter() {
        let gateway = signed_in(vec![(200, json!([]))]);

        let found = block_on(gateway.find_contact_by_email("a+b@c.com")).unwrap();

        assert_eq!(found, None);
        assert_eq!(
            gateway.transport.requests.borrow()[0].url,
            "https://abc.supabase.co/rest/v1/contacts?select=*&user_id=eq.user-1&email=eq.a%2Bb%40c.com&limit=1"
        );
    }

    #[test]
    fn test_insert_contact_returns_row() {
        let gateway = signed_in(vec![(201, json!([contact_row("c9", "new@x.io")]))]);

        let contact =
            block_on(gateway.insert_contact(&NewContact::from_email("user-1", "new@x.io"))).unwrap();

        assert_eq!(contact.id, "c9");
        let requests = gateway.transport.requests.borrow();
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(requests[0].header("Prefer"), Some("return=representation"));
        assert_eq!(requests[0].header("Content-Type"), Some("application/json"));
        let body: Value = serde_json::from_str(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({ "user_id": "user-1", "email": "new@x.io" }));
    }

    #[test]
    fn test_interactions_embed_contact() {
        let gateway = signed_in(vec![(
            200,
            json!([{
                "id": "i1",
                "user_id": "user-1",
                "contact_id": "c1",
                "type": "email",
                "subject": null,
                "content": "Sent email",
                "url": null,
                "created_at": "2024-10-28T10:30:00Z",
                "contacts": { "name": null, "email": "a@b.com" }
            }]),
        )]);

        let interactions = block_on(gateway.list_interactions()).unwrap();

        assert_eq!(interactions[0].kind, InteractionKind::Email);
        assert_eq!(
            gateway.transport.requests.borrow()[0].url,
            "https://abc.supabase.co/rest/v1/interactions?select=*%2Ccontacts%28name%2Cemail%29&order=created_at.desc"
        );
    }

    #[test]
    fn test_update_meeting_status() {
        let gateway = signed_in(vec![(
            200,
            json!([{
                "id": "m1",
                "user_id": "user-1",
                "contact_id": "c1",
                "title": "Intro",
                "description": "",
                "scheduled_at": "2024-11-01T15:00:00Z",
                "duration_minutes": 30,
                "meeting_url": null,
                "status": "completed",
                "created_at": "2024-10-28T10:30:00Z",
                "updated_at": "2024-10-29T10:30:00Z"
            }]),
        )]);

        let meeting = block_on(gateway.update_meeting_status("m1", MeetingStatus::Completed)).unwrap();

        assert_eq!(meeting.status, MeetingStatus::Completed);
        let requests = gateway.transport.requests.borrow();
        assert_eq!(requests[0].method, Method::Patch);
        assert_eq!(requests[0].url, "https://abc.supabase.co/rest/v1/meetings?id=eq.m1");
        assert_eq!(requests[0].body.as_deref(), Some(r#"{"status":"completed"}"#));
    }

    #[test]
    fn test_delete_contact() {
        let gateway = signed_in(vec![(204, Value::Null)]);

        block_on(gateway.delete_contact("c1")).unwrap();

        let requests = gateway.transport.requests.borrow();
        assert_eq!(requests[0].method, Method::Delete);
        assert_eq!(requests[0].url, "https://abc.supabase.co/rest/v1/contacts?id=eq.c1");
    }

    #[test]
    fn test_unauthorized_refreshes_and_retries_once() {
        let gateway = signed_in(vec![
            (401, json!({ "message": "JWT expired" })),
            (
                200,
                json!({
                    "access_token": "token-2",
                    "refresh_token": "refresh-2",
                    "user": { "id": "user-1" }
                }),
            ),
            (200, json!([])),
        ]);

        let contacts = block_on(gateway.list_contacts()).unwrap();

        assert!(contacts.is_empty());
        let requests = gateway.transport.requests.borrow();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].header("Authorization"), Some("Bearer token-1"));
        assert_eq!(requests[2].header("Authorization"), Some("Bearer token-2"));
    }

    #[test]
    fn test_failed_refresh_signs_out() {
        let gateway = signed_in(vec![
            (401, json!({ "message": "JWT expired" })),
            (400, json!({ "error_description": "Invalid Refresh Token" })),
        ]);

        let result = block_on(gateway.list_contacts());

        assert_eq!(
            result,
            Err(Error::Backend {
                status: 401,
                message: "JWT expired".to_string()
            })
        );
        assert!(!gateway.is_signed_in());
        assert_eq!(gateway.store.current(), None);
    }

    #[test]
    fn test_requires_sign_in() {
        let gateway = SupabaseGateway::new(
            config(),
            ScriptedTransport::default(),
            MemorySessionStore::default(),
        );

        assert_eq!(block_on(gateway.list_meetings()), Err(Error::NotSignedIn));
        assert!(gateway.transport.requests.borrow().is_empty());
    }

    #[test]
    fn test_sign_in_persists_session() {
        let gateway = SupabaseGateway::new(
            config(),
            ScriptedTransport::answering(vec![(
                200,
                json!({
                    "access_token": "token-9",
                    "refresh_token": "refresh-9",
                    "expires_at": 9_000,
                    "user": { "id": "user-9", "email": "me@example.com" }
                }),
            )]),
            MemorySessionStore::default(),
        );

        let user = block_on(gateway.sign_in("me@example.com", "hunter22")).unwrap();

        assert_eq!(user.id, "user-9");
        assert_eq!(gateway.store.current().unwrap().access_token, "token-9");
        assert_eq!(
            gateway.transport.requests.borrow()[0].url,
            "https://abc.supabase.co/auth/v1/token?grant_type=password"
        );
    }

    #[test]
    fn test_sign_in_bad_credentials() {
        let gateway = SupabaseGateway::new(
            config(),
            ScriptedTransport::answering(vec![(
                400,
                json!({ "error": "invalid_grant", "error_description": "Invalid login credentials" }),
            )]),
            MemorySessionStore::default(),
        );

        assert_eq!(
            block_on(gateway.sign_in("me@example.com", "nope")),
            Err(Error::Auth("Invalid login credentials".to_string()))
        );
        assert!(!gateway.is_signed_in());
    }

    #[test]
    fn test_sign_up_needing_confirmation() {
        let gateway = SupabaseGateway::new(
            config(),
            ScriptedTransport::answering(vec![(200, json!({ "id": "user-3", "email": "new@x.io" }))]),
            MemorySessionStore::default(),
        );

        assert_eq!(
            block_on(gateway.sign_up("new@x.io", "long-password")),
            Ok(SignUpOutcome::ConfirmationRequired)
        );
        assert!(!gateway.is_signed_in());
    }

    #[test]
    fn test_sign_out_clears_even_when_logout_fails() {
        let gateway = signed_in(vec![(500, json!({ "message": "boom" }))]);

        block_on(gateway.sign_out()).unwrap();

        assert!(!gateway.is_signed_in());
        assert_eq!(gateway.store.current(), None);
        assert_eq!(
            gateway.transport.requests.borrow()[0].url,
            "https://abc.supabase.co/auth/v1/logout"
        );
    }
}
