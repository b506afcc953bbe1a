//! In-memory backend used by unit tests. Counts every call so tests can assert
//! exactly how many round trips a flow made.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use time::Duration;
use uuid::Uuid;

use super::{InviteLinks, ProfileDirectory, ProjectStore, SessionStore, StoreError, StoreResult};
use crate::{
    auth::jar::{SessionJar, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE},
    models::{NewProject, Profile, Project, ProjectUpdate, Role, Session},
};

#[derive(Default)]
pub struct FakeBackend {
    exchange_script: Mutex<VecDeque<StoreResult<Session>>>,
    token_pairs:     Mutex<HashMap<(String, String), Session>>,
    live_sessions:   Mutex<HashMap<String, Session>>,
    profiles:        Mutex<HashMap<String, Profile>>,
    projects:        Mutex<Vec<Project>>,
    magic_links:     Mutex<Vec<(String, String)>>,
    invites:         Mutex<Vec<String>>,
    invite_error:    Mutex<Option<String>>,
    forget_sessions: Mutex<bool>,
    profile_error:   Mutex<bool>,

    pub exchange_calls:   AtomicUsize,
    pub token_calls:      AtomicUsize,
    pub read_calls:       AtomicUsize,
    pub clear_calls:      AtomicUsize,
    pub sign_out_calls:   AtomicUsize,
    pub profile_calls:    AtomicUsize,
}

pub fn session(user_id: &str) -> Session {
    Session {
        user_id:       user_id.to_owned(),
        email:         Some(format!("{user_id}@example.com")),
        access_token:  format!("access-{user_id}"),
        refresh_token: format!("refresh-{user_id}"),
        expires_at:    None,
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the outcome of the next code exchange.
    pub fn script_exchange(&self, result: StoreResult<Session>) -> &Self {
        self.exchange_script.lock().unwrap().push_back(result);
        self
    }

    pub fn allow_token_pair(&self, access: &str, refresh: &str, session: Session) -> &Self {
        self.token_pairs
            .lock()
            .unwrap()
            .insert((access.to_owned(), refresh.to_owned()), session);
        self
    }

    pub fn with_profile(&self, user_id: &str, role: Option<&str>) -> &Self {
        self.profiles.lock().unwrap().insert(
            user_id.to_owned(),
            Profile {
                id:    user_id.to_owned(),
                role:  Role::from_column(role),
                email: Some(format!("{user_id}@example.com")),
            },
        );
        self
    }

    pub fn with_project(&self, project: Project) -> &Self {
        self.projects.lock().unwrap().push(project);
        self
    }

    /// Exchanges still succeed but the session can never be read back.
    pub fn forget_sessions(&self) -> &Self {
        *self.forget_sessions.lock().unwrap() = true;
        self
    }

    pub fn fail_profile_reads(&self) -> &Self {
        *self.profile_error.lock().unwrap() = true;
        self
    }

    /// Put `session` straight into `jar`, as if the user had logged in before.
    pub fn sign_in(&self, jar: &dyn SessionJar, session: Session) {
        self.persist(jar, session);
    }

    pub fn magic_links(&self) -> Vec<(String, String)> {
        self.magic_links.lock().unwrap().clone()
    }

    pub fn invites(&self) -> Vec<String> {
        self.invites.lock().unwrap().clone()
    }

    /// Make the next invite links fail the way the admin API rejects them.
    pub fn reject_invites(&self, message: &str) -> &Self {
        *self.invite_error.lock().unwrap() = Some(message.to_owned());
        self
    }

    pub fn store_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
            + self.token_calls.load(Ordering::SeqCst)
            + self.read_calls.load(Ordering::SeqCst)
            + self.clear_calls.load(Ordering::SeqCst)
            + self.sign_out_calls.load(Ordering::SeqCst)
    }

    fn persist(&self, jar: &dyn SessionJar, session: Session) {
        jar.set(ACCESS_TOKEN_COOKIE, &session.access_token, Duration::days(1));
        jar.set(REFRESH_TOKEN_COOKIE, &session.refresh_token, Duration::days(1));
        self.live_sessions
            .lock()
            .unwrap()
            .insert(session.access_token.clone(), session);
    }
}

fn rejected(message: &str) -> StoreError {
    StoreError::Rejected { status: 400, message: message.to_owned() }
}

#[async_trait]
impl SessionStore for FakeBackend {
    async fn send_magic_link(&self, _jar: &dyn SessionJar, email: &str, redirect_to: &str) -> StoreResult<()> {
        self.magic_links
            .lock()
            .unwrap()
            .push((email.to_owned(), redirect_to.to_owned()));
        Ok(())
    }

    async fn exchange_code_for_session(&self, jar: &dyn SessionJar, _code: &str) -> StoreResult<Session> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .exchange_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(rejected("invalid flow state")));
        let session = next?;
        self.persist(jar, session.clone());
        Ok(session)
    }

    async fn establish_session_from_tokens(
        &self,
        jar: &dyn SessionJar,
        access_token: &str,
        refresh_token: &str,
    ) -> StoreResult<Session> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        let session = self
            .token_pairs
            .lock()
            .unwrap()
            .remove(&(access_token.to_owned(), refresh_token.to_owned()))
            .ok_or_else(|| rejected("refresh token already used"))?;
        self.persist(jar, session.clone());
        Ok(session)
    }

    async fn current_session(&self, jar: &dyn SessionJar) -> Option<Session> {
        self.read_calls.fetch_add(1, Ordering::SeqCst);
        if *self.forget_sessions.lock().unwrap() {
            return None;
        }
        let token = jar.get(ACCESS_TOKEN_COOKIE)?;
        self.live_sessions.lock().unwrap().get(&token).cloned()
    }

    async fn clear_local_session(&self, jar: &dyn SessionJar) {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        jar.remove(ACCESS_TOKEN_COOKIE);
        jar.remove(REFRESH_TOKEN_COOKIE);
    }

    async fn sign_out(&self, jar: &dyn SessionJar) -> StoreResult<()> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = jar.get(ACCESS_TOKEN_COOKIE) {
            self.live_sessions.lock().unwrap().remove(&token);
        }
        jar.remove(ACCESS_TOKEN_COOKIE);
        jar.remove(REFRESH_TOKEN_COOKIE);
        Ok(())
    }
}

#[async_trait]
impl ProfileDirectory for FakeBackend {
    async fn get_profile_by_user_id(&self, user_id: &str) -> StoreResult<Option<Profile>> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        if *self.profile_error.lock().unwrap() {
            return Err(StoreError::Rejected { status: 500, message: "profiles unavailable".into() });
        }
        Ok(self.profiles.lock().unwrap().get(user_id).cloned())
    }

    async fn find_profile_by_email(&self, email: &str) -> StoreResult<Option<Profile>> {
        Ok(self
            .profiles
            .lock()
            .unwrap()
            .values()
            .find(|p| p.email.as_deref() == Some(email))
            .cloned())
    }
}

#[async_trait]
impl ProjectStore for FakeBackend {
    async fn list_projects(&self) -> StoreResult<Vec<Project>> {
        Ok(self.projects.lock().unwrap().clone())
    }

    async fn list_projects_for_user(&self, user_id: &str) -> StoreResult<Vec<Project>> {
        Ok(self
            .projects
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        Ok(self.projects.lock().unwrap().iter().find(|p| p.id == id).cloned())
    }

    async fn get_project_for_user(&self, id: Uuid, user_id: &str) -> StoreResult<Option<Project>> {
        Ok(self
            .projects
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id && p.user_id == user_id)
            .cloned())
    }

    async fn create_project(&self, new: &NewProject) -> StoreResult<Project> {
        let project = Project {
            id:              Uuid::new_v4(),
            user_id:         new.user_id.clone(),
            client_name:     Some(new.client_name.clone()),
            client_email:    new.client_email.clone(),
            business:        Some(new.business.clone()),
            industry:        Some(new.industry.clone()),
            goals:           Some(new.goals.clone()),
            painpoints:      Some(new.painpoints.clone()),
            pages:           Some(new.pages.clone()),
            content:         Some(new.content.clone()),
            features:        Some(new.features.clone()),
            admin_panel:     new.admin_panel,
            design_prefs:    Some(new.design_prefs.clone()),
            examples:        Some(new.examples.clone()),
            mood:            Some(new.mood.clone()),
            admin_notes:     None,
            progress_update: None,
            created_at:      None,
        };
        self.projects.lock().unwrap().push(project.clone());
        Ok(project)
    }

    async fn update_project(&self, id: Uuid, update: &ProjectUpdate) -> StoreResult<Option<Project>> {
        let mut projects = self.projects.lock().unwrap();
        let Some(project) = projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(ref notes) = update.admin_notes {
            project.admin_notes = Some(notes.clone());
        }
        if let Some(ref progress) = update.progress_update {
            project.progress_update = Some(progress.clone());
        }
        Ok(Some(project.clone()))
    }
}

#[async_trait]
impl InviteLinks for FakeBackend {
    async fn generate_magic_link(&self, email: &str, redirect_to: &str) -> StoreResult<String> {
        if let Some(message) = self.invite_error.lock().unwrap().clone() {
            return Err(StoreError::Rejected { status: 422, message });
        }
        self.invites.lock().unwrap().push(email.to_owned());
        Ok(format!("https://auth.example.com/verify?email={email}&redirect_to={redirect_to}"))
    }
}
