//! In-memory auth and data service.

use async_trait::async_trait;
use ataraxia_core::UserId;
use ataraxia_platform_access::{
    AuthGateway, AuthenticationError, Invitation, Profile, ProfileStore, Role, Session,
    StoreError, User,
};
use chrono::{Duration, Utc};
use rootcause::prelude::Report;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// Default session lifetime in seconds.
const SESSION_SECONDS: i64 = 3600;

#[derive(Debug)]
struct Account {
    user: User,
    password: String,
}

#[derive(Debug, Default)]
struct Calls {
    sign_in: usize,
    sign_out: usize,
    invite: usize,
    update_password: usize,
    exchange: usize,
    refresh: usize,
    get_user: usize,
    find_profile: usize,
    list_profiles: usize,
}

#[derive(Debug, Default)]
struct State {
    next_id: u128,
    accounts: HashMap<String, Account>,
    profiles: Vec<Profile>,
    access_tokens: HashMap<String, User>,
    refresh_tokens: HashMap<String, User>,
    codes: HashMap<String, User>,
    invitations: Vec<(String, String)>,
    invite_failure: Option<AuthenticationError>,
    profile_failure: Option<StoreError>,
    calls: Calls,
}

impl State {
    fn next_user_id(&mut self) -> UserId {
        self.next_id += 1;
        UserId::from_uuid(Uuid::from_u128(self.next_id))
    }

    fn mint_session(&mut self, user: &User, expires_in: i64) -> Session {
        self.next_id += 1;
        let access = format!("access-{}", self.next_id);
        let refresh = format!("refresh-{}", self.next_id);
        self.access_tokens.insert(access.clone(), user.clone());
        self.refresh_tokens.insert(refresh.clone(), user.clone());
        Session::from_expires_in(access, refresh, expires_in, user.clone())
    }

    fn user_for(&self, access_token: &str) -> Option<User> {
        self.access_tokens.get(access_token).cloned()
    }
}

/// In-memory stand-in for the hosted backend.
///
/// Cloning shares the underlying state.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<State>>,
}

impl FakeBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a user with a password and a profile row.
    pub fn add_user(&self, email: &str, password: &str, role: Role) -> User {
        self.add_user_named(email, password, role, None)
    }

    /// Registers a user whose profile carries a full name.
    pub fn add_user_named(
        &self,
        email: &str,
        password: &str,
        role: Role,
        full_name: Option<&str>,
    ) -> User {
        let mut state = self.lock();
        let id = state.next_user_id();
        let user = User::new(id, Some(email.to_string()));
        let created_at = Utc::now() + Duration::seconds(i64::try_from(state.next_id).unwrap_or(0));
        state.profiles.push(
            Profile::new(
                id,
                Some(email.to_string()),
                full_name.map(str::to_string),
                role,
            )
            .with_created_at(created_at),
        );
        state.accounts.insert(
            email.to_string(),
            Account {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        user
    }

    /// Registers a user that has no profile row.
    pub fn add_user_without_profile(&self, email: &str, password: &str) -> User {
        let mut state = self.lock();
        let id = state.next_user_id();
        let user = User::new(id, Some(email.to_string()));
        state.accounts.insert(
            email.to_string(),
            Account {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        user
    }

    /// Issues a valid session for `user`.
    pub fn issue_session(&self, user: &User) -> Session {
        self.lock().mint_session(user, SESSION_SECONDS)
    }

    /// Issues a session that expires `expires_in` seconds from now.
    pub fn issue_session_expiring_in(&self, user: &User, expires_in: i64) -> Session {
        self.lock().mint_session(user, expires_in)
    }

    /// Issues a one-time code that exchanges into a session for `user`.
    pub fn issue_code(&self, user: &User) -> String {
        let mut state = self.lock();
        state.next_id += 1;
        let code = format!("code-{}", state.next_id);
        state.codes.insert(code.clone(), user.clone());
        code
    }

    /// Invalidates every token issued for `user`.
    pub fn revoke_user(&self, user: &User) {
        let mut state = self.lock();
        state.access_tokens.retain(|_, u| u.id() != user.id());
        state.refresh_tokens.retain(|_, u| u.id() != user.id());
    }

    /// Makes every subsequent invitation fail with `error`.
    pub fn fail_invites_with(&self, error: AuthenticationError) {
        self.lock().invite_failure = Some(error);
    }

    /// Makes every subsequent profile read fail with `error`.
    pub fn fail_profile_reads_with(&self, error: StoreError) {
        self.lock().profile_failure = Some(error);
    }

    /// Returns `(email, redirect_to)` for every invitation issued.
    #[must_use]
    pub fn invitations(&self) -> Vec<(String, String)> {
        self.lock().invitations.clone()
    }

    /// Returns the password currently stored for `email`.
    #[must_use]
    pub fn password_of(&self, email: &str) -> Option<String> {
        self.lock().accounts.get(email).map(|a| a.password.clone())
    }

    /// Number of `sign_in` calls.
    #[must_use]
    pub fn sign_in_calls(&self) -> usize {
        self.lock().calls.sign_in
    }

    /// Number of `sign_out` calls.
    #[must_use]
    pub fn sign_out_calls(&self) -> usize {
        self.lock().calls.sign_out
    }

    /// Number of `invite_user` calls.
    #[must_use]
    pub fn invite_calls(&self) -> usize {
        self.lock().calls.invite
    }

    /// Number of `update_password` calls.
    #[must_use]
    pub fn update_password_calls(&self) -> usize {
        self.lock().calls.update_password
    }

    /// Number of `exchange_code` calls.
    #[must_use]
    pub fn exchange_calls(&self) -> usize {
        self.lock().calls.exchange
    }

    /// Number of `refresh_session` calls.
    #[must_use]
    pub fn refresh_calls(&self) -> usize {
        self.lock().calls.refresh
    }

    /// Number of `get_user` calls.
    #[must_use]
    pub fn get_user_calls(&self) -> usize {
        self.lock().calls.get_user
    }

    /// Number of `find_profile` calls.
    #[must_use]
    pub fn find_profile_calls(&self) -> usize {
        self.lock().calls.find_profile
    }

    /// Number of `list_profiles` calls.
    #[must_use]
    pub fn list_profiles_calls(&self) -> usize {
        self.lock().calls.list_profiles
    }
}

#[async_trait]
impl AuthGateway for FakeBackend {
    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, Report<AuthenticationError>> {
        let mut state = self.lock();
        state.calls.sign_in += 1;
        let user = match state.accounts.get(email) {
            Some(account) if !account.password.is_empty() && account.password == password => {
                account.user.clone()
            }
            _ => return Err(AuthenticationError::InvalidCredentials.into()),
        };
        Ok(state.mint_session(&user, SESSION_SECONDS))
    }

    async fn sign_out(&self, session: &Session) -> Result<(), Report<AuthenticationError>> {
        let mut state = self.lock();
        state.calls.sign_out += 1;
        state.access_tokens.remove(session.access_token());
        state.refresh_tokens.remove(session.refresh_token());
        Ok(())
    }

    async fn invite_user(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<Invitation, Report<AuthenticationError>> {
        let mut state = self.lock();
        state.calls.invite += 1;
        if let Some(error) = state.invite_failure.clone() {
            return Err(error.into());
        }
        if email.trim().is_empty() {
            return Err(AuthenticationError::EmailRequired.into());
        }
        if state.accounts.contains_key(email) {
            return Err(AuthenticationError::DuplicateUser {
                email: email.to_string(),
            }
            .into());
        }
        let id = state.next_user_id();
        let user = User::new(id, Some(email.to_string()));
        state.accounts.insert(
            email.to_string(),
            Account {
                user: user.clone(),
                password: String::new(),
            },
        );
        state
            .invitations
            .push((email.to_string(), redirect_to.to_string()));
        let raw = serde_json::json!({
            "id": id.to_string(),
            "email": email,
            "role": "authenticated",
        });
        Ok(Invitation { user, raw })
    }

    async fn update_password(
        &self,
        session: &Session,
        new_password: &str,
    ) -> Result<User, Report<AuthenticationError>> {
        let mut state = self.lock();
        state.calls.update_password += 1;
        let user = state
            .user_for(session.access_token())
            .ok_or(AuthenticationError::NotAuthenticated)?;
        if let Some(account) = user
            .email()
            .and_then(|email| state.accounts.get_mut(email))
        {
            account.password = new_password.to_string();
        }
        Ok(user)
    }

    async fn exchange_code(
        &self,
        code: &str,
        _code_verifier: Option<&str>,
    ) -> Result<Session, Report<AuthenticationError>> {
        let mut state = self.lock();
        state.calls.exchange += 1;
        let user = state
            .codes
            .remove(code)
            .ok_or_else(|| AuthenticationError::InvalidCode {
                reason: "code not found or already used".to_string(),
            })?;
        Ok(state.mint_session(&user, SESSION_SECONDS))
    }

    async fn refresh_session(
        &self,
        refresh_token: &str,
    ) -> Result<Session, Report<AuthenticationError>> {
        let mut state = self.lock();
        state.calls.refresh += 1;
        let user = state
            .refresh_tokens
            .remove(refresh_token)
            .ok_or(AuthenticationError::InvalidCredentials)?;
        Ok(state.mint_session(&user, SESSION_SECONDS))
    }

    async fn get_user(&self, access_token: &str) -> Result<User, Report<AuthenticationError>> {
        let mut state = self.lock();
        state.calls.get_user += 1;
        Ok(state
            .user_for(access_token)
            .ok_or(AuthenticationError::NotAuthenticated)?)
    }
}

#[async_trait]
impl ProfileStore for FakeBackend {
    async fn find_profile(
        &self,
        session: &Session,
        id: UserId,
    ) -> Result<Option<Profile>, Report<StoreError>> {
        let mut state = self.lock();
        state.calls.find_profile += 1;
        if let Some(error) = state.profile_failure.clone() {
            return Err(error.into());
        }
        if state.user_for(session.access_token()).is_none() {
            return Err(StoreError::Unauthorized.into());
        }
        Ok(state.profiles.iter().find(|p| p.id() == id).cloned())
    }

    async fn list_profiles(&self, session: &Session) -> Result<Vec<Profile>, Report<StoreError>> {
        let mut state = self.lock();
        state.calls.list_profiles += 1;
        if let Some(error) = state.profile_failure.clone() {
            return Err(error.into());
        }
        if state.user_for(session.access_token()).is_none() {
            return Err(StoreError::Unauthorized.into());
        }
        let mut profiles = state.profiles.clone();
        profiles.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(profiles)
    }
}
