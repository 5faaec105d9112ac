//! A popup session: the ledger plus the collaborators it talks to.
//!
//! The session is created once when the popup opens and passed to whatever renders it. Every
//! failure coming from a collaborator is logged and turned into local state, an error line or a
//! failed report list, so the session stays usable afterwards.

pub mod tab;

use tab::Tab;
use tracing::{error, info, instrument, warn};

use crate::{
    backend::Backend,
    error::PopupError,
    ledger::{
        entities::{Credentials, LoginResponse, Mutation, User},
        UsageLedger,
    },
    storage::{settings::SettingsStore, time_source::TimeSource},
};

pub struct PopupSession<S: SettingsStore, T: TimeSource, B: Backend> {
    ledger: UsageLedger<S>,
    source: T,
    backend: B,
    user: Option<User>,
    active_tab: Tab,
    error: Option<String>,
}

impl<S: SettingsStore, T: TimeSource, B: Backend> PopupSession<S, T, B> {
    /// Loads today's usage, the settings and the login, in that order. A step that fails leaves
    /// its defaults in place.
    pub async fn open(store: S, source: T, backend: B) -> Self {
        let mut session = Self {
            ledger: UsageLedger::new(store),
            source,
            backend,
            user: None,
            active_tab: Tab::default(),
            error: None,
        };
        session.load_data().await;
        session.load_settings().await;
        session.check_auth().await;
        session
    }

    async fn load_data(&mut self) {
        match self.source.get_time_data().await {
            Ok(usage) => self.ledger.replace_usage(usage),
            Err(e) => error!("Failed to load data: {e:?}"),
        }
    }

    async fn load_settings(&mut self) {
        match self.ledger.store().load().await {
            Ok(settings) => self.ledger.apply_settings(&settings),
            Err(e) => error!("Failed to load settings: {e:?}"),
        }
    }

    async fn check_auth(&mut self) {
        match self.ledger.store().load().await {
            Ok(settings) => self.user = settings.user,
            Err(e) => error!("Failed to check auth: {e:?}"),
        }
    }

    pub fn ledger(&self) -> &UsageLedger<S> {
        &self.ledger
    }

    pub fn time_source(&self) -> &T {
        &self.source
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    /// Last failure worth showing to the user.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn surface<R>(&mut self, result: Result<R, PopupError>) -> Result<R, PopupError> {
        if let Err(e) = &result {
            warn!("Surfacing error: {e}");
            self.error = Some(e.to_string());
        }
        result
    }

    #[instrument(skip(self, password))]
    pub async fn login(&mut self, email: &str, password: &str) -> Result<&User, PopupError> {
        let credentials = Credentials {
            email: email.to_owned(),
            password: password.to_owned(),
        };
        let result = match self.backend.login(credentials).await {
            Ok(LoginResponse::Accepted { token, user }) => self
                .ledger
                .store()
                .set_auth(token, user.clone())
                .await
                .map(|_| user)
                .map_err(PopupError::Storage),
            Ok(LoginResponse::Rejected { message }) => Err(PopupError::AuthFailure(
                message.unwrap_or_else(|| "Unknown error".into()),
            )),
            Err(e) => Err(e),
        };
        let user = self.surface(result)?;
        info!("Logged in as {}", user.display_name());
        self.error = None;
        let user: &User = self.user.insert(user);
        Ok(user)
    }

    pub async fn logout(&mut self) -> Result<(), PopupError> {
        let result = self
            .ledger
            .store()
            .clear_auth()
            .await
            .map_err(PopupError::Storage);
        self.surface(result)?;
        self.user = None;
        info!("Logged out");
        Ok(())
    }

    /// Switching to [Tab::Reports] fetches the reports again.
    pub async fn switch_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
        if tab == Tab::Reports {
            self.load_reports().await.ok();
        }
    }

    /// Fetches the weekly reports. The result goes through the report cache ticket, so only the
    /// latest fetch lands.
    pub async fn load_reports(&mut self) -> Result<(), PopupError> {
        let ticket = self.ledger.reports_mut().begin_fetch();
        let result = match self.ledger.store().load().await {
            Ok(settings) => match settings.auth_token {
                Some(token) => self.backend.fetch_reports(token).await,
                None => Err(PopupError::NotLoggedIn),
            },
            Err(e) => Err(PopupError::Storage(e)),
        };
        self.ledger
            .reports_mut()
            .complete_fetch(ticket, result)
            .map(|_| ())
            .inspect_err(|e| error!("Failed to load reports: {e}"))
    }

    pub async fn add_blocked_site(&mut self, site: &str) -> Result<Mutation, PopupError> {
        let result = self.ledger.add_blocked_site(site).await;
        self.surface(result)
    }

    pub async fn remove_blocked_site(&mut self, site: &str) -> Result<Mutation, PopupError> {
        let result = self.ledger.remove_blocked_site(site).await;
        self.surface(result)
    }

    /// Toggles tracking and tells the tracker about it. The tracker is only told once the store
    /// accepted the new value. When the tracker refuses, the stored flag is toggled back so both
    /// keep agreeing.
    pub async fn toggle_tracking(&mut self) -> Result<bool, PopupError> {
        let result = self.ledger.toggle_tracking().await;
        let enabled = self.surface(result)?;
        if let Err(e) = self.source.set_tracking(enabled).await {
            warn!("Tracker didn't accept tracking change, reverting: {e:?}");
            if let Err(revert) = self.ledger.toggle_tracking().await {
                error!("Failed to revert tracking flag: {revert:?}");
            }
            return self.surface(Err(PopupError::Tracker(e)));
        }
        Ok(enabled)
    }
}
