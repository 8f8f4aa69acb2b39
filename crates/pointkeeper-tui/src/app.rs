//! Application state management for Pointkeeper.
//!
//! This module contains the core `App` struct that manages all application state,
//! including UI state, loaded data, session handling, and background load coordination.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use pointkeeper_core::forms::{error_message, EarnForm, RedeemForm};
use pointkeeper_core::history::{HistoryFilter, HistorySummary};
use pointkeeper_core::models::{
    ApiResponse, BalanceResponse, LoginCredentials, Transaction, ACTIVITIES, REWARDS,
};
use pointkeeper_core::scope::{RequestScope, Scoped};
use pointkeeper_core::{normalize_error, ApiClient, Config, NormalizedError, SessionEvent, SessionStore};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background load channel.
/// At most one load per view is in flight, so a handful of slots is plenty.
const CHANNEL_BUFFER_SIZE: usize = 8;

/// Maximum length for email input.
const MAX_EMAIL_LENGTH: usize = 80;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum digits in a points field.
const MAX_POINTS_DIGITS: usize = 7;

/// Maximum length for a form description.
const MAX_DESCRIPTION_LENGTH: usize = 200;

/// How long a success message stays up before returning to the dashboard.
const RETURN_TO_DASHBOARD_DELAY: Duration = Duration::from_secs(2);

/// Shown on the login form when the server rejects the credentials.
const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";

/// Number of rows to move on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Dashboard,
    Earn,
    Redeem,
    History,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Dashboard, Tab::Earn, Tab::Redeem, Tab::History];

    /// Get the display title for this tab.
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::Earn => "Earn Points",
            Tab::Redeem => "Redeem Points",
            Tab::History => "History",
        }
    }

    /// Get the next tab (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            Tab::Dashboard => Tab::Earn,
            Tab::Earn => Tab::Redeem,
            Tab::Redeem => Tab::History,
            Tab::History => Tab::Dashboard,
        }
    }

    /// Get the previous tab (wrapping around)
    pub fn prev(&self) -> Self {
        match self {
            Tab::Dashboard => Tab::History,
            Tab::Earn => Tab::Dashboard,
            Tab::Redeem => Tab::Earn,
            Tab::History => Tab::Redeem,
        }
    }
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    LoggingIn,
    ConfirmingQuit,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Email,
    Password,
    Button,
}

/// Focus within the earn and redeem tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormFocus {
    /// Activity or reward list
    List,
    Points,
    Description,
    Submit,
}

impl FormFocus {
    pub fn next(&self) -> Self {
        match self {
            FormFocus::List => FormFocus::Points,
            FormFocus::Points => FormFocus::Description,
            FormFocus::Description => FormFocus::Submit,
            FormFocus::Submit => FormFocus::List,
        }
    }

    pub fn is_text_field(&self) -> bool {
        matches!(self, FormFocus::Points | FormFocus::Description)
    }
}

/// Data that a view loads from the API
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Idle,
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn loaded(&self) -> Option<&T> {
        match self {
            LoadState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    fn from_result(result: Result<T, NormalizedError>) -> Self {
        match result {
            Ok(value) => LoadState::Loaded(value),
            Err(e) => LoadState::Failed(e.message().to_string()),
        }
    }
}

// ============================================================================
// Background Load Results
// ============================================================================

/// Results sent back from loads spawned in the current request scope.
enum ViewResult {
    Balance(Result<BalanceResponse, NormalizedError>),
    History(Result<Vec<Transaction>, NormalizedError>),
}

/// Outcome of an earn or redeem request, with the error already worded for
/// the form.
enum Submission {
    Earned { points: i64, result: Result<ApiResponse, String> },
    Redeemed { points: i64, result: Result<ApiResponse, String> },
}

// ============================================================================
// Main Application Struct
// ============================================================================

/// Main application state container
pub struct App {
    // Core services
    pub config: Config,
    pub session: Arc<SessionStore>,
    pub api: ApiClient,
    session_events: broadcast::Receiver<SessionEvent>,

    // UI State
    pub state: AppState,
    pub current_tab: Tab,

    // Login form state
    pub login_email: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,

    // Loaded data
    pub balance: LoadState<BalanceResponse>,
    pub history: LoadState<Vec<Transaction>>,
    pub history_filter: HistoryFilter,
    pub history_selection: usize,

    // Earn tab
    pub earn_form: EarnForm,
    pub earn_focus: FormFocus,
    pub activity_selection: usize,

    // Redeem tab
    pub redeem_form: RedeemForm,
    pub redeem_focus: FormFocus,
    pub reward_selection: usize,

    // Form feedback, shared by earn and redeem
    pub form_error: Option<String>,
    pub form_success: Option<String>,
    pub submitting: bool,
    return_to_dashboard_at: Option<Instant>,

    // Loads tied to the current view
    scope: RequestScope,
    results_tx: mpsc::Sender<Scoped<ViewResult>>,
    results_rx: mpsc::Receiver<Scoped<ViewResult>>,

    // Earn/redeem requests outlive tab switches but not the session
    submissions: RequestScope,
    submit_tx: mpsc::Sender<Scoped<Submission>>,
    submit_rx: mpsc::Receiver<Scoped<Submission>>,

    // Status message
    pub status_message: Option<String>,
}

impl App {
    /// Create a new application instance, restoring any persisted session
    pub fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };

        let storage = config.open_storage()?;
        let session = SessionStore::open(storage);
        debug!(authenticated = session.is_authenticated(), "Session restored");

        let base_url = config.api_base_url();
        debug!(%base_url, "API base URL configured");
        let api = ApiClient::new(&base_url, Arc::clone(&session))?;

        Ok(Self::with_services(config, session, api))
    }

    /// Build the app around an already-opened session and client
    fn with_services(config: Config, session: Arc<SessionStore>, api: ApiClient) -> Self {
        let session_events = session.subscribe();
        let (results_tx, results_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let (submit_tx, submit_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        // Prefill credentials from env vars or config
        let login_email = std::env::var("POINTKEEPER_EMAIL")
            .ok()
            .or_else(|| config.last_email.clone())
            .unwrap_or_default();

        let login_password = std::env::var("POINTKEEPER_PASSWORD").unwrap_or_default();

        Self {
            config,
            session,
            api,
            session_events,

            state: AppState::Normal,
            current_tab: Tab::Dashboard,

            login_email,
            login_password,
            login_focus: LoginFocus::Email,
            login_error: None,

            balance: LoadState::Idle,
            history: LoadState::Idle,
            history_filter: HistoryFilter::All,
            history_selection: 0,

            earn_form: EarnForm::default(),
            earn_focus: FormFocus::List,
            activity_selection: 0,

            redeem_form: RedeemForm::default(),
            redeem_focus: FormFocus::List,
            reward_selection: 0,

            form_error: None,
            form_success: None,
            submitting: false,
            return_to_dashboard_at: None,

            scope: RequestScope::new(),
            results_tx,
            results_rx,

            submissions: RequestScope::new(),
            submit_tx,
            submit_rx,

            status_message: None,
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Start the login process (show login overlay)
    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.login_focus = if self.login_email.is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };
        self.login_error = None;
    }

    /// Attempt login with the credentials from the login form
    pub async fn attempt_login(&mut self) -> Result<()> {
        let email = self.login_email.trim().to_string();
        let password = self.login_password.clone();

        if email.is_empty() || password.is_empty() {
            self.login_error = Some("Email and password required".to_string());
            return Err(anyhow::anyhow!("Email and password required"));
        }

        self.login_error = None;
        let credentials = LoginCredentials { email, password };

        match self.api.login(&credentials).await {
            Ok(response) => {
                self.session
                    .login(response.user.into_identity(), response.token)?;

                self.config.last_email = Some(credentials.email);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }

                self.login_password.clear();
                self.state = AppState::Normal;
                info!("Login successful");

                self.current_tab = Tab::Dashboard;
                self.load_current_tab();
                Ok(())
            }
            Err(e) => {
                self.login_error = Some(match normalize_error(&e) {
                    NormalizedError::Unauthorized => INVALID_CREDENTIALS_MESSAGE.to_string(),
                    other => other.message().to_string(),
                });
                Err(e)
            }
        }
    }

    /// Sign out and return to the login screen
    pub fn logout(&mut self) {
        self.scope.cancel();
        if let Err(e) = self.session.logout() {
            error!(error = %e, "Failed to clear stored session");
        }
        self.reset_views();
        self.start_login();
    }

    /// React to session changes made outside the UI (a 401 from any request)
    fn handle_session_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Expired => {
                if self.state == AppState::LoggingIn {
                    // Rejected login attempt; the form already shows why
                    return;
                }
                info!("Session expired, returning to login");
                self.scope.cancel();
                self.reset_views();
                self.start_login();
                self.login_error = Some(NormalizedError::Unauthorized.message().to_string());
            }
            SessionEvent::LoggedIn | SessionEvent::LoggedOut => {}
        }
    }

    fn reset_views(&mut self) {
        self.balance = LoadState::Idle;
        self.history = LoadState::Idle;
        self.history_selection = 0;
        self.earn_form.clear();
        self.redeem_form.clear();
        self.clear_form_feedback();
        self.submissions.cancel();
        self.submitting = false;
        self.return_to_dashboard_at = None;
        self.current_tab = Tab::Dashboard;
    }

    // =========================================================================
    // Navigation and loading
    // =========================================================================

    /// Switch tabs, cancelling anything the old view still has in flight
    pub fn switch_tab(&mut self, tab: Tab) {
        if tab == self.current_tab {
            return;
        }
        self.scope.cancel();
        self.current_tab = tab;
        self.clear_form_feedback();
        self.return_to_dashboard_at = None;
        self.load_current_tab();
    }

    /// (Re)load whatever the current tab displays
    pub fn load_current_tab(&mut self) {
        match self.current_tab {
            Tab::Dashboard | Tab::Redeem => self.load_balance(),
            Tab::History => self.load_history(),
            Tab::Earn => {}
        }
    }

    fn load_balance(&mut self) {
        if self.balance.is_loading() && self.scope.in_flight() > 0 {
            return;
        }
        self.balance = LoadState::Loading;
        let api = self.api.clone();
        self.scope.spawn(self.results_tx.clone(), async move {
            ViewResult::Balance(api.get_balance().await.map_err(|e| normalize_error(&e)))
        });
    }

    fn load_history(&mut self) {
        if self.history.is_loading() && self.scope.in_flight() > 0 {
            return;
        }
        self.history = LoadState::Loading;
        let api = self.api.clone();
        self.scope.spawn(self.results_tx.clone(), async move {
            ViewResult::History(
                api.get_history()
                    .await
                    .map(|h| h.transactions)
                    .map_err(|e| normalize_error(&e)),
            )
        });
    }

    /// Drain session events and finished loads; called once per frame
    pub fn check_background_tasks(&mut self) {
        loop {
            match self.session_events.try_recv() {
                Ok(event) => self.handle_session_event(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Missed session events");
                    if !self.session.is_authenticated() {
                        self.handle_session_event(SessionEvent::Expired);
                    }
                }
                Err(_) => break,
            }
        }

        while let Ok(result) = self.results_rx.try_recv() {
            if !self.scope.is_current(result.generation) {
                debug!(generation = result.generation, "Discarding result from a cancelled view");
                continue;
            }
            self.process_view_result(result.value);
        }

        while let Ok(submission) = self.submit_rx.try_recv() {
            if !self.submissions.is_current(submission.generation) {
                debug!(generation = submission.generation, "Discarding submission from an ended session");
                continue;
            }
            self.process_submission(submission.value);
        }

        if let Some(at) = self.return_to_dashboard_at {
            if Instant::now() >= at {
                self.return_to_dashboard_at = None;
                self.switch_tab(Tab::Dashboard);
            }
        }
    }

    fn process_view_result(&mut self, result: ViewResult) {
        match result {
            ViewResult::Balance(result) => {
                if let Err(ref e) = result {
                    debug!(error = %e, "Balance load failed");
                }
                self.balance = LoadState::from_result(result);
            }
            ViewResult::History(result) => {
                self.history = LoadState::from_result(result);
                self.history_selection = 0;
            }
        }
    }

    // =========================================================================
    // Earn / Redeem
    // =========================================================================

    fn clear_form_feedback(&mut self) {
        self.form_error = None;
        self.form_success = None;
    }

    /// Last balance the server reported, or zero if none is loaded
    pub fn known_balance(&self) -> i64 {
        self.balance.loaded().map(|b| b.balance).unwrap_or(0)
    }

    pub fn select_activity(&mut self) {
        if let Some(activity) = ACTIVITIES.get(self.activity_selection) {
            self.earn_form = EarnForm::from_activity(activity);
            self.earn_focus = FormFocus::Submit;
            self.clear_form_feedback();
        }
    }

    pub fn select_reward(&mut self) {
        let balance = self.known_balance();
        if let Some(reward) = REWARDS.get(self.reward_selection) {
            self.clear_form_feedback();
            match reward.shortfall(balance) {
                Some(missing) => {
                    self.form_error = Some(format!("Need {} more points", missing));
                }
                None => {
                    self.redeem_form = RedeemForm::from_reward(reward);
                    self.redeem_focus = FormFocus::Submit;
                }
            }
        }
    }

    /// Validate the earn form and send it in the background. The outcome
    /// is applied by `check_background_tasks`.
    pub fn submit_earn(&mut self) {
        if self.submitting {
            return;
        }
        self.clear_form_feedback();

        let request = match self.earn_form.validate() {
            Ok(request) => request,
            Err(e) => {
                self.form_error = Some(e.to_string());
                return;
            }
        };

        self.submitting = true;
        let api = self.api.clone();
        self.submissions.spawn(self.submit_tx.clone(), async move {
            Submission::Earned {
                points: request.points,
                result: api.earn_points(&request).await.map_err(|e| error_message(&e)),
            }
        });
    }

    /// Validate the redeem form against the known balance and send it in the
    /// background.
    pub fn submit_redeem(&mut self) {
        if self.submitting {
            return;
        }
        self.clear_form_feedback();

        let request = match self.redeem_form.validate(self.known_balance()) {
            Ok(request) => request,
            Err(e) => {
                self.form_error = Some(e.to_string());
                return;
            }
        };

        self.submitting = true;
        let api = self.api.clone();
        self.submissions.spawn(self.submit_tx.clone(), async move {
            Submission::Redeemed {
                points: request.points,
                result: api.redeem_points(&request).await.map_err(|e| error_message(&e)),
            }
        });
    }

    fn process_submission(&mut self, submission: Submission) {
        self.submitting = false;

        match submission {
            Submission::Earned { points, result: Ok(response) } => {
                info!(points, message = %response.message, "Points earned");
                self.form_success = Some(EarnForm::success_message(points));
                self.earn_form.clear();
                self.earn_focus = FormFocus::List;
            }
            Submission::Redeemed { points, result: Ok(response) } => {
                info!(points, message = %response.message, "Points redeemed");
                self.form_success = Some(RedeemForm::success_message(points));
                self.redeem_form.clear();
                self.redeem_focus = FormFocus::List;
                self.load_balance();
            }
            Submission::Earned { result: Err(message), .. }
            | Submission::Redeemed { result: Err(message), .. } => {
                self.form_error = Some(message);
                return;
            }
        }

        self.return_to_dashboard_at = Some(Instant::now() + RETURN_TO_DASHBOARD_DELAY);
    }

    /// Whether keystrokes should go into a text field rather than shortcuts
    pub fn is_editing_text(&self) -> bool {
        match self.current_tab {
            Tab::Earn => self.earn_focus.is_text_field(),
            Tab::Redeem => self.redeem_focus.is_text_field(),
            Tab::Dashboard | Tab::History => false,
        }
    }

    /// Type a character into the focused form field
    pub fn push_form_char(&mut self, c: char) {
        let (focus, points, description) = match self.current_tab {
            Tab::Earn => (
                self.earn_focus,
                &mut self.earn_form.points_input,
                &mut self.earn_form.description,
            ),
            Tab::Redeem => (
                self.redeem_focus,
                &mut self.redeem_form.points_input,
                &mut self.redeem_form.description,
            ),
            Tab::Dashboard | Tab::History => return,
        };
        match focus {
            FormFocus::Points if can_add_points_char(points.len(), c) => points.push(c),
            FormFocus::Description if can_add_description_char(description.chars().count(), c) => {
                description.push(c)
            }
            _ => {}
        }
    }

    /// Delete the last character of the focused form field
    pub fn pop_form_char(&mut self) {
        match (self.current_tab, self.earn_focus, self.redeem_focus) {
            (Tab::Earn, FormFocus::Points, _) => {
                self.earn_form.points_input.pop();
            }
            (Tab::Earn, FormFocus::Description, _) => {
                self.earn_form.description.pop();
            }
            (Tab::Redeem, _, FormFocus::Points) => {
                self.redeem_form.points_input.pop();
            }
            (Tab::Redeem, _, FormFocus::Description) => {
                self.redeem_form.description.pop();
            }
            _ => {}
        }
    }

    // =========================================================================
    // History
    // =========================================================================

    pub fn history_summary(&self) -> HistorySummary {
        self.history
            .loaded()
            .map(|t| HistorySummary::from_transactions(t))
            .unwrap_or_default()
    }

    pub fn filtered_history(&self) -> Vec<&Transaction> {
        self.history
            .loaded()
            .map(|t| self.history_filter.apply(t))
            .unwrap_or_default()
    }

    pub fn cycle_history_filter(&mut self) {
        self.history_filter = self.history_filter.next();
        self.history_selection = 0;
    }

    pub fn user_display_name(&self) -> String {
        self.session
            .current_user()
            .map(|u| u.display_name())
            .unwrap_or_default()
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if an email character should be accepted
pub fn can_add_email_char(current_len: usize, c: char) -> bool {
    current_len < MAX_EMAIL_LENGTH && is_valid_input_char(c) && !c.is_whitespace()
}

/// Check if a password character should be accepted
pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

/// Points fields take digits only
pub fn can_add_points_char(current_len: usize, c: char) -> bool {
    current_len < MAX_POINTS_DIGITS && c.is_ascii_digit()
}

pub fn can_add_description_char(current_len: usize, c: char) -> bool {
    current_len < MAX_DESCRIPTION_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pointkeeper_core::auth::MemoryStore;
    use pointkeeper_core::models::Identity;

    // -------------------------------------------------------------------------
    // Tab Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_tab_next() {
        assert_eq!(Tab::Dashboard.next(), Tab::Earn);
        assert_eq!(Tab::Earn.next(), Tab::Redeem);
        assert_eq!(Tab::Redeem.next(), Tab::History);
        assert_eq!(Tab::History.next(), Tab::Dashboard); // Wraps around
    }

    #[test]
    fn test_tab_prev() {
        assert_eq!(Tab::Dashboard.prev(), Tab::History); // Wraps around
        assert_eq!(Tab::History.prev(), Tab::Redeem);
        assert_eq!(Tab::Redeem.prev(), Tab::Earn);
        assert_eq!(Tab::Earn.prev(), Tab::Dashboard);
    }

    #[test]
    fn test_form_focus_cycle() {
        assert_eq!(FormFocus::List.next(), FormFocus::Points);
        assert_eq!(FormFocus::Submit.next(), FormFocus::List);
        assert!(FormFocus::Points.is_text_field());
        assert!(FormFocus::Description.is_text_field());
        assert!(!FormFocus::Submit.is_text_field());
    }

    #[test]
    fn test_load_state_from_result() {
        let ok: LoadState<i64> = LoadState::from_result(Ok(5));
        assert_eq!(ok.loaded(), Some(&5));

        let failed: LoadState<i64> = LoadState::from_result(Err(NormalizedError::Network));
        assert_eq!(
            failed,
            LoadState::Failed("Network error. Please check your connection.".to_string())
        );
    }

    // -------------------------------------------------------------------------
    // Input Validation Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_can_add_email_char() {
        assert!(can_add_email_char(0, 'a'));
        assert!(can_add_email_char(79, '@'));
        assert!(!can_add_email_char(80, 'a'));
        assert!(!can_add_email_char(0, ' '));
        assert!(!can_add_email_char(0, '\n'));
    }

    #[test]
    fn test_can_add_password_char() {
        assert!(can_add_password_char(0, 'a'));
        assert!(can_add_password_char(127, '!'));
        assert!(!can_add_password_char(128, 'a'));
        assert!(!can_add_password_char(0, '\x00'));
        assert!(!can_add_password_char(0, '\r'));
    }

    #[test]
    fn test_can_add_points_char() {
        assert!(can_add_points_char(0, '5'));
        assert!(!can_add_points_char(0, 'a'));
        assert!(!can_add_points_char(0, '-'));
        assert!(!can_add_points_char(7, '1'));
    }

    // -------------------------------------------------------------------------
    // Session and navigation tests
    // -------------------------------------------------------------------------

    fn test_app() -> App {
        let session = SessionStore::open(Arc::new(MemoryStore::new()));
        // Nothing listens here; loads fail fast as network errors
        let api = ApiClient::new("http://127.0.0.1:9/api", Arc::clone(&session))
            .expect("build client");
        App::with_services(Config::default(), session, api)
    }

    fn log_in(app: &App) {
        let identity = Identity {
            id: "u1".to_string(),
            first_name: "Ada".to_string(),
            last_name: None,
            email: "ada@example.com".to_string(),
        };
        app.session
            .login(identity, "t1".to_string())
            .expect("login");
    }

    #[tokio::test]
    async fn test_expired_session_returns_to_login() {
        let mut app = test_app();
        log_in(&app);
        app.current_tab = Tab::History;
        app.history = LoadState::Loaded(Vec::new());

        let epoch = app.session.request_credentials().epoch;
        assert!(app.session.expire(epoch));
        app.check_background_tasks();

        assert_eq!(app.state, AppState::LoggingIn);
        assert_eq!(app.current_tab, Tab::Dashboard);
        assert_eq!(app.history, LoadState::Idle);
        assert_eq!(
            app.login_error.as_deref(),
            Some("Your session has expired. Please log in again.")
        );
    }

    #[tokio::test]
    async fn test_expired_during_login_keeps_login_error() {
        let mut app = test_app();
        app.start_login();
        app.login_error = Some(INVALID_CREDENTIALS_MESSAGE.to_string());

        // A rejected login attempt also evicts the (empty) session
        let epoch = app.session.request_credentials().epoch;
        assert!(app.session.expire(epoch));
        app.check_background_tasks();

        assert_eq!(app.state, AppState::LoggingIn);
        assert_eq!(app.login_error.as_deref(), Some(INVALID_CREDENTIALS_MESSAGE));
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let mut app = test_app();
        log_in(&app);
        assert!(app.is_authenticated());

        app.logout();

        assert!(!app.is_authenticated());
        assert_eq!(app.state, AppState::LoggingIn);
        assert_eq!(app.login_error, None);
    }

    #[tokio::test]
    async fn test_success_returns_to_dashboard() {
        let mut app = test_app();
        log_in(&app);
        app.current_tab = Tab::Earn;
        app.form_success = Some(EarnForm::success_message(10));
        app.return_to_dashboard_at = Some(Instant::now());

        app.check_background_tasks();

        assert_eq!(app.current_tab, Tab::Dashboard);
        assert_eq!(app.form_success, None);
        assert!(app.balance.is_loading());
    }

    #[tokio::test]
    async fn test_switch_tab_discards_stale_results() {
        let mut app = test_app();
        log_in(&app);

        app.switch_tab(Tab::History);
        assert!(app.history.is_loading());
        let stale = app.scope.generation();

        app.switch_tab(Tab::Earn);
        assert!(!app.scope.is_current(stale));

        // Results tagged with the old generation are dropped on arrival
        app.results_tx
            .send(Scoped {
                generation: stale,
                value: ViewResult::History(Ok(Vec::new())),
            })
            .await
            .expect("send");
        app.check_background_tasks();
        assert!(app.history.is_loading());
    }

    /// Drive the frame loop until the in-flight submission has been applied.
    async fn wait_for_submission(app: &mut App) {
        tokio::time::timeout(Duration::from_secs(10), async {
            while app.submitting {
                app.check_background_tasks();
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("submission finishes");
    }

    #[tokio::test]
    async fn test_invalid_earn_is_rejected_without_request() {
        let mut app = test_app();
        log_in(&app);
        app.current_tab = Tab::Earn;
        app.earn_form.points_input = "0".to_string();

        app.submit_earn();

        assert!(!app.submitting);
        assert_eq!(app.submissions.in_flight(), 0);
        assert_eq!(app.form_error.as_deref(), Some("Please enter at least 1 point"));
    }

    #[tokio::test]
    async fn test_submit_runs_in_background() {
        let mut app = test_app();
        log_in(&app);
        app.current_tab = Tab::Earn;
        app.select_activity();

        app.submit_earn();
        assert!(app.submitting);
        assert_eq!(app.form_error, None);

        // A second press while in flight starts nothing new
        app.submit_earn();
        assert!(app.submissions.in_flight() <= 1);

        wait_for_submission(&mut app).await;

        assert_eq!(
            app.form_error.as_deref(),
            Some("Network error. Please check your connection.")
        );
        assert_eq!(app.form_success, None);
        assert_eq!(app.earn_focus, FormFocus::Submit);
    }

    #[tokio::test]
    async fn test_submission_outcome_after_logout_is_dropped() {
        let mut app = test_app();
        log_in(&app);
        app.current_tab = Tab::Earn;
        app.select_activity();

        app.submit_earn();
        let stale = app.submissions.generation();

        app.logout();
        assert!(!app.submitting);

        app.submit_tx
            .send(Scoped {
                generation: stale,
                value: Submission::Earned {
                    points: 10,
                    result: Ok(ApiResponse::accepted()),
                },
            })
            .await
            .expect("send");
        app.check_background_tasks();

        assert_eq!(app.form_success, None);
        assert_eq!(app.return_to_dashboard_at, None);
    }

    #[tokio::test]
    async fn test_redeem_success_reloads_balance() {
        let mut app = test_app();
        log_in(&app);
        app.current_tab = Tab::Redeem;
        app.submitting = true;

        app.submit_tx
            .send(Scoped {
                generation: app.submissions.generation(),
                value: Submission::Redeemed {
                    points: 100,
                    result: Ok(ApiResponse::accepted()),
                },
            })
            .await
            .expect("send");
        app.check_background_tasks();

        assert!(!app.submitting);
        assert_eq!(
            app.form_success.as_deref(),
            Some("Successfully redeemed 100 points!")
        );
        assert!(app.balance.is_loading());
        assert!(app.return_to_dashboard_at.is_some());
    }

    #[test]
    fn test_select_unaffordable_reward() {
        let mut app = test_app();
        app.balance = LoadState::Loaded(BalanceResponse {
            balance: 300,
            ..Default::default()
        });

        // $5 Gift Card costs 500
        app.reward_selection = 0;
        app.select_reward();
        assert_eq!(app.form_error.as_deref(), Some("Need 200 more points"));
        assert_eq!(app.redeem_focus, FormFocus::List);

        // Free Coffee costs 100
        app.reward_selection = 3;
        app.select_reward();
        assert_eq!(app.form_error, None);
        assert_eq!(app.redeem_form.points(), 100);
        assert_eq!(app.redeem_focus, FormFocus::Submit);
    }

    #[test]
    fn test_form_typing() {
        let mut app = test_app();
        app.current_tab = Tab::Earn;
        app.earn_focus = FormFocus::Points;
        assert!(app.is_editing_text());

        for c in "4x2".chars() {
            app.push_form_char(c);
        }
        assert_eq!(app.earn_form.points_input, "42");

        app.pop_form_char();
        assert_eq!(app.earn_form.points_input, "4");

        app.earn_focus = FormFocus::Description;
        app.push_form_char('W');
        assert_eq!(app.earn_form.description, "W");
    }

    #[test]
    fn test_can_add_description_char() {
        assert!(can_add_description_char(0, ' '));
        assert!(can_add_description_char(199, 'x'));
        assert!(!can_add_description_char(200, 'x'));
        assert!(!can_add_description_char(0, '\t'));
    }
}
