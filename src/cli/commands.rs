//! Screens of the terminal front-end
//!
//! Each subcommand behaves like one page of the client: it resolves the
//! session, passes the route guard, then drives the stores.

use super::output::Output;
use super::{AdminCommands, Commands};
use crate::api::HttpApiClient;
use crate::forms::{
    CreateGroupField, CreateGroupForm, FormModel, FormState, LoginField, LoginForm, ProfileField,
    ProfileForm, RegisterField, RegisterForm, SubmitOutcome,
};
use crate::router::{GuardDecision, Route};
use crate::store::ChatState;
use crate::types::{AppError, Result};
use crate::upload::select_uploader;
use crate::utils::credentials::CredentialStore;
use crate::utils::toml_config::{ConfigManager, LimitsConfig};
use crate::AppState;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Turn the error recorded on the chat store into a `Result`
fn chat_result(state: &ChatState) -> Result<()> {
    match &state.error {
        Some(message) => Err(AppError::Failed(message.clone())),
        None => Ok(()),
    }
}

pub struct Runner {
    app: AppState,
    http: Arc<HttpApiClient>,
    credentials: CredentialStore,
    output: Output,
}

impl Runner {
    /// Wire the HTTP client, uploader and stores from configuration. A token
    /// saved by a previous run is attached to the client.
    pub fn build(config: Arc<ConfigManager>, output: Output) -> Result<Self> {
        let cfg = config.config();
        let credentials = CredentialStore::new(&cfg.session.credentials_file);
        let token = credentials.load(&cfg.api.base_url)?;

        let http = Arc::new(
            HttpApiClient::with_timeout(
                &cfg.api.base_url,
                Duration::from_secs(cfg.api.timeout_secs),
            )?
            .with_token(token),
        );
        let uploader = select_uploader(
            cfg.cloud_name(),
            cfg.upload_preset(),
            cfg.limits.max_upload_bytes(),
        );

        let app = AppState::new(config, http.clone(), uploader);
        Ok(Self {
            app,
            http,
            credentials,
            output,
        })
    }

    pub fn app(&self) -> &AppState {
        &self.app
    }

    pub async fn run(&self, command: Commands) -> Result<()> {
        let had_token = self.http.token().is_some();
        match self.app.start().await {
            Some(err) if had_token && err.is_unauthorized() => {
                debug!("Stored token was rejected; forgetting it");
                self.http.set_token(None);
                self.credentials.clear()?;
            }
            Some(err) if had_token => {
                warn!("Could not verify the saved session: {}", err);
            }
            _ => {}
        }

        match command {
            Commands::Init { .. } => Err(AppError::InvalidInput(
                "init runs without a session".to_string(),
            )),
            Commands::Login {
                identifier,
                password,
            } => self.login(identifier, password).await,
            Commands::Register {
                name,
                username,
                email,
                password,
            } => self.register(name, username, email, password).await,
            Commands::Logout => self.logout().await,
            Commands::Whoami => {
                self.whoami();
                Ok(())
            }
            Commands::Profile {
                name,
                avatar,
                avatar_file,
            } => self.profile(name, avatar, avatar_file.as_deref()).await,
            Commands::Chats => self.chats().await,
            Commands::Open { chat_id } => self.open_chat(&chat_id).await,
            Commands::Messages { chat_id } => self.messages(&chat_id).await,
            Commands::Send { chat_id, content } => self.send(&chat_id, &content).await,
            Commands::NewPrivate { participant_id } => self.new_private(&participant_id).await,
            Commands::NewGroup {
                name,
                members,
                description,
            } => self.new_group(name, members, description).await,
            Commands::Delete { chat_id, yes } => self.delete(&chat_id, yes).await,
            Commands::Search { query } => self.search(&query).await,
            Commands::Admin(AdminCommands::Show) => self.admin_overview(),
            Commands::Admin(AdminCommands::Config {
                max_upload_mb,
                max_group_members,
            }) => self.admin_config(max_upload_mb, max_group_members),
            Commands::Route { path } => {
                self.route(&path);
                Ok(())
            }
        }
    }

    // ============= Guard =============

    /// Enter a guarded screen
    fn enter(&self, path: &str) -> Result<()> {
        match self.app.open(path) {
            GuardDecision::Render(_) => Ok(()),
            GuardDecision::Redirect(Route::Login) => Err(AppError::Auth(
                "Not signed in. Run `parlor login` first".to_string(),
            )),
            GuardDecision::Redirect(target) => Err(AppError::Auth(format!(
                "You do not have access to {} (redirected to {})",
                path, target
            ))),
            GuardDecision::Loading => Err(AppError::Internal(
                "Session check did not finish".to_string(),
            )),
        }
    }

    /// Guest-only screens: report the existing session instead of failing
    fn enter_guest(&self, path: &str) -> bool {
        match self.app.open(path) {
            GuardDecision::Render(_) => true,
            _ => {
                if let Some(user) = self.app.auth.snapshot().user() {
                    self.output
                        .warning(&format!("Already signed in as {}", user.username));
                    self.output.hint("Run `parlor logout` to switch accounts");
                }
                false
            }
        }
    }

    fn report_invalid<M: FormModel>(&self, form: &FormState<M>) -> AppError {
        for field in M::fields() {
            if let Some(message) = form.visible_error(*field) {
                self.output.error(&format!("{:?}: {}", field, message));
            }
        }
        AppError::InvalidInput("Please fix the errors above".to_string())
    }

    fn password_or_prompt(&self, password: Option<String>, label: &str) -> String {
        password
            .or_else(|| self.output.prompt(label))
            .unwrap_or_default()
    }

    fn remember_token(&self) -> Result<()> {
        match self.http.token() {
            Some(token) => self.credentials.save(self.http.base_url(), &token),
            None => {
                debug!("Server returned no token; session will not persist");
                Ok(())
            }
        }
    }

    // ============= Session screens =============

    async fn login(&self, identifier: String, password: Option<String>) -> Result<()> {
        if !self.enter_guest(Route::Login.path()) {
            return Ok(());
        }

        let mut form = FormState::new(LoginForm::default());
        form.handle_change(LoginField::Identifier, identifier);
        form.handle_change(
            LoginField::Password,
            self.password_or_prompt(password, "Password"),
        );

        let auth = Arc::clone(&self.app.auth);
        let outcome = form
            .handle_submit(|values| async move {
                auth.login(&values.identifier, &values.password).await
            })
            .await?;

        match outcome {
            SubmitOutcome::Invalid => Err(self.report_invalid(&form)),
            SubmitOutcome::Submitted(user) => {
                self.remember_token()?;
                self.app.open(Route::DEFAULT.path());
                self.output
                    .success(&format!("Signed in as {} ({})", user.name, user.username));
                Ok(())
            }
        }
    }

    async fn register(
        &self,
        name: String,
        username: String,
        email: String,
        password: Option<String>,
    ) -> Result<()> {
        if !self.enter_guest(Route::Register.path()) {
            return Ok(());
        }

        let (password, confirm) = match password {
            Some(password) => (password.clone(), password),
            None => (
                self.password_or_prompt(None, "Password"),
                self.password_or_prompt(None, "Confirm password"),
            ),
        };

        let mut form = FormState::new(RegisterForm::default());
        form.handle_change(RegisterField::Name, name);
        form.handle_change(RegisterField::Username, username);
        form.handle_change(RegisterField::Email, email);
        form.handle_change(RegisterField::Password, password);
        form.handle_change(RegisterField::ConfirmPassword, confirm);

        let auth = Arc::clone(&self.app.auth);
        let outcome = form
            .handle_submit(|values| async move {
                auth.register(&values.name, &values.username, &values.email, &values.password)
                    .await
            })
            .await?;

        match outcome {
            SubmitOutcome::Invalid => Err(self.report_invalid(&form)),
            SubmitOutcome::Submitted(user) => {
                self.remember_token()?;
                self.app.open(Route::DEFAULT.path());
                self.output
                    .success(&format!("Welcome, {}! Your account is ready", user.name));
                Ok(())
            }
        }
    }

    async fn logout(&self) -> Result<()> {
        let was_signed_in = self.app.auth.snapshot().is_authenticated();
        self.app.logout().await;
        self.credentials.clear()?;

        if was_signed_in {
            self.output.success("Signed out");
        } else {
            self.output.info("No active session");
        }
        Ok(())
    }

    fn whoami(&self) {
        match self.app.auth.snapshot().user() {
            Some(user) => {
                self.output.header("Signed in");
                self.output.user(user);
            }
            None => self.output.info("Not signed in"),
        }
    }

    async fn profile(
        &self,
        name: Option<String>,
        avatar: Option<String>,
        avatar_file: Option<&Path>,
    ) -> Result<()> {
        self.enter(Route::Profile.path())?;

        if let Some(path) = avatar_file {
            let bytes = std::fs::read(path).map_err(|e| {
                AppError::InvalidInput(format!("Cannot read {}: {}", path.display(), e))
            })?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "avatar".to_string());

            let user = self.app.auth.update_avatar(bytes, &file_name).await?;
            self.output.success("Avatar updated");
            self.output.user(&user);
            if name.is_none() {
                return Ok(());
            }
        }

        if name.is_none() && avatar.is_none() {
            if let Some(user) = self.app.auth.snapshot().user() {
                self.output.header("Profile");
                self.output.user(user);
            }
            return Ok(());
        }

        let mut form = FormState::new(ProfileForm::default());
        form.handle_change(ProfileField::Name, name.unwrap_or_default());
        form.handle_change(ProfileField::Avatar, avatar.unwrap_or_default());

        let auth = Arc::clone(&self.app.auth);
        let outcome = form
            .handle_submit(|values| async move { auth.update_profile(values.to_update()).await })
            .await?;

        match outcome {
            SubmitOutcome::Invalid => Err(self.report_invalid(&form)),
            SubmitOutcome::Submitted(user) => {
                self.output.success("Profile updated");
                self.output.user(&user);
                Ok(())
            }
        }
    }

    // ============= Chat screens =============

    async fn chats(&self) -> Result<()> {
        self.enter(Route::Chat.path())?;

        self.app.chat.load_chats().await;
        let state = self.app.chat.snapshot();
        chat_result(&state)?;

        self.output.header("Conversations");
        let selected = state.current_chat.as_ref().map(|c| c.id());
        self.output.chat_list(&state.chats, selected);
        Ok(())
    }

    /// Load the list and select `chat_id`
    async fn select(&self, chat_id: &str) -> Result<()> {
        self.app.chat.load_chats().await;
        chat_result(&self.app.chat.snapshot())?;

        if !self.app.open_chat(chat_id).await {
            return Err(AppError::NotFound(format!("Chat {}", chat_id)));
        }
        chat_result(&self.app.chat.snapshot())
    }

    fn own_id(&self) -> Option<String> {
        self.app.auth.snapshot().user().map(|u| u.id.clone())
    }

    async fn open_chat(&self, chat_id: &str) -> Result<()> {
        self.enter(Route::Chat.path())?;
        self.select(chat_id).await?;

        let state = self.app.chat.snapshot();
        if let Some(chat) = &state.current_chat {
            self.output.header(chat.display_name());
            if let crate::types::Chat::Group(group) = chat {
                if let Some(description) = &group.description {
                    self.output.info(description);
                }
                self.output
                    .kv("Members", &group.members.len().to_string());
            }
        }
        let own = self.own_id();
        self.output
            .messages(state.messages_for(chat_id).unwrap_or_default(), own.as_deref());
        Ok(())
    }

    async fn messages(&self, chat_id: &str) -> Result<()> {
        self.enter(Route::Chat.path())?;

        self.app.chat.load_messages(chat_id).await;
        let state = self.app.chat.snapshot();
        chat_result(&state)?;

        let own = self.own_id();
        self.output
            .messages(state.messages_for(chat_id).unwrap_or_default(), own.as_deref());
        Ok(())
    }

    async fn send(&self, chat_id: &str, content: &str) -> Result<()> {
        self.enter(Route::Chat.path())?;
        self.select(chat_id).await?;

        self.app.chat.send_message(content).await;
        let state = self.app.chat.snapshot();
        chat_result(&state)?;

        let own = self.own_id();
        if let Some(sent) = state.messages_for(chat_id).and_then(|m| m.last()) {
            self.output.success("Message sent");
            self.output
                .messages(std::slice::from_ref(sent), own.as_deref());
        }
        Ok(())
    }

    async fn new_private(&self, participant_id: &str) -> Result<()> {
        self.enter(Route::Chat.path())?;

        self.app.chat.create_private_chat(participant_id).await;
        let state = self.app.chat.snapshot();
        chat_result(&state)?;

        if let Some(chat) = state.chats.last() {
            self.output.success(&format!(
                "Conversation with {} created ({})",
                chat.display_name(),
                chat.id()
            ));
        }
        Ok(())
    }

    async fn new_group(
        &self,
        name: String,
        members: Vec<String>,
        description: Option<String>,
    ) -> Result<()> {
        self.enter(Route::Chat.path())?;

        let max_members = self.app.chat.options().max_group_members;
        let mut form = FormState::new(CreateGroupForm::with_max_members(max_members));
        form.handle_change(CreateGroupField::Name, name);
        form.handle_change(CreateGroupField::Description, description.unwrap_or_default());
        form.handle_change(CreateGroupField::MemberIds, members.join(","));

        let chat = Arc::clone(&self.app.chat);
        let outcome = form
            .handle_submit(|values| async move {
                let description = values.description();
                chat.create_group_chat(values.name.trim(), values.member_ids, description)
                    .await;
                chat_result(&chat.snapshot())
            })
            .await?;

        match outcome {
            SubmitOutcome::Invalid => Err(self.report_invalid(&form)),
            SubmitOutcome::Submitted(()) => {
                if let Some(chat) = self.app.chat.snapshot().chats.last() {
                    self.output.success(&format!(
                        "Group {} created ({})",
                        chat.display_name(),
                        chat.id()
                    ));
                }
                Ok(())
            }
        }
    }

    async fn delete(&self, chat_id: &str, yes: bool) -> Result<()> {
        self.enter(Route::Chat.path())?;

        if !yes && !self.output.confirm(&format!("Delete chat {}?", chat_id)) {
            self.output.info("Cancelled");
            return Ok(());
        }

        self.app.chat.delete_chat(chat_id).await;
        chat_result(&self.app.chat.snapshot())?;
        self.output.success(&format!("Deleted chat {}", chat_id));
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<()> {
        self.enter(Route::Chat.path())?;

        let users = self.app.api.search_users(query).await?;
        self.output.header(&format!("Users matching \"{}\"", query));
        self.output.user_list(&users);
        Ok(())
    }

    // ============= Admin screens =============

    fn print_limits(&self, limits: &LimitsConfig) {
        self.output
            .kv("Max upload", &format!("{} MiB", limits.max_upload_mb));
        self.output
            .kv("Max group members", &limits.max_group_members.to_string());
    }

    fn admin_overview(&self) -> Result<()> {
        self.enter(Route::Admin.path())?;

        let config = self.app.config.config();
        self.output.header("Administration");
        if let Some(user) = self.app.auth.snapshot().user() {
            self.output.kv("Administrator", &user.username);
        }
        self.output.kv("API", &config.api.base_url);
        if let Some(path) = self.app.config.path() {
            self.output.kv("Config file", &path.display().to_string());
        }
        self.output.subheader("Limits");
        self.print_limits(&config.limits);
        Ok(())
    }

    fn admin_config(
        &self,
        max_upload_mb: Option<u64>,
        max_group_members: Option<usize>,
    ) -> Result<()> {
        self.enter(Route::AdminConfig.path())?;

        let current = self.app.config.config().limits;
        if max_upload_mb.is_some() || max_group_members.is_some() {
            let limits = LimitsConfig {
                max_upload_mb: max_upload_mb.unwrap_or(current.max_upload_mb),
                max_group_members: max_group_members.unwrap_or(current.max_group_members),
            };
            self.app.config.update_limits(limits)?;
            self.output.success("Limits updated");
        }

        self.output.header("Client limits");
        self.print_limits(&self.app.config.config().limits);
        Ok(())
    }

    // ============= Routing =============

    fn route(&self, path: &str) {
        let route = Route::resolve(path);
        self.output.kv("Path", path);
        self.output.kv("Route", &format!("{:?}", route));
        self.output.kv("Access", &format!("{:?}", route.access()));

        match self.app.open(path) {
            GuardDecision::Loading => self.output.info("Renders: loading placeholder"),
            GuardDecision::Render(route) => {
                self.output.success(&format!("Renders {}", route))
            }
            GuardDecision::Redirect(target) => {
                self.output.warning(&format!("Redirects to {}", target))
            }
        }
    }
}
