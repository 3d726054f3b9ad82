use crate::command::Route;
use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
#[cfg(unix)]
use tokio::fs::File;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

// ── Top-level config ──────────────────────────────────────────────

/// Top-level socialhook configuration, loaded from `config.toml`.
///
/// Resolution order: `--config-dir` / `SOCIALHOOK_CONFIG_DIR` → `~/.socialhook/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to config.toml - computed, not serialized
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Gateway server configuration: host, port, limits (`[gateway]`).
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Expected slash-command token per route (`[routes]`).
    #[serde(default)]
    pub routes: RouteTokens,

    /// Deadlines for back-end calls and notifications (`[dispatch]`).
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Chat notification settings (`[notifier]`).
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Social media back ends keyed by the name users type (`[services.<name>]`).
    #[serde(default)]
    pub services: BTreeMap<String, ServiceConfig>,
}

// ── Gateway ──────────────────────────────────────────────────────

/// Gateway server configuration (`[gateway]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Gateway port (default: 42618)
    #[serde(default = "default_gateway_port")]
    pub port: u16,
    /// Gateway host (default: 127.0.0.1)
    #[serde(default = "default_gateway_host")]
    pub host: String,
    /// Allow binding to non-localhost without a tunnel (default: false)
    #[serde(default)]
    pub allow_public_bind: bool,
    /// Whole-request deadline enforced by the HTTP layer.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Maximum accepted form body size.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_gateway_port() -> u16 {
    42618
}

fn default_gateway_host() -> String {
    "127.0.0.1".into()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            host: default_gateway_host(),
            allow_public_bind: false,
            request_timeout_secs: default_request_timeout_secs(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

// ── Route tokens ─────────────────────────────────────────────────

/// Pre-shared slash-command tokens, one per route (`[routes]` section).
///
/// An empty token disables its route: every request to it is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RouteTokens {
    pub make: String,
    pub make_attachments: String,
    pub reply: String,
    pub reply_attachments: String,
    pub delete: String,
    pub share: String,
    pub unshare: String,
}

impl RouteTokens {
    /// Same token on every route.
    pub fn uniform(token: &str) -> Self {
        let mut tokens = Self::default();
        tokens.fill_empty(token);
        tokens
    }

    pub fn token_for(&self, route: Route) -> &str {
        match route {
            Route::Make => &self.make,
            Route::MakeAttachments => &self.make_attachments,
            Route::Reply => &self.reply,
            Route::ReplyAttachments => &self.reply_attachments,
            Route::Delete => &self.delete,
            Route::Share => &self.share,
            Route::Unshare => &self.unshare,
        }
    }

    fn slot_mut(&mut self, route: Route) -> &mut String {
        match route {
            Route::Make => &mut self.make,
            Route::MakeAttachments => &mut self.make_attachments,
            Route::Reply => &mut self.reply,
            Route::ReplyAttachments => &mut self.reply_attachments,
            Route::Delete => &mut self.delete,
            Route::Share => &mut self.share,
            Route::Unshare => &mut self.unshare,
        }
    }

    /// Set `token` on every route that has none.
    pub fn fill_empty(&mut self, token: &str) {
        for route in Route::ALL {
            let slot = self.slot_mut(route);
            if slot.trim().is_empty() {
                *slot = token.to_string();
            }
        }
    }

    /// Routes that currently reject everything.
    pub fn disabled_routes(&self) -> Vec<Route> {
        Route::ALL
            .into_iter()
            .filter(|route| self.token_for(*route).is_empty())
            .collect()
    }
}

// ── Dispatch ─────────────────────────────────────────────────────

/// Dispatch deadlines (`[dispatch]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Deadline for one back-end call. Default: `15`.
    #[serde(default = "default_execute_timeout_secs")]
    pub execute_timeout_secs: u64,
    /// Deadline for the post-success chat notification. Default: `5`.
    #[serde(default = "default_notify_timeout_secs")]
    pub notify_timeout_secs: u64,
}

fn default_execute_timeout_secs() -> u64 {
    15
}

fn default_notify_timeout_secs() -> u64 {
    5
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            execute_timeout_secs: default_execute_timeout_secs(),
            notify_timeout_secs: default_notify_timeout_secs(),
        }
    }
}

// ── Notifier ─────────────────────────────────────────────────────

/// Chat notification configuration (`[notifier]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Slack incoming-webhook URL. When unset, notifications only go to the log.
    #[serde(default)]
    pub webhook_url: Option<String>,
    /// Channel the summary is posted to. Default: `#hook-testing`.
    #[serde(default = "default_notifier_channel")]
    pub channel: String,
    /// Display name of the posting bot. Default: `social-media-tool`.
    #[serde(default = "default_notifier_username")]
    pub username: String,
    /// HTTP timeout for the webhook call.
    #[serde(default = "default_notifier_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_notifier_channel() -> String {
    "#hook-testing".into()
}

fn default_notifier_username() -> String {
    "social-media-tool".into()
}

fn default_notifier_timeout_secs() -> u64 {
    5
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            channel: default_notifier_channel(),
            username: default_notifier_username(),
            timeout_secs: default_notifier_timeout_secs(),
        }
    }
}

// ── Services ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    /// X/Twitter API v2.
    #[default]
    Twitter,
    /// Dry run: actions are logged, nothing is published.
    Log,
}

impl ServiceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceKind::Twitter => "twitter",
            ServiceKind::Log => "log",
        }
    }
}

/// One social media back end (`[services.<name>]` section).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Back-end implementation. Default: `"twitter"`.
    #[serde(default)]
    pub kind: ServiceKind,
    /// OAuth 2.0 user access token.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Numeric account id, required for share/unshare.
    #[serde(default)]
    pub user_id: Option<String>,
    /// API base URL override.
    #[serde(default)]
    pub api_url: Option<String>,
    /// HTTP timeout for calls to this back end.
    #[serde(default = "default_service_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_service_timeout_secs() -> u64 {
    10
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            kind: ServiceKind::default(),
            access_token: None,
            user_id: None,
            api_url: None,
            timeout_secs: default_service_timeout_secs(),
        }
    }
}

// ── Config impl ──────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        let home =
            UserDirs::new().map_or_else(|| PathBuf::from("."), |u| u.home_dir().to_path_buf());

        Self {
            config_path: home.join(".socialhook").join("config.toml"),
            gateway: GatewayConfig::default(),
            routes: RouteTokens::default(),
            dispatch: DispatchConfig::default(),
            notifier: NotifierConfig::default(),
            services: BTreeMap::new(),
        }
    }
}

fn default_config_dir() -> Result<PathBuf> {
    let home = UserDirs::new()
        .map(|u| u.home_dir().to_path_buf())
        .context("Could not find home directory")?;
    Ok(home.join(".socialhook"))
}

/// `SOCIALHOOK_CONFIG_DIR` when set, otherwise `~/.socialhook`.
pub fn resolve_config_dir() -> Result<PathBuf> {
    match std::env::var("SOCIALHOOK_CONFIG_DIR") {
        Ok(dir) if !dir.trim().is_empty() => Ok(PathBuf::from(dir)),
        _ => default_config_dir(),
    }
}

fn is_positive(value: u64, field: &str) -> Result<()> {
    if value == 0 {
        anyhow::bail!("{field} must be greater than 0");
    }
    Ok(())
}

impl Config {
    pub async fn load_or_init() -> Result<Self> {
        let config_dir = resolve_config_dir()?;
        Self::load_or_init_in(&config_dir).await
    }

    pub async fn load_or_init_in(config_dir: &Path) -> Result<Self> {
        let config_path = config_dir.join("config.toml");

        fs::create_dir_all(config_dir).await.with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        if config_path.exists() {
            // Warn if config file is world-readable (holds tokens)
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Ok(meta) = fs::metadata(&config_path).await {
                    if meta.permissions().mode() & 0o004 != 0 {
                        tracing::warn!(
                            "Config file {:?} is world-readable (mode {:o}). \
                             Consider restricting with: chmod 600 {:?}",
                            config_path,
                            meta.permissions().mode() & 0o777,
                            config_path,
                        );
                    }
                }
            }

            let contents = fs::read_to_string(&config_path)
                .await
                .context("Failed to read config file")?;
            let mut config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            config.config_path = config_path;
            config.apply_env_overrides();
            config.validate()?;
            tracing::info!(
                path = %config.config_path.display(),
                services = config.services.len(),
                initialized = false,
                "Config loaded"
            );
            Ok(config)
        } else {
            let mut config = Config::default();
            config.config_path = config_path.clone();
            config.save().await?;

            // Restrict permissions on newly created config file (holds tokens)
            #[cfg(unix)]
            {
                use std::{fs::Permissions, os::unix::fs::PermissionsExt};
                let _ = fs::set_permissions(&config_path, Permissions::from_mode(0o600)).await;
            }

            config.apply_env_overrides();
            config.validate()?;
            tracing::info!(
                path = %config.config_path.display(),
                services = config.services.len(),
                initialized = true,
                "Config loaded"
            );
            Ok(config)
        }
    }

    /// Validate configuration values that would cause runtime failures.
    pub fn validate(&self) -> Result<()> {
        // Gateway
        if self.gateway.host.trim().is_empty() {
            anyhow::bail!("gateway.host must not be empty");
        }
        is_positive(
            self.gateway.request_timeout_secs,
            "gateway.request_timeout_secs",
        )?;
        if self.gateway.max_body_bytes == 0 {
            anyhow::bail!("gateway.max_body_bytes must be greater than 0");
        }

        // Dispatch
        is_positive(
            self.dispatch.execute_timeout_secs,
            "dispatch.execute_timeout_secs",
        )?;
        is_positive(
            self.dispatch.notify_timeout_secs,
            "dispatch.notify_timeout_secs",
        )?;
        // A back-end timeout must reach the user as a message, not an HTTP 408
        if self.gateway.request_timeout_secs <= self.dispatch.execute_timeout_secs {
            anyhow::bail!(
                "gateway.request_timeout_secs ({}) must be greater than dispatch.execute_timeout_secs ({})",
                self.gateway.request_timeout_secs,
                self.dispatch.execute_timeout_secs
            );
        }

        // Notifier
        is_positive(self.notifier.timeout_secs, "notifier.timeout_secs")?;
        if let Some(url) = self.notifier.webhook_url.as_deref() {
            if !url.trim().is_empty() {
                reqwest::Url::parse(url.trim())
                    .with_context(|| format!("notifier.webhook_url is not a valid URL: {url}"))?;
            }
        }

        // Services
        for (name, service) in &self.services {
            if name.trim().is_empty() {
                anyhow::bail!("services must not contain an empty name");
            }
            if name.contains(':') {
                anyhow::bail!("services.{name}: names must not contain ':'");
            }
            is_positive(service.timeout_secs, &format!("services.{name}.timeout_secs"))?;
            if let Some(url) = service.api_url.as_deref() {
                reqwest::Url::parse(url)
                    .with_context(|| format!("services.{name}.api_url is not a valid URL: {url}"))?;
            }
        }

        Ok(())
    }

    /// Apply environment variable overrides to config
    pub fn apply_env_overrides(&mut self) {
        // Gateway port: SOCIALHOOK_GATEWAY_PORT or PORT
        if let Ok(port_str) =
            std::env::var("SOCIALHOOK_GATEWAY_PORT").or_else(|_| std::env::var("PORT"))
        {
            if let Ok(port) = port_str.parse::<u16>() {
                self.gateway.port = port;
            }
        }

        // Gateway host: SOCIALHOOK_GATEWAY_HOST or HOST
        if let Ok(host) =
            std::env::var("SOCIALHOOK_GATEWAY_HOST").or_else(|_| std::env::var("HOST"))
        {
            if !host.is_empty() {
                self.gateway.host = host;
            }
        }

        // Allow public bind: SOCIALHOOK_ALLOW_PUBLIC_BIND
        if let Ok(val) = std::env::var("SOCIALHOOK_ALLOW_PUBLIC_BIND") {
            self.gateway.allow_public_bind = val == "1" || val.eq_ignore_ascii_case("true");
        }

        // Shared slash-command token for every route without its own
        if let Ok(token) = std::env::var("SOCIALHOOK_ROUTE_TOKEN") {
            let token = token.trim();
            if !token.is_empty() {
                self.routes.fill_empty(token);
            }
        }

        // Chat webhook: SOCIALHOOK_NOTIFY_WEBHOOK_URL
        if let Ok(url) = std::env::var("SOCIALHOOK_NOTIFY_WEBHOOK_URL") {
            if !url.trim().is_empty() {
                self.notifier.webhook_url = Some(url.trim().to_string());
            }
        }
    }

    pub async fn save(&self) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;

        let parent_dir = self
            .config_path
            .parent()
            .context("Config path must have a parent directory")?;

        fs::create_dir_all(parent_dir).await.with_context(|| {
            format!(
                "Failed to create config directory: {}",
                parent_dir.display()
            )
        })?;

        let file_name = self
            .config_path
            .file_name()
            .and_then(|v| v.to_str())
            .unwrap_or("config.toml");
        let temp_path = parent_dir.join(format!(".{file_name}.tmp-{}", uuid::Uuid::new_v4()));
        let backup_path = parent_dir.join(format!("{file_name}.bak"));

        let mut temp_file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&temp_path)
            .await
            .with_context(|| {
                format!(
                    "Failed to create temporary config file: {}",
                    temp_path.display()
                )
            })?;
        temp_file
            .write_all(toml_str.as_bytes())
            .await
            .context("Failed to write temporary config contents")?;
        temp_file
            .sync_all()
            .await
            .context("Failed to fsync temporary config file")?;
        drop(temp_file);

        let had_existing_config = self.config_path.exists();
        if had_existing_config {
            fs::copy(&self.config_path, &backup_path)
                .await
                .with_context(|| {
                    format!(
                        "Failed to create config backup before atomic replace: {}",
                        backup_path.display()
                    )
                })?;
        }

        if let Err(e) = fs::rename(&temp_path, &self.config_path).await {
            let _ = fs::remove_file(&temp_path).await;
            if had_existing_config && backup_path.exists() {
                fs::copy(&backup_path, &self.config_path)
                    .await
                    .context("Failed to restore config backup")?;
            }
            anyhow::bail!("Failed to atomically replace config file: {e}");
        }

        sync_directory(parent_dir).await?;

        if had_existing_config {
            let _ = fs::remove_file(&backup_path).await;
        }

        Ok(())
    }
}

async fn sync_directory(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        let dir = File::open(path)
            .await
            .with_context(|| format!("Failed to open directory for fsync: {}", path.display()))?;
        dir.sync_all()
            .await
            .with_context(|| format!("Failed to fsync directory metadata: {}", path.display()))?;
        Ok(())
    }

    #[cfg(not(unix))]
    {
        let _ = path;
        Ok(())
    }
}
