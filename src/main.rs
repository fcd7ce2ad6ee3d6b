//! # DevSync CLI
//!
//! Command-line front end for the DevSync client layer: log in and out,
//! inspect or edit the profile, and read or follow notifications.
//!
//! ## Environment Setup
//! Configuration comes from the environment or a `.env` file:
//! ```bash
//! DEVSYNC_API_URL=http://localhost:8000/api/v1
//! DEVSYNC_NOTIFICATIONS_URL=ws://localhost:8000/ws/notifications/
//! ```
//!
//! ## Running
//! ```bash
//! cargo run -- login you@example.com 'password'
//! cargo run -- watch
//! ```

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use devsync_client::api::ApiClient;
use devsync_client::auth::{ChangePasswordRequest, Credentials, ProfileUpdate, RegistrationRequest, TokenStore, User};
use devsync_client::config::Config;
use devsync_client::notifications::{NotificationCenter, NotificationChannel, TerminalNotifier};
use devsync_client::session::{AuthSession, SessionState};
use devsync_client::storage::{FileStore, KeyValueStore};

#[derive(Parser)]
#[command(name = "devsync")]
#[command(about = "DevSync portfolio client")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the current session
    Status,
    /// Log in with email and password
    Login { email: String, password: String },
    /// Create an account (does not log in)
    Register {
        email: String,
        password: String,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        username: Option<String>,
    },
    /// Log out and forget stored tokens
    Logout,
    /// Print the full profile
    Profile,
    /// Change profile fields
    UpdateProfile {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        github_username: Option<String>,
        #[arg(long)]
        linkedin_url: Option<String>,
        #[arg(long)]
        portfolio_url: Option<String>,
    },
    /// Change the account password
    ChangePassword { old_password: String, new_password: String },
    /// List stored notifications
    Notifications,
    /// Mark one notification as read
    Read { id: String },
    /// Mark every notification as read
    ReadAll,
    /// Remove one notification, or all of them
    Clear { id: Option<String> },
    /// Follow the live notification feed until Ctrl-C
    Watch,
}

/// Application entry point.
///
/// Initializes logging (`RUST_LOG`, default `info`), loads configuration and
/// runs one command.
#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .compact(),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::debug!(api = %config.api_base_url, storage = %config.storage_path.display(), "Loaded configuration");

    let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.storage_path)?);
    let api = Arc::new(ApiClient::new(
        &config.api_base_url,
        TokenStore::new(storage.clone()),
        config.http_timeout,
    )?);
    let session = Arc::new(AuthSession::new(api));
    let center = Arc::new(NotificationCenter::load(storage, Arc::new(TerminalNotifier::default())));

    match args.command {
        Command::Status => {
            match session.initialize().await {
                SessionState::Authenticated(user) => {
                    println!("Logged in as {} <{}>", user.display_name(), user.email);
                    if let Some(expires_at) = session.token_expires_at() {
                        println!("Access token expires at {}", expires_at.to_rfc3339());
                    }
                }
                _ => println!("Not logged in"),
            }
            println!("{} unread notification(s)", center.unread_count());
        }
        Command::Login { email, password } => {
            let user = session.login(&Credentials::new(email, password)).await?;
            println!("🔓 Logged in as {} <{}>", user.display_name(), user.email);
        }
        Command::Register {
            email,
            password,
            first_name,
            last_name,
            username,
        } => {
            let request = RegistrationRequest {
                email,
                password_confirm: password.clone(),
                password,
                first_name,
                last_name,
                username,
            };
            let response = session.register(&request).await?;
            println!(
                "{} Log in with `devsync login {} <password>`.",
                response.message.as_deref().unwrap_or("Registered."),
                response.user.email
            );
        }
        Command::Logout => {
            session.logout().await;
            println!("Logged out");
        }
        Command::Profile => {
            let user = require_user(&session).await?;
            println!("{}", serde_json::to_string_pretty(&user)?);
        }
        Command::UpdateProfile {
            first_name,
            last_name,
            bio,
            github_username,
            linkedin_url,
            portfolio_url,
        } => {
            let changes = ProfileUpdate {
                first_name,
                last_name,
                bio,
                github_username,
                linkedin_url,
                portfolio_url,
                ..Default::default()
            };
            if changes.is_empty() {
                bail!("Nothing to update; pass at least one field");
            }
            require_user(&session).await?;
            let user = session.update_profile(&changes).await?;
            println!("Updated profile for {}", user.display_name());
        }
        Command::ChangePassword {
            old_password,
            new_password,
        } => {
            require_user(&session).await?;
            let request = ChangePasswordRequest {
                old_password,
                new_password_confirm: new_password.clone(),
                new_password,
            };
            session.change_password(&request).await?;
            println!("Password changed");
        }
        Command::Notifications => {
            let notifications = center.notifications();
            if notifications.is_empty() {
                println!("No notifications");
            }
            for n in notifications {
                let marker = if n.read { " " } else { "*" };
                println!(
                    "{marker} {} [{}] {}: {} ({})",
                    n.id,
                    n.kind,
                    n.title,
                    n.message,
                    n.timestamp.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Command::Read { id } => center.mark_as_read(&id),
        Command::ReadAll => center.mark_all_as_read(),
        Command::Clear { id: Some(id) } => center.clear_notification(&id),
        Command::Clear { id: None } => center.clear_all(),
        Command::Watch => {
            require_user(&session).await?;
            if !center.request_permission() {
                tracing::warn!("Desktop notifications are not permitted, only recording history");
            }
            let mut arrivals = center.subscribe();
            let Some(channel) = NotificationChannel::spawn(config.notifications_url.as_deref(), center.clone()) else {
                bail!("DEVSYNC_NOTIFICATIONS_URL is not set");
            };
            tracing::info!("👀 Watching notifications, press Ctrl-C to stop");
            loop {
                tokio::select! {
                    result = tokio::signal::ctrl_c() => {
                        result?;
                        break;
                    }
                    arrival = arrivals.recv() => match arrival {
                        Ok(n) => println!(
                            "{} [{}] {}: {}",
                            n.timestamp.format("%H:%M:%S"),
                            n.kind,
                            n.title,
                            n.message
                        ),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Feed fell behind, some notifications were not printed");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
            channel.shutdown().await;
            println!("{} unread notification(s)", center.unread_count());
        }
    }

    Ok(())
}

async fn require_user(session: &AuthSession) -> Result<User> {
    match session.initialize().await {
        SessionState::Authenticated(user) => Ok(user),
        _ => bail!("Not logged in; run `devsync login <email> <password>` first"),
    }
}
