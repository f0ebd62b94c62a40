//! DormLink - command-line client for the student housing marketplace.

use std::env;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use dormlink_client::{
    ApiClient, Config, CredentialStore, SessionEvent, SessionManager, UnreadPoller,
};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn print_usage() {
    println!("dormlink {}", VERSION);
    println!();
    println!("Usage: dormlink <command>");
    println!();
    println!("Commands:");
    println!("  login <username>   Obtain a token pair and establish a session");
    println!("  whoami             Show the current user");
    println!("  notifications      List notifications");
    println!("  watch              Follow the unread count until interrupted");
    println!("  theme [value]      Show or set the persisted theme preference");
    println!("  logout             Drop the session");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Handle --version / -V
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("dormlink {}", VERSION);
        return Ok(());
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load().map_err(|e| {
        format!(
            "Failed to load configuration: {}. \
             Make sure config.toml is valid or set DORMLINK__API__BASE_URL style environment variables.",
            e
        )
    })?;
    tracing::info!("Using API at {}", config.api.base_url);

    let credentials = Arc::new(CredentialStore::open(&config.storage.path));
    let api = Arc::new(ApiClient::new(&config.api, credentials.clone())?);
    let session = SessionManager::new(credentials.clone(), api.clone());

    // Bootstrap: migration, stored-token decode, profile hydration.
    session.initialize().await;

    match args.get(1).map(String::as_str) {
        Some("login") => {
            let Some(username) = args.get(2) else {
                print_usage();
                return Ok(());
            };

            print!("Password: ");
            io::stdout().flush()?;
            let mut password = String::new();
            io::stdin().lock().read_line(&mut password)?;

            let pair = api.obtain_token(username, password.trim_end()).await?;
            session.login(&pair.access, &pair.refresh).await?;

            if let Some(user) = session.snapshot().user {
                println!("Logged in as {} (id {})", user.display_name(), user.id);
            }
        }

        Some("whoami") => match session.snapshot().user {
            Some(user) => {
                println!("{} (id {})", user.display_name(), user.id);
                if !user.email.is_empty() {
                    println!("email: {}", user.email);
                }
            }
            None => println!("Not authenticated"),
        },

        Some("notifications") => {
            let notifications = api.list_notifications().await?;
            if notifications.is_empty() {
                println!("No notifications");
            }
            for notification in &notifications {
                let marker = if notification.is_read { ' ' } else { '*' };
                println!(
                    "{} [{}] {}",
                    marker,
                    notification.created_at.format("%Y-%m-%d %H:%M"),
                    notification.title
                );
            }
        }

        Some("watch") => {
            let poller = UnreadPoller::new(
                api.clone(),
                session.subscribe(),
                Duration::from_secs(config.notifications.poll_interval_secs),
            );
            let handle = poller.spawn();
            let mut count = handle.subscribe();
            let mut events = api.subscribe_events();

            loop {
                tokio::select! {
                    changed = count.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        println!("unread: {}", *count.borrow());
                    }
                    event = events.recv() => {
                        if let Ok(SessionEvent::SessionExpired) = event {
                            session.logout();
                            eprintln!("Session expired, please log in again");
                            break;
                        }
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            handle.stop();
        }

        Some("theme") => match args.get(2) {
            Some(value) => {
                credentials.set_theme(value);
                println!("Theme set to {}", value);
            }
            None => match credentials.theme() {
                Some(theme) => println!("{}", theme),
                None => println!("No theme set"),
            },
        },

        Some("logout") => {
            session.logout();
            println!("Logged out");
        }

        _ => print_usage(),
    }

    Ok(())
}
