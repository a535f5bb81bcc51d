//! SIMS console - Main Entry Point
//!
//! Wires the adapters into the screens, logs in, and runs the interactive
//! console until the user quits.

use std::sync::Arc;
use std::time::Duration;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use sims_application::{ApiClient, AuthSession, AuthorizedApi, Diagnostics, MealsClient, TokenStore};
use sims_domain::AppConfig;
use sims_infrastructure::{
    ConfigRepository, FileKeyValueStorage, KeycloakProvider, ReqwestHttpClient, SystemClock,
};
use sims_ui::{
    ConsoleInput, DiagnosticsScreen, HELP, MealsScreen, Screens, SessionScreen, UiCommand,
    UiUpdate, parse_line, run_dispatcher, session_menu,
};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Login restarts allowed at startup.
const STARTUP_LOGIN_ATTEMPTS: u32 = 3;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ConfigRepository::new().load_with_env().await?;
    info!(
        api = %config.api_base_url,
        keycloak = %config.identity.url,
        "Starting SIMS console v{}",
        env!("CARGO_PKG_VERSION")
    );

    let (session, screens) = build(&config)?;

    if std::env::args().any(|arg| arg == "--no-login") {
        info!("Skipping login");
    } else {
        match session
            .initialize_with_reload(&config.identity, STARTUP_LOGIN_ATTEMPTS)
            .await
        {
            Ok(true) => println!("{}", session.state().message()),
            Ok(false) => println!("Login ended without a token; use `session 2` to retry"),
            Err(e) => {
                error!(error = %e, "Login failed");
                println!("{}: {e}", session.state().message());
            }
        }
    }

    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();
    let (update_tx, mut update_rx) = mpsc::unbounded_channel::<UiUpdate>();

    let dispatcher = tokio::spawn(run_dispatcher(screens, cmd_rx, update_tx));
    let printer = tokio::spawn(async move {
        while let Some(update) = update_rx.recv().await {
            let text = update.to_string();
            if !text.is_empty() {
                println!("{text}");
            }
        }
    });

    tokio::task::spawn_blocking(move || run_console(&cmd_tx)).await??;

    dispatcher.await?;
    // Give in-flight tasks their transport timeout to report back.
    if tokio::time::timeout(Duration::from_secs(config.request_timeout_secs), printer)
        .await
        .is_err()
    {
        warn!("Pending updates dropped on exit");
    }
    Ok(())
}

/// Builds the session and the three screens from `config`.
fn build(config: &AppConfig) -> Result<(Arc<AuthSession>, Arc<Screens>), Box<dyn std::error::Error>> {
    let http = Arc::new(ReqwestHttpClient::new(Duration::from_secs(
        config.request_timeout_secs,
    ))?);
    let storage = match &config.storage_path {
        Some(path) => FileKeyValueStorage::new(path),
        None => FileKeyValueStorage::in_data_dir().ok_or("no data directory for token storage")?,
    };
    info!(path = %storage.path().display(), "Token storage");
    let store = TokenStore::new(Arc::new(storage));

    let session = Arc::new(
        AuthSession::new(
            Arc::new(KeycloakProvider::new()),
            store.clone(),
            Arc::new(SystemClock::new()),
        )
        .with_scrub_on_logout(config.scrub_token_on_logout),
    );
    session.on_expired(|source| warn!(source = source.as_str(), "Token expired"));

    let api = AuthorizedApi::new(ApiClient::new(http), store, config.api_base_url.clone())
        .with_session(Arc::clone(&session));

    let screens = Screens {
        session: SessionScreen::new(Arc::clone(&session), api.clone(), config),
        meals: MealsScreen::new(MealsClient::new(api.clone())),
        diagnostics: DiagnosticsScreen::new(Diagnostics::new(api, Arc::new(SystemClock::new()))),
    };
    Ok((session, Arc::new(screens)))
}

/// Reads console lines until `quit` or end of input.
fn run_console(cmd_tx: &mpsc::UnboundedSender<UiCommand>) -> Result<(), ReadlineError> {
    let mut editor = DefaultEditor::new()?;
    println!("Type `help` for commands.");

    loop {
        let line = match editor.readline("sims> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e),
        };
        if !line.trim().is_empty() {
            let _ = editor.add_history_entry(line.as_str());
        }

        let commands = match parse_line(&line) {
            Ok(ConsoleInput::Empty) => continue,
            Ok(ConsoleInput::Help) => {
                println!("{HELP}");
                continue;
            }
            Ok(ConsoleInput::SessionMenu) => {
                println!("{}", session_menu());
                continue;
            }
            Ok(ConsoleInput::Quit) => break,
            Ok(ConsoleInput::Commands(commands)) => commands,
            Ok(ConsoleInput::ConfirmDelete(id)) => {
                let answer = editor.readline(&format!("Delete meal {id}? [y/N] "))?;
                let confirmed = matches!(answer.trim(), "y" | "Y" | "yes");
                vec![UiCommand::DeleteMeal { id, confirmed }]
            }
            Err(message) => {
                println!("{message}");
                continue;
            }
        };

        for command in commands {
            if cmd_tx.send(command).is_err() {
                return Ok(());
            }
        }
    }
    Ok(())
}
