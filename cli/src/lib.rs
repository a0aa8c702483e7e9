#![deny(clippy::unwrap_used, clippy::expect_used)]

mod cli;
mod commands;
pub mod config;
mod config_command;
mod output;

use std::io::IsTerminal;
use std::sync::Arc;

use taskboard_backend_client::ApiError;
use taskboard_backend_client::Client;
use taskboard_backend_client::Notification;
use taskboard_backend_client::Notifier;
use taskboard_login::FileTokenStore;
use taskboard_tasks_client::HttpTaskClient;
use taskboard_tasks_client::MockTaskClient;
use taskboard_tasks_client::TaskBackend;
use taskboard_tasks_client::TaskError;
use tracing::debug;
use tracing_subscriber::EnvFilter;

pub use cli::Cli;
pub use cli::Command;

use crate::config::BackendKind;
use crate::config::Config;
use crate::config::ConfigOverrides;
use crate::config_command::EXIT_CODE_INVALID_CONFIG;

const EXIT_CODE_FAILURE: i32 = 1;

/// Prints client notices to stderr.
struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, notification: Notification) {
        eprintln!("{notification}");
    }
}

fn init_tracing() {
    let default_level = "error";
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(default_level))
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_client(config: &Config) -> Result<Client, ApiError> {
    let store = Arc::new(FileTokenStore::new(&config.taskboard_home));
    let mut client = Client::new(config.base_url.clone(), store)?
        .with_notifier(Arc::new(StderrNotifier))
        .with_refresh_strategy(config.refresh_strategy);
    if let Some(user_agent) = &config.user_agent {
        client = client.with_user_agent(user_agent.clone());
    }
    Ok(client)
}

fn build_backend(config: &Config, client: &Client) -> Box<dyn TaskBackend> {
    match config.backend {
        BackendKind::Http => {
            Box::new(HttpTaskClient::new(client.clone()).with_wire_format(config.wire_format))
        }
        BackendKind::Mock => Box::new(MockTaskClient::seeded()),
    }
}

/// True when the failure means the user has to log in again.
fn needs_login(err: &anyhow::Error) -> bool {
    let api = err
        .downcast_ref::<ApiError>()
        .or_else(|| match err.downcast_ref::<TaskError>() {
            Some(TaskError::Api(api)) => Some(api),
            _ => None,
        });
    matches!(
        api,
        Some(ApiError::Unauthenticated | ApiError::AuthenticationFailed)
    )
}

async fn dispatch(command: Command, config: &Config) -> anyhow::Result<()> {
    let client = build_client(config)?;
    match command {
        Command::Login(args) => commands::run_login(&client, args).await,
        Command::Logout => commands::run_logout(&client).await,
        Command::Whoami => {
            commands::run_whoami(&client);
            Ok(())
        }
        Command::Config => {
            config_command::print_config(config);
            Ok(())
        }
        Command::List(args) => {
            commands::run_list(build_backend(config, &client).as_ref(), args).await
        }
        Command::Create(args) => {
            commands::run_create(build_backend(config, &client).as_ref(), args).await
        }
        Command::Update(args) => {
            commands::run_update(build_backend(config, &client).as_ref(), args).await
        }
        Command::Status(args) => {
            commands::run_status(build_backend(config, &client).as_ref(), args).await
        }
        Command::Complete(arg) => {
            commands::run_complete(build_backend(config, &client).as_ref(), arg.id).await
        }
        Command::Delete(arg) => {
            commands::run_delete(build_backend(config, &client).as_ref(), arg.id).await
        }
    }
}

/// Run one command and return the process exit code.
pub async fn run_main(cli: Cli) -> i32 {
    init_tracing();

    let overrides = match ConfigOverrides::from_env(cli.base_url) {
        Ok(overrides) => overrides,
        Err(err) => {
            eprintln!("Config validation error: {err}");
            return EXIT_CODE_INVALID_CONFIG;
        }
    };
    let config = config_command::load_or_exit(overrides);
    debug!(base_url = %config.base_url, backend = %config.backend, "loaded config");

    let is_login = matches!(cli.command, Command::Login(_));
    match dispatch(cli.command, &config).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Error: {err:#}");
            if !is_login && needs_login(&err) {
                eprintln!("Run `taskboard login` to sign in.");
            }
            EXIT_CODE_FAILURE
        }
    }
}
