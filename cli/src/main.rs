//! paasctl - entry point
//!
//! Usage:
//!   paasctl push <app> [--path=DIR] [--instances=N] [--mem=MB] [--url=URI] [--no-start]
//!   paasctl update <app> [--path=DIR]
//!   paasctl start|stop|restart <app>
//!   paasctl crashlogs <app> [--instance=N]
//!
//! Global options: --target=URL --token=TOKEN --log-level=LEVEL --log-json
//! --log-file --no-color --trace --no-resources --rollback=yes|no --version

use std::collections::HashMap;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use secrecy::SecretString;
use tracing::{debug, error};

use paasctl::commands::push::{push, PushRequest};
use paasctl::commands::start::{restart, start, stop};
use paasctl::commands::update::update;
use paasctl::commands::logs::crash_logs;
use paasctl::commands::{CommandContext, Outcome};
use paasctl::errors::CliError;
use paasctl::http::client::HttpClient;
use paasctl::logs::{init_logging, LogOptions};
use paasctl::output::Reporter;
use paasctl::prompt::DialoguerPrompt;
use paasctl::rollout::rollback::{FixedAnswer, RollbackPrompt};
use paasctl::rollout::ticker::Ticker;
use paasctl::storage::layout::StorageLayout;
use paasctl::storage::settings::Settings;
use paasctl::utils::{tokio_sleep, version_info};

const USAGE: &str = "usage: paasctl <push|update|start|stop|restart|crashlogs> <app> [options]";

struct Invocation {
    positional: Vec<String>,
    options: HashMap<String, String>,
}

fn parse_args(args: impl Iterator<Item = String>) -> Invocation {
    let mut positional = Vec::new();
    let mut options = HashMap::new();

    for arg in args {
        if let Some(flag) = arg.strip_prefix("--") {
            match flag.split_once('=') {
                Some((key, value)) => options.insert(key.to_string(), value.to_string()),
                None => options.insert(flag.to_string(), "true".to_string()),
            };
        } else {
            positional.push(arg);
        }
    }

    Invocation {
        positional,
        options,
    }
}

fn parse_number<T: std::str::FromStr>(
    options: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, CliError> {
    match options.get(key) {
        Some(value) => value
            .parse()
            .map_err(|_| CliError::ConfigError(format!("--{} expects a number, got '{}'", key, value))),
        None => Ok(default),
    }
}

/// Command-line flags take precedence over the settings file
fn apply_overrides(settings: &mut Settings, options: &HashMap<String, String>) -> Result<(), CliError> {
    if let Some(target) = options.get("target") {
        settings.target = target.clone();
    }
    if let Some(token) = options.get("token") {
        settings.token = Some(SecretString::from(token.clone()));
    }
    if let Some(level) = options.get("log-level") {
        settings.log_level = level.parse().map_err(CliError::ConfigError)?;
    }
    if options.contains_key("no-color") {
        settings.color = false;
    }
    if options.contains_key("trace") {
        settings.trace = true;
    }
    if options.contains_key("no-resources") {
        settings.check_resources = false;
    }
    Ok(())
}

async fn load_settings(
    layout: &StorageLayout,
    options: &HashMap<String, String>,
) -> anyhow::Result<Settings> {
    let settings_file = layout.settings_file();
    let mut settings = Settings::load(&settings_file)
        .await
        .with_context(|| format!("Unable to read {}", settings_file.path().display()))?;
    apply_overrides(&mut settings, options).context("Invalid command-line option")?;
    Ok(settings)
}

fn rollback_prompt(options: &HashMap<String, String>) -> Result<Box<dyn RollbackPrompt>, CliError> {
    match options.get("rollback").map(String::as_str) {
        None => Ok(Box::new(DialoguerPrompt)),
        Some("yes") | Some("y") | Some("true") => Ok(Box::new(FixedAnswer(true))),
        Some("no") | Some("n") | Some("false") => Ok(Box::new(FixedAnswer(false))),
        Some(other) => Err(CliError::ConfigError(format!(
            "--rollback expects yes or no, got '{}'",
            other
        ))),
    }
}

async fn dispatch(
    ctx: &CommandContext<'_>,
    invocation: &Invocation,
) -> Result<Outcome, CliError> {
    let (command, app_name) = match invocation.positional.as_slice() {
        [command, app_name, ..] => (command.as_str(), app_name.as_str()),
        _ => return Err(CliError::ConfigError(USAGE.to_string())),
    };
    let options = &invocation.options;
    let path = options
        .get("path")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    match command {
        "push" => {
            let mut request = PushRequest::new(app_name, path);
            request.instances = parse_number(options, "instances", request.instances)?;
            request.memory_mb = parse_number(options, "mem", request.memory_mb)?;
            if let Some(url) = options.get("url") {
                request.uris = vec![url.clone()];
            }
            request.start_immediately = !options.contains_key("no-start");
            push(ctx, &request).await
        }
        "update" => update(ctx, app_name, &path).await,
        "start" => start(ctx, app_name).await,
        "stop" => stop(ctx, app_name).await,
        "restart" => restart(ctx, app_name).await,
        "crashlogs" => {
            let instance = parse_number(options, "instance", 0u32)?;
            crash_logs(ctx, app_name, instance).await
        }
        other => Err(CliError::ConfigError(format!(
            "unknown command '{}'\n{}",
            other, USAGE
        ))),
    }
}

#[tokio::main]
async fn main() {
    let invocation = parse_args(env::args().skip(1));

    // Print version and exit
    if invocation.options.contains_key("version") {
        match serde_json::to_string_pretty(&version_info()) {
            Ok(version) => println!("{}", version),
            Err(e) => eprintln!("Failed to render version: {}", e),
        }
        return;
    }

    let layout = StorageLayout::default();
    let settings = match load_settings(&layout, &invocation.options).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    let log_options = LogOptions {
        log_level: settings.log_level.clone(),
        log_dir: settings.log_dir.clone().or_else(|| {
            invocation
                .options
                .contains_key("log-file")
                .then(|| layout.logs_dir())
        }),
        json_format: invocation.options.contains_key("log-json"),
        ..Default::default()
    };
    let _log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };

    let reporter = Arc::new(Reporter::stdout(settings.output_config()));
    let code = match run(&settings, &invocation, reporter.clone()).await {
        Ok(outcome) => {
            debug!("Command finished: {:?}", outcome);
            outcome.exit_code()
        }
        Err(e) => {
            error!("Command failed: {}", e);
            reporter.error(&format!("Error: {}", e));
            1
        }
    };

    let _ = std::io::stdout().flush();
    drop(_log_guard);
    std::process::exit(code);
}

async fn run(
    settings: &Settings,
    invocation: &Invocation,
    reporter: Arc<Reporter>,
) -> Result<Outcome, CliError> {
    let mut client = HttpClient::new(&settings.target, settings.http_timeout())?;
    if let Some(token) = &settings.token {
        client = client.with_token(token.clone());
    }

    let prompt = rollback_prompt(&invocation.options)?;
    let command_settings = settings.command_settings();

    let dots = reporter.clone();
    let ctx = CommandContext {
        client: &client,
        reporter: &reporter,
        settings: &command_settings,
        prompt: prompt.as_ref(),
        ticker: Some(Ticker::new(Duration::from_secs(1), move || dots.progress("."))),
        sleep_fn: tokio_sleep(),
    };

    dispatch(&ctx, invocation).await
}
