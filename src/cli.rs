// src/cli.rs
//! Command line front end.
//!
//! Each one-shot command returns the process exit code: the remote exit code
//! when a command ran, 1 for usage and validation errors, 2 for connection
//! and transport failures.

use std::io::{self, Write};

use anyhow::Context;
use console::style;
use serde_json::json;
use tracing::debug;

use crate::catalog::Catalog;
use crate::config::constants::{EXIT_USAGE, PASSWORD_ENV};
use crate::config::settings::{ClientArgs, Command, Settings, TargetArgs};
use crate::dispatcher::Dispatcher;
use crate::interactive;
use crate::normalizer::{self, CorrectionResult};
use crate::session::HostIdentity;
use crate::types::{ConnectionRequest, ExecutionRequest, ExecutionResponse, RemoteError, SessionSlot};
use crate::vocabulary::DOCKER;

/// Run the parsed command line and return the process exit code
pub async fn run(args: ClientArgs, settings: Settings) -> i32 {
    let json = args.json;
    let outcome = match args.command {
        Command::Catalog => {
            print_catalog(&Catalog::default(), json);
            Ok(0)
        }
        Command::Normalize { command } => {
            print_correction(&normalizer::normalize(&command, &DOCKER), json);
            Ok(0)
        }
        Command::Connect { target } => connect_once(&settings, &target, json).await,
        Command::Run {
            target,
            slot,
            argument,
            command,
        } => {
            let mut request = ExecutionRequest::new(command, slot);
            request.argument = argument;
            run_once(&settings, &target, request, json).await
        }
        Command::Console => interactive::run(&settings, json).await,
    };

    match outcome {
        Ok(code) => code,
        Err(e) => report_failure(&e),
    }
}

async fn connect_once(settings: &Settings, target: &TargetArgs, json: bool) -> anyhow::Result<i32> {
    let dispatcher = Dispatcher::with_ssh();
    let request = connection_request(settings, target).await?;
    let identity = dispatcher.connect(SessionSlot::Linux, request).await?;
    print_identity(SessionSlot::Linux, &identity, json);
    dispatcher.disconnect_all().await;
    Ok(0)
}

async fn run_once(
    settings: &Settings,
    target: &TargetArgs,
    request: ExecutionRequest,
    json: bool,
) -> anyhow::Result<i32> {
    let dispatcher = Dispatcher::with_ssh();

    // Reject bad input before asking for a password
    dispatcher.preview(&request)?;

    let connection = connection_request(settings, target).await?;
    dispatcher.connect(request.slot, connection).await?;
    let outcome = dispatcher.dispatch(request).await;
    dispatcher.disconnect_all().await;

    let response = outcome?;
    print_response(&response, json);
    Ok(response.exit_code)
}

/// Build a connection request, prompting for the password when none was given
pub(crate) async fn connection_request(
    settings: &Settings,
    target: &TargetArgs,
) -> anyhow::Result<ConnectionRequest> {
    let timeout = settings.timeout_for(target)?;
    let username = settings.username_for(target);
    let password = match &target.password {
        Some(password) => password.clone(),
        None => prompt_password(&username, &target.host).await?,
    };

    let mut request = ConnectionRequest::new(target.host.clone(), username, password, 0);
    request.timeout = timeout;
    Ok(request)
}

async fn prompt_password(username: &str, host: &str) -> anyhow::Result<String> {
    debug!("No password given and {} unset; prompting", PASSWORD_ENV);
    let prompt = format!("Password for {}@{}", username, host);
    let password = tokio::task::spawn_blocking(move || {
        dialoguer::Password::new()
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()
    })
    .await?
    .context("reading password")?;
    Ok(password)
}

/// Print a failure to stderr and map it to an exit code
pub(crate) fn report_failure(error: &anyhow::Error) -> i32 {
    eprintln!("{} {:#}", style("error:").red().bold(), error);
    match error.downcast_ref::<RemoteError>() {
        Some(remote) => remote.exit_code(),
        None => EXIT_USAGE,
    }
}

pub(crate) fn print_response(response: &ExecutionResponse, json: bool) {
    if json {
        print_json(response);
        return;
    }

    if !response.correction_note.is_empty() {
        eprintln!("{} {}", style("note:").yellow().bold(), response.correction_note);
    }
    eprintln!("{} {}", style("$").dim(), style(&response.corrected_command).bold());

    print!("{}", response.stdout);
    let _ = io::stdout().flush();
    if !response.stderr.is_empty() {
        eprint!("{}", style(&response.stderr).red());
    }
    if !response.succeeded {
        eprintln!(
            "{}",
            style(format!("exit code {}", response.exit_code)).red()
        );
    }
}

pub(crate) fn print_identity(slot: SessionSlot, identity: &HostIdentity, json: bool) {
    if json {
        print_json(&json!({
            "slot": slot,
            "host": identity.host,
            "username": identity.username,
            "fingerprint": identity.fingerprint,
        }));
        return;
    }

    println!(
        "{} {} slot to {}@{}",
        style("connected").green().bold(),
        slot,
        identity.username,
        identity.host
    );
    if let Some(fingerprint) = &identity.fingerprint {
        println!("  host key {}", style(fingerprint).cyan());
    }
}

pub(crate) fn print_catalog(catalog: &Catalog, json: bool) {
    if json {
        print_json(catalog.templates());
        return;
    }

    for (index, template) in catalog.templates().iter().enumerate() {
        let marker = if template.needs_argument { " <arg>" } else { "" };
        println!(
            "{:>3}. {:<38} {}{}",
            index + 1,
            template.label,
            style(template.template).dim(),
            style(marker).yellow()
        );
    }
}

fn print_correction(correction: &CorrectionResult, json: bool) {
    if json {
        print_json(correction);
        return;
    }

    println!("{}", correction.corrected_command);
    if correction.was_corrected() {
        eprintln!("{} {}", style("note:").yellow().bold(), correction.note);
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("{} {}", style("error:").red().bold(), e),
    }
}
