// src/interactive.rs
//! Interactive console.
//!
//! Keeps both slots open across commands so the operator can alternate
//! between the linux and docker workflows without reconnecting. Everything
//! after `run <slot>` is passed on untouched, quotes included.

use std::io::{self, Write};

use clap::ValueEnum;
use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::cli::{self, connection_request, print_catalog, print_identity, print_response};
use crate::config::constants::PASSWORD_ENV;
use crate::config::settings::{Settings, TargetArgs};
use crate::dispatcher::Dispatcher;
use crate::types::{ExecutionRequest, SessionSlot};

const HELP: &str = "\
Commands:
  connect <linux|docker> <host> [user]   open a session (replaces any existing one)
  run <linux|docker> <command...>        run a command on a slot
  pick <n> [argument...]                 run catalog entry n on the docker slot
  disconnect [linux|docker]              close one slot, or both
  status                                 show both slots
  catalog                                list catalog entries
  help                                   show this text
  quit                                   disconnect and exit";

/// One parsed console line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Connect {
        slot: SessionSlot,
        host: String,
        user: Option<String>,
    },
    Run {
        slot: SessionSlot,
        command: String,
    },
    Pick {
        index: usize,
        argument: Option<String>,
    },
    Disconnect {
        slot: Option<SessionSlot>,
    },
    Status,
    Catalog,
    Help,
    Quit,
}

/// Split off the first whitespace-delimited word
fn next_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.find(char::is_whitespace) {
        Some(end) => (&input[..end], input[end..].trim_start()),
        None => (input, ""),
    }
}

fn parse_slot(word: &str) -> Result<SessionSlot, String> {
    if word.is_empty() {
        return Err("expected a slot: linux or docker".to_string());
    }
    SessionSlot::from_str(word, true).map_err(|_| format!("unknown slot '{}'", word))
}

/// Parse one console line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let (verb, rest) = next_word(line);

    let command = match verb {
        "" => return Ok(None),
        "connect" => {
            let (slot, rest) = next_word(rest);
            let (host, rest) = next_word(rest);
            let (user, rest) = next_word(rest);
            if host.is_empty() || !rest.is_empty() {
                return Err("usage: connect <linux|docker> <host> [user]".to_string());
            }
            ConsoleCommand::Connect {
                slot: parse_slot(slot)?,
                host: host.to_string(),
                user: (!user.is_empty()).then(|| user.to_string()),
            }
        }
        "run" => {
            let (slot, command) = next_word(rest);
            let slot = parse_slot(slot)?;
            if command.is_empty() {
                return Err("usage: run <linux|docker> <command...>".to_string());
            }
            ConsoleCommand::Run {
                slot,
                command: command.to_string(),
            }
        }
        "pick" => {
            let (index, argument) = next_word(rest);
            let index = index
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| "usage: pick <n> [argument...]".to_string())?;
            ConsoleCommand::Pick {
                index,
                argument: (!argument.is_empty()).then(|| argument.to_string()),
            }
        }
        "disconnect" => {
            let (slot, _) = next_word(rest);
            let slot = if slot.is_empty() {
                None
            } else {
                Some(parse_slot(slot)?)
            };
            ConsoleCommand::Disconnect { slot }
        }
        "status" => ConsoleCommand::Status,
        "catalog" => ConsoleCommand::Catalog,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" | "q" => ConsoleCommand::Quit,
        other => return Err(format!("unknown command '{}'; try 'help'", other)),
    };

    Ok(Some(command))
}

/// Run the console until `quit` or end of input
pub async fn run(settings: &Settings, json: bool) -> anyhow::Result<i32> {
    let dispatcher = Dispatcher::with_ssh();
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", style(prompt(&dispatcher)).bold());
        io::stdout().flush()?;

        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };

        match parse_line(&line) {
            Ok(None) => {}
            Ok(Some(ConsoleCommand::Quit)) => break,
            Ok(Some(command)) => handle(&dispatcher, settings, command, json).await,
            Err(message) => eprintln!("{}", style(message).yellow()),
        }
    }

    dispatcher.disconnect_all().await;
    Ok(0)
}

fn prompt(dispatcher: &Dispatcher) -> String {
    let marks: Vec<String> = SessionSlot::ALL
        .iter()
        .map(|slot| {
            let mark = if dispatcher.is_connected(*slot) { "+" } else { "-" };
            format!("{}{}", mark, slot)
        })
        .collect();
    format!("[{}]>", marks.join(" "))
}

async fn handle(dispatcher: &Dispatcher, settings: &Settings, command: ConsoleCommand, json: bool) {
    debug!("Console command: {:?}", command);

    let outcome: anyhow::Result<()> = match command {
        ConsoleCommand::Connect { slot, host, user } => {
            let target = TargetArgs {
                host,
                user,
                password: std::env::var(PASSWORD_ENV).ok(),
                timeout: None,
            };
            connect_slot(dispatcher, settings, slot, &target, json).await
        }
        ConsoleCommand::Run { slot, command } => {
            run_request(dispatcher, ExecutionRequest::new(command, slot), json).await
        }
        ConsoleCommand::Pick { index, argument } => {
            match dispatcher.catalog().templates().get(index - 1) {
                Some(template) => {
                    let mut request = ExecutionRequest::new(template.label, SessionSlot::Docker);
                    request.argument = argument;
                    run_request(dispatcher, request, json).await
                }
                None => Err(anyhow::anyhow!(
                    "no catalog entry {}; there are {}",
                    index,
                    dispatcher.catalog().len()
                )),
            }
        }
        ConsoleCommand::Disconnect { slot: Some(slot) } => {
            dispatcher.disconnect(slot).await;
            Ok(())
        }
        ConsoleCommand::Disconnect { slot: None } => {
            dispatcher.disconnect_all().await;
            Ok(())
        }
        ConsoleCommand::Status => {
            print_status(dispatcher).await;
            Ok(())
        }
        ConsoleCommand::Catalog => {
            print_catalog(dispatcher.catalog(), json);
            Ok(())
        }
        ConsoleCommand::Help => {
            println!("{}", HELP);
            Ok(())
        }
        ConsoleCommand::Quit => Ok(()),
    };

    if let Err(e) = outcome {
        cli::report_failure(&e);
    }
}

async fn connect_slot(
    dispatcher: &Dispatcher,
    settings: &Settings,
    slot: SessionSlot,
    target: &TargetArgs,
    json: bool,
) -> anyhow::Result<()> {
    let request = connection_request(settings, target).await?;
    let identity = dispatcher.connect(slot, request).await?;
    print_identity(slot, &identity, json);
    Ok(())
}

async fn run_request(
    dispatcher: &Dispatcher,
    request: ExecutionRequest,
    json: bool,
) -> anyhow::Result<()> {
    let response = dispatcher.dispatch(request).await?;
    print_response(&response, json);
    Ok(())
}

async fn print_status(dispatcher: &Dispatcher) {
    for slot in SessionSlot::ALL {
        let session = dispatcher.session(slot);
        match session.identity().await {
            Some(identity) => println!(
                "{:<7} {} {}@{}",
                slot,
                style(session.state()).green(),
                identity.username,
                identity.host
            ),
            None => println!("{:<7} {}", slot, style(session.state()).dim()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("" ; "empty")]
    #[test_case("   " ; "spaces")]
    fn test_blank_line(line: &str) {
        assert_eq!(parse_line(line), Ok(None));
    }

    #[test]
    fn test_parse_connect() {
        assert_eq!(
            parse_line("connect docker 10.0.0.5 admin"),
            Ok(Some(ConsoleCommand::Connect {
                slot: SessionSlot::Docker,
                host: "10.0.0.5".to_string(),
                user: Some("admin".to_string()),
            }))
        );
        assert_eq!(
            parse_line("connect LINUX host"),
            Ok(Some(ConsoleCommand::Connect {
                slot: SessionSlot::Linux,
                host: "host".to_string(),
                user: None,
            }))
        );
        assert!(parse_line("connect docker").is_err());
        assert!(parse_line("connect docker host user extra").is_err());
        assert!(parse_line("connect windows host").is_err());
    }

    #[test]
    fn test_parse_run_keeps_command_verbatim() {
        assert_eq!(
            parse_line("run linux   echo 'a  b' | wc -c"),
            Ok(Some(ConsoleCommand::Run {
                slot: SessionSlot::Linux,
                command: "echo 'a  b' | wc -c".to_string(),
            }))
        );
        assert!(parse_line("run docker").is_err());
        assert!(parse_line("run").is_err());
    }

    #[test]
    fn test_parse_pick() {
        assert_eq!(
            parse_line("pick 6 alpine:3.19"),
            Ok(Some(ConsoleCommand::Pick {
                index: 6,
                argument: Some("alpine:3.19".to_string()),
            }))
        );
        assert_eq!(
            parse_line("pick 1"),
            Ok(Some(ConsoleCommand::Pick {
                index: 1,
                argument: None,
            }))
        );
        assert!(parse_line("pick 0").is_err());
        assert!(parse_line("pick web").is_err());
    }

    #[test_case("disconnect", None ; "all slots")]
    #[test_case("disconnect docker", Some(SessionSlot::Docker) ; "one slot")]
    fn test_parse_disconnect(line: &str, slot: Option<SessionSlot>) {
        assert_eq!(
            parse_line(line),
            Ok(Some(ConsoleCommand::Disconnect { slot }))
        );
    }

    #[test_case("status", ConsoleCommand::Status)]
    #[test_case("catalog", ConsoleCommand::Catalog)]
    #[test_case("help", ConsoleCommand::Help)]
    #[test_case("quit", ConsoleCommand::Quit)]
    #[test_case("exit", ConsoleCommand::Quit)]
    fn test_parse_keywords(line: &str, expected: ConsoleCommand) {
        assert_eq!(parse_line(line), Ok(Some(expected)));
    }

    #[test]
    fn test_unknown_command() {
        assert!(parse_line("launch rockets").is_err());
    }

    #[tokio::test]
    async fn test_prompt_reflects_connections() {
        use crate::session::tests::{connector_with, request};
        use std::sync::Arc;

        let dispatcher = Dispatcher::new(connector_with(Arc::default()));
        assert_eq!(prompt(&dispatcher), "[-linux -docker]>");

        dispatcher.connect(SessionSlot::Docker, request()).await.unwrap();
        assert_eq!(prompt(&dispatcher), "[-linux +docker]>");
    }
}
