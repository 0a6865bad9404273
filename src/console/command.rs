//! Operator command parsing.
//!
//! One command per line, whitespace separated:
//! ```text
//! route [policy] [session]
//! release <id>
//! scale-up <count>
//! scale-down <id>[,<id>...]
//! fail <id> | recover <id>
//! logs | status | exit
//! ```

use std::str::FromStr;
use thiserror::Error;

use crate::load_balancer::policy::{Policy, UnknownPolicy};
use crate::load_balancer::server::ServerId;

/// Largest batch a single `scale-up` may add.
pub const MAX_SCALE_UP: u32 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Route {
        policy: Option<Policy>,
        session: Option<String>,
    },
    Release(ServerId),
    ScaleUp(u32),
    ScaleDown(Vec<ServerId>),
    Fail(ServerId),
    Recover(ServerId),
    Logs,
    Status,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("'{0}' is not a valid number")]
    InvalidNumber(String),

    #[error("cannot scale up by {0} servers (at most {max} at once)", max = MAX_SCALE_UP)]
    ScaleUpTooLarge(u32),

    #[error(transparent)]
    Policy(#[from] UnknownPolicy),
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut parts = line.split_whitespace();
        let Some(name) = parts.next() else {
            return Err(ParseError::Empty);
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "route" | "add" => {
                let policy = parts.next().map(str::parse::<Policy>).transpose()?;
                let session = parts.next().map(str::to_string);
                Command::Route { policy, session }
            }
            "release" | "remove" => Command::Release(server_id(parts.next(), "server id")?),
            "scale-up" | "scale_up" => {
                let count = number(parts.next(), "server count")?;
                if count > MAX_SCALE_UP {
                    return Err(ParseError::ScaleUpTooLarge(count));
                }
                Command::ScaleUp(count)
            }
            "scale-down" | "scale_down" => {
                let list: Vec<&str> = parts.collect();
                if list.is_empty() {
                    return Err(ParseError::MissingArgument("server ids"));
                }
                let ids = list
                    .join(",")
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| server_id(Some(s), "server ids"))
                    .collect::<Result<Vec<_>, _>>()?;
                Command::ScaleDown(ids)
            }
            "fail" | "down" => Command::Fail(server_id(parts.next(), "server id")?),
            "recover" | "up" => Command::Recover(server_id(parts.next(), "server id")?),
            "logs" => Command::Logs,
            "status" => Command::Status,
            "exit" | "quit" => Command::Exit,
            other => return Err(ParseError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }
}

/// Text before a `#` comment.
///
/// `#` opens a comment only at the start of the line or after whitespace, so
/// a session id such as `user#1` survives.
pub fn strip_comment(line: &str) -> &str {
    let mut after_space = true;
    for (i, c) in line.char_indices() {
        if c == '#' && after_space {
            return &line[..i];
        }
        after_space = c.is_whitespace();
    }
    line
}

fn number(arg: Option<&str>, what: &'static str) -> Result<u32, ParseError> {
    let arg = arg.ok_or(ParseError::MissingArgument(what))?;
    arg.parse()
        .map_err(|_| ParseError::InvalidNumber(arg.to_string()))
}

fn server_id(arg: Option<&str>, what: &'static str) -> Result<ServerId, ParseError> {
    number(arg, what).map(ServerId)
}
