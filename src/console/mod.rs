//! Operator console.
//!
//! Maps text commands onto router operations and renders their results.
//! The binary feeds it from a script file or stdin.

pub mod command;

use thiserror::Error;

pub use command::{strip_comment, Command, ParseError, MAX_SCALE_UP};

use crate::config::PoolConfig;
use crate::load_balancer::error::RouterError;
use crate::load_balancer::router::{Admission, Router};
use crate::load_balancer::server::{ServerId, ServerSpec};

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Router(#[from] RouterError),

    #[error("failed to render status: {0}")]
    Render(#[from] serde_json::Error),
}

/// Apply one command and return the text to show the operator.
pub fn execute(router: &mut Router, command: Command, pool: &PoolConfig) -> Result<String, ConsoleError> {
    let output = match command {
        Command::Route { policy, session } => {
            let policy = policy.unwrap_or(router.default_policy());
            let assignment = router.route(policy, session.as_deref())?;
            match assignment.admission {
                Admission::Accepted => format!(
                    "Request assigned to Server {}. Current load: {}/{}",
                    assignment.server, assignment.load, assignment.capacity
                ),
                Admission::Rejected => format!(
                    "Server {} is overloaded. Request could not be assigned.",
                    assignment.server
                ),
            }
        }
        Command::Release(id) => {
            if router.server(id).is_none() {
                format!("Server {} not found", id)
            } else if router.release(id) {
                let (load, capacity) = router
                    .server(id)
                    .map_or((0, 0), |s| (s.load(), s.capacity()));
                format!("Request removed from Server {}. Current load: {}/{}", id, load, capacity)
            } else {
                "Server has no requests to remove".to_string()
            }
        }
        Command::ScaleUp(count) => {
            if count > MAX_SCALE_UP {
                return Err(ParseError::ScaleUpTooLarge(count).into());
            }
            let specs: Vec<ServerSpec> = if count == 0 {
                Vec::new()
            } else {
                let first = router.next_server_id()?.0;
                let last = first
                    .checked_add(count - 1)
                    .ok_or(RouterError::IdsExhausted)?;
                (first..=last)
                    .map(|id| {
                        ServerSpec::generate(
                            ServerId(id),
                            pool.default_capacity,
                            pool.latency_range(),
                            router.rng(),
                        )
                    })
                    .collect()
            };
            let added = router.scale_up(&specs)?;
            format!("Added servers: {}", join_ids(&added))
        }
        Command::ScaleDown(ids) => {
            let removed = router.scale_down(&ids);
            format!("Removed servers: {}", join_ids(&removed))
        }
        Command::Fail(id) => health(router, id, false),
        Command::Recover(id) => health(router, id, true),
        Command::Logs => router
            .events()
            .entries()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n"),
        Command::Status => serde_json::to_string_pretty(&router.snapshot())?,
        Command::Exit => String::new(),
    };
    Ok(output)
}

fn health(router: &mut Router, id: ServerId, active: bool) -> String {
    match (router.set_health(id, active), active) {
        (false, _) => format!("Server {} not found", id),
        (true, false) => format!("Server {} is down.", id),
        (true, true) => format!("Server {} is back online.", id),
    }
}

fn join_ids(ids: &[ServerId]) -> String {
    if ids.is_empty() {
        return "none".to_string();
    }
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouterConfig;

    fn router() -> (Router, PoolConfig) {
        let mut config = RouterConfig::default();
        config.routing.seed = Some(11);
        (Router::from_config(&config).unwrap(), config.pool)
    }

    fn run(router: &mut Router, pool: &PoolConfig, line: &str) -> String {
        execute(router, line.parse().unwrap(), pool).unwrap()
    }

    #[test]
    fn test_menu_session() {
        let (mut router, pool) = router();

        assert_eq!(
            run(&mut router, &pool, "route least"),
            "Request assigned to Server 1. Current load: 1/5"
        );
        assert_eq!(
            run(&mut router, &pool, "release 1"),
            "Request removed from Server 1. Current load: 0/5"
        );
        assert_eq!(run(&mut router, &pool, "release 1"), "Server has no requests to remove");
        assert_eq!(run(&mut router, &pool, "release 8"), "Server 8 not found");
        assert_eq!(run(&mut router, &pool, "fail 2"), "Server 2 is down.");
        assert_eq!(run(&mut router, &pool, "recover 2"), "Server 2 is back online.");
    }

    #[test]
    fn test_scale_commands() {
        let (mut router, pool) = router();

        assert_eq!(run(&mut router, &pool, "scale-up 2"), "Added servers: 4, 5");
        assert_eq!(router.len(), 5);
        for server in router.servers() {
            assert!(pool.latency_range().contains(&server.latency()));
        }

        assert_eq!(run(&mut router, &pool, "scale-down 4,9"), "Removed servers: 4");
        assert_eq!(run(&mut router, &pool, "scale-up 1"), "Added servers: 6");
    }

    #[test]
    fn test_scale_up_at_id_limit() {
        let pool = PoolConfig::default();
        let mut router = Router::new(&[ServerSpec::new(ServerId(u32::MAX - 1), 5, 10)]).unwrap();

        let err = execute(&mut router, Command::ScaleUp(2), &pool).unwrap_err();
        assert!(matches!(err, ConsoleError::Router(RouterError::IdsExhausted)));
        assert_eq!(router.len(), 1);

        assert_eq!(
            run(&mut router, &pool, "scale-up 1"),
            format!("Added servers: {}", u32::MAX)
        );
        let err = execute(&mut router, Command::ScaleUp(1), &pool).unwrap_err();
        assert!(matches!(err, ConsoleError::Router(RouterError::IdsExhausted)));
    }

    #[test]
    fn test_scale_up_rejects_oversized_batch() {
        let (mut router, pool) = router();
        let err = execute(&mut router, Command::ScaleUp(u32::MAX), &pool).unwrap_err();
        assert!(matches!(
            err,
            ConsoleError::Parse(ParseError::ScaleUpTooLarge(u32::MAX))
        ));
        assert_eq!(router.len(), 3);
    }

    #[test]
    fn test_logs_and_status() {
        let (mut router, pool) = router();
        run(&mut router, &pool, "fail 3");

        let logs = run(&mut router, &pool, "logs");
        assert!(logs.starts_with('['));
        assert!(logs.ends_with("] Server 3 is down."));

        let status: serde_json::Value =
            serde_json::from_str(&run(&mut router, &pool, "status")).unwrap();
        assert_eq!(status[2]["health"], "inactive");
    }

    #[test]
    fn test_router_errors_surface() {
        let (mut router, pool) = router();
        let err = execute(&mut router, "route hash".parse().unwrap(), &pool).unwrap_err();
        assert!(matches!(err, ConsoleError::Router(RouterError::MissingSessionId)));
    }
}
