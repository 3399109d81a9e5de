//! Reference input injector, entry point.
//!
//! Listens for frames forwarded by the gateway and replays them on a virtual
//! device.  Run one process per role:
//!
//! ```text
//! relay-injector --role keymouse          # UDP 127.0.0.1:9999
//! relay-injector --role gamepad           # UDP 127.0.0.1:9998
//! relay-injector --role gamepad --listen 127.0.0.1:7000
//! ```
//!
//! | Variable                | Meaning                         |
//! |-------------------------|---------------------------------|
//! | `RELAY_INJECTOR_ROLE`   | `keymouse` or `gamepad`         |
//! | `RELAY_INJECTOR_LISTEN` | UDP address, overrides the role |

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use relay_injector::application::{InjectInputUseCase, InjectorRole, InputInjector};
use relay_injector::infrastructure::{bind_listener, run_listener, LoggingInjector};

// ── CLI argument definitions ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RoleArg {
    Keymouse,
    Gamepad,
}

impl From<RoleArg> for InjectorRole {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Keymouse => InjectorRole::KeyMouse,
            RoleArg::Gamepad => InjectorRole::Gamepad,
        }
    }
}

/// Reference input injector.
#[derive(Debug, Parser)]
#[command(
    name = "relay-injector",
    about = "Replays relayed keyboard, mouse, or gamepad frames",
    version
)]
struct Cli {
    /// Device family this process owns.
    #[arg(long, value_enum, default_value = "keymouse", env = "RELAY_INJECTOR_ROLE")]
    role: RoleArg,

    /// UDP address to listen on.  Defaults to the role's loopback port.
    #[arg(long, env = "RELAY_INJECTOR_LISTEN")]
    listen: Option<SocketAddr>,
}

impl Cli {
    fn listen_addr(&self) -> SocketAddr {
        self.listen
            .unwrap_or_else(|| InjectorRole::from(self.role).default_listen_addr())
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let role = InjectorRole::from(cli.role);
    let addr = cli.listen_addr();

    let socket = bind_listener(addr)
        .await
        .with_context(|| format!("cannot start the {role} injector"))?;

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => tracing::error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    let injector: Arc<dyn InputInjector> = Arc::new(LoggingInjector::new());
    let use_case = InjectInputUseCase::new(injector, role);
    run_listener(socket, use_case, running).await;

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_to_keymouse_on_9999() {
        let cli = Cli::parse_from(["relay-injector"]);
        assert_eq!(cli.role, RoleArg::Keymouse);
        assert_eq!(cli.listen_addr().to_string(), "127.0.0.1:9999");
    }

    #[test]
    fn test_cli_gamepad_role_uses_9998() {
        let cli = Cli::parse_from(["relay-injector", "--role", "gamepad"]);
        assert_eq!(cli.listen_addr().to_string(), "127.0.0.1:9998");
    }

    #[test]
    fn test_cli_listen_overrides_role_port() {
        let cli = Cli::parse_from([
            "relay-injector",
            "--role",
            "gamepad",
            "--listen",
            "127.0.0.1:7000",
        ]);
        assert_eq!(cli.listen_addr().port(), 7000);
        assert_eq!(InjectorRole::from(cli.role), InjectorRole::Gamepad);
    }

    #[test]
    fn test_cli_rejects_unknown_role() {
        assert!(Cli::try_parse_from(["relay-injector", "--role", "joystick"]).is_err());
    }
}
