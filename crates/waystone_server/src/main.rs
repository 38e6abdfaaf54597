mod commands;
mod persistence;
mod player;
mod server;
mod world;

use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use server::ServerConfig;
use waystone_portal::PortalConfig;

const USAGE: &str = "Usage: waystone_server [--world <path>] [--config <portal-config.toml>]";

struct Args {
    world_path: PathBuf,
    config_path: Option<PathBuf>,
}

/// `Ok(None)` means help was requested.
fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<Args>, String> {
    let mut parsed = Args {
        world_path: PathBuf::from("world"),
        config_path: None,
    };

    while let Some(arg) = args.next() {
        let slot = match arg.as_str() {
            "--help" | "-h" => return Ok(None),
            "--world" | "--config" => args
                .next()
                .map(PathBuf::from)
                .ok_or_else(|| format!("{arg} expects a path argument"))?,
            other => return Err(format!("unknown argument: {other}")),
        };
        if arg == "--world" {
            parsed.world_path = slot;
        } else {
            parsed.config_path = Some(slot);
        }
    }

    Ok(Some(parsed))
}

fn main() {
    let _ = tracing_subscriber::fmt().with_target(false).try_init();

    let args = match parse_args(env::args().skip(1)) {
        Ok(Some(args)) => args,
        Ok(None) => {
            println!("{USAGE}");
            return;
        }
        Err(err) => {
            eprintln!("{err}\n{USAGE}");
            std::process::exit(2);
        }
    };

    let portal_config = match &args.config_path {
        Some(path) => PortalConfig::load(path).unwrap_or_else(|err| {
            eprintln!("failed to load {}: {err}", path.display());
            std::process::exit(1);
        }),
        None => PortalConfig::default(),
    };

    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    if let Err(err) = ctrlc::set_handler(move || {
        eprintln!("\nShutdown requested, saving portals and world...");
        flag.store(false, Ordering::SeqCst);
    }) {
        eprintln!("failed to set Ctrl+C handler: {err}");
        std::process::exit(1);
    }

    let config = ServerConfig {
        world_path: args.world_path,
        portal_config,
    };
    if let Err(err) = server::run(config, running) {
        eprintln!("server failed: {err}");
        std::process::exit(1);
    }
}
