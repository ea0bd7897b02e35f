// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::rt::System;
use actix_web::{App, HttpServer, middleware::Logger, web};
use log::info;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use textplugin::app_state::AppState;
use textplugin::config::{Config, ValidatedConfig};
use textplugin::fragments::{FragmentStore, MemoryFragmentStore};
use textplugin::{admin, logging};

const HELP_TEXT: &str = "\
Usage: textplugin [-C <root>]

Serves the text fragment editor endpoints.

Options:
  -C <root>   Runtime directory holding config.yaml (default: current directory)
  -h, --help  Show this help
";

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

fn run() -> i32 {
    let parsed_args = match parse_args() {
        Ok(args) => args,
        Err(error) => {
            eprintln!("❌ Invalid command line arguments: {}", error);
            eprintln!("❌ Use -C <root> to set the runtime directory.");
            return 1;
        }
    };

    if parsed_args.help {
        print!("{}", HELP_TEXT);
        return 0;
    }

    let validated_config = match Config::load_and_validate(&parsed_args.runtime_root) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("❌ {}", error);
            eprintln!("❌ Application cannot start with invalid configuration.");
            return 1;
        }
    };

    match System::new().block_on(serve(validated_config)) {
        Ok(()) => 0,
        Err(error) => {
            eprintln!("❌ Server error: {}", error);
            1
        }
    }
}

async fn serve(validated_config: ValidatedConfig) -> std::io::Result<()> {
    logging::init(&validated_config.logging).map_err(|error| {
        eprintln!("❌ Failed to initialize logger: {}", error);
        std::io::Error::other(error.to_string())
    })?;

    let store = open_store(validated_config.snapshot_path.as_deref())?;
    let app_state = AppState::new(&validated_config, store)
        .map_err(|error| std::io::Error::other(error.to_string()))?;
    let app_state = web::Data::new(app_state);

    log_startup_info(&validated_config);

    let admin_path = validated_config.admin.path.clone();
    let workers = validated_config.server.workers;
    let address = (validated_config.server.host.clone(), validated_config.server.port);

    HttpServer::new(move || {
        let admin_path = admin_path.clone();
        App::new()
            .app_data(app_state.clone())
            .wrap(Logger::new(r#"%a "%r" %s %b %T"#))
            .configure(move |cfg| admin::configure(cfg, &admin_path))
    })
    .workers(workers)
    .bind(address)?
    .run()
    .await
}

fn open_store(snapshot_path: Option<&Path>) -> std::io::Result<Arc<dyn FragmentStore>> {
    let Some(path) = snapshot_path else {
        info!("No snapshot file configured; fragments live in memory only");
        return Ok(Arc::new(MemoryFragmentStore::new()));
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = MemoryFragmentStore::with_snapshot(path.to_path_buf())
        .map_err(|error| std::io::Error::other(error.to_string()))?;
    info!("Fragment snapshot: {}", path.display());
    Ok(Arc::new(store))
}

fn log_startup_info(config: &ValidatedConfig) {
    info!("Starting textplugin {}", env!("CARGO_PKG_VERSION"));
    info!("Workers: {}", config.server.workers);
    info!(
        "Text editor endpoints at: http://{}:{}{}/text",
        config.server.host, config.server.port, config.admin.path
    );
    if let Ok(current_dir) = std::env::current_dir() {
        info!("Working directory: {}", current_dir.display());
    }
}

struct ParsedArgs {
    runtime_root: PathBuf,
    help: bool,
}

fn parse_args() -> Result<ParsedArgs, String> {
    parse_args_from(std::env::args().skip(1))
}

fn parse_args_from<I>(args: I) -> Result<ParsedArgs, String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut runtime_root = PathBuf::from(".");
    let mut help = false;

    while let Some(arg) = args.next() {
        if arg == "--" {
            continue;
        } else if arg == "-C" {
            let value = args
                .next()
                .ok_or_else(|| "Missing value for -C".to_string())?;
            runtime_root = PathBuf::from(value);
        } else if is_help_flag(&arg) || arg.eq_ignore_ascii_case("help") {
            help = true;
        } else {
            return Err(format!("Unexpected argument '{}'", arg));
        }
    }

    let runtime_root = make_runtime_root_absolute(runtime_root)?;
    Ok(ParsedArgs { runtime_root, help })
}

fn is_help_flag(arg: &str) -> bool {
    arg == "-h" || arg == "--help"
}

fn make_runtime_root_absolute(runtime_root: PathBuf) -> Result<PathBuf, String> {
    if runtime_root.is_absolute() {
        return Ok(runtime_root);
    }

    let current_dir = std::env::current_dir()
        .map_err(|error| format!("Failed to resolve current directory: {}", error))?;
    Ok(current_dir.join(runtime_root))
}

#[cfg(test)]
mod tests {
    use super::{open_store, parse_args_from};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn parse_args_defaults_to_current_directory() {
        let parsed = parse_args_from(Vec::new()).expect("parse args");
        assert!(!parsed.help);
        assert!(parsed.runtime_root.is_absolute());
    }

    #[test]
    fn parse_args_accepts_runtime_root() {
        let parsed = parse_args_from(args(&["-C", "/tmp/site"])).expect("parse args");
        assert_eq!(parsed.runtime_root, std::path::PathBuf::from("/tmp/site"));
    }

    #[test]
    fn parse_args_rejects_missing_root_value() {
        assert!(parse_args_from(args(&["-C"])).is_err());
    }

    #[test]
    fn parse_args_accepts_help_flag() {
        assert!(parse_args_from(args(&["--help"])).expect("parse").help);
        assert!(parse_args_from(args(&["-C", "/tmp", "help"])).expect("parse").help);
    }

    #[test]
    fn parse_args_rejects_unknown_arguments() {
        assert!(parse_args_from(args(&["serve"])).is_err());
    }

    #[test]
    fn open_store_creates_snapshot_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state/fragments.yaml");
        open_store(Some(path.as_path())).expect("store");
        assert!(dir.path().join("state").is_dir());
    }
}
