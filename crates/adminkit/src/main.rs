mod cli;
mod commands;
mod config;
mod error;
mod hooks;
mod output;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::hooks::ConsoleHooks;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(mut cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a server connection
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "adminkit", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let cfg = config::load_config()?;
            cli.global.output = Some(config::output_format(&cli.global, &cfg));

            let client_config = config::resolve_client_config(&cli.global, &cfg)?;
            let login_url = client_config.login_url.clone();
            let hooks = Arc::new(ConsoleHooks::new(
                output::should_color(&cli.global.color),
                cli.global.quiet,
                login_url.clone(),
            ));
            let client = client_config.connect(hooks)?;

            tracing::debug!(command = ?cmd, server = %client.base_url(), "dispatching command");
            let profile = config::active_profile_name(&cli.global, &cfg);
            commands::dispatch(cmd, &client, &cli.global, cfg.defaults.page_size)
                .await
                .map_err(|e| e.in_profile(&profile, login_url.as_deref()))
        }
    }
}
