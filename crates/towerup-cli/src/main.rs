mod commands;
mod config;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{Deployment, EXIT_CONFIG_ERROR, EXIT_FAILURE, EXIT_STORE_ERROR};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "towerup",
    version,
    about = "Deploy and tear down a BOSH director running Concourse"
)]
struct Cli {
    /// Path to the deployment file.
    #[arg(short, long, default_value = "towerup.toml", global = true)]
    config: PathBuf,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create or update the director, then apply cloud-config and upload the stemcell.
    Deploy,
    /// Delete the director.
    Destroy,
    /// Apply the cloud-config to a running director.
    CloudConfig {
        /// Print the rendered cloud-config instead of applying it.
        #[arg(long, default_value_t = false)]
        render: bool,
    },
    /// Upload the Concourse stemcell to the director.
    Stemcell {
        /// Print the stemcell URL instead of uploading it.
        #[arg(long, default_value_t = false)]
        url: bool,
    },
    /// Recreate every VM of the Concourse deployment.
    Recreate,
    /// Print the director's current locks as JSON.
    Locks,
    /// Run a bosh action against the Concourse deployment (flags after --).
    Run {
        /// The bosh action, e.g. "deploy" or "instances".
        action: String,
        /// Return once a deploy is underway instead of waiting for it.
        #[arg(long, default_value_t = false)]
        detach: bool,
        /// Extra arguments passed to bosh after the action.
        #[arg(last = true)]
        flags: Vec<String>,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("TOWERUP_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let result = match cli.command {
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        command => Deployment::load(&cli.config).and_then(|deployment| match command {
            Commands::Deploy => commands::deploy::run(&deployment),
            Commands::Destroy => commands::destroy::run(&deployment),
            Commands::CloudConfig { render } => commands::cloud_config::run(&deployment, render),
            Commands::Stemcell { url } => commands::stemcell::run(&deployment, url),
            Commands::Recreate => commands::recreate::run(&deployment),
            Commands::Locks => commands::locks::run(&deployment),
            Commands::Run {
                action,
                detach,
                flags,
            } => commands::run::run(&deployment, &action, detach, &flags),
            Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        }),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("config error:")
                || msg.starts_with("configuration error:")
                || msg.starts_with("template error:")
            {
                EXIT_CONFIG_ERROR
            } else if msg.starts_with("store error:") {
                EXIT_STORE_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
