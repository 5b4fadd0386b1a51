//! medgate command-line tool.
//!
//! Checks, explains and evaluates hospital access policies.
//!
//! # Quick Start
//!
//! ```bash
//! # Does the policy compile?
//! medgate check 'role == "Doctor" AND clearance >= 3'
//!
//! # Decide a request (exit code 0 = ALLOW, 2 = DENY)
//! medgate eval @sensitive-record -a role=Doctor -a clearance=4 -a resource.same_department=true
//!
//! # List the built-in policies
//! medgate policies
//! ```

mod commands;
mod style;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

/// medgate - attribute-based access control for hospital records.
#[derive(Parser)]
#[command(name = "medgate")]
#[command(version, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log engine activity (cache, audit records) to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,

    /// Directory holding medgate.toml (defaults to the current directory).
    #[arg(long, global = true, value_name = "DIR")]
    project: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for machine-readable commands.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information.
    Version,

    /// Compile a policy and print its canonical form.
    Check {
        /// Policy text, or `@name` for a built-in policy.
        policy: String,
    },

    /// Evaluate a policy against request attributes.
    ///
    /// Exits with 0 on ALLOW and 2 on DENY.
    Eval {
        /// Policy text, or `@name` for a built-in policy.
        policy: String,

        /// Attribute as `name=value`. `true`/`false` become booleans,
        /// integers become integers, quote a value to force a string.
        #[arg(short = 'a', long = "attr", value_name = "NAME=VALUE", value_parser = commands::eval::parse_attribute)]
        attributes: Vec<(String, medgate_abac::AttributeValue)>,

        /// Attributes as a flat JSON object.
        #[arg(long, value_name = "JSON", conflicts_with = "attributes")]
        json: Option<String>,

        /// Output format.
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show the token stream and expression tree of a policy.
    Explain {
        /// Policy text, or `@name` for a built-in policy.
        policy: String,
    },

    /// List the built-in hospital policies.
    Policies {
        /// Output format.
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Configuration commands.
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration after merging all sources.
    Show {
        /// Output format (text, toml, json).
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Validate configuration files.
    Validate,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    if cli.no_color {
        style::set_no_color(true);
    }

    let project = cli.project.unwrap_or_else(|| PathBuf::from("."));

    match cli.command {
        Commands::Version => {
            commands::version::run();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check { policy } => {
            commands::check::run(&project, &policy)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Eval {
            policy,
            attributes,
            json,
            format,
        } => {
            let effect = commands::eval::run(&project, &policy, attributes, json.as_deref(), format)?;
            Ok(commands::eval::exit_code(effect))
        }
        Commands::Explain { policy } => {
            commands::explain::run(&project, &policy)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Policies { format } => {
            commands::policies::run(format)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config(cmd) => {
            match cmd {
                ConfigCommands::Show { format } => commands::config::show(&project, &format)?,
                ConfigCommands::Validate => commands::config::validate(&project)?,
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
