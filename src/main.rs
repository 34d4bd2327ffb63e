//! Tiller CLI - steer AI agent behavior profiles and feature gates.

use clap::Parser;
use std::process;
use std::time::Instant;

use tiller::cli::{Cli, Commands, ControlCommands, FeatureCommands, ProfileCommands};
use tiller::commands::{self, Output};
use tiller::control::SystemControl;
use tiller::store::ConfigStore;
use tiller::{audit, Error};

fn main() {
    let cli = Cli::parse();
    let human = cli.human_readable;

    let store = match ConfigStore::resolve(cli.control_file) {
        Ok(store) => store,
        Err(e) => fail(&e, human),
    };

    let (cmd_name, args_json, mutating) = commands::describe_command(&cli.command);

    let start = Instant::now();
    let system = SystemControl::new(store.clone());
    let result = run_command(&system, cli.command);
    let duration = start.elapsed().as_millis() as u64;

    let success = result.succeeded();

    // Only state-changing invocations are audited
    if mutating {
        let error = if success {
            None
        } else {
            extract_error(result.as_ref())
        };
        audit::log_command(&store, &cmd_name, args_json, success, error, duration);
    }

    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }

    if !success {
        process::exit(1);
    }
}

fn run_command(system: &SystemControl, command: Commands) -> Box<dyn Output> {
    match command {
        Commands::Profile { command } => match command {
            ProfileCommands::Get { profile_type } => commands::profile_get(system, &profile_type),
            ProfileCommands::Set { profile_type, name } => {
                commands::profile_set(system, &profile_type, &name)
            }
            ProfileCommands::State { profile_type } => {
                commands::profile_state(system, &profile_type)
            }
            ProfileCommands::Types => commands::profile_types(),
        },
        Commands::Feature { command } => match command {
            FeatureCommands::Enable { profile_type, name } => {
                commands::feature_enable(system, &profile_type, &name)
            }
            FeatureCommands::Disable { profile_type, name } => {
                commands::feature_disable(system, &profile_type, &name)
            }
            FeatureCommands::Set { name, state } => commands::feature_set(system, &name, state),
            FeatureCommands::Check { name } => commands::feature_check(system, &name),
            FeatureCommands::Config { name } => commands::feature_config(system, &name),
            FeatureCommands::List => commands::feature_list(system),
        },
        Commands::Control { command } => match command {
            ControlCommands::Check { name } => commands::control_check(system, &name),
        },
        Commands::Status => commands::status(system),
        Commands::Summary => commands::summary(system),
        Commands::Override => commands::override_status(system),
    }
}

/// Pull the error field back out of a failed result for the audit record.
fn extract_error(result: &dyn Output) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(&result.to_json())
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(serde_json::Value::as_str)
                .map(String::from)
        })
}

fn fail(error: &Error, human: bool) -> ! {
    if human {
        eprintln!("Error: {}", error);
    } else {
        eprintln!("{}", serde_json::json!({ "error": error.to_string() }));
    }
    process::exit(1);
}
