//! CLI command handling
//!
//! Dispatches CLI commands and formats their output.

use colored::Colorize;
use std::path::Path;

use crate::commands::{Commands, CreateCommands, InvokeCommands};
use crate::common::config::Config;
use crate::common::paths::display_path;
use crate::common::Result;
use crate::scaffold;
use crate::service::{NewFunction, ServiceConfig};
use crate::testing::TestSession;

/// Dispatch a CLI command, returning the process exit code
pub async fn dispatch(command: Commands, service_dir: &Path) -> Result<i32> {
    match command {
        Commands::Create(create) => {
            create_command(create, service_dir)?;
            Ok(0)
        }
        Commands::Invoke(invoke) => invoke_command(invoke, service_dir).await,
    }
}

fn create_command(command: CreateCommands, service_dir: &Path) -> Result<()> {
    match command {
        CreateCommands::Test { function, path } => {
            let service = ServiceConfig::load(service_dir)?;
            create_test(&service, &function, path.as_deref())
        }

        CreateCommands::Function {
            function,
            handler,
            path,
            http_event,
        } => {
            println!("Generating function...");
            let created = scaffold::create_function(
                service_dir,
                &NewFunction {
                    name: function.clone(),
                    handler,
                    http_events: http_event,
                },
            )?;
            let handler_file = created
                .handler_file
                .strip_prefix(service_dir)
                .unwrap_or(&created.handler_file);
            println!(
                "{} Created function file {}",
                "✓".green(),
                display_path(handler_file)
            );

            // Reload so the new function is visible
            let service = ServiceConfig::load(service_dir)?;
            create_test(&service, &function, path.as_deref())
        }
    }
}

fn create_test(service: &ServiceConfig, function: &str, path: Option<&str>) -> Result<()> {
    let relative = scaffold::create_test(service, function, path)?;
    println!("serverless-tdd: created {}", display_path(&relative));
    Ok(())
}

async fn invoke_command(command: InvokeCommands, service_dir: &Path) -> Result<i32> {
    let config = Config::load()?;
    let mut session = TestSession::new(service_dir, command.into_options(), config)?;
    let outcome = session.run().await?;
    Ok(outcome.exit_code)
}
