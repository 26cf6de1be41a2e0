//! Modelset CLI Binary
//!
//! Command-line interface for loading model documents and resolving references.

use clap::Parser;
use modelset::logging::init_logging;
use modelset::tooling::cli::{Cli, CliContext};
use std::process;

fn main() {
    let cli = Cli::parse();

    // Create CLI context
    let context = match CliContext::new(cli.workspace.clone(), cli.config.clone()) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }
    };

    let logging = cli.logging_config(context.config());
    if let Err(e) = init_logging(Some(&logging)) {
        eprintln!("Warning: logging disabled: {}", e);
    }

    for mapping in &cli.mappings {
        if let Err(e) = context.add_mapping(mapping) {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    }
    for metamodel in &cli.metamodels {
        if let Err(e) = context.register_metamodel(metamodel) {
            eprintln!("Error registering metamodel {}: {}", metamodel.display(), e);
            process::exit(1);
        }
    }

    // Execute command
    match context.execute(&cli.command) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
