//! ganttline CLI Application
//!
//! Turns tabular records into render-ready Gantt tasks.

// CLI binary needs to output to stdout/stderr - this is intentional
#![allow(clippy::print_stdout, clippy::print_stderr)]

use ganttline::cli::{self, Cli, CliError, Commands, EXIT_OK, exit_code_for, render_error};
use ganttline::commands::{palettes, transform};
use ganttline::tracing::{TracingConfig, init_tracing};

fn main() {
    // NOTE: tracing may not be initialized when a panic happens, so the hook
    // writes straight to stderr.
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panicked: {panic_info}");
        eprintln!("Internal error occurred. Run with RUST_LOG=debug for more information.");
    }));

    let cli = cli::parse();

    let tracing_config = TracingConfig {
        format: cli.log_format,
        level: cli.level.into(),
        filter: cli.log_filter.clone(),
    };
    if let Err(e) = init_tracing(&tracing_config) {
        eprintln!("Failed to initialize tracing: {e}");
    }

    let exit_code = match run(&cli) {
        Ok(output) => {
            print!("{output}");
            if !output.ends_with('\n') {
                println!();
            }
            EXIT_OK
        }
        Err(err) => {
            render_error(&err, cli.json);
            exit_code_for(&err)
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: &Cli) -> Result<String, CliError> {
    match &cli.command {
        Commands::Transform(args) => transform::execute_transform(args),
        Commands::Palettes => palettes::execute_palettes(cli.json),
    }
}
