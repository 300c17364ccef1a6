use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::{debug, info};
use std::io::{BufWriter, Write};
use std::time::Instant;
use stylepack_build::Config;

#[derive(Parser)]
#[command(name = "stylepack")]
#[command(about = "Stylesheet builds with glob imports and size-routed assets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compile SCSS entry points into the output directory
    Build(Config),
}

fn main() -> Result<()> {
    env_logger::init();

    // stdio is blocked by LineWriter, use a BufWriter to reduce syscalls.
    // See https://github.com/rust-lang/rust/issues/60673
    let mut stdout = BufWriter::new(std::io::stdout());

    let cli = Cli::parse();
    debug!("Parsed CLI arguments: {:?}", cli.command);

    let start = Instant::now();

    match cli.command {
        Commands::Build(cfg) => {
            let num_threads = rayon::current_num_threads();
            info!("Running build (using {} threads)", num_threads);
            debug!("Config: root={:?}, entries={:?}", cfg.root, cfg.entries);

            let json = cfg.json;
            let result = stylepack_build::run_build(cfg)?;

            if json {
                stylepack_build::print_json(&mut stdout, &result)?;
                return Ok(());
            }

            stylepack_build::print_build_summary(&mut stdout, &result)?;
            writeln!(
                stdout,
                "\n{} Finished in {}ms on {} stylesheets (using {} threads).",
                "●".bright_blue(),
                start.elapsed().as_millis().to_string().cyan(),
                result.outputs.len().to_string().cyan(),
                num_threads.to_string().cyan()
            )?;
            stdout.flush()?;

            Ok(())
        }
    }
}
