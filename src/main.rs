use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tour_gen::pipeline::{self, BuildOptions};
use tour_gen::{config, output};
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    if env!("TOUR_GEN_ON_RELEASE_TAG") == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("TOUR_GEN_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "tour-gen")]
#[command(about = "Build a single-page real estate tour from a listing folder")]
#[command(long_about = "\
Build a single-page real estate tour from a listing folder

The listing folder is the data source. listing.json describes the property,
photos/ holds the gallery, and subfolders of photos/ become filter categories.

Listing structure:

  listing/
  ├── listing.json               # Property, agent, SEO, theme (required)
  ├── config.toml                # Image sizes and quality (optional)
  ├── hero.jpg                   # Hero image (optional, else first photo)
  ├── agent.jpg                  # Agent portrait (optional)
  ├── photos/
  │   ├── 01.jpg                 # Uncategorized photos come first
  │   ├── 010-exterior/          # Category folder (number sets order)
  │   │   └── front.jpg
  │   └── 020-kitchen/
  │       └── island.png         # PNG transparency is flattened on white
  ├── aerials/                   # Copied as-is when media.has_aerials
  └── floorplan/                 # Copied as-is when media.has_floorplan

The build writes optimized JPEGs and listing-model.json to the output
directory. The previous output is only replaced once the new build succeeds.

Run 'tour-gen gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Optimize images and write the listing model
    Build {
        /// Listing directory containing listing.json
        #[arg(long, default_value = "listing")]
        input: PathBuf,
        /// Output directory (replaced atomically on success)
        #[arg(long, default_value = "dist")]
        output: PathBuf,
        /// Disable the encode cache and re-encode every image
        #[arg(long)]
        no_cache: bool,
    },
    /// Validate a listing and show what a build would include
    Check {
        /// Listing directory containing listing.json
        #[arg(long, default_value = "listing")]
        input: PathBuf,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

/// Route library `tracing` events to stderr. `RUST_LOG` controls verbosity.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    // Only fails if a subscriber is already installed.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), pipeline::BuildError> {
    match command {
        Command::Build {
            input,
            output: out_dir,
            no_cache,
        } => {
            let options = BuildOptions {
                input,
                output: out_dir,
                use_cache: !no_cache,
            };
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = pipeline::build(&options, Some(tx));
            // The sender is gone once build returns, so the printer drains and exits.
            let _ = printer.join();

            let report = result?;
            output::print_build_summary(&report);
            output::print_warnings(&report.warnings);
        }
        Command::Check { input } => {
            let report = pipeline::check(&input)?;
            output::print_check_output(&report);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }
    Ok(())
}
