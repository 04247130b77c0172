// Command-line entry point for the mini compiler service.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use log::{info, warn};
use mini_compiler::api::dto::JsonExporter;
use mini_compiler::api::server;
use mini_compiler::domain::language::Language;
use mini_compiler::infrastructure::config::Config;
use mini_compiler::infrastructure::{build_service, concurrency};
use mini_compiler::logger;
use mini_compiler::ports::tree_exporter::{DotExporter, TextExporter};
use mini_compiler::ports::OutputExporter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v error ... -vvvvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze one source file and print or write the result
    Analyze {
        /// Input source file path
        #[arg(short, long)]
        input: PathBuf,

        /// Source language (c, js); inferred from the extension when omitted
        #[arg(short, long)]
        lang: Option<String>,

        /// Output format (json, dot, text)
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Output file path; stdout when omitted
        #[arg(short, long)]
        output: Option<String>,

        /// Skip compiling and running the program
        #[arg(long)]
        no_run: bool,
    },
    /// Serve compile requests over line-delimited JSON
    Serve {
        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Skip compiling and running submitted programs
        #[arg(long)]
        no_run: bool,
    },
}

fn exporter_for(format: &str) -> Result<Box<dyn OutputExporter>> {
    match format {
        "json" => Ok(Box::new(JsonExporter)),
        "dot" => Ok(Box::new(DotExporter)),
        "text" => Ok(Box::new(TextExporter)),
        other => bail!("Unknown output format: {} (expected json, dot or text)", other),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::setup_logger(cli.verbose as usize)?;

    let mut config = Config::load(cli.config.as_deref())?;
    concurrency::init_thread_pool()?;

    match cli.command {
        Commands::Analyze {
            input,
            lang,
            format,
            output,
            no_run,
        } => {
            let language = match lang {
                Some(lang) => Language::from_str(&lang)
                    .with_context(|| format!("Unknown language: {}", lang))?,
                None => Language::from_path(&input).unwrap_or_default(),
            };
            let exporter = exporter_for(&format)?;
            let code = fs::read_to_string(&input)
                .with_context(|| format!("Cannot read input file: {}", input.display()))?;

            let service = build_service(&config, !no_run);
            let result = service.compile(language, Some(&code))?;
            if result.has_errors() {
                warn!("{} reported errors for {}", language.toolchain_command(), input.display());
            }

            match output {
                Some(path) => {
                    exporter
                        .export(&result, &path)
                        .with_context(|| format!("Cannot write output file: {}", path))?;
                    info!("Analysis written to {} (format: {})", path, format);
                }
                None => println!("{}", exporter.render(&result)),
            }
        }
        Commands::Serve { port, no_run } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            let service = Arc::new(build_service(&config, !no_run));
            server::start_server(&config.server, service)?;
        }
    }

    Ok(())
}
