// ABOUTME: Entry point for the nbstack binary.
// ABOUTME: Parses CLI arguments, initializes tracing, loads settings and synthesizes the stack.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use nbstack_core::export::{export_dot, export_json, export_markdown, export_yaml, synthesize};
use nbstack_core::{Environment, FrontDoorRevision, StackDefinition, StackSettings};
use nbstack_synth::AssemblyWriter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "nbstack",
    version,
    about = "Synthesize the nbconvert serverless stack into CloudFormation"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the stack assembly to a directory, or print the template
    Synth {
        #[command(flatten)]
        stack: StackArgs,
        /// Assembly output directory; prints the template to stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
        /// Template format used when printing to stdout
        #[arg(value_enum, long, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Print a Markdown summary of the stack
    Describe {
        #[command(flatten)]
        stack: StackArgs,
    },
    /// Print the resource graph in DOT
    Graph {
        #[command(flatten)]
        stack: StackArgs,
    },
}

#[derive(Args)]
struct StackArgs {
    /// Deployment environment: dev or prod (default: dev)
    #[arg(long = "env", env = "NBSTACK_ENV")]
    environment: Option<String>,
    /// Front door revision: function-url, rest-api or http-api
    #[arg(long, default_value_t = FrontDoorRevision::HttpApi)]
    front_door: FrontDoorRevision,
}

impl StackArgs {
    fn assemble(&self, settings: &StackSettings) -> anyhow::Result<StackDefinition> {
        let environment = Environment::resolve(self.environment.as_deref())?;
        StackDefinition::assemble(environment, self.front_door, settings)
            .with_context(|| format!("failed to assemble the {} stack", environment))
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("nbstack=info,nbstack_core=info,nbstack_synth=info")
        }))
        .init();

    let cli = Cli::parse();
    let settings = StackSettings::from_env().context("invalid nbstack settings")?;

    match cli.command {
        Commands::Synth { stack, out, format } => {
            let stack = stack.assemble(&settings)?;
            match out {
                Some(out_dir) => {
                    let writer = AssemblyWriter::new(out_dir.clone()).with_context(|| {
                        format!("failed to prepare output directory {}", out_dir.display())
                    })?;
                    let files = writer.write(&stack).context("failed to write assembly")?;
                    println!("{}", files.template_json.display());
                }
                None => {
                    let template = synthesize(&stack);
                    let rendered = match format {
                        OutputFormat::Json => export_json(&template)?,
                        OutputFormat::Yaml => export_yaml(&template)?,
                    };
                    print!("{}", rendered);
                }
            }
        }
        Commands::Describe { stack } => {
            let stack = stack.assemble(&settings)?;
            print!("{}", export_markdown(&stack, &synthesize(&stack)));
        }
        Commands::Graph { stack } => {
            let stack = stack.assemble(&settings)?;
            print!("{}", export_dot(&synthesize(&stack), &stack.stack_name));
        }
    }

    Ok(())
}
