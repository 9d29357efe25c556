use clap::{Args, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use brine_tl_compiler::{compile_registry_to_rust, compile_sources, CompileOptions, CompileOutput, SchemaSource};
use brine_tl_compiler::error::TlError;
use brine_tl::registry_to_json;

#[derive(Parser)]
#[command(name = "btl")]
#[command(about = "Check, strip, dump, or generate Rust from TL schemas", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SchemaArgs {
    /// Input `.tl` files, compiled together into one registry
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Keep declarations without a `#id` abstract instead of deriving one
    #[arg(long)]
    abstract_missing_ids: bool,
}

impl SchemaArgs {
    fn compile(&self) -> Result<CompileOutput, TlError> {
        let sources = self
            .inputs
            .iter()
            .map(SchemaSource::read)
            .collect::<Result<Vec<_>, _>>()?;
        let options = CompileOptions {
            derive_missing_ids: !self.abstract_missing_ids,
        };
        debug!(sources = sources.len(), ?options, "compiling schema sources");
        compile_sources(&sources, &options)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the schemas and report definition counts and id warnings
    Check {
        #[command(flatten)]
        schema: SchemaArgs,
    },

    /// Print a `.tl` file with comments and blank lines removed
    Strip {
        /// Input `.tl` file
        input: PathBuf,

        /// Output file (if omitted, prints to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the compiled registry as JSON
    Dump {
        #[command(flatten)]
        schema: SchemaArgs,

        /// Output `.json` file (if omitted, prints to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate Rust code from the compiled registry
    GenRust {
        #[command(flatten)]
        schema: SchemaArgs,

        /// Output `.rs` file (if omitted, prints to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<(), TlError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Check { schema } => {
            let CompileOutput { registry, warnings } = schema.compile()?;
            let abstract_count = registry.iter().filter(|d| d.is_abstract()).count();
            println!(
                "{} constructors, {} methods, {} abstract{}",
                registry.constructors().count(),
                registry.methods().count(),
                abstract_count,
                registry.layer().map(|l| format!(", layer {}", l)).unwrap_or_default()
            );
            for warning in &warnings {
                println!("warning: {}", warning);
            }
            Ok(())
        }

        Commands::Strip { input, output } => {
            let source = SchemaSource::read(input)?;
            let stripped = source.stripped();
            if let Some(out_path) = output {
                fs::write(out_path, stripped + "\n")?;
                println!("Stripped {} → {}", input.display(), out_path.display());
            } else {
                println!("{}", stripped);
            }
            Ok(())
        }

        Commands::Dump { schema, output } => {
            let compiled = schema.compile()?;
            let json = registry_to_json(&compiled.registry)?;
            if let Some(out_path) = output {
                fs::write(out_path, json + "\n")?;
                println!("Registry written to {}", out_path.display());
            } else {
                println!("{}", json);
            }
            Ok(())
        }

        Commands::GenRust { schema, output } => {
            let compiled = schema.compile()?;
            let rust_code = compile_registry_to_rust(&compiled.registry);
            if let Some(out_path) = output {
                fs::write(out_path, &rust_code)?;
                println!("Generated Rust code written to {}", out_path.display());
            } else {
                println!("{}", rust_code);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_takes_a_positional_input() {
        let cli = Cli::try_parse_from(["btl", "strip", "api.tl", "-o", "api.stripped.tl"]).unwrap();
        match cli.command {
            Commands::Strip { input, output } => {
                assert_eq!(input, PathBuf::from("api.tl"));
                assert_eq!(output, Some(PathBuf::from("api.stripped.tl")));
            }
            _ => panic!("expected the strip subcommand"),
        }
        assert!(Cli::try_parse_from(["btl", "strip"]).is_err());
    }
}
