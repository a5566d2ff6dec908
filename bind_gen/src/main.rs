use bind_gen::cmds;
use bind_gen::cmds::layout::LayoutFormat;
use bind_gen::codegen::OUTPUT_DIR;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "bind-gen")]
#[command(about = "Static Rust binding generator for native structs, functions and operators", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /* Render proxy types, proxy functions and shims into one module */
    Render {
        /* Declaration YAML files, one per parsed header */
        #[arg(short = 'd', long = "decls", value_name = "FILE", required = true)]
        decl_files: Vec<PathBuf>,

        /* Type mapping YAML file */
        #[arg(short = 'm', long = "mapping", value_name = "FILE")]
        mapping_file: PathBuf,

        /* Optional render configuration YAML file */
        #[arg(short = 'c', long = "config", value_name = "FILE")]
        config_file: Option<PathBuf>,

        /* Output directory for generated code */
        #[arg(short = 'o', long = "output", value_name = "DIR", default_value = OUTPUT_DIR)]
        output_dir: PathBuf,

        /* Base name of the generated files */
        #[arg(long = "module", value_name = "NAME", default_value = "bindings")]
        module_name: String,

        /* Enable verbose output */
        #[arg(short = 'v', long = "verbose")]
        verbose: bool,
    },

    /* Print the computed native layout of every declared struct */
    Layout {
        #[arg(short = 'd', long = "decls", value_name = "FILE", required = true)]
        decl_files: Vec<PathBuf>,

        #[arg(short = 'm', long = "mapping", value_name = "FILE")]
        mapping_file: PathBuf,

        #[arg(long = "format", value_enum, default_value = "json")]
        format: LayoutFormat,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            decl_files,
            mapping_file,
            config_file,
            output_dir,
            module_name,
            verbose,
        } => {
            cmds::render::run(cmds::render::RenderOptions {
                decl_files,
                mapping_file,
                config_file,
                output_dir,
                module_name,
                verbose,
            })?;
        }

        Commands::Layout {
            decl_files,
            mapping_file,
            format,
        } => {
            cmds::layout::run(decl_files, mapping_file, format)?;
        }
    }

    Ok(())
}
