//! bmesh-export - EXT_bmesh_encoding converter
//!
//! Exports OBJ polygon meshes to GLB with full half-edge topology, imports
//! the topology back to OBJ, and prints what a GLB carries.

use anyhow::Result;
use bmesh_codec::AnchorStrategy;
use bmesh_export::{config, export_obj, import_glb, inspect_glb};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bmesh-export")]
#[command(about = "OBJ <-> GLB converter carrying EXT_bmesh_encoding topology")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export an OBJ mesh to GLB
    Export {
        /// Input OBJ file
        input: PathBuf,

        /// Output .glb file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Path to bmesh.toml (default: ./bmesh.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write every edge as manifold-unknown
        #[arg(long)]
        no_manifold: bool,

        /// Fan anchor strategy (overrides config)
        #[arg(long, value_enum)]
        anchor: Option<Anchor>,
    },

    /// Import EXT_bmesh_encoding topology from a GLB into OBJ
    Import {
        /// Input .glb file
        input: PathBuf,

        /// Output .obj file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the topology a GLB carries
    Inspect {
        /// Input .glb file
        input: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Anchor {
    First,
    Robust,
}

impl From<Anchor> for AnchorStrategy {
    fn from(anchor: Anchor) -> Self {
        match anchor {
            Anchor::First => AnchorStrategy::First,
            Anchor::Robust => AnchorStrategy::Robust,
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            input,
            output,
            config,
            no_manifold,
            anchor,
        } => {
            let mut export_config = config::resolve_config(config.as_deref())?;
            if no_manifold {
                export_config.encode.preserve_manifold_info = false;
            }
            if let Some(anchor) = anchor {
                export_config.fan.anchor = anchor.into();
            }

            let output = output.unwrap_or_else(|| input.with_extension("glb"));
            tracing::info!("Converting {:?} -> {:?}", input, output);
            export_obj(&input, &output, &export_config)?;
            tracing::info!("Done!");
        }

        Commands::Import { input, output } => {
            let output = output.unwrap_or_else(|| input.with_extension("obj"));
            tracing::info!("Converting {:?} -> {:?}", input, output);
            if import_glb(&input, &output)? {
                tracing::info!("Done!");
            }
        }

        Commands::Inspect { input } => {
            let report = inspect_glb(&input)?;
            println!("{}", report);
        }
    }

    Ok(())
}
