//! worldtext CLI: extract translatable text from a world export, or apply a finished mapping to it.

use clap::{Args, Parser, Subcommand};
use std::{path::PathBuf, process::ExitCode};
use worldtext::{ReadMode, ReaderBuilder, SourceFlags, WriterBuilder};

#[derive(Parser)]
#[command(name = "worldtext", version)]
#[command(about = "Extracts and re-injects translatable text in Minecraft world exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Chunks loaded per world handle
    #[arg(long, default_value_t = 1000)]
    batch_size: usize,

    /// Don't process datapack archives
    #[arg(long)]
    skip_datapacks: bool,

    /// Don't process block entities in region files
    #[arg(long)]
    skip_world: bool,
}

impl SourceArgs {
    fn flags(&self) -> SourceFlags {
        let mut flags = SourceFlags::all();
        flags.set(SourceFlags::Datapacks, !self.skip_datapacks);
        flags.set(SourceFlags::World, !self.skip_world);
        flags
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract candidate strings into a JSON text pool
    Extract {
        /// Export archive, or an already unpacked directory
        export: PathBuf,

        /// Directory the export is unpacked to
        #[arg(short, long, default_value = "workspace")]
        workspace: PathBuf,

        /// Output text pool
        #[arg(short, long, default_value = "text_pool.json")]
        output: PathBuf,

        /// Ignore existing caches and rescan everything
        #[arg(long)]
        force: bool,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Apply a mapping and package the translated export
    Apply {
        /// Export archive
        export: PathBuf,

        /// JSON object mapping source strings to translations
        #[arg(short, long)]
        mapping: PathBuf,

        /// Output archive
        #[arg(short, long)]
        output: PathBuf,

        /// File or directory copied into the package root
        #[arg(short, long)]
        attachments: Option<PathBuf>,

        /// Working directory, removed after packaging
        #[arg(short, long, default_value = "packing")]
        work_dir: PathBuf,

        #[command(flatten)]
        source: SourceArgs,
    },
}

fn run(cli: Cli) -> Result<(), worldtext::Error> {
    match cli.command {
        Commands::Extract {
            export,
            workspace,
            output,
            force,
            source,
        } => {
            let read_mode = if force {
                ReadMode::Force
            } else {
                ReadMode::Default
            };

            let pool = ReaderBuilder::new()
                .with_flags(source.flags())
                .batch_size(source.batch_size)
                .read_mode(read_mode)
                .workspace(workspace)
                .logging(true)
                .build()
                .read(export, output)?;

            println!("{} candidate strings", pool.len());
        }
        Commands::Apply {
            export,
            mapping,
            output,
            attachments,
            work_dir,
            source,
        } => {
            let mut builder = WriterBuilder::new()
                .with_flags(source.flags())
                .batch_size(source.batch_size)
                .work_dir(work_dir)
                .logging(true);

            if let Some(attachments) = attachments {
                builder = builder.attachments(attachments);
            }

            let results = builder.build().write(export, mapping, output)?;

            println!(
                "Rewrote {} datapacks ({} members changed), updated {} chunks",
                results.datapacks_rewritten,
                results.members_changed,
                results.world.chunks_changed
            );
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
