use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use inkdown_editor_core::EditorConfig;
use inkdown_export::host::host_document;
use inkdown_renderer::{RenderPipeline, ThemeId};

#[derive(Parser)]
#[command(version, about = "inkdown - markdown authoring and export", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a markdown file to an HTML fragment
    Render {
        /// Path to the markdown source
        source: PathBuf,

        /// Output path; stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Produce a self-contained, print-ready HTML document
    Export {
        /// Path to the markdown source
        source: PathBuf,

        /// Output path; defaults to the source with an .html extension
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Theme name (default, academic)
        #[arg(long)]
        theme: Option<String>,

        /// Path to an editor config file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render { source, output } => {
            let text = fs::read_to_string(&source).into_diagnostic()?;
            tracing::debug!(source = %source.display(), bytes = text.len(), "rendering");
            let pipeline = RenderPipeline::new();
            let markup = pipeline.render(&text);
            match output {
                Some(path) => {
                    fs::write(&path, markup).into_diagnostic()?;
                    println!("Rendered to: {}", path.display());
                }
                None => println!("{markup}"),
            }
        }
        Commands::Export {
            source,
            output,
            theme,
            config,
        } => {
            let config = match config {
                Some(path) => EditorConfig::load(&path)?,
                None => EditorConfig::default(),
            };
            let theme = theme
                .map(|name| ThemeId::parse(&name))
                .unwrap_or_else(|| config.theme());

            let text = fs::read_to_string(&source).into_diagnostic()?;
            tracing::debug!(source = %source.display(), theme = theme.as_str(), "exporting");
            let pipeline = RenderPipeline::new();
            let markup = pipeline.render(&text);
            let page = host_document(&markup, theme);

            let destination = output.unwrap_or_else(|| source.with_extension("html"));
            fs::write(&destination, page).into_diagnostic()?;
            println!(
                "Exported with {} theme to: {}",
                theme.as_str(),
                destination.display()
            );
        }
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}
