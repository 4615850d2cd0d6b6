mod commands;
mod io;

use anyhow::Result;
use blockdoc_config::{Config, OutputFormat};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::path::PathBuf;
use std::process;

use commands::{NewBlock, Rendered};

#[derive(Parser)]
#[command(name = "blockdoc", version, about = "Render and edit BlockDoc documents")]
struct Cli {
    /// Config file to use instead of ~/.config/blockdoc/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a document to HTML or Markdown
    Render {
        file: PathBuf,

        /// Output format (defaults to the configured one)
        #[arg(short, long, value_enum)]
        format: Option<Format>,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a document against the article schema
    Validate { file: PathBuf },

    /// List blocks as position, id and type
    Blocks { file: PathBuf },

    /// Create an empty document
    New {
        title: String,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Add a block and write the document back
    Add {
        file: PathBuf,

        #[arg(short = 't', long = "type")]
        block_type: String,

        /// Block id (generated when omitted)
        #[arg(long)]
        id: Option<String>,

        #[arg(short, long)]
        content: Option<String>,

        /// Extra field as key=value; JSON values are parsed. Repeatable.
        #[arg(short, long = "field", value_parser = commands::parse_field)]
        fields: Vec<(String, Value)>,

        /// Insert at this position instead of appending (negative counts from the end)
        #[arg(short, long, allow_negative_numbers = true)]
        position: Option<isize>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Html,
    Markdown,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Html => OutputFormat::Html,
            Format::Markdown => OutputFormat::Markdown,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from_path(&path)?
            .ok_or_else(|| anyhow::anyhow!("Config file {} not found", path.display()))?,
        None => Config::load_or_default()?,
    };
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config)?;

    match cli.command {
        Command::Render {
            file,
            format,
            output,
        } => match commands::render(&file, format.map(Into::into), output, &config)? {
            Rendered::Stdout(text) => print!("{text}"),
            Rendered::File(path) => eprintln!("Wrote {}", path.display()),
        },
        Command::Validate { file } => {
            commands::validate(&file)?;
            println!("{} is valid", file.display());
        }
        Command::Blocks { file } => print!("{}", commands::list_blocks(&file, &config)?),
        Command::New { title, output } => {
            commands::new_document(&title, &output)?;
            println!("Created {}", output.display());
        }
        Command::Add {
            file,
            block_type,
            id,
            content,
            fields,
            position,
        } => {
            let block = NewBlock {
                block_type,
                id,
                content,
                fields,
                position,
            };
            let id = commands::add_block(&file, block, &config)?;
            println!("{id}");
        }
    }

    Ok(())
}
