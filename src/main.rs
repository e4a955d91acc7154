//! filenode-editor binary.
//!
//! Lists, decodes and patches tuples of a PostgreSQL heap filenode
//! directly on disk. Results go to stdout (text or `--json`), logs to
//! stderr (`RUST_LOG`, default `warn`).

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use filenode_editor::catalog::TypeCatalog;
use filenode_editor::editor::{EditorError, ErrorKind, FilenodeEditor, StagedCopy};
use filenode_editor::format::FieldText;
use filenode_editor::storage::FileStorage;
use serde::Serialize;
use thiserror::Error;

/// Inspect and edit PostgreSQL heap filenodes in place.
#[derive(Parser, Debug)]
#[command(name = "filenode-editor", version)]
struct Cli {
    /// Heap filenode to read or modify.
    #[arg(short, long)]
    filenode_path: PathBuf,

    /// Type catalog as `name,type,length,align` records separated by `;`.
    #[arg(long, conflicts_with = "datatype_file")]
    datatype_csv: Option<String>,

    /// File holding the type catalog in the same format.
    #[arg(long)]
    datatype_file: Option<PathBuf>,

    /// Write the edited filenode to this path instead of modifying it in
    /// place. Only valid with `update` and `raw-update`; must not name the
    /// input file.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List page headers and line pointers.
    List {
        /// Only this page.
        #[arg(short, long)]
        page: Option<u64>,
    },
    /// Decode one tuple.
    Read {
        #[arg(short, long)]
        page: u64,
        #[arg(short, long)]
        item: usize,
    },
    /// Replace every catalogued value of a tuple.
    Update {
        #[arg(short, long)]
        page: u64,
        #[arg(short, long)]
        item: usize,
        /// JSON array with one value per catalog attribute, e.g.
        /// `[1, "abc", null, {"hex": "00ff"}]`.
        #[arg(long)]
        values: String,
    },
    /// Overwrite tuple bytes verbatim.
    RawUpdate {
        #[arg(short, long)]
        page: u64,
        #[arg(short, long)]
        item: usize,
        /// Replacement bytes in hex.
        #[arg(long)]
        hex: String,
        /// Replace only the data after `t_hoff`, keeping the tuple header.
        #[arg(long)]
        data_only: bool,
    },
}

impl Command {
    fn writes(&self) -> bool {
        matches!(self, Command::Update { .. } | Command::RawUpdate { .. })
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error("invalid --values: {0}")]
    Values(#[source] serde_json::Error),

    #[error("invalid --hex: {0}")]
    Hex(#[source] hex::FromHexError),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot serialize output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("--output only applies to update and raw-update")]
    OutputWithoutUpdate,
}

impl CliError {
    fn kind(&self) -> ErrorKind {
        match self {
            CliError::Editor(err) => err.kind(),
            CliError::Values(_) | CliError::Hex(_) | CliError::OutputWithoutUpdate => {
                ErrorKind::InvalidValue
            }
            CliError::Io { .. } | CliError::Output(_) => ErrorKind::Storage,
        }
    }
}

#[derive(Serialize)]
struct ErrorReport {
    kind: ErrorKind,
    message: String,
}

async fn load_catalog(cli: &Cli) -> Result<Option<TypeCatalog>, CliError> {
    let text = match (&cli.datatype_csv, &cli.datatype_file) {
        (Some(csv), _) => csv.clone(),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .map_err(|source| CliError::Io {
                path: path.clone(),
                source,
            })?,
        (None, None) => return Ok(None),
    };
    let catalog = TypeCatalog::from_csv(&text).map_err(EditorError::from)?;
    Ok(Some(catalog))
}

/// Stages the copy requested by `--output`; `None` edits in place.
async fn stage_output(cli: &Cli) -> Result<Option<StagedCopy>, CliError> {
    let Some(output) = &cli.output else {
        return Ok(None);
    };
    if !cli.command.writes() {
        return Err(CliError::OutputWithoutUpdate);
    }
    let staged = StagedCopy::stage(&cli.filenode_path, output).await?;
    Ok(Some(staged))
}

fn print_report<T: Serialize + std::fmt::Display>(value: &T, json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{value}");
    }
    Ok(())
}

async fn run(cli: &Cli) -> Result<(), CliError> {
    let catalog = load_catalog(cli).await?;
    let staged = stage_output(cli).await?;
    let path = staged
        .as_ref()
        .map_or_else(|| cli.filenode_path.clone(), |staged| staged.path().to_path_buf());
    execute(cli, path, catalog).await?;

    // Only a successful edit replaces the output file.
    if let Some(staged) = staged {
        staged.commit()?;
    }
    Ok(())
}

async fn execute(cli: &Cli, path: PathBuf, catalog: Option<TypeCatalog>) -> Result<(), CliError> {
    let editor: FilenodeEditor<FileStorage> = if cli.command.writes() {
        FilenodeEditor::open(path).await?
    } else {
        FilenodeEditor::open_read_only(path).await?
    };
    let editor = match catalog {
        Some(catalog) => editor.with_catalog(catalog),
        None => editor,
    };

    match &cli.command {
        Command::List { page } => {
            let listings = editor.list(*page).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&listings)?);
            } else {
                for listing in &listings {
                    print!("{listing}");
                }
            }
        }
        Command::Read { page, item } => {
            let view = editor.read(*page, *item).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print!("{view}");
            }
        }
        Command::Update { page, item, values } => {
            let fields: Vec<FieldText> = serde_json::from_str(values).map_err(CliError::Values)?;
            let report = editor.update_fields(*page, *item, &fields).await?;
            print_report(&report, cli.json)?;
        }
        Command::RawUpdate {
            page,
            item,
            hex,
            data_only,
        } => {
            let digits = hex.strip_prefix("\\x").unwrap_or(hex);
            let bytes = hex::decode(digits).map_err(CliError::Hex)?;
            let report = if *data_only {
                editor.raw_update_data(*page, *item, &bytes).await?
            } else {
                editor.raw_update(*page, *item, &bytes).await?
            };
            print_report(&report, cli.json)?;
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if cli.json {
                let report = ErrorReport {
                    kind: err.kind(),
                    message: err.to_string(),
                };
                if let Ok(text) = serde_json::to_string_pretty(&report) {
                    println!("{text}");
                }
            } else {
                eprintln!("error: {} ({})", err, err.kind());
            }
            ExitCode::FAILURE
        }
    }
}
