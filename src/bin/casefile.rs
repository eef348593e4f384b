//! Casefile CLI: case and document management with analysis ingestion.
//!
//! Usage:
//!   casefile case <subcommand> [--db path]
//!   casefile doc <subcommand> [--db path]
//!
//! Results print as JSON on stdout; errors go to stderr with exit code 1.

use casefile::{
    CaseFileApi, CaseFileResult, CaseFilter, CaseId, CaseUpdate, Config, DocumentId, NewCase,
    NewDocument, OpenStore, PageRequest, SqliteStore,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::Level;

#[derive(Parser)]
#[command(
    name = "casefile",
    version,
    about = "Legal case tracker with AI document analysis ingestion"
)]
struct Cli {
    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Path to a YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage cases
    Case {
        #[command(subcommand)]
        action: CaseAction,
    },
    /// Manage documents and their analyses
    Doc {
        #[command(subcommand)]
        action: DocAction,
    },
}

#[derive(Subcommand)]
enum CaseAction {
    /// Create a new case
    Create {
        /// Case name
        #[arg(long)]
        name: String,
        /// Client name
        #[arg(long)]
        client: String,
        /// Free-text summary
        #[arg(long)]
        summary: Option<String>,
        /// Initial status (defaults to "Active")
        #[arg(long)]
        status: Option<String>,
    },
    /// List cases, newest first
    List {
        #[arg(long)]
        page: Option<i64>,
        #[arg(long)]
        page_size: Option<i64>,
        /// Match against case or client name, case-insensitively
        #[arg(long)]
        search: Option<String>,
        /// Only cases with this exact status
        #[arg(long)]
        status: Option<String>,
    },
    /// Show a case with its document timeline
    Show { id: i64 },
    /// Update case fields
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long, conflicts_with = "clear_summary")]
        summary: Option<String>,
        /// Remove the summary
        #[arg(long)]
        clear_summary: bool,
    },
    /// Delete a case and all of its documents
    Delete { id: i64 },
}

#[derive(Subcommand)]
enum DocAction {
    /// Register a document under a case
    Add {
        case_id: i64,
        name: String,
        /// External storage path
        #[arg(long)]
        path: Option<String>,
        /// Date the content pertains to (YYYY-MM-DD)
        #[arg(long)]
        event_date: Option<NaiveDate>,
        /// Document type classifier
        #[arg(long = "type")]
        document_type: Option<String>,
    },
    /// Show a document
    Show { id: i64 },
    /// Delete a document
    Delete { id: i64 },
    /// List documents still waiting for an analysis
    Pending {
        #[arg(long, default_value_t = 50)]
        limit: u64,
    },
    /// Ingest a raw model response as the document's analysis
    Analyze {
        id: i64,
        /// File holding the response; reads stdin when absent or "-"
        #[arg(long)]
        response: Option<PathBuf>,
        /// Document type hint used when the response has none
        #[arg(long = "type")]
        document_type: Option<String>,
    },
}

fn init_logging(verbose: u8, configured: Option<&str>) {
    let level = match verbose {
        0 => configured
            .and_then(|l| l.parse::<Level>().ok())
            .unwrap_or(Level::WARN),
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn open_api(config: &Config, db: Option<PathBuf>) -> Result<CaseFileApi, String> {
    let db_path = config.database_path(db);
    let store =
        SqliteStore::open(&db_path).map_err(|e| format!("Failed to open database: {}", e))?;
    Ok(CaseFileApi::new(Arc::new(store), config.listing))
}

/// Print a result as JSON and map it to an exit code
fn emit<T: Serialize>(result: CaseFileResult<T>) -> i32 {
    match result {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(json) => {
                println!("{}", json);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn read_response(path: Option<&Path>) -> std::io::Result<String> {
    match path {
        Some(p) if p != Path::new("-") => std::fs::read_to_string(p),
        _ => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

fn cmd_case(api: &CaseFileApi, action: CaseAction) -> i32 {
    match action {
        CaseAction::Create {
            name,
            client,
            summary,
            status,
        } => {
            let new = NewCase {
                summary,
                status,
                ..NewCase::new(name, client)
            };
            emit(api.create_case(new))
        }
        CaseAction::List {
            page,
            page_size,
            search,
            status,
        } => {
            let mut filter = CaseFilter::new();
            if let Some(term) = search {
                filter = filter.with_search(term);
            }
            if let Some(status) = status {
                filter = filter.with_status(status);
            }
            emit(api.list_cases(PageRequest { page, page_size }, &filter))
        }
        CaseAction::Show { id } => emit(api.get_case(CaseId::new(id))),
        CaseAction::Update {
            id,
            name,
            client,
            status,
            summary,
            clear_summary,
        } => {
            let update = CaseUpdate {
                case_name: name,
                client_name: client,
                status,
                summary: if clear_summary { Some(None) } else { summary.map(Some) },
            };
            if update.is_empty() {
                eprintln!("Error: nothing to update");
                return 1;
            }
            emit(api.update_case(CaseId::new(id), update))
        }
        CaseAction::Delete { id } => match api.delete_case(CaseId::new(id)) {
            Ok(()) => {
                println!("Deleted case {}", id);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
    }
}

fn cmd_doc(api: &CaseFileApi, action: DocAction) -> i32 {
    match action {
        DocAction::Add {
            case_id,
            name,
            path,
            event_date,
            document_type,
        } => {
            let new = NewDocument {
                storage_path: path,
                event_date,
                document_type,
                ..NewDocument::new(CaseId::new(case_id), name)
            };
            emit(api.create_document(new))
        }
        DocAction::Show { id } => emit(api.get_document(DocumentId::new(id))),
        DocAction::Delete { id } => match api.delete_document(DocumentId::new(id)) {
            Ok(()) => {
                println!("Deleted document {}", id);
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        DocAction::Pending { limit } => emit(api.pending_documents(limit)),
        DocAction::Analyze {
            id,
            response,
            document_type,
        } => {
            let raw = match read_response(response.as_deref()) {
                Ok(raw) => raw,
                Err(e) => {
                    eprintln!("Error: cannot read response: {}", e);
                    return 1;
                }
            };
            emit(api.ingest(DocumentId::new(id), &raw, document_type.as_deref()))
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::resolve(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    init_logging(cli.verbose, config.log_level.as_deref());

    let api = match open_api(&config, cli.db) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Case { action } => cmd_case(&api, action),
        Commands::Doc { action } => cmd_doc(&api, action),
    };
    std::process::exit(code);
}
