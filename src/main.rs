// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use college_finder::validation::NeetInput;
use college_finder::{
    import::load_catalog, init_tracing, load_config, validate_neet_mark, validate_neet_rank,
    AppConfig, Catalog, CatalogQuery, CollegeType, DocumentService, Filters, FsBlobStore,
    LogFormat, SortOrder,
};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "college-finder", version, about = "Browse, filter and rank colleges")]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, env = "COLLEGE_FINDER_CONFIG")]
    config: Option<PathBuf>,

    /// Spreadsheet to load instead of the configured or built-in list
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the filtered, searched and sorted college list
    List(ListArgs),

    /// Load a spreadsheet and report what was imported
    Import {
        file: PathBuf,

        /// Print the imported records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Open the interactive browser (default)
    Tui,

    /// Validate a NEET mark (0-720) or rank
    CheckNeet {
        value: String,

        /// Treat the value as an all-India rank instead of a mark
        #[arg(long)]
        rank: bool,
    },

    /// Manage uploaded documents
    Docs {
        /// Owner (user id) the documents belong to
        #[arg(long)]
        owner: String,

        #[command(subcommand)]
        action: DocsAction,
    },
}

#[derive(clap::Args, Debug, Default)]
struct ListArgs {
    /// Search text, matched case-insensitively against names
    #[arg(short, long, default_value = "")]
    query: String,

    /// Search location, state, type, quota, category and branches too
    #[arg(long)]
    all_fields: bool,

    /// Sort ascending by closing rank
    #[arg(long)]
    rank: bool,

    /// Explicit sort order, wins over --rank
    #[arg(long, value_enum)]
    sort: Option<SortOrder>,

    #[arg(long)]
    state: Option<String>,

    #[arg(long)]
    category: Option<String>,

    #[arg(long)]
    quota: Option<String>,

    /// College type (medical, engineering, nursing, ...)
    #[arg(long = "type")]
    college_type: Option<String>,

    /// Offers this branch
    #[arg(long)]
    branch: Option<String>,

    /// Only colleges with hostel facilities
    #[arg(long)]
    hostel: bool,

    #[arg(long)]
    min_rating: Option<f64>,

    /// Show at most this many rows
    #[arg(long)]
    limit: Option<usize>,

    /// Print JSON instead of a table
    #[arg(long)]
    json: bool,
}

impl ListArgs {
    fn to_query(&self) -> CatalogQuery {
        CatalogQuery::new()
            .with_query(&self.query)
            .with_sort_by_rank(self.rank)
            .with_sort(self.sort.unwrap_or_default())
            .with_filters(Filters {
                state: self.state.clone(),
                category: self.category.clone(),
                quota: self.quota.clone(),
                college_type: self.college_type.as_deref().map(CollegeType::parse),
                branch: self.branch.clone(),
                hostel_required: self.hostel,
                min_rating: self.min_rating,
                search_all_fields: self.all_fields,
            })
    }
}

#[derive(Subcommand, Debug)]
enum DocsAction {
    /// Upload a file (.pdf, .doc, .docx, .txt, .jpg, .jpeg, .png)
    Upload {
        file: PathBuf,

        #[arg(long)]
        title: String,
    },

    /// List documents, newest first
    List,

    /// Write a document's bytes to a file
    Download {
        id: String,

        /// Output path, defaults to the original file name
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Delete a document and its stored file
    Delete { id: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    let config = load_config(cli.config.as_deref())?;
    let data_file = cli.data.clone().or_else(|| config.catalog.data_file.clone());

    match cli.command {
        Some(Command::List(args)) => run_list(&open_catalog(data_file.as_deref())?, &args),
        Some(Command::Import { file, json }) => run_import(&file, json),
        Some(Command::CheckNeet { value, rank }) => {
            let kind = if rank { NeetInput::Rank } else { NeetInput::Mark };
            run_check_neet(kind, &value)
        }
        Some(Command::Docs { owner, action }) => run_docs(&config, &owner, action),
        Some(Command::Tui) | None => run_ui_mode(open_catalog(data_file.as_deref())?),
    }
}

fn open_catalog(data_file: Option<&Path>) -> Result<Catalog> {
    load_catalog(data_file).with_context(|| match data_file {
        Some(path) => format!("failed to load {}", path.display()),
        None => "failed to load built-in catalog".to_string(),
    })
}

fn run_list(catalog: &Catalog, args: &ListArgs) -> Result<()> {
    let mut colleges = catalog.view(&args.to_query());
    if let Some(limit) = args.limit {
        colleges.truncate(limit);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&colleges)?);
        return Ok(());
    }

    println!(
        "{:>6}  {:<45} {:<18} {:<12} {:>6}",
        "Rank", "Name", "Location", "Type", "Rating"
    );
    println!("{}", "─".repeat(92));
    for college in &colleges {
        let rank = college
            .effective_rank()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>6}  {:<45} {:<18} {:<12} {:>6.1}",
            rank,
            college.name,
            college.location,
            college.college_type.name(),
            college.rating
        );
    }
    println!("\n{} of {} colleges ({})", colleges.len(), catalog.len(), catalog.source());

    Ok(())
}

fn run_import(file: &Path, json: bool) -> Result<()> {
    let source = college_finder::source_for_path(file)?;
    let report = source
        .load()
        .with_context(|| format!("failed to import {}", file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.records)?);
        return Ok(());
    }

    println!("📂 Imported {} ({})", source.label(), source.kind().name());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("✓ Records:          {}", report.records.len());
    println!("✓ With closing rank: {}", report.ranked_count());
    if report.defaulted_cells > 0 {
        println!("⚠️  Cells defaulted:  {}", report.defaulted_cells);
    }
    if !report.ignored_columns.is_empty() {
        println!("⚠️  Ignored columns:  {}", report.ignored_columns.join(", "));
    }

    Ok(())
}

fn run_check_neet(kind: NeetInput, value: &str) -> Result<()> {
    let checked = match kind {
        NeetInput::Mark => validate_neet_mark(value).map(u32::from),
        NeetInput::Rank => validate_neet_rank(value),
    };

    match checked {
        Ok(v) => {
            println!("✓ {}: {}", kind.label(), v);
            Ok(())
        }
        Err(e) => bail!("{}", e.message),
    }
}

fn run_docs(config: &AppConfig, owner: &str, action: DocsAction) -> Result<()> {
    let conn = Connection::open(&config.storage.database).with_context(|| {
        format!("failed to open {}", config.storage.database.display())
    })?;
    let service = DocumentService::new(conn, FsBlobStore::new(&config.storage.blob_dir))?;

    match action {
        DocsAction::Upload { file, title } => {
            let bytes = std::fs::read(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            let doc = service.upload(owner, &title, &file_name, &bytes)?;
            println!("✓ Uploaded \"{}\" ({}) as {}", doc.title, doc.display_size(), doc.id);
        }
        DocsAction::List => {
            let docs = service.list(owner)?;
            if docs.is_empty() {
                println!("No documents uploaded yet");
            }
            for doc in docs {
                println!(
                    "{}  {:<30} {:<24} {:>10}  {}",
                    doc.id,
                    doc.title,
                    doc.file_name,
                    doc.display_size(),
                    doc.uploaded_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        DocsAction::Download { id, out } => {
            let (doc, bytes) = service.download(owner, &id)?;
            let out = out.unwrap_or_else(|| PathBuf::from(&doc.file_name));
            std::fs::write(&out, bytes)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("✓ Saved \"{}\" to {}", doc.title, out.display());
        }
        DocsAction::Delete { id } => {
            service.delete(owner, &id)?;
            println!("✓ Deleted {}", id);
        }
    }

    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(catalog: Catalog) -> Result<()> {
    println!("🎓 Loaded {} colleges from {}", catalog.len(), catalog.source());

    let mut app = ui::App::new(catalog);
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_catalog: Catalog) -> Result<()> {
    bail!("TUI mode not available, rebuild with --features tui or use `college-finder list`")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_list_flags() {
        let cli = Cli::try_parse_from([
            "college-finder",
            "list",
            "-q",
            "med",
            "--rank",
            "--type",
            "medical",
            "--hostel",
        ])
        .unwrap();

        let Some(Command::List(args)) = cli.command else {
            panic!("expected list subcommand");
        };
        let query = args.to_query();
        assert_eq!(query.query, "med");
        assert_eq!(query.effective_sort(), SortOrder::RankAscending);
        assert_eq!(query.filters.college_type, Some(CollegeType::Medical));
        assert!(query.filters.hostel_required);
    }

    #[test]
    fn test_explicit_sort_wins() {
        let cli =
            Cli::try_parse_from(["college-finder", "list", "--rank", "--sort", "rating"]).unwrap();
        let Some(Command::List(args)) = cli.command else {
            panic!("expected list subcommand");
        };
        assert_eq!(args.to_query().effective_sort(), SortOrder::Rating);
    }

    #[test]
    fn test_sort_spelling_matches_http() {
        let cli =
            Cli::try_parse_from(["college-finder", "list", "--sort", "rank_descending"]).unwrap();
        let Some(Command::List(args)) = cli.command else {
            panic!("expected list subcommand");
        };
        assert_eq!(args.sort, Some(SortOrder::RankDescending));

        let from_query: SortOrder = serde_json::from_str("\"rank_descending\"").unwrap();
        assert_eq!(from_query, SortOrder::RankDescending, "Same spelling as the HTTP query");

        let kebab = Cli::try_parse_from(["college-finder", "list", "--sort", "rank-descending"]);
        assert!(kebab.is_err());
    }

    #[test]
    fn test_check_neet() {
        assert!(run_check_neet(NeetInput::Mark, "650").is_ok());
        let err = run_check_neet(NeetInput::Mark, "800").unwrap_err();
        assert_eq!(err.to_string(), "Please enter a valid NEET mark between 0 and 720");
        assert!(run_check_neet(NeetInput::Rank, "0").is_err());
    }

    #[test]
    fn test_docs_requires_owner() {
        assert!(Cli::try_parse_from(["college-finder", "docs", "list"]).is_err());
        assert!(Cli::try_parse_from(["college-finder", "docs", "--owner", "u1", "list"]).is_ok());
    }
}
