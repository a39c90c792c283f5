//! CLI for bib2cff - Convert a BibTeX entry into a CITATION.cff file.

use std::fmt;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bib2cff::{
    entry_type_table, load, parse_entry, AuthorEnricher, AuthorRecord, BibEntry,
    CitationBuilder, CffError, OrcidTable, RepositoryInfo, DEFAULT_CFF_VERSION,
};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

/// Convert a BibTeX entry and repository metadata into a CITATION.cff file
#[derive(Parser)]
#[command(name = "bib2cff")]
#[command(version)]
#[command(after_help = "\
Examples:
  bib2cff convert paper.bib --repo-url https://github.com/me/tool
  bib2cff convert paper.bib -o CITATION --repo-doi 10.5281/zenodo.123 --repo-version 1.0
  cat paper.bib | bib2cff inspect -
  bib2cff types")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a CITATION.cff file from a single-entry BibTeX file
    #[command(after_help = "\
Examples:
  bib2cff convert paper.bib --repo-url https://github.com/me/tool
  bib2cff convert paper.bib --orcid 'Doe, Jane=0000-0002-1825-0097'
  bib2cff convert paper.bib --prompt-orcid

Authors must be written 'Family, Given' and separated by ' and '.")]
    Convert {
        /// BibTeX file holding exactly one entry (use '-' for stdin)
        input: PathBuf,

        /// Output file; '.cff' is appended if missing
        #[arg(short, long, default_value = "CITATION.cff")]
        output: PathBuf,

        /// CFF schema version to declare
        #[arg(long, default_value = DEFAULT_CFF_VERSION)]
        cff_version: String,

        /// ORCID for an author, as 'Family, Given=ID' (repeatable)
        #[arg(long = "orcid", value_name = "NAME=ORCID")]
        orcids: Vec<String>,

        /// Ask on the terminal for the ORCID of every author still lacking one
        #[arg(long)]
        prompt_orcid: bool,

        #[command(flatten)]
        repo: RepoArgs,
    },

    /// Print the normalized citation record as JSON
    Inspect {
        /// BibTeX file holding exactly one entry (use '-' for stdin)
        input: PathBuf,

        #[command(flatten)]
        repo: RepoArgs,
    },

    /// List the supported BibTeX entry types and their CFF types
    Types,
}

/// Repository metadata merged into the citation.
#[derive(Args)]
struct RepoArgs {
    /// Repository URL (written as repository-code)
    #[arg(long)]
    repo_url: Option<String>,

    /// Repository DOI, used when the publication has none
    #[arg(long)]
    repo_doi: Option<String>,

    /// Software version
    #[arg(long)]
    repo_version: Option<String>,

    /// Citation request message
    #[arg(long)]
    message: Option<String>,

    /// Release date (YYYY-MM-DD), overriding the entry's date fields
    #[arg(long)]
    date_released: Option<String>,

    /// Repository authors, if different from the publication's (not supported)
    #[arg(long, hide = true)]
    repo_authors: Option<String>,
}

impl From<RepoArgs> for RepositoryInfo {
    fn from(args: RepoArgs) -> Self {
        RepositoryInfo {
            repo_url: args.repo_url,
            repo_doi: args.repo_doi,
            version: args.repo_version,
            message: args.message,
            date_released: args.date_released,
            authors: args.repo_authors,
        }
    }
}

// ---------------------------------------------------------------------------
// AppError — semantic exit codes
// ---------------------------------------------------------------------------

enum AppError {
    /// Exit 10 — input file not found / unreadable
    InputFile(String),
    /// Exit 11 — BibTeX entry or one of its fields is malformed
    MalformedInput(String),
    /// Exit 12 — entry type has no CFF counterpart
    UnsupportedType(String),
    /// Exit 13 — requested feature is not implemented
    UnsupportedFeature(String),
    /// Exit 14 — conversion attempted with incomplete inputs
    Precondition(String),
    /// Exit 15 — cannot write output file
    OutputFile(String),
}

impl AppError {
    fn exit_code(&self) -> i32 {
        match self {
            AppError::InputFile(_) => 10,
            AppError::MalformedInput(_) => 11,
            AppError::UnsupportedType(_) => 12,
            AppError::UnsupportedFeature(_) => 13,
            AppError::Precondition(_) => 14,
            AppError::OutputFile(_) => 15,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InputFile(msg) => {
                write!(f, "{}\n  hint: verify the file path is correct", msg)
            }
            AppError::MalformedInput(msg) => {
                write!(
                    f,
                    "{}\n  hint: the file must hold exactly one entry, with authors written 'Family, Given' and joined by ' and '",
                    msg
                )
            }
            AppError::UnsupportedType(msg) => {
                let names: Vec<&str> = entry_type_table().iter().map(|(bib, _)| *bib).collect();
                write!(
                    f,
                    "{}\n  supported entry types: {}",
                    msg,
                    names.join(", ")
                )
            }
            AppError::UnsupportedFeature(msg) | AppError::Precondition(msg) => {
                write!(f, "{}", msg)
            }
            AppError::OutputFile(msg) => {
                write!(
                    f,
                    "{}\n  hint: check that the output directory exists and is writable",
                    msg
                )
            }
        }
    }
}

impl From<CffError> for AppError {
    fn from(e: CffError) -> Self {
        let msg = e.to_string();
        match e {
            CffError::MalformedInput(_) => AppError::MalformedInput(msg),
            CffError::UnsupportedType(_) => AppError::UnsupportedType(msg),
            CffError::UnsupportedFeature(_) => AppError::UnsupportedFeature(msg),
            CffError::Precondition(_) => AppError::Precondition(msg),
            CffError::Io { .. } => AppError::OutputFile(msg),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bib2cff=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(e.exit_code());
    }
}

fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            input,
            output,
            cff_version,
            orcids,
            prompt_orcid,
            repo,
        } => {
            convert_command(&input, &output, &cff_version, &orcids, prompt_orcid, repo)?;
        }
        Commands::Inspect { input, repo } => {
            inspect_command(&input, repo)?;
        }
        Commands::Types => {
            types_command();
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Convert a BibTeX file into a CFF file.
fn convert_command(
    input: &Path,
    output: &Path,
    cff_version: &str,
    orcids: &[String],
    prompt_orcid: bool,
    repo: RepoArgs,
) -> Result<(), AppError> {
    if prompt_orcid && input == Path::new("-") {
        return Err(AppError::InputFile(
            "--prompt-orcid reads answers from stdin, so the entry cannot be read from stdin too"
                .to_string(),
        ));
    }

    let mut builder = build(input, repo)?;

    if !orcids.is_empty() {
        let mut table = OrcidTable::new();
        for assignment in orcids {
            table.insert_assignment(assignment)?;
        }
        builder.enrich_authors(&mut table)?;
    }
    if prompt_orcid {
        builder.enrich_authors(&mut TerminalPrompt)?;
    }

    let written = builder.export(output, cff_version)?;
    eprintln!(
        "converted {} author(s), wrote {}",
        builder.authors().len(),
        written.display()
    );

    Ok(())
}

/// Print the normalized record as pretty JSON.
fn inspect_command(input: &Path, repo: RepoArgs) -> Result<(), AppError> {
    let record = build(input, repo)?.finalize()?;
    let json = serde_json::to_string_pretty(&record)
        .map_err(|e| AppError::OutputFile(format!("stdout: {}", e)))?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", json).map_err(|e| AppError::OutputFile(format!("stdout: {}", e)))?;
    Ok(())
}

/// List the entry type table.
fn types_command() {
    for (bib, cff) in entry_type_table() {
        println!("{:<14} {}", bib, cff);
    }
}

/// Load the entry (support '-' for stdin) and attach the repository info.
fn build(input: &Path, repo: RepoArgs) -> Result<CitationBuilder, AppError> {
    let entry = read_entry(input)?;
    let mut builder = CitationBuilder::new();
    builder
        .load_bibliographic(entry)?
        .attach_repository(repo.into())?;
    Ok(builder)
}

fn read_entry(input: &Path) -> Result<BibEntry, AppError> {
    if input == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| AppError::InputFile(format!("failed to read from stdin: {}", e)))?;
        return Ok(parse_entry(&buf)?);
    }
    load(input).map_err(|e| match e {
        CffError::Io { .. } => AppError::InputFile(e.to_string()),
        other => other.into(),
    })
}

// ---------------------------------------------------------------------------
// Interactive ORCID entry
// ---------------------------------------------------------------------------

/// Asks for each author's ORCID on stderr and reads the answer from stdin.
struct TerminalPrompt;

impl AuthorEnricher for TerminalPrompt {
    fn orcid_for(&mut self, author: &AuthorRecord) -> Option<String> {
        eprint!(
            "ORCID (identifier or URL) of {}; leave empty to skip: ",
            author.full_name
        );
        io::stderr().flush().ok()?;
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}
