//! sloctally CLI - Count code, documentation, string and empty lines.

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use serde::Serialize;
use sloctally::analysis::{AnalyzerOptions, SourceAnalyzer, DEFAULT_FALLBACK_ENCODING};
use sloctally::encoding::EncodingMode;
use sloctally::errors::{exit_code, SloctallyError};
use sloctally::language::Language;
use sloctally::output::{format_output, OutputFormat};
use sloctally::walker::{collect_sources, WalkOptions};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sloctally")]
#[command(about = "Count code, documentation, string and empty lines in source files")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    scan: ScanArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Count lines in files and folders (default)
    Scan(ScanArgs),

    /// Show supported languages
    Languages {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Clone)]
struct ScanArgs {
    /// Files and folders to analyze
    #[arg(default_value = ".")]
    paths: Vec<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value = "summary")]
    format: FormatArg,

    /// Encoding: "automatic", "chardet" or an encoding name
    #[arg(long, default_value = "automatic")]
    encoding: EncodingMode,

    /// Encoding used when automatic detection gives up
    #[arg(long, default_value = DEFAULT_FALLBACK_ENCODING)]
    fallback_encoding: String,

    /// Include hidden files and directories
    #[arg(long)]
    hidden: bool,

    /// Do not read .gitignore files
    #[arg(long)]
    no_gitignore: bool,

    /// Maximum directory depth
    #[arg(long)]
    max_depth: Option<usize>,

    /// Glob patterns for file and folder names to skip
    #[arg(long, value_delimiter = ',', default_value = "*~")]
    names_to_skip: Vec<String>,

    /// Log each analyzed file
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Summary,
    Sloccount,
    ClocXml,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Summary => OutputFormat::Summary,
            FormatArg::Sloccount => OutputFormat::Sloccount,
            FormatArg::ClocXml => OutputFormat::ClocXml,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Scan(cli.scan));

    init_logging(matches!(&command, Commands::Scan(args) if args.verbose));
    let json_output = json_flag(&command);

    let result = match command {
        Commands::Scan(args) => run_scan(args),
        Commands::Languages { json } => run_languages(json),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "sloctally", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        if json_output {
            #[derive(Serialize)]
            struct ErrorOutput {
                error: String,
            }

            let payload = ErrorOutput {
                error: e.to_string(),
            };

            let json = serde_json::to_string(&payload)
                .unwrap_or_else(|_| "{\"error\":\"serialization failed\"}".to_string());
            eprintln!("{json}");
        } else {
            eprintln!("error: {}", e);
        }
        std::process::exit(exit_code(&e));
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn json_flag(cmd: &Commands) -> bool {
    match cmd {
        Commands::Scan(args) => matches!(args.format, FormatArg::Json),
        Commands::Languages { json } => *json,
        Commands::Completions { .. } => false,
    }
}

// --- Scan command ---

fn run_scan(args: ScanArgs) -> Result<(), SloctallyError> {
    // Reject unusable encoding settings before touching any file.
    let analyzer = SourceAnalyzer::with_options(AnalyzerOptions {
        encoding: args.encoding,
        fallback_encoding: args.fallback_encoding,
    })?;

    if let Some(missing) = args.paths.iter().find(|p| !p.exists()) {
        return Err(SloctallyError::PathNotFound(missing.clone()));
    }

    let walk_opts = WalkOptions {
        max_depth: args.max_depth,
        include_hidden: args.hidden,
        respect_gitignore: !args.no_gitignore,
        ..Default::default()
    }
    .names_to_skip(args.names_to_skip);

    let sources = collect_sources(&args.paths, &walk_opts)?;
    info!("analyzing {} files", sources.len());

    let analyses = analyzer.analyze_all(&sources);
    let output = format_output(&analyses, args.format.into())?;
    print!("{}", output);

    Ok(())
}

// --- Languages command ---

#[derive(Serialize)]
struct LanguageInfo {
    name: String,
    extensions: Vec<String>,
}

fn run_languages(json: bool) -> Result<(), SloctallyError> {
    let languages: Vec<LanguageInfo> = Language::all()
        .iter()
        .map(|lang| LanguageInfo {
            name: lang.to_string(),
            extensions: lang.extensions().iter().map(|e| format!(".{}", e)).collect(),
        })
        .collect();

    if json {
        #[derive(Serialize)]
        struct Output {
            languages: Vec<LanguageInfo>,
        }
        let output = Output { languages };
        let json = serde_json::to_string_pretty(&output).map_err(sloctally::OutputError::from)?;
        println!("{json}");
    } else {
        println!("Supported languages:");
        for lang in &languages {
            println!("  {:12} {}", lang.name, lang.extensions.join(", "));
        }
    }

    Ok(())
}
