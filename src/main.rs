use clap::{Parser, Subcommand, ValueEnum};
use promptpack::config::{preset_display_name, PackConfig};
use promptpack::errors::PackError;
use promptpack::export::{ClipboardExporter, Export, ExportTarget, Exporter};
use promptpack::ingest::github::parse_repo;
use promptpack::ingest::{FolderIngestor, GitHubClient, GitHubIngestor, Ingestor, ZipIngestor};
use promptpack::logger::initialize_logger;
use promptpack::reporting::{print_stats, render_tree};
use promptpack::workspace::Workspace;
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    #[command(subcommand)]
    cmd: SubCommands,
}

#[derive(Subcommand, Debug, Clone)]
enum SubCommands {
    /// Build a prompt pack from a folder, ZIP archive or GitHub repository
    Build(BuildArgs),
    /// Show the filtered file tree and what would be selected
    Tree(SourceArgs),
    /// List the branches of a GitHub repository
    Branches(BranchesArgs),
}

#[derive(Parser, Debug, Clone)]
struct SourceArgs {
    /// Folder path, .zip file, or GitHub `owner/repo` / URL (with --github)
    source: String,
    #[arg(long, help = "Treat SOURCE as a GitHub repository")]
    github: bool,
    #[arg(long = "ref", help = "Branch, tag or commit to fetch from GitHub")]
    git_ref: Option<String>,
    #[arg(short = 'c', long, help = "JSON configuration file")]
    config: Option<PathBuf>,
    #[arg(short = 'i', long = "include", help = "Include glob (repeatable, e.g. 'src/**')")]
    include: Vec<String>,
    #[arg(short = 'e', long = "exclude", help = "Exclude glob (repeatable, '!' prefix vetoes)")]
    exclude: Vec<String>,
    #[arg(long, help = "Start from an empty exclude list instead of the defaults")]
    no_default_excludes: bool,
    #[arg(short = 'b', long, env = "PROMPTPACK_BUDGET")]
    budget: Option<u64>,
    #[arg(short = 'M', long, env = "PROMPTPACK_MODEL")]
    model: Option<String>,
}

#[derive(Parser, Debug, Clone)]
struct BuildArgs {
    #[command(flatten)]
    source: SourceArgs,
    #[arg(short = 'f', long, value_enum, default_value_t = Format::Both)]
    format: Format,
    #[arg(short = 'o', long, default_value = ".")]
    out: PathBuf,
    #[arg(long, help = "Copy the bundle to the clipboard instead of writing files")]
    clipboard: bool,
    #[arg(long, help = "Print per-file token statistics")]
    stats: bool,
    #[arg(long, help = "Print the prompt spec as JSON")]
    spec_json: bool,
}

#[derive(Parser, Debug, Clone)]
struct BranchesArgs {
    repo: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Markdown,
    Raw,
    Both,
}

impl Format {
    fn targets(self) -> &'static [ExportTarget] {
        match self {
            Format::Markdown => &[ExportTarget::Markdown],
            Format::Raw => &[ExportTarget::Raw],
            Format::Both => &[ExportTarget::Markdown, ExportTarget::Raw],
        }
    }
}

async fn resolve_config(args: &SourceArgs) -> Result<PackConfig, PackError> {
    let mut config = match &args.config {
        Some(path) => PackConfig::from_json_file(path).await?,
        None => PackConfig::default(),
    };
    if args.no_default_excludes {
        config.exclude.clear();
    }
    if !args.include.is_empty() {
        config.include = args.include.clone();
    }
    for pattern in &args.exclude {
        if !config.exclude.contains(pattern) {
            config.exclude.push(pattern.clone());
        }
    }
    if let Some(budget) = args.budget {
        config.target_token_budget = budget;
    }
    if let Some(model) = &args.model {
        config.model_preset = preset_display_name(model).to_owned();
    }
    config.validate()?;
    Ok(config)
}

async fn ingestor_for(args: &SourceArgs) -> Result<Box<dyn Ingestor>, PackError> {
    if args.github {
        let repo = parse_repo(&args.source)?;
        let client = GitHubClient::from_env();
        let git_ref = match &args.git_ref {
            Some(git_ref) => git_ref.clone(),
            None => client.branches(&repo).await?.preferred(),
        };
        return Ok(Box::new(GitHubIngestor {
            client,
            repo,
            git_ref: Some(git_ref),
        }));
    }
    let path = PathBuf::from(&args.source);
    if path.is_dir() {
        Ok(Box::new(FolderIngestor { root: path }))
    } else {
        Ok(Box::new(ZipIngestor { path }))
    }
}

async fn open_workspace(args: &SourceArgs) -> Result<Workspace, PackError> {
    let config = resolve_config(args).await?;
    for pattern in config.include.iter().chain(&config.exclude) {
        if !promptpack::matcher::is_valid_glob(pattern) {
            warn!("Pattern '{}' is not a valid glob and will match nothing", pattern);
        }
    }
    let mut workspace = Workspace::new(config)?;
    workspace.load(ingestor_for(args).await?.ingest().await?);
    Ok(workspace)
}

async fn run_build(args: BuildArgs) -> Result<(), PackError> {
    let mut workspace = open_workspace(&args.source).await?;
    let bundle = workspace.build().await.clone();

    if args.stats {
        print_stats(workspace.tree(), &bundle.spec);
    }
    for warning in &bundle.spec.metadata.warnings {
        warn!("{}", warning);
    }
    if args.spec_json {
        println!("{}", serde_json::to_string_pretty(&bundle.spec)?);
    }

    let exports: Vec<Export> = args
        .format
        .targets()
        .iter()
        .map(|target| workspace.export(*target))
        .collect::<Result<_, _>>()?;

    if args.clipboard {
        // Only one text fits the clipboard; markdown wins when both were asked for.
        ClipboardExporter.export(&exports[0]).await?;
    } else {
        let written = promptpack::export::write_exports(&args.out, &exports).await?;
        for path in written {
            info!("Bundle written to {}", path.display());
        }
    }
    Ok(())
}

async fn run_tree(args: SourceArgs) -> Result<(), PackError> {
    let workspace = open_workspace(&args).await?;
    print!("{}", render_tree(workspace.tree(), workspace.selection()));
    info!(
        "{} of {} files selected",
        workspace.selection().len(),
        workspace.files().len()
    );
    Ok(())
}

async fn run_branches(args: BranchesArgs) -> Result<(), PackError> {
    let repo = parse_repo(&args.repo)?;
    let branches = GitHubClient::from_env().branches(&repo).await?;
    println!("{}", serde_json::to_string_pretty(&branches)?);
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli_args = CliArgs::parse();
    initialize_logger();

    let result = match cli_args.cmd {
        SubCommands::Build(args) => run_build(args).await,
        SubCommands::Tree(args) => run_tree(args).await,
        SubCommands::Branches(args) => run_branches(args).await,
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}
