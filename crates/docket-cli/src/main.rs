#![forbid(unsafe_code)]

mod app;
mod cmd;
mod notify;
mod output;
mod view;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use app::App;
use clap::{CommandFactory, Parser, Subcommand};
use docket_core::ErrorCode;
use docket_core::config::load_config;
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "docket: git-backed backlog and meeting notes",
    long_about = None
)]
struct Cli {
    /// Enable debug logging (overridden by DOCKET_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Repository directory; overrides repo.path from config.
    #[arg(long, global = true, value_name = "DIR")]
    repo: Option<PathBuf>,

    /// Config file; defaults to DOCKET_CONFIG or the user config dir.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format: pretty, text or json.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Lifecycle",
        about = "Initialize a docket repository",
        long_about = "Create the repository directory, git repo and folder layout. Safe to re-run.",
        after_help = "EXAMPLES:\n    dk init\n\n    dk --repo ~/team-docket init"
    )]
    Init,

    #[command(
        next_help_heading = "Lifecycle",
        about = "Create a backlog item",
        after_help = "EXAMPLES:\n    dk create --title \"Fix login timeout\" --priority 2 --due 2024-06-01\n\n    dk create -t \"Write docs\" -a ana --tag docs,onboarding --format json"
    )]
    Create(cmd::create::CreateArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Change fields of a backlog item",
        after_help = "EXAMPLES:\n    dk update abc12345 --priority 1 --assignee bo\n\n    # Clear the assignee\n    dk update abc12345 --assignee \"\""
    )]
    Update(cmd::update::UpdateArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Set the status of a backlog item",
        after_help = "EXAMPLES:\n    dk status abc12345 in_progress\n\n    dk status abc12345 done"
    )]
    Status(cmd::update::StatusArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Delete a backlog item (archived first unless --permanent)"
    )]
    Delete(cmd::delete::DeleteArgs),

    #[command(
        next_help_heading = "Lifecycle",
        about = "Move a backlog item or meeting to the archive",
        after_help = "EXAMPLES:\n    dk archive abc12345 --reason \"Won't fix\"\n\n    dk archive 2024-05-15-standup --meeting"
    )]
    Archive(cmd::delete::ArchiveArgs),

    #[command(next_help_heading = "Read", about = "Show one backlog item")]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Read",
        visible_alias = "query",
        about = "Filter, sort and page backlog items",
        after_help = "EXAMPLES:\n    dk list --status todo,in_progress --sort due_date --order asc\n\n    dk list --min-priority 1 --max-priority 2 --stats\n\n    dk query --params '{\"tags\": [\"ui\"], \"limit\": 5}' --format json"
    )]
    List(cmd::list::ListArgs),

    #[command(next_help_heading = "Read", about = "List open items past their due date")]
    Overdue,

    #[command(next_help_heading = "Read", about = "List open items not updated recently")]
    Stale(cmd::report::StaleArgs),

    #[command(next_help_heading = "Read", about = "Counts by status plus due-soon totals")]
    Summary,

    #[command(
        next_help_heading = "Read",
        about = "Commits that touched an item or meeting"
    )]
    History(cmd::sync::HistoryArgs),

    #[command(
        next_help_heading = "Search",
        about = "Ranked full-text search over backlog items",
        after_help = "EXAMPLES:\n    dk search \"login timeout\"\n\n    dk search render -n 10 --format json"
    )]
    Search(cmd::search::SearchArgs),

    #[command(next_help_heading = "Search", about = "Rebuild the search index")]
    Reindex,

    #[command(subcommand)]
    #[command(
        next_help_heading = "Meetings",
        about = "Record and browse meetings",
        after_help = "EXAMPLES:\n    dk meeting create -t \"Sprint Planning\" -d 2024-05-15T10:00 -p ana,bo --action \"Ship v2\"\n\n    dk meeting list"
    )]
    Meeting(cmd::meeting::MeetingCommand),

    #[command(
        next_help_heading = "Automation",
        about = "Run overdue, stale and summary checks once",
        after_help = "EXAMPLES:\n    dk check overdue\n\n    dk check --dry-run"
    )]
    Check(cmd::jobs::CheckArgs),

    #[command(
        next_help_heading = "Automation",
        about = "Run the checks on the configured schedule until interrupted"
    )]
    Watch(cmd::jobs::WatchArgs),

    #[command(
        next_help_heading = "Automation",
        about = "Send a test message to every configured channel"
    )]
    NotifyTest,

    #[command(
        next_help_heading = "Sync",
        about = "Pull, reindex and push",
        after_help = "EXAMPLES:\n    dk sync\n\n    dk sync --no-push"
    )]
    Sync(cmd::sync::SyncArgs),

    #[command(next_help_heading = "Setup", about = "Inspect or edit configuration")]
    Config(cmd::config::ConfigArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n    dk completions zsh > ~/.zfunc/_dk"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("DOCKET_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "docket=debug,info"
        } else {
            "docket=info,warn"
        })
    });

    let format = env::var("DOCKET_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn load_app(cli: &Cli, output: OutputMode) -> Result<App, CliError> {
    let mut config = load_config(cli.config.as_deref()).map_err(|err| {
        let code = ErrorCode::ConfigParseError;
        CliError {
            message: format!("{err:#}"),
            suggestion: code.hint().map(str::to_string),
            error_code: Some(code.code().to_string()),
        }
    })?;
    if let Some(repo) = &cli.repo {
        config.repo.path.clone_from(repo);
    }
    debug!(repo = %config.repo.path.display(), "configuration loaded");
    Ok(App { config, output })
}

fn dispatch(cli: &Cli, app: &App) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Init => cmd::init::run_init(app),
        Commands::Create(args) => cmd::create::run_create(args, app),
        Commands::Update(args) => cmd::update::run_update(args, app),
        Commands::Status(args) => cmd::update::run_status(args, app),
        Commands::Delete(args) => cmd::delete::run_delete(args, app),
        Commands::Archive(args) => cmd::delete::run_archive(args, app),
        Commands::Show(args) => cmd::show::run_show(args, app),
        Commands::List(args) => cmd::list::run_list(args, app),
        Commands::Overdue => cmd::report::run_overdue(app),
        Commands::Stale(args) => cmd::report::run_stale(args, app),
        Commands::Summary => cmd::report::run_summary(app),
        Commands::History(args) => cmd::sync::run_history(args, app),
        Commands::Search(args) => cmd::search::run_search(args, app),
        Commands::Reindex => cmd::search::run_reindex(app),
        Commands::Meeting(command) => cmd::meeting::run_meeting(command, app),
        Commands::Check(args) => cmd::jobs::run_check(args, app),
        Commands::Watch(args) => cmd::jobs::run_watch(args, app),
        Commands::NotifyTest => cmd::jobs::run_notify_test(app),
        Commands::Sync(args) => cmd::sync::run_sync(args, app),
        Commands::Config(args) => cmd::config::run_config(args, cli.config.as_deref(), app),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let output = cli.output_mode();

    let result = load_app(&cli, output)
        .and_then(|app| dispatch(&cli, &app).map_err(|err| CliError::from_anyhow(&err)));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            if render_error(output, &error).is_err() {
                eprintln!("error: {}", error.message);
            }
            ExitCode::FAILURE
        }
    }
}
