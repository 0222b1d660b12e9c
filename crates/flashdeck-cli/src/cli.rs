//! Argument parsing and command dispatch.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use flashdeck_api_models::Id;
use flashdeck_config::ClientConfig;
use flashdeck_config::defaults::ENV_SESSION_DIR;
use flashdeck_telemetry::{LogFormat, LoggingConfig, init_logging};
use url::Url;

use crate::client::{AppContext, CliError, CliResult, parse_url};
use crate::commands::auth::{handle_login, handle_logout, handle_register, handle_status};
use crate::commands::cards::{
    handle_card_add, handle_card_clear, handle_card_edit, handle_card_list, handle_card_move,
    handle_card_remove,
};
use crate::commands::folders::{
    handle_folder_add, handle_folder_edit, handle_folder_list, handle_folder_remove,
};
use crate::commands::sets::{
    handle_set_add, handle_set_edit, handle_set_list, handle_set_remove, handle_set_show,
};

/// Parses CLI arguments, executes the requested command, and reports failures.
/// Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let command_name = command_label(&cli.command);

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            return err.exit_code();
        }
    };
    let logging = LoggingConfig {
        level: &config.log_level,
        format: config.log_format,
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("warning: logging disabled: {err:#}");
    }

    let exit_code = match dispatch(cli, config).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    };
    tracing::debug!(command = command_name, exit_code, "command finished");
    exit_code
}

/// Environment configuration overlaid with explicit flags.
///
/// The session directory flag is applied before loading so no platform default
/// has to be resolved when it is given.
fn build_config(cli: &Cli) -> CliResult<ClientConfig> {
    let session_dir = cli.session_dir.clone();
    let mut config = ClientConfig::from_lookup(|key| match (key, &session_dir) {
        (ENV_SESSION_DIR, Some(dir)) => Some(dir.display().to_string()),
        _ => std::env::var(key).ok(),
    })
    .map_err(CliError::failure)?;
    if let Some(url) = &cli.api_url {
        config.api_url = url.clone();
    }
    if let Some(secs) = cli.timeout {
        if secs == 0 {
            return Err(CliError::validation("--timeout must be greater than zero"));
        }
        config.timeout = std::time::Duration::from_secs(secs);
    }
    if let Some(level) = &cli.log_level {
        config.log_level.clone_from(level);
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    Ok(config)
}

async fn dispatch(cli: Cli, config: ClientConfig) -> CliResult<()> {
    let ctx = AppContext::connect(config).await?;
    let output = cli.output;

    match cli.command {
        Command::Login(args) => handle_login(&ctx, args).await,
        Command::Register(args) => handle_register(&ctx, args).await,
        Command::Logout => handle_logout(&ctx).await,
        Command::Status => handle_status(&ctx, output).await,
        Command::Folder(folders) => match folders {
            FolderCommand::Ls(args) => handle_folder_list(&ctx, args, output).await,
            FolderCommand::Add(args) => handle_folder_add(&ctx, args).await,
            FolderCommand::Edit(args) => handle_folder_edit(&ctx, args).await,
            FolderCommand::Rm(args) => handle_folder_remove(&ctx, args).await,
        },
        Command::Set(sets) => match sets {
            SetCommand::Ls(args) => handle_set_list(&ctx, args, output).await,
            SetCommand::Show(args) => handle_set_show(&ctx, args, output).await,
            SetCommand::Add(args) => handle_set_add(&ctx, args).await,
            SetCommand::Edit(args) => handle_set_edit(&ctx, args).await,
            SetCommand::Rm(args) => handle_set_remove(&ctx, args).await,
        },
        Command::Card(cards) => match cards {
            CardCommand::Ls(args) => handle_card_list(&ctx, args, output).await,
            CardCommand::Add(args) => handle_card_add(&ctx, args).await,
            CardCommand::Edit(args) => handle_card_edit(&ctx, args).await,
            CardCommand::Rm(args) => handle_card_remove(&ctx, args).await,
            CardCommand::Move(args) => handle_card_move(&ctx, args, output).await,
            CardCommand::Clear(args) => handle_card_clear(&ctx, args).await,
        },
    }
}

#[derive(Parser)]
#[command(name = "flashdeck", about = "Manage Flashdeck folders, card sets, and cards")]
pub(crate) struct Cli {
    #[arg(long, global = true, env = "FLASHDECK_API_URL", value_parser = parse_url)]
    api_url: Option<Url>,
    #[arg(
        long,
        global = true,
        env = "FLASHDECK_HTTP_TIMEOUT_SECS",
        help = "Request timeout in seconds"
    )]
    timeout: Option<u64>,
    #[arg(
        long,
        global = true,
        env = "FLASHDECK_SESSION_DIR",
        help = "Directory holding the persisted session"
    )]
    session_dir: Option<PathBuf>,
    #[arg(long, global = true, env = "FLASHDECK_LOG_LEVEL")]
    log_level: Option<String>,
    #[arg(long, global = true, env = "FLASHDECK_LOG_FORMAT", value_parser = parse_log_format)]
    log_format: Option<LogFormat>,
    #[arg(
        long = "output",
        alias = "format",
        global = true,
        value_enum,
        default_value_t = OutputFormat::Table,
        help = "Select output format for commands that render structured data"
    )]
    output: OutputFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Log in and store the session token.
    Login(LoginArgs),
    /// Create an account.
    Register(RegisterArgs),
    /// Forget the stored session.
    Logout,
    /// Show whether a session is stored.
    Status,
    #[command(subcommand)]
    Folder(FolderCommand),
    #[command(subcommand)]
    Set(SetCommand),
    #[command(subcommand)]
    Card(CardCommand),
}

#[derive(Subcommand)]
pub(crate) enum FolderCommand {
    Ls(FolderListArgs),
    Add(FolderAddArgs),
    Edit(FolderEditArgs),
    Rm(FolderRemoveArgs),
}

#[derive(Subcommand)]
pub(crate) enum SetCommand {
    Ls(SetListArgs),
    Show(SetShowArgs),
    Add(SetAddArgs),
    Edit(SetEditArgs),
    Rm(SetRemoveArgs),
}

#[derive(Subcommand)]
pub(crate) enum CardCommand {
    Ls(CardListArgs),
    Add(CardAddArgs),
    Edit(CardEditArgs),
    Rm(CardRemoveArgs),
    Move(CardMoveArgs),
    Clear(CardClearArgs),
}

#[derive(Args)]
pub(crate) struct LoginArgs {
    #[arg(long, env = "FLASHDECK_EMAIL")]
    pub(crate) email: String,
    #[arg(long, env = "FLASHDECK_PASSWORD", hide_env_values = true)]
    pub(crate) password: Option<String>,
}

#[derive(Args)]
pub(crate) struct RegisterArgs {
    #[arg(long)]
    pub(crate) email: String,
    #[arg(long)]
    pub(crate) password: Option<String>,
    #[arg(long)]
    pub(crate) confirm_password: Option<String>,
}

#[derive(Args, Default)]
pub(crate) struct FolderListArgs {
    #[arg(long)]
    pub(crate) search: Option<String>,
    #[arg(long, default_value_t = 1, help = "Number of pages to load")]
    pub(crate) pages: u32,
}

#[derive(Args)]
pub(crate) struct FolderAddArgs {
    pub(crate) name: String,
    #[arg(long)]
    pub(crate) public: bool,
}

#[derive(Args)]
pub(crate) struct FolderEditArgs {
    pub(crate) id: Id,
    #[arg(long)]
    pub(crate) name: String,
    #[arg(long)]
    pub(crate) public: bool,
}

#[derive(Args)]
pub(crate) struct FolderRemoveArgs {
    pub(crate) id: Id,
}

#[derive(Args, Default)]
pub(crate) struct SetListArgs {
    #[arg(help = "Folder identifier")]
    pub(crate) folder: Id,
    #[arg(long)]
    pub(crate) search: Option<String>,
    #[arg(long, value_delimiter = ',', help = "Only sets carrying these tags")]
    pub(crate) tags: Vec<String>,
    #[arg(long, default_value_t = 0, help = "Zero-based page to fetch")]
    pub(crate) page: u32,
}

#[derive(Args)]
pub(crate) struct SetShowArgs {
    pub(crate) id: Id,
}

#[derive(Args)]
pub(crate) struct SetAddArgs {
    #[arg(help = "Folder identifier")]
    pub(crate) folder: Id,
    pub(crate) name: String,
    #[arg(long, default_value = "")]
    pub(crate) description: String,
    #[arg(long, default_value = "", help = "Comma-separated tag names")]
    pub(crate) tags: String,
    #[arg(long)]
    pub(crate) public: bool,
}

#[derive(Args, Default)]
pub(crate) struct SetEditArgs {
    pub(crate) id: Id,
    #[arg(long)]
    pub(crate) name: Option<String>,
    #[arg(long)]
    pub(crate) description: Option<String>,
    #[arg(long, help = "Comma-separated tag names")]
    pub(crate) tags: Option<String>,
}

#[derive(Args)]
pub(crate) struct SetRemoveArgs {
    pub(crate) id: Id,
}

#[derive(Args)]
pub(crate) struct CardListArgs {
    #[arg(help = "Set identifier")]
    pub(crate) set: Id,
}

#[derive(Args, Default)]
pub(crate) struct CardAddArgs {
    #[arg(help = "Set identifier")]
    pub(crate) set: Id,
    #[arg(long)]
    pub(crate) term: Option<String>,
    #[arg(long)]
    pub(crate) definition: Option<String>,
}

#[derive(Args, Default)]
pub(crate) struct CardEditArgs {
    #[arg(help = "Set identifier")]
    pub(crate) set: Id,
    #[arg(help = "Card identifier")]
    pub(crate) card: Id,
    #[arg(long)]
    pub(crate) term: Option<String>,
    #[arg(long)]
    pub(crate) definition: Option<String>,
}

#[derive(Args)]
pub(crate) struct CardRemoveArgs {
    #[arg(help = "Set identifier")]
    pub(crate) set: Id,
    #[arg(help = "Card identifier")]
    pub(crate) card: Id,
}

#[derive(Args)]
pub(crate) struct CardMoveArgs {
    #[arg(help = "Set identifier")]
    pub(crate) set: Id,
    #[arg(help = "Zero-based position of the card to move")]
    pub(crate) from: usize,
    #[arg(help = "Zero-based position it should end up at")]
    pub(crate) to: usize,
}

#[derive(Args)]
pub(crate) struct CardClearArgs {
    #[arg(help = "Set identifier")]
    pub(crate) set: Id,
    #[arg(long, help = "Confirm deleting every card of the set")]
    pub(crate) yes: bool,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

fn parse_log_format(input: &str) -> Result<LogFormat, String> {
    input.parse()
}

const fn command_label(command: &Command) -> &'static str {
    match command {
        Command::Login(_) => "login",
        Command::Register(_) => "register",
        Command::Logout => "logout",
        Command::Status => "status",
        Command::Folder(FolderCommand::Ls(_)) => "folder_ls",
        Command::Folder(FolderCommand::Add(_)) => "folder_add",
        Command::Folder(FolderCommand::Edit(_)) => "folder_edit",
        Command::Folder(FolderCommand::Rm(_)) => "folder_rm",
        Command::Set(SetCommand::Ls(_)) => "set_ls",
        Command::Set(SetCommand::Show(_)) => "set_show",
        Command::Set(SetCommand::Add(_)) => "set_add",
        Command::Set(SetCommand::Edit(_)) => "set_edit",
        Command::Set(SetCommand::Rm(_)) => "set_rm",
        Command::Card(CardCommand::Ls(_)) => "card_ls",
        Command::Card(CardCommand::Add(_)) => "card_add",
        Command::Card(CardCommand::Edit(_)) => "card_edit",
        Command::Card(CardCommand::Rm(_)) => "card_rm",
        Command::Card(CardCommand::Move(_)) => "card_move",
        Command::Card(CardCommand::Clear(_)) => "card_clear",
    }
}
