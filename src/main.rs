use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use polaroidcli::{cli, config, error, spotify::DEFAULT_LIMIT, types::TimeRange};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Sign in with Spotify
    Auth,

    /// Remove all stored tokens
    Logout,

    /// Show the session state
    Status,

    /// Show your Spotify profile
    Profile,

    /// Show your top tracks or artists
    Top(TopOptions),

    /// List your playlists
    Playlists(LimitOptions),

    /// List recently played tracks
    Recent(LimitOptions),

    /// Serve the local site with login, callback and home pages
    Serve,

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct TopOptions {
    #[command(subcommand)]
    pub kind: TopKind,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TopKind {
    /// Top tracks
    Tracks(TopQuery),

    /// Top artists
    Artists(TopQuery),
}

#[derive(Parser, Debug, Clone)]
pub struct TopQuery {
    /// short_term (past month), medium_term (past 6 months) or long_term (all time)
    #[clap(long, default_value_t = TimeRange::MediumTerm)]
    pub range: TimeRange,

    /// Number of items, between 1 and 50
    #[clap(long, default_value_t = DEFAULT_LIMIT)]
    pub limit: u32,

    /// Also write the table to polaroid-<kind>-<range>.txt
    #[clap(long)]
    pub save: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct LimitOptions {
    /// Number of items, between 1 and 50
    #[clap(long, default_value_t = DEFAULT_LIMIT)]
    pub limit: u32,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Auth => cli::auth().await,
        Command::Logout => cli::logout().await,
        Command::Status => cli::status().await,
        Command::Profile => cli::profile().await,
        Command::Top(opt) => match opt.kind {
            TopKind::Tracks(q) => cli::top_tracks(q.range, q.limit, q.save).await,
            TopKind::Artists(q) => cli::top_artists(q.range, q.limit, q.save).await,
        },
        Command::Playlists(opt) => cli::playlists(opt.limit).await,
        Command::Recent(opt) => cli::recent(opt.limit).await,
        Command::Serve => cli::serve().await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
