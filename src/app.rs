//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::api::ApiClient;
use crate::auth::{AuthPhase, AuthSession, SessionStore};
use crate::commands;
use crate::config::SpeakaiConfig;
use crate::logging;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use console::style;
use std::io;
use std::process;
use std::sync::Arc;

/// An English speaking practice companion with AI feedback
#[derive(Parser)]
#[command(name = "speakai")]
#[command(version)]
#[command(about = "Practice speaking English and get AI feedback on your pronunciation")]
#[command(
    long_about = "Practice speaking English from your terminal.\n\nRecord yourself reading the daily article or introducing yourself,\nsubmit the recording for AI analysis, and track your progress.\n\nDEFAULT COMMAND:\n    If no command is specified, 'practice' is used by default.\n\nEXAMPLES:\n    # Create an account (runs the onboarding questionnaire)\n    $ speakai onboard\n    \n    # Daily reading practice\n    $ speakai\n    $ speakai practice\n    \n    # Record your self-introduction\n    $ speakai intro\n    \n    # See your streak and XP\n    $ speakai dashboard\n    \n    # Review past practice sessions\n    $ speakai history"
)]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/speakai/speakai.toml\n    Session:            ~/.local/share/speakai/session.json\n    Logs:               ~/.local/state/speakai/speakai.log.*\n\nThe server address can be overridden with the SPEAKAI_SERVER_URL environment variable."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Daily reading practice with recording and AI feedback (default)
    ///
    /// Shows today's article. Press r to hear it read aloud, Space to
    /// record yourself, p to replay your take, and a to analyze it.
    #[command(visible_alias = "p")]
    Practice,

    /// Record and analyze your self-introduction
    ///
    /// A short free-form introduction that unlocks personalized feedback.
    /// Scores fluency, pronunciation, vocabulary and overall impression.
    Intro,

    /// Create an account with the onboarding questionnaire
    #[command(visible_alias = "signup")]
    Onboard,

    /// Sign in to an existing account
    Login,

    /// Sign out and clear the stored session
    Logout,

    /// Show your profile, streak and XP
    #[command(visible_alias = "d")]
    Dashboard,

    /// View past practice sessions and scores
    #[command(visible_alias = "h")]
    History,

    /// Edit your profile or sign out
    Settings,

    /// Open configuration file in your preferred editor
    ///
    /// Edit audio and server settings. Uses $EDITOR or falls back to nano/vi.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio input devices
    ///
    /// Shows device IDs, names, and configurations to help configure
    /// the correct input device in speakai.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    /// Useful for troubleshooting issues.
    Logs,

    /// Generate shell completion script
    ///
    /// Generate completion script for your shell. Save the output to your
    /// shell's completion directory or source it directly.
    ///
    /// Examples:
    ///   speakai completions bash > speakai.bash
    ///   speakai completions zsh > _speakai
    ///   speakai completions fish > speakai.fish
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Errors
/// - If logging initialization fails
/// - If configuration loading fails
/// - If command execution fails
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Handle commands that don't need logging or config setup
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "speakai", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => {
            return match commands::handle_list_devices() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        Some(Commands::Logs) => {
            return match commands::handle_logs() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        _ => {}
    }

    // Initialize logging for all other commands
    logging::init_logging()?;

    let config = SpeakaiConfig::load()?;

    let store = SessionStore::open_default()?;
    let session = Arc::new(AuthSession::new(store));
    session.restore()?;

    let api = ApiClient::new(&config.server, Arc::clone(&session))?;

    // Watch for session expiry signaled by any 401 during the command.
    let mut expired = session.subscribe_expired();

    let result = match cli.command {
        None | Some(Commands::Practice) => {
            require_auth(&session)?;
            commands::handle_practice(&config, &api).await
        }
        Some(Commands::Intro) => {
            require_auth(&session)?;
            commands::handle_intro(&config, &api, &session).await
        }
        Some(Commands::Onboard) => commands::handle_onboard(&config, &api, &session).await,
        Some(Commands::Login) => commands::handle_login(&api, &session).await,
        Some(Commands::Logout) => commands::handle_logout(&api, &session).await,
        Some(Commands::Dashboard) => {
            require_auth(&session)?;
            commands::handle_dashboard(&api, &session).await
        }
        Some(Commands::History) => commands::handle_history(),
        Some(Commands::Settings) => {
            require_auth(&session)?;
            commands::handle_settings(&api, &session).await
        }
        Some(Commands::Config) => commands::handle_config(),
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    };

    if expired.try_recv().is_ok() {
        eprintln!(
            "{}",
            style("Your session has expired. Run `speakai login` to sign in again.").yellow()
        );
    }

    result
}

/// Rejects commands that require a signed-in user.
fn require_auth(session: &AuthSession) -> Result<(), anyhow::Error> {
    match session.phase() {
        AuthPhase::Authenticated => Ok(()),
        _ => Err(anyhow::anyhow!(
            "You are not signed in. Run `speakai login`, or `speakai onboard` to create an account."
        )),
    }
}
