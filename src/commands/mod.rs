//! Application command handlers for speakai.
//!
//! This module organizes command handling into separate submodules, each responsible for a
//! specific application command.
//!
//! # Commands
//! - `onboard`: Questionnaire-driven account creation
//! - `login` / `logout`: Session management against the backend
//! - `intro`: Record and analyze a self-introduction
//! - `practice`: Daily reading practice with recording and analysis (default)
//! - `dashboard`: Profile, streak and XP overview
//! - `history`: Locally stored practice results
//! - `settings`: Profile editing and sign-out
//! - `config`: Open configuration file in user's preferred editor
//! - `list_devices`: List available audio input devices
//! - `logs`: Display recent log entries

pub mod config;
pub mod dashboard;
pub mod history;
pub mod intro;
pub mod list_devices;
pub mod login;
pub mod logout;
pub mod logs;
pub mod onboard;
pub mod practice;
pub mod settings;

pub use config::handle_config;
pub use dashboard::handle_dashboard;
pub use history::handle_history;
pub use intro::handle_intro;
pub use list_devices::handle_list_devices;
pub use login::handle_login;
pub use logout::handle_logout;
pub use logs::handle_logs;
pub use onboard::handle_onboard;
pub use practice::handle_practice;
pub use settings::handle_settings;
