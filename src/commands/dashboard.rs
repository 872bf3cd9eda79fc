//! Profile, streak and XP overview.

use crate::api::{ApiClient, ApiError};
use crate::auth::AuthSession;
use console::style;

/// Handles the dashboard view.
///
/// Fetches the live profile from the backend and refreshes the cached copy.
/// When the server is unreachable, the cached profile is shown instead so
/// the dashboard still works offline.
pub async fn handle_dashboard(api: &ApiClient, session: &AuthSession) -> Result<(), anyhow::Error> {
    tracing::info!("=== speakai Dashboard ===");

    let profile = match api.me().await {
        Ok(profile) => {
            session.update_user(&profile)?;
            profile
        }
        Err(ApiError::SessionExpired) => return Err(ApiError::SessionExpired.into()),
        Err(e) => {
            tracing::warn!("Profile fetch failed, falling back to cached copy: {e}");
            match session.user() {
                Some(cached) => {
                    println!(
                        "{}",
                        style("Offline: showing your last synced profile.").dim()
                    );
                    cached
                }
                None => return Err(e.into()),
            }
        }
    };

    println!();
    println!("  {}", style(&profile.name).bold());
    println!("  {}", style(&profile.email).dim());
    println!();
    println!(
        "  {}  {} day streak",
        style("🔥").bold(),
        style(profile.streak_days).bold()
    );
    println!(
        "  {}  {} XP",
        style("⭐").bold(),
        style(profile.xp_points).bold()
    );
    println!();

    if session.intro_completed() {
        println!("  {}", style("Self-introduction: completed").green());
    } else {
        println!(
            "  {}",
            style("Self-introduction: pending. Run `speakai intro`").yellow()
        );
    }
    println!();

    Ok(())
}
