//! Profile settings and sign-out.

use crate::api::models::ProfileUpdate;
use crate::api::ApiClient;
use crate::auth::AuthSession;
use cliclack::{input, intro, outro, select};
use console::style;

/// Handles the settings menu.
///
/// Offers profile viewing, display-name editing and sign-out in a loop
/// until the user is done.
pub async fn handle_settings(api: &ApiClient, session: &AuthSession) -> Result<(), anyhow::Error> {
    tracing::info!("=== speakai Settings ===");

    ctrlc::set_handler(move || {}).expect("setting Ctrl-C handler");

    intro(style(" settings ").on_white().black())?;

    loop {
        let choice: &str = select("Settings")
            .item("profile", "View profile", "")
            .item("name", "Change display name", "")
            .item("logout", "Sign out", "")
            .item("done", "Done", "")
            .interact()
            .map_err(|e| anyhow::anyhow!("Settings cancelled: {e}"))?;

        match choice {
            "profile" => {
                let profile = api.me().await?;
                session.update_user(&profile)?;
                println!("  {} <{}>", style(&profile.name).bold(), profile.email);
                println!(
                    "  streak: {} days, XP: {}",
                    profile.streak_days, profile.xp_points
                );
            }
            "name" => {
                let current = session.user().map(|u| u.name).unwrap_or_default();
                let name: String = input("New display name:")
                    .default_input(&current)
                    .validate(|value: &String| {
                        if value.trim().is_empty() {
                            Err("Name cannot be empty")
                        } else {
                            Ok(())
                        }
                    })
                    .interact()
                    .map_err(|e| anyhow::anyhow!("Name input cancelled: {e}"))?;

                let update = ProfileUpdate {
                    name: Some(name),
                    ..Default::default()
                };
                let profile = api.update_profile(&update).await?;
                session.update_user(&profile)?;
                println!("  {}", style(format!("Name updated to {}", profile.name)).green());
            }
            "logout" => {
                crate::commands::handle_logout(api, session).await?;
                break;
            }
            _ => break,
        }
    }

    outro("Settings closed.")?;
    Ok(())
}
