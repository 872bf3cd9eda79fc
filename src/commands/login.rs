//! Sign in against the backend.

use crate::api::{ApiClient, ApiError};
use crate::api::models::LoginRequest;
use crate::auth::AuthSession;
use cliclack::{input, intro, outro, password};
use console::style;

/// Handles email/password sign-in.
///
/// On success the returned tokens and profile are persisted locally so later
/// commands start out authenticated.
pub async fn handle_login(api: &ApiClient, session: &AuthSession) -> Result<(), anyhow::Error> {
    tracing::info!("=== speakai Login ===");

    ctrlc::set_handler(move || {}).expect("setting Ctrl-C handler");

    intro(style(" login ").on_white().black())?;

    let email: String = input("Email address:")
        .interact()
        .map_err(|e| anyhow::anyhow!("Email input cancelled: {e}"))?;

    let account_password = password("Password:")
        .mask('*')
        .interact()
        .map_err(|e| anyhow::anyhow!("Password input cancelled: {e}"))?;

    let spinner = cliclack::spinner();
    spinner.start("Signing in...");

    let request = LoginRequest {
        email,
        password: account_password,
    };

    match api.login(&request).await {
        Ok(response) => {
            spinner.stop("Signed in");
            session.establish(&response)?;
            tracing::info!("Signed in as {}", response.user.email);
            outro(format!("Welcome back, {}!", response.user.name))?;
            Ok(())
        }
        Err(ApiError::Status { status, .. }) if status == 401 || status == 400 => {
            spinner.error("Sign-in failed");
            Err(anyhow::anyhow!("Invalid email or password."))
        }
        Err(ApiError::Network(_)) => {
            spinner.error("Sign-in failed");
            Err(anyhow::anyhow!(
                "Could not reach the server. Check your connection and SPEAKAI_SERVER_URL."
            ))
        }
        Err(e) => {
            spinner.error("Sign-in failed");
            Err(e.into())
        }
    }
}
