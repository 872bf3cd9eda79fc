//! Account creation with the onboarding questionnaire.
//!
//! Walks the user through the question bank, collects account details and
//! registers against the backend. Single-select steps offer a "Back" item to
//! revisit the previous question; answers at revisited steps are retained.

use crate::api::{ApiClient, ApiError};
use crate::api::models::SignupRequest;
use crate::auth::AuthSession;
use crate::config::SpeakaiConfig;
use crate::onboarding::{Advance, Wizard};
use cliclack::{confirm, input, intro, multiselect, note, outro, password, select};
use console::style;

/// Sentinel select value for the "Back" navigation item.
const BACK: usize = usize::MAX;

/// Handles questionnaire-driven signup.
///
/// The questionnaire must be completed before account details are asked for;
/// an empty selection keeps the user on the current question. On success the
/// returned tokens are persisted and the user is offered the
/// self-introduction recording right away.
pub async fn handle_onboard(
    config: &SpeakaiConfig,
    api: &ApiClient,
    session: &AuthSession,
) -> Result<(), anyhow::Error> {
    tracing::info!("=== speakai Onboarding ===");

    ctrlc::set_handler(move || {}).expect("setting Ctrl-C handler");

    intro(style(" welcome to speakai ").on_white().black())?;

    if session.is_authenticated() {
        note(
            "Already signed in",
            "Creating a new account will replace the current session.",
        )?;
    }

    let answers = run_questionnaire()?;
    tracing::debug!("Questionnaire completed with {} answers", answers.len());

    let name: String = input("Your name:")
        .validate(|value: &String| {
            if value.trim().is_empty() {
                Err("Name cannot be empty")
            } else {
                Ok(())
            }
        })
        .interact()
        .map_err(|e| anyhow::anyhow!("Name input cancelled: {e}"))?;

    let email: String = input("Email address:")
        .validate(|value: &String| {
            if value.contains('@') {
                Ok(())
            } else {
                Err("Enter a valid email address")
            }
        })
        .interact()
        .map_err(|e| anyhow::anyhow!("Email input cancelled: {e}"))?;

    let account_password = password("Choose a password:")
        .mask('*')
        .interact()
        .map_err(|e| anyhow::anyhow!("Password input cancelled: {e}"))?;

    let request = SignupRequest {
        name,
        email,
        password: account_password,
        onboarding: answers,
    };

    let spinner = cliclack::spinner();
    spinner.start("Creating your account...");

    let response = match api.register(&request).await {
        Ok(response) => {
            spinner.stop("Account created");
            response
        }
        Err(e) => {
            spinner.error("Registration failed");
            return Err(describe_signup_error(e));
        }
    };

    session.establish(&response)?;
    tracing::info!("Registered and signed in as {}", response.user.email);

    outro(format!("Welcome, {}!", response.user.name))?;

    // The self-introduction unlocks personalized feedback; offer it now but
    // never force it.
    let record_now = confirm("Record your self-introduction now?")
        .initial_value(true)
        .interact()
        .unwrap_or(false);

    if record_now {
        crate::commands::handle_intro(config, api, session).await?;
    } else {
        println!(
            "{}",
            style("You can record it any time with `speakai intro`.").dim()
        );
    }

    Ok(())
}

/// Runs the question bank to completion and returns the answer map.
fn run_questionnaire() -> Result<crate::onboarding::OnboardingAnswers, anyhow::Error> {
    let mut wizard = Wizard::new();

    loop {
        let (prompt, options, multi) = {
            let step = wizard.current_step();
            (step.prompt, step.options, step.multi)
        };
        let heading = format!("[{}/{}] {}", wizard.index() + 1, wizard.len(), prompt);

        if multi {
            let mut prompt_widget = multiselect(&heading).required(false);
            for option in options {
                prompt_widget = prompt_widget.item(*option, *option, "");
            }
            let picked: Vec<&str> = prompt_widget
                .interact()
                .map_err(|e| anyhow::anyhow!("Onboarding cancelled: {e}"))?;
            wizard.set_multi(picked.iter().map(|s| s.to_string()).collect());
        } else {
            let mut prompt_widget = select(&heading);
            for (index, option) in options.iter().enumerate() {
                prompt_widget = prompt_widget.item(index, *option, "");
            }
            if wizard.index() > 0 {
                prompt_widget = prompt_widget.item(BACK, "Back", "previous question");
            }
            let selected: usize = prompt_widget
                .interact()
                .map_err(|e| anyhow::anyhow!("Onboarding cancelled: {e}"))?;
            if selected == BACK {
                wizard.back();
                continue;
            }
            wizard.select(options[selected]);
        }

        match wizard.next() {
            Advance::Completed(answers) => return Ok(answers),
            Advance::Advanced => {}
            Advance::Stayed => {
                note("Required", "Pick at least one option to continue.")?;
            }
        }
    }
}

fn describe_signup_error(error: ApiError) -> anyhow::Error {
    match error {
        ApiError::Status {
            status: 409,
            message,
        } => anyhow::anyhow!("An account with that email already exists: {message}"),
        ApiError::Network(_) => anyhow::anyhow!(
            "Could not reach the server. Check your connection and SPEAKAI_SERVER_URL."
        ),
        other => anyhow::Error::from(other),
    }
}
