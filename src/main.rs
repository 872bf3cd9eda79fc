mod api;
mod app;
mod audio;
mod auth;
mod commands;
mod config;
mod logging;
mod onboarding;
mod practice;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    app::run().await
}
