//! Configuration management for the SpeakAI client.
//!
//! Handles loading and saving application configuration from TOML files.
//! Configuration covers the backend server location and audio capture
//! settings; it is stored in the user's config directory.

pub mod file;

pub use file::{AudioConfig, ServerConfig, SpeakaiConfig};
