// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the dock job services.
//!
//! Values are layered from built-in defaults, an optional TOML file and
//! `DOCK_SERVER_*` environment variables, in increasing precedence.
//!
//! ```ignore
//! use dock_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("job runner at {}", config.jobs.jobservice_url);
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
	pub jobs: JobsConfig,
	pub database: DatabaseConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`DOCK_SERVER_*`)
/// 2. Config file (`/etc/dock/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment variables only.
pub fn load_config_from_env() -> Result<ServerConfig, ConfigError> {
	let mut merged = ServerConfigLayer::default();
	merged.merge(EnvSource.load()?);
	finalize(merged)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let jobs = layer.jobs.unwrap_or_default().finalize();
	let database = layer.database.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_config(&jobs)?;

	info!(
		jobservice_url = %jobs.jobservice_url,
		core_internal_url = %jobs.core_internal_url,
		database = %database.url,
		scan_check_timeout_secs = jobs.scan_check_timeout_secs,
		"Server configuration loaded"
	);

	Ok(ServerConfig {
		jobs,
		database,
		logging,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(jobs: &JobsConfig) -> Result<(), ConfigError> {
	if jobs.scan_check_timeout_secs <= jobs.scan_first_check_secs {
		return Err(ConfigError::Validation(format!(
			"scan_check_timeout_secs ({}) must be greater than scan_first_check_secs ({})",
			jobs.scan_check_timeout_secs, jobs.scan_first_check_secs
		)));
	}
	if jobs.list_limit == 0 {
		return Err(ConfigError::Validation(
			"list_limit must be at least 1".to_string(),
		));
	}
	if jobs.max_fails == 0 {
		return Err(ConfigError::Validation(
			"max_fails must be at least 1".to_string(),
		));
	}

	Ok(())
}
