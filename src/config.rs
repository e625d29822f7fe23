//! Configuration for the adapter and the standalone server
//!
//! [`AdapterConfig`] is all the adapter itself needs. [`ServerConfig`] wraps it
//! with what the `ftpmock serve` command needs on top.
//!
//! The server configuration follows a priority chain:
//! 1. Built-in defaults (ServerConfig::default())
//! 2. Config file (.toml, .json or .json5)
//! 3. Environment variables (FTPMOCK_* prefix)
//! 4. CLI flags (highest priority, applied by the binary)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::command::FtpVerb;
use crate::error::ConfigError;
use crate::reply::parse_reply_code;
use crate::result::CommandResult;
use crate::session::User;

/// Adapter behavior flags
///
/// Built once at server start and shared read-only by all sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AdapterConfig {
	/// Engine handles USER/PASS itself, the handler never sees them
	pub auto_login: bool,

	/// Engine handles connect/disconnect itself, no PASS/QUIT exchange is synthesized
	pub auto_connect: bool,
}

/// Scripted answer for the static handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptedReply {
	/// Verb this reply answers
	pub command: String,

	/// Glob pattern the command argument has to match, any argument when unset
	#[serde(default)]
	pub argument: Option<String>,

	pub result: CommandResult,
}

/// Configuration of the standalone server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
	/// Address to listen on
	pub bind: String,

	pub port: u16,

	/// Root of the file system view for users without a home directory
	pub root_dir: PathBuf,

	/// Banner sent when the engine accepts a connection itself
	pub welcome: String,

	pub adapter: AdapterConfig,

	/// Accounts known to the engine's own login handling
	pub users: Vec<User>,

	/// Answers of the static handler, first match wins
	pub replies: Vec<ScriptedReply>,
}

impl Default for ServerConfig {
	fn default() -> Self {
		ServerConfig {
			bind: "127.0.0.1".to_string(),
			port: 2221,
			root_dir: PathBuf::from("."),
			welcome: "ftpmock ready".to_string(),
			adapter: AdapterConfig::default(),
			users: vec![],
			replies: vec![],
		}
	}
}

impl ServerConfig {
	/// Load a config file, picking the parser by extension
	pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
		let display = path.display().to_string();
		let content = fs::read_to_string(path)
			.map_err(|source| ConfigError::ReadFailed { path: display.clone(), source })?;

		let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
		match ext.as_str() {
			"toml" => toml::from_str(&content)
				.map_err(|e| ConfigError::ParseFailed { path: display, message: e.to_string() }),
			"json" | "json5" => json5::from_str(&content)
				.map_err(|e| ConfigError::ParseFailed { path: display, message: e.to_string() }),
			_ => Err(ConfigError::UnsupportedFormat { path: display }),
		}
	}

	/// Apply FTPMOCK_* environment overrides
	pub fn apply_env(&mut self) -> Result<(), ConfigError> {
		self.apply_vars(|name| env::var(name).ok())
	}

	fn apply_vars<F>(&mut self, lookup: F) -> Result<(), ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(value) = lookup("FTPMOCK_AUTO_LOGIN") {
			self.adapter.auto_login = parse_bool("FTPMOCK_AUTO_LOGIN", &value)?;
		}
		if let Some(value) = lookup("FTPMOCK_AUTO_CONNECT") {
			self.adapter.auto_connect = parse_bool("FTPMOCK_AUTO_CONNECT", &value)?;
		}
		if let Some(value) = lookup("FTPMOCK_PORT") {
			self.port = value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
				name: "FTPMOCK_PORT".to_string(),
				value: value.clone(),
			})?;
		}
		if let Some(value) = lookup("FTPMOCK_ROOT") {
			self.root_dir = PathBuf::from(value);
		}
		Ok(())
	}

	/// Check what serde cannot
	pub fn validate(&self) -> Result<(), ConfigError> {
		for user in &self.users {
			if user.name.trim().is_empty() {
				return Err(ConfigError::Invalid { message: "user with empty name".to_string() });
			}
		}

		for (idx, reply) in self.replies.iter().enumerate() {
			reply.command.parse::<FtpVerb>().map_err(|e| ConfigError::Invalid {
				message: format!("reply #{}: {}", idx + 1, e),
			})?;
			parse_reply_code(reply.result.reply_code()).map_err(|e| ConfigError::Invalid {
				message: format!("reply #{}: {}", idx + 1, e),
			})?;
			if let Some(pattern) = &reply.argument {
				glob::Pattern::new(pattern).map_err(|e| ConfigError::Invalid {
					message: format!("reply #{}: bad argument pattern '{}': {}", idx + 1, pattern, e),
				})?;
			}
		}
		Ok(())
	}

	/// Account with the given name
	pub fn find_user(&self, name: &str) -> Option<&User> {
		self.users.iter().find(|u| u.name == name)
	}
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" => Ok(false),
		_ => Err(ConfigError::InvalidEnv { name: name.to_string(), value: value.to_string() }),
	}
}


// vim: ts=4
