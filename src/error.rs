//! Error types for ftpmock operations

use std::error::Error;
use std::fmt;
use std::io;

/// Result type for adapter operations
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Main error type for the adapter
///
/// Every failure of a command exchange ends up here. Only
/// [`AdapterError::ProtocolWriteError`] is fatal for the session, the rest
/// abort the current exchange and leave the connection usable.
#[derive(Debug)]
pub enum AdapterError {
	/// Payload could not be interpreted as the requested type
	PayloadTypeMismatch { expected: &'static str, found: String },

	/// Response payload does not carry any known result variant
	UnresolvableResult { message: String },

	/// Reply code of a result is not a number
	InvalidReplyCode { code: String },

	/// File of a retrieval result could not be resolved on the file view
	FileResolutionError { path: String, source: io::Error },

	/// Writing the reply to the session failed
	ProtocolWriteError { session_id: String, source: io::Error },

	/// Verb outside the FTP command vocabulary
	UnknownCommand { verb: String },

	/// Marshalling to or from the canonical text form failed
	Marshal { message: String },

	/// The endpoint handler could not produce an answer
	HandlerFailed { message: String },
}

impl AdapterError {
	/// Whether the engine has to drop the connection after this error
	pub fn is_session_fatal(&self) -> bool {
		matches!(self, AdapterError::ProtocolWriteError { .. })
	}
}

impl fmt::Display for AdapterError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AdapterError::PayloadTypeMismatch { expected, found } => {
				write!(f, "Payload type mismatch: expected {}, found {}", expected, found)
			}
			AdapterError::UnresolvableResult { message } => {
				write!(f, "Unable to resolve command result: {}", message)
			}
			AdapterError::InvalidReplyCode { code } => {
				write!(f, "Invalid reply code '{}': not a number", code)
			}
			AdapterError::FileResolutionError { path, source } => {
				write!(f, "Failed to get file '{}' from file system view: {}", path, source)
			}
			AdapterError::ProtocolWriteError { session_id, source } => {
				write!(f, "Failed to write ftp reply on session {}: {}", session_id, source)
			}
			AdapterError::UnknownCommand { verb } => write!(f, "Unknown ftp command: {}", verb),
			AdapterError::Marshal { message } => write!(f, "Marshalling error: {}", message),
			AdapterError::HandlerFailed { message } => {
				write!(f, "Endpoint handler failed: {}", message)
			}
		}
	}
}

impl Error for AdapterError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			AdapterError::FileResolutionError { source, .. } => Some(source),
			AdapterError::ProtocolWriteError { source, .. } => Some(source),
			_ => None,
		}
	}
}

impl From<serde_json::Error> for AdapterError {
	fn from(e: serde_json::Error) -> Self {
		AdapterError::Marshal { message: e.to_string() }
	}
}

impl From<json5::Error> for AdapterError {
	fn from(e: json5::Error) -> Self {
		AdapterError::Marshal { message: e.to_string() }
	}
}

/// Configuration loading errors
#[derive(Debug)]
pub enum ConfigError {
	/// Failed to read the configuration file
	ReadFailed { path: String, source: io::Error },

	/// Configuration file has a syntax error
	ParseFailed { path: String, message: String },

	/// Unsupported configuration file extension
	UnsupportedFormat { path: String },

	/// Environment variable holds an unusable value
	InvalidEnv { name: String, value: String },

	/// Configuration is syntactically fine but semantically wrong
	Invalid { message: String },
}

impl fmt::Display for ConfigError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ConfigError::ReadFailed { path, source } => {
				write!(f, "Failed to read config {}: {}", path, source)
			}
			ConfigError::ParseFailed { path, message } => {
				write!(f, "Failed to parse config {}: {}", path, message)
			}
			ConfigError::UnsupportedFormat { path } => {
				write!(f, "Unsupported config format: {} (use .toml, .json or .json5)", path)
			}
			ConfigError::InvalidEnv { name, value } => {
				write!(f, "Invalid value for {}: '{}'", name, value)
			}
			ConfigError::Invalid { message } => write!(f, "Invalid configuration: {}", message),
		}
	}
}

impl Error for ConfigError {
	fn source(&self) -> Option<&(dyn Error + 'static)> {
		match self {
			ConfigError::ReadFailed { source, .. } => Some(source),
			_ => None,
		}
	}
}


// vim: ts=4
