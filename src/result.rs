//! Command result variants a handler may answer with

use serde::{Deserialize, Serialize};

/// Reply code used when the handler has nothing to say
pub const DEFAULT_REPLY_CODE: &str = "200";
/// Reply text used when the handler has nothing to say
pub const DEFAULT_REPLY_TEXT: &str = "OK";

/// Result of a command exchange
///
/// Reply codes are kept as text the way handlers provide them; they are
/// parsed only when the reply is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum CommandResult {
	/// Plain reply
	Generic { reply_code: String, reply_text: String },

	/// Reply carrying a file from the user's file system view
	FileRetrieval { reply_code: String, reply_text: String, file_path: String },

	/// Directory listing, entries in the order given
	Listing { reply_code: String, entries: Vec<String> },
}

impl CommandResult {
	pub fn generic(reply_code: impl Into<String>, reply_text: impl Into<String>) -> Self {
		CommandResult::Generic { reply_code: reply_code.into(), reply_text: reply_text.into() }
	}

	pub fn file(
		reply_code: impl Into<String>,
		reply_text: impl Into<String>,
		file_path: impl Into<String>,
	) -> Self {
		CommandResult::FileRetrieval {
			reply_code: reply_code.into(),
			reply_text: reply_text.into(),
			file_path: file_path.into(),
		}
	}

	pub fn listing<I, S>(reply_code: impl Into<String>, entries: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		CommandResult::Listing {
			reply_code: reply_code.into(),
			entries: entries.into_iter().map(Into::into).collect(),
		}
	}

	/// The no-op success result substituted for an absent handler answer
	pub fn success() -> Self {
		CommandResult::generic(DEFAULT_REPLY_CODE, DEFAULT_REPLY_TEXT)
	}

	pub fn reply_code(&self) -> &str {
		match self {
			CommandResult::Generic { reply_code, .. }
			| CommandResult::FileRetrieval { reply_code, .. }
			| CommandResult::Listing { reply_code, .. } => reply_code,
		}
	}

	/// Short name of the active variant, used in log output
	pub fn kind(&self) -> &'static str {
		match self {
			CommandResult::Generic { .. } => "generic",
			CommandResult::FileRetrieval { .. } => "fileRetrieval",
			CommandResult::Listing { .. } => "listing",
		}
	}
}


// vim: ts=4
