//! FTP command vocabulary and parsed requests
//!
//! [`FtpRequest`] is what the engine reads off the control connection,
//! [`FtpCommand`] is the structured command object handed to the endpoint
//! handler inside a request exchange.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AdapterError;

macro_rules! ftp_verbs {
	($($verb:ident),+ $(,)?) => {
		/// Fixed FTP command vocabulary (RFC 959, 2389, 3659 and the X* aliases)
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
		pub enum FtpVerb {
			$($verb),+
		}

		impl FtpVerb {
			/// Wire spelling of the verb
			pub fn as_str(&self) -> &'static str {
				match self {
					$(FtpVerb::$verb => stringify!($verb)),+
				}
			}

			/// All verbs in declaration order
			pub fn all() -> &'static [FtpVerb] {
				&[$(FtpVerb::$verb),+]
			}
		}

		impl FromStr for FtpVerb {
			type Err = AdapterError;

			/// Parse a verb, case-insensitively
			fn from_str(s: &str) -> Result<Self, Self::Err> {
				match s.trim().to_ascii_uppercase().as_str() {
					$(stringify!($verb) => Ok(FtpVerb::$verb),)+
					_ => Err(AdapterError::UnknownCommand { verb: s.to_string() }),
				}
			}
		}
	};
}

ftp_verbs!(
	ABOR, ACCT, ALLO, APPE, CDUP, CWD, DELE, EPRT, EPSV, FEAT, HELP, LANG, LIST, MDTM, MFMT, MKD,
	MLSD, MLST, MODE, NLST, NOOP, OPTS, PASS, PASV, PORT, PWD, QUIT, REIN, REST, RETR, RMD, RNFR,
	RNTO, SITE, SIZE, SMNT, STAT, STOR, STOU, STRU, SYST, TYPE, USER, XCUP, XCWD, XMKD, XPWD, XRMD,
);

impl FtpVerb {
	/// Verbs answered with a file-bearing reply
	pub fn is_transfer(&self) -> bool {
		matches!(self, FtpVerb::RETR)
	}

	/// Verbs answered with a directory listing
	pub fn is_listing(&self) -> bool {
		matches!(self, FtpVerb::LIST | FtpVerb::NLST | FtpVerb::MLSD)
	}

	/// Verbs the engine handles natively in auto-login mode
	pub fn is_login(&self) -> bool {
		matches!(self, FtpVerb::USER | FtpVerb::PASS)
	}
}

impl fmt::Display for FtpVerb {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Raw request line as read from the control connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpRequest {
	/// Command as sent by the client, case preserved
	pub command: String,
	/// Everything after the first space, if anything
	pub argument: Option<String>,
}

impl FtpRequest {
	pub fn new(command: &str, argument: Option<&str>) -> Self {
		FtpRequest { command: command.to_string(), argument: argument.map(str::to_string) }
	}

	/// Parse a request line, stripping the trailing CRLF
	///
	/// Returns `None` for blank lines.
	pub fn parse(line: &str) -> Option<Self> {
		let line = line.trim_end_matches(|c| c == '\r' || c == '\n');
		let line = line.trim_start();
		if line.is_empty() {
			return None;
		}
		match line.find(' ') {
			Some(idx) => {
				let argument = line[idx + 1..].to_string();
				Some(FtpRequest {
					command: line[..idx].to_string(),
					argument: if argument.is_empty() { None } else { Some(argument) },
				})
			}
			None => Some(FtpRequest { command: line.to_string(), argument: None }),
		}
	}

	/// Upper-cased command
	pub fn normalized_command(&self) -> String {
		self.command.to_ascii_uppercase()
	}

	/// Verb of this request, if it belongs to the vocabulary
	pub fn verb(&self) -> Result<FtpVerb, AdapterError> {
		self.command.parse()
	}
}

/// Structured command object carried by request exchanges
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FtpCommand {
	pub signal: FtpVerb,
	#[serde(default)]
	pub arguments: String,
}

impl FtpCommand {
	pub fn new(signal: FtpVerb) -> Self {
		FtpCommand { signal, arguments: String::new() }
	}

	/// Builder-style argument setter
	pub fn arguments(mut self, arguments: impl Into<String>) -> Self {
		self.arguments = arguments.into();
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_verb_parse_is_case_insensitive() {
		assert_eq!("retr".parse::<FtpVerb>().unwrap(), FtpVerb::RETR);
		assert_eq!("Pass".parse::<FtpVerb>().unwrap(), FtpVerb::PASS);
		assert_eq!(" LIST ".parse::<FtpVerb>().unwrap(), FtpVerb::LIST);
	}

	#[test]
	fn test_unknown_verb() {
		let err = "FROB".parse::<FtpVerb>().unwrap_err();
		assert!(matches!(err, AdapterError::UnknownCommand { ref verb } if verb == "FROB"));
	}

	#[test]
	fn test_verb_roundtrips_through_as_str() {
		for verb in FtpVerb::all() {
			assert_eq!(verb.as_str().parse::<FtpVerb>().unwrap(), *verb);
		}
	}

	#[test]
	fn test_verb_classification() {
		assert!(FtpVerb::RETR.is_transfer());
		assert!(FtpVerb::NLST.is_listing());
		assert!(FtpVerb::USER.is_login());
		assert!(!FtpVerb::QUIT.is_login());
	}

	#[test]
	fn test_request_parse() {
		let req = FtpRequest::parse("RETR dir/file name.txt\r\n").unwrap();
		assert_eq!(req.command, "RETR");
		assert_eq!(req.argument.as_deref(), Some("dir/file name.txt"));

		let req = FtpRequest::parse("pwd\r\n").unwrap();
		assert_eq!(req.normalized_command(), "PWD");
		assert_eq!(req.argument, None);

		assert!(FtpRequest::parse("\r\n").is_none());
	}

	#[test]
	fn test_command_builder() {
		let cmd = FtpCommand::new(FtpVerb::PASS).arguments("alice:secret");
		assert_eq!(cmd.signal, FtpVerb::PASS);
		assert_eq!(cmd.arguments, "alice:secret");
	}
}

// vim: ts=4
