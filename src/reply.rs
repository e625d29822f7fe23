//! Protocol replies and the reply builder
//!
//! The builder turns a response exchange into an [`FtpReply`]. The result
//! variant decides the reply text; the reply code always comes from the
//! variant and must be numeric.

use std::fmt;

use crate::error::{AdapterError, AdapterResult};
use crate::exchange::Exchange;
use crate::filesystem::{FileSystemView, ResolvedFile};
use crate::marshal::Marshaller;
use crate::result::CommandResult;
use crate::session::User;

/// Reply written to the control connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FtpReply {
	pub code: u16,
	pub text: String,
	/// File to stream for retrieval replies
	pub file: Option<ResolvedFile>,
}

impl FtpReply {
	pub fn new(code: u16, text: impl Into<String>) -> Self {
		FtpReply { code, text: text.into(), file: None }
	}

	pub fn with_file(mut self, file: ResolvedFile) -> Self {
		self.file = Some(file);
		self
	}

	/// Wire form, CRLF terminated
	///
	/// Text spanning several lines uses the `code-` continuation format.
	/// Line breaks inside the text never reach the wire raw: `\n` splits
	/// lines and a stray `\r` becomes a space.
	pub fn to_wire(&self) -> String {
		let lines = self.wire_lines();
		if lines.len() <= 1 {
			return format!("{} {}\r\n", self.code, lines.first().map(String::as_str).unwrap_or(""));
		}

		let last = lines.len() - 1;
		let mut out = format!("{}-{}\r\n", self.code, lines[0]);
		for line in &lines[1..last] {
			out.push(' ');
			out.push_str(line);
			out.push_str("\r\n");
		}
		out.push_str(&format!("{} {}\r\n", self.code, lines[last]));
		out
	}

	fn wire_lines(&self) -> Vec<String> {
		let mut lines: Vec<String> = self
			.text
			.split('\n')
			.map(|line| line.trim_end_matches('\r').replace('\r', " "))
			.collect();
		if lines.len() > 1 && lines.last().map_or(false, |l| l.is_empty()) {
			lines.pop();
		}
		lines
	}
}

impl fmt::Display for FtpReply {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {}", self.code, self.text)
	}
}

/// Parse a textual reply code
pub fn parse_reply_code(code: &str) -> AdapterResult<u16> {
	code.trim().parse::<u16>().map_err(|_| AdapterError::InvalidReplyCode { code: code.to_string() })
}

/// Builds protocol replies from response exchanges
pub struct ReplyBuilder<'a> {
	marshaller: &'a dyn Marshaller,
	files: &'a dyn FileSystemView,
}

impl<'a> ReplyBuilder<'a> {
	pub fn new(marshaller: &'a dyn Marshaller, files: &'a dyn FileSystemView) -> Self {
		ReplyBuilder { marshaller, files }
	}

	/// Extract the result variant of a response
	pub fn result_of(&self, response: &Exchange) -> AdapterResult<CommandResult> {
		response.as_typed::<CommandResult>(self.marshaller).map_err(|e| {
			AdapterError::UnresolvableResult {
				message: format!("response '{}': {}", response.signal, e),
			}
		})
	}

	/// Build the reply for `response`, resolving files for `user`
	pub async fn build(&self, response: &Exchange, user: Option<&User>) -> AdapterResult<FtpReply> {
		let result = self.result_of(response)?;
		let code = parse_reply_code(result.reply_code())?;

		match result {
			CommandResult::FileRetrieval { reply_text, file_path, .. } => {
				let file = self.files.file(user, &file_path).await.map_err(|source| {
					AdapterError::FileResolutionError { path: file_path.clone(), source }
				})?;
				Ok(FtpReply::new(code, reply_text).with_file(file))
			}
			CommandResult::Listing { entries, .. } => Ok(FtpReply::new(code, entries.join(" "))),
			CommandResult::Generic { reply_text, .. } => Ok(FtpReply::new(code, reply_text)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::filesystem::NativeFileSystem;
	use crate::marshal::JsonMarshaller;
	use std::fs;
	use std::io;
	use tempfile::TempDir;

	#[test]
	fn test_wire_single_line() {
		assert_eq!(FtpReply::new(226, "/a /b").to_wire(), "226 /a /b\r\n");
	}

	#[test]
	fn test_wire_multi_line() {
		let reply = FtpReply::new(211, "Features:\nMDTM\nSIZE\nEnd");
		assert_eq!(reply.to_wire(), "211-Features:\r\n MDTM\r\n SIZE\r\n211 End\r\n");
	}

	#[test]
	fn test_wire_never_carries_raw_line_breaks() {
		assert_eq!(FtpReply::new(200, "Done\n").to_wire(), "200 Done\r\n");
		assert_eq!(FtpReply::new(200, "Done\r\n").to_wire(), "200 Done\r\n");
		assert_eq!(FtpReply::new(226, "/a\r/b").to_wire(), "226 /a /b\r\n");
		assert_eq!(FtpReply::new(200, "").to_wire(), "200 \r\n");

		let reply = FtpReply::new(211, "Features:\r\nSIZE\r\nEnd\r\n");
		assert_eq!(reply.to_wire(), "211-Features:\r\n SIZE\r\n211 End\r\n");
	}

	#[tokio::test]
	async fn test_build_listing_with_line_breaks_in_entries() {
		let dir = TempDir::new().unwrap();
		let files = NativeFileSystem::new(dir.path());
		let builder = ReplyBuilder::new(&JsonMarshaller, &files);

		let response = Exchange::result(CommandResult::listing("226", vec!["/a\r", "/b\r/c"]));
		let reply = builder.build(&response, None).await.unwrap();
		assert_eq!(reply.to_wire(), "226 /a  /b /c\r\n");
	}

	#[test]
	fn test_parse_reply_code() {
		assert_eq!(parse_reply_code("550").unwrap(), 550);
		assert_eq!(parse_reply_code(" 226 ").unwrap(), 226);
		assert!(matches!(
			parse_reply_code("OK"),
			Err(AdapterError::InvalidReplyCode { ref code }) if code == "OK"
		));
	}

	#[tokio::test]
	async fn test_build_generic() {
		let dir = TempDir::new().unwrap();
		let files = NativeFileSystem::new(dir.path());
		let builder = ReplyBuilder::new(&JsonMarshaller, &files);

		let response = Exchange::result(CommandResult::generic("257", "\"/\" is current directory"));
		let reply = builder.build(&response, None).await.unwrap();
		assert_eq!(reply, FtpReply::new(257, "\"/\" is current directory"));
	}

	#[tokio::test]
	async fn test_build_listing_keeps_order() {
		let dir = TempDir::new().unwrap();
		let files = NativeFileSystem::new(dir.path());
		let builder = ReplyBuilder::new(&JsonMarshaller, &files);

		let response = Exchange::result(CommandResult::listing("226", vec!["/c", "/a", "/b"]));
		let reply = builder.build(&response, None).await.unwrap();
		assert_eq!(reply.text, "/c /a /b");
		assert_eq!(reply.code, 226);
	}

	#[tokio::test]
	async fn test_build_file_retrieval() {
		let dir = TempDir::new().unwrap();
		fs::write(dir.path().join("data.bin"), b"\x00\x01\x02").unwrap();
		let files = NativeFileSystem::new(dir.path());
		let builder = ReplyBuilder::new(&JsonMarshaller, &files);

		let response = Exchange::result(CommandResult::file("150", "Opening", "/data.bin"));
		let reply = builder.build(&response, None).await.unwrap();
		assert_eq!(reply.code, 150);
		assert_eq!(reply.file.as_ref().map(|f| f.size), Some(3));
	}

	#[tokio::test]
	async fn test_build_missing_file_fails() {
		let dir = TempDir::new().unwrap();
		let files = NativeFileSystem::new(dir.path());
		let builder = ReplyBuilder::new(&JsonMarshaller, &files);

		let response = Exchange::result(CommandResult::file("150", "Opening", "/missing.bin"));
		match builder.build(&response, None).await {
			Err(AdapterError::FileResolutionError { path, source }) => {
				assert_eq!(path, "/missing.bin");
				assert_eq!(source.kind(), io::ErrorKind::NotFound);
			}
			other => panic!("expected FileResolutionError, got {:?}", other),
		}
	}

	#[tokio::test]
	async fn test_build_non_numeric_code_fails() {
		let dir = TempDir::new().unwrap();
		let files = NativeFileSystem::new(dir.path());
		let builder = ReplyBuilder::new(&JsonMarshaller, &files);

		let response = Exchange::result(CommandResult::generic("two hundred", "OK"));
		let err = builder.build(&response, None).await.unwrap_err();
		assert!(matches!(err, AdapterError::InvalidReplyCode { .. }));
	}

	#[tokio::test]
	async fn test_build_unresolvable_payload() {
		let dir = TempDir::new().unwrap();
		let files = NativeFileSystem::new(dir.path());
		let builder = ReplyBuilder::new(&JsonMarshaller, &files);

		let err = builder.build(&Exchange::response("just text"), None).await.unwrap_err();
		assert!(matches!(err, AdapterError::UnresolvableResult { .. }));
	}
}

// vim: ts=4
