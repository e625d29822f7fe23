//! Protocol-agnostic request/response envelope
//!
//! An [`Exchange`] is what the endpoint handler sees: a signal naming the
//! command, a payload, and free-form headers. The handler never deals with
//! reply codes on the wire or with sessions; it only reads and produces
//! exchanges.

use std::collections::BTreeMap;

use crate::command::FtpCommand;
use crate::error::{AdapterError, AdapterResult};
use crate::marshal::Marshaller;
use crate::result::CommandResult;

/// Header carrying the command verb of a request
pub const HEADER_COMMAND: &str = "ftp_command";
/// Header carrying the raw command argument of a request
pub const HEADER_ARGUMENTS: &str = "ftp_arguments";
/// Header carrying the reply code of a result
pub const HEADER_REPLY_CODE: &str = "ftp_reply_code";

/// Signal of response exchanges built from a bare result
pub const RESULT_SIGNAL: &str = "RESULT";

/// Exchange body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
	Empty,
	Text(String),
	Command(FtpCommand),
	Result(CommandResult),
}

impl Payload {
	/// Whether the payload is a structured object rather than text
	pub fn is_structured(&self) -> bool {
		matches!(self, Payload::Command(_) | Payload::Result(_))
	}

	fn describe(&self) -> String {
		match self {
			Payload::Empty => "empty payload".to_string(),
			Payload::Text(text) => format!("text '{}'", text),
			Payload::Command(cmd) => format!("command {}", cmd.signal),
			Payload::Result(result) => format!("{} result", result.kind()),
		}
	}
}

impl From<String> for Payload {
	fn from(text: String) -> Self {
		Payload::Text(text)
	}
}

impl From<&str> for Payload {
	fn from(text: &str) -> Self {
		Payload::Text(text.to_string())
	}
}

impl From<FtpCommand> for Payload {
	fn from(cmd: FtpCommand) -> Self {
		Payload::Command(cmd)
	}
}

impl From<CommandResult> for Payload {
	fn from(result: CommandResult) -> Self {
		Payload::Result(result)
	}
}

/// Types a payload can be coerced into
pub trait FromPayload: Sized {
	/// Name used in mismatch errors
	const TYPE_NAME: &'static str;

	fn from_payload(payload: &Payload, marshaller: &dyn Marshaller) -> AdapterResult<Self>;
}

impl FromPayload for String {
	const TYPE_NAME: &'static str = "text";

	fn from_payload(payload: &Payload, marshaller: &dyn Marshaller) -> AdapterResult<Self> {
		match payload {
			Payload::Empty => Ok(String::new()),
			Payload::Text(text) => Ok(text.clone()),
			Payload::Command(cmd) => marshaller.marshal_command(cmd),
			Payload::Result(result) => marshaller.marshal_result(result),
		}
	}
}

impl FromPayload for FtpCommand {
	const TYPE_NAME: &'static str = "command";

	fn from_payload(payload: &Payload, marshaller: &dyn Marshaller) -> AdapterResult<Self> {
		match payload {
			Payload::Command(cmd) => Ok(cmd.clone()),
			Payload::Text(text) => {
				marshaller.unmarshal_command(text).map_err(|_| mismatch::<Self>(payload))
			}
			_ => Err(mismatch::<Self>(payload)),
		}
	}
}

impl FromPayload for CommandResult {
	const TYPE_NAME: &'static str = "command result";

	fn from_payload(payload: &Payload, marshaller: &dyn Marshaller) -> AdapterResult<Self> {
		match payload {
			Payload::Result(result) => Ok(result.clone()),
			Payload::Text(text) => {
				marshaller.unmarshal_result(text).map_err(|_| mismatch::<Self>(payload))
			}
			_ => Err(mismatch::<Self>(payload)),
		}
	}
}

fn mismatch<T: FromPayload>(payload: &Payload) -> AdapterError {
	AdapterError::PayloadTypeMismatch { expected: T::TYPE_NAME, found: payload.describe() }
}

/// Request or response unit exchanged with the endpoint handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
	pub signal: String,
	pub payload: Payload,
	pub headers: BTreeMap<String, String>,
}

impl Exchange {
	pub fn new(signal: impl Into<String>, payload: impl Into<Payload>) -> Self {
		Exchange { signal: signal.into(), payload: payload.into(), headers: BTreeMap::new() }
	}

	/// Request exchange for a command
	pub fn command(cmd: FtpCommand) -> Self {
		Exchange::new(cmd.signal.as_str(), Payload::Empty)
			.with_header(HEADER_COMMAND, cmd.signal.as_str())
			.with_header(HEADER_ARGUMENTS, cmd.arguments.clone())
			.with_payload(cmd)
	}

	/// Response exchange for a result
	pub fn result(result: CommandResult) -> Self {
		let code = result.reply_code().to_string();
		Exchange::new(RESULT_SIGNAL, result).with_header(HEADER_REPLY_CODE, code)
	}

	/// Response exchange wrapping a raw handler payload, no headers
	pub fn response(payload: impl Into<Payload>) -> Self {
		Exchange::new(RESULT_SIGNAL, payload)
	}

	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());
		self
	}

	pub fn with_payload(mut self, payload: impl Into<Payload>) -> Self {
		self.payload = payload.into();
		self
	}

	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(name).map(String::as_str)
	}

	/// Payload coerced to `T`
	pub fn as_typed<T: FromPayload>(&self, marshaller: &dyn Marshaller) -> AdapterResult<T> {
		T::from_payload(&self.payload, marshaller)
	}

	/// Replace a structured payload by its canonical text form
	///
	/// Text and empty payloads are left alone. Signal and headers are kept.
	pub fn canonicalize(mut self, marshaller: &dyn Marshaller) -> AdapterResult<Self> {
		if self.payload.is_structured() {
			let text = self.as_typed::<String>(marshaller)?;
			self.payload = Payload::Text(text);
		}
		Ok(self)
	}
}

/// What a handler may answer with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerResponse {
	/// A full response exchange, used as is
	Exchange(Exchange),
	/// A bare payload, wrapped into a response exchange without headers
	Payload(Payload),
}

impl HandlerResponse {
	/// Response exchange for an optional handler answer
	///
	/// An absent answer becomes the default success result.
	pub fn into_exchange(response: Option<HandlerResponse>) -> Exchange {
		match response {
			Some(HandlerResponse::Exchange(exchange)) => exchange,
			Some(HandlerResponse::Payload(payload)) => Exchange::response(payload),
			None => Exchange::result(CommandResult::success()),
		}
	}
}

impl From<Exchange> for HandlerResponse {
	fn from(exchange: Exchange) -> Self {
		HandlerResponse::Exchange(exchange)
	}
}

impl From<CommandResult> for HandlerResponse {
	fn from(result: CommandResult) -> Self {
		HandlerResponse::Payload(Payload::Result(result))
	}
}

impl From<String> for HandlerResponse {
	fn from(text: String) -> Self {
		HandlerResponse::Payload(Payload::Text(text))
	}
}

impl From<&str> for HandlerResponse {
	fn from(text: &str) -> Self {
		HandlerResponse::Payload(Payload::Text(text.to_string()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::command::FtpVerb;
	use crate::marshal::JsonMarshaller;

	#[test]
	fn test_command_exchange_headers() {
		let exchange = Exchange::command(FtpCommand::new(FtpVerb::CWD).arguments("/pub"));
		assert_eq!(exchange.signal, "CWD");
		assert_eq!(exchange.header(HEADER_COMMAND), Some("CWD"));
		assert_eq!(exchange.header(HEADER_ARGUMENTS), Some("/pub"));
		assert!(exchange.payload.is_structured());
	}

	#[test]
	fn test_canonicalize_keeps_content() {
		let cmd = FtpCommand::new(FtpVerb::STOR).arguments("upload.bin");
		let exchange = Exchange::command(cmd.clone()).canonicalize(&JsonMarshaller).unwrap();

		assert!(matches!(exchange.payload, Payload::Text(_)));
		assert_eq!(exchange.as_typed::<FtpCommand>(&JsonMarshaller).unwrap(), cmd);
		assert_eq!(exchange.header(HEADER_ARGUMENTS), Some("upload.bin"));
	}

	#[test]
	fn test_as_typed_result_from_text() {
		let exchange =
			Exchange::response(r#"{"type":"generic","replyCode":"250","replyText":"Done"}"#);
		let result = exchange.as_typed::<CommandResult>(&JsonMarshaller).unwrap();
		assert_eq!(result, CommandResult::generic("250", "Done"));
	}

	#[test]
	fn test_as_typed_mismatch() {
		let exchange = Exchange::response("hello");
		let err = exchange.as_typed::<CommandResult>(&JsonMarshaller).unwrap_err();
		assert!(matches!(err, AdapterError::PayloadTypeMismatch { expected: "command result", .. }));

		let exchange = Exchange::command(FtpCommand::new(FtpVerb::NOOP));
		assert!(exchange.as_typed::<CommandResult>(&JsonMarshaller).is_err());
	}

	#[test]
	fn test_absent_response_is_default_success() {
		let exchange = HandlerResponse::into_exchange(None);
		assert_eq!(
			exchange.as_typed::<CommandResult>(&JsonMarshaller).unwrap(),
			CommandResult::success()
		);
		assert_eq!(exchange.header(HEADER_REPLY_CODE), Some("200"));
	}

	#[test]
	fn test_exchange_response_is_reused() {
		let original = Exchange::result(CommandResult::generic("226", "Transfer complete"))
			.with_header("custom", "kept");
		let exchange = HandlerResponse::into_exchange(Some(original.clone().into()));
		assert_eq!(exchange, original);
	}

	#[test]
	fn test_raw_response_is_wrapped_without_headers() {
		let exchange = HandlerResponse::into_exchange(Some(CommandResult::success().into()));
		assert!(exchange.headers.is_empty());
		assert_eq!(exchange.signal, RESULT_SIGNAL);
	}
}

// vim: ts=4
