//! Canonical text form of structured payloads
//!
//! Handlers see request payloads as text. Structured commands and results are
//! marshalled into that text form and unmarshalled back when a typed view is
//! requested.

use crate::command::FtpCommand;
use crate::error::AdapterResult;
use crate::result::CommandResult;

/// Converts structured payloads to and from their canonical text form
pub trait Marshaller: Send + Sync {
	fn marshal_command(&self, command: &FtpCommand) -> AdapterResult<String>;

	fn unmarshal_command(&self, text: &str) -> AdapterResult<FtpCommand>;

	fn marshal_result(&self, result: &CommandResult) -> AdapterResult<String>;

	fn unmarshal_result(&self, text: &str) -> AdapterResult<CommandResult>;
}

/// JSON marshaller
///
/// Writes compact JSON and reads JSON5, so hand-written payloads in test
/// scripts may use comments, unquoted keys and trailing commas.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonMarshaller;

impl Marshaller for JsonMarshaller {
	fn marshal_command(&self, command: &FtpCommand) -> AdapterResult<String> {
		Ok(serde_json::to_string(command)?)
	}

	fn unmarshal_command(&self, text: &str) -> AdapterResult<FtpCommand> {
		Ok(json5::from_str(text)?)
	}

	fn marshal_result(&self, result: &CommandResult) -> AdapterResult<String> {
		Ok(serde_json::to_string(result)?)
	}

	fn unmarshal_result(&self, text: &str) -> AdapterResult<CommandResult> {
		Ok(json5::from_str(text)?)
	}
}


// vim: ts=4
