//! Endpoint handler contract and bundled handlers
//!
//! The handler decides what a command answers. It is called once per
//! translated command, from the task of the session that issued it, and is
//! never retried.

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::command::FtpVerb;
use crate::config::ScriptedReply;
use crate::error::{AdapterError, AdapterResult, ConfigError};
use crate::exchange::{Exchange, HandlerResponse, HEADER_ARGUMENTS};
use crate::logging::*;

/// Decides the response to a request exchange
#[async_trait]
pub trait EndpointHandler: Send + Sync {
	/// Answer `request`; `None` means "nothing to say", which the adapter
	/// turns into the default success reply
	async fn handle(&self, request: Exchange) -> AdapterResult<Option<HandlerResponse>>;
}

/// Handler backed by a plain function
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<F> EndpointHandler for FnHandler<F>
where
	F: Fn(Exchange) -> Option<HandlerResponse> + Send + Sync,
{
	async fn handle(&self, request: Exchange) -> AdapterResult<Option<HandlerResponse>> {
		Ok((self.0)(request))
	}
}

struct Rule {
	verb: FtpVerb,
	argument: Option<glob::Pattern>,
	reply: ScriptedReply,
}

/// Answers from a fixed list of scripted replies
///
/// Rules are tried in order; the first one whose verb matches the request
/// signal and whose argument pattern (if any) matches the request argument
/// wins. Requests no rule matches get no answer.
pub struct StaticHandler {
	rules: Vec<Rule>,
}

impl StaticHandler {
	pub fn new(replies: &[ScriptedReply]) -> Result<Self, ConfigError> {
		let mut rules = Vec::with_capacity(replies.len());
		for reply in replies {
			let verb = reply.command.parse::<FtpVerb>().map_err(|e| ConfigError::Invalid {
				message: e.to_string(),
			})?;
			let argument = match &reply.argument {
				Some(pattern) => Some(glob::Pattern::new(pattern).map_err(|e| {
					ConfigError::Invalid {
						message: format!("bad argument pattern '{}': {}", pattern, e),
					}
				})?),
				None => None,
			};
			rules.push(Rule { verb, argument, reply: reply.clone() });
		}
		Ok(StaticHandler { rules })
	}

	fn find(&self, request: &Exchange) -> Option<&ScriptedReply> {
		let verb = request.signal.parse::<FtpVerb>().ok()?;
		let argument = request.header(HEADER_ARGUMENTS).unwrap_or("");
		self.rules
			.iter()
			.find(|rule| {
				rule.verb == verb
					&& rule.argument.as_ref().map(|p| p.matches(argument)).unwrap_or(true)
			})
			.map(|rule| &rule.reply)
	}
}

#[async_trait]
impl EndpointHandler for StaticHandler {
	async fn handle(&self, request: Exchange) -> AdapterResult<Option<HandlerResponse>> {
		match self.find(&request) {
			Some(reply) => {
				debug!("Scripted reply for {}: {}", request.signal, reply.result.kind());
				Ok(Some(Exchange::result(reply.result.clone()).into()))
			}
			None => Ok(None),
		}
	}
}

/// Request waiting for an answer from the test side of a [`ChannelHandler`]
#[derive(Debug)]
pub struct PendingRequest {
	pub request: Exchange,
	reply: oneshot::Sender<Option<HandlerResponse>>,
}

impl PendingRequest {
	/// Answer the request
	pub fn respond(self, response: impl Into<HandlerResponse>) {
		// The session may be gone already; nothing left to answer then
		let _ = self.reply.send(Some(response.into()));
	}

	/// Answer with the default success reply
	pub fn respond_default(self) {
		let _ = self.reply.send(None);
	}
}

/// Forwards requests to a channel and waits for the answer
///
/// Lets a test body receive every request exchange and decide the answer
/// while the server keeps running.
#[derive(Clone)]
pub struct ChannelHandler {
	tx: mpsc::Sender<PendingRequest>,
}

impl ChannelHandler {
	/// Handler plus the receiving end the test side reads from
	pub fn new(buffer: usize) -> (Self, mpsc::Receiver<PendingRequest>) {
		let (tx, rx) = mpsc::channel(buffer);
		(ChannelHandler { tx }, rx)
	}
}

#[async_trait]
impl EndpointHandler for ChannelHandler {
	async fn handle(&self, request: Exchange) -> AdapterResult<Option<HandlerResponse>> {
		let (reply_tx, reply_rx) = oneshot::channel();
		self.tx.send(PendingRequest { request, reply: reply_tx }).await.map_err(|_| {
			AdapterError::HandlerFailed { message: "request channel closed".to_string() }
		})?;
		reply_rx.await.map_err(|_| AdapterError::HandlerFailed {
			message: "request dropped without an answer".to_string(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::command::FtpCommand;
	use crate::result::CommandResult;

	fn scripted(command: &str, argument: Option<&str>, result: CommandResult) -> ScriptedReply {
		ScriptedReply { command: command.to_string(), argument: argument.map(str::to_string), result }
	}

	fn request(verb: FtpVerb, arguments: &str) -> Exchange {
		Exchange::command(FtpCommand::new(verb).arguments(arguments))
	}

	fn answer_of(response: Option<HandlerResponse>) -> Option<Exchange> {
		response.map(|r| HandlerResponse::into_exchange(Some(r)))
	}

	#[tokio::test]
	async fn test_static_handler_first_match_wins() {
		let handler = StaticHandler::new(&[
			scripted("RETR", Some("*.txt"), CommandResult::file("150", "Opening", "/a.txt")),
			scripted("RETR", None, CommandResult::generic("550", "No such file")),
		])
		.unwrap();

		let text = answer_of(handler.handle(request(FtpVerb::RETR, "notes.txt")).await.unwrap());
		assert_eq!(text.unwrap().payload, CommandResult::file("150", "Opening", "/a.txt").into());

		let other = answer_of(handler.handle(request(FtpVerb::RETR, "image.png")).await.unwrap());
		assert_eq!(other.unwrap().payload, CommandResult::generic("550", "No such file").into());
	}

	#[tokio::test]
	async fn test_static_handler_no_match() {
		let handler = StaticHandler::new(&[scripted("PWD", None, CommandResult::success())]).unwrap();
		assert!(handler.handle(request(FtpVerb::CWD, "/")).await.unwrap().is_none());
	}

	#[test]
	fn test_static_handler_rejects_bad_rules() {
		assert!(StaticHandler::new(&[scripted("FROB", None, CommandResult::success())]).is_err());
		assert!(StaticHandler::new(&[scripted("LIST", Some("[*"), CommandResult::success())])
			.is_err());
	}

	#[tokio::test]
	async fn test_fn_handler() {
		let handler = FnHandler(|req: Exchange| Some(HandlerResponse::from(req.signal)));
		let response = handler.handle(request(FtpVerb::NOOP, "")).await.unwrap();
		assert_eq!(response, Some(HandlerResponse::from("NOOP")));
	}

	#[tokio::test]
	async fn test_channel_handler_roundtrip() {
		let (handler, mut rx) = ChannelHandler::new(4);

		let test_side = tokio::spawn(async move {
			let pending = rx.recv().await.unwrap();
			assert_eq!(pending.request.signal, "MKD");
			pending.respond(CommandResult::generic("257", "created"));
		});

		let response = handler.handle(request(FtpVerb::MKD, "new")).await.unwrap();
		test_side.await.unwrap();
		assert_eq!(response, Some(CommandResult::generic("257", "created").into()));
	}

	#[tokio::test]
	async fn test_channel_handler_closed() {
		let (handler, rx) = ChannelHandler::new(1);
		drop(rx);
		let err = handler.handle(request(FtpVerb::NOOP, "")).await.unwrap_err();
		assert!(matches!(err, AdapterError::HandlerFailed { .. }));
	}
}

// vim: ts=4
