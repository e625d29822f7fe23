//! FTP session lifecycle adapter
//!
//! Sits between the protocol engine and the endpoint handler. The engine
//! calls the [`SessionHooks`] at each point of a session's life; the adapter
//! translates commands into request exchanges, asks the handler, builds the
//! reply and writes it, then tells the engine through [`HookOutcome`] whether
//! its own handling still has to run.
//!
//! The adapter holds no per-session state. Everything it owns is read-only,
//! so one instance serves all sessions concurrently.

use async_trait::async_trait;
use std::sync::Arc;

use crate::command::{FtpCommand, FtpRequest, FtpVerb};
use crate::config::AdapterConfig;
use crate::error::{AdapterError, AdapterResult};
use crate::exchange::{Exchange, HandlerResponse};
use crate::filesystem::FileSystemView;
use crate::handler::EndpointHandler;
use crate::logging::*;
use crate::marshal::{JsonMarshaller, Marshaller};
use crate::reply::{FtpReply, ReplyBuilder};
use crate::session::{FtpSession, FtpStatistics, User};

/// What the engine does after a hook returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookOutcome {
	/// Run the engine's own handling
	Default,
	/// The hook already answered, skip the engine's handling
	Skip,
	/// Close the session
	Disconnect,
}

/// Hooks a protocol engine calls during a session's life
#[async_trait]
pub trait SessionHooks: Send + Sync {
	/// Server is starting
	fn on_init(&self, stats: &FtpStatistics);

	/// Server is shutting down
	fn on_destroy(&self);

	/// New connection accepted
	async fn on_connect(&self, session: &mut dyn FtpSession) -> AdapterResult<HookOutcome>;

	/// Command received, before the engine handles it
	async fn before_command(
		&self,
		session: &mut dyn FtpSession,
		request: &FtpRequest,
	) -> AdapterResult<HookOutcome>;

	/// Engine has handled a command
	async fn after_command(
		&self,
		session: &mut dyn FtpSession,
		request: &FtpRequest,
		reply: &FtpReply,
	) -> HookOutcome;

	/// Connection is closing
	async fn on_disconnect(&self, session: &mut dyn FtpSession) -> AdapterResult<HookOutcome>;
}

/// Adapter forwarding FTP sessions to an endpoint handler
pub struct FtpServerAdapter {
	config: AdapterConfig,
	handler: Arc<dyn EndpointHandler>,
	files: Arc<dyn FileSystemView>,
	marshaller: Arc<dyn Marshaller>,
}

impl FtpServerAdapter {
	pub fn new(
		config: AdapterConfig,
		handler: Arc<dyn EndpointHandler>,
		files: Arc<dyn FileSystemView>,
	) -> Self {
		FtpServerAdapter { config, handler, files, marshaller: Arc::new(JsonMarshaller) }
	}

	/// Replace the default JSON marshaller
	pub fn with_marshaller(mut self, marshaller: Arc<dyn Marshaller>) -> Self {
		self.marshaller = marshaller;
		self
	}

	pub fn config(&self) -> &AdapterConfig {
		&self.config
	}

	/// Command object for a request read off the wire
	pub fn translate(&self, request: &FtpRequest) -> AdapterResult<FtpCommand> {
		let verb = request.verb()?;
		Ok(FtpCommand::new(verb).arguments(request.argument.clone().unwrap_or_default()))
	}

	/// Synthesized command standing for "authenticate this connection"
	pub fn connect_command(&self, user: Option<&User>) -> FtpCommand {
		FtpCommand::new(FtpVerb::PASS).arguments(credentials_of(user))
	}

	/// Synthesized command standing for "log out"
	pub fn disconnect_command(&self, user: Option<&User>) -> FtpCommand {
		FtpCommand::new(FtpVerb::QUIT).arguments(credentials_of(user))
	}

	/// Run a command through the handler
	///
	/// The request payload is handed over in canonical text form. The
	/// returned exchange always carries a result; an absent answer becomes the
	/// default success result.
	pub async fn handle_message(&self, command: FtpCommand) -> AdapterResult<Exchange> {
		let request = Exchange::command(command).canonicalize(self.marshaller.as_ref())?;
		let text = request.as_typed::<String>(self.marshaller.as_ref())?;
		debug!("Received request on ftp server: '{}':\n{}", request.signal, text);

		let response = self.handler.handle(request).await?;
		Ok(HandlerResponse::into_exchange(response))
	}

	/// Handle `command` and build its reply without writing it
	pub async fn reply_for(
		&self,
		command: FtpCommand,
		user: Option<&User>,
	) -> AdapterResult<FtpReply> {
		let response = self.handle_message(command).await?;
		ReplyBuilder::new(self.marshaller.as_ref(), self.files.as_ref()).build(&response, user).await
	}

	async fn process(&self, session: &mut dyn FtpSession, command: FtpCommand) -> AdapterResult<()> {
		let reply = self.reply_for(command, session.user()).await?;
		write_reply(session, &reply).await
	}
}

#[async_trait]
impl SessionHooks for FtpServerAdapter {
	fn on_init(&self, stats: &FtpStatistics) {
		debug!("Total FTP logins: {}", stats.total_logins);
	}

	fn on_destroy(&self) {
		info!("FTP server shutting down ...");
	}

	async fn on_connect(&self, session: &mut dyn FtpSession) -> AdapterResult<HookOutcome> {
		debug!("Received new FTP connection: '{}'", session.session_id());

		if self.config.auto_connect {
			return Ok(HookOutcome::Default);
		}

		let command = self.connect_command(session.user());
		self.process(session, command).await?;
		Ok(HookOutcome::Skip)
	}

	async fn before_command(
		&self,
		session: &mut dyn FtpSession,
		request: &FtpRequest,
	) -> AdapterResult<HookOutcome> {
		let command = request.normalized_command();
		debug!("Received FTP command: '{}'", command);

		if self.config.auto_login && (command == "USER" || command == "PASS") {
			return Ok(HookOutcome::Default);
		}

		let command = self.translate(request)?;
		self.process(session, command).await?;
		Ok(HookOutcome::Skip)
	}

	async fn after_command(
		&self,
		_session: &mut dyn FtpSession,
		_request: &FtpRequest,
		_reply: &FtpReply,
	) -> HookOutcome {
		HookOutcome::Default
	}

	async fn on_disconnect(&self, session: &mut dyn FtpSession) -> AdapterResult<HookOutcome> {
		if !self.config.auto_connect {
			let command = self.disconnect_command(session.user());
			self.process(session, command).await?;
		}

		debug!("Closing FTP connection: '{}'", session.session_id());
		Ok(HookOutcome::Disconnect)
	}
}

/// Write `reply`, wrapping transport failures
pub async fn write_reply(session: &mut dyn FtpSession, reply: &FtpReply) -> AdapterResult<()> {
	session.write(reply).await.map_err(|source| AdapterError::ProtocolWriteError {
		session_id: session.session_id().to_string(),
		source,
	})
}

// Sessions without a user yet synthesize with empty name and password
fn credentials_of(user: Option<&User>) -> String {
	user.map(User::credentials).unwrap_or_else(|| ":".to_string())
}


// vim: ts=4
