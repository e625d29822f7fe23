//! Minimal FTP engine driving the session hooks
//!
//! Accepts control connections, reads CRLF-terminated commands and calls the
//! hooks around each of them. Its own handling is small: a
//! banner, USER/PASS against the configured accounts, QUIT, and `502` for
//! everything else. Data connections are not opened; file-bearing replies
//! are answered on the control connection only.

use async_trait::async_trait;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use crate::adapter::{HookOutcome, SessionHooks};
use crate::command::FtpRequest;
use crate::config::ServerConfig;
use crate::error::AdapterError;
use crate::logging::*;
use crate::reply::FtpReply;
use crate::session::{FtpSession, FtpStatistics, User};

/// Longest command line accepted, CRLF included
pub const MAX_LINE_LENGTH: u64 = 4096;

/// Session of a TCP control connection
struct TcpSession<W> {
	id: String,
	user: Option<User>,
	/// Name given by USER, waiting for PASS
	pending_user: Option<String>,
	writer: W,
}

#[async_trait]
impl<W> FtpSession for TcpSession<W>
where
	W: AsyncWrite + Unpin + Send + Sync,
{
	fn session_id(&self) -> &str {
		&self.id
	}

	fn user(&self) -> Option<&User> {
		self.user.as_ref()
	}

	async fn write(&mut self, reply: &FtpReply) -> io::Result<()> {
		self.writer.write_all(reply.to_wire().as_bytes()).await?;
		self.writer.flush().await
	}
}

#[derive(Default)]
struct Counters {
	total_logins: AtomicU64,
	current_connections: AtomicU64,
}

impl Counters {
	fn snapshot(&self) -> FtpStatistics {
		FtpStatistics {
			total_logins: self.total_logins.load(Ordering::Relaxed),
			current_connections: self.current_connections.load(Ordering::Relaxed),
		}
	}
}

/// FTP server forwarding sessions to a set of hooks
pub struct FtpServer {
	config: Arc<ServerConfig>,
	hooks: Arc<dyn SessionHooks>,
	counters: Arc<Counters>,
}

impl FtpServer {
	pub fn new(config: ServerConfig, hooks: Arc<dyn SessionHooks>) -> Self {
		FtpServer { config: Arc::new(config), hooks, counters: Arc::new(Counters::default()) }
	}

	/// Current counters
	pub fn statistics(&self) -> FtpStatistics {
		self.counters.snapshot()
	}

	/// Bind the configured address
	pub async fn bind(&self) -> io::Result<TcpListener> {
		TcpListener::bind((self.config.bind.as_str(), self.config.port)).await
	}

	/// Bind and serve until Ctrl-C
	pub async fn run(self) -> io::Result<()> {
		let listener = self.bind().await?;
		info!("FTP server listening on {}", listener.local_addr()?);
		self.serve(listener, async {
			let _ = tokio::signal::ctrl_c().await;
		})
		.await
	}

	/// Accept connections on `listener` until `shutdown` completes
	pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> io::Result<()>
	where
		F: Future<Output = ()>,
	{
		self.hooks.on_init(&self.counters.snapshot());
		tokio::pin!(shutdown);

		loop {
			tokio::select! {
				accepted = listener.accept() => {
					let (stream, peer) = match accepted {
						Ok(a) => a,
						Err(e) => {
							warn!("Failed to accept FTP connection: {}", e);
							continue;
						}
					};
					let config = self.config.clone();
					let hooks = self.hooks.clone();
					let counters = self.counters.clone();
					tokio::spawn(async move {
						handle_connection(stream, peer, config, hooks, counters).await;
					});
				}
				_ = &mut shutdown => break,
			}
		}

		self.hooks.on_destroy();
		Ok(())
	}
}

async fn handle_connection(
	stream: TcpStream,
	peer: SocketAddr,
	config: Arc<ServerConfig>,
	hooks: Arc<dyn SessionHooks>,
	counters: Arc<Counters>,
) {
	counters.current_connections.fetch_add(1, Ordering::Relaxed);
	let (read_half, write_half) = stream.into_split();
	let mut reader = BufReader::new(read_half);
	let mut session = TcpSession {
		id: uuid::Uuid::new_v4().to_string(),
		user: None,
		pending_user: None,
		writer: write_half,
	};
	info!("FTP connection {} from {}", session.id, peer);

	let result = run_session(&mut reader, &mut session, &config, hooks.as_ref(), &counters).await;
	if let Err(e) = result {
		warn!("FTP session {} ended with error: {}", session.id, e);
	}

	match hooks.on_disconnect(&mut session).await {
		Ok(_) => {}
		Err(e) => warn!("Disconnect of FTP session {} failed: {}", session.id, e),
	}
	counters.current_connections.fetch_sub(1, Ordering::Relaxed);
	info!("FTP connection {} closed", session.id);
}

async fn run_session<R, W>(
	reader: &mut R,
	session: &mut TcpSession<W>,
	config: &ServerConfig,
	hooks: &dyn SessionHooks,
	counters: &Counters,
) -> Result<(), AdapterError>
where
	R: AsyncBufRead + Unpin + Send,
	W: AsyncWrite + Unpin + Send + Sync,
{
	match hooks.on_connect(session).await {
		Ok(HookOutcome::Default) => {
			let banner = FtpReply::new(220, config.welcome.clone());
			engine_write(session, &banner).await?;
		}
		Ok(HookOutcome::Skip) => {}
		Ok(HookOutcome::Disconnect) => return Ok(()),
		Err(e) => reject(session, e).await?,
	}

	let mut buf = Vec::new();
	loop {
		let line = match read_command(reader, &mut buf).await {
			Ok(CommandLine::Text(line)) => line,
			Ok(CommandLine::TooLong) => {
				warn!("FTP session {}: command line too long", session.id);
				let reply = FtpReply::new(500, "Syntax error, command line too long.");
				engine_write(session, &reply).await?;
				continue;
			}
			Ok(CommandLine::Eof) => return Ok(()),
			Err(e) => {
				debug!("Read error on FTP session {}: {}", session.id, e);
				return Ok(());
			}
		};

		let request = match FtpRequest::parse(&line) {
			Some(request) => request,
			None => continue,
		};

		match hooks.before_command(session, &request).await {
			Ok(HookOutcome::Skip) => {}
			Ok(HookOutcome::Default) => {
				let reply = native_reply(session, &request, config, counters);
				engine_write(session, &reply).await?;
				let outcome = hooks.after_command(session, &request, &reply).await;
				if outcome == HookOutcome::Disconnect || request.normalized_command() == "QUIT" {
					return Ok(());
				}
			}
			Ok(HookOutcome::Disconnect) => return Ok(()),
			Err(e) => reject(session, e).await?,
		}
	}
}

enum CommandLine {
	Text(String),
	TooLong,
	Eof,
}

/// Read one command line of at most [`MAX_LINE_LENGTH`] bytes
///
/// Bytes that are not valid UTF-8 are decoded lossily. The remainder of an
/// overlong line is discarded.
async fn read_command<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<CommandLine>
where
	R: AsyncBufRead + Unpin + Send,
{
	buf.clear();
	let n = (&mut *reader).take(MAX_LINE_LENGTH).read_until(b'\n', buf).await?;
	if n == 0 {
		return Ok(CommandLine::Eof);
	}

	if buf.last() != Some(&b'\n') && n as u64 == MAX_LINE_LENGTH {
		loop {
			buf.clear();
			let n = (&mut *reader).take(MAX_LINE_LENGTH).read_until(b'\n', buf).await?;
			if n == 0 || buf.last() == Some(&b'\n') {
				break;
			}
		}
		return Ok(CommandLine::TooLong);
	}

	Ok(CommandLine::Text(String::from_utf8_lossy(buf).into_owned()))
}

/// Answer a failed exchange, or give up on the session if it cannot be answered
async fn reject<W>(session: &mut TcpSession<W>, err: AdapterError) -> Result<(), AdapterError>
where
	W: AsyncWrite + Unpin + Send + Sync,
{
	if err.is_session_fatal() {
		return Err(err);
	}
	warn!("FTP session {}: {}", session.id, err);
	engine_write(session, &error_reply(&err)).await
}

async fn engine_write<W>(session: &mut TcpSession<W>, reply: &FtpReply) -> Result<(), AdapterError>
where
	W: AsyncWrite + Unpin + Send + Sync,
{
	crate::adapter::write_reply(session, reply).await
}

/// Protocol reply for a failed exchange
pub fn error_reply(err: &AdapterError) -> FtpReply {
	match err {
		AdapterError::UnknownCommand { .. } => {
			FtpReply::new(500, "Syntax error, command unrecognized.")
		}
		AdapterError::FileResolutionError { path, .. } => {
			FtpReply::new(550, format!("Requested action not taken: {} unavailable.", path))
		}
		_ => FtpReply::new(451, format!("Requested action aborted: {}", err)),
	}
}

/// The engine's own handling of a command
fn native_reply<W>(
	session: &mut TcpSession<W>,
	request: &FtpRequest,
	config: &ServerConfig,
	counters: &Counters,
) -> FtpReply {
	let argument = request.argument.clone().unwrap_or_default();
	match request.normalized_command().as_str() {
		"USER" => {
			session.pending_user = Some(argument);
			FtpReply::new(331, "User name okay, need password.")
		}
		"PASS" => {
			let user = session
				.pending_user
				.take()
				.and_then(|name| config.find_user(&name).cloned())
				.filter(|user| user.password == argument);
			match user {
				Some(user) => {
					debug!("FTP session {} logged in as {}", session.id, user.name);
					session.user = Some(user);
					counters.total_logins.fetch_add(1, Ordering::Relaxed);
					FtpReply::new(230, "User logged in, proceed.")
				}
				None => FtpReply::new(530, "Not logged in."),
			}
		}
		"QUIT" => FtpReply::new(221, "Goodbye."),
		_ => FtpReply::new(502, "Command not implemented."),
	}
}


// vim: ts=4
