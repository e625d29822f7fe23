//! Session capability provided by the protocol engine
//!
//! Sessions belong to the engine. The adapter borrows one per hook call,
//! reads the user identity from it and writes replies through it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::PathBuf;

use crate::reply::FtpReply;

/// User identity attached to a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	pub name: String,
	pub password: String,
	/// Root of the user's file system view, server root when unset
	#[serde(default)]
	pub home_directory: Option<PathBuf>,
}

impl User {
	pub fn new(name: impl Into<String>, password: impl Into<String>) -> Self {
		User { name: name.into(), password: password.into(), home_directory: None }
	}

	pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
		self.home_directory = Some(home.into());
		self
	}

	/// `name:password`, the argument of synthesized connect/disconnect commands
	pub fn credentials(&self) -> String {
		format!("{}:{}", self.name, self.password)
	}
}

/// Per-connection state owned by the protocol engine
#[async_trait]
pub trait FtpSession: Send + Sync {
	fn session_id(&self) -> &str;

	/// User of the session, once known
	fn user(&self) -> Option<&User>;

	/// Write a reply to the control connection
	async fn write(&mut self, reply: &FtpReply) -> io::Result<()>;
}

/// Server-wide counters passed to the init hook
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FtpStatistics {
	pub total_logins: u64,
	pub current_connections: u64,
}

/// In-memory session collecting written replies
///
/// Useful for driving the adapter without a network connection.
#[derive(Debug, Default)]
pub struct MemorySession {
	pub id: String,
	pub user: Option<User>,
	pub replies: Vec<FtpReply>,
	/// When set, every write fails with this error kind
	pub fail_writes: Option<io::ErrorKind>,
}

impl MemorySession {
	pub fn new(id: impl Into<String>) -> Self {
		MemorySession { id: id.into(), ..Default::default() }
	}

	pub fn with_user(mut self, user: User) -> Self {
		self.user = Some(user);
		self
	}
}

#[async_trait]
impl FtpSession for MemorySession {
	fn session_id(&self) -> &str {
		&self.id
	}

	fn user(&self) -> Option<&User> {
		self.user.as_ref()
	}

	async fn write(&mut self, reply: &FtpReply) -> io::Result<()> {
		if let Some(kind) = self.fail_writes {
			return Err(io::Error::new(kind, "session write failed"));
		}
		self.replies.push(reply.clone());
		Ok(())
	}
}


// vim: ts=4
