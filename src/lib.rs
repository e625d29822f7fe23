//! # ftpmock - FTP server adapter for test harnesses
//!
//! ftpmock lets a test impersonate an FTP server. A protocol engine reports
//! session events and commands to the [`adapter::FtpServerAdapter`], which
//! turns each of them into a protocol-agnostic [`exchange::Exchange`], asks a
//! pluggable [`handler::EndpointHandler`] for the answer and writes the
//! matching FTP reply back to the session.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ftpmock::adapter::FtpServerAdapter;
//! use ftpmock::config::ServerConfig;
//! use ftpmock::filesystem::NativeFileSystem;
//! use ftpmock::handler::ChannelHandler;
//! use ftpmock::result::CommandResult;
//! use ftpmock::server::FtpServer;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let (handler, mut requests) = ChannelHandler::new(16);
//!     let adapter = FtpServerAdapter::new(
//!         config.adapter,
//!         Arc::new(handler),
//!         Arc::new(NativeFileSystem::new(&config.root_dir)),
//!     );
//!     tokio::spawn(FtpServer::new(config, Arc::new(adapter)).run());
//!
//!     while let Some(pending) = requests.recv().await {
//!         pending.respond(CommandResult::generic("250", "OK"));
//!     }
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod command;
pub mod config;
pub mod error;
pub mod exchange;
pub mod filesystem;
pub mod handler;
pub mod logging;
pub mod marshal;
pub mod reply;
pub mod result;
pub mod server;
pub mod session;

// Re-export commonly used types and functions
pub use adapter::{FtpServerAdapter, HookOutcome, SessionHooks};
pub use config::{AdapterConfig, ServerConfig};
pub use error::{AdapterError, AdapterResult, ConfigError};
pub use exchange::{Exchange, HandlerResponse, Payload};
pub use result::CommandResult;

// vim: ts=4
