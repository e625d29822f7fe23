use clap::{Arg, ArgAction, Command};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ftpmock::adapter::FtpServerAdapter;
use ftpmock::config::ServerConfig;
use ftpmock::filesystem::NativeFileSystem;
use ftpmock::handler::StaticHandler;
use ftpmock::logging::{self, info};
use ftpmock::server::FtpServer;

/// Defaults, then config file, then environment, then CLI flags
fn load_config(matches: &clap::ArgMatches) -> Result<ServerConfig, Box<dyn Error>> {
	let mut config = match matches.get_one::<String>("config") {
		Some(path) => ServerConfig::from_file(Path::new(path))?,
		None => ServerConfig::default(),
	};
	config.apply_env()?;

	if let Some(bind) = matches.get_one::<String>("bind") {
		config.bind = bind.clone();
	}
	if let Some(port) = matches.get_one::<String>("port") {
		config.port = port.parse().map_err(|_| format!("Invalid port: {}", port))?;
	}
	if let Some(root) = matches.get_one::<String>("root") {
		config.root_dir = PathBuf::from(root);
	}
	if matches.get_flag("auto-login") {
		config.adapter.auto_login = true;
	}
	if matches.get_flag("auto-connect") {
		config.adapter.auto_connect = true;
	}

	config.validate()?;
	Ok(config)
}

async fn serve(config: ServerConfig) -> Result<(), Box<dyn Error>> {
	let handler = StaticHandler::new(&config.replies)?;
	let files = NativeFileSystem::new(&config.root_dir);
	let adapter = FtpServerAdapter::new(config.adapter, Arc::new(handler), Arc::new(files));

	info!(
		"Starting ftpmock (autoLogin={}, autoConnect={}, {} scripted replies)",
		config.adapter.auto_login,
		config.adapter.auto_connect,
		config.replies.len()
	);
	FtpServer::new(config, Arc::new(adapter)).run().await?;
	Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
	logging::init_tracing();

	let matches = Command::new("ftpmock")
		.version(env!("CARGO_PKG_VERSION"))
		.about("FTP server whose replies are scripted by a test")
		.subcommand_required(true)
		.subcommand(
			Command::new("serve")
				.about("Run the FTP server")
				.arg(
					Arg::new("config")
						.short('c')
						.long("config")
						.value_name("FILE")
						.help("Config file (.toml, .json or .json5)"),
				)
				.arg(Arg::new("bind").long("bind").value_name("ADDR").help("Listen address"))
				.arg(Arg::new("port").short('p').long("port").value_name("PORT").help("Listen port"))
				.arg(
					Arg::new("root")
						.short('r')
						.long("root")
						.value_name("DIR")
						.help("Root of the file system view"),
				)
				.arg(
					Arg::new("auto-login")
						.long("auto-login")
						.action(ArgAction::SetTrue)
						.help("Handle USER/PASS in the server instead of the handler"),
				)
				.arg(
					Arg::new("auto-connect")
						.long("auto-connect")
						.action(ArgAction::SetTrue)
						.help("Do not forward connect/disconnect to the handler"),
				),
		)
		.subcommand(
			Command::new("check-config")
				.about("Validate a config file")
				.arg(Arg::new("file").required(true)),
		)
		.get_matches();

	if let Some(sub_matches) = matches.subcommand_matches("serve") {
		let config = load_config(sub_matches)?;
		return serve(config).await;
	} else if let Some(sub_matches) = matches.subcommand_matches("check-config") {
		let file =
			sub_matches.get_one::<String>("file").ok_or("check-config: file argument required")?;
		let config = ServerConfig::from_file(Path::new(file))?;
		config.validate()?;
		StaticHandler::new(&config.replies)?;
		println!(
			"{}: OK ({} users, {} scripted replies)",
			file,
			config.users.len(),
			config.replies.len()
		);
	}

	Ok(())
}

// vim: ts=4
