//! File system view used for file-bearing replies
//!
//! Each resolution is independent: the view is scoped to the session user on
//! every call and nothing is cached, so results reflect what is on disk at
//! call time.

use async_trait::async_trait;
use std::io;
use std::path::{Component, Path, PathBuf};
use tokio::fs as afs;

use crate::session::User;

/// File resolved on a user's file system view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
	/// Path the file was requested with
	pub virtual_path: String,
	/// Absolute location on disk
	pub path: PathBuf,
	pub size: u64,
}

impl ResolvedFile {
	/// Open the file for streaming to the data connection
	pub async fn open(&self) -> io::Result<afs::File> {
		afs::File::open(&self.path).await
	}
}

/// Read-only file access scoped to a user
#[async_trait]
pub trait FileSystemView: Send + Sync {
	/// Resolve `path` for `user`, failing when there is no readable file
	async fn file(&self, user: Option<&User>, path: &str) -> io::Result<ResolvedFile>;
}

/// File view backed by the local file system
#[derive(Debug, Clone)]
pub struct NativeFileSystem {
	root: PathBuf,
}

impl NativeFileSystem {
	/// View rooted at `root` for users without a home directory
	pub fn new(root: impl Into<PathBuf>) -> Self {
		NativeFileSystem { root: root.into() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	fn home_of(&self, user: Option<&User>) -> PathBuf {
		user.and_then(|u| u.home_directory.clone()).unwrap_or_else(|| self.root.clone())
	}
}

/// Map a virtual path onto `home`
///
/// Absolute virtual paths are relative to the home directory. Parent
/// references are rejected. Symlinks are not followed here; the native view
/// checks the canonical location separately.
pub fn resolve_in_home(home: &Path, path: &str) -> io::Result<PathBuf> {
	let mut resolved = home.to_path_buf();
	for component in Path::new(path).components() {
		match component {
			Component::Normal(part) => resolved.push(part),
			Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
			Component::ParentDir => {
				return Err(io::Error::new(
					io::ErrorKind::PermissionDenied,
					format!("Path {:?} contains parent directory reference (..)", path),
				));
			}
		}
	}
	Ok(resolved)
}

#[async_trait]
impl FileSystemView for NativeFileSystem {
	async fn file(&self, user: Option<&User>, path: &str) -> io::Result<ResolvedFile> {
		let home = self.home_of(user);
		let resolved = resolve_in_home(&home, path)?;
		let metadata = afs::metadata(&resolved).await?;

		let canonical = afs::canonicalize(&resolved).await?;
		if !canonical.starts_with(afs::canonicalize(&home).await?) {
			return Err(io::Error::new(
				io::ErrorKind::PermissionDenied,
				format!("Path {:?} leaves the home directory", path),
			));
		}

		if !metadata.is_file() {
			return Err(io::Error::new(
				io::ErrorKind::InvalidInput,
				format!("{} is not a regular file", resolved.display()),
			));
		}
		Ok(ResolvedFile { virtual_path: path.to_string(), path: resolved, size: metadata.len() })
	}
}


// vim: ts=4
