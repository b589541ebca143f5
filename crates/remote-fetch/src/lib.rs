//! texbake Remote Fetch
//!
//! Fetches single files from a remote host over SFTP, restricted to an
//! allow-listed mount prefix.
//!
//! ```text
//! remote path ── MountPrefix check ──▶ AccessDenied (no connection made)
//!                      │
//!                      ▼
//!            SessionConnector::open ──▶ SessionGuard (closed on every exit)
//!                      │
//!                      ▼
//!          download to cache temp file ──▶ bytes + content type
//! ```

pub mod allow_list;
pub mod content_type;
pub mod fetcher;
pub mod service;
pub mod session;
pub mod sftp;

pub use allow_list::MountPrefix;
pub use content_type::content_type_for;
pub use fetcher::{FetchedFile, RemoteFileFetcher, CACHE_CONTROL};
pub use service::{FetchOutcome, FetchService};
pub use session::{RemoteSession, SessionConnector, SessionGuard};
pub use sftp::SftpConnector;
