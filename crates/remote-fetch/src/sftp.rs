//! SFTP transport via libssh2.

use std::io::Write;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use ssh2::{Session, Sftp};

use texbake_common::config::RemoteConfig;
use texbake_common::error::{TexbakeError, TexbakeResult};

use crate::session::{RemoteSession, SessionConnector};

#[derive(Clone)]
enum Credential {
    Password(String),
    KeyFile(PathBuf),
}

/// Opens a new TCP + SSH session per call and authenticates with the
/// configured password or private key file.
#[derive(Clone)]
pub struct SftpConnector {
    host: String,
    port: u16,
    username: String,
    credential: Option<Credential>,
    timeout: Duration,
}

impl std::fmt::Debug for SftpConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let auth = match &self.credential {
            Some(Credential::Password(_)) => "password",
            Some(Credential::KeyFile(_)) => "key_file",
            None => "none",
        };
        f.debug_struct("SftpConnector")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("auth", &auth)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl SftpConnector {
    pub fn from_config(config: &RemoteConfig) -> Self {
        let credential = match (&config.private_key, &config.password) {
            (Some(key), _) => Some(Credential::KeyFile(key.clone())),
            (None, Some(pw)) => Some(Credential::Password(pw.clone())),
            (None, None) => None,
        };
        Self {
            host: config.host.clone(),
            port: config.port,
            username: config.username.clone(),
            credential,
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
        }
    }

    fn connect_tcp(&self) -> TexbakeResult<TcpStream> {
        let addrs = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| transport(format!("cannot resolve {}:{}", self.host, self.port), e))?;

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_err = Some(e),
            }
        }
        Err(match last_err {
            Some(e) => transport(format!("cannot connect to {}:{}", self.host, self.port), e),
            None => TexbakeError::remote_fetch(format!("{} resolved to no addresses", self.host)),
        })
    }

    fn authenticate(&self, session: &Session, credential: &Credential) -> TexbakeResult<()> {
        match credential {
            Credential::Password(pw) => session
                .userauth_password(&self.username, pw)
                .map_err(|e| transport("password authentication failed", e))?,
            Credential::KeyFile(key) => session
                .userauth_pubkey_file(&self.username, None, key, None)
                .map_err(|e| transport("key authentication failed", e))?,
        }
        if !session.authenticated() {
            return Err(TexbakeError::remote_fetch(format!(
                "authentication as {} was not accepted",
                self.username
            )));
        }
        Ok(())
    }
}

impl SessionConnector for SftpConnector {
    fn open(&self) -> TexbakeResult<Box<dyn RemoteSession>> {
        let credential = self.credential.as_ref().ok_or_else(|| {
            TexbakeError::remote_fetch(
                "no remote credentials configured (set TEXBAKE_REMOTE_PASSWORD or TEXBAKE_REMOTE_KEY)",
            )
        })?;
        let tcp = self.connect_tcp()?;

        let mut session = Session::new().map_err(|e| transport("cannot create SSH session", e))?;
        session.set_timeout(u32::try_from(self.timeout.as_millis()).unwrap_or(u32::MAX));
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| transport("SSH handshake failed", e))?;
        self.authenticate(&session, credential)?;

        let sftp = session
            .sftp()
            .map_err(|e| transport("cannot start SFTP subsystem", e))?;

        tracing::debug!(host = %self.host, port = self.port, user = %self.username, "Remote session opened");
        Ok(Box::new(SftpSession { session, sftp }))
    }
}

struct SftpSession {
    session: Session,
    sftp: Sftp,
}

impl RemoteSession for SftpSession {
    fn download(&mut self, remote_path: &Path, sink: &mut dyn Write) -> TexbakeResult<u64> {
        let mut file = self
            .sftp
            .open(remote_path)
            .map_err(|e| transport(format!("cannot open {}", remote_path.display()), e))?;
        let copied = std::io::copy(&mut file, sink)
            .map_err(|e| transport(format!("transfer of {} failed", remote_path.display()), e))?;
        sink.flush()
            .map_err(|e| transport("cannot flush download", e))?;
        Ok(copied)
    }

    fn close(&mut self) -> TexbakeResult<()> {
        self.session
            .disconnect(None, "fetch complete", None)
            .map_err(|e| transport("disconnect failed", e))
    }
}

fn transport(context: impl std::fmt::Display, err: impl std::fmt::Display) -> TexbakeError {
    TexbakeError::remote_fetch(format!("{context}: {err}"))
}
