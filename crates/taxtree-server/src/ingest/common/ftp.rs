//! Shared FTP plumbing with retry logic
//!
//! `suppaftp`'s blocking client is used from async code by running each
//! whole session (connect, login, command, quit) on the blocking pool.

use anyhow::{Context, Result};
use std::time::Duration;
use suppaftp::FtpStream;
use tracing::{debug, warn};

/// Maximum number of attempts for one FTP operation
pub const MAX_RETRIES: u32 = 3;

/// Base delay between attempts, multiplied by the attempt number
pub const RETRY_DELAY_SECS: u64 = 5;

/// Connection settings for one FTP server
#[derive(Debug, Clone)]
pub struct FtpConnection {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl FtpConnection {
    /// Open a logged-in session in Extended Passive Mode
    pub fn open(&self) -> Result<FtpStream> {
        debug!("Connecting to FTP server: {}:{}", self.host, self.port);

        let addr = std::net::ToSocketAddrs::to_socket_addrs(&(self.host.as_str(), self.port))
            .with_context(|| format!("Failed to resolve {}", self.host))?
            .next()
            .with_context(|| format!("No address for {}", self.host))?;

        let mut stream = FtpStream::connect_timeout(addr, self.connect_timeout)
            .context("Failed to connect to FTP server")?;
        stream
            .get_ref()
            .set_read_timeout(Some(self.read_timeout))
            .context("Failed to set read timeout")?;

        // EPSV behaves better behind NAT
        stream.set_mode(suppaftp::Mode::ExtendedPassive);

        stream
            .login(&self.username, &self.password)
            .context("FTP login failed")?;
        debug!("Logged in as {}", self.username);

        Ok(stream)
    }
}

/// Run a blocking FTP operation on the blocking pool, retrying failures
/// with a linearly growing delay.
pub async fn with_retries<T, F>(what: &str, op: F) -> Result<T>
where
    T: Send + 'static,
    F: Fn() -> Result<T> + Clone + Send + 'static,
{
    let mut attempt = 1;
    loop {
        debug!("Attempt {}/{}: {}", attempt, MAX_RETRIES, what);

        let result = tokio::task::spawn_blocking(op.clone())
            .await
            .map_err(|e| anyhow::anyhow!("FTP task panicked: {}", e))?;

        match result {
            Ok(value) => return Ok(value),
            Err(e) if attempt < MAX_RETRIES => {
                let delay = RETRY_DELAY_SECS * u64::from(attempt);
                warn!(
                    "Attempt {}/{} failed for {}: {:#}. Retrying in {}s...",
                    attempt, MAX_RETRIES, what, e, delay
                );
                tokio::time::sleep(Duration::from_secs(delay)).await;
                attempt += 1;
            },
            Err(e) => {
                return Err(e).with_context(|| format!("{} failed after {} attempts", what, MAX_RETRIES));
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let value = with_retries("flaky op", move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                anyhow::bail!("transient");
            }
            Ok(7)
        })
        .await
        .unwrap();

        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let err = with_retries("always fails", move || -> Result<()> {
            counter.fetch_add(1, Ordering::SeqCst);
            anyhow::bail!("permanent")
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), MAX_RETRIES);
        assert!(err.to_string().contains("always fails failed after 3 attempts"));
    }
}
