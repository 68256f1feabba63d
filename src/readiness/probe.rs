use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::time::Instant;

pub const DEFAULT_SSH_PORT: u16 = 22;
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(2);

// Servers may send text lines before the version line (RFC 4253 section 4.2).
const MAX_BANNER_LINES: usize = 16;
const MAX_BANNER_LINE_LEN: u64 = 1024;

/// Checks whether one host's remote-access service is up.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Returns `true` once the host answers, `false` if `timeout` elapses first.
    async fn probe(&self, host: &str, timeout: Duration) -> bool;
}

/// Polls a host until its SSH daemon sends a protocol banner.
#[derive(Debug, Clone)]
pub struct SshProbe {
    port: u16,
    connect_timeout: Duration,
    retry_interval: Duration,
}

impl Default for SshProbe {
    fn default() -> Self {
        Self {
            port: DEFAULT_SSH_PORT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            retry_interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}

impl SshProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval = interval;
        self
    }

    async fn read_banner(&self, host: &str) -> std::io::Result<bool> {
        let stream = TcpStream::connect((host, self.port)).await?;
        let mut reader = BufReader::new(stream);

        for _ in 0..MAX_BANNER_LINES {
            let mut line = Vec::new();
            let read = (&mut reader)
                .take(MAX_BANNER_LINE_LEN)
                .read_until(b'\n', &mut line)
                .await?;
            if read == 0 {
                return Ok(false);
            }
            if line.starts_with(b"SSH-") {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[async_trait]
impl Probe for SshProbe {
    async fn probe(&self, host: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut attempts = 0u32;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::debug!(host, attempts, "ssh probe deadline reached");
                return false;
            }

            attempts += 1;
            let attempt_timeout = self.connect_timeout.min(remaining);
            match tokio::time::timeout(attempt_timeout, self.read_banner(host)).await {
                Ok(Ok(true)) => {
                    tracing::debug!(host, attempts, "ssh banner received");
                    return true;
                }
                Ok(Ok(false)) => tracing::debug!(host, port = self.port, "not an ssh banner"),
                Ok(Err(e)) => tracing::debug!(host, error = %e, "ssh not up yet"),
                Err(_) => tracing::debug!(host, "ssh connect attempt timed out"),
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            tokio::time::sleep(self.retry_interval.min(remaining)).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    async fn serve_banner(banner: &'static [u8]) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let _ = stream.write_all(banner).await;
            }
        });
        port
    }

    fn fast_probe(port: u16) -> SshProbe {
        SshProbe::new()
            .with_port(port)
            .with_connect_timeout(Duration::from_millis(200))
            .with_retry_interval(Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_probe_succeeds_on_ssh_banner() {
        let port = serve_banner(b"SSH-2.0-OpenSSH_9.6\r\n").await;
        assert!(
            fast_probe(port)
                .probe("127.0.0.1", Duration::from_secs(5))
                .await
        );
    }

    #[tokio::test]
    async fn test_ssh_check_skips_lines_before_version() {
        let port = serve_banner(b"Authorized use only\r\nSSH-2.0-OpenSSH_9.6\r\n").await;
        assert!(
            fast_probe(port)
                .probe("127.0.0.1", Duration::from_millis(500))
                .await
        );
    }

    #[tokio::test]
    async fn test_ssh_check_gives_up_after_too_many_banner_lines() {
        let port = serve_banner(
            b"a\nb\nc\nd\ne\nf\ng\nh\ni\nj\nk\nl\nm\nn\no\np\nq\nSSH-2.0-late\r\n",
        )
        .await;
        assert!(
            !fast_probe(port)
                .probe("127.0.0.1", Duration::from_millis(300))
                .await
        );
    }

    #[tokio::test]
    async fn test_probe_rejects_other_services() {
        let port = serve_banner(b"HTTP/1.1 400 Bad Request\r\n").await;
        assert!(
            !fast_probe(port)
                .probe("127.0.0.1", Duration::from_millis(300))
                .await
        );
    }

    #[tokio::test]
    async fn test_probe_times_out_on_closed_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let started = std::time::Instant::now();
        let up = fast_probe(port)
            .probe("127.0.0.1", Duration::from_millis(300))
            .await;

        assert!(!up);
        assert!(started.elapsed() >= Duration::from_millis(250));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn test_default_targets_port_22() {
        let probe = SshProbe::default();
        assert_eq!(probe.port, DEFAULT_SSH_PORT);
        assert_eq!(probe.connect_timeout, Duration::from_secs(5));
        assert_eq!(probe.retry_interval, Duration::from_secs(2));
    }
}
