//! One-shot trapper client.

use crate::error::NetworkError;
use serde_json::Value;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use zinspector_protocol::{Frame, ProtocolError, StatsRequest, FRAME_HEADER_SIZE, MAX_PAYLOAD_SIZE};

/// Default read chunk size while draining the payload (4 KiB).
pub const DEFAULT_READ_CHUNK_SIZE: usize = 4096;

/// Default connect and read timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Trapper host.
    pub host: String,
    /// Trapper port.
    pub port: u16,
    /// Timeout applied to the connect phase and to the whole read phase.
    pub timeout: Duration,
    /// Upper bound on a single socket read while draining the payload.
    pub read_chunk_size: usize,
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: DEFAULT_TIMEOUT,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size.max(1);
        self
    }
}

/// Client for a single request/response exchange with the trapper.
///
/// The socket is owned only for the lifetime of one exchange and is released
/// on every exit path.
pub struct TrapperClient {
    config: ClientConfig,
}

impl TrapperClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Sends the fixed server-statistics request and decodes the response.
    pub async fn request_stats(&self) -> Result<Value, NetworkError> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        tracing::info!("Connecting to {} for server statistics", addr);

        let mut stream =
            tokio::time::timeout(self.config.timeout, TcpStream::connect(&addr))
                .await
                .map_err(|_| {
                    tracing::error!("Connection to {} timed out", addr);
                    NetworkError::Timeout
                })??;

        let frame = Frame::from_json(&StatsRequest::server_stats())?;
        let encoded = frame.encode()?;

        // The stream is dropped (and the socket closed) on every exit path,
        // including timeout and decode failure.
        let result = tokio::time::timeout(
            self.config.timeout,
            self.exchange(&mut stream, &encoded),
        )
        .await
        .map_err(|_| {
            tracing::error!("Read from {} timed out", addr);
            NetworkError::Timeout
        })?;

        if result.is_ok() {
            tracing::info!("Server statistics received from {}", addr);
        }
        result
    }

    /// Sends one frame and performs the two-stage response read: the fixed
    /// 13-byte header first, then exactly the declared number of payload
    /// bytes in bounded chunks.
    async fn exchange(
        &self,
        stream: &mut TcpStream,
        request: &[u8],
    ) -> Result<Value, NetworkError> {
        stream.write_all(request).await?;
        tracing::debug!("Request sent ({} bytes), reading header", request.len());

        let mut header = [0u8; FRAME_HEADER_SIZE];
        let mut filled = 0;
        while filled < FRAME_HEADER_SIZE {
            let n = stream.read(&mut header[filled..]).await?;
            if n == 0 {
                return Err(NetworkError::ShortHeader { got: filled });
            }
            filled += n;
        }

        let payload_len = Frame::payload_len_from_header(&header) as usize;
        if payload_len > MAX_PAYLOAD_SIZE as usize {
            return Err(NetworkError::Protocol(ProtocolError::FrameTooLarge {
                size: payload_len as u32,
                max: MAX_PAYLOAD_SIZE,
            }));
        }
        tracing::debug!("Header received, declared payload length {}", payload_len);

        let mut response = Vec::with_capacity(FRAME_HEADER_SIZE + payload_len);
        response.extend_from_slice(&header);

        let mut chunk = vec![0u8; self.config.read_chunk_size];
        let mut remaining = payload_len;
        while remaining > 0 {
            let want = remaining.min(self.config.read_chunk_size);
            let n = stream.read(&mut chunk[..want]).await?;
            if n == 0 {
                // Peer closed early. Hand the partial buffer to the codec,
                // which fails on the truncated payload instead of hanging.
                tracing::warn!(
                    "Peer closed connection with {} payload bytes outstanding",
                    remaining
                );
                break;
            }
            response.extend_from_slice(&chunk[..n]);
            remaining -= n;
        }

        let frame = Frame::decode(&response)?;
        Ok(frame.payload_json()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn spawn_server<F, Fut>(handler: F) -> u16
    where
        F: FnOnce(tokio::net::TcpStream) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            handler(stream).await;
        });
        port
    }

    fn client(port: u16) -> TrapperClient {
        TrapperClient::new(
            ClientConfig::new("127.0.0.1", port).with_timeout(Duration::from_secs(2)),
        )
    }

    #[tokio::test]
    async fn test_request_stats_roundtrip() {
        let port = spawn_server(|mut stream| async move {
            let mut buf = vec![0u8; 1024];
            let n = stream.read(&mut buf).await.unwrap();
            assert_eq!(&buf[0..4], b"ZBXD");
            assert!(n > FRAME_HEADER_SIZE);

            let reply = Frame::from_json(&json!({"uptime": 12345, "data": {"queue": 0}}))
                .unwrap()
                .encode()
                .unwrap();
            stream.write_all(&reply).await.unwrap();
        })
        .await;

        let stats = client(port).request_stats().await.unwrap();
        assert_eq!(stats["uptime"], 12345);
        assert_eq!(stats["data"]["queue"], 0);
    }

    #[tokio::test]
    async fn test_short_header_is_network_error() {
        // Server closes after 5 header bytes: must fail, never hang.
        let port = spawn_server(|mut stream| async move {
            let mut buf = vec![0u8; 1024];
            let _ = stream.read(&mut buf).await;
            stream.write_all(b"ZBXD\x01").await.unwrap();
        })
        .await;

        let err = client(port).request_stats().await.unwrap_err();
        assert!(matches!(err, NetworkError::ShortHeader { got: 5 }));
    }

    #[tokio::test]
    async fn test_truncated_payload_is_protocol_error() {
        // Header declares more payload than the server ever sends.
        let port = spawn_server(|mut stream| async move {
            let mut buf = vec![0u8; 1024];
            let _ = stream.read(&mut buf).await;

            let full = Frame::from_json(&json!({"padding": "x".repeat(64)}))
                .unwrap()
                .encode()
                .unwrap();
            stream.write_all(&full[..full.len() - 20]).await.unwrap();
        })
        .await;

        let err = client(port).request_stats().await.unwrap_err();
        assert!(matches!(
            err,
            NetworkError::Protocol(ProtocolError::Json(_))
        ));
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        let port = spawn_server(|mut stream| async move {
            let mut buf = vec![0u8; 1024];
            let _ = stream.read(&mut buf).await;
            tokio::time::sleep(Duration::from_secs(10)).await;
        })
        .await;

        let client = TrapperClient::new(
            ClientConfig::new("127.0.0.1", port).with_timeout(Duration::from_millis(200)),
        );
        let err = client.request_stats().await.unwrap_err();
        assert!(matches!(err, NetworkError::Timeout));
    }

    #[tokio::test]
    async fn test_connection_refused_is_io_error() {
        // Nothing is listening on the port once the listener is dropped.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = client(port).request_stats().await.unwrap_err();
        assert!(matches!(err, NetworkError::Io(_)));
    }

    #[tokio::test]
    async fn test_small_chunks_reassemble() {
        let port = spawn_server(|mut stream| async move {
            let mut buf = vec![0u8; 1024];
            let _ = stream.read(&mut buf).await;

            let reply = Frame::from_json(&json!({"blob": "y".repeat(300)}))
                .unwrap()
                .encode()
                .unwrap();
            stream.write_all(&reply).await.unwrap();
        })
        .await;

        let client = TrapperClient::new(
            ClientConfig::new("127.0.0.1", port)
                .with_timeout(Duration::from_secs(2))
                .with_read_chunk_size(7),
        );
        let stats = client.request_stats().await.unwrap();
        assert_eq!(stats["blob"].as_str().unwrap().len(), 300);
    }

    #[test]
    fn test_config_defaults() {
        let config = ClientConfig::new("localhost", 10051);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.read_chunk_size, DEFAULT_READ_CHUNK_SIZE);
    }
}
