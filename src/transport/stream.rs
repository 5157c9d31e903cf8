use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;

use super::{TransportError, UpdateSource, decode};
use crate::protocol::UpdateDocument;

/// Message sent right after the socket opens, asking the server to push the
/// current status.
pub const HANDSHAKE: &str = r#"{"type":"check_task_completion"}"#;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Listens on a WebSocket channel for pushed update documents.
///
/// The connection is opened lazily on the first dispatch. The server paces
/// updates, so there is no client-side interval.
pub struct StreamListener {
    url: String,
    socket: Option<Socket>,
    closed: bool,
}

impl StreamListener {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            socket: None,
            closed: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    async fn open(url: &str) -> Result<Socket, TransportError> {
        let (mut socket, _response) = connect_async(url)
            .await
            .map_err(|e| match e {
                WsError::Http(response) => TransportError::Http {
                    status: response.status().as_u16(),
                },
                other => TransportError::Network(other.to_string()),
            })?;

        socket
            .send(Message::text(HANDSHAKE.to_string()))
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;
        debug!(url, "stream opened, handshake sent");
        Ok(socket)
    }
}

impl UpdateSource for StreamListener {
    async fn next_document(&mut self) -> Result<UpdateDocument, TransportError> {
        if self.closed {
            return Err(TransportError::Network("stream already closed".into()));
        }
        if self.socket.is_none() {
            let socket = Self::open(&self.url).await?;
            self.socket = Some(socket);
        }
        let Some(socket) = self.socket.as_mut() else {
            return Err(TransportError::Network("stream not connected".into()));
        };

        loop {
            match socket.next().await {
                Some(Ok(Message::Text(text))) => return decode(text.as_str()),
                Some(Ok(Message::Binary(bytes))) => {
                    let text = std::str::from_utf8(&bytes)
                        .map_err(|e| TransportError::Parse(e.to_string()))?;
                    return decode(text);
                }
                Some(Ok(Message::Close(_))) | None => {
                    return Err(TransportError::Network(
                        "stream closed before the task finished".into(),
                    ));
                }
                // Ping, pong and raw frames carry no update.
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(TransportError::Network(e.to_string())),
            }
        }
    }

    async fn close(&mut self) {
        self.closed = true;
        if let Some(mut socket) = self.socket.take() {
            if let Err(e) = socket.close(None).await {
                debug!(error = %e, "stream close");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Flag;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;
    use tokio_tungstenite::accept_async;

    /// Serves one WebSocket client: records what it receives and pushes
    /// `messages` after the first inbound frame.
    async fn serve(messages: Vec<Message>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(tcp).await.unwrap();
            let mut received = Vec::new();
            if let Some(Ok(Message::Text(text))) = ws.next().await {
                received.push(text.as_str().to_string());
            }
            for message in messages {
                if ws.send(message).await.is_err() {
                    break;
                }
            }
            while let Some(Ok(message)) = ws.next().await {
                if message.is_close() {
                    received.push("<close>".to_string());
                    break;
                }
            }
            received
        });
        (format!("ws://{addr}/ws/progress/abc/"), handle)
    }

    fn text(body: &str) -> Message {
        Message::text(body.to_string())
    }

    /// Answers the first upgrade request with a plain HTTP response.
    async fn refuse_upgrade(status_line: &'static str) -> (String, JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut tcp, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = tcp.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response =
                format!("{status_line}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
            tcp.write_all(response.as_bytes()).await.unwrap();
            tcp.shutdown().await.unwrap();
        });
        (format!("ws://{addr}/ws/progress/abc/"), handle)
    }

    #[tokio::test]
    async fn sends_handshake_then_reads_documents() {
        let (url, server) = serve(vec![
            text(r#"{"complete": false, "progress": {"current": 1, "total": 2}}"#),
            Message::Ping(Vec::new().into()),
            text(r#"{"complete": true, "success": true, "result": "ok"}"#),
        ])
        .await;

        let mut listener = StreamListener::new(&url);
        let first = listener.next_document().await.unwrap();
        assert_eq!(first.complete, Flag::False);
        assert!(listener.is_open());

        let second = listener.next_document().await.unwrap();
        assert_eq!(second.success, Flag::True);

        listener.close().await;
        assert!(!listener.is_open());

        let received = server.await.unwrap();
        assert_eq!(received, vec![HANDSHAKE.to_string(), "<close>".to_string()]);
    }

    #[tokio::test]
    async fn binary_frames_are_decoded() {
        let (url, server) = serve(vec![Message::binary(
            br#"{"complete": false}"#.to_vec(),
        )])
        .await;

        let mut listener = StreamListener::new(&url);
        let doc = listener.next_document().await.unwrap();
        assert_eq!(doc.complete, Flag::False);
        listener.close().await;
        server.await.unwrap();
    }

    #[tokio::test]
    async fn malformed_message_is_parse_error() {
        let (url, server) = serve(vec![text("not json")]).await;

        let mut listener = StreamListener::new(&url);
        let err = listener.next_document().await.unwrap_err();
        assert!(matches!(err, TransportError::Parse(_)));
        listener.close().await;
        server.await.unwrap();
    }

    #[tokio::test]
    async fn server_close_is_network_error() {
        let (url, server) = serve(vec![Message::Close(None)]).await;

        let mut listener = StreamListener::new(&url);
        let err = listener.next_document().await.unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
        listener.close().await;
        server.await.unwrap();
    }

    #[tokio::test]
    async fn connection_refused_is_network_error() {
        let mut listener = StreamListener::new("ws://127.0.0.1:1/ws/progress/abc/");
        let err = listener.next_document().await.unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
    }

    #[tokio::test]
    async fn rejected_upgrade_is_http_error() {
        let (url, server) = refuse_upgrade("HTTP/1.1 404 Not Found").await;

        let mut listener = StreamListener::new(&url);
        let err = listener.next_document().await.unwrap_err();
        assert_eq!(err, TransportError::Http { status: 404 });
        assert!(!listener.is_open());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn closed_listener_does_not_reconnect() {
        let mut listener = StreamListener::new("ws://127.0.0.1:1/ws/progress/abc/");
        listener.close().await;
        let err = listener.next_document().await.unwrap_err();
        assert_eq!(err, TransportError::Network("stream already closed".into()));
    }
}
