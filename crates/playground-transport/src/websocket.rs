//! WebSocket connection to the build/run backend.

use async_trait::async_trait;
use futures::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use playground_core::{Connection, ConnectionError, Connector, InboundMessage};
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use url::Url;

use crate::protocol;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens WebSocket connections (`ws://` or `wss://`).
#[derive(Debug, Default, Clone)]
pub struct WsConnector;

impl WsConnector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for WsConnector {
    type Connection = WsConnection;

    async fn connect(&self, target: &Url) -> Result<WsConnection, ConnectionError> {
        let (socket, _response) = connect_async(target.as_str())
            .await
            .map_err(|e| ConnectionError::Connect(e.to_string()))?;
        tracing::info!(%target, "Connected to backend");
        Ok(WsConnection::new(socket))
    }
}

/// Open backend socket.
///
/// Sends are queued on a channel and written by a background task, so
/// `send` never blocks. Dropping the connection flushes the queue and closes
/// the socket.
pub struct WsConnection {
    tx: mpsc::UnboundedSender<String>,
    stream: SplitStream<WsStream>,
    closed: bool,
}

impl WsConnection {
    fn new(socket: WsStream) -> Self {
        let (sink, stream) = socket.split();
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        tokio::spawn(write_loop(sink, rx));

        Self {
            tx,
            stream,
            closed: false,
        }
    }
}

async fn write_loop(mut sink: SplitSink<WsStream, Message>, mut rx: mpsc::UnboundedReceiver<String>) {
    while let Some(source) = rx.recv().await {
        let frame = protocol::encode(&source);
        if let Err(e) = sink.send(Message::Text(frame.into())).await {
            tracing::error!("Failed to send run request: {e}");
            return;
        }
    }
    let _ = sink.close().await;
}

#[async_trait]
impl Connection for WsConnection {
    fn send(&self, source: String) -> Result<(), ConnectionError> {
        self.tx.send(source).map_err(|_| ConnectionError::Closed)
    }

    async fn recv(&mut self) -> Option<InboundMessage> {
        if self.closed {
            return None;
        }

        while let Some(frame) = self.stream.next().await {
            let message = match frame {
                Ok(Message::Text(text)) => protocol::decode(text.as_str()),
                Ok(Message::Binary(data)) => match std::str::from_utf8(&data) {
                    Ok(text) => protocol::decode(text),
                    Err(_) => continue,
                },
                Ok(Message::Close(frame)) => {
                    tracing::info!(?frame, "Backend closed the connection");
                    break;
                }
                Ok(_) => continue,
                Err(e) => {
                    tracing::error!("WebSocket error: {e}");
                    break;
                }
            };

            if message.is_some() {
                return message;
            }
        }

        self.closed = true;
        None
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;

    use tokio::{net::TcpListener, sync::oneshot};
    use tokio_tungstenite::accept_async;

    use super::*;

    /// Serve exactly one socket on an ephemeral port.
    async fn backend<F, Fut>(handler: F) -> Url
    where
        F: FnOnce(WebSocketStream<TcpStream>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let socket = accept_async(stream).await.unwrap();
            handler(socket).await;
        });
        Url::parse(&format!("ws://{addr}/socket?sandbox=ocaml")).unwrap()
    }

    async fn push(socket: &mut WebSocketStream<TcpStream>, json: &str) {
        socket.send(Message::Text(json.into())).await.unwrap();
    }

    #[tokio::test]
    async fn test_session_exchange() {
        let (seen_tx, seen_rx) = oneshot::channel();

        let target = backend(|mut socket| async move {
            push(&mut socket, r#"{"kind":"content","payload":"print_int 1"}"#).await;

            let request = loop {
                match socket.next().await {
                    Some(Ok(Message::Text(text))) => break text.as_str().to_string(),
                    Some(Ok(_)) => continue,
                    other => panic!("unexpected frame: {other:?}"),
                }
            };
            let _ = seen_tx.send(request);

            push(&mut socket, r#"{"kind":"log","payload":"\u001b[31merr\u001b[0m"}"#).await;
            push(&mut socket, r#"{"kind":"ping"}"#).await;
            push(&mut socket, "not json").await;
            push(&mut socket, r#"{"kind":"started","port":9001,"sandbox":"ocaml"}"#).await;
            let _ = socket.close(None).await;
        })
        .await;

        let mut conn = tokio_test::assert_ok!(WsConnector::new().connect(&target).await);

        assert_eq!(
            conn.recv().await,
            Some(InboundMessage::Content {
                payload: "print_int 1".to_string()
            })
        );

        tokio_test::assert_ok!(conn.send("print_int 1".to_string()));
        assert_eq!(seen_rx.await.unwrap(), "print_int 1");

        assert_eq!(
            conn.recv().await,
            Some(InboundMessage::Log {
                payload: "\x1b[31merr\x1b[0m".to_string()
            })
        );
        assert_eq!(conn.recv().await, Some(InboundMessage::Unknown));
        assert_eq!(
            conn.recv().await,
            Some(InboundMessage::Started {
                port: 9001,
                sandbox: "ocaml".to_string()
            })
        );
        assert_eq!(conn.recv().await, None);
        assert_eq!(conn.recv().await, None);
    }

    #[tokio::test]
    async fn test_binary_frames_are_decoded() {
        let target = backend(|mut socket| async move {
            let json = r#"{"kind":"log","payload":"hello"}"#;
            socket
                .send(Message::Binary(json.as_bytes().to_vec().into()))
                .await
                .unwrap();
            let _ = socket.close(None).await;
        })
        .await;

        let mut conn = tokio_test::assert_ok!(WsConnector::new().connect(&target).await);
        assert_eq!(
            conn.recv().await,
            Some(InboundMessage::Log {
                payload: "hello".to_string()
            })
        );
        assert_eq!(conn.recv().await, None);
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let target = Url::parse(&format!("ws://{addr}/socket?sandbox=ocaml")).unwrap();
        let result = WsConnector::new().connect(&target).await;
        assert!(matches!(result, Err(ConnectionError::Connect(_))));
    }
}
