//! WebSocket session transport
//!
//! Owns the socket for one exec or log session. Failure state is sticky:
//! the first error wins and is never overwritten, so controllers can
//! consult [`WsTransport::error`] after the fact without racing the
//! reader. Closing is guarded to run exactly once no matter how many exit
//! paths reach it concurrently.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{
    connect_async_tls_with_config, Connector, MaybeTlsStream, WebSocketStream,
};
use tokio_util::sync::CancellationToken;

use crate::error::SessionError;
use crate::stream::SessionStream;
use tether_core::time::current_time_millis;
use tether_protocol::{codec, Message, MessageType};

/// Bounded timeout for the WebSocket handshake. An established session has
/// no read or write timeout; liveness is the remote side's responsibility.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(45);

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Client side of one message-framed session socket
pub struct WsTransport {
    target_id: String,
    session_id: String,
    sink: Mutex<Option<WsSink>>,
    source: Mutex<Option<WsSource>>,
    error: StdMutex<Option<SessionError>>,
    closed: AtomicBool,
    done: CancellationToken,
}

impl WsTransport {
    /// Create an unconnected transport bound to a target identity.
    pub fn new(target_id: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            session_id: format!("{:016x}", rand::random::<u64>()),
            sink: Mutex::new(None),
            source: Mutex::new(None),
            error: StdMutex::new(None),
            closed: AtomicBool::new(false),
            done: CancellationToken::new(),
        }
    }

    /// Target identity stamped on every outgoing frame
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Session correlation id stamped on every outgoing frame
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Dial the controller and perform the WebSocket upgrade.
    ///
    /// Certificate validation is deliberately relaxed: controllers are
    /// routinely deployed with self-signed certificates, and the session
    /// is already gated by the bearer token. On failure the error is
    /// recorded as the sticky failure and partial state is released.
    ///
    /// A policy close issued immediately after the upgrade surfaces on the
    /// first [`Self::read_message`] call, not here.
    pub async fn connect(
        &self,
        url: &str,
        bearer_token: Option<&str>,
    ) -> Result<(), SessionError> {
        let mut request = url.into_client_request().map_err(|err| {
            self.fail(SessionError::ConnectFailure {
                url: url.to_string(),
                reason: err.to_string(),
            })
        })?;

        if let Some(token) = bearer_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token)).map_err(|err| {
                self.fail(SessionError::ConnectFailure {
                    url: url.to_string(),
                    reason: format!("invalid bearer token: {}", err),
                })
            })?;
            request.headers_mut().insert(AUTHORIZATION, value);
        }

        let tls = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|err| {
                self.fail(SessionError::ConnectFailure {
                    url: url.to_string(),
                    reason: format!("tls setup failed: {}", err),
                })
            })?;

        let handshake = connect_async_tls_with_config(
            request,
            None,
            false,
            Some(Connector::NativeTls(tls)),
        );

        let stream = match tokio::time::timeout(HANDSHAKE_TIMEOUT, handshake).await {
            Err(_) => {
                return Err(self.fail(SessionError::ConnectFailure {
                    url: url.to_string(),
                    reason: format!("handshake timed out after {}s", HANDSHAKE_TIMEOUT.as_secs()),
                }));
            }
            Ok(Err(err)) => return Err(self.fail(classify_handshake_error(url, err))),
            Ok(Ok((stream, _response))) => stream,
        };

        tracing::debug!(url = %url, session_id = %self.session_id, "Session connected");

        let (sink, source) = stream.split();
        *self.sink.lock().await = Some(sink);
        *self.source.lock().await = Some(source);
        Ok(())
    }

    /// Encode and send one message as a single binary frame.
    ///
    /// The transport's own identity overwrites the caller's correlation
    /// fields; they are never trusted verbatim.
    pub async fn send_message(&self, mut message: Message) -> Result<(), SessionError> {
        message.target_id = self.target_id.clone();
        message.session_id = self.session_id.clone();
        message.timestamp = current_time_millis();

        let frame = codec::encode(&message).map_err(SessionError::from)?;

        let mut sink = self.sink.lock().await;
        let Some(sink) = sink.as_mut() else {
            return Err(SessionError::NotConnected);
        };
        sink.send(WsMessage::Binary(frame))
            .await
            .map_err(|err| self.fail(SessionError::Transport(err.to_string())))
    }

    /// Receive the next message.
    ///
    /// A graceful remote closure (normal, going-away, or no-status close,
    /// or a clean EOF) yields `Ok(None)`; an abnormal one is recorded as
    /// the sticky failure and returned. Either way the connection is torn
    /// down before this returns.
    pub async fn read_message(&self) -> Result<Option<Message>, SessionError> {
        loop {
            let next = {
                let mut source = self.source.lock().await;
                let Some(stream) = source.as_mut() else {
                    return Err(SessionError::NotConnected);
                };
                stream.next().await
            };

            match next {
                None => {
                    self.close().await;
                    return Ok(None);
                }
                Some(Ok(WsMessage::Binary(bytes))) => match codec::decode(&bytes) {
                    Ok(message) => return Ok(Some(message)),
                    Err(err) => return Err(self.fail(SessionError::from(err))),
                },
                Some(Ok(WsMessage::Close(frame))) => {
                    let classified = classify_close_frame(frame);
                    self.close().await;
                    return match classified {
                        None => Ok(None),
                        Some(err) => Err(self.fail(err)),
                    };
                }
                // Pings are answered by the library on the next read; text
                // frames are not part of the session contract.
                Some(Ok(_)) => continue,
                Some(Err(WsError::ConnectionClosed)) | Some(Err(WsError::AlreadyClosed)) => {
                    self.close().await;
                    return Ok(None);
                }
                Some(Err(err)) => {
                    let err = SessionError::Transport(err.to_string());
                    self.close().await;
                    return Err(self.fail(err));
                }
            }
        }
    }

    /// Tear the session down.
    ///
    /// Idempotent under concurrent callers: exactly one caller sends the
    /// best-effort Close frame, shuts the socket, and fires the done
    /// token; everyone else is a no-op.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let mut sink_slot = self.sink.lock().await;
        if let Some(mut sink) = sink_slot.take() {
            let mut notice = Message::new(MessageType::Close, Bytes::new());
            notice.target_id = self.target_id.clone();
            notice.session_id = self.session_id.clone();
            if let Ok(frame) = codec::encode(&notice) {
                let _ = sink.send(WsMessage::Binary(frame)).await;
            }
            let _ = sink.close().await;
        }
        drop(sink_slot);

        tracing::debug!(session_id = %self.session_id, "Session closed");
        self.done.cancel();
    }

    /// Sticky first error, if any
    pub fn error(&self) -> Option<SessionError> {
        self.error.lock().expect("error lock poisoned").clone()
    }

    /// Done token, fired exactly once on close
    pub fn done(&self) -> CancellationToken {
        self.done.clone()
    }

    /// Record `err` as the sticky failure unless one is already set, and
    /// hand it back for propagation.
    fn fail(&self, err: SessionError) -> SessionError {
        let mut slot = self.error.lock().expect("error lock poisoned");
        if slot.is_none() {
            *slot = Some(err.clone());
        }
        err
    }
}

#[async_trait]
impl SessionStream for WsTransport {
    async fn send_message(&self, message: Message) -> Result<(), SessionError> {
        WsTransport::send_message(self, message).await
    }

    async fn read_message(&self) -> Result<Option<Message>, SessionError> {
        WsTransport::read_message(self).await
    }

    async fn close(&self) {
        WsTransport::close(self).await;
    }

    fn done(&self) -> CancellationToken {
        WsTransport::done(self)
    }

    fn error(&self) -> Option<SessionError> {
        WsTransport::error(self)
    }
}

/// Map a handshake failure onto the session error taxonomy.
fn classify_handshake_error(url: &str, err: WsError) -> SessionError {
    match err {
        WsError::Http(response) => SessionError::HandshakeStatus {
            status: response.status().as_u16(),
        },
        other => SessionError::ConnectFailure {
            url: url.to_string(),
            reason: other.to_string(),
        },
    }
}

/// Map a received close frame onto the session error taxonomy.
///
/// Normal (1000), going-away (1001) and no-status (missing frame) closes
/// are graceful; everything else is abnormal and keeps its numeric code
/// for the failure classifier.
fn classify_close_frame(frame: Option<CloseFrame<'_>>) -> Option<SessionError> {
    let frame = frame?;
    let code = u16::from(frame.code);
    match code {
        1000 | 1001 | 1005 => None,
        code => Some(SessionError::RemoteClosure {
            code,
            reason: frame.reason.into_owned(),
        }),
    }
}
