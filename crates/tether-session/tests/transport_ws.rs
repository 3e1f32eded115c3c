//! Transport behavior against a real WebSocket peer

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use tether_protocol::{decode, encode, Message, MessageType};
use tether_session::{classify, SessionError, WsTransport};

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!(
        "ws://{}/microservices/exec/ms-1",
        listener.local_addr().unwrap()
    );
    (listener, url)
}

#[tokio::test]
async fn concurrent_close_sends_exactly_one_close_frame() {
    let (listener, url) = bind().await;
    let (count_tx, count_rx) = tokio::sync::oneshot::channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        let mut app_close_frames = 0usize;

        while let Some(Ok(frame)) = ws.next().await {
            match frame {
                WsMessage::Binary(bytes) => {
                    if decode(&bytes).map(|m| m.is_close()).unwrap_or(false) {
                        app_close_frames += 1;
                    }
                }
                WsMessage::Close(_) => break,
                _ => {}
            }
        }
        let _ = count_tx.send(app_close_frames);
    });

    let transport = Arc::new(WsTransport::new("ms-1"));
    transport.connect(&url, Some("test-token")).await.unwrap();

    let mut closers = Vec::new();
    for _ in 0..4 {
        let transport = Arc::clone(&transport);
        closers.push(tokio::spawn(async move { transport.close().await }));
    }
    for closer in closers {
        closer.await.unwrap();
    }
    // And once more after the fact.
    transport.close().await;

    assert!(transport.done().is_cancelled());
    assert_eq!(count_rx.await.unwrap(), 1);
    assert!(transport.error().is_none());
}

#[tokio::test]
async fn send_message_stamps_transport_identity() {
    let (listener, url) = bind().await;
    let (frame_tx, frame_rx) = tokio::sync::oneshot::channel();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        while let Some(Ok(frame)) = ws.next().await {
            if let WsMessage::Binary(bytes) = frame {
                let message = decode(&bytes).unwrap();
                if message.is_stdin() {
                    let _ = frame_tx.send(message);
                    break;
                }
            }
        }
    });

    let transport = Arc::new(WsTransport::new("ms-9"));
    transport.connect(&url, None).await.unwrap();

    // Caller-supplied correlation fields must be overwritten.
    let mut message = Message::new(MessageType::Stdin, &b"w"[..]);
    message.target_id = "forged-target".to_string();
    message.session_id = "forged-session".to_string();
    transport.send_message(message).await.unwrap();

    let received = frame_rx.await.unwrap();
    assert_eq!(received.target_id, "ms-9");
    assert_eq!(received.session_id, transport.session_id());
    assert!(received.timestamp > 0);

    transport.close().await;
}

#[tokio::test]
async fn graceful_remote_close_is_end_of_stream() {
    let (listener, url) = bind().await;

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.send(WsMessage::Binary(
            encode(&Message::new(MessageType::Stdout, &b"hi"[..])).unwrap(),
        ))
        .await
        .unwrap();
        ws.close(Some(CloseFrame {
            code: CloseCode::Normal,
            reason: "".into(),
        }))
        .await
        .unwrap();
    });

    let transport = Arc::new(WsTransport::new("ms-1"));
    transport.connect(&url, None).await.unwrap();

    let first = transport.read_message().await.unwrap().unwrap();
    assert!(first.is_stdout());
    assert_eq!(first.data.as_ref(), b"hi");

    let end = transport.read_message().await.unwrap();
    assert!(end.is_none());
    assert!(transport.error().is_none());
    assert!(transport.done().is_cancelled());
}

#[tokio::test]
async fn policy_close_is_classified() {
    let (listener, url) = bind().await;

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        ws.close(Some(CloseFrame {
            code: CloseCode::Policy,
            reason: "Microservice has already active exec session".into(),
        }))
        .await
        .unwrap();
    });

    let transport = Arc::new(WsTransport::new("ms-1"));
    transport.connect(&url, None).await.unwrap();

    let err = transport.read_message().await.unwrap_err();
    assert!(matches!(err, SessionError::RemoteClosure { code: 1008, .. }));
    assert_eq!(transport.error(), Some(err.clone()));
    assert_eq!(
        classify(Some(&err)),
        "Another exec session is already attached to this target. Detach it before connecting again."
    );

    // Once the connection is torn down further reads report it.
    assert!(transport.read_message().await.is_err() || transport.done().is_cancelled());
}

#[tokio::test]
async fn non_upgrade_response_is_a_handshake_status() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/microservices/exec/ms-1", listener.local_addr().unwrap());

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        loop {
            let mut chunk = [0u8; 512];
            let n = stream.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..n]);
            if request.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        let _ = stream
            .write_all(b"HTTP/1.1 401 Unauthorized\r\ncontent-length: 0\r\n\r\n")
            .await;
    });

    let transport = WsTransport::new("ms-1");
    let err = transport.connect(&url, Some("expired")).await.unwrap_err();
    assert_eq!(err, SessionError::HandshakeStatus { status: 401 });
    assert_eq!(transport.error(), Some(err));
}

#[tokio::test]
async fn dial_failure_is_a_connect_failure() {
    // Bind and drop so the port is very likely unoccupied.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let transport = WsTransport::new("ms-1");
    let err = transport
        .connect(&format!("ws://{}/microservices/exec/ms-1", addr), None)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::ConnectFailure { .. }));
    assert_eq!(classify(Some(&err)), classify(transport.error().as_ref()));
}
