//! Terminal controller behavior
//!
//! Raw-mode management is disabled in these tests; keystroke timing rules
//! live in the keys module's unit tests where the clock is synthetic.

mod common;

use std::sync::Arc;

use common::{CaptureWriter, FakeStream, ScriptedInput};
use tether_protocol::{Message, MessageType};
use tether_session::{SessionError, SessionStream, TerminalController};

fn remote(message_type: MessageType, payload: &[u8]) -> Result<Option<Message>, SessionError> {
    Ok(Some(Message::new(message_type, payload.to_vec())))
}

fn controller(
    stream: &Arc<FakeStream>,
    input: &[u8],
    output: &CaptureWriter,
) -> TerminalController<FakeStream> {
    TerminalController::with_io(
        Arc::clone(stream),
        Box::new(ScriptedInput::new(input)),
        output.clone().into_shared_output(),
        false,
    )
}

#[tokio::test]
async fn remote_output_reaches_the_sink() {
    let stream = FakeStream::scripted(vec![
        remote(MessageType::Activation, b""),
        remote(MessageType::Stdout, b"$ "),
        remote(MessageType::Stderr, b"warning: low disk\r\n"),
    ]);
    let output = CaptureWriter::new();

    // No input; the session ends when the remote side closes.
    controller(&stream, b"", &output).run().await.unwrap();

    assert_eq!(output.as_string(), "$ warning: low disk\r\n");
    assert_eq!(
        stream.close_calls.load(std::sync::atomic::Ordering::SeqCst),
        1
    );
    assert!(stream.done().is_cancelled());
}

#[tokio::test]
async fn keystrokes_are_forwarded_verbatim_as_stdin_frames() {
    let stream = FakeStream::pending_after(vec![]);
    let output = CaptureWriter::new();

    // "ls" then carriage return, then Ctrl+D on the emptied buffer.
    controller(&stream, b"ls\r\x04", &output).run().await.unwrap();

    let sent = stream.sent_messages();
    assert_eq!(sent.len(), 3);
    for message in &sent {
        assert_eq!(message.message_type, MessageType::Stdin);
    }
    let bytes: Vec<u8> = sent.iter().map(|m| m.data[0]).collect();
    assert_eq!(bytes, b"ls\r".to_vec());
}

#[tokio::test]
async fn single_interrupt_echoes_and_forwards_nothing() {
    let stream = FakeStream::pending_after(vec![]);
    let output = CaptureWriter::new();

    // Ctrl+C once, then a carriage return, then Ctrl+D to end the session.
    controller(&stream, b"\x03\r\x04", &output)
        .run()
        .await
        .unwrap();

    assert!(output.as_string().contains("^C"));
    let sent = stream.sent_messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].data.as_ref(), b"\r");
}

#[tokio::test]
async fn double_interrupt_terminates_immediately() {
    let stream = FakeStream::pending_after(vec![]);
    let output = CaptureWriter::new();

    controller(&stream, b"\x03\x03", &output).run().await.unwrap();

    // The first press echoed; the second ended the session without
    // forwarding anything.
    assert!(output.as_string().contains("^C"));
    assert!(stream.sent_messages().is_empty());
    assert!(stream.done().is_cancelled());
}

#[tokio::test]
async fn eof_on_empty_buffer_terminates() {
    let stream = FakeStream::pending_after(vec![remote(MessageType::Activation, b"")]);
    let output = CaptureWriter::new();

    controller(&stream, b"\x04", &output).run().await.unwrap();

    assert!(stream.sent_messages().is_empty());
    assert_eq!(
        stream.close_calls.load(std::sync::atomic::Ordering::SeqCst),
        1
    );
}

#[tokio::test]
async fn abnormal_remote_closure_is_returned() {
    let stream = FakeStream::scripted(vec![
        remote(MessageType::Stdout, b"bye"),
        Err(SessionError::RemoteClosure {
            code: 1011,
            reason: "worker panicked".to_string(),
        }),
    ]);
    let output = CaptureWriter::new();

    let err = controller(&stream, b"", &output).run().await.unwrap_err();
    assert!(matches!(err, SessionError::RemoteClosure { code: 1011, .. }));
    assert_eq!(output.as_string(), "bye");
}
