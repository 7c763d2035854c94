use crate::client::{Shared, WsReader};
use crate::response::{Fragment, ParsedFrame, ResponsePolicy};
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;

/// The delivery path: drains the socket until it closes, acknowledging setup and
/// handing response fragments to the rendezvous. Never waits on the caller.
pub(crate) async fn run(
    mut read: WsReader,
    shared: Arc<Shared>,
    policy: ResponsePolicy,
    ack: oneshot::Sender<()>,
) {
    let mut ack = Some(ack);
    while let Some(message) = read.next().await {
        let message = match message {
            Err(e) => {
                tracing::error!("failed to read message: {}", e);
                break;
            }
            Ok(message) => message,
        };
        // The server sends its JSON in binary frames as often as in text frames.
        let payload = match message {
            Message::Text(text) => text.into_bytes(),
            Message::Binary(bin) => bin,
            Message::Close(reason) => {
                tracing::info!("connection closed: {:?}", reason);
                break;
            }
            _ => continue,
        };
        tracing::debug!("received message of size: {}", payload.len());

        let frame = ParsedFrame::parse(&payload);
        if frame.is_setup_complete() {
            match ack.take() {
                Some(ack) => {
                    let _ = ack.send(());
                }
                None => tracing::warn!("unexpected repeated setup acknowledgment"),
            }
            continue;
        }
        dispatch(&shared, &policy, &frame);
    }
    shared.shut_down();
}

/// Routes one parsed frame into the session's shared state.
pub(crate) fn dispatch(shared: &Shared, policy: &ResponsePolicy, frame: &ParsedFrame) {
    if let ParsedFrame::Structured(message) = frame {
        let interrupted = message
            .server_content
            .as_ref()
            .and_then(|content| content.interrupted)
            .unwrap_or(false);
        if interrupted {
            tracing::debug!("generation interrupted by the server");
        }
    }

    let fragments = policy.fragments(frame);
    let release = policy.releases(frame, &fragments);
    for fragment in fragments {
        match &fragment {
            Fragment::Text(text) => tracing::debug!("received text: {}", text),
            Fragment::Media(chunk) => {
                tracing::debug!("received {} bytes of {}", chunk.data.len(), chunk.mime_type);
                shared.append_media(&chunk.data);
            }
        }
        shared.rendezvous().push(fragment);
    }
    if release {
        shared.rendezvous().signal();
    }
}
