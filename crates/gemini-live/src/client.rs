use crate::error::{ConnectError, SendError};
use crate::rendezvous::{Rendezvous, WaitOutcome};
use crate::response::{Fragment, Response, ResponsePolicy};
use crate::types::{ClientMessage, GenerationConfig, Setup};
use futures_util::{SinkExt, StreamExt};
use native_utils::media::encode_base64;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message};

mod config;
mod consts;
mod reader;
mod utils;

pub use config::{Backend, Config, ConfigBuilder};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = futures_util::stream::SplitSink<WsStream, Message>;
type WsReader = futures_util::stream::SplitStream<WsStream>;

const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// One request payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    Text(String),
    /// Binary media with its declared content type, ex: "image/jpeg" or "audio/pcm".
    Media { mime_type: String, data: Vec<u8> },
}

impl Turn {
    pub fn text(text: &str) -> Self {
        Turn::Text(text.to_string())
    }

    pub fn media(mime_type: &str, data: Vec<u8>) -> Self {
        Turn::Media {
            mime_type: mime_type.to_string(),
            data,
        }
    }

    fn into_message(self) -> ClientMessage {
        match self {
            Turn::Text(text) => ClientMessage::user_text(&text),
            Turn::Media { mime_type, data } => {
                ClientMessage::media(&mime_type, encode_base64(&data))
            }
        }
    }
}

/// State shared between the session and its reader task.
pub(crate) struct Shared {
    open: AtomicBool,
    rendezvous: Rendezvous<Fragment>,
    media: Mutex<Vec<u8>>,
}

impl Shared {
    fn new() -> Self {
        Self {
            open: AtomicBool::new(true),
            rendezvous: Rendezvous::new(),
            media: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Stops accepting turns and wakes anybody waiting on one.
    pub(crate) fn shut_down(&self) {
        self.open.store(false, Ordering::Release);
        self.rendezvous.close();
    }

    pub(crate) fn rendezvous(&self) -> &Rendezvous<Fragment> {
        &self.rendezvous
    }

    pub(crate) fn append_media(&self, data: &[u8]) {
        if let Ok(mut media) = self.media.lock() {
            media.extend_from_slice(data);
        } else {
            tracing::error!("failed to append media data");
        }
    }

    fn take_media(&self) -> Vec<u8> {
        match self.media.lock() {
            Ok(mut media) => std::mem::take(&mut *media),
            Err(_) => {
                tracing::error!("failed to read media data");
                Vec::new()
            }
        }
    }
}

/// One live streaming connection.
///
/// A session carries exactly one in-flight turn at a time: call `send_turn`,
/// then `await_response`, before sending the next turn. Sending early is not
/// rejected: the new turn discards what was gathered so far, and a late answer
/// to the previous turn may release it.
pub struct Session {
    endpoint: String,
    setup: Setup,
    response_timeout: Duration,
    write: WsWriter,
    shared: Arc<Shared>,
    reader: Option<JoinHandle<()>>,
}

impl Session {
    /// Connects, sends the setup message and waits for the server to acknowledge it.
    ///
    /// The whole open is bounded by `setup_timeout`; the websocket handshake is
    /// further bounded by `connect_timeout` when that is shorter.
    pub async fn open(
        config: Config,
        generation_config: GenerationConfig,
    ) -> Result<Session, ConnectError> {
        let deadline = Instant::now() + config.setup_timeout();
        let request = utils::build_request(&config).map_err(ConnectError::Request)?;
        let endpoint = config.endpoint();

        let connect_timeout = config.connect_timeout().min(config.setup_timeout());
        let connecting = tokio_tungstenite::connect_async(request);
        let (ws_stream, _) = match tokio::time::timeout(connect_timeout, connecting).await {
            Ok(result) => result.map_err(ConnectError::Transport)?,
            Err(_) if connect_timeout < config.setup_timeout() => {
                return Err(ConnectError::ConnectTimeout(connect_timeout));
            }
            Err(_) => return Err(ConnectError::SetupTimeout(config.setup_timeout())),
        };
        tracing::info!("connected to {}", endpoint);

        let (write, read) = ws_stream.split();

        let mut setup =
            Setup::builder(&config.model_resource()).with_generation_config(generation_config);
        if let Some(voice_name) = config.voice_name() {
            setup = setup.with_voice_name(voice_name);
        }
        let setup = setup.build();

        let shared = Arc::new(Shared::new());
        let policy = ResponsePolicy::new(setup.response_modalities(), config.release_policy());
        let (ack_tx, ack_rx) = tokio::sync::oneshot::channel();
        let reader = tokio::spawn(reader::run(read, shared.clone(), policy, ack_tx));

        let mut session = Session {
            endpoint,
            setup,
            response_timeout: config.response_timeout(),
            write,
            shared,
            reader: Some(reader),
        };

        let message = ClientMessage::Setup(session.setup.clone());
        if let Err(e) = session.write_message(&message).await {
            session.close().await;
            return Err(ConnectError::Setup(e));
        }

        match tokio::time::timeout_at(deadline, ack_rx).await {
            Ok(Ok(())) => {
                tracing::info!("session setup acknowledged for {}", session.setup.model());
                Ok(session)
            }
            Ok(Err(_)) => {
                session.close().await;
                Err(ConnectError::ClosedDuringSetup)
            }
            Err(_) => {
                session.close().await;
                Err(ConnectError::SetupTimeout(config.setup_timeout()))
            }
        }
    }

    /// Writes one turn. The rendezvous is re-armed before the write so a fast
    /// reply cannot slip past the following `await_response`.
    pub async fn send_turn(&mut self, turn: Turn) -> Result<(), SendError> {
        if !self.is_open() {
            return Err(SendError::Closed);
        }
        let text = serde_json::to_string(&turn.into_message())?;
        let number = self.shared.rendezvous().arm();
        tracing::debug!("sending turn {}", number);
        self.write.send(Message::Text(text)).await?;
        Ok(())
    }

    /// Waits for the current turn's response. A timeout yields an empty,
    /// timed-out response and leaves the session open.
    pub async fn await_response(&self, timeout: Duration) -> Response {
        let outcome = self.shared.rendezvous().wait(timeout).await;
        match outcome {
            WaitOutcome::TimedOut => {
                tracing::warn!("no response within {:?}", timeout);
            }
            WaitOutcome::Closed => {
                tracing::warn!("connection closed while waiting for a response");
            }
            WaitOutcome::Signaled => {}
        }
        Response::new(outcome, self.shared.rendezvous().fragments())
    }

    /// `send_turn` followed by `await_response` with the configured timeout.
    pub async fn exchange(&mut self, turn: Turn) -> Result<Response, SendError> {
        self.send_turn(turn).await?;
        Ok(self.await_response(self.response_timeout).await)
    }

    /// Closes the connection. Calling it again does nothing.
    pub async fn close(&mut self) {
        let Some(reader) = self.reader.take() else {
            return;
        };
        self.shared.shut_down();
        match tokio::time::timeout(CLOSE_TIMEOUT, self.write.close()).await {
            Ok(Err(e)) => tracing::debug!("close handshake failed: {}", e),
            Err(_) => tracing::debug!("close handshake timed out"),
            Ok(Ok(())) => {}
        }
        reader.abort();
        tracing::info!("session closed: {}", self.endpoint);
    }

    pub fn is_open(&self) -> bool {
        self.reader.is_some() && self.shared.is_open()
    }

    /// All media collected over the session's lifetime. Only available once the
    /// session has been closed; `None` while it is still open.
    pub fn take_media(&mut self) -> Option<Vec<u8>> {
        if self.reader.is_some() {
            return None;
        }
        Some(self.shared.take_media())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn setup(&self) -> &Setup {
        &self.setup
    }

    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }

    async fn write_message(&mut self, message: &ClientMessage) -> Result<(), SendError> {
        let text = serde_json::to_string(message)?;
        self.write.send(Message::Text(text)).await?;
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            self.shared.shut_down();
            reader.abort();
        }
    }
}

// Public function to open a session with a specific config.
pub async fn connect_with_config(
    config: Config,
    generation_config: GenerationConfig,
) -> Result<Session, ConnectError> {
    Session::open(config, generation_config).await
}
