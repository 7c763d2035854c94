use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use gemini_live::types::events::ServerPart;
use gemini_live::types::{ClientMessage, GenerationConfig, Modality, ServerMessage};
use gemini_live::{Backend, Config, ConnectError, SendError, Session, Turn, WaitOutcome};
use std::future::Future;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

type ServerWs = WebSocketStream<TcpStream>;

const WAIT: Duration = Duration::from_secs(5);
const SHORT: Duration = Duration::from_millis(100);

static TRACING: OnceLock<()> = OnceLock::new();

fn init_tracing() {
    TRACING.get_or_init(|| {
        tracing_subscriber::fmt().with_env_filter("warn").init();
    });
}

/// Accepts one websocket connection on a random local port and hands it to `handler`.
async fn serve<F, Fut>(handler: F) -> Result<String>
where
    F: FnOnce(ServerWs) -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let (tcp, _peer) = listener.accept().await?;
        let ws = tokio_tungstenite::accept_async(tcp).await?;
        if let Err(e) = handler(ws).await {
            tracing::error!("mock server failed: {}", e);
        }
        Ok::<(), anyhow::Error>(())
    });
    Ok(format!("ws://{}", addr))
}

async fn next_client_message(ws: &mut ServerWs) -> Result<ClientMessage> {
    while let Some(message) = ws.next().await {
        if let Message::Text(text) = message? {
            return serde_json::from_str(&text).context("client sent an unknown message");
        }
    }
    anyhow::bail!("client went away")
}

async fn send(ws: &mut ServerWs, message: &ServerMessage) -> Result<()> {
    ws.send(Message::Text(serde_json::to_string(message)?)).await?;
    Ok(())
}

/// Reads the setup message and acknowledges it.
async fn accept_setup(ws: &mut ServerWs) -> Result<ClientMessage> {
    let setup = next_client_message(ws).await?;
    anyhow::ensure!(matches!(setup, ClientMessage::Setup(_)), "expected setup first");
    send(ws, &ServerMessage::setup_complete()).await?;
    Ok(setup)
}

/// Keeps the connection open until the client closes it.
async fn drain(ws: &mut ServerWs) {
    while let Some(Ok(message)) = ws.next().await {
        if let Message::Close(_) = message {
            break;
        }
    }
}

fn config(endpoint: &str) -> Config {
    Config::builder()
        .with_endpoint(endpoint)
        .with_api_key("")
        .with_connect_timeout(WAIT)
        .with_setup_timeout(WAIT)
        .with_response_timeout(WAIT)
        .build()
}

fn user_text(message: &ClientMessage) -> Option<&str> {
    match message {
        ClientMessage::ClientContent(content) => {
            content.turns().first()?.parts().first().map(|p| p.as_text())
        }
        _ => None,
    }
}

#[tokio::test]
async fn text_turn_round_trip() -> Result<()> {
    init_tracing();

    let endpoint = serve(|mut ws| async move {
        let setup = accept_setup(&mut ws).await?;
        match setup {
            ClientMessage::Setup(setup) => {
                anyhow::ensure!(setup.model() == "gemini-2.0-flash-001");
                anyhow::ensure!(setup.response_modalities() == [Modality::Text]);
            }
            _ => unreachable!(),
        }

        let turn = next_client_message(&mut ws).await?;
        anyhow::ensure!(user_text(&turn) == Some("hi"), "unexpected turn {:?}", turn);

        // Reply in a binary frame, like the live service does.
        let reply = serde_json::to_vec(&ServerMessage::text("hello"))?;
        ws.send(Message::Binary(reply)).await?;
        drain(&mut ws).await;
        Ok(())
    })
    .await?;

    let mut session = Session::open(config(&endpoint), GenerationConfig::new()).await?;
    assert!(session.is_open());
    assert_eq!(session.endpoint(), endpoint);

    session.send_turn(Turn::text("hi")).await?;
    let response = session.await_response(WAIT).await;

    assert_eq!(response.outcome(), WaitOutcome::Signaled);
    assert_eq!(response.text(), "hello");

    session.close().await;
    session.close().await;
    assert!(!session.is_open());
    Ok(())
}

#[tokio::test]
async fn timeout_leaves_session_usable() -> Result<()> {
    init_tracing();

    let endpoint = serve(|mut ws| async move {
        accept_setup(&mut ws).await?;
        // Swallow the first turn without answering.
        next_client_message(&mut ws).await?;
        let second = next_client_message(&mut ws).await?;
        anyhow::ensure!(user_text(&second) == Some("second"));
        send(&mut ws, &ServerMessage::text("answer")).await?;
        drain(&mut ws).await;
        Ok(())
    })
    .await?;

    let mut session = Session::open(config(&endpoint), GenerationConfig::new()).await?;

    session.send_turn(Turn::text("first")).await?;
    let started = Instant::now();
    let response = session.await_response(SHORT).await;

    assert!(response.is_timeout());
    assert!(response.is_empty());
    assert!(started.elapsed() < SHORT + Duration::from_secs(2));
    assert!(session.is_open());

    let response = session.exchange(Turn::text("second")).await?;
    assert_eq!(response.text(), "answer");

    session.close().await;
    Ok(())
}

#[tokio::test]
async fn media_turn_without_media_reply_keeps_accumulator_empty() -> Result<()> {
    init_tracing();

    let endpoint = serve(|mut ws| async move {
        accept_setup(&mut ws).await?;
        match next_client_message(&mut ws).await? {
            ClientMessage::RealtimeInput(input) => {
                let chunk = &input.media_chunks()[0];
                anyhow::ensure!(chunk.mime_type() == "audio/pcm");
                anyhow::ensure!(chunk.data() == "AAEC");
            }
            other => anyhow::bail!("expected realtime input, got {:?}", other),
        }
        // Text is not a response modality for this session.
        send(&mut ws, &ServerMessage::text("transcript only")).await?;
        drain(&mut ws).await;
        Ok(())
    })
    .await?;

    let generation = GenerationConfig::new().with_modalities_enable_audio();
    let mut session = Session::open(config(&endpoint), generation).await?;
    assert!(session.setup().generation_config().speech_config().is_some());

    session.send_turn(Turn::media("audio/pcm", vec![0, 1, 2])).await?;
    let response = session.await_response(SHORT).await;

    assert!(response.is_timeout());
    assert!(response.is_empty());

    session.close().await;
    assert_eq!(session.take_media(), Some(Vec::new()));
    Ok(())
}

#[tokio::test]
async fn audio_reply_is_collected_until_close() -> Result<()> {
    init_tracing();

    let endpoint = serve(|mut ws| async move {
        accept_setup(&mut ws).await?;
        next_client_message(&mut ws).await?;
        for data in ["AQI=", "AwQ="] {
            let part = ServerPart::inline_data("audio/pcm;rate=24000", data.to_string());
            send(&mut ws, &ServerMessage::model_turn(vec![part])).await?;
        }
        send(&mut ws, &ServerMessage::turn_complete()).await?;
        drain(&mut ws).await;
        Ok(())
    })
    .await?;

    let config = Config::builder()
        .with_endpoint(&endpoint)
        .with_api_key("")
        .with_release_policy(gemini_live::ReleasePolicy::TurnComplete)
        .build();
    let generation = GenerationConfig::new().with_response_modalities(vec![Modality::Audio]);
    let mut session = Session::open(config, generation).await?;

    let response = session.exchange(Turn::text("speak")).await?;
    assert_eq!(response.outcome(), WaitOutcome::Signaled);
    assert_eq!(response.media_len(), 4);
    assert_eq!(session.take_media(), None, "media is only readable after close");

    session.close().await;
    assert_eq!(session.take_media(), Some(vec![1, 2, 3, 4]));
    Ok(())
}

#[tokio::test]
async fn remote_close_wakes_waiter_and_rejects_turns() -> Result<()> {
    init_tracing();

    let endpoint = serve(|mut ws| async move {
        accept_setup(&mut ws).await?;
        next_client_message(&mut ws).await?;
        ws.close(None).await?;
        Ok(())
    })
    .await?;

    let mut session = Session::open(config(&endpoint), GenerationConfig::new()).await?;
    session.send_turn(Turn::text("bye")).await?;

    let started = Instant::now();
    let response = session.await_response(WAIT).await;

    assert_eq!(response.outcome(), WaitOutcome::Closed);
    assert!(started.elapsed() < WAIT);
    assert!(!session.is_open());
    assert!(matches!(
        session.send_turn(Turn::text("again")).await,
        Err(SendError::Closed)
    ));

    session.close().await;
    session.close().await;
    Ok(())
}

#[tokio::test]
async fn send_after_close_fails() -> Result<()> {
    init_tracing();

    let endpoint = serve(|mut ws| async move {
        accept_setup(&mut ws).await?;
        drain(&mut ws).await;
        Ok(())
    })
    .await?;

    let mut session = Session::open(config(&endpoint), GenerationConfig::new()).await?;
    session.close().await;

    let result = session.send_turn(Turn::text("late")).await;
    assert!(matches!(result, Err(SendError::Closed)));
    Ok(())
}

#[tokio::test]
async fn missing_setup_ack_times_out() -> Result<()> {
    init_tracing();

    let endpoint = serve(|mut ws| async move {
        next_client_message(&mut ws).await?;
        drain(&mut ws).await;
        Ok(())
    })
    .await?;

    let setup_timeout = Duration::from_millis(500);
    let config = Config::builder()
        .with_endpoint(&endpoint)
        .with_api_key("")
        .with_setup_timeout(setup_timeout)
        .build();
    let result = Session::open(config, GenerationConfig::new()).await;

    assert!(matches!(result, Err(ConnectError::SetupTimeout(t)) if t == setup_timeout));
    Ok(())
}

#[tokio::test]
async fn slow_handshake_counts_against_setup_timeout() -> Result<()> {
    init_tracing();

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let (tcp, _peer) = listener.accept().await?;
        tokio::time::sleep(Duration::from_secs(1)).await;
        let mut ws = tokio_tungstenite::accept_async(tcp).await?;
        // Never acknowledge the setup.
        drain(&mut ws).await;
        Ok::<(), anyhow::Error>(())
    });

    let setup_timeout = Duration::from_millis(1500);
    let config = Config::builder()
        .with_endpoint(&format!("ws://{}", addr))
        .with_api_key("")
        .with_connect_timeout(WAIT)
        .with_setup_timeout(setup_timeout)
        .build();
    let started = Instant::now();
    let result = Session::open(config, GenerationConfig::new()).await;

    assert!(matches!(result, Err(ConnectError::SetupTimeout(t)) if t == setup_timeout));
    assert!(started.elapsed() < Duration::from_millis(2300));
    Ok(())
}

#[tokio::test]
async fn stalled_handshake_is_a_connect_timeout() -> Result<()> {
    init_tracing();

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        // Accept the TCP connection but never answer the upgrade request.
        let (tcp, _peer) = listener.accept().await?;
        tokio::time::sleep(WAIT).await;
        drop(tcp);
        Ok::<(), anyhow::Error>(())
    });

    let config = Config::builder()
        .with_endpoint(&format!("ws://{}", addr))
        .with_api_key("")
        .with_connect_timeout(SHORT)
        .with_setup_timeout(WAIT)
        .build();
    let result = Session::open(config, GenerationConfig::new()).await;

    assert!(matches!(result, Err(ConnectError::ConnectTimeout(t)) if t == SHORT));
    Ok(())
}

#[tokio::test]
async fn dropped_stream_fails_sends() -> Result<()> {
    init_tracing();

    let endpoint = serve(|mut ws| async move {
        accept_setup(&mut ws).await?;
        // Gone without a close frame.
        drop(ws);
        Ok(())
    })
    .await?;

    let mut session = Session::open(config(&endpoint), GenerationConfig::new()).await?;

    let mut failure = None;
    for _ in 0..50 {
        match session.send_turn(Turn::text("anyone?")).await {
            Ok(()) => tokio::time::sleep(Duration::from_millis(20)).await,
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
    }

    assert!(
        matches!(failure, Some(SendError::Transport(_)) | Some(SendError::Closed)),
        "unexpected send result {:?}",
        failure
    );
    session.close().await;
    Ok(())
}

#[tokio::test]
async fn close_during_setup_is_reported() -> Result<()> {
    init_tracing();

    let endpoint = serve(|mut ws| async move {
        next_client_message(&mut ws).await?;
        ws.close(None).await?;
        Ok(())
    })
    .await?;

    let result = Session::open(config(&endpoint), GenerationConfig::new()).await;

    assert!(matches!(result, Err(ConnectError::ClosedDuringSetup)));
    Ok(())
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() -> Result<()> {
    init_tracing();

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let result = Session::open(config(&format!("ws://{}", addr)), GenerationConfig::new()).await;

    assert!(matches!(result, Err(ConnectError::Transport(_))));
    Ok(())
}

#[tokio::test]
async fn vertex_setup_uses_qualified_model() -> Result<()> {
    init_tracing();

    let endpoint = serve(|mut ws| async move {
        match accept_setup(&mut ws).await? {
            ClientMessage::Setup(setup) => anyhow::ensure!(
                setup.model()
                    == "projects/demo/locations/us-central1/publishers/google/models/gemini-2.0-flash-001",
                "unexpected model {}",
                setup.model()
            ),
            _ => unreachable!(),
        }
        drain(&mut ws).await;
        Ok(())
    })
    .await?;

    let config = Config::builder()
        .with_endpoint(&endpoint)
        .with_backend(Backend::VertexAi {
            project: "demo".to_string(),
            location: "us-central1".to_string(),
        })
        .with_api_key("token")
        .with_setup_timeout(WAIT)
        .build();
    let mut session = Session::open(config, GenerationConfig::new()).await?;

    assert!(session.setup().model().starts_with("projects/demo/"));
    session.close().await;
    Ok(())
}
