use anyhow::{Context, Result};
use async_trait::async_trait;
use gemini_live::types::Modality;
use gemini_live::{Response, SendError, Session, Turn, WaitOutcome};
use native_utils::audio::{LIVE_API_PCM16_SAMPLE_RATE, wav_to_pcm16};
use native_utils::media::mime_type_for;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// What kind of input the console accepts besides plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    /// Text in, text out
    Text,
    /// Text and `send_image <path>` in, text out
    Image,
    /// Text and `send_audio <path>` in, spoken audio out
    Audio,
}

impl Mode {
    pub fn response_modality(&self) -> Modality {
        match self {
            Mode::Audio => Modality::Audio,
            Mode::Text | Mode::Image => Modality::Text,
        }
    }

    fn prompt(&self) -> &'static str {
        match self {
            Mode::Text => "Enter text input (type 'exit' to quit):",
            Mode::Image => {
                "Enter text input (type 'exit' to quit, type 'send_image [file_path]' to send image):"
            }
            Mode::Audio => {
                "Enter text input (type 'exit' to quit, type 'send_audio [file_path]' to send audio):"
            }
        }
    }
}

/// One line of console input, interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    Empty,
    Text(String),
    SendImage(PathBuf),
    SendAudio(PathBuf),
    /// A media command without a path; carries the usage hint to print.
    Usage(&'static str),
}

pub fn parse_command(line: &str, mode: Mode) -> Command {
    let trimmed = line.trim();
    if trimmed.eq_ignore_ascii_case("exit") {
        return Command::Exit;
    }
    if trimmed.is_empty() {
        return Command::Empty;
    }

    let media_command = match mode {
        Mode::Image => Some(("send_image", "Invalid command. Usage: send_image [file_path]")),
        Mode::Audio => Some(("send_audio", "Invalid command. Usage: send_audio [file_path]")),
        Mode::Text => None,
    };
    if let Some((name, usage)) = media_command {
        if let Some(rest) = trimmed.strip_prefix(name) {
            let path = rest.trim();
            if path.is_empty() || !rest.starts_with(char::is_whitespace) {
                return Command::Usage(usage);
            }
            let path = PathBuf::from(path);
            return match mode {
                Mode::Image => Command::SendImage(path),
                _ => Command::SendAudio(path),
            };
        }
    }
    Command::Text(line.to_string())
}

/// The part of a live session the console loop drives.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LiveSession: Send {
    async fn exchange(&mut self, turn: Turn) -> Result<Response, SendError>;

    fn is_open(&self) -> bool;

    async fn close(&mut self);
}

#[async_trait]
impl LiveSession for Session {
    async fn exchange(&mut self, turn: Turn) -> Result<Response, SendError> {
        Session::exchange(self, turn).await
    }

    fn is_open(&self) -> bool {
        Session::is_open(self)
    }

    async fn close(&mut self) {
        Session::close(self).await
    }
}

pub struct Options {
    pub mode: Mode,
    pub response_timeout: Duration,
}

/// Reads commands from `input` until `exit` or end of input, sending one turn per line
/// and printing each answer to `out`. The session is closed before returning.
pub async fn run<S, R, W>(session: &mut S, input: R, out: &mut W, options: &Options) -> Result<()>
where
    S: LiveSession + ?Sized,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    writeln!(out, "{}", options.mode.prompt())?;

    loop {
        let Some(line) = lines.next_line().await.context("Failed to read console input")? else {
            tracing::info!("end of input");
            session.close().await;
            break;
        };

        let command = parse_command(&line, options.mode);
        if command == Command::Exit {
            session.close().await;
            break;
        }

        if session.is_open() {
            match command {
                Command::Empty => {
                    writeln!(out, "Please input something!")?;
                    continue;
                }
                Command::Usage(usage) => writeln!(out, "{}", usage)?,
                command => {
                    if let Some(turn) = build_turn(command, out)? {
                        match session.exchange(turn).await {
                            Ok(response) => print_response(&response, options, out)?,
                            Err(e) => {
                                tracing::error!("failed to send turn: {}", e);
                                writeln!(out, "Failed to send: {}", e)?;
                            }
                        }
                    }
                }
            }
        } else {
            writeln!(out, "The session is closed, type 'exit' to quit.")?;
        }
        writeln!(out, "{}", options.mode.prompt())?;
    }
    Ok(())
}

/// Turns a command into a request, printing why when it cannot.
fn build_turn<W: Write>(command: Command, out: &mut W) -> Result<Option<Turn>> {
    match command {
        Command::Text(text) => Ok(Some(Turn::Text(text))),
        Command::SendImage(path) => {
            if !path.is_file() {
                writeln!(out, "Invalid image file path.")?;
                return Ok(None);
            }
            writeln!(out, "Sending image: {}", file_name(&path))?;
            match std::fs::read(&path) {
                Ok(data) => Ok(Some(Turn::media(mime_type_for(&path), data))),
                Err(e) => {
                    tracing::error!("failed to read {}: {}", path.display(), e);
                    writeln!(out, "Invalid image file path.")?;
                    Ok(None)
                }
            }
        }
        Command::SendAudio(path) => {
            if !path.is_file() {
                writeln!(out, "Invalid audio file path.")?;
                return Ok(None);
            }
            writeln!(out, "Sending audio input {}", file_name(&path))?;
            match wav_to_pcm16(&path, LIVE_API_PCM16_SAMPLE_RATE) {
                Ok(pcm) => Ok(Some(Turn::media("audio/pcm", pcm))),
                Err(e) => {
                    tracing::error!("failed to load audio {}: {:#}", path.display(), e);
                    writeln!(out, "Unsupported audio file: {}", file_name(&path))?;
                    Ok(None)
                }
            }
        }
        Command::Exit | Command::Empty | Command::Usage(_) => Ok(None),
    }
}

fn print_response<W: Write>(response: &Response, options: &Options, out: &mut W) -> Result<()> {
    match response.outcome() {
        WaitOutcome::TimedOut => writeln!(
            out,
            "No response within {} seconds.",
            options.response_timeout.as_secs()
        )?,
        WaitOutcome::Closed if response.is_empty() => {
            writeln!(out, "The connection was closed before a response arrived.")?
        }
        _ => {
            let text = response.text();
            if text.is_empty() && response.media_len() > 0 {
                writeln!(out, "Gemini Response: [{} bytes of audio]", response.media_len())?;
            } else {
                writeln!(out, "Gemini Response: {}", text)?;
            }
        }
    }
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
