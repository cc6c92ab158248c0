//! Player input.

use std::collections::VecDeque;
use std::io::BufRead;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::warn;

/// A source of input lines.
#[async_trait]
pub trait InputSource: Send {
    /// Next line, or `None` once the input is exhausted.
    async fn next_line(&mut self) -> Option<String>;

    /// Whether lines arrive while playback runs. Interactive lines typed
    /// during a reveal skip it instead of being read as commands.
    fn is_interactive(&self) -> bool {
        false
    }
}

/// Lines read from standard input by a background task.
#[derive(Debug)]
pub struct StdinInput {
    lines: mpsc::Receiver<String>,
}

impl StdinInput {
    /// Starts reading standard input on a dedicated thread, which keeps a
    /// pending read from holding up runtime shutdown.
    #[must_use]
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel(16);
        std::thread::spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to read stdin");
                        break;
                    }
                }
            }
        });
        Self { lines: rx }
    }
}

#[async_trait]
impl InputSource for StdinInput {
    async fn next_line(&mut self) -> Option<String> {
        self.lines.recv().await
    }

    fn is_interactive(&self) -> bool {
        true
    }
}

/// A fixed script of lines, consumed in order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    lines: VecDeque<String>,
}

impl ScriptedInput {
    /// Creates a script from `lines`.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl InputSource for ScriptedInput {
    async fn next_line(&mut self) -> Option<String> {
        self.lines.pop_front()
    }
}

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Take the choice at this zero-based index. Typed one-based.
    Choose(usize),
    /// Follow the continue control. An empty line or `c`.
    Continue,
    /// Restart from the beginning. `r`.
    Reset,
    /// Print the history panel. `h`.
    History,
    /// Print a resume link for the current position. `l`.
    Link,
    /// Leave. `q`.
    Quit,
    /// Anything else.
    Unknown(String),
}

impl Command {
    /// Parses one input line.
    #[must_use]
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line.to_ascii_lowercase().as_str() {
            "" | "c" => Self::Continue,
            "r" => Self::Reset,
            "h" => Self::History,
            "l" => Self::Link,
            "q" => Self::Quit,
            _ => match line.parse::<usize>() {
                Ok(n) if n > 0 => Self::Choose(n - 1),
                _ => Self::Unknown(line.to_owned()),
            },
        }
    }
}
