//! The I/O boundary between scripts and the host.
//!
//! `say`, `ask` and `print` reach the outside world only through an
//! [`IoHandler`]; the engine never touches stdout or stdin itself. The
//! handler may block (e.g. waiting for console input) — callers `await` it.

use std::collections::VecDeque;
use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;

#[async_trait]
pub trait IoHandler: Send + Sync {
    /// Emit one line of bot output to the user.
    async fn output(&self, text: &str) -> io::Result<()>;

    /// Emit `prompt`, then read one line of user input (trailing newline
    /// stripped).
    async fn input(&self, prompt: &str) -> io::Result<String>;

    /// Optional diagnostic channel; silent by default.
    async fn debug(&self, _text: &str) {}
}

/// Console-backed handler used by the CLI.
pub struct ConsoleIo {
    stdin: Mutex<BufReader<Stdin>>,
    debug_enabled: bool,
}

impl ConsoleIo {
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            stdin: Mutex::new(BufReader::new(tokio::io::stdin())),
            debug_enabled,
        }
    }

    /// Reads a line without printing any prompt; used by the CLI main loop.
    pub async fn read_line(&self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let n = self.stdin.lock().await.read_line(&mut line).await?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

#[async_trait]
impl IoHandler for ConsoleIo {
    async fn output(&self, text: &str) -> io::Result<()> {
        println!("{}", text);
        Ok(())
    }

    async fn input(&self, prompt: &str) -> io::Result<String> {
        println!("{}", prompt);
        print!(">>> ");
        use std::io::Write;
        std::io::stdout().flush()?;
        self.read_line().await.map(|line| {
            line.unwrap_or_default()
        })
    }

    async fn debug(&self, text: &str) {
        if self.debug_enabled {
            eprintln!("[debug] {}", text);
        }
    }
}

/// In-memory handler for tests: records outputs, replays scripted inputs.
#[derive(Default)]
pub struct ChannelIo {
    outputs: Mutex<Vec<String>>,
    inputs: Mutex<VecDeque<String>>,
    debug_lines: Mutex<Vec<String>>,
}

impl ChannelIo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inputs<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let io = Self::default();
        {
            let mut queue = io.inputs.try_lock().expect("fresh handler");
            queue.extend(inputs.into_iter().map(Into::into));
        }
        io
    }

    pub async fn push_input(&self, line: impl Into<String>) {
        self.inputs.lock().await.push_back(line.into());
    }

    pub async fn outputs(&self) -> Vec<String> {
        self.outputs.lock().await.clone()
    }

    pub async fn take_outputs(&self) -> Vec<String> {
        std::mem::take(&mut *self.outputs.lock().await)
    }

    pub async fn debug_lines(&self) -> Vec<String> {
        self.debug_lines.lock().await.clone()
    }
}

#[async_trait]
impl IoHandler for ChannelIo {
    async fn output(&self, text: &str) -> io::Result<()> {
        self.outputs.lock().await.push(text.to_string());
        Ok(())
    }

    async fn input(&self, prompt: &str) -> io::Result<String> {
        self.outputs.lock().await.push(prompt.to_string());
        self.inputs.lock().await.pop_front().ok_or_else(|| {
            io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted input left")
        })
    }

    async fn debug(&self, text: &str) {
        self.debug_lines.lock().await.push(text.to_string());
    }
}
