use std::io::{self, BufRead};
use std::thread;

use color_eyre::eyre::{Result, WrapErr};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Non-blocking source of user key presses.
pub trait KeySource {
    /// Every key pressed since the previous call, oldest first.
    fn drain_keys(&mut self) -> Vec<char>;
}

/// Keys typed on the console.
///
/// A reader thread forwards stdin characters over a channel so the poll loop
/// never blocks on the terminal. Line-buffered consoles deliver the keys
/// once Enter is pressed.
pub struct ConsoleKeys {
    receiver: mpsc::UnboundedReceiver<char>,
}

impl ConsoleKeys {
    pub fn spawn() -> Result<Self> {
        let (sender, receiver) = mpsc::unbounded_channel();
        thread::Builder::new()
            .name("exit-key-reader".to_string())
            .spawn(move || read_keys(io::stdin().lock(), sender))
            .wrap_err("Failed to spawn console key reader")?;
        debug!("Console key reader started");
        Ok(Self { receiver })
    }
}

impl KeySource for ConsoleKeys {
    fn drain_keys(&mut self) -> Vec<char> {
        let mut keys = Vec::new();
        while let Ok(key) = self.receiver.try_recv() {
            keys.push(key);
        }
        keys
    }
}

fn read_keys(reader: impl BufRead, sender: mpsc::UnboundedSender<char>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("Console input unreadable, exit key disabled: {}", e);
                return;
            }
        };
        for key in line.chars().filter(|c| !c.is_whitespace()) {
            if sender.send(key).is_err() {
                return;
            }
        }
    }
    debug!("Console input closed");
}
