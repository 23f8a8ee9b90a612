use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::mpsc;

/// A parsed operator instruction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OperatorCommand {
    /// Target depth in metres.
    SetDepth(f64),
    /// Rate magnitude in metres per second.
    SetRate(f64),
    Quit,
    Malformed,
}

impl OperatorCommand {
    /// Parses one completed console line.
    ///
    /// Accepts `quit`, `set depth <m>` and `set rate <m/min>`, ignoring case
    /// and surrounding whitespace. Rates are entered in metres per minute and
    /// stored as a magnitude in metres per second. Anything else is
    /// [`OperatorCommand::Malformed`].
    pub fn parse(raw_line: &str) -> Self {
        let lowered = raw_line.to_ascii_lowercase();
        let tokens: Vec<&str> = lowered.split_whitespace().collect();

        match tokens.as_slice() {
            ["quit"] => OperatorCommand::Quit,
            ["set", "depth", value] => match parse_finite(value) {
                Some(depth) => OperatorCommand::SetDepth(depth),
                None => OperatorCommand::Malformed,
            },
            ["set", "rate", value] => match parse_finite(value) {
                Some(per_minute) => OperatorCommand::SetRate((per_minute / 60.0).abs()),
                None => OperatorCommand::Malformed,
            },
            _ => OperatorCommand::Malformed,
        }
    }
}

pub fn parse(raw_line: &str) -> OperatorCommand {
    OperatorCommand::parse(raw_line)
}

fn parse_finite(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Non-blocking supply of completed operator lines.
pub trait CommandSource {
    /// Returns the next pending line, or `None` immediately if nothing is ready.
    fn poll_line(&mut self) -> Option<String>;
}

impl CommandSource for mpsc::Receiver<String> {
    fn poll_line(&mut self) -> Option<String> {
        self.try_recv().ok()
    }
}

impl CommandSource for mpsc::UnboundedReceiver<String> {
    fn poll_line(&mut self) -> Option<String> {
        self.try_recv().ok()
    }
}

impl CommandSource for VecDeque<String> {
    fn poll_line(&mut self) -> Option<String> {
        self.pop_front()
    }
}

/// Source that never yields a line.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInput;

impl CommandSource for NoInput {
    fn poll_line(&mut self) -> Option<String> {
        None
    }
}
