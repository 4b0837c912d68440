//! Operator confirmation for deployment retries.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Question shown when a deployment fails.
pub const RETRY_PROMPT: &str = "Update failed, retry? (Y/N)";

/// Yes/no confirmation capability.
///
/// Abstracted so the retry loop can be driven by a terminal in production
/// and by a scripted double in tests.
#[async_trait]
pub trait Confirm: Send + Sync {
    /// Ask the operator a yes/no question.
    ///
    /// Returns `Err` when the answer cannot be read at all (e.g. the
    /// input stream is closed); the caller must not keep retrying on that.
    async fn confirm(&self, question: &str) -> std::io::Result<bool>;
}

/// Terminal confirmation: prints the question and reads one line from
/// stdin. The accepted affirmative token is a case-insensitive `y`;
/// anything else is a decline.
pub struct TerminalConfirm;

#[async_trait]
impl Confirm for TerminalConfirm {
    async fn confirm(&self, question: &str) -> std::io::Result<bool> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(question.as_bytes()).await?;
        stdout.write_all(b" ").await?;
        stdout.flush().await?;

        let mut line = String::new();
        let mut reader = BufReader::new(tokio::io::stdin());
        let read = reader.read_line(&mut line).await?;
        if read == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "stdin closed while waiting for confirmation",
            ));
        }

        Ok(is_affirmative(&line))
    }
}

/// The accepted affirmative token is a case-insensitive `y`, nothing
/// else; any other answer declines.
pub fn is_affirmative(line: &str) -> bool {
    line.trim().eq_ignore_ascii_case("y")
}

/// Scripted confirmation that pops pre-seeded answers in order.
///
/// Used by tests and non-interactive runs; answering past the end of the
/// script behaves like a closed input stream.
pub struct ScriptedConfirm {
    answers: Mutex<VecDeque<bool>>,
}

impl ScriptedConfirm {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
        }
    }
}

#[async_trait]
impl Confirm for ScriptedConfirm {
    async fn confirm(&self, _question: &str) -> std::io::Result<bool> {
        self.answers
            .lock()
            .expect("confirm answers poisoned")
            .pop_front()
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "no scripted answer left",
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affirmative_token() {
        assert!(is_affirmative("y"));
        assert!(is_affirmative("Y"));
        // Terminal input arrives with its newline still attached
        assert!(is_affirmative("y\n"));
        assert!(is_affirmative("  y  "));
    }

    #[test]
    fn test_anything_else_declines() {
        assert!(!is_affirmative("yes"));
        assert!(!is_affirmative("n"));
        assert!(!is_affirmative("N"));
        assert!(!is_affirmative(""));
        assert!(!is_affirmative("\n"));
        assert!(!is_affirmative("retry"));
    }
}
