//! Inbound commands to the application core.
//!
//! These represent actions requested by the operator side (card reader,
//! console) that [`AppContext::handle_command`](super::context::AppContext::handle_command)
//! interprets.

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// A card id arrived from the reader.
    PresentCard(String),

    /// Operator-requested lock (e.g. to test the interlock).
    ManualLock(String),

    /// Close the session and stop scanning.
    EndSession,
}

impl AppCommand {
    /// Parse one console line.  Blank lines yield `None`.
    ///
    /// `quit` / `exit` end the session, `lock [reason]` locks manually, and
    /// anything else is taken as a card id.
    pub fn parse_line(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        Some(match word.to_ascii_lowercase().as_str() {
            "quit" | "exit" => Self::EndSession,
            "lock" => {
                let reason = rest.trim();
                Self::ManualLock(if reason.is_empty() {
                    String::from("Manual lock")
                } else {
                    reason.to_owned()
                })
            }
            _ => Self::PresentCard(line.to_owned()),
        })
    }
}
