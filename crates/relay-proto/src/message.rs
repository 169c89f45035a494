//! Decoded protocol message.
//!
//! A `Message` is the structured form of one protocol line. Parsing is a
//! pure, total function: malformed or empty input yields a message with an
//! empty command rather than an error, so every line can still reach raw
//! observers for diagnosis.

use std::fmt;

/// One decoded protocol line.
///
/// Fields mirror the wire grammar directly:
///
/// - `prefix`: originating peer, conventionally `nick!user@host`
/// - `command`: verb token, either a named operation or a three-digit
///   numeric reply code (verbatim, not normalized)
/// - `params`: ordered single-word arguments (insertion order = wire order)
/// - `trailing`: final free-text argument, the only field that may contain
///   embedded spaces
///
/// # Invariants
///
/// - `trailing` is `Some` only when the wire form carried an explicit
///   trailing marker (a space immediately followed by a colon, or a
///   leading colon on the first argument).
/// - The boundary between `params` and `trailing` is unambiguous for any
///   well-formed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Source prefix, without the leading `:`.
    pub prefix: Option<String>,
    /// Command token, verbatim.
    pub command: String,
    /// Single-word arguments before any trailing field.
    pub params: Vec<String>,
    /// Final free-text argument, without the introducing `:`.
    pub trailing: Option<String>,
}

impl Message {
    /// Start building an outbound message with the given command.
    pub fn new(command: impl Into<String>) -> Self {
        Self { prefix: None, command: command.into(), params: Vec::new(), trailing: None }
    }

    /// Append one single-word parameter.
    #[must_use]
    pub fn param(mut self, param: impl Into<String>) -> Self {
        self.params.push(param.into());
        self
    }

    /// Set the trailing argument.
    #[must_use]
    pub fn trailing(mut self, trailing: impl Into<String>) -> Self {
        self.trailing = Some(trailing.into());
        self
    }

    /// Decode one protocol line.
    ///
    /// Total function: never fails. Worst case (empty or malformed input)
    /// yields an empty command with no params or trailing.
    ///
    /// Grammar walk:
    /// 1. A leading `:` introduces the prefix, terminated by the first space.
    /// 2. The command is the next token, up to the next space; if no space
    ///    follows, the trimmed remainder is the whole command.
    /// 3. The rest splits at the first ` :` marker into params (space-split,
    ///    empty tokens discarded) and a verbatim trailing. A remainder whose
    ///    first character is `:` is entirely trailing. Otherwise the whole
    ///    remainder is params.
    pub fn parse(line: &str) -> Self {
        let mut rest = line;

        let prefix = match rest.strip_prefix(':') {
            Some(after_colon) => match after_colon.split_once(' ') {
                Some((prefix, after)) => {
                    rest = after;
                    Some(prefix.to_owned())
                },
                None => {
                    rest = "";
                    Some(after_colon.to_owned())
                },
            },
            None => None,
        };

        let (command, remainder) = match rest.split_once(' ') {
            Some((command, remainder)) => (command.to_owned(), Some(remainder)),
            None => (rest.trim().to_owned(), None),
        };

        let mut params = Vec::new();
        let mut trailing = None;

        if let Some(remainder) = remainder {
            if let Some((before, after)) = remainder.split_once(" :") {
                params = split_params(before);
                trailing = Some(after.to_owned());
            } else if let Some(rest) = remainder.strip_prefix(':') {
                trailing = Some(rest.to_owned());
            } else {
                params = split_params(remainder);
            }
        }

        Self { prefix, command, params, trailing }
    }

    /// Nick portion of the prefix: everything before the first `!`.
    ///
    /// `None` when the line carried no prefix. A prefix without `!` (a bare
    /// server name) is returned whole.
    pub fn source_nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        Some(prefix.split('!').next().unwrap_or(prefix))
    }

    /// Render to wire form, without the CRLF terminator.
    ///
    /// The session appends CRLF just before writing to the transport;
    /// everything above that boundary works with bare lines.
    pub fn to_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = &self.prefix {
            write!(f, ":{prefix} ")?;
        }
        write!(f, "{}", self.command)?;
        for param in &self.params {
            write!(f, " {param}")?;
        }
        if let Some(trailing) = &self.trailing {
            write!(f, " :{trailing}")?;
        }
        Ok(())
    }
}

/// Split on single spaces, discarding empty tokens.
fn split_params(raw: &str) -> Vec<String> {
    raw.split(' ').filter(|token| !token.is_empty()).map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_numeric_with_prefix_and_trailing() {
        let msg = Message::parse(":irc.example.org 001 alice :Welcome to the network");

        assert_eq!(msg.prefix.as_deref(), Some("irc.example.org"));
        assert_eq!(msg.command, "001");
        assert_eq!(msg.params, vec!["alice"]);
        assert_eq!(msg.trailing.as_deref(), Some("Welcome to the network"));
    }

    #[test]
    fn parse_ping_with_trailing_only() {
        let msg = Message::parse("PING :abc123");

        assert_eq!(msg.prefix, None);
        assert_eq!(msg.command, "PING");
        assert!(msg.params.is_empty());
        assert_eq!(msg.trailing.as_deref(), Some("abc123"));
    }

    #[test]
    fn parse_privmsg_with_param_and_trailing() {
        let msg = Message::parse("PRIVMSG #general :Hello World");

        assert_eq!(msg.command, "PRIVMSG");
        assert_eq!(msg.params, vec!["#general"]);
        assert_eq!(msg.trailing.as_deref(), Some("Hello World"));
    }

    #[test]
    fn parse_join_without_prefix_or_trailing() {
        let msg = Message::parse("JOIN #general");

        assert_eq!(msg.prefix, None);
        assert_eq!(msg.command, "JOIN");
        assert_eq!(msg.params, vec!["#general"]);
        assert_eq!(msg.trailing, None);
    }

    #[test]
    fn parse_trailing_keeps_embedded_spaces_and_colons() {
        let msg = Message::parse(":nick!user@host PRIVMSG #chan :a b  :c");

        assert_eq!(msg.params, vec!["#chan"]);
        assert_eq!(msg.trailing.as_deref(), Some("a b  :c"));
    }

    #[test]
    fn parse_empty_line_is_total() {
        let msg = Message::parse("");

        assert_eq!(msg.prefix, None);
        assert_eq!(msg.command, "");
        assert!(msg.params.is_empty());
        assert_eq!(msg.trailing, None);
    }

    #[test]
    fn parse_bare_colon_is_total() {
        let msg = Message::parse(":");

        assert_eq!(msg.prefix.as_deref(), Some(""));
        assert_eq!(msg.command, "");
    }

    #[test]
    fn parse_discards_empty_param_tokens() {
        let msg = Message::parse("MODE  #chan   +o  alice");

        assert_eq!(msg.params, vec!["#chan", "+o", "alice"]);
    }

    #[test]
    fn source_nick_stops_at_bang() {
        let msg = Message::parse(":alice!alice@host PRIVMSG #chan :hi");
        assert_eq!(msg.source_nick(), Some("alice"));

        let server = Message::parse(":irc.example.org 001 alice :hi");
        assert_eq!(server.source_nick(), Some("irc.example.org"));

        let bare = Message::parse("PING :x");
        assert_eq!(bare.source_nick(), None);
    }

    #[test]
    fn render_matches_wire_form() {
        let line = Message::new("USER")
            .param("alice")
            .param("0")
            .param("*")
            .trailing("Alice Example")
            .to_line();

        assert_eq!(line, "USER alice 0 * :Alice Example");

        let bare = Message::new("NICK").param("alice").to_line();
        assert_eq!(bare, "NICK alice");
    }
}
