//! Numbered-menu front-end on a terminal.

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use trivia_client::prelude::*;
use trivia_client::protocol::InboundKind;

/// Menu entry that leaves the loop.
const EXIT_CHOICE: &str = "0";

/// Reads menu choices and field values line by line.
///
/// End of input at any prompt is treated as exit.
pub struct ConsoleSource<R, W> {
    lines: Lines<R>,
    out: W,
}

impl<R: AsyncBufRead + Unpin, W: Write> ConsoleSource<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Self {
            lines: input.lines(),
            out,
        }
    }

    fn show(&mut self, text: &str) {
        let written = self.out.write_all(text.as_bytes()).and_then(|()| self.out.flush());
        if let Err(e) = written {
            tracing::debug!(error = %e, "console write failed");
        }
    }

    fn show_menu(&mut self) {
        let mut menu = String::from("\n");
        for (i, kind) in CommandKind::ALL.iter().enumerate() {
            menu.push_str(&format!("  {}. {}\n", i + 1, kind.label()));
        }
        menu.push_str(&format!("  {EXIT_CHOICE}. exit\n> "));
        self.show(&menu);
    }

    async fn read_line(&mut self) -> Option<String> {
        match self.lines.next_line().await {
            Ok(Some(line)) => Some(line.trim().to_string()),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "reading input failed");
                None
            }
        }
    }
}

impl<R: AsyncBufRead + Unpin, W: Write> CommandSource for ConsoleSource<R, W> {
    async fn next_selection(&mut self) -> Selection {
        loop {
            self.show_menu();
            let Some(choice) = self.read_line().await else {
                return Selection::Exit;
            };
            if choice == EXIT_CHOICE {
                return Selection::Exit;
            }
            let Some(kind) = menu_kind(&choice) else {
                self.show(&format!("unknown option {choice:?}\n"));
                continue;
            };

            let mut fields = Fields::new();
            for name in kind.required_fields() {
                self.show(&format!("{name}: "));
                let Some(value) = self.read_line().await else {
                    return Selection::Exit;
                };
                fields.insert(name, value);
            }
            return Selection::Command(kind, fields);
        }
    }
}

/// Maps a menu number (1-based) to its command.
fn menu_kind(choice: &str) -> Option<CommandKind> {
    let n: usize = choice.parse().ok()?;
    CommandKind::ALL.get(n.checked_sub(1)?).copied()
}

/// Prints every frame as its tag and pretty-printed body.
pub struct PrintSink<W> {
    out: W,
}

impl<W: Write> PrintSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{text}") {
            tracing::debug!(error = %e, "console write failed");
        }
    }
}

impl<W: Write> ResponseSink for PrintSink<W> {
    fn deliver(&mut self, envelope: &Envelope) {
        let body = serde_json::to_string_pretty(&envelope.payload)
            .unwrap_or_else(|_| envelope.payload.to_string());
        let marker = match envelope.kind() {
            InboundKind::Other(_) => " (unrecognized)",
            _ => "",
        };
        self.line(&format!("<< {}{marker}\n{body}", envelope.tag));
    }

    fn rejected(&mut self, kind: CommandKind, error: &ProtocolError) {
        self.line(&format!("!! {} not sent: {error}", kind.label()));
    }

    fn notice(&mut self, reason: &str) {
        self.line(&format!("!! server: {reason}"));
    }

    fn dropped(&mut self, error: &ProtocolError) {
        self.line(&format!("!! unreadable response dropped: {error}"));
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use trivia_client::protocol::Tag;

    use super::*;

    fn console(input: &'static str) -> ConsoleSource<&'static [u8], Vec<u8>> {
        ConsoleSource::new(input.as_bytes(), Vec::new())
    }

    #[test]
    fn test_menu_kind_maps_numbers_in_menu_order() {
        assert_eq!(menu_kind("1"), Some(CommandKind::Create));
        assert_eq!(menu_kind("5"), Some(CommandKind::SelectQuestion));
        assert_eq!(menu_kind("9"), Some(CommandKind::NextRound));
        assert_eq!(menu_kind("0"), None);
        assert_eq!(menu_kind("10"), None);
        assert_eq!(menu_kind("x"), None);
    }

    #[tokio::test]
    async fn test_next_selection_prompts_for_required_fields() {
        let mut source = console("5\ng1\nScience\n200\n");
        let selection = source.next_selection().await;
        assert_eq!(
            selection,
            Selection::Command(
                CommandKind::SelectQuestion,
                Fields::new()
                    .with("gameId", "g1")
                    .with("category", "Science")
                    .with("pointValue", "200"),
            )
        );
        let shown = String::from_utf8(source.out).unwrap();
        assert!(shown.contains("pointValue: "));
    }

    #[tokio::test]
    async fn test_next_selection_skips_unknown_choice() {
        let mut source = console("42\n1\n");
        let selection = source.next_selection().await;
        assert_eq!(selection, Selection::Command(CommandKind::Create, Fields::new()));
        assert!(String::from_utf8(source.out).unwrap().contains("unknown option"));
    }

    #[tokio::test]
    async fn test_next_selection_exit_and_eof() {
        assert_eq!(console("0\n").next_selection().await, Selection::Exit);
        assert_eq!(console("").next_selection().await, Selection::Exit);
        // EOF in the middle of the field prompts.
        assert_eq!(console("2\n").next_selection().await, Selection::Exit);
    }

    #[test]
    fn test_print_sink_shows_tag_and_body() {
        let mut sink = PrintSink::new(Vec::new());
        let env = Envelope::new(Tag::new("START_WAIT").unwrap(), json!({ "gameId": "g1" }));
        sink.deliver(&env);
        sink.notice("Unknown gameId: g9");

        let shown = String::from_utf8(sink.out).unwrap();
        assert!(shown.contains("<< START_WAIT"));
        assert!(shown.contains("\"gameId\": \"g1\""));
        assert!(shown.contains("!! server: Unknown gameId: g9"));
        assert!(!shown.contains("unrecognized"));
    }

    #[test]
    fn test_print_sink_marks_unknown_tags() {
        let mut sink = PrintSink::new(Vec::new());
        sink.deliver(&Envelope::new(Tag::new("CONFETTI").unwrap(), json!({})));
        let shown = String::from_utf8(sink.out).unwrap();
        assert!(shown.starts_with("<< CONFETTI (unrecognized)\n"));
    }
}
