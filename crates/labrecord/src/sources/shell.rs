//! Line-oriented editing shell.

use std::fmt;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::mpsc;
use tracing::debug;

use super::EventSource;
use crate::controller::UiEvent;
use crate::error::Result;
use crate::model::{ExperimentField, FormField};
use crate::render::DocumentFormat;

/// Command reference printed by `help`.
pub const HELP_TEXT: &str = "\
Commands:
  course <text>              set the course title
  student <text>             set the student name
  register <text>            set the register number
  date <text>                set the confirmation date
  exp <n> date|title|link|marks <text>
                             edit experiment <n>
  add [<n>]                  add an experiment (below <n>, or at the end)
  clear <n>                  remove experiment <n>
  preview                    render and show the preview
  download [pdf|docx]        save the document
  close                      close the preview
  list                       show the form
  help                       show this help
  quit                       leave";

/// One parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    /// Forward to the controller.
    Event(UiEvent),
    /// Print [`HELP_TEXT`].
    Help,
}

/// Why a line could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError(String);

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ParseError {}

fn err<T>(message: impl Into<String>) -> std::result::Result<T, ParseError> {
    Err(ParseError(message.into()))
}

/// Split off the first whitespace-delimited word.
fn next_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(end) => (&text[..end], text[end..].trim_start()),
        None => (text, ""),
    }
}

fn parse_number(word: &str) -> std::result::Result<usize, ParseError> {
    word.parse::<usize>()
        .or_else(|_| err(format!("'{word}' is not an experiment number")))
}

/// Parse one line of shell input.
///
/// Returns `Ok(None)` for blank lines and `#` comments. Field values keep
/// their inner spacing; `download` without a format uses `default_format`.
///
/// # Errors
///
/// Returns a [`ParseError`] describing the problem for anything else that is
/// not a valid command.
pub fn parse_command(
    line: &str,
    default_format: DocumentFormat,
) -> std::result::Result<Option<ShellCommand>, ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (command, rest) = next_word(line);
    let event = match command.to_ascii_lowercase().as_str() {
        "help" | "?" => return Ok(Some(ShellCommand::Help)),
        "preview" => UiEvent::Preview,
        "close" => UiEvent::ClosePreview,
        "list" | "ls" => UiEvent::List,
        "quit" | "exit" => UiEvent::Quit,
        "download" | "save" => {
            let format = match rest.to_ascii_lowercase().as_str() {
                "" => default_format,
                "pdf" => DocumentFormat::Pdf,
                "docx" => DocumentFormat::Docx,
                other => return err(format!("unknown format '{other}' (use pdf or docx)")),
            };
            UiEvent::Download(format)
        }
        "add" => {
            let after = if rest.is_empty() {
                None
            } else {
                Some(parse_number(rest)?)
            };
            UiEvent::AddBlock { after }
        }
        "clear" => {
            if rest.is_empty() {
                return err("usage: clear <n>");
            }
            UiEvent::ClearBlock(parse_number(rest)?)
        }
        "exp" => {
            let (number, rest) = next_word(rest);
            let (field, value) = next_word(rest);
            if number.is_empty() || field.is_empty() {
                return err("usage: exp <n> date|title|link|marks <text>");
            }
            UiEvent::EditExperiment {
                number: parse_number(number)?,
                field: field.parse::<ExperimentField>().map_err(ParseError)?,
                value: value.to_string(),
            }
        }
        other => match other.parse::<FormField>() {
            Ok(field) => UiEvent::SetField {
                field,
                value: rest.to_string(),
            },
            Err(_) => return err(format!("unknown command '{command}' (try 'help')")),
        },
    };

    Ok(Some(ShellCommand::Event(event)))
}

/// Reads shell commands line by line.
#[derive(Debug)]
pub struct ShellSource<R> {
    reader: R,
    default_format: DocumentFormat,
    prompt: bool,
}

impl ShellSource<BufReader<Stdin>> {
    /// A shell over standard input that prints a prompt.
    #[must_use]
    pub fn stdin(default_format: DocumentFormat) -> Self {
        Self {
            reader: BufReader::new(tokio::io::stdin()),
            default_format,
            prompt: true,
        }
    }
}

impl<R: AsyncBufRead + Unpin + Send> ShellSource<R> {
    /// A silent shell over any line reader.
    #[must_use]
    pub fn new(reader: R, default_format: DocumentFormat) -> Self {
        Self {
            reader,
            default_format,
            prompt: false,
        }
    }
}

fn show_prompt(enabled: bool) {
    if enabled {
        use std::io::Write as _;
        print!("labrec> ");
        let _ = std::io::stdout().flush();
    }
}

#[async_trait::async_trait]
impl<R: AsyncBufRead + Unpin + Send> EventSource for ShellSource<R> {
    fn name(&self) -> &'static str {
        "shell"
    }

    async fn run(self: Box<Self>, tx: mpsc::Sender<UiEvent>) -> Result<()> {
        let Self {
            reader,
            default_format,
            prompt,
        } = *self;
        let mut lines = reader.lines();
        let mut quit_sent = false;

        if prompt {
            println!("Type 'help' for commands.");
        }
        loop {
            show_prompt(prompt);
            let Some(line) = lines.next_line().await? else {
                break;
            };
            match parse_command(&line, default_format) {
                Ok(None) => {}
                Ok(Some(ShellCommand::Help)) => println!("{HELP_TEXT}"),
                Ok(Some(ShellCommand::Event(event))) => {
                    let quit = event == UiEvent::Quit;
                    if tx.send(event).await.is_err() {
                        debug!("Controller gone; shell exiting");
                        return Ok(());
                    }
                    if quit {
                        quit_sent = true;
                        break;
                    }
                }
                Err(e) => println!("error: {e}"),
            }
        }

        if !quit_sent {
            debug!("End of input");
            let _ = tx.send(UiEvent::Quit).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Option<ShellCommand> {
        parse_command(line, DocumentFormat::Pdf).unwrap()
    }

    fn event(line: &str) -> UiEvent {
        match parse(line) {
            Some(ShellCommand::Event(event)) => event,
            other => panic!("expected an event for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_blank_and_comment() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("   "), None);
        assert_eq!(parse("# a comment"), None);
    }

    #[test]
    fn test_parse_set_field_keeps_inner_spacing() {
        assert_eq!(
            event("course CS101 - Intro  to Programming"),
            UiEvent::SetField {
                field: FormField::CourseTitle,
                value: "CS101 - Intro  to Programming".into(),
            }
        );
        assert_eq!(
            event("student"),
            UiEvent::SetField {
                field: FormField::StudentName,
                value: String::new(),
            }
        );
        assert_eq!(
            event("date 2024-06-30"),
            UiEvent::SetField {
                field: FormField::ConfirmDate,
                value: "2024-06-30".into(),
            }
        );
    }

    #[test]
    fn test_parse_experiment_edit() {
        assert_eq!(
            event("exp 2 link https://github.com/ada/lab2"),
            UiEvent::EditExperiment {
                number: 2,
                field: ExperimentField::Link,
                value: "https://github.com/ada/lab2".into(),
            }
        );
        assert_eq!(
            event("EXP 1 title Binary search trees"),
            UiEvent::EditExperiment {
                number: 1,
                field: ExperimentField::Title,
                value: "Binary search trees".into(),
            }
        );
    }

    #[test]
    fn test_parse_block_commands() {
        assert_eq!(event("add"), UiEvent::AddBlock { after: None });
        assert_eq!(event("add 3"), UiEvent::AddBlock { after: Some(3) });
        assert_eq!(event("clear 2"), UiEvent::ClearBlock(2));
    }

    #[test]
    fn test_parse_actions() {
        assert_eq!(event("preview"), UiEvent::Preview);
        assert_eq!(event("close"), UiEvent::ClosePreview);
        assert_eq!(event("list"), UiEvent::List);
        assert_eq!(event("quit"), UiEvent::Quit);
        assert_eq!(event("download"), UiEvent::Download(DocumentFormat::Pdf));
        assert_eq!(event("download docx"), UiEvent::Download(DocumentFormat::Docx));
        assert_eq!(parse("help"), Some(ShellCommand::Help));
    }

    #[test]
    fn test_download_uses_default_format() {
        let parsed = parse_command("download", DocumentFormat::Docx).unwrap();
        assert_eq!(
            parsed,
            Some(ShellCommand::Event(UiEvent::Download(DocumentFormat::Docx)))
        );
    }

    #[test]
    fn test_parse_errors() {
        for line in [
            "frobnicate",
            "clear",
            "clear two",
            "add x",
            "exp",
            "exp 1",
            "exp one title x",
            "exp 1 colour red",
            "download odt",
        ] {
            assert!(
                parse_command(line, DocumentFormat::Pdf).is_err(),
                "{line:?} should not parse"
            );
        }
    }

    #[tokio::test]
    async fn test_shell_source_sends_events_then_quit() {
        let input: &[u8] = b"course CS101 - Intro\nbogus\n\nadd\n";
        let source = Box::new(ShellSource::new(input, DocumentFormat::Pdf));
        let (tx, mut rx) = mpsc::channel(8);

        source.run(tx).await.unwrap();

        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(
            events,
            vec![
                UiEvent::SetField {
                    field: FormField::CourseTitle,
                    value: "CS101 - Intro".into(),
                },
                UiEvent::AddBlock { after: None },
                UiEvent::Quit,
            ]
        );
    }

    #[tokio::test]
    async fn test_shell_source_stops_at_quit() {
        let input: &[u8] = b"quit\npreview\n";
        let source = Box::new(ShellSource::new(input, DocumentFormat::Pdf));
        let (tx, mut rx) = mpsc::channel(8);

        source.run(tx).await.unwrap();

        assert_eq!(rx.recv().await, Some(UiEvent::Quit));
        assert_eq!(rx.recv().await, None);
    }
}
