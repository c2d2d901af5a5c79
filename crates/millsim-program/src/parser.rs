//! Machining program parser
//!
//! Reads a program strictly top to bottom, one command per line. A line with
//! a bad header (`N<line>G<code>`) or an unregistered command code ends the
//! program: everything after it is ignored, even valid lines. A registered
//! command whose parameters fail to parse yields [`Command::Invalid`] and
//! parsing continues.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use millsim_core::ProgramError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::command::Command;
use crate::cursor::LineCursor;

/// Highest command code the header accepts
const MAX_COMMAND_CODE: u32 = 99;

/// Sub-parser for the parameters of one command code
pub type CommandParser = fn(&mut LineCursor<'_>) -> Command;

/// Why a header ended the program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TruncationReason {
    /// Line does not start with `N<digits>`
    MissingLineNumber,
    /// `G<digits>` does not follow the line number
    MissingCommandCode,
    /// Command code above 99
    CodeOutOfRange(u32),
    /// Command code with no registered sub-parser
    UnknownCode(u8),
}

impl std::fmt::Display for TruncationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingLineNumber => write!(f, "missing N line number"),
            Self::MissingCommandCode => write!(f, "missing G command code"),
            Self::CodeOutOfRange(code) => write!(f, "command code G{} out of range", code),
            Self::UnknownCode(code) => write!(f, "unsupported command code G{:02}", code),
        }
    }
}

/// Why the command sequence ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The source was read to the end
    EndOfInput,
    /// A header or command code ended the program early
    Truncated {
        /// 1-based physical line in the source
        line: usize,
        /// What was wrong with the line
        reason: TruncationReason,
    },
    /// The source failed mid-read
    ReadFailed {
        /// 1-based physical line that could not be read
        line: usize,
    },
}

impl StopReason {
    /// Whether the program ended before the end of its source
    pub fn is_truncated(&self) -> bool {
        !matches!(self, Self::EndOfInput)
    }
}

/// Non-fatal line numbering irregularity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceWarning {
    /// 1-based physical line in the source
    pub source_line: usize,
    /// Line number of the previous accepted command
    pub previous: u32,
    /// Line number found on this line
    pub found: u32,
}

enum LineOutcome {
    Command(Command),
    Truncate(TruncationReason),
}

/// Lazy, single-pass program parser
///
/// Construct with [`ProgramParser::open`] for files or
/// [`ProgramParser::from_reader`] for any buffered source, then pull commands
/// with [`next_command`](Self::next_command), iterate, or drain with
/// [`all_commands`](Self::all_commands). The sequence cannot be restarted;
/// reopen the source instead.
pub struct ProgramParser<R> {
    reader: R,
    parsers: HashMap<u8, CommandParser>,
    previous_line: u32,
    source_line: usize,
    stop: Option<StopReason>,
    warnings: Vec<SequenceWarning>,
}

impl ProgramParser<BufReader<File>> {
    /// Open a program file
    ///
    /// # Errors
    /// Returns [`ProgramError::Read`] if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ProgramError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ProgramError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Opened program {}", path.display());
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> ProgramParser<R> {
    /// Create a parser over a buffered source
    pub fn from_reader(reader: R) -> Self {
        let mut parsers: HashMap<u8, CommandParser> = HashMap::new();
        parsers.insert(1, parse_linear_move);

        Self {
            reader,
            parsers,
            previous_line: 0,
            source_line: 0,
            stop: None,
            warnings: Vec::new(),
        }
    }

    /// Register a sub-parser for a command code, replacing any existing one
    pub fn register(&mut self, code: u8, parser: CommandParser) {
        self.parsers.insert(code, parser);
    }

    /// Parse the next command
    ///
    /// Returns `None` once the source is exhausted or a line ends the program;
    /// [`stop_reason`](Self::stop_reason) tells the two apart.
    pub fn next_command(&mut self) -> Option<Command> {
        if self.stop.is_some() {
            return None;
        }

        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => {
                    self.stop = Some(StopReason::EndOfInput);
                    return None;
                }
                Ok(_) => self.source_line += 1,
                Err(e) => {
                    self.source_line += 1;
                    warn!("Failed to read program line {}: {}", self.source_line, e);
                    self.stop = Some(StopReason::ReadFailed {
                        line: self.source_line,
                    });
                    return None;
                }
            }

            let text = line.trim_end_matches(['\n', '\r']);
            if text.trim().is_empty() {
                continue;
            }

            return match self.parse_line(text) {
                LineOutcome::Command(command) => Some(command),
                LineOutcome::Truncate(reason) => {
                    warn!(
                        "Program truncated at line {}: {}",
                        self.source_line, reason
                    );
                    self.stop = Some(StopReason::Truncated {
                        line: self.source_line,
                        reason,
                    });
                    None
                }
            };
        }
    }

    /// Drain every remaining command
    pub fn all_commands(&mut self) -> Vec<Command> {
        std::iter::from_fn(|| self.next_command()).collect()
    }

    /// Why the sequence ended, or `None` while commands may remain
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop
    }

    /// Line numbering warnings seen so far
    pub fn warnings(&self) -> &[SequenceWarning] {
        &self.warnings
    }

    fn parse_line(&mut self, text: &str) -> LineOutcome {
        let mut cursor = LineCursor::new(text);

        if !cursor.eat('N') {
            return LineOutcome::Truncate(TruncationReason::MissingLineNumber);
        }
        let Some(line_number) = cursor.read_uint() else {
            return LineOutcome::Truncate(TruncationReason::MissingLineNumber);
        };

        if line_number.checked_sub(self.previous_line) != Some(1) {
            warn!(
                "Program line numbering: line is {}, previous was {}",
                line_number, self.previous_line
            );
            self.warnings.push(SequenceWarning {
                source_line: self.source_line,
                previous: self.previous_line,
                found: line_number,
            });
        }

        if !cursor.eat('G') {
            return LineOutcome::Truncate(TruncationReason::MissingCommandCode);
        }
        let Some(code) = cursor.read_uint() else {
            return LineOutcome::Truncate(TruncationReason::MissingCommandCode);
        };
        if code > MAX_COMMAND_CODE {
            return LineOutcome::Truncate(TruncationReason::CodeOutOfRange(code));
        }

        let code = code as u8;
        let Some(parser) = self.parsers.get(&code) else {
            return LineOutcome::Truncate(TruncationReason::UnknownCode(code));
        };

        self.previous_line = line_number;
        let command = parser(&mut cursor);
        if command.is_invalid() {
            debug!("Invalid parameters on program line {}", self.source_line);
        }
        LineOutcome::Command(command)
    }
}

impl<R: BufRead> Iterator for ProgramParser<R> {
    type Item = Command;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_command()
    }
}

/// `X<num>Y<num>Z<num>` with nothing after it
fn parse_linear_move(cursor: &mut LineCursor<'_>) -> Command {
    let mut axis = |letter: char| -> Option<f32> {
        if !cursor.eat(letter) {
            return None;
        }
        cursor.read_fixed()
    };

    let (Some(x), Some(y), Some(z)) = (axis('X'), axis('Y'), axis('Z')) else {
        return Command::Invalid;
    };
    if !cursor.is_exhausted() {
        return Command::Invalid;
    }

    Command::LinearMove { x, y, z }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(program: &str) -> (Vec<Command>, Option<StopReason>) {
        let mut parser = ProgramParser::from_reader(program.as_bytes());
        let commands = parser.all_commands();
        (commands, parser.stop_reason())
    }

    #[test]
    fn test_parses_linear_move() {
        let (commands, stop) = parse("N1G01X1.500Y0.000Z-2.125\n");
        assert_eq!(
            commands,
            vec![Command::LinearMove {
                x: 1.5,
                y: 0.0,
                z: -2.125
            }]
        );
        assert_eq!(stop, Some(StopReason::EndOfInput));
    }

    #[test]
    fn test_two_fraction_digits_is_invalid() {
        let (commands, _) = parse("N1G01X1.50Y0.000Z0.000\n");
        assert_eq!(commands, vec![Command::Invalid]);
    }

    #[test]
    fn test_mid_token_minus_is_invalid() {
        let (commands, _) = parse("N1G01X1.-00Y0.000Z0.000\n");
        assert_eq!(commands, vec![Command::Invalid]);
    }

    #[test]
    fn test_wrong_axis_order_is_invalid() {
        let (commands, _) = parse("N1G01Y0.000X0.000Z0.000\n");
        assert_eq!(commands, vec![Command::Invalid]);
    }

    #[test]
    fn test_trailing_garbage_is_invalid() {
        let (commands, _) = parse("N1G01X0.000Y0.000Z0.000F100\n");
        assert_eq!(commands, vec![Command::Invalid]);
    }

    #[test]
    fn test_invalid_does_not_stop_parsing() {
        let (commands, stop) = parse(
            "N1G01X0.000Y0.000Z0.000\nN2G01X1.5Y0.000Z0.000\nN3G01X1.000Y0.000Z0.000\n",
        );
        assert_eq!(commands.len(), 3);
        assert!(commands[1].is_invalid());
        assert_eq!(stop, Some(StopReason::EndOfInput));
    }

    #[test]
    fn test_unknown_code_truncates() {
        let (commands, stop) = parse(
            "N1G01X0.000Y0.000Z0.000\nN2G00X1.000Y0.000Z0.000\nN3G01X1.000Y0.000Z0.000\n",
        );
        assert_eq!(commands.len(), 1);
        assert_eq!(
            stop,
            Some(StopReason::Truncated {
                line: 2,
                reason: TruncationReason::UnknownCode(0)
            })
        );
    }

    #[test]
    fn test_bad_headers_truncate() {
        let (_, stop) = parse("G01X0.000Y0.000Z0.000\n");
        assert!(matches!(
            stop,
            Some(StopReason::Truncated {
                reason: TruncationReason::MissingLineNumber,
                ..
            })
        ));

        let (_, stop) = parse("N1X0.000Y0.000Z0.000\n");
        assert!(matches!(
            stop,
            Some(StopReason::Truncated {
                reason: TruncationReason::MissingCommandCode,
                ..
            })
        ));

        let (_, stop) = parse("N1G100X0.000Y0.000Z0.000\n");
        assert!(matches!(
            stop,
            Some(StopReason::Truncated {
                reason: TruncationReason::CodeOutOfRange(100),
                ..
            })
        ));
    }

    #[test]
    fn test_sequence_warning_does_not_stop() {
        let mut parser = ProgramParser::from_reader(
            "N1G01X0.000Y0.000Z0.000\nN5G01X1.000Y0.000Z0.000\nN6G01X2.000Y0.000Z0.000\n"
                .as_bytes(),
        );
        let commands = parser.all_commands();
        assert_eq!(commands.len(), 3);
        assert_eq!(
            parser.warnings(),
            &[SequenceWarning {
                source_line: 2,
                previous: 1,
                found: 5
            }]
        );
    }

    #[test]
    fn test_blank_lines_and_crlf() {
        let (commands, _) = parse("N1G01X0.000Y0.000Z0.000\r\n\r\n   \nN2G01X1.000Y2.000Z3.000\r\n");
        assert_eq!(commands.len(), 2);
        assert_eq!(
            commands[1],
            Command::LinearMove {
                x: 1.0,
                y: 2.0,
                z: 3.0
            }
        );
    }

    #[test]
    fn test_next_command_after_stop_stays_none() {
        let mut parser = ProgramParser::from_reader("N1G02X0.000Y0.000Z0.000\n".as_bytes());
        assert_eq!(parser.next_command(), None);
        assert_eq!(parser.next_command(), None);
    }

    #[test]
    fn test_register_additional_code() {
        fn rapid(_: &mut LineCursor<'_>) -> Command {
            Command::Invalid
        }
        let mut parser = ProgramParser::from_reader("N1G00\nN2G01X0.000Y0.000Z0.000\n".as_bytes());
        parser.register(0, rapid);
        let commands: Vec<Command> = parser.by_ref().collect();
        assert_eq!(commands.len(), 2);
        assert_eq!(parser.stop_reason(), Some(StopReason::EndOfInput));
    }
}
