//! # millsim Program
//!
//! Line-oriented machining program parsing.
//!
//! Every line has the form `N<line>G<code><params>`. Only `G01` (linear move)
//! is understood; its parameters are `X<num>Y<num>Z<num>` with exactly three
//! fractional digits per number.
//!
//! ```
//! use millsim_program::{Command, ProgramParser};
//!
//! let program = "N1G01X1.500Y0.000Z-2.125\nN2G01X0.000Y0.000Z0.000\n";
//! let commands = ProgramParser::from_reader(program.as_bytes()).all_commands();
//! assert_eq!(commands.len(), 2);
//! assert_eq!(commands[0], Command::LinearMove { x: 1.5, y: 0.0, z: -2.125 });
//! ```

pub mod command;
pub mod cursor;
pub mod parser;

pub use command::{waypoints, Command};
pub use cursor::LineCursor;
pub use parser::{CommandParser, ProgramParser, SequenceWarning, StopReason, TruncationReason};
