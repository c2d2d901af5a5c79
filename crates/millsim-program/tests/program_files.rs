//! File-backed program parsing tests

use std::io::Write;

use millsim_core::ProgramError;
use millsim_program::{waypoints, Command, ProgramParser, StopReason, TruncationReason};
use proptest::prelude::*;
use tempfile::NamedTempFile;

fn write_program(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write program");
    file
}

#[test]
fn test_unknown_code_on_third_line_yields_two_commands() {
    let file = write_program(
        "N1G01X0.000Y0.000Z50.000\n\
         N2G01X10.000Y0.000Z50.000\n\
         N3G17X10.000Y10.000Z50.000\n\
         N4G01X0.000Y10.000Z50.000\n",
    );

    let mut parser = ProgramParser::open(file.path()).unwrap();
    let commands = parser.all_commands();

    assert_eq!(commands.len(), 2);
    assert_eq!(
        parser.stop_reason(),
        Some(StopReason::Truncated {
            line: 3,
            reason: TruncationReason::UnknownCode(17)
        })
    );
}

#[test]
fn test_missing_file_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.k16");

    match ProgramParser::open(&missing) {
        Err(ProgramError::Read { path, .. }) => assert_eq!(path, missing),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("opening a missing file should fail"),
    }
}

#[test]
fn test_reopen_restarts_sequence() {
    let file = write_program("N1G01X1.000Y2.000Z3.000\nN2G01X4.000Y5.000Z6.000\n");

    let first: Vec<Command> = ProgramParser::open(file.path()).unwrap().collect();
    let second = ProgramParser::open(file.path()).unwrap().all_commands();

    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

#[test]
fn test_waypoints_from_file() {
    let file = write_program("N1G01X10.000Y20.000Z30.000\nN2G01X1.0Y0.000Z0.000\n");

    let commands = ProgramParser::open(file.path()).unwrap().all_commands();
    let points = waypoints(&commands);

    assert_eq!(points.len(), 1);
    assert!((points[0].x + 1.0).abs() < 1e-6);
    assert!((points[0].y + 3.0).abs() < 1e-6);
    assert!((points[0].z - 2.0).abs() < 1e-6);
}

proptest! {
    #[test]
    fn prop_wrong_fraction_length_is_invalid(
        whole in 0u32..1000,
        digits in prop::sample::select(vec![0usize, 1, 2, 4, 5]),
    ) {
        let fraction = "7".repeat(digits);
        let line = format!("N1G01X{}.{}Y0.000Z0.000\n", whole, fraction);

        let commands = ProgramParser::from_reader(line.as_bytes()).all_commands();
        prop_assert_eq!(commands, vec![Command::Invalid]);
    }
}
