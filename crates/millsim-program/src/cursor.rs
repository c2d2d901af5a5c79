//! Character cursor over a single program line

/// Number of fractional digits every program coordinate must carry
pub const FRACTION_DIGITS: usize = 3;

/// Forward-only cursor over one line of program text
///
/// Program lines are ASCII; the cursor works on bytes and treats anything
/// outside ASCII as an ordinary non-matching character.
#[derive(Debug, Clone)]
pub struct LineCursor<'a> {
    line: &'a [u8],
    pos: usize,
}

impl<'a> LineCursor<'a> {
    /// Create a cursor at the start of `line`
    pub fn new(line: &'a str) -> Self {
        Self {
            line: line.as_bytes(),
            pos: 0,
        }
    }

    /// Current byte offset
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Look at the next character without consuming it
    pub fn peek(&self) -> Option<char> {
        self.line.get(self.pos).map(|&b| b as char)
    }

    /// Consume and return the next character
    pub fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    /// Consume the next character if it equals `expected`
    pub fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Whether only whitespace remains
    pub fn is_exhausted(&self) -> bool {
        self.line[self.pos..].iter().all(u8::is_ascii_whitespace)
    }

    fn take_digits(&mut self) -> usize {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        self.pos - start
    }

    fn slice(&self, start: usize) -> &'a str {
        // Only ASCII digits, '-' and '.' are ever sliced.
        std::str::from_utf8(&self.line[start..self.pos]).unwrap_or_default()
    }

    /// Read a run of ASCII digits as an unsigned integer
    ///
    /// Returns `None` without consuming anything if the next character is not a
    /// digit; returns `None` after consuming the run if it overflows.
    pub fn read_uint(&mut self) -> Option<u32> {
        let start = self.pos;
        if self.take_digits() == 0 {
            return None;
        }
        self.slice(start).parse().ok()
    }

    /// Read a fixed-point number: `-?\d+(\.\d{3})`
    ///
    /// A `-` is only legal as the first character. The number must have exactly
    /// [`FRACTION_DIGITS`] digits after the decimal point, and may not be
    /// followed directly by another `-` or `.`.
    pub fn read_fixed(&mut self) -> Option<f32> {
        let start = self.pos;
        self.eat('-');

        if self.take_digits() == 0 {
            return None;
        }
        if !self.eat('.') {
            return None;
        }
        if self.take_digits() != FRACTION_DIGITS {
            return None;
        }
        if matches!(self.peek(), Some('-') | Some('.')) {
            return None;
        }

        self.slice(start).parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_uint() {
        let mut c = LineCursor::new("123G");
        assert_eq!(c.read_uint(), Some(123));
        assert_eq!(c.bump(), Some('G'));
        assert_eq!(c.bump(), None);
    }

    #[test]
    fn test_read_uint_requires_digit() {
        let mut c = LineCursor::new("G01");
        assert_eq!(c.read_uint(), None);
        assert_eq!(c.position(), 0);
    }

    #[test]
    fn test_read_uint_overflow() {
        let mut c = LineCursor::new("99999999999999999999");
        assert_eq!(c.read_uint(), None);
    }

    #[test]
    fn test_read_fixed_valid() {
        assert_eq!(LineCursor::new("1.500").read_fixed(), Some(1.5));
        assert_eq!(LineCursor::new("-2.125").read_fixed(), Some(-2.125));
        assert_eq!(LineCursor::new("0.000Y").read_fixed(), Some(0.0));
    }

    #[test]
    fn test_read_fixed_wrong_fraction_length() {
        assert_eq!(LineCursor::new("1.5").read_fixed(), None);
        assert_eq!(LineCursor::new("1.5000").read_fixed(), None);
        assert_eq!(LineCursor::new("1").read_fixed(), None);
    }

    #[test]
    fn test_read_fixed_misplaced_sign() {
        assert_eq!(LineCursor::new("1.-00").read_fixed(), None);
        assert_eq!(LineCursor::new("1.000-").read_fixed(), None);
        assert_eq!(LineCursor::new("--1.000").read_fixed(), None);
        assert_eq!(LineCursor::new(".500").read_fixed(), None);
    }

    #[test]
    fn test_is_exhausted() {
        let mut c = LineCursor::new("X  \t");
        assert!(!c.is_exhausted());
        c.bump();
        assert!(c.is_exhausted());
    }
}
