//! Positional field cursor for AT payloads
//!
//! Payloads are comma separated positional fields, optionally quoted, with
//! the occasional hex number or parenthesized group. Every method returns
//! `None` on mismatch so that parsers can be written as a `?` chain:
//!
//! ```ignore
//! let mut c = Cursor::new("1,\"12345\",129");
//! let index = c.int()?;
//! c.skip(',')?;
//! let number = c.quoted()?;
//! ```

/// Cursor over an ASCII payload
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Unread part of the input
    pub fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    /// True once every byte has been consumed
    pub fn is_done(&self) -> bool {
        self.pos == self.input.len()
    }

    /// `Some(())` once every byte has been consumed
    pub fn finish(&self) -> Option<()> {
        self.is_done().then_some(())
    }

    pub fn has_more(&self) -> bool {
        !self.is_done()
    }

    pub fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// Bytes consumed so far
    pub fn consumed(&self) -> usize {
        self.pos
    }

    /// Consume exactly `c`
    pub fn skip(&mut self, c: char) -> Option<()> {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            Some(())
        } else {
            None
        }
    }

    /// Consume `c` if present
    pub fn skip_if(&mut self, c: char) -> bool {
        self.skip(c).is_some()
    }

    /// Consume spaces and control characters
    pub fn skip_ws(&mut self) -> &mut Self {
        let rest = self.remaining();
        let trimmed = rest.trim_start_matches(|c: char| c <= ' ');
        self.pos += rest.len() - trimmed.len();
        self
    }

    /// Consume the literal `s`
    pub fn skip_str(&mut self, s: &str) -> Option<()> {
        if self.remaining().starts_with(s) {
            self.pos += s.len();
            Some(())
        } else {
            None
        }
    }

    /// Consume one character
    pub fn char(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Decimal integer with an optional leading minus
    pub fn int(&mut self) -> Option<i32> {
        self.number(10)
    }

    /// Hexadecimal integer without prefix
    pub fn hex_int(&mut self) -> Option<i32> {
        self.number(16)
    }

    fn number(&mut self, radix: u32) -> Option<i32> {
        let rest = self.remaining();
        let sign = usize::from(rest.starts_with('-'));
        let digits = rest[sign..]
            .bytes()
            .take_while(|b| (*b as char).is_digit(radix))
            .count();
        if digits == 0 {
            return None;
        }

        let end = sign + digits;
        let value = i32::from_str_radix(&rest[..end], radix).ok()?;
        self.pos += end;
        Some(value)
    }

    /// Field up to `end`; the delimiter is consumed but not returned
    pub fn until(&mut self, end: char) -> Option<&'a str> {
        let rest = self.remaining();
        let idx = rest.find(end)?;
        self.pos += idx + end.len_utf8();
        Some(&rest[..idx])
    }

    /// `"text"`, returning the text without quotes
    pub fn quoted(&mut self) -> Option<&'a str> {
        self.skip('"')?;
        self.until('"')
    }

    /// Everything left; the cursor ends up done
    pub fn rest(&mut self) -> &'a str {
        let rest = self.remaining();
        self.pos = self.input.len();
        rest
    }
}

/// Strip one pair of surrounding double quotes, if present
pub fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_and_skip_chain() {
        let mut c = Cursor::new("12,-3");
        assert_eq!(c.int(), Some(12));
        assert_eq!(c.skip(','), Some(()));
        assert_eq!(c.int(), Some(-3));
        assert!(c.is_done());
    }

    #[test]
    fn test_int_rejects_non_digit() {
        let mut c = Cursor::new("x1");
        assert_eq!(c.int(), None);
        assert_eq!(c.consumed(), 0);
    }

    #[test]
    fn test_int_rejects_bare_minus() {
        let mut c = Cursor::new("-,");
        assert_eq!(c.int(), None);
    }

    #[test]
    fn test_hex_int() {
        let mut c = Cursor::new("00C3\"");
        assert_eq!(c.hex_int(), Some(0xC3));
        assert_eq!(c.peek(), Some('"'));
    }

    #[test]
    fn test_until_consumes_delimiter() {
        let mut c = Cursor::new("abc,def");
        assert_eq!(c.until(','), Some("abc"));
        assert_eq!(c.remaining(), "def");
        assert_eq!(c.until(','), None);
        assert_eq!(c.remaining(), "def");
    }

    #[test]
    fn test_quoted() {
        let mut c = Cursor::new("\"12345\",129");
        assert_eq!(c.quoted(), Some("12345"));
        assert_eq!(c.skip(','), Some(()));
        assert_eq!(c.int(), Some(129));
    }

    #[test]
    fn test_skip_ws_and_str() {
        let mut c = Cursor::new("+COPS:  0,2");
        assert_eq!(c.skip_str("+COPS:"), Some(()));
        c.skip_ws();
        assert_eq!(c.int(), Some(0));
        assert_eq!(c.skip_str("+COPS:"), None);
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"abc\""), "abc");
        assert_eq!(unquote("abc"), "abc");
        assert_eq!(unquote("\"abc"), "\"abc");
    }
}
