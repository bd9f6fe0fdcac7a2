//! Line-oriented prompting over any reader/writer pair.

use std::io::{self, BufRead, Write};
use std::str::FromStr;

/// Writes prompts to `output` and reads answers from `input`.
///
/// Every read returns `Ok(None)` once the input is exhausted.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Prints `prompt` and returns the next line without its line ending.
    ///
    /// Bytes that are not valid UTF-8 become U+FFFD instead of failing the read.
    pub fn line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut raw = Vec::new();
        if self.input.read_until(b'\n', &mut raw)? == 0 {
            return Ok(None);
        }
        let mut buf = String::from_utf8_lossy(&raw).into_owned();
        let trimmed = buf.trim_end_matches(['\n', '\r']).len();
        buf.truncate(trimmed);
        Ok(Some(buf))
    }

    /// Prompts until the answer parses as a `T`.
    pub fn number<T: FromStr>(&mut self, prompt: &str) -> io::Result<Option<T>> {
        loop {
            let Some(answer) = self.line(prompt)? else {
                return Ok(None);
            };
            match answer.trim().parse() {
                Ok(value) => return Ok(Some(value)),
                Err(_) => writeln!(self.output, "'{}' is not a valid number, try again", answer.trim())?,
            }
        }
    }

    /// Writes `text` followed by a newline.
    pub fn say(&mut self, text: impl std::fmt::Display) -> io::Result<()> {
        writeln!(self.output, "{}", text)
    }

    /// Writes `text` without a newline and flushes.
    pub fn print(&mut self, text: &str) -> io::Result<()> {
        write!(self.output, "{}", text)?;
        self.output.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_strips_line_endings_only() {
        let mut out = Vec::new();
        let mut prompter = Prompter::new(&b"  alice \r\nbob\n"[..], &mut out);
        assert_eq!(prompter.line("Name: ").unwrap(), Some("  alice ".to_string()));
        assert_eq!(prompter.line("Name: ").unwrap(), Some("bob".to_string()));
        assert_eq!(prompter.line("Name: ").unwrap(), None);
        drop(prompter);
        assert_eq!(String::from_utf8(out).unwrap(), "Name: Name: Name: ");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut prompter = Prompter::new(&b"a\xffb\r\nnext\n"[..], Vec::new());
        assert_eq!(prompter.line("> ").unwrap(), Some("a\u{FFFD}b".to_string()));
        assert_eq!(prompter.line("> ").unwrap(), Some("next".to_string()));
    }

    #[test]
    fn empty_line_is_not_end_of_input() {
        let mut prompter = Prompter::new(&b"\n"[..], Vec::new());
        assert_eq!(prompter.line("> ").unwrap(), Some(String::new()));
        assert_eq!(prompter.line("> ").unwrap(), None);
    }

    #[test]
    fn number_reprompts_until_valid() {
        let mut out = Vec::new();
        let mut prompter = Prompter::new(&b"ten\n\n 12 \n"[..], &mut out);
        assert_eq!(prompter.number::<i32>("Amount: ").unwrap(), Some(12));
        drop(prompter);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("Amount: ").count(), 3);
        assert!(text.contains("'ten' is not a valid number, try again"));
    }

    #[test]
    fn number_respects_type_range() {
        let mut prompter = Prompter::new(&b"-1\n5\n"[..], Vec::new());
        assert_eq!(prompter.number::<u64>("Nonce: ").unwrap(), Some(5));
    }

    #[test]
    fn number_stops_at_end_of_input() {
        let mut prompter = Prompter::new(&b"abc\n"[..], Vec::new());
        assert_eq!(prompter.number::<i32>("Amount: ").unwrap(), None);
    }
}
