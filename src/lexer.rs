//! Lexical analysis (tokenization) of a single input line into shell words.
//!
//! Quoting rules:
//! - Unquoted whitespace separates words; runs of whitespace collapse.
//! - Single quotes preserve every enclosed character literally.
//! - Double quotes preserve enclosed characters literally, except that a backslash
//!   escapes a following `"` or `\`. Before any other character the backslash is kept.
//! - An unquoted backslash makes the next character literal and is itself dropped.
//!
//! The lexer never fails. An unterminated quote is closed at end of line and a
//! trailing lone backslash is discarded.

use log::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Unquoted,
    UnquotedEscape,
    SingleQuote,
    DoubleQuote,
    DoubleQuoteEscape,
}

struct LexingFSM {
    state: LexingState,
    words: Vec<String>,
    buffer: String,
}

impl LexingFSM {
    fn new() -> Self {
        LexingFSM {
            state: LexingState::Unquoted,
            words: Vec::new(),
            buffer: String::new(),
        }
    }

    /// Feeds every character of `line` through the state machine and returns the words.
    fn make_words(mut self, line: &str) -> Vec<String> {
        for ch in line.chars() {
            self.state = match self.state {
                LexingState::Unquoted => self.handle_unquoted(ch),
                LexingState::UnquotedEscape => {
                    self.buffer.push(ch);
                    LexingState::Unquoted
                }
                LexingState::SingleQuote => self.handle_single_quote(ch),
                LexingState::DoubleQuote => self.handle_double_quote(ch),
                LexingState::DoubleQuoteEscape => self.handle_double_quote_escape(ch),
            };
        }

        if self.state != LexingState::Unquoted {
            trace!("line ended in {:?}, closing implicitly", self.state);
        }
        self.finish_word();
        self.words
    }

    fn handle_unquoted(&mut self, ch: char) -> LexingState {
        match ch {
            '\\' => LexingState::UnquotedEscape,
            '\'' => LexingState::SingleQuote,
            '"' => LexingState::DoubleQuote,
            c if c.is_whitespace() => {
                self.finish_word();
                LexingState::Unquoted
            }
            c => {
                self.buffer.push(c);
                LexingState::Unquoted
            }
        }
    }

    fn handle_single_quote(&mut self, ch: char) -> LexingState {
        match ch {
            '\'' => LexingState::Unquoted,
            c => {
                self.buffer.push(c);
                LexingState::SingleQuote
            }
        }
    }

    fn handle_double_quote(&mut self, ch: char) -> LexingState {
        match ch {
            '"' => LexingState::Unquoted,
            '\\' => LexingState::DoubleQuoteEscape,
            c => {
                self.buffer.push(c);
                LexingState::DoubleQuote
            }
        }
    }

    fn handle_double_quote_escape(&mut self, ch: char) -> LexingState {
        if ch != '"' && ch != '\\' {
            self.buffer.push('\\');
        }
        self.buffer.push(ch);
        LexingState::DoubleQuote
    }

    /// Moves the buffer into the word list. Empty buffers produce no word.
    fn finish_word(&mut self) {
        if !self.buffer.is_empty() {
            self.words.push(std::mem::take(&mut self.buffer));
        }
    }
}

/// Splits `line` into words, applying the quoting and escaping rules of this module.
///
/// Adjacent quoted and unquoted segments join into one word:
///
/// ```
/// use quill_shell::tokenize;
/// assert_eq!(tokenize(r#"echo 'it''s' "a  b"c"#), ["echo", "its", "a  bc"]);
/// ```
pub fn tokenize(line: &str) -> Vec<String> {
    let words = LexingFSM::new().make_words(line);
    trace!("tokenized {line:?} into {words:?}");
    words
}
