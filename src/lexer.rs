//! Lexical analysis: splitting a raw command line into tokens.
//!
//! Tokenization is total: there is no lexer error. A blank or
//! whitespace-only line yields an empty token sequence, and an unterminated
//! quote simply consumes the rest of the line.

/// A token produced from a raw command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A word: command name, argument, assignment, or redirect target.
    /// Quote characters have already been stripped; a quoted operator
    /// character (`"|"`, `"<"`, ...) ends up here as plain word text.
    Word(String),
    /// The pipe operator, `|`.
    Pipe,
    /// Input redirection, `<`.
    RedirectIn,
    /// Output redirection, `>`.
    RedirectOut,
    /// Background marker, `&`. Only valid in trailing position; the parser
    /// enforces that.
    Background,
}

impl Token {
    /// The operator token for an unquoted special character, if any.
    fn operator(ch: char) -> Option<Token> {
        match ch {
            '|' => Some(Token::Pipe),
            '<' => Some(Token::RedirectIn),
            '>' => Some(Token::RedirectOut),
            '&' => Some(Token::Background),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord,
    ReadingSingleQuote,
    ReadingDoubleQuote,
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    buffer: String,
    /// True once the current word has begun, even if the buffer is still
    /// empty; `""` is a real (empty) word.
    in_word: bool,
}

impl LexingFSM {
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            state: LexingState::Start,
            buffer: String::new(),
            in_word: false,
        }
    }

    fn make_tokens(&mut self) -> Vec<Token> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.state {
                LexingState::Start => self.handle_start(ch, &mut out),
                LexingState::ReadingWord => self.handle_word(ch, &mut out),
                LexingState::ReadingSingleQuote => self.handle_quote(ch, '\''),
                LexingState::ReadingDoubleQuote => self.handle_quote(ch, '"'),
            }
        }

        // An unterminated quote has consumed to end of line; whatever was
        // collected still forms the final word.
        self.flush_word(&mut out);
        out
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn flush_word(&mut self, out: &mut Vec<Token>) {
        if self.in_word {
            out.push(Token::Word(std::mem::take(&mut self.buffer)));
            self.in_word = false;
        }
        self.state = LexingState::Start;
    }

    fn handle_start(&mut self, ch: char, out: &mut Vec<Token>) {
        match ch {
            ' ' | '\t' | '\n' => {}
            '\'' => {
                self.in_word = true;
                self.state = LexingState::ReadingSingleQuote;
            }
            '"' => {
                self.in_word = true;
                self.state = LexingState::ReadingDoubleQuote;
            }
            c => {
                if let Some(op) = Token::operator(c) {
                    out.push(op);
                } else {
                    self.buffer.push(c);
                    self.in_word = true;
                    self.state = LexingState::ReadingWord;
                }
            }
        }
    }

    fn handle_word(&mut self, ch: char, out: &mut Vec<Token>) {
        match ch {
            ' ' | '\t' | '\n' => self.flush_word(out),
            '\'' => self.state = LexingState::ReadingSingleQuote,
            '"' => self.state = LexingState::ReadingDoubleQuote,
            c => {
                if let Some(op) = Token::operator(c) {
                    self.flush_word(out);
                    out.push(op);
                } else {
                    self.buffer.push(c);
                }
            }
        }
    }

    fn handle_quote(&mut self, ch: char, closing: char) {
        if ch == closing {
            self.state = LexingState::ReadingWord;
        } else {
            self.buffer.push(ch);
        }
    }
}

/// Tokenize one raw command line.
///
/// Whitespace outside quotes separates words; `'...'` and `"..."` delimit
/// literal spans (the quotes themselves are dropped); unquoted `|`, `<`, `>`
/// and `&` always become standalone operator tokens, with or without
/// surrounding whitespace.
pub fn split_into_tokens(line: &str) -> Vec<Token> {
    let mut lexer = LexingFSM::new(line);
    lexer.make_tokens()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(s: &str) -> Token {
        Token::Word(s.to_string())
    }

    #[test]
    fn blank_line_yields_no_tokens() {
        assert!(split_into_tokens("").is_empty());
        assert!(split_into_tokens("   \t  ").is_empty());
    }

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(
            split_into_tokens("ls -l /tmp"),
            vec![word("ls"), word("-l"), word("/tmp")]
        );
    }

    #[test]
    fn operators_split_without_surrounding_whitespace() {
        assert_eq!(
            split_into_tokens("a|b<c>d"),
            vec![
                word("a"),
                Token::Pipe,
                word("b"),
                Token::RedirectIn,
                word("c"),
                Token::RedirectOut,
                word("d"),
            ]
        );
    }

    #[test]
    fn quoted_operator_stays_literal() {
        assert_eq!(
            split_into_tokens("echo \"<\" '|'"),
            vec![word("echo"), word("<"), word("|")]
        );
    }

    #[test]
    fn quotes_delimit_spans_and_are_dropped() {
        assert_eq!(
            split_into_tokens("echo \"hello world\" 'a b'"),
            vec![word("echo"), word("hello world"), word("a b")]
        );
    }

    #[test]
    fn adjacent_quoted_spans_join_one_word() {
        assert_eq!(split_into_tokens("a\"b c\"d"), vec![word("ab cd")]);
    }

    #[test]
    fn empty_quotes_form_an_empty_word() {
        assert_eq!(split_into_tokens("echo \"\""), vec![word("echo"), word("")]);
    }

    #[test]
    fn unterminated_quote_consumes_to_end_of_line() {
        assert_eq!(
            split_into_tokens("echo \"abc def"),
            vec![word("echo"), word("abc def")]
        );
    }

    #[test]
    fn trailing_ampersand_splits_from_word() {
        assert_eq!(
            split_into_tokens("sleep 5&"),
            vec![word("sleep"), word("5"), Token::Background]
        );
    }
}
