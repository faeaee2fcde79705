//! Variable expansion over the token sequence.
//!
//! Two passes, in order: assignment extraction, then `$NAME` substitution.
//! Expansion is whole-token only; a `$` embedded in a larger word is left
//! untouched, as is anything the lexer already classified as an operator.

use crate::env::Environment;
use crate::lexer::Token;
use regex::Regex;
use std::sync::LazyLock;

/// Valid variable names: `[A-Za-z_][A-Za-z0-9_]*`.
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[A-Za-z_][A-Za-z0-9_]*$").expect("variable name pattern"));

/// Split a word of the exact form `NAME=VALUE` (with a valid NAME and the
/// `=` not first) into its parts.
fn as_assignment(word: &str) -> Option<(&str, &str)> {
    let eq = word.find('=')?;
    if eq == 0 {
        return None;
    }
    let (name, value) = (&word[..eq], &word[eq + 1..]);
    NAME_RE.is_match(name).then_some((name, value))
}

/// Process assignments and substitutions, consuming the token sequence.
///
/// Pass 1 removes every `NAME=VALUE` word and records it via
/// [`Environment::set_var`], preserving the relative order of the remaining
/// tokens. Pass 2 replaces words that are exactly `$NAME` with the stored
/// value, or the empty string when NAME is undefined.
pub fn expand(tokens: Vec<Token>, env: &mut Environment) -> Vec<Token> {
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        match token {
            Token::Word(word) => match as_assignment(&word) {
                Some((name, value)) => {
                    log::debug!("assignment {name}={value}");
                    env.set_var(name, value);
                }
                None => out.push(Token::Word(word)),
            },
            other => out.push(other),
        }
    }

    for token in &mut out {
        if let Token::Word(word) = token {
            if let Some(name) = word.strip_prefix('$') {
                if NAME_RE.is_match(name) {
                    *word = env.value_of(name);
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::split_into_tokens;

    fn word(s: &str) -> Token {
        Token::Word(s.to_string())
    }

    fn fresh_env() -> Environment {
        Environment {
            vars: Default::default(),
            current_dir: std::env::current_dir().unwrap(),
        }
    }

    #[test]
    fn assignment_is_extracted_and_recorded() {
        let mut env = fresh_env();
        let tokens = expand(split_into_tokens("X=hello echo hi"), &mut env);
        assert_eq!(tokens, vec![word("echo"), word("hi")]);
        assert_eq!(env.get_var("X"), Some("hello".to_string()));
    }

    #[test]
    fn assignment_then_reference_in_same_line() {
        let mut env = fresh_env();
        let tokens = expand(split_into_tokens("X=hello echo $X"), &mut env);
        assert_eq!(tokens, vec![word("echo"), word("hello")]);
    }

    #[test]
    fn undefined_variable_expands_to_empty_string() {
        let mut env = fresh_env();
        let tokens = expand(split_into_tokens("echo $NOPE_12345"), &mut env);
        assert_eq!(tokens, vec![word("echo"), word("")]);
    }

    #[test]
    fn last_assignment_wins() {
        let mut env = fresh_env();
        expand(split_into_tokens("A=1 A=2"), &mut env);
        assert_eq!(env.get_var("A"), Some("2".to_string()));
    }

    #[test]
    fn embedded_dollar_is_not_expanded() {
        let mut env = fresh_env();
        env.set_var("X", "hello");
        let tokens = expand(split_into_tokens("echo pre$X $Xsuffix a$b"), &mut env);
        // `$Xsuffix` is a whole-token reference to the (undefined) variable
        // `Xsuffix`; `pre$X` and `a$b` embed `$` inside a larger word.
        assert_eq!(tokens, vec![word("echo"), word("pre$X"), word(""), word("a$b")]);
    }

    #[test]
    fn leading_equals_is_not_an_assignment() {
        let mut env = fresh_env();
        let tokens = expand(split_into_tokens("echo =foo 1BAD=x"), &mut env);
        assert_eq!(tokens, vec![word("echo"), word("=foo"), word("1BAD=x")]);
        assert_eq!(env.get_var("1BAD"), None);
    }

    #[test]
    fn value_may_contain_equals() {
        let mut env = fresh_env();
        expand(split_into_tokens("OPTS=a=b"), &mut env);
        assert_eq!(env.get_var("OPTS"), Some("a=b".to_string()));
    }

    #[test]
    fn operators_pass_through_untouched() {
        let mut env = fresh_env();
        let tokens = expand(split_into_tokens("a | b > c"), &mut env);
        assert_eq!(
            tokens,
            vec![word("a"), Token::Pipe, word("b"), Token::RedirectOut, word("c")]
        );
    }
}
