//! Line tokenizer for A100 source
//!
//! Each source line is tokenized independently; there are no
//! multi-line constructs.  Identifiers are upper-cased while lexing
//! (the original editor upper-cased all typed input), string literals
//! keep their exact text, and a `#` starts a comment running to the end
//! of the line.

use std::fmt;

/// All token variants produced by the line lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Int(i32),
    Ident(String),
    Text(String),
    Eq,       // =
    Plus,     // +
    Minus,    // -
    Star,     // *
    Slash,    // /
    LBracket, // [
    RBracket, // ]
    Colon,    // :
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Int(value) => write!(f, "{}", value),
            Token::Ident(name) => f.write_str(name),
            Token::Text(text) => write!(f, "\"{}\"", text),
            Token::Eq => f.write_str("="),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::Slash => f.write_str("/"),
            Token::LBracket => f.write_str("["),
            Token::RBracket => f.write_str("]"),
            Token::Colon => f.write_str(":"),
        }
    }
}

/// Lexing failure; the preprocessor attaches the line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
}

/// Tokenizes one source line.  Returns an empty vector for blank and
/// comment-only lines.
pub fn tokenize(line: &str) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            '#' => break,
            c if c.is_whitespace() => {
                chars.next();
            }
            '0'..='9' => {
                let mut digits = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_digit() {
                        digits.push(d);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = digits.parse::<i32>().map_err(|_| LexError {
                    message: format!("number '{}' is too large", digits),
                })?;
                tokens.push(Token::Int(value));
            }
            c if c.is_ascii_alphabetic() => {
                let mut name = String::new();
                while let Some(&d) = chars.peek() {
                    if d.is_ascii_alphanumeric() || d == '_' {
                        name.push(d.to_ascii_uppercase());
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Ident(name));
            }
            '"' => {
                chars.next();
                let mut text = String::new();
                let mut closed = false;
                for d in chars.by_ref() {
                    if d == '"' {
                        closed = true;
                        break;
                    }
                    text.push(d);
                }
                if !closed {
                    return Err(LexError {
                        message: "unterminated string literal".to_string(),
                    });
                }
                tokens.push(Token::Text(text));
            }
            '=' => {
                chars.next();
                tokens.push(Token::Eq);
            }
            '+' => {
                chars.next();
                tokens.push(Token::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(Token::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(Token::Star);
            }
            '/' => {
                chars.next();
                tokens.push(Token::Slash);
            }
            '[' => {
                chars.next();
                tokens.push(Token::LBracket);
            }
            ']' => {
                chars.next();
                tokens.push(Token::RBracket);
            }
            ':' => {
                chars.next();
                tokens.push(Token::Colon);
            }
            other => {
                return Err(LexError {
                    message: format!("unexpected character '{}'", other),
                });
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_an_assignment() {
        let tokens = tokenize("r1 = R0 + 2").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("R1".to_string()),
                Token::Eq,
                Token::Ident("R0".to_string()),
                Token::Plus,
                Token::Int(2),
            ]
        );
    }

    #[test]
    fn comments_and_blanks_produce_no_tokens() {
        assert_eq!(tokenize("").unwrap(), vec![]);
        assert_eq!(tokenize("   ").unwrap(), vec![]);
        assert_eq!(tokenize("# just a note").unwrap(), vec![]);
        assert_eq!(
            tokenize("HALT  # done").unwrap(),
            vec![Token::Ident("HALT".to_string())]
        );
    }

    #[test]
    fn string_literals_keep_their_case() {
        let tokens = tokenize("S[0] = \"Hello\"").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("S".to_string()),
                Token::LBracket,
                Token::Int(0),
                Token::RBracket,
                Token::Eq,
                Token::Text("Hello".to_string()),
            ]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = tokenize("PRINT \"oops").unwrap_err();
        assert_eq!(err.message, "unterminated string literal");
    }

    #[test]
    fn oversized_number_is_an_error() {
        assert!(tokenize("R0 = 99999999999").is_err());
    }

    #[test]
    fn unexpected_character_is_an_error() {
        let err = tokenize("R0 = 1 & 2").unwrap_err();
        assert_eq!(err.message, "unexpected character '&'");
    }
}
