use thiserror::Error;
use tracing::debug;

use crate::token::{Keyword, Op, Token, TokenKind, TokenValue};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at line {line}, column {column}")]
pub struct LexError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone)]
pub struct Lexer {
    source: Vec<char>,

    current: usize,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            current: 0,
            line: 1,
            column: 1,
        }
    }

    fn at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.current).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.source.get(self.current).copied()?;
        self.current += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error_at(&self, message: String, line: usize, column: usize) -> LexError {
        LexError {
            message,
            line,
            column,
        }
    }

    fn make_token(&self, kind: TokenKind, text: &str, line: usize, column: usize) -> Token {
        Token {
            kind,
            value: TokenValue::Text(text.to_string()),
            line,
            column,
        }
    }

    fn lex_string(&mut self, quote: char, line: usize, column: usize) -> Result<Token, LexError> {
        self.advance(); // opening quote

        let mut value = String::new();
        loop {
            match self.peek() {
                None => {
                    return Err(self.error_at(
                        "unterminated string literal".into(),
                        line,
                        column,
                    ));
                }
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    let escaped = self.advance().ok_or_else(|| {
                        self.error_at("unterminated string literal".into(), line, column)
                    })?;
                    value.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        // anything else keeps the escaped character as-is
                        other => other,
                    });
                }
                Some(c) => {
                    self.advance();
                    value.push(c);
                }
            }
        }

        Ok(self.make_token(TokenKind::Str, &value, line, column))
    }

    fn lex_number(&mut self, line: usize, column: usize) -> Result<Token, LexError> {
        let mut text = String::new();
        let mut has_decimal = false;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.advance();
            } else if c == '.' && !has_decimal {
                has_decimal = true;
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }

        let number = text
            .parse::<f64>()
            .map_err(|_| self.error_at(format!("invalid number literal '{}'", text), line, column))?;

        Ok(Token {
            kind: TokenKind::Number,
            value: TokenValue::Number(number),
            line,
            column,
        })
    }

    fn lex_ident(&mut self, line: usize, column: usize) -> Token {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                name.push(c);
                self.advance();
            } else {
                break;
            }
        }

        let kind = if let Some(keyword) = Keyword::from_ident(&name) {
            TokenKind::Keyword(keyword)
        } else {
            TokenKind::Ident
        };

        self.make_token(kind, &name, line, column)
    }

    fn two_char_op(&mut self, single: Op, double: Op, line: usize, column: usize) -> Token {
        self.advance();
        if self.peek() == Some('=') {
            self.advance();
            self.make_token(TokenKind::Op(double), double.as_str(), line, column)
        } else {
            self.make_token(TokenKind::Op(single), single.as_str(), line, column)
        }
    }

    fn single_char_op(&mut self, op: Op, line: usize, column: usize) -> Token {
        self.advance();
        self.make_token(TokenKind::Op(op), op.as_str(), line, column)
    }

    fn punctuation(&mut self, kind: TokenKind, c: char, line: usize, column: usize) -> Token {
        self.advance();
        self.make_token(kind, &c.to_string(), line, column)
    }

    pub fn lex(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        while let Some(c) = self.peek() {
            let line = self.line;
            let column = self.column;

            match c {
                _ if c.is_whitespace() => {
                    self.advance();
                }

                '/' => {
                    self.advance();
                    if self.peek() == Some('/') {
                        while !self.at_end() && self.peek() != Some('\n') {
                            self.advance();
                        }
                    } else {
                        tokens.push(self.make_token(
                            TokenKind::Op(Op::Slash),
                            Op::Slash.as_str(),
                            line,
                            column,
                        ));
                    }
                }

                '(' => tokens.push(self.punctuation(TokenKind::LParen, c, line, column)),
                ')' => tokens.push(self.punctuation(TokenKind::RParen, c, line, column)),
                '{' => tokens.push(self.punctuation(TokenKind::LBrace, c, line, column)),
                '}' => tokens.push(self.punctuation(TokenKind::RBrace, c, line, column)),
                ';' => tokens.push(self.punctuation(TokenKind::Semicolon, c, line, column)),
                ',' => tokens.push(self.punctuation(TokenKind::Comma, c, line, column)),

                '"' | '\'' => tokens.push(self.lex_string(c, line, column)?),

                '=' => tokens.push(self.two_char_op(Op::Assign, Op::EqualEqual, line, column)),
                '!' => tokens.push(self.two_char_op(Op::Bang, Op::BangEqual, line, column)),
                '<' => tokens.push(self.two_char_op(Op::Lesser, Op::LesserEqual, line, column)),
                '>' => tokens.push(self.two_char_op(Op::Greater, Op::GreaterEqual, line, column)),

                '&' => {
                    self.advance();
                    if self.peek() == Some('&') {
                        self.advance();
                        tokens.push(self.make_token(
                            TokenKind::Op(Op::AndAnd),
                            Op::AndAnd.as_str(),
                            line,
                            column,
                        ));
                    } else {
                        return Err(self.error_at("expected '&' after '&'".into(), line, column));
                    }
                }
                '|' => {
                    self.advance();
                    if self.peek() == Some('|') {
                        self.advance();
                        tokens.push(self.make_token(
                            TokenKind::Op(Op::OrOr),
                            Op::OrOr.as_str(),
                            line,
                            column,
                        ));
                    } else {
                        return Err(self.error_at("expected '|' after '|'".into(), line, column));
                    }
                }

                '+' => tokens.push(self.single_char_op(Op::Plus, line, column)),
                '-' => tokens.push(self.single_char_op(Op::Minus, line, column)),
                '*' => tokens.push(self.single_char_op(Op::Star, line, column)),

                _ if c.is_ascii_digit() => tokens.push(self.lex_number(line, column)?),

                _ if c.is_ascii_alphabetic() || c == '_' => {
                    tokens.push(self.lex_ident(line, column))
                }

                _ => {
                    return Err(self.error_at(
                        format!("unexpected character '{}'", c),
                        line,
                        column,
                    ));
                }
            }
        }

        Ok(tokens)
    }
}

pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let tokens = Lexer::new(source).lex()?;
    debug!(tokens = tokens.len(), "lexed source");
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|token| token.kind)
            .collect()
    }

    #[test]
    fn keywords_are_tagged() {
        assert_eq!(
            kinds("bawal suru khatam ye bol"),
            vec![
                TokenKind::Keyword(Keyword::Bawal),
                TokenKind::Keyword(Keyword::Suru),
                TokenKind::Keyword(Keyword::Khatam),
                TokenKind::Keyword(Keyword::Ye),
                TokenKind::Keyword(Keyword::Bol),
            ]
        );
    }

    #[test]
    fn identifiers_keep_their_spelling() {
        let tokens = tokenize("jod _tmp x1").unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[0].text(), "jod");
        assert_eq!(tokens[1].text(), "_tmp");
        assert_eq!(tokens[2].text(), "x1");
    }

    #[test]
    fn numbers_parse_with_one_decimal_point() {
        let tokens = tokenize("42 3.25").unwrap();
        assert_eq!(tokens[0].value, TokenValue::Number(42.0));
        assert_eq!(tokens[1].value, TokenValue::Number(3.25));
    }

    #[test]
    fn multi_char_operators_win_over_single() {
        assert_eq!(
            kinds("== != <= >= && || = < > ! + - * /"),
            vec![
                TokenKind::Op(Op::EqualEqual),
                TokenKind::Op(Op::BangEqual),
                TokenKind::Op(Op::LesserEqual),
                TokenKind::Op(Op::GreaterEqual),
                TokenKind::Op(Op::AndAnd),
                TokenKind::Op(Op::OrOr),
                TokenKind::Op(Op::Assign),
                TokenKind::Op(Op::Lesser),
                TokenKind::Op(Op::Greater),
                TokenKind::Op(Op::Bang),
                TokenKind::Op(Op::Plus),
                TokenKind::Op(Op::Minus),
                TokenKind::Op(Op::Star),
                TokenKind::Op(Op::Slash),
            ]
        );
    }

    #[test]
    fn strings_decode_escapes() {
        let tokens = tokenize(r#""a\nb" 'c\td' "\q""#).unwrap();
        assert_eq!(tokens[0].text(), "a\nb");
        assert_eq!(tokens[1].text(), "c\td");
        assert_eq!(tokens[2].text(), "q");
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("1 // everything here disappears\n2"),
            vec![TokenKind::Number, TokenKind::Number]
        );
    }

    #[test]
    fn positions_track_lines_and_columns() {
        let tokens = tokenize("ye x;\n  bol x;").unwrap();
        assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
        assert_eq!((tokens[1].line, tokens[1].column), (1, 4));
        assert_eq!((tokens[3].line, tokens[3].column), (2, 3));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = tokenize("bol \"open").unwrap_err();
        assert_eq!(err.message, "unterminated string literal");
        assert_eq!((err.line, err.column), (1, 5));
    }

    #[test]
    fn unexpected_character_is_an_error() {
        let err = tokenize("ye x = 1 # 2;").unwrap_err();
        assert_eq!(err.message, "unexpected character '#'");
        assert_eq!((err.line, err.column), (1, 10));
    }

    #[test]
    fn lone_ampersand_is_an_error() {
        let err = tokenize("1 & 2").unwrap_err();
        assert_eq!(err.message, "expected '&' after '&'");
    }
}
