use thiserror::Error;
use tracing::debug;

use crate::{
    ast,
    token::{Keyword, Op, Token, TokenKind, TokenValue},
};

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}, got '{found}' at line {line}, column {column}")]
pub struct SyntaxError {
    pub message: String,
    pub found: String,
    pub line: usize,
    pub column: usize,
}

impl Op {
    fn precedence(&self) -> u8 {
        match self {
            Op::OrOr => 1,
            Op::AndAnd => 2,
            Op::EqualEqual | Op::BangEqual => 3,
            Op::Lesser | Op::Greater | Op::LesserEqual | Op::GreaterEqual => 4,
            Op::Plus | Op::Minus => 5,
            Op::Star | Op::Slash => 6,
            Op::Assign | Op::Bang => {
                panic!("`precedence()` called on non-binary operator: {:?}", self)
            }
        }
    }
}

#[derive(Debug, Clone)]
struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Parser { tokens, current: 0 }
    }

    fn at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.current)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|token| token.kind)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.peek_kind() == Some(TokenKind::Keyword(keyword))
    }

    fn peek_binary_op(&self) -> Option<Op> {
        match self.peek_kind() {
            Some(TokenKind::Op(op)) if op.is_binary() => Some(op),
            _ => None,
        }
    }

    fn error_at_current(&self, message: &str) -> SyntaxError {
        match self.peek() {
            Some(token) => SyntaxError {
                message: message.into(),
                found: token.to_string(),
                line: token.line,
                column: token.column,
            },
            None => {
                let (line, column) = self
                    .tokens
                    .last()
                    .map(|token| (token.line, token.column))
                    .unwrap_or((0, 0));
                SyntaxError {
                    message: message.into(),
                    found: "end of input".into(),
                    line,
                    column,
                }
            }
        }
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> Result<&'a Token, SyntaxError> {
        match self.tokens.get(self.current) {
            Some(token) if token.kind == kind => {
                self.current += 1;
                Ok(token)
            }
            _ => Err(self.error_at_current(message)),
        }
    }

    fn expect_ident(&mut self, message: &str) -> Result<String, SyntaxError> {
        let token = self.expect(TokenKind::Ident, message)?;
        Ok(token.text().to_string())
    }

    fn is_program_end(&self) -> bool {
        self.check_keyword(Keyword::Bawal)
            && matches!(
                self.tokens.get(self.current + 1).map(|token| token.kind),
                Some(TokenKind::Keyword(Keyword::Khatam))
            )
    }

    fn parse_program(&mut self) -> Result<ast::Program, SyntaxError> {
        let opens_with_sentinel = self.check_keyword(Keyword::Bawal)
            && matches!(
                self.tokens.get(self.current + 1).map(|token| token.kind),
                Some(TokenKind::Keyword(Keyword::Suru))
            );
        if !opens_with_sentinel {
            return Err(self.error_at_current("program must start with 'bawal suru'"));
        }
        self.current += 2;

        let mut body = Vec::new();
        while !self.at_end() && !self.is_program_end() {
            match self.parse_statement() {
                Ok(Some(stmt)) => body.push(stmt),
                Ok(None) => {}
                Err(error) => {
                    // skip to a statement boundary so a caller could resume for
                    // further diagnostics; the first error is still the one reported
                    self.synchronize();
                    return Err(error);
                }
            }
        }

        if self.at_end() {
            return Err(self.error_at_current("program must end with 'bawal khatam'"));
        }
        self.current += 2; // consume the end sentinel

        Ok(ast::Program { body })
    }

    /// Returns `Ok(None)` for a lone `;`, which is a no-op statement.
    fn parse_statement(&mut self) -> Result<Option<ast::Stmt>, SyntaxError> {
        if self.check(TokenKind::Semicolon) {
            self.current += 1;
            return Ok(None);
        }

        if let Some(TokenKind::Keyword(keyword)) = self.peek_kind() {
            self.current += 1;
            let stmt = match keyword {
                Keyword::Ye => self.parse_declaration()?,
                Keyword::Bol => self.parse_print()?,
                Keyword::Nivesh => self.parse_input()?,
                Keyword::Agar => self.parse_if()?,
                Keyword::Jabtak => self.parse_while()?,
                Keyword::Kaam => self.parse_function()?,
                Keyword::Wapis => self.parse_return()?,
                Keyword::Bawal => {
                    self.current -= 1;
                    return Err(self.error_at_current(
                        "unexpected 'bawal' keyword, use 'bawal suru' at start and 'bawal khatam' at end",
                    ));
                }
                Keyword::Suru | Keyword::Khatam => {
                    self.current -= 1;
                    return Err(self.error_at_current(&format!(
                        "unexpected '{}' keyword, use 'bawal {}' for program structure",
                        keyword.as_str(),
                        keyword.as_str()
                    )));
                }
                Keyword::Warna => {
                    self.current -= 1;
                    return Err(
                        self.error_at_current("unexpected 'warna' without a matching 'agar'")
                    );
                }
            };
            return Ok(Some(stmt));
        }

        let expression = self.parse_expression()?;
        self.expect(TokenKind::Semicolon, "expected ';' after expression")?;
        Ok(Some(ast::Stmt::Expression(expression)))
    }

    fn parse_declaration(&mut self) -> Result<ast::Stmt, SyntaxError> {
        let name = self.expect_ident("expected variable name")?;

        let initializer = if self.check(TokenKind::Op(Op::Assign)) {
            self.current += 1;
            Some(self.parse_expression()?)
        } else {
            None
        };

        self.expect(
            TokenKind::Semicolon,
            "expected ';' after variable declaration",
        )?;

        Ok(ast::VarDecl { name, initializer }.into())
    }

    fn parse_print(&mut self) -> Result<ast::Stmt, SyntaxError> {
        let expression = self.parse_expression()?;
        self.expect(TokenKind::Semicolon, "expected ';' after print statement")?;

        Ok(ast::PrintStmt { expression }.into())
    }

    fn parse_input(&mut self) -> Result<ast::Stmt, SyntaxError> {
        let variable = self.expect_ident("expected variable name")?;
        self.expect(TokenKind::Semicolon, "expected ';' after input statement")?;

        Ok(ast::InputStmt { variable }.into())
    }

    fn parse_return(&mut self) -> Result<ast::Stmt, SyntaxError> {
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect(TokenKind::Semicolon, "expected ';' after return statement")?;

        Ok(ast::ReturnStmt { value }.into())
    }

    fn parse_if(&mut self) -> Result<ast::Stmt, SyntaxError> {
        self.expect(TokenKind::LParen, "expected '(' after 'agar'")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen, "expected ')' after condition")?;

        let consequent = self.parse_block()?;

        let mut alternate = None;
        if self.check_keyword(Keyword::Warna) {
            self.current += 1;
            if self.check_keyword(Keyword::Agar) {
                // else-if chains nest as a single if-statement alternate
                self.current += 1;
                alternate = Some(vec![self.parse_if()?]);
            } else {
                alternate = Some(self.parse_block()?);
            }
        }

        Ok(ast::IfStmt {
            condition,
            consequent,
            alternate,
        }
        .into())
    }

    fn parse_while(&mut self) -> Result<ast::Stmt, SyntaxError> {
        self.expect(TokenKind::LParen, "expected '(' after 'jabtak'")?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen, "expected ')' after condition")?;

        let body = self.parse_block()?;

        Ok(ast::WhileStmt { condition, body }.into())
    }

    fn parse_function(&mut self) -> Result<ast::Stmt, SyntaxError> {
        let name = self.expect_ident("expected function name")?;

        self.expect(TokenKind::LParen, "expected '(' after function name")?;
        let mut parameters = Vec::new();
        if !self.check(TokenKind::RParen) {
            loop {
                parameters.push(self.expect_ident("expected parameter name")?);
                if self.check(TokenKind::Comma) {
                    self.current += 1;
                } else {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "expected ')' after parameters")?;

        let body = self.parse_block()?;

        Ok(ast::FunDecl {
            name,
            parameters,
            body,
        }
        .into())
    }

    fn parse_block(&mut self) -> Result<Vec<ast::Stmt>, SyntaxError> {
        self.expect(TokenKind::LBrace, "expected '{'")?;

        let mut statements = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.at_end() {
            if let Some(stmt) = self.parse_statement()? {
                statements.push(stmt);
            }
        }

        self.expect(TokenKind::RBrace, "expected '}'")?;
        Ok(statements)
    }

    fn parse_expression(&mut self) -> Result<ast::Expr, SyntaxError> {
        let primary = self.parse_primary()?;
        self.parse_prec_expr(primary, 0)
    }

    fn parse_prec_expr(&mut self, mut lhs: ast::Expr, min_prec: u8) -> Result<ast::Expr, SyntaxError> {
        while let Some(op) = self.peek_binary_op() {
            if op.precedence() < min_prec {
                break;
            }
            self.current += 1;

            let mut rhs = self.parse_primary()?;
            while let Some(lookahead) = self.peek_binary_op() {
                if lookahead.precedence() > op.precedence() {
                    rhs = self.parse_prec_expr(rhs, op.precedence() + 1)?;
                } else {
                    break;
                }
            }

            lhs = ast::BinaryExpr {
                op,
                left: Box::new(lhs),
                right: Box::new(rhs),
            }
            .into();
        }

        Ok(lhs)
    }

    fn parse_primary(&mut self) -> Result<ast::Expr, SyntaxError> {
        let token = match self.peek() {
            Some(token) => token.clone(),
            None => return Err(self.error_at_current("expected expression")),
        };

        let mut expr = match token.kind {
            TokenKind::Number => {
                self.current += 1;
                match token.value {
                    TokenValue::Number(number) => ast::Expr::NumberLit(number),
                    TokenValue::Text(_) => unreachable!("number token without numeric value"),
                }
            }
            TokenKind::Str => {
                self.current += 1;
                ast::Expr::StringLit(token.text().to_string())
            }
            TokenKind::Ident => {
                self.current += 1;
                ast::Expr::Identifier(token.text().to_string())
            }
            TokenKind::LParen => {
                self.current += 1;
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen, "expected ')' after expression")?;
                inner
            }
            TokenKind::Op(op) if op.is_prefix() => {
                self.current += 1;
                let operand = self.parse_primary()?;
                ast::UnaryExpr {
                    op,
                    operand: Box::new(operand),
                }
                .into()
            }
            _ => return Err(self.error_at_current("expected expression")),
        };

        // call parentheses bind only to a bare identifier callee
        while self.check(TokenKind::LParen) {
            let callee = match &expr {
                ast::Expr::Identifier(name) => name.clone(),
                _ => break,
            };
            self.current += 1;

            let mut arguments = Vec::new();
            if !self.check(TokenKind::RParen) {
                loop {
                    arguments.push(self.parse_expression()?);
                    if self.check(TokenKind::Comma) {
                        self.current += 1;
                    } else {
                        break;
                    }
                }
            }
            self.expect(TokenKind::RParen, "expected ')' after arguments")?;

            expr = ast::CallExpr { callee, arguments }.into();
        }

        Ok(expr)
    }

    fn synchronize(&mut self) {
        self.current += 1;

        while !self.at_end() {
            if let Some(previous) = self.tokens.get(self.current - 1) {
                if previous.kind == TokenKind::Semicolon {
                    return;
                }
            }

            if let Some(TokenKind::Keyword(keyword)) = self.peek_kind() {
                if matches!(
                    keyword,
                    Keyword::Ye
                        | Keyword::Bol
                        | Keyword::Nivesh
                        | Keyword::Agar
                        | Keyword::Jabtak
                        | Keyword::Kaam
                ) {
                    return;
                }
            }

            self.current += 1;
        }
    }
}

pub fn parse(tokens: &[Token]) -> Result<ast::Program, SyntaxError> {
    let mut parser = Parser::new(tokens);
    let program = parser.parse_program()?;
    debug!(statements = program.body.len(), "parsed program");
    Ok(program)
}
