// Recursive-descent parser over the token stream produced by `lexer`.
//
// The grammar has no operator precedence: `2 + 3 * 4` parses (and later
// evaluates) as `(2 + 3) * 4`. This is deliberate, not an oversight — see
// DESIGN.md — so `parse_expr` folds strictly left-to-right instead of
// layering precedence levels the way most recursive-descent expression
// parsers do.

use crate::ast::{ArithOp, Expr};
use crate::lexer::{LexError, Lexer, Token, TokenKind};
use crate::pos::Pos;
use crate::types::Value;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseError {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),
    #[error("unexpected {found} at {pos}, expected {expected}")]
    Unexpected { found: String, expected: String, pos: Pos },
    #[error("'{op:?}' is not a legal unary operator at {pos}")]
    IllegalUnaryOp { op: ArithOp, pos: Pos },
}

/// Tokenizes `text` in full and parses it into a (possibly empty) root
/// `Output` node. An empty input parses to `Output { exprs: vec![] }`.
pub fn parse(text: &str) -> Result<Expr, ParseError> {
    let mut lexer = Lexer::new(text);
    let mut tokens = Vec::new();
    loop {
        let tok = lexer.next_token()?;
        let done = tok.kind == TokenKind::Eof;
        tokens.push(tok);
        if done {
            break;
        }
    }

    let mut parser = Parser::new(tokens);
    parser.parse_program()
}

struct Parser {
    tokens: Vec<Token>,
    idx: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Parser {
        Parser { tokens, idx: 0 }
    }

    fn peek(&self) -> &Token {
        // `tokens` always ends in an `Eof` token; never read past it.
        &self.tokens[self.idx.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.idx < self.tokens.len() - 1 {
            self.idx += 1;
        }
        tok
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::Unexpected {
            found: format!("{:?}", self.peek().kind),
            expected: expected.to_string(),
            pos: self.peek().pos,
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, ParseError> {
        if self.peek().kind == kind {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn parse_program(&mut self) -> Result<Expr, ParseError> {
        let mut exprs = Vec::new();
        while self.peek().kind != TokenKind::Eof {
            exprs.push(self.parse_expr_atom()?);
        }
        Ok(Expr::Output { exprs, pos: Pos::start() })
    }

    fn parse_expr_atom(&mut self) -> Result<Expr, ParseError> {
        match self.peek().kind.clone() {
            TokenKind::String(text) => {
                let pos = self.advance().pos;
                Ok(Expr::literal(Value::string(text), pos))
            }
            TokenKind::ProgramBracketLeft => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::ProgramBracketRight, "'}'")?;
                Ok(expr)
            }
            _ => Err(self.unexpected("text or '#{'")),
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_unary()?;
        while let TokenKind::ArithOp(op) = self.peek().kind {
            let pos = self.advance().pos;
            let right = self.parse_unary()?;
            left = Expr::Arithmetic { op, operands: vec![left, right], pos };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        if let TokenKind::ArithOp(op) = self.peek().kind {
            let pos = self.peek().pos;
            if op != ArithOp::Sub {
                return Err(ParseError::IllegalUnaryOp { op, pos });
            }
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expr::Arithmetic {
                op: ArithOp::Sub,
                operands: vec![Expr::literal(Value::Int(0), pos), operand],
                pos,
            });
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.peek().kind.clone() {
            TokenKind::ParenLeft => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(TokenKind::ParenRight, "')'")?;
                Ok(expr)
            }
            TokenKind::Integer(v) => {
                let pos = self.advance().pos;
                Ok(Expr::literal(Value::Int(v), pos))
            }
            TokenKind::Float(v) => {
                let pos = self.advance().pos;
                Ok(Expr::literal(Value::Float(v), pos))
            }
            TokenKind::Bool(v) => {
                let pos = self.advance().pos;
                Ok(Expr::literal(Value::Bool(v), pos))
            }
            TokenKind::String(text) => {
                let pos = self.advance().pos;
                Ok(Expr::literal(Value::string(text), pos))
            }
            TokenKind::Identifier(name) => {
                let pos = self.advance().pos;
                match self.peek().kind {
                    TokenKind::ParenLeft => {
                        self.advance();
                        let args = self.parse_arglist()?;
                        self.expect(TokenKind::ParenRight, "')'")?;
                        Ok(Expr::Call { func_name: name, args, pos })
                    }
                    TokenKind::SquareBracketLeft => {
                        self.advance();
                        let key = self.parse_expr()?;
                        self.expect(TokenKind::SquareBracketRight, "']'")?;
                        Ok(Expr::Index {
                            target: Box::new(Expr::VariableAccess { name, pos }),
                            key: Box::new(key),
                            pos,
                        })
                    }
                    _ => Ok(Expr::VariableAccess { name, pos }),
                }
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_arglist(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();
        if self.peek().kind == TokenKind::ParenRight {
            return Ok(args);
        }

        args.push(self.parse_expr()?);
        while self.peek().kind == TokenKind::Comma {
            self.advance();
            args.push(self.parse_expr()?);
        }
        Ok(args)
    }
}
