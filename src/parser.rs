use crate::ast::{
    BlockStatement, ElseBranch, Expression, FunctionLiteral, Identifier, IfExpression, Program,
    Statement,
};
use crate::scanner::Scanner;
use crate::token::{Token, TokenType};
use num_enum::TryFromPrimitive;
use std::convert::TryFrom;
use std::error::Error;
use std::fmt;
use std::fmt::Formatter;
use std::rc::Rc;
use strum_macros::Display;

#[derive(Debug, Clone)]
pub struct ParseError {
    message: String,
    token: Token,
}

impl ParseError {
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] Parse Error", self.token.line)?;
        if let TokenType::EOF = self.token.tokentype {
            write!(f, " at end")?;
        } else {
            write!(f, " at '{}'", self.token.literal)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl Error for ParseError {}

#[derive(Debug, TryFromPrimitive, Display, PartialEq, PartialOrd, Clone, Copy)]
#[repr(u8)]
pub enum BindingPower {
    Lowest,
    Equals,     // == !=
    Or,         // ||
    And,        // &&
    Comparison, // < >
    Sum,        // + -
    Product,    // * /
    Power,      // ^
    Prefix,     // -x !x
    Call,       // f(x)
    Index,      // a[x]
}

#[derive(Debug, PartialEq, Clone, Copy)]
enum Associativity {
    Left,
    Right,
}

type PrefixParslet = fn(&mut Parser) -> Option<Expression>;
type InfixParslet = fn(&mut Parser, Expression) -> Option<Expression>;

struct ParseRule {
    prefix: Option<PrefixParslet>,
    infix: Option<InfixParslet>,
    power: BindingPower,
    associativity: Associativity,
}

impl ParseRule {
    fn get_rule(tt: TokenType) -> &'static ParseRule {
        &RULES[(tt as u8) as usize]
    }
    /// Binding power used to parse the right operand. Right-associative operators
    /// let an operator of the same power attach on the right.
    fn operand_power(&self) -> BindingPower {
        match self.associativity {
            Associativity::Left => self.power,
            Associativity::Right => BindingPower::try_from((self.power as u8).saturating_sub(1))
                .unwrap_or(BindingPower::Lowest),
        }
    }
}

macro_rules! lambdafy {
    (None) => {
        None
    };
    ($method:ident) => {
        Some(Parser::$method)
    };
}

macro_rules! mkrules {
    ($($prefix:tt, $infix:tt, $power:tt, $assoc:tt) ; +) => {
        &[
        $(
            ParseRule {
                prefix: lambdafy!($prefix),
                infix: lambdafy!($infix),
                power: BindingPower::$power,
                associativity: Associativity::$assoc,
            }
        ),+
        ]
    };
}

#[rustfmt::skip]
static RULES : &[ParseRule] = mkrules!(
    None,           None,       Lowest,     Left;   // Illegal
    None,           None,       Lowest,     Left;   // EOF
    identifier,     None,       Lowest,     Left;   // Ident
    integer,        None,       Lowest,     Left;   // Int
    string,         None,       Lowest,     Left;   // String
    None,           None,       Lowest,     Left;   // Assign
    None,           binary,     Sum,        Left;   // Plus
    unary,          binary,     Sum,        Left;   // Minus
    unary,          None,       Lowest,     Left;   // Bang
    None,           binary,     Product,    Left;   // Asterisk
    None,           binary,     Product,    Left;   // Slash
    None,           binary,     Power,      Right;  // Caret
    None,           binary,     Comparison, Left;   // Less
    None,           binary,     Comparison, Left;   // Greater
    None,           binary,     Equals,     Left;   // EqualEqual
    None,           binary,     Equals,     Left;   // BangEqual
    None,           binary,     And,        Right;  // And
    None,           binary,     Or,         Right;  // Or
    None,           None,       Lowest,     Left;   // Comma
    None,           None,       Lowest,     Left;   // Colon
    None,           None,       Lowest,     Left;   // Semicolon
    grouping,       call,       Call,       Left;   // LeftParen
    None,           None,       Lowest,     Left;   // RightParen
    hash,           None,       Lowest,     Left;   // LeftBrace
    None,           None,       Lowest,     Left;   // RightBrace
    array,          index,      Index,      Left;   // LeftBracket
    None,           None,       Lowest,     Left;   // RightBracket
    function,       None,       Lowest,     Left;   // Function
    None,           None,       Lowest,     Left;   // Let
    boolean,        None,       Lowest,     Left;   // True
    boolean,        None,       Lowest,     Left;   // False
    if_expression,  None,       Lowest,     Left;   // If
    None,           None,       Lowest,     Left;   // Else
    None,           None,       Lowest,     Left    // Return
);

/// Parses a whole program, handing back every error found if there were any.
pub fn parse(source: &str) -> Result<Program, Vec<ParseError>> {
    let mut parser = Parser::new(source);
    let program = parser.parse_program();
    if parser.errors.is_empty() {
        Ok(program)
    } else {
        Err(parser.errors)
    }
}

pub struct Parser {
    scanner: Scanner,
    current: Token,
    peek: Token,
    errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(source: &str) -> Parser {
        let mut scanner = Scanner::new(source);
        let current = scanner.next_token();
        let peek = scanner.next_token();
        Parser {
            scanner,
            current,
            peek,
            errors: Vec::new(),
        }
    }
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::default();
        while !self.current.is(TokenType::EOF) {
            let errors_before = self.errors.len();
            match self.statement() {
                Some(stmt) => program.statements.push(stmt),
                None => {
                    if self.errors.len() > errors_before {
                        self.synchronize();
                    }
                }
            }
            self.advance();
        }
        program
    }
    /// Pratt loop: parse a prefix expression, then keep folding infix operators
    /// into it while they bind tighter than `power`.
    pub fn parse_expression(&mut self, power: BindingPower) -> Option<Expression> {
        let prefix = match ParseRule::get_rule(self.current.tokentype).prefix {
            None => {
                self.error(format!(
                    "no prefix parse function for {} found",
                    self.current.tokentype
                ));
                return None;
            }
            Some(f) => f,
        };
        let mut left = prefix(self)?;
        loop {
            let rule = ParseRule::get_rule(self.peek.tokentype);
            let infix = match rule.infix {
                Some(f) if power < rule.power => f,
                _ => return Some(left),
            };
            self.advance();
            left = infix(self, left)?;
        }
    }
    fn statement(&mut self) -> Option<Statement> {
        let stmt = match self.current.tokentype {
            TokenType::Semicolon => return None,
            TokenType::Let => self.let_statement()?,
            TokenType::Return => self.return_statement()?,
            _ => self.expression_statement()?,
        };
        if self.peek.is(TokenType::Semicolon) {
            self.advance();
        }
        Some(stmt)
    }
    fn let_statement(&mut self) -> Option<Statement> {
        let token = self.current.clone();
        self.expect_peek(TokenType::Ident)?;
        let name = Identifier {
            token: self.current.clone(),
            name: self.current.literal.clone(),
        };
        self.expect_peek(TokenType::Assign)?;
        self.advance();
        let value = self.parse_expression(BindingPower::Lowest)?;
        Some(Statement::Let { token, name, value })
    }
    fn return_statement(&mut self) -> Option<Statement> {
        let token = self.current.clone();
        self.advance();
        let value = self.parse_expression(BindingPower::Lowest)?;
        Some(Statement::Return { token, value })
    }
    fn expression_statement(&mut self) -> Option<Statement> {
        let token = self.current.clone();
        let expression = self.parse_expression(BindingPower::Lowest)?;
        Some(Statement::Expression { token, expression })
    }
    fn block(&mut self) -> Option<BlockStatement> {
        let token = self.current.clone();
        let mut statements = Vec::new();
        self.advance();
        while !self.current.is(TokenType::RightBrace) {
            if self.current.is(TokenType::EOF) {
                self.error("expected '}' to close block".to_string());
                return None;
            }
            if let Some(stmt) = self.statement() {
                statements.push(stmt);
            }
            self.advance();
        }
        Some(BlockStatement { token, statements })
    }
    fn identifier(&mut self) -> Option<Expression> {
        Some(Expression::Identifier(Identifier {
            token: self.current.clone(),
            name: self.current.literal.clone(),
        }))
    }
    fn integer(&mut self) -> Option<Expression> {
        match self.current.literal.parse::<i64>() {
            Ok(value) => Some(Expression::Integer {
                token: self.current.clone(),
                value,
            }),
            Err(_) => {
                self.error(format!(
                    "could not parse {} as integer",
                    self.current.literal
                ));
                None
            }
        }
    }
    fn string(&mut self) -> Option<Expression> {
        Some(Expression::String {
            token: self.current.clone(),
            value: self.current.literal.clone(),
        })
    }
    fn boolean(&mut self) -> Option<Expression> {
        Some(Expression::Boolean {
            token: self.current.clone(),
            value: self.current.is(TokenType::True),
        })
    }
    fn unary(&mut self) -> Option<Expression> {
        let operator = self.current.clone();
        self.advance();
        let right = self.parse_expression(BindingPower::Prefix)?;
        Some(Expression::Prefix {
            operator,
            right: Box::new(right),
        })
    }
    fn binary(&mut self, left: Expression) -> Option<Expression> {
        let operator = self.current.clone();
        let power = ParseRule::get_rule(operator.tokentype).operand_power();
        self.advance();
        let right = self.parse_expression(power)?;
        Some(Expression::Infix {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        })
    }
    fn grouping(&mut self) -> Option<Expression> {
        self.advance();
        let expr = self.parse_expression(BindingPower::Lowest)?;
        self.expect_peek(TokenType::RightParen)?;
        Some(expr)
    }
    fn if_expression(&mut self) -> Option<Expression> {
        Some(Expression::If(Box::new(self.if_clauses()?)))
    }
    fn if_clauses(&mut self) -> Option<IfExpression> {
        let token = self.current.clone();
        self.expect_peek(TokenType::LeftParen)?;
        self.advance();
        let condition = self.parse_expression(BindingPower::Lowest)?;
        self.expect_peek(TokenType::RightParen)?;
        self.expect_peek(TokenType::LeftBrace)?;
        let consequence = self.block()?;
        let alternative = if self.peek.is(TokenType::Else) {
            self.advance();
            match self.peek.tokentype {
                TokenType::LeftBrace => {
                    self.advance();
                    Some(ElseBranch::Block(self.block()?))
                }
                TokenType::If => {
                    self.advance();
                    Some(ElseBranch::If(Box::new(self.if_clauses()?)))
                }
                _ => {
                    self.peek_error("'{' or 'if'");
                    return None;
                }
            }
        } else {
            None
        };
        Some(IfExpression {
            token,
            condition,
            consequence,
            alternative,
        })
    }
    fn function(&mut self) -> Option<Expression> {
        let token = self.current.clone();
        self.expect_peek(TokenType::LeftParen)?;
        let parameters = self.parameters()?;
        self.expect_peek(TokenType::LeftBrace)?;
        let body = self.block()?;
        Some(Expression::Function(Rc::new(FunctionLiteral {
            token,
            parameters,
            body,
        })))
    }
    fn parameters(&mut self) -> Option<Vec<Identifier>> {
        let mut parameters = Vec::new();
        if self.peek.is(TokenType::RightParen) {
            self.advance();
            return Some(parameters);
        }
        loop {
            self.expect_peek(TokenType::Ident)?;
            parameters.push(Identifier {
                token: self.current.clone(),
                name: self.current.literal.clone(),
            });
            if !self.peek.is(TokenType::Comma) {
                break;
            }
            self.advance();
        }
        self.expect_peek(TokenType::RightParen)?;
        Some(parameters)
    }
    fn call(&mut self, function: Expression) -> Option<Expression> {
        let token = self.current.clone();
        let arguments = self.expression_list(TokenType::RightParen)?;
        Some(Expression::Call {
            token,
            function: Box::new(function),
            arguments,
        })
    }
    fn array(&mut self) -> Option<Expression> {
        let token = self.current.clone();
        let elements = self.expression_list(TokenType::RightBracket)?;
        Some(Expression::Array { token, elements })
    }
    fn index(&mut self, left: Expression) -> Option<Expression> {
        let token = self.current.clone();
        self.advance();
        let index = self.parse_expression(BindingPower::Lowest)?;
        self.expect_peek(TokenType::RightBracket)?;
        Some(Expression::Index {
            token,
            left: Box::new(left),
            index: Box::new(index),
        })
    }
    fn hash(&mut self) -> Option<Expression> {
        let token = self.current.clone();
        let mut pairs = Vec::new();
        while !self.peek.is(TokenType::RightBrace) {
            self.advance();
            let key = self.parse_expression(BindingPower::Lowest)?;
            self.expect_peek(TokenType::Colon)?;
            self.advance();
            let value = self.parse_expression(BindingPower::Lowest)?;
            pairs.push((key, value));
            if !self.peek.is(TokenType::RightBrace) {
                self.expect_peek(TokenType::Comma)?;
            }
        }
        self.expect_peek(TokenType::RightBrace)?;
        Some(Expression::Hash { token, pairs })
    }
    /// Comma separated expressions up to `end`; `current` is the opening delimiter.
    fn expression_list(&mut self, end: TokenType) -> Option<Vec<Expression>> {
        let mut list = Vec::new();
        if self.peek.is(end) {
            self.advance();
            return Some(list);
        }
        self.advance();
        list.push(self.parse_expression(BindingPower::Lowest)?);
        while self.peek.is(TokenType::Comma) {
            self.advance();
            self.advance();
            list.push(self.parse_expression(BindingPower::Lowest)?);
        }
        self.expect_peek(end)?;
        Some(list)
    }
    fn synchronize(&mut self) {
        loop {
            if self.current.is(TokenType::Semicolon) || self.current.is(TokenType::EOF) {
                return;
            }
            match self.peek.tokentype {
                TokenType::Let | TokenType::Return | TokenType::EOF => return,
                _ => (),
            }
            self.advance();
        }
    }
    fn advance(&mut self) {
        let next = self.scanner.next_token();
        self.current = std::mem::replace(&mut self.peek, next);
    }
    fn expect_peek(&mut self, tokentype: TokenType) -> Option<()> {
        if self.peek.is(tokentype) {
            self.advance();
            Some(())
        } else {
            self.peek_error(&tokentype.to_string());
            None
        }
    }
    fn peek_error(&mut self, expected: &str) {
        let message = format!(
            "expected next token to be {}, got {} instead",
            expected, self.peek.tokentype
        );
        let token = self.peek.clone();
        self.push_error(message, token);
    }
    fn error(&mut self, message: String) {
        let token = self.current.clone();
        self.push_error(message, token);
    }
    fn push_error(&mut self, message: String, token: Token) {
        tracing::debug!(line = token.line, %message, "parse error");
        self.errors.push(ParseError { message, token });
    }
}
