use crate::token::{Token, TokenType};
use phf::phf_map;
use std::iter::Peekable;
use std::vec::IntoIter;

pub struct Scanner {
    iter: Peekable<IntoIter<char>>,
    line: usize,
}

#[cfg(test)]
pub fn scan_tokens(source: &str) -> Vec<Token> {
    let mut scanner = Scanner::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = scanner.next_token();
        let at_end = token.is(TokenType::EOF);
        tokens.push(token);
        if at_end {
            return tokens;
        }
    }
}

impl Scanner {
    pub fn new(source: &str) -> Scanner {
        Scanner {
            iter: source.chars().collect::<Vec<char>>().into_iter().peekable(),
            line: 1,
        }
    }
    /// Produces the next token. Once the input is exhausted every further call yields EOF.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();
        let c = match self.iter.next() {
            None => return Token::new(TokenType::EOF, "", self.line),
            Some(c) => c,
        };
        match c {
            '+' => self.token(TokenType::Plus, "+"),
            '-' => self.token(TokenType::Minus, "-"),
            '*' => self.token(TokenType::Asterisk, "*"),
            '/' => self.token(TokenType::Slash, "/"),
            '^' => self.token(TokenType::Caret, "^"),
            '<' => self.token(TokenType::Less, "<"),
            '>' => self.token(TokenType::Greater, ">"),
            ',' => self.token(TokenType::Comma, ","),
            ':' => self.token(TokenType::Colon, ":"),
            ';' => self.token(TokenType::Semicolon, ";"),
            '(' => self.token(TokenType::LeftParen, "("),
            ')' => self.token(TokenType::RightParen, ")"),
            '{' => self.token(TokenType::LeftBrace, "{"),
            '}' => self.token(TokenType::RightBrace, "}"),
            '[' => self.token(TokenType::LeftBracket, "["),
            ']' => self.token(TokenType::RightBracket, "]"),
            '=' => {
                if self.next_if('=') {
                    self.token(TokenType::EqualEqual, "==")
                } else {
                    self.token(TokenType::Assign, "=")
                }
            }
            '!' => {
                if self.next_if('=') {
                    self.token(TokenType::BangEqual, "!=")
                } else {
                    self.token(TokenType::Bang, "!")
                }
            }
            '&' => {
                if self.next_if('&') {
                    self.token(TokenType::And, "&&")
                } else {
                    self.token(TokenType::Illegal, "&")
                }
            }
            '|' => {
                if self.next_if('|') {
                    self.token(TokenType::Or, "||")
                } else {
                    self.token(TokenType::Illegal, "|")
                }
            }
            '"' => self.string(),
            '0'..='9' => self.number(c),
            'a'..='z' | 'A'..='Z' | '_' => self.identifier(c),
            _ => self.token(TokenType::Illegal, &c.to_string()),
        }
    }
    fn token(&self, tokentype: TokenType, literal: &str) -> Token {
        Token::new(tokentype, literal, self.line)
    }
    fn skip_whitespace(&mut self) {
        while let Some(c) = self.iter.peek() {
            match c {
                ' ' | '\r' | '\t' => {
                    self.iter.next();
                }
                '\n' => {
                    self.line += 1;
                    self.iter.next();
                }
                _ => break,
            }
        }
    }
    fn next_if(&mut self, expected: char) -> bool {
        if let Some(c) = self.iter.peek() {
            if *c == expected {
                self.iter.next();
                return true;
            }
        }
        false
    }
    fn string(&mut self) -> Token {
        let line = self.line;
        let mut value = String::new();
        while let Some(c) = self.iter.next() {
            match c {
                '"' => return Token::new(TokenType::String, &value, line),
                '\n' => {
                    self.line += 1;
                    value.push(c);
                }
                _ => value.push(c),
            }
        }
        // Unterminated: hand back everything that was consumed.
        let mut literal = String::from("\"");
        literal.push_str(&value);
        Token::new(TokenType::Illegal, &literal, line)
    }
    fn number(&mut self, first: char) -> Token {
        let mut literal = first.to_string();
        while let Some(c) = self.iter.peek() {
            match c {
                '0'..='9' => {
                    literal.push(*c);
                    self.iter.next();
                }
                _ => break,
            }
        }
        self.token(TokenType::Int, &literal)
    }
    fn identifier(&mut self, first: char) -> Token {
        let mut literal = first.to_string();
        while let Some(c) = self.iter.peek() {
            match c {
                '0'..='9' | 'a'..='z' | 'A'..='Z' | '_' => {
                    literal.push(*c);
                    self.iter.next();
                }
                _ => break,
            }
        }
        match KEYWORDS.get(literal.as_str()) {
            None => self.token(TokenType::Ident, &literal),
            Some(x) => self.token(*x, &literal),
        }
    }
}

static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "else" => TokenType::Else,
    "false" => TokenType::False,
    "fn" => TokenType::Function,
    "if" => TokenType::If,
    "let" => TokenType::Let,
    "return" => TokenType::Return,
    "true" => TokenType::True,
};
