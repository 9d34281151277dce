use strum_macros::{Display, EnumIter};

#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[repr(u8)]
pub enum TokenType {
    #[strum(serialize = "ILLEGAL")] Illegal,
    #[strum(serialize = "EOF")] EOF,

    // Literals.
    #[strum(serialize = "IDENT")] Ident,
    #[strum(serialize = "INT")] Int,
    #[strum(serialize = "STRING")] String,

    // Operators.
    #[strum(serialize = "ASSIGN")] Assign,
    #[strum(serialize = "PLUS")] Plus,
    #[strum(serialize = "MINUS")] Minus,
    #[strum(serialize = "BANG")] Bang,
    #[strum(serialize = "ASTERISK")] Asterisk,
    #[strum(serialize = "FSLASH")] Slash,
    #[strum(serialize = "CARROT")] Caret,
    #[strum(serialize = "LT")] Less,
    #[strum(serialize = "GT")] Greater,
    #[strum(serialize = "EQ")] EqualEqual,
    #[strum(serialize = "NOT_EQ")] BangEqual,
    #[strum(serialize = "AND")] And,
    #[strum(serialize = "OR")] Or,

    // Delimiters.
    #[strum(serialize = "COMMA")] Comma,
    #[strum(serialize = "COLON")] Colon,
    #[strum(serialize = "SEMICOLON")] Semicolon,
    #[strum(serialize = "LPAREN")] LeftParen,
    #[strum(serialize = "RPAREN")] RightParen,
    #[strum(serialize = "LBRACE")] LeftBrace,
    #[strum(serialize = "RBRACE")] RightBrace,
    #[strum(serialize = "LBRACKET")] LeftBracket,
    #[strum(serialize = "RBRACKET")] RightBracket,

    // Keywords.
    #[strum(serialize = "FUNCTION")] Function,
    #[strum(serialize = "LET")] Let,
    #[strum(serialize = "TRUE")] True,
    #[strum(serialize = "FALSE")] False,
    #[strum(serialize = "IF")] If,
    #[strum(serialize = "ELSE")] Else,
    #[strum(serialize = "RETURN")] Return,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub tokentype: TokenType,
    pub literal: String,
    pub line: usize,
}

impl Token {
    pub fn new(tokentype: TokenType, literal: &str, line: usize) -> Token {
        Token {
            tokentype,
            literal: literal.to_string(),
            line,
        }
    }
    pub fn is(&self, tokentype: TokenType) -> bool {
        self.tokentype == tokentype
    }
}
