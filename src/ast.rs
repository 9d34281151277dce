use crate::token::Token;
use std::fmt;
use std::fmt::Formatter;
use std::rc::Rc;

pub trait Visitor<T, Output> {
    fn visit(&mut self, n: &T) -> Output;
}

#[derive(Debug, Clone, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone)]
pub enum Statement {
    Let {
        token: Token,
        name: Identifier,
        value: Expression,
    },
    Return {
        token: Token,
        value: Expression,
    },
    Expression {
        token: Token,
        expression: Expression,
    },
}

impl Statement {
    pub fn accept<T>(&self, v: &mut dyn Visitor<Statement, T>) -> T {
        v.visit(self)
    }
}

#[derive(Debug, Clone)]
pub struct BlockStatement {
    pub token: Token,
    pub statements: Vec<Statement>,
}

impl BlockStatement {
    pub fn accept<T>(&self, v: &mut dyn Visitor<BlockStatement, T>) -> T {
        v.visit(self)
    }
}

#[derive(Debug, Clone)]
pub struct Identifier {
    pub token: Token,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct IfExpression {
    pub token: Token,
    pub condition: Expression,
    pub consequence: BlockStatement,
    pub alternative: Option<ElseBranch>,
}

/// `else { ... }` or a chained `else if (...) { ... }`.
#[derive(Debug, Clone)]
pub enum ElseBranch {
    Block(BlockStatement),
    If(Box<IfExpression>),
}

#[derive(Debug)]
pub struct FunctionLiteral {
    pub token: Token,
    pub parameters: Vec<Identifier>,
    pub body: BlockStatement,
}

#[derive(Debug, Clone)]
pub enum Expression {
    Identifier(Identifier),
    Integer {
        token: Token,
        value: i64,
    },
    String {
        token: Token,
        value: String,
    },
    Boolean {
        token: Token,
        value: bool,
    },
    Prefix {
        operator: Token,
        right: Box<Expression>,
    },
    Infix {
        left: Box<Expression>,
        operator: Token,
        right: Box<Expression>,
    },
    If(Box<IfExpression>),
    // Shared so that function objects can hold on to their body after the
    // program that defined them is gone.
    Function(Rc<FunctionLiteral>),
    Call {
        token: Token,
        function: Box<Expression>,
        arguments: Vec<Expression>,
    },
    Array {
        token: Token,
        elements: Vec<Expression>,
    },
    Index {
        token: Token,
        left: Box<Expression>,
        index: Box<Expression>,
    },
    Hash {
        token: Token,
        pairs: Vec<(Expression, Expression)>,
    },
}

impl Expression {
    pub fn accept<T>(&self, v: &mut dyn Visitor<Expression, T>) -> T {
        v.visit(self)
    }
    /// The token that introduced this expression.
    pub fn token(&self) -> &Token {
        match self {
            Expression::Identifier(x) => &x.token,
            Expression::Integer { token, .. }
            | Expression::String { token, .. }
            | Expression::Boolean { token, .. }
            | Expression::Call { token, .. }
            | Expression::Array { token, .. }
            | Expression::Index { token, .. }
            | Expression::Hash { token, .. } => token,
            Expression::Prefix { operator, .. } | Expression::Infix { operator, .. } => operator,
            Expression::If(x) => &x.token,
            Expression::Function(x) => &x.token,
        }
    }
}

fn join<T: fmt::Display>(items: &[T], separator: &str) -> String {
    items
        .iter()
        .map(|x| x.to_string())
        .collect::<Vec<String>>()
        .join(separator)
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for stmt in &self.statements {
            writeln!(f, "{};", stmt)?;
        }
        Ok(())
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Let { name, value, .. } => write!(f, "let {} = {}", name, value),
            Statement::Return { value, .. } => write!(f, "return {}", value),
            Statement::Expression { expression, .. } => write!(f, "{}", expression),
        }
    }
}

impl fmt::Display for BlockStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.statements.is_empty() {
            write!(f, "{{ }}")
        } else {
            write!(f, "{{ {} }}", join(&self.statements, "; "))
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl fmt::Display for IfExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "if ({}) {}", self.condition, self.consequence)?;
        match &self.alternative {
            None => Ok(()),
            Some(ElseBranch::Block(x)) => write!(f, " else {}", x),
            Some(ElseBranch::If(x)) => write!(f, " else {}", x),
        }
    }
}

impl fmt::Display for FunctionLiteral {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "fn({}) {}", join(&self.parameters, ", "), self.body)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Identifier(x) => write!(f, "{}", x),
            Expression::Integer { value, .. } => write!(f, "{}", value),
            Expression::String { value, .. } => write!(f, "\"{}\"", value),
            Expression::Boolean { value, .. } => write!(f, "{}", value),
            Expression::Prefix { operator, right } => write!(f, "({}{})", operator.literal, right),
            Expression::Infix {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", left, operator.literal, right),
            Expression::If(x) => write!(f, "{}", x),
            Expression::Function(x) => write!(f, "{}", x),
            Expression::Call {
                function,
                arguments,
                ..
            } => write!(f, "{}({})", function, join(arguments, ", ")),
            Expression::Array { elements, .. } => write!(f, "[{}]", join(elements, ", ")),
            Expression::Index { left, index, .. } => write!(f, "({}[{}])", left, index),
            Expression::Hash { pairs, .. } => {
                let pairs: Vec<String> = pairs
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v))
                    .collect();
                write!(f, "{{{}}}", pairs.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod ast_tests {
    use crate::ast::{Expression, Identifier, Program, Statement};
    use crate::token::{Token, TokenType};

    fn int(value: i64) -> Expression {
        Expression::Integer {
            token: Token::new(TokenType::Int, &value.to_string(), 1),
            value,
        }
    }

    #[test]
    fn basic_ast_test() {
        let expression = Expression::Infix {
            left: Box::new(Expression::Prefix {
                operator: Token::new(TokenType::Minus, "-", 1),
                right: Box::new(int(123)),
            }),
            operator: Token::new(TokenType::Asterisk, "*", 1),
            right: Box::new(int(45)),
        };
        assert_eq!(expression.to_string(), "((-123) * 45)");
        assert_eq!(expression.token().tokentype, TokenType::Asterisk);
    }

    #[test]
    fn program_rendering() {
        let program = Program {
            statements: vec![
                Statement::Let {
                    token: Token::new(TokenType::Let, "let", 1),
                    name: Identifier {
                        token: Token::new(TokenType::Ident, "x", 1),
                        name: "x".to_string(),
                    },
                    value: int(5),
                },
                Statement::Return {
                    token: Token::new(TokenType::Return, "return", 2),
                    value: Expression::String {
                        token: Token::new(TokenType::String, "hi", 2),
                        value: "hi".to_string(),
                    },
                },
            ],
        };
        assert_eq!(program.to_string(), "let x = 5;\nreturn \"hi\";\n");
    }
}
