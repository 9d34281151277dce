pub mod ast;
pub mod callable;
pub mod environment;
pub mod interpreter;
pub mod object;
pub mod parser;
pub mod scanner;
pub mod token;
