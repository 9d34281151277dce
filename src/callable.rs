use crate::ast::{BlockStatement, FunctionLiteral, Identifier};
use crate::environment::Environment;
use crate::interpreter::Interpreter;
use crate::object::Object;
use phf::phf_map;
use std::fmt;
use std::fmt::Debug;
use std::io::Write;
use std::rc::Rc;

#[derive(Clone)]
pub struct Function {
    data: Rc<FunctionImpl>,
}

struct FunctionImpl {
    literal: Rc<FunctionLiteral>,
    closure: Environment,
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.data.literal)
    }
}

impl Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn/{}>", self.arity())
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Function) -> bool {
        self.equals(other)
    }
}

impl Function {
    pub fn new(literal: Rc<FunctionLiteral>, closure: Environment) -> Function {
        Function {
            data: Rc::new(FunctionImpl { literal, closure }),
        }
    }
    /// Binds the arguments in a fresh scope enclosing the captured one and runs
    /// the body there. A `return` signal stops here.
    pub fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Object>) -> Object {
        if arguments.len() != self.arity() {
            return Interpreter::error(format!(
                "invalid argument count: expected {}, got {}",
                self.arity(),
                arguments.len()
            ));
        }
        tracing::trace!(arity = self.arity(), "calling function");
        let environment = self.closure().new_child();
        for (param, value) in self.params().iter().zip(arguments.into_iter()) {
            environment.define(&param.name, value);
        }
        match interpreter.execute_block_in(self.body(), environment) {
            Object::ReturnValue(x) => *x,
            x => x,
        }
    }
    pub fn arity(&self) -> usize {
        self.data.literal.parameters.len()
    }
    pub fn params(&self) -> &[Identifier] {
        &self.data.literal.parameters
    }
    pub fn body(&self) -> &BlockStatement {
        &self.data.literal.body
    }
    pub fn closure(&self) -> &Environment {
        &self.data.closure
    }
    pub fn equals(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

type NativeFn = fn(&mut dyn Write, &[Object]) -> Object;

#[derive(Clone, Copy)]
pub struct BuiltIn {
    pub name: &'static str,
    pub call: NativeFn,
}

impl BuiltIn {
    pub fn lookup(name: &str) -> Option<BuiltIn> {
        BUILTINS.get(name).copied()
    }
}

impl PartialEq for BuiltIn {
    fn eq(&self, other: &BuiltIn) -> bool {
        self.name == other.name
    }
}

impl Debug for BuiltIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

impl fmt::Display for BuiltIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "builtin function {}", self.name)
    }
}

static BUILTINS: phf::Map<&'static str, BuiltIn> = phf_map! {
    "puts" => BuiltIn { name: "puts", call: puts },
    "toStr" => BuiltIn { name: "toStr", call: to_str },
    "len" => BuiltIn { name: "len", call: len },
};

fn puts(out: &mut dyn Write, arguments: &[Object]) -> Object {
    let line: String = arguments.iter().map(|x| x.to_string()).collect();
    match writeln!(out, "{}", line) {
        Ok(_) => Object::Nil,
        Err(e) => Interpreter::error(format!("puts: failed to write output: {}", e)),
    }
}

fn to_str(_: &mut dyn Write, arguments: &[Object]) -> Object {
    match arguments {
        [x] => Object::String(x.to_string()),
        _ => Interpreter::error(format!(
            "wrong number of arguments to toStr: expected 1, got {}",
            arguments.len()
        )),
    }
}

fn len(_: &mut dyn Write, arguments: &[Object]) -> Object {
    match arguments {
        [Object::String(x)] => Object::Integer(x.chars().count() as i64),
        [Object::Array(x)] => Object::Integer(x.len() as i64),
        [Object::Hash(x)] => Object::Integer(x.len() as i64),
        [x] => Interpreter::error(format!("argument to len not supported: {}", x.kind())),
        _ => Interpreter::error(format!(
            "wrong number of arguments to len: expected 1, got {}",
            arguments.len()
        )),
    }
}
