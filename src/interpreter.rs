use crate::ast::{BlockStatement, ElseBranch, Expression, IfExpression, Program, Statement, Visitor};
use crate::callable::{BuiltIn, Function};
use crate::environment::Environment;
use crate::object::{HashPair, Object};
use crate::token::{Token, TokenType};
use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::io;
use std::io::Write;
use std::rc::Rc;

pub struct Interpreter {
    environment: Environment,
    output: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

/// Evaluates `program` against `environment`, writing `puts` output to stdout.
pub fn eval(program: &Program, environment: &Environment) -> Object {
    Interpreter::with_environment(environment.clone(), Box::new(io::stdout())).interpret(program)
}

impl Visitor<Expression, Object> for Interpreter {
    fn visit(&mut self, expr: &Expression) -> Object {
        match expr {
            Expression::Integer { value, .. } => Object::Integer(*value),
            Expression::String { value, .. } => Object::String(value.clone()),
            Expression::Boolean { value, .. } => Object::from_bool(*value),
            Expression::Identifier(x) => self.lookup(&x.name),
            Expression::Prefix { operator, right } => {
                let right = self.evaluate(right);
                if right.is_error() {
                    return right;
                }
                prefix(operator, right)
            }
            Expression::Infix {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left);
                if left.is_error() {
                    return left;
                }
                let right = self.evaluate(right);
                if right.is_error() {
                    return right;
                }
                infix(operator, left, right)
            }
            Expression::If(x) => self.if_expression(x),
            Expression::Function(literal) => Object::Function(Function::new(
                Rc::clone(literal),
                self.environment.clone(),
            )),
            Expression::Call {
                function,
                arguments,
                ..
            } => {
                let function = self.evaluate(function);
                if function.is_error() {
                    return function;
                }
                let arguments = match self.evaluate_list(arguments) {
                    Ok(x) => x,
                    Err(e) => return e,
                };
                self.call(function, arguments)
            }
            Expression::Array { elements, .. } => match self.evaluate_list(elements) {
                Ok(x) => Object::array(x),
                Err(e) => e,
            },
            Expression::Index { left, index, .. } => {
                let left = self.evaluate(left);
                if left.is_error() {
                    return left;
                }
                let index = self.evaluate(index);
                if index.is_error() {
                    return index;
                }
                index_of(left, index)
            }
            Expression::Hash { pairs, .. } => self.hash_literal(pairs),
        }
    }
}

impl Visitor<Statement, Object> for Interpreter {
    fn visit(&mut self, stmt: &Statement) -> Object {
        match stmt {
            Statement::Let { name, value, .. } => {
                let value = self.evaluate(value);
                if value.is_error() {
                    return value;
                }
                self.environment.define(&name.name, value);
                Object::Nil
            }
            Statement::Return { value, .. } => {
                let value = self.evaluate(value);
                if value.is_error() {
                    return value;
                }
                Object::ReturnValue(Box::new(value))
            }
            Statement::Expression { expression, .. } => self.evaluate(expression),
        }
    }
}

impl Visitor<BlockStatement, Object> for Interpreter {
    // Signals are passed up untouched; only a call unwraps a ReturnValue.
    fn visit(&mut self, block: &BlockStatement) -> Object {
        let mut result = Object::Nil;
        for stmt in &block.statements {
            result = self.execute(stmt);
            if matches!(result, Object::ReturnValue(_) | Object::Error(_)) {
                break;
            }
        }
        result
    }
}

impl Interpreter {
    pub fn new() -> Interpreter {
        Interpreter::with_environment(Environment::new(), Box::new(io::stdout()))
    }
    pub fn with_environment(environment: Environment, output: Box<dyn Write>) -> Interpreter {
        Interpreter {
            environment,
            output,
        }
    }
    #[cfg(test)]
    pub fn environment(&self) -> &Environment {
        &self.environment
    }
    /// Runs every statement of `program` in the current environment and
    /// returns the value of the last one. Stops early on an error or a
    /// top-level `return`.
    #[tracing::instrument(level = "trace", skip_all)]
    pub fn interpret(&mut self, program: &Program) -> Object {
        let mut result = Object::Nil;
        for stmt in &program.statements {
            match self.execute(stmt) {
                Object::ReturnValue(x) => return *x,
                x @ Object::Error(_) => return x,
                x => result = x,
            }
        }
        result
    }
    pub fn execute(&mut self, stmt: &Statement) -> Object {
        stmt.accept(self)
    }
    /// Runs `block` with `environment` as the current scope, restoring the
    /// previous scope afterwards.
    pub fn execute_block_in(&mut self, block: &BlockStatement, environment: Environment) -> Object {
        let previous = std::mem::replace(&mut self.environment, environment);
        let result = block.accept(self);
        self.environment = previous;
        result
    }
    pub fn error(message: String) -> Object {
        tracing::debug!(%message, "runtime error");
        Object::Error(message)
    }
    fn evaluate(&mut self, expr: &Expression) -> Object {
        expr.accept(self)
    }
    fn evaluate_list(&mut self, exprs: &[Expression]) -> Result<Vec<Object>, Object> {
        let mut values = Vec::with_capacity(exprs.len());
        for expr in exprs {
            let value = self.evaluate(expr);
            if value.is_error() {
                return Err(value);
            }
            values.push(value);
        }
        Ok(values)
    }
    fn lookup(&self, name: &str) -> Object {
        if let Some(builtin) = BuiltIn::lookup(name) {
            return Object::BuiltIn(builtin);
        }
        match self.environment.get(name) {
            Some(x) => x,
            None => Interpreter::error(format!("identifier not found: {}", name)),
        }
    }
    fn if_expression(&mut self, x: &IfExpression) -> Object {
        let condition = self.evaluate(&x.condition);
        if condition.is_error() {
            return condition;
        }
        if condition.is_truthy() {
            x.consequence.accept(self)
        } else {
            match &x.alternative {
                None => Object::Nil,
                Some(ElseBranch::Block(block)) => block.accept(self),
                Some(ElseBranch::If(nested)) => self.if_expression(nested),
            }
        }
    }
    fn call(&mut self, function: Object, arguments: Vec<Object>) -> Object {
        match function {
            Object::Function(f) => f.call(self, arguments),
            Object::BuiltIn(b) => {
                tracing::trace!(name = b.name, "calling builtin");
                (b.call)(&mut *self.output, &arguments)
            }
            x => Interpreter::error(format!("not a function: {}", x.kind())),
        }
    }
    fn hash_literal(&mut self, pairs: &[(Expression, Expression)]) -> Object {
        let mut map = BTreeMap::new();
        for (k, v) in pairs {
            let key = self.evaluate(k);
            if key.is_error() {
                return key;
            }
            let hash_key = match key.hash_key() {
                Some(x) => x,
                None => return Interpreter::error(format!("unusable as hash key: {}", key.kind())),
            };
            let value = self.evaluate(v);
            if value.is_error() {
                return value;
            }
            map.insert(hash_key, HashPair { key, value });
        }
        Object::hash(map)
    }
}

fn prefix(operator: &Token, right: Object) -> Object {
    match (operator.tokentype, &right) {
        (TokenType::Minus, Object::Integer(x)) => Object::Integer(x.wrapping_neg()),
        (TokenType::Bang, Object::Boolean(x)) => Object::from_bool(!x),
        _ => Interpreter::error(format!(
            "unknown operator: {}{}",
            operator.literal,
            right.kind()
        )),
    }
}

fn infix(operator: &Token, left: Object, right: Object) -> Object {
    match (&left, &right) {
        (Object::Integer(l), Object::Integer(r)) => integer_infix(operator, *l, *r),
        (Object::String(l), Object::String(r)) if operator.is(TokenType::Plus) => {
            let mut joined = l.clone();
            joined.push_str(r);
            Object::String(joined)
        }
        (Object::String(_), Object::String(_)) => unknown_infix(operator, &left, &right),
        (Object::Boolean(l), Object::Boolean(r)) if operator.is(TokenType::And) => {
            Object::from_bool(*l && *r)
        }
        (Object::Boolean(l), Object::Boolean(r)) if operator.is(TokenType::Or) => {
            Object::from_bool(*l || *r)
        }
        _ => match operator.tokentype {
            TokenType::EqualEqual => Object::from_bool(left.is_same(&right)),
            TokenType::BangEqual => Object::from_bool(!left.is_same(&right)),
            _ => unknown_infix(operator, &left, &right),
        },
    }
}

fn integer_infix(operator: &Token, l: i64, r: i64) -> Object {
    match operator.tokentype {
        TokenType::Plus => Object::Integer(l.wrapping_add(r)),
        TokenType::Minus => Object::Integer(l.wrapping_sub(r)),
        TokenType::Asterisk => Object::Integer(l.wrapping_mul(r)),
        TokenType::Slash => {
            if r == 0 {
                Interpreter::error("division by zero".to_string())
            } else {
                Object::Integer(l.wrapping_div(r))
            }
        }
        TokenType::Caret => match u32::try_from(r) {
            Ok(exp) => Object::Integer(l.wrapping_pow(exp)),
            Err(_) => Interpreter::error(format!("exponent out of range: {}", r)),
        },
        TokenType::Less => Object::from_bool(l < r),
        TokenType::Greater => Object::from_bool(l > r),
        TokenType::EqualEqual => Object::from_bool(l == r),
        TokenType::BangEqual => Object::from_bool(l != r),
        _ => unknown_infix(operator, &Object::Integer(l), &Object::Integer(r)),
    }
}

fn unknown_infix(operator: &Token, left: &Object, right: &Object) -> Object {
    Interpreter::error(format!(
        "unknown operator: {} {} {}",
        left.kind(),
        operator.literal,
        right.kind()
    ))
}

fn index_of(left: Object, index: Object) -> Object {
    match (&left, &index) {
        (Object::Array(elements), Object::Integer(i)) => usize::try_from(*i)
            .ok()
            .and_then(|i| elements.get(i))
            .cloned()
            .unwrap_or(Object::Nil),
        (Object::Array(_), _) => Interpreter::error(format!(
            "index operator not supported: {}[{}]",
            left.kind(),
            index.kind()
        )),
        (Object::Hash(pairs), _) => match index.hash_key() {
            Some(key) => pairs
                .get(&key)
                .map(|pair| pair.value.clone())
                .unwrap_or(Object::Nil),
            None => Interpreter::error(format!("unusable as hash key: {}", index.kind())),
        },
        _ => Interpreter::error(format!("index operator not supported: {}", left.kind())),
    }
}

#[cfg(test)]
mod interpreter_tests {
    use crate::environment::Environment;
    use crate::interpreter::Interpreter;
    use crate::object::Object;
    use crate::parser::parse;
    use std::cell::RefCell;
    use std::io;
    use std::io::Write;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Captured(Rc<RefCell<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn contents(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    fn run_with_output(source: &str) -> (Object, String) {
        let program = parse(source).unwrap();
        let out = Captured::default();
        let mut interpreter =
            Interpreter::with_environment(Environment::new(), Box::new(out.clone()));
        let result = interpreter.interpret(&program);
        (result, out.contents())
    }

    fn run(source: &str) -> Object {
        run_with_output(source).0
    }

    fn error(message: &str) -> Object {
        Object::Error(message.to_string())
    }

    #[test]
    fn integer_arithmetic() {
        let tests = vec![
            ("5", 5),
            ("-5", -5),
            ("--5", 5),
            ("5 + 5 + 5 + 5 - 10", 10),
            ("2 * 2 * 2 * 2 * 2", 32),
            ("-50 + 100 + -50", 0),
            ("20 + 2 * -10", 0),
            ("50 / 2 * 2 + 10", 60),
            ("3 * (3 * 3) + 10", 37),
            ("(5 + 10 * 2 + 15 / 3) * 2 + -10", 50),
            ("7 / 2", 3),
            ("-7 / 2", -3),
            ("2 ^ 3 ^ 2", 512),
            ("2 ^ 0", 1),
            ("10 - 3 - 2", 5),
        ];
        for (source, expected) in tests {
            assert_eq!(run(source), Object::Integer(expected), "{}", source);
        }
    }

    #[test]
    fn integer_edge_cases() {
        assert_eq!(run("1 / 0"), error("division by zero"));
        assert_eq!(run("2 ^ -1"), error("exponent out of range: -1"));
        assert_eq!(
            run("9223372036854775807 + 1"),
            Object::Integer(i64::MIN)
        );
    }

    #[test]
    fn boolean_expressions() {
        let tests = vec![
            ("true", true),
            ("false", false),
            ("1 < 2", true),
            ("1 > 2", false),
            ("1 == 1", true),
            ("1 != 1", false),
            ("1 != 2", true),
            ("true == true", true),
            ("true != false", true),
            ("(1 < 2) == true", true),
            ("!true", false),
            ("!!true", true),
            ("true && false", false),
            ("true && true", true),
            ("false || true", true),
            ("false || false", false),
            ("1 == true", false),
        ];
        for (source, expected) in tests {
            assert_eq!(run(source), Object::Boolean(expected), "{}", source);
        }
    }

    #[test]
    fn strings() {
        assert_eq!(
            run("\"Hello\" + \" \" + \"World!\""),
            Object::String("Hello World!".to_string())
        );
        assert_eq!(
            run("\"a\" == \"a\""),
            error("unknown operator: STRING == STRING")
        );
        assert_eq!(run("\"a\" - \"b\""), error("unknown operator: STRING - STRING"));
    }

    #[test]
    fn if_else_expressions() {
        let tests = vec![
            ("if (true) { 10 }", Object::Integer(10)),
            ("if (false) { 10 }", Object::Nil),
            ("if (1) { 10 }", Object::Integer(10)),
            ("if (0) { 10 } else { 20 }", Object::Integer(20)),
            ("if (\"\") { 10 } else { 20 }", Object::Integer(10)),
            ("if (1 > 2) { 10 } else if (2 > 1) { 30 } else { 20 }", Object::Integer(30)),
            ("if (true) { }", Object::Nil),
        ];
        for (source, expected) in tests {
            assert_eq!(run(source), expected, "{}", source);
        }
    }

    #[test]
    fn return_statements() {
        let tests = vec![
            ("return 10;", 10),
            ("return 10; 9;", 10),
            ("9; return 2 * 5; 9;", 10),
            ("if (10 > 1) { if (10 > 1) { return 10; } return 1; }", 10),
            ("let f = fn() { if (true) { return 1; } 2 }; f() + 1", 2),
        ];
        for (source, expected) in tests {
            assert_eq!(run(source), Object::Integer(expected), "{}", source);
        }
    }

    #[test]
    fn error_handling() {
        let tests = vec![
            ("5 + true;", "unknown operator: INTEGER + BOOLEAN"),
            ("5 + true; 5;", "unknown operator: INTEGER + BOOLEAN"),
            ("-true", "unknown operator: -BOOLEAN"),
            ("!5", "unknown operator: !INTEGER"),
            ("true + false;", "unknown operator: BOOLEAN + BOOLEAN"),
            ("1 && 2", "unknown operator: INTEGER && INTEGER"),
            (
                "if (10 > 1) { true + false; }",
                "unknown operator: BOOLEAN + BOOLEAN",
            ),
            ("foobar", "identifier not found: foobar"),
            ("let x = y; x", "identifier not found: y"),
            ("5()", "not a function: INTEGER"),
            ("fn(x) { x }(1, 2)", "invalid argument count: expected 1, got 2"),
            ("{\"name\": \"Monkey\"}[fn(x) { x }];", "unusable as hash key: FUNCTION"),
            ("{[1]: 2}", "unusable as hash key: ARRAY"),
            ("1[0]", "index operator not supported: INTEGER"),
            ("[1][\"a\"]", "index operator not supported: ARRAY[STRING]"),
            ("[1, missing, 3]", "identifier not found: missing"),
            ("puts(nope)", "identifier not found: nope"),
        ];
        for (source, expected) in tests {
            assert_eq!(run(source), error(expected), "{}", source);
        }
    }

    #[test]
    fn let_statements() {
        assert_eq!(run("let a = 5; a;"), Object::Integer(5));
        assert_eq!(run("let a = 5 * 5; a;"), Object::Integer(25));
        assert_eq!(run("let a = 5; let b = a; let c = a + b + 5; c;"), Object::Integer(15));
        assert_eq!(run("let a = 5;"), Object::Nil);
    }

    #[test]
    fn functions_and_calls() {
        let tests = vec![
            ("let identity = fn(x) { x; }; identity(5);", 5),
            ("let identity = fn(x) { return x; }; identity(5);", 5),
            ("let double = fn(x) { x * 2; }; double(5);", 10),
            ("let add = fn(x, y) { x + y; }; add(5 + 5, add(5, 5));", 20),
            ("fn(x) { x; }(5)", 5),
        ];
        for (source, expected) in tests {
            assert_eq!(run(source), Object::Integer(expected), "{}", source);
        }
        assert_eq!(run("fn() { }()"), Object::Nil);
    }

    #[test]
    fn recursion() {
        let source =
            "let x = 10; let f = fn(n) { if (n == 0) { return 0 } return n + f(n - 1) }; f(x)";
        assert_eq!(run(source), Object::Integer(55));
    }

    #[test]
    fn closures() {
        let source = "
            let newAdder = fn(x) { fn(y) { x + y } };
            let addTwo = newAdder(2);
            addTwo(3)";
        assert_eq!(run(source), Object::Integer(5));
        // The closure sees bindings made after it was created.
        let source = "let f = fn() { later }; let later = 7; f()";
        assert_eq!(run(source), Object::Integer(7));
    }

    #[test]
    fn call_scope_does_not_leak() {
        let source = "let x = 1; let f = fn(x) { let y = x; y }; f(2); x";
        assert_eq!(run(source), Object::Integer(1));
        assert_eq!(
            run("let f = fn() { let inner = 1; }; f(); inner"),
            error("identifier not found: inner")
        );
    }

    #[test]
    fn arrays_and_indexing() {
        assert_eq!(run("[1, 2 * 2, 3 + 3]").to_string(), "[1, 4, 6]");
        let tests = vec![
            ("[1, 2, 3][0]", Object::Integer(1)),
            ("[1, 2, 3][1 + 1]", Object::Integer(3)),
            ("let a = [1, 2, 3]; a[0] + a[1] + a[2]", Object::Integer(6)),
            ("[1, 2, 3][3]", Object::Nil),
            ("[1, 2, 3][-1]", Object::Nil),
        ];
        for (source, expected) in tests {
            assert_eq!(run(source), expected, "{}", source);
        }
    }

    #[test]
    fn hashes() {
        let source = "let two = \"two\"; {\"one\": 10 - 9, two: 1 + 1, 4: 4, true: 5, false: 6}";
        assert_eq!(
            run(source).to_string(),
            "{4: 4, false: 6, true: 5, one: 1, two: 2}"
        );
        let tests = vec![
            ("{\"foo\": 5}[\"foo\"]", Object::Integer(5)),
            ("{\"foo\": 5}[\"bar\"]", Object::Nil),
            ("{}[\"foo\"]", Object::Nil),
            ("{5: 5}[5]", Object::Integer(5)),
            ("{true: 5}[true]", Object::Integer(5)),
            ("{1: 1, 1: 2}[1]", Object::Integer(2)),
        ];
        for (source, expected) in tests {
            assert_eq!(run(source), expected, "{}", source);
        }
    }

    #[test]
    fn identity_equality() {
        assert_eq!(run("let a = [1]; a == a"), Object::Boolean(true));
        assert_eq!(run("[1] == [1]"), Object::Boolean(false));
        assert_eq!(run("let f = fn() { 1 }; f == f"), Object::Boolean(true));
        assert_eq!(run("puts == puts"), Object::Boolean(true));
        assert_eq!(run("let a = puts(); a == puts()"), Object::Boolean(true));
    }

    #[test]
    fn builtins() {
        let (result, out) = run_with_output("puts(\"x = \", 1 + 2); puts([1, true]);");
        assert_eq!(result, Object::Nil);
        assert_eq!(out, "x = 3\n[1, true]\n");
        assert_eq!(run("toStr(12) + \"!\""), Object::String("12!".to_string()));
        assert_eq!(run("len(\"four\") + len([1, 2])"), Object::Integer(6));
        assert_eq!(
            run("toStr(1, 2)"),
            error("wrong number of arguments to toStr: expected 1, got 2")
        );
    }

    #[test]
    fn builtins_cannot_be_shadowed() {
        assert_eq!(run("let len = 3; len(\"ab\")"), Object::Integer(2));
    }

    #[test]
    fn environment_persists_between_programs() {
        let mut interpreter =
            Interpreter::with_environment(Environment::new(), Box::new(Captured::default()));
        interpreter.interpret(&parse("let a = 2;").unwrap());
        interpreter.interpret(&parse("let double = fn(x) { x * a };").unwrap());
        let result = interpreter.interpret(&parse("double(21)").unwrap());
        assert_eq!(result, Object::Integer(42));
        assert!(interpreter.environment().get("double").is_some());
    }

    #[test]
    fn ast_is_reusable() {
        let program = parse("let n = 3; n * 2").unwrap();
        for _ in 0..2 {
            let mut interpreter =
                Interpreter::with_environment(Environment::new(), Box::new(Captured::default()));
            assert_eq!(interpreter.interpret(&program), Object::Integer(6));
        }
    }
}
