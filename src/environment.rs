use crate::object::Object;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// A scope. Cloning yields another handle to the same frame, so a binding made
/// through one handle is visible through every other.
#[derive(Clone, Default)]
pub struct Environment {
    data: Rc<RefCell<EnvironmentImpl>>,
}

#[derive(Default)]
struct EnvironmentImpl {
    values: BTreeMap<String, Object>,
    enclosing: Option<Environment>,
}

impl Environment {
    pub fn new() -> Environment {
        Environment::default()
    }
    pub fn new_child(&self) -> Environment {
        Environment {
            data: Rc::new(RefCell::new(EnvironmentImpl {
                values: BTreeMap::new(),
                enclosing: Some(self.clone()),
            })),
        }
    }
    /// Binds `name` in this frame, shadowing any binding in an enclosing one.
    pub fn define(&self, name: &str, value: Object) {
        self.data
            .borrow_mut()
            .values
            .insert(name.to_string(), value);
    }
    pub fn get(&self, name: &str) -> Option<Object> {
        let mut cur = self.clone();
        loop {
            let enclosing = {
                let data = cur.data.borrow();
                if let Some(x) = data.values.get(name) {
                    return Some(x.clone());
                }
                data.enclosing.clone()
            };
            match enclosing {
                Some(env) => cur = env,
                None => return None,
            }
        }
    }
    #[cfg(test)]
    pub fn enclosing(&self) -> Option<Environment> {
        self.data.borrow().enclosing.clone()
    }
    #[cfg(test)]
    pub fn equals(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.data.borrow();
        f.debug_struct("Environment")
            .field("names", &data.values.keys().collect::<Vec<&String>>())
            .field("enclosed", &data.enclosing.is_some())
            .finish()
    }
}

#[cfg(test)]
mod environment_tests {
    use crate::environment::Environment;
    use crate::object::Object;

    #[test]
    fn define_and_get() {
        let env = Environment::new();
        assert!(env.get("x").is_none());
        env.define("x", Object::Integer(1));
        assert_eq!(env.get("x"), Some(Object::Integer(1)));
        env.define("x", Object::Integer(2));
        assert_eq!(env.get("x"), Some(Object::Integer(2)));
    }

    #[test]
    fn lookup_walks_outward() {
        let outer = Environment::new();
        outer.define("x", Object::Integer(1));
        let inner = outer.new_child().new_child();
        assert_eq!(inner.get("x"), Some(Object::Integer(1)));
        assert!(inner.get("y").is_none());
    }

    #[test]
    fn define_is_local() {
        let outer = Environment::new();
        outer.define("x", Object::Integer(1));
        let inner = outer.new_child();
        inner.define("x", Object::Integer(2));
        assert_eq!(inner.get("x"), Some(Object::Integer(2)));
        assert_eq!(outer.get("x"), Some(Object::Integer(1)));
    }

    #[test]
    fn frames_are_shared() {
        let outer = Environment::new();
        let inner = outer.new_child();
        let handle = outer.clone();
        handle.define("late", Object::Boolean(true));
        assert_eq!(inner.get("late"), Some(Object::Boolean(true)));
        assert!(inner.enclosing().map_or(false, |e| e.equals(&outer)));
        assert!(outer.enclosing().is_none());
    }
}
