use crate::callable::{BuiltIn, Function};
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Formatter;
use std::rc::Rc;
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ObjectType {
    #[strum(serialize = "NIL")]
    Nil,
    #[strum(serialize = "INTEGER")]
    Integer,
    #[strum(serialize = "BOOLEAN")]
    Boolean,
    #[strum(serialize = "STRING")]
    String,
    #[strum(serialize = "ARRAY")]
    Array,
    #[strum(serialize = "HASH")]
    Hash,
    #[strum(serialize = "FUNCTION")]
    Function,
    #[strum(serialize = "BUILTIN")]
    BuiltIn,
    #[strum(serialize = "RETURN_VALUE")]
    ReturnValue,
    #[strum(serialize = "ERROR")]
    Error,
}

/// The reduced form of a hashable value, used to key `Object::Hash`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HashKey {
    Integer(i64),
    Boolean(bool),
    String(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HashPair {
    pub key: Object,
    pub value: Object,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Nil,
    Integer(i64),
    Boolean(bool),
    String(String),
    Array(Rc<Vec<Object>>),
    Hash(Rc<BTreeMap<HashKey, HashPair>>),
    Function(Function),
    BuiltIn(BuiltIn),
    /// Signal carrying the operand of `return` up to the nearest call boundary.
    ReturnValue(Box<Object>),
    /// Signal that aborts the evaluation it occurs in.
    Error(String),
}

pub const TRUE: Object = Object::Boolean(true);
pub const FALSE: Object = Object::Boolean(false);

impl Object {
    pub fn kind(&self) -> ObjectType {
        match self {
            Object::Nil => ObjectType::Nil,
            Object::Integer(_) => ObjectType::Integer,
            Object::Boolean(_) => ObjectType::Boolean,
            Object::String(_) => ObjectType::String,
            Object::Array(_) => ObjectType::Array,
            Object::Hash(_) => ObjectType::Hash,
            Object::Function(_) => ObjectType::Function,
            Object::BuiltIn(_) => ObjectType::BuiltIn,
            Object::ReturnValue(_) => ObjectType::ReturnValue,
            Object::Error(_) => ObjectType::Error,
        }
    }
    pub fn from_bool(x: bool) -> Object {
        if x {
            TRUE
        } else {
            FALSE
        }
    }
    pub fn array(elements: Vec<Object>) -> Object {
        Object::Array(Rc::new(elements))
    }
    pub fn hash(pairs: BTreeMap<HashKey, HashPair>) -> Object {
        Object::Hash(Rc::new(pairs))
    }
    /// Only integers, booleans and strings can be used as hash keys.
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Object::Integer(x) => Some(HashKey::Integer(*x)),
            Object::Boolean(x) => Some(HashKey::Boolean(*x)),
            Object::String(x) => Some(HashKey::String(x.clone())),
            _ => None,
        }
    }
    /// FALSE and integer zero are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Object::Boolean(x) => *x,
            Object::Integer(x) => *x != 0,
            _ => true,
        }
    }
    pub fn is_error(&self) -> bool {
        matches!(self, Object::Error(_))
    }
    /// `==` for operands that are not both integers or both strings: booleans
    /// compare by value, containers and functions by identity.
    pub fn is_same(&self, other: &Object) -> bool {
        match (self, other) {
            (Object::Nil, Object::Nil) => true,
            (Object::Boolean(a), Object::Boolean(b)) => a == b,
            (Object::Array(a), Object::Array(b)) => Rc::ptr_eq(a, b),
            (Object::Hash(a), Object::Hash(b)) => Rc::ptr_eq(a, b),
            (Object::Function(a), Object::Function(b)) => a.equals(b),
            (Object::BuiltIn(a), Object::BuiltIn(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Object::Nil => write!(f, "nil"),
            Object::Integer(x) => write!(f, "{}", x),
            Object::Boolean(x) => write!(f, "{}", x),
            Object::String(x) => write!(f, "{}", x),
            Object::Array(elements) => {
                let elements: Vec<String> = elements.iter().map(|x| x.to_string()).collect();
                write!(f, "[{}]", elements.join(", "))
            }
            Object::Hash(pairs) => {
                let pairs: Vec<String> = pairs
                    .values()
                    .map(|pair| format!("{}: {}", pair.key, pair.value))
                    .collect();
                write!(f, "{{{}}}", pairs.join(", "))
            }
            Object::Function(x) => write!(f, "{}", x),
            Object::BuiltIn(x) => write!(f, "{}", x),
            Object::ReturnValue(x) => write!(f, "{}", x),
            Object::Error(message) => write!(f, "{}", message),
        }
    }
}
