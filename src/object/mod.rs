use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::{Block, Identifier};
use crate::environment::Environment;

/* Runtime values are a closed discriminated sum, not the polymorphic "type switch on an
interface" representation the Go source this was distilled from uses. `Array`, `Dict`, and a
function's `parameters`/`body` are wrapped in `Rc` rather than cloned structurally: none of
them are ever mutated in place after construction (`push`/`tail`/... all build a *new*
array), so a reference-counted handle gives cheap `Value::clone()` without needing interior
mutability anywhere but the environment chain itself. */

pub type BuiltinFn = fn(&[Value]) -> Result<Value, String>;

#[derive(Debug, Clone)]
pub struct FunctionData {
    pub parameters: Vec<Identifier>,
    pub body: Block,
    pub env: Environment,
}

#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Boolean(bool),
    String(Rc<str>),
    Null,
    Array(Rc<Vec<Value>>),
    Dict(Rc<HashMap<HashKey, (Value, Value)>>),
    Function(Rc<FunctionData>),
    BuiltIn(BuiltinFn),
}

impl Value {
    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Value::String(s.into())
    }

    /// Stable string tag used in error messages; derived straight from the discriminant,
    /// never computed ad hoc at each call site.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Boolean(_) => "BOOLEAN",
            Value::String(_) => "STRING",
            Value::Null => "NULL",
            Value::Array(_) => "ARRAY",
            Value::Dict(_) => "DICT",
            Value::Function(_) => "FUNCTION",
            Value::BuiltIn(_) => "BUILTIN",
        }
    }

    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Boolean(false) | Value::Null)
    }

    /// `==`/`!=` fallback comparison for operand kinds that aren't the Integer/Integer or
    /// String/String cases the evaluator special-cases. Two `Boolean`s or two `Null`s compare
    /// equal by value (the spec's singleton design makes value equality and identity
    /// equality coincide for these); everything else — arrays, dicts, functions, built-ins —
    /// compares by reference identity, since the language has no structural equality for
    /// them.
    pub fn identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Dict(a), Value::Dict(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::BuiltIn(a), Value::BuiltIn(b)) => std::ptr::eq(*a as *const (), *b as *const ()),
            _ => false,
        }
    }

    pub fn hash_key(&self) -> Result<HashKey, String> {
        match self {
            Value::Integer(n) => Ok(HashKey::Integer(*n as u64)),
            Value::Boolean(b) => Ok(HashKey::Boolean(if *b { 1 } else { 0 })),
            Value::String(s) => Ok(HashKey::String(fnv1a64(s.as_bytes()))),
            other => Err(format!("unusable as hash key: {}", other.type_tag())),
        }
    }
}

impl PartialEq for Value {
    /// Structural equality for the three simple kinds (used by tests and by the environment
    /// to compare stored bindings); everything else falls back to [`Value::identical`], since
    /// the language itself never compares arrays/dicts/functions structurally.
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => self.identical(other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{n}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Null => write!(f, "null"),
            Value::Array(elements) => {
                let rendered: Vec<String> = elements.iter().map(|e| e.to_string()).collect();
                write!(f, "[{}]", rendered.join(", "))
            }
            Value::Dict(entries) => {
                let rendered: Vec<String> = entries
                    .values()
                    .map(|(k, v)| format!("{k}: {v}"))
                    .collect();
                write!(f, "{{{}}}", rendered.join(", "))
            }
            Value::Function(func) => {
                let params: Vec<String> = func.parameters.iter().map(|p| p.name.clone()).collect();
                write!(f, "fn({}) {{\n{}\n}}", params.join(", "), func.body)
            }
            Value::BuiltIn(_) => write!(f, "builtin function"),
        }
    }
}

/// `(type-tag, 64-bit value)`, keying dict entries for the three hashable value kinds. The
/// enum discriminant itself serves as the type tag, so two values of different kinds that
/// happen to hash to the same bit pattern (e.g. integer `1` and boolean `true`) never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashKey {
    Integer(u64),
    Boolean(u64),
    String(u64),
}

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
