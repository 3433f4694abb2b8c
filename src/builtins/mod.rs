use std::rc::Rc;

use crate::object::Value;

/* Fixed global table of host-provided functions, consulted by the evaluator only after the
environment chain yields no binding for an identifier — so `let len = fn(x) { 0 };` legally
shadows the built-in within its scope. Each function is pure with respect to its argument
arrays: `push`/`tail` build a new `Vec` rather than mutating the one they were handed. */

pub fn lookup(name: &str) -> Option<Value> {
    let f: crate::object::BuiltinFn = match name {
        "len" => len,
        "first" => first,
        "last" => last,
        "tail" => tail,
        "push" => push,
        "puts" => puts,
        _ => return None,
    };
    Some(Value::BuiltIn(f))
}

fn wrong_arity(got: usize, want: usize) -> String {
    format!("wrong number of arguments. got={got}, want={want}")
}

fn len(args: &[Value]) -> Result<Value, String> {
    if args.len() != 1 {
        return Err(wrong_arity(args.len(), 1));
    }
    match &args[0] {
        Value::String(s) => Ok(Value::Integer(s.len() as i64)),
        Value::Array(a) => Ok(Value::Integer(a.len() as i64)),
        other => Err(format!(
            "argument to `len` not supported, got {}",
            other.type_tag()
        )),
    }
}

fn first(args: &[Value]) -> Result<Value, String> {
    if args.len() != 1 {
        return Err(wrong_arity(args.len(), 1));
    }
    match &args[0] {
        Value::Array(a) => Ok(a.first().cloned().unwrap_or(Value::Null)),
        other => Err(format!(
            "argument to `first` must be ARRAY, got {}",
            other.type_tag()
        )),
    }
}

fn last(args: &[Value]) -> Result<Value, String> {
    if args.len() != 1 {
        return Err(wrong_arity(args.len(), 1));
    }
    match &args[0] {
        Value::Array(a) => Ok(a.last().cloned().unwrap_or(Value::Null)),
        other => Err(format!(
            "argument to `last` must be ARRAY, got {}",
            other.type_tag()
        )),
    }
}

fn tail(args: &[Value]) -> Result<Value, String> {
    if args.len() != 1 {
        return Err(wrong_arity(args.len(), 1));
    }
    match &args[0] {
        Value::Array(a) => {
            if a.is_empty() {
                Ok(Value::Null)
            } else {
                Ok(Value::Array(Rc::new(a[1..].to_vec())))
            }
        }
        other => Err(format!(
            "argument to `tail` must be ARRAY, got {}",
            other.type_tag()
        )),
    }
}

fn push(args: &[Value]) -> Result<Value, String> {
    if args.len() != 2 {
        return Err(wrong_arity(args.len(), 2));
    }
    match &args[0] {
        Value::Array(a) => {
            let mut elements = (**a).clone();
            elements.push(args[1].clone());
            Ok(Value::Array(Rc::new(elements)))
        }
        other => Err(format!(
            "argument to `push` must be ARRAY, got {}",
            other.type_tag()
        )),
    }
}

fn puts(args: &[Value]) -> Result<Value, String> {
    for arg in args {
        println!("{arg}");
    }
    Ok(Value::Null)
}
