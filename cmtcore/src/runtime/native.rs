//! A small built-in object model.
//!
//! Embedders without a foreign runtime describe their module instances with
//! these objects. Numeric equality follows the usual dynamic-language rules:
//! `True == 1 == 1.0`.
use crate::runtime::{DynObject, DynResult, DynValue};

/// Plain data values.
#[derive(Debug, Clone)]
pub enum NativeValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Tuple(Vec<DynValue>),
}

#[derive(Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl NativeValue {
    fn as_number(&self) -> Option<Number> {
        match self {
            NativeValue::Bool(b) => Some(Number::Int(*b as i64)),
            NativeValue::Int(i) => Some(Number::Int(*i)),
            NativeValue::Float(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }
}

/// Exact int/float comparison. Going through `f64` would make ints above
/// 2^53 equal to their nearest float.
fn int_eq_float(i: i64, f: f64) -> bool {
    f.is_finite() && f.fract() == 0.0 && f as i128 == i as i128
}

fn number_eq(lhs: Number, rhs: Number) -> bool {
    match (lhs, rhs) {
        (Number::Int(l), Number::Int(r)) => l == r,
        (Number::Float(l), Number::Float(r)) => l == r,
        (Number::Int(i), Number::Float(f)) | (Number::Float(f), Number::Int(i)) => {
            int_eq_float(i, f)
        }
    }
}

impl DynObject for NativeValue {
    fn dyn_eq(&self, other: &dyn DynObject) -> DynResult<bool> {
        let Some(other) = other.downcast_ref::<NativeValue>() else {
            return Ok(false);
        };

        match (self, other) {
            (NativeValue::None, NativeValue::None) => Ok(true),
            (NativeValue::Str(l), NativeValue::Str(r)) => Ok(l == r),
            (NativeValue::Int(l), NativeValue::Int(r)) => Ok(l == r),
            (NativeValue::Tuple(l), NativeValue::Tuple(r)) => {
                if l.len() != r.len() {
                    return Ok(false);
                }
                for (l, r) in l.iter().zip(r) {
                    if !l.value_eq(r)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            (l, r) => match (l.as_number(), r.as_number()) {
                (Some(l), Some(r)) => Ok(number_eq(l, r)),
                _ => Ok(false),
            },
        }
    }

    fn repr(&self) -> String {
        match self {
            NativeValue::None => "None".to_string(),
            NativeValue::Bool(true) => "True".to_string(),
            NativeValue::Bool(false) => "False".to_string(),
            NativeValue::Int(i) => i.to_string(),
            NativeValue::Float(f) => format!("{:?}", f),
            NativeValue::Str(s) => format!("'{}'", s),
            NativeValue::Tuple(items) if items.len() == 1 => format!("({},)", items[0].repr()),
            NativeValue::Tuple(items) => format!(
                "({})",
                items.iter().map(DynValue::repr).collect::<Vec<_>>().join(", ")
            ),
        }
    }
}

/// A class object. Classes compare by identity.
#[derive(Debug, Clone)]
pub struct ClassObject {
    pub module: String,
    pub qualname: String,
}

impl ClassObject {
    pub fn new(module: impl Into<String>, qualname: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            qualname: qualname.into(),
        }
    }
}

impl DynObject for ClassObject {
    fn dyn_eq(&self, other: &dyn DynObject) -> DynResult<bool> {
        Ok(std::ptr::addr_eq(self as *const Self, other as *const dyn DynObject))
    }

    fn repr(&self) -> String {
        format!("<class '{}'>", self.qualified_name().unwrap_or_default())
    }

    fn qualified_name(&self) -> DynResult<String> {
        if self.module.is_empty() {
            Ok(self.qualname.clone())
        } else {
            Ok(format!("{}.{}", self.module, self.qualname))
        }
    }

    fn display_name(&self) -> String {
        self.qualname
            .rsplit('.')
            .next()
            .unwrap_or(&self.qualname)
            .to_string()
    }
}

/// A free function object. Functions compare by identity.
#[derive(Debug, Clone)]
pub struct FunctionObject {
    pub qualname: String,
}

impl FunctionObject {
    pub fn new(qualname: impl Into<String>) -> Self {
        Self {
            qualname: qualname.into(),
        }
    }
}

impl DynObject for FunctionObject {
    fn dyn_eq(&self, other: &dyn DynObject) -> DynResult<bool> {
        Ok(std::ptr::addr_eq(self as *const Self, other as *const dyn DynObject))
    }

    fn repr(&self) -> String {
        format!("<function {}>", self.qualname)
    }
}
