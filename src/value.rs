//! Fixture values and typed parameters
//!
//! Fixtures produce arbitrary Rust values, so they are stored type-erased in
//! [`Value`] and recovered with a typed downcast at the point of use.
//! Parameters (from parametrize rows, fixture params and step placeholders)
//! are a closed set of scalar types in [`Param`].

use serde::Serialize;
use std::any::Any;
use std::fmt;

/// A type-erased fixture or step value
pub struct Value(Box<dyn Any>);

impl Value {
    /// Wrap a value
    pub fn new<T: Any>(value: T) -> Self {
        Self(Box::new(value))
    }

    /// Borrow the value as `T`, if it is one
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    /// Mutably borrow the value as `T`, if it is one
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.0.downcast_mut()
    }

    /// Take the value out as `T`, giving it back on a type mismatch
    pub fn take<T: Any>(self) -> std::result::Result<T, Self> {
        self.0.downcast().map(|boxed| *boxed).map_err(Self)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Value(..)")
    }
}

/// A scalar parameter value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Param {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl Param {
    /// Integer view; floats and strings are not coerced
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Param::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Float view; integers widen
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Param::Float(v) => Some(*v),
            Param::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Boolean view
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Param::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// String view
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Param::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Name of the variant, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Param::Int(_) => "int",
            Param::Float(_) => "float",
            Param::Bool(_) => "bool",
            Param::Str(_) => "str",
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Int(v) => write!(f, "{v}"),
            Param::Float(v) => write!(f, "{v}"),
            Param::Bool(v) => write!(f, "{v}"),
            Param::Str(v) => f.write_str(v),
        }
    }
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Param::Int(v)
    }
}

impl From<i32> for Param {
    fn from(v: i32) -> Self {
        Param::Int(i64::from(v))
    }
}

impl From<f64> for Param {
    fn from(v: f64) -> Self {
        Param::Float(v)
    }
}

impl From<bool> for Param {
    fn from(v: bool) -> Self {
        Param::Bool(v)
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::Str(v.to_string())
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Param::Str(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_downcast() {
        let mut value = Value::new(vec![1, 2, 3]);
        assert!(value.downcast_ref::<String>().is_none());
        value.downcast_mut::<Vec<i32>>().unwrap().push(4);
        assert_eq!(value.take::<Vec<i32>>().unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_take_wrong_type_returns_value() {
        let value = Value::new(7_u8);
        let value = value.take::<String>().unwrap_err();
        assert_eq!(value.downcast_ref::<u8>(), Some(&7));
    }

    #[test]
    fn test_param_views() {
        assert_eq!(Param::from(3).as_int(), Some(3));
        assert_eq!(Param::from(3).as_float(), Some(3.0));
        assert_eq!(Param::from(2.5).as_int(), None);
        assert_eq!(Param::from("x").as_str(), Some("x"));
        assert_eq!(Param::from(46.4).to_string(), "46.4");
    }
}
