//! Host values and command tokens.

use std::fmt;

/// A value handed over by the host environment.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Character data.
    Text(String),
    /// A double-precision number (the host's default numeric type).
    Number(f64),
    /// An 8-bit unsigned integer. As the first input it selects a command
    /// by code; elsewhere it is an ordinary number.
    Code(u8),
}

impl Value {
    /// Integer view of a numeric value, truncated toward zero.
    ///
    /// Text, non-finite numbers and numbers outside the `i32` range have no
    /// integer view.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Number(n) => {
                let t = n.trunc();
                (t >= f64::from(i32::MIN) && t <= f64::from(i32::MAX)).then_some(t as i32)
            },
            Self::Code(c) => Some(i32::from(*c)),
            Self::Text(_) => None,
        }
    }

    /// Unsigned 32-bit view, truncated toward zero. Negative values have none.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Self::Number(n) => {
                let t = n.trunc();
                (t >= 0.0 && t <= f64::from(u32::MAX)).then_some(t as u32)
            },
            Self::Code(c) => Some(u32::from(*c)),
            Self::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Number(_) | Self::Code(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => write!(f, "'{s}'"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Code(c) => write!(f, "uint8({c})"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u8> for Value {
    fn from(c: u8) -> Self {
        Self::Code(c)
    }
}

/// How a command was named by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Name(&'a str),
    Code(u8),
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{name}"),
            Self::Code(code) => write!(f, "code {code}"),
        }
    }
}
