#![forbid(unsafe_code)]

//! Abstract model states.
//!
//! The layout engine never inspects a model. It only compares models by
//! value and hashes them, so any type with structural equality works. Two
//! distinct transitions producing equal models, with the same rejected
//! flag, are treated as the same state when placing and deduplicating
//! lines.

use std::fmt;
use std::hash::Hash;

use serde::Serialize;

use crate::op::Value;

/// Opaque abstract state of the system under test.
pub trait Model: Clone + Eq + Hash + fmt::Debug + fmt::Display {}

impl<T> Model for T where T: Clone + Eq + Hash + fmt::Debug + fmt::Display {}

/// A single read/write register.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Register {
    pub value: Value,
}

impl Register {
    #[must_use]
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// A register that has never been written.
    #[must_use]
    pub fn empty() -> Self {
        Self { value: Value::Nil }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<Register {}>", self.value)
    }
}

/// A register supporting compare-and-set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CasRegister {
    pub value: Value,
}

impl CasRegister {
    #[must_use]
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl fmt::Display for CasRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<CASRegister {}>", self.value)
    }
}
