#![forbid(unsafe_code)]

//! Operations performed by processes against the system under test.
//!
//! An [`Operation`] is one event in a history: either the invocation of a
//! function by a process, or the completion of that invocation. Every
//! operation carries the global index assigned by the history indexer;
//! nothing in this workspace reassigns it.

use std::fmt;

use serde::Serialize;

/// A logical actor performing a sequence of operations.
///
/// Ordering is total: numeric clients ascending, then named processes
/// lexicographically, then the nemesis last.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Process {
    /// A numbered client process.
    Client(u64),
    /// A process identified by name.
    Named(String),
    /// The fault-injecting nemesis.
    Nemesis,
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client(id) => write!(f, "{id}"),
            Self::Named(name) => f.write_str(name),
            Self::Nemesis => f.write_str("nemesis"),
        }
    }
}

impl From<u64> for Process {
    fn from(id: u64) -> Self {
        Self::Client(id)
    }
}

/// Phase and outcome of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OpType {
    /// Invocation; no outcome yet.
    Invoke,
    /// Completed successfully.
    Ok,
    /// Definitely did not take effect.
    Fail,
    /// Indeterminate: may or may not have taken effect.
    Info,
}

impl OpType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Invoke => "invoke",
            Self::Ok => "ok",
            Self::Fail => "fail",
            Self::Info => "info",
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_completion(self) -> bool {
        !matches!(self, Self::Invoke)
    }
}

impl fmt::Display for OpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque operation payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Value {
    Nil,
    Int(i64),
    Str(String),
    List(Vec<Value>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => f.write_str("nil"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

/// One event in a process's interaction with the system under test.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Operation {
    /// Global sequence index assigned by the history indexer.
    pub index: usize,
    pub process: Process,
    pub op_type: OpType,
    /// Function name, e.g. `read` or `write`.
    pub f: String,
    pub value: Value,
}

impl Operation {
    /// Create an operation.
    #[must_use]
    pub fn new(
        index: usize,
        process: impl Into<Process>,
        op_type: OpType,
        f: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            index,
            process: process.into(),
            op_type,
            f: f.into(),
            value: value.into(),
        }
    }

    /// Invocation of `f` by `process`.
    #[must_use]
    pub fn invoke(
        index: usize,
        process: impl Into<Process>,
        f: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self::new(index, process, OpType::Invoke, f, value)
    }

    /// Successful completion of `f` by `process`.
    #[must_use]
    pub fn ok(
        index: usize,
        process: impl Into<Process>,
        f: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self::new(index, process, OpType::Ok, f, value)
    }

    /// Definite failure of `f` by `process`.
    #[must_use]
    pub fn fail(
        index: usize,
        process: impl Into<Process>,
        f: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self::new(index, process, OpType::Fail, f, value)
    }

    /// Indeterminate completion of `f` by `process`.
    #[must_use]
    pub fn info(
        index: usize,
        process: impl Into<Process>,
        f: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self::new(index, process, OpType::Info, f, value)
    }

    #[inline]
    #[must_use]
    pub fn is_invoke(&self) -> bool {
        self.op_type == OpType::Invoke
    }

    #[inline]
    #[must_use]
    pub fn is_completion(&self) -> bool {
        self.op_type.is_completion()
    }

    /// Display label for an operation bar, e.g. `write 3`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.f, self.value)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{:index {}, :process {}, :type {}, :f {}, :value {}}}",
            self.index, self.process, self.op_type, self.f, self.value
        )
    }
}
