//! Closed catalogue of evaluation errors.
//!
//! Modeled on the VM's `InterpreterError`/`PanicReason` split: a
//! closed, typed enum carries the stable identifier, and the runtime
//! pairs it with an optional source span and failing-command name for
//! diagnostics (see [`crate::runtime::Runtime::error`]).

use alloc::string::String;
use core::fmt;

/// Stable error identifiers, matching the taxonomy in the calculator's
/// external interface contract. This enum is deliberately closed: new
/// variants are a breaking change, exactly like the original catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum EvalError {
    /// Operand has the wrong object type for the operation.
    #[display(fmt = "Bad argument type")]
    TypeError,
    /// Operand has the right type but an invalid value.
    #[display(fmt = "Bad argument value")]
    ValueError,
    /// Operand is outside the domain of the requested function.
    #[display(fmt = "Argument outside domain")]
    DomainError,
    /// Division by zero with no acceptable signed-infinity result.
    #[display(fmt = "Divide by zero")]
    ZeroDivideError,
    /// The solver's initial guess was unusable.
    #[display(fmt = "Bad guess")]
    BadGuessError,
    /// The solver could not converge to a root.
    #[display(fmt = "No solution found")]
    NoSolutionError,
    /// Every evaluation point produced the same value.
    #[display(fmt = "Constant value")]
    ConstantValueError,
    /// A program object could not be invoked as a function.
    #[display(fmt = "Invalid function")]
    InvalidFunctionError,
    /// An expression is not a valid algebraic object.
    #[display(fmt = "Invalid algebraic expression")]
    InvalidAlgebraicError,
    /// An expression could not be converted to a polynomial.
    #[display(fmt = "Invalid polynomial")]
    InvalidPolynomialError,
    /// An equation is not well-formed.
    #[display(fmt = "Invalid equation")]
    InvalidEquationError,
    /// A numeric base is out of the supported range.
    #[display(fmt = "Invalid base")]
    InvalidBaseError,
    /// A based number literal is malformed.
    #[display(fmt = "Invalid based number")]
    BasedNumberError,
    /// A digit is not valid in the current base.
    #[display(fmt = "Invalid digit for base")]
    BasedDigitError,
    /// Units on the two sides of an operation have incompatible dimensions.
    #[display(fmt = "Inconsistent units")]
    InconsistentUnitsError,
    /// Generic parse failure.
    #[display(fmt = "Syntax error")]
    SyntaxError,
    /// A literal or bracketed form was never closed.
    #[display(fmt = "Unterminated")]
    UnterminatedError,
    /// A decimal mantissa is malformed.
    #[display(fmt = "Bad mantissa")]
    MantissaError,
    /// A decimal exponent is malformed.
    #[display(fmt = "Bad exponent")]
    ExponentError,
    /// The rewriter's fixpoint loop exceeded the configured rewrite budget.
    #[display(fmt = "Too many rewrites")]
    TooManyRewritesError,
    /// Arena exhausted even after a garbage collection pass.
    #[display(fmt = "Out of memory")]
    OutOfMemoryError,
    /// An invariant the runtime relies on was violated; always fatal.
    #[display(fmt = "Internal error")]
    InternalError,
}

impl EvalError {
    /// Whether this error is always fatal to the current evaluation
    /// (§7: "internal invariant violation, out of memory after GC").
    pub const fn is_fatal(self) -> bool {
        matches!(self, EvalError::InternalError | EvalError::OutOfMemoryError)
    }
}

/// An error paired with the diagnostic context the runtime's sticky error
/// slot carries: an optional span into the parser's source text and an
/// optional name of the command that raised it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    /// The stable error identifier.
    pub kind: EvalError,
    /// Byte offset and length into the original source, if known.
    pub source: Option<(usize, usize)>,
    /// Name of the failing command, if the error was raised by one.
    pub command: Option<String>,
}

impl RuntimeError {
    /// Build a bare error with no diagnostic context.
    pub const fn new(kind: EvalError) -> Self {
        RuntimeError { kind, source: None, command: None }
    }

    /// Attach a source span.
    #[must_use]
    pub fn with_source(mut self, offset: usize, len: usize) -> Self {
        self.source = Some((offset, len));
        self
    }

    /// Attach a failing command name.
    #[must_use]
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }
}

impl From<EvalError> for RuntimeError {
    fn from(kind: EvalError) -> Self {
        RuntimeError::new(kind)
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(cmd) = &self.command {
            write!(f, " in {cmd}")?;
        }
        Ok(())
    }
}

/// Convenience alias used throughout the core for fallible operations.
pub type EvalResult<T> = Result<T, RuntimeError>;
