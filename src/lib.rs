//! Numeric and symbolic evaluation core for an RPL-style pocket
//! scientific/RPN calculator kernel.
//!
//! This crate is the typed object model, the arena-based memory manager
//! and its compacting garbage collector, the numeric tower (native
//! integers, bignums, exact fractions, variable-precision decimals,
//! hardware floats, complex numbers, and unit-carrying values), the
//! symbolic expression/polynomial engine with its rewrite-based
//! simplifier, and the 1-D numerical root finder. It does not include a
//! keyboard/LCD UI, soft-menu system, or host abstraction layer — those
//! are external collaborators that talk to this crate purely through
//! the object model and the [`runtime::Runtime`] API.
//!
//! # Layout
//!
//! The numeric tower is layered bottom-up: [`bigint`] underlies
//! [`integer`], which underlies [`fraction`]; [`decimal`] and [`hwfp`]
//! sit beside it as the inexact branches, with [`complex`] and [`unit`]
//! built atop all of them. [`arith`] is the promotion dispatcher that
//! ties the tower together for binary operators. [`expression`] and
//! [`polynomial`] form the symbolic layer, with [`rewrite`] driving
//! pattern-based simplification and [`solve`] providing numerical root
//! finding over it. [`object`] is the tagged, arena-encodable wrapper
//! around every one of these value types, and [`runtime`] is the
//! memory manager that owns them.
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod arith;
pub mod bigint;
pub mod complex;
pub mod decimal;
pub mod error;
pub mod expression;
pub mod fraction;
pub mod hwfp;
pub mod integer;
pub mod leb128;
pub mod object;
pub mod polynomial;
pub mod rewrite;
pub mod runtime;
pub mod settings;
pub mod solve;
pub mod unit;

pub use error::{EvalError, EvalResult, RuntimeError};
pub use runtime::Runtime;
pub use settings::Settings;
