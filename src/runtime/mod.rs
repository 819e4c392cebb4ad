//! The runtime: one arena, a set of stacks, a scratchpad, an editor
//! buffer, and a compacting GC, wired together behind a single
//! `Runtime` handle (§4.A, §5).
//!
//! This module provides the memory-management and bookkeeping substrate
//! the rest of the crate runs on; it does not itself interpret an RPL
//! program (no bytecode format is in scope here — see `spec.md`
//! §1 PURPOSE & SCOPE's "keyboard/LCD… command-line editor" exclusions).
//! The call-stack API models the `(next, end)` cursor pairs a caller
//! would push while walking its own program representation.

pub mod arena;
pub mod gc;
pub mod handle;

use crate::error::{EvalError, EvalResult, RuntimeError};
use crate::object::Object;
use crate::settings::Settings;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use arena::{Arena, ObjectRef};
use core::cell::RefCell;
use educe::Educe;
use gc::RootSource;
use handle::{Gc, RootList};

/// One `(next, end)` cursor pair on the call stack, driving evaluation
/// of a program object from its current position (`next`) to its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallFrame {
    /// The program object currently executing.
    pub program: ObjectRef,
    /// Offset of the next instruction to execute within it.
    pub next: u32,
    /// Offset one past the last instruction.
    pub end: u32,
}

/// The evaluation runtime: arena, settings, stacks, scratchpad, editor,
/// and sticky error state, all addressed through one `Runtime` value.
#[derive(Educe)]
#[educe(Debug)]
pub struct Runtime {
    arena: Arena,
    settings: Settings,
    heap_limit: usize,
    stack: Vec<ObjectRef>,
    locals: Vec<ObjectRef>,
    last_args: Vec<ObjectRef>,
    undo: Option<ObjectRef>,
    directory_path: Vec<ObjectRef>,
    call_stack: Vec<CallFrame>,
    gc_roots: RootList,
    scratchpad: Vec<u8>,
    editor: String,
    error: Option<RuntimeError>,
    command: Option<String>,
}

impl Runtime {
    /// A fresh runtime. `heap_limit` caps the number of live arena
    /// objects (the idiomatic-Rust analogue of the original's
    /// compiled-in `MEM_SIZE`, taken as a constructor parameter per
    /// `SPEC_FULL.md` §4.A so it isn't baked in at compile time).
    pub fn new(heap_limit: usize) -> Runtime {
        Runtime {
            arena: Arena::new(),
            settings: Settings::default(),
            heap_limit,
            stack: Vec::new(),
            locals: Vec::new(),
            last_args: Vec::new(),
            undo: None,
            directory_path: Vec::new(),
            call_stack: Vec::new(),
            gc_roots: Rc::new(RefCell::new(Vec::new())),
            scratchpad: Vec::new(),
            editor: String::new(),
            error: None,
            command: None,
        }
    }

    /// Default ~256 KiB pocket-calculator heap budget, expressed as a
    /// live-object count proxy (`Object` values are not fixed-size byte
    /// records, so this crate counts objects rather than bytes; see
    /// `DESIGN.md`).
    pub fn with_default_heap() -> Runtime {
        Runtime::new(4096)
    }

    /// Read-only access to the active settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Mutable access, e.g. for a `PrecisionGuard`/`AngleModeGuard`
    /// scoped adjustment (§5).
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    // ---- make / GC --------------------------------------------------

    /// Build an object in the temporaries region, attempting a GC pass
    /// first if the heap is at capacity. Mirrors the original's
    /// `make(type, …)` returning null on allocation failure, expressed
    /// here as `Err(OutOfMemoryError)`.
    pub fn make(&mut self, object: Object) -> EvalResult<ObjectRef> {
        if self.arena.live_count() >= self.heap_limit {
            self.gc();
            if self.arena.live_count() >= self.heap_limit {
                tracing::warn!(limit = self.heap_limit, "allocation failed after gc: heap exhausted");
                return Err(EvalError::OutOfMemoryError.into())
            }
        }
        Ok(self.arena.make(object))
    }

    /// Dereference an arena object.
    pub fn object(&self, reference: ObjectRef) -> EvalResult<&Object> {
        self.arena.get(reference)
    }

    /// Run one stop-the-world compacting collection pass over every
    /// root: the user stack, last-args/undo areas, locals, the
    /// directory path, the call stack, and every externally registered
    /// [`Gc`] handle.
    pub fn gc(&mut self) {
        let before = self.arena.live_count();
        let mut arena = core::mem::take(&mut self.arena);
        let freed = gc::collect(&mut arena, self);
        self.arena = arena;
        tracing::debug!(freed, remaining = self.arena.live_count(), before, "gc pass complete");
    }

    /// Register a scoped GC-safe handle to `reference`.
    pub fn protect(&mut self, reference: ObjectRef) -> Gc {
        Gc::new(self.gc_roots.clone(), reference)
    }

    // ---- user stack ---------------------------------------------------

    /// Push an object reference onto the user stack.
    pub fn push(&mut self, reference: ObjectRef) {
        self.stack.push(reference);
    }

    /// Pop the top of the user stack.
    pub fn pop(&mut self) -> EvalResult<ObjectRef> {
        self.stack.pop().ok_or_else(|| EvalError::InternalError.into())
    }

    /// Peek the top of the user stack without removing it.
    pub fn top(&self) -> EvalResult<ObjectRef> {
        self.stack.last().copied().ok_or_else(|| EvalError::InternalError.into())
    }

    /// The `i`-th stack entry counting from the top, 1-based (level 1
    /// is the top of the stack).
    pub fn stack_level(&self, i: usize) -> EvalResult<ObjectRef> {
        if i == 0 || i > self.stack.len() {
            return Err(EvalError::InternalError.into())
        }
        Ok(self.stack[self.stack.len() - i])
    }

    /// Drop the top `n` stack entries.
    pub fn drop_n(&mut self, n: usize) -> EvalResult<()> {
        if n > self.stack.len() {
            return Err(EvalError::InternalError.into())
        }
        self.stack.truncate(self.stack.len() - n);
        Ok(())
    }

    /// Current stack depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Move the `i`-th entry (1-based from the top) to the top.
    pub fn roll(&mut self, i: usize) -> EvalResult<()> {
        if i == 0 || i > self.stack.len() {
            return Err(EvalError::InternalError.into())
        }
        let index = self.stack.len() - i;
        let value = self.stack.remove(index);
        self.stack.push(value);
        Ok(())
    }

    /// Move the top entry down to the `i`-th position (1-based from the
    /// top after the move), the inverse of [`Runtime::roll`].
    pub fn rolld(&mut self, i: usize) -> EvalResult<()> {
        if i == 0 || i > self.stack.len() {
            return Err(EvalError::InternalError.into())
        }
        let value = self.stack.pop().expect("checked non-empty above");
        let index = self.stack.len() + 1 - i;
        self.stack.insert(index, value);
        Ok(())
    }

    // ---- scratchpad -----------------------------------------------------

    /// Grow the scratchpad by `n` zero-initialized bytes, returning the
    /// offset of the new region.
    pub fn allocate(&mut self, n: usize) -> usize {
        let offset = self.scratchpad.len();
        self.scratchpad.resize(offset + n, 0);
        offset
    }

    /// Shrink the scratchpad by `n` bytes from its tail.
    pub fn free(&mut self, n: usize) -> EvalResult<()> {
        if n > self.scratchpad.len() {
            return Err(EvalError::InternalError.into())
        }
        let new_len = self.scratchpad.len() - n;
        self.scratchpad.truncate(new_len);
        Ok(())
    }

    /// Current scratchpad contents.
    pub fn scratchpad(&self) -> &[u8] {
        &self.scratchpad
    }

    /// Mutable scratchpad contents, for in-place construction by
    /// parsers.
    pub fn scratchpad_mut(&mut self) -> &mut [u8] {
        &mut self.scratchpad
    }

    // ---- editor ---------------------------------------------------------

    /// Replace the editor buffer's contents wholesale.
    pub fn edit(&mut self, text: &str) {
        self.editor.clear();
        self.editor.push_str(text);
    }

    /// Insert `text` at byte offset `at` in the editor buffer.
    pub fn insert(&mut self, at: usize, text: &str) -> EvalResult<()> {
        if at > self.editor.len() || !self.editor.is_char_boundary(at) {
            return Err(EvalError::InternalError.into())
        }
        self.editor.insert_str(at, text);
        Ok(())
    }

    /// Remove `len` bytes starting at offset `at` from the editor buffer.
    pub fn remove(&mut self, at: usize, len: usize) -> EvalResult<()> {
        let end = at.checked_add(len).ok_or(EvalError::InternalError)?;
        if end > self.editor.len() || !self.editor.is_char_boundary(at) || !self.editor.is_char_boundary(end) {
            return Err(EvalError::InternalError.into())
        }
        self.editor.replace_range(at..end, "");
        Ok(())
    }

    /// Convert the editor buffer's contents into a text object and
    /// clear the buffer, returning the object's arena reference.
    pub fn close_editor(&mut self) -> EvalResult<ObjectRef> {
        let text = core::mem::take(&mut self.editor);
        self.make(Object::Symbol(text))
    }

    // ---- locals -----------------------------------------------------------

    /// Read the `i`-th local (0-based) in the current frame.
    pub fn local(&self, i: usize) -> EvalResult<ObjectRef> {
        self.locals.get(i).copied().ok_or_else(|| EvalError::InternalError.into())
    }

    /// Push a new frame of `n` locals, initialized from the top `n`
    /// values popped off the user stack (innermost last, matching RPL's
    /// `->` binding order).
    pub fn locals(&mut self, n: usize) -> EvalResult<()> {
        if n > self.stack.len() {
            return Err(EvalError::InternalError.into())
        }
        let split = self.stack.len() - n;
        let mut frame = self.stack.split_off(split);
        self.locals.append(&mut frame);
        Ok(())
    }

    /// Pop the most recently pushed `n` locals off the local-variable
    /// stack.
    pub fn unlocals(&mut self, n: usize) -> EvalResult<()> {
        if n > self.locals.len() {
            return Err(EvalError::InternalError.into())
        }
        let new_len = self.locals.len() - n;
        self.locals.truncate(new_len);
        Ok(())
    }

    // ---- call stack -------------------------------------------------------

    /// Push a `(next, end)` cursor pair driving evaluation of `program`.
    pub fn run_push(&mut self, program: ObjectRef, next: u32, end: u32) {
        self.call_stack.push(CallFrame { program, next, end });
    }

    /// The frame `depth` levels below the top (0 = top), without
    /// popping it.
    pub fn run_next(&self, depth: usize) -> EvalResult<CallFrame> {
        if depth >= self.call_stack.len() {
            return Err(EvalError::InternalError.into())
        }
        Ok(self.call_stack[self.call_stack.len() - 1 - depth])
    }

    /// Pop the top call frame.
    pub fn run_pop(&mut self) -> EvalResult<CallFrame> {
        self.call_stack.pop().ok_or_else(|| EvalError::InternalError.into())
    }

    /// Current call-stack depth.
    pub fn run_depth(&self) -> usize {
        self.call_stack.len()
    }

    // ---- directory path -----------------------------------------------------

    /// Push a directory object reference onto the active path.
    pub fn push_directory(&mut self, reference: ObjectRef) {
        self.directory_path.push(reference);
    }

    /// Pop the innermost directory off the active path.
    pub fn pop_directory(&mut self) -> EvalResult<ObjectRef> {
        self.directory_path.pop().ok_or_else(|| EvalError::InternalError.into())
    }

    // ---- error API ----------------------------------------------------------

    /// Record a sticky error. Idempotent within one top-level evaluation:
    /// if an error is already set, this is a no-op, so the first error to
    /// occur survives unwinding instead of being clobbered by a later one
    /// (§7).
    pub fn error(&mut self, err: RuntimeError) {
        if self.error.is_some() {
            return
        }
        tracing::debug!(kind = %err.kind, "runtime error recorded");
        self.error = Some(err);
    }

    /// Attach a source-text span (`offset`, `len`) to the current error,
    /// if any.
    pub fn source(&mut self, offset: usize, len: usize) {
        if let Some(err) = self.error.take() {
            self.error = Some(err.with_source(offset, len));
        }
    }

    /// Attach a command name to the current error, if any.
    pub fn command(&mut self, command: &str) {
        self.command = Some(String::from(command));
        if let Some(err) = self.error.take() {
            self.error = Some(err.with_command(command));
        }
    }

    /// The current sticky error, if one is set.
    pub fn last_error(&self) -> Option<&RuntimeError> {
        self.error.as_ref()
    }

    /// Clear the sticky error.
    pub fn clear_error(&mut self) {
        self.error = None;
    }
}

impl RootSource for Runtime {
    fn visit_roots_mut(&mut self, visit: &mut dyn FnMut(&mut ObjectRef)) {
        for r in &mut self.stack {
            visit(r);
        }
        for r in &mut self.locals {
            visit(r);
        }
        for r in &mut self.last_args {
            visit(r);
        }
        if let Some(r) = &mut self.undo {
            visit(r);
        }
        for r in &mut self.directory_path {
            visit(r);
        }
        for frame in &mut self.call_stack {
            visit(&mut frame.program);
        }
        for r in self.gc_roots.borrow_mut().iter_mut() {
            visit(r);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integer::Integer;

    fn push_int(rt: &mut Runtime, value: i64) -> ObjectRef {
        let r = rt.make(Object::Integer(Integer::new(value < 0, value.unsigned_abs()))).unwrap();
        rt.push(r);
        r
    }

    #[test]
    fn stack_push_pop_round_trip() {
        let mut rt = Runtime::with_default_heap();
        let r = push_int(&mut rt, 7);
        assert_eq!(rt.depth(), 1);
        assert_eq!(rt.pop().unwrap(), r);
        assert_eq!(rt.depth(), 0);
    }

    #[test]
    fn roll_and_rolld_are_inverse() {
        let mut rt = Runtime::with_default_heap();
        let a = push_int(&mut rt, 1);
        let _b = push_int(&mut rt, 2);
        let _c = push_int(&mut rt, 3);
        rt.roll(3).unwrap();
        assert_eq!(rt.top().unwrap(), a);
        rt.rolld(3).unwrap();
        assert_eq!(rt.stack_level(3).unwrap(), a);
    }

    #[test]
    fn gc_keeps_only_referenced_objects() {
        let mut rt = Runtime::with_default_heap();
        let kept = push_int(&mut rt, 10);
        let _unreferenced = rt.make(Object::Integer(Integer::new(false, 99))).unwrap();
        rt.gc();
        assert_eq!(rt.top().unwrap(), kept);
        match rt.object(kept).unwrap() {
            Object::Integer(i) => assert_eq!(i.to_i64(), Some(10)),
            _ => panic!("expected integer"),
        }
    }

    #[test]
    fn protected_handle_survives_gc_even_off_stack() {
        let mut rt = Runtime::with_default_heap();
        let reference = rt.make(Object::Integer(Integer::new(false, 5))).unwrap();
        let handle = rt.protect(reference);
        rt.gc();
        let remapped = handle.reference();
        match rt.object(remapped).unwrap() {
            Object::Integer(i) => assert_eq!(i.to_i64(), Some(5)),
            _ => panic!("expected integer"),
        }
    }

    #[test]
    fn out_of_memory_after_heap_limit_reached() {
        let mut rt = Runtime::new(2);
        let a = push_int(&mut rt, 1);
        let _b = push_int(&mut rt, 2);
        // Both are rooted on the stack, so a GC pass cannot reclaim
        // either; the third allocation must fail.
        let _ = a;
        assert!(rt.make(Object::Integer(Integer::new(false, 3))).is_err());
    }

    #[test]
    fn editor_insert_and_close_round_trip() {
        let mut rt = Runtime::with_default_heap();
        rt.edit("hello");
        rt.insert(5, " world").unwrap();
        let reference = rt.close_editor().unwrap();
        match rt.object(reference).unwrap() {
            Object::Symbol(s) => assert_eq!(s, "hello world"),
            _ => panic!("expected text object"),
        }
    }

    #[test]
    fn locals_frame_is_populated_from_stack_top() {
        let mut rt = Runtime::with_default_heap();
        let _a = push_int(&mut rt, 1);
        let b = push_int(&mut rt, 2);
        rt.locals(1).unwrap();
        assert_eq!(rt.depth(), 1);
        assert_eq!(rt.local(0).unwrap(), b);
    }

    #[test]
    fn sticky_error_persists_until_cleared() {
        let mut rt = Runtime::with_default_heap();
        rt.error(EvalError::DomainError.into());
        assert!(rt.last_error().is_some());
        rt.clear_error();
        assert!(rt.last_error().is_none());
    }

    #[test]
    fn first_error_wins() {
        let mut rt = Runtime::with_default_heap();
        rt.error(EvalError::DomainError.into());
        rt.error(EvalError::ZeroDivideError.into());
        assert_eq!(rt.last_error().unwrap().kind, EvalError::DomainError);
    }
}
