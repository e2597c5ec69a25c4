// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Small-size-optimized storage. A typical check registers one or two expectations and
//! rule-violation ids are short, so both stay on the stack in the common case and spill
//! to the heap otherwise.

use smallstr::SmallString;
use smallvec::SmallVec;

pub const DEFAULT_STRING_STORAGE_SIZE: usize = 32;

pub const INLINE_VEC_SIZE: usize = 4;

/// Stack allocated string storage for rule-violation identifiers. When this gets larger
/// than [`DEFAULT_STRING_STORAGE_SIZE`], it will be [`smallvec::SmallVec::spilled`] on
/// the heap.
pub type InlineString = SmallString<[u8; DEFAULT_STRING_STORAGE_SIZE]>;

/// Stack allocated list for expectation and allowance entries. When this gets larger
/// than [`INLINE_VEC_SIZE`], it will be [`smallvec::SmallVec::spilled`] on the heap.
pub type InlineVec<T> = SmallVec<[T; INLINE_VEC_SIZE]>;
