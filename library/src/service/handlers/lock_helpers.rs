//! Scoped access to a [`SharedDocument`].
//!
//! A poisoned lock surfaces as [`LibraryError::LockPoisoned`] instead of a panic.

use crate::document::{Document, SharedDocument};
use crate::error::LibraryError;

/// Runs `f` with exclusive access; the guard is held until `f` returns.
pub fn with_document_write<F, R>(document: &SharedDocument, f: F) -> Result<R, LibraryError>
where
    F: FnOnce(&mut Document) -> Result<R, LibraryError>,
{
    let mut guard = document.write().map_err(|_| LibraryError::LockPoisoned)?;
    f(&mut guard)
}

/// Runs `f` with shared access.
pub fn with_document_read<F, R>(document: &SharedDocument, f: F) -> Result<R, LibraryError>
where
    F: FnOnce(&Document) -> Result<R, LibraryError>,
{
    let guard = document.read().map_err(|_| LibraryError::LockPoisoned)?;
    f(&guard)
}
