//! NDR pointer types
//!
//! Two pointer semantics are supported:
//!
//! - Reference (`[ref]`): Non-null, data follows inline, no wire representation
//! - Unique (`[unique]`): Nullable, 4-byte referent ID, referent deferred
//!
//! Unique referents are written out of line. The sentinel goes where the
//! pointer field sits; the referent follows in the deferred section once the
//! enclosing top-level parameter has written its immediate fields.

use std::ops::{Deref, DerefMut};

use crate::{NdrDecode, NdrEncode, NdrReader, NdrWriter, Result};

/// Trait for NDR pointer types
pub trait NdrPtr {
    type Target;

    /// Check if the pointer is null
    fn is_null(&self) -> bool;

    /// Get the inner value, if any
    fn get(&self) -> Option<&Self::Target>;
}

/// Reference pointer - non-null, data follows inline
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefPtr<T>(pub T);

impl<T> RefPtr<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for RefPtr<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for RefPtr<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T> NdrPtr for RefPtr<T> {
    type Target = T;

    fn is_null(&self) -> bool {
        false
    }

    fn get(&self) -> Option<&T> {
        Some(&self.0)
    }
}

impl<T: NdrEncode> NdrEncode for RefPtr<T> {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        self.0.ndr_encode(w)
    }

    fn ndr_align() -> usize {
        T::ndr_align()
    }
}

impl<T: NdrDecode> NdrDecode for RefPtr<T> {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        self.0.ndr_decode(r)
    }

    fn ndr_align() -> usize {
        T::ndr_align()
    }
}

/// Unique pointer - nullable, no aliasing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniquePtr<T>(pub Option<Box<T>>);

impl<T> Default for UniquePtr<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<T> UniquePtr<T> {
    pub fn new(value: T) -> Self {
        Self(Some(Box::new(value)))
    }

    pub fn null() -> Self {
        Self(None)
    }

    pub fn from_option(opt: Option<T>) -> Self {
        Self(opt.map(Box::new))
    }

    pub fn into_option(self) -> Option<T> {
        self.0.map(|b| *b)
    }

    pub fn as_ref(&self) -> Option<&T> {
        self.0.as_deref()
    }

    pub fn as_mut(&mut self) -> Option<&mut T> {
        self.0.as_deref_mut()
    }
}

impl<T> From<Option<T>> for UniquePtr<T> {
    fn from(opt: Option<T>) -> Self {
        Self::from_option(opt)
    }
}

impl<T> NdrPtr for UniquePtr<T> {
    type Target = T;

    fn is_null(&self) -> bool {
        self.0.is_none()
    }

    fn get(&self) -> Option<&T> {
        self.0.as_deref()
    }
}

impl<T: NdrEncode> NdrEncode for UniquePtr<T> {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> Result<()> {
        w.write_pointer(self.0.as_deref().map(|v| v as &dyn NdrEncode))
    }

    fn ndr_align() -> usize {
        4
    }
}

impl<'a> NdrReader<'a> {
    /// Read a unique pointer sentinel into `ptr`.
    ///
    /// A live pointer gets a default referent slot that is queued for the
    /// deferred section. Returns whether the pointer was non-null.
    pub fn read_pointer<T: NdrDecode + Default>(&mut self, ptr: &'a mut UniquePtr<T>) -> Result<bool> {
        match self.read_pointer_id()? {
            None => {
                ptr.0 = None;
                Ok(false)
            }
            Some(_) => {
                let slot = ptr.0.insert(Box::new(T::default()));
                self.defer(&mut **slot);
                Ok(true)
            }
        }
    }
}

impl<T: NdrDecode + Default> NdrDecode for UniquePtr<T> {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> Result<()> {
        r.read_pointer(self).map(|_| ())
    }

    fn ndr_align() -> usize {
        4
    }
}
