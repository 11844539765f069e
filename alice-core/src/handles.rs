//! Handle table: the only place module-visible integers become host objects.
//!
//! One namespace covers every resource kind. Handles come from a monotonic
//! counter starting at 1 and are never handed out twice in a session, so a
//! stale handle can only ever miss, never alias a newer resource. Callers
//! name the kind they expect and get `KindMismatch` when the module passes
//! a handle of another kind.

use std::collections::HashMap;
use std::fmt;

use crate::error::BridgeError;

/// Opaque module-visible resource reference. `0` is the null handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u32);

impl Handle {
    pub const NULL: Handle = Handle(0);

    pub const fn from_raw(raw: u32) -> Self {
        Handle(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Buffer,
    Texture,
    Sampler,
    Shader,
    Pipeline,
}

impl ResourceKind {
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Buffer => "buffer",
            ResourceKind::Texture => "texture",
            ResourceKind::Sampler => "sampler",
            ResourceKind::Shader => "shader",
            ResourceKind::Pipeline => "pipeline",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Anything stored in a [`HandleTable`] knows its own kind.
pub trait Tagged {
    fn kind(&self) -> ResourceKind;
}

pub struct HandleTable<T> {
    entries: HashMap<u32, T>,
    next: u32,
    /// Last handle value that may be issued.
    limit: u32,
}

impl<T: Tagged> HandleTable<T> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next: 1,
            limit: u32::MAX,
        }
    }

    /// Insert `value` under a fresh handle.
    pub fn allocate(&mut self, value: T) -> Result<Handle, BridgeError> {
        if self.next == 0 || self.next > self.limit {
            return Err(BridgeError::HandleSpaceExhausted);
        }
        let handle = Handle(self.next);
        // Wraps to 0 after u32::MAX, which the check above treats as exhausted.
        self.next = self.next.wrapping_add(1);

        tracing::debug!(%handle, kind = %value.kind(), "handle allocated");
        self.entries.insert(handle.0, value);
        Ok(handle)
    }

    pub fn lookup(&self, handle: Handle) -> Result<&T, BridgeError> {
        self.entries
            .get(&handle.0)
            .ok_or(BridgeError::NotFound(handle))
    }

    /// Look up `handle` and require it to name a `kind` resource.
    pub fn lookup_as(&self, handle: Handle, kind: ResourceKind) -> Result<&T, BridgeError> {
        let value = self.lookup(handle)?;
        check_kind(handle, kind, value)?;
        Ok(value)
    }

    pub fn lookup_mut(&mut self, handle: Handle) -> Result<&mut T, BridgeError> {
        self.entries
            .get_mut(&handle.0)
            .ok_or(BridgeError::NotFound(handle))
    }

    pub fn release(&mut self, handle: Handle) -> Result<T, BridgeError> {
        let value = self
            .entries
            .remove(&handle.0)
            .ok_or(BridgeError::NotFound(handle))?;
        tracing::debug!(%handle, kind = %value.kind(), "handle released");
        Ok(value)
    }

    /// Release `handle` only if it names a `kind` resource; otherwise the
    /// entry stays live.
    pub fn release_as(&mut self, handle: Handle, kind: ResourceKind) -> Result<T, BridgeError> {
        self.lookup_as(handle, kind)?;
        self.release(handle)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.entries.contains_key(&handle.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of live entries of one kind.
    pub fn count(&self, kind: ResourceKind) -> usize {
        self.entries.values().filter(|v| v.kind() == kind).count()
    }
}

impl<T: Tagged> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for HandleTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleTable")
            .field("live", &self.entries.len())
            .field("next", &self.next)
            .finish()
    }
}

fn check_kind<T: Tagged>(handle: Handle, expected: ResourceKind, value: &T) -> Result<(), BridgeError> {
    let actual = value.kind();
    if actual != expected {
        return Err(BridgeError::KindMismatch {
            handle,
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dummy(ResourceKind);

    impl Tagged for Dummy {
        fn kind(&self) -> ResourceKind {
            self.0
        }
    }

    #[test]
    fn test_counter_exhaustion_is_an_error_not_a_wrap() {
        let mut table = HandleTable {
            entries: HashMap::new(),
            next: 1,
            limit: 3,
        };
        for expected in 1..=3 {
            let h = table.allocate(Dummy(ResourceKind::Buffer)).unwrap();
            assert_eq!(h.raw(), expected);
        }
        let err = table.allocate(Dummy(ResourceKind::Buffer)).unwrap_err();
        assert_eq!(err, BridgeError::HandleSpaceExhausted);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_counter_at_u32_max_never_issues_zero() {
        let mut table = HandleTable {
            entries: HashMap::new(),
            next: u32::MAX,
            limit: u32::MAX,
        };
        let last = table.allocate(Dummy(ResourceKind::Shader)).unwrap();
        assert_eq!(last.raw(), u32::MAX);
        assert!(table.allocate(Dummy(ResourceKind::Shader)).is_err());
        assert!(!table.contains(Handle::NULL));
    }
}
