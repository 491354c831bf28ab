use std::fmt;

/// Identifies one outgoing server request, so its response can be matched
/// back to the component that issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    pub fn from_u64(value: u64) -> Self {
        Self(value)
    }

    pub fn to_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out monotonically increasing keys. Keys are never recycled within a
/// session, so a late response can never be mistaken for a newer request.
#[derive(Clone, Debug)]
pub struct KeyGenerator {
    next: u64,
}

impl KeyGenerator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Start numbering at `first`. Useful when two components issue requests
    /// over the same link and must not collide.
    pub fn starting_at(first: u64) -> Self {
        Self { next: first.max(1) }
    }

    pub fn generate(&mut self) -> RequestId {
        let key = RequestId(self.next);
        self.next = self.next.wrapping_add(1);
        key
    }
}

impl Default for KeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}
