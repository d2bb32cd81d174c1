use std::fmt;

/// Pool operations that look up an existing live object.
///
/// Used to describe which operation was rejected when an identity is not live.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum Operation {
    /// [`RecyclingPool::increase_ref()`][crate::RecyclingPool::increase_ref]
    IncreaseRef,

    /// [`RecyclingPool::decrease_ref()`][crate::RecyclingPool::decrease_ref]
    DecreaseRef,

    /// [`RecyclingPool::reclaim()`][crate::RecyclingPool::reclaim]
    Reclaim,

    /// [`RecyclingPool::take()`][crate::RecyclingPool::take]
    Take,

    /// [`RecyclingPool::with()`][crate::RecyclingPool::with] and
    /// [`RecyclingPool::with_mut()`][crate::RecyclingPool::with_mut]
    Access,
}

impl Operation {
    /// Name of the operation, as used in log output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IncreaseRef => "increase_ref",
            Self::DecreaseRef => "decrease_ref",
            Self::Reclaim => "reclaim",
            Self::Take => "take",
            Self::Access => "access",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn display_matches_method_names() {
        assert_eq!(Operation::IncreaseRef.to_string(), "increase_ref");
        assert_eq!(Operation::DecreaseRef.to_string(), "decrease_ref");
        assert_eq!(Operation::Reclaim.to_string(), "reclaim");
        assert_eq!(Operation::Take.to_string(), "take");
        assert_eq!(Operation::Access.to_string(), "access");
    }
}
