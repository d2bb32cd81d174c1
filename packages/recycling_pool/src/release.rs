use crate::{Bucket, RefCount};

/// Outcome of releasing one reference to a live object.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum Release {
    /// Other references remain; the object stays live with this many references.
    Live(RefCount),

    /// That was the last reference. The object was reclaimed into the free pool (or released,
    /// if its bucket was full) as part of the same operation.
    Reclaimed(Bucket),
}

impl Release {
    /// Whether the released reference was the last one.
    #[must_use]
    pub const fn is_reclaimed(&self) -> bool {
        matches!(self, Self::Reclaimed(_))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::{SizeCategory, TypeTag};

    #[test]
    fn release_reports_reclamation() {
        let bucket = Bucket::new(TypeTag::new("dict"), SizeCategory::Small);

        assert!(Release::Reclaimed(bucket).is_reclaimed());
        assert!(!Release::Live(RefCount::MIN).is_reclaimed());
    }

    #[test]
    fn live_release_keeps_count() {
        let count = RefCount::new(3).unwrap();

        assert_eq!(Release::Live(count), Release::Live(count));
        assert_ne!(Release::Live(count), Release::Live(RefCount::MIN));
    }
}
