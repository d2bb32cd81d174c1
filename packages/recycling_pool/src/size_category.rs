use std::fmt;

use crate::TypeTag;
use crate::constants::{MEDIUM_LIMIT_BYTES, SMALL_LIMIT_BYTES};

/// Coarse size classification used to group reclaimed objects for reuse.
///
/// The classification deliberately discards the exact size: once an object is in the free pool,
/// only its category survives for lookup purposes. Categories are ordered
/// `Small < Medium < Large` and a reuse request is satisfied by any bucket whose category is
/// greater than or equal to the category of the requested minimum size.
///
/// # Example
///
/// ```rust
/// use recycling_pool::SizeCategory;
///
/// assert_eq!(SizeCategory::of(0), SizeCategory::Small);
/// assert_eq!(SizeCategory::of(99), SizeCategory::Small);
/// assert_eq!(SizeCategory::of(100), SizeCategory::Medium);
/// assert_eq!(SizeCategory::of(999), SizeCategory::Medium);
/// assert_eq!(SizeCategory::of(1000), SizeCategory::Large);
///
/// assert!(SizeCategory::Small < SizeCategory::Large);
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[non_exhaustive]
pub enum SizeCategory {
    /// Fewer than 100 bytes.
    Small,

    /// At least 100 and fewer than 1000 bytes.
    Medium,

    /// 1000 bytes or more.
    Large,
}

impl SizeCategory {
    /// Classifies a size in bytes.
    #[must_use]
    pub const fn of(size_bytes: usize) -> Self {
        if size_bytes < SMALL_LIMIT_BYTES {
            Self::Small
        } else if size_bytes < MEDIUM_LIMIT_BYTES {
            Self::Medium
        } else {
            Self::Large
        }
    }

    /// Whether an object of this category can serve a request that needs at least `required`.
    #[must_use]
    pub fn satisfies(self, required: Self) -> bool {
        self >= required
    }

    /// Lowercase name of the category, as used in log output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Large => "large",
        }
    }
}

impl fmt::Display for SizeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one group of interchangeable reclaimed objects in the free pool.
///
/// Any member of a bucket may be handed out for a reuse request that the bucket satisfies.
///
/// Buckets order by category first and type tag second, which is also the order in which
/// reuse requests examine them.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Bucket {
    // Field order matters for the derived `Ord`: smallest sufficient category wins.
    category: SizeCategory,
    type_tag: TypeTag,
}

impl Bucket {
    /// Creates a bucket key from its parts.
    #[must_use]
    pub const fn new(type_tag: TypeTag, category: SizeCategory) -> Self {
        Self { category, type_tag }
    }

    /// Creates the bucket key an object of the given type and measured size belongs to.
    #[must_use]
    pub const fn for_object(type_tag: TypeTag, size_bytes: usize) -> Self {
        Self::new(type_tag, SizeCategory::of(size_bytes))
    }

    /// The type tag shared by all objects in the bucket.
    #[must_use]
    pub const fn type_tag(&self) -> TypeTag {
        self.type_tag
    }

    /// The size category shared by all objects in the bucket.
    #[must_use]
    pub const fn category(&self) -> SizeCategory {
        self.category
    }

    /// Whether objects in this bucket can serve a reuse request for `desired` type (any type if
    /// `None`) with at least `required` category.
    #[must_use]
    pub fn matches(&self, desired: Option<TypeTag>, required: SizeCategory) -> bool {
        desired.is_none_or(|tag| tag == self.type_tag) && self.category.satisfies(required)
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.type_tag, self.category)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    const DICT: TypeTag = TypeTag::new("dict");
    const LIST: TypeTag = TypeTag::new("list");

    #[test]
    fn category_boundaries() {
        assert_eq!(SizeCategory::of(0), SizeCategory::Small);
        assert_eq!(SizeCategory::of(99), SizeCategory::Small);
        assert_eq!(SizeCategory::of(100), SizeCategory::Medium);
        assert_eq!(SizeCategory::of(999), SizeCategory::Medium);
        assert_eq!(SizeCategory::of(1000), SizeCategory::Large);
        assert_eq!(SizeCategory::of(usize::MAX), SizeCategory::Large);
    }

    #[test]
    fn category_is_monotone() {
        let mut previous = SizeCategory::Small;

        for size in (0..5000).step_by(7) {
            let current = SizeCategory::of(size);
            assert!(current >= previous);
            previous = current;
        }
    }

    #[test]
    fn satisfies_is_greater_or_equal() {
        assert!(SizeCategory::Large.satisfies(SizeCategory::Small));
        assert!(SizeCategory::Large.satisfies(SizeCategory::Large));
        assert!(SizeCategory::Medium.satisfies(SizeCategory::Small));
        assert!(!SizeCategory::Small.satisfies(SizeCategory::Medium));
        assert!(!SizeCategory::Medium.satisfies(SizeCategory::Large));
    }

    #[test]
    fn bucket_matching() {
        let bucket = Bucket::new(DICT, SizeCategory::Medium);

        assert!(bucket.matches(Some(DICT), SizeCategory::Small));
        assert!(bucket.matches(Some(DICT), SizeCategory::Medium));
        assert!(bucket.matches(None, SizeCategory::Medium));
        assert!(!bucket.matches(Some(LIST), SizeCategory::Small));
        assert!(!bucket.matches(None, SizeCategory::Large));
    }

    #[test]
    fn bucket_order_prefers_smaller_category() {
        let small_list = Bucket::new(LIST, SizeCategory::Small);
        let medium_dict = Bucket::new(DICT, SizeCategory::Medium);
        let small_dict = Bucket::new(DICT, SizeCategory::Small);

        let mut buckets = vec![medium_dict, small_list, small_dict];
        buckets.sort();

        assert_eq!(buckets, vec![small_dict, small_list, medium_dict]);
    }

    #[test]
    fn bucket_for_object() {
        let bucket = Bucket::for_object(DICT, 64);

        assert_eq!(bucket.type_tag(), DICT);
        assert_eq!(bucket.category(), SizeCategory::Small);
        assert_eq!(bucket.to_string(), "(dict, small)");
    }
}
