use std::fmt;
use std::mem;

/// Runtime type identifier used to bucket reclaimed objects.
///
/// Two objects with equal tags are considered interchangeable for reuse purposes as long as they
/// also share a [size category][crate::SizeCategory]. Tags are plain static strings so they can
/// be defined as constants next to the type they describe.
///
/// # Example
///
/// ```rust
/// use recycling_pool::TypeTag;
///
/// const ENVELOPE: TypeTag = TypeTag::new("envelope");
///
/// assert_eq!(ENVELOPE.as_str(), "envelope");
/// assert_eq!(ENVELOPE.to_string(), "envelope");
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TypeTag(&'static str);

impl TypeTag {
    /// Creates a type tag from a static name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// The name of the tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A type whose instances can be tracked and recycled by a [`RecyclingPool`][crate::RecyclingPool].
///
/// The pool measures every object through this trait when it is allocated and again when it is
/// reclaimed. Both answers must describe the object's current shape; the pool files a reclaimed
/// object into the bucket matching what the object reports at that moment.
///
/// # Example
///
/// ```rust
/// use recycling_pool::{Poolable, TypeTag};
///
/// struct Envelope {
///     headers: Vec<(String, String)>,
///     body: Vec<u8>,
/// }
///
/// impl Poolable for Envelope {
///     fn type_tag(&self) -> TypeTag {
///         TypeTag::new("envelope")
///     }
///
///     fn size_hint(&self) -> usize {
///         size_of::<Self>() + self.body.capacity()
///     }
/// }
/// ```
pub trait Poolable {
    /// The bucketing type of this object.
    ///
    /// Enums and trait objects may report a different tag per variant or implementation.
    fn type_tag(&self) -> TypeTag;

    /// Approximate memory footprint of the object in bytes, including owned heap memory.
    fn size_hint(&self) -> usize;
}

impl<T> Poolable for Vec<T> {
    fn type_tag(&self) -> TypeTag {
        TypeTag::new("vec")
    }

    fn size_hint(&self) -> usize {
        mem::size_of::<Self>().saturating_add(self.capacity().saturating_mul(mem::size_of::<T>()))
    }
}

impl Poolable for String {
    fn type_tag(&self) -> TypeTag {
        TypeTag::new("string")
    }

    fn size_hint(&self) -> usize {
        mem::size_of::<Self>().saturating_add(self.capacity())
    }
}

impl<P: Poolable + ?Sized> Poolable for Box<P> {
    fn type_tag(&self) -> TypeTag {
        (**self).type_tag()
    }

    fn size_hint(&self) -> usize {
        (**self).size_hint()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    struct Fixed(usize);

    impl Poolable for Fixed {
        fn type_tag(&self) -> TypeTag {
            TypeTag::new("fixed")
        }

        fn size_hint(&self) -> usize {
            self.0
        }
    }

    #[test]
    fn vec_counts_capacity() {
        let vec: Vec<u64> = Vec::with_capacity(10);

        assert_eq!(vec.type_tag(), TypeTag::new("vec"));
        assert!(vec.size_hint() >= mem::size_of::<Vec<u64>>() + 80);
    }

    #[test]
    fn string_counts_capacity() {
        let string = String::with_capacity(500);

        assert_eq!(string.type_tag(), TypeTag::new("string"));
        assert!(string.size_hint() >= mem::size_of::<String>() + 500);
    }

    #[test]
    fn boxed_trait_object_delegates() {
        let boxed: Box<dyn Poolable> = Box::new(Fixed(321));

        assert_eq!(boxed.type_tag(), TypeTag::new("fixed"));
        assert_eq!(boxed.size_hint(), 321);
    }

    #[test]
    fn tags_order_by_name() {
        assert!(TypeTag::new("a") < TypeTag::new("b"));
        assert_eq!(TypeTag::new("x"), TypeTag::new("x"));
    }
}
