/// Determines what happens to live objects when the pool itself is dropped.
///
/// By default, the pool releases its live objects along with the free pool when it is dropped.
///
/// # Examples
///
/// ```
/// use recycling_pool::{DropPolicy, RecyclingPool};
///
/// // The drop policy is set at pool creation time.
/// let pool = RecyclingPool::<String>::builder()
///     .drop_policy(DropPolicy::MustNotDropItems)
///     .build();
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum DropPolicy {
    /// Live objects are released when the pool is dropped. This is the default.
    #[default]
    MayDropItems,

    /// The pool will panic if it still has live objects when it is dropped.
    ///
    /// Use this to detect reference counting leaks: every allocation is expected to be balanced
    /// by reference releases (or an explicit reclaim or take) before the pool goes away. Objects
    /// sitting in the free pool do not count as live.
    MustNotDropItems,
}
