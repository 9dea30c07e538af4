#![allow(dead_code)] // Allow the unused structs

//! Compile fail tests
//!
//! Implemented in a minimal way, as doc tests in a hidden module.

/// ```compile_fail
/// use std::rc::Rc;
///
/// use conaccum::ConMap;
/// use crossbeam_utils::thread;
///
/// let map: ConMap<usize, Rc<usize>> = ConMap::new();
///
/// thread::scope(|s| {
///     s.spawn(|_| {
///         drop(map);
///     });
/// }).unwrap();
/// ```
///
/// Similar one, but with Arc should work fine, though.
///
/// ```
/// use std::sync::Arc;
///
/// use conaccum::ConMap;
/// use crossbeam_utils::thread;
///
/// let map: ConMap<usize, Arc<usize>> = ConMap::new();
///
/// thread::scope(|s| {
///     s.spawn(|_| {
///         drop(map);
///     });
/// }).unwrap();
/// ```
struct ShouldNotBeSend;

/// ```compile_fail
/// use std::rc::Rc;
///
/// use conaccum::ConMap;
/// use crossbeam_utils::thread;
///
/// let map: ConMap<usize, Rc<usize>> = ConMap::new();
///
/// thread::scope(|s| {
///     s.spawn(|_| {
///         map.insert_or_assign(42, Rc::new(42));
///     });
/// }).unwrap();
/// ```
///
/// Similar one, but with Arc should work fine, though.
///
/// ```
/// use std::sync::Arc;
///
/// use conaccum::ConMap;
/// use crossbeam_utils::thread;
///
/// let map: ConMap<usize, Arc<usize>> = ConMap::new();
///
/// thread::scope(|s| {
///     s.spawn(|_| {
///         map.insert_or_assign(42, Arc::new(42));
///     });
/// }).unwrap();
/// ```
struct ShouldNotSync;

/// The same for the set.
///
/// ```compile_fail
/// use std::rc::Rc;
///
/// use conaccum::ConSet;
/// use crossbeam_utils::thread;
///
/// let set: ConSet<Rc<usize>> = ConSet::new();
///
/// thread::scope(|s| {
///     s.spawn(|_| {
///         set.insert(Rc::new(42));
///     });
/// }).unwrap();
/// ```
struct SetShouldNotSync;

/// Unwrapping without locks is possible only once nobody else can insert.
///
/// ```compile_fail
/// use conaccum::ConSet;
/// use crossbeam_utils::thread;
///
/// let set: ConSet<usize> = ConSet::new();
///
/// thread::scope(|s| {
///     s.spawn(|_| {
///         set.insert(42);
///     });
///     let result = set.into_inner();
///     assert!(result.len() <= 1);
/// }).unwrap();
/// ```
///
/// After the join, it's fine.
///
/// ```
/// use conaccum::ConSet;
/// use crossbeam_utils::thread;
///
/// let set: ConSet<usize> = ConSet::new();
///
/// thread::scope(|s| {
///     s.spawn(|_| {
///         set.insert(42);
///     });
/// }).unwrap();
///
/// let result = set.into_inner();
/// assert_eq!(1, result.len());
/// ```
struct NoIntoInnerWhileShared;

/// The consumed collection is independent, it may outlive the accumulator.
///
/// ```
/// use conaccum::ConMap;
///
/// let map = ConMap::new();
/// map.insert_or_assign(1, "one");
/// let result = map.consume();
/// drop(map);
/// assert_eq!("one", result[&1]);
/// ```
struct ConsumedIsIndependent;
