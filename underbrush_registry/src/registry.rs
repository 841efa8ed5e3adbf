// Copyright 2025 the Underbrush Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Registry implementation.
//!
//! ## Overview
//!
//! Stores, per event key, an ordered list of (callback, owner) records and
//! invokes them synchronously in registration order.
//!
//! ## Invocation safety
//!
//! [`CallbackRegistry::invoke`] snapshots the record list for the key before
//! calling anything, then checks a shared liveness flag per entry:
//!
//! - A record removed during the emit — by the running callback or by another
//!   listener — is flagged before it is dropped from the canonical list, so
//!   the in-flight snapshot skips it. Removal takes effect no later than the
//!   next emit, and within the current emit for entries not yet reached.
//! - Records added during the emit are not in the snapshot; they are first
//!   invoked on the next emit.
//! - A re-entrant `invoke` (a listener emitting on the same registry) runs on
//!   its own snapshot; no iteration state is shared.
//!
//! No listener is ever invoked twice for the same emit, and no still-live
//! listener is skipped.
//!
//! ## Duplicates
//!
//! [`CallbackRegistry::add`] appends unconditionally. Deduplicating identical
//! (callback, owner) pairs is the caller's responsibility; layers that expose
//! idempotent registration check [`CallbackRegistry::has_listener`] first.

use alloc::rc::Rc;
use core::borrow::Borrow;
use core::cell::{Cell, RefCell};
use core::hash::Hash;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::args::Args;

/// A registered callback.
///
/// Identity is `Rc` allocation identity: the registry matches callbacks with
/// [`Rc::ptr_eq`], so the handle passed to removal and query operations must
/// be a clone of the handle that was registered. Call sites retain the handle
/// returned by the registering layer for exactly this purpose.
///
/// The first parameter is the invocation context: the owner the callback was
/// registered with, if any.
pub type Callback<O, A> = Rc<dyn Fn(Option<&O>, &Args<A>)>;

/// One (callback, owner) registration.
struct ListenerRecord<O: 'static, A: 'static> {
    callback: Callback<O, A>,
    owner: Option<O>,
    /// Liveness flag shared between the canonical list and in-flight invoke
    /// snapshots. Set before the record is dropped from the canonical list.
    removed: Cell<bool>,
}

impl<O: PartialEq + 'static, A: 'static> ListenerRecord<O, A> {
    fn matches(&self, callback: &Callback<O, A>, owner: Option<&O>) -> bool {
        Rc::ptr_eq(&self.callback, callback) && self.owner.as_ref() == owner
    }
}

/// Per-key record list. Fan-out counts are small in this domain, so the
/// first few records live inline.
type EntryList<O, A> = SmallVec<[Rc<ListenerRecord<O, A>>; 4]>;

/// Invoke snapshot; sized for a slightly larger fan-out than the inline
/// canonical list since nested emits each take their own.
type Snapshot<O, A> = SmallVec<[Rc<ListenerRecord<O, A>>; 8]>;

/// Ordered, keyed callback registry with snapshot-safe invocation.
///
/// ## Usage
///
/// - Generic over the event key `K`, the owner identity `O`, and the argument
///   value `A`. Owners are opaque to the registry: compared with `PartialEq`
///   for matching, handed back to callbacks as invocation context.
/// - All operations take `&self`; the registry uses interior mutability so
///   that callbacks can re-enter it during [`CallbackRegistry::invoke`].
/// - Every mutation is total: removing something that is not registered is a
///   no-op, not an error.
///
/// ## See Also
///
/// `underbrush_event_target` layers idempotent `on`/`off`/`once` semantics
/// and owner back-reference bookkeeping on top of this primitive.
pub struct CallbackRegistry<K, O: 'static, A: 'static> {
    entries: RefCell<HashMap<K, EntryList<O, A>>>,
}

impl<K, O: 'static, A: 'static> core::fmt::Debug for CallbackRegistry<K, O, A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("keys", &self.entries.borrow().len())
            .finish_non_exhaustive()
    }
}

impl<K, O: 'static, A: 'static> Default for CallbackRegistry<K, O, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, O: 'static, A: 'static> CallbackRegistry<K, O, A> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(HashMap::new()),
        }
    }
}

impl<K, O, A> CallbackRegistry<K, O, A>
where
    K: Eq + Hash + Clone,
    O: Clone + PartialEq + 'static,
    A: 'static,
{
    /// Whether any listener is registered for `key`.
    pub fn has_listeners<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.borrow().contains_key(key)
    }

    /// Whether the exact (callback, owner) pair is registered for `key`.
    ///
    /// `owner` must match the registration: a listener registered with an
    /// owner is not found by an owner-less query, and vice versa.
    pub fn has_listener<Q>(&self, key: &Q, callback: &Callback<O, A>, owner: Option<&O>) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let entries = self.entries.borrow();
        entries
            .get(key)
            .is_some_and(|list| list.iter().any(|r| r.matches(callback, owner)))
    }

    /// Number of listeners registered for `key`.
    pub fn listener_count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.borrow().get(key).map_or(0, EntryList::len)
    }

    /// Total number of listeners across every key.
    pub fn total_listeners(&self) -> usize {
        self.entries.borrow().values().map(EntryList::len).sum()
    }

    /// Whether the registry holds no listeners at all.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Append a (callback, owner) record for `key`.
    ///
    /// Does not deduplicate; registering the same pair twice yields two
    /// invocations per emit. Callers wanting idempotence check
    /// [`Self::has_listener`] first.
    pub fn add(&self, key: K, callback: Callback<O, A>, owner: Option<O>) {
        let record = Rc::new(ListenerRecord {
            callback,
            owner,
            removed: Cell::new(false),
        });
        self.entries
            .borrow_mut()
            .entry(key)
            .or_default()
            .push(record);
    }

    /// Remove the first record matching the exact (callback, owner) pair.
    ///
    /// Returns whether a record was removed; `false` means nothing matched
    /// (a no-op, not an error). The record is flagged before it is dropped,
    /// so an emit currently in flight will not invoke it.
    pub fn remove<Q>(&self, key: &Q, callback: &Callback<O, A>, owner: Option<&O>) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut entries = self.entries.borrow_mut();
        let Some(list) = entries.get_mut(key) else {
            return false;
        };
        let Some(pos) = list.iter().position(|r| r.matches(callback, owner)) else {
            return false;
        };
        let record = list.remove(pos);
        record.removed.set(true);
        let now_empty = list.is_empty();
        if now_empty {
            entries.remove(key);
        }
        true
    }

    /// Remove every record for `key`. Returns the number removed.
    pub fn remove_key<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(list) = self.entries.borrow_mut().remove(key) else {
            return 0;
        };
        for record in &list {
            record.removed.set(true);
        }
        list.len()
    }

    /// Remove every record, across every key, whose owner matches.
    ///
    /// This is the indiscriminate detach: it ignores keys and callbacks
    /// entirely. Returns the number removed.
    pub fn remove_owner(&self, owner: &O) -> usize {
        let mut entries = self.entries.borrow_mut();
        let mut removed = 0;
        for list in entries.values_mut() {
            list.retain(|record| {
                if record.owner.as_ref() == Some(owner) {
                    record.removed.set(true);
                    removed += 1;
                    false
                } else {
                    true
                }
            });
        }
        entries.retain(|_, list| !list.is_empty());
        removed
    }

    /// Remove everything: every record for every key.
    pub fn clear(&self) {
        let mut entries = self.entries.borrow_mut();
        for list in entries.values() {
            for record in list {
                record.removed.set(true);
            }
        }
        entries.clear();
    }

    /// Invoke every live listener for `key`, synchronously and in
    /// registration order, forwarding `args` and passing each record's owner
    /// as the invocation context.
    ///
    /// Callbacks may re-enter the registry freely; see the module docs for
    /// the snapshot guarantees.
    pub fn invoke<Q>(&self, key: &Q, args: &Args<A>)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        // Snapshot the list, then release the borrow before calling out so
        // callbacks can mutate the registry.
        let snapshot: Snapshot<O, A> = {
            let entries = self.entries.borrow();
            match entries.get(key) {
                Some(list) => list.iter().cloned().collect(),
                None => return,
            }
        };
        for record in &snapshot {
            if record.removed.get() {
                continue;
            }
            (record.callback)(record.owner.as_ref(), args);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Callback, CallbackRegistry};
    use crate::args::Args;
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    type Registry = CallbackRegistry<&'static str, u32, i32>;

    /// A callback that appends `tag` to the shared log on every invocation.
    fn logger(log: &Rc<RefCell<Vec<&'static str>>>, tag: &'static str) -> Callback<u32, i32> {
        let log = log.clone();
        Rc::new(move |_owner, _args| log.borrow_mut().push(tag))
    }

    fn new_log() -> Rc<RefCell<Vec<&'static str>>> {
        Rc::new(RefCell::new(Vec::new()))
    }

    #[test]
    fn invokes_in_registration_order() {
        let registry = Registry::new();
        let log = new_log();
        registry.add("t", logger(&log, "a"), None);
        registry.add("t", logger(&log, "b"), Some(1));
        registry.add("t", logger(&log, "c"), None);

        registry.invoke(&"t", &Args::none());
        assert_eq!(*log.borrow(), ["a", "b", "c"]);
    }

    #[test]
    fn owner_is_invocation_context() {
        let registry = Registry::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let cb: Callback<u32, i32> = Rc::new({
            let seen = seen.clone();
            move |owner, _args| seen.borrow_mut().push(owner.copied())
        });
        registry.add("t", cb.clone(), Some(7));
        registry.add("t", cb, None);

        registry.invoke(&"t", &Args::none());
        assert_eq!(*seen.borrow(), [Some(7), None]);
    }

    #[test]
    fn arguments_forward_positionally() {
        let registry = Registry::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let cb: Callback<u32, i32> = Rc::new({
            let seen = seen.clone();
            move |_owner, args| {
                let values: Vec<i32> = args.iter().copied().collect();
                seen.borrow_mut().push((values, args.get(3).copied()));
            }
        });
        registry.add("t", cb, None);

        registry.invoke(&"t", &Args::from((1, 2, 3)));
        let (values, fourth) = seen.borrow()[0].clone();
        assert_eq!(values, [1, 2, 3]);
        // Unset trailing slots stay absent.
        assert_eq!(fourth, None);
    }

    #[test]
    fn has_listener_matches_exact_pair() {
        let registry = Registry::new();
        let log = new_log();
        let cb = logger(&log, "a");
        registry.add("t", cb.clone(), Some(1));

        assert!(registry.has_listeners(&"t"));
        assert!(registry.has_listener(&"t", &cb, Some(&1)));
        // Owner is part of the identity.
        assert!(!registry.has_listener(&"t", &cb, None));
        assert!(!registry.has_listener(&"t", &cb, Some(&2)));
        // So is the callback allocation.
        assert!(!registry.has_listener(&"t", &logger(&log, "a"), Some(&1)));
        assert!(!registry.has_listeners(&"u"));
    }

    #[test]
    fn add_does_not_deduplicate() {
        let registry = Registry::new();
        let log = new_log();
        let cb = logger(&log, "a");
        registry.add("t", cb.clone(), None);
        registry.add("t", cb, None);

        registry.invoke(&"t", &Args::none());
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn remove_takes_first_match_only() {
        let registry = Registry::new();
        let log = new_log();
        let cb = logger(&log, "a");
        registry.add("t", cb.clone(), None);
        registry.add("t", cb.clone(), None);

        assert!(registry.remove(&"t", &cb, None));
        assert_eq!(registry.listener_count(&"t"), 1);
        registry.invoke(&"t", &Args::none());
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn remove_without_match_is_noop() {
        let registry = Registry::new();
        let log = new_log();
        let cb = logger(&log, "a");
        registry.add("t", cb.clone(), Some(1));

        assert!(!registry.remove(&"t", &cb, None));
        assert!(!registry.remove(&"u", &cb, Some(&1)));
        assert_eq!(registry.total_listeners(), 1);
    }

    #[test]
    fn remove_key_drops_every_record_for_that_key() {
        let registry = Registry::new();
        let log = new_log();
        registry.add("t", logger(&log, "a"), None);
        registry.add("t", logger(&log, "b"), Some(1));
        registry.add("u", logger(&log, "c"), None);

        assert_eq!(registry.remove_key(&"t"), 2);
        assert!(!registry.has_listeners(&"t"));
        assert!(registry.has_listeners(&"u"));
        assert_eq!(registry.remove_key(&"t"), 0);
    }

    #[test]
    fn remove_owner_spans_keys() {
        let registry = Registry::new();
        let log = new_log();
        registry.add("t", logger(&log, "a"), Some(1));
        registry.add("t", logger(&log, "b"), Some(2));
        registry.add("u", logger(&log, "c"), Some(1));
        registry.add("v", logger(&log, "d"), None);

        assert_eq!(registry.remove_owner(&1), 2);
        assert_eq!(registry.listener_count(&"t"), 1);
        assert!(!registry.has_listeners(&"u"));
        assert!(registry.has_listeners(&"v"));

        registry.invoke(&"t", &Args::none());
        assert_eq!(*log.borrow(), ["b"]);
    }

    #[test]
    fn clear_empties_everything() {
        let registry = Registry::new();
        let log = new_log();
        registry.add("t", logger(&log, "a"), Some(1));
        registry.add("u", logger(&log, "b"), None);

        registry.clear();
        assert!(registry.is_empty());
        registry.invoke(&"t", &Args::none());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn self_removal_mid_emit_does_not_skip_later_listeners() {
        let registry = Rc::new(Registry::new());
        let log = new_log();

        // l2 needs its own handle to remove itself; share it through a slot
        // filled in after construction.
        let slot: Rc<RefCell<Option<Callback<u32, i32>>>> = Rc::new(RefCell::new(None));
        let l2: Callback<u32, i32> = Rc::new({
            let registry = registry.clone();
            let log = log.clone();
            let slot = slot.clone();
            move |_owner, _args| {
                log.borrow_mut().push("l2");
                let me = slot.borrow().clone();
                if let Some(me) = me {
                    registry.remove(&"t", &me, None);
                }
            }
        });
        *slot.borrow_mut() = Some(l2.clone());

        registry.add("t", logger(&log, "l1"), None);
        registry.add("t", l2, None);
        registry.add("t", logger(&log, "l3"), None);

        // l3 still runs exactly once; l1 is not re-invoked.
        registry.invoke(&"t", &Args::none());
        assert_eq!(*log.borrow(), ["l1", "l2", "l3"]);

        // l2 removed itself, so the next emit skips it.
        log.borrow_mut().clear();
        registry.invoke(&"t", &Args::none());
        assert_eq!(*log.borrow(), ["l1", "l3"]);
    }

    #[test]
    fn removing_a_later_listener_mid_emit_prevents_its_invocation() {
        let registry = Rc::new(Registry::new());
        let log = new_log();
        let victim = logger(&log, "victim");
        let remover: Callback<u32, i32> = Rc::new({
            let registry = registry.clone();
            let victim = victim.clone();
            let log = log.clone();
            move |_owner, _args| {
                log.borrow_mut().push("remover");
                registry.remove(&"t", &victim, None);
            }
        });

        registry.add("t", remover, None);
        registry.add("t", victim, None);

        registry.invoke(&"t", &Args::none());
        // The victim was in the snapshot but flagged before being reached.
        assert_eq!(*log.borrow(), ["remover"]);
    }

    #[test]
    fn listener_added_mid_emit_waits_for_next_emit() {
        let registry = Rc::new(Registry::new());
        let log = new_log();
        let late = logger(&log, "late");
        let adder: Callback<u32, i32> = Rc::new({
            let registry = registry.clone();
            let late = late.clone();
            let log = log.clone();
            move |_owner, _args| {
                log.borrow_mut().push("adder");
                if !registry.has_listener(&"t", &late, None) {
                    registry.add("t", late.clone(), None);
                }
            }
        });

        registry.add("t", adder, None);
        registry.invoke(&"t", &Args::none());
        assert_eq!(*log.borrow(), ["adder"]);

        registry.invoke(&"t", &Args::none());
        assert_eq!(*log.borrow(), ["adder", "adder", "late"]);
    }

    #[test]
    fn reentrant_invoke_runs_on_its_own_snapshot() {
        let registry = Rc::new(Registry::new());
        let log = new_log();
        let inner = logger(&log, "inner");
        let outer: Callback<u32, i32> = Rc::new({
            let registry = registry.clone();
            let log = log.clone();
            move |_owner, args| {
                log.borrow_mut().push("outer");
                // Nested emit of a different key while this one is in flight.
                if args.get(0).copied() == Some(1) {
                    registry.invoke(&"nested", &Args::none());
                }
            }
        });

        registry.add("t", outer, None);
        registry.add("nested", inner, None);

        registry.invoke(&"t", &Args::from((1,)));
        assert_eq!(*log.borrow(), ["outer", "inner"]);
    }

    #[test]
    fn remove_key_mid_emit_stops_remaining_listeners() {
        let registry = Rc::new(Registry::new());
        let log = new_log();
        let killer: Callback<u32, i32> = Rc::new({
            let registry = registry.clone();
            let log = log.clone();
            move |_owner, _args| {
                log.borrow_mut().push("killer");
                registry.remove_key(&"t");
            }
        });

        registry.add("t", killer, None);
        registry.add("t", logger(&log, "after"), None);

        registry.invoke(&"t", &Args::none());
        assert_eq!(*log.borrow(), ["killer"]);
        assert!(registry.is_empty());
    }
}
