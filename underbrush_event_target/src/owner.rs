// Copyright 2025 the Underbrush Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Owner capability and back-reference bookkeeping.
//!
//! ## Overview
//!
//! A listener may be registered on behalf of an *owner*: the object passed to
//! the callback as invocation context and used for bulk detachment. Owners
//! are ordinary user types behind an [`OwnerRef`] handle; identity is handle
//! identity, so the same `OwnerRef` clone must be used for `on`, `off`, and
//! queries.
//!
//! ## Back-references
//!
//! An owner that wants O(listeners-of-owner) bulk detachment embeds an
//! [`OwnerTargets`] list and exposes it through the [`ListenerOwner`]
//! capability. [`EventTarget::on`](crate::EventTarget::on) appends the target
//! to that list (at most one entry per target, however many event types the
//! owner listens for), and [`OwnerRef::detach_all`] walks it to drop every
//! registration without scanning targets the owner never touched.
//!
//! The capability is optional — [`ListenerOwner::listened_targets`] defaults
//! to `None` — and explicit: targets query it through the trait, never by
//! probing fields. Back-references hold the targets weakly; they are
//! bookkeeping, not ownership edges, and a dropped target simply disappears
//! from the list.

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::target::{EventTarget, TargetInner};
use crate::util::remove_element_if_present;

/// Capability for types that can own listener registrations.
///
/// Every owner type implements this; the default implementation opts out of
/// back-reference tracking. Owners that want bulk detachment embed an
/// [`OwnerTargets`] and return it:
///
/// ```rust
/// use underbrush_event_target::{ListenerOwner, OwnerTargets};
///
/// struct Widget {
///     targets: OwnerTargets<i32>,
/// }
///
/// impl ListenerOwner<i32> for Widget {
///     fn listened_targets(&self) -> Option<&OwnerTargets<i32>> {
///         Some(&self.targets)
///     }
/// }
/// ```
pub trait ListenerOwner<A: 'static> {
    /// The owner's back-reference list, if it tracks one.
    fn listened_targets(&self) -> Option<&OwnerTargets<A>> {
        None
    }
}

/// Shared handle to a listener owner.
///
/// Identity is `Rc` allocation identity: two `OwnerRef`s compare equal only
/// when they are clones of the same handle. Registrations made through one
/// handle must be removed through a clone of that handle.
pub struct OwnerRef<A: 'static>(Rc<dyn ListenerOwner<A>>);

impl<A: 'static> OwnerRef<A> {
    /// Wrap an owner in a handle.
    pub fn new(owner: Rc<dyn ListenerOwner<A>>) -> Self {
        Self(owner)
    }

    /// Borrow the underlying owner.
    pub fn as_owner(&self) -> &dyn ListenerOwner<A> {
        &*self.0
    }

    /// Detach this owner from every event target it listens on.
    ///
    /// Walks the owner's back-reference list and removes every registration
    /// carrying this owner, across all event types, then clears the list.
    /// O(listeners-of-owner): targets the owner never registered with are not
    /// visited. A no-op for owners without the back-reference capability.
    pub fn detach_all(&self) {
        let Some(back_refs) = self.0.listened_targets() else {
            return;
        };
        for target in back_refs.targets() {
            let _ = target.inner.registry.remove_owner(self);
        }
        back_refs.clear_all();
    }
}

impl<A: 'static> Clone for OwnerRef<A> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<A: 'static> PartialEq for OwnerRef<A> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<A: 'static> core::fmt::Debug for OwnerRef<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("OwnerRef")
            .field(&Rc::as_ptr(&self.0))
            .finish()
    }
}

/// An owner's back-reference list: the event targets it currently listens on.
///
/// Maintained by the [`EventTarget`](crate::EventTarget) layer; owners only
/// embed it and hand it out via [`ListenerOwner::listened_targets`]. Holds
/// each target at most once regardless of how many event types the owner
/// listens for on it, and holds them weakly — the list never keeps a target
/// alive.
pub struct OwnerTargets<A: 'static> {
    targets: RefCell<Vec<Weak<TargetInner<A>>>>,
}

impl<A: 'static> OwnerTargets<A> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self {
            targets: RefCell::new(Vec::new()),
        }
    }

    /// Whether `target` is in the list.
    pub fn contains(&self, target: &EventTarget<A>) -> bool {
        self.targets
            .borrow()
            .iter()
            .any(|weak| core::ptr::eq(weak.as_ptr(), Rc::as_ptr(&target.inner)))
    }

    /// The live targets currently in the list, in insertion order.
    pub fn targets(&self) -> Vec<EventTarget<A>> {
        self.targets
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .map(|inner| EventTarget { inner })
            .collect()
    }

    /// Number of live targets in the list.
    pub fn len(&self) -> usize {
        self.targets
            .borrow()
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Whether the list holds no live target.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append `target` unless already present, dropping entries whose target
    /// has gone away while here.
    pub(crate) fn insert(&self, target: &EventTarget<A>) {
        let mut list = self.targets.borrow_mut();
        list.retain(|weak| weak.strong_count() > 0);
        let present = list
            .iter()
            .any(|weak| core::ptr::eq(weak.as_ptr(), Rc::as_ptr(&target.inner)));
        if !present {
            list.push(Rc::downgrade(&target.inner));
        }
    }

    /// Remove `target` if present.
    pub(crate) fn remove(&self, target: &EventTarget<A>) -> bool {
        remove_element_if_present(&mut self.targets.borrow_mut(), |weak| {
            core::ptr::eq(weak.as_ptr(), Rc::as_ptr(&target.inner))
        })
    }

    /// Drop every entry.
    pub(crate) fn clear_all(&self) {
        self.targets.borrow_mut().clear();
    }
}

impl<A: 'static> Default for OwnerTargets<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: 'static> core::fmt::Debug for OwnerTargets<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OwnerTargets")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::{ListenerOwner, OwnerRef, OwnerTargets};
    use crate::target::EventTarget;
    use alloc::rc::Rc;

    struct Widget {
        targets: OwnerTargets<i32>,
    }

    impl ListenerOwner<i32> for Widget {
        fn listened_targets(&self) -> Option<&OwnerTargets<i32>> {
            Some(&self.targets)
        }
    }

    fn widget_owner() -> OwnerRef<i32> {
        OwnerRef::new(Rc::new(Widget {
            targets: OwnerTargets::new(),
        }))
    }

    #[test]
    fn insert_is_idempotent_per_target() {
        let owner = widget_owner();
        let list = owner.as_owner().listened_targets().unwrap();
        let target: EventTarget<i32> = EventTarget::new();
        list.insert(&target);
        list.insert(&target);
        assert_eq!(list.len(), 1);
        assert!(list.contains(&target));
    }

    #[test]
    fn dropped_targets_vanish_from_the_list() {
        let owner = widget_owner();
        let list = owner.as_owner().listened_targets().unwrap();
        let kept: EventTarget<i32> = EventTarget::new();
        list.insert(&kept);
        {
            let dropped: EventTarget<i32> = EventTarget::new();
            list.insert(&dropped);
            assert_eq!(list.len(), 2);
        }
        assert_eq!(list.len(), 1);
        assert_eq!(list.targets().len(), 1);
        assert!(list.contains(&kept));
    }

    #[test]
    fn owner_ref_identity_is_handle_identity() {
        let owner = widget_owner();
        assert_eq!(owner, owner.clone());
        assert!(owner != widget_owner());
    }
}
