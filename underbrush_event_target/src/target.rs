// Copyright 2025 the Underbrush Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event target implementation.
//!
//! ## Overview
//!
//! An [`EventTarget`] owns one callback registry and layers typed semantics
//! on top of it: idempotent [`on`](EventTarget::on), exact
//! [`off`](EventTarget::off), one-shot [`once`](EventTarget::once),
//! positional [`emit`](EventTarget::emit), and the object-style
//! [`dispatch_event`](EventTarget::dispatch_event) adapter. Event keys at
//! this layer are strings.
//!
//! ## Identity
//!
//! A registration is the triple (event type, listener handle, owner handle).
//! Listener and owner identity are handle identity, so `off` must receive
//! clones of the handles used at registration time. The most common
//! integration mistake is forgetting the owner: `off("t", Some(&cb), None)`
//! does *not* remove a listener registered with an owner, silently — the
//! signatures are symmetrical precisely so call sites can mirror their `on`.
//!
//! ## Owner back-references
//!
//! Registering with an owner that exposes the
//! [`ListenerOwner`](crate::ListenerOwner) capability records this target in
//! the owner's back-reference list (once per target). The per-listener `off`
//! removes the back-reference when it removes a registration. The bulk
//! `off(type, None, _)` and [`target_off`](EventTarget::target_off) paths do
//! *not* touch back-references; a stale back-reference is harmless (entries
//! are weak and detach operations tolerate targets with no matching
//! registrations).
//!
//! ## Re-entrancy
//!
//! Emits are synchronous, in registration order, on the calling thread. A
//! listener may freely call `on`/`off`/`once`/`emit` on the same target
//! during an emit; the underlying registry guarantees no listener is invoked
//! twice for one emit and removal takes effect no later than the next emit.

use alloc::borrow::ToOwned;
use alloc::rc::{Rc, Weak};
use alloc::string::String;
use core::cell::RefCell;

use underbrush_registry::{Args, Callback, CallbackRegistry};

use crate::event::Event;
use crate::owner::OwnerRef;

/// A listener registered on an [`EventTarget`].
///
/// Invoked with the registration's owner (if any) as context and the emitted
/// argument pack. Identity is `Rc` allocation identity; retain the handle
/// returned by [`EventTarget::on`] / [`EventTarget::once`] to remove the
/// listener later.
pub type Listener<A> = Callback<OwnerRef<A>, A>;

/// Weak counterpart of [`Listener`], for references a listener holds to
/// itself.
type WeakListener<A> = Weak<dyn Fn(Option<&OwnerRef<A>>, &Args<A>)>;

/// Reserved key prefix for one-shot marker records.
///
/// [`EventTarget::once`] registers its marker under `"__once_"` + type.
/// Emitting such a key directly is out of contract; a legitimate event type
/// can only collide with it deliberately.
const ONCE_PREFIX: &str = "__once_";

fn once_marker(event_type: &str) -> String {
    let mut key = String::with_capacity(ONCE_PREFIX.len() + event_type.len());
    key.push_str(ONCE_PREFIX);
    key.push_str(event_type);
    key
}

pub(crate) struct TargetInner<A: 'static> {
    pub(crate) registry: CallbackRegistry<String, OwnerRef<A>, A>,
}

/// A typed event target: string-keyed listeners over one owned registry.
///
/// ## Usage
///
/// - `EventTarget` is a cheap cloneable handle; clones refer to the same
///   target ([`PartialEq`] is handle identity).
/// - `A` is the argument value type carried by emits. Give it an
///   [`Event`](crate::Event) impl to enable
///   [`dispatch_event`](Self::dispatch_event).
/// - Every mutation is total: double `off`, `off` for a type nobody listens
///   to, and re-registering an identical triple are all defined no-ops.
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use underbrush_event_target::{EventTarget, Listener};
///
/// let target: EventTarget<i32> = EventTarget::new();
/// let seen = Rc::new(Cell::new(0));
/// let listener: Listener<i32> = Rc::new({
///     let seen = seen.clone();
///     move |_owner, args| seen.set(args.get(0).copied().unwrap_or(0))
/// });
///
/// target.on("tick", listener.clone(), None);
/// target.emit("tick", (7,));
/// assert_eq!(seen.get(), 7);
///
/// target.off("tick", Some(&listener), None);
/// target.emit("tick", (9,));
/// assert_eq!(seen.get(), 7);
/// ```
pub struct EventTarget<A: 'static> {
    pub(crate) inner: Rc<TargetInner<A>>,
}

impl<A: 'static> Clone for EventTarget<A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<A: 'static> PartialEq for EventTarget<A> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<A: 'static> core::fmt::Debug for EventTarget<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventTarget")
            .field("listeners", &self.inner.registry.total_listeners())
            .finish_non_exhaustive()
    }
}

impl<A: 'static> Default for EventTarget<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: 'static> EventTarget<A> {
    /// Create a target with no listeners.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(TargetInner {
                registry: CallbackRegistry::new(),
            }),
        }
    }

    /// Whether any listener is registered for `event_type`.
    pub fn has_event_listener(&self, event_type: &str) -> bool {
        self.inner.registry.has_listeners(event_type)
    }

    /// Whether the exact (type, listener, owner) triple is registered.
    ///
    /// A pending [`once`](Self::once) registration answers `true` for its
    /// original listener until it fires.
    pub fn has_listener(
        &self,
        event_type: &str,
        listener: &Listener<A>,
        owner: Option<&OwnerRef<A>>,
    ) -> bool {
        self.inner.registry.has_listener(event_type, listener, owner)
            || self
                .inner
                .registry
                .has_listener(&once_marker(event_type), listener, owner)
    }

    /// Register `listener` for `event_type` on behalf of `owner`.
    ///
    /// Idempotent: re-registering an identical triple is a no-op and does not
    /// duplicate the owner back-reference. When `owner` exposes the
    /// [`ListenerOwner`](crate::ListenerOwner) capability, this target is
    /// appended to its back-reference list (at most once per target).
    ///
    /// Returns the listener handle so call sites can retain it for
    /// [`off`](Self::off).
    pub fn on(
        &self,
        event_type: &str,
        listener: Listener<A>,
        owner: Option<&OwnerRef<A>>,
    ) -> Listener<A> {
        if self.inner.registry.has_listener(event_type, &listener, owner) {
            return listener;
        }
        self.inner
            .registry
            .add(event_type.to_owned(), listener.clone(), owner.cloned());
        if let Some(owner) = owner
            && let Some(back_refs) = owner.as_owner().listened_targets()
        {
            back_refs.insert(self);
        }
        listener
    }

    /// Remove listeners for `event_type`.
    ///
    /// With a listener, removes exactly the (type, listener, owner)
    /// registration and, when something was actually removed, drops this
    /// target from the owner's back-reference list. The owner must match the
    /// registration — an owner-less `off` leaves an owned registration live.
    ///
    /// Without a listener, removes every listener for the type. This bulk
    /// path leaves owner back-reference lists untouched (see the module
    /// docs).
    ///
    /// Removing something that is not registered is a no-op.
    pub fn off(
        &self,
        event_type: &str,
        listener: Option<&Listener<A>>,
        owner: Option<&OwnerRef<A>>,
    ) {
        match listener {
            None => {
                let _ = self.inner.registry.remove_key(event_type);
            }
            Some(listener) => {
                let removed = self.inner.registry.remove(event_type, listener, owner);
                if removed
                    && let Some(owner) = owner
                    && let Some(back_refs) = owner.as_owner().listened_targets()
                {
                    back_refs.remove(self);
                }
            }
        }
    }

    /// Remove every listener on this target, for every event type and owner.
    ///
    /// A full reset of the target's registry; owner back-reference lists are
    /// not visited.
    pub fn target_off(&self) {
        self.inner.registry.clear();
    }

    /// Register a one-shot listener for `event_type`.
    ///
    /// The listener is invoked at most once: the first matching emit
    /// unregisters it before forwarding the invocation, so even a re-entrant
    /// emit from inside the listener cannot fire it again. Re-registering the
    /// same (listener, owner) pair while one is pending is a no-op.
    ///
    /// Internally this registers a wrapper for `event_type` plus a marker
    /// record under a reserved `"__once_"`-prefixed key; the marker is what
    /// lets [`has_listener`](Self::has_listener) answer for the original
    /// listener and what makes pending re-registration idempotent.
    ///
    /// Returns the wrapper handle; pass it to [`off`](Self::off) to cancel
    /// the pending invocation. On the no-op path (the pair was already
    /// pending) the original `listener` is returned instead, and that handle
    /// cannot cancel: only the wrapper from the first call can. Note also
    /// that cancelling leaves the marker in place, so a cancelled
    /// (listener, owner) pair cannot be re-armed for this `event_type`.
    pub fn once(
        &self,
        event_type: &str,
        listener: Listener<A>,
        owner: Option<&OwnerRef<A>>,
    ) -> Listener<A> {
        let marker = once_marker(event_type);
        if self.inner.registry.has_listener(&marker, &listener, owner) {
            return listener;
        }
        self.inner
            .registry
            .add(marker.clone(), listener.clone(), owner.cloned());

        let weak_target = Rc::downgrade(&self.inner);
        let event_type_owned = event_type.to_owned();
        // The wrapper needs its own handle to unregister itself. The slot
        // holds it weakly (the wrapper captures the slot, so a strong entry
        // would be a cycle keeping the wrapper and `listener` alive forever);
        // it is filled right after construction.
        let slot: Rc<RefCell<Option<WeakListener<A>>>> = Rc::new(RefCell::new(None));
        let wrapper: Listener<A> = Rc::new({
            let slot = slot.clone();
            move |owner_ctx: Option<&OwnerRef<A>>, args: &Args<A>| {
                if let Some(inner) = weak_target.upgrade() {
                    let target = Self { inner };
                    // Unregister wrapper and marker before forwarding, so a
                    // re-entrant emit cannot deliver a second invocation.
                    let me = slot.borrow().as_ref().and_then(Weak::upgrade);
                    if let Some(me) = me {
                        target.off(&event_type_owned, Some(&me), owner_ctx);
                    }
                    let _ = target.inner.registry.remove(&marker, &listener, owner_ctx);
                }
                (*listener)(owner_ctx, args);
            }
        });
        *slot.borrow_mut() = Some(Rc::downgrade(&wrapper));
        self.on(event_type, wrapper.clone(), owner);
        wrapper
    }

    /// Invoke every live listener for `event_type`, synchronously and in
    /// registration order, forwarding up to five positional arguments.
    ///
    /// ```rust
    /// # use std::{cell::RefCell, rc::Rc};
    /// # use underbrush_event_target::{EventTarget, Listener};
    /// # let target: EventTarget<i32> = EventTarget::new();
    /// # let seen = Rc::new(RefCell::new(Vec::new()));
    /// # let listener: Listener<i32> = Rc::new({
    /// #     let seen = seen.clone();
    /// #     move |_o, args| seen.borrow_mut().extend(args.iter().copied())
    /// # });
    /// # target.on("t", listener, None);
    /// target.emit("t", ());
    /// target.emit("t", (1,));
    /// target.emit("t", (2, 3, 4));
    /// # assert_eq!(*seen.borrow(), [1, 2, 3, 4]);
    /// ```
    pub fn emit(&self, event_type: &str, args: impl Into<Args<A>>) {
        self.inner.registry.invoke(event_type, &args.into());
    }
}

impl<A: Event + 'static> EventTarget<A> {
    /// Dispatch a structured event: extract its type and emit the event
    /// object as the sole argument.
    ///
    /// A thin adapter from object-style events onto the positional [`emit`]
    /// convention; listeners receive the event in slot 0.
    ///
    /// [`emit`]: Self::emit
    pub fn dispatch_event(&self, event: A) {
        let event_type = event.event_type().to_owned();
        self.inner
            .registry
            .invoke(event_type.as_str(), &Args::from((event,)));
    }
}
