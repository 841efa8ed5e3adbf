// Copyright 2025 the Underbrush Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=underbrush_event_target --heading-base-level=0

//! Underbrush Event Target: typed, owner-aware event dispatch.
//!
//! ## Overview
//!
//! An [`EventTarget`] layers typed semantics over the `underbrush_registry`
//! primitive:
//!
//! - [`on`](EventTarget::on) — idempotent registration keyed by the
//!   (type, listener, owner) triple; never registers a duplicate.
//! - [`off`](EventTarget::off) — exact removal of one registration, or bulk
//!   removal of a whole event type.
//! - [`once`](EventTarget::once) — one-shot listeners that unregister
//!   themselves before their first (and only) invocation is forwarded.
//! - [`emit`](EventTarget::emit) — synchronous fan-out of up to five
//!   positional arguments, in registration order.
//! - [`dispatch_event`](EventTarget::dispatch_event) — adapter that routes a
//!   structured [`Event`] by its own type string.
//! - [`target_off`](EventTarget::target_off) — blunt full reset.
//!
//! Owners are opt-in: register a listener on behalf of an [`OwnerRef`] and,
//! when the owner exposes the [`ListenerOwner`] capability, the target keeps
//! the owner's back-reference list current so
//! [`OwnerRef::detach_all`] can drop every registration of that owner in one
//! call, touching only the targets it actually listens on.
//!
//! ## Minimal example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use underbrush_event_target::{EventTarget, Listener};
//!
//! let target: EventTarget<i32> = EventTarget::new();
//!
//! let total = Rc::new(Cell::new(0));
//! let listener: Listener<i32> = Rc::new({
//!     let total = total.clone();
//!     move |_owner, args| total.set(total.get() + args.get(0).copied().unwrap_or(0))
//! });
//!
//! // `on` returns the handle so call sites can retain it for `off`.
//! let listener = target.on("points", listener, None);
//! target.emit("points", (3,));
//! target.emit("points", (4,));
//! assert_eq!(total.get(), 7);
//!
//! target.off("points", Some(&listener), None);
//! target.emit("points", (100,));
//! assert_eq!(total.get(), 7);
//! ```
//!
//! ## Owners and bulk detachment
//!
//! ```rust
//! use std::rc::Rc;
//! use underbrush_event_target::{EventTarget, Listener, ListenerOwner, OwnerRef, OwnerTargets};
//!
//! struct Widget {
//!     targets: OwnerTargets<i32>,
//! }
//!
//! impl ListenerOwner<i32> for Widget {
//!     fn listened_targets(&self) -> Option<&OwnerTargets<i32>> {
//!         Some(&self.targets)
//!     }
//! }
//!
//! let target: EventTarget<i32> = EventTarget::new();
//! let owner = OwnerRef::new(Rc::new(Widget { targets: OwnerTargets::new() }));
//!
//! let noop: Listener<i32> = Rc::new(|_owner, _args| {});
//! target.on("a", noop.clone(), Some(&owner));
//! target.on("b", noop, Some(&owner));
//!
//! // One back-reference entry per target, however many types are listened.
//! assert_eq!(owner.as_owner().listened_targets().unwrap().len(), 1);
//!
//! owner.detach_all();
//! assert!(!target.has_event_listener("a"));
//! assert!(!target.has_event_listener("b"));
//! ```
//!
//! ## Execution model
//!
//! Single-threaded and cooperative: an emit runs every matching listener
//! synchronously on the calling thread, and a long-running listener blocks
//! the emitting call site. Listeners may re-enter the target (including
//! emitting the same type); see the [`EventTarget`] docs for the exact
//! guarantees. Cancellation means "stop receiving future events" — there is
//! no way to abort an in-flight invocation.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod event;
mod owner;
mod target;
pub mod util;

pub use underbrush_registry::{Args, MAX_ARGS};

pub use event::Event;
pub use owner::{ListenerOwner, OwnerRef, OwnerTargets};
pub use target::{EventTarget, Listener};
