// Copyright 2025 the Underbrush Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=underbrush_registry --heading-base-level=0

//! Underbrush Registry: an owner-agnostic callback registry.
//!
//! Underbrush Registry is the leaf primitive of the Underbrush event stack:
//! for each event key it stores an ordered list of (callback, owner) records
//! and fans invocations out to them synchronously, in registration order.
//!
//! - Register with [`CallbackRegistry::add`], query with
//!   [`CallbackRegistry::has_listener`], and remove by exact (callback, owner)
//!   pair, by key, or by owner across every key.
//! - Invoke with [`CallbackRegistry::invoke`]; arguments travel in a fixed
//!   five-slot pack ([`Args`]).
//! - A callback may re-enter the registry during an invocation — removing
//!   itself, removing others, or registering new listeners — without skipping
//!   or double-invoking any live listener. See [`registry`] for the snapshot
//!   scheme that provides this.
//!
//! The registry knows nothing about what an owner *is*: owners are opaque
//! identities compared with `PartialEq`, used for matching and passed back to
//! callbacks as the invocation context. Higher layers (such as
//! `underbrush_event_target`) add owner bookkeeping on top.
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use underbrush_registry::{Args, Callback, CallbackRegistry};
//!
//! let registry: CallbackRegistry<&'static str, (), i32> = CallbackRegistry::new();
//!
//! let sum = Rc::new(Cell::new(0));
//! let cb: Callback<(), i32> = Rc::new({
//!     let sum = sum.clone();
//!     move |_owner, args| sum.set(sum.get() + args.get(0).copied().unwrap_or(0))
//! });
//!
//! registry.add("tick", cb.clone(), None);
//! registry.invoke("tick", &Args::from((5,)));
//! registry.invoke("tick", &Args::from((7,)));
//! assert_eq!(sum.get(), 12);
//!
//! assert!(registry.remove("tick", &cb, None));
//! registry.invoke("tick", &Args::from((100,)));
//! assert_eq!(sum.get(), 12);
//! ```
//!
//! Execution is single-threaded and cooperative: nothing here is `Send` or
//! `Sync`, and a long-running callback blocks the emitting call site.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod args;
mod registry;

pub use args::{Args, MAX_ARGS};
pub use registry::{Callback, CallbackRegistry};
