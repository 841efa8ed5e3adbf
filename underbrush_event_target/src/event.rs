// Copyright 2025 the Underbrush Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structured-event adapter seam.

/// A structured event that knows its own event type.
///
/// Implementing this for the argument type of an
/// [`EventTarget`](crate::EventTarget) enables
/// [`dispatch_event`](crate::EventTarget::dispatch_event): the target extracts
/// the type string and emits the event object as the sole argument, bridging
/// object-style events onto the positional emit convention.
pub trait Event {
    /// The event type this event dispatches as.
    fn event_type(&self) -> &str;
}
