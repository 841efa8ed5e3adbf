// Copyright 2025 the Underbrush Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Registration, one-shot listeners, and positional emit on an `EventTarget`.
//!
//! Run:
//! - `cargo run -p underbrush_demos --example event_target_basics`

use std::rc::Rc;

use underbrush_event_target::{EventTarget, Listener};

fn main() {
    let target: EventTarget<String> = EventTarget::new();

    // A persistent listener: receives every "chat" emit until removed.
    let chat: Listener<String> = Rc::new(|_owner, args| {
        let who = args.get(0).map(String::as_str).unwrap_or("?");
        let text = args.get(1).map(String::as_str).unwrap_or("");
        println!("[chat] {who}: {text}");
    });
    let chat = target.on("chat", chat, None);

    // A one-shot listener: fires for the first "chat" emit only.
    let greeter: Listener<String> = Rc::new(|_owner, _args| {
        println!("[once] first message seen, greeting dismissed");
    });
    target.once("chat", greeter, None);

    target.emit("chat", ("ada".to_string(), "hello".to_string()));
    target.emit("chat", ("grace".to_string(), "hi there".to_string()));

    // Exact removal requires the same handle that was registered.
    target.off("chat", Some(&chat), None);
    target.emit("chat", ("nobody".to_string(), "unheard".to_string()));

    println!("still listening on \"chat\": {}", target.has_event_listener("chat"));
}
