// Copyright 2025 the Underbrush Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Owner back-references and bulk detachment.
//!
//! A `Panel` listens on several targets on behalf of itself. When the panel
//! goes away, one `detach_all` call drops every registration it made,
//! without scanning targets it never touched.
//!
//! Run:
//! - `cargo run -p underbrush_demos --example owner_detach`

use std::rc::Rc;

use underbrush_event_target::{EventTarget, Listener, ListenerOwner, OwnerRef, OwnerTargets};

struct Panel {
    name: &'static str,
    targets: OwnerTargets<u32>,
}

impl ListenerOwner<u32> for Panel {
    fn listened_targets(&self) -> Option<&OwnerTargets<u32>> {
        Some(&self.targets)
    }
}

fn main() {
    let mouse: EventTarget<u32> = EventTarget::new();
    let keyboard: EventTarget<u32> = EventTarget::new();

    let panel_rc = Rc::new(Panel {
        name: "inspector",
        targets: OwnerTargets::new(),
    });
    println!("panel '{}' created", panel_rc.name);
    let panel = OwnerRef::new(panel_rc);

    let listener: Listener<u32> = Rc::new(|_owner, args| {
        println!("event with code {:?}", args.get(0));
    });

    mouse.on("down", listener.clone(), Some(&panel));
    mouse.on("up", listener.clone(), Some(&panel));
    keyboard.on("key", listener, Some(&panel));

    let back_refs = panel
        .as_owner()
        .listened_targets()
        .expect("panels track their targets");
    println!("panel listens on {} target(s)", back_refs.len());

    mouse.emit("down", (3,));
    keyboard.emit("key", (65,));

    // The panel goes away: one call detaches it from everything.
    panel.detach_all();
    println!(
        "after detach: mouse.down={}, keyboard.key={}",
        mouse.has_event_listener("down"),
        keyboard.has_event_listener("key"),
    );

    mouse.emit("down", (4,)); // nobody listens any more
}
