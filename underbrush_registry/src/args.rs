// Copyright 2025 the Underbrush Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-arity argument packs for callback invocation.

/// Number of positional argument slots carried by an [`Args`] pack.
pub const MAX_ARGS: usize = 5;

/// A fixed-arity pack of up to five positional arguments.
///
/// This is deliberately a fixed contract, not a variadic one: an emit carries
/// exactly five optional slots, and a sixth argument is unrepresentable by
/// construction. Callers that need more data pack it into a single argument
/// value.
///
/// Unset trailing slots are absent (`None`), never coerced to a sentinel.
///
/// Packs are normally built from tuples:
///
/// ```rust
/// use underbrush_registry::Args;
///
/// let args = Args::from((1, 2, 3));
/// assert_eq!(args.len(), 3);
/// assert_eq!(args.get(1), Some(&2));
/// assert_eq!(args.get(3), None);
///
/// let empty: Args<i32> = Args::from(());
/// assert!(empty.is_empty());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Args<A> {
    slots: [Option<A>; MAX_ARGS],
}

impl<A> Args<A> {
    /// An empty pack: all five slots absent.
    pub const fn none() -> Self {
        Self {
            slots: [None, None, None, None, None],
        }
    }

    /// The argument in `slot`, if set. Slots at or beyond [`MAX_ARGS`] are
    /// always absent.
    #[inline]
    pub fn get(&self, slot: usize) -> Option<&A> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Number of leading filled slots.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.iter().take_while(|s| s.is_some()).count()
    }

    /// Whether no slot is filled.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots[0].is_none()
    }

    /// Iterate over the filled slots in positional order.
    pub fn iter(&self) -> impl Iterator<Item = &A> {
        self.slots.iter().flatten()
    }
}

impl<A> Default for Args<A> {
    fn default() -> Self {
        Self::none()
    }
}

impl<A> From<()> for Args<A> {
    fn from((): ()) -> Self {
        Self::none()
    }
}

impl<A> From<(A,)> for Args<A> {
    fn from((a0,): (A,)) -> Self {
        Self {
            slots: [Some(a0), None, None, None, None],
        }
    }
}

impl<A> From<(A, A)> for Args<A> {
    fn from((a0, a1): (A, A)) -> Self {
        Self {
            slots: [Some(a0), Some(a1), None, None, None],
        }
    }
}

impl<A> From<(A, A, A)> for Args<A> {
    fn from((a0, a1, a2): (A, A, A)) -> Self {
        Self {
            slots: [Some(a0), Some(a1), Some(a2), None, None],
        }
    }
}

impl<A> From<(A, A, A, A)> for Args<A> {
    fn from((a0, a1, a2, a3): (A, A, A, A)) -> Self {
        Self {
            slots: [Some(a0), Some(a1), Some(a2), Some(a3), None],
        }
    }
}

impl<A> From<(A, A, A, A, A)> for Args<A> {
    fn from((a0, a1, a2, a3, a4): (A, A, A, A, A)) -> Self {
        Self {
            slots: [Some(a0), Some(a1), Some(a2), Some(a3), Some(a4)],
        }
    }
}
