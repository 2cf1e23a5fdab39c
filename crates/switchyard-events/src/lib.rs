//! Live update fan-out for switchyard
//!
//! Health transitions and chain saves become typed [`UpdateEvent`]s that
//! are pushed to every subscriber. Publication never blocks: a subscriber
//! that falls behind loses its oldest events, and the loss is counted.

#![allow(clippy::must_use_candidate)]

mod broadcaster;

pub use broadcaster::{Subscription, UpdateBroadcaster};
pub use switchyard_core::{EventKind, UpdateEvent};
