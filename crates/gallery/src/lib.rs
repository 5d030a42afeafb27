//! Scrolling gallery bookkeeping, independent of any GPU.
//!
//! - `scroll`: momentum, damping and springback of the scroll position.
//! - `clock`: fixed-rate tick accounting for the animation.
//! - `layout`: where each image sits on screen.
//! - `slots`: the bounded image slot pool, eviction and reload.
//!
//! The renderer plugs in through [`ImageRenderer`]; everything here is
//! plain data and unit-testable.

mod clock;
mod layout;
mod scroll;
mod slots;

pub use clock::FixedStep;
pub use layout::{GridLayout, PlacedTile};
pub use scroll::{ScrollAnimator, ScrollSettings, ScrollState};
pub use slots::{
    EnsureReport, GallerySlotManager, ImageRenderer, SlotError, SlotId, RESERVED_SLOTS,
};
