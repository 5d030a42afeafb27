use std::collections::{HashMap, HashSet};

use formula::{Formula, FormulaFactory};
use thiserror::Error;
use tracing::{debug, warn};

use crate::scroll::ScrollState;

/// Slots 0 and 1 hold the source image and the sampling scratch target.
pub const RESERVED_SLOTS: usize = 2;

/// Index into the fixed pool of GPU image slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(usize);

impl SlotId {
    pub const INPUT: SlotId = SlotId(0);
    pub const SCRATCH: SlotId = SlotId(1);

    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }

    pub fn is_reserved(self) -> bool {
        self.0 < RESERVED_SLOTS
    }
}

/// Draws one formula into one display slot.
pub trait ImageRenderer {
    type Error: std::error::Error + 'static;

    fn render(&mut self, slot: SlotId, formula: &Formula) -> Result<(), Self::Error>;
}

#[derive(Debug, Error)]
pub enum SlotError<E: std::error::Error + 'static> {
    #[error("all {capacity} gallery slots are claimed")]
    GalleryFull { capacity: usize },
    #[error("image {ordinal} failed to render")]
    Render {
        ordinal: usize,
        #[source]
        source: E,
    },
}

/// What one [`GallerySlotManager::ensure_rows_visible`] pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnsureReport {
    pub generated: usize,
    pub reloaded: usize,
    pub evicted: usize,
    pub failed: usize,
    /// Rows the viewport needs could not be given slots.
    pub gallery_full: bool,
}

impl EnsureReport {
    pub fn changed(&self) -> bool {
        self.generated + self.reloaded + self.evicted > 0
    }
}

/// Maps gallery ordinals onto a bounded pool of image slots.
///
/// Every formula that rendered successfully is remembered in the catalog, so
/// an evicted image comes back identical when scrolled into view again.
/// A preview the renderer rejects is replaced by a generated formula.
#[derive(Debug)]
pub struct GallerySlotManager {
    images_per_row: usize,
    rows_in_memory: usize,
    factory: FormulaFactory,
    catalog: HashMap<usize, Formula>,
    rejected_previews: HashSet<usize>,
    // display slot (index - RESERVED_SLOTS) -> ordinal
    occupants: Vec<Option<usize>>,
    resident: HashMap<usize, SlotId>,
}

impl GallerySlotManager {
    pub fn new(images_per_row: usize, rows_in_memory: usize, factory: FormulaFactory) -> Self {
        let images_per_row = images_per_row.max(1);
        let rows_in_memory = rows_in_memory.max(1);
        Self {
            images_per_row,
            rows_in_memory,
            factory,
            catalog: HashMap::new(),
            rejected_previews: HashSet::new(),
            occupants: vec![None; images_per_row * rows_in_memory],
            resident: HashMap::new(),
        }
    }

    pub fn images_per_row(&self) -> usize {
        self.images_per_row
    }

    pub fn rows_in_memory(&self) -> usize {
        self.rows_in_memory
    }

    /// Total slots, reserved ones included.
    pub fn capacity(&self) -> usize {
        self.occupants.len() + RESERVED_SLOTS
    }

    pub fn claimed(&self) -> usize {
        self.resident.len() + RESERVED_SLOTS
    }

    pub fn display_slots(&self) -> impl Iterator<Item = SlotId> {
        (RESERVED_SLOTS..self.capacity()).map(SlotId)
    }

    pub fn slot_of(&self, ordinal: usize) -> Option<SlotId> {
        self.resident.get(&ordinal).copied()
    }

    /// Resident images as `(ordinal, slot)` pairs, in no particular order.
    pub fn resident(&self) -> impl Iterator<Item = (usize, SlotId)> + '_ {
        self.resident.iter().map(|(ordinal, slot)| (*ordinal, *slot))
    }

    pub fn formula(&self, ordinal: usize) -> Option<&Formula> {
        self.catalog.get(&ordinal)
    }

    /// Evicts rows outside the in-memory window and fills the rows the
    /// viewport needs, top to bottom.
    pub fn ensure_rows_visible<R: ImageRenderer>(
        &mut self,
        scroll: &ScrollState,
        viewport_rows: usize,
        renderer: &mut R,
    ) -> EnsureReport {
        let top = usize::try_from(scroll.rows_scrolled).unwrap_or(usize::MAX);
        let window_end = top.saturating_add(self.rows_in_memory);
        let needed_end = top.saturating_add(viewport_rows + 1);

        let mut report = EnsureReport {
            evicted: self.evict_outside(top, window_end),
            ..EnsureReport::default()
        };

        'rows: for row in top..needed_end {
            if row >= window_end {
                report.gallery_full = true;
                break;
            }
            let first = row.saturating_mul(self.images_per_row);
            for ordinal in first..first.saturating_add(self.images_per_row) {
                if self.resident.contains_key(&ordinal) {
                    continue;
                }
                let reload = self.formula(ordinal).is_some();
                match self.request_image(ordinal, renderer) {
                    Ok(_) if reload => report.reloaded += 1,
                    Ok(_) => report.generated += 1,
                    Err(SlotError::GalleryFull { .. }) => {
                        report.gallery_full = true;
                        break 'rows;
                    }
                    Err(err @ SlotError::Render { .. }) => {
                        warn!(error = %error_chain(&err), "skipping gallery image");
                        report.failed += 1;
                    }
                }
            }
        }

        if report.changed() {
            debug!(
                top,
                generated = report.generated,
                reloaded = report.reloaded,
                evicted = report.evicted,
                claimed = self.claimed(),
                "gallery rows refreshed"
            );
        }
        report
    }

    /// Gives `ordinal` a slot and renders it, reusing its stored formula when
    /// it was shown before.
    ///
    /// A newly drawn formula that fails to render is dropped, so the next
    /// attempt draws a fresh one. A stored formula is kept either way.
    pub fn request_image<R: ImageRenderer>(
        &mut self,
        ordinal: usize,
        renderer: &mut R,
    ) -> Result<SlotId, SlotError<R::Error>> {
        if let Some(slot) = self.resident.get(&ordinal) {
            return Ok(*slot);
        }
        let Some(free) = self.occupants.iter().position(Option::is_none) else {
            return Err(SlotError::GalleryFull {
                capacity: self.capacity(),
            });
        };
        let slot = SlotId(free + RESERVED_SLOTS);

        let stored = self.formula(ordinal).cloned();
        let is_new = stored.is_none();
        let formula = match stored {
            Some(formula) => formula,
            None if self.rejected_previews.contains(&ordinal) => self.factory.generate(),
            None => self.factory.formula_for(ordinal),
        };

        if let Err(source) = renderer.render(slot, &formula) {
            if is_new && matches!(formula, Formula::Preview { .. }) {
                self.rejected_previews.insert(ordinal);
            }
            return Err(SlotError::Render { ordinal, source });
        }

        self.occupants[free] = Some(ordinal);
        self.resident.insert(ordinal, slot);
        if is_new {
            self.catalog.insert(ordinal, formula);
        }
        Ok(slot)
    }

    /// Frees the resident row farthest from the viewport that is not on
    /// screen. Returns the row released, if any.
    pub fn recycle_farthest_hidden(&mut self, top: usize, viewport_rows: usize) -> Option<usize> {
        let visible = top..top.saturating_add(viewport_rows + 1);
        let row = self
            .resident
            .keys()
            .map(|ordinal| ordinal / self.images_per_row)
            .filter(|row| !visible.contains(row))
            .max_by_key(|row| row.abs_diff(top))?;
        self.release_where(|candidate| candidate == row);
        Some(row)
    }

    fn evict_outside(&mut self, top: usize, window_end: usize) -> usize {
        let window = top..window_end;
        self.release_where(|row| !window.contains(&row))
    }

    fn release_where(&mut self, mut evict_row: impl FnMut(usize) -> bool) -> usize {
        let per_row = self.images_per_row;
        let doomed: Vec<(usize, SlotId)> = self
            .resident
            .iter()
            .filter(|(ordinal, _)| evict_row(**ordinal / per_row))
            .map(|(ordinal, slot)| (*ordinal, *slot))
            .collect();
        for (ordinal, slot) in &doomed {
            self.resident.remove(ordinal);
            self.occupants[slot.0 - RESERVED_SLOTS] = None;
        }
        doomed.len()
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
