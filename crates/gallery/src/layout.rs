use crate::scroll::ScrollState;
use crate::slots::SlotId;

/// Screen placement of gallery tiles, origin top-left, y growing downward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub images_per_row: usize,
    pub row_height: f32,
    pub column_stride: f32,
    pub tile_size: f32,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            images_per_row: 4,
            row_height: 300.0,
            column_stride: 270.0,
            tile_size: 256.0,
        }
    }
}

/// A resident image positioned for the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedTile {
    pub ordinal: usize,
    pub slot: SlotId,
    pub origin: [f32; 2],
}

impl GridLayout {
    /// Rows that can be at least partly on screen at once.
    pub fn rows_per_screen(&self, viewport_height: u32) -> usize {
        let spare = viewport_height.max(1) - 1;
        (spare as f32 / self.row_height).floor() as usize + 1
    }

    pub fn cell(&self, ordinal: usize) -> (usize, usize) {
        let per_row = self.images_per_row.max(1);
        (ordinal / per_row, ordinal % per_row)
    }

    pub fn tile_origin(&self, ordinal: usize, scroll: &ScrollState) -> [f32; 2] {
        let (row, column) = self.cell(ordinal);
        let row_top = row as f64 * f64::from(self.row_height);
        let y = row_top - scroll.position(self.row_height);
        [column as f32 * self.column_stride, y as f32]
    }

    pub fn is_visible(&self, origin: [f32; 2], viewport_height: u32) -> bool {
        origin[1] >= -self.row_height && origin[1] <= viewport_height as f32
    }

    /// Positions every resident tile that falls inside the viewport.
    pub fn place<I>(&self, resident: I, scroll: &ScrollState, viewport_height: u32) -> Vec<PlacedTile>
    where
        I: IntoIterator<Item = (usize, SlotId)>,
    {
        let mut tiles: Vec<PlacedTile> = resident
            .into_iter()
            .map(|(ordinal, slot)| PlacedTile {
                ordinal,
                slot,
                origin: self.tile_origin(ordinal, scroll),
            })
            .filter(|tile| self.is_visible(tile.origin, viewport_height))
            .collect();
        tiles.sort_by_key(|tile| tile.ordinal);
        tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::RESERVED_SLOTS;

    #[test]
    fn rows_per_screen_rounds_up_partial_rows() {
        let layout = GridLayout::default();
        assert_eq!(layout.rows_per_screen(1), 1);
        assert_eq!(layout.rows_per_screen(300), 1);
        assert_eq!(layout.rows_per_screen(301), 2);
        assert_eq!(layout.rows_per_screen(900), 3);
        assert_eq!(layout.rows_per_screen(0), 1);
    }

    #[test]
    fn tiles_move_up_as_scroll_advances() {
        let layout = GridLayout::default();
        let at_top = ScrollState::default();
        assert_eq!(layout.tile_origin(5, &at_top), [270.0, 300.0]);

        let scrolled = ScrollState {
            rows_scrolled: 1,
            sub_row_offset: 20.0,
            velocity: 0.0,
        };
        assert_eq!(layout.tile_origin(5, &scrolled), [270.0, -20.0]);
        assert_eq!(layout.tile_origin(0, &scrolled), [0.0, -320.0]);
    }

    #[test]
    fn place_culls_rows_outside_viewport() {
        let layout = GridLayout::default();
        let scroll = ScrollState {
            rows_scrolled: 1,
            sub_row_offset: 20.0,
            velocity: 0.0,
        };
        let resident = (0..16).map(|ordinal| (ordinal, SlotId::new(ordinal + RESERVED_SLOTS)));
        let tiles = layout.place(resident, &scroll, 500);
        let ordinals: Vec<_> = tiles.iter().map(|tile| tile.ordinal).collect();
        // row 0 sits at -320, row 3 at 580
        assert_eq!(ordinals, (4..12).collect::<Vec<_>>());
    }
}
