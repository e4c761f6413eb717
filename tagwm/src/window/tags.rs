use tagwm_config::{
    SWITCHTAG_DOWN, SWITCHTAG_LEFT, SWITCHTAG_RIGHT, SWITCHTAG_UP,
};

use crate::window::monitor::Monitor;

/// Mask that selects every tag and the shared slot 0.
pub const ALL_TAGS: u32 = u32::MAX;

/// Layout parameters remembered per tag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TagSlot {
    pub nmaster: i32,
    pub mfact: f32,
    pub sellt: usize,
    pub layouts: [usize; 2],
    pub axes: [i32; 3],
    pub show_bar: bool,
}

/// Slot 0 belongs to the all-tags view, slot `i + 1` to tag `i`.
#[derive(Debug, Clone)]
pub struct Pertag {
    pub current: usize,
    pub previous: usize,
    slots: Vec<TagSlot>,
}

impl Pertag {
    pub fn new(ntags: usize, initial: TagSlot) -> Self {
        Self {
            current: 1,
            previous: 1,
            slots: vec![initial; ntags + 1],
        }
    }

    pub fn current_slot(&self) -> &TagSlot {
        &self.slots[self.current]
    }

    pub fn current_slot_mut(&mut self) -> &mut TagSlot {
        &mut self.slots[self.current]
    }

    pub fn slot(&self, index: usize) -> Option<&TagSlot> {
        self.slots.get(index)
    }
}

/// Slot index for a non-empty view mask.
fn slot_for(mask: u32) -> usize {
    if mask == ALL_TAGS {
        0
    } else {
        mask.trailing_zeros() as usize + 1
    }
}

impl Monitor {
    /// Switch to `mask`, or back to the previous tag set when it is empty.
    ///
    /// Returns `None` when nothing changed, otherwise whether bar visibility
    /// flipped with the incoming slot.
    pub fn view(&mut self, mask: u32, tag_mask: u32) -> Option<bool> {
        if mask & tag_mask == self.active_tags() {
            return None;
        }
        self.seltags ^= 1;
        if mask & tag_mask != 0 {
            self.tagset[self.seltags] = mask & tag_mask;
            self.pertag.previous = self.pertag.current;
            self.pertag.current = slot_for(mask);
        } else {
            std::mem::swap(&mut self.pertag.current, &mut self.pertag.previous);
        }
        Some(self.load_tag_slot())
    }

    /// XOR `mask` into the active tag set. An empty result is refused.
    pub fn toggle_view(&mut self, mask: u32, tag_mask: u32) -> Option<bool> {
        let tagset = self.active_tags() ^ (mask & tag_mask);
        if tagset == 0 {
            return None;
        }
        self.tagset[self.seltags] = tagset;
        let current = self.pertag.current;
        if current == 0 || tagset & (1 << (current - 1)) == 0 {
            self.pertag.previous = current;
            self.pertag.current = slot_for(tagset);
        }
        Some(self.load_tag_slot())
    }

    fn load_tag_slot(&mut self) -> bool {
        let slot = *self.pertag.current_slot();
        self.nmaster = slot.nmaster;
        self.mfact = slot.mfact;
        self.sellt = slot.sellt;
        self.layouts = slot.layouts;
        self.axes = slot.axes;
        let bar_changed = self.show_bar != slot.show_bar;
        self.show_bar = slot.show_bar;
        bar_changed
    }
}

/// Move every active tag across the `rows`-row tag grid in the directions
/// named by `flags`, wrapping at the edges and skipping empty cells.
pub fn switch_tag_mask(active: u32, ntags: usize, rows: u32, flags: u32) -> u32 {
    let ntags = ntags as i32;
    let rows = (rows.max(1) as i32).min(ntags.max(1));
    let columns = ntags / rows + i32::from(ntags % rows > 0);
    let mut result = 0u32;

    for i in 0..ntags {
        if active & (1 << i) == 0 {
            continue;
        }
        let mut pos = i;
        let mut row = pos / columns;
        let mut col = pos % columns;

        if flags & SWITCHTAG_UP != 0 {
            row -= 1;
            if row < 0 {
                row = rows - 1;
            }
            loop {
                pos = row * columns + col;
                row -= 1;
                if pos >= 0 && pos < ntags {
                    break;
                }
            }
            row += 1;
        }
        if flags & SWITCHTAG_DOWN != 0 {
            row += 1;
            if row >= rows {
                row = 0;
            }
            pos = row * columns + col;
            if pos >= ntags {
                row = 0;
            }
            pos = row * columns + col;
        }
        if flags & SWITCHTAG_LEFT != 0 {
            col -= 1;
            if col < 0 {
                col = columns - 1;
            }
            loop {
                pos = row * columns + col;
                col -= 1;
                if pos >= 0 && pos < ntags {
                    break;
                }
            }
        }
        if flags & SWITCHTAG_RIGHT != 0 {
            col += 1;
            if col >= columns {
                col = 0;
            }
            pos = row * columns + col;
            if pos >= ntags {
                col = 0;
                pos = row * columns + col;
            }
        }
        result |= 1 << pos;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagwm_config::Settings;

    const TAG_MASK: u32 = 0b111111;

    fn monitor() -> Monitor {
        Monitor::new(0, &Settings::default())
    }

    #[test]
    fn test_view_same_mask_is_noop() {
        let mut m = monitor();
        assert_eq!(m.view(1, TAG_MASK), None);
        assert_eq!(m.active_tags(), 1);
    }

    #[test]
    fn test_view_round_trip_restores_slot() {
        let mut m = monitor();
        m.set_nmaster(2);
        m.set_mfact(0.3);
        m.set_axes([2, 1, 3]);

        assert_eq!(m.view(1 << 2, TAG_MASK), Some(false));
        assert_eq!(m.active_tags(), 0b100);
        assert_eq!(m.pertag.current, 3);
        assert_eq!(m.nmaster, 1);
        m.set_mfact(0.8);

        assert_eq!(m.view(0, TAG_MASK), Some(false));
        assert_eq!(m.active_tags(), 1);
        assert_eq!(m.nmaster, 2);
        assert_eq!(m.mfact, 0.3);
        assert_eq!(m.axes, [2, 1, 3]);

        m.view(0, TAG_MASK);
        assert_eq!(m.active_tags(), 0b100);
        assert_eq!(m.mfact, 0.8);
    }

    #[test]
    fn test_view_all_uses_slot_zero() {
        let mut m = monitor();
        m.view(ALL_TAGS, TAG_MASK);
        assert_eq!(m.active_tags(), TAG_MASK);
        assert_eq!(m.pertag.current, 0);
    }

    #[test]
    fn test_multi_bit_view_uses_lowest_tag() {
        let mut m = monitor();
        m.view(0b110, TAG_MASK);
        assert_eq!(m.pertag.current, 2);
    }

    #[test]
    fn test_view_reports_bar_change() {
        let mut m = monitor();
        m.view(0b10, TAG_MASK);
        m.toggle_show_bar();
        assert_eq!(m.view(0b1, TAG_MASK), Some(true));
        assert!(m.show_bar);
    }

    #[test]
    fn test_toggle_view_rejects_empty() {
        let mut m = monitor();
        assert_eq!(m.toggle_view(1, TAG_MASK), None);
        assert_eq!(m.active_tags(), 1);
        assert!(m.toggle_view(0b10, TAG_MASK).is_some());
        assert_eq!(m.active_tags(), 0b11);
        assert_eq!(m.pertag.current, 1);
        m.toggle_view(0b1, TAG_MASK);
        assert_eq!(m.active_tags(), 0b10);
        assert_eq!(m.pertag.current, 2);
    }

    #[test]
    fn test_switch_tag_grid() {
        // 6 tags, 2 rows: [0 1 2] / [3 4 5]
        assert_eq!(switch_tag_mask(1 << 0, 6, 2, SWITCHTAG_RIGHT), 1 << 1);
        assert_eq!(switch_tag_mask(1 << 2, 6, 2, SWITCHTAG_RIGHT), 1 << 0);
        assert_eq!(switch_tag_mask(1 << 0, 6, 2, SWITCHTAG_LEFT), 1 << 2);
        assert_eq!(switch_tag_mask(1 << 0, 6, 2, SWITCHTAG_DOWN), 1 << 3);
        assert_eq!(switch_tag_mask(1 << 4, 6, 2, SWITCHTAG_DOWN), 1 << 1);
        assert_eq!(switch_tag_mask(1 << 1, 6, 2, SWITCHTAG_UP), 1 << 4);
        assert_eq!(switch_tag_mask(1 << 0, 6, 2, SWITCHTAG_DOWN | SWITCHTAG_RIGHT), 1 << 4);
    }

    #[test]
    fn test_switch_tag_skips_missing_cells() {
        // 5 tags, 2 rows: [0 1 2] / [3 4 -]
        assert_eq!(switch_tag_mask(1 << 2, 5, 2, SWITCHTAG_DOWN), 1 << 2);
        assert_eq!(switch_tag_mask(1 << 2, 5, 2, SWITCHTAG_UP), 1 << 2);
        assert_eq!(switch_tag_mask(1 << 3, 5, 2, SWITCHTAG_LEFT), 1 << 4);
        assert_eq!(switch_tag_mask(1 << 4, 5, 2, SWITCHTAG_RIGHT), 1 << 3);
    }
}
