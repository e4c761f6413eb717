use tagwm_config::Settings;
use x11rb::protocol::xproto::Window;

use crate::window::geometry::Rect;
use crate::window::tags::{Pertag, TagSlot};

/// One physical output and the windows assigned to it.
#[derive(Debug, Clone)]
pub struct Monitor {
    pub num: usize,
    /// Full output geometry.
    pub screen: Rect,
    /// Geometry left for windows once the bar is accounted for.
    pub area: Rect,
    pub bar_y: i32,
    pub gap: i32,
    pub tagset: [u32; 2],
    pub seltags: usize,
    /// Indices into the configured layout table.
    pub layouts: [usize; 2],
    pub sellt: usize,
    pub axes: [i32; 3],
    pub mfact: f32,
    pub nmaster: i32,
    pub show_bar: bool,
    pub top_bar: bool,
    pub symbol: String,
    /// Registry order.
    pub clients: Vec<Window>,
    /// Focus order, most recent first.
    pub stack: Vec<Window>,
    pub sel: Option<Window>,
    pub bar: Option<Window>,
    pub pertag: Pertag,
}

impl Monitor {
    pub fn new(num: usize, settings: &Settings) -> Self {
        let layouts = [0, 1 % settings.layouts.len().max(1)];
        let slot = TagSlot {
            nmaster: settings.nmaster,
            mfact: settings.mfact,
            sellt: 0,
            layouts,
            axes: settings.layout_axes,
            show_bar: settings.show_bar,
        };
        Self {
            num,
            screen: Rect::default(),
            area: Rect::default(),
            bar_y: 0,
            gap: settings.gap_px,
            tagset: [1, 1],
            seltags: 0,
            layouts,
            sellt: 0,
            axes: settings.layout_axes,
            mfact: settings.mfact,
            nmaster: settings.nmaster,
            show_bar: settings.show_bar,
            top_bar: settings.top_bar,
            symbol: settings
                .layouts
                .first()
                .map(|l| l.symbol.clone())
                .unwrap_or_default(),
            clients: Vec::new(),
            stack: Vec::new(),
            sel: None,
            bar: None,
            pertag: Pertag::new(settings.tags.len(), slot),
        }
    }

    pub fn active_tags(&self) -> u32 {
        self.tagset[self.seltags]
    }

    /// Index of the selected layout in the configured table.
    pub fn layout(&self) -> usize {
        self.layouts[self.sellt]
    }

    /// Recompute the window area and bar row from the output geometry.
    pub fn update_bar_pos(&mut self, bar_height: i32) {
        self.area = self.screen;
        if self.show_bar {
            self.area.h -= bar_height;
            if self.top_bar {
                self.bar_y = self.area.y;
                self.area.y += bar_height;
            } else {
                self.bar_y = self.area.y + self.area.h;
            }
        } else {
            self.bar_y = -bar_height;
        }
    }

    pub fn bar_rect(&self, bar_height: i32) -> Rect {
        Rect::new(self.area.x, self.bar_y, self.area.w, bar_height)
    }

    pub fn set_nmaster(&mut self, nmaster: i32) {
        self.nmaster = nmaster;
        self.pertag.current_slot_mut().nmaster = nmaster;
    }

    pub fn set_mfact(&mut self, mfact: f32) {
        self.mfact = mfact;
        self.pertag.current_slot_mut().mfact = mfact;
    }

    pub fn set_axes(&mut self, axes: [i32; 3]) {
        self.axes = axes;
        self.pertag.current_slot_mut().axes = axes;
    }

    pub fn toggle_layout_slot(&mut self) {
        self.sellt ^= 1;
        self.pertag.current_slot_mut().sellt = self.sellt;
    }

    pub fn set_layout(&mut self, layout: usize) {
        self.layouts[self.sellt] = layout;
        self.pertag.current_slot_mut().layouts[self.sellt] = layout;
    }

    pub fn toggle_show_bar(&mut self) {
        self.show_bar = !self.show_bar;
        self.pertag.current_slot_mut().show_bar = self.show_bar;
    }

    /// Remove `window` from both lists.
    pub fn forget(&mut self, window: Window) {
        self.clients.retain(|w| *w != window);
        self.stack.retain(|w| *w != window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> Monitor {
        let mut m = Monitor::new(0, &Settings::default());
        m.screen = Rect::new(0, 0, 1000, 800);
        m
    }

    #[test]
    fn test_bar_on_top() {
        let mut m = monitor();
        m.update_bar_pos(20);
        assert_eq!(m.area, Rect::new(0, 20, 1000, 780));
        assert_eq!(m.bar_y, 0);
    }

    #[test]
    fn test_bar_on_bottom_and_hidden() {
        let mut m = monitor();
        m.top_bar = false;
        m.update_bar_pos(20);
        assert_eq!(m.area, Rect::new(0, 0, 1000, 780));
        assert_eq!(m.bar_y, 780);

        m.toggle_show_bar();
        m.update_bar_pos(20);
        assert_eq!(m.area, Rect::new(0, 0, 1000, 800));
        assert_eq!(m.bar_y, -20);
        assert!(!m.pertag.current_slot().show_bar);
    }

    #[test]
    fn test_parameter_changes_write_through() {
        let mut m = monitor();
        m.set_nmaster(3);
        m.set_mfact(0.7);
        m.set_axes([-1, 1, 3]);
        m.toggle_layout_slot();
        m.set_layout(2);
        let slot = m.pertag.current_slot();
        assert_eq!(slot.nmaster, 3);
        assert_eq!(slot.mfact, 0.7);
        assert_eq!(slot.axes, [-1, 1, 3]);
        assert_eq!(slot.sellt, 1);
        assert_eq!(slot.layouts, [0, 2]);
        assert_eq!(m.layout(), 2);
    }
}
