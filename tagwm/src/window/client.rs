use x11rb::protocol::xproto::Window;

use crate::window::geometry::{Rect, SizeHints};

#[derive(Debug, Clone)]
pub struct Client {
    /// The window ID of the application window
    pub window: Window,
    pub name: String,
    pub class: String,
    pub instance: String,
    /// Current geometry; `x`/`y` is the outer corner, `w`/`h` exclude the border.
    pub rect: Rect,
    /// Geometry before the last resize.
    pub old_rect: Rect,
    pub bw: i32,
    /// Border width to restore when the window is released.
    pub old_bw: i32,
    /// Geometry to return to when the window floats again.
    pub float_rect: Rect,
    pub hints: SizeHints,
    pub tags: u32,
    /// Index of the owning monitor.
    pub monitor: usize,
    pub cfact: f32,
    pub is_fixed: bool,
    pub is_floating: bool,
    pub is_urgent: bool,
    pub never_focus: bool,
    /// _NET_WM_STATE_FULLSCREEN is set.
    pub is_fullscreen: bool,
    /// Occupies its whole monitor through toggle_fullscreen.
    pub is_active_fullscreen: bool,
    /// Floating state saved while fullscreen.
    pub old_floating: bool,
    /// Geometry and border to return to when leaving active fullscreen.
    pub pre_fullscreen: Option<(Rect, i32)>,
    pub is_terminal: bool,
    pub no_swallow: bool,
    pub pid: u32,
    pub scratch_key: Option<char>,
    /// Fixed border for this window while it floats.
    pub float_border: Option<i32>,
    /// Tag set to return to when this window goes away.
    pub switch_to_tag: Option<u32>,
    /// Ignore position in configure requests.
    pub ignore_cfg_req_pos: bool,
}

impl Client {
    pub fn new(window: Window, rect: Rect, bw: i32) -> Self {
        Self {
            window,
            name: String::from("broken"),
            class: String::new(),
            instance: String::new(),
            rect,
            old_rect: rect,
            bw,
            old_bw: bw,
            float_rect: rect,
            hints: SizeHints::default(),
            tags: 0,
            monitor: 0,
            cfact: 1.0,
            is_fixed: false,
            is_floating: false,
            is_urgent: false,
            never_focus: false,
            is_fullscreen: false,
            is_active_fullscreen: false,
            old_floating: false,
            pre_fullscreen: None,
            is_terminal: false,
            no_swallow: false,
            pid: 0,
            scratch_key: None,
            float_border: None,
            switch_to_tag: None,
            ignore_cfg_req_pos: false,
        }
    }

    /// Width including both borders.
    pub fn outer_width(&self) -> i32 {
        self.rect.w + 2 * self.bw
    }

    pub fn outer_height(&self) -> i32 {
        self.rect.h + 2 * self.bw
    }

    /// Outer bounding box used for monitor assignment.
    pub fn outer_rect(&self) -> Rect {
        Rect::new(self.rect.x, self.rect.y, self.outer_width(), self.outer_height())
    }

    pub fn is_visible_on(&self, tagset: u32) -> bool {
        self.tags & tagset != 0
    }

    pub fn set_size_hints(&mut self, hints: SizeHints) {
        self.is_fixed = hints.is_fixed();
        self.hints = hints;
    }
}
