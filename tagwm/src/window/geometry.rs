/// Position and inner size of a window. The border sits outside `w`/`h`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Area shared with `other`, zero when disjoint.
    pub fn intersection_area(&self, other: &Rect) -> i64 {
        let w = (self.right().min(other.right()) - self.x.max(other.x)).max(0);
        let h = (self.bottom().min(other.bottom()) - self.y.max(other.y)).max(0);
        w as i64 * h as i64
    }
}

// WM_NORMAL_HINTS flag bits
const P_MIN_SIZE: u32 = 1 << 4;
const P_MAX_SIZE: u32 = 1 << 5;
const P_RESIZE_INC: u32 = 1 << 6;
const P_ASPECT: u32 = 1 << 7;
const P_BASE_SIZE: u32 = 1 << 8;

/// ICCCM size constraints, zero meaning "unset".
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SizeHints {
    pub base_w: i32,
    pub base_h: i32,
    pub inc_w: i32,
    pub inc_h: i32,
    pub max_w: i32,
    pub max_h: i32,
    pub min_w: i32,
    pub min_h: i32,
    /// height / width lower bound
    pub min_aspect: f32,
    /// width / height upper bound
    pub max_aspect: f32,
}

impl SizeHints {
    /// Decode the 18-word WM_NORMAL_HINTS property. Short properties yield no hints.
    pub fn from_wm_normal_hints(words: &[u32]) -> Self {
        let mut hints = SizeHints::default();
        if words.len() < 15 {
            return hints;
        }
        let flags = words[0];
        let word = |i: usize| words.get(i).map(|v| *v as i32).unwrap_or(0);

        if flags & P_BASE_SIZE != 0 && words.len() >= 17 {
            hints.base_w = word(15);
            hints.base_h = word(16);
        } else if flags & P_MIN_SIZE != 0 {
            hints.base_w = word(5);
            hints.base_h = word(6);
        }
        if flags & P_RESIZE_INC != 0 {
            hints.inc_w = word(9);
            hints.inc_h = word(10);
        }
        if flags & P_MAX_SIZE != 0 {
            hints.max_w = word(7);
            hints.max_h = word(8);
        }
        if flags & P_MIN_SIZE != 0 {
            hints.min_w = word(5);
            hints.min_h = word(6);
        } else if flags & P_BASE_SIZE != 0 && words.len() >= 17 {
            hints.min_w = word(15);
            hints.min_h = word(16);
        }
        if flags & P_ASPECT != 0 {
            let (min_x, min_y, max_x, max_y) = (word(11), word(12), word(13), word(14));
            if min_x != 0 {
                hints.min_aspect = min_y as f32 / min_x as f32;
            }
            if max_y != 0 {
                hints.max_aspect = max_x as f32 / max_y as f32;
            }
        }
        hints
    }

    pub fn is_fixed(&self) -> bool {
        self.max_w != 0 && self.max_h != 0 && self.max_w == self.min_w && self.max_h == self.min_h
    }

    /// Aspect, increment and min/max adjustment of a requested size. The result
    /// never exceeds the request.
    pub fn constrain(&self, w: i32, h: i32) -> (i32, i32) {
        let base_is_min = self.base_w == self.min_w && self.base_h == self.min_h;
        let (mut cw, mut ch) = (w, h);
        if !base_is_min {
            cw -= self.base_w;
            ch -= self.base_h;
        }
        if self.min_aspect > 0.0 && self.max_aspect > 0.0 {
            if self.max_aspect < w as f32 / h as f32 {
                cw = (ch as f32 * self.max_aspect + 0.5) as i32;
            } else if self.min_aspect < h as f32 / w as f32 {
                ch = (cw as f32 * self.min_aspect + 0.5) as i32;
            }
        }
        if base_is_min {
            cw -= self.base_w;
            ch -= self.base_h;
        }
        if self.inc_w > 0 {
            cw -= cw % self.inc_w;
        }
        if self.inc_h > 0 {
            ch -= ch % self.inc_h;
        }
        cw = (cw + self.base_w).max(self.min_w);
        ch = (ch + self.base_h).max(self.min_h);
        if self.max_w > 0 {
            cw = cw.min(self.max_w);
        }
        if self.max_h > 0 {
            ch = ch.min(self.max_h);
        }
        (cw.min(w), ch.min(h))
    }
}

/// Environment a resize is resolved against.
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    /// Whole X screen size.
    pub screen_w: i32,
    pub screen_h: i32,
    /// Window area of the owning monitor.
    pub area: Rect,
    pub bar_height: i32,
    /// Whether size hints take part in this resize.
    pub honor_hints: bool,
}

/// Resolve a requested geometry for a window currently at `current`/`current_bw`.
///
/// Interactive requests may leave the window partly off-screen, programmatic
/// ones keep at least an edge inside the monitor's window area. Returns the
/// adjusted rectangle and whether it differs from the current geometry.
pub fn apply_size_hints(
    current: Rect,
    current_bw: i32,
    request: Rect,
    bw: i32,
    hints: &SizeHints,
    bounds: &Bounds,
    interactive: bool,
) -> (Rect, bool) {
    let mut r = request;
    r.w = r.w.max(1);
    r.h = r.h.max(1);

    let outer_w = current.w + 2 * current_bw;
    let outer_h = current.h + 2 * current_bw;
    if interactive {
        if r.x > bounds.screen_w {
            r.x = bounds.screen_w - outer_w;
        }
        if r.y > bounds.screen_h {
            r.y = bounds.screen_h - outer_h;
        }
        if r.x + r.w + 2 * bw < 0 {
            r.x = 0;
        }
        if r.y + r.h + 2 * bw < 0 {
            r.y = 0;
        }
    } else {
        let area = bounds.area;
        if r.x >= area.right() {
            r.x = area.right() - outer_w;
        }
        if r.y >= area.bottom() {
            r.y = area.bottom() - outer_h;
        }
        if r.x + r.w + 2 * bw <= area.x {
            r.x = area.x;
        }
        if r.y + r.h + 2 * bw <= area.y {
            r.y = area.y;
        }
    }

    r.h = r.h.max(bounds.bar_height);
    r.w = r.w.max(bounds.bar_height);

    if bounds.honor_hints {
        let (w, h) = hints.constrain(r.w, r.h);
        r.w = w;
        r.h = h;
    }

    (r, r != current || bw != current_bw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(honor_hints: bool) -> Bounds {
        Bounds {
            screen_w: 1920,
            screen_h: 1080,
            area: Rect::new(0, 20, 1920, 1060),
            bar_height: 20,
            honor_hints,
        }
    }

    #[test]
    fn test_unchanged_request_reports_no_change() {
        let cur = Rect::new(10, 30, 400, 300);
        let (r, changed) =
            apply_size_hints(cur, 2, cur, 2, &SizeHints::default(), &bounds(true), false);
        assert_eq!(r, cur);
        assert!(!changed);
    }

    #[test]
    fn test_border_change_counts_as_change() {
        let cur = Rect::new(10, 30, 400, 300);
        let (_, changed) =
            apply_size_hints(cur, 2, cur, 0, &SizeHints::default(), &bounds(true), false);
        assert!(changed);
    }

    #[test]
    fn test_programmatic_clamp_pulls_back_inside_area() {
        let cur = Rect::new(0, 20, 100, 100);
        let req = Rect::new(5000, 5000, 100, 100);
        let (r, _) = apply_size_hints(cur, 1, req, 1, &SizeHints::default(), &bounds(false), false);
        assert_eq!(r.x, 1920 - 102);
        assert_eq!(r.y, 1080 - 102);

        let req = Rect::new(-500, -500, 100, 100);
        let (r, _) = apply_size_hints(cur, 1, req, 1, &SizeHints::default(), &bounds(false), false);
        assert_eq!((r.x, r.y), (0, 20));
    }

    #[test]
    fn test_interactive_allows_partial_offscreen() {
        let cur = Rect::new(0, 20, 100, 100);
        let req = Rect::new(-50, -50, 100, 100);
        let (r, _) = apply_size_hints(cur, 1, req, 1, &SizeHints::default(), &bounds(false), true);
        assert_eq!((r.x, r.y), (-50, -50));

        let req = Rect::new(-500, 2000, 100, 100);
        let (r, _) = apply_size_hints(cur, 1, req, 1, &SizeHints::default(), &bounds(false), true);
        assert_eq!((r.x, r.y), (0, 1080 - 102));
    }

    #[test]
    fn test_bar_height_floor() {
        let cur = Rect::new(0, 20, 100, 100);
        let req = Rect::new(0, 20, 0, 5);
        let (r, _) = apply_size_hints(cur, 0, req, 0, &SizeHints::default(), &bounds(false), false);
        assert_eq!((r.w, r.h), (20, 20));
    }

    #[test]
    fn test_increments_subtract_base_first() {
        // base 4x4, min 10x10, inc 10x10: 4 + floor((107 - 4) / 10) * 10 = 104
        let hints = SizeHints {
            base_w: 4,
            base_h: 4,
            min_w: 10,
            min_h: 10,
            inc_w: 10,
            inc_h: 10,
            ..SizeHints::default()
        };
        assert_eq!(hints.constrain(107, 107), (104, 104));
    }

    #[test]
    fn test_increments_when_base_equals_min() {
        let hints = SizeHints {
            base_w: 4,
            base_h: 4,
            min_w: 4,
            min_h: 4,
            inc_w: 10,
            inc_h: 10,
            ..SizeHints::default()
        };
        assert_eq!(hints.constrain(107, 107), (104, 104));
    }

    #[test]
    fn test_max_caps_and_request_only_shrinks() {
        let hints = SizeHints {
            max_w: 300,
            max_h: 200,
            min_w: 250,
            min_h: 150,
            ..SizeHints::default()
        };
        assert_eq!(hints.constrain(500, 500), (300, 200));
        // min larger than the request does not grow the window
        assert_eq!(hints.constrain(100, 100), (100, 100));
    }

    #[test]
    fn test_aspect_limits_width() {
        let hints = SizeHints {
            min_aspect: 0.5,
            max_aspect: 1.0,
            ..SizeHints::default()
        };
        assert_eq!(hints.constrain(400, 200), (200, 200));
        assert_eq!(hints.constrain(100, 400), (100, 50));
    }

    #[test]
    fn test_hints_ignored_when_not_honored() {
        let hints = SizeHints {
            inc_w: 50,
            inc_h: 50,
            ..SizeHints::default()
        };
        let cur = Rect::new(0, 20, 100, 100);
        let req = Rect::new(0, 20, 333, 333);
        let (r, _) = apply_size_hints(cur, 0, req, 0, &hints, &bounds(false), false);
        assert_eq!((r.w, r.h), (333, 333));
        let (r, _) = apply_size_hints(cur, 0, req, 0, &hints, &bounds(true), false);
        assert_eq!((r.w, r.h), (300, 300));
    }

    #[test]
    fn test_decode_normal_hints() {
        let mut words = [0u32; 18];
        words[0] = P_MIN_SIZE | P_MAX_SIZE | P_RESIZE_INC;
        words[5] = 100;
        words[6] = 50;
        words[7] = 100;
        words[8] = 50;
        words[9] = 7;
        words[10] = 13;
        let hints = SizeHints::from_wm_normal_hints(&words);
        assert_eq!((hints.min_w, hints.min_h), (100, 50));
        assert_eq!((hints.base_w, hints.base_h), (100, 50));
        assert_eq!((hints.inc_w, hints.inc_h), (7, 13));
        assert!(hints.is_fixed());
        assert_eq!(SizeHints::from_wm_normal_hints(&[1, 2]), SizeHints::default());
    }

    #[test]
    fn test_intersection_area() {
        let a = Rect::new(0, 0, 100, 100);
        assert_eq!(a.intersection_area(&Rect::new(50, 50, 100, 100)), 2500);
        assert_eq!(a.intersection_area(&Rect::new(200, 0, 10, 10)), 0);
    }
}
