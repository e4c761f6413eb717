//! Pointer-driven and keyboard-driven moving and resizing of windows.

use tracing::debug;
use x11rb::protocol::xproto::Window;

use crate::window::backend::{Backend, CursorKind};
use crate::window::error::WmResult;
use crate::window::events::WmEvent;
use crate::window::geometry::Rect;
use crate::window::manager::WindowManager;

/// Motion events closer together than this (ms) are dropped while dragging.
const MOTION_INTERVAL_MS: u32 = 1000 / 60;

/// One `move_resize` component: an amount and whether it is absolute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delta {
    pub value: i32,
    pub absolute: bool,
}

/// Parse `"dx dy dw dh"`, each a number followed by a letter. An uppercase
/// letter makes that component absolute.
pub fn parse_move_resize(spec: &str) -> Option<[Delta; 4]> {
    let mut out = [Delta { value: 0, absolute: false }; 4];
    let mut parts = spec.split_whitespace();
    for slot in &mut out {
        let token = parts.next()?;
        let suffix = token.chars().last()?;
        let number = &token[..token.len() - suffix.len_utf8()];
        slot.value = number.parse().ok()?;
        slot.absolute = suffix.is_ascii_uppercase();
    }
    Some(out)
}

fn snap_to(value: i32, edge: i32, snap: i32) -> Option<i32> {
    ((edge - value).abs() < snap).then_some(edge)
}

impl<B: Backend> WindowManager<B> {
    /// Pull the next event for a drag loop, servicing what must not wait.
    fn next_drag_event(&mut self) -> WmResult<Option<WmEvent>> {
        let event = self.backend.next_event()?;
        match event {
            WmEvent::ConfigureRequest(_) | WmEvent::Expose { .. } | WmEvent::MapRequest { .. } => {
                self.handle_event(event)?;
                Ok(None)
            }
            WmEvent::MotionNotify { .. } | WmEvent::ButtonRelease { .. } => Ok(Some(event)),
            other => {
                self.deferred.push_back(other);
                Ok(None)
            }
        }
    }

    /// Switch to the tiled window to float once it is dragged beyond the snap distance.
    fn float_if_dragged(&mut self, window: Window, dx: i32, dy: i32) {
        let m = self.selmon;
        let snap = self.settings.snap;
        let tiled = self.clients.get(&window).map_or(false, |c| !c.is_floating);
        if tiled && self.arranged(m) && (dx.abs() > snap || dy.abs() > snap) {
            self.toggle_floating();
        }
    }

    fn follows_pointer(&self, window: Window) -> bool {
        !self.arranged(self.selmon) || self.clients.get(&window).map_or(false, |c| c.is_floating)
    }

    /// Hand the window to whichever monitor it ended up on.
    fn settle_monitor(&mut self, window: Window) {
        let Some(rect) = self.clients.get(&window).map(|c| c.rect) else {
            return;
        };
        let m = self.rect_to_mon(rect);
        if m != self.selmon {
            self.send_mon(window, m);
            self.selmon = m;
            self.focus(None);
        }
    }

    pub(crate) fn move_mouse(&mut self) -> WmResult<()> {
        let Some(window) = self.selected() else {
            return Ok(());
        };
        if self.clients.get(&window).map_or(true, |c| c.is_active_fullscreen) {
            return Ok(());
        }
        self.restack(self.selmon);
        let Some(origin) = self.clients.get(&window).map(|c| c.rect) else {
            return Ok(());
        };
        if !self.backend.grab_pointer(CursorKind::Move) {
            return Ok(());
        }
        let Some((px, py)) = self.backend.pointer_position() else {
            self.backend.ungrab_pointer();
            return Ok(());
        };

        let snap = self.settings.snap;
        let mut last = 0u32;
        loop {
            match self.next_drag_event()? {
                Some(WmEvent::MotionNotify { root_x, root_y, time, .. }) => {
                    if time.wrapping_sub(last) <= MOTION_INTERVAL_MS {
                        continue;
                    }
                    last = time;
                    let Some(c) = self.clients.get(&window) else {
                        break;
                    };
                    let area = self.monitors[self.selmon].area;
                    let (w, h) = (c.outer_width(), c.outer_height());
                    let mut nx = origin.x + (root_x - px);
                    let mut ny = origin.y + (root_y - py);
                    nx = snap_to(nx, area.x, snap)
                        .or_else(|| snap_to(nx + w, area.right(), snap).map(|edge| edge - w))
                        .unwrap_or(nx);
                    ny = snap_to(ny, area.y, snap)
                        .or_else(|| snap_to(ny + h, area.bottom(), snap).map(|edge| edge - h))
                        .unwrap_or(ny);
                    let current = c.rect;
                    self.float_if_dragged(window, nx - current.x, ny - current.y);
                    if self.follows_pointer(window) {
                        if let Some(c) = self.clients.get(&window) {
                            let (rect, bw) = (Rect::new(nx, ny, c.rect.w, c.rect.h), c.bw);
                            self.resize(window, rect, bw, true);
                        }
                    }
                }
                Some(WmEvent::ButtonRelease { .. }) => break,
                _ => {}
            }
        }
        self.backend.ungrab_pointer();
        self.settle_monitor(window);
        Ok(())
    }

    pub(crate) fn resize_mouse(&mut self) -> WmResult<()> {
        let Some(window) = self.selected() else {
            return Ok(());
        };
        if self.clients.get(&window).map_or(true, |c| c.is_active_fullscreen) {
            return Ok(());
        }
        self.restack(self.selmon);
        let Some(c) = self.clients.get(&window) else {
            return Ok(());
        };
        let (origin, bw) = (c.rect, c.bw);
        if !self.backend.grab_pointer(CursorKind::Resize) {
            return Ok(());
        }
        let Some((qx, qy)) = self.backend.pointer_in_window(window) else {
            self.backend.ungrab_pointer();
            return Ok(());
        };
        // Grab the corner nearest the pointer.
        let left = qx < origin.w / 2;
        let top = qy < origin.h / 2;
        let corner = |r: Rect| {
            (
                if left { -bw } else { r.w + bw - 1 },
                if top { -bw } else { r.h + bw - 1 },
            )
        };
        let (wx, wy) = corner(origin);
        self.backend.warp_pointer(Some(window), wx, wy);

        let (right, bottom) = (origin.x + origin.w, origin.y + origin.h);
        let mut last = 0u32;
        loop {
            match self.next_drag_event()? {
                Some(WmEvent::MotionNotify { root_x, root_y, time, .. }) => {
                    if time.wrapping_sub(last) <= MOTION_INTERVAL_MS {
                        continue;
                    }
                    last = time;
                    let Some(c) = self.clients.get(&window) else {
                        break;
                    };
                    let current = c.rect;
                    let bw = c.bw;
                    let nx = if left { root_x } else { current.x };
                    let ny = if top { root_y } else { current.y };
                    let nw = if left { right - nx } else { root_x - origin.x - 2 * bw + 1 }.max(1);
                    let nh = if top { bottom - ny } else { root_y - origin.y - 2 * bw + 1 }.max(1);

                    let own = self.monitors[c.monitor].area;
                    let sel_area = self.monitors[self.selmon].area;
                    if own.x + nw >= sel_area.x
                        && own.x + nw <= sel_area.right()
                        && own.y + nh >= sel_area.y
                        && own.y + nh <= sel_area.bottom()
                    {
                        self.float_if_dragged(window, nw - current.w, nh - current.h);
                    }
                    if self.follows_pointer(window) {
                        let bw = self.clients.get(&window).map_or(bw, |c| c.bw);
                        self.resize(window, Rect::new(nx, ny, nw, nh), bw, true);
                    }
                }
                Some(WmEvent::ButtonRelease { .. }) => break,
                _ => {}
            }
        }
        if let Some(rect) = self.clients.get(&window).map(|c| c.rect) {
            let (wx, wy) = corner(rect);
            self.backend.warp_pointer(Some(window), wx, wy);
        }
        self.backend.ungrab_pointer();
        self.backend.discard_enter_events();
        self.settle_monitor(window);
        Ok(())
    }

    /// Nudge or place the selected floating window from a `"dx dy dw dh"` string.
    pub(crate) fn move_resize(&mut self, spec: &str) {
        let Some(deltas) = parse_move_resize(spec) else {
            debug!("Ignoring malformed move/resize '{}'", spec);
            return;
        };
        let Some(window) = self.selected() else {
            return;
        };
        let arranged = self.arranged(self.selmon);
        let Some(c) = self.clients.get(&window) else {
            return;
        };
        if arranged && !c.is_floating {
            return;
        }
        let Some(mon) = self.monitors.get(c.monitor) else {
            return;
        };
        let (old, bw, screen) = (c.rect, c.bw, mon.screen);
        let [dx, dy, dw, dh] = deltas;

        let nw = if dw.absolute { dw.value.min(screen.w - 2 * bw) } else { old.w + dw.value };
        let nh = if dh.absolute { dh.value.min(screen.h - 2 * bw) } else { old.h + dh.value };
        let place = |d: Delta, origin: i32, start: i32, span: i32, size: i32| {
            if !d.absolute {
                origin + d.value
            } else if d.value < start {
                start
            } else if d.value > start + span {
                start + span - size - 2 * bw
            } else {
                d.value
            }
        };
        let nx = place(dx, old.x, screen.x, screen.w, nw);
        let ny = place(dy, old.y, screen.y, screen.h, nh);

        let pointer = self.backend.pointer_position();
        self.backend.raise(window);
        self.resize(window, Rect::new(nx, ny, nw, nh), bw, true);

        let Some(new) = self.clients.get(&window).map(|c| c.rect) else {
            return;
        };
        if let Some((px, py)) = pointer {
            if old.contains(px, py) {
                self.backend
                    .warp_pointer(None, new.x - old.x + new.w - old.w, new.y - old.y + new.h - old.h);
            }
        }
    }

    /// Push the selected floating window against a monitor edge (`t`, `b`, `l`, `r`)
    /// or grow it to that edge (`T`, `B`, `L`, `R`).
    pub(crate) fn move_resize_edge(&mut self, edge: char) {
        let Some(window) = self.selected() else {
            return;
        };
        let arranged = self.arranged(self.selmon);
        let Some(c) = self.clients.get(&window) else {
            return;
        };
        if arranged && !c.is_floating {
            return;
        }
        let Some(mon) = self.monitors.get(c.monitor) else {
            return;
        };
        let bh = self.settings.bar_height;
        let top_bar = if mon.show_bar && mon.top_bar { bh } else { 0 };
        let bottom_bar = if mon.show_bar && !mon.top_bar { bh } else { 0 };
        let screen = mon.screen;
        let (old, bw) = (c.rect, c.bw);
        let (mut nx, mut ny, mut nw, mut nh) = (old.x, old.y, old.w, old.h);

        match edge {
            't' => ny = screen.y + top_bar,
            'b' => {
                ny = if old.h > screen.h - 2 * bw {
                    screen.y + old.h - bottom_bar
                } else {
                    screen.y + screen.h - old.h - 2 * bw - bottom_bar
                }
            }
            'l' => nx = screen.x,
            'r' => {
                nx = if old.w > screen.w - 2 * bw {
                    screen.x + old.w
                } else {
                    screen.x + screen.w - old.w - 2 * bw
                }
            }
            'T' => {
                nh = old.h + old.y - screen.y - top_bar;
                ny = screen.y + top_bar;
            }
            'B' => nh = screen.y + screen.h - old.y - 2 * bw - bottom_bar,
            'L' => {
                nw = old.w + old.x - screen.x;
                nx = screen.x;
            }
            'R' => nw = screen.x + screen.w - old.x - 2 * bw,
            _ => {
                debug!("Unknown edge '{}'", edge);
                return;
            }
        }

        let pointer = self.backend.pointer_position();
        self.backend.raise(window);
        self.resize(window, Rect::new(nx, ny, nw, nh), bw, true);

        let Some(new) = self.clients.get(&window).map(|c| c.rect) else {
            return;
        };
        if let Some((px, py)) = pointer {
            if old.contains(px, py) {
                self.backend
                    .warp_pointer(None, new.x - old.x + new.w - old.w, new.y - old.y + new.h - old.h);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::testing::manager;

    #[test]
    fn test_parse_move_resize() {
        let d = parse_move_resize("25x -10y 0w 100H").unwrap();
        assert_eq!(d[0], Delta { value: 25, absolute: false });
        assert_eq!(d[1], Delta { value: -10, absolute: false });
        assert_eq!(d[3], Delta { value: 100, absolute: true });
        assert!(parse_move_resize("25x 0y 0w").is_none());
        assert!(parse_move_resize("ax 0y 0w 0h").is_none());
        assert!(parse_move_resize("x 0y 0w 0h").is_none());
    }

    fn floating_window() -> (WindowManager<crate::window::testing::FakeBackend>, Window) {
        let mut wm = manager();
        let w = wm.backend.add_window(Rect::new(100, 100, 300, 200));
        wm.map_request(w);
        wm.toggle_floating();
        wm.resize(w, Rect::new(100, 100, 300, 200), wm.settings.border_px, false);
        (wm, w)
    }

    #[test]
    fn test_move_resize_relative_and_absolute() {
        let (mut wm, w) = floating_window();
        wm.move_resize("20x 10y 5w 0h");
        assert_eq!(wm.clients[&w].rect, Rect::new(120, 110, 305, 200));

        wm.move_resize("0X 0y 0w 0h");
        assert_eq!(wm.clients[&w].rect.x, 0);

        // absolute width is capped to the monitor
        wm.move_resize("0x 0y 5000W 0h");
        assert_eq!(wm.clients[&w].rect.w, 1024 - 2 * wm.settings.border_px);
    }

    #[test]
    fn test_move_resize_ignores_tiled() {
        let mut wm = manager();
        let w = wm.backend.add_window(Rect::new(100, 100, 300, 200));
        wm.map_request(w);
        let before = wm.clients[&w].rect;
        wm.move_resize("20x 10y 5w 0h");
        assert_eq!(wm.clients[&w].rect, before);
    }

    #[test]
    fn test_move_resize_warps_pointer_inside() {
        let (mut wm, _) = floating_window();
        wm.backend.pointer = (150, 150);
        wm.move_resize("20x 10y 0w 0h");
        assert_eq!(wm.backend.warps.last(), Some(&(None, 20, 10)));
    }

    #[test]
    fn test_edges() {
        let (mut wm, w) = floating_window();
        let bw = wm.settings.border_px;
        wm.move_resize_edge('t');
        assert_eq!(wm.clients[&w].rect.y, 20);
        wm.move_resize_edge('r');
        assert_eq!(wm.clients[&w].rect.x, 1024 - 300 - 2 * bw);
        wm.move_resize_edge('L');
        let c = &wm.clients[&w];
        assert_eq!((c.rect.x, c.rect.w), (0, 1024 - 2 * bw));
        wm.move_resize_edge('B');
        assert_eq!(wm.clients[&w].rect.h, 768 - 20 - 2 * bw);
    }

    #[test]
    fn test_drag_moves_floating_window() {
        let (mut wm, w) = floating_window();
        wm.backend.pointer = (110, 110);
        wm.backend.events.extend([
            WmEvent::MotionNotify { window: 1, root_x: 160, root_y: 190, time: 100 },
            WmEvent::FocusIn { window: w },
            WmEvent::ButtonRelease { window: 1, button: 1 },
        ]);
        wm.move_mouse().unwrap();
        assert_eq!(wm.clients[&w].rect.x, 150);
        assert_eq!(wm.clients[&w].rect.y, 180);
        assert_eq!(wm.deferred.len(), 1);
        assert!(!wm.backend.pointer_grabbed);
    }

    #[test]
    fn test_drag_floats_tiled_window() {
        let mut wm = manager();
        let w = wm.backend.add_window(Rect::new(100, 100, 300, 200));
        wm.map_request(w);
        wm.backend.pointer = (500, 500);
        wm.backend.events.extend([
            WmEvent::MotionNotify { window: 1, root_x: 600, root_y: 600, time: 100 },
            WmEvent::ButtonRelease { window: 1, button: 1 },
        ]);
        wm.move_mouse().unwrap();
        assert!(wm.clients[&w].is_floating);
    }
}
