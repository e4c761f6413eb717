//! Monitor discovery, bars and moving windows between monitors.

use tracing::{debug, info};
use x11rb::protocol::xproto::Window;

use crate::window::attach;
use crate::window::backend::Backend;
use crate::window::geometry::Rect;
use crate::window::manager::WindowManager;
use crate::window::monitor::Monitor;

/// Drop outputs that duplicate an earlier one, e.g. mirrored displays.
fn unique_geometries(geometries: Vec<Rect>) -> Vec<Rect> {
    let mut unique: Vec<Rect> = Vec::with_capacity(geometries.len());
    for g in geometries {
        if !unique.contains(&g) {
            unique.push(g);
        }
    }
    unique
}

impl<B: Backend> WindowManager<B> {
    /// Sync monitors with the current outputs. Returns whether anything changed.
    pub(crate) fn update_geometry(&mut self) -> bool {
        let mut geometries = unique_geometries(self.backend.monitor_geometries());
        if geometries.is_empty() {
            geometries.push(Rect::new(0, 0, self.screen.0, self.screen.1));
        }
        let bar_height = self.settings.bar_height;
        let mut dirty = false;

        while self.monitors.len() < geometries.len() {
            let num = self.monitors.len();
            self.monitors.push(Monitor::new(num, &self.settings));
            dirty = true;
        }

        while self.monitors.len() > geometries.len() {
            let Some(removed) = self.monitors.pop() else {
                break;
            };
            debug!("Monitor {} removed, moving {} window(s)", removed.num, removed.clients.len());
            for &window in &removed.clients {
                if let Some(c) = self.clients.get_mut(&window) {
                    c.monitor = 0;
                }
                self.attach(0, window);
                attach::attach_stack(&mut self.monitors[0].stack, window, None);
            }
            if let Some(bar) = removed.bar {
                self.backend.destroy_window(bar);
            }
            if self.selmon >= self.monitors.len() {
                self.selmon = 0;
            }
            dirty = true;
        }

        for (i, geometry) in geometries.into_iter().enumerate() {
            let m = &mut self.monitors[i];
            if m.screen != geometry {
                m.num = i;
                m.screen = geometry;
                m.update_bar_pos(bar_height);
                dirty = true;
            }
        }

        if dirty {
            self.selmon = self.win_to_mon(self.backend.root());
            info!("Monitor layout: {:?}", self.monitors.iter().map(|m| m.screen).collect::<Vec<_>>());
        }
        dirty
    }

    /// Create missing bar windows.
    pub(crate) fn update_bars(&mut self) {
        let bar_height = self.settings.bar_height;
        for m in 0..self.monitors.len() {
            if self.monitors[m].bar.is_some() {
                continue;
            }
            let rect = self.monitors[m].bar_rect(bar_height);
            self.monitors[m].bar = self.backend.create_bar(rect);
        }
        self.update_systray();
    }

    /// Move a monitor's bar to its current row.
    pub(crate) fn place_bar(&mut self, m: usize) {
        let Some(mon) = self.monitors.get(m) else {
            return;
        };
        if let Some(bar) = mon.bar {
            let rect = mon.bar_rect(self.settings.bar_height);
            self.backend.move_resize(bar, rect);
        }
    }

    /// Recompute a monitor's window area after its bar was shown or hidden.
    pub(crate) fn bar_toggled(&mut self, m: usize) {
        let bar_height = self.settings.bar_height;
        if let Some(mon) = self.monitors.get_mut(m) {
            mon.update_bar_pos(bar_height);
        }
        self.place_bar(m);
        self.update_systray();
    }

    /// Dock the tray on the selected monitor's bar.
    pub(crate) fn update_systray(&mut self) {
        let Some(mon) = self.monitors.get(self.selmon) else {
            return;
        };
        let rect = mon.bar_rect(self.settings.bar_height);
        let visible = self.settings.show_systray && mon.show_bar;
        self.backend.update_systray(rect, visible);
    }

    /// Monitor with the largest overlap, or the selected one.
    pub(crate) fn rect_to_mon(&self, rect: Rect) -> usize {
        let mut best = self.selmon;
        let mut best_area = 0;
        for (i, m) in self.monitors.iter().enumerate() {
            let area = m.area.intersection_area(&rect);
            if area > best_area {
                best_area = area;
                best = i;
            }
        }
        best
    }

    pub(crate) fn win_to_mon(&mut self, window: Window) -> usize {
        if window == self.backend.root() {
            if let Some((x, y)) = self.backend.pointer_position() {
                return self.rect_to_mon(Rect::new(x, y, 1, 1));
            }
        }
        if let Some(m) = self.monitors.iter().position(|m| m.bar == Some(window)) {
            return m;
        }
        self.clients.get(&window).map_or(self.selmon, |c| c.monitor)
    }

    /// Next (`dir > 0`) or previous monitor, wrapping.
    pub(crate) fn dir_to_mon(&self, dir: i32) -> usize {
        let n = self.monitors.len();
        if n == 0 {
            return 0;
        }
        if dir > 0 {
            (self.selmon + 1) % n
        } else {
            (self.selmon + n - 1) % n
        }
    }

    /// Move `window` to monitor `target`, adopting its active tags.
    pub(crate) fn send_mon(&mut self, window: Window, target: usize) {
        let Some(current) = self.clients.get(&window).map(|c| c.monitor) else {
            return;
        };
        if current == target || target >= self.monitors.len() {
            return;
        }
        self.unfocus(window, true);
        self.detach(window);
        let tags = self.monitors[target].active_tags();
        if let Some(c) = self.clients.get_mut(&window) {
            c.monitor = target;
            c.tags = tags;
        }
        self.attach(target, window);
        attach::attach_stack(&mut self.monitors[target].stack, window, None);
        self.focus(None);
        self.arrange(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::testing::{manager, manager_on};

    #[test]
    fn test_duplicate_outputs_collapse() {
        let a = Rect::new(0, 0, 800, 600);
        let b = Rect::new(800, 0, 800, 600);
        assert_eq!(unique_geometries(vec![a, a, b, a]), vec![a, b]);
    }

    #[test]
    fn test_single_monitor_without_outputs() {
        let wm = manager();
        assert_eq!(wm.monitors.len(), 1);
        assert_eq!(wm.monitors[0].screen, Rect::new(0, 0, 1024, 768));
        assert!(wm.monitors[0].bar.is_some());
    }

    #[test]
    fn test_send_mon_adopts_target_tags() {
        let mut wm = manager_on(vec![Rect::new(0, 0, 800, 600), Rect::new(800, 0, 800, 600)]);
        assert_eq!(wm.monitors.len(), 2);
        wm.monitors[1].tagset = [0b100, 0b100];
        let w = wm.backend.add_window(Rect::new(10, 30, 300, 200));
        wm.map_request(w);
        assert_eq!(wm.clients[&w].monitor, 0);

        wm.send_mon(w, 1);
        let c = &wm.clients[&w];
        assert_eq!(c.monitor, 1);
        assert_eq!(c.tags, 0b100);
        assert!(wm.monitors[0].clients.is_empty());
        assert_eq!(wm.monitors[1].clients, vec![w]);
    }

    #[test]
    fn test_removed_monitor_hands_windows_to_first() {
        let mut wm = manager_on(vec![Rect::new(0, 0, 800, 600), Rect::new(800, 0, 800, 600)]);
        let w = wm.backend.add_window(Rect::new(10, 30, 300, 200));
        wm.map_request(w);
        wm.send_mon(w, 1);
        wm.selmon = 1;

        wm.backend.monitors = vec![Rect::new(0, 0, 800, 600)];
        assert!(wm.update_geometry());
        assert_eq!(wm.monitors.len(), 1);
        assert_eq!(wm.selmon, 0);
        assert_eq!(wm.clients[&w].monitor, 0);
        assert_eq!(wm.monitors[0].clients, vec![w]);
    }

    #[test]
    fn test_rect_to_mon_prefers_largest_overlap() {
        let wm = manager_on(vec![Rect::new(0, 0, 800, 600), Rect::new(800, 0, 800, 600)]);
        assert_eq!(wm.rect_to_mon(Rect::new(700, 100, 300, 100)), 1);
        assert_eq!(wm.rect_to_mon(Rect::new(5000, 5000, 10, 10)), wm.selmon);
        assert_eq!(wm.dir_to_mon(1), 1);
        assert_eq!(wm.dir_to_mon(-1), 1);
    }
}
