use tagwm_config::{
    Action, SWITCHTAG_TAG, SWITCHTAG_TOGGLETAG, SWITCHTAG_TOGGLEVIEW, SWITCHTAG_VIEW,
};
use tracing::{debug, warn};
use x11rb::protocol::xproto::Window;

use crate::window::backend::Backend;
use crate::window::error::WmResult;
use crate::window::geometry::Rect;
use crate::window::layout::rotate_axis;
use crate::window::manager::WindowManager;
use crate::window::tags::switch_tag_mask;

const MFACT_MIN: f32 = 0.05;
const MFACT_MAX: f32 = 0.95;
const CFACT_MIN: f32 = 0.25;
const CFACT_MAX: f32 = 4.0;
const GAP_MAX: i32 = 50;

impl<B: Backend> WindowManager<B> {
    pub(crate) fn run_action(&mut self, action: &Action) -> WmResult<()> {
        debug!("action {:?}", action);
        match action {
            Action::Spawn(command) => self.spawn(command),
            Action::RunOrRaise { class, command } => self.run_or_raise(class, command),
            Action::ToggleScratch { key, command } => self.toggle_scratch(*key, command),
            Action::Quit => self.quit(),
            Action::KillClient => {
                if let Some(sel) = self.selected() {
                    self.kill(sel);
                }
            }
            Action::FocusStack(dir) => self.focus_stack(*dir),
            Action::FocusMon(dir) => self.focus_mon(*dir),
            Action::TagMon(dir) => {
                if let Some(sel) = self.selected() {
                    if self.monitors.len() > 1 {
                        let target = self.dir_to_mon(*dir);
                        self.send_mon(sel, target);
                    }
                }
            }
            Action::Zoom => self.zoom(),
            Action::PushUp => self.push_up(),
            Action::PushDown => self.push_down(),
            Action::Transfer => self.transfer(),
            Action::InPlaceRotate(dir) => self.in_place_rotate(*dir),
            Action::SwitchCol => self.switch_col(),
            Action::IncNmaster(delta) => self.inc_nmaster(*delta),
            Action::SetMfact(f) => self.set_mfact(*f),
            Action::SetCfact(f) => self.set_cfact(*f),
            Action::SetGaps(delta) => self.set_gaps(*delta),
            Action::SetLayout(index) => self.set_layout(Some(*index)),
            Action::ToggleLayout => self.set_layout(None),
            Action::RotateLayoutAxis(index) => {
                if self.arranged(self.selmon) && *index <= 2 {
                    let m = self.selmon;
                    let axes = rotate_axis(self.monitors[m].axes, *index);
                    self.monitors[m].set_axes(axes);
                    self.arrange(Some(m));
                }
            }
            Action::MirrorLayout => {
                if self.arranged(self.selmon) {
                    let m = self.selmon;
                    let mut axes = self.monitors[m].axes;
                    axes[0] = -axes[0];
                    self.monitors[m].set_axes(axes);
                    self.arrange(Some(m));
                }
            }
            Action::ToggleBar => {
                let m = self.selmon;
                self.monitors[m].toggle_show_bar();
                self.bar_toggled(m);
                self.arrange(Some(m));
            }
            Action::ToggleFloating => self.toggle_floating(),
            Action::ToggleFullscreen => {
                if let Some(sel) = self.selected() {
                    let on = self.clients.get(&sel).map_or(false, |c| !c.is_active_fullscreen);
                    self.set_active_fullscreen(sel, on);
                }
            }
            Action::MoveResize(spec) => self.move_resize(spec),
            Action::MoveResizeEdge(edge) => self.move_resize_edge(*edge),
            Action::MoveMouse => return self.move_mouse(),
            Action::ResizeMouse => return self.resize_mouse(),
            Action::View(mask) => self.view(*mask),
            Action::ToggleView(mask) => self.toggle_view(*mask),
            Action::Tag(mask) => self.tag(*mask),
            Action::ToggleTag(mask) => self.toggle_tag(*mask),
            Action::SwitchTag(flags) => self.switch_tag(*flags),
        }
        Ok(())
    }

    fn spawn(&mut self, command: &[String]) {
        if self.backend.spawn(command).is_none() {
            warn!("Could not start {:?}", command);
        }
    }

    fn run_or_raise(&mut self, class: &str, command: &[String]) {
        let found = self
            .monitors
            .iter()
            .flat_map(|m| m.clients.iter())
            .filter_map(|w| self.clients.get(w))
            .find(|c| c.class == class)
            .map(|c| (c.window, c.tags));
        match found {
            Some((window, tags)) => {
                self.view(tags);
                self.focus(Some(window));
                self.backend.raise(window);
            }
            None => self.spawn(command),
        }
    }

    fn toggle_scratch(&mut self, key: char, command: &[String]) {
        let m = self.selmon;
        let found = self.monitors[m]
            .clients
            .iter()
            .copied()
            .find(|w| self.clients.get(w).map_or(false, |c| c.scratch_key == Some(key)));
        let Some(window) = found else {
            self.spawn(command);
            return;
        };
        let visible = self.is_visible(window);
        let active = self.monitors[m].active_tags();
        if let Some(c) = self.clients.get_mut(&window) {
            c.tags = if visible { 0 } else { active };
        }
        self.focus(None);
        self.arrange(Some(m));
        if self.is_visible(window) {
            self.focus(Some(window));
            self.restack(m);
        }
    }

    pub(crate) fn view(&mut self, mask: u32) {
        let m = self.selmon;
        let tag_mask = self.settings.tag_mask();
        let Some(bar_changed) = self.monitors.get_mut(m).and_then(|mon| mon.view(mask, tag_mask)) else {
            return;
        };
        if bar_changed {
            self.bar_toggled(m);
        }
        self.focus(None);
        self.arrange(Some(m));
    }

    pub(crate) fn toggle_view(&mut self, mask: u32) {
        let m = self.selmon;
        let tag_mask = self.settings.tag_mask();
        let selected = self.selected();

        // Keep the current masters at the head of the registry.
        let nmaster = self.monitors[m].nmaster.max(0) as usize;
        let masters: Vec<Window> = self.tiled(m).into_iter().take(nmaster).collect();
        let clients = &mut self.monitors[m].clients;
        clients.retain(|w| !masters.contains(w));
        for (i, w) in masters.iter().enumerate() {
            clients.insert(i, *w);
        }
        if selected.is_some() {
            self.focus(selected);
        }

        let Some(bar_changed) = self.monitors[m].toggle_view(mask, tag_mask) else {
            return;
        };
        if bar_changed {
            self.bar_toggled(m);
        }
        self.focus(None);
        self.arrange(Some(m));
    }

    pub(crate) fn tag(&mut self, mask: u32) {
        let mask = mask & self.settings.tag_mask();
        let Some(sel) = self.selected() else {
            return;
        };
        if mask == 0 {
            return;
        }
        if let Some(c) = self.clients.get_mut(&sel) {
            c.tags = mask;
        }
        self.focus(None);
        self.arrange(Some(self.selmon));
    }

    pub(crate) fn toggle_tag(&mut self, mask: u32) {
        let Some(sel) = self.selected() else {
            return;
        };
        let tag_mask = self.settings.tag_mask();
        let Some(c) = self.clients.get_mut(&sel) else {
            return;
        };
        let tags = c.tags ^ (mask & tag_mask);
        if tags == 0 {
            return;
        }
        c.tags = tags;
        self.focus(None);
        self.arrange(Some(self.selmon));
    }

    fn switch_tag(&mut self, flags: u32) {
        let active = self.monitors[self.selmon].active_tags();
        let mask = switch_tag_mask(active, self.settings.tags.len(), self.settings.tag_rows, flags);
        if flags & SWITCHTAG_TOGGLETAG != 0 {
            self.toggle_tag(mask);
        }
        if flags & SWITCHTAG_TAG != 0 {
            self.tag(mask);
        }
        if flags & SWITCHTAG_VIEW != 0 {
            self.view(mask);
        }
        if flags & SWITCHTAG_TOGGLEVIEW != 0 {
            self.toggle_view(mask);
        }
    }

    fn focus_stack(&mut self, dir: i32) {
        let m = self.selmon;
        let Some(sel) = self.selected() else {
            return;
        };
        let visible: Vec<Window> = self.monitors[m]
            .clients
            .iter()
            .copied()
            .filter(|w| self.is_visible(*w))
            .collect();
        let Some(pos) = visible.iter().position(|w| *w == sel) else {
            return;
        };
        let n = visible.len();
        let next = if dir > 0 {
            visible[(pos + 1) % n]
        } else {
            visible[(pos + n - 1) % n]
        };
        self.focus(Some(next));
        self.restack(m);
    }

    fn focus_mon(&mut self, dir: i32) {
        if self.monitors.len() < 2 {
            return;
        }
        let m = self.dir_to_mon(dir);
        if m == self.selmon {
            return;
        }
        if let Some(sel) = self.selected() {
            self.unfocus(sel, false);
        }
        self.selmon = m;
        self.focus(None);
    }

    /// Registry neighbour of `window` that comes before it.
    fn find_before(&self, window: Window) -> Option<Window> {
        let clients = &self.monitors[self.selmon].clients;
        let pos = clients.iter().position(|w| *w == window)?;
        pos.checked_sub(1).map(|p| clients[p])
    }

    /// First visible tiled window after `window` in the registry.
    fn next_tiled_after(&self, window: Window) -> Option<Window> {
        let m = self.selmon;
        let clients = &self.monitors[m].clients;
        let pos = clients.iter().position(|w| *w == window)?;
        let tiled = self.tiled(m);
        clients[pos + 1..].iter().copied().find(|w| tiled.contains(w))
    }

    /// Swap the selection with the master. Zooming the master brings back the
    /// window it displaced last time.
    fn zoom(&mut self) {
        let m = self.selmon;
        let Some(sel) = self.selected() else {
            return;
        };
        if !self.arranged(m) || self.clients.get(&sel).map_or(true, |c| c.is_floating) {
            return;
        }
        let head = self.tiled(m).first().copied();
        let mut c = sel;
        let mut at = None;

        if Some(c) == head {
            at = self.prevzoom.and_then(|p| self.find_before(p));
            let previous = at.and_then(|a| self.next_tiled_after(a));
            if previous.is_none() || previous != self.prevzoom {
                self.prevzoom = None;
                match self.next_tiled_after(c) {
                    Some(next) => c = next,
                    None => return,
                }
            } else if let Some(previous) = previous {
                c = previous;
            }
        }

        if Some(c) != head && at.is_none() {
            at = self.find_before(c);
        }
        let clients = &mut self.monitors[m].clients;
        clients.retain(|w| *w != c);
        clients.insert(0, c);
        if Some(c) != head {
            if let (Some(at), Some(head)) = (at, head) {
                self.prevzoom = Some(head);
                if at != head {
                    let clients = &mut self.monitors[m].clients;
                    clients.retain(|w| *w != head);
                    let index = clients.iter().position(|w| *w == at).map_or(clients.len(), |i| i + 1);
                    clients.insert(index, head);
                }
            }
        }
        self.focus(Some(c));
        self.arrange(Some(m));
    }

    fn push_up(&mut self) {
        let m = self.selmon;
        let Some(sel) = self.selected() else {
            return;
        };
        if self.clients.get(&sel).map_or(true, |c| c.is_floating) {
            return;
        }
        let tiled = self.tiled(m);
        let clients = &mut self.monitors[m].clients;
        let Some(pos) = clients.iter().position(|w| *w == sel) else {
            return;
        };
        let previous = clients[..pos].iter().rev().copied().find(|w| tiled.contains(w));
        clients.remove(pos);
        match previous.and_then(|p| clients.iter().position(|w| *w == p)) {
            Some(index) => clients.insert(index, sel),
            None => clients.push(sel),
        }
        self.focus(Some(sel));
        self.arrange(Some(m));
    }

    fn push_down(&mut self) {
        let m = self.selmon;
        let Some(sel) = self.selected() else {
            return;
        };
        if self.clients.get(&sel).map_or(true, |c| c.is_floating) {
            return;
        }
        let tiled = self.tiled(m);
        let clients = &mut self.monitors[m].clients;
        let Some(pos) = clients.iter().position(|w| *w == sel) else {
            return;
        };
        let next = clients[pos + 1..].iter().copied().find(|w| tiled.contains(w));
        clients.remove(pos);
        match next.and_then(|n| clients.iter().position(|w| *w == n)) {
            Some(index) => clients.insert(index + 1, sel),
            None => clients.insert(0, sel),
        }
        self.focus(Some(sel));
        self.arrange(Some(m));
    }

    /// Move the selection across the master/stack boundary.
    fn transfer(&mut self) {
        let m = self.selmon;
        let Some(sel) = self.selected() else {
            return;
        };
        let tiled = self.tiled(m);
        let Some(index) = tiled.iter().position(|w| *w == sel) else {
            return;
        };
        let n = tiled.len() as i32;
        let nmaster = self.monitors[m].nmaster;
        let to_stack = (index as i32) < nmaster;
        let master_tail = if nmaster > 0 {
            tiled.get((nmaster.min(n) - 1) as usize).copied()
        } else {
            self.monitors[m].clients.first().copied()
        };
        let stack_tail = tiled.last().copied();

        let (nmaster, after) = if to_stack {
            (nmaster.min(n) - 1, stack_tail)
        } else {
            (nmaster + 1, master_tail)
        };
        self.monitors[m].set_nmaster(nmaster);

        if after != Some(sel) {
            let clients = &mut self.monitors[m].clients;
            clients.retain(|w| *w != sel);
            if nmaster == 1 && !to_stack {
                clients.insert(0, sel);
            } else {
                let index = after
                    .and_then(|a| clients.iter().position(|w| *w == a))
                    .map_or(clients.len(), |i| i + 1);
                clients.insert(index, sel);
            }
        }
        self.arrange(Some(m));
    }

    /// Move `item` directly after (or before) `anchor` in the registry.
    fn reinsert(&mut self, anchor: Option<Window>, item: Option<Window>, after: bool) {
        let (Some(anchor), Some(item)) = (anchor, item) else {
            return;
        };
        if anchor == item {
            return;
        }
        let clients = &mut self.monitors[self.selmon].clients;
        clients.retain(|w| *w != item);
        let Some(pos) = clients.iter().position(|w| *w == anchor) else {
            clients.push(item);
            return;
        };
        clients.insert(if after { pos + 1 } else { pos }, item);
    }

    /// Rotate the area (master or stack) holding the selection, keeping the
    /// selected slot.
    fn in_place_rotate(&mut self, dir: i32) {
        let m = self.selmon;
        let Some(sel) = self.selected() else {
            return;
        };
        let tiled = self.tiled(m);
        let Some(sel_index) = tiled.iter().position(|w| *w == sel) else {
            return;
        };
        let nmaster = self.monitors[m].nmaster.max(0) as usize;
        let master_head = tiled.first().copied();
        let master_tail = nmaster.checked_sub(1).and_then(|i| tiled.get(i)).copied();
        let stack_head = tiled.get(nmaster).copied();
        let stack_tail = tiled.last().copied();

        if sel_index >= nmaster {
            if dir < 0 {
                self.reinsert(stack_tail, stack_head, true);
            } else {
                self.reinsert(stack_head, stack_tail, false);
            }
        } else if dir < 0 {
            self.reinsert(master_tail, master_head, true);
        } else {
            self.reinsert(master_head, master_tail, false);
        }

        if let Some(&target) = self.tiled(m).get(sel_index) {
            self.focus(Some(target));
        }
        self.arrange(Some(m));
    }

    /// Jump focus between the master and stack columns.
    fn switch_col(&mut self) {
        let m = self.selmon;
        let Some(sel) = self.selected() else {
            return;
        };
        let tiled = self.tiled(m);
        let nmaster = self.monitors[m].nmaster.max(0) as usize;
        if tiled.len() <= nmaster {
            return;
        }
        let Some(pos) = tiled.iter().position(|w| *w == sel) else {
            return;
        };
        let in_stack = pos >= nmaster;
        let target = self.monitors[m].stack.iter().copied().find(|w| {
            tiled
                .iter()
                .position(|t| t == w)
                .map_or(false, |i| (i >= nmaster) != in_stack)
        });
        if let Some(target) = target {
            self.focus(Some(target));
            self.restack(m);
        }
    }

    fn inc_nmaster(&mut self, delta: i32) {
        let m = self.selmon;
        if !self.arranged(m) {
            return;
        }
        let n = self.tiled(m).len() as i32;
        let nmaster = self.monitors[m].nmaster + delta;
        if nmaster < 0 || nmaster > n {
            return;
        }
        self.monitors[m].set_nmaster(nmaster);
        self.arrange(Some(m));
    }

    fn set_mfact(&mut self, f: f32) {
        let m = self.selmon;
        if !self.arranged(m) {
            return;
        }
        let mfact = if f < 1.0 { f + self.monitors[m].mfact } else { f - 1.0 };
        if !(MFACT_MIN..=MFACT_MAX).contains(&mfact) {
            return;
        }
        self.monitors[m].set_mfact(mfact);
        self.arrange(Some(m));
    }

    fn set_cfact(&mut self, f: f32) {
        let m = self.selmon;
        let Some(sel) = self.selected() else {
            return;
        };
        if !self.arranged(m) {
            return;
        }
        let Some(c) = self.clients.get_mut(&sel) else {
            return;
        };
        let cfact = if f == 0.0 { 1.0 } else { f + c.cfact };
        if !(CFACT_MIN..=CFACT_MAX).contains(&cfact) {
            return;
        }
        c.cfact = cfact;
        self.arrange(Some(m));
    }

    fn set_gaps(&mut self, delta: i32) {
        let m = self.selmon;
        let mon = &mut self.monitors[m];
        if delta == 0 || mon.gap + delta < 0 {
            mon.gap = 0;
        } else if mon.gap + delta < GAP_MAX {
            mon.gap += delta;
        }
        let unfocused: Vec<Window> = mon.clients.iter().copied().filter(|w| Some(*w) != mon.sel).collect();
        for w in unfocused {
            self.unfocus(w, false);
        }
        self.arrange(Some(m));
    }

    /// Select layout `index`, or flip back to the previous one.
    fn set_layout(&mut self, index: Option<usize>) {
        let m = self.selmon;
        if index.map_or(false, |i| i >= self.settings.layouts.len()) {
            return;
        }
        let mon = &mut self.monitors[m];
        if index != Some(mon.layout()) {
            mon.toggle_layout_slot();
        }
        if let Some(index) = index {
            mon.set_layout(index);
        }
        self.arrange(Some(m));
    }

    pub(crate) fn toggle_floating(&mut self) {
        let m = self.selmon;
        let Some(sel) = self.selected() else {
            return;
        };
        let bp = self.settings.border_px;
        let Some(c) = self.clients.get_mut(&sel) else {
            return;
        };
        if c.is_active_fullscreen {
            return;
        }
        c.is_floating = !c.is_floating || c.is_fixed;
        if c.is_floating {
            let r = c.float_rect;
            self.resize(sel, Rect::new(r.x, r.y, r.w, r.h), bp, false);
        } else {
            c.float_rect = c.rect;
        }
        self.arrange(Some(m));
    }
}
