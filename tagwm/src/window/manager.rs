use std::collections::{HashMap, VecDeque};

use tagwm_config::{Action, LayoutKind, Modifier, Settings};
use tagwm_utils::ProcessTree;
use tracing::{debug, info, warn};
use x11rb::protocol::xproto::Window;

use crate::core::keysyms::keysym_from_name;
use crate::window::attach::{self, AttachContext};
use crate::window::backend::{Backend, BorderColor, ClientState, Protocol, WindowAttributes};
use crate::window::client::Client;
use crate::window::error::WmResult;
use crate::window::events::WmEvent;
use crate::window::geometry::{apply_size_hints, Bounds, Rect};
use crate::window::layout::{self, Placement, TileParams, Tiled};
use crate::window::monitor::Monitor;
use crate::window::rules::{apply_rules, resolve_float_geometry, BROKEN};
use crate::window::status::{parse_root_name, StatusText, StatusUpdate};
use crate::window::swallow::{can_swallow, find_terminal, splice, Substitutions};

/// Core modifier bits that take part in binding matches.
const ALL_MODIFIERS: u16 = 0xff;
const LOCK_MASK: u16 = 1 << 1;

#[derive(Debug, Clone)]
pub(crate) struct BoundKey {
    pub mask: u16,
    pub keysym: u32,
    pub action: Action,
}

#[derive(Debug, Clone)]
pub(crate) struct BoundButton {
    pub mask: u16,
    pub button: u8,
    pub action: Action,
}

/// The window manager state: clients, monitors and everything in between.
pub struct WindowManager<B: Backend> {
    pub(crate) backend: B,
    pub(crate) settings: Settings,
    pub(crate) tree: Box<dyn ProcessTree>,
    pub(crate) clients: HashMap<Window, Client>,
    pub(crate) monitors: Vec<Monitor>,
    pub(crate) selmon: usize,
    pub(crate) screen: (i32, i32),
    pub(crate) substitutions: Substitutions,
    /// Window displaced from the master slot by the last zoom.
    pub(crate) prevzoom: Option<Window>,
    pub(crate) running: bool,
    /// Events read during pointer drags that the drag loop does not service.
    pub(crate) deferred: VecDeque<WmEvent>,
    pub(crate) keys: Vec<BoundKey>,
    pub(crate) buttons: Vec<BoundButton>,
    pub(crate) status: StatusText,
    /// Monitor the pointer was last seen on.
    pub(crate) motion_monitor: Option<usize>,
}

impl<B: Backend> WindowManager<B> {
    pub fn new(backend: B, settings: Settings, tree: Box<dyn ProcessTree>) -> Self {
        let keys = settings
            .keys
            .iter()
            .filter_map(|k| match keysym_from_name(&k.key) {
                Some(keysym) => Some(BoundKey {
                    mask: Modifier::combined(&k.modifiers),
                    keysym,
                    action: k.action.clone(),
                }),
                None => {
                    warn!("Unknown key name '{}', binding skipped", k.key);
                    None
                }
            })
            .collect();
        let buttons = settings
            .buttons
            .iter()
            .map(|b| BoundButton {
                mask: Modifier::combined(&b.modifiers),
                button: b.button,
                action: b.action.clone(),
            })
            .collect();
        let screen = backend.screen_size();

        Self {
            backend,
            settings,
            tree,
            clients: HashMap::new(),
            monitors: Vec::new(),
            selmon: 0,
            screen,
            substitutions: Substitutions::new(),
            prevzoom: None,
            running: true,
            deferred: VecDeque::new(),
            keys,
            buttons,
            status: StatusText::fallback(),
            motion_monitor: None,
        }
    }

    /// Build monitors and bars, grab keys and take focus.
    pub fn setup(&mut self) {
        self.update_geometry();
        self.update_bars();
        self.update_status();
        self.backend.set_client_list(&[]);
        self.grab_keys();
        self.focus(None);
        info!(
            "Managing {} monitor(s) on a {}x{} screen",
            self.monitors.len(),
            self.screen.0,
            self.screen.1
        );
    }

    /// Adopt windows that existed before we started.
    pub fn scan(&mut self) {
        let mut transients = Vec::new();
        for window in self.backend.top_level_windows() {
            let Some(attrs) = self.backend.window_attributes(window) else {
                continue;
            };
            if attrs.override_redirect {
                continue;
            }
            if self.backend.transient_for(window).is_some() {
                transients.push((window, attrs));
                continue;
            }
            if attrs.viewable || attrs.iconic {
                self.manage(window, attrs);
            }
        }
        for (window, attrs) in transients {
            if attrs.viewable || attrs.iconic {
                self.manage(window, attrs);
            }
        }
    }

    pub fn run(&mut self) -> WmResult<()> {
        self.backend.flush()?;
        while self.running {
            let event = match self.deferred.pop_front() {
                Some(event) => event,
                None => self.backend.next_event()?,
            };
            self.handle_event(event)?;
            self.backend.flush()?;
        }
        Ok(())
    }

    /// Release every window and server-side resource.
    pub fn cleanup(&mut self) {
        self.view(u32::MAX);
        for m in 0..self.monitors.len() {
            while let Some(&window) = self.monitors.get(m).and_then(|mon| mon.stack.first()) {
                self.unmanage(window, false);
            }
        }
        for m in &mut self.monitors {
            if let Some(bar) = m.bar.take() {
                self.backend.destroy_window(bar);
            }
        }
        self.backend.shutdown();
        if let Err(e) = self.backend.flush() {
            debug!("Flush during cleanup failed: {}", e);
        }
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    // ----- queries -------------------------------------------------------

    pub(crate) fn is_visible(&self, window: Window) -> bool {
        self.clients.get(&window).map_or(false, |c| {
            self.monitors
                .get(c.monitor)
                .map_or(false, |m| c.is_visible_on(m.active_tags()))
        })
    }

    pub(crate) fn layout_kind(&self, m: usize) -> LayoutKind {
        self.monitors
            .get(m)
            .and_then(|mon| self.settings.layouts.get(mon.layout()))
            .map_or(LayoutKind::Floating, |l| l.kind)
    }

    /// Whether the monitor's layout positions windows at all.
    pub(crate) fn arranged(&self, m: usize) -> bool {
        self.layout_kind(m) != LayoutKind::Floating
    }

    /// Visible tiled windows of `m` in registry order.
    pub(crate) fn tiled(&self, m: usize) -> Vec<Window> {
        let Some(mon) = self.monitors.get(m) else {
            return Vec::new();
        };
        mon.clients
            .iter()
            .copied()
            .filter(|w| {
                self.clients
                    .get(w)
                    .map_or(false, |c| !c.is_floating && c.is_visible_on(mon.active_tags()))
            })
            .collect()
    }

    pub(crate) fn selected(&self) -> Option<Window> {
        self.monitors.get(self.selmon).and_then(|m| m.sel)
    }

    pub(crate) fn clean_mask(&self, mask: u16) -> u16 {
        mask & !(self.backend.numlock_mask() | LOCK_MASK) & ALL_MODIFIERS
    }

    fn border_color(&self, window: Window, focused: bool) -> BorderColor {
        if focused {
            return BorderColor::Focused;
        }
        match self.clients.get(&window) {
            Some(c) if c.is_floating => BorderColor::Floating,
            Some(c) if self.monitors.get(c.monitor).map_or(false, |m| m.gap > self.settings.border_px) => {
                BorderColor::Gapped
            }
            _ => BorderColor::Normal,
        }
    }

    // ----- geometry ------------------------------------------------------

    /// Resize with size hints and screen clamping applied.
    pub(crate) fn resize(&mut self, window: Window, request: Rect, bw: i32, interactive: bool) {
        let Some(c) = self.clients.get(&window) else {
            return;
        };
        let Some(mon) = self.monitors.get(c.monitor) else {
            return;
        };
        let kind = self.layout_kind(c.monitor);
        let honor_hints = (self.settings.resize_hints
            && mon.gap > self.settings.resize_hints_threshold * self.settings.border_px
            && kind != LayoutKind::Monocle)
            || c.is_floating
            || kind == LayoutKind::Floating;
        let bounds = Bounds {
            screen_w: self.screen.0,
            screen_h: self.screen.1,
            area: mon.area,
            bar_height: self.settings.bar_height,
            honor_hints,
        };
        let (rect, changed) = apply_size_hints(c.rect, c.bw, request, bw, &c.hints, &bounds, interactive);
        if changed {
            self.resize_client(window, rect, bw);
        }
    }

    /// Apply geometry and border without further checks.
    pub(crate) fn resize_client(&mut self, window: Window, rect: Rect, bw: i32) {
        let Some(c) = self.clients.get_mut(&window) else {
            return;
        };
        c.old_rect = c.rect;
        c.rect = rect;
        c.bw = bw;
        let border = match c.float_border {
            Some(fb) if c.is_floating && !c.is_active_fullscreen => fb,
            _ => bw,
        };
        self.backend.configure(window, rect, border);
    }

    // ----- focus ---------------------------------------------------------

    /// Focus `window`, or the top visible window of the selected monitor.
    pub(crate) fn focus(&mut self, window: Option<Window>) {
        let window = window.filter(|w| self.is_visible(*w)).or_else(|| {
            self.monitors
                .get(self.selmon)
                .and_then(|m| m.stack.iter().copied().find(|w| self.is_visible(*w)))
        });

        let previous = self.selected();
        if previous.is_some() && previous != window {
            if let Some(prev) = previous {
                self.unfocus(prev, false);
            }
        }

        match window {
            Some(w) => {
                let Some(m) = self.clients.get(&w).map(|c| c.monitor) else {
                    return;
                };
                if m != self.selmon {
                    self.selmon = m;
                }
                if self.clients.get(&w).map_or(false, |c| c.is_urgent) {
                    self.set_urgent(w, false);
                }
                let mon = &mut self.monitors[m];
                mon.stack.retain(|x| *x != w);
                mon.stack.insert(0, w);
                self.grab_buttons(w, true);
                self.backend.set_border_color(w, BorderColor::Focused);
                self.set_focus(w);
            }
            None => {
                self.backend.set_input_focus(None);
                self.backend.set_active_window(None);
            }
        }
        if let Some(mon) = self.monitors.get_mut(self.selmon) {
            mon.sel = window;
        }

        // Monocle's symbol counts windows and tile's counts masters.
        if matches!(self.layout_kind(self.selmon), LayoutKind::Tile | LayoutKind::Monocle) {
            self.arrange_monitor(self.selmon);
        }
    }

    pub(crate) fn unfocus(&mut self, window: Window, set_focus: bool) {
        if !self.clients.contains_key(&window) {
            return;
        }
        self.grab_buttons(window, false);
        let color = self.border_color(window, false);
        self.backend.set_border_color(window, color);
        if set_focus {
            self.backend.set_input_focus(None);
            self.backend.set_active_window(None);
        }
    }

    pub(crate) fn set_focus(&mut self, window: Window) {
        let Some(c) = self.clients.get(&window) else {
            return;
        };
        if !c.never_focus {
            self.backend.set_input_focus(Some(window));
            self.backend.set_active_window(Some(window));
        }
        self.backend.send_protocol(window, Protocol::TakeFocus);
    }

    pub(crate) fn grab_buttons(&mut self, window: Window, focused: bool) {
        let buttons: Vec<(u16, u8)> = self.buttons.iter().map(|b| (b.mask, b.button)).collect();
        self.backend.grab_buttons(window, focused, &buttons);
    }

    pub(crate) fn grab_keys(&mut self) {
        let keys: Vec<(u16, u32)> = self.keys.iter().map(|k| (k.mask, k.keysym)).collect();
        self.backend.grab_keys(&keys);
    }

    pub(crate) fn set_urgent(&mut self, window: Window, urgent: bool) {
        if let Some(c) = self.clients.get_mut(&window) {
            c.is_urgent = urgent;
            self.backend.set_urgency_hint(window, urgent);
        }
    }

    // ----- arrangement ---------------------------------------------------

    /// Re-lay one monitor, or all of them.
    pub(crate) fn arrange(&mut self, monitor: Option<usize>) {
        let targets: Vec<usize> = match monitor {
            Some(m) if m < self.monitors.len() => vec![m],
            Some(_) => return,
            None => (0..self.monitors.len()).collect(),
        };
        for &m in &targets {
            self.show_hide(m);
        }
        for &m in &targets {
            self.arrange_monitor(m);
        }
        if let Some(m) = monitor {
            self.restack(m);
        }
    }

    pub(crate) fn arrange_monitor(&mut self, m: usize) {
        let Some(mon) = self.monitors.get(m) else {
            return;
        };
        let base_symbol = self
            .settings
            .layouts
            .get(mon.layout())
            .map(|l| l.symbol.clone())
            .unwrap_or_default();

        let tiled: Vec<Tiled> = self
            .tiled(m)
            .into_iter()
            .filter_map(|w| self.clients.get(&w).map(|c| Tiled { window: w, cfact: c.cfact }))
            .collect();

        let (symbol, placements) = match self.layout_kind(m) {
            LayoutKind::Tile => {
                let bp = self.settings.border_px;
                let border = if self.settings.no_tile_border && mon.gap > bp { 0 } else { bp };
                let params = TileParams {
                    area: mon.area,
                    nmaster: mon.nmaster,
                    mfact: mon.mfact,
                    axes: mon.axes,
                    gap: mon.gap,
                    border,
                    min_slice: self.settings.bar_height + mon.gap + 2 * bp,
                };
                (
                    layout::tile_symbol(mon.axes, mon.nmaster, tiled.len()),
                    layout::tile(&params, &tiled, &mon.stack),
                )
            }
            LayoutKind::Monocle => {
                let visible = mon.clients.iter().filter(|w| self.is_visible(**w)).count();
                let symbol = if visible > 0 {
                    layout::monocle_symbol(visible)
                } else {
                    base_symbol
                };
                (symbol, layout::monocle(mon.area, &tiled, &mon.stack))
            }
            LayoutKind::Floating => {
                let bp = self.settings.border_px;
                let borderless: Vec<Window> = mon
                    .clients
                    .iter()
                    .copied()
                    .filter(|w| {
                        self.is_visible(*w)
                            && self
                                .clients
                                .get(w)
                                .map_or(false, |c| c.bw == 0 && !c.is_active_fullscreen)
                    })
                    .collect();
                for w in borderless {
                    if let Some(c) = self.clients.get(&w) {
                        let r = Rect::new(c.rect.x, c.rect.y, c.rect.w - 2 * bp, c.rect.h - 2 * bp);
                        self.resize(w, r, bp, false);
                    }
                }
                (base_symbol, Vec::new())
            }
        };

        if let Some(mon) = self.monitors.get_mut(m) {
            mon.symbol = symbol;
        }
        for placement in placements {
            match placement {
                Placement::Show { window, rect, border } => self.resize(window, rect, border, false),
                Placement::Hide { window } => {
                    if let Some(c) = self.clients.get(&window) {
                        let (x, y) = (-2 * c.outer_width(), c.rect.y);
                        self.backend.move_window(window, x, y);
                    }
                }
            }
        }
    }

    /// Move visible windows into place top-down and hidden ones off-screen bottom-up.
    pub(crate) fn show_hide(&mut self, m: usize) {
        let Some(mon) = self.monitors.get(m) else {
            return;
        };
        let stack = mon.stack.clone();
        let arranged = self.arranged(m);
        for &w in &stack {
            if !self.is_visible(w) {
                continue;
            }
            let Some(c) = self.clients.get(&w) else {
                continue;
            };
            let (rect, bw, floating) = (c.rect, c.bw, c.is_floating);
            self.backend.move_window(w, rect.x, rect.y);
            if (!arranged || floating) && !c.is_active_fullscreen {
                self.resize(w, rect, bw, false);
            }
        }
        for &w in stack.iter().rev() {
            if self.is_visible(w) {
                continue;
            }
            if let Some(c) = self.clients.get(&w) {
                let (x, y) = (-2 * c.outer_width(), c.rect.y);
                self.backend.move_window(w, x, y);
            }
        }
    }

    pub(crate) fn restack(&mut self, m: usize) {
        let Some(mon) = self.monitors.get(m) else {
            return;
        };
        let Some(sel) = mon.sel else {
            return;
        };
        let arranged = self.arranged(m);
        if self.clients.get(&sel).map_or(false, |c| c.is_floating) || !arranged {
            self.backend.raise(sel);
        }
        if arranged {
            let bar = mon.bar;
            let below: Vec<Window> = mon
                .stack
                .iter()
                .copied()
                .filter(|w| self.is_visible(*w) && self.clients.get(w).map_or(false, |c| !c.is_floating))
                .collect();
            self.backend.stack_below(bar, &below);
        }
        self.backend.discard_enter_events();
    }

    // ----- registry ------------------------------------------------------

    /// Insert `window` into `m`'s registry following the attach policy.
    pub(crate) fn attach(&mut self, m: usize, window: Window) {
        let Some(mon) = self.monitors.get(m) else {
            return;
        };
        let tags = self.clients.get(&window).map_or(0, |c| c.tags);
        let selection = mon
            .sel
            .and_then(|s| self.clients.get(&s))
            .map(|c| (c.window, c.is_floating));
        let nmaster = mon.nmaster;
        let clients = &self.clients;
        let tiled_on_tags = |w: Window| clients.get(&w).map_or(false, |c| !c.is_floating && c.tags & tags != 0);
        let ctx = AttachContext {
            selection,
            nmaster,
            tiled_on_tags: &tiled_on_tags,
        };
        attach::attach(&mut self.monitors[m].clients, window, self.settings.attach, &ctx);
    }

    /// Drop `window` from its monitor's lists, reselecting if it was selected.
    pub(crate) fn detach(&mut self, window: Window) {
        let Some(m) = self.clients.get(&window).map(|c| c.monitor) else {
            return;
        };
        let Some(mon) = self.monitors.get_mut(m) else {
            return;
        };
        mon.forget(window);
        if mon.sel == Some(window) {
            let stack = mon.stack.clone();
            let next = stack.into_iter().find(|w| self.is_visible(*w));
            self.monitors[m].sel = next;
        }
    }

    pub(crate) fn update_client_list(&mut self) {
        let windows: Vec<Window> = self.monitors.iter().flat_map(|m| m.clients.iter().copied()).collect();
        self.backend.set_client_list(&windows);
    }

    /// Take over a newly mapped window.
    pub(crate) fn manage(&mut self, window: Window, attrs: WindowAttributes) {
        if self.clients.contains_key(&window) {
            return;
        }
        let info = self.backend.window_info(window);
        let bp = self.settings.border_px;
        let tag_mask = self.settings.tag_mask();

        let mut c = Client::new(window, attrs.rect, bp);
        c.old_bw = attrs.border;
        c.pid = info.pid;
        c.name = info.title.clone().filter(|t| !t.is_empty()).unwrap_or_else(|| BROKEN.to_string());
        c.class = info.class.clone();
        c.instance = info.instance.clone();
        c.monitor = self.selmon;

        let parent = info
            .transient_for
            .and_then(|t| self.clients.get(&t))
            .map(|p| (p.monitor, p.tags));
        let mut float_geometry = None;
        let mut terminal = None;
        match parent {
            Some((monitor, tags)) => {
                c.monitor = monitor;
                c.tags = tags;
            }
            None => {
                let outcome = apply_rules(&self.settings.rules, &c.class, &c.instance, &c.name);
                c.is_terminal = outcome.terminal;
                c.no_swallow = outcome.no_swallow;
                c.is_floating = outcome.floating;
                c.scratch_key = outcome.scratch_key;
                c.float_border = outcome.float_border;
                if let Some(m) = outcome.monitor.filter(|m| *m < self.monitors.len()) {
                    c.monitor = m;
                }
                if outcome.switch_to_tag && outcome.tags & tag_mask != 0 {
                    c.switch_to_tag = self.monitors.get(self.selmon).map(|m| m.active_tags());
                    self.view(outcome.tags);
                }
                let tags = outcome.tags & tag_mask;
                c.tags = if tags != 0 {
                    tags
                } else {
                    self.monitors.get(c.monitor).map_or(1, |m| m.active_tags())
                };
                float_geometry = outcome.float_geometry;
                if !c.is_terminal {
                    let known = self
                        .monitors
                        .iter()
                        .flat_map(|m| m.clients.iter())
                        .filter_map(|w| self.clients.get(w));
                    terminal = find_terminal(known, &self.substitutions, self.tree.as_ref(), c.pid);
                }
            }
        }

        let Some(mon) = self.monitors.get(c.monitor) else {
            warn!("No monitor for window {:#x}", window);
            return;
        };
        let (area, screen) = (mon.area, mon.screen);
        let r = &mut c.rect;
        if r.x + r.w + 2 * bp > area.right() {
            r.x = area.right() - r.w - 2 * bp;
        }
        if r.y + r.h + 2 * bp > area.bottom() {
            r.y = area.bottom() - r.h - 2 * bp;
        }
        r.x = r.x.max(area.x);
        r.y = r.y.max(area.y);
        r.w = r.w.min(area.w - 2 * bp);
        r.h = r.h.min(area.h - 2 * bp);
        if let Some(geometry) = float_geometry {
            c.rect = resolve_float_geometry(geometry, c.rect, screen, area, self.settings.bar_height);
        }

        if info.window_type.dialog {
            c.is_floating = true;
        }
        c.set_size_hints(info.size_hints);
        if let Some(hints) = info.wm_hints {
            c.is_urgent = hints.urgent;
            c.never_focus = hints.input.map_or(false, |input| !input);
        }
        c.float_rect = c.rect;
        if !c.is_floating {
            c.is_floating = info.transient_for.is_some() || c.is_fixed;
        }
        c.old_floating = c.is_floating;

        let border = match c.float_border {
            Some(fb) if c.is_floating => fb,
            _ => c.bw,
        };
        let (rect, monitor, floating) = (c.rect, c.monitor, c.is_floating);
        debug!(
            "Managing {:#x} '{}' class={} tags={:#b} mon={}",
            window, c.name, c.class, c.tags, monitor
        );
        let swallowing = terminal.filter(|_| can_swallow(&c, self.settings.swallow_floating));
        self.clients.insert(window, c);

        self.backend.set_border_width(window, border);
        let color = self.border_color(window, false);
        self.backend.set_border_color(window, color);
        self.backend.send_configure_notify(window, rect, border);
        self.backend.select_client_input(window);
        self.grab_buttons(window, false);
        if floating {
            self.backend.raise(window);
        }

        let focus_client = match swallowing {
            Some(term) => {
                let focus_client = self.selected() == Some(term);
                self.swallow(term, window);
                focus_client
            }
            None => {
                self.attach(monitor, window);
                attach::attach_stack(&mut self.monitors[monitor].stack, window, None);
                true
            }
        };
        self.update_client_list();

        // Some clients need a first configure off-screen before mapping.
        let parked = Rect::new(rect.x + 2 * self.screen.0, rect.y, rect.w, rect.h);
        self.backend.move_resize(window, parked);
        self.backend.set_client_state(window, ClientState::Normal);

        let monitor = self.clients.get(&window).map_or(monitor, |c| c.monitor);
        if focus_client {
            if monitor == self.selmon {
                if let Some(sel) = self.selected() {
                    self.unfocus(sel, false);
                }
            }
            self.monitors[monitor].sel = Some(window);
        }
        self.arrange(Some(monitor));
        self.backend.map(window);
        if focus_client {
            self.focus(None);
        }
        if info.window_type.fullscreen {
            self.set_fullscreen(window, true);
        }
    }

    /// Stop managing `window`. `destroyed` skips requests to a window that is gone.
    pub(crate) fn unmanage(&mut self, window: Window, destroyed: bool) {
        if self.substitutions.is_substitute(window) {
            self.unswallow(window);
        }
        if self.clients.contains_key(&window) {
            self.detach(window);
        }
        let Some(c) = self.clients.remove(&window) else {
            return;
        };
        if self.prevzoom == Some(window) {
            self.prevzoom = None;
        }
        if !destroyed {
            self.backend.set_border_width(window, c.old_bw);
            self.backend.ungrab_buttons(window);
            self.backend.set_client_state(window, ClientState::Withdrawn);
        }
        debug!("Unmanaged {:#x} '{}'", window, c.name);
        self.focus(None);
        self.update_client_list();
        self.arrange(Some(c.monitor));
        if let Some(tags) = c.switch_to_tag {
            self.view(tags);
        }
    }

    // ----- swallowing ----------------------------------------------------

    /// Hide `terminal` behind `window`, which takes its slots.
    pub(crate) fn swallow(&mut self, terminal: Window, window: Window) {
        let Some(term) = self.clients.remove(&terminal) else {
            return;
        };
        self.replace_client(&term, window);
        if let Some(c) = self.clients.get_mut(&window) {
            c.ignore_cfg_req_pos = true;
        }
        debug!("{:#x} swallowed terminal {:#x}", window, terminal);
        self.substitutions.insert(window, term);
    }

    /// Put the hidden terminal back where `substitute` is.
    pub(crate) fn unswallow(&mut self, substitute: Window) {
        let Some(term) = self.substitutions.take(substitute) else {
            return;
        };
        let Some(sub) = self.clients.get(&substitute).cloned() else {
            return;
        };
        let terminal = term.window;
        self.clients.insert(terminal, term);
        self.replace_client(&sub, terminal);
        debug!("Terminal {:#x} restored from {:#x}", terminal, substitute);
    }

    /// `new` inherits `old`'s monitor, tags, float state and list slots.
    fn replace_client(&mut self, old: &Client, new: Window) {
        let monitor = old.monitor;
        let Some(c) = self.clients.get_mut(&new) else {
            return;
        };
        c.monitor = monitor;
        c.tags = old.tags;
        c.is_floating = old.is_floating;
        let (new_rect, new_bw, new_floating) = (c.rect, c.bw, c.is_floating);

        if let Some(mon) = self.monitors.get_mut(monitor) {
            mon.forget(new);
            splice(&mut mon.clients, old.window, new);
            splice(&mut mon.stack, old.window, new);
            if mon.sel == Some(old.window) {
                mon.sel = Some(new);
            }
        }
        self.backend.move_window(old.window, -2 * old.outer_width(), old.rect.y);

        if self.is_visible(new) {
            let rect = if new_floating {
                Rect::new(old.rect.x, old.rect.y, new_rect.w, new_rect.h)
            } else {
                Rect::new(old.rect.x, old.rect.y, old.rect.w, old.rect.h)
            };
            self.resize(new, rect, new_bw, false);
        }
    }

    // ----- window state --------------------------------------------------

    /// Track the EWMH fullscreen state and give the window the whole monitor.
    pub(crate) fn set_fullscreen(&mut self, window: Window, fullscreen: bool) {
        let Some(c) = self.clients.get_mut(&window) else {
            return;
        };
        if c.is_fullscreen != fullscreen {
            c.is_fullscreen = fullscreen;
            self.backend.set_fullscreen_state(window, fullscreen);
        }
        self.set_active_fullscreen(window, fullscreen);
    }

    pub(crate) fn set_active_fullscreen(&mut self, window: Window, on: bool) {
        let Some(c) = self.clients.get_mut(&window) else {
            return;
        };
        let monitor = c.monitor;
        if on && !c.is_active_fullscreen {
            c.is_active_fullscreen = true;
            c.pre_fullscreen = Some((c.rect, c.bw));
            c.old_floating = c.is_floating;
            c.is_floating = true;
            let screen = self.monitors.get(monitor).map(|m| m.screen).unwrap_or(c.rect);
            self.resize_client(window, screen, 0);
            self.backend.raise(window);
        } else if !on && c.is_active_fullscreen {
            c.is_active_fullscreen = false;
            c.is_floating = c.old_floating;
            if let Some((rect, bw)) = c.pre_fullscreen.take() {
                self.resize_client(window, rect, bw);
            }
            self.arrange(Some(monitor));
        }
    }

    pub(crate) fn update_wm_hints(&mut self, window: Window) {
        let Some(hints) = self.backend.wm_hints(window) else {
            return;
        };
        let selected = self.selected() == Some(window);
        let Some(c) = self.clients.get_mut(&window) else {
            return;
        };
        if selected && hints.urgent {
            self.backend.set_urgency_hint(window, false);
        } else {
            c.is_urgent = hints.urgent;
        }
        c.never_focus = hints.input.map_or(false, |input| !input);
    }

    pub(crate) fn update_window_type(&mut self, window: Window) {
        let kind = self.backend.window_type(window);
        if kind.fullscreen {
            self.set_fullscreen(window, true);
        }
        if kind.dialog {
            if let Some(c) = self.clients.get_mut(&window) {
                c.is_floating = true;
            }
        }
    }

    pub(crate) fn update_title(&mut self, window: Window) {
        let title = self.backend.title(window).filter(|t| !t.is_empty());
        if let Some(c) = self.clients.get_mut(&window) {
            c.name = title.unwrap_or_else(|| BROKEN.to_string());
        }
    }

    /// Re-read the root window name as status text or a fake signal.
    pub(crate) fn update_status(&mut self) {
        match parse_root_name(self.backend.root_name().as_deref()) {
            StatusUpdate::Text(text) => {
                debug!("Status: {}", text.display());
                self.status = text;
            }
            StatusUpdate::Signal(0) => {}
            StatusUpdate::Signal(signum) => {
                let actions: Vec<Action> = self
                    .settings
                    .signals
                    .iter()
                    .filter(|s| s.signum == signum)
                    .map(|s| s.action.clone())
                    .collect();
                debug!("Fake signal {} matched {} binding(s)", signum, actions.len());
                for action in actions {
                    if let Err(e) = self.run_action(&action) {
                        warn!("Signal action {:?} failed: {}", action, e);
                    }
                }
            }
        }
    }

    /// Ask `window` to close, killing it when it does not speak WM_DELETE_WINDOW.
    pub(crate) fn kill(&mut self, window: Window) {
        if !self.backend.send_protocol(window, Protocol::Delete) {
            self.backend.kill_client(window);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::testing::{manager, manager_with, FakeBackend};
    use tagwm_config::Rule;

    #[test]
    fn test_manage_focuses_and_tiles() {
        let mut wm = manager();
        let a = wm.backend.add_window(Rect::new(0, 0, 300, 200));
        let b = wm.backend.add_window(Rect::new(0, 0, 300, 200));
        wm.map_request(a);
        wm.map_request(b);

        assert_eq!(wm.selected(), Some(b));
        assert_eq!(wm.backend.focused, Some(b));
        assert_eq!(wm.monitors[0].clients, vec![b, a]);
        assert_eq!(wm.monitors[0].stack, vec![b, a]);
        assert_eq!(wm.backend.client_list, vec![b, a]);
        // master on the left, stack on the right
        let (rb, _) = wm.backend.configured[&b];
        let (ra, _) = wm.backend.configured[&a];
        assert!(rb.x < ra.x);
        assert_eq!(wm.monitors[0].symbol, "[]=");
    }

    #[test]
    fn test_unmanage_refocuses_and_restores_border() {
        let mut wm = manager();
        let a = wm.backend.add_window(Rect::new(0, 0, 300, 200));
        let b = wm.backend.add_window(Rect::new(0, 0, 300, 200));
        wm.map_request(a);
        wm.map_request(b);
        wm.unmanage(b, false);

        assert!(!wm.clients.contains_key(&b));
        assert_eq!(wm.selected(), Some(a));
        assert_eq!(wm.backend.states.get(&b), Some(&ClientState::Withdrawn));
        assert_eq!(wm.backend.borders.get(&b), Some(&0));
        assert_eq!(wm.backend.client_list, vec![a]);
    }

    #[test]
    fn test_rules_assign_tags_and_floating() {
        let mut settings = Settings::default();
        settings.rules = vec![Rule {
            class: Some("Gimp".into()),
            tags: 1 << 3,
            floating: true,
            ..Rule::default()
        }];
        let mut wm = manager_with(settings);
        let w = wm.backend.add_window(Rect::new(10, 30, 300, 200));
        wm.backend.info_mut(w).class = "Gimp".into();
        wm.map_request(w);

        let c = &wm.clients[&w];
        assert_eq!(c.tags, 1 << 3);
        assert!(c.is_floating);
        assert!(!wm.is_visible(w));
        assert_eq!(wm.selected(), None);
    }

    #[test]
    fn test_transient_inherits_parent_tags() {
        let mut wm = manager();
        let parent = wm.backend.add_window(Rect::new(0, 0, 300, 200));
        wm.map_request(parent);
        if let Some(c) = wm.clients.get_mut(&parent) {
            c.tags = 0b100;
        }
        let dialog = wm.backend.add_window(Rect::new(0, 0, 100, 80));
        wm.backend.info_mut(dialog).transient_for = Some(parent);
        wm.map_request(dialog);

        let c = &wm.clients[&dialog];
        assert_eq!(c.tags, 0b100);
        assert!(c.is_floating);
    }

    #[test]
    fn test_swallow_and_restore() {
        let mut wm = manager();
        let term = wm.backend.add_window(Rect::new(0, 0, 300, 200));
        wm.backend.info_mut(term).class = "St".into();
        wm.backend.info_mut(term).pid = 100;
        wm.settings.rules = vec![Rule {
            class: Some("St".into()),
            terminal: true,
            ..Rule::default()
        }];
        let other = wm.backend.add_window(Rect::new(0, 0, 300, 200));
        wm.map_request(other);
        wm.map_request(term);
        assert_eq!(wm.monitors[0].clients, vec![term, other]);

        let child = wm.backend.add_window(Rect::new(0, 0, 640, 480));
        wm.backend.info_mut(child).pid = 300;
        wm.map_request(child);

        assert!(!wm.clients.contains_key(&term));
        assert!(wm.substitutions.is_substitute(child));
        assert_eq!(wm.monitors[0].clients, vec![child, other]);
        assert_eq!(wm.selected(), Some(child));

        wm.handle_event(WmEvent::DestroyNotify { window: child }).ok();
        assert!(wm.clients.contains_key(&term));
        assert!(wm.substitutions.is_empty());
        assert_eq!(wm.monitors[0].clients, vec![term, other]);
        assert_eq!(wm.selected(), Some(term));
    }

    #[test]
    fn test_no_swallow_from_unrelated_process() {
        let mut wm = manager();
        wm.settings.rules = vec![Rule {
            class: Some("St".into()),
            terminal: true,
            ..Rule::default()
        }];
        let term = wm.backend.add_window(Rect::new(0, 0, 300, 200));
        wm.backend.info_mut(term).class = "St".into();
        wm.backend.info_mut(term).pid = 100;
        wm.map_request(term);
        let stranger = wm.backend.add_window(Rect::new(0, 0, 300, 200));
        wm.backend.info_mut(stranger).pid = 400;
        wm.map_request(stranger);

        assert!(wm.clients.contains_key(&term));
        assert!(wm.substitutions.is_empty());
    }

    #[test]
    fn test_hidden_terminal_destroyed_drops_relation() {
        let mut wm = manager();
        wm.settings.rules = vec![Rule {
            class: Some("St".into()),
            terminal: true,
            ..Rule::default()
        }];
        let term = wm.backend.add_window(Rect::new(0, 0, 300, 200));
        wm.backend.info_mut(term).class = "St".into();
        wm.backend.info_mut(term).pid = 100;
        wm.map_request(term);
        let child = wm.backend.add_window(Rect::new(0, 0, 300, 200));
        wm.backend.info_mut(child).pid = 200;
        wm.map_request(child);
        assert!(wm.substitutions.is_substitute(child));

        wm.handle_event(WmEvent::DestroyNotify { window: term }).ok();
        assert!(wm.substitutions.is_empty());
        assert!(wm.clients.contains_key(&child));
    }

    #[test]
    fn test_hidden_windows_move_offscreen() {
        let mut wm = manager();
        let w = wm.backend.add_window(Rect::new(0, 0, 300, 200));
        wm.map_request(w);
        wm.view(0b10);
        let (x, _) = wm.backend.positions[&w];
        assert!(x < 0);
        assert!(!wm.is_visible(w));
        // logical geometry is untouched
        assert!(wm.clients[&w].rect.x >= 0);
    }

    #[test]
    fn test_fullscreen_round_trip() {
        let mut wm = manager();
        let w = wm.backend.add_window(Rect::new(0, 0, 300, 200));
        wm.map_request(w);
        let before = (wm.clients[&w].rect, wm.clients[&w].bw);

        wm.set_fullscreen(w, true);
        let c = &wm.clients[&w];
        assert!(c.is_fullscreen && c.is_active_fullscreen && c.is_floating);
        assert_eq!(c.rect, wm.monitors[0].screen);
        assert_eq!(c.bw, 0);
        assert_eq!(wm.backend.fullscreen.get(&w), Some(&true));

        wm.set_fullscreen(w, false);
        let c = &wm.clients[&w];
        assert!(!c.is_fullscreen && !c.is_floating);
        assert_eq!((c.rect, c.bw), before);
    }

    #[test]
    fn test_fake_signal_dispatches_binding() {
        let mut wm = manager();
        wm.settings.signals = vec![tagwm_config::SignalBinding {
            signum: 7,
            action: Action::View(0b100),
        }];
        wm.backend.root_name = Some("fsignal:7".into());
        wm.update_status();
        assert_eq!(wm.monitors[0].active_tags(), 0b100);

        wm.backend.root_name = Some("load 0.1".into());
        wm.update_status();
        assert_eq!(wm.status.display(), "load 0.1");
    }

    #[test]
    fn test_cleanup_releases_everything() {
        let mut wm = manager();
        let a = wm.backend.add_window(Rect::new(0, 0, 300, 200));
        let b = wm.backend.add_window(Rect::new(0, 0, 300, 200));
        wm.map_request(a);
        wm.map_request(b);
        wm.tag(0b10);
        wm.cleanup();

        assert!(wm.clients.is_empty());
        assert!(wm.backend.shut_down);
        assert_eq!(wm.backend.states.get(&a), Some(&ClientState::Withdrawn));
        assert_eq!(wm.backend.states.get(&b), Some(&ClientState::Withdrawn));
    }

    #[test]
    fn test_unknown_key_names_are_skipped() {
        let mut settings = Settings::default();
        settings.keys = vec![
            tagwm_config::KeyBinding::new(&[Modifier::Mod4], "Return", Action::Zoom),
            tagwm_config::KeyBinding::new(&[Modifier::Mod4], "NoSuchKey", Action::Quit),
        ];
        let wm = WindowManager::new(FakeBackend::new(), settings, Box::new(crate::window::testing::ChainTree));
        assert_eq!(wm.keys.len(), 1);
        assert_eq!(wm.keys[0].mask, 1 << 6);
    }
}
