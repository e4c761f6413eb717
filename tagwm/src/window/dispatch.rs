use tagwm_config::Action;
use tracing::{debug, trace};
use x11rb::protocol::xproto::Window;

use crate::window::backend::{Backend, ClientState};
use crate::window::error::WmResult;
use crate::window::events::{
    ClientRequest, ConfigureRequest, PropertyKind, WmEvent, CONFIG_BORDER_WIDTH, CONFIG_HEIGHT,
    CONFIG_WIDTH, CONFIG_X, CONFIG_Y,
};
use crate::window::geometry::Rect;
use crate::window::manager::WindowManager;

impl<B: Backend> WindowManager<B> {
    pub fn handle_event(&mut self, event: WmEvent) -> WmResult<()> {
        trace!("event {:?}", event);
        match event {
            WmEvent::MapRequest { window } => self.map_request(window),
            WmEvent::ConfigureRequest(request) => self.configure_request(&request),
            WmEvent::ConfigureNotify { width, height } => self.root_configured(width, height),
            WmEvent::DestroyNotify { window } => self.destroy_notify(window),
            WmEvent::UnmapNotify { window, synthetic } => self.unmap_notify(window, synthetic),
            WmEvent::EnterNotify { window, normal } => self.enter_notify(window, normal),
            WmEvent::MotionNotify { window, root_x, root_y, .. } => self.motion_notify(window, root_x, root_y),
            WmEvent::ButtonPress { window, button, state } => return self.button_press(window, button, state),
            WmEvent::ButtonRelease { .. } => {}
            WmEvent::KeyPress { keysym, state } => return self.key_press(keysym, state),
            WmEvent::FocusIn { window } => {
                if let Some(sel) = self.selected() {
                    if sel != window {
                        self.set_focus(sel);
                    }
                }
            }
            WmEvent::PropertyNotify { window, kind, deleted } => self.property_notify(window, kind, deleted),
            WmEvent::ClientMessage { window, request } => self.client_message(window, request),
            WmEvent::MappingNotify { keyboard } => {
                if keyboard {
                    self.grab_keys();
                }
            }
            WmEvent::Expose { window, count } => {
                if count == 0 && self.win_to_mon(window) == self.selmon {
                    self.update_systray();
                }
            }
        }
        Ok(())
    }

    pub(crate) fn map_request(&mut self, window: Window) {
        let Some(attrs) = self.backend.window_attributes(window) else {
            return;
        };
        if attrs.override_redirect || self.clients.contains_key(&window) {
            return;
        }
        self.manage(window, attrs);
    }

    fn configure_request(&mut self, request: &ConfigureRequest) {
        let window = request.window;
        let arranged = self.arranged(self.selmon);
        let visible = self.is_visible(window);
        let Some(c) = self.clients.get_mut(&window) else {
            self.backend.forward_configure(request);
            return;
        };

        if request.has(CONFIG_BORDER_WIDTH) {
            c.bw = request.border_width;
        } else if c.is_floating || !arranged {
            let Some(screen) = self.monitors.get(c.monitor).map(|m| m.screen) else {
                return;
            };
            if !c.ignore_cfg_req_pos {
                if request.has(CONFIG_X) {
                    c.old_rect.x = c.rect.x;
                    c.rect.x = screen.x + request.x;
                }
                if request.has(CONFIG_Y) {
                    c.old_rect.y = c.rect.y;
                    c.rect.y = screen.y + request.y;
                }
            }
            if request.has(CONFIG_WIDTH) {
                c.old_rect.w = c.rect.w;
                c.rect.w = request.width;
            }
            if request.has(CONFIG_HEIGHT) {
                c.old_rect.h = c.rect.h;
                c.rect.h = request.height;
            }
            if c.is_floating {
                if c.rect.x + c.rect.w > screen.right() {
                    c.rect.x = screen.x + (screen.w / 2 - c.outer_width() / 2);
                }
                if c.rect.y + c.rect.h > screen.bottom() {
                    c.rect.y = screen.y + (screen.h / 2 - c.outer_height() / 2);
                }
            }
            let (rect, bw) = (c.rect, c.bw);
            if request.has(CONFIG_X | CONFIG_Y) && !request.has(CONFIG_WIDTH | CONFIG_HEIGHT) {
                self.backend.send_configure_notify(window, rect, bw);
            }
            if visible {
                self.backend.move_resize(window, rect);
            }
        } else {
            let (rect, bw) = (c.rect, c.bw);
            self.backend.send_configure_notify(window, rect, bw);
        }
    }

    fn root_configured(&mut self, width: i32, height: i32) {
        let dirty = self.screen != (width, height);
        self.screen = (width, height);
        if self.update_geometry() || dirty {
            self.update_bars();
            for m in 0..self.monitors.len() {
                self.place_bar(m);
            }
            self.focus(None);
            self.arrange(None);
        }
    }

    fn destroy_notify(&mut self, window: Window) {
        if self.clients.contains_key(&window) {
            self.unmanage(window, true);
        } else if self.substitutions.forget_terminal(window).is_some() {
            debug!("Hidden terminal {:#x} went away", window);
        }
    }

    fn unmap_notify(&mut self, window: Window, synthetic: bool) {
        if !self.clients.contains_key(&window) {
            return;
        }
        if synthetic {
            self.backend.set_client_state(window, ClientState::Withdrawn);
        } else {
            self.unmanage(window, false);
        }
    }

    fn enter_notify(&mut self, window: Window, normal: bool) {
        let root = self.backend.root();
        if !normal && window != root {
            return;
        }
        let client = self.clients.get(&window).map(|c| (c.window, c.monitor));
        let m = client.map_or_else(|| self.win_to_mon(window), |(_, m)| m);
        if m != self.selmon {
            if let Some(sel) = self.selected() {
                self.unfocus(sel, true);
            }
            self.selmon = m;
        } else if client.is_none() || client.map(|(w, _)| w) == self.selected() {
            return;
        }
        self.focus(client.map(|(w, _)| w));
    }

    fn motion_notify(&mut self, window: Window, x: i32, y: i32) {
        if window != self.backend.root() {
            return;
        }
        let m = self.rect_to_mon(Rect::new(x, y, 1, 1));
        if let Some(previous) = self.motion_monitor {
            if m != previous {
                if let Some(sel) = self.selected() {
                    self.unfocus(sel, true);
                }
                self.selmon = m;
                self.focus(None);
            }
        }
        self.motion_monitor = Some(m);
    }

    fn button_press(&mut self, window: Window, button: u8, state: u16) -> WmResult<()> {
        let m = self.win_to_mon(window);
        if m != self.selmon {
            if let Some(sel) = self.selected() {
                self.unfocus(sel, true);
            }
            self.selmon = m;
            self.focus(None);
        }
        if !self.clients.contains_key(&window) {
            return Ok(());
        }
        self.focus(Some(window));
        self.restack(self.selmon);
        self.backend.replay_pointer();

        let state = self.clean_mask(state);
        let actions: Vec<Action> = self
            .buttons
            .iter()
            .filter(|b| b.button == button && self.clean_mask(b.mask) == state)
            .map(|b| b.action.clone())
            .collect();
        for action in actions {
            self.run_action(&action)?;
        }
        Ok(())
    }

    fn key_press(&mut self, keysym: u32, state: u16) -> WmResult<()> {
        let state = self.clean_mask(state);
        let actions: Vec<Action> = self
            .keys
            .iter()
            .filter(|k| k.keysym == keysym && self.clean_mask(k.mask) == state)
            .map(|k| k.action.clone())
            .collect();
        for action in actions {
            self.run_action(&action)?;
        }
        Ok(())
    }

    fn property_notify(&mut self, window: Window, kind: PropertyKind, deleted: bool) {
        if kind == PropertyKind::RootName && window == self.backend.root() {
            self.update_status();
            return;
        }
        if deleted || !self.clients.contains_key(&window) {
            return;
        }
        match kind {
            PropertyKind::TransientFor => {
                let parent_managed = self
                    .backend
                    .transient_for(window)
                    .map_or(false, |t| self.clients.contains_key(&t));
                let Some(c) = self.clients.get_mut(&window) else {
                    return;
                };
                if !c.is_floating && parent_managed {
                    c.is_floating = true;
                    let m = c.monitor;
                    self.arrange(Some(m));
                }
            }
            PropertyKind::NormalHints => {
                let hints = self.backend.size_hints(window);
                if let Some(c) = self.clients.get_mut(&window) {
                    c.set_size_hints(hints);
                }
            }
            PropertyKind::WmHints => self.update_wm_hints(window),
            PropertyKind::Title => self.update_title(window),
            PropertyKind::WindowType => self.update_window_type(window),
            PropertyKind::RootName | PropertyKind::Other => {}
        }
    }

    fn client_message(&mut self, window: Window, request: ClientRequest) {
        let Some(c) = self.clients.get(&window) else {
            return;
        };
        match request {
            ClientRequest::Fullscreen { action } => {
                let fullscreen = match action {
                    0 => false,
                    1 => true,
                    2 => !c.is_fullscreen,
                    _ => return,
                };
                self.set_fullscreen(window, fullscreen);
            }
            ClientRequest::ActiveWindow => {
                if self.selected() != Some(window) && !c.is_urgent {
                    self.set_urgent(window, true);
                }
            }
            ClientRequest::Other => {}
        }
    }
}
