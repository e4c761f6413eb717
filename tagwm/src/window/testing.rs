//! In-memory backend that records requests, for exercising the manager
//! without a display server.

use std::collections::{HashMap, HashSet, VecDeque};

use tagwm_config::Settings;
use tagwm_utils::ProcessTree;
use x11rb::errors::ConnectionError;
use x11rb::protocol::xproto::Window;

use crate::window::backend::{
    Backend, BorderColor, ClientState, CursorKind, Protocol, WindowAttributes, WindowInfo, WindowType,
    WmHints,
};
use crate::window::error::{WmError, WmResult};
use crate::window::events::{ConfigureRequest, WmEvent};
use crate::window::geometry::{Rect, SizeHints};
use crate::window::manager::WindowManager;

pub const ROOT: Window = 1;

/// `1 -> 100 (terminal) -> 200 (shell) -> 300 (app)`, `1 -> 400`.
pub struct ChainTree;

impl ProcessTree for ChainTree {
    fn parent_of(&self, pid: u32) -> Option<u32> {
        match pid {
            100 | 400 => Some(1),
            200 => Some(100),
            300 => Some(200),
            1 => Some(0),
            _ => None,
        }
    }
}

#[derive(Default)]
pub struct FakeBackend {
    pub screen: (i32, i32),
    pub monitors: Vec<Rect>,
    pub attributes: HashMap<Window, WindowAttributes>,
    pub infos: HashMap<Window, WindowInfo>,
    pub root_name: Option<String>,
    pub pointer: (i32, i32),
    pub events: VecDeque<WmEvent>,
    next_id: Window,

    pub configured: HashMap<Window, (Rect, i32)>,
    pub positions: HashMap<Window, (i32, i32)>,
    pub borders: HashMap<Window, i32>,
    pub colors: HashMap<Window, BorderColor>,
    pub notified: Vec<Window>,
    pub forwarded: Vec<ConfigureRequest>,
    pub raised: Vec<Window>,
    pub mapped: HashSet<Window>,
    pub focused: Option<Window>,
    pub active: Option<Window>,
    pub delete_protocol: HashSet<Window>,
    pub killed: Vec<Window>,
    pub states: HashMap<Window, ClientState>,
    pub urgency: HashMap<Window, bool>,
    pub fullscreen: HashMap<Window, bool>,
    pub client_list: Vec<Window>,
    pub grabbed_keys: Vec<(u16, u32)>,
    pub pointer_grabbed: bool,
    pub warps: Vec<(Option<Window>, i32, i32)>,
    pub bars: Vec<Window>,
    pub systray: Option<(Rect, bool)>,
    pub spawned: Vec<Vec<String>>,
    pub shut_down: bool,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            screen: (1024, 768),
            next_id: 0x100,
            ..Self::default()
        }
    }

    fn allocate(&mut self) -> Window {
        self.next_id += 1;
        self.next_id
    }

    /// Register a mappable top-level window.
    pub fn add_window(&mut self, rect: Rect) -> Window {
        let window = self.allocate();
        self.attributes.insert(
            window,
            WindowAttributes {
                rect,
                border: 0,
                override_redirect: false,
                viewable: false,
                iconic: false,
            },
        );
        self.infos.insert(window, WindowInfo::default());
        window
    }

    pub fn info_mut(&mut self, window: Window) -> &mut WindowInfo {
        self.infos.entry(window).or_default()
    }
}

impl Backend for FakeBackend {
    fn root(&self) -> Window {
        ROOT
    }

    fn screen_size(&self) -> (i32, i32) {
        self.screen
    }

    fn monitor_geometries(&mut self) -> Vec<Rect> {
        self.monitors.clone()
    }

    fn window_attributes(&mut self, window: Window) -> Option<WindowAttributes> {
        self.attributes.get(&window).copied()
    }

    fn window_info(&mut self, window: Window) -> WindowInfo {
        self.infos.get(&window).cloned().unwrap_or_default()
    }

    fn title(&mut self, window: Window) -> Option<String> {
        self.infos.get(&window).and_then(|i| i.title.clone())
    }

    fn size_hints(&mut self, window: Window) -> SizeHints {
        self.infos.get(&window).map(|i| i.size_hints).unwrap_or_default()
    }

    fn wm_hints(&mut self, window: Window) -> Option<WmHints> {
        self.infos.get(&window).and_then(|i| i.wm_hints)
    }

    fn transient_for(&mut self, window: Window) -> Option<Window> {
        self.infos.get(&window).and_then(|i| i.transient_for)
    }

    fn window_type(&mut self, window: Window) -> WindowType {
        self.infos.get(&window).map(|i| i.window_type).unwrap_or_default()
    }

    fn root_name(&mut self) -> Option<String> {
        self.root_name.clone()
    }

    fn top_level_windows(&mut self) -> Vec<Window> {
        let mut windows: Vec<Window> = self.attributes.keys().copied().collect();
        windows.sort_unstable();
        windows
    }

    fn pointer_position(&mut self) -> Option<(i32, i32)> {
        Some(self.pointer)
    }

    fn pointer_in_window(&mut self, window: Window) -> Option<(i32, i32)> {
        let (x, y) = self.positions.get(&window).copied().unwrap_or_default();
        Some((self.pointer.0 - x, self.pointer.1 - y))
    }

    fn configure(&mut self, window: Window, rect: Rect, border: i32) {
        self.configured.insert(window, (rect, border));
        self.positions.insert(window, (rect.x, rect.y));
        self.borders.insert(window, border);
    }

    fn send_configure_notify(&mut self, window: Window, _rect: Rect, _border: i32) {
        self.notified.push(window);
    }

    fn move_window(&mut self, window: Window, x: i32, y: i32) {
        self.positions.insert(window, (x, y));
    }

    fn move_resize(&mut self, window: Window, rect: Rect) {
        self.positions.insert(window, (rect.x, rect.y));
    }

    fn set_border_width(&mut self, window: Window, border: i32) {
        self.borders.insert(window, border);
    }

    fn forward_configure(&mut self, request: &ConfigureRequest) {
        self.forwarded.push(*request);
    }

    fn set_border_color(&mut self, window: Window, color: BorderColor) {
        self.colors.insert(window, color);
    }

    fn raise(&mut self, window: Window) {
        self.raised.push(window);
    }

    fn stack_below(&mut self, _sibling: Option<Window>, _windows: &[Window]) {}

    fn map(&mut self, window: Window) {
        self.mapped.insert(window);
    }

    fn set_input_focus(&mut self, window: Option<Window>) {
        self.focused = window;
    }

    fn set_active_window(&mut self, window: Option<Window>) {
        self.active = window;
    }

    fn send_protocol(&mut self, window: Window, protocol: Protocol) -> bool {
        protocol == Protocol::Delete && self.delete_protocol.contains(&window)
    }

    fn kill_client(&mut self, window: Window) {
        self.killed.push(window);
    }

    fn set_client_state(&mut self, window: Window, state: ClientState) {
        self.states.insert(window, state);
    }

    fn set_urgency_hint(&mut self, window: Window, urgent: bool) {
        self.urgency.insert(window, urgent);
    }

    fn set_fullscreen_state(&mut self, window: Window, fullscreen: bool) {
        self.fullscreen.insert(window, fullscreen);
    }

    fn set_client_list(&mut self, windows: &[Window]) {
        self.client_list = windows.to_vec();
    }

    fn select_client_input(&mut self, _window: Window) {}

    fn grab_buttons(&mut self, _window: Window, _focused: bool, _buttons: &[(u16, u8)]) {}

    fn ungrab_buttons(&mut self, _window: Window) {}

    fn grab_keys(&mut self, keys: &[(u16, u32)]) {
        self.grabbed_keys = keys.to_vec();
    }

    fn numlock_mask(&self) -> u16 {
        1 << 4
    }

    fn grab_pointer(&mut self, _cursor: CursorKind) -> bool {
        self.pointer_grabbed = true;
        true
    }

    fn ungrab_pointer(&mut self) {
        self.pointer_grabbed = false;
    }

    fn warp_pointer(&mut self, window: Option<Window>, x: i32, y: i32) {
        self.warps.push((window, x, y));
    }

    fn replay_pointer(&mut self) {}

    fn create_bar(&mut self, _rect: Rect) -> Option<Window> {
        let bar = self.allocate();
        self.bars.push(bar);
        Some(bar)
    }

    fn destroy_window(&mut self, window: Window) {
        self.bars.retain(|b| *b != window);
    }

    fn update_systray(&mut self, bar: Rect, visible: bool) {
        self.systray = Some((bar, visible));
    }

    fn spawn(&mut self, command: &[String]) -> Option<u32> {
        self.spawned.push(command.to_vec());
        Some(1000 + self.spawned.len() as u32)
    }

    fn next_event(&mut self) -> WmResult<WmEvent> {
        self.events
            .pop_front()
            .ok_or(WmError::Connection(ConnectionError::UnknownError))
    }

    fn discard_enter_events(&mut self) {
        self.events.retain(|e| !matches!(e, WmEvent::EnterNotify { .. }));
    }

    fn flush(&mut self) -> WmResult<()> {
        Ok(())
    }

    fn shutdown(&mut self) {
        self.shut_down = true;
        self.focused = None;
        self.active = None;
    }
}

/// A set-up manager on a single 1024x768 screen with no rules.
pub fn manager() -> WindowManager<FakeBackend> {
    manager_with(Settings {
        rules: Vec::new(),
        ..Settings::default()
    })
}

pub fn manager_with(settings: Settings) -> WindowManager<FakeBackend> {
    let mut wm = WindowManager::new(FakeBackend::new(), settings, Box::new(ChainTree));
    wm.setup();
    wm
}

/// A set-up manager with the given outputs.
pub fn manager_on(monitors: Vec<Rect>) -> WindowManager<FakeBackend> {
    let mut backend = FakeBackend::new();
    backend.screen = (
        monitors.iter().map(|m| m.right()).max().unwrap_or(1024),
        monitors.iter().map(|m| m.bottom()).max().unwrap_or(768),
    );
    backend.monitors = monitors;
    let settings = Settings {
        rules: Vec::new(),
        ..Settings::default()
    };
    let mut wm = WindowManager::new(backend, settings, Box::new(ChainTree));
    wm.setup();
    wm
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_adopts_viewable_windows() {
        let mut wm = manager();
        let viewable = wm.backend.add_window(Rect::new(0, 0, 200, 100));
        let hidden = wm.backend.add_window(Rect::new(0, 0, 200, 100));
        let popup = wm.backend.add_window(Rect::new(0, 0, 200, 100));
        let dialog = wm.backend.add_window(Rect::new(0, 0, 200, 100));
        for w in [viewable, popup, dialog] {
            if let Some(a) = wm.backend.attributes.get_mut(&w) {
                a.viewable = true;
            }
        }
        if let Some(a) = wm.backend.attributes.get_mut(&popup) {
            a.override_redirect = true;
        }
        wm.backend.info_mut(dialog).transient_for = Some(viewable);
        wm.scan();

        assert!(wm.clients.contains_key(&viewable));
        assert!(!wm.clients.contains_key(&hidden));
        assert!(!wm.clients.contains_key(&popup));
        assert!(wm.clients[&dialog].is_floating);
        assert_eq!(wm.backend.mapped.len(), 2);
    }

    #[test]
    fn test_run_stops_on_quit() {
        let mut wm = manager();
        wm.keys = vec![crate::window::manager::BoundKey {
            mask: 0,
            keysym: 0x71,
            action: tagwm_config::Action::Quit,
        }];
        wm.backend.events.push_back(WmEvent::KeyPress { keysym: 0x71, state: 0 });
        assert!(wm.run().is_ok());
        assert!(!wm.is_running());
    }
}
