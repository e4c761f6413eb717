//! The X11 implementation of [`Backend`] on top of an x11rb connection.

use std::collections::VecDeque;

use anyhow::Result;
use tagwm_config::{parse_color, Settings};
use tracing::{debug, info, warn};
use x11rb::connection::Connection;
use x11rb::protocol::randr::{self, ConnectionExt as _};
use x11rb::protocol::xproto::{
    Allow, AtomEnum, ButtonIndex, ChangeWindowAttributesAux, ClientMessageData, ClientMessageEvent, CloseDown,
    ConfigureNotifyEvent, ConfigureWindowAux, ConnectionExt, CreateWindowAux, EventMask, Grab, GrabMode, GrabStatus,
    InputFocus, Keycode, MapState, Mapping, ModMask, NotifyDetail, NotifyMode, Property, PropMode, StackMode, Window,
    WindowClass, CLIENT_MESSAGE_EVENT, CONFIGURE_NOTIFY_EVENT,
};
use x11rb::protocol::Event;
use x11rb::wrapper::ConnectionExt as _;
use x11rb::{COPY_DEPTH_FROM_PARENT, CURRENT_TIME};

use crate::core::context::Context;
use crate::core::cursors::Cursors;
use crate::core::props;
use crate::ewmh::setup::{teardown_hints, WM_NAME};
use crate::ewmh::systray::{Systray, SYSTEM_TRAY_REQUEST_DOCK};
use crate::window::backend::{
    Backend, BorderColor, ClientState, CursorKind, Protocol, WindowAttributes, WindowInfo, WindowType, WmHints,
};
use crate::window::error::{is_benign, log_and_ignore, log_warn, WmError, WmResult};
use crate::window::events::{
    ClientRequest, ConfigureRequest, PropertyKind, WmEvent, CONFIG_BORDER_WIDTH, CONFIG_HEIGHT, CONFIG_SIBLING,
    CONFIG_STACK_MODE, CONFIG_WIDTH, CONFIG_X, CONFIG_Y,
};
use crate::window::geometry::{Rect, SizeHints};

const XK_NUM_LOCK: u32 = 0xff7f;

struct BorderPixels {
    focused: u32,
    normal: u32,
    gapped: u32,
    floating: u32,
}

impl BorderPixels {
    fn from_settings(settings: &Settings) -> Self {
        let pixel = |name: &str, spec: &str| {
            parse_color(spec).unwrap_or_else(|| {
                warn!("invalid {} border color {:?}, using black", name, spec);
                0
            })
        };
        Self {
            focused: pixel("focused", &settings.colors.focused),
            normal: pixel("normal", &settings.colors.normal),
            gapped: pixel("gapped", &settings.colors.gapped),
            floating: pixel("floating", &settings.colors.floating),
        }
    }

    fn get(&self, color: BorderColor) -> u32 {
        match color {
            BorderColor::Focused => self.focused,
            BorderColor::Normal => self.normal,
            BorderColor::Gapped => self.gapped,
            BorderColor::Floating => self.floating,
        }
    }
}

/// Keycode to keysym table, first column only.
#[derive(Default)]
struct Keymap {
    min_keycode: Keycode,
    per_keycode: usize,
    keysyms: Vec<u32>,
}

impl Keymap {
    fn load(ctx: &Context) -> WmResult<Self> {
        let setup = ctx.conn.setup();
        let (min, max) = (setup.min_keycode, setup.max_keycode);
        let reply = ctx.conn.get_keyboard_mapping(min, max - min + 1)?.reply()?;
        Ok(Self {
            min_keycode: min,
            per_keycode: reply.keysyms_per_keycode as usize,
            keysyms: reply.keysyms,
        })
    }

    fn keysym(&self, keycode: Keycode) -> u32 {
        if self.per_keycode == 0 || keycode < self.min_keycode {
            return 0;
        }
        let index = (keycode - self.min_keycode) as usize * self.per_keycode;
        self.keysyms.get(index).copied().unwrap_or(0)
    }

    fn keycodes(&self, keysym: u32) -> Vec<Keycode> {
        if self.per_keycode == 0 {
            return Vec::new();
        }
        self.keysyms
            .chunks(self.per_keycode)
            .enumerate()
            .filter(|(_, syms)| syms.first() == Some(&keysym))
            .filter_map(|(i, _)| Keycode::try_from(i + self.min_keycode as usize).ok())
            .collect()
    }
}

pub struct X11Backend {
    ctx: Context,
    cursors: Cursors,
    check_window: Window,
    screen: (i32, i32),
    colors: BorderPixels,
    keymap: Keymap,
    numlock: u16,
    show_systray: bool,
    systray_spacing: i32,
    systray: Option<Systray>,
    systray_failed: bool,
    /// Events read ahead while discarding crossings.
    pending: VecDeque<Event>,
}

impl X11Backend {
    pub fn new(ctx: Context, check_window: Window, settings: &Settings) -> Result<Self> {
        let cursors = Cursors::new(&ctx.conn, ctx.screen_num)?;
        let values = ChangeWindowAttributesAux::new().cursor(cursors.normal);
        ctx.conn.change_window_attributes(ctx.root_window, &values)?;

        if !props::has_extension(&ctx.conn, randr::X11_EXTENSION_NAME) {
            warn!("RandR not available, using the whole screen as one monitor");
        }

        let screen = (ctx.screen_width as i32, ctx.screen_height as i32);
        let mut backend = Self {
            ctx,
            cursors,
            check_window,
            screen,
            colors: BorderPixels::from_settings(settings),
            keymap: Keymap::default(),
            numlock: 0,
            show_systray: settings.show_systray,
            systray_spacing: settings.systray_spacing,
            systray: None,
            systray_failed: false,
            pending: VecDeque::new(),
        };
        backend.refresh_keyboard()?;
        Ok(backend)
    }

    fn refresh_keyboard(&mut self) -> WmResult<()> {
        self.keymap = Keymap::load(&self.ctx)?;
        let numlock_codes = self.keymap.keycodes(XK_NUM_LOCK);
        let modmap = self.ctx.conn.get_modifier_mapping()?.reply()?;
        let per = modmap.keycodes_per_modifier() as usize;
        self.numlock = 0;
        if per > 0 {
            for (i, codes) in modmap.keycodes.chunks(per).enumerate().take(8) {
                if codes.iter().any(|c| *c != 0 && numlock_codes.contains(c)) {
                    self.numlock = 1 << i;
                }
            }
        }
        debug!("numlock modifier mask 0x{:x}", self.numlock);
        Ok(())
    }

    fn modifier_variants(&self) -> [u16; 4] {
        let lock = u16::from(ModMask::LOCK);
        [0, lock, self.numlock, self.numlock | lock]
    }

    fn is_tray_icon(&self, window: Window) -> bool {
        self.systray.as_ref().map_or(false, |s| s.contains(window))
    }

    fn property_kind(&self, window: Window, atom: u32) -> PropertyKind {
        let atoms = &self.ctx.atoms;
        if atom == u32::from(AtomEnum::WM_NAME) && window == self.ctx.root_window {
            PropertyKind::RootName
        } else if atom == u32::from(AtomEnum::WM_TRANSIENT_FOR) {
            PropertyKind::TransientFor
        } else if atom == u32::from(AtomEnum::WM_NORMAL_HINTS) {
            PropertyKind::NormalHints
        } else if atom == u32::from(AtomEnum::WM_HINTS) {
            PropertyKind::WmHints
        } else if atom == u32::from(AtomEnum::WM_NAME) || atom == atoms._NET_WM_NAME {
            PropertyKind::Title
        } else if atom == atoms._NET_WM_WINDOW_TYPE {
            PropertyKind::WindowType
        } else {
            PropertyKind::Other
        }
    }

    /// Turn a wire event into a manager event. Tray traffic is handled here and yields `None`.
    fn translate(&mut self, event: Event) -> WmResult<Option<WmEvent>> {
        let translated = match event {
            Event::Error(e) => {
                if is_benign(e.major_opcode, e.error_kind) {
                    debug!("ignoring {:?} from request {}", e.error_kind, e.major_opcode);
                    return Ok(None);
                }
                return Err(WmError::Protocol { major_opcode: e.major_opcode, kind: e.error_kind });
            }
            Event::MapRequest(e) => WmEvent::MapRequest { window: e.window },
            Event::ConfigureRequest(e) => WmEvent::ConfigureRequest(ConfigureRequest {
                window: e.window,
                x: e.x as i32,
                y: e.y as i32,
                width: e.width as i32,
                height: e.height as i32,
                border_width: e.border_width as i32,
                sibling: e.sibling,
                stack_mode: u32::from(e.stack_mode) as u8,
                value_mask: u16::from(e.value_mask),
            }),
            Event::ConfigureNotify(e) if e.window == self.ctx.root_window => {
                self.screen = (e.width as i32, e.height as i32);
                WmEvent::ConfigureNotify { width: e.width as i32, height: e.height as i32 }
            }
            Event::DestroyNotify(e) => {
                if let Some(tray) = self.systray.as_mut() {
                    tray.remove(&self.ctx, e.window);
                }
                WmEvent::DestroyNotify { window: e.window }
            }
            Event::UnmapNotify(e) => {
                if e.event == e.window && self.is_tray_icon(e.window) {
                    if let Some(tray) = self.systray.as_mut() {
                        tray.unmapped(&self.ctx, e.window);
                    }
                    return Ok(None);
                }
                WmEvent::UnmapNotify { window: e.window, synthetic: e.response_type & 0x80 != 0 }
            }
            Event::ResizeRequest(e) => {
                if let Some(tray) = self.systray.as_mut() {
                    tray.resize_request(&self.ctx, e.window, e.width as i32, e.height as i32);
                }
                return Ok(None);
            }
            Event::EnterNotify(e) => WmEvent::EnterNotify {
                window: e.event,
                normal: e.mode == NotifyMode::NORMAL && e.detail != NotifyDetail::INFERIOR,
            },
            Event::MotionNotify(e) => WmEvent::MotionNotify {
                window: e.event,
                root_x: e.root_x as i32,
                root_y: e.root_y as i32,
                time: e.time,
            },
            Event::ButtonPress(e) => WmEvent::ButtonPress { window: e.event, button: e.detail, state: u16::from(e.state) },
            Event::ButtonRelease(e) => WmEvent::ButtonRelease { window: e.event, button: e.detail },
            Event::KeyPress(e) => WmEvent::KeyPress { keysym: self.keymap.keysym(e.detail), state: u16::from(e.state) },
            Event::FocusIn(e) => WmEvent::FocusIn { window: e.event },
            Event::PropertyNotify(e) => {
                if e.atom == self.ctx.atoms._XEMBED_INFO && self.is_tray_icon(e.window) {
                    if let Some(tray) = self.systray.as_mut() {
                        tray.xembed_changed(&self.ctx, e.window);
                    }
                    return Ok(None);
                }
                WmEvent::PropertyNotify {
                    window: e.window,
                    kind: self.property_kind(e.window, e.atom),
                    deleted: e.state == Property::DELETE,
                }
            }
            Event::ClientMessage(e) => {
                let data = e.data.as_data32();
                let atoms = &self.ctx.atoms;
                let tray_window = self.systray.as_ref().map(|s| s.window);
                if e.type_ == atoms._NET_SYSTEM_TRAY_OP && Some(e.window) == tray_window {
                    if data[1] == SYSTEM_TRAY_REQUEST_DOCK {
                        if let Some(tray) = self.systray.as_mut() {
                            tray.dock(&self.ctx, data[2]);
                        }
                    }
                    return Ok(None);
                }
                let request = if e.type_ == atoms._NET_WM_STATE
                    && (data[1] == atoms._NET_WM_STATE_FULLSCREEN || data[2] == atoms._NET_WM_STATE_FULLSCREEN)
                {
                    ClientRequest::Fullscreen { action: data[0] }
                } else if e.type_ == atoms._NET_ACTIVE_WINDOW {
                    ClientRequest::ActiveWindow
                } else {
                    ClientRequest::Other
                };
                WmEvent::ClientMessage { window: e.window, request }
            }
            Event::MappingNotify(e) => {
                let keyboard = e.request == Mapping::KEYBOARD;
                if keyboard {
                    self.refresh_keyboard()?;
                }
                WmEvent::MappingNotify { keyboard }
            }
            Event::Expose(e) => WmEvent::Expose { window: e.window, count: e.count },
            _ => return Ok(None),
        };
        Ok(Some(translated))
    }

    fn configure_aux(rect: Rect) -> ConfigureWindowAux {
        ConfigureWindowAux::new()
            .x(rect.x)
            .y(rect.y)
            .width(rect.w.max(1) as u32)
            .height(rect.h.max(1) as u32)
    }
}

impl Backend for X11Backend {
    fn root(&self) -> Window {
        self.ctx.root_window
    }

    fn screen_size(&self) -> (i32, i32) {
        self.screen
    }

    fn monitor_geometries(&mut self) -> Vec<Rect> {
        let reply = self
            .ctx
            .conn
            .randr_get_monitors(self.ctx.root_window, true)
            .ok()
            .and_then(|cookie| cookie.reply().ok());
        reply
            .map(|r| {
                r.monitors
                    .iter()
                    .map(|m| Rect::new(m.x as i32, m.y as i32, m.width as i32, m.height as i32))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn window_attributes(&mut self, window: Window) -> Option<WindowAttributes> {
        let attrs = self.ctx.conn.get_window_attributes(window).ok()?.reply().ok()?;
        let geometry = self.ctx.conn.get_geometry(window).ok()?.reply().ok()?;
        Some(WindowAttributes {
            rect: Rect::new(geometry.x as i32, geometry.y as i32, geometry.width as i32, geometry.height as i32),
            border: geometry.border_width as i32,
            override_redirect: attrs.override_redirect,
            viewable: attrs.map_state == MapState::VIEWABLE,
            iconic: props::is_iconic(&self.ctx, window),
        })
    }

    fn window_info(&mut self, window: Window) -> WindowInfo {
        let (instance, class) = props::class_hint(&self.ctx, window);
        WindowInfo {
            title: props::title(&self.ctx, window),
            class,
            instance,
            transient_for: props::transient_for(&self.ctx, window),
            size_hints: props::size_hints(&self.ctx, window),
            wm_hints: props::wm_hints(&self.ctx, window),
            window_type: props::window_type(&self.ctx, window),
            pid: props::pid(&self.ctx, window),
        }
    }

    fn title(&mut self, window: Window) -> Option<String> {
        props::title(&self.ctx, window)
    }

    fn size_hints(&mut self, window: Window) -> SizeHints {
        props::size_hints(&self.ctx, window)
    }

    fn wm_hints(&mut self, window: Window) -> Option<WmHints> {
        props::wm_hints(&self.ctx, window)
    }

    fn transient_for(&mut self, window: Window) -> Option<Window> {
        props::transient_for(&self.ctx, window)
    }

    fn window_type(&mut self, window: Window) -> WindowType {
        props::window_type(&self.ctx, window)
    }

    fn root_name(&mut self) -> Option<String> {
        props::text(&self.ctx, self.ctx.root_window, AtomEnum::WM_NAME)
    }

    fn top_level_windows(&mut self) -> Vec<Window> {
        self.ctx
            .conn
            .query_tree(self.ctx.root_window)
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .map(|tree| tree.children)
            .unwrap_or_default()
    }

    fn pointer_position(&mut self) -> Option<(i32, i32)> {
        let reply = self.ctx.conn.query_pointer(self.ctx.root_window).ok()?.reply().ok()?;
        Some((reply.root_x as i32, reply.root_y as i32))
    }

    fn pointer_in_window(&mut self, window: Window) -> Option<(i32, i32)> {
        let reply = self.ctx.conn.query_pointer(window).ok()?.reply().ok()?;
        reply.same_screen.then_some((reply.win_x as i32, reply.win_y as i32))
    }

    fn configure(&mut self, window: Window, rect: Rect, border: i32) {
        let aux = Self::configure_aux(rect).border_width(border.max(0) as u32);
        log_and_ignore(self.ctx.conn.configure_window(window, &aux), "configure");
        self.send_configure_notify(window, rect, border);
    }

    fn send_configure_notify(&mut self, window: Window, rect: Rect, border: i32) {
        let event = ConfigureNotifyEvent {
            response_type: CONFIGURE_NOTIFY_EVENT,
            sequence: 0,
            event: window,
            window,
            above_sibling: x11rb::NONE,
            x: rect.x as i16,
            y: rect.y as i16,
            width: rect.w.max(1) as u16,
            height: rect.h.max(1) as u16,
            border_width: border.max(0) as u16,
            override_redirect: false,
        };
        log_and_ignore(
            self.ctx.conn.send_event(false, window, EventMask::STRUCTURE_NOTIFY, event),
            "configure notify",
        );
    }

    fn move_window(&mut self, window: Window, x: i32, y: i32) {
        let aux = ConfigureWindowAux::new().x(x).y(y);
        log_and_ignore(self.ctx.conn.configure_window(window, &aux), "move");
    }

    fn move_resize(&mut self, window: Window, rect: Rect) {
        log_and_ignore(self.ctx.conn.configure_window(window, &Self::configure_aux(rect)), "move resize");
    }

    fn set_border_width(&mut self, window: Window, border: i32) {
        let aux = ConfigureWindowAux::new().border_width(border.max(0) as u32);
        log_and_ignore(self.ctx.conn.configure_window(window, &aux), "border width");
    }

    fn forward_configure(&mut self, request: &ConfigureRequest) {
        let mut aux = ConfigureWindowAux::new();
        if request.has(CONFIG_X) {
            aux = aux.x(request.x);
        }
        if request.has(CONFIG_Y) {
            aux = aux.y(request.y);
        }
        if request.has(CONFIG_WIDTH) {
            aux = aux.width(request.width.max(1) as u32);
        }
        if request.has(CONFIG_HEIGHT) {
            aux = aux.height(request.height.max(1) as u32);
        }
        if request.has(CONFIG_BORDER_WIDTH) {
            aux = aux.border_width(request.border_width.max(0) as u32);
        }
        if request.has(CONFIG_SIBLING) {
            aux = aux.sibling(request.sibling);
        }
        if request.has(CONFIG_STACK_MODE) {
            aux = aux.stack_mode(StackMode::from(request.stack_mode));
        }
        log_and_ignore(self.ctx.conn.configure_window(request.window, &aux), "forward configure");
    }

    fn set_border_color(&mut self, window: Window, color: BorderColor) {
        let aux = ChangeWindowAttributesAux::new().border_pixel(self.colors.get(color));
        log_and_ignore(self.ctx.conn.change_window_attributes(window, &aux), "border color");
    }

    fn raise(&mut self, window: Window) {
        let aux = ConfigureWindowAux::new().stack_mode(StackMode::ABOVE);
        log_and_ignore(self.ctx.conn.configure_window(window, &aux), "raise");
    }

    fn stack_below(&mut self, sibling: Option<Window>, windows: &[Window]) {
        let mut sibling = sibling;
        for &window in windows {
            let mut aux = ConfigureWindowAux::new().stack_mode(StackMode::BELOW);
            if let Some(s) = sibling {
                aux = aux.sibling(s);
            }
            log_and_ignore(self.ctx.conn.configure_window(window, &aux), "restack");
            sibling = Some(window);
        }
    }

    fn map(&mut self, window: Window) {
        log_and_ignore(self.ctx.conn.map_window(window), "map");
    }

    fn set_input_focus(&mut self, window: Option<Window>) {
        let target = window.unwrap_or(self.ctx.root_window);
        log_and_ignore(
            self.ctx.conn.set_input_focus(InputFocus::POINTER_ROOT, target, CURRENT_TIME),
            "set input focus",
        );
    }

    fn set_active_window(&mut self, window: Option<Window>) {
        let (root, atom) = (self.ctx.root_window, self.ctx.atoms._NET_ACTIVE_WINDOW);
        let result = match window {
            Some(w) => self.ctx.conn.change_property32(PropMode::REPLACE, root, atom, AtomEnum::WINDOW, &[w]),
            None => self.ctx.conn.delete_property(root, atom),
        };
        log_and_ignore(result, "active window");
    }

    fn send_protocol(&mut self, window: Window, protocol: Protocol) -> bool {
        let atom = match protocol {
            Protocol::TakeFocus => self.ctx.atoms.WM_TAKE_FOCUS,
            Protocol::Delete => self.ctx.atoms.WM_DELETE_WINDOW,
        };
        if !props::protocols(&self.ctx, window).contains(&atom) {
            return false;
        }
        let event = ClientMessageEvent {
            response_type: CLIENT_MESSAGE_EVENT,
            format: 32,
            window,
            type_: self.ctx.atoms.WM_PROTOCOLS,
            data: ClientMessageData::from([atom, CURRENT_TIME, 0, 0, 0]),
            sequence: 0,
        };
        log_and_ignore(self.ctx.conn.send_event(false, window, EventMask::NO_EVENT, event), "wm protocol");
        true
    }

    fn kill_client(&mut self, window: Window) {
        let conn = &self.ctx.conn;
        log_and_ignore(conn.grab_server(), "grab server");
        log_and_ignore(conn.set_close_down_mode(CloseDown::DESTROY_ALL), "close down mode");
        log_and_ignore(conn.kill_client(window), "kill client");
        log_and_ignore(conn.ungrab_server(), "ungrab server");
    }

    fn set_client_state(&mut self, window: Window, state: ClientState) {
        let atom = self.ctx.atoms.WM_STATE;
        log_and_ignore(
            self.ctx
                .conn
                .change_property32(PropMode::REPLACE, window, atom, atom, &[state as u32, x11rb::NONE]),
            "client state",
        );
    }

    fn set_urgency_hint(&mut self, window: Window, urgent: bool) {
        props::set_urgency(&self.ctx, window, urgent);
    }

    fn set_fullscreen_state(&mut self, window: Window, fullscreen: bool) {
        let atoms = &self.ctx.atoms;
        let state: &[u32] = if fullscreen { &[atoms._NET_WM_STATE_FULLSCREEN] } else { &[] };
        log_and_ignore(
            self.ctx
                .conn
                .change_property32(PropMode::REPLACE, window, atoms._NET_WM_STATE, AtomEnum::ATOM, state),
            "fullscreen state",
        );
    }

    fn set_client_list(&mut self, windows: &[Window]) {
        let (root, atom) = (self.ctx.root_window, self.ctx.atoms._NET_CLIENT_LIST);
        log_and_ignore(
            self.ctx.conn.change_property32(PropMode::REPLACE, root, atom, AtomEnum::WINDOW, windows),
            "client list",
        );
    }

    fn select_client_input(&mut self, window: Window) {
        let aux = ChangeWindowAttributesAux::new().event_mask(
            EventMask::ENTER_WINDOW | EventMask::FOCUS_CHANGE | EventMask::PROPERTY_CHANGE | EventMask::STRUCTURE_NOTIFY,
        );
        log_and_ignore(self.ctx.conn.change_window_attributes(window, &aux), "select input");
    }

    fn grab_buttons(&mut self, window: Window, focused: bool, buttons: &[(u16, u8)]) {
        let conn = &self.ctx.conn;
        let mask = EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE;
        log_and_ignore(conn.ungrab_button(ButtonIndex::ANY, window, ModMask::ANY), "ungrab buttons");
        if !focused {
            log_and_ignore(
                conn.grab_button(
                    false,
                    window,
                    mask,
                    GrabMode::SYNC,
                    GrabMode::SYNC,
                    x11rb::NONE,
                    x11rb::NONE,
                    ButtonIndex::ANY,
                    ModMask::ANY,
                ),
                "grab any button",
            );
        }
        for &(modifiers, button) in buttons {
            for variant in self.modifier_variants() {
                log_and_ignore(
                    conn.grab_button(
                        false,
                        window,
                        mask,
                        GrabMode::ASYNC,
                        GrabMode::SYNC,
                        x11rb::NONE,
                        x11rb::NONE,
                        ButtonIndex::from(button),
                        ModMask::from(modifiers | variant),
                    ),
                    "grab button",
                );
            }
        }
    }

    fn ungrab_buttons(&mut self, window: Window) {
        log_and_ignore(self.ctx.conn.ungrab_button(ButtonIndex::ANY, window, ModMask::ANY), "ungrab buttons");
    }

    fn grab_keys(&mut self, keys: &[(u16, u32)]) {
        let root = self.ctx.root_window;
        log_and_ignore(self.ctx.conn.ungrab_key(Grab::ANY, root, ModMask::ANY), "ungrab keys");
        for &(modifiers, keysym) in keys {
            for keycode in self.keymap.keycodes(keysym) {
                for variant in self.modifier_variants() {
                    log_and_ignore(
                        self.ctx.conn.grab_key(
                            true,
                            root,
                            ModMask::from(modifiers | variant),
                            keycode,
                            GrabMode::ASYNC,
                            GrabMode::ASYNC,
                        ),
                        "grab key",
                    );
                }
            }
        }
    }

    fn numlock_mask(&self) -> u16 {
        self.numlock
    }

    fn grab_pointer(&mut self, cursor: CursorKind) -> bool {
        let reply = self
            .ctx
            .conn
            .grab_pointer(
                false,
                self.ctx.root_window,
                EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                x11rb::NONE,
                self.cursors.get(cursor),
                CURRENT_TIME,
            )
            .ok()
            .and_then(|cookie| cookie.reply().ok());
        matches!(reply, Some(r) if r.status == GrabStatus::SUCCESS)
    }

    fn ungrab_pointer(&mut self) {
        log_and_ignore(self.ctx.conn.ungrab_pointer(CURRENT_TIME), "ungrab pointer");
    }

    fn warp_pointer(&mut self, window: Option<Window>, x: i32, y: i32) {
        let target = window.unwrap_or(x11rb::NONE);
        log_and_ignore(
            self.ctx
                .conn
                .warp_pointer(x11rb::NONE, target, 0, 0, 0, 0, x as i16, y as i16),
            "warp pointer",
        );
    }

    fn replay_pointer(&mut self) {
        log_and_ignore(self.ctx.conn.allow_events(Allow::REPLAY_POINTER, CURRENT_TIME), "replay pointer");
    }

    fn create_bar(&mut self, rect: Rect) -> Option<Window> {
        let conn = &self.ctx.conn;
        let window = log_warn(conn.generate_id(), "bar id")?;
        let black = conn.setup().roots[self.ctx.screen_num].black_pixel;
        let aux = CreateWindowAux::new()
            .override_redirect(1)
            .background_pixel(black)
            .event_mask(EventMask::BUTTON_PRESS | EventMask::EXPOSURE)
            .cursor(self.cursors.normal);
        log_warn(
            conn.create_window(
                COPY_DEPTH_FROM_PARENT,
                window,
                self.ctx.root_window,
                rect.x as i16,
                rect.y as i16,
                rect.w.max(1) as u16,
                rect.h.max(1) as u16,
                0,
                WindowClass::INPUT_OUTPUT,
                0,
                &aux,
            ),
            "create bar",
        )?;
        let class = format!("{0}\0{0}\0", WM_NAME);
        log_and_ignore(
            conn.change_property8(PropMode::REPLACE, window, AtomEnum::WM_CLASS, AtomEnum::STRING, class.as_bytes()),
            "bar class",
        );
        log_and_ignore(conn.map_window(window), "map bar");
        self.raise(window);
        Some(window)
    }

    fn destroy_window(&mut self, window: Window) {
        log_and_ignore(self.ctx.conn.unmap_window(window), "unmap");
        log_and_ignore(self.ctx.conn.destroy_window(window), "destroy");
    }

    fn update_systray(&mut self, bar: Rect, visible: bool) {
        if !self.show_systray || self.systray_failed {
            return;
        }
        if self.systray.is_none() {
            match Systray::new(&self.ctx, self.systray_spacing, bar) {
                Ok(Some(tray)) => self.systray = Some(tray),
                Ok(None) => {
                    self.systray_failed = true;
                    return;
                }
                Err(e) => {
                    warn!("system tray unavailable: {}", e);
                    self.systray_failed = true;
                    return;
                }
            }
        }
        if let Some(tray) = self.systray.as_mut() {
            tray.place(&self.ctx, bar, visible);
        }
    }

    fn spawn(&mut self, command: &[String]) -> Option<u32> {
        log_warn(tagwm_utils::spawn(command), "spawn")
    }

    fn next_event(&mut self) -> WmResult<WmEvent> {
        loop {
            let event = match self.pending.pop_front() {
                Some(event) => event,
                None => self.ctx.conn.wait_for_event()?,
            };
            if let Some(event) = self.translate(event)? {
                return Ok(event);
            }
        }
    }

    fn discard_enter_events(&mut self) {
        // Round trip so every crossing caused by our requests has arrived
        let synced = self
            .ctx
            .conn
            .get_input_focus()
            .map_err(WmError::from)
            .and_then(|cookie| cookie.reply().map_err(WmError::from));
        if log_warn(synced, "sync").is_none() {
            return;
        }
        while let Ok(Some(event)) = self.ctx.conn.poll_for_event() {
            if !matches!(event, Event::EnterNotify(_)) {
                self.pending.push_back(event);
            }
        }
        self.pending.retain(|e| !matches!(e, Event::EnterNotify(_)));
    }

    fn flush(&mut self) -> WmResult<()> {
        self.ctx.conn.flush()?;
        Ok(())
    }

    fn shutdown(&mut self) {
        let root = self.ctx.root_window;
        log_and_ignore(self.ctx.conn.ungrab_key(Grab::ANY, root, ModMask::ANY), "ungrab keys");
        if let Some(mut tray) = self.systray.take() {
            tray.destroy(&self.ctx);
        }
        log_and_ignore(
            self.ctx
                .conn
                .set_input_focus(InputFocus::POINTER_ROOT, InputFocus::POINTER_ROOT, CURRENT_TIME),
            "focus pointer root",
        );
        log_and_ignore(teardown_hints(&self.ctx, self.check_window), "teardown hints");
        for cursor in [self.cursors.normal, self.cursors.move_, self.cursors.resize] {
            log_and_ignore(self.ctx.conn.free_cursor(cursor), "free cursor");
        }
        log_and_ignore(self.ctx.conn.flush(), "flush");
        info!("released the display");
    }
}
