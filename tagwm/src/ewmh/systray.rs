//! System tray: `_NET_SYSTEM_TRAY_S0` selection owner and XEMBED embedder.

use tracing::{debug, warn};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{
    AtomEnum, ChangeWindowAttributesAux, ClientMessageData, ClientMessageEvent, ConfigureWindowAux, ConnectionExt,
    CreateWindowAux, EventMask, PropMode, SetMode, StackMode, Window, WindowClass, CLIENT_MESSAGE_EVENT,
};
use x11rb::wrapper::ConnectionExt as _;
use x11rb::{COPY_DEPTH_FROM_PARENT, CURRENT_TIME};

use crate::core::context::Context;
use crate::core::props;
use crate::window::error::{log_and_ignore, WmResult};
use crate::window::geometry::Rect;

pub const SYSTEM_TRAY_REQUEST_DOCK: u32 = 0;
const ORIENTATION_HORZ: u32 = 0;

const XEMBED_EMBEDDED_NOTIFY: u32 = 0;
const XEMBED_WINDOW_ACTIVATE: u32 = 1;
const XEMBED_WINDOW_DEACTIVATE: u32 = 2;
const XEMBED_EMBEDDED_VERSION: u32 = 0;
const XEMBED_MAPPED: u32 = 1 << 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TrayIcon {
    window: Window,
    w: i32,
    h: i32,
    mapped: bool,
    /// Unmaps we caused ourselves and should not treat as the icon leaving.
    ignore_unmaps: u32,
}

pub struct Systray {
    pub window: Window,
    icons: Vec<TrayIcon>,
    spacing: i32,
    bar: Rect,
    visible: bool,
}

/// Width of an icon scaled to the bar height, keeping its aspect ratio.
fn icon_width(w: i32, h: i32, bar_h: i32) -> i32 {
    if h <= 0 || w <= 0 || w == h {
        return bar_h;
    }
    if h == bar_h {
        return w;
    }
    ((w as f32 * bar_h as f32 / h as f32) as i32).clamp(1, 2 * bar_h)
}

/// Tray window rect, right-aligned in `bar`, and each icon's x offset inside it.
fn arrange(bar: Rect, spacing: i32, widths: &[i32]) -> (Rect, Vec<i32>) {
    let mut offsets = Vec::with_capacity(widths.len());
    let mut x = 0;
    for w in widths {
        offsets.push(x);
        x += w + spacing;
    }
    let width = (x - spacing).max(1);
    (Rect::new(bar.right() - width, bar.y, width, bar.h), offsets)
}

impl Systray {
    /// Create the tray window and claim the selection. `None` when another tray owns it.
    pub fn new(ctx: &Context, spacing: i32, bar: Rect) -> WmResult<Option<Self>> {
        let conn = &ctx.conn;
        let atoms = &ctx.atoms;
        let black = conn.setup().roots[ctx.screen_num].black_pixel;

        let window = conn.generate_id()?;
        let aux = CreateWindowAux::new()
            .override_redirect(1)
            .background_pixel(black)
            .event_mask(EventMask::BUTTON_PRESS | EventMask::EXPOSURE);
        conn.create_window(
            COPY_DEPTH_FROM_PARENT,
            window,
            ctx.root_window,
            (bar.right() - 1) as i16,
            bar.y as i16,
            1,
            bar.h.max(1) as u16,
            0,
            WindowClass::INPUT_OUTPUT,
            0,
            &aux,
        )?;
        conn.change_property32(
            PropMode::REPLACE,
            window,
            atoms._NET_SYSTEM_TRAY_ORIENTATION,
            AtomEnum::CARDINAL,
            &[ORIENTATION_HORZ],
        )?;

        conn.set_selection_owner(window, atoms._NET_SYSTEM_TRAY_S0, CURRENT_TIME)?;
        let owner = conn.get_selection_owner(atoms._NET_SYSTEM_TRAY_S0)?.reply()?.owner;
        if owner != window {
            warn!("unable to obtain system tray selection, tray disabled");
            conn.destroy_window(window)?;
            return Ok(None);
        }

        let announce = ClientMessageEvent {
            response_type: CLIENT_MESSAGE_EVENT,
            format: 32,
            window: ctx.root_window,
            type_: atoms.MANAGER,
            data: ClientMessageData::from([CURRENT_TIME, atoms._NET_SYSTEM_TRAY_S0, window, 0, 0]),
            sequence: 0,
        };
        conn.send_event(false, ctx.root_window, EventMask::STRUCTURE_NOTIFY, announce)?;
        debug!("system tray window 0x{:x}", window);

        Ok(Some(Self { window, icons: Vec::new(), spacing, bar, visible: true }))
    }

    pub fn contains(&self, window: Window) -> bool {
        self.icons.iter().any(|i| i.window == window)
    }

    fn icon_mut(&mut self, window: Window) -> Option<&mut TrayIcon> {
        self.icons.iter_mut().find(|i| i.window == window)
    }

    fn send_xembed(ctx: &Context, icon: Window, message: u32, data1: u32, data2: u32) {
        let event = ClientMessageEvent {
            response_type: CLIENT_MESSAGE_EVENT,
            format: 32,
            window: icon,
            type_: ctx.atoms._XEMBED,
            data: ClientMessageData::from([CURRENT_TIME, message, 0, data1, data2]),
            sequence: 0,
        };
        log_and_ignore(ctx.conn.send_event(false, icon, EventMask::STRUCTURE_NOTIFY, event), "xembed message");
    }

    /// Embed an icon that asked to dock.
    pub fn dock(&mut self, ctx: &Context, icon: Window) {
        if icon == x11rb::NONE || self.contains(icon) {
            return;
        }
        let Some(geometry) = ctx.conn.get_geometry(icon).ok().and_then(|c| c.reply().ok()) else {
            return;
        };
        let conn = &ctx.conn;
        let black = conn.setup().roots[ctx.screen_num].black_pixel;

        log_and_ignore(conn.change_save_set(SetMode::INSERT, icon), "tray save set");
        log_and_ignore(conn.reparent_window(icon, self.window, 0, 0), "tray reparent");
        let aux = ChangeWindowAttributesAux::new()
            .event_mask(EventMask::STRUCTURE_NOTIFY | EventMask::PROPERTY_CHANGE | EventMask::RESIZE_REDIRECT)
            .background_pixel(black);
        log_and_ignore(conn.change_window_attributes(icon, &aux), "tray icon attributes");
        Self::send_xembed(ctx, icon, XEMBED_EMBEDDED_NOTIFY, self.window, XEMBED_EMBEDDED_VERSION);
        log_and_ignore(
            conn.change_property32(PropMode::REPLACE, icon, ctx.atoms.WM_STATE, ctx.atoms.WM_STATE, &[1, 0]),
            "tray icon state",
        );

        self.icons.push(TrayIcon {
            window: icon,
            w: geometry.width as i32,
            h: geometry.height as i32,
            mapped: false,
            ignore_unmaps: 0,
        });
        debug!("docked tray icon 0x{:x}", icon);
        self.xembed_changed(ctx, icon);
        self.layout(ctx);
    }

    /// Follow the icon's `_XEMBED_INFO` mapped flag. Icons without the property are shown.
    pub fn xembed_changed(&mut self, ctx: &Context, icon: Window) {
        let want_mapped = props::xembed_info(ctx, icon).map_or(true, |(_, flags)| flags & XEMBED_MAPPED != 0);
        let Some(entry) = self.icon_mut(icon) else {
            return;
        };
        if want_mapped {
            entry.mapped = true;
            log_and_ignore(ctx.conn.map_window(icon), "tray icon map");
            Self::send_xembed(ctx, icon, XEMBED_WINDOW_ACTIVATE, 0, XEMBED_EMBEDDED_VERSION);
        } else {
            if entry.mapped {
                entry.ignore_unmaps += 1;
            }
            entry.mapped = false;
            log_and_ignore(ctx.conn.unmap_window(icon), "tray icon unmap");
            Self::send_xembed(ctx, icon, XEMBED_WINDOW_DEACTIVATE, 0, XEMBED_EMBEDDED_VERSION);
        }
    }

    pub fn resize_request(&mut self, ctx: &Context, icon: Window, w: i32, h: i32) {
        if let Some(entry) = self.icon_mut(icon) {
            entry.w = w;
            entry.h = h;
            self.layout(ctx);
        }
    }

    /// An icon unmapped itself. Returns whether it was dropped.
    pub fn unmapped(&mut self, ctx: &Context, icon: Window) -> bool {
        if let Some(entry) = self.icon_mut(icon) {
            if entry.ignore_unmaps > 0 {
                entry.ignore_unmaps -= 1;
                return false;
            }
        }
        self.remove(ctx, icon)
    }

    pub fn remove(&mut self, ctx: &Context, icon: Window) -> bool {
        let before = self.icons.len();
        self.icons.retain(|i| i.window != icon);
        if self.icons.len() == before {
            return false;
        }
        debug!("removed tray icon 0x{:x}", icon);
        self.layout(ctx);
        true
    }

    /// Dock at the right end of `bar`, or hide.
    pub fn place(&mut self, ctx: &Context, bar: Rect, visible: bool) {
        self.bar = bar;
        self.visible = visible;
        self.layout(ctx);
    }

    fn layout(&mut self, ctx: &Context) {
        let conn = &ctx.conn;
        let bar_h = self.bar.h.max(1);
        let shown: Vec<usize> = (0..self.icons.len()).filter(|i| self.icons[*i].mapped).collect();
        if !self.visible || shown.is_empty() {
            log_and_ignore(conn.unmap_window(self.window), "tray unmap");
            return;
        }

        let widths: Vec<i32> = shown.iter().map(|i| icon_width(self.icons[*i].w, self.icons[*i].h, bar_h)).collect();
        let (rect, offsets) = arrange(self.bar, self.spacing, &widths);
        for ((&i, &w), &x) in shown.iter().zip(&widths).zip(&offsets) {
            let icon = &mut self.icons[i];
            icon.w = w;
            icon.h = bar_h;
            let aux = ConfigureWindowAux::new().x(x).y(0).width(w as u32).height(bar_h as u32);
            log_and_ignore(conn.configure_window(icon.window, &aux), "tray icon configure");
        }

        let aux = ConfigureWindowAux::new()
            .x(rect.x)
            .y(rect.y)
            .width(rect.w as u32)
            .height(rect.h.max(1) as u32);
        log_and_ignore(conn.configure_window(self.window, &aux), "tray configure");
        log_and_ignore(conn.map_window(self.window), "tray map");
        let raise = ConfigureWindowAux::new().stack_mode(StackMode::ABOVE);
        log_and_ignore(conn.configure_window(self.window, &raise), "tray raise");
    }

    /// Hand icons back to the root and give up the selection.
    pub fn destroy(&mut self, ctx: &Context) {
        let conn = &ctx.conn;
        for icon in self.icons.drain(..) {
            log_and_ignore(conn.reparent_window(icon.window, ctx.root_window, 0, 0), "tray release icon");
        }
        log_and_ignore(conn.unmap_window(self.window), "tray unmap");
        log_and_ignore(
            conn.set_selection_owner(x11rb::NONE, ctx.atoms._NET_SYSTEM_TRAY_S0, CURRENT_TIME),
            "tray selection",
        );
        log_and_ignore(conn.destroy_window(self.window), "tray destroy");
    }
}
