use x11rb::protocol::xproto::Window;

use crate::window::error::WmResult;
use crate::window::events::{ConfigureRequest, WmEvent};
use crate::window::geometry::{Rect, SizeHints};

/// Attributes of an unmanaged window as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowAttributes {
    pub rect: Rect,
    pub border: i32,
    pub override_redirect: bool,
    pub viewable: bool,
    /// WM_STATE says iconic.
    pub iconic: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WmHints {
    pub urgent: bool,
    /// The input hint, when the client set one.
    pub input: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowType {
    pub fullscreen: bool,
    pub dialog: bool,
}

/// Everything read from a window when it is first managed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowInfo {
    pub title: Option<String>,
    pub class: String,
    pub instance: String,
    pub transient_for: Option<Window>,
    pub size_hints: SizeHints,
    pub wm_hints: Option<WmHints>,
    pub window_type: WindowType,
    pub pid: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderColor {
    Focused,
    Normal,
    /// Unfocused tiled window while gaps are wider than borders.
    Gapped,
    Floating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    TakeFocus,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Withdrawn = 0,
    Normal = 1,
    Iconic = 3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorKind {
    Normal,
    Move,
    Resize,
}

/// Everything the manager asks of the display server.
///
/// Requests are fire-and-forget: implementations log failures and carry on.
/// Fatal conditions surface through `next_event` and `flush`.
pub trait Backend {
    fn root(&self) -> Window;
    fn screen_size(&self) -> (i32, i32);
    /// Output geometries in server order. Empty when none can be queried.
    fn monitor_geometries(&mut self) -> Vec<Rect>;

    fn window_attributes(&mut self, window: Window) -> Option<WindowAttributes>;
    fn window_info(&mut self, window: Window) -> WindowInfo;
    fn title(&mut self, window: Window) -> Option<String>;
    fn size_hints(&mut self, window: Window) -> SizeHints;
    fn wm_hints(&mut self, window: Window) -> Option<WmHints>;
    fn transient_for(&mut self, window: Window) -> Option<Window>;
    fn window_type(&mut self, window: Window) -> WindowType;
    fn root_name(&mut self) -> Option<String>;
    /// Children of the root, bottom to top.
    fn top_level_windows(&mut self) -> Vec<Window>;
    fn pointer_position(&mut self) -> Option<(i32, i32)>;
    /// Pointer position relative to `window`.
    fn pointer_in_window(&mut self, window: Window) -> Option<(i32, i32)>;

    /// Move, resize and set the border, then tell the client.
    fn configure(&mut self, window: Window, rect: Rect, border: i32);
    /// Synthetic ConfigureNotify describing the current geometry.
    fn send_configure_notify(&mut self, window: Window, rect: Rect, border: i32);
    fn move_window(&mut self, window: Window, x: i32, y: i32);
    fn move_resize(&mut self, window: Window, rect: Rect);
    fn set_border_width(&mut self, window: Window, border: i32);
    /// Pass a request from an unmanaged window through unchanged.
    fn forward_configure(&mut self, request: &ConfigureRequest);
    fn set_border_color(&mut self, window: Window, color: BorderColor);
    fn raise(&mut self, window: Window);
    /// Restack `windows` top to bottom directly beneath `sibling`.
    fn stack_below(&mut self, sibling: Option<Window>, windows: &[Window]);
    fn map(&mut self, window: Window);

    /// Give input focus to `window`, or to the root when `None`.
    fn set_input_focus(&mut self, window: Option<Window>);
    fn set_active_window(&mut self, window: Option<Window>);
    /// Send a WM_PROTOCOLS message when the client lists `protocol`.
    fn send_protocol(&mut self, window: Window, protocol: Protocol) -> bool;
    fn kill_client(&mut self, window: Window);
    fn set_client_state(&mut self, window: Window, state: ClientState);
    fn set_urgency_hint(&mut self, window: Window, urgent: bool);
    fn set_fullscreen_state(&mut self, window: Window, fullscreen: bool);
    fn set_client_list(&mut self, windows: &[Window]);
    fn select_client_input(&mut self, window: Window);

    /// Grab `buttons` (mask, button) on `window`, plus every button while unfocused.
    fn grab_buttons(&mut self, window: Window, focused: bool, buttons: &[(u16, u8)]);
    fn ungrab_buttons(&mut self, window: Window);
    /// Grab `keys` (mask, keysym) on the root.
    fn grab_keys(&mut self, keys: &[(u16, u32)]);
    fn numlock_mask(&self) -> u16;
    fn grab_pointer(&mut self, cursor: CursorKind) -> bool;
    fn ungrab_pointer(&mut self);
    /// Warp to `(x, y)` inside `window`, or by `(x, y)` when `None`.
    fn warp_pointer(&mut self, window: Option<Window>, x: i32, y: i32);
    fn replay_pointer(&mut self);

    fn create_bar(&mut self, rect: Rect) -> Option<Window>;
    fn destroy_window(&mut self, window: Window);
    /// Dock the tray at the right end of `bar`, or hide it.
    fn update_systray(&mut self, bar: Rect, visible: bool);

    fn spawn(&mut self, command: &[String]) -> Option<u32>;

    fn next_event(&mut self) -> WmResult<WmEvent>;
    /// Drop pending EnterNotify events.
    fn discard_enter_events(&mut self);
    fn flush(&mut self) -> WmResult<()>;
    /// Release server-side state before exiting.
    fn shutdown(&mut self);
}
