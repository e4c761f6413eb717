use x11rb::protocol::xproto::Window;

/// Which property changed, as far as the manager cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    RootName,
    TransientFor,
    NormalHints,
    WmHints,
    Title,
    WindowType,
    Other,
}

/// Client messages addressed to managed windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientRequest {
    /// `_NET_WM_STATE` naming the fullscreen atom; 0 remove, 1 add, 2 toggle.
    Fullscreen { action: u32 },
    ActiveWindow,
    Other,
}

// ConfigureWindow value mask bits
pub const CONFIG_X: u16 = 1 << 0;
pub const CONFIG_Y: u16 = 1 << 1;
pub const CONFIG_WIDTH: u16 = 1 << 2;
pub const CONFIG_HEIGHT: u16 = 1 << 3;
pub const CONFIG_BORDER_WIDTH: u16 = 1 << 4;
pub const CONFIG_SIBLING: u16 = 1 << 5;
pub const CONFIG_STACK_MODE: u16 = 1 << 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigureRequest {
    pub window: Window,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub border_width: i32,
    pub sibling: Window,
    pub stack_mode: u8,
    pub value_mask: u16,
}

impl ConfigureRequest {
    pub fn has(&self, bits: u16) -> bool {
        self.value_mask & bits != 0
    }
}

/// Display server notifications after translation from the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WmEvent {
    MapRequest { window: Window },
    ConfigureRequest(ConfigureRequest),
    /// Only emitted for the root window.
    ConfigureNotify { width: i32, height: i32 },
    DestroyNotify { window: Window },
    UnmapNotify { window: Window, synthetic: bool },
    /// `normal` is false for grab crossings and inferior crossings.
    EnterNotify { window: Window, normal: bool },
    MotionNotify { window: Window, root_x: i32, root_y: i32, time: u32 },
    ButtonPress { window: Window, button: u8, state: u16 },
    ButtonRelease { window: Window, button: u8 },
    KeyPress { keysym: u32, state: u16 },
    FocusIn { window: Window },
    PropertyNotify { window: Window, kind: PropertyKind, deleted: bool },
    ClientMessage { window: Window, request: ClientRequest },
    /// Keyboard mapping changed; keys must be grabbed again.
    MappingNotify { keyboard: bool },
    Expose { window: Window, count: u16 },
}
