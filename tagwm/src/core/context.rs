use tracing::debug;
use x11rb::connection::Connection;
use x11rb::errors::ReplyError;
use x11rb::protocol::xproto::{ChangeWindowAttributesAux, ConnectionExt, EventMask};
use x11rb::protocol::ErrorKind;
use x11rb::rust_connection::RustConnection;

use crate::ewmh::atoms::AtomCollection;
use crate::window::error::{WmError, WmResult};

pub struct Context {
    pub conn: RustConnection,
    pub screen_num: usize,
    pub root_window: u32,
    pub atoms: AtomCollection,
    pub screen_width: u16,
    pub screen_height: u16,
}

impl Context {
    /// Connect and take the window manager role on the default screen.
    pub fn new() -> WmResult<Self> {
        let (conn, screen_num) = x11rb::connect(None)?;
        let screen = &conn.setup().roots[screen_num];
        let root_window = screen.root;
        let screen_width = screen.width_in_pixels;
        let screen_height = screen.height_in_pixels;

        // Only one client may select SubstructureRedirect on the root
        let values = ChangeWindowAttributesAux::new().event_mask(EventMask::SUBSTRUCTURE_REDIRECT);
        match conn.change_window_attributes(root_window, &values)?.check() {
            Ok(()) => {}
            Err(ReplyError::X11Error(e)) if e.error_kind == ErrorKind::Access => {
                return Err(WmError::AnotherWmRunning);
            }
            Err(e) => return Err(e.into()),
        }

        let values = ChangeWindowAttributesAux::new().event_mask(
            EventMask::SUBSTRUCTURE_REDIRECT
                | EventMask::SUBSTRUCTURE_NOTIFY
                | EventMask::BUTTON_PRESS
                | EventMask::POINTER_MOTION
                | EventMask::ENTER_WINDOW
                | EventMask::LEAVE_WINDOW
                | EventMask::STRUCTURE_NOTIFY
                | EventMask::PROPERTY_CHANGE,
        );
        conn.change_window_attributes(root_window, &values)?;

        let atoms = AtomCollection::new(&conn)?.reply()?;
        debug!("connected to screen {} ({}x{})", screen_num, screen_width, screen_height);

        Ok(Self { conn, screen_num, root_window, atoms, screen_width, screen_height })
    }
}
