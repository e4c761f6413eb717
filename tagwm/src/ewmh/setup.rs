use x11rb::connection::Connection;
use x11rb::protocol::xproto::{AtomEnum, ConnectionExt, CreateWindowAux, PropMode, Window, WindowClass};
use x11rb::wrapper::ConnectionExt as _;

use crate::core::context::Context;
use crate::window::error::WmResult;

pub const WM_NAME: &str = "tagwm";

/// Publish the supporting-WM check window and the supported hints.
/// Returns the check window so it can be destroyed on exit.
pub fn setup_hints(ctx: &Context) -> WmResult<Window> {
    // 1. Dummy window for _NET_SUPPORTING_WM_CHECK
    let check_win = ctx.conn.generate_id()?;
    ctx.conn.create_window(
        x11rb::COPY_DEPTH_FROM_PARENT,
        check_win,
        ctx.root_window,
        0, 0, 1, 1, 0,
        WindowClass::INPUT_OUTPUT,
        0,
        &CreateWindowAux::new(),
    )?;

    // 2. It points at itself and carries our name
    ctx.conn.change_property32(
        PropMode::REPLACE,
        check_win,
        ctx.atoms._NET_SUPPORTING_WM_CHECK,
        AtomEnum::WINDOW,
        &[check_win],
    )?;
    ctx.conn.change_property8(
        PropMode::REPLACE,
        check_win,
        ctx.atoms._NET_WM_NAME,
        ctx.atoms.UTF8_STRING,
        WM_NAME.as_bytes(),
    )?;

    // 3. Root points at the check window
    ctx.conn.change_property32(
        PropMode::REPLACE,
        ctx.root_window,
        ctx.atoms._NET_SUPPORTING_WM_CHECK,
        AtomEnum::WINDOW,
        &[check_win],
    )?;

    // 4. _NET_SUPPORTED
    let supported = [
        ctx.atoms._NET_SUPPORTED,
        ctx.atoms._NET_WM_NAME,
        ctx.atoms._NET_WM_STATE,
        ctx.atoms._NET_SUPPORTING_WM_CHECK,
        ctx.atoms._NET_WM_STATE_FULLSCREEN,
        ctx.atoms._NET_ACTIVE_WINDOW,
        ctx.atoms._NET_WM_WINDOW_TYPE,
        ctx.atoms._NET_WM_WINDOW_TYPE_DIALOG,
        ctx.atoms._NET_CLIENT_LIST,
    ];
    ctx.conn.change_property32(
        PropMode::REPLACE,
        ctx.root_window,
        ctx.atoms._NET_SUPPORTED,
        AtomEnum::ATOM,
        &supported,
    )?;

    // 5. Stale client list from a previous manager
    ctx.conn.delete_property(ctx.root_window, ctx.atoms._NET_CLIENT_LIST)?;

    Ok(check_win)
}

/// Undo `setup_hints`.
pub fn teardown_hints(ctx: &Context, check_win: Window) -> WmResult<()> {
    ctx.conn.destroy_window(check_win)?;
    ctx.conn.delete_property(ctx.root_window, ctx.atoms._NET_SUPPORTING_WM_CHECK)?;
    ctx.conn.delete_property(ctx.root_window, ctx.atoms._NET_ACTIVE_WINDOW)?;
    Ok(())
}
