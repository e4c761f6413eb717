//! Property readers for ICCCM and EWMH client state.
//!
//! Every reader degrades to "absent" when the window is gone or the property
//! is malformed; callers never see protocol errors from here.

use x11rb::connection::Connection;
use x11rb::protocol::res::{ClientIdMask, ClientIdSpec, ConnectionExt as _};
use x11rb::protocol::xproto::{Atom, AtomEnum, ConnectionExt, GetPropertyReply, PropMode, Window};
use x11rb::wrapper::ConnectionExt as _;

use crate::core::context::Context;
use crate::window::backend::{WindowType, WmHints};
use crate::window::geometry::SizeHints;

const URGENCY_HINT: u32 = 1 << 8;
const INPUT_HINT: u32 = 1 << 0;
const ICONIC_STATE: u32 = 3;

fn get(ctx: &Context, window: Window, property: impl Into<Atom>, type_: impl Into<Atom>) -> Option<GetPropertyReply> {
    ctx.conn
        .get_property(false, window, property, type_, 0, u32::MAX / 4)
        .ok()?
        .reply()
        .ok()
        .filter(|r| r.type_ != u32::from(AtomEnum::NONE))
}

fn words(ctx: &Context, window: Window, property: impl Into<Atom>, type_: impl Into<Atom>) -> Vec<u32> {
    get(ctx, window, property, type_)
        .and_then(|r| r.value32().map(|v| v.collect()))
        .unwrap_or_default()
}

fn decode(bytes: &[u8]) -> Option<String> {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    let text = String::from_utf8_lossy(&bytes[..end]).into_owned();
    (!text.is_empty()).then_some(text)
}

/// Text property in any encoding, read as UTF-8.
pub fn text(ctx: &Context, window: Window, property: impl Into<Atom>) -> Option<String> {
    get(ctx, window, property, AtomEnum::ANY).and_then(|r| decode(&r.value))
}

/// `_NET_WM_NAME`, falling back to `WM_NAME`.
pub fn title(ctx: &Context, window: Window) -> Option<String> {
    text(ctx, window, ctx.atoms._NET_WM_NAME).or_else(|| text(ctx, window, AtomEnum::WM_NAME))
}

/// `(instance, class)` from WM_CLASS.
pub fn class_hint(ctx: &Context, window: Window) -> (String, String) {
    let Some(reply) = get(ctx, window, AtomEnum::WM_CLASS, AtomEnum::STRING) else {
        return Default::default();
    };
    let mut parts = reply.value.split(|b| *b == 0);
    let instance = parts.next().and_then(decode).unwrap_or_default();
    let class = parts.next().and_then(decode).unwrap_or_default();
    (instance, class)
}

pub fn transient_for(ctx: &Context, window: Window) -> Option<Window> {
    words(ctx, window, AtomEnum::WM_TRANSIENT_FOR, AtomEnum::WINDOW)
        .first()
        .copied()
        .filter(|w| *w != x11rb::NONE)
}

pub fn size_hints(ctx: &Context, window: Window) -> SizeHints {
    SizeHints::from_wm_normal_hints(&words(ctx, window, AtomEnum::WM_NORMAL_HINTS, AtomEnum::WM_SIZE_HINTS))
}

pub fn wm_hints(ctx: &Context, window: Window) -> Option<WmHints> {
    let words = words(ctx, window, AtomEnum::WM_HINTS, AtomEnum::WM_HINTS);
    let flags = *words.first()?;
    Some(WmHints {
        urgent: flags & URGENCY_HINT != 0,
        input: (flags & INPUT_HINT != 0).then(|| words.get(1).copied().unwrap_or(0) != 0),
    })
}

/// Set or clear the urgency flag in WM_HINTS, keeping the other fields.
pub fn set_urgency(ctx: &Context, window: Window, urgent: bool) {
    let mut words = words(ctx, window, AtomEnum::WM_HINTS, AtomEnum::WM_HINTS);
    if words.is_empty() {
        if !urgent {
            return;
        }
        words = vec![0; 9];
    }
    if urgent {
        words[0] |= URGENCY_HINT;
    } else {
        words[0] &= !URGENCY_HINT;
    }
    let _ = ctx
        .conn
        .change_property32(PropMode::REPLACE, window, AtomEnum::WM_HINTS, AtomEnum::WM_HINTS, &words);
}

fn atoms_of(ctx: &Context, window: Window, property: Atom) -> Vec<Atom> {
    words(ctx, window, property, AtomEnum::ATOM)
}

pub fn window_type(ctx: &Context, window: Window) -> WindowType {
    let atoms = &ctx.atoms;
    WindowType {
        fullscreen: atoms_of(ctx, window, atoms._NET_WM_STATE).contains(&atoms._NET_WM_STATE_FULLSCREEN),
        dialog: atoms_of(ctx, window, atoms._NET_WM_WINDOW_TYPE).contains(&atoms._NET_WM_WINDOW_TYPE_DIALOG),
    }
}

pub fn is_iconic(ctx: &Context, window: Window) -> bool {
    words(ctx, window, ctx.atoms.WM_STATE, ctx.atoms.WM_STATE).first() == Some(&ICONIC_STATE)
}

pub fn protocols(ctx: &Context, window: Window) -> Vec<Atom> {
    atoms_of(ctx, window, ctx.atoms.WM_PROTOCOLS)
}

/// Owning process, from the X-Resource extension or `_NET_WM_PID`. Zero when unknown.
pub fn pid(ctx: &Context, window: Window) -> u32 {
    let spec = ClientIdSpec { client: window, mask: ClientIdMask::LOCAL_CLIENT_PID };
    let from_res = ctx
        .conn
        .res_query_client_ids(&[spec])
        .ok()
        .and_then(|cookie| cookie.reply().ok())
        .and_then(|reply| {
            reply
                .ids
                .into_iter()
                .find(|id| id.spec.mask == ClientIdMask::LOCAL_CLIENT_PID)
                .and_then(|id| id.value.first().copied())
        });

    from_res
        .or_else(|| words(ctx, window, ctx.atoms._NET_WM_PID, AtomEnum::CARDINAL).first().copied())
        .unwrap_or(0)
}

/// `_XEMBED_INFO` as `(version, flags)`.
pub fn xembed_info(ctx: &Context, window: Window) -> Option<(u32, u32)> {
    let words = words(ctx, window, ctx.atoms._XEMBED_INFO, ctx.atoms._XEMBED_INFO);
    Some((*words.first()?, *words.get(1)?))
}

pub fn has_extension<C: Connection>(conn: &C, name: &'static str) -> bool {
    conn.extension_information(name).ok().flatten().is_some()
}
