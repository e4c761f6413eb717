use tagwm_config::AttachDirection;
use x11rb::protocol::xproto::Window;

/// What the attach policies need to know about the monitor.
pub struct AttachContext<'a> {
    /// The monitor's current selection and whether it floats.
    pub selection: Option<(Window, bool)>,
    pub nmaster: i32,
    /// Whether a window is tiled and shares a tag with the window being attached.
    pub tiled_on_tags: &'a dyn Fn(Window) -> bool,
}

/// Index in `clients` at which a new window is inserted.
pub fn insertion_index(
    direction: AttachDirection,
    clients: &[Window],
    ctx: &AttachContext<'_>,
) -> usize {
    let position = |w: Window| clients.iter().position(|c| *c == w);
    match direction {
        AttachDirection::Front => 0,
        AttachDirection::Above => match ctx.selection {
            Some((sel, false)) if clients.first() != Some(&sel) => position(sel).unwrap_or(0),
            _ => 0,
        },
        AttachDirection::Aside => clients
            .iter()
            .position(|w| (ctx.tiled_on_tags)(*w))
            .map(|i| i + 1)
            .unwrap_or(0),
        AttachDirection::Below => match ctx.selection {
            Some((sel, false)) => position(sel).map(|i| i + 1).unwrap_or(0),
            _ => 0,
        },
        AttachDirection::Bottom => clients.len(),
        AttachDirection::Top => {
            if clients.is_empty() {
                return 0;
            }
            // Walk to the nmaster-th tiled window, stopping at the tail.
            let mut seen = 1;
            let mut below = 0;
            while below + 1 < clients.len()
                && (!(ctx.tiled_on_tags)(clients[below]) || seen != ctx.nmaster)
            {
                if (ctx.tiled_on_tags)(clients[below]) {
                    seen += 1;
                }
                below += 1;
            }
            below + 1
        }
    }
}

/// Insert `window` into `clients` following `direction`.
pub fn attach(
    clients: &mut Vec<Window>,
    window: Window,
    direction: AttachDirection,
    ctx: &AttachContext<'_>,
) {
    let index = insertion_index(direction, clients, ctx).min(clients.len());
    clients.insert(index, window);
}

/// Push `window` onto the focus stack, either on top or right behind `behind`.
pub fn attach_stack(stack: &mut Vec<Window>, window: Window, behind: Option<Window>) {
    let index = behind
        .and_then(|b| stack.iter().position(|w| *w == b))
        .map(|i| i + 1)
        .unwrap_or(0);
    stack.insert(index, window);
}
