//! Placement algorithms. Everything here is pure: the manager feeds in the
//! visible tiled windows and applies the returned placements.

use std::fmt;

use x11rb::protocol::xproto::Window;

use crate::window::geometry::Rect;

/// A tiled window and its share weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tiled {
    pub window: Window,
    pub cfact: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Resize to `rect` (inner size) with `border`.
    Show { window: Window, rect: Rect, border: i32 },
    /// Move out of sight, keeping the logical geometry.
    Hide { window: Window },
}

impl Placement {
    pub fn window(&self) -> Window {
        match self {
            Placement::Show { window, .. } | Placement::Hide { window } => *window,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TileParams {
    /// Monitor window area.
    pub area: Rect,
    pub nmaster: i32,
    pub mfact: f32,
    /// Overall split axis (sign mirrors), master axis, stack axis.
    pub axes: [i32; 3],
    pub gap: i32,
    /// Border given to tiled windows.
    pub border: i32,
    /// Per-member span below which an area stops subdividing.
    pub min_slice: i32,
}

/// Master count actually used for `n` tiled windows.
pub fn effective_nmaster(nmaster: i32, n: usize) -> usize {
    (nmaster.max(0) as usize).min(n)
}

#[derive(Debug, Clone, Copy)]
struct Area {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
}

/// Master-stack tiling.
///
/// `focus_order` is the monitor's focus stack and only decides which member
/// of a cascaded area is shown.
pub fn tile(params: &TileParams, tiled: &[Tiled], focus_order: &[Window]) -> Vec<Placement> {
    let n = tiled.len();
    if n == 0 {
        return Vec::new();
    }
    let nm = effective_nmaster(params.nmaster, n);

    // With no gap, push outer borders off the area and overlap neighbours.
    let g = if params.gap == 0 { -params.border } else { params.gap };
    let whole = Area {
        x: params.area.x + g,
        y: params.area.y + g,
        w: params.area.w - g,
        h: params.area.h - g,
    };

    let (mut master, mut stack) = (whole, whole);
    if nm > 0 && n > nm {
        let mirrored = params.axes[0] < 0;
        if params.axes[0].abs() == 1 {
            let split = (whole.w as f32 * params.mfact) as i32;
            master.w = split;
            stack.w = whole.w - split;
            if mirrored {
                master.x += stack.w;
            } else {
                stack.x += split;
            }
        } else {
            let split = (whole.h as f32 * params.mfact) as i32;
            master.h = split;
            stack.h = whole.h - split;
            if mirrored {
                master.y += stack.h;
            } else {
                stack.y += split;
            }
        }
    }

    let mut out = Vec::with_capacity(n);
    out.extend(split_area(master, &tiled[..nm], params.axes[1], g, params, focus_order));
    out.extend(split_area(stack, &tiled[nm..], params.axes[2], g, params, focus_order));
    out
}

fn split_area(
    area: Area,
    members: &[Tiled],
    axis: i32,
    g: i32,
    params: &TileParams,
    focus_order: &[Window],
) -> Vec<Placement> {
    if members.is_empty() {
        return Vec::new();
    }
    let bw = params.border;
    let full = Rect::new(area.x, area.y, area.w - g - 2 * bw, area.h - g - 2 * bw);

    if axis == 3 {
        let top = focus_order
            .iter()
            .copied()
            .find(|w| members.iter().any(|m| m.window == *w))
            .unwrap_or(members[0].window);
        return members
            .iter()
            .map(|m| {
                if m.window == top {
                    Placement::Show { window: m.window, rect: full, border: bw }
                } else {
                    Placement::Hide { window: m.window }
                }
            })
            .collect();
    }

    let horizontal = axis == 1;
    let total = if horizontal { area.w } else { area.h };
    let count = members.len();
    let subdivide = count > 1 && total >= params.min_slice * (count as i32 + 1);
    if !subdivide {
        return members
            .iter()
            .map(|m| Placement::Show { window: m.window, rect: full, border: bw })
            .collect();
    }

    let weight: f64 = members.iter().map(|m| m.cfact as f64).sum();
    let mut acc = 0.0f64;
    let mut start = 0;
    let mut out = Vec::with_capacity(count);
    for (i, m) in members.iter().enumerate() {
        acc += m.cfact as f64;
        let end = if i + 1 == count {
            total
        } else {
            (total as f64 * acc / weight).floor() as i32
        };
        let span = end - start - g - 2 * bw;
        let rect = if horizontal {
            Rect::new(area.x + start, area.y, span, full.h)
        } else {
            Rect::new(area.x, area.y + start, full.w, span)
        };
        out.push(Placement::Show { window: m.window, rect, border: bw });
        start = end;
    }
    out
}

/// Full-area placement of the most recently focused tiled window.
pub fn monocle(area: Rect, tiled: &[Tiled], focus_order: &[Window]) -> Vec<Placement> {
    let Some(top) = focus_order
        .iter()
        .copied()
        .find(|w| tiled.iter().any(|t| t.window == *w))
    else {
        return Vec::new();
    };
    tiled
        .iter()
        .map(|t| {
            if t.window == top {
                Placement::Show { window: t.window, rect: area, border: 0 }
            } else {
                Placement::Hide { window: t.window }
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Glyph {
    Char(char),
    Count(usize),
}

impl fmt::Display for Glyph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Glyph::Char(c) => write!(f, "{}", c),
            Glyph::Count(n) => write!(f, "{}", n),
        }
    }
}

/// Three-glyph symbol describing the tile axes, e.g. `[]=` or `=[|`.
pub fn tile_symbol(axes: [i32; 3], nmaster: i32, n: usize) -> String {
    let nmaster = if nmaster.max(0) as usize > n {
        if n == 0 { 1 } else { n }
    } else {
        nmaster.max(0) as usize
    };

    let mut first = Glyph::Char('=');
    let mut middle = Glyph::Char(']');
    let mut last = Glyph::Char('=');
    if axes[0].abs() == axes[1] {
        first = Glyph::Char('|');
    }
    if axes[0].abs() == axes[2] {
        last = Glyph::Char('|');
    }
    if axes[1] == 3 {
        first = Glyph::Count(if n == 0 { 0 } else { nmaster });
    }
    if axes[2] == 3 {
        last = Glyph::Count(if n == 0 { 0 } else { n - nmaster });
    }
    if axes[0] < 0 {
        std::mem::swap(&mut first, &mut last);
        middle = Glyph::Char('[');
    }
    if nmaster == 1 {
        if axes[0] > 0 {
            first = Glyph::Char('[');
        } else {
            last = Glyph::Char(']');
        }
    }
    format!("{}{}{}", first, middle, last)
}

pub fn monocle_symbol(visible: usize) -> String {
    format!("[{}]", visible)
}

/// Advance one axis code. The overall axis flips between x and y keeping its
/// mirror sign and moves inner axes off the new split direction; the inner
/// axes cycle x, y, cascade.
pub fn rotate_axis(axes: [i32; 3], index: usize) -> [i32; 3] {
    let mut axes = axes;
    match index {
        0 => {
            let sign = if axes[0] < 0 { -1 } else { 1 };
            let split = if axes[0].abs() == 1 { 2 } else { 1 };
            axes[0] = sign * split;
            let other = if split == 1 { 2 } else { 1 };
            for inner in &mut axes[1..] {
                if *inner == split {
                    *inner = other;
                }
            }
        }
        1 | 2 => {
            axes[index] = axes[index] % 3 + 1;
        }
        _ => {}
    }
    axes
}

#[cfg(test)]
mod tests {
    use super::*;

    fn windows(n: usize) -> Vec<Tiled> {
        (1..=n as u32).map(|w| Tiled { window: w, cfact: 1.0 }).collect()
    }

    fn params(axes: [i32; 3]) -> TileParams {
        TileParams {
            area: Rect::new(0, 0, 1000, 800),
            nmaster: 1,
            mfact: 0.5,
            axes,
            gap: 0,
            border: 0,
            min_slice: 20,
        }
    }

    fn shown(p: &[Placement]) -> Vec<(Window, Rect)> {
        p.iter()
            .filter_map(|p| match p {
                Placement::Show { window, rect, .. } => Some((*window, *rect)),
                Placement::Hide { .. } => None,
            })
            .collect()
    }

    #[test]
    fn test_three_window_scenario() {
        let out = tile(&params([1, 1, 1]), &windows(3), &[]);
        let spans: Vec<(i32, i32)> = shown(&out).iter().map(|(_, r)| (r.x, r.right())).collect();
        assert_eq!(spans, vec![(0, 500), (500, 750), (750, 1000)]);
    }

    #[test]
    fn test_zero_windows_is_empty() {
        assert!(tile(&params([1, 2, 2]), &[], &[]).is_empty());
        assert!(monocle(Rect::new(0, 0, 10, 10), &[], &[]).is_empty());
    }

    #[test]
    fn test_deterministic() {
        let p = params([1, 2, 2]);
        let w = windows(5);
        assert_eq!(tile(&p, &w, &[3]), tile(&p, &w, &[3]));
    }

    #[test]
    fn test_equal_split_is_floor_or_floor_plus_one_and_exact() {
        let mut p = params([1, 2, 2]);
        p.area = Rect::new(0, 0, 1000, 997);
        let out = tile(&p, &windows(4), &[]);
        let stack: Vec<Rect> = shown(&out).into_iter().skip(1).map(|(_, r)| r).collect();
        assert_eq!(stack.len(), 3);
        let total: i32 = stack.iter().map(|r| r.h).sum();
        assert_eq!(total, 997);
        for r in &stack {
            assert!(r.h == 997 / 3 || r.h == 997 / 3 + 1);
        }
        assert_eq!(stack[2].bottom(), 997);
    }

    #[test]
    fn test_weights_proportion_stack() {
        let p = params([1, 1, 2]);
        let mut w = windows(3);
        w[1].cfact = 3.0;
        let out = shown(&tile(&p, &w, &[]));
        assert_eq!(out[1].1.h, 600);
        assert_eq!(out[2].1.h, 200);
    }

    #[test]
    fn test_nmaster_clamped_and_zero_is_stack_only() {
        let mut p = params([1, 2, 2]);
        p.nmaster = 10;
        let out = shown(&tile(&p, &windows(2), &[]));
        assert!(out.iter().all(|(_, r)| r.w == 1000));

        p.nmaster = 0;
        let out = shown(&tile(&p, &windows(2), &[]));
        assert_eq!(out[0].1, Rect::new(0, 0, 1000, 400));
        assert_eq!(out[1].1, Rect::new(0, 400, 1000, 400));
    }

    #[test]
    fn test_mirrored_puts_master_after_stack() {
        let out = shown(&tile(&params([-1, 2, 2]), &windows(2), &[]));
        assert_eq!(out[0].1, Rect::new(500, 0, 500, 800));
        assert_eq!(out[1].1, Rect::new(0, 0, 500, 800));
    }

    #[test]
    fn test_gaps_and_borders() {
        let mut p = params([1, 2, 2]);
        p.gap = 10;
        p.border = 2;
        let out = shown(&tile(&p, &windows(2), &[]));
        // master outer box [10, 495) x [10, 790)
        assert_eq!(out[0].1, Rect::new(10, 10, 481, 776));
        // stack outer box [505, 990)
        assert_eq!(out[1].1, Rect::new(505, 10, 481, 776));
    }

    #[test]
    fn test_zero_gap_hides_screen_edge_borders() {
        let mut p = params([1, 2, 2]);
        p.border = 2;
        let out = shown(&tile(&p, &windows(1), &[]));
        // outer box [-2, 1002): both side borders fall outside the monitor
        assert_eq!(out[0].1, Rect::new(-2, -2, 1000, 800));
    }

    #[test]
    fn test_narrow_area_overlaps_members() {
        let mut p = params([1, 1, 1]);
        p.min_slice = 400;
        let out = shown(&tile(&p, &windows(3), &[]));
        assert_eq!(out[1].1, out[2].1);
    }

    #[test]
    fn test_cascade_shows_most_recent() {
        let out = tile(&params([1, 2, 3]), &windows(4), &[3, 1, 2, 4]);
        let visible = shown(&out);
        assert_eq!(visible.len(), 2);
        assert_eq!(visible[1].0, 3);
        assert!(out.contains(&Placement::Hide { window: 2 }));
        assert!(out.contains(&Placement::Hide { window: 4 }));
    }

    #[test]
    fn test_monocle_full_area_for_top() {
        let area = Rect::new(0, 20, 1000, 780);
        let out = monocle(area, &windows(3), &[2, 1, 3]);
        assert_eq!(shown(&out), vec![(2, area)]);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_symbols() {
        assert_eq!(tile_symbol([1, 2, 2], 1, 3), "[]=");
        assert_eq!(tile_symbol([1, 1, 2], 2, 3), "|]=");
        assert_eq!(tile_symbol([-1, 2, 2], 1, 3), "=[]");
        assert_eq!(tile_symbol([1, 2, 3], 2, 5), "=]3");
        assert_eq!(monocle_symbol(4), "[4]");
    }

    #[test]
    fn test_rotate_axis() {
        assert_eq!(rotate_axis([1, 2, 2], 0), [2, 1, 1]);
        assert_eq!(rotate_axis([-2, 2, 2], 0), [-1, 2, 2]);
        assert_eq!(rotate_axis([1, 3, 2], 1), [1, 1, 2]);
        assert_eq!(rotate_axis([1, 2, 2], 2), [1, 2, 3]);
    }
}
