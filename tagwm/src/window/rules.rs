use tagwm_config::{Rule, FLOAT_CENTER};

use crate::window::geometry::Rect;

/// Placeholder for windows without a class hint or title.
pub const BROKEN: &str = "broken";

/// Everything the matching rules decided about a new window.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub tags: u32,
    pub floating: bool,
    pub terminal: bool,
    pub no_swallow: bool,
    pub switch_to_tag: bool,
    /// Requested monitor index, if any rule named one.
    pub monitor: Option<usize>,
    pub scratch_key: Option<char>,
    pub float_geometry: Option<[i32; 4]>,
    pub float_border: Option<i32>,
}

impl Default for RuleOutcome {
    fn default() -> Self {
        Self {
            tags: 0,
            floating: false,
            terminal: false,
            no_swallow: false,
            switch_to_tag: false,
            monitor: None,
            scratch_key: None,
            float_geometry: None,
            float_border: None,
        }
    }
}

fn field_matches(pattern: &Option<String>, value: &str) -> bool {
    pattern.as_deref().map_or(true, |p| value.contains(p))
}

/// Walk the rule table in order. Tags accumulate; every other field is taken
/// from the last matching rule.
pub fn apply_rules(rules: &[Rule], class: &str, instance: &str, title: &str) -> RuleOutcome {
    let class = if class.is_empty() { BROKEN } else { class };
    let instance = if instance.is_empty() { BROKEN } else { instance };

    let mut outcome = RuleOutcome::default();
    for rule in rules.iter().filter(|r| {
        field_matches(&r.title, title)
            && field_matches(&r.class, class)
            && field_matches(&r.instance, instance)
    }) {
        outcome.terminal = rule.terminal;
        outcome.no_swallow = rule.no_swallow;
        outcome.floating = rule.floating;
        outcome.tags |= rule.tags;
        outcome.scratch_key = rule.scratch_key;
        outcome.float_border = (rule.float_border >= 0).then_some(rule.float_border);
        outcome.float_geometry = Some(rule.float_geometry);
        if rule.monitor >= 0 {
            outcome.monitor = Some(rule.monitor as usize);
        }
        outcome.switch_to_tag |= rule.switch_to_tag;
    }
    outcome
}

/// Resolve a rule's float geometry for a window on a monitor with full
/// geometry `screen` and window area `area`.
///
/// Sizes above the bar height are absolute and -1..-9 select eighths of the
/// window area. Positions >= 0 are offsets from the monitor origin, -1..-9
/// select eighths of the area and -10 centers. Anything else keeps the
/// corresponding value of `current`.
pub fn resolve_float_geometry(geometry: [i32; 4], current: Rect, screen: Rect, area: Rect, bar_height: i32) -> Rect {
    let [fx, fy, fw, fh] = geometry;
    let eighth = |v: i32| -v - 1;
    let in_eighths = |v: i32| v < 0 && v > FLOAT_CENTER;

    let mut r = current;
    if fw > bar_height {
        r.w = fw;
    } else if in_eighths(fw) {
        r.w = eighth(fw) * area.w / 8;
    }
    if fh > bar_height {
        r.h = fh;
    } else if in_eighths(fh) {
        r.h = eighth(fh) * area.h / 8;
    }

    if fx >= 0 {
        r.x = screen.x + fx;
    } else if in_eighths(fx) {
        r.x = area.x + eighth(fx) * area.w / 8;
    } else if fx == FLOAT_CENTER {
        r.x = area.x + (screen.w - r.w) / 2;
    }
    if fy >= 0 {
        r.y = screen.y + fy;
    } else if in_eighths(fy) {
        r.y = area.y + eighth(fy) * area.h / 8;
    } else if fy == FLOAT_CENTER {
        r.y = area.y + (area.h - r.h) / 2;
    }
    r
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagwm_config::FLOAT_KEEP;

    fn rule(class: Option<&str>, title: Option<&str>) -> Rule {
        Rule {
            class: class.map(String::from),
            title: title.map(String::from),
            ..Rule::default()
        }
    }

    #[test]
    fn test_substring_match_and_tag_accumulation() {
        let mut gimp = rule(Some("Gimp"), None);
        gimp.tags = 1 << 2;
        gimp.floating = true;
        let mut editor = rule(None, Some("edit"));
        editor.tags = 1 << 4;
        editor.monitor = 1;
        let rules = vec![gimp, editor];

        let out = apply_rules(&rules, "Gimp-2.10", "gimp", "image editor");
        assert_eq!(out.tags, (1 << 2) | (1 << 4));
        assert!(!out.floating);
        assert_eq!(out.monitor, Some(1));

        let out = apply_rules(&rules, "Gimp", "gimp", "toolbox");
        assert!(out.floating);
        assert_eq!(out.monitor, None);
    }

    #[test]
    fn test_missing_class_matches_broken() {
        let mut r = rule(Some("broken"), None);
        r.terminal = true;
        let out = apply_rules(&[r], "", "", "x");
        assert!(out.terminal);
    }

    #[test]
    fn test_no_match_is_default() {
        let out = apply_rules(&[rule(Some("St"), None)], "Firefox", "Navigator", "web");
        assert_eq!(out, RuleOutcome::default());
    }

    #[test]
    fn test_float_geometry_sentinels() {
        let screen = Rect::new(0, 0, 1600, 900);
        let area = Rect::new(0, 20, 1600, 880);
        let current = Rect::new(5, 25, 300, 200);

        let r = resolve_float_geometry([FLOAT_CENTER, FLOAT_CENTER, 1200, 500], current, screen, area, 20);
        assert_eq!(r, Rect::new(200, 20 + 190, 1200, 500));

        let r = resolve_float_geometry([-3, -5, -5, -3], current, screen, area, 20);
        assert_eq!(r, Rect::new(400, 20 + 440, 800, 220));

        let r = resolve_float_geometry([10, 30, FLOAT_KEEP, FLOAT_KEEP], current, screen, area, 20);
        assert_eq!(r, Rect::new(10, 30, 300, 200));
    }

    #[test]
    fn test_out_of_range_sentinel_keeps_default() {
        let screen = Rect::new(0, 0, 1600, 900);
        let area = Rect::new(0, 20, 1600, 880);
        let current = Rect::new(5, 25, 300, 200);
        // widths at or below the bar height and positions below -10 are ignored
        let r = resolve_float_geometry([-42, -99, 15, 0], current, screen, area, 20);
        assert_eq!(r, current);
    }
}
