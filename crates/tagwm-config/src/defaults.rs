use crate::bindings::*;
use crate::{LayoutDef, LayoutKind, Rule, FLOAT_CENTER, FLOAT_KEEP};

use crate::bindings::Modifier::{Control as CTRL, Mod1 as ALT, Mod4 as MODKEY, Shift as SHIFT};

pub(crate) fn layouts() -> Vec<LayoutDef> {
    vec![
        LayoutDef { symbol: "[]=".to_string(), kind: LayoutKind::Tile },
        LayoutDef { symbol: "><>".to_string(), kind: LayoutKind::Floating },
        LayoutDef { symbol: "[M]".to_string(), kind: LayoutKind::Monocle },
    ]
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn shell(command: &str) -> Action {
    Action::Spawn(strings(&["/bin/sh", "-c", command]))
}

fn scratchpad() -> Action {
    Action::ToggleScratch {
        key: 's',
        command: strings(&["st", "-t", "scratchpad"]),
    }
}

pub(crate) fn rules() -> Vec<Rule> {
    let centered = [FLOAT_CENTER; 4];
    vec![
        // Catch-all: center new floating windows.
        Rule { float_geometry: centered, ..Rule::default() },
        Rule {
            class: Some("Gimp".to_string()),
            floating: true,
            float_geometry: [FLOAT_KEEP; 4],
            ..Rule::default()
        },
        Rule {
            class: Some("Onboard".to_string()),
            floating: true,
            float_geometry: centered,
            float_border: 0,
            ..Rule::default()
        },
        Rule {
            class: Some("St".to_string()),
            terminal: true,
            float_geometry: centered,
            ..Rule::default()
        },
        Rule {
            title: Some("Event Tester".to_string()),
            floating: true,
            no_swallow: true,
            float_geometry: centered,
            ..Rule::default()
        },
        Rule {
            title: Some("scratchpad".to_string()),
            floating: true,
            terminal: true,
            scratch_key: Some('s'),
            float_geometry: [FLOAT_CENTER, FLOAT_CENTER, 1200, 500],
            ..Rule::default()
        },
        Rule {
            class: Some("dbar".to_string()),
            instance: Some("alsam".to_string()),
            floating: true,
            scratch_key: Some('a'),
            float_geometry: [0, -1, 400, 500],
            float_border: 1,
            ..Rule::default()
        },
    ]
}

pub(crate) fn keys() -> Vec<KeyBinding> {
    let mut keys = vec![
        KeyBinding::new(&[], "XF86AudioLowerVolume", shell("amixer -q sset Master 5%-")),
        KeyBinding::new(&[], "XF86AudioRaiseVolume", shell("amixer -q sset Master 5%+")),
        KeyBinding::new(&[], "XF86AudioMute", shell("amixer set Master toggle")),
        KeyBinding::new(&[], "XF86AudioPlay", shell("playerctl play-pause")),
        KeyBinding::new(&[], "XF86AudioNext", shell("playerctl next")),
        KeyBinding::new(&[], "XF86AudioPrev", shell("playerctl previous")),
        KeyBinding::new(
            &[MODKEY, CTRL],
            "w",
            Action::RunOrRaise {
                class: "qutebrowser".to_string(),
                command: strings(&["qutebrowser"]),
            },
        ),
        KeyBinding::new(&[MODKEY], "Return", Action::Spawn(strings(&["dmenu_run"]))),
        KeyBinding::new(&[MODKEY, SHIFT], "Return", Action::Spawn(strings(&["st"]))),
        KeyBinding::new(&[MODKEY, CTRL], "Return", scratchpad()),
        KeyBinding::new(&[MODKEY], "b", Action::ToggleBar),
        KeyBinding::new(&[MODKEY], "j", Action::SwitchCol),
        KeyBinding::new(&[MODKEY], "k", Action::SwitchCol),
        KeyBinding::new(&[MODKEY], "l", Action::FocusStack(1)),
        KeyBinding::new(&[MODKEY], "h", Action::FocusStack(-1)),
        KeyBinding::new(&[MODKEY, CTRL, SHIFT], "l", Action::InPlaceRotate(1)),
        KeyBinding::new(&[MODKEY, CTRL, SHIFT], "h", Action::InPlaceRotate(-1)),
        KeyBinding::new(&[MODKEY, CTRL, SHIFT], "k", Action::IncNmaster(1)),
        KeyBinding::new(&[MODKEY, CTRL, SHIFT], "j", Action::IncNmaster(-1)),
        KeyBinding::new(&[MODKEY, CTRL], "h", Action::SetMfact(-0.05)),
        KeyBinding::new(&[MODKEY, CTRL], "l", Action::SetMfact(0.05)),
        KeyBinding::new(&[MODKEY, CTRL], "k", Action::SetCfact(0.25)),
        KeyBinding::new(&[MODKEY, CTRL], "j", Action::SetCfact(-0.25)),
        KeyBinding::new(&[MODKEY, CTRL], "o", Action::SetCfact(0.0)),
        KeyBinding::new(&[MODKEY, SHIFT], "Up", Action::MoveResize("0x -25y 0w 0h".to_string())),
        KeyBinding::new(&[MODKEY, SHIFT], "Down", Action::MoveResize("0x 25y 0w 0h".to_string())),
        KeyBinding::new(&[MODKEY, SHIFT], "Left", Action::MoveResize("-25x 0y 0w 0h".to_string())),
        KeyBinding::new(&[MODKEY, SHIFT], "Right", Action::MoveResize("25x 0y 0w 0h".to_string())),
        KeyBinding::new(&[MODKEY, CTRL], "Up", Action::MoveResize("0x 0y 0w -25h".to_string())),
        KeyBinding::new(&[MODKEY, CTRL], "Down", Action::MoveResize("0x 0y 0w 25h".to_string())),
        KeyBinding::new(&[MODKEY, CTRL], "Left", Action::MoveResize("0x 0y -25w 0h".to_string())),
        KeyBinding::new(&[MODKEY, CTRL], "Right", Action::MoveResize("0x 0y 25w 0h".to_string())),
        KeyBinding::new(&[MODKEY, ALT], "Up", Action::MoveResizeEdge('t')),
        KeyBinding::new(&[MODKEY, ALT], "Down", Action::MoveResizeEdge('b')),
        KeyBinding::new(&[MODKEY, ALT], "Left", Action::MoveResizeEdge('l')),
        KeyBinding::new(&[MODKEY, ALT], "Right", Action::MoveResizeEdge('r')),
        KeyBinding::new(&[MODKEY, ALT, SHIFT], "Up", Action::MoveResizeEdge('T')),
        KeyBinding::new(&[MODKEY, ALT, SHIFT], "Down", Action::MoveResizeEdge('B')),
        KeyBinding::new(&[MODKEY, ALT, SHIFT], "Left", Action::MoveResizeEdge('L')),
        KeyBinding::new(&[MODKEY, ALT, SHIFT], "Right", Action::MoveResizeEdge('R')),
        KeyBinding::new(&[MODKEY, SHIFT], "l", Action::PushDown),
        KeyBinding::new(&[MODKEY, SHIFT], "h", Action::PushUp),
        KeyBinding::new(&[MODKEY, SHIFT], "j", Action::Transfer),
        KeyBinding::new(&[MODKEY, SHIFT], "k", Action::Transfer),
        KeyBinding::new(&[MODKEY, SHIFT], "z", Action::Zoom),
        KeyBinding::new(&[MODKEY], "Tab", Action::View(0)),
        KeyBinding::new(&[MODKEY], "t", Action::SetLayout(0)),
        KeyBinding::new(&[MODKEY], "f", Action::SetLayout(1)),
        KeyBinding::new(&[MODKEY], "m", Action::SetLayout(2)),
        KeyBinding::new(&[MODKEY, CTRL], "space", Action::ToggleLayout),
        KeyBinding::new(&[MODKEY], "space", Action::ToggleFloating),
        KeyBinding::new(&[MODKEY], "0", Action::View(u32::MAX)),
        KeyBinding::new(&[MODKEY, SHIFT], "f", Action::ToggleFullscreen),
        KeyBinding::new(&[MODKEY, SHIFT], "0", Action::Tag(u32::MAX)),
        KeyBinding::new(&[MODKEY], "comma", Action::FocusMon(-1)),
        KeyBinding::new(&[MODKEY], "period", Action::FocusMon(1)),
        KeyBinding::new(&[MODKEY, SHIFT], "comma", Action::TagMon(-1)),
        KeyBinding::new(&[MODKEY, SHIFT], "period", Action::TagMon(1)),
        KeyBinding::new(&[MODKEY], "z", Action::SetGaps(-2)),
        KeyBinding::new(&[MODKEY], "u", Action::SetGaps(2)),
        KeyBinding::new(&[MODKEY, SHIFT], "u", Action::SetGaps(0)),
        KeyBinding::new(&[MODKEY, CTRL, SHIFT], "t", Action::RotateLayoutAxis(0)),
        KeyBinding::new(&[MODKEY, SHIFT], "t", Action::RotateLayoutAxis(1)),
        KeyBinding::new(&[MODKEY, CTRL], "t", Action::RotateLayoutAxis(2)),
        KeyBinding::new(&[MODKEY, CTRL], "m", Action::MirrorLayout),
        KeyBinding::new(&[MODKEY, SHIFT], "q", Action::KillClient),
        KeyBinding::new(&[MODKEY, CTRL, SHIFT], "r", Action::Quit),
    ];

    for (i, key) in ["1", "2", "3", "4", "5", "6"].iter().enumerate() {
        let mask = 1u32 << i;
        keys.push(KeyBinding::new(&[MODKEY], key, Action::View(mask)));
        keys.push(KeyBinding::new(&[MODKEY, CTRL], key, Action::ToggleView(mask)));
        keys.push(KeyBinding::new(&[MODKEY, SHIFT], key, Action::Tag(mask)));
        keys.push(KeyBinding::new(&[MODKEY, CTRL, SHIFT], key, Action::ToggleTag(mask)));
    }

    let directions = [
        ("k", SWITCHTAG_UP),
        ("j", SWITCHTAG_DOWN),
        ("l", SWITCHTAG_RIGHT),
        ("h", SWITCHTAG_LEFT),
    ];
    for (key, direction) in directions {
        keys.push(KeyBinding::new(
            &[MODKEY, ALT],
            key,
            Action::SwitchTag(direction | SWITCHTAG_VIEW),
        ));
        keys.push(KeyBinding::new(
            &[MODKEY, ALT, SHIFT],
            key,
            Action::SwitchTag(direction | SWITCHTAG_TAG | SWITCHTAG_VIEW),
        ));
    }

    keys
}

pub(crate) fn buttons() -> Vec<ButtonBinding> {
    vec![
        ButtonBinding { modifiers: vec![MODKEY], button: 1, action: Action::MoveMouse },
        ButtonBinding { modifiers: vec![MODKEY], button: 2, action: Action::ToggleFloating },
        ButtonBinding { modifiers: vec![MODKEY], button: 3, action: Action::ResizeMouse },
    ]
}

pub(crate) fn signals() -> Vec<SignalBinding> {
    vec![
        SignalBinding { signum: 3, action: Action::KillClient },
        SignalBinding {
            signum: 4,
            action: Action::ToggleScratch {
                key: 'a',
                command: strings(&["st", "-c", "dbar", "-n", "alsam", "-e", "alsamixer"]),
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_keys_cover_every_tag() {
        let keys = keys();
        for i in 0..6 {
            let mask = 1u32 << i;
            assert!(keys.iter().any(|k| k.action == Action::View(mask)));
            assert!(keys.iter().any(|k| k.action == Action::ToggleTag(mask)));
        }
    }

    #[test]
    fn test_first_rule_is_catch_all() {
        let rules = rules();
        assert!(rules[0].class.is_none() && rules[0].instance.is_none() && rules[0].title.is_none());
        assert_eq!(rules[0].float_geometry, [FLOAT_CENTER; 4]);
    }
}
