use serde::{Deserialize, Serialize};

pub const SWITCHTAG_UP: u32 = 1 << 0;
pub const SWITCHTAG_DOWN: u32 = 1 << 1;
pub const SWITCHTAG_LEFT: u32 = 1 << 2;
pub const SWITCHTAG_RIGHT: u32 = 1 << 3;
pub const SWITCHTAG_TOGGLETAG: u32 = 1 << 4;
pub const SWITCHTAG_TAG: u32 = 1 << 5;
pub const SWITCHTAG_VIEW: u32 = 1 << 6;
pub const SWITCHTAG_TOGGLEVIEW: u32 = 1 << 7;

/// Core X11 modifier bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Shift,
    Lock,
    #[serde(alias = "ctrl")]
    Control,
    #[serde(alias = "alt")]
    Mod1,
    Mod2,
    Mod3,
    #[serde(alias = "super")]
    Mod4,
    Mod5,
}

impl Modifier {
    pub fn mask(self) -> u16 {
        match self {
            Modifier::Shift => 1 << 0,
            Modifier::Lock => 1 << 1,
            Modifier::Control => 1 << 2,
            Modifier::Mod1 => 1 << 3,
            Modifier::Mod2 => 1 << 4,
            Modifier::Mod3 => 1 << 5,
            Modifier::Mod4 => 1 << 6,
            Modifier::Mod5 => 1 << 7,
        }
    }

    pub fn combined(modifiers: &[Modifier]) -> u16 {
        modifiers.iter().fold(0, |acc, m| acc | m.mask())
    }
}

/// A command bound to a key, button or fake signal.
///
/// Tag masks use `0` for "previously viewed" and `u32::MAX` for "all tags".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "arg", rename_all = "snake_case")]
pub enum Action {
    Spawn(Vec<String>),
    RunOrRaise { class: String, command: Vec<String> },
    ToggleScratch { key: char, command: Vec<String> },
    Quit,
    KillClient,
    FocusStack(i32),
    FocusMon(i32),
    TagMon(i32),
    Zoom,
    PushUp,
    PushDown,
    Transfer,
    InPlaceRotate(i32),
    SwitchCol,
    IncNmaster(i32),
    /// Below 1.0 a delta, otherwise an absolute value offset by 1.0.
    SetMfact(f32),
    /// 0.0 resets to 1.0.
    SetCfact(f32),
    /// 0 resets to no gap.
    SetGaps(i32),
    SetLayout(usize),
    ToggleLayout,
    RotateLayoutAxis(usize),
    MirrorLayout,
    ToggleBar,
    ToggleFloating,
    ToggleFullscreen,
    /// "dx dy dw dh"; uppercase X/Y/W/H components are absolute.
    MoveResize(String),
    /// One of t/b/l/r to push against that edge, T/B/L/R to grow to it.
    MoveResizeEdge(char),
    MoveMouse,
    ResizeMouse,
    View(u32),
    ToggleView(u32),
    Tag(u32),
    ToggleTag(u32),
    /// `SWITCHTAG_*` direction and operation flags.
    SwitchTag(u32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyBinding {
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    /// Keysym name such as `Return`, `j` or `XF86AudioMute`.
    pub key: String,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonBinding {
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    pub button: u8,
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalBinding {
    pub signum: u32,
    pub action: Action,
}

impl KeyBinding {
    pub fn new(modifiers: &[Modifier], key: &str, action: Action) -> Self {
        Self {
            modifiers: modifiers.to_vec(),
            key: key.to_string(),
            action,
        }
    }
}
