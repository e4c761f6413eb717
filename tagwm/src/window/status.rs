//! Root window name handling: status text blocks and fake signals.

const FAKE_SIGNAL_PREFIX: &str = "fsignal:";

/// One run of status text and the control byte that introduced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBlock {
    pub code: Option<u8>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusText {
    /// The name as set, control bytes included.
    pub raw: String,
    pub blocks: Vec<StatusBlock>,
}

impl StatusText {
    pub fn fallback() -> Self {
        Self::parse(&format!("tagwm-{}", env!("CARGO_PKG_VERSION")))
    }

    pub fn parse(raw: &str) -> Self {
        let mut blocks = Vec::new();
        let mut code = None;
        let mut text = String::new();
        for ch in raw.chars() {
            if (ch as u32) < 0x20 {
                if !text.is_empty() || code.is_some() {
                    blocks.push(StatusBlock {
                        code,
                        text: std::mem::take(&mut text),
                    });
                }
                code = Some(ch as u8);
            } else {
                text.push(ch);
            }
        }
        if !text.is_empty() || code.is_some() {
            blocks.push(StatusBlock { code, text });
        }
        Self {
            raw: raw.to_string(),
            blocks,
        }
    }

    /// Printable text with control bytes removed.
    pub fn display(&self) -> String {
        self.blocks.iter().map(|b| b.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    Text(StatusText),
    /// A `fsignal:` request. Zero means no signal and is not dispatched.
    Signal(u32),
}

/// Interpret a new root window name.
pub fn parse_root_name(name: Option<&str>) -> StatusUpdate {
    let Some(name) = name else {
        return StatusUpdate::Text(StatusText::fallback());
    };
    if let Some(digits) = name.strip_prefix(FAKE_SIGNAL_PREFIX) {
        let signum = digits
            .chars()
            .filter_map(|c| c.to_digit(10))
            .fold(0u32, |acc, d| acc.saturating_mul(10).saturating_add(d));
        return StatusUpdate::Signal(signum);
    }
    StatusUpdate::Text(StatusText::parse(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_name_falls_back_to_version() {
        match parse_root_name(None) {
            StatusUpdate::Text(t) => assert!(t.display().starts_with("tagwm-")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_blocks_split_at_control_bytes() {
        let t = StatusText::parse("cpu 3%\u{1}vol 40%\u{2}12:00");
        assert_eq!(t.blocks.len(), 3);
        assert_eq!(t.blocks[0], StatusBlock { code: None, text: "cpu 3%".into() });
        assert_eq!(t.blocks[1].code, Some(1));
        assert_eq!(t.blocks[2].text, "12:00");
        assert_eq!(t.display(), "cpu 3%vol 40%12:00");
    }

    #[test]
    fn test_fake_signal() {
        assert_eq!(parse_root_name(Some("fsignal:4")), StatusUpdate::Signal(4));
        assert_eq!(parse_root_name(Some("fsignal:1x2")), StatusUpdate::Signal(12));
        assert_eq!(parse_root_name(Some("fsignal:")), StatusUpdate::Signal(0));
        assert_eq!(
            parse_root_name(Some("fsignal:99999999999999")),
            StatusUpdate::Signal(u32::MAX)
        );
        assert!(matches!(parse_root_name(Some("fsig")), StatusUpdate::Text(_)));
    }
}
