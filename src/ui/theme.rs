use crossterm::style::{Color, ContentStyle, Stylize};

// ── Helper: build an Rgb Color from a hex literal ──────────────────────

const fn rgb(hex: u32) -> Color {
    Color::Rgb {
        r: ((hex >> 16) & 0xFF) as u8,
        g: ((hex >>  8) & 0xFF) as u8,
        b: ( hex        & 0xFF) as u8,
    }
}

// ── Theme variant selector ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThemeVariant {
    Default,
    Dracula,
    Gruvbox,
    Nord,
}

impl ThemeVariant {
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "dracula" => Self::Dracula,
            "gruvbox" => Self::Gruvbox,
            "nord"    => Self::Nord,
            _         => Self::Default,
        }
    }
}

// ── Theme struct ────────────────────────────────────────────────────────

/// Styles for the status indicator line.
#[derive(Clone)]
pub struct Theme {
    pub text:     ContentStyle,
    pub text_dim: ContentStyle,
    pub locked:   ContentStyle,
    pub unlocked: ContentStyle,
    pub normal:   ContentStyle,
    pub warning:  ContentStyle,
}

impl Theme {
    pub fn for_variant(v: ThemeVariant) -> Self {
        match v {
            ThemeVariant::Default => Self::default(),
            ThemeVariant::Dracula => Self::palette(0xf8f8f2, 0x6272a4, 0xffb86c, 0x8be9fd, 0x50fa7b, 0xff5555),
            ThemeVariant::Gruvbox => Self::palette(0xebdbb2, 0xa89984, 0xfe8019, 0x83a598, 0xb8bb26, 0xfb4934),
            ThemeVariant::Nord    => Self::palette(0xe5e9f0, 0x4c566a, 0xd08770, 0x88c0d0, 0xa3be8c, 0xbf616a),
        }
    }

    pub fn default() -> Self {
        Self {
            text:     ContentStyle::new().with(Color::White),
            text_dim: ContentStyle::new().with(Color::DarkGrey),
            locked:   ContentStyle::new().with(Color::Yellow),
            unlocked: ContentStyle::new().with(Color::Cyan),
            normal:   ContentStyle::new().with(Color::Green),
            warning:  ContentStyle::new().with(Color::Red).bold(),
        }
    }

    fn palette(text: u32, dim: u32, locked: u32, unlocked: u32, normal: u32, warning: u32) -> Self {
        Self {
            text:     ContentStyle::new().with(rgb(text)),
            text_dim: ContentStyle::new().with(rgb(dim)),
            locked:   ContentStyle::new().with(rgb(locked)),
            unlocked: ContentStyle::new().with(rgb(unlocked)),
            normal:   ContentStyle::new().with(rgb(normal)),
            warning:  ContentStyle::new().with(rgb(warning)).bold(),
        }
    }

    /// Plain output for pipes and tests.
    pub fn plain() -> Self {
        let s = ContentStyle::new();
        Self { text: s, text_dim: s, locked: s, unlocked: s, normal: s, warning: s }
    }
}
