// src/ui.rs
use iced::widget::{button, container};
use iced::{Background, Color, Theme};
use once_cell::sync::Lazy;

pub struct Styles {
    pub bg: Color,
    pub fg: Color,
    pub muted_fg: Color,
    pub sidebar_bg: Color,
    pub sidebar_fg: Color,
    pub card_bg: Color,
    pub accent: Color,
    pub grid: Color,
    pub error_fg: Color,
}

pub static DARK_THEME: Lazy<Styles> = Lazy::new(|| Styles {
    bg: Color::from_rgb(0.055, 0.067, 0.09),
    fg: Color::from_rgb(1.0, 1.0, 1.0),
    muted_fg: Color::from_rgb(0.62, 0.65, 0.7),
    sidebar_bg: Color::from_rgb(0.15, 0.153, 0.188),
    sidebar_fg: Color::from_rgb(1.0, 1.0, 1.0),
    card_bg: Color::from_rgb(0.118, 0.118, 0.118), // #1e1e1e
    accent: Color::from_rgb(1.0, 0.294, 0.294),
    grid: Color::from_rgba(1.0, 1.0, 1.0, 0.12),
    error_fg: Color::from_rgb(1.0, 0.42, 0.42),
});

pub static LIGHT_THEME: Lazy<Styles> = Lazy::new(|| Styles {
    bg: Color::from_rgb(1.0, 1.0, 1.0),
    fg: Color::from_rgb(0.192, 0.2, 0.247),
    muted_fg: Color::from_rgb(0.4, 0.42, 0.46),
    sidebar_bg: Color::from_rgb(0.941, 0.949, 0.965), // #f0f2f6
    sidebar_fg: Color::from_rgb(0.192, 0.2, 0.247),
    card_bg: Color::from_rgb(0.8784, 0.8784, 0.8784), // #e0e0e0
    accent: Color::from_rgb(1.0, 0.294, 0.294),
    grid: Color::from_rgba(0.0, 0.0, 0.0, 0.12),
    error_fg: Color::from_rgb(0.75, 0.1, 0.1),
});

// Qualitative palette for per-country bars
const CATEGORY_PALETTE: [(u8, u8, u8); 10] = [
    (0x63, 0x6e, 0xfa),
    (0xef, 0x55, 0x3b),
    (0x00, 0xcc, 0x96),
    (0xab, 0x63, 0xfa),
    (0xff, 0xa1, 0x5a),
    (0x19, 0xd3, 0xf3),
    (0xff, 0x66, 0x92),
    (0xb6, 0xe8, 0x80),
    (0xff, 0x97, 0xff),
    (0xfe, 0xcb, 0x52),
];

// (position, r, g, b), ColorBrewer sequential Reds
const REDS: [(f32, f32, f32, f32); 9] = [
    (0.0, 255.0, 245.0, 240.0),
    (0.125, 254.0, 224.0, 210.0),
    (0.25, 252.0, 187.0, 161.0),
    (0.375, 252.0, 146.0, 114.0),
    (0.5, 251.0, 106.0, 74.0),
    (0.625, 239.0, 59.0, 44.0),
    (0.75, 203.0, 24.0, 29.0),
    (0.875, 165.0, 15.0, 21.0),
    (1.0, 103.0, 0.0, 13.0),
];

pub fn category_color(index: usize) -> Color {
    let (r, g, b) = CATEGORY_PALETTE[index % CATEGORY_PALETTE.len()];
    Color::from_rgb8(r, g, b)
}

/// Sequential red scale, `t` clamped to `0.0..=1.0`.
pub fn reds(t: f32) -> Color {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

    for pair in REDS.windows(2) {
        let (p0, r0, g0, b0) = pair[0];
        let (p1, r1, g1, b1) = pair[1];
        if t <= p1 {
            let f = (t - p0) / (p1 - p0);
            return Color::from_rgb(
                (r0 + (r1 - r0) * f) / 255.0,
                (g0 + (g1 - g0) * f) / 255.0,
                (b0 + (b1 - b0) * f) / 255.0,
            );
        }
    }

    let (_, r, g, b) = REDS[REDS.len() - 1];
    Color::from_rgb(r / 255.0, g / 255.0, b / 255.0)
}

/// `1234567` -> `"1,234,567"`
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Short axis label: `1500` -> `"1.5k"`, `2_000_000` -> `"2M"`.
pub fn format_compact(value: f64) -> String {
    let (scaled, suffix) = if value >= 1e9 {
        (value / 1e9, "B")
    } else if value >= 1e6 {
        (value / 1e6, "M")
    } else if value >= 1e3 {
        (value / 1e3, "k")
    } else {
        (value, "")
    };

    let text = format!("{scaled:.1}");
    let text = text.strip_suffix(".0").unwrap_or(&text);
    format!("{text}{suffix}")
}

// Custom styles for containers and buttons
pub struct ContainerStyle {
    pub bg: Color,
    pub fg: Color,
    pub radius: f32,
}

impl container::StyleSheet for ContainerStyle {
    type Style = Theme;

    fn appearance(&self, _style: &Self::Style) -> container::Appearance {
        container::Appearance {
            text_color: Some(self.fg),
            background: Some(Background::Color(self.bg)),
            border_radius: self.radius.into(),
            ..Default::default()
        }
    }
}

pub fn panel(bg: Color, fg: Color) -> iced::theme::Container {
    iced::theme::Container::Custom(Box::new(ContainerStyle { bg, fg, radius: 0.0 }))
}

pub fn card(styles: &Styles) -> iced::theme::Container {
    iced::theme::Container::Custom(Box::new(ContainerStyle {
        bg: styles.card_bg,
        fg: styles.fg,
        radius: 12.0,
    }))
}

pub struct ButtonStyle {
    pub bg: Color,
    pub fg: Color,
    pub hover_bg: Color,
}

impl button::StyleSheet for ButtonStyle {
    type Style = Theme;

    fn active(&self, _style: &Self::Style) -> button::Appearance {
        button::Appearance {
            background: Some(Background::Color(self.bg)),
            border_radius: 4.0_f32.into(),
            text_color: self.fg,
            ..Default::default()
        }
    }

    fn hovered(&self, style: &Self::Style) -> button::Appearance {
        button::Appearance {
            background: Some(Background::Color(self.hover_bg)),
            ..self.active(style)
        }
    }
}

pub fn flat_button(styles: &Styles) -> iced::theme::Button {
    iced::theme::Button::Custom(Box::new(ButtonStyle {
        bg: styles.card_bg,
        fg: styles.fg,
        hover_bg: styles.accent,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Color, r: f32, g: f32, b: f32) -> bool {
        (a.r - r / 255.0).abs() < 1e-4 && (a.g - g / 255.0).abs() < 1e-4 && (a.b - b / 255.0).abs() < 1e-4
    }

    #[test]
    fn thousands_separators() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(16_480_485), "16,480,485");
    }

    #[test]
    fn compact_labels() {
        assert_eq!(format_compact(0.0), "0");
        assert_eq!(format_compact(950.0), "950");
        assert_eq!(format_compact(1500.0), "1.5k");
        assert_eq!(format_compact(2_000_000.0), "2M");
    }

    #[test]
    fn category_colors_wrap() {
        assert_eq!(category_color(0), category_color(10));
        assert_ne!(category_color(0), category_color(1));
    }

    #[test]
    fn reds_scale_endpoints() {
        assert!(approx(reds(0.0), 255.0, 245.0, 240.0));
        assert!(approx(reds(1.0), 103.0, 0.0, 13.0));
        assert!(approx(reds(7.0), 103.0, 0.0, 13.0));
        assert!(approx(reds(-1.0), 255.0, 245.0, 240.0));
        assert!(approx(reds(0.5), 251.0, 106.0, 74.0));
        assert!(approx(reds(0.0625), 254.5, 234.5, 225.0));
    }
}
