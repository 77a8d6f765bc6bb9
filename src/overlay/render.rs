//! Platform-independent description of one painted frame

/// 0x00RRGGBB
pub type Rgb = u32;

pub const BACKGROUND: Rgb = 0x00_20_20_20;
pub const TEXT: Rgb = 0x00_F0_F0_F0;
pub const CREDIT_TEXT: Rgb = 0x00_9A_9A_9A;

/// What the painter draws: a filled background, the metrics text and an
/// optional credit line underneath
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub background: Rgb,
    /// Whole-window alpha
    pub alpha: u8,
    pub text_color: Rgb,
    pub text: String,
    pub credit: Option<String>,
}

/// Convert 0x00RRGGBB to a GDI COLORREF (0x00BBGGRR)
pub fn to_colorref(rgb: Rgb) -> u32 {
    let r = (rgb >> 16) & 0xFF;
    let g = (rgb >> 8) & 0xFF;
    let b = rgb & 0xFF;
    (b << 16) | (g << 8) | r
}
