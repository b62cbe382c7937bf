use crate::FontType;
use std::fmt::{Display, Formatter, Result as FmtResult};

impl Display for FontType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.format())
    }
}

impl AsRef<str> for FontType {
    fn as_ref(&self) -> &'static str {
        self.extension()
    }
}

impl FontType {
    /// Every supported font type, in registry order.
    pub const ALL: [FontType; 7] = [
        FontType::Svg,
        FontType::Ttf,
        FontType::Otf,
        FontType::Eot,
        FontType::Sfnt,
        FontType::Woff2,
        FontType::Woff,
    ];

    /// Returns the file extension (lowercase, with leading dot) for this font type.
    #[inline]
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            FontType::Svg => ".svg",
            FontType::Ttf => ".ttf",
            FontType::Otf => ".otf",
            FontType::Eot => ".eot",
            FontType::Sfnt => ".sfnt",
            FontType::Woff2 => ".woff2",
            FontType::Woff => ".woff",
        }
    }

    /// Returns the media type declared in the `data:` URL.
    #[inline]
    #[must_use]
    pub fn media_type(&self) -> &'static str {
        match self {
            FontType::Svg => "image/svg+xml",
            FontType::Ttf => "font/truetype",
            FontType::Otf => "font/opentype",
            FontType::Eot => "application/vnd.ms-fontobject",
            FontType::Sfnt => "application/font-sfnt",
            FontType::Woff2 => "application/font-woff2",
            FontType::Woff => "application/font-woff",
        }
    }

    /// Returns the name used in the CSS `format('...')` hint.
    #[inline]
    #[must_use]
    pub fn format(&self) -> &'static str {
        match self {
            FontType::Svg => "svg",
            FontType::Ttf => "truetype",
            FontType::Otf => "opentype",
            FontType::Eot => "embedded-opentype",
            FontType::Sfnt => "sfnt",
            FontType::Woff2 => "woff2",
            FontType::Woff => "woff",
        }
    }

    /// All registry extensions, suitable as a scanner allow-list.
    #[must_use]
    pub fn extensions() -> Vec<String> {
        Self::ALL.iter().map(|t| t.extension().to_string()).collect()
    }
}
