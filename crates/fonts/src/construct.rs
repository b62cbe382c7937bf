use crate::FontType;
use crate::error::{Error, ErrorKind};
use std::{path::Path, str::FromStr};

const WOFF_MAGIC: [u8; 4] = *b"wOFF";
const WOFF2_MAGIC: [u8; 4] = *b"wOF2";
const OTF_MAGIC: [u8; 4] = *b"OTTO";
const TTF_MAGIC: [u8; 5] = [0x00, 0x01, 0x00, 0x00, 0x00];
// Legacy Apple TrueType.
const TTF_APPLE_MAGIC: [u8; 4] = *b"true";
// EOT headers are little-endian; the magic number 0x504C lives at byte 34
// and the version word at byte 8.
const EOT_MAGIC: [u8; 2] = [0x4C, 0x50];
const EOT_MAGIC_OFFSET: usize = 34;
const EOT_VERSION_OFFSET: usize = 8;
const EOT_VERSIONS: [[u8; 3]; 3] = [[0x00, 0x00, 0x01], [0x01, 0x00, 0x02], [0x02, 0x00, 0x02]];

impl FromStr for FontType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let extension = normalized.strip_prefix('.').unwrap_or(&normalized);
        match Self::from_extension(extension) {
            Some(font) => Ok(font),
            None => exn::bail!(ErrorKind::UnsupportedFontType(s.to_string())),
        }
    }
}

impl FontType {
    /// Look up a font type by extension, with or without the leading dot.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.trim_start_matches('.').to_lowercase().as_str() {
            "svg" => Some(FontType::Svg),
            "ttf" => Some(FontType::Ttf),
            "otf" => Some(FontType::Otf),
            "eot" => Some(FontType::Eot),
            "sfnt" => Some(FontType::Sfnt),
            "woff2" => Some(FontType::Woff2),
            "woff" => Some(FontType::Woff),
            _ => None,
        }
    }

    /// Detect font type from a file extension.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref().extension().and_then(|ext| ext.to_str()).and_then(Self::from_extension)
    }

    /// Detect font type from magic bytes.
    ///
    /// Returns `None` if no signature matches. SVG and bare sfnt files carry
    /// no reliable signature and are never detected here.
    #[must_use]
    pub fn from_magic_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&WOFF2_MAGIC) {
            return Some(FontType::Woff2);
        }
        if bytes.starts_with(&WOFF_MAGIC) {
            return Some(FontType::Woff);
        }
        if bytes.starts_with(&OTF_MAGIC) {
            return Some(FontType::Otf);
        }
        if bytes.starts_with(&TTF_MAGIC) || bytes.starts_with(&TTF_APPLE_MAGIC) {
            return Some(FontType::Ttf);
        }
        let eot_magic = bytes.get(EOT_MAGIC_OFFSET..EOT_MAGIC_OFFSET + EOT_MAGIC.len());
        let eot_version = bytes.get(EOT_VERSION_OFFSET..EOT_VERSION_OFFSET + 3);
        if eot_magic == Some(&EOT_MAGIC[..])
            && let Some(version) = eot_version
            && EOT_VERSIONS.iter().any(|v| v == version)
        {
            return Some(FontType::Eot);
        }
        None
    }

    /// Resolve the type of a font file from its path and content.
    ///
    /// The content signature wins over the extension, except that an `.svg`
    /// extension always resolves to [`FontType::Svg`].
    #[must_use]
    pub fn resolve(path: impl AsRef<Path>, bytes: &[u8]) -> Option<Self> {
        Self::resolve_with_hint(path, Self::from_magic_bytes(bytes))
    }

    /// Like [`resolve`](Self::resolve), but with a caller-supplied hint in
    /// place of content sniffing.
    #[must_use]
    pub fn resolve_with_hint(path: impl AsRef<Path>, hint: Option<FontType>) -> Option<Self> {
        let naive = Self::from_path(path);
        if naive == Some(FontType::Svg) {
            return naive;
        }
        hint.or(naive)
    }
}

#[cfg(test)]
mod tests {
    use crate::FontType;
    use rstest::rstest;

    fn eot_header(version: [u8; 3]) -> Vec<u8> {
        let mut header = vec![0u8; 40];
        header[8..11].copy_from_slice(&version);
        header[34..36].copy_from_slice(&[0x4C, 0x50]);
        header
    }

    #[rstest]
    #[case("woff2", FontType::Woff2)]
    #[case(".woff2", FontType::Woff2)]
    #[case("WOFF", FontType::Woff)]
    #[case("ttf", FontType::Ttf)]
    #[case(".eot", FontType::Eot)]
    #[case("sfnt", FontType::Sfnt)]
    fn test_from_str(#[case] test: &str, #[case] expected: FontType) {
        assert_eq!(test.parse::<FontType>().unwrap(), expected);
    }

    #[rstest]
    #[case("png")]
    #[case(".css")]
    #[case("")]
    fn test_from_str_invalid(#[case] test: &str) {
        assert!(test.parse::<FontType>().is_err());
    }

    #[rstest]
    #[case("fonts/a.woff2", Some(FontType::Woff2))]
    #[case("fonts/a.WOFF", Some(FontType::Woff))]
    #[case("a.svg", Some(FontType::Svg))]
    #[case("a.css", None)]
    // `.ttf` is a dotfile with no extension (like `.bashrc`).
    #[case(".ttf", None)]
    #[case("noextension", None)]
    fn test_from_path(#[case] test: &str, #[case] expected: Option<FontType>) {
        assert_eq!(FontType::from_path(test), expected);
    }

    #[rstest]
    #[case(b"wOF2\x00\x01\x00\x00", Some(FontType::Woff2))]
    #[case(b"wOFF\x00\x01\x00\x00", Some(FontType::Woff))]
    #[case(b"OTTO\x00\x0a", Some(FontType::Otf))]
    #[case(b"\x00\x01\x00\x00\x00\x0c", Some(FontType::Ttf))]
    #[case(b"true\x00\x0c", Some(FontType::Ttf))]
    #[case(b"<?xml version=\"1.0\"?><svg>", None)]
    #[case(b"\x89PNG\r\n\x1a\n", None)]
    #[case(b"", None)]
    fn test_from_magic_bytes(#[case] bytes: &[u8], #[case] expected: Option<FontType>) {
        assert_eq!(FontType::from_magic_bytes(bytes), expected);
    }

    #[rstest]
    #[case([0x00, 0x00, 0x01])]
    #[case([0x01, 0x00, 0x02])]
    #[case([0x02, 0x00, 0x02])]
    fn test_from_magic_bytes_eot(#[case] version: [u8; 3]) {
        assert_eq!(FontType::from_magic_bytes(&eot_header(version)), Some(FontType::Eot));
    }

    #[test]
    fn test_from_magic_bytes_eot_unknown_version() {
        assert_eq!(FontType::from_magic_bytes(&eot_header([0x07, 0x07, 0x07])), None);
    }

    #[test]
    fn test_resolve_prefers_content() {
        assert_eq!(FontType::resolve("font.ttf", b"wOF2...."), Some(FontType::Woff2));
        assert_eq!(FontType::resolve("font.ttf", b"not a font"), Some(FontType::Ttf));
        assert_eq!(FontType::resolve("font.bin", b"not a font"), None);
    }

    #[test]
    fn test_resolve_svg_extension_always_wins() {
        assert_eq!(FontType::resolve("font.svg", b"wOFF...."), Some(FontType::Svg));
        assert_eq!(FontType::resolve_with_hint("font.svg", Some(FontType::Otf)), Some(FontType::Svg));
    }
}
