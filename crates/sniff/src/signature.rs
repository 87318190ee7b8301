/// A magic byte prefix and the label it maps to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature {
    /// Human-readable name of the format, for logging.
    pub format: &'static str,
    pub magic: &'static [u8],
    pub label: &'static str,
}
impl Signature {
    const fn new(format: &'static str, magic: &'static [u8], label: &'static str) -> Self {
        Self { format, magic, label }
    }

    /// Whether `head` starts with this signature. Buffers shorter than the
    /// signature never match.
    #[inline]
    #[must_use]
    pub fn matches(&self, head: &[u8]) -> bool {
        head.starts_with(self.magic)
    }
}

/// Ordered signature table. Order matters: the first match wins.
pub const SIGNATURES: &[Signature] = &[
    Signature::new("bitmap", &[0x42, 0x4D], "bmp"),
    Signature::new("compound document", &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1], "doc"),
    Signature::new("executable", &[0x4D, 0x5A], "x-msdownload"),
    Signature::new("gif", &[0x47, 0x49, 0x46, 0x38], "gif"),
    Signature::new("icon", &[0x00, 0x00, 0x01, 0x00], "ico"),
    Signature::new("jpeg", &[0xFF, 0xD8, 0xFF], "jpg"),
    Signature::new("mp3", &[0xFF, 0xFB, 0x30], "mp3"),
    // OGA, OGV and OGX all share the container header; they collapse into one label.
    Signature::new(
        "ogg",
        &[0x4F, 0x67, 0x67, 0x53, 0x00, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
        "ogg",
    ),
    Signature::new("pdf", &[0x25, 0x50, 0x44, 0x46, 0x2D, 0x31, 0x2E], "pdf"),
    Signature::new(
        "png",
        &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52],
        "png",
    ),
    Signature::new("rar", &[0x52, 0x61, 0x72, 0x21, 0x1A, 0x07, 0x00], "rar"),
    Signature::new("flash", &[0x46, 0x57, 0x53], "swf"),
    Signature::new("tiff", &[0x49, 0x49, 0x2A, 0x00], "tiff"),
    Signature::new("torrent", &[0x64, 0x38, 0x3A, 0x61, 0x6E, 0x6E, 0x6F, 0x75, 0x6E, 0x63, 0x65], "torrent"),
    Signature::new("truetype", &[0x00, 0x01, 0x00, 0x00, 0x00], "ttf"),
    Signature::new("riff", &[0x52, 0x49, 0x46, 0x46], "avi"),
    Signature::new(
        "asf",
        &[0x30, 0x26, 0xB2, 0x75, 0x8E, 0x66, 0xCF, 0x11, 0xA6, 0xD9, 0x00, 0xAA, 0x00, 0x62, 0xCE, 0x6C],
        "wma",
    ),
    Signature::new("zip", &[0x50, 0x4B, 0x03, 0x04], "docx"),
];

/// Length of the longest magic prefix in [`SIGNATURES`].
pub(crate) const fn longest() -> usize {
    let mut longest = 0;
    let mut i = 0;
    while i < SIGNATURES.len() {
        if SIGNATURES[i].magic.len() > longest {
            longest = SIGNATURES[i].magic.len();
        }
        i += 1;
    }
    longest
}
