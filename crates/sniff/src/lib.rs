//! Content type detection from magic bytes.
//!
//! Archive files that lost their extension still carry their format in the
//! first few bytes. This crate matches a byte prefix against a fixed,
//! ordered [signature table](SIGNATURES) and returns a [`Classification`]:
//!
//! - **[`Known`](Classification::Known)**: a signature matched and the label
//!   is specific enough to rename the file with.
//! - **[`Excluded`](Classification::Excluded)**: a signature matched, but the
//!   label carries too little information to rename safely (executables, OGG
//!   containers).
//! - **[`Unknown`](Classification::Unknown)**: nothing matched.
//!
//! First match wins. There is no scoring and no confidence value.

mod extension;
mod signature;

pub use crate::extension::extension_for;
pub use crate::signature::{SIGNATURES, Signature};
use tracing::instrument;

/// Number of bytes that must be read from the head of a file so that every
/// signature in [`SIGNATURES`] has a chance to match.
pub const SNIFF_LEN: usize = signature::longest();

/// Labels that are matched but never used to rename a file.
const EXCLUDED: [&str; 5] = ["octet-stream", "x-msdownload", "oga", "ogg", "ogx"];

/// The result of sniffing a byte prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    /// A signature matched with an actionable label.
    Known(&'static str),
    /// A signature matched, but its label is on the exclusion list.
    Excluded(&'static str),
    /// No signature matched (includes empty and too-short buffers).
    Unknown,
}
impl Classification {
    /// The actionable label, or an empty string when the classification is
    /// [`Excluded`](Self::Excluded) or [`Unknown`](Self::Unknown).
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Known(label) => label,
            Self::Excluded(_) | Self::Unknown => "",
        }
    }
}
impl From<&[u8]> for Classification {
    fn from(value: &[u8]) -> Self {
        classify(value)
    }
}

/// Classify a byte buffer by matching it against [`SIGNATURES`] in order.
///
/// Only the first [`SNIFF_LEN`] bytes are ever inspected, so passing the
/// entire file is fine (if wasteful).
///
/// ```
/// use refile_sniff::{Classification, classify};
///
/// assert_eq!(classify(b"%PDF-1.7\n%\xE2\xE3"), Classification::Known("pdf"));
/// assert_eq!(classify(b"MZ\x90\x00"), Classification::Excluded("x-msdownload"));
/// assert_eq!(classify(b"%!PS-Adobe-3.0"), Classification::Unknown);
/// assert_eq!(classify(b"%PDF-1.7").label(), "pdf");
/// assert_eq!(classify(b"").label(), "");
/// ```
#[instrument(level = "trace", skip_all, fields(len = head.len()))]
pub fn classify(head: &[u8]) -> Classification {
    let Some(signature) = SIGNATURES.iter().find(|s| s.matches(head)) else {
        return Classification::Unknown;
    };
    tracing::trace!(label = signature.label, format = signature.format, "Signature matched");
    match EXCLUDED.contains(&signature.label) {
        true => Classification::Excluded(signature.label),
        false => Classification::Known(signature.label),
    }
}
