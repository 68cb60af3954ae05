use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Bytes escaped when a short name is used as a single URL path segment.
///
/// Unreserved characters and the sub-delimiters allowed inside a segment
/// are kept; `/`, `;`, `,` and `?` are escaped along with everything else.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b':')
    .remove(b'=')
    .remove(b'@');

/// Returns the canonical storage key for a short name.
///
/// The name is lower-cased, escaped for use in a path segment, and stripped
/// of every hyphen, so `Go-Link`, `golink` and `GOLINK` share one key.
pub fn normalize(short: &str) -> String {
    // per character: `str::to_lowercase` would turn a word-final `Σ` into `ς`
    let lowered: String = short.chars().flat_map(char::to_lowercase).collect();
    let mut key = utf8_percent_encode(&lowered, PATH_SEGMENT).to_string();
    key.retain(|c| c != '-');
    key
}

/// The canonical key a link is stored under.
///
/// Keys are never shown to end users; the display form lives in
/// [`Link::short`](crate::Link::short).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkKey(String);

impl LinkKey {
    /// Normalizes a short name into its key.
    pub fn from_short(short: &str) -> Self {
        Self(normalize(short))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for LinkKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LinkKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
