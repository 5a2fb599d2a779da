//! Content signatures for frozen file names.
//!
//! A [`Checksum`] pairs a hash algorithm with a digest encoding:
//!
//! | encoding   | `sha1("foo")`                              |
//! |------------|--------------------------------------------|
//! | `hex`      | `0beec7b5ea3f0fdbc95d0dd47f3c5bc275da8a33` |
//! | `alphanum` | `rwtvsvvr93tk7s18tqa9`                     |
//!
//! Frozen names are load-bearing for downstream caches, so both encodings
//! must stay bit-exact across releases.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256};

// ============================================================================
// Algorithm
// ============================================================================

/// Hash function applied to file content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Sha1,
    Sha256,
    Blake3,
}

impl HashAlgorithm {
    /// Raw digest bytes of `content`.
    pub fn hash(self, content: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => Sha1::digest(content).to_vec(),
            Self::Sha256 => Sha256::digest(content).to_vec(),
            Self::Blake3 => blake3::hash(content).as_bytes().to_vec(),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Blake3 => "blake3",
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            "blake3" => Ok(Self::Blake3),
            other => Err(format!(
                "unknown hash algorithm `{other}` (expected sha1, sha256 or blake3)"
            )),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Text rendering of the raw digest bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestEncoding {
    /// Lowercase hexadecimal, two characters per byte.
    #[default]
    Hex,
    /// One character per byte from `[0-9a-z]`.
    Alphanum,
}

impl DigestEncoding {
    pub fn encode(self, bytes: &[u8]) -> String {
        match self {
            Self::Hex => hex::encode(bytes),
            Self::Alphanum => alphanum(bytes),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hex => "hex",
            Self::Alphanum => "alphanum",
        }
    }
}

impl FromStr for DigestEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hex" => Ok(Self::Hex),
            "alphanum" => Ok(Self::Alphanum),
            other => Err(format!(
                "unknown digest encoding `{other}` (expected hex or alphanum)"
            )),
        }
    }
}

impl fmt::Display for DigestEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compact `[0-9a-z]` encoding, one character per byte.
///
/// The decimal spelling of each byte is re-read as a hexadecimal number
/// (`11` → `0x11`), which keeps names compatible with artifacts frozen by
/// earlier builds.
fn alphanum(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&byte| {
            let value = byte
                .to_string()
                .chars()
                .fold(0u32, |acc, digit| acc * 16 + digit.to_digit(10).unwrap_or(0));
            let digit = value % 36 + 48;
            if digit < 58 {
                char::from(digit as u8)
            } else {
                char::from((value % 26 + 97) as u8)
            }
        })
        .collect()
}

// ============================================================================
// Checksum
// ============================================================================

/// Content → signature function used to name frozen files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Checksum {
    pub algorithm: HashAlgorithm,
    pub encoding: DigestEncoding,
}

impl Checksum {
    pub const fn new(algorithm: HashAlgorithm, encoding: DigestEncoding) -> Self {
        Self {
            algorithm,
            encoding,
        }
    }

    /// Signature of `content`.
    pub fn of<T: AsRef<[u8]> + ?Sized>(&self, content: &T) -> String {
        self.encoding.encode(&self.algorithm.hash(content.as_ref()))
    }
}
