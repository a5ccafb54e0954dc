//! Text encoding detection and decoding.
//!
//! [`resolve_encoding`] figures out which encoding a source file uses. In
//! automatic mode the heuristic is, in order:
//!
//! 1. empty files are `utf-8`,
//! 2. a byte order mark decides,
//! 3. a `coding: <name>` declaration in the first two lines,
//! 4. an XML prolog `encoding="<name>"` on the first line,
//! 5. the first 16 KiB decode as UTF-8,
//! 6. otherwise the fallback encoding.
//!
//! [`decode`] turns bytes into text for a resolved encoding name.

#[cfg(feature = "chardet")]
pub mod sniffer;

use std::borrow::Cow;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

/// Number of bytes inspected for BOMs and encoding declarations.
const HEADING_SIZE: u64 = 128;

/// Number of bytes probed when checking for UTF-8.
const UTF8_PROBE_SIZE: u64 = 16 * 1024;

/// Byte order marks in the order they must be tested.
///
/// The UTF-32 LE mark starts with the UTF-16 LE mark, so it has to come
/// first.
const BOMS: [(&[u8], &str); 5] = [
    (&[0xEF, 0xBB, 0xBF], "utf-8-sig"),
    (&[0xFF, 0xFE, 0x00, 0x00], "utf-32-le"),
    (&[0xFE, 0xFF], "utf-16-be"),
    (&[0xFF, 0xFE], "utf-16-le"),
    (&[0x00, 0x00, 0xFE, 0xFF], "utf-32-be"),
];

/// Errors raised while resolving or applying an encoding.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("encoding name must not be empty")]
    EmptyName,

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown encoding: {0}")]
    UnknownEncoding(String),

    #[error("input is not valid {encoding}")]
    Malformed { encoding: String },

    #[error("encoding detection requested but no sniffer is available")]
    SnifferUnavailable,
}

/// How the encoding of a file is determined.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EncodingMode {
    /// BOM, declarations and UTF-8 probing, see the module docs.
    #[default]
    Automatic,
    /// Ask an [`EncodingSniffer`].
    Detector,
    /// Use the named encoding as is.
    Explicit(String),
}

impl FromStr for EncodingMode {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Err(EncodingError::EmptyName),
            "automatic" => Ok(EncodingMode::Automatic),
            "chardet" => Ok(EncodingMode::Detector),
            name => Ok(EncodingMode::Explicit(name.to_string())),
        }
    }
}

impl fmt::Display for EncodingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodingMode::Automatic => f.write_str("automatic"),
            EncodingMode::Detector => f.write_str("chardet"),
            EncodingMode::Explicit(name) => f.write_str(name),
        }
    }
}

/// Incremental statistical encoding detector.
///
/// One instance holds state for one file at a time: callers sharing an
/// instance must hold it exclusively from `reset` until `result`.
pub trait EncodingSniffer: Send {
    /// Forget everything fed so far.
    fn reset(&mut self);

    /// Feed the next chunk of raw bytes.
    fn feed(&mut self, bytes: &[u8]);

    /// Whether the sniffer has seen enough to decide.
    fn done(&self) -> bool;

    /// Best guess so far, as an encoding name.
    fn result(&self) -> Option<String>;
}

/// Resolve the encoding of the file at `path`.
///
/// `fallback` is used when automatic detection finds nothing and the file
/// is not UTF-8, or when a sniffer has no guess.
pub fn resolve_encoding(
    path: &Path,
    mode: &EncodingMode,
    fallback: &str,
    sniffer: Option<&mut dyn EncodingSniffer>,
) -> Result<String, EncodingError> {
    debug_assert!(!fallback.is_empty(), "fallback encoding must not be empty");

    let encoding = match mode {
        EncodingMode::Explicit(name) => name.clone(),
        EncodingMode::Automatic => detect_automatic(path, fallback)?,
        EncodingMode::Detector => {
            let sniffer = sniffer.ok_or(EncodingError::SnifferUnavailable)?;
            sniff(path, sniffer)?.unwrap_or_else(|| fallback.to_string())
        }
    };

    debug!("{}: encoding {} ({})", path.display(), encoding, mode);
    Ok(encoding)
}

fn detect_automatic(path: &Path, fallback: &str) -> Result<String, EncodingError> {
    let heading = read_prefix(path, HEADING_SIZE)?;
    if heading.is_empty() {
        return Ok("utf-8".to_string());
    }

    if let Some(encoding) = encoding_from_heading(&heading) {
        return Ok(encoding);
    }

    let probe = if (heading.len() as u64) < HEADING_SIZE {
        heading
    } else {
        read_prefix(path, UTF8_PROBE_SIZE)?
    };

    if is_utf8_prefix(&probe, probe.len() as u64 == UTF8_PROBE_SIZE) {
        Ok("utf-8".to_string())
    } else {
        Ok(fallback.to_string())
    }
}

/// Encoding named by the first bytes of a file, if any.
///
/// Checks byte order marks first, then a `coding[:=] <name>` declaration
/// in the first two lines, then an XML prolog on the first line.
pub fn encoding_from_heading(heading: &[u8]) -> Option<String> {
    if let Some(encoding) = encoding_from_bom(heading) {
        return Some(encoding.to_string());
    }

    let text = ascii_heading(heading);

    if let Some(caps) = coding_regex().and_then(|re| re.captures(&text)) {
        return Some(caps["encoding"].to_string());
    }

    let first_line = text.split('\n').next().unwrap_or_default();
    xml_prolog_regex()
        .and_then(|re| re.captures(first_line))
        .map(|caps| caps["encoding"].to_string())
}

/// Encoding signaled by a byte order mark at the start of `bytes`.
pub fn encoding_from_bom(bytes: &[u8]) -> Option<&'static str> {
    BOMS.iter()
        .find(|(bom, _)| bytes.starts_with(bom))
        .map(|(_, encoding)| *encoding)
}

/// First two lines of the heading as ASCII with normalized line endings.
fn ascii_heading(heading: &[u8]) -> String {
    let ascii: String = heading
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { char::REPLACEMENT_CHARACTER })
        .collect();
    let normalized = ascii.replace("\r\n", "\n").replace('\r', "\n");

    let mut text = normalized.split('\n').take(2).collect::<Vec<_>>().join("\n");
    text.push('\n');
    text
}

// Compiled once; `None` only if a pattern fails to compile.
static CODING_RE: OnceLock<Option<Regex>> = OnceLock::new();
static XML_PROLOG_RE: OnceLock<Option<Regex>> = OnceLock::new();

fn coding_regex() -> Option<&'static Regex> {
    CODING_RE
        .get_or_init(|| Regex::new(r"(?s)^.+coding[:=][ \t]*(?P<encoding>[-_.a-zA-Z0-9]+)\b").ok())
        .as_ref()
}

fn xml_prolog_regex() -> Option<&'static Regex> {
    XML_PROLOG_RE
        .get_or_init(|| {
            Regex::new(r#"^<\?xml\s+.*encoding="(?P<encoding>[-_.a-zA-Z0-9]+)".*\?>"#).ok()
        })
        .as_ref()
}

/// Whether `bytes` is UTF-8, allowing a sequence cut off at the end when
/// the input was truncated.
fn is_utf8_prefix(bytes: &[u8], truncated: bool) -> bool {
    match std::str::from_utf8(bytes) {
        Ok(_) => true,
        Err(e) => truncated && e.error_len().is_none(),
    }
}

fn read_prefix(path: &Path, limit: u64) -> Result<Vec<u8>, EncodingError> {
    let io_error = |source| EncodingError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_error)?;
    let mut buffer = Vec::new();
    file.take(limit).read_to_end(&mut buffer).map_err(io_error)?;
    Ok(buffer)
}

fn sniff(path: &Path, sniffer: &mut dyn EncodingSniffer) -> Result<Option<String>, EncodingError> {
    let bytes = std::fs::read(path).map_err(|source| EncodingError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    sniffer.reset();
    for line in bytes.split_inclusive(|&b| b == b'\n') {
        sniffer.feed(line);
        if sniffer.done() {
            break;
        }
    }
    Ok(sniffer.result())
}

/// Bytes code page 1252 leaves unassigned.
const CP1252_UNDEFINED: [u8; 5] = [0x81, 0x8D, 0x8F, 0x90, 0x9D];

/// Decode `bytes` using the encoding called `encoding`.
///
/// Names are matched case-insensitively, with `_` and `-` treated alike.
/// Decoding is strict: malformed input is an error.
pub fn decode(bytes: &[u8], encoding: &str) -> Result<String, EncodingError> {
    let normalized = encoding.trim().to_ascii_lowercase().replace('_', "-");
    let malformed = || EncodingError::Malformed {
        encoding: encoding.to_string(),
    };

    let text = match normalized.as_str() {
        "" => return Err(EncodingError::EmptyName),
        "utf-8" | "utf8" | "u8" => std::str::from_utf8(bytes).map_err(|_| malformed())?.to_string(),
        "utf-8-sig" | "utf8-sig" => {
            let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF][..]).unwrap_or(bytes);
            std::str::from_utf8(bytes).map_err(|_| malformed())?.to_string()
        }
        "ascii" | "us-ascii" | "646" => {
            if !bytes.is_ascii() {
                return Err(malformed());
            }
            bytes.iter().map(|&b| b as char).collect()
        }
        "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" | "8859" | "cp819" | "l1" => {
            bytes.iter().map(|&b| b as char).collect()
        }
        "cp1252" | "windows-1252" | "1252" => {
            if bytes.iter().any(|b| CP1252_UNDEFINED.contains(b)) {
                return Err(malformed());
            }
            decode_strict(encoding_rs::WINDOWS_1252, bytes).ok_or_else(malformed)?
        }
        "utf-32" | "utf32" => match bytes {
            [0xFF, 0xFE, 0x00, 0x00, rest @ ..] => {
                decode_utf32(rest, u32::from_le_bytes).ok_or_else(malformed)?
            }
            [0x00, 0x00, 0xFE, 0xFF, rest @ ..] => {
                decode_utf32(rest, u32::from_be_bytes).ok_or_else(malformed)?
            }
            _ => decode_utf32(bytes, u32::from_le_bytes).ok_or_else(malformed)?,
        },
        "utf-32-le" | "utf-32le" => {
            decode_utf32(bytes, u32::from_le_bytes).ok_or_else(malformed)?
        }
        "utf-32-be" | "utf-32be" => {
            decode_utf32(bytes, u32::from_be_bytes).ok_or_else(malformed)?
        }
        "utf-16" | "utf16" => match bytes {
            [0xFE, 0xFF, rest @ ..] => {
                decode_strict(encoding_rs::UTF_16BE, rest).ok_or_else(malformed)?
            }
            [0xFF, 0xFE, rest @ ..] => {
                decode_strict(encoding_rs::UTF_16LE, rest).ok_or_else(malformed)?
            }
            _ => decode_strict(encoding_rs::UTF_16LE, bytes).ok_or_else(malformed)?,
        },
        "utf-16-le" | "utf-16le" => {
            decode_strict(encoding_rs::UTF_16LE, bytes).ok_or_else(malformed)?
        }
        "utf-16-be" | "utf-16be" => {
            decode_strict(encoding_rs::UTF_16BE, bytes).ok_or_else(malformed)?
        }
        _ => {
            let codec = encoding_rs::Encoding::for_label(encoding.trim().as_bytes())
                .or_else(|| encoding_rs::Encoding::for_label(normalized.as_bytes()))
                .ok_or_else(|| EncodingError::UnknownEncoding(encoding.to_string()))?;
            decode_strict(codec, bytes).ok_or_else(malformed)?
        }
    };

    Ok(text)
}

fn decode_strict(codec: &'static encoding_rs::Encoding, bytes: &[u8]) -> Option<String> {
    codec
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(Cow::into_owned)
}

fn decode_utf32(bytes: &[u8], to_u32: fn([u8; 4]) -> u32) -> Option<String> {
    let chunks = bytes.chunks_exact(4);
    if !chunks.remainder().is_empty() {
        return None;
    }
    chunks
        .map(|chunk| char::from_u32(to_u32([chunk[0], chunk[1], chunk[2], chunk[3]])))
        .collect()
}
