use encoding_rs::SHIFT_JIS;
use std::{
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

#[inline]
/// Returns `true` if `str` contains at least one code point outside of the single-byte (`0..=0xFF`) range.
///
/// Such strings are considered worth translating. There's no normalization or trimming.
pub fn is_candidate(str: &str) -> bool {
    str.chars().any(|char| char as u32 > 0xFF)
}

#[inline]
/// This function is exactly similar to `std::fs::read_to_string`, but it doesn't include Byte Order Mark, if there's any.
pub fn read_to_string_without_bom<P: AsRef<Path>>(
    file_path: P,
) -> std::io::Result<String> {
    const BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

    let file: File = File::open(file_path.as_ref())?;
    let mut reader: BufReader<File> = BufReader::new(file);

    let mut content: Vec<u8> = Vec::new();
    reader.read_to_end(&mut content)?;

    let content = content.strip_prefix(&BOM).unwrap_or(&content[..]);

    String::from_utf8(content.to_vec())
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))
}

/// Recovers a file name that was stored in an archive without the UTF-8 flag.
///
/// Such names are Shift_JIS bytes that archivers would otherwise show as CP437 mojibake.
/// Returns [`None`] if the bytes aren't valid Shift_JIS.
pub fn decode_legacy_name(raw: &[u8]) -> Option<String> {
    let (decoded, _, had_errors) = SHIFT_JIS.decode(raw);

    if had_errors {
        None
    } else {
        Some(decoded.into_owned())
    }
}
