//! PDF string encodings used by field values and drawn text.

use lopdf::{Object, StringFormat};

/// Encode a value as a PDF text string (field `/V`, `/TU`, ...).
///
/// ASCII text is stored as a literal string; anything else as UTF-16BE
/// with a byte-order mark.
pub fn encode_text_string(value: &str) -> Object {
    if value.chars().all(|c| (c as u32) < 0x80) {
        return Object::String(value.as_bytes().to_vec(), StringFormat::Literal);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in value.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Decode a PDF text string: UTF-16BE when it carries a BOM, otherwise
/// PDFDocEncoding, which matches Latin-1 for everything a form holds.
pub fn decode_text_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8_lossy(rest).into_owned(),
        _ => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Read a text-string object, if it is one.
pub fn object_text(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

/// Encode text for a `Tj` operand in a WinAnsiEncoding standard font.
///
/// WinAnsi agrees with Latin-1 for the printable range, which is all a
/// name or date needs; other characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u32 as u8,
            0x2019 => 0x92,
            0x2013 => 0x96,
            0x2014 => 0x97,
            _ => b'?',
        })
        .collect()
}
