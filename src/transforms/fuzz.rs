//! Adversarial values: broken strings, magic numbers and hostile text.

use super::{pick, Named, TransformResult};
use crate::core::value::Value;
use rand::{Rng, RngCore};

/// Format-string insertion, encoding corruption, bytes and BOMs.
pub const STRING_FAMILY: [Named; 4] = [
    Named::new("add_format", add_format),
    Named::new("change_encoding", change_encoding),
    Named::new("to_bytes", to_bytes),
    Named::new("insert_bom", insert_bom),
];

/// Null-likes, magic integers and hex strings.
pub const NUMERIC_FAMILY: [Named; 3] = [
    Named::new("nanify", nanify),
    Named::new("bigints", bigints),
    Named::new("hexify", hexify),
];

/// Type-independent hostile values.
pub const GENERIC_FAMILY: [Named; 5] = [
    Named::new("sql", sql),
    Named::new("metachars", metachars),
    Named::new("files", files),
    Named::new("delimiter", delimiter),
    Named::new("emoji", emoji),
];

const SQL_STATEMENTS: [&str; 6] = [
    "WAITFOR DELAY '0:10:0';",
    "SELECT pg_sleep(600);",
    "drop table if exists customers;",
    "drop table if exists users;",
    "drop user if exists 'admin';",
    "drop user if exists 'postgres';",
];

const PATHS: [&str; 7] = [
    "../../",
    "/var/run",
    "/etc",
    "/tmp",
    "/root",
    "source .",
    "cat /etc/passwd",
];

const METACHARS: [char; 12] = ['|', '*', '\n', ',', '>', '.', '<', '"', '\'', '\t', ';', '/'];
const DELIMITERS: [char; 6] = [';', ',', '\n', '\r', '\t', ':'];
const EMOJI_RANGES: [(u32, u32); 3] = [
    (0x1F300, 0x1F579),
    (0x1F57B, 0x1F5A3),
    (0x1F5A5, 0x1F5FF),
];

/// Insert `%f`, `%d`, `%s` or `%r` at a random character position.
pub fn add_format(value: &Value, rng: &mut dyn RngCore) -> TransformResult {
    let text = value.to_text();
    let chars = text.chars().count();
    let at = rng.gen_range(0..=chars);
    let offset = text.char_indices().nth(at).map(|(i, _)| i).unwrap_or(text.len());
    let spec = pick(&['f', 'd', 's', 'r'], rng);
    Ok(Value::String(format!("{}%{}{}", &text[..offset], spec, &text[offset..])))
}

/// Encode with a randomly chosen, possibly wrong, encoding.
pub fn change_encoding(value: &Value, rng: &mut dyn RngCore) -> TransformResult {
    let text = value.to_text();
    let bytes = match *pick(&["utf-16", "latin-1", "windows-1250", "iso-8859-1"], rng) {
        "utf-16" => {
            let mut out = vec![0xFF, 0xFE];
            for unit in text.encode_utf16() {
                out.extend_from_slice(&unit.to_le_bytes());
            }
            out
        }
        "windows-1250" => text
            .chars()
            .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
            .collect(),
        _ => text
            .chars()
            .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
            .collect(),
    };
    Ok(Value::Bytes(bytes))
}

pub fn to_bytes(value: &Value, _rng: &mut dyn RngCore) -> TransformResult {
    match value {
        Value::Bytes(b) => Ok(Value::Bytes(b.clone())),
        other => Ok(Value::Bytes(other.to_text().into_owned().into_bytes())),
    }
}

pub fn insert_bom(value: &Value, _rng: &mut dyn RngCore) -> TransformResult {
    Ok(Value::String(format!("\u{FEFF}{}", value.to_text())))
}

pub fn nanify(_value: &Value, rng: &mut dyn RngCore) -> TransformResult {
    Ok(match rng.gen_range(0..6) {
        0 => Value::Null,
        1 => Value::from("null"),
        2 => Value::from("n/a"),
        3 => Value::from(""),
        4 => Value::Int(-1),
        _ => Value::Float(f64::NAN),
    })
}

pub fn bigints(_value: &Value, rng: &mut dyn RngCore) -> TransformResult {
    let magnitude = *pick(
        &[
            (1i64 << 15) - 1,
            (1i64 << 31) - 1,
            (1i64 << 32) - 1,
            i64::MAX,
        ],
        rng,
    );
    let sign = *pick(&[1i64, -1], rng);
    Ok(Value::Int(magnitude * sign))
}

/// Hex rendering of the integer value (`0xff`, `-0xff`). Values without an
/// integer reading are returned unchanged.
pub fn hexify(value: &Value, _rng: &mut dyn RngCore) -> TransformResult {
    let int = match value {
        Value::Int(i) => Some(*i),
        Value::Float(f) if f.is_finite() => Some(f.trunc() as i64),
        Value::Bool(b) => Some(*b as i64),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match int {
        Some(i) if i < 0 => Ok(Value::String(format!("-{:#x}", i.unsigned_abs()))),
        Some(i) => Ok(Value::String(format!("{:#x}", i))),
        None => {
            tracing::warn!(value = %value, "could not hexify");
            Ok(value.clone())
        }
    }
}

pub fn sql(_value: &Value, rng: &mut dyn RngCore) -> TransformResult {
    Ok(Value::from(*pick(&SQL_STATEMENTS, rng)))
}

/// Join the characters of the value with one metacharacter.
pub fn metachars(value: &Value, rng: &mut dyn RngCore) -> TransformResult {
    let glue = pick(&METACHARS, rng).to_string();
    Ok(Value::String(join_chars(&value.to_text(), &glue)))
}

pub fn files(_value: &Value, rng: &mut dyn RngCore) -> TransformResult {
    Ok(Value::from(*pick(&PATHS, rng)))
}

/// Join the characters of the value with one to five copies of a delimiter.
pub fn delimiter(value: &Value, rng: &mut dyn RngCore) -> TransformResult {
    let glue = pick(&DELIMITERS, rng).to_string().repeat(rng.gen_range(1..=5));
    Ok(Value::String(join_chars(&value.to_text(), &glue)))
}

/// Append a space and one pictograph, drawn uniformly over all ranges.
pub fn emoji(value: &Value, rng: &mut dyn RngCore) -> TransformResult {
    let total: u32 = EMOJI_RANGES.iter().map(|(lo, hi)| hi - lo + 1).sum();
    let mut point = rng.gen_range(0..total);
    let mut symbol = '?';
    for (lo, hi) in EMOJI_RANGES {
        let size = hi - lo + 1;
        if point < size {
            symbol = char::from_u32(lo + point).unwrap_or('?');
            break;
        }
        point -= size;
    }
    Ok(Value::String(format!("{} {}", value.to_text(), symbol)))
}

fn join_chars(text: &str, glue: &str) -> String {
    text.chars()
        .map(String::from)
        .collect::<Vec<_>>()
        .join(glue)
}
