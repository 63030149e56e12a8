//! PDF object serialization.
//!
//! Converts [`Object`] values to their byte representation. Dictionary
//! keys are written in sorted order so identical document graphs always
//! produce identical bytes.

use crate::object::Object;
use std::collections::HashMap;
use std::io::Write;

/// Serialize an object to bytes.
pub fn serialize(obj: &Object) -> Vec<u8> {
    let mut buf = Vec::new();
    write_object(&mut buf, obj).expect("write to Vec cannot fail");
    buf
}

/// Serialize an indirect object definition.
///
/// Format: `{id} 0 obj\n{object}\nendobj\n`
pub fn serialize_indirect(id: u32, obj: &Object) -> Vec<u8> {
    let mut buf = Vec::new();
    writeln!(buf, "{} 0 obj", id).expect("write to Vec cannot fail");
    write_object(&mut buf, obj).expect("write to Vec cannot fail");
    write!(buf, "\nendobj\n").expect("write to Vec cannot fail");
    buf
}

fn write_object<W: Write>(w: &mut W, obj: &Object) -> std::io::Result<()> {
    match obj {
        Object::Null => write!(w, "null"),
        Object::Boolean(b) => write!(w, "{}", if *b { "true" } else { "false" }),
        Object::Integer(i) => write!(w, "{}", i),
        Object::Real(r) => write_real(w, *r),
        Object::String(s) => write_string(w, s),
        Object::Name(n) => write_name(w, n),
        Object::Array(arr) => write_array(w, arr),
        Object::Dictionary(dict) => write_dictionary(w, dict),
        Object::Stream { dict, data } => write_stream(w, dict, data),
        Object::Reference(r) => write!(w, "{} {} R", r.id, r.gen),
    }
}

/// Write a real number, trimming trailing zeros.
fn write_real<W: Write>(w: &mut W, value: f64) -> std::io::Result<()> {
    if value.fract() == 0.0 {
        write!(w, "{}", value as i64)
    } else {
        let formatted = format!("{:.5}", value);
        let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
        write!(w, "{}", trimmed)
    }
}

/// Write a string: literal `(...)` syntax for printable data, hex `<...>`
/// otherwise.
fn write_string<W: Write>(w: &mut W, data: &[u8]) -> std::io::Result<()> {
    let is_printable = data
        .iter()
        .all(|&b| b == b'\n' || b == b'\r' || b == b'\t' || (0x20..=0x7E).contains(&b));

    if is_printable {
        write!(w, "(")?;
        for &byte in data {
            match byte {
                b'(' => write!(w, "\\(")?,
                b')' => write!(w, "\\)")?,
                b'\\' => write!(w, "\\\\")?,
                b'\n' => write!(w, "\\n")?,
                b'\r' => write!(w, "\\r")?,
                b'\t' => write!(w, "\\t")?,
                _ => w.write_all(&[byte])?,
            }
        }
        write!(w, ")")
    } else {
        write!(w, "<")?;
        for byte in data {
            write!(w, "{:02X}", byte)?;
        }
        write!(w, ">")
    }
}

/// Write a name, escaping delimiter and non-regular bytes as `#xx`.
fn write_name<W: Write>(w: &mut W, name: &str) -> std::io::Result<()> {
    write!(w, "/")?;
    for byte in name.bytes() {
        match byte {
            b'!' | b'"' | b'$'..=b'&' | b'\''..=b'.' | b'0'..=b'9' | b';' | b'<' | b'>'
            | b'?' | b'@' | b'A'..=b'Z' | b'^'..=b'z' | b'|' | b'~' => {
                w.write_all(&[byte])?;
            },
            _ => {
                write!(w, "#{:02X}", byte)?;
            },
        }
    }
    Ok(())
}

fn write_array<W: Write>(w: &mut W, arr: &[Object]) -> std::io::Result<()> {
    write!(w, "[")?;
    for (i, obj) in arr.iter().enumerate() {
        if i > 0 {
            write!(w, " ")?;
        }
        write_object(w, obj)?;
    }
    write!(w, "]")
}

fn write_dictionary<W: Write>(w: &mut W, dict: &HashMap<String, Object>) -> std::io::Result<()> {
    write!(w, "<<")?;

    // Sorted keys keep the output deterministic
    let mut keys: Vec<_> = dict.keys().collect();
    keys.sort();

    for key in keys {
        if let Some(value) = dict.get(key) {
            write!(w, " ")?;
            write_name(w, key)?;
            write!(w, " ")?;
            write_object(w, value)?;
        }
    }
    write!(w, " >>")
}

fn write_stream<W: Write>(
    w: &mut W,
    dict: &HashMap<String, Object>,
    data: &[u8],
) -> std::io::Result<()> {
    let mut dict_with_length = dict.clone();
    dict_with_length
        .entry("Length".to_string())
        .or_insert(Object::Integer(data.len() as i64));

    write_dictionary(w, &dict_with_length)?;
    write!(w, "\nstream\n")?;
    w.write_all(data)?;
    write!(w, "\nendstream")
}
