//! PDF object model.
//!
//! The compiler renders every referenceable unit of the document graph
//! into one of these values before serialization. Only the object kinds
//! a generated document actually contains are modeled.

use std::collections::HashMap;

/// A PDF object value.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    /// Null object
    Null,
    /// Boolean value
    Boolean(bool),
    /// Integer value
    Integer(i64),
    /// Real (floating-point) value
    Real(f64),
    /// String (byte array)
    String(Vec<u8>),
    /// Name (starting with /)
    Name(String),
    /// Array of objects
    Array(Vec<Object>),
    /// Dictionary (key-value pairs)
    Dictionary(HashMap<String, Object>),
    /// Stream (dictionary + data)
    Stream {
        /// Stream dictionary
        dict: HashMap<String, Object>,
        /// Stream payload
        data: bytes::Bytes,
    },
    /// Indirect object reference
    Reference(ObjectRef),
}

/// Reference to an indirect object.
///
/// Generated documents never reuse object numbers, so the generation
/// number is always zero; it is kept in the type because the output
/// syntax requires it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// Object number
    pub id: u32,
    /// Generation number
    pub gen: u16,
}

impl ObjectRef {
    /// Create a new object reference.
    pub fn new(id: u32, gen: u16) -> Self {
        Self { id, gen }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} R", self.id, self.gen)
    }
}

impl Object {
    /// Reference to object `id` at generation 0.
    pub fn reference(id: u32) -> Object {
        Object::Reference(ObjectRef::new(id, 0))
    }

    /// Name object from a string.
    pub fn name(s: &str) -> Object {
        Object::Name(s.to_string())
    }

    /// String object from a Rust string.
    pub fn string(s: &str) -> Object {
        Object::String(s.as_bytes().to_vec())
    }

    /// Rectangle array `[llx lly urx ury]` from corner coordinates.
    pub fn rect(llx: f64, lly: f64, urx: f64, ury: f64) -> Object {
        Object::Array(vec![
            Object::Real(llx),
            Object::Real(lly),
            Object::Real(urx),
            Object::Real(ury),
        ])
    }

    /// Dictionary object from key-value pairs.
    pub fn dict(entries: Vec<(&str, Object)>) -> Object {
        Object::Dictionary(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_display() {
        assert_eq!(format!("{}", ObjectRef::new(12, 0)), "12 0 R");
    }

    #[test]
    fn test_dict_helper() {
        let d = Object::dict(vec![("Type", Object::name("Page"))]);
        match d {
            Object::Dictionary(map) => {
                assert_eq!(map.get("Type"), Some(&Object::Name("Page".to_string())));
            },
            _ => panic!("expected dictionary"),
        }
    }
}
