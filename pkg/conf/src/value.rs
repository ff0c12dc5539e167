use std::fmt;

use bumpalo::Bump;

/// Longest string stored inline in a value. Anything longer goes to the
/// arena as a heap string.
pub const MAX_SHORT_STRING: usize = 14;

/// A string of up to MAX_SHORT_STRING bytes stored inside the value itself
/// so that small keys and values need no arena allocation.
#[derive(Clone, Copy)]
pub struct ShortString {
    len: u8,
    bytes: [u8; MAX_SHORT_STRING],
}

impl ShortString {
    /// NOTE: 's' must fit. Callers go through Value::string_in which picks
    /// the variant by length.
    pub(crate) fn new(s: &str) -> Self {
        let mut bytes = [0u8; MAX_SHORT_STRING];
        bytes[..s.len()].copy_from_slice(s.as_bytes());
        Self {
            len: s.len() as u8,
            bytes,
        }
    }

    pub(crate) fn from_bytes(raw: &[u8]) -> Option<Self> {
        match std::str::from_utf8(raw) {
            Ok(s) => Some(Self::new(s)),
            Err(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        // Always valid UTF-8 by construction.
        std::str::from_utf8(&self.bytes[..self.len as usize]).unwrap()
    }
}

impl fmt::Debug for ShortString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

/// A single node of a configuration tree. Values are cheap to copy: the
/// aggregate variants hold references to arena-allocated storage, so copying
/// a value shares the subtree rather than duplicating it.
#[derive(Clone, Copy)]
pub enum Value<'a> {
    Null,
    Bool(bool),
    Integer(i64),
    Short(ShortString),
    String(&'a str),
    Array(&'a [Value<'a>]),
    Object(&'a [Member<'a>]),
}

/// One named slot of an object. The name is always a Short or String value.
#[derive(Clone, Copy)]
pub struct Member<'a> {
    name: Value<'a>,
    value: Value<'a>,
}

impl<'a> Member<'a> {
    pub(crate) fn new(name: Value<'a>, value: Value<'a>) -> Self {
        Self { name, value }
    }

    pub fn name(&self) -> &str {
        match &self.name {
            Value::Short(s) => s.as_str(),
            Value::String(s) => s,
            _ => unreachable!("member names are always strings"),
        }
    }

    pub(crate) fn name_value(&self) -> Value<'a> {
        self.name
    }

    pub fn value(&self) -> Value<'a> {
        self.value
    }
}

impl<'a> Value<'a> {
    /// Builds a string value, inline if it fits in the short form.
    pub fn string_in(arena: &'a Bump, s: &str) -> Value<'a> {
        if s.len() <= MAX_SHORT_STRING {
            Value::Short(ShortString::new(s))
        } else {
            Value::String(arena.alloc_str(s))
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn get_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_string(&self) -> Option<&str> {
        match self {
            Value::Short(s) => Some(s.as_str()),
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Looks up a direct member of an object by exact name.
    pub fn get_field(&self, name: &str) -> Option<Value<'a>> {
        match self {
            Value::Object(members) => members
                .iter()
                .find(|m| m.name() == name)
                .map(|m| m.value()),
            _ => None,
        }
    }

    pub fn get_element(&self, idx: usize) -> Option<Value<'a>> {
        match self {
            Value::Array(elements) => elements.get(idx).copied(),
            _ => None,
        }
    }

    pub fn get_elements(&self) -> Option<&'a [Value<'a>]> {
        match self {
            Value::Array(elements) => Some(elements),
            _ => None,
        }
    }

    pub fn members(&self) -> Option<&'a [Member<'a>]> {
        match self {
            Value::Object(members) => Some(members),
            _ => None,
        }
    }
}

impl PartialEq for Value<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            // Short and heap strings compare by content.
            (a, b) => match (a.get_string(), b.get_string()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl PartialEq for Member<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name() && self.value == other.value
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::printer::print(self))
    }
}

impl fmt::Debug for Member<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{:?}", self.name(), self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_string_inline() {
        let s = ShortString::new("14 bytes exact");
        assert_eq!(s.as_str(), "14 bytes exact");

        let arena = Bump::new();
        assert!(matches!(
            Value::string_in(&arena, "14 bytes exact"),
            Value::Short(_)
        ));
        assert!(matches!(
            Value::string_in(&arena, "15 bytes in all"),
            Value::String(_)
        ));
    }

    #[test]
    fn string_forms_compare_equal() {
        let arena = Bump::new();
        let short = Value::string_in(&arena, "abc");
        let heap = Value::String(arena.alloc_str("abc"));
        assert_eq!(short, heap);
    }
}
