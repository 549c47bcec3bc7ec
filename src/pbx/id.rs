use std::fmt;
use uuid::Uuid;

/// Identifies an object in the project file, 96 bits written as 24 hex digits.
///
/// Identifiers are derived from a stable description of the object instead of
/// being random, so regenerating an unchanged graph produces the same file.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ObjectId(String);

impl ObjectId {
  pub fn new(kind: &str, identity: &str) -> Self {
    let uuid  = Uuid::new_v5(&Uuid::NAMESPACE_OID, [kind, "\0", identity].concat().as_bytes());
    let bytes = uuid.as_bytes();

    let mut id = String::with_capacity(24);
    for b in &bytes[..12] {
      id.push(hex_char(b >> 4));
      id.push(hex_char(b & 0xF));
    }
    ObjectId(id)
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

fn hex_char(b: u8) -> char {
  match b < 10 {
    true  => (b'0' + b)        as char,
    false => (b'A' + (b - 10)) as char
  }
}

impl fmt::Display for ObjectId {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str(&self.0)
  }
}
