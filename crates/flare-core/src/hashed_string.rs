// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Interned-style names compared by a precomputed hash.
//!
//! Stream names, processor names and event types are looked up every frame.
//! A [`HashedString`] hashes its text once with `ahash` so equality and map
//! lookups only compare a `u64` before falling back to the text.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::{Arc, OnceLock};

fn name_hasher() -> &'static ahash::RandomState {
    // Fixed keys: hashes must agree across every instance in the process.
    static STATE: OnceLock<ahash::RandomState> = OnceLock::new();
    STATE.get_or_init(|| ahash::RandomState::with_seeds(0x6a09, 0xbb67, 0x3c6e, 0xa54f))
}

/// An immutable, cheaply clonable string carrying its own hash.
#[derive(Clone)]
pub struct HashedString {
    text: Arc<str>,
    hash: u64,
}

impl HashedString {
    /// Creates a new hashed string from any string-like value.
    pub fn new(text: impl AsRef<str>) -> Self {
        let text = text.as_ref();
        Self {
            hash: name_hasher().hash_one(text),
            text: Arc::from(text),
        }
    }

    /// Returns the text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns the precomputed hash.
    #[inline]
    pub fn hash_value(&self) -> u64 {
        self.hash
    }

    /// Returns `true` if the text is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl Default for HashedString {
    fn default() -> Self {
        Self::new("")
    }
}

impl PartialEq for HashedString {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.text == other.text
    }
}

impl Eq for HashedString {}

impl Hash for HashedString {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl PartialEq<str> for HashedString {
    fn eq(&self, other: &str) -> bool {
        &*self.text == other
    }
}

impl PartialEq<&str> for HashedString {
    fn eq(&self, other: &&str) -> bool {
        &*self.text == *other
    }
}

impl From<&str> for HashedString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for HashedString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for HashedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.text)
    }
}

impl fmt::Display for HashedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for HashedString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for HashedString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Self::new(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn equal_text_gives_equal_hash() {
        let a = HashedString::new("Position");
        let b = HashedString::from(String::from("Position"));
        assert_eq!(a, b);
        assert_eq!(a.hash_value(), b.hash_value());
        assert_ne!(a, HashedString::new("Velocity"));
        assert!(a == "Position");
    }

    #[test]
    fn usable_as_map_key() {
        let mut map = HashMap::new();
        map.insert(HashedString::new("Color"), 4);
        assert_eq!(map.get(&HashedString::new("Color")), Some(&4));
    }

    #[test]
    fn serializes_as_plain_string() {
        let name = HashedString::new("Explosion");
        let text = ron::to_string(&name).expect("serialize");
        assert_eq!(text, "\"Explosion\"");
        let back: HashedString = ron::from_str(&text).expect("deserialize");
        assert_eq!(back, name);
    }
}
