use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Case-fold a single character without changing the character count.
///
/// Characters whose lowercase form expands to several characters are kept
/// as-is so that offsets into the folded text stay valid offsets into the
/// original.
pub fn fold_char(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

/// A frame's display name, shared between the flattened frame list, search
/// results and tooltips.
///
/// Cloning is a refcount bump. The characters are decoded once at
/// construction, together with their case-folded form, so that matchers can
/// work in character offsets without re-decoding UTF-8 for every query.
#[derive(Debug, Clone, Eq)]
pub struct FrameName {
    text: Arc<str>,
    chars: Arc<[char]>,
    folded: Arc<[char]>,
}

impl FrameName {
    pub fn new(text: &str) -> Self {
        let chars: Arc<[char]> = text.chars().collect();
        let folded: Arc<[char]> = chars.iter().copied().map(fold_char).collect();
        Self {
            text: Arc::from(text),
            chars,
            folded,
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The name as characters; match ranges index into this slice.
    #[inline]
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// Per-character case-folded form, same length as [`FrameName::chars`].
    #[inline]
    pub fn folded(&self) -> &[char] {
        &self.folded
    }

    /// Length in characters.
    #[inline]
    pub fn char_len(&self) -> usize {
        self.chars.len()
    }
}

impl PartialEq for FrameName {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.text, &other.text) || *self.text == *other.text
    }
}

impl PartialEq<str> for FrameName {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        &*self.text == other
    }
}

impl PartialEq<&str> for FrameName {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        &*self.text == *other
    }
}

impl std::hash::Hash for FrameName {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (*self.text).hash(state);
    }
}

impl std::ops::Deref for FrameName {
    type Target = str;

    #[inline]
    fn deref(&self) -> &str {
        &self.text
    }
}

impl AsRef<str> for FrameName {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl From<&str> for FrameName {
    fn from(s: &str) -> Self {
        FrameName::new(s)
    }
}

impl From<String> for FrameName {
    fn from(s: String) -> Self {
        FrameName::new(&s)
    }
}

impl std::fmt::Display for FrameName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.text.fmt(f)
    }
}

// Only the text goes over the wire; the char tables are rebuilt on load.

impl Serialize for FrameName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for FrameName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(FrameName::new(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folded_matches_char_count() {
        let name = FrameName::from("ReactDOM.render");
        assert_eq!(name.char_len(), 15);
        assert_eq!(name.folded().len(), name.chars().len());
        assert_eq!(name.folded()[0], 'r');
        assert_eq!(name.chars()[0], 'R');
    }

    #[test]
    fn multibyte_names_use_char_offsets() {
        let name = FrameName::from("größe→run");
        assert_eq!(name.char_len(), 9);
        assert_eq!(name.chars()[5], '→');
    }

    #[test]
    fn expanding_lowercase_is_kept_verbatim() {
        // 'İ' lowercases to two chars; folding must not shift offsets.
        assert_eq!(fold_char('İ'), 'İ');
        assert_eq!(fold_char('A'), 'a');
    }

    #[test]
    fn eq_str() {
        let name = FrameName::from("main");
        assert_eq!(name, "main");
        assert_eq!(name.clone(), name);
    }

    #[test]
    fn serde_roundtrip_rebuilds_tables() {
        let name = FrameName::from("Flame");
        let json = serde_json::to_string(&name).unwrap_or_default();
        assert_eq!(json, "\"Flame\"");
        let back: FrameName =
            serde_json::from_str(&json).unwrap_or_else(|_| FrameName::from(""));
        assert_eq!(back, "Flame");
        assert_eq!(back.folded(), &['f', 'l', 'a', 'm', 'e']);
    }

    #[test]
    fn hashmap_lookup() {
        let mut map = std::collections::HashMap::new();
        map.insert(FrameName::from("key"), 42);
        assert_eq!(map.get(&FrameName::from("key")), Some(&42));
    }
}
