use std::{collections::HashMap, fmt, marker::PhantomData};

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};

use crate::error::{ConfigurationError, DuplicateKeySnafu};

/// An insertion-ordered map whose keys compare case-insensitively.
///
/// Keys keep the casing they were inserted with. Lookups and duplicate detection compare keys
/// as [`eq_ignore_case`] does.
#[derive(Clone, PartialEq)]
pub struct CaseInsensitiveMap<V> {
    entries: Vec<(String, V)>,
    index: HashMap<String, usize>,
}

/// Upper-cases `c` if its upper-case form is a single character. Leaves it as is otherwise.
fn fold(c: char) -> char {
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(it), None) => it,
        _ => c,
    }
}

fn normalize(key: &str) -> String {
    key.chars().map(fold).collect()
}

/// Ordinal comparison ignoring case, character by character, using simple upper-case mappings.
///
/// `"É"` equals `"é"`, while `"\u{212A}"` (Kelvin sign) does not equal `"k"`.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars().map(fold).eq(b.chars().map(fold))
}

impl<V> CaseInsensitiveMap<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(&normalize(key))
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.index
            .get(&normalize(key))
            .map(|&position| &self.entries[position].1)
    }

    /// Inserts a new entry. Fails if a key equal to `key` (ignoring case) is already present.
    pub fn try_insert(
        &mut self,
        key: impl Into<String>,
        value: V,
    ) -> Result<(), ConfigurationError> {
        let key = key.into();
        let normalized = normalize(&key);
        if self.index.contains_key(&normalized) {
            return DuplicateKeySnafu { key }.fail();
        }
        self.index.insert(normalized, self.entries.len());
        self.entries.push((key, value));
        Ok(())
    }

    /// Inserts or replaces an entry, returning the replaced value.
    /// A replaced entry keeps its position and its original key casing.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        let normalized = normalize(&key);
        match self.index.get(&normalized) {
            Some(&position) => Some(std::mem::replace(&mut self.entries[position].1, value)),
            None => {
                self.index.insert(normalized, self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }
}

impl<V> Default for CaseInsensitiveMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for CaseInsensitiveMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<V: Serialize> Serialize for CaseInsensitiveMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for CaseInsensitiveMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MapVisitor<V>(PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for MapVisitor<V> {
            type Value = CaseInsensitiveMap<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map with case-insensitively unique keys")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = CaseInsensitiveMap::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    map.try_insert(key, value).map_err(serde::de::Error::custom)?;
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(MapVisitor(PhantomData))
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for CaseInsensitiveMap<V> {
    /// Later entries replace earlier ones whose key only differs in casing.
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

#[cfg(test)]
mod test {
    use assertr::prelude::*;

    use super::{CaseInsensitiveMap, eq_ignore_case};

    #[test]
    fn lookups_ignore_case_but_keys_keep_their_casing() {
        let mut map = CaseInsensitiveMap::new();
        map.try_insert("Key-1", 1).unwrap();
        map.try_insert("key-2", 2).unwrap();

        assert_that(map.get("KEY-1").copied()).is_equal_to(Some(1));
        assert_that(map.get("Key-2").copied()).is_equal_to(Some(2));
        assert_that(map.keys().collect::<Vec<_>>()).is_equal_to(vec!["Key-1", "key-2"]);
    }

    #[test]
    fn try_insert_rejects_keys_differing_only_in_case() {
        let mut map = CaseInsensitiveMap::new();
        map.try_insert("scheme", ()).unwrap();

        let err = map.try_insert("SCHEME", ()).unwrap_err();

        assert_that(err.to_string().as_str())
            .is_equal_to("An item with the same key has already been added. Key: SCHEME");
        assert_that(map.len()).is_equal_to(1);
    }

    #[test]
    fn keys_compare_by_simple_case_mapping() {
        let mut map = CaseInsensitiveMap::new();
        map.try_insert("\u{212A}ey", 1).unwrap();
        map.try_insert("key", 2).unwrap();
        map.try_insert("Éclair", 3).unwrap();

        assert_that(map.try_insert("éCLAIR", 4).is_err()).is_equal_to(true);
        assert_that(map.get("KEY").copied()).is_equal_to(Some(2));
        assert_that(map.get("\u{212A}EY").copied()).is_equal_to(Some(1));
        assert_that(eq_ignore_case("Straße", "STRASSE")).is_equal_to(false);
        assert_that(eq_ignore_case("Id_Token", "id_token")).is_equal_to(true);
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut map = CaseInsensitiveMap::new();
        map.insert("a", 1);
        map.insert("b", 2);

        assert_that(map.insert("A", 3)).is_equal_to(Some(1));
        assert_that(
            map.iter()
                .map(|(k, v)| (k.to_owned(), *v))
                .collect::<Vec<_>>(),
        )
        .is_equal_to(vec![(String::from("a"), 3), (String::from("b"), 2)]);
    }

    #[test]
    fn deserializing_duplicate_keys_fails() {
        let result = serde_json::from_str::<CaseInsensitiveMap<u8>>(r#"{"a":1,"A":2}"#);

        assert_that(result.is_err()).is_equal_to(true);
    }
}
