//! Insertion-ordered string-keyed map
//!
//! Vars, env and includes keep the order they were declared in, so that
//! merges and include processing are deterministic.

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

/// A map that iterates in insertion order
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V> {
    keys: Vec<String>,
    mapping: HashMap<String, V>,
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        OrderedMap {
            keys: Vec::new(),
            mapping: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.mapping.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.mapping.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.mapping.contains_key(key)
    }

    /// Insert or overwrite a value; a new key is appended to the order
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        if !self.mapping.contains_key(&key) {
            self.keys.push(key.clone());
        }
        self.mapping.insert(key, value);
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.keys.iter()
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &V)> {
        self.keys
            .iter()
            .filter_map(move |k| self.mapping.get(k).map(|v| (k, v)))
    }

    /// Mutable access to every value; order is unspecified
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.mapping.values_mut()
    }

    /// Copy every entry of `other` into `self`, later entries winning
    pub fn merge(&mut self, other: OrderedMap<V>) {
        for (key, value) in other {
            self.set(key, value);
        }
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> IntoIterator for OrderedMap<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(mut self) -> Self::IntoIter {
        let mut entries = Vec::with_capacity(self.keys.len());
        for key in self.keys {
            if let Some(value) = self.mapping.remove(&key) {
                entries.push((key, value));
            }
        }
        entries.into_iter()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        for (key, value) in iter {
            map.set(key, value);
        }
        map
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct OrderedMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
    type Value = OrderedMap<V>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a mapping")
    }

    // `vars:` with nothing after it
    fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(OrderedMap::new())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = OrderedMap::new();
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            map.set(key, value);
        }
        Ok(map)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(OrderedMapVisitor(PhantomData))
    }
}
