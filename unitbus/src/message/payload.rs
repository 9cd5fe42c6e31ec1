/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One out-of-band payload value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum PayloadEntry {
    /// Structured JSON data.
    Json(serde_json::Value),
    /// An opaque binary blob.
    Binary(Vec<u8>),
}

impl From<serde_json::Value> for PayloadEntry {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

impl From<Vec<u8>> for PayloadEntry {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}

/// Keyed bag of data kept apart from a message's typed fields.
///
/// Keys are ordered so the wire form is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessagePayload(BTreeMap<String, PayloadEntry>);

impl MessagePayload {
    /// Creates an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an entry.
    pub fn insert(&mut self, key: impl Into<String>, entry: impl Into<PayloadEntry>) {
        self.0.insert(key.into(), entry.into());
    }

    /// Looks up an entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&PayloadEntry> {
        self.0.get(key)
    }

    /// Looks up a binary entry.
    #[must_use]
    pub fn binary(&self, key: &str) -> Option<&[u8]> {
        match self.0.get(key) {
            Some(PayloadEntry::Binary(bytes)) => Some(bytes),
            _ => None,
        }
    }

    /// Removes an entry, returning it.
    pub fn remove(&mut self, key: &str) -> Option<PayloadEntry> {
        self.0.remove(key)
    }

    /// Moves every entry of `other` into this payload, replacing duplicates.
    pub fn merge(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when no entries are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &PayloadEntry)> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_and_json_entries_keep_their_kind() -> anyhow::Result<()> {
        let mut payload = MessagePayload::new();
        payload.insert("blob", vec![0_u8, 1, 254]);
        payload.insert("meta", serde_json::json!({ "pages": 3 }));

        let json = serde_json::to_value(&payload)?;
        let back: MessagePayload = serde_json::from_value(json)?;

        assert_eq!(back.binary("blob"), Some(&[0_u8, 1, 254][..]));
        assert_eq!(
            back.get("meta"),
            Some(&PayloadEntry::Json(serde_json::json!({ "pages": 3 })))
        );
        assert!(back.binary("meta").is_none());
        Ok(())
    }

    #[test]
    fn merge_replaces_duplicate_keys() {
        let mut left = MessagePayload::new();
        left.insert("a", serde_json::json!(1));
        let mut right = MessagePayload::new();
        right.insert("a", serde_json::json!(2));
        right.insert("b", serde_json::json!(3));

        left.merge(right);
        assert_eq!(left.len(), 2);
        assert_eq!(left.get("a"), Some(&PayloadEntry::Json(serde_json::json!(2))));
    }
}
