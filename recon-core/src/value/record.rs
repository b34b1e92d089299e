//! Ordered, keyed, copy-on-write item sequences.

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

use tracing::trace;

use super::{Field, Item, ShareFlags, Value, ABSENT};
use crate::error::ValueError;

static ABSENT_ITEM: Item = Item::Value(Value::Absent);

/// First position of each key. Textual keys (attribute names included)
/// live in `text` so lookups by `&str` need no allocation.
#[derive(Debug, Default)]
struct KeyIndex {
    text: HashMap<String, usize>,
    other: HashMap<Value, usize>,
}

impl KeyIndex {
    fn build(items: &[Item]) -> Self {
        let mut index = Self::default();
        for (position, item) in items.iter().enumerate() {
            index.insert(item, position);
        }
        index
    }

    /// Record `item` at `position` unless its key is already indexed.
    fn insert(&mut self, item: &Item, position: usize) {
        let Item::Field(field) = item else { return };
        match field {
            Field::Attr { key, .. } | Field::Slot { key: Value::Text(key), .. } => {
                if !self.text.contains_key(key) {
                    self.text.insert(key.clone(), position);
                }
            }
            Field::Slot { key, .. } => {
                self.other.entry(key.clone()).or_insert(position);
            }
        }
    }

    fn find(&self, key: &Value) -> Option<usize> {
        match key {
            Value::Text(text) => self.text.get(text.as_str()).copied(),
            key => self.other.get(key).copied(),
        }
    }
}

struct RecordStore {
    items: Vec<Item>,
    index: OnceLock<KeyIndex>,
}

impl RecordStore {
    fn new(items: Vec<Item>) -> Self {
        Self { items, index: OnceLock::new() }
    }

    fn index(&self) -> &KeyIndex {
        self.index.get_or_init(|| KeyIndex::build(&self.items))
    }

    fn invalidate(&mut self) {
        self.index.take();
    }
}

impl Clone for RecordStore {
    fn clone(&self) -> Self {
        Self::new(self.items.clone())
    }
}

/// An ordered sequence of [`Item`]s, usable both as an array and as a map.
///
/// Duplicate keys may coexist; keyed lookups return the first match in
/// insertion order. Clones share storage until one side mutates.
pub struct Record {
    store: Arc<RecordStore>,
    flags: ShareFlags,
}

impl Record {
    pub fn new() -> Self {
        Self::from_items(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_items(Vec::with_capacity(capacity))
    }

    pub fn of<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Item>,
    {
        Self::from_items(items.into_iter().map(Into::into).collect())
    }

    pub fn from_items(items: Vec<Item>) -> Self {
        Self { store: Arc::new(RecordStore::new(items)), flags: ShareFlags::default() }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.store.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.store.items.is_empty()
    }

    pub fn items(&self) -> &[Item] {
        &self.store.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Item> {
        self.store.items.iter()
    }

    /// Shares storage with this handle and marks both handles aliased.
    pub fn branch(&self) -> Record {
        self.flags.alias();
        Record { store: Arc::clone(&self.store), flags: ShareFlags::aliased() }
    }

    /// Freeze this handle; every later mutation fails.
    ///
    /// Nested records are reachable mutably only through their parent, so
    /// freezing the root freezes the whole tree.
    pub fn commit(&mut self) -> &mut Self {
        self.flags.freeze();
        self
    }

    pub fn is_aliased(&self) -> bool {
        self.flags.is_aliased()
    }

    pub fn is_mutable(&self) -> bool {
        !self.flags.is_immutable()
    }

    /// Name of the first attribute, if the record starts with one.
    pub fn tag(&self) -> Option<&str> {
        match self.store.items.first() {
            Some(Item::Field(Field::Attr { key, .. })) => Some(key),
            _ => None,
        }
    }

    // --- lookups ---

    /// Value of the first field keyed `key`, attribute or slot.
    pub fn get(&self, key: &str) -> &Value {
        self.get_field(key).map_or(&ABSENT, Field::value)
    }

    /// Value of the first field whose key equals `key`.
    pub fn get_key(&self, key: &Value) -> &Value {
        match self.store.index().find(key) {
            Some(position) => self.field_at(position).map_or(&ABSENT, Field::value),
            None => &ABSENT,
        }
    }

    pub fn get_attr(&self, key: &str) -> &Value {
        self.find_from(key, Field::is_attr).map_or(&ABSENT, Field::value)
    }

    pub fn get_slot(&self, key: &str) -> &Value {
        self.find_from(key, |field| !field.is_attr()).map_or(&ABSENT, Field::value)
    }

    pub fn get_field(&self, key: &str) -> Option<&Field> {
        let position = self.store.index().text.get(key).copied()?;
        self.field_at(position)
    }

    /// Item at `index`, or an absent item when out of range.
    pub fn get_item(&self, index: usize) -> &Item {
        self.store.items.get(index).unwrap_or(&ABSENT_ITEM)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.store.index().text.contains_key(key)
    }

    fn field_at(&self, position: usize) -> Option<&Field> {
        self.store.items.get(position).and_then(Item::as_field)
    }

    /// First field keyed `key` that satisfies `kind`, starting the scan at
    /// the first indexed position for that key.
    fn find_from(&self, key: &str, kind: impl Fn(&Field) -> bool) -> Option<&Field> {
        let start = self.store.index().text.get(key).copied()?;
        self.store.items[start..]
            .iter()
            .filter_map(Item::as_field)
            .find(|field| field.key_str() == Some(key) && kind(field))
    }

    fn position_where(&self, predicate: impl Fn(&Field) -> bool) -> Option<usize> {
        self.store
            .items
            .iter()
            .position(|item| item.as_field().is_some_and(&predicate))
    }

    // --- mutators ---

    fn store_mut(&mut self) -> Result<&mut RecordStore, ValueError> {
        if self.flags.begin_mutation()? && Arc::strong_count(&self.store) > 1 {
            trace!(len = self.store.items.len(), "record detached from shared storage");
        }
        Ok(Arc::make_mut(&mut self.store))
    }

    /// Replace the value of the first field keyed `key`, or append a slot.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), ValueError> {
        let value = value.into();
        match self.store.index().text.get(key).copied() {
            Some(position) => {
                let store = self.store_mut()?;
                if let Item::Field(field) = &mut store.items[position] {
                    *field.value_mut() = value;
                }
                Ok(())
            }
            None => self.push(Field::slot(key, value)),
        }
    }

    /// Replace the value of the first attribute named `key`, or append one.
    pub fn set_attr(&mut self, key: &str, value: impl Into<Value>) -> Result<(), ValueError> {
        let value = value.into();
        match self.position_where(|field| field.is_attr() && field.key_str() == Some(key)) {
            Some(position) => {
                let store = self.store_mut()?;
                if let Item::Field(field) = &mut store.items[position] {
                    *field.value_mut() = value;
                }
                Ok(())
            }
            None => self.push(Field::attr(key, value)),
        }
    }

    /// Replace the value of the first slot keyed `key`, or append one.
    pub fn set_slot(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Result<(), ValueError> {
        let key = key.into();
        let value = value.into();
        let found = self.position_where(|field| matches!(field, Field::Slot { key: k, .. } if *k == key));
        match found {
            Some(position) => {
                let store = self.store_mut()?;
                if let Item::Field(field) = &mut store.items[position] {
                    *field.value_mut() = value;
                }
                Ok(())
            }
            None => self.push(Field::Slot { key, value }),
        }
    }

    /// Replace the item at `index`, returning the previous one.
    pub fn set_item(&mut self, index: usize, item: impl Into<Item>) -> Result<Item, ValueError> {
        let len = self.len();
        if index >= len {
            return Err(ValueError::IndexOutOfRange { index, len });
        }
        let store = self.store_mut()?;
        store.invalidate();
        Ok(std::mem::replace(&mut store.items[index], item.into()))
    }

    pub fn push(&mut self, item: impl Into<Item>) -> Result<(), ValueError> {
        let item = item.into();
        let store = self.store_mut()?;
        let position = store.items.len();
        if let Some(index) = store.index.get_mut() {
            index.insert(&item, position);
        }
        store.items.push(item);
        Ok(())
    }

    /// Remove `delete` items at `index` and insert `items` in their place,
    /// returning the removed items.
    pub fn splice<I>(&mut self, index: usize, delete: usize, items: I) -> Result<Vec<Item>, ValueError>
    where
        I: IntoIterator<Item = Item>,
    {
        let len = self.len();
        if index > len {
            return Err(ValueError::IndexOutOfRange { index, len });
        }
        let end = index.saturating_add(delete).min(len);
        let store = self.store_mut()?;
        store.invalidate();
        Ok(store.items.splice(index..end, items).collect())
    }

    /// Remove the first field keyed `key`.
    pub fn delete(&mut self, key: &str) -> Result<Option<Item>, ValueError> {
        match self.store.index().text.get(key).copied() {
            Some(position) => self.remove(position).map(Some),
            None => Ok(None),
        }
    }

    pub fn remove(&mut self, index: usize) -> Result<Item, ValueError> {
        let len = self.len();
        if index >= len {
            return Err(ValueError::IndexOutOfRange { index, len });
        }
        let store = self.store_mut()?;
        store.invalidate();
        Ok(store.items.remove(index))
    }

    pub fn clear(&mut self) -> Result<(), ValueError> {
        let store = self.store_mut()?;
        store.invalidate();
        store.items.clear();
        Ok(())
    }

    /// Mutable access to the item at `index`. Drops the key index, since the
    /// caller may rekey the item.
    pub fn get_item_mut(&mut self, index: usize) -> Result<&mut Item, ValueError> {
        let len = self.len();
        if index >= len {
            return Err(ValueError::IndexOutOfRange { index, len });
        }
        let store = self.store_mut()?;
        store.invalidate();
        Ok(&mut store.items[index])
    }
}

impl Default for Record {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Record {
    fn clone(&self) -> Self {
        self.branch()
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.store, &other.store) || self.store.items == other.store.items
    }
}

impl Eq for Record {}

impl Hash for Record {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.store.items.hash(state);
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = &'a Item;
    type IntoIter = std::slice::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Into<Item>> FromIterator<T> for Record {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Record::of(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyed_lookup_first_match() {
        let record = Record::of([Item::slot("a", 1), Item::slot("a", 2), Item::attr_with("b", 3)]);
        assert_eq!(record.get("a"), &Value::from(1));
        assert_eq!(record.get("b"), &Value::from(3));
        assert_eq!(record.get("c"), &ABSENT);
        assert_eq!(record.get_item(9), &Item::Value(Value::Absent));
    }

    #[test]
    fn test_attr_and_slot_lookups_are_kinded() {
        let record = Record::of([Item::slot("k", "slot"), Item::attr_with("k", "attr")]);
        assert_eq!(record.get("k"), &Value::from("slot"));
        assert_eq!(record.get_attr("k"), &Value::from("attr"));
        assert_eq!(record.get_slot("k"), &Value::from("slot"));
    }

    #[test]
    fn test_non_text_keys() {
        let record = Record::of([Item::slot(1, "one"), Item::slot(true, "yes")]);
        assert_eq!(record.get_key(&Value::from(1)), &Value::from("one"));
        assert_eq!(record.get_key(&Value::from(true)), &Value::from("yes"));
        assert_eq!(record.get_key(&Value::from(2)), &ABSENT);
    }

    #[test]
    fn test_push_updates_index() {
        let mut record = Record::of([Item::slot("a", 1)]);
        assert_eq!(record.get("a"), &Value::from(1));
        record.push(Item::slot("b", 2)).unwrap();
        record.push(Item::slot("a", 3)).unwrap();
        assert_eq!(record.get("b"), &Value::from(2));
        assert_eq!(record.get("a"), &Value::from(1));
    }

    #[test]
    fn test_remove_invalidates_index() {
        let mut record = Record::of([Item::slot("a", 1), Item::slot("b", 2), Item::slot("a", 3)]);
        assert_eq!(record.get("b"), &Value::from(2));
        record.remove(0).unwrap();
        assert_eq!(record.get("a"), &Value::from(3));
        assert_eq!(record.delete("b").unwrap(), Some(Item::slot("b", 2)));
        assert_eq!(record.get("b"), &ABSENT);
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_set_replaces_or_appends() {
        let mut record = Record::new();
        record.set("a", 1).unwrap();
        record.set("a", 2).unwrap();
        record.set_attr("t", Value::Extant).unwrap();
        record.set_slot(5, "five").unwrap();
        assert_eq!(record.len(), 3);
        assert_eq!(record.get("a"), &Value::from(2));
        assert_eq!(record.get_attr("t"), &Value::Extant);
        assert_eq!(record.get_key(&Value::from(5)), &Value::from("five"));
    }

    #[test]
    fn test_splice() {
        let mut record = Record::of(["a", "b", "c"]);
        let removed = record.splice(1, 1, [Item::from("x"), Item::from("y")]).unwrap();
        assert_eq!(removed, vec![Item::from("b")]);
        assert_eq!(record, Record::of(["a", "x", "y", "c"]));
        assert_eq!(
            record.splice(9, 0, []),
            Err(ValueError::IndexOutOfRange { index: 9, len: 4 })
        );
    }

    #[test]
    fn test_out_of_range() {
        let mut record = Record::of(["a"]);
        assert_eq!(record.remove(1), Err(ValueError::IndexOutOfRange { index: 1, len: 1 }));
        assert_eq!(record.set_item(3, "z"), Err(ValueError::IndexOutOfRange { index: 3, len: 1 }));
        assert_eq!(record.set_item(0, "z"), Ok(Item::from("a")));
    }

    #[test]
    fn test_branch_aliasing() {
        let a = Record::of(["x", "y"]);
        let mut b = a.branch();
        assert!(a.is_aliased());
        assert!(b.is_aliased());
        b.push("z").unwrap();
        assert!(!b.is_aliased());
        assert!(a.is_aliased());
        assert_eq!(a, Record::of(["x", "y"]));
        assert_eq!(b, Record::of(["x", "y", "z"]));
    }

    #[test]
    fn test_commit_freezes() {
        let mut record = Record::of([Item::slot("a", 1)]);
        record.commit();
        assert!(!record.is_mutable());
        assert_eq!(record.push("x"), Err(ValueError::Immutable));
        assert_eq!(record.set("a", 2), Err(ValueError::Immutable));
        assert_eq!(record.clear(), Err(ValueError::Immutable));
        assert_eq!(record.get_item_mut(0).err(), Some(ValueError::Immutable));
        assert_eq!(record, Record::of([Item::slot("a", 1)]));
    }

    #[test]
    fn test_nested_records_are_frozen_with_root() {
        let inner = Record::of(["x"]);
        let mut outer = Record::of([Item::slot("inner", inner)]);
        outer.commit();
        assert!(outer.get_item_mut(0).is_err());
    }

    #[test]
    fn test_tag() {
        assert_eq!(Record::of([Item::attr("p"), Item::from("x")]).tag(), Some("p"));
        assert_eq!(Record::of(["x"]).tag(), None);
    }
}
