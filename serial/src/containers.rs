//! Container serialization.
//!
//! Every container writes its element count through
//! [`Archive::serialize_array_size`] and then one `Item` field per element
//! with `IGNORE_NAME`, so renaming an element type never breaks old files.
//! Maps wrap each entry in an `Item` scope holding `Key` and `Value`.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, LinkedList, VecDeque};
use std::hash::Hash;

use crate::archive::Archive;
use crate::error::ArchiveResult;
use crate::hints::SerialHints;
use crate::polymorphic::{AbstractObject, ObjectFactory};
use crate::serial::{Serial, SerialKind};

const ITEM: &str = "Item";

/// Serialize a vector, naming each element `element` instead of `Item`.
///
/// Readers ignore element names, so this only changes writer output.
pub fn serialize_named_sequence<T: Serial + Default>(
    arc: &mut Archive,
    items: &mut Vec<T>,
    element: &str,
) -> ArchiveResult<()> {
    let mut size = items.len() as u32;
    arc.serialize_array_size(&mut size)?;
    if arc.is_reader() {
        items.clear();
        return read_items(arc, size, element, |item| items.push(item));
    }
    for item in items.iter_mut() {
        arc.field_hinted(element, item, SerialHints::IGNORE_NAME)?;
    }
    Ok(())
}

/// Read `size` elements one at a time. A corrupt count fails at the first
/// missing element instead of allocating every default up front.
fn read_items<T: Serial + Default>(
    arc: &mut Archive,
    size: u32,
    element: &str,
    mut push: impl FnMut(T),
) -> ArchiveResult<()> {
    for _ in 0..size {
        let mut item = T::default();
        arc.field_hinted(element, &mut item, SerialHints::IGNORE_NAME)?;
        push(item);
    }
    Ok(())
}

impl<T: Serial + Default> Serial for Vec<T> {
    const KIND: SerialKind = SerialKind::Global;

    fn serialize(&mut self, arc: &mut Archive) -> ArchiveResult<()> {
        serialize_named_sequence(arc, self, ITEM)
    }
}

impl<T: Serial + Default> Serial for VecDeque<T> {
    const KIND: SerialKind = SerialKind::Global;

    fn serialize(&mut self, arc: &mut Archive) -> ArchiveResult<()> {
        let mut size = self.len() as u32;
        arc.serialize_array_size(&mut size)?;
        if arc.is_reader() {
            self.clear();
            return read_items(arc, size, ITEM, |item| self.push_back(item));
        }
        for item in self.iter_mut() {
            arc.field_hinted(ITEM, item, SerialHints::IGNORE_NAME)?;
        }
        Ok(())
    }
}

impl<T: Serial + Default> Serial for LinkedList<T> {
    const KIND: SerialKind = SerialKind::Global;

    fn serialize(&mut self, arc: &mut Archive) -> ArchiveResult<()> {
        let mut size = self.len() as u32;
        arc.serialize_array_size(&mut size)?;
        if arc.is_reader() {
            self.clear();
            return read_items(arc, size, ITEM, |item| self.push_back(item));
        }
        for item in self.iter_mut() {
            arc.field_hinted(ITEM, item, SerialHints::IGNORE_NAME)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sets
// ---------------------------------------------------------------------------

/// Elements are written from copies since set members cannot be borrowed
/// mutably. Reading a duplicate element is a schema error.
fn serialize_set<T, I>(
    arc: &mut Archive,
    len: usize,
    items: I,
    mut insert: impl FnMut(T) -> bool,
) -> ArchiveResult<()>
where
    T: Serial + Default,
    I: Iterator<Item = T>,
{
    let mut size = len as u32;
    arc.serialize_array_size(&mut size)?;
    if arc.is_reader() {
        for _ in 0..size {
            let mut item = T::default();
            arc.field_hinted(ITEM, &mut item, SerialHints::IGNORE_NAME)?;
            let inserted = insert(item);
            debug_assert!(inserted, "duplicate element in serialized set");
        }
    } else {
        for mut item in items {
            arc.field_hinted(ITEM, &mut item, SerialHints::IGNORE_NAME)?;
        }
    }
    Ok(())
}

impl<T: Serial + Default + Clone + Ord> Serial for BTreeSet<T> {
    const KIND: SerialKind = SerialKind::Global;

    fn serialize(&mut self, arc: &mut Archive) -> ArchiveResult<()> {
        let snapshot: Vec<T> = if arc.is_reader() {
            self.clear();
            Vec::new()
        } else {
            self.iter().cloned().collect()
        };
        serialize_set(arc, snapshot.len(), snapshot.into_iter(), |item| {
            self.insert(item)
        })
    }
}

impl<T: Serial + Default + Clone + Eq + Hash> Serial for HashSet<T> {
    const KIND: SerialKind = SerialKind::Global;

    fn serialize(&mut self, arc: &mut Archive) -> ArchiveResult<()> {
        let snapshot: Vec<T> = if arc.is_reader() {
            self.clear();
            Vec::new()
        } else {
            self.iter().cloned().collect()
        };
        serialize_set(arc, snapshot.len(), snapshot.into_iter(), |item| {
            self.insert(item)
        })
    }
}

// ---------------------------------------------------------------------------
// Maps
// ---------------------------------------------------------------------------

fn serialize_entry<K: Serial, V: Serial>(
    arc: &mut Archive,
    key: &mut K,
    value: &mut V,
) -> ArchiveResult<()> {
    if arc.param_begin(ITEM, SerialHints::IGNORE_NAME)? {
        arc.field_hinted("Key", key, SerialHints::IGNORE_NAME)?;
        arc.field_hinted("Value", value, SerialHints::IGNORE_NAME)?;
        arc.param_end()?;
    }
    Ok(())
}

/// Shared map protocol. `insert` returns whether the key was new.
fn serialize_map<'m, K, V>(
    arc: &mut Archive,
    entries: impl Iterator<Item = (&'m K, &'m mut V)>,
    len: usize,
    mut insert: impl FnMut(K, V) -> bool,
) -> ArchiveResult<()>
where
    K: Serial + Default + Clone,
    V: Serial + Default,
{
    let mut size = len as u32;
    arc.serialize_array_size(&mut size)?;
    if arc.is_reader() {
        for _ in 0..size {
            let mut key = K::default();
            let mut value = V::default();
            serialize_entry(arc, &mut key, &mut value)?;
            let inserted = insert(key, value);
            debug_assert!(inserted, "duplicate key in serialized map");
        }
    } else {
        for (key, value) in entries {
            let mut key = key.clone();
            serialize_entry(arc, &mut key, value)?;
        }
    }
    Ok(())
}

impl<K, V> Serial for BTreeMap<K, V>
where
    K: Serial + Default + Clone + Ord,
    V: Serial + Default,
{
    const KIND: SerialKind = SerialKind::Global;

    fn serialize(&mut self, arc: &mut Archive) -> ArchiveResult<()> {
        if arc.is_reader() {
            self.clear();
            serialize_map(arc, std::iter::empty::<(&K, &mut V)>(), 0, |key, value| {
                self.insert(key, value).is_none()
            })
        } else {
            let len = self.len();
            serialize_map(arc, self.iter_mut(), len, |_, _| true)
        }
    }
}

impl<K, V> Serial for HashMap<K, V>
where
    K: Serial + Default + Clone + Eq + Hash,
    V: Serial + Default,
{
    const KIND: SerialKind = SerialKind::Global;

    fn serialize(&mut self, arc: &mut Archive) -> ArchiveResult<()> {
        if arc.is_reader() {
            self.clear();
            serialize_map(arc, std::iter::empty::<(&K, &mut V)>(), 0, |key, value| {
                self.insert(key, value).is_none()
            })
        } else {
            let len = self.len();
            serialize_map(arc, self.iter_mut(), len, |_, _| true)
        }
    }
}

// ---------------------------------------------------------------------------
// Polymorphic sequences
// ---------------------------------------------------------------------------

/// Body of [`Archive::abstract_container`].
pub(crate) fn serialize_abstract_items<P: ?Sized + AbstractObject + 'static>(
    arc: &mut Archive,
    items: &mut Vec<Box<P>>,
    factory: &ObjectFactory<P>,
) -> ArchiveResult<()> {
    let mut size = items.len() as u32;
    arc.serialize_array_size(&mut size)?;
    if arc.is_reader() {
        items.clear();
        for _ in 0..size {
            let mut slot = None;
            arc.abstract_field(ITEM, &mut slot, factory, SerialHints::IGNORE_NAME)?;
            match slot {
                Some(object) => items.push(object),
                None => log::warn!("skipping null entry in polymorphic container"),
            }
        }
    } else {
        for item in items.iter_mut() {
            arc.abstract_item(ITEM, item, SerialHints::IGNORE_NAME)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BinaryReader, BinaryWriter, TextReader, TextWriter};

    fn text_round_trip<T: Serial + Default>(value: &mut T) -> (crate::TextNode, T) {
        let mut arc = Archive::new(TextWriter::new("Doc"));
        arc.field("Value", value).unwrap();
        let root = arc.into_backend().finish().unwrap();

        let mut arc = Archive::new(TextReader::new(root.clone()));
        let mut back = T::default();
        arc.field("Value", &mut back).unwrap();
        (root, back)
    }

    fn binary_round_trip<T: Serial + Default>(value: &mut T) -> (Vec<u8>, T) {
        let mut arc = Archive::new(BinaryWriter::new());
        arc.field("Value", value).unwrap();
        let bytes = arc.into_backend().into_bytes();

        let mut arc = Archive::new(BinaryReader::new(bytes.clone()));
        let mut back = T::default();
        arc.field("Value", &mut back).unwrap();
        (bytes, back)
    }

    #[test]
    fn vec_items_are_named_item() {
        let mut values = vec![3u32, 1, 2];
        let (root, back) = text_round_trip(&mut values);
        let names: Vec<_> = root.children[0]
            .children
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, ["Item", "Item", "Item"]);
        assert_eq!(back, values);
    }

    #[test]
    fn vec_binary_has_native_size() {
        let mut values = vec![7u8, 8];
        let (bytes, back) = binary_round_trip(&mut values);
        assert_eq!(bytes, [0, 0, 0, 2, 7, 8]);
        assert_eq!(back, values);
    }

    #[test]
    fn reading_replaces_existing_elements() {
        let mut arc = Archive::new(BinaryWriter::new());
        let mut values = vec![1u16];
        arc.field("Value", &mut values).unwrap();
        let bytes = arc.into_backend().into_bytes();

        let mut arc = Archive::new(BinaryReader::new(bytes));
        let mut target = vec![9u16, 9, 9];
        arc.field("Value", &mut target).unwrap();
        assert_eq!(target, [1]);
    }

    #[test]
    fn deque_and_list() {
        let mut deque: VecDeque<i32> = [-1, 0, 1].into_iter().collect();
        assert_eq!(text_round_trip(&mut deque).1, deque);

        let mut list: LinkedList<String> = ["a".to_owned(), "b".to_owned()].into_iter().collect();
        assert_eq!(binary_round_trip(&mut list).1, list);
    }

    #[test]
    fn sets() {
        let mut ordered: BTreeSet<u32> = [5, 1, 3].into_iter().collect();
        assert_eq!(text_round_trip(&mut ordered).1, ordered);

        let mut hashed: HashSet<String> = ["x".to_owned(), "y".to_owned()].into_iter().collect();
        assert_eq!(binary_round_trip(&mut hashed).1, hashed);
    }

    #[test]
    fn map_entries_have_key_and_value() {
        let mut map = BTreeMap::new();
        map.insert("speed".to_owned(), 4.5f32);
        map.insert("armor".to_owned(), 2.0f32);
        let (root, back) = text_round_trip(&mut map);
        assert_eq!(back, map);

        let first = &root.children[0].children[0];
        assert_eq!(first.name, "Item");
        assert_eq!(first.children[0].name, "Key");
        assert_eq!(first.children[0].text.as_deref(), Some("armor"));
        assert_eq!(first.children[1].name, "Value");
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "duplicate key in serialized map")]
    fn duplicate_map_key_is_rejected() {
        let mut map = BTreeMap::new();
        map.insert(1u32, 10u32);
        let (mut root, _) = text_round_trip(&mut map);
        let item = root.children[0].children[0].clone();
        root.children[0].children.push(item);

        let mut arc = Archive::new(TextReader::new(root));
        let mut back = BTreeMap::<u32, u32>::new();
        let _ = arc.field("Value", &mut back);
    }

    #[test]
    fn hash_map_binary() {
        let mut map = HashMap::new();
        map.insert(1u32, vec![true, false]);
        map.insert(2u32, vec![]);
        assert_eq!(binary_round_trip(&mut map).1, map);
    }

    #[test]
    fn named_sequence_changes_writer_names_only() {
        #[derive(Default, Debug, PartialEq)]
        struct Names(Vec<String>);
        impl Serial for Names {
            const KIND: SerialKind = SerialKind::Global;
            fn serialize(&mut self, arc: &mut Archive) -> ArchiveResult<()> {
                serialize_named_sequence(arc, &mut self.0, "Name")
            }
        }

        let mut names = Names(vec!["hero".to_owned(), "villain".to_owned()]);
        let (root, back) = text_round_trip(&mut names);
        assert_eq!(root.children[0].children[1].name, "Name");
        assert_eq!(back, names);
    }
}
