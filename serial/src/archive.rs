//! The archive engine.
//!
//! [`Archive`] walks an object graph field by field and drives an
//! [`ArchiveBackend`] for the physical I/O. The same `serialize` routine of a
//! type is used for reading and writing; the backend's mode decides the
//! direction.
//!
//! Every field goes through one protocol:
//!
//! 1. push a [`StackFrame`] for the field,
//! 2. decide whether it should be serialized at all (hints, defaults),
//! 3. enter the named scope (`param_begin`), run the type's routine, leave it,
//! 4. otherwise, when reading, reset the field to its default,
//! 5. pop the frame.

use std::any::TypeId;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use relic_core::Game;

use crate::backend::ArchiveBackend;
use crate::containers;
use crate::error::{ArchiveError, ArchiveResult};
use crate::hints::{ArchiveFlags, SerialHints};
use crate::param::{DefaultSlot, Param};
use crate::polymorphic::{AbstractObject, ObjectFactory};
use crate::serial::{Serial, SerialKind};
use crate::version::{ArchiveVersion, SerialVersion};

// ---------------------------------------------------------------------------
// StackFrame
// ---------------------------------------------------------------------------

/// One entry of the traversal stack: the field currently being serialized.
#[derive(Debug, Clone, Copy)]
pub struct StackFrame {
    pub type_id: TypeId,
    pub type_name: &'static str,
    pub type_size: usize,
    pub kind: SerialKind,
    pub hints: SerialHints,
    data: NonNull<()>,
}

impl StackFrame {
    /// Address of the field's value.
    pub fn data(&self) -> NonNull<()> {
        self.data
    }
}

// ---------------------------------------------------------------------------
// Archive
// ---------------------------------------------------------------------------

/// Format-agnostic serialization engine.
///
/// `Archive<B>` owns a concrete backend; it dereferences to the type-erased
/// `Archive` (`Archive<dyn ArchiveBackend>`) that all `serialize` routines
/// receive, so object code never depends on the format.
///
/// ```ignore
/// let mut arc = Archive::with_version(TextWriter::new("Character"), version);
/// arc.serialize_version()?;
/// character.serialize(&mut arc)?;
/// let text = arc.into_backend().into_string()?;
/// ```
pub struct Archive<B: ?Sized + ArchiveBackend = dyn ArchiveBackend> {
    archive_version: u16,
    file_version: u16,
    game: Game,
    flags: ArchiveFlags,
    stack: Vec<StackFrame>,
    backend: B,
}

impl<B: ArchiveBackend> Archive<B> {
    /// Wrap a backend with the current archive version, file version 0 and
    /// an unknown game. Readers pick the real values up from
    /// [`serialize_version`](Archive::serialize_version).
    pub fn new(backend: B) -> Self {
        Self::with_version(backend, SerialVersion::default())
    }

    /// Wrap a backend with an explicit version context, for streams that
    /// carry no version header of their own.
    pub fn with_version(backend: B, version: SerialVersion) -> Self {
        let flags = backend.flags();
        debug_assert!(
            flags.contains(ArchiveFlags::READER) != flags.contains(ArchiveFlags::WRITER),
            "backend must be exactly one of reader or writer"
        );
        Self {
            archive_version: version.archive_version,
            file_version: version.file_version,
            game: version.game,
            flags,
            stack: Vec::new(),
            backend,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Consume the archive and hand back the backend, e.g. to collect output.
    pub fn into_backend(self) -> B {
        debug_assert!(
            self.stack.is_empty(),
            "archive finished with {} open frames",
            self.stack.len()
        );
        self.backend
    }
}

impl<B: ArchiveBackend + 'static> Deref for Archive<B> {
    type Target = Archive;

    fn deref(&self) -> &Archive {
        self
    }
}

impl<B: ArchiveBackend + 'static> DerefMut for Archive<B> {
    fn deref_mut(&mut self) -> &mut Archive {
        self
    }
}

impl Archive {
    // --- Context ---

    pub fn flags(&self) -> ArchiveFlags {
        self.flags
    }

    pub fn is_reader(&self) -> bool {
        self.flags.contains(ArchiveFlags::READER)
    }

    pub fn is_writer(&self) -> bool {
        self.flags.contains(ArchiveFlags::WRITER)
    }

    pub fn is_text_format(&self) -> bool {
        self.flags.contains(ArchiveFlags::TEXT)
    }

    pub fn is_binary_format(&self) -> bool {
        self.flags.contains(ArchiveFlags::BINARY)
    }

    /// Whether hints and defaults may cause parameters to be skipped.
    pub fn can_skip_parameters(&self) -> bool {
        !self.flags.contains(ArchiveFlags::NO_SKIPPING)
    }

    pub fn set_no_skipping(&mut self, no_skipping: bool) {
        self.flags.set(ArchiveFlags::NO_SKIPPING, no_skipping);
    }

    pub fn archive_version(&self) -> u16 {
        self.archive_version
    }

    pub fn file_version(&self) -> u16 {
        self.file_version
    }

    pub fn game(&self) -> Game {
        self.game
    }

    pub fn version(&self) -> SerialVersion {
        SerialVersion::new(self.archive_version, self.file_version, self.game)
    }

    pub fn set_version(&mut self, version: SerialVersion) {
        self.archive_version = version.archive_version;
        self.file_version = version.file_version;
        self.game = version.game;
    }

    pub fn backend_mut(&mut self) -> &mut dyn ArchiveBackend {
        &mut self.backend
    }

    // --- Traversal stack ---

    /// Current nesting depth.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn stack(&self) -> &[StackFrame] {
        &self.stack
    }

    /// Hints of the innermost open field, empty at the top level.
    pub fn current_hints(&self) -> SerialHints {
        self.stack
            .last()
            .map_or(SerialHints::empty(), |frame| frame.hints)
    }

    /// Nearest enclosing value of type `T`, excluding the current field.
    ///
    /// The pointer stays valid while the ancestor's own `serialize` call is
    /// on the stack. Dereferencing it is `unsafe`; the ancestor is mutably
    /// borrowed further up, so only read fields the current call does not
    /// alias.
    pub fn find_ancestor<T: 'static>(&self) -> Option<NonNull<T>> {
        let (_current, ancestors) = self.stack.split_last()?;
        ancestors
            .iter()
            .rev()
            .find(|frame| frame.type_id == TypeId::of::<T>())
            .map(|frame| frame.data.cast::<T>())
    }

    fn push_frame<T: 'static>(&mut self, value: &T, kind: SerialKind, hints: SerialHints) {
        if let Some(top) = self.stack.last() {
            debug_assert!(
                !top.hints.contains(SerialHints::ATTRIBUTE),
                "attribute parameter of type {} cannot contain children",
                top.type_name
            );
        }
        self.stack.push(StackFrame {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            type_size: std::mem::size_of::<T>(),
            kind,
            hints,
            data: NonNull::from(value).cast::<()>(),
        });
    }

    fn pop_frame<T: 'static>(&mut self, value: &T) {
        let frame = self.stack.pop();
        debug_assert!(
            frame.is_some_and(|frame| frame.type_id == TypeId::of::<T>()
                && frame.data == NonNull::from(value).cast::<()>()),
            "traversal stack mismatch popping {}",
            std::any::type_name::<T>()
        );
    }

    // --- Fields ---

    /// Serialize a field with no hints.
    pub fn field<T: Serial>(&mut self, name: &str, value: &mut T) -> ArchiveResult<()> {
        self.param(Param::new(name, value))
    }

    pub fn field_hinted<T: Serial>(
        &mut self,
        name: &str,
        value: &mut T,
        hints: SerialHints,
    ) -> ArchiveResult<()> {
        self.param(Param::new(name, value).hints(hints))
    }

    /// Serialize one field described by a [`Param`].
    pub fn param<T: Serial>(&mut self, param: Param<'_, T>) -> ArchiveResult<()> {
        let Param {
            name,
            value,
            hints,
            default,
        } = param;
        self.scoped(name, value, T::KIND, hints, default.as_ref(), |value, arc| {
            T::serialize(value, arc)
        })
    }

    /// Serialize a nullable pointer to a polymorphic object.
    ///
    /// The object's discriminant is stored as a `Type` attribute before its
    /// body. When reading into an empty slot, `factory` constructs the
    /// object for the discriminant found in the stream.
    pub fn abstract_field<P: ?Sized + AbstractObject + 'static>(
        &mut self,
        name: &str,
        slot: &mut Option<Box<P>>,
        factory: &ObjectFactory<P>,
        hints: SerialHints,
    ) -> ArchiveResult<()> {
        self.scoped(name, slot, SerialKind::Member, hints, None, |slot, arc| {
            arc.abstract_pointee(slot, factory)
        })
    }

    /// Serialize a sequence of polymorphic objects, one `Item` per object.
    pub fn abstract_container<P: ?Sized + AbstractObject + 'static>(
        &mut self,
        name: &str,
        items: &mut Vec<Box<P>>,
        factory: &ObjectFactory<P>,
        hints: SerialHints,
    ) -> ArchiveResult<()> {
        self.scoped(name, items, SerialKind::Global, hints, None, |items, arc| {
            containers::serialize_abstract_items(arc, items, factory)
        })
    }

    fn scoped<T: 'static>(
        &mut self,
        name: &str,
        value: &mut T,
        kind: SerialKind,
        hints: SerialHints,
        default: Option<&DefaultSlot<T>>,
        body: impl FnOnce(&mut T, &mut Archive) -> ArchiveResult<()>,
    ) -> ArchiveResult<()> {
        debug_assert!(
            !name.is_empty() || hints.contains(SerialHints::IGNORE_NAME),
            "unnamed parameter without IGNORE_NAME"
        );
        self.push_frame(&*value, kind, hints);
        let result = self.scoped_body(name, value, hints, default, body);
        self.pop_frame(&*value);
        result
    }

    fn scoped_body<T>(
        &mut self,
        name: &str,
        value: &mut T,
        hints: SerialHints,
        default: Option<&DefaultSlot<T>>,
        body: impl FnOnce(&mut T, &mut Archive) -> ArchiveResult<()>,
    ) -> ArchiveResult<()> {
        if self.should_serialize(value, hints, default) && self.backend.param_begin(name, hints)? {
            body(value, &mut *self)?;
            self.backend.param_end()?;
        } else if self.is_reader() {
            if let Some(default) = default {
                default.reset(value);
            }
        }
        Ok(())
    }

    fn should_serialize<T>(
        &self,
        value: &T,
        hints: SerialHints,
        default: Option<&DefaultSlot<T>>,
    ) -> bool {
        if !self.can_skip_parameters() {
            return true;
        }
        if self.is_writer() {
            if hints.contains(SerialHints::NEVER_SAVE) {
                return false;
            }
            if hints.contains(SerialHints::OPTIONAL)
                && !hints.contains(SerialHints::ALWAYS_SAVE)
                && default.is_some_and(|default| default.matches(value))
            {
                return false;
            }
        }
        true
    }

    fn abstract_pointee<P: ?Sized + AbstractObject + 'static>(
        &mut self,
        slot: &mut Option<Box<P>>,
        factory: &ObjectFactory<P>,
    ) -> ArchiveResult<()> {
        let hints = self.current_hints();
        if !self.backend.pre_serialize_pointer(slot.is_some(), hints)? {
            if self.is_reader() {
                *slot = None;
            }
            return Ok(());
        }

        if self.is_reader() {
            let existing = slot.as_ref().map(|object| object.kind());
            let mut kind = existing.unwrap_or_default();
            self.field_hinted("Type", &mut kind, SerialHints::ATTRIBUTE)?;
            match existing {
                Some(expected) if kind != expected => {
                    return Err(ArchiveError::KindMismatch {
                        type_name: std::any::type_name::<P>(),
                        expected: format!("{expected:?}"),
                        found: format!("{kind:?}"),
                    });
                }
                Some(_) => {}
                None => *slot = Some(factory.construct(kind, self)?),
            }
        }

        match slot {
            Some(object) => self.abstract_object(&mut **object),
            None => Ok(()),
        }
    }

    /// Discriminant (when writing) followed by the object's own body.
    pub(crate) fn abstract_object<P: ?Sized + AbstractObject>(
        &mut self,
        object: &mut P,
    ) -> ArchiveResult<()> {
        if self.is_writer() {
            let mut kind = object.kind();
            self.field_hinted("Type", &mut kind, SerialHints::ATTRIBUTE)?;
        }
        AbstractObject::serialize(object, self)
    }

    /// Scope for a polymorphic object that is known to be present.
    pub(crate) fn abstract_item<P: ?Sized + AbstractObject + 'static>(
        &mut self,
        name: &str,
        item: &mut Box<P>,
        hints: SerialHints,
    ) -> ArchiveResult<()> {
        self.scoped(name, item, SerialKind::Member, hints, None, |item, arc| {
            let hints = arc.current_hints();
            if arc.backend.pre_serialize_pointer(true, hints)? {
                arc.abstract_object(&mut **item)?;
            }
            Ok(())
        })
    }

    // --- Scopes and framing ---

    /// Enter a named scope directly, bypassing the field protocol.
    pub fn param_begin(&mut self, name: &str, hints: SerialHints) -> ArchiveResult<bool> {
        self.backend.param_begin(name, hints)
    }

    pub fn param_end(&mut self) -> ArchiveResult<()> {
        self.backend.param_end()
    }

    pub fn pre_serialize_pointer(&mut self, present: bool, hints: SerialHints) -> ArchiveResult<bool> {
        self.backend.pre_serialize_pointer(present, hints)
    }

    /// Element count of a container. Stored as a `Size` attribute unless the
    /// backend frames lengths natively. Binary archives older than
    /// [`ArchiveVersion::BinarySize32`] store the count as a `u16`.
    pub fn serialize_array_size(&mut self, size: &mut u32) -> ArchiveResult<()> {
        if self.is_binary_format() && self.archive_version < ArchiveVersion::BinarySize32.as_u16() {
            let mut short = u16::try_from(*size).map_err(|_| ArchiveError::ArraySize {
                count: (*size).into(),
                limit: u16::MAX.into(),
            })?;
            self.backend.serialize_u16(&mut short, SerialHints::empty())?;
            *size = short.into();
            return Ok(());
        }
        if !self.backend.serialize_array_size(size)? {
            self.field_hinted("Size", size, SerialHints::ATTRIBUTE)?;
        }
        Ok(())
    }

    /// Read or write the version header: `ArchiveVer`, `FileVer` and `Game`.
    ///
    /// Must be the first thing serialized in a top-level document. Older
    /// documents without `FileVer`/`Game` read as 0 and [`Game::Unknown`].
    pub fn serialize_version(&mut self) -> ArchiveResult<()> {
        let mut archive_version = self.archive_version;
        let mut file_version = self.file_version;
        let mut game = self.game;

        self.field_hinted("ArchiveVer", &mut archive_version, SerialHints::ATTRIBUTE)?;
        self.param(
            Param::new("FileVer", &mut file_version)
                .attribute()
                .optional(0),
        )?;
        self.param(
            Param::new("Game", &mut game)
                .attribute()
                .optional(Game::Unknown),
        )?;

        if self.is_reader() {
            let supported = ArchiveVersion::CURRENT.as_u16();
            if archive_version > supported {
                return Err(ArchiveError::UnsupportedVersion {
                    found: archive_version,
                    supported,
                });
            }
            self.set_version(SerialVersion::new(archive_version, file_version, game));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BinaryReader, BinaryWriter, TextReader, TextWriter};

    #[derive(Default, Debug, PartialEq)]
    struct Pair {
        left: u32,
        right: u32,
    }

    impl Serial for Pair {
        fn serialize(&mut self, arc: &mut Archive) -> ArchiveResult<()> {
            arc.field("Left", &mut self.left)?;
            arc.field("Right", &mut self.right)
        }
    }

    #[test]
    fn version_header_round_trip() {
        let version = SerialVersion::current(3, Game::Corruption);
        let mut writer = Archive::with_version(TextWriter::new("Doc"), version);
        writer.serialize_version().unwrap();
        let text = writer.into_backend().into_string().unwrap();

        let mut reader = Archive::new(TextReader::from_text(&text).unwrap());
        reader.serialize_version().unwrap();
        assert_eq!(reader.version(), version);
    }

    #[test]
    fn version_header_defaults_when_absent() {
        let mut writer = Archive::new(TextWriter::new("Doc"));
        writer.serialize_version().unwrap();
        let root = writer.into_backend().finish().unwrap();
        assert!(root.attribute("ArchiveVer").is_some());
        assert!(root.attribute("FileVer").is_none());
        assert!(root.attribute("Game").is_none());

        let mut reader = Archive::new(TextReader::new(root));
        reader.set_version(SerialVersion::new(0, 9, Game::Prime));
        reader.serialize_version().unwrap();
        assert_eq!(reader.file_version(), 0);
        assert_eq!(reader.game(), Game::Unknown);
    }

    #[test]
    fn newer_archive_version_is_rejected() {
        let mut root = crate::TextNode::new("Doc");
        root.set_attribute("ArchiveVer", "99");
        let mut reader = Archive::new(TextReader::new(root));
        assert!(matches!(
            reader.serialize_version(),
            Err(ArchiveError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn stack_is_balanced_after_fields() {
        let mut arc = Archive::new(BinaryWriter::new());
        let mut pair = Pair { left: 1, right: 2 };
        arc.field("Pair", &mut pair).unwrap();
        assert_eq!(arc.depth(), 0);
        assert_eq!(arc.into_backend().into_bytes(), [0, 0, 0, 1, 0, 0, 0, 2]);
    }

    #[test]
    fn current_hints_follow_the_open_field() {
        struct Recorder {
            seen: SerialHints,
        }
        impl Serial for Recorder {
            fn serialize(&mut self, arc: &mut Archive) -> ArchiveResult<()> {
                self.seen = arc.current_hints();
                Ok(())
            }
        }

        let mut arc = Archive::new(TextWriter::new("Doc"));
        let mut recorder = Recorder {
            seen: SerialHints::empty(),
        };
        arc.field_hinted("Recorder", &mut recorder, SerialHints::HEX_DISPLAY)
            .unwrap();
        assert_eq!(recorder.seen, SerialHints::HEX_DISPLAY);
        assert_eq!(arc.current_hints(), SerialHints::empty());
    }

    #[test]
    fn never_save_is_skipped_and_reset_on_read() {
        let mut arc = Archive::new(TextWriter::new("Doc"));
        let mut transient = 5u32;
        arc.param(
            Param::new("Scratch", &mut transient)
                .hints(SerialHints::NEVER_SAVE)
                .default_value(0),
        )
        .unwrap();
        let root = arc.into_backend().finish().unwrap();
        assert!(root.children.is_empty());

        let mut arc = Archive::new(TextReader::new(root));
        arc.param(
            Param::new("Scratch", &mut transient)
                .hints(SerialHints::NEVER_SAVE)
                .default_value(0),
        )
        .unwrap();
        assert_eq!(transient, 0);
    }

    #[test]
    fn no_skipping_writes_optional_defaults() {
        let mut arc = Archive::new(BinaryWriter::new());
        assert!(!arc.can_skip_parameters());
        let mut level = 1u16;
        arc.param(Param::new("Level", &mut level).optional(1))
            .unwrap();
        assert_eq!(arc.into_backend().into_bytes(), [0, 1]);
    }

    #[test]
    fn legacy_binary_sizes_are_16_bit() {
        let legacy = SerialVersion::new(ArchiveVersion::Initial.as_u16(), 0, Game::Prime);
        let mut arc = Archive::with_version(BinaryWriter::new(), legacy);
        let mut values = vec![7u8, 8];
        arc.field("Values", &mut values).unwrap();
        let bytes = arc.into_backend().into_bytes();
        assert_eq!(bytes, [0, 2, 7, 8]);

        let mut arc = Archive::with_version(BinaryReader::new(bytes), legacy);
        let mut back = Vec::<u8>::new();
        arc.field("Values", &mut back).unwrap();
        assert_eq!(back, values);

        let mut arc = Archive::with_version(BinaryWriter::new(), legacy);
        let mut size = 70_000u32;
        assert!(matches!(
            arc.serialize_array_size(&mut size),
            Err(ArchiveError::ArraySize { count: 70_000, .. })
        ));
    }

    #[test]
    fn legacy_sizes_only_apply_to_binary() {
        let legacy = SerialVersion::new(ArchiveVersion::Initial.as_u16(), 0, Game::Prime);
        let mut arc = Archive::with_version(TextWriter::new("Doc"), legacy);
        let mut values = vec![1u32, 2, 3];
        arc.field("Values", &mut values).unwrap();
        let root = arc.into_backend().finish().unwrap();

        let mut arc = Archive::with_version(TextReader::new(root), legacy);
        let mut back = Vec::<u32>::new();
        arc.field("Values", &mut back).unwrap();
        assert_eq!(back, values);
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "cannot contain children")]
    fn attribute_cannot_have_children() {
        let mut arc = Archive::new(TextWriter::new("Doc"));
        let mut pair = Pair::default();
        arc.field_hinted("Pair", &mut pair, SerialHints::ATTRIBUTE)
            .unwrap();
    }

    #[test]
    fn find_ancestor_skips_current_frame() {
        #[derive(Default)]
        struct Leaf {
            ancestor: Option<NonNull<Leaf>>,
            outer: Option<NonNull<Outer>>,
        }
        impl Serial for Leaf {
            fn serialize(&mut self, arc: &mut Archive) -> ArchiveResult<()> {
                self.ancestor = arc.find_ancestor::<Leaf>();
                self.outer = arc.find_ancestor::<Outer>();
                Ok(())
            }
        }
        #[derive(Default)]
        struct Outer {
            leaf: Leaf,
        }
        impl Serial for Outer {
            fn serialize(&mut self, arc: &mut Archive) -> ArchiveResult<()> {
                arc.field("Leaf", &mut self.leaf)
            }
        }

        let mut arc = Archive::new(TextWriter::new("Doc"));
        let mut outer = Outer::default();
        arc.field("Outer", &mut outer).unwrap();

        assert!(outer.leaf.ancestor.is_none());
        assert_eq!(
            outer.leaf.outer.map(|p| p.as_ptr() as usize),
            Some(&outer as *const Outer as usize)
        );
    }
}
