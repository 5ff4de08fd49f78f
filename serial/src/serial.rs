//! The [`Serial`] trait and its implementations for built-in types.
//!
//! A type's `Serial` impl is its serialization strategy. Types without an
//! impl cannot be handed to the engine at all.

use relic_core::{AssetId, FourCC, Game, ResourceType};

use crate::archive::Archive;
use crate::error::{ArchiveError, ArchiveResult};
use crate::hints::SerialHints;
use crate::param::SerialDefault;
use crate::version::ArchiveVersion;

/// How a type is serialized once its field scope is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SerialKind {
    /// Maps directly onto one backend primitive.
    Primitive,
    /// The type serializes its own fields.
    Member,
    /// A free routine serializes the type (enums, containers).
    Global,
}

/// A value the [`Archive`] engine can read and write.
///
/// ```ignore
/// impl Serial for Character {
///     fn serialize(&mut self, arc: &mut Archive) -> ArchiveResult<()> {
///         arc.field("Name", &mut self.name)?;
///         arc.param(Param::new("Level", &mut self.level).optional(1))
///     }
/// }
/// ```
pub trait Serial: 'static {
    const KIND: SerialKind = SerialKind::Member;

    /// Old archives tagged pointers to this type with a redundant `Type`
    /// attribute that readers must consume.
    const POLYMORPHIC: bool = false;

    /// Read or write `self` against the open scope.
    fn serialize(&mut self, arc: &mut Archive) -> ArchiveResult<()>;
}

// ---------------------------------------------------------------------------
// Primitives
// ---------------------------------------------------------------------------

macro_rules! primitive_serial {
    ($($ty:ty => $method:ident),* $(,)?) => {
        $(
            impl Serial for $ty {
                const KIND: SerialKind = SerialKind::Primitive;

                fn serialize(&mut self, arc: &mut Archive) -> ArchiveResult<()> {
                    let hints = arc.current_hints();
                    arc.backend_mut().$method(self, hints)
                }
            }

            impl SerialDefault for $ty {}
        )*
    };
}

primitive_serial! {
    bool => serialize_bool,
    i8 => serialize_i8,
    u8 => serialize_u8,
    i16 => serialize_i16,
    u16 => serialize_u16,
    i32 => serialize_i32,
    u32 => serialize_u32,
    i64 => serialize_i64,
    u64 => serialize_u64,
    f32 => serialize_f32,
    f64 => serialize_f64,
    String => serialize_string,
    FourCC => serialize_fourcc,
}

impl Serial for AssetId {
    const KIND: SerialKind = SerialKind::Primitive;

    fn serialize(&mut self, arc: &mut Archive) -> ArchiveResult<()> {
        let hints = arc.current_hints();
        let length = arc.game().id_length();
        arc.backend_mut().serialize_asset_id(self, length, hints)
    }
}

impl SerialDefault for AssetId {}

/// Games are stored as their four-character id in every format.
impl Serial for Game {
    const KIND: SerialKind = SerialKind::Global;

    fn serialize(&mut self, arc: &mut Archive) -> ArchiveResult<()> {
        let hints = arc.current_hints();
        let mut id = self.id();
        arc.backend_mut().serialize_fourcc(&mut id, hints)?;
        if arc.is_reader() {
            *self = Game::from_id(id);
        }
        Ok(())
    }
}

impl SerialDefault for Game {}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Field-less enums with a stable name and numeric code per variant.
///
/// Text formats store the name, binary formats the code. Implement it with
/// [`serial_enum!`](crate::serial_enum) or by hand plus
/// [`impl_serial_enum!`](crate::impl_serial_enum).
pub trait SerialEnum: Copy + 'static {
    fn to_raw(self) -> u32;
    fn from_raw(raw: u32) -> Option<Self>;
    fn to_name(self) -> &'static str;
    fn from_name(name: &str) -> Option<Self>;
}

/// Serialize an enum value as a name (text) or `u32` (binary).
pub fn serialize_enum<E: SerialEnum>(value: &mut E, arc: &mut Archive) -> ArchiveResult<()> {
    let hints = arc.current_hints();
    if arc.is_text_format() {
        let mut name = value.to_name().to_owned();
        arc.backend_mut().serialize_string(&mut name, hints)?;
        if arc.is_reader() {
            *value = E::from_name(&name).ok_or_else(|| ArchiveError::UnknownDiscriminant {
                type_name: std::any::type_name::<E>(),
                value: name.clone(),
            })?;
        }
    } else {
        let mut raw = value.to_raw();
        arc.backend_mut().serialize_u32(&mut raw, hints)?;
        if arc.is_reader() {
            *value = E::from_raw(raw).ok_or_else(|| ArchiveError::UnknownDiscriminant {
                type_name: std::any::type_name::<E>(),
                value: raw.to_string(),
            })?;
        }
    }
    Ok(())
}

/// Implement [`Serial`] and [`SerialDefault`] for types that implement
/// [`SerialEnum`].
#[macro_export]
macro_rules! impl_serial_enum {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::Serial for $ty {
                const KIND: $crate::SerialKind = $crate::SerialKind::Global;

                fn serialize(&mut self, arc: &mut $crate::Archive) -> $crate::ArchiveResult<()> {
                    $crate::serialize_enum(self, arc)
                }
            }

            impl $crate::SerialDefault for $ty {}
        )+
    };
}

/// Declare a field-less enum with explicit codes and make it serializable.
///
/// ```ignore
/// serial_enum! {
///     #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
///     pub enum ShapeKind {
///         #[default]
///         Circle = 0,
///         Square = 1,
///     }
/// }
/// ```
#[macro_export]
macro_rules! serial_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident = $value:expr),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $($(#[$vmeta])* $variant = $value),+
        }

        impl $crate::SerialEnum for $name {
            fn to_raw(self) -> u32 {
                self as u32
            }

            fn from_raw(raw: u32) -> Option<Self> {
                $(
                    if raw == $name::$variant as u32 {
                        return Some($name::$variant);
                    }
                )+
                None
            }

            fn to_name(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }

            fn from_name(name: &str) -> Option<Self> {
                match name {
                    $(stringify!($variant) => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        $crate::impl_serial_enum!($name);
    };
}

impl SerialEnum for ResourceType {
    fn to_raw(self) -> u32 {
        self.code()
    }

    fn from_raw(raw: u32) -> Option<Self> {
        ResourceType::from_code(raw)
    }

    fn to_name(self) -> &'static str {
        self.name()
    }

    fn from_name(name: &str) -> Option<Self> {
        ResourceType::from_name(name)
    }
}

impl_serial_enum!(ResourceType);

// ---------------------------------------------------------------------------
// Owned pointers
// ---------------------------------------------------------------------------

/// Non-null owned pointer. Serialized exactly like the pointee.
impl<T: Serial> Serial for Box<T> {
    const KIND: SerialKind = T::KIND;
    const POLYMORPHIC: bool = T::POLYMORPHIC;

    fn serialize(&mut self, arc: &mut Archive) -> ArchiveResult<()> {
        T::serialize(self.as_mut(), arc)
    }
}

/// Nullable owned pointer.
///
/// The backend's pointer gate decides presence. A reader that finds a
/// pointee allocates a default instance and reads into it; a reader that
/// finds none leaves the pointer null. Pointers never carry defaults.
impl<T: Serial + Default> Serial for Option<Box<T>> {
    const KIND: SerialKind = T::KIND;
    const POLYMORPHIC: bool = T::POLYMORPHIC;

    fn serialize(&mut self, arc: &mut Archive) -> ArchiveResult<()> {
        if T::POLYMORPHIC
            && arc.is_reader()
            && arc.archive_version() < ArchiveVersion::Refactor.as_u16()
        {
            let mut legacy_type = 0u32;
            arc.field_hinted("Type", &mut legacy_type, SerialHints::ATTRIBUTE)?;
        }

        let hints = arc.current_hints();
        if arc.pre_serialize_pointer(self.is_some(), hints)? {
            if arc.is_reader() && self.is_none() {
                *self = Some(Box::default());
            }
            if let Some(value) = self {
                T::serialize(value.as_mut(), arc)?;
            }
        } else if arc.is_reader() {
            *self = None;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Raw buffers
// ---------------------------------------------------------------------------

/// Byte buffer transferred as one bulk block instead of per-element items.
///
/// Its length is always framed as a `Size` attribute, never through the
/// backend's native array framing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawBuffer(pub Vec<u8>);

impl RawBuffer {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for RawBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl Serial for RawBuffer {
    const KIND: SerialKind = SerialKind::Global;

    fn serialize(&mut self, arc: &mut Archive) -> ArchiveResult<()> {
        let mut size = self.0.len() as u32;
        arc.field_hinted("Size", &mut size, SerialHints::ATTRIBUTE)?;
        if arc.is_reader() {
            let size = size as usize;
            if let Some(limit) = arc.backend_mut().bulk_limit().filter(|&limit| size > limit) {
                return Err(ArchiveError::BulkLength {
                    expected: size,
                    found: limit,
                });
            }
            self.0.clear();
            self.0.resize(size, 0);
        }
        let hints = arc.current_hints();
        arc.backend_mut().serialize_bulk_data(&mut self.0, hints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BinaryReader, BinaryWriter, Param, TextReader, TextWriter};

    crate::serial_enum! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        enum Mood {
            #[default]
            Calm = 0,
            Angry = 7,
        }
    }

    #[test]
    fn enum_names_and_codes() {
        assert_eq!(Mood::Angry.to_raw(), 7);
        assert_eq!(Mood::from_raw(7), Some(Mood::Angry));
        assert_eq!(Mood::from_raw(1), None);
        assert_eq!(Mood::Angry.to_name(), "Angry");
        assert_eq!(Mood::from_name("Calm"), Some(Mood::Calm));
    }

    #[test]
    fn enum_is_a_name_in_text() {
        let mut arc = Archive::new(TextWriter::new("Doc"));
        let mut mood = Mood::Angry;
        arc.field("Mood", &mut mood).unwrap();
        let root = arc.into_backend().finish().unwrap();
        assert_eq!(root.children[0].text.as_deref(), Some("Angry"));
    }

    #[test]
    fn enum_is_a_code_in_binary() {
        let mut arc = Archive::new(BinaryWriter::new());
        let mut mood = Mood::Angry;
        arc.field("Mood", &mut mood).unwrap();
        let bytes = arc.into_backend().into_bytes();
        assert_eq!(bytes, [0, 0, 0, 7]);

        let mut arc = Archive::new(BinaryReader::new(bytes));
        let mut back = Mood::Calm;
        arc.field("Mood", &mut back).unwrap();
        assert_eq!(back, Mood::Angry);
    }

    #[test]
    fn unknown_enum_code_is_an_error() {
        let mut arc = Archive::new(BinaryReader::new(vec![0, 0, 0, 3]));
        let mut mood = Mood::Calm;
        assert!(matches!(
            arc.field("Mood", &mut mood),
            Err(ArchiveError::UnknownDiscriminant { .. })
        ));
    }

    #[test]
    fn optional_enum_with_default() {
        let mut arc = Archive::new(TextWriter::new("Doc"));
        let mut mood = Mood::Calm;
        arc.param(Param::new("Mood", &mut mood).optional(Mood::Calm))
            .unwrap();
        let root = arc.into_backend().finish().unwrap();
        assert!(root.children.is_empty());
    }

    #[test]
    fn game_is_stored_as_its_id() {
        let mut arc = Archive::new(TextWriter::new("Doc"));
        let mut game = Game::Corruption;
        arc.field_hinted("Game", &mut game, SerialHints::ATTRIBUTE)
            .unwrap();
        let root = arc.into_backend().finish().unwrap();
        assert_eq!(root.attribute("Game"), Some("MP3C"));
    }

    #[test]
    fn resource_type_round_trip_in_text() {
        let mut arc = Archive::new(TextWriter::new("Doc"));
        let mut ty = ResourceType::Texture;
        arc.field("Type", &mut ty).unwrap();
        let root = arc.into_backend().finish().unwrap();

        let mut arc = Archive::new(TextReader::new(root));
        let mut back = ResourceType::Invalid;
        arc.field("Type", &mut back).unwrap();
        assert_eq!(back, ResourceType::Texture);
    }

    #[test]
    fn null_pointer_reads_back_as_none() {
        let mut arc = Archive::new(TextWriter::new("Doc"));
        let mut pointer: Option<Box<u32>> = None;
        arc.field("Pointer", &mut pointer).unwrap();
        let root = arc.into_backend().finish().unwrap();
        assert_eq!(root.children[0].attribute("NullPointer"), Some("true"));

        let mut arc = Archive::new(TextReader::new(root));
        let mut back = Some(Box::new(9u32));
        arc.field("Pointer", &mut back).unwrap();
        assert!(back.is_none());
    }

    #[test]
    fn present_pointer_is_allocated_on_read() {
        let mut arc = Archive::new(BinaryWriter::new());
        let mut pointer = Some(Box::new(0xABCDu16));
        arc.field("Pointer", &mut pointer).unwrap();
        let bytes = arc.into_backend().into_bytes();
        assert_eq!(bytes, [1, 0xAB, 0xCD]);

        let mut arc = Archive::new(BinaryReader::new(bytes));
        let mut back: Option<Box<u16>> = None;
        arc.field("Pointer", &mut back).unwrap();
        assert_eq!(back.as_deref(), Some(&0xABCD));
    }

    #[test]
    fn raw_buffer_frames_size_as_attribute() {
        let mut arc = Archive::new(TextWriter::new("Doc"));
        let mut buffer = RawBuffer(vec![0xDE, 0xAD]);
        arc.field("Data", &mut buffer).unwrap();
        let root = arc.into_backend().finish().unwrap();
        let data = &root.children[0];
        assert_eq!(data.attribute("Size"), Some("2"));
        assert_eq!(data.text.as_deref(), Some("DEAD"));

        let mut arc = Archive::new(TextReader::new(root));
        let mut back = RawBuffer::default();
        arc.field("Data", &mut back).unwrap();
        assert_eq!(back, RawBuffer(vec![0xDE, 0xAD]));
    }
}
