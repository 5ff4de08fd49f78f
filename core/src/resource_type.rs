//! Resource type catalogue.
//!
//! Each type has a stable name used by text archives, a cooked file
//! extension (a four-character code) and a raw, editable extension.

use std::fmt;

use crate::FourCC;

/// Kinds of resource the store can track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum ResourceType {
    Animation,
    AnimSet,
    Area,
    AudioGroup,
    CollisionMesh,
    Font,
    Model,
    Scan,
    Skeleton,
    Skin,
    StringTable,
    Texture,
    World,
    #[default]
    Invalid,
}

impl ResourceType {
    pub const ALL: [ResourceType; 14] = [
        ResourceType::Animation,
        ResourceType::AnimSet,
        ResourceType::Area,
        ResourceType::AudioGroup,
        ResourceType::CollisionMesh,
        ResourceType::Font,
        ResourceType::Model,
        ResourceType::Scan,
        ResourceType::Skeleton,
        ResourceType::Skin,
        ResourceType::StringTable,
        ResourceType::Texture,
        ResourceType::World,
        ResourceType::Invalid,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            ResourceType::Animation => "Animation",
            ResourceType::AnimSet => "AnimSet",
            ResourceType::Area => "Area",
            ResourceType::AudioGroup => "AudioGroup",
            ResourceType::CollisionMesh => "CollisionMesh",
            ResourceType::Font => "Font",
            ResourceType::Model => "Model",
            ResourceType::Scan => "Scan",
            ResourceType::Skeleton => "Skeleton",
            ResourceType::Skin => "Skin",
            ResourceType::StringTable => "StringTable",
            ResourceType::Texture => "Texture",
            ResourceType::World => "World",
            ResourceType::Invalid => "Invalid",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.name() == name)
    }

    /// Stable numeric code used by binary archives.
    pub fn code(self) -> u32 {
        self as u32
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Extension of the cooked (game-ready) file, always upper case.
    pub const fn cooked_extension(self) -> FourCC {
        match self {
            ResourceType::Animation => FourCC::new(b"ANIM"),
            ResourceType::AnimSet => FourCC::new(b"ANCS"),
            ResourceType::Area => FourCC::new(b"MREA"),
            ResourceType::AudioGroup => FourCC::new(b"AGSC"),
            ResourceType::CollisionMesh => FourCC::new(b"DCLN"),
            ResourceType::Font => FourCC::new(b"FONT"),
            ResourceType::Model => FourCC::new(b"CMDL"),
            ResourceType::Scan => FourCC::new(b"SCAN"),
            ResourceType::Skeleton => FourCC::new(b"CINF"),
            ResourceType::Skin => FourCC::new(b"CSKR"),
            ResourceType::StringTable => FourCC::new(b"STRG"),
            ResourceType::Texture => FourCC::new(b"TXTR"),
            ResourceType::World => FourCC::new(b"MLVL"),
            ResourceType::Invalid => FourCC::new(b"NONE"),
        }
    }

    /// Extension of the raw (editable) file.
    pub fn raw_extension(self) -> String {
        self.cooked_extension().to_string().to_ascii_lowercase()
    }

    /// Look up a type by cooked extension, ignoring case.
    pub fn from_cooked_extension(extension: &str) -> Option<Self> {
        let code = FourCC::from_text(extension)?.to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .filter(|ty| *ty != ResourceType::Invalid)
            .find(|ty| ty.cooked_extension() == code)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
