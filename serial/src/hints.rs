//! Field hints and archive mode flags.

bitflags::bitflags! {
    /// Per-field hints that adjust how a parameter is written or read.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SerialHints: u32 {
        /// Text backends print integers as `0x`-prefixed hex.
        const HEX_DISPLAY = 1 << 0;
        /// Omit from writer output when the value equals its default.
        const OPTIONAL = 1 << 1;
        /// Never written. Readers still accept it.
        const NEVER_SAVE = 1 << 2;
        /// Always written, even when `OPTIONAL` would skip it.
        const ALWAYS_SAVE = 1 << 3;
        /// Stored as an attribute of the enclosing scope. Must be a leaf.
        const ATTRIBUTE = 1 << 4;
        /// Readers do not check the name. Used for container elements.
        const IGNORE_NAME = 1 << 5;
    }
}

bitflags::bitflags! {
    /// Mode and format of an archive, reported by its backend.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ArchiveFlags: u32 {
        const READER = 1 << 0;
        const WRITER = 1 << 1;
        const TEXT = 1 << 2;
        const BINARY = 1 << 3;
        /// Every parameter is serialized regardless of hints and defaults.
        const NO_SKIPPING = 1 << 4;
    }
}
