//! Field descriptors.

use crate::hints::SerialHints;
use crate::serial::Serial;

/// Types that can carry a default value in a [`Param`].
///
/// Containers and pointers deliberately do not implement this, so giving
/// one a default is a compile error.
pub trait SerialDefault: Serial + PartialEq + Clone {}

/// Stored default plus the two operations the engine needs on it.
pub(crate) struct DefaultSlot<T> {
    value: T,
    equals: fn(&T, &T) -> bool,
    assign: fn(&mut T, &T),
}

fn equals<T: PartialEq>(a: &T, b: &T) -> bool {
    a == b
}

fn assign<T: Clone>(dst: &mut T, src: &T) {
    dst.clone_from(src);
}

impl<T> DefaultSlot<T> {
    fn new(value: T) -> Self
    where
        T: SerialDefault,
    {
        Self {
            value,
            equals: equals::<T>,
            assign: assign::<T>,
        }
    }

    pub(crate) fn matches(&self, live: &T) -> bool {
        (self.equals)(live, &self.value)
    }

    pub(crate) fn reset(&self, live: &mut T) {
        (self.assign)(live, &self.value)
    }
}

/// One named field about to be serialized.
///
/// Built transiently at the call site and consumed by
/// [`Archive::param`](crate::Archive::param):
///
/// ```ignore
/// arc.param(Param::new("Level", &mut self.level).optional(1))?;
/// arc.param(Param::new("Color", &mut self.color).hex().attribute())?;
/// ```
pub struct Param<'a, T> {
    pub(crate) name: &'a str,
    pub(crate) value: &'a mut T,
    pub(crate) hints: SerialHints,
    pub(crate) default: Option<DefaultSlot<T>>,
}

impl<'a, T: Serial> Param<'a, T> {
    pub fn new(name: &'a str, value: &'a mut T) -> Self {
        Self {
            name,
            value,
            hints: SerialHints::empty(),
            default: None,
        }
    }

    /// Add hints to the parameter.
    pub fn hints(mut self, hints: SerialHints) -> Self {
        self.hints |= hints;
        self
    }

    pub fn hex(self) -> Self {
        self.hints(SerialHints::HEX_DISPLAY)
    }

    pub fn attribute(self) -> Self {
        self.hints(SerialHints::ATTRIBUTE)
    }

    /// Value restored when a reader finds no entry for this field.
    pub fn default_value(mut self, default: T) -> Self
    where
        T: SerialDefault,
    {
        self.default = Some(DefaultSlot::new(default));
        self
    }

    /// Shorthand for `OPTIONAL` plus a default.
    pub fn optional(self, default: T) -> Self
    where
        T: SerialDefault,
    {
        self.hints(SerialHints::OPTIONAL).default_value(default)
    }
}
