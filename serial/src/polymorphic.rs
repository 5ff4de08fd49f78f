//! Polymorphic objects and their constructor registries.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::archive::Archive;
use crate::error::{ArchiveError, ArchiveResult};
use crate::serial::Serial;

/// An object stored behind a pointer to its base type.
///
/// Base traits use this as a supertrait, fixing the discriminant type:
///
/// ```ignore
/// pub trait Shape: AbstractObject<Kind = ShapeKind> { fn area(&self) -> f32; }
/// ```
///
/// The discriminant is written as a `Type` attribute ahead of the body and
/// is what an [`ObjectFactory`] keys constructors on.
pub trait AbstractObject: 'static {
    type Kind: Serial + Copy + Eq + Hash + Default + fmt::Debug;

    /// Discriminant of the concrete type.
    fn kind(&self) -> Self::Kind;

    /// Serialize the concrete type's fields.
    fn serialize(&mut self, arc: &mut Archive) -> ArchiveResult<()>;
}

/// Builds an object from its discriminant alone.
pub type BasicConstructor<P> = fn(<P as AbstractObject>::Kind) -> Box<P>;

/// Builds an object with access to the archive being read (its game and
/// versions, or ancestors on the traversal stack).
pub type ContextConstructor<P> = fn(<P as AbstractObject>::Kind, &Archive) -> Box<P>;

/// Registry of constructors for the concrete types behind a base `P`.
///
/// When both kinds of constructor are registered for a discriminant, the
/// contextual one wins.
pub struct ObjectFactory<P: ?Sized + AbstractObject> {
    basic: HashMap<P::Kind, BasicConstructor<P>>,
    contextual: HashMap<P::Kind, ContextConstructor<P>>,
}

impl<P: ?Sized + AbstractObject> ObjectFactory<P> {
    pub fn new() -> Self {
        Self {
            basic: HashMap::new(),
            contextual: HashMap::new(),
        }
    }

    pub fn register(&mut self, kind: P::Kind, constructor: BasicConstructor<P>) -> &mut Self {
        self.basic.insert(kind, constructor);
        self
    }

    pub fn register_contextual(
        &mut self,
        kind: P::Kind,
        constructor: ContextConstructor<P>,
    ) -> &mut Self {
        self.contextual.insert(kind, constructor);
        self
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, kind: P::Kind, constructor: BasicConstructor<P>) -> Self {
        self.register(kind, constructor);
        self
    }

    /// Builder form of [`register_contextual`](Self::register_contextual).
    pub fn with_contextual(mut self, kind: P::Kind, constructor: ContextConstructor<P>) -> Self {
        self.register_contextual(kind, constructor);
        self
    }

    pub fn contains(&self, kind: P::Kind) -> bool {
        self.contextual.contains_key(&kind) || self.basic.contains_key(&kind)
    }

    /// Construct the concrete object for `kind`.
    pub fn construct(&self, kind: P::Kind, arc: &Archive) -> ArchiveResult<Box<P>> {
        if let Some(constructor) = self.contextual.get(&kind) {
            return Ok(constructor(kind, arc));
        }
        if let Some(constructor) = self.basic.get(&kind) {
            return Ok(constructor(kind));
        }
        Err(ArchiveError::NoConstructor {
            type_name: std::any::type_name::<P>(),
            kind: format!("{kind:?}"),
        })
    }
}

impl<P: ?Sized + AbstractObject> Default for ObjectFactory<P> {
    fn default() -> Self {
        Self::new()
    }
}
