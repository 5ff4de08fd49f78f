use relic_core::{AssetId, FourCC, IdLength};

use crate::backend::ArchiveBackend;
use crate::error::{ArchiveError, ArchiveResult};
use crate::hints::{ArchiveFlags, SerialHints};
use crate::text::node::TextNode;

enum Scope {
    Element,
    Attribute(String),
}

/// Builds a [`TextNode`] tree.
///
/// Every scope becomes a child element, `ATTRIBUTE` scopes become
/// attributes of the enclosing element and primitives become element text.
pub struct TextWriter {
    /// Open elements, root first. Closed elements are moved into their parent.
    open: Vec<TextNode>,
    scopes: Vec<Scope>,
}

impl TextWriter {
    pub fn new(root_name: &str) -> Self {
        Self {
            open: vec![TextNode::new(root_name)],
            scopes: Vec::new(),
        }
    }

    /// Take the finished document.
    pub fn finish(mut self) -> ArchiveResult<TextNode> {
        if !self.scopes.is_empty() {
            return Err(ArchiveError::Unbalanced("writer finished with open scopes"));
        }
        self.open
            .pop()
            .ok_or(ArchiveError::Unbalanced("writer lost its root element"))
    }

    /// Finish and render the document as text.
    pub fn into_string(self) -> ArchiveResult<String> {
        self.finish()?.encode()
    }

    fn current(&mut self) -> ArchiveResult<&mut TextNode> {
        self.open
            .last_mut()
            .ok_or(ArchiveError::Unbalanced("writer lost its root element"))
    }

    fn put(&mut self, value: String) -> ArchiveResult<()> {
        let attribute = match self.scopes.last() {
            Some(Scope::Attribute(name)) => Some(name.clone()),
            _ => None,
        };
        let node = self.current()?;
        match attribute {
            Some(name) => node.set_attribute(name, value),
            None => node.text = Some(value),
        }
        Ok(())
    }
}

macro_rules! write_integers {
    ($($method:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method(&mut self, value: &mut $ty, hints: SerialHints) -> ArchiveResult<()> {
                let text = if hints.contains(SerialHints::HEX_DISPLAY) {
                    format!("0x{:X}", *value)
                } else {
                    value.to_string()
                };
                self.put(text)
            }
        )*
    };
}

impl ArchiveBackend for TextWriter {
    fn flags(&self) -> ArchiveFlags {
        ArchiveFlags::TEXT | ArchiveFlags::WRITER
    }

    fn param_begin(&mut self, name: &str, hints: SerialHints) -> ArchiveResult<bool> {
        if hints.contains(SerialHints::ATTRIBUTE) {
            self.scopes.push(Scope::Attribute(name.to_owned()));
        } else {
            self.open.push(TextNode::new(name));
            self.scopes.push(Scope::Element);
        }
        Ok(true)
    }

    fn param_end(&mut self) -> ArchiveResult<()> {
        match self.scopes.pop() {
            Some(Scope::Attribute(_)) => Ok(()),
            Some(Scope::Element) => {
                let node = self
                    .open
                    .pop()
                    .ok_or(ArchiveError::Unbalanced("element scope without element"))?;
                self.current()?.children.push(node);
                Ok(())
            }
            None => Err(ArchiveError::Unbalanced("param_end without param_begin")),
        }
    }

    fn pre_serialize_pointer(&mut self, present: bool, _hints: SerialHints) -> ArchiveResult<bool> {
        if !present {
            self.current()?.set_attribute("NullPointer", "true");
        }
        Ok(present)
    }

    fn serialize_array_size(&mut self, _size: &mut u32) -> ArchiveResult<bool> {
        // Readers count child elements.
        Ok(true)
    }

    fn serialize_bool(&mut self, value: &mut bool, _hints: SerialHints) -> ArchiveResult<()> {
        self.put(value.to_string())
    }

    write_integers! {
        serialize_i8: i8,
        serialize_u8: u8,
        serialize_i16: i16,
        serialize_u16: u16,
        serialize_i32: i32,
        serialize_u32: u32,
        serialize_i64: i64,
        serialize_u64: u64,
    }

    fn serialize_f32(&mut self, value: &mut f32, _hints: SerialHints) -> ArchiveResult<()> {
        self.put(value.to_string())
    }

    fn serialize_f64(&mut self, value: &mut f64, _hints: SerialHints) -> ArchiveResult<()> {
        self.put(value.to_string())
    }

    fn serialize_string(&mut self, value: &mut String, _hints: SerialHints) -> ArchiveResult<()> {
        self.put(value.clone())
    }

    fn serialize_fourcc(&mut self, value: &mut FourCC, _hints: SerialHints) -> ArchiveResult<()> {
        self.put(value.to_string())
    }

    fn serialize_asset_id(
        &mut self,
        value: &mut AssetId,
        _length: IdLength,
        _hints: SerialHints,
    ) -> ArchiveResult<()> {
        self.put(value.to_string())
    }

    fn serialize_bulk_data(&mut self, data: &mut [u8], _hints: SerialHints) -> ArchiveResult<()> {
        let text: String = data.iter().map(|b| format!("{b:02X}")).collect();
        self.put(text)
    }
}
