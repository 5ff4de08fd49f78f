use relic_core::{AssetId, FourCC, IdLength};

use crate::backend::ArchiveBackend;
use crate::error::{ArchiveError, ArchiveResult};
use crate::hints::{ArchiveFlags, SerialHints};
use crate::text::node::TextNode;

enum Scope {
    /// `index` is the position in the parent's children; `next` is the
    /// child the next sibling lookup starts from.
    Element { index: usize, next: usize },
    Attribute(String),
}

/// Reads values from a [`TextNode`] tree.
///
/// Named lookups try the next unread child first and fall back to the first
/// child with a matching name, so reordered or unknown fields are tolerated.
/// `IGNORE_NAME` scopes take the next child regardless of its name.
pub struct TextReader {
    root: TextNode,
    /// The first entry stands for the root element and is never popped.
    scopes: Vec<Scope>,
}

impl TextReader {
    pub fn new(root: TextNode) -> Self {
        Self {
            root,
            scopes: vec![Scope::Element {
                index: usize::MAX,
                next: 0,
            }],
        }
    }

    pub fn from_text(text: &str) -> ArchiveResult<Self> {
        Ok(Self::new(TextNode::decode(text)?))
    }

    pub fn from_bytes(bytes: &[u8]) -> ArchiveResult<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ArchiveError::Document(e.to_string()))?;
        Self::from_text(text)
    }

    pub fn root(&self) -> &TextNode {
        &self.root
    }

    /// Innermost open element.
    fn element(&self) -> &TextNode {
        self.scopes
            .iter()
            .skip(1)
            .fold(&self.root, |node, scope| match scope {
                Scope::Element { index, .. } => &node.children[*index],
                Scope::Attribute(_) => node,
            })
    }

    fn next_sibling_mut(&mut self) -> Option<&mut usize> {
        self.scopes.iter_mut().rev().find_map(|scope| match scope {
            Scope::Element { next, .. } => Some(next),
            Scope::Attribute(_) => None,
        })
    }

    /// Text of the open attribute, or of the open element.
    fn value(&self) -> &str {
        let element = self.element();
        match self.scopes.last() {
            Some(Scope::Attribute(name)) => element.attribute(name).unwrap_or_default(),
            _ => element.text.as_deref().unwrap_or_default(),
        }
    }

    fn parse<T: std::str::FromStr>(&self, expected: &'static str) -> ArchiveResult<T> {
        let text = self.value();
        text.trim().parse().map_err(|_| parse_error(text, expected))
    }
}

fn parse_error(value: &str, expected: &'static str) -> ArchiveError {
    ArchiveError::Parse {
        value: value.to_owned(),
        expected,
    }
}

fn decode_hex(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 || !text.is_ascii() {
        return None;
    }
    (0..text.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&text[i..i + 2], 16).ok())
        .collect()
}

/// Integers accept decimal or `0x`-prefixed hex. Hex is read at the
/// unsigned width so signed values round-trip as two's complement.
macro_rules! read_integers {
    ($($method:ident: $ty:ty as $unsigned:ty),* $(,)?) => {
        $(
            fn $method(&mut self, value: &mut $ty, _hints: SerialHints) -> ArchiveResult<()> {
                let text = self.value().trim();
                let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
                    Some(digits) => <$unsigned>::from_str_radix(digits, 16).map(|v| v as $ty).ok(),
                    None => text.parse::<$ty>().ok(),
                };
                *value = parsed.ok_or_else(|| parse_error(text, stringify!($ty)))?;
                Ok(())
            }
        )*
    };
}

impl ArchiveBackend for TextReader {
    fn flags(&self) -> ArchiveFlags {
        ArchiveFlags::TEXT | ArchiveFlags::READER
    }

    fn param_begin(&mut self, name: &str, hints: SerialHints) -> ArchiveResult<bool> {
        if hints.contains(SerialHints::ATTRIBUTE) {
            if self.element().attribute(name).is_none() {
                return Ok(false);
            }
            self.scopes.push(Scope::Attribute(name.to_owned()));
            return Ok(true);
        }

        let start = self.next_sibling_mut().map_or(0, |next| *next);
        let children = &self.element().children;
        let found = if hints.contains(SerialHints::IGNORE_NAME) {
            (start < children.len()).then_some(start)
        } else if children.get(start).is_some_and(|child| child.name == name) {
            Some(start)
        } else {
            children.iter().position(|child| child.name == name)
        };

        let Some(index) = found else {
            return Ok(false);
        };
        if let Some(next) = self.next_sibling_mut() {
            *next = index + 1;
        }
        self.scopes.push(Scope::Element { index, next: 0 });
        Ok(true)
    }

    fn param_end(&mut self) -> ArchiveResult<()> {
        if self.scopes.len() <= 1 {
            return Err(ArchiveError::Unbalanced("param_end without param_begin"));
        }
        self.scopes.pop();
        Ok(())
    }

    fn pre_serialize_pointer(&mut self, _present: bool, _hints: SerialHints) -> ArchiveResult<bool> {
        Ok(self.element().attribute("NullPointer").is_none())
    }

    fn serialize_array_size(&mut self, size: &mut u32) -> ArchiveResult<bool> {
        *size = self.element().children.len() as u32;
        Ok(true)
    }

    /// Bulk data is hex text, two digits per byte.
    fn bulk_limit(&self) -> Option<usize> {
        Some(self.value().trim().len() / 2)
    }

    fn serialize_bool(&mut self, value: &mut bool, _hints: SerialHints) -> ArchiveResult<()> {
        let text = self.value().trim();
        *value = match text {
            "true" | "1" => true,
            "false" | "0" => false,
            _ => return Err(parse_error(text, "bool")),
        };
        Ok(())
    }

    read_integers! {
        serialize_i8: i8 as u8,
        serialize_u8: u8 as u8,
        serialize_i16: i16 as u16,
        serialize_u16: u16 as u16,
        serialize_i32: i32 as u32,
        serialize_u32: u32 as u32,
        serialize_i64: i64 as u64,
        serialize_u64: u64 as u64,
    }

    fn serialize_f32(&mut self, value: &mut f32, _hints: SerialHints) -> ArchiveResult<()> {
        *value = self.parse("f32")?;
        Ok(())
    }

    fn serialize_f64(&mut self, value: &mut f64, _hints: SerialHints) -> ArchiveResult<()> {
        *value = self.parse("f64")?;
        Ok(())
    }

    fn serialize_string(&mut self, value: &mut String, _hints: SerialHints) -> ArchiveResult<()> {
        *value = self.value().to_owned();
        Ok(())
    }

    fn serialize_fourcc(&mut self, value: &mut FourCC, _hints: SerialHints) -> ArchiveResult<()> {
        let text = self.value();
        *value = FourCC::from_text(text).ok_or_else(|| parse_error(text, "FourCC"))?;
        Ok(())
    }

    fn serialize_asset_id(
        &mut self,
        value: &mut AssetId,
        _length: IdLength,
        _hints: SerialHints,
    ) -> ArchiveResult<()> {
        let text = self.value().trim();
        *value = AssetId::from_hex(text).ok_or_else(|| parse_error(text, "asset id"))?;
        Ok(())
    }

    fn serialize_bulk_data(&mut self, data: &mut [u8], _hints: SerialHints) -> ArchiveResult<()> {
        let text = self.value().trim();
        let bytes = decode_hex(text).ok_or_else(|| parse_error(text, "hex bytes"))?;
        if bytes.len() != data.len() {
            return Err(ArchiveError::BulkLength {
                expected: data.len(),
                found: bytes.len(),
            });
        }
        data.copy_from_slice(&bytes);
        Ok(())
    }
}
