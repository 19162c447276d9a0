//!
//! Format codec: bytes to field tree and back.
//!
//! Decoding interprets the grammar in [`crate::schema`]. Encoding walks the
//! tree and writes every node's stored bytes, so a tree that was never
//! mutated re-encodes to exactly the input it was decoded from.

use crate::error::DecodeError;
use crate::primitives;
use crate::schema::wasm::{self, OP_END};
use crate::schema::{Extent, Shape, Variant};
use crate::tree::{Body, IntValue, Module, Node, Prefix, Section};
use crate::types::{BytesTag, IntEncoding, IntRole, PrefixRole};

/// Name given to the elements of a `Repeat`.
pub const ITEM: &str = "item";

/// Bounded cursor over the input. Offsets are absolute so errors point into
/// the original buffer.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Reader { buf, pos: 0, end: buf.len() }
    }

    fn remaining(&self) -> usize {
        self.end - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if len > self.remaining() {
            return Err(DecodeError::UnexpectedEof {
                offset: self.pos,
                wanted: len - self.remaining(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    fn read_int(&mut self, encoding: IntEncoding, role: IntRole) -> Result<IntValue, DecodeError> {
        let (value, len) = primitives::read_int(&self.buf[..self.end], self.pos, encoding)?;
        let raw = self.take(len)?.to_vec();
        Ok(IntValue { encoding, role, value, raw })
    }

    /// Splits off the next `len` bytes as a nested reader and skips past them.
    fn sub(&mut self, len: u64) -> Result<Reader<'a>, DecodeError> {
        let len = usize::try_from(len).unwrap_or(usize::MAX);
        let start = self.pos;
        self.take(len)?;
        Ok(Reader { buf: self.buf, pos: start, end: start + len })
    }

    /// Skips one constant expression, returning its bytes including `end`.
    fn init_expr(&mut self) -> Result<&'a [u8], DecodeError> {
        let start = self.pos;
        loop {
            let op = self.take(1)?[0];
            match op {
                OP_END => break,
                // i32.const, i64.const
                0x41 => {
                    self.read_int(IntEncoding::VARINT32, IntRole::Value)?;
                }
                0x42 => {
                    self.read_int(IntEncoding::VARINT64, IntRole::Value)?;
                }
                // f32.const, f64.const
                0x43 => {
                    self.take(4)?;
                }
                0x44 => {
                    self.take(8)?;
                }
                // get_global
                0x23 => {
                    self.read_int(IntEncoding::VARUINT32, IntRole::Value)?;
                }
                other => {
                    return Err(DecodeError::UnknownVariant { field: "init_expr", value: u64::from(other) })
                }
            }
        }
        Ok(&self.buf[start..self.pos])
    }
}

/// Decoder/encoder for whole modules.
///
/// Custom sections are decoded with a registered payload grammar when their
/// name matches one; otherwise their payload is an opaque byte run.
#[derive(Debug, Clone)]
pub struct Codec {
    custom: Vec<(Vec<u8>, &'static Shape)>,
}

impl Default for Codec {
    fn default() -> Self {
        let mut codec = Codec::bare();
        codec.register_custom(b"name".to_vec(), &wasm::NAME_SECTION);
        codec
    }
}

impl Codec {
    /// A codec with no custom-section grammars registered.
    pub fn bare() -> Self {
        Codec { custom: Vec::new() }
    }

    /// Registers (or replaces) the payload grammar of the custom section `name`.
    pub fn register_custom(&mut self, name: impl Into<Vec<u8>>, shape: &'static Shape) -> &mut Self {
        let name = name.into();
        self.custom.retain(|(n, _)| *n != name);
        self.custom.push((name, shape));
        self
    }

    fn custom_payload(&self, name: &[u8]) -> Option<&'static Shape> {
        self.custom.iter().find(|(n, _)| n == name).map(|(_, s)| *s)
    }

    /// Decodes a complete module.
    pub fn decode(&self, buf: &[u8]) -> Result<Module, DecodeError> {
        let mut reader = Reader::new(buf);
        let header = decode_shape(&mut reader, "header", &wasm::MODULE_HEADER, &[])?;
        let mut sections = Vec::new();
        while reader.remaining() > 0 {
            sections.push(self.decode_section(&mut reader)?);
        }
        Ok(Module { header, sections })
    }

    fn decode_section(&self, reader: &mut Reader<'_>) -> Result<Section, DecodeError> {
        let id = reader.read_int(wasm::SECTION_ID, IntRole::Discriminant)?;
        let len = reader.read_int(wasm::SECTION_LEN, IntRole::Value)?;
        let mut body = reader.sub(len.value)?;

        let mut fields = Vec::new();
        let payload = if id.value == u64::from(wasm::SEC_CUSTOM) {
            let mut name = decode_shape(&mut body, "name", &CUSTOM_NAME, &[])?;
            let shape = match &mut name.body {
                Body::Bytes { data, tag } => {
                    *tag = BytesTag::SectionName;
                    self.custom_payload(data)
                }
                _ => None,
            };
            fields.push(name);
            // Unregistered custom payloads stay opaque but mutable.
            Some(shape.unwrap_or(&OPAQUE_PAYLOAD))
        } else {
            wasm::section_payload(id.value as u8)
        };
        if let Some(shape) = payload {
            let node = decode_shape(&mut body, "payload", shape, &fields)?;
            fields.push(node);
        }

        let rest = body.take(body.remaining())?.to_vec();
        fields.push(Node::new("overhang", Body::Bytes { data: rest, tag: BytesTag::Overhang }));

        let content = Node::new("section", Body::Struct(fields))
            .with_prefix(Prefix { role: PrefixRole::ByteLength, int: len });
        Ok(Section { id, content })
    }

    /// Encodes a module. Never fails; the output is self-consistent exactly
    /// when [`Module::verify`] holds.
    pub fn encode(&self, module: &Module) -> Vec<u8> {
        let mut out = Vec::with_capacity(module.encoded_len());
        module.header.encode_into(&mut out);
        for section in &module.sections {
            section.encode_into(&mut out);
        }
        out
    }
}

static CUSTOM_NAME: Shape = Shape::Bytes(Extent::Prefixed(IntEncoding::VARUINT32));
static OPAQUE_PAYLOAD: Shape = Shape::Bytes(Extent::Remaining);

/// Decodes one grammar production. `siblings` are the fields already decoded
/// in the enclosing struct, used to resolve `Cond` discriminants.
fn decode_shape(
    reader: &mut Reader<'_>,
    name: &'static str,
    shape: &'static Shape,
    siblings: &[Node],
) -> Result<Node, DecodeError> {
    let node = match shape {
        Shape::Const(expected) => {
            let expected: &'static [u8] = expected;
            let offset = reader.pos;
            let found = reader
                .take(expected.len())
                .map_err(|_| DecodeError::ConstMismatch { offset, expected })?;
            if found != expected {
                return Err(DecodeError::ConstMismatch { offset, expected });
            }
            Node::new(name, Body::Const(expected))
        }
        Shape::Int(encoding) => Node::new(name, Body::Int(reader.read_int(*encoding, IntRole::Value)?)),
        Shape::Discriminant(encoding) => {
            Node::new(name, Body::Int(reader.read_int(*encoding, IntRole::Discriminant)?))
        }
        Shape::Bytes(Extent::Prefixed(encoding)) => {
            let len = reader.read_int(*encoding, IntRole::Value)?;
            let data = reader.take(usize::try_from(len.value).unwrap_or(usize::MAX))?.to_vec();
            Node::new(name, Body::Bytes { data, tag: BytesTag::Data })
                .with_prefix(Prefix { role: PrefixRole::ByteLength, int: len })
        }
        Shape::Bytes(Extent::Remaining) => {
            let data = reader.take(reader.remaining())?.to_vec();
            Node::new(name, Body::Bytes { data, tag: BytesTag::Data })
        }
        Shape::InitExpr => {
            let data = reader.init_expr()?.to_vec();
            Node::new(name, Body::Bytes { data, tag: BytesTag::InitExpr })
        }
        Shape::Repeat { extent: Extent::Prefixed(encoding), elem } => {
            let count = reader.read_int(*encoding, IntRole::Value)?;
            let capacity = usize::try_from(count.value).unwrap_or(usize::MAX).min(reader.remaining());
            let mut items = Vec::with_capacity(capacity);
            for _ in 0..count.value {
                items.push(decode_element(reader, name, elem)?);
            }
            Node::new(name, Body::Repeat(items))
                .with_prefix(Prefix { role: PrefixRole::ElementCount, int: count })
        }
        Shape::Repeat { extent: Extent::Remaining, elem } => {
            let mut items = Vec::new();
            while reader.remaining() > 0 {
                items.push(decode_element(reader, name, elem)?);
            }
            Node::new(name, Body::Repeat(items))
        }
        Shape::Struct(fields) => {
            let mut items: Vec<Node> = Vec::with_capacity(fields.len());
            for field in fields.iter() {
                let node = decode_shape(reader, field.name, &field.shape, &items)?;
                items.push(node);
            }
            Node::new(name, Body::Struct(items))
        }
        Shape::Sized { len, inner } => {
            let len = reader.read_int(*len, IntRole::Value)?;
            let mut region = reader.sub(len.value)?;
            let mut node = decode_shape(&mut region, name, inner, &[])?;
            if region.remaining() > 0 {
                return Err(DecodeError::TrailingBytes { field: name, remaining: region.remaining() });
            }
            node.prefix = Some(Prefix { role: PrefixRole::ByteLength, int: len });
            node
        }
        Shape::Cond { on, select } => {
            let discriminant = siblings
                .iter()
                .rev()
                .find(|n| n.name == *on)
                .and_then(|n| match &n.body {
                    Body::Int(int) => Some(int.value),
                    _ => None,
                })
                .ok_or(DecodeError::MissingDiscriminant { field: name })?;
            match select(discriminant) {
                Variant::Absent => Node::new(name, Body::Cond(None)),
                Variant::Present(inner) => {
                    let inner = decode_shape(reader, name, inner, &[])?;
                    Node::new(name, Body::Cond(Some(Box::new(inner))))
                }
                Variant::Unknown => {
                    return Err(DecodeError::UnknownVariant { field: name, value: discriminant })
                }
            }
        }
    };
    Ok(node)
}

fn decode_element(reader: &mut Reader<'_>, field: &'static str, elem: &'static Shape) -> Result<Node, DecodeError> {
    let start = reader.pos;
    let node = decode_shape(reader, ITEM, elem, &[])?;
    if reader.pos == start {
        return Err(DecodeError::ZeroSizedElement { field });
    }
    Ok(node)
}
