//!
//! WebAssembly (MVP binary format) grammar.

use super::{Extent, Field, Shape, Variant};
use crate::types::IntEncoding as Enc;

pub const MAGIC: &[u8] = b"\0asm";
pub const VERSION: u32 = 1;

pub const SEC_CUSTOM: u8 = 0;
pub const SEC_TYPE: u8 = 1;
pub const SEC_IMPORT: u8 = 2;
pub const SEC_FUNCTION: u8 = 3;
pub const SEC_TABLE: u8 = 4;
pub const SEC_MEMORY: u8 = 5;
pub const SEC_GLOBAL: u8 = 6;
pub const SEC_EXPORT: u8 = 7;
pub const SEC_START: u8 = 8;
pub const SEC_ELEMENT: u8 = 9;
pub const SEC_CODE: u8 = 10;
pub const SEC_DATA: u8 = 11;

/// Opcode terminating a constant expression.
pub const OP_END: u8 = 0x0b;

/// Encoding of a section id.
pub const SECTION_ID: Enc = Enc::VARUINT7;
/// Encoding of a section's declared byte length.
pub const SECTION_LEN: Enc = Enc::VARUINT32;

// --- Header -----------------------------------------------------------------

static HEADER_FIELDS: [Field; 2] = [
    Field { name: "magic", shape: Shape::Const(MAGIC) },
    Field { name: "version", shape: Shape::Int(Enc::UINT32) },
];

pub static MODULE_HEADER: Shape = Shape::Struct(&HEADER_FIELDS);

// --- Shared types -------------------------------------------------------------

static VALUE_TYPE: Shape = Shape::Int(Enc::VARINT7);
static INDEX: Shape = Shape::Int(Enc::VARUINT32);

static LIMITS_FIELDS: [Field; 3] = [
    Field { name: "flags", shape: Shape::Discriminant(Enc::VARUINT1) },
    Field { name: "initial", shape: Shape::Int(Enc::VARUINT32) },
    Field { name: "maximum", shape: Shape::Cond { on: "flags", select: select_maximum } },
];

fn select_maximum(flags: u64) -> Variant {
    match flags {
        0 => Variant::Absent,
        1 => Variant::Present(&INDEX),
        _ => Variant::Unknown,
    }
}

static TABLE_TYPE_FIELDS: [Field; 2] = [
    Field { name: "element_type", shape: Shape::Int(Enc::VARINT7) },
    Field { name: "limits", shape: Shape::Struct(&LIMITS_FIELDS) },
];
static TABLE_TYPE: Shape = Shape::Struct(&TABLE_TYPE_FIELDS);

static MEMORY_TYPE_FIELDS: [Field; 1] = [
    Field { name: "limits", shape: Shape::Struct(&LIMITS_FIELDS) },
];
static MEMORY_TYPE: Shape = Shape::Struct(&MEMORY_TYPE_FIELDS);

static GLOBAL_TYPE_FIELDS: [Field; 2] = [
    Field { name: "content_type", shape: Shape::Int(Enc::VARINT7) },
    Field { name: "mutability", shape: Shape::Int(Enc::VARUINT1) },
];
static GLOBAL_TYPE: Shape = Shape::Struct(&GLOBAL_TYPE_FIELDS);

// --- Type section -------------------------------------------------------------

static FUNC_TYPE_FIELDS: [Field; 4] = [
    Field { name: "form", shape: Shape::Int(Enc::VARINT7) },
    Field {
        name: "param_types",
        shape: Shape::Repeat { extent: Extent::Prefixed(Enc::VARUINT32), elem: &VALUE_TYPE },
    },
    Field { name: "return_count", shape: Shape::Discriminant(Enc::VARUINT1) },
    Field { name: "return_type", shape: Shape::Cond { on: "return_count", select: select_return_type } },
];
static FUNC_TYPE: Shape = Shape::Struct(&FUNC_TYPE_FIELDS);

fn select_return_type(count: u64) -> Variant {
    match count {
        0 => Variant::Absent,
        1 => Variant::Present(&VALUE_TYPE),
        _ => Variant::Unknown,
    }
}

static TYPE_SECTION: Shape = Shape::Repeat { extent: Extent::Prefixed(Enc::VARUINT32), elem: &FUNC_TYPE };

// --- Import section -----------------------------------------------------------

static IMPORT_ENTRY_FIELDS: [Field; 4] = [
    Field { name: "module_str", shape: Shape::Bytes(Extent::Prefixed(Enc::VARUINT32)) },
    Field { name: "field_str", shape: Shape::Bytes(Extent::Prefixed(Enc::VARUINT32)) },
    Field { name: "kind", shape: Shape::Discriminant(Enc::UINT8) },
    Field { name: "type", shape: Shape::Cond { on: "kind", select: select_import_type } },
];
static IMPORT_ENTRY: Shape = Shape::Struct(&IMPORT_ENTRY_FIELDS);

fn select_import_type(kind: u64) -> Variant {
    match kind {
        0 => Variant::Present(&INDEX),
        1 => Variant::Present(&TABLE_TYPE),
        2 => Variant::Present(&MEMORY_TYPE),
        3 => Variant::Present(&GLOBAL_TYPE),
        _ => Variant::Unknown,
    }
}

static IMPORT_SECTION: Shape = Shape::Repeat { extent: Extent::Prefixed(Enc::VARUINT32), elem: &IMPORT_ENTRY };

// --- Function, table, memory, global sections -----------------------------------

static FUNCTION_SECTION: Shape = Shape::Repeat { extent: Extent::Prefixed(Enc::VARUINT32), elem: &INDEX };
static TABLE_SECTION: Shape = Shape::Repeat { extent: Extent::Prefixed(Enc::VARUINT32), elem: &TABLE_TYPE };
static MEMORY_SECTION: Shape = Shape::Repeat { extent: Extent::Prefixed(Enc::VARUINT32), elem: &MEMORY_TYPE };

static GLOBAL_ENTRY_FIELDS: [Field; 2] = [
    Field { name: "type", shape: Shape::Struct(&GLOBAL_TYPE_FIELDS) },
    Field { name: "init", shape: Shape::InitExpr },
];
static GLOBAL_ENTRY: Shape = Shape::Struct(&GLOBAL_ENTRY_FIELDS);
static GLOBAL_SECTION: Shape = Shape::Repeat { extent: Extent::Prefixed(Enc::VARUINT32), elem: &GLOBAL_ENTRY };

// --- Export and start sections -----------------------------------------------

static EXPORT_ENTRY_FIELDS: [Field; 3] = [
    Field { name: "field_str", shape: Shape::Bytes(Extent::Prefixed(Enc::VARUINT32)) },
    Field { name: "kind", shape: Shape::Int(Enc::UINT8) },
    Field { name: "index", shape: Shape::Int(Enc::VARUINT32) },
];
static EXPORT_ENTRY: Shape = Shape::Struct(&EXPORT_ENTRY_FIELDS);
static EXPORT_SECTION: Shape = Shape::Repeat { extent: Extent::Prefixed(Enc::VARUINT32), elem: &EXPORT_ENTRY };

static START_SECTION_FIELDS: [Field; 1] = [Field { name: "index", shape: Shape::Int(Enc::VARUINT32) }];
static START_SECTION: Shape = Shape::Struct(&START_SECTION_FIELDS);

// --- Element section ------------------------------------------------------------

static ELEMENT_SEGMENT_FIELDS: [Field; 3] = [
    Field { name: "index", shape: Shape::Int(Enc::VARUINT32) },
    Field { name: "offset", shape: Shape::InitExpr },
    Field {
        name: "elems",
        shape: Shape::Repeat { extent: Extent::Prefixed(Enc::VARUINT32), elem: &INDEX },
    },
];
static ELEMENT_SEGMENT: Shape = Shape::Struct(&ELEMENT_SEGMENT_FIELDS);
static ELEMENT_SECTION: Shape = Shape::Repeat { extent: Extent::Prefixed(Enc::VARUINT32), elem: &ELEMENT_SEGMENT };

// --- Code section -----------------------------------------------------------------

static LOCAL_ENTRY_FIELDS: [Field; 2] = [
    Field { name: "count", shape: Shape::Int(Enc::VARUINT32) },
    Field { name: "type", shape: Shape::Int(Enc::VARINT7) },
];
static LOCAL_ENTRY: Shape = Shape::Struct(&LOCAL_ENTRY_FIELDS);

static FUNCTION_BODY_FIELDS: [Field; 2] = [
    Field {
        name: "locals",
        shape: Shape::Repeat { extent: Extent::Prefixed(Enc::VARUINT32), elem: &LOCAL_ENTRY },
    },
    Field { name: "code", shape: Shape::Bytes(Extent::Remaining) },
];
static FUNCTION_BODY_INNER: Shape = Shape::Struct(&FUNCTION_BODY_FIELDS);
static FUNCTION_BODY: Shape = Shape::Sized { len: Enc::VARUINT32, inner: &FUNCTION_BODY_INNER };
static CODE_SECTION: Shape = Shape::Repeat { extent: Extent::Prefixed(Enc::VARUINT32), elem: &FUNCTION_BODY };

// --- Data section -------------------------------------------------------------------

static DATA_SEGMENT_FIELDS: [Field; 3] = [
    Field { name: "index", shape: Shape::Int(Enc::VARUINT32) },
    Field { name: "offset", shape: Shape::InitExpr },
    Field { name: "data", shape: Shape::Bytes(Extent::Prefixed(Enc::VARUINT32)) },
];
static DATA_SEGMENT: Shape = Shape::Struct(&DATA_SEGMENT_FIELDS);
static DATA_SECTION: Shape = Shape::Repeat { extent: Extent::Prefixed(Enc::VARUINT32), elem: &DATA_SEGMENT };

// --- Custom "name" section ------------------------------------------------------------

static NAME_SUBSECTION_FIELDS: [Field; 2] = [
    Field { name: "name_type", shape: Shape::Int(Enc::VARUINT7) },
    Field { name: "payload", shape: Shape::Bytes(Extent::Prefixed(Enc::VARUINT32)) },
];
static NAME_SUBSECTION: Shape = Shape::Struct(&NAME_SUBSECTION_FIELDS);

/// Payload grammar of the custom section called `name`.
pub static NAME_SECTION: Shape = Shape::Repeat { extent: Extent::Remaining, elem: &NAME_SUBSECTION };

/// Payload grammar of a known (non-custom) section id.
pub fn section_payload(id: u8) -> Option<&'static Shape> {
    let shape = match id {
        SEC_TYPE => &TYPE_SECTION,
        SEC_IMPORT => &IMPORT_SECTION,
        SEC_FUNCTION => &FUNCTION_SECTION,
        SEC_TABLE => &TABLE_SECTION,
        SEC_MEMORY => &MEMORY_SECTION,
        SEC_GLOBAL => &GLOBAL_SECTION,
        SEC_EXPORT => &EXPORT_SECTION,
        SEC_START => &START_SECTION,
        SEC_ELEMENT => &ELEMENT_SECTION,
        SEC_CODE => &CODE_SECTION,
        SEC_DATA => &DATA_SECTION,
        _ => return None,
    };
    Some(shape)
}

/// Human-readable section name for logs.
pub fn section_name(id: u8) -> &'static str {
    match id {
        SEC_CUSTOM => "custom",
        SEC_TYPE => "type",
        SEC_IMPORT => "import",
        SEC_FUNCTION => "function",
        SEC_TABLE => "table",
        SEC_MEMORY => "memory",
        SEC_GLOBAL => "global",
        SEC_EXPORT => "export",
        SEC_START => "start",
        SEC_ELEMENT => "element",
        SEC_CODE => "code",
        SEC_DATA => "data",
        _ => "unknown",
    }
}
