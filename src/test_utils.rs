//! Byte-level builders for well-formed modules, shared by unit and
//! integration tests (enable the `test-utils` feature outside this crate).

use crate::primitives::write_uleb;
use crate::schema::wasm;

/// Assembles a module from raw section payloads, computing every section
/// length prefix.
#[derive(Debug, Clone)]
pub struct ModuleBuilder {
    bytes: Vec<u8>,
}

impl Default for ModuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleBuilder {
    pub fn new() -> Self {
        let mut bytes = wasm::MAGIC.to_vec();
        bytes.extend_from_slice(&wasm::VERSION.to_le_bytes());
        ModuleBuilder { bytes }
    }

    /// Appends a section with the given id and raw payload.
    pub fn section(mut self, id: u8, payload: &[u8]) -> Self {
        self.bytes.push(id);
        write_uleb(&mut self.bytes, payload.len() as u64, 0);
        self.bytes.extend_from_slice(payload);
        self
    }

    /// Appends a custom section named `name`.
    pub fn custom_section(self, name: &str, payload: &[u8]) -> Self {
        let mut content = Vec::new();
        write_uleb(&mut content, name.len() as u64, 0);
        content.extend_from_slice(name.as_bytes());
        content.extend_from_slice(payload);
        self.section(wasm::SEC_CUSTOM, &content)
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// Payload of a vector: element count followed by the concatenated elements.
pub fn vec_of(items: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    write_uleb(&mut out, items.len() as u64, 0);
    for item in items {
        out.extend_from_slice(item);
    }
    out
}

/// A length-prefixed name.
pub fn name(s: &str) -> Vec<u8> {
    let mut out = Vec::new();
    write_uleb(&mut out, s.len() as u64, 0);
    out.extend_from_slice(s.as_bytes());
    out
}

/// A function body holding `code` and no locals.
pub fn function_body(code: &[u8]) -> Vec<u8> {
    let mut inner = vec![0x00];
    inner.extend_from_slice(code);
    let mut out = Vec::new();
    write_uleb(&mut out, inner.len() as u64, 0);
    out.extend_from_slice(&inner);
    out
}

/// A small module touching every known section kind plus a `name` custom
/// section and an unregistered custom section.
pub fn sample_module() -> Vec<u8> {
    // (func (param i32) (result i32)), (func)
    let types = vec_of(&[vec![0x60, 0x01, 0x7f, 0x01, 0x7f], vec![0x60, 0x00, 0x00]]);
    let mut import = name("env");
    import.extend(name("f"));
    import.extend([0x00, 0x00]);
    let imports = vec_of(&[import]);
    let functions = vec_of(&[vec![0x00], vec![0x01]]);
    let tables = vec_of(&[vec![0x70, 0x00, 0x02]]);
    let memories = vec_of(&[vec![0x01, 0x01, 0x10]]);
    let globals = vec_of(&[vec![0x7f, 0x01, 0x41, 0x2a, 0x0b]]);
    let mut export = name("main");
    export.extend([0x00, 0x01]);
    let exports = vec_of(&[export]);
    let start = vec![0x02];
    let elements = vec_of(&[vec![0x00, 0x41, 0x00, 0x0b, 0x02, 0x01, 0x02]]);
    let codes = vec_of(&[
        function_body(&[0x20, 0x00, 0x41, 0x01, 0x6a, 0x0b]),
        function_body(&[0x0b]),
    ]);
    let mut segment = vec![0x00, 0x41, 0x08, 0x0b];
    segment.extend(name("hello"));
    let data = vec_of(&[segment]);
    let mut names = vec![0x01];
    names.extend(name("\x01\x00\x04main"));

    ModuleBuilder::new()
        .section(wasm::SEC_TYPE, &types)
        .section(wasm::SEC_IMPORT, &imports)
        .section(wasm::SEC_FUNCTION, &functions)
        .section(wasm::SEC_TABLE, &tables)
        .section(wasm::SEC_MEMORY, &memories)
        .section(wasm::SEC_GLOBAL, &globals)
        .section(wasm::SEC_EXPORT, &exports)
        .section(wasm::SEC_START, &start)
        .section(wasm::SEC_ELEMENT, &elements)
        .section(wasm::SEC_CODE, &codes)
        .section(wasm::SEC_DATA, &data)
        .custom_section("name", &names)
        .custom_section("producers", b"opaque tail")
        .build()
}
