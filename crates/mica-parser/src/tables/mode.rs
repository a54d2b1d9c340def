use crate::tables::{Item, ReprId, ReprTable};
use std::fmt::Write;

/// A type handle. Negative values are primitive codes; non-negative values
/// index a record in the [`ModeTable`]. Because records are canonicalised on
/// insertion, two modes are type-equal exactly when their handles are equal.
pub type Mode = Item;

pub const INT: Mode = -1;
pub const CHAR: Mode = -2;
pub const FLOAT: Mode = -3;
pub const LONG: Mode = -4;
pub const VOID: Mode = -5;
pub const BOOL: Mode = -6;

/// Tags heading each mode-table record.
pub(crate) mod record {
    use super::Item;

    pub(crate) const FUNCTION: Item = 1001;
    pub(crate) const ARRAY: Item = 1002;
    pub(crate) const POINTER: Item = 1003;
    pub(crate) const STRUCT: Item = 1004;
}

/// The modes table: structural type records stored as length-prefixed tuples
/// of items in one flat buffer.
///
/// Record layouts, addressed by the first payload word:
///
/// ```text
/// function  [FUNCTION, return_mode, arity, param_mode...]
/// array     [ARRAY, element_mode]
/// pointer   [POINTER, pointee_mode]
/// struct    [STRUCT, field_count, (field_mode, field_repr)...]
/// ```
///
/// Each record is preceded by two bookkeeping words, a link to the start of
/// the previously inserted record and the payload length. Insertion walks
/// that chain and returns the handle of an existing bit-equal record, so the
/// table never holds two records with the same structure.
#[derive(Debug)]
pub struct ModeTable {
    items: Vec<Item>,
    /// Start of the most recently inserted record's bookkeeping words.
    last: Option<usize>,
    records: usize,
}

impl ModeTable {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            last: None,
            records: 0,
        }
    }

    /// Add a record, returning the handle of an existing structurally equal
    /// one when present.
    pub fn alloc(&mut self, payload: &[Item]) -> Mode {
        let mut cursor = self.last;
        while let Some(at) = cursor {
            let len = self.items[at + 1] as usize;
            if len == payload.len() && &self.items[at + 2..at + 2 + len] == payload {
                return (at + 2) as Mode;
            }
            cursor = match self.items[at] {
                -1 => None,
                prev => Some(prev as usize),
            };
        }

        let at = self.items.len();
        self.items.push(self.last.map_or(-1, |p| p as Item));
        self.items.push(payload.len() as Item);
        self.items.extend_from_slice(payload);
        self.last = Some(at);
        self.records += 1;
        (at + 2) as Mode
    }

    /// Read one payload word of a record.
    pub fn get(&self, mode: Mode, word: usize) -> Item {
        self.items[mode as usize + word]
    }

    pub fn function(&mut self, return_mode: Mode, params: &[Mode]) -> Mode {
        let mut payload = Vec::with_capacity(3 + params.len());
        payload.push(record::FUNCTION);
        payload.push(return_mode);
        payload.push(params.len() as Item);
        payload.extend_from_slice(params);
        self.alloc(&payload)
    }

    pub fn array(&mut self, element: Mode) -> Mode {
        self.alloc(&[record::ARRAY, element])
    }

    pub fn pointer(&mut self, pointee: Mode) -> Mode {
        self.alloc(&[record::POINTER, pointee])
    }

    pub fn structure(&mut self, fields: &[(Mode, ReprId)]) -> Mode {
        let mut payload = Vec::with_capacity(2 + 2 * fields.len());
        payload.push(record::STRUCT);
        payload.push(fields.len() as Item);
        for &(mode, repr) in fields {
            payload.push(mode);
            payload.push(repr.0 as Item);
        }
        self.alloc(&payload)
    }

    pub fn is_function(&self, mode: Mode) -> bool {
        mode >= 0 && self.get(mode, 0) == record::FUNCTION
    }

    pub fn is_array(&self, mode: Mode) -> bool {
        mode >= 0 && self.get(mode, 0) == record::ARRAY
    }

    pub fn is_pointer(&self, mode: Mode) -> bool {
        mode >= 0 && self.get(mode, 0) == record::POINTER
    }

    pub fn is_struct(&self, mode: Mode) -> bool {
        mode >= 0 && self.get(mode, 0) == record::STRUCT
    }

    pub fn return_mode(&self, function: Mode) -> Mode {
        self.get(function, 1)
    }

    pub fn arity(&self, function: Mode) -> usize {
        self.get(function, 2) as usize
    }

    pub fn param(&self, function: Mode, index: usize) -> Mode {
        self.get(function, 3 + index)
    }

    pub fn element(&self, array: Mode) -> Mode {
        self.get(array, 1)
    }

    pub fn pointee(&self, pointer: Mode) -> Mode {
        self.get(pointer, 1)
    }

    pub fn field_count(&self, structure: Mode) -> usize {
        self.get(structure, 1) as usize
    }

    pub fn field_mode(&self, structure: Mode, index: usize) -> Mode {
        self.get(structure, 2 + 2 * index)
    }

    pub fn field_name(&self, structure: Mode, index: usize) -> ReprId {
        ReprId(self.get(structure, 3 + 2 * index) as usize)
    }

    /// The number of words a value of this mode occupies in a frame.
    /// Arrays have reference semantics and take one word, like scalars and
    /// pointers; a struct takes the sum of its fields.
    pub fn size_of(&self, mode: Mode) -> Item {
        if self.is_struct(mode) {
            (0..self.field_count(mode))
                .map(|i| self.size_of(self.field_mode(mode, i)))
                .sum()
        } else {
            1
        }
    }

    /// The number of records in the table.
    pub fn len(&self) -> usize {
        self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    /// Render a mode for diagnostics and table dumps.
    pub fn display(&self, reprs: &ReprTable, mode: Mode) -> String {
        let mut out = String::new();
        self.write_mode(reprs, mode, &mut out);
        out
    }

    fn write_mode(&self, reprs: &ReprTable, mode: Mode, out: &mut String) {
        match mode {
            INT => out.push_str("int"),
            CHAR => out.push_str("char"),
            FLOAT => out.push_str("float"),
            LONG => out.push_str("long"),
            VOID => out.push_str("void"),
            BOOL => out.push_str("bool"),
            _ if self.is_pointer(mode) => {
                out.push_str("ptr(");
                self.write_mode(reprs, self.pointee(mode), out);
                out.push(')');
            }
            _ if self.is_array(mode) => {
                out.push_str("arr(");
                self.write_mode(reprs, self.element(mode), out);
                out.push(')');
            }
            _ if self.is_function(mode) => {
                out.push_str("fn(");
                self.write_mode(reprs, self.return_mode(mode), out);
                for i in 0..self.arity(mode) {
                    out.push_str(if i == 0 { "; " } else { ", " });
                    self.write_mode(reprs, self.param(mode, i), out);
                }
                out.push(')');
            }
            _ if self.is_struct(mode) => {
                out.push_str("struct{");
                for i in 0..self.field_count(mode) {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "{}: ", reprs.text(self.field_name(mode, i)));
                    self.write_mode(reprs, self.field_mode(mode, i), out);
                }
                out.push('}');
            }
            _ => {
                let _ = write!(out, "mode#{mode}");
            }
        }
    }
}

impl Default for ModeTable {
    fn default() -> Self {
        Self::new()
    }
}
