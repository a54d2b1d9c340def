use crate::tables::{IdentId, IdentTable, Item, ModeTable, NodeId, OpCode, ReprTable, Tree};
use crate::{Error, LimitTracker, Parser, Severity};
use std::fmt;

/// The output of a parse: the tree arena, the three semantic tables, the
/// functions table, and the scalar flags a back-end reads, together with any
/// diagnostics.
///
/// Orderings are stable and observable: tree records appear in source order,
/// identifier entries in declaration order, and mode records in first-use
/// order.
pub struct SyntaxTree {
    reprs: ReprTable,
    modes: ModeTable,
    idents: IdentTable,
    tree: Tree,
    functions: Vec<Item>,
    max_displ: Item,
    wasmain: bool,
    errors: Vec<Error>,
    recursion_limit: LimitTracker,
    token_limit: LimitTracker,
}

impl SyntaxTree {
    pub(crate) fn build(parser: Parser<'_>) -> Self {
        let max_displ = parser.idents.max_displ();
        Self {
            reprs: parser.reprs,
            modes: parser.modes,
            idents: parser.idents,
            tree: parser.tree,
            functions: parser.functions,
            max_displ,
            wasmain: parser.wasmain,
            errors: parser.errors,
            recursion_limit: parser.recursion_limit,
            token_limit: parser.lexer.limit_tracker,
        }
    }

    /// Get a reference to the parse's diagnostics.
    pub fn errors(&self) -> &[Error] {
        self.errors.as_ref()
    }

    /// Whether the parse succeeded: no error-severity diagnostics. Warnings
    /// do not fail a parse.
    pub fn ok(&self) -> bool {
        !self
            .errors
            .iter()
            .any(|e| e.severity() == Severity::Error)
    }

    /// The interned identifier spellings.
    pub fn representations(&self) -> &ReprTable {
        &self.reprs
    }

    /// The modes table.
    pub fn modes(&self) -> &ModeTable {
        &self.modes
    }

    /// The identifiers table.
    pub fn identifiers(&self) -> &IdentTable {
        &self.idents
    }

    /// The tree arena.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Function number to tree offset of its definition; `-1` for functions
    /// that were declared but never defined.
    pub fn functions(&self) -> &[Item] {
        &self.functions
    }

    /// The number of functions seen.
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// The widest function frame, in slots.
    pub fn max_displacement(&self) -> Item {
        self.max_displ
    }

    /// Whether a well-formed `main` was defined.
    pub fn has_main(&self) -> bool {
        self.wasmain
    }

    /// The recursion limit and its high-water mark over this parse.
    pub fn recursion_limit(&self) -> LimitTracker {
        self.recursion_limit
    }

    /// The token limit and the number of tokens lexed.
    pub fn token_limit(&self) -> LimitTracker {
        self.token_limit
    }

    fn print(&self, f: &mut fmt::Formatter<'_>, node: NodeId, indent: usize) -> fmt::Result {
        let op = self.tree.op(node);
        let mode = self.tree.mode(node);
        write!(f, "{:indent$}", "")?;

        match op {
            OpCode::VarDecl => {
                let name = self.ident_name(self.tree.payload_arg(node, 0));
                let dims = self.tree.payload_arg(node, 2);
                write!(f, "VarDecl `{name}` {}", self.mode_name(mode))?;
                if dims > 0 {
                    let bounds: Vec<String> = (0..dims as usize)
                        .map(|i| self.tree.payload_arg(node, 3 + i).to_string())
                        .collect();
                    write!(f, " bounds=[{}]", bounds.join(", "))?;
                }
                writeln!(f)?;
            }
            OpCode::FuncDef => {
                let name = self.ident_name(self.tree.payload_arg(node, 0));
                writeln!(f, "FuncDef `{name}` frame={}", self.tree.payload_arg(node, 1))?;
            }
            OpCode::TypeDecl => {
                let name = self.ident_name(self.tree.payload_arg(node, 0));
                writeln!(f, "TypeDecl `{name}` {}", self.mode_name(mode))?;
            }
            OpCode::Ident => {
                let name = self.ident_name(self.tree.payload_arg(node, 0));
                writeln!(f, "Ident `{name}` {}", self.mode_name(mode))?;
            }
            OpCode::Const => {
                writeln!(
                    f,
                    "Const {} {}",
                    self.tree.payload_arg(node, 0),
                    self.mode_name(mode)
                )?;
            }
            OpCode::ConstFloat => {
                writeln!(f, "ConstFloat {} {}", self.tree.float_arg(node, 0), self.mode_name(mode))?;
            }
            OpCode::String => {
                let len = self.tree.payload_arg(node, 0) as usize;
                let text: String = (0..len)
                    .filter_map(|i| {
                        char::from_u32(self.tree.payload_arg(node, 1 + i) as u32)
                    })
                    .collect();
                writeln!(f, "String {text:?} {}", self.mode_name(mode))?;
            }
            OpCode::InitList => {
                writeln!(f, "InitList count={}", self.tree.payload_arg(node, 0))?;
            }
            OpCode::Call => {
                writeln!(
                    f,
                    "Call argc={} {}",
                    self.tree.payload_arg(node, 0),
                    self.mode_name(mode)
                )?;
            }
            OpCode::Member | OpCode::MemberPtr => {
                let name = self.repr_name(self.tree.payload_arg(node, 0));
                writeln!(f, "{op:?} `{name}` {}", self.mode_name(mode))?;
            }
            OpCode::Goto | OpCode::Labeled => {
                let name = self.ident_name(self.tree.payload_arg(node, 0));
                writeln!(f, "{op:?} `{name}`")?;
            }
            OpCode::Case => {
                writeln!(f, "Case {}", self.tree.payload_arg(node, 0))?;
            }
            _ if is_expression(op) => {
                writeln!(f, "{op:?} {}", self.mode_name(mode))?;
            }
            _ => writeln!(f, "{op:?}")?,
        }

        for child in self.tree.children(node) {
            self.print(f, child, indent + 4)?;
        }
        Ok(())
    }

    fn ident_name(&self, id: Item) -> &str {
        self.reprs.text(self.idents.entry(IdentId(id as usize)).repr)
    }

    fn repr_name(&self, repr: Item) -> &str {
        self.reprs
            .text(crate::tables::ReprId(repr as usize))
    }

    fn mode_name(&self, mode: Item) -> String {
        self.modes.display(&self.reprs, mode)
    }
}

fn is_expression(op: OpCode) -> bool {
    op as Item >= OpCode::Ident as Item
}

impl fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for root in self.tree.roots() {
            self.print(f, root, 0)?;
        }
        for error in &self.errors {
            writeln!(f, "- {error:?}")?;
        }
        Ok(())
    }
}
