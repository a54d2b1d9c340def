use crate::tables::{Item, Mode, ReprId, ReprTable};

/// A handle into the identifiers table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IdentId(pub(crate) usize);

impl IdentId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// What an identifier names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentKind {
    Variable,
    Parameter,
    Function,
    /// A parameter that is itself a function.
    FunctionParameter,
    Label,
    /// A name introduced by `typedef`.
    TypeName,
    StructTag,
}

/// One identifiers-table entry. Entries are never removed; leaving a scope
/// only rewinds which entry a spelling currently means.
#[derive(Clone, Copy, Debug)]
pub struct IdentEntry {
    pub repr: ReprId,
    pub kind: IdentKind,
    pub mode: Mode,
    /// Back-end offset: a frame slot for variables and parameters, a global
    /// slot for globals, the function number for functions, and the tree
    /// offset of the definition for labels (`-1` while unresolved).
    pub displ: Item,
    /// The meaning this entry's spelling had before this entry shadowed it.
    prev_same_repr: Option<Item>,
}

#[derive(Debug)]
struct ScopeMark {
    idents: usize,
    displ: Item,
}

/// The identifiers table: declaration-ordered entries plus the scope stack
/// that controls which entry each spelling currently means.
///
/// Shadowing is a per-spelling stack threaded through the entries: installing
/// an identifier remembers the spelling's previous meaning, and leaving a
/// scope walks the entries made since the scope mark and restores those
/// previous meanings, so unwinding is O(1) per identifier.
#[derive(Debug)]
pub struct IdentTable {
    entries: Vec<IdentEntry>,
    marks: Vec<ScopeMark>,
    /// Next free slot in the active frame, or the global counter at file
    /// scope.
    displ: Item,
    /// Saved global counter while inside a function.
    global_displ: Item,
    /// High-water mark of the current function frame.
    frame_high: Item,
    /// Widest function frame seen so far.
    max_displ: Item,
    in_function: bool,
}

impl IdentTable {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            marks: Vec::new(),
            displ: 0,
            global_displ: 0,
            frame_high: 0,
            max_displ: 0,
            in_function: false,
        }
    }

    /// Install an identifier in the current scope and make it the current
    /// meaning of its spelling. Fails with the existing entry when the
    /// spelling already means something installed in this same scope.
    pub fn install(
        &mut self,
        reprs: &mut ReprTable,
        repr: ReprId,
        kind: IdentKind,
        mode: Mode,
    ) -> Result<IdentId, IdentId> {
        if let Some(existing) = reprs.get_at(repr) {
            let existing = IdentId(existing as usize);
            if existing.0 >= self.scope_floor() {
                return Err(existing);
            }
        }

        let id = IdentId(self.entries.len());
        self.entries.push(IdentEntry {
            repr,
            kind,
            mode,
            displ: 0,
            prev_same_repr: reprs.get_at(repr),
        });
        reprs.set_at(repr, id.0 as Item);
        Ok(id)
    }

    /// Install a label entry. Labels live in their own namespace: they never
    /// become the current meaning of their spelling and never collide with
    /// ordinary identifiers.
    pub fn install_label(&mut self, repr: ReprId, mode: Mode) -> IdentId {
        let id = IdentId(self.entries.len());
        self.entries.push(IdentEntry {
            repr,
            kind: IdentKind::Label,
            mode,
            displ: -1,
            prev_same_repr: None,
        });
        id
    }

    pub fn entry(&self, id: IdentId) -> &IdentEntry {
        &self.entries[id.0]
    }

    pub fn set_displ(&mut self, id: IdentId, displ: Item) {
        self.entries[id.0].displ = displ;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (IdentId, &IdentEntry)> {
        self.entries.iter().enumerate().map(|(i, e)| (IdentId(i), e))
    }

    /// Open a scope: remember the entry count and the running displacement.
    pub fn scope_enter(&mut self) {
        self.marks.push(ScopeMark {
            idents: self.entries.len(),
            displ: self.displ,
        });
    }

    /// Close the innermost scope: restore the previous meaning of every
    /// spelling installed since the matching [`scope_enter`](Self::scope_enter),
    /// then restore the displacement so sibling blocks reuse the same slots.
    pub fn scope_leave(&mut self, reprs: &mut ReprTable) {
        let Some(mark) = self.marks.pop() else {
            return;
        };
        for entry in self.entries[mark.idents..].iter().rev() {
            if entry.kind != IdentKind::Label {
                reprs.restore_at(entry.repr, entry.prev_same_repr);
            }
        }
        self.displ = mark.displ;
    }

    /// Reserve `size` slots in the active frame (or among the globals) and
    /// return the first.
    pub fn alloc(&mut self, size: Item) -> Item {
        let displ = self.displ;
        self.displ += size;
        if self.in_function && self.displ > self.frame_high {
            self.frame_high = self.displ;
        }
        displ
    }

    /// Start a function frame: parameters and locals are laid out from slot
    /// zero, with the global counter parked until the frame ends.
    pub fn enter_frame(&mut self) {
        self.global_displ = self.displ;
        self.displ = 0;
        self.frame_high = 0;
        self.in_function = true;
    }

    /// End a function frame, folding its high-water mark into the widest
    /// frame seen.
    pub fn leave_frame(&mut self) {
        if self.frame_high > self.max_displ {
            self.max_displ = self.frame_high;
        }
        self.displ = self.global_displ;
        self.in_function = false;
    }

    pub fn frame_high(&self) -> Item {
        self.frame_high
    }

    pub fn max_displ(&self) -> Item {
        self.max_displ
    }

    fn scope_floor(&self) -> usize {
        self.marks.last().map_or(0, |m| m.idents)
    }
}

impl Default for IdentTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tables::mode;

    fn tables() -> (ReprTable, IdentTable) {
        (ReprTable::new(), IdentTable::new())
    }

    #[test]
    fn install_makes_current_meaning() {
        let (mut reprs, mut idents) = tables();
        let x = reprs.intern("x");
        let id = idents.install(&mut reprs, x, IdentKind::Variable, mode::INT).unwrap();

        assert_eq!(reprs.get_at(x), Some(id.index() as Item));
        assert_eq!(idents.entry(id).kind, IdentKind::Variable);
        assert_eq!(idents.entry(id).mode, mode::INT);
    }

    #[test]
    fn same_scope_redeclaration_fails() {
        let (mut reprs, mut idents) = tables();
        let x = reprs.intern("x");
        let first = idents.install(&mut reprs, x, IdentKind::Variable, mode::INT).unwrap();

        assert_eq!(
            idents.install(&mut reprs, x, IdentKind::Variable, mode::FLOAT),
            Err(first)
        );
    }

    #[test]
    fn shadowing_restores_outer_meaning() {
        let (mut reprs, mut idents) = tables();
        let x = reprs.intern("x");
        let outer = idents.install(&mut reprs, x, IdentKind::Variable, mode::INT).unwrap();

        idents.scope_enter();
        let inner = idents.install(&mut reprs, x, IdentKind::Variable, mode::FLOAT).unwrap();
        assert_eq!(reprs.get_at(x), Some(inner.index() as Item));
        idents.scope_leave(&mut reprs);

        assert_eq!(reprs.get_at(x), Some(outer.index() as Item));
        // Storage is append-only; only visibility rewinds.
        assert_eq!(idents.len(), 2);
    }

    #[test]
    fn empty_scope_round_trip_is_noop() {
        let (mut reprs, mut idents) = tables();
        let x = reprs.intern("x");
        idents.install(&mut reprs, x, IdentKind::Variable, mode::INT).unwrap();
        let before = reprs.get_at(x);

        idents.scope_enter();
        idents.scope_leave(&mut reprs);

        assert_eq!(reprs.get_at(x), before);
    }

    #[test]
    fn leaving_a_scope_reopens_its_slots() {
        let (mut reprs, mut idents) = tables();
        let a = reprs.intern("a");
        let b = reprs.intern("b");

        idents.enter_frame();
        idents.scope_enter();
        let first = idents.alloc(1);
        idents.install(&mut reprs, a, IdentKind::Variable, mode::INT).unwrap();
        idents.scope_leave(&mut reprs);

        idents.scope_enter();
        let second = idents.alloc(1);
        idents.install(&mut reprs, b, IdentKind::Variable, mode::INT).unwrap();
        idents.scope_leave(&mut reprs);
        idents.leave_frame();

        assert_eq!(first, second);
        assert_eq!(idents.max_displ(), 1);
    }

    #[test]
    fn frames_track_the_widest_function() {
        let (mut reprs, mut idents) = tables();
        let g = reprs.intern("g");
        idents.install(&mut reprs, g, IdentKind::Variable, mode::INT).unwrap();
        let displ = idents.alloc(1);
        idents.set_displ(IdentId(0), displ);

        idents.scope_enter();
        idents.enter_frame();
        idents.alloc(3);
        idents.leave_frame();
        idents.scope_leave(&mut reprs);

        idents.scope_enter();
        idents.enter_frame();
        idents.alloc(2);
        idents.leave_frame();
        idents.scope_leave(&mut reprs);

        assert_eq!(idents.max_displ(), 3);
        // The global counter resumes where it left off.
        assert_eq!(idents.alloc(1), 1);
    }

    #[test]
    fn labels_do_not_collide_with_variables() {
        let (mut reprs, mut idents) = tables();
        let x = reprs.intern("x");
        let var = idents.install(&mut reprs, x, IdentKind::Variable, mode::INT).unwrap();
        let label = idents.install_label(x, mode::VOID);

        assert_ne!(var, label);
        assert_eq!(reprs.get_at(x), Some(var.index() as Item));
        assert_eq!(idents.entry(label).displ, -1);
    }
}
