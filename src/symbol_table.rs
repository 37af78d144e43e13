use crate::codegen::Segment;
use crate::error::{CompileError, Result};

/// Declaration category of a name. Each kind has its own index space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolKind {
    Static,
    Field,
    Argument,
    Local,
}

impl SymbolKind {
    /// The VM segment entries of this kind are addressed through. Instance
    /// fields live in the `this` segment.
    pub fn segment(self) -> Segment {
        match self {
            SymbolKind::Static => Segment::Static,
            SymbolKind::Field => Segment::This,
            SymbolKind::Argument => Segment::Argument,
            SymbolKind::Local => Segment::Local,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SymbolEntry {
    pub name: String,
    pub declared_type: String,
    pub kind: SymbolKind,
    pub index: usize,
}

/// Ordered, append-only registry of declared names. One instance spans a
/// whole class compile; a fresh one is created per subroutine and discarded
/// at its end. Names are assumed unique within one table.
#[derive(Debug, Default)]
pub struct SymbolTable {
    entries: Vec<SymbolEntry>,
    static_count: usize,
    field_count: usize,
    argument_count: usize,
    local_count: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&mut self, name: &str, declared_type: &str, kind: SymbolKind) {
        let index = self.next_index(kind);
        self.entries.push(SymbolEntry {
            name: name.to_string(),
            declared_type: declared_type.to_string(),
            kind,
            index,
        });
    }

    fn next_index(&mut self, kind: SymbolKind) -> usize {
        let counter = match kind {
            SymbolKind::Static => &mut self.static_count,
            SymbolKind::Field => &mut self.field_count,
            SymbolKind::Argument => &mut self.argument_count,
            SymbolKind::Local => &mut self.local_count,
        };
        let index = *counter;
        *counter += 1;
        index
    }

    fn get(&self, name: &str) -> Option<&SymbolEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

/// The one place the two-level scope rule lives: the subroutine table is
/// searched first, then the class table. Class-table lookups never chain
/// further. A subroutine-scope name shadows a same-named class field or
/// static for the rest of that subroutine.
pub fn lookup_local_then_outer<'a>(
    local: &'a SymbolTable,
    outer: &'a SymbolTable,
    name: &str,
) -> Result<&'a SymbolEntry> {
    local
        .get(name)
        .or_else(|| outer.get(name))
        .ok_or_else(|| CompileError::UnresolvedSymbol(name.to_string()))
}

pub fn has_entry(local: &SymbolTable, outer: &SymbolTable, name: &str) -> bool {
    lookup_local_then_outer(local, outer, name).is_ok()
}
