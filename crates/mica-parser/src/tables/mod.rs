//! The flat semantic tables populated during a parse.
//!
//! Every table stores machine-word items in an append-only buffer and hands
//! out small integer handles. Cross-references between tables are handles,
//! never pointers, so the whole front-end output can be walked or serialized
//! as a set of contiguous regions.

pub mod ident;
pub mod interner;
pub mod mode;
pub mod tree;

pub use ident::{IdentEntry, IdentId, IdentKind, IdentTable};
pub use interner::{ReprId, ReprTable};
pub use mode::{Mode, ModeTable};
pub use tree::{Checkpoint, NodeId, OpCode, Tree};

/// The machine-word item type backing every table.
pub type Item = i64;
