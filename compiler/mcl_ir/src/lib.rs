//! Core IR types shared by every stage of the compiler: interned names,
//! source spans, the token model, the AST node model, and a walking
//! visitor over it.
//!
//! # Design
//!
//! - Identifiers are interned to `Name` (a `u32`) so later stages compare
//!   identifiers in O(1) rather than re-hashing strings.
//! - Every AST node carries a [`NodeId`] assigned at parse time, used in
//!   place of pointer identity for recursive-`include` detection (see
//!   `node_id` module docs).
//! - The AST itself is an ordinary recursive tree (`Box`/`Vec` children),
//!   not an arena of indices — this core has no incremental-recomputation
//!   requirement to justify that extra indirection.

pub mod ast;
mod name;
mod node_id;
mod span;
mod token;
pub mod visitor;

pub use ast::{
    CallExpr, EdgeHalf, EdgeMetaKind, Expr, ExprKind, FuncLit, IfExpr, MapEntry, Param, Prog,
    ResEntry, Stmt, StmtKind, StructField, TypeAst,
};
pub use name::{Name, StringInterner};
pub use node_id::{NodeId, NodeIdGen};
pub use span::{MultiFileMap, Pos, Span};
pub use token::{Token, TokenKind, TokenList};
pub use visitor::Visitor;
