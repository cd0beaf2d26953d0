//! AST node model.
//!
//! Every node carries a [`NodeId`] (see `node_id` module) and a [`Span`].
//! Children are owned directly (`Box`/`Vec`) rather than indexed into a
//! shared arena: unlike the incremental, salsa-backed compiler this crate's
//! style is drawn from, nothing here needs to survive a query re-run or be
//! compared for early-cutoff, so a plain recursive tree is the simpler,
//! equally idiomatic choice. `ensure_sufficient_stack` (see `mcl_stack`,
//! used by `mcl_parse`) guards against the resulting recursion depth.

use crate::{Name, NodeId, Span};

/// A full program: the root of every parse.
#[derive(Clone, Debug)]
pub struct Prog {
    pub id: NodeId,
    pub span: Span,
    pub body: Vec<Stmt>,
}

/// One parameter in a function/class/lambda parameter list.
#[derive(Clone, Debug)]
pub struct Param {
    pub name: Name,
    pub type_ann: Option<TypeAst>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct Stmt {
    pub id: NodeId,
    pub span: Span,
    pub kind: StmtKind,
}

#[derive(Clone, Debug)]
pub enum StmtKind {
    Bind {
        name: Name,
        value: Expr,
    },
    Res {
        /// Set when this node was produced by lowering a `collect K E { .. }`
        /// statement; such resources carry a synthetic
        /// `ResEntry::Field` whose value is a `Call("_collect", ..)`.
        collect: bool,
        kind: Expr,
        name: Expr,
        entries: Vec<ResEntry>,
    },
    /// A `Kind["a"] -> Kind["b"] -> ...` before-edge chain, or a two-element
    /// `A["x"].send -> B["y"].recv` send/recv edge.
    Edge {
        chain: Vec<EdgeHalf>,
    },
    If {
        cond: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Vec<Stmt>,
    },
    For {
        idx: Name,
        val: Name,
        container: Expr,
        body: Vec<Stmt>,
    },
    ForKv {
        key: Name,
        val: Name,
        container: Expr,
        body: Vec<Stmt>,
    },
    FuncDecl {
        name: Name,
        params: Vec<Param>,
        out: Option<TypeAst>,
        body: Expr,
    },
    Class {
        name: Name,
        params: Vec<Param>,
        body: Vec<Stmt>,
    },
    Include {
        name: Name,
        args: Vec<Expr>,
    },
    Import {
        /// The raw import name text; classified lazily by
        /// `mcl_scope::import::parse_import_name` (a pure function of the
        /// string, not re-parsed here).
        raw: String,
    },
    Comment(String),
    /// `panic(e)`; parses as sugar for `if panic(e) { _panic "_panic" {} }`
    /// but is retained as its own node so scope resolution
    /// and graph lowering can recognize and special-case it directly.
    Panic {
        cond: Expr,
    },
}

/// `Before`/`After`/`Notify`/`Listen` resource-body metadata, and the
/// `Meta:key => expr,` / `Meta => struct{..},` forms. The leading `Meta`
/// identifier compares case-insensitively.
#[derive(Clone, Debug)]
pub enum ResEntry {
    Field {
        name: Name,
        cond: Option<Expr>,
        value: Expr,
        span: Span,
    },
    EdgeMeta {
        meta: EdgeMetaKind,
        cond: Option<Expr>,
        half: EdgeHalf,
        span: Span,
    },
    MetaProp {
        key: Name,
        value: Expr,
        span: Span,
    },
    MetaStruct {
        cond: Option<Expr>,
        value: Expr,
        span: Span,
    },
}

impl ResEntry {
    pub fn span(&self) -> Span {
        match self {
            ResEntry::Field { span, .. }
            | ResEntry::EdgeMeta { span, .. }
            | ResEntry::MetaProp { span, .. }
            | ResEntry::MetaStruct { span, .. } => *span,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum EdgeMetaKind {
    Before,
    After,
    Notify,
    Listen,
}

/// One `Kind["name"]` or `Kind["name"].send`/`.recv` link in an edge chain.
#[derive(Clone, Debug)]
pub struct EdgeHalf {
    pub kind: Expr,
    pub name: Expr,
    pub send: Option<Name>,
    pub recv: Option<Name>,
    pub span: Span,
}

#[derive(Clone, Debug)]
pub struct Expr {
    pub id: NodeId,
    pub span: Span,
    pub kind: ExprKind,
    /// Explicit `: T` annotation written in source, if any. The *inferred*
    /// type is never stored on the node itself — see `mcl_typeck::TypeTable`
    /// — so that the AST stays an immutable value produced once by the
    /// parser/interpolator rather than a structure later stages mutate.
    pub type_ann: Option<TypeAst>,
}

#[derive(Clone, Debug)]
pub enum ExprKind {
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Decoded literal text, pre-interpolation. `mcl_interp` rewrites any
    /// `Str` containing `${..}` into a `Call("_operator", "+", ..)` tree;
    /// a `Str` surviving to `mcl_typeck` is a literal with no interpolation.
    Str(String),
    List(Vec<Expr>),
    Map(Vec<MapEntry>),
    Struct(Vec<StructField>),
    Var(Name),
    Call(CallExpr),
    Func(FuncLit),
    If(IfExpr),
}

#[derive(Clone, Debug)]
pub struct MapEntry {
    pub key: Expr,
    pub value: Expr,
}

#[derive(Clone, Debug)]
pub struct StructField {
    pub name: Name,
    pub value: Expr,
}

/// A call to a named function. Binary/unary operators, indexing, the
/// struct-lookup arrow, `in`, and `collect` all lower to `Call` at parse
/// time rather than getting their own `ExprKind` variants.
#[derive(Clone, Debug)]
pub struct CallExpr {
    pub name: Name,
    pub args: Vec<Expr>,
}

#[derive(Clone, Debug)]
pub struct FuncLit {
    pub params: Vec<Param>,
    pub out: Option<TypeAst>,
    pub body: Box<Expr>,
}

#[derive(Clone, Debug)]
pub struct IfExpr {
    pub cond: Box<Expr>,
    pub then_branch: Box<Expr>,
    pub else_branch: Box<Expr>,
}

/// An explicit type annotation as written in source, distinct from the
/// resolved `mcl_types::Type` the unifier produces. Parsed by
/// `mcl_parse::parse_type_ast` from the serialized type grammar, and
/// round-trips through `Display`/parsing without needing a resolved
/// environment (no unification cells appear in source-written annotations
/// except the rare explicit `?N`).
#[derive(Clone, Debug, PartialEq)]
pub enum TypeAst {
    Bool,
    Str,
    Int,
    Float,
    Variant,
    /// Explicit `?N` unification-variable syntax (round-trip only; never
    /// produced by a human, only by re-parsing a printed inferred type).
    UnificationVar(u32),
    List(Box<TypeAst>),
    Map(Box<TypeAst>, Box<TypeAst>),
    Struct(Vec<(Name, TypeAst)>),
    Func(Vec<(Name, TypeAst)>, Box<TypeAst>),
}
