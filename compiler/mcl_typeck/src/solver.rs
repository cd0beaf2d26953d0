//! The worklist solver: applies unconditional equalities,
//! prunes `Exclusive` alternatives against the running substitution, and
//! commits the survivor once pruning leaves exactly one.

use mcl_diagnostic::{Diagnostic, ErrorCode, Result};
use mcl_ir::{NodeId, Span};
use mcl_types::{Substitution, Type, TypeConflict};
use rustc_hash::FxHashMap;

use crate::invariant::Invariant;
use crate::table::TypeTable;

pub struct Solver {
    subst: Substitution,
    table: TypeTable,
}

impl Solver {
    pub fn new() -> Self {
        Solver {
            subst: Substitution::new(),
            table: TypeTable::new(),
        }
    }

    pub fn subst(&mut self) -> &mut Substitution {
        &mut self.subst
    }

    pub fn table(&mut self) -> &mut TypeTable {
        &mut self.table
    }

    /// Every node the solve visited, resolved as deeply as the final
    /// substitution allows. A convenience over `table()`/`subst()`
    /// separately: `table().resolved(subst())` doesn't borrow-check from
    /// outside this impl, since the two accessors each claim `&mut self`.
    pub fn resolved_types(&mut self) -> Vec<(NodeId, Type)> {
        self.table.resolved(&mut self.subst)
    }

    /// Runs every invariant to a fixed point. `spans` supplies the source
    /// position for a node id when a conflict or ambiguity needs to be
    /// reported; nodes with no entry fall back to no position.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn solve(&mut self, invariants: Vec<Invariant>, spans: &FxHashMap<NodeId, Span>) -> Result<()> {
        let mut queue: Vec<Invariant> = invariants;
        let mut pending_exclusive: Vec<Vec<Invariant>> = Vec::new();

        loop {
            // Drain the simple worklist, expanding `Conjunction` and
            // stashing `Exclusive` groups for the pruning pass below.
            while let Some(inv) = queue.pop() {
                match inv {
                    Invariant::Conjunction(parts) => queue.extend(parts),
                    Invariant::Exclusive(alts) => pending_exclusive.push(alts),
                    other => apply_simple(&other, &mut self.subst, &mut self.table, spans)?,
                }
            }

            let before = pending_exclusive.len();
            let mut still_pending = Vec::new();
            let mut forced_one = false;
            for alts in pending_exclusive.drain(..) {
                let survivors = prune(&alts, &self.subst, &self.table);
                match survivors.len() {
                    0 => return Err(exclusive_conflict(&alts, spans)),
                    1 => {
                        let (_, trial_subst, trial_table) = survivors.into_iter().next().unwrap_or_else(|| {
                            unreachable!("len() == 1 guarantees exactly one element")
                        });
                        self.subst = trial_subst;
                        self.table = trial_table;
                    }
                    _ if !forced_one => {
                        // Stagnant: nothing else will prune this round.
                        // Force the tie-break so the solve keeps making
                        // progress instead of looping forever.
                        forced_one = true;
                        let (_, trial_subst, trial_table) = tie_break(survivors);
                        self.subst = trial_subst;
                        self.table = trial_table;
                    }
                    _ => still_pending.push(alts),
                }
            }
            pending_exclusive = still_pending;

            if queue.is_empty() && pending_exclusive.len() == before && !forced_one {
                break;
            }
        }

        let unresolved: Vec<NodeId> = self
            .table
            .resolved(&mut self.subst)
            .into_iter()
            .filter(|(_, ty)| !self.subst.is_ground(ty))
            .map(|(id, _)| id)
            .collect();
        if unresolved.is_empty() {
            return Ok(());
        }
        let span = unresolved.first().and_then(|id| spans.get(id).copied());
        let listed = unresolved.iter().map(|id| id.raw().to_string()).collect::<Vec<_>>().join(", ");
        Err(Diagnostic::new(
            ErrorCode::UnifyAmbiguous,
            format!("ambiguous type for node(s): {listed}"),
            span,
        ))
    }
}

impl Default for Solver {
    fn default() -> Self {
        Solver::new()
    }
}

/// Tries every alternative against a cloned `(subst, table)`, keeping only
/// the ones that don't conflict.
fn prune(
    alts: &[Invariant],
    subst: &Substitution,
    table: &TypeTable,
) -> Vec<(usize, Substitution, TypeTable)> {
    let mut survivors = Vec::new();
    for (i, alt) in alts.iter().enumerate() {
        let mut trial_subst = subst.clone();
        let mut trial_table = table.clone();
        if apply(alt, &mut trial_subst, &mut trial_table, &FxHashMap::default()).is_ok() {
            survivors.push((i, trial_subst, trial_table));
        }
    }
    survivors
}

/// Prefer the alternative whose concrete types introduce the smallest
/// number of new bindings; if still tied, the earliest declared.
/// `survivors` is already in declaration order.
fn tie_break(
    survivors: Vec<(usize, Substitution, TypeTable)>,
) -> (usize, Substitution, TypeTable) {
    // `min_by_key` keeps the first minimal element on a tie, and `survivors`
    // is already in declaration order, so this alone gives "fewest new
    // bindings, earliest declared on a tie" per spec.md:154.
    survivors
        .into_iter()
        .min_by_key(|(_, s, _)| s.bound_count())
        .unwrap_or_else(|| unreachable!("tie_break is only called with at least one survivor"))
}

fn apply_simple(
    inv: &Invariant,
    subst: &mut Substitution,
    table: &mut TypeTable,
    spans: &FxHashMap<NodeId, Span>,
) -> Result<()> {
    apply(inv, subst, table, spans)
}

/// Applies one invariant, recursing through `Conjunction` and resolving a
/// nested `Exclusive` to its sole surviving alternative (erroring if zero
/// or more than one survive, since a dry run can't itself force a
/// tie-break the outer `solve` loop hasn't reached yet).
fn apply(
    inv: &Invariant,
    subst: &mut Substitution,
    table: &mut TypeTable,
    spans: &FxHashMap<NodeId, Span>,
) -> Result<()> {
    match inv {
        Invariant::Equals(id, ty) => {
            let slot = table.slot(*id, subst);
            slot.cmp(ty, subst).map_err(|c| conflict_diagnostic(c, span_of(*id, spans)))
        }
        Invariant::Equality(a, b) => {
            let ta = table.slot(*a, subst);
            let tb = table.slot(*b, subst);
            ta.cmp(&tb, subst).map_err(|c| conflict_diagnostic(c, span_of(*a, spans)))
        }
        Invariant::EqualityList(ids) => {
            for pair in ids.windows(2) {
                let [a, b] = pair else {
                    unreachable!("windows(2) always yields two-element slices")
                };
                let ta = table.slot(*a, subst);
                let tb = table.slot(*b, subst);
                ta.cmp(&tb, subst).map_err(|c| conflict_diagnostic(c, span_of(*a, spans)))?;
            }
            Ok(())
        }
        Invariant::EqualityWrapList { list, elem } => {
            let lt = table.slot(*list, subst);
            let et = table.slot(*elem, subst);
            let wanted = Type::List(Box::new(et));
            lt.cmp(&wanted, subst).map_err(|c| conflict_diagnostic(c, span_of(*list, spans)))
        }
        Invariant::EqualityWrapMap { map, key, val } => {
            let mt = table.slot(*map, subst);
            let kt = table.slot(*key, subst);
            let vt = table.slot(*val, subst);
            let wanted = Type::Map(Box::new(kt), Box::new(vt));
            mt.cmp(&wanted, subst).map_err(|c| conflict_diagnostic(c, span_of(*map, spans)))
        }
        Invariant::EqualityWrapStruct { strct, ord, fields } => {
            let st = table.slot(*strct, subst);
            let field_types = fields
                .iter()
                .map(|(name, id)| (*name, table.slot(*id, subst)))
                .collect();
            let wanted = Type::struct_ty(ord.clone(), field_types);
            st.cmp(&wanted, subst).map_err(|c| conflict_diagnostic(c, span_of(*strct, spans)))
        }
        Invariant::EqualityWrapFunc { func, ord, args, out } => {
            let ft = table.slot(*func, subst);
            let arg_types = args
                .iter()
                .map(|(name, id)| (*name, table.slot(*id, subst)))
                .collect();
            let out_t = table.slot(*out, subst);
            let wanted = Type::func(ord.clone(), arg_types, out_t);
            ft.cmp(&wanted, subst).map_err(|c| conflict_diagnostic(c, span_of(*func, spans)))
        }
        Invariant::Conjunction(parts) => {
            for part in parts {
                apply(part, subst, table, spans)?;
            }
            Ok(())
        }
        Invariant::Exclusive(alts) => {
            let survivors = prune(alts, subst, table);
            match survivors.len() {
                1 => {
                    let (_, trial_subst, trial_table) = survivors.into_iter().next().unwrap_or_else(|| {
                        unreachable!("len() == 1 guarantees exactly one element")
                    });
                    *subst = trial_subst;
                    *table = trial_table;
                    Ok(())
                }
                0 => Err(exclusive_conflict(alts, spans)),
                _ => {
                    let (_, trial_subst, trial_table) = tie_break(survivors);
                    *subst = trial_subst;
                    *table = trial_table;
                    Ok(())
                }
            }
        }
        Invariant::Any(id) => {
            table.bind(*id, Type::Variant);
            Ok(())
        }
    }
}

fn span_of(id: NodeId, spans: &FxHashMap<NodeId, Span>) -> Option<Span> {
    spans.get(&id).copied()
}

fn conflict_diagnostic(conflict: TypeConflict, span: Option<Span>) -> Diagnostic {
    Diagnostic::new(ErrorCode::UnifyConflict, conflict.to_string(), span)
}

fn exclusive_conflict(alts: &[Invariant], spans: &FxHashMap<NodeId, Span>) -> Diagnostic {
    let span = alts.first().and_then(|a| first_node(a)).and_then(|id| spans.get(&id).copied());
    Diagnostic::new(
        ErrorCode::UnifyConflict,
        "no alternative is compatible with the types inferred so far",
        span,
    )
}

fn first_node(inv: &Invariant) -> Option<NodeId> {
    match inv {
        Invariant::Equals(id, _) | Invariant::Any(id) => Some(*id),
        Invariant::Equality(a, _) => Some(*a),
        Invariant::EqualityList(ids) => ids.first().copied(),
        Invariant::EqualityWrapList { list, .. } => Some(*list),
        Invariant::EqualityWrapMap { map, .. } => Some(*map),
        Invariant::EqualityWrapStruct { strct, .. } => Some(*strct),
        Invariant::EqualityWrapFunc { func, .. } => Some(*func),
        Invariant::Conjunction(parts) => parts.first().and_then(first_node),
        Invariant::Exclusive(alts) => alts.first().and_then(first_node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> NodeId {
        NodeId::from_raw(n)
    }

    fn solve_ok(solver: &mut Solver, invariants: Vec<Invariant>) {
        solver
            .solve(invariants, &FxHashMap::default())
            .unwrap_or_else(|e| panic!("solve failed: {e}"));
    }

    fn resolved(solver: &mut Solver) -> Vec<(NodeId, Type)> {
        let Solver { subst, table } = solver;
        table.resolved(subst)
    }

    #[test]
    fn equals_binds_a_fresh_node_to_a_concrete_type() {
        let mut solver = Solver::new();
        solve_ok(&mut solver, vec![Invariant::Equals(id(0), Type::Int)]);
        assert_eq!(resolved(&mut solver), vec![(id(0), Type::Int)]);
    }

    #[test]
    fn resolved_types_matches_the_table_subst_pair() {
        let mut solver = Solver::new();
        solve_ok(&mut solver, vec![Invariant::Equals(id(0), Type::Bool)]);
        assert_eq!(solver.resolved_types(), resolved(&mut solver));
    }

    #[test]
    fn equality_unifies_two_nodes() {
        let mut solver = Solver::new();
        solve_ok(
            &mut solver,
            vec![Invariant::Equality(id(0), id(1)), Invariant::Equals(id(1), Type::Str)],
        );
        let map: FxHashMap<_, _> = resolved(&mut solver).into_iter().collect();
        assert_eq!(map.get(&id(0)), Some(&Type::Str));
    }

    #[test]
    fn conflicting_equals_is_unify_conflict() {
        let mut solver = Solver::new();
        let err = solver
            .solve(
                vec![Invariant::Equals(id(0), Type::Int), Invariant::Equals(id(0), Type::Str)],
                &FxHashMap::default(),
            )
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnifyConflict);
    }

    #[test]
    fn exclusive_prunes_to_the_only_compatible_alternative() {
        let mut solver = Solver::new();
        let exclusive = Invariant::Exclusive(vec![
            Invariant::Equals(id(0), Type::Int),
            Invariant::Equals(id(0), Type::Str),
        ]);
        solve_ok(&mut solver, vec![exclusive, Invariant::Equals(id(0), Type::Str)]);
        let map: FxHashMap<_, _> = resolved(&mut solver).into_iter().collect();
        assert_eq!(map.get(&id(0)), Some(&Type::Str));
    }

    #[test]
    fn exclusive_with_no_surviving_alternative_is_unify_conflict() {
        let mut solver = Solver::new();
        let exclusive = Invariant::Exclusive(vec![
            Invariant::Equals(id(0), Type::Int),
            Invariant::Equals(id(0), Type::Bool),
        ]);
        let err = solver
            .solve(vec![exclusive, Invariant::Equals(id(0), Type::Str)], &FxHashMap::default())
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UnifyConflict);
    }

    #[test]
    fn any_accepts_the_variant_top_type() {
        let mut solver = Solver::new();
        solve_ok(&mut solver, vec![Invariant::Any(id(0))]);
        assert_eq!(resolved(&mut solver), vec![(id(0), Type::Variant)]);
    }

    #[test]
    fn unconstrained_node_is_ambiguous() {
        let mut solver = Solver::new();
        // Forces an allocation with no further constraint.
        let Solver { subst, table } = &mut solver;
        table.slot(id(0), subst);
        let err = solver.solve(vec![], &FxHashMap::default()).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnifyAmbiguous);
    }

    #[test]
    fn tie_break_picks_the_true_minimum_bound_count_not_the_first_declared() {
        // Three survivors, declaration order 0, 1, 2, with bound_count()
        // [5, 2, 3] — non-monotonic, so the true minimum (index 1) is not
        // the first-declared survivor (index 0). Regression for picking
        // `survivors[0]`'s count as a baseline instead of the true min.
        let mut subst_a = Substitution::new();
        for _ in 0..5 {
            let v = subst_a.fresh();
            subst_a.bind(v, Type::Int);
        }
        let mut subst_b = Substitution::new();
        for _ in 0..2 {
            let v = subst_b.fresh();
            subst_b.bind(v, Type::Int);
        }
        let mut subst_c = Substitution::new();
        for _ in 0..3 {
            let v = subst_c.fresh();
            subst_c.bind(v, Type::Int);
        }
        let survivors = vec![
            (0usize, subst_a, TypeTable::new()),
            (1usize, subst_b, TypeTable::new()),
            (2usize, subst_c, TypeTable::new()),
        ];
        let (winner, _, _) = tie_break(survivors);
        assert_eq!(winner, 1);
    }

    #[test]
    fn tie_break_prefers_earliest_declared_on_an_exact_tie() {
        let mut subst_a = Substitution::new();
        let v = subst_a.fresh();
        subst_a.bind(v, Type::Int);
        let mut subst_b = Substitution::new();
        let v = subst_b.fresh();
        subst_b.bind(v, Type::Str);
        let survivors =
            vec![(0usize, subst_a, TypeTable::new()), (1usize, subst_b, TypeTable::new())];
        let (winner, _, _) = tie_break(survivors);
        assert_eq!(winner, 0);
    }

    #[test]
    fn equality_wrap_func_binds_call_site_to_signature() {
        let mut solver = Solver::new();
        let sig = Type::func(vec![], FxHashMap::default(), Type::Bool);
        let inv = Invariant::EqualityWrapFunc {
            func: id(0),
            ord: vec![],
            args: vec![],
            out: id(1),
        };
        solve_ok(&mut solver, vec![Invariant::Equals(id(0), sig), inv]);
        let map: FxHashMap<_, _> = resolved(&mut solver).into_iter().collect();
        assert_eq!(map.get(&id(1)), Some(&Type::Bool));
    }
}
