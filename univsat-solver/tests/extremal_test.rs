//! Extremal search behaviour: aborts, scope discipline and witness pinning

mod common;

use common::{big, poly, ExhaustiveBackend, ValueOrder};
use univsat_solver::{
    bitblast_factory, BitblastSolver, CheckResult, SolverConfig, UnivariateSolver,
    UnivariateSolverFactory, EXTREMAL_DEP,
};

fn mock_solver(width: u32, backend: ExhaustiveBackend) -> BitblastSolver<ExhaustiveBackend> {
    BitblastSolver::with_backend(width, backend, SolverConfig::default()).unwrap()
}

#[test]
fn unknown_aborts_and_restores_scope() {
    let backend = ExhaustiveBackend::new(ValueOrder::Ascending).with_unknown_after(2);
    let mut s = mock_solver(4, backend);
    s.push();
    s.add_uge_const(&big(5), false, 1);

    // start 0101: check 1 finds 5, check 2 refutes bit 2 clear, check 3 is unknown
    assert_eq!(s.find_min(), None);
    assert_eq!(s.scope_level(), 1);
    assert_eq!(s.backend().num_scopes(), 1);
    assert_eq!(s.num_assertions(), 1);
    assert_eq!(s.backend().checks, 3);

    s.pop(1);
    assert_eq!(s.scope_level(), 0);
    assert_eq!(s.num_assertions(), 0);
}

#[test]
fn unknown_on_first_check_returns_none() {
    let backend = ExhaustiveBackend::new(ValueOrder::Ascending).with_unknown_after(0);
    let mut s = mock_solver(4, backend);
    s.add_ule_const(&big(3), false, 1);
    assert_eq!(s.find_max(), None);
    assert_eq!(s.scope_level(), 0);
}

#[test]
fn search_leaves_constraints_untouched() {
    let mut s = mock_solver(6, ExhaustiveBackend::new(ValueOrder::Scrambled));
    s.add_uge_const(&big(9), false, 1);
    s.add_ule_const(&big(50), false, 2);
    assert_eq!(s.check(), CheckResult::Sat);
    let before = s.model();

    assert_eq!(s.find_max(), Some(big(50)));
    assert_eq!(s.find_min(), Some(big(9)));
    assert_eq!(s.num_assertions(), 2);
    assert_eq!(s.scope_level(), 0);
    assert_eq!(s.model(), before);

    // the constraint set can still be extended below the extremum
    s.add_ule_const(&big(20), false, 3);
    assert_eq!(s.find_max(), Some(big(20)));
    assert_eq!(s.stats().extremal_searches, 3);
}

#[test]
fn search_checks_when_nothing_is_known() {
    let mut s = mock_solver(5, ExhaustiveBackend::new(ValueOrder::Descending));
    s.add_ule(&poly(&[0, 2]), &poly(&[10]), false, 1);
    // no explicit check: the search runs one itself
    let min = s.find_min().unwrap();
    assert_eq!(min, big(0));
    assert!(s.backend().checks >= 1);
}

#[test]
fn search_on_unsat_returns_none() {
    let mut s = mock_solver(4, ExhaustiveBackend::new(ValueOrder::Ascending));
    s.add_ule_const(&big(2), false, 1);
    s.add_uge_const(&big(3), false, 2);
    assert_eq!(s.find_min(), None);
    assert_eq!(s.find_max(), None);
    assert_eq!(s.scope_level(), 0);
}

#[test]
fn pinned_witness_labels_search_bits() {
    let config = SolverConfig::new().with_pin_extremal_witness(true);
    let backend = ExhaustiveBackend::new(ValueOrder::Descending);
    let mut s = BitblastSolver::with_backend(4, backend, config).unwrap();
    s.add_uge_const(&big(4), false, 9);
    assert_eq!(s.find_min(), Some(big(4)));
    assert_eq!(s.model(), big(4));

    s.add_ule_const(&big(3), false, 5);
    assert_eq!(s.check(), CheckResult::Unsat);
    assert_eq!(s.unsat_core(), vec![EXTREMAL_DEP, 5, 9]);
}

#[test]
fn witness_bits_replay_satisfiably() {
    let mut s = bitblast_factory().create(8).unwrap();
    s.add_ule(&poly(&[7, 0, 1]), &poly(&[0, 5]), false, 1);
    s.add_uge_const(&big(3), false, 2);

    for find_max in [false, true] {
        let witness = if find_max { s.find_max() } else { s.find_min() };
        let witness = witness.unwrap();
        s.push();
        for k in 0..8 {
            s.add_bit(k, !witness.bit(u64::from(k)), 3);
        }
        assert_eq!(s.check(), CheckResult::Sat);
        assert_eq!(s.model(), witness);
        s.pop(1);
    }
}

#[test]
fn search_after_pop_uses_outer_constraints() {
    let mut s = bitblast_factory().create(8).unwrap();
    s.add_ule_const(&big(100), false, 1);
    s.push();
    s.add_uge_const(&big(60), false, 2);
    assert_eq!(s.find_min(), Some(big(60)));
    s.pop(1);
    assert_eq!(s.find_min(), Some(big(0)));
    assert_eq!(s.find_max(), Some(big(100)));
}
