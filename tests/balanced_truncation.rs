//! Balanced truncation of a diagonal stable system with known Gramians.
//!
//! For `A = -diag(a)` the Lyapunov Gramians have the closed form
//! `P_ij = b_i b_j / (a_i + a_j)`, `Q_ij = c_i c_j / (a_i + a_j)`; their
//! factors are handed to the reductor through [`PrecomputedGramians`].

use approx::assert_abs_diff_eq;
use faer::{Mat, Side};
use morkit::{
    BtMethod, BtOptions, DenseVectorArray, GramianFactors, GramianType, Indices, LtiSystem, MatrixOperator, MorError,
    Operator, PrecomputedGramians, bt, hankel_singular_values,
};

const N: usize = 8;

fn rates() -> Vec<f64> {
    (0..N).map(|i| 1.0 + 1.5 * i as f64).collect()
}

fn input() -> Vec<f64> {
    (0..N).map(|i| 1.0 + 0.1 * i as f64).collect()
}

fn output() -> Vec<f64> {
    (0..N).map(|i| 1.0 / (1.0 + i as f64)).collect()
}

fn system() -> LtiSystem {
    let a = rates();
    LtiSystem::new(
        MatrixOperator::new(Mat::from_fn(N, N, |i, j| if i == j { -a[i] } else { 0.0 })),
        MatrixOperator::from_vector(&input()),
        MatrixOperator::functional(&output()),
        MatrixOperator::new(Mat::zeros(1, 1)),
        None,
    )
    .unwrap()
}

/// Columns `sqrt(λ_j) u_j` of the eigendecomposition of `G_ij = x_i x_j / (a_i + a_j)`.
fn factor(x: &[f64]) -> DenseVectorArray<f64> {
    let a = rates();
    let g = Mat::from_fn(N, N, |i, j| x[i] * x[j] / (a[i] + a[j]));
    let evd = g.as_ref().self_adjoint_eigen(Side::Lower).unwrap();
    let s = evd.S().column_vector();
    let u = evd.U();
    let cols = Mat::from_fn(N, N, |i, j| u[(i, j)] * s[j].max(0.0).sqrt());
    DenseVectorArray::from_columns(cols.as_ref())
}

fn gramians() -> PrecomputedGramians {
    PrecomputedGramians::new().with(GramianType::Lyap, GramianFactors { cf: factor(&input()), of: factor(&output()) })
}

/// Transfer function of the full system at a real frequency `s > 0`.
fn full_response(s: f64) -> f64 {
    let (a, b, c) = (rates(), input(), output());
    (0..N).map(|i| c[i] * b[i] / (s + a[i])).sum()
}

/// `C_r (s E_r - A_r)^{-1} B_r + D_r`.
fn reduced_response(sys: &LtiSystem, s: f64) -> f64 {
    let n = sys.n();
    let a = sys.a.matrix();
    let pencil = match &sys.e {
        Some(e) => {
            let e = e.matrix();
            Mat::from_fn(n, n, |i, j| s * e[(i, j)] - a[(i, j)])
        }
        None => Mat::from_fn(n, n, |i, j| (if i == j { s } else { 0.0 }) - a[(i, j)]),
    };
    let x = MatrixOperator::new(pencil).apply_inverse(&sys.b.as_vector().unwrap(), &Indices::All).unwrap();
    sys.c.apply(&x, &Indices::All).unwrap().vector(0)[0] + sys.d.matrix()[(0, 0)]
}

#[test]
fn square_root_method_biorthogonalizes_bases() {
    let sys = system();
    let (reduced, rc, data) = bt(&sys, &gramians(), &BtOptions::with_order(3).method(BtMethod::Sr)).unwrap();
    assert_eq!(reduced.n(), 3);
    assert!(reduced.e.is_none());
    assert_eq!(rc.basis.len(), 3);

    let wv = data.w.dot(&data.v, &Indices::All, &Indices::All).unwrap();
    for i in 0..3 {
        for j in 0..3 {
            assert_abs_diff_eq!(wv[(i, j)], if i == j { 1.0 } else { 0.0 }, epsilon = 1e-8);
        }
    }
    assert!(data.sv.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn reduced_response_respects_error_bound() {
    let sys = system();
    for method in [BtMethod::Sr, BtMethod::Bfsr] {
        for r in 1..4 {
            let (reduced, _, data) = bt(&sys, &gramians(), &BtOptions::with_order(r).method(method)).unwrap();
            for s in [0.0, 0.5, 3.0] {
                let err = (full_response(s) - reduced_response(&reduced, s)).abs();
                assert!(err <= data.error_bounds[r - 1] + 1e-10, "r = {r}, s = {s}: {err:e}");
            }
        }
    }
}

#[test]
fn balancing_free_method_keeps_orthonormal_bases() {
    let sys = system();
    let (reduced, _, data) = bt(&sys, &gramians(), &BtOptions::with_order(2)).unwrap();
    assert!(reduced.e.is_some());
    for basis in [&data.v, &data.w] {
        let g = basis.gramian(&Indices::All).unwrap();
        for i in 0..2 {
            for j in 0..2 {
                assert_abs_diff_eq!(g[(i, j)], if i == j { 1.0 } else { 0.0 }, epsilon = 1e-10);
            }
        }
    }
}

#[test]
fn tolerance_selects_the_order() {
    let sys = system();
    let bounds = bt(&sys, &gramians(), &BtOptions::with_order(1)).unwrap().2.error_bounds;
    assert!(bounds.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(*bounds.last().unwrap(), 0.0);

    let (reduced, _, _) = bt(&sys, &gramians(), &BtOptions::with_tolerance(bounds[1])).unwrap();
    assert_eq!(reduced.n(), 2);

    // an explicit order caps the one derived from the tolerance
    let opts = BtOptions { r: Some(1), ..BtOptions::with_tolerance(bounds[2]) };
    assert_eq!(bt(&sys, &gramians(), &opts).unwrap().0.n(), 1);
}

#[test]
fn hankel_singular_values_decay() {
    let sv = hankel_singular_values(&system(), &gramians(), GramianType::Lyap).unwrap();
    assert_eq!(sv.len(), N);
    assert!(sv[0] > 0.0);
    assert!(sv.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn order_is_capped_by_numerical_rank() {
    let sys = system();
    let mut cf = DenseVectorArray::zeros(N, 3);
    cf.replace(&DenseVectorArray::from_rows(&[input()]).unwrap(), &Indices::from(0usize), &Indices::All)
        .unwrap();
    let solver = PrecomputedGramians::new().with(GramianType::Lyap, GramianFactors { cf, of: factor(&output()) });
    let (reduced, _, _) = bt(&sys, &solver, &BtOptions::with_order(2)).unwrap();
    assert_eq!(reduced.n(), 1);
}

#[test]
fn invalid_requests_are_rejected() {
    let sys = system();
    let solver = gramians();
    for opts in [BtOptions::default(), BtOptions::with_order(0), BtOptions::with_order(N)] {
        assert!(matches!(bt(&sys, &solver, &opts), Err(MorError::Value(_))));
    }

    let short = PrecomputedGramians::new().with(
        GramianType::Lyap,
        GramianFactors {
            cf: factor(&input()).copy(&Indices::range(0, 2)).unwrap(),
            of: factor(&output()),
        },
    );
    assert!(matches!(bt(&sys, &short, &BtOptions::with_order(3)), Err(MorError::Value(_))));

    let lqg = BtOptions::with_order(2).typ(GramianType::Lqg);
    assert!(matches!(bt(&sys, &solver, &lqg), Err(MorError::Value(_))));
}
