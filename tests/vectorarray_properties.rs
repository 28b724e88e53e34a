//! Property checks for `DenseVectorArray` on random data.
//!
//! Inner products, linear combinations and norms are compared against Faer
//! matrix products of the same data; storage operations (append, remove,
//! moves) are checked for length and content bookkeeping.

use approx::assert_abs_diff_eq;
use faer::Mat;
use morkit::{DenseVectorArray, Indices, MorError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_array(rng: &mut StdRng, dim: usize, len: usize) -> DenseVectorArray<f64> {
    let data: Vec<f64> = (0..dim * len).map(|_| rng.r#gen::<f64>() - 0.5).collect();
    DenseVectorArray::from_data(dim, data).unwrap()
}

#[test]
fn dot_matches_matrix_product() {
    let mut rng = StdRng::seed_from_u64(7);
    let a = random_array(&mut rng, 6, 4);
    let b = random_array(&mut rng, 6, 3);
    let g = a.dot(&b, &Indices::All, &Indices::All).unwrap();
    let expected = &a.to_rows() * &b.to_columns();
    for i in 0..4 {
        for j in 0..3 {
            assert_abs_diff_eq!(g[(i, j)], expected[(i, j)], epsilon = 1e-14);
        }
    }
    let pw = a.pairwise_dot(&b, &Indices::from(vec![0usize, 1, 2]), &Indices::All).unwrap();
    for (i, v) in pw.iter().enumerate() {
        assert_abs_diff_eq!(*v, expected[(i, i)], epsilon = 1e-14);
    }
}

#[test]
fn lincomb_matches_matrix_product() {
    let mut rng = StdRng::seed_from_u64(11);
    let a = random_array(&mut rng, 5, 3);
    let coefficients = Mat::from_fn(2, 3, |i, j| (i + 2 * j) as f64 - 1.5);
    let c = a.lincomb(coefficients.as_ref(), &Indices::All).unwrap();
    let expected = &coefficients * &a.to_rows();
    assert_eq!(c.len(), 2);
    for k in 0..2 {
        for d in 0..5 {
            assert_abs_diff_eq!(c.vector(k)[d], expected[(k, d)], epsilon = 1e-14);
        }
    }
}

#[test]
fn append_remove_and_moves_keep_bookkeeping() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut a = DenseVectorArray::empty(4, 2);
    let mut b = random_array(&mut rng, 4, 5);
    let third = b.vector(3).to_vec();

    a.append(&b, &Indices::from(vec![0usize, 1])).unwrap();
    assert_eq!((a.len(), b.len()), (2, 5));

    a.append_take(&mut b, &Indices::from(3usize)).unwrap();
    assert_eq!((a.len(), b.len()), (3, 4));
    assert_eq!(a.vector(2), third.as_slice());

    a.remove(&Indices::One(-1)).unwrap();
    assert_eq!(a.len(), 2);
    a.remove(&Indices::All).unwrap();
    assert!(a.is_empty());
    assert_eq!(a.dim(), 4);
}

#[test]
fn copies_are_independent() {
    let mut rng = StdRng::seed_from_u64(5);
    let a = random_array(&mut rng, 3, 2);
    let mut c = a.copy(&Indices::All).unwrap();
    c.scal(0.0, &Indices::All).unwrap();
    assert!(a.l2_norm(&Indices::All).unwrap().iter().all(|&n| n > 0.0));
    assert!(c.l2_norm(&Indices::All).unwrap().iter().all(|&n| n == 0.0));
}

#[test]
fn axpy_and_norms() {
    let mut a = DenseVectorArray::from_rows(&[[1.0, 1.0, 1.0]]).unwrap();
    let x = DenseVectorArray::from_rows(&[[1.0, 1.0, 1.0]]).unwrap();
    a.axpy(1.0, &x, &Indices::All, &Indices::All).unwrap();
    assert_eq!(a.vector(0), &[2.0, 2.0, 2.0]);
    assert_abs_diff_eq!(a.l2_norm(&Indices::All).unwrap()[0], 12.0f64.sqrt(), epsilon = 1e-15);
    assert_eq!(a.l1_norm(&Indices::All).unwrap()[0], 6.0);
    let (pos, val) = a.amax(&Indices::All).unwrap();
    assert_eq!((pos[0], val[0]), (0, 2.0));
}

#[test]
fn errors_are_typed() {
    let a = DenseVectorArray::<f64>::zeros(3, 2);
    let b = DenseVectorArray::<f64>::zeros(4, 2);
    assert!(matches!(a.copy(&Indices::from(2usize)), Err(MorError::Index { .. })));
    assert!(matches!(a.copy(&Indices::One(-3)), Err(MorError::Index { .. })));
    assert!(matches!(a.dot(&b, &Indices::All, &Indices::All), Err(MorError::DimensionMismatch(_))));
    assert!(matches!(
        a.pairwise_dot(&a, &Indices::All, &Indices::from(0usize)),
        Err(MorError::DimensionMismatch(_))
    ));
}
