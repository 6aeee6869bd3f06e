// -*- mode: rust; -*-
//
// This file is part of `halyard`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! The ℤ₂⁶⁴ share ring and small vector helpers.
//!
//! Secrets are additively shared as `i64` with wrap-around arithmetic: a
//! secret `x` is held as `(x₀, x₁)` with `x = x₀ + x₁ mod 2⁶⁴`. All helpers
//! here wrap on overflow.

/// One additive share.
pub type Share = i64;
/// A vector of additive shares.
pub type ShareVec = Vec<i64>;
/// A row-indexed matrix of additive shares.
pub type ShareMat = Vec<Vec<i64>>;

/// Element-wise wrapping sum of two share vectors.
pub fn add(a: &[i64], b: &[i64]) -> ShareVec {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| x.wrapping_add(*y))
        .collect()
}

/// Element-wise wrapping difference of two share vectors.
pub fn sub(a: &[i64], b: &[i64]) -> ShareVec {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| x.wrapping_sub(*y))
        .collect()
}

/// Wrapping inner product of two share vectors.
pub fn dot(a: &[i64], b: &[i64]) -> Share {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .fold(0i64, |acc, (x, y)| acc.wrapping_add(x.wrapping_mul(*y)))
}

/// Wrapping scalar multiple of a share vector.
pub fn scale(a: &[i64], scalar: i64) -> ShareVec {
    a.iter().map(|x| x.wrapping_mul(scalar)).collect()
}

/// Rotate a vector to the right by `by` positions: element `i` moves to
/// `(i + by) mod n`.
pub fn rotate_right(v: &[i64], by: usize) -> ShareVec {
    let n = v.len();
    if n == 0 {
        return Vec::new();
    }
    let by = by % n;
    let mut out = vec![0i64; n];
    for (i, x) in v.iter().enumerate() {
        out[(i + by) % n] = *x;
    }
    out
}

/// Reduce a possibly-negative offset into `0..n`.
pub fn reduce_index(offset: i64, n: usize) -> usize {
    debug_assert!(n > 0);
    let n = n as i64;
    (((offset % n) + n) % n) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_sub_wrap() {
        let a = vec![i64::MAX, 1, -3];
        let b = vec![1, i64::MIN, 3];
        assert_eq!(add(&a, &b), vec![i64::MIN, i64::MIN + 1, 0]);
        assert_eq!(sub(&add(&a, &b), &b), a);
    }

    #[test]
    fn test_dot() {
        assert_eq!(dot(&[3, 1], &[2, 2]), 8);
        assert_eq!(dot(&[], &[]), 0);
    }

    #[test]
    fn test_scale() {
        assert_eq!(scale(&[1, -2, 0], -7), vec![-7, 14, 0]);
    }

    #[test]
    fn test_rotate_right() {
        let e3: Vec<i64> = vec![0, 0, 0, 1, 0];
        assert_eq!(rotate_right(&e3, 1), vec![0, 0, 0, 0, 1]);
        assert_eq!(rotate_right(&e3, 2), vec![1, 0, 0, 0, 0]);
        assert_eq!(rotate_right(&e3, 5), e3);
    }

    // Rotation boundary: n = 8, j = 0, base r = 7, so the offset is
    // j - r = -7, which must reduce to 1.
    #[test]
    fn test_reduce_index_negative() {
        assert_eq!(reduce_index(-7, 8), 1);
        let mut e7 = vec![0i64; 8];
        e7[7] = 1;
        let mut e0 = vec![0i64; 8];
        e0[0] = 1;
        assert_eq!(rotate_right(&e7, reduce_index(-7, 8)), e0);
    }

    #[test]
    fn test_reduce_index_large() {
        assert_eq!(reduce_index(17, 8), 1);
        assert_eq!(reduce_index(0, 8), 0);
        assert_eq!(reduce_index(-8, 8), 0);
        assert_eq!(reduce_index(i64::MIN, 2), 0);
    }
}
