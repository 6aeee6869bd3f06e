//! Correlated randomness dealt by the helper.
//!
//! Every gadget has an offline bundle with a helper-side `deal` (writes both
//! servers' halves, in role order) and a server-side `receive`. A bundle is
//! consumed by exactly one gadget invocation and never stored across calls;
//! the helper emits bundles in the servers' consumption order, so the streams
//! stay aligned without any framing beyond the vectors themselves.
//!
//! All mask samples come from the signed 8-bit range.

use crate::errors::Error;
use halyard::ring::{self, ShareVec};
use halyard::AbstractChannel;
use rand::{CryptoRng, Rng};

fn small<R: Rng + ?Sized>(rng: &mut R) -> i64 {
    rng.gen_range(-128i64..128)
}

fn small_vec<R: Rng + ?Sized>(rng: &mut R, len: usize) -> ShareVec {
    (0..len).map(|_| small(rng)).collect()
}

fn expect_len(v: &[i64], expected: usize) -> Result<(), Error> {
    if v.len() == expected {
        Ok(())
    } else {
        Err(Error::DimensionMismatch {
            expected,
            got: v.len(),
        })
    }
}

/// One secure-dot-product bundle: random mask vectors `x`, `y` and a scalar
/// `c` with `c₀ + c₁ = ⟨x₀, y₁⟩ + ⟨x₁, y₀⟩`.
pub struct DotTriple {
    pub x: ShareVec,
    pub y: ShareVec,
    pub c: i64,
}

impl DotTriple {
    pub fn deal<C0, C1, RNG>(
        ch0: &mut C0,
        ch1: &mut C1,
        len: usize,
        rng: &mut RNG,
    ) -> Result<(), Error>
    where
        C0: AbstractChannel,
        C1: AbstractChannel,
        RNG: CryptoRng + Rng,
    {
        let x0 = small_vec(rng, len);
        let y0 = small_vec(rng, len);
        let x1 = small_vec(rng, len);
        let y1 = small_vec(rng, len);
        let r = small(rng);

        ch0.write_i64_vec(&x0)?;
        ch0.write_i64_vec(&y0)?;
        ch0.write_i64(ring::dot(&x0, &y1).wrapping_add(r))?;
        ch0.flush()?;

        ch1.write_i64_vec(&x1)?;
        ch1.write_i64_vec(&y1)?;
        ch1.write_i64(ring::dot(&x1, &y0).wrapping_sub(r))?;
        ch1.flush()?;
        Ok(())
    }

    pub fn receive<C: AbstractChannel>(ch: &mut C, len: usize) -> Result<Self, Error> {
        let x = ch.read_i64_vec()?;
        expect_len(&x, len)?;
        let y = ch.read_i64_vec()?;
        expect_len(&y, len)?;
        let c = ch.read_i64()?;
        Ok(Self { x, y, c })
    }
}

/// One secure scalar·vector bundle: mask scalar `a`, mask vector `b` and a
/// vector `c` with `c₀ + c₁ = a₁·b₀ + a₀·b₁`.
pub struct ScalarTriple {
    pub a: i64,
    pub b: ShareVec,
    pub c: ShareVec,
}

impl ScalarTriple {
    pub fn deal<C0, C1, RNG>(
        ch0: &mut C0,
        ch1: &mut C1,
        len: usize,
        rng: &mut RNG,
    ) -> Result<(), Error>
    where
        C0: AbstractChannel,
        C1: AbstractChannel,
        RNG: CryptoRng + Rng,
    {
        let a0 = small(rng);
        let a1 = small(rng);
        let b0 = small_vec(rng, len);
        let b1 = small_vec(rng, len);
        let mask = small_vec(rng, len);

        ch0.write_i64(a0)?;
        ch0.write_i64_vec(&b0)?;
        ch0.write_i64_vec(&ring::add(&ring::scale(&b0, a1), &mask))?;
        ch0.flush()?;

        ch1.write_i64(a1)?;
        ch1.write_i64_vec(&b1)?;
        ch1.write_i64_vec(&ring::sub(&ring::scale(&b1, a0), &mask))?;
        ch1.flush()?;
        Ok(())
    }

    pub fn receive<C: AbstractChannel>(ch: &mut C, len: usize) -> Result<Self, Error> {
        let a = ch.read_i64()?;
        let b = ch.read_i64_vec()?;
        expect_len(&b, len)?;
        let c = ch.read_i64_vec()?;
        expect_len(&c, len)?;
        Ok(Self { a, b, c })
    }
}

/// One oblivious-lookup bundle: a share of a random rotation base `r` and a
/// share of the one-hot vector `e_r`.
pub struct LookupMask {
    pub base: i64,
    pub onehot: ShareVec,
}

impl LookupMask {
    pub fn deal<C0, C1, RNG>(
        ch0: &mut C0,
        ch1: &mut C1,
        items: usize,
        rng: &mut RNG,
    ) -> Result<(), Error>
    where
        C0: AbstractChannel,
        C1: AbstractChannel,
        RNG: CryptoRng + Rng,
    {
        let r = rng.gen_range(0..items as i64);
        let mut onehot = vec![0i64; items];
        onehot[r as usize] = 1;

        let half0 = small_vec(rng, items);
        let half1 = ring::sub(&onehot, &half0);
        let base0 = small(rng);

        ch0.write_i64(base0)?;
        ch0.write_i64_vec(&half0)?;
        ch0.flush()?;

        ch1.write_i64(r.wrapping_sub(base0))?;
        ch1.write_i64_vec(&half1)?;
        ch1.flush()?;
        Ok(())
    }

    pub fn receive<C: AbstractChannel>(ch: &mut C, items: usize) -> Result<Self, Error> {
        let base = ch.read_i64()?;
        let onehot = ch.read_i64_vec()?;
        expect_len(&onehot, items)?;
        Ok(Self { base, onehot })
    }
}
