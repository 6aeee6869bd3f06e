// -*- mode: rust; -*-
//
// This file is part of `pharos`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! PRG flavors for the DPF tree expansion.

use rand::{Rng, RngCore};
use rand_mt::Mt19937GenRand32;
use sha2::{Digest, Sha256};
use std::fmt::Debug;
use std::ops::BitXor;

/// A seed type usable in a DPF tree: XOR-able, with a projection into the
/// `i64` share ring for the leaf conversion.
pub trait Seed: Copy + Eq + Default + BitXor<Output = Self> + Debug {
    /// Reinterpret the (low bits of the) seed as a ring element.
    fn to_ring(self) -> i64;
}

impl Seed for u64 {
    fn to_ring(self) -> i64 {
        self as i64
    }
}

impl Seed for u128 {
    fn to_ring(self) -> i64 {
        self as i64
    }
}

/// One PRG stretch: two child seeds and two child flag bits.
#[derive(Clone, Copy, Debug)]
pub struct Expansion<S> {
    pub left: S,
    pub right: S,
    pub flag_left: bool,
    pub flag_right: bool,
}

/// A deterministic stretching function mapping one seed to two child seeds
/// plus two flag bits.
///
/// Key generation and evaluation must run the same `Prg` on both parties;
/// a mismatch produces silently wrong outputs.
pub trait Prg {
    type Seed: Seed;

    /// Expand `seed` into its two children.
    fn expand(&self, seed: Self::Seed) -> Expansion<Self::Seed>;

    /// Sample a root seed from this flavor's seed distribution.
    fn sample_seed<R: Rng + ?Sized>(&self, rng: &mut R) -> Self::Seed;
}

/// The small-seed flavor used by the online item-update DPF: each seed keys a
/// 32-bit Mersenne Twister and the children are single bytes squeezed out of
/// it.
///
/// This is correctness-grade only; an 8-bit child seed space is nowhere near
/// a cryptographic PRG. It is kept for compatibility with the deployed key
/// format. Do not widen it here without changing the key flavor.
#[derive(Clone, Copy, Debug, Default)]
pub struct TwisterPrg;

impl Prg for TwisterPrg {
    type Seed = u64;

    fn expand(&self, seed: u64) -> Expansion<u64> {
        let mut engine = Mt19937GenRand32::new(seed as u32);
        let left = (engine.next_u32() & 0xff) as u64;
        let right = (engine.next_u32() & 0xff) as u64;
        let flag_left = engine.next_u32() % 2 == 1;
        let flag_right = engine.next_u32() % 2 == 1;
        Expansion {
            left,
            right,
            flag_left,
            flag_right,
        }
    }

    fn sample_seed<R: Rng + ?Sized>(&self, rng: &mut R) -> u64 {
        rng.gen::<u8>() as u64
    }
}

/// The 128-bit-seed flavor used by the preparation-time DPF: children are the
/// two halves of SHA-256 over the seed bytes, flags are the low bits of the
/// last two digest bytes.
#[derive(Clone, Copy, Debug, Default)]
pub struct ShaPrg;

impl Prg for ShaPrg {
    type Seed = u128;

    fn expand(&self, seed: u128) -> Expansion<u128> {
        let digest = Sha256::digest(seed.to_be_bytes());
        let left = u128::from_be_bytes(digest[0..16].try_into().expect("16-byte half"));
        let right = u128::from_be_bytes(digest[16..32].try_into().expect("16-byte half"));
        Expansion {
            left,
            right,
            flag_left: digest[30] & 1 == 1,
            flag_right: digest[31] & 1 == 1,
        }
    }

    fn sample_seed<R: Rng + ?Sized>(&self, rng: &mut R) -> u128 {
        rng.gen()
    }
}
