// -*- mode: rust; -*-
//
// This file is part of `pharos`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! The additive-output DPF flavor.
//!
//! A key pair encodes a function that is some value at one index `j` and 0
//! elsewhere, with full-domain evaluations summing element-wise (wrapping in
//! ℤ₂⁶⁴) to that vector. The XOR-differential at the special leaf is
//! converted into additive form by a final correction word (`fcw`) and a
//! per-key `sign` derived from the final flag.
//!
//! [`gen`] leaves each key with a masked additive *share* of
//! `value + sign₀·s₀ + sign₁·s₁` in its `fcw`. Those shares are what make
//! post-distribution repair possible, but they only cancel once a common
//! FCW is installed on both keys: opening `(Δ₀ − fcw₀) + (Δ₁ − fcw₁)` and
//! substituting it on both sides (see [`DpfKey::with_fcw`]) encodes
//! `Δ₀ + Δ₁ − value`. Keys are therefore always generated with `value = 0`
//! and evaluated only after such a substitution, which is how the online
//! protocol inserts a freshly computed shared update into pre-distributed
//! keys.

use crate::depth_for;
use crate::prg::{Prg, Seed};
use rand::Rng;
use std::io::{self, Read, Write};

/// Per-level correction word, identical in both keys of a pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CorrectionWord<S> {
    /// XOR-correction applied to the advanced seed.
    pub seed: S,
    /// Flag correction when descending left.
    pub flag_left: bool,
    /// Flag correction when descending right.
    pub flag_right: bool,
}

/// One party's DPF key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DpfKey<S> {
    pub s_root: S,
    pub f_root: bool,
    pub cws: Vec<CorrectionWord<S>>,
    pub fcw: i64,
    pub sign: i64,
}

impl<S: Seed> DpfKey<S> {
    /// A copy of this key with the final correction word replaced.
    pub fn with_fcw(&self, fcw: i64) -> Self {
        let mut key = self.clone();
        key.fcw = fcw;
        key
    }
}

/// Generate a key pair pointing at `index` over `domain` leaves, with each
/// key's `fcw` holding its masked share of `value` (see the module docs:
/// install a common FCW before evaluating).
pub fn gen<P: Prg, R: Rng + ?Sized>(
    prg: &P,
    index: u64,
    value: i64,
    domain: u64,
    rng: &mut R,
) -> (DpfKey<P::Seed>, DpfKey<P::Seed>) {
    let depth = depth_for(domain);

    let mut s0 = prg.sample_seed(rng);
    let mut s1 = prg.sample_seed(rng);
    let mut f0 = false;
    let mut f1 = true;

    let mut k0 = DpfKey {
        s_root: s0,
        f_root: f0,
        cws: Vec::with_capacity(depth as usize),
        fcw: 0,
        sign: 0,
    };
    let mut k1 = DpfKey {
        s_root: s1,
        f_root: f1,
        cws: Vec::with_capacity(depth as usize),
        fcw: 0,
        sign: 0,
    };

    for level in 0..depth {
        let c0 = prg.expand(s0);
        let c1 = prg.expand(s1);
        let path_bit = (index >> (depth - 1 - level)) & 1 == 1;

        // The correction word cancels the off-path children and flips the
        // on-path flag difference.
        let cw = if path_bit {
            CorrectionWord {
                seed: c0.left ^ c1.left,
                flag_left: c0.flag_left ^ c1.flag_left,
                flag_right: c0.flag_right ^ c1.flag_right ^ true,
            }
        } else {
            CorrectionWord {
                seed: c0.right ^ c1.right,
                flag_left: c0.flag_left ^ c1.flag_left ^ true,
                flag_right: c0.flag_right ^ c1.flag_right,
            }
        };

        let (mut s0_next, mut f0_next) = if path_bit {
            (c0.right, c0.flag_right)
        } else {
            (c0.left, c0.flag_left)
        };
        let (mut s1_next, mut f1_next) = if path_bit {
            (c1.right, c1.flag_right)
        } else {
            (c1.left, c1.flag_left)
        };

        let on_path_fcw = if path_bit { cw.flag_right } else { cw.flag_left };
        if f0 {
            s0_next = s0_next ^ cw.seed;
            f0_next ^= on_path_fcw;
        }
        if f1 {
            s1_next = s1_next ^ cw.seed;
            f1_next ^= on_path_fcw;
        }

        s0 = s0_next;
        s1 = s1_next;
        f0 = f0_next;
        f1 = f1_next;
        k0.cws.push(cw);
        k1.cws.push(cw);
    }

    k0.sign = if f0 { 1 } else { -1 };
    k1.sign = if f1 { 1 } else { -1 };

    // Convert the seed differential at the special leaf into additive shares
    // of `value`, split by a random mask.
    let mask = rng.gen_range(-128i64..128);
    k0.fcw = mask.wrapping_add(k0.sign.wrapping_mul(s0.to_ring()));
    k1.fcw = value
        .wrapping_sub(mask)
        .wrapping_add(k1.sign.wrapping_mul(s1.to_ring()));

    (k0, k1)
}

/// Evaluate one leaf.
pub fn eval_point<P: Prg>(prg: &P, key: &DpfKey<P::Seed>, index: u64) -> i64 {
    let depth = key.cws.len() as u32;
    let mut s = key.s_root;
    let mut f = key.f_root;

    for level in 0..depth {
        let c = prg.expand(s);
        let path_bit = (index >> (depth - 1 - level)) & 1 == 1;
        let (mut s_next, mut f_next) = if path_bit {
            (c.right, c.flag_right)
        } else {
            (c.left, c.flag_left)
        };
        if f {
            let cw = &key.cws[level as usize];
            s_next = s_next ^ cw.seed;
            f_next ^= if path_bit { cw.flag_right } else { cw.flag_left };
        }
        s = s_next;
        f = f_next;
    }

    let mut value = s.to_ring();
    if f {
        value = value.wrapping_add(key.fcw);
    }
    value.wrapping_mul(key.sign)
}

/// Evaluate every leaf in `0..domain`, in index order.
pub fn eval_full<P: Prg>(prg: &P, key: &DpfKey<P::Seed>, domain: u64) -> Vec<i64> {
    (0..domain).map(|i| eval_point(prg, key, i)).collect()
}

// On-disk/wire layout of the small-seed flavor, little-endian:
// u64 s_root, u8 f_root, i64 fcw, i32 sign, u64 cws_len,
// then cws_len packed { u64 scw, u8 fcw_left, u8 fcw_right } records.
impl DpfKey<u64> {
    pub fn write_into<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.s_root.to_le_bytes())?;
        w.write_all(&[self.f_root as u8])?;
        w.write_all(&self.fcw.to_le_bytes())?;
        w.write_all(&(self.sign as i32).to_le_bytes())?;
        w.write_all(&(self.cws.len() as u64).to_le_bytes())?;
        for cw in self.cws.iter() {
            w.write_all(&cw.seed.to_le_bytes())?;
            w.write_all(&[cw.flag_left as u8, cw.flag_right as u8])?;
        }
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf8 = [0u8; 8];
        let mut buf4 = [0u8; 4];
        let mut buf1 = [0u8; 1];

        r.read_exact(&mut buf8)?;
        let s_root = u64::from_le_bytes(buf8);
        r.read_exact(&mut buf1)?;
        let f_root = buf1[0] != 0;
        r.read_exact(&mut buf8)?;
        let fcw = i64::from_le_bytes(buf8);
        r.read_exact(&mut buf4)?;
        let sign = i32::from_le_bytes(buf4) as i64;
        if sign != 1 && sign != -1 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("bad DPF key sign {}", sign),
            ));
        }
        r.read_exact(&mut buf8)?;
        let cws_len = u64::from_le_bytes(buf8);
        if cws_len > 64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("bad DPF correction-word count {}", cws_len),
            ));
        }
        let mut cws = Vec::with_capacity(cws_len as usize);
        for _ in 0..cws_len {
            r.read_exact(&mut buf8)?;
            let seed = u64::from_le_bytes(buf8);
            let mut flags = [0u8; 2];
            r.read_exact(&mut flags)?;
            cws.push(CorrectionWord {
                seed,
                flag_left: flags[0] != 0,
                flag_right: flags[1] != 0,
            });
        }
        Ok(Self {
            s_root,
            f_root,
            cws,
            fcw,
            sign,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prg::TwisterPrg;
    use rand::thread_rng;

    fn reconstruct(prg: &TwisterPrg, k0: &DpfKey<u64>, k1: &DpfKey<u64>, domain: u64) -> Vec<i64> {
        let e0 = eval_full(prg, k0, domain);
        let e1 = eval_full(prg, k1, domain);
        e0.iter()
            .zip(e1.iter())
            .map(|(a, b)| a.wrapping_add(*b))
            .collect()
    }

    // Install a common FCW encoding `value`, the way the online protocol
    // does before any evaluation.
    fn encode(k0: &DpfKey<u64>, k1: &DpfKey<u64>, value: i64) -> (DpfKey<u64>, DpfKey<u64>) {
        let opened = value.wrapping_sub(k0.fcw).wrapping_sub(k1.fcw);
        (k0.with_fcw(opened), k1.with_fcw(opened))
    }

    #[test]
    fn test_point_function_two_leaves() {
        let prg = TwisterPrg;
        let (k0, k1) = gen(&prg, 0, 0, 2, &mut thread_rng());
        let (k0, k1) = encode(&k0, &k1, 7);
        assert_eq!(reconstruct(&prg, &k0, &k1, 2), vec![7, 0]);
    }

    #[test]
    fn test_point_function_negative_value() {
        let prg = TwisterPrg;
        let (k0, k1) = gen(&prg, 3, 0, 4, &mut thread_rng());
        let (k0, k1) = encode(&k0, &k1, -5);
        assert_eq!(reconstruct(&prg, &k0, &k1, 4), vec![0, 0, 0, -5]);
    }

    #[test]
    fn test_point_function_sweep() {
        let prg = TwisterPrg;
        let mut rng = thread_rng();
        for domain in [2u64, 3, 5, 8, 16, 33] {
            for index in 0..domain {
                let value = rng.gen_range(-1000i64..1000);
                let (k0, k1) = gen(&prg, index, 0, domain, &mut rng);
                let (k0, k1) = encode(&k0, &k1, value);
                let sum = reconstruct(&prg, &k0, &k1, domain);
                for (t, got) in sum.iter().enumerate() {
                    let want = if t as u64 == index { value } else { 0 };
                    assert_eq!(*got, want, "domain {} index {} leaf {}", domain, index, t);
                }
            }
        }
    }

    #[test]
    fn test_correction_words_shared() {
        let prg = TwisterPrg;
        let (k0, k1) = gen(&prg, 11, 3, 16, &mut thread_rng());
        assert_eq!(k0.cws, k1.cws);
        assert_ne!(k0.f_root, k1.f_root);
    }

    // FCW repair: keys generated for value 0, then both FCWs replaced by the
    // opened sum of the masked target shares.
    #[test]
    fn test_fcw_repair() {
        let prg = TwisterPrg;
        let mut rng = thread_rng();
        for domain in [2u64, 5, 8] {
            for index in 0..domain {
                let (k0, k1) = gen(&prg, index, 0, domain, &mut rng);
                let target = rng.gen_range(-10_000i64..10_000);
                let delta0 = rng.gen_range(-10_000i64..10_000);
                let delta1 = target.wrapping_sub(delta0);

                let masked0 = delta0.wrapping_sub(k0.fcw);
                let masked1 = delta1.wrapping_sub(k1.fcw);
                let opened = masked0.wrapping_add(masked1);

                let r0 = k0.with_fcw(opened);
                let r1 = k1.with_fcw(opened);
                let sum = reconstruct(&prg, &r0, &r1, domain);
                for (t, got) in sum.iter().enumerate() {
                    let want = if t as u64 == index { target } else { 0 };
                    assert_eq!(*got, want);
                }
            }
        }
    }

    #[test]
    fn test_key_serialization_roundtrip() {
        let prg = TwisterPrg;
        let (k0, k1) = gen(&prg, 4, 0, 50, &mut thread_rng());
        for key in [k0, k1] {
            let mut bytes = Vec::new();
            key.write_into(&mut bytes).unwrap();
            // 8 + 1 + 8 + 4 + 8 header plus 10 bytes per level
            assert_eq!(bytes.len(), 29 + 10 * key.cws.len());
            let back = DpfKey::read_from(&mut bytes.as_slice()).unwrap();
            assert_eq!(back, key);
        }
    }

    #[test]
    fn test_key_serialization_rejects_garbage() {
        let bytes = vec![0xffu8; 64];
        assert!(DpfKey::read_from(&mut bytes.as_slice()).is_err());
    }
}
