// -*- mode: rust; -*-
//
// This file is part of `pharos`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! The 128-bit-seed, XOR-output DPF flavor used at preparation time.
//!
//! Unlike [`crate::point`], correction words here carry one seed correction
//! per side (the on-path side is zero), outputs are XOR shares of a `u64`,
//! and there is no post-distribution repair: the final correction word is
//! fixed at generation.

use crate::depth_for;
use crate::prg::Prg;
use rand::Rng;

/// Per-level correction word, identical in both keys of a pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct XorCorrectionWord {
    pub seed_left: u128,
    pub seed_right: u128,
    pub flag_left: bool,
    pub flag_right: bool,
}

/// One party's key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XorDpfKey {
    pub s_root: u128,
    pub f_root: bool,
    pub cws: Vec<XorCorrectionWord>,
    pub final_cw: u64,
}

/// Generate a key pair encoding `value` at `index` over `domain` leaves.
pub fn gen<P, R>(prg: &P, index: u64, value: u64, domain: u64, rng: &mut R) -> (XorDpfKey, XorDpfKey)
where
    P: Prg<Seed = u128>,
    R: Rng + ?Sized,
{
    let depth = depth_for(domain);

    let mut s0 = prg.sample_seed(rng);
    let mut s1 = prg.sample_seed(rng);
    let mut f0 = true;
    let mut f1 = false;

    let mut k0 = XorDpfKey {
        s_root: s0,
        f_root: f0,
        cws: Vec::with_capacity(depth as usize),
        final_cw: 0,
    };
    let mut k1 = XorDpfKey {
        s_root: s1,
        f_root: f1,
        cws: Vec::with_capacity(depth as usize),
        final_cw: 0,
    };

    for level in 0..depth {
        let c0 = prg.expand(s0);
        let c1 = prg.expand(s1);
        let path_bit = (index >> (depth - 1 - level)) & 1 == 1;

        // Zero the on-path seed correction; cancel the off-path side and
        // flip the on-path flag difference.
        let cw = if path_bit {
            XorCorrectionWord {
                seed_left: c0.left ^ c1.left,
                seed_right: 0,
                flag_left: c0.flag_left ^ c1.flag_left,
                flag_right: c0.flag_right ^ c1.flag_right ^ true,
            }
        } else {
            XorCorrectionWord {
                seed_left: 0,
                seed_right: c0.right ^ c1.right,
                flag_left: c0.flag_left ^ c1.flag_left ^ true,
                flag_right: c0.flag_right ^ c1.flag_right,
            }
        };
        k0.cws.push(cw);
        k1.cws.push(cw);

        let (s0_path, t0_path) = if path_bit {
            (c0.right, c0.flag_right)
        } else {
            (c0.left, c0.flag_left)
        };
        let (s1_path, t1_path) = if path_bit {
            (c1.right, c1.flag_right)
        } else {
            (c1.left, c1.flag_left)
        };
        let (s_cw_keep, t_cw_keep) = if path_bit {
            (cw.seed_right, cw.flag_right)
        } else {
            (cw.seed_left, cw.flag_left)
        };

        s0 = s0_path ^ if f0 { s_cw_keep } else { 0 };
        s1 = s1_path ^ if f1 { s_cw_keep } else { 0 };
        f0 = t0_path ^ (f0 & t_cw_keep);
        f1 = t1_path ^ (f1 & t_cw_keep);
    }

    let final_cw = value ^ (s0 as u64) ^ (s1 as u64);
    k0.final_cw = final_cw;
    k1.final_cw = final_cw;

    (k0, k1)
}

/// Evaluate one leaf.
pub fn eval_point<P: Prg<Seed = u128>>(prg: &P, key: &XorDpfKey, index: u64) -> u64 {
    let depth = key.cws.len() as u32;
    let mut s = key.s_root;
    let mut f = key.f_root;

    for level in 0..depth {
        let c = prg.expand(s);
        let cw = &key.cws[level as usize];
        let path_bit = (index >> (depth - 1 - level)) & 1 == 1;
        let (s_path, t_path, s_cw, t_cw) = if path_bit {
            (c.right, c.flag_right, cw.seed_right, cw.flag_right)
        } else {
            (c.left, c.flag_left, cw.seed_left, cw.flag_left)
        };
        s = s_path ^ if f { s_cw } else { 0 };
        f = t_path ^ (f & t_cw);
    }

    let mut value = s as u64;
    if f {
        value ^= key.final_cw;
    }
    value
}

/// Evaluate every leaf in `0..domain`, in index order.
pub fn eval_full<P: Prg<Seed = u128>>(prg: &P, key: &XorDpfKey, domain: u64) -> Vec<u64> {
    (0..domain).map(|i| eval_point(prg, key, i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prg::ShaPrg;
    use rand::thread_rng;

    #[test]
    fn test_xor_point_function() {
        let prg = ShaPrg;
        let mut rng = thread_rng();
        for domain in [2u64, 8, 32, 128] {
            let index = rng.gen_range(0..domain);
            let value: u64 = rng.gen();
            let (k0, k1) = gen(&prg, index, value, domain, &mut rng);
            let e0 = eval_full(&prg, &k0, domain);
            let e1 = eval_full(&prg, &k1, domain);
            for t in 0..domain as usize {
                let want = if t as u64 == index { value } else { 0 };
                assert_eq!(e0[t] ^ e1[t], want, "domain {} leaf {}", domain, t);
            }
        }
    }

    #[test]
    fn test_xor_shares_look_independent() {
        let prg = ShaPrg;
        let (k0, k1) = gen(&prg, 3, 0xfeed_f00d, 16, &mut thread_rng());
        let e0 = eval_full(&prg, &k0, 16);
        let e1 = eval_full(&prg, &k1, 16);
        // The special leaf's shares are nonzero on both sides.
        assert_ne!(e0[3], 0);
        assert_ne!(e1[3], 0);
        assert_eq!(k0.cws, k1.cws);
    }
}
