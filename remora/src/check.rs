//! Offline correctness check: replay the update rule in cleartext and
//! compare against the reconstructed protocol output mod 2³².

use crate::config::{self, Params};
use crate::errors::Error;
use crate::{matrix, queries, Role};
use halyard::ring::{self, ShareMat};
use log::info;
use std::path::Path;

/// Apply `uᵢ ← uᵢ + vⱼ·(1 − ⟨uᵢ, vⱼ⟩)`, `vⱼ ← vⱼ + uᵢ·(1 − ⟨uᵢ, vⱼ⟩)` for
/// each query, both updates computed from the pre-query state.
pub fn apply_update_rule(users: &mut ShareMat, items: &mut ShareMat, queries: &[(u32, u32)]) {
    for (user, item) in queries {
        let u = users[*user as usize].clone();
        let v = items[*item as usize].clone();
        let delta = 1i64.wrapping_sub(ring::dot(&u, &v));
        users[*user as usize] = ring::add(&u, &ring::scale(&v, delta));
        items[*item as usize] = ring::add(&v, &ring::scale(&u, delta));
    }
}

/// Element-wise wrapping sum of two share matrices.
pub fn reconstruct(a: &ShareMat, b: &ShareMat) -> ShareMat {
    a.iter()
        .zip(b.iter())
        .map(|(ra, rb)| ring::add(ra, rb))
        .collect()
}

/// One disagreeing cell, in the on-disk u32 view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    pub matrix: &'static str,
    pub row: usize,
    pub col: usize,
    pub protocol: u32,
    pub cleartext: u32,
}

/// Compare two matrices mod 2³², collecting every disagreeing cell.
pub fn diff_mod32(
    label: &'static str,
    protocol: &ShareMat,
    cleartext: &ShareMat,
) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();
    for (row, (rp, rc)) in protocol.iter().zip(cleartext.iter()).enumerate() {
        for (col, (p, c)) in rp.iter().zip(rc.iter()).enumerate() {
            if *p as u32 != *c as u32 {
                mismatches.push(Mismatch {
                    matrix: label,
                    row,
                    col,
                    protocol: *p as u32,
                    cleartext: *c as u32,
                });
            }
        }
    }
    mismatches
}

/// Recover the cleartext query list, preferring the generator's text file and
/// falling back to reconstructing `j` from the two binary query files.
pub fn load_queries(dir: &Path, params: &Params) -> Result<Vec<(u32, u32)>, Error> {
    let expected = params.queries as usize;
    let cleartext = config::cleartext_query_path(dir);
    if cleartext.exists() {
        return queries::read_cleartext_queries(&cleartext, expected);
    }

    info!("no cleartext query file, reconstructing from binary query files");
    let q0 = queries::read_queries(&config::query_path(dir, Role::P0))?;
    let q1 = queries::read_queries(&config::query_path(dir, Role::P1))?;
    if q0.len() != expected || q1.len() != expected {
        return Err(Error::DimensionMismatch {
            expected,
            got: q0.len().min(q1.len()),
        });
    }
    q0.iter()
        .zip(q1.iter())
        .map(|(a, b)| {
            if a.user_index != b.user_index {
                return Err(Error::Desync("query files disagree on user index".into()));
            }
            let item = a.item_share.wrapping_add(b.item_share);
            if item < 0 || item >= params.items as i64 {
                return Err(Error::Parse(format!(
                    "reconstructed item index {} out of range",
                    item
                )));
            }
            Ok((a.user_index, item as u32))
        })
        .collect()
}

/// Run the full check against a data directory. Returns the (possibly empty)
/// mismatch list.
pub fn run(dir: &Path, params: &Params) -> Result<Vec<Mismatch>, Error> {
    let m = params.users as usize;
    let n = params.items as usize;
    let k = params.features as usize;

    let u0 = matrix::load(&config::user_share_path(dir, Role::P0), m, k)?;
    let u1 = matrix::load(&config::user_share_path(dir, Role::P1), m, k)?;
    let v0 = matrix::load(&config::item_share_path(dir, Role::P0), n, k)?;
    let v1 = matrix::load(&config::item_share_path(dir, Role::P1), n, k)?;

    let queries = load_queries(dir, params)?;
    for (user, item) in &queries {
        if *user as usize >= m {
            return Err(Error::IndexOutOfRange {
                index: *user as usize,
                bound: m,
            });
        }
        if *item as usize >= n {
            return Err(Error::IndexOutOfRange {
                index: *item as usize,
                bound: n,
            });
        }
    }

    let mut users = reconstruct(&u0, &u1);
    let mut items = reconstruct(&v0, &v1);
    apply_update_rule(&mut users, &mut items, &queries);
    info!("cleartext simulation complete ({} queries)", queries.len());

    let u0 = matrix::load(&config::updated_user_share_path(dir, Role::P0), m, k)?;
    let u1 = matrix::load(&config::updated_user_share_path(dir, Role::P1), m, k)?;
    let v0 = matrix::load(&config::updated_item_share_path(dir, Role::P0), n, k)?;
    let v1 = matrix::load(&config::updated_item_share_path(dir, Role::P1), n, k)?;

    let mut mismatches = diff_mod32("U", &reconstruct(&u0, &u1), &users);
    mismatches.extend(diff_mod32("V", &reconstruct(&v0, &v1), &items));
    Ok(mismatches)
}

#[cfg(test)]
mod tests {
    use super::*;

    // m = 1, n = 4, k = 2, query (0, 2): <u,v> = 8, delta = -7.
    #[test]
    fn test_update_rule_by_hand() {
        let mut users = vec![vec![3i64, 1]];
        let mut items = vec![vec![1i64, 0], vec![0, 1], vec![2, 2], vec![-1, 1]];
        apply_update_rule(&mut users, &mut items, &[(0, 2)]);
        assert_eq!(users, vec![vec![-11, -13]]);
        assert_eq!(
            items,
            vec![vec![1, 0], vec![0, 1], vec![-19, -5], vec![-1, 1]]
        );
    }

    #[test]
    fn test_update_rule_uses_pre_update_state() {
        // Repeating a query must chain: the second update sees the first's
        // output, not the original state.
        let mut users = vec![vec![1i64]];
        let mut items = vec![vec![1i64], vec![0]];
        apply_update_rule(&mut users, &mut items, &[(0, 0), (0, 0)]);
        // After the first: dot = 1, delta = 0, nothing changes.
        assert_eq!(users, vec![vec![1]]);
        assert_eq!(items, vec![vec![1], vec![0]]);
    }

    #[test]
    fn test_diff_mod32() {
        let a = vec![vec![5i64, (1i64 << 32) + 7]];
        let b = vec![vec![5i64, 7]];
        assert!(diff_mod32("U", &a, &b).is_empty());

        let c = vec![vec![5i64, 8]];
        let diffs = diff_mod32("U", &a, &c);
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].row, 0);
        assert_eq!(diffs[0].col, 1);
    }
}
