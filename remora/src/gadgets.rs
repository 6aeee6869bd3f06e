//! Online phases of the secure-computation gadgets.
//!
//! Every gadget consumes one freshly dealt bundle from the helper stream and
//! performs one masked exchange on the peer link. Exchanges follow the
//! role-parity rule: `P0` sends first then receives, `P1` receives first then
//! sends. Both servers must call the same gadgets in the same order; the
//! helper stream has no framing that could recover from a divergence.

use crate::errors::Error;
use crate::triples::{DotTriple, LookupMask, ScalarTriple};
use crate::Role;
use halyard::ring::{self, ShareMat, ShareVec};
use halyard::AbstractChannel;

/// Swap one `i64` with the peer under the role-parity rule.
pub fn exchange_i64<C: AbstractChannel>(peer: &mut C, role: Role, value: i64) -> Result<i64, Error> {
    match role {
        Role::P0 => {
            peer.write_i64(value)?;
            peer.flush()?;
            Ok(peer.read_i64()?)
        }
        Role::P1 => {
            let other = peer.read_i64()?;
            peer.write_i64(value)?;
            peer.flush()?;
            Ok(other)
        }
    }
}

/// Secure dot product of two shared vectors; returns this party's share of
/// `⟨x, y⟩`.
pub fn secure_dot<C, D>(
    peer: &mut C,
    helper: &mut D,
    role: Role,
    x: &[i64],
    y: &[i64],
) -> Result<i64, Error>
where
    C: AbstractChannel,
    D: AbstractChannel,
{
    if x.len() != y.len() {
        return Err(Error::DimensionMismatch {
            expected: x.len(),
            got: y.len(),
        });
    }
    let triple = DotTriple::receive(helper, x.len())?;

    let masked_x = ring::add(x, &triple.x);
    let masked_y = ring::add(y, &triple.y);
    let (peer_x, peer_y) = match role {
        Role::P0 => {
            peer.write_i64_vec(&masked_x)?;
            peer.write_i64_vec(&masked_y)?;
            peer.flush()?;
            (peer.read_i64_vec()?, peer.read_i64_vec()?)
        }
        Role::P1 => {
            let px = peer.read_i64_vec()?;
            let py = peer.read_i64_vec()?;
            peer.write_i64_vec(&masked_x)?;
            peer.write_i64_vec(&masked_y)?;
            peer.flush()?;
            (px, py)
        }
    };
    if peer_x.len() != x.len() || peer_y.len() != y.len() {
        return Err(Error::DimensionMismatch {
            expected: x.len(),
            got: peer_x.len().max(peer_y.len()),
        });
    }

    Ok(ring::dot(x, &ring::add(y, &peer_y))
        .wrapping_sub(ring::dot(&triple.y, &peer_x))
        .wrapping_add(triple.c))
}

/// Secure product of a shared scalar with a shared vector; returns this
/// party's share of `α·v`.
pub fn secure_scalar_vec<C, D>(
    peer: &mut C,
    helper: &mut D,
    role: Role,
    alpha: i64,
    v: &[i64],
) -> Result<ShareVec, Error>
where
    C: AbstractChannel,
    D: AbstractChannel,
{
    let triple = ScalarTriple::receive(helper, v.len())?;

    let masked_alpha = alpha.wrapping_add(triple.a);
    let masked_v = ring::add(v, &triple.b);
    let (peer_alpha, peer_v) = match role {
        Role::P0 => {
            peer.write_i64(masked_alpha)?;
            peer.write_i64_vec(&masked_v)?;
            peer.flush()?;
            (peer.read_i64()?, peer.read_i64_vec()?)
        }
        Role::P1 => {
            let pa = peer.read_i64()?;
            let pv = peer.read_i64_vec()?;
            peer.write_i64(masked_alpha)?;
            peer.write_i64_vec(&masked_v)?;
            peer.flush()?;
            (pa, pv)
        }
    };
    if peer_v.len() != v.len() {
        return Err(Error::DimensionMismatch {
            expected: v.len(),
            got: peer_v.len(),
        });
    }

    Ok(ring::add(
        &ring::sub(
            &ring::scale(&ring::add(v, &peer_v), alpha),
            &ring::scale(&triple.b, peer_alpha),
        ),
        &triple.c,
    ))
}

/// Recover this party's share of `V[j]` given a share of `j`, without
/// revealing `j`: the helper's one-hot mask is rotated into place by the
/// public offset `j − r` and dotted against each column of `V`.
pub fn oblivious_lookup<C, D>(
    peer: &mut C,
    helper: &mut D,
    role: Role,
    index_share: i64,
    items: &ShareMat,
) -> Result<ShareVec, Error>
where
    C: AbstractChannel,
    D: AbstractChannel,
{
    let n = items.len();
    let features = items.first().map(|row| row.len()).unwrap_or(0);
    let mask = LookupMask::receive(helper, n)?;

    let offset = index_share.wrapping_sub(mask.base);
    let peer_offset = exchange_i64(peer, role, offset)?;
    let rotation = ring::reduce_index(offset.wrapping_add(peer_offset), n);
    let selector = ring::rotate_right(&mask.onehot, rotation);

    let mut profile = Vec::with_capacity(features);
    for f in 0..features {
        let column: ShareVec = items.iter().map(|row| row[f]).collect();
        profile.push(secure_dot(peer, helper, role, &column, &selector)?);
    }
    Ok(profile)
}
