//! `remora` implements a three-party semi-honest protocol that applies
//! recommender-model updates to additively secret-shared profile matrices.
//!
//! Two compute servers hold shares of a user matrix `U` and an item matrix
//! `V`. For each query `(i, j)`, with `i` public and `j` secret-shared, they
//! jointly compute
//!
//! ```text
//! uᵢ ← uᵢ + vⱼ·(1 − ⟨uᵢ, vⱼ⟩)
//! vⱼ ← vⱼ + uᵢ·(1 − ⟨uᵢ, vⱼ⟩)
//! ```
//!
//! without either server learning `j`, the update vector, or any plaintext
//! profile. A third party (the helper) deals correlated randomness and never
//! sees a share. The item-side write is hidden behind a distributed point
//! function (see the `pharos` crate): every row of `V` is touched, but only
//! row `j` changes.

pub mod check;
pub mod config;
pub mod errors;
pub mod gadgets;
pub mod helper;
pub mod matrix;
pub mod queries;
pub mod server;
pub mod triples;

pub use crate::errors::Error;

use std::fmt;

/// A compute server's protocol role.
///
/// The role fixes the deadlock-avoidance parity on the peer link: `P0` sends
/// first then receives, `P1` receives first then sends, on every exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    P0,
    P1,
}

impl Role {
    /// This role's index; the two indices sum to 1, which the item update
    /// exploits to share the constant 1.
    pub fn index(self) -> usize {
        match self {
            Role::P0 => 0,
            Role::P1 => 1,
        }
    }

    /// The opposite role.
    pub fn peer(self) -> Role {
        match self {
            Role::P0 => Role::P1,
            Role::P1 => Role::P0,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Role::P0 => "P0".fmt(f),
            Role::P1 => "P1".fmt(f),
        }
    }
}

impl TryFrom<u8> for Role {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Error> {
        match value {
            0 => Ok(Role::P0),
            1 => Ok(Role::P1),
            other => Err(Error::InvalidRole(other)),
        }
    }
}
