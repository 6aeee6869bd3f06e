//! The per-server query processor.

use crate::errors::Error;
use crate::gadgets;
use crate::queries::Query;
use crate::Role;
use halyard::ring::{self, ShareMat};
use halyard::AbstractChannel;
use log::{debug, info};
use pharos::{point, TwisterPrg};
use std::time::Instant;

/// Per-query wall-clock times for the two protocol phases.
#[derive(Debug, Default)]
pub struct SessionReport {
    pub user_seconds: Vec<f64>,
    pub item_seconds: Vec<f64>,
}

impl SessionReport {
    pub fn average_user_seconds(&self) -> f64 {
        average(&self.user_seconds)
    }

    pub fn average_item_seconds(&self) -> f64 {
        average(&self.item_seconds)
    }
}

fn average(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        0.0
    } else {
        xs.iter().sum::<f64>() / xs.len() as f64
    }
}

/// One compute server's session state: its role and its shares of U and V.
///
/// Queries are processed strictly sequentially; there is no state between
/// queries beyond the matrices themselves.
pub struct ServerSession {
    role: Role,
    users: ShareMat,
    items: ShareMat,
}

impl ServerSession {
    pub fn new(role: Role, users: ShareMat, items: ShareMat) -> Result<Self, Error> {
        let features = users.first().map(|row| row.len()).unwrap_or(0);
        if features == 0 || items.is_empty() {
            return Err(Error::DimensionMismatch {
                expected: 1,
                got: 0,
            });
        }
        for row in users.iter().chain(items.iter()) {
            if row.len() != features {
                return Err(Error::DimensionMismatch {
                    expected: features,
                    got: row.len(),
                });
            }
        }
        Ok(Self { role, users, items })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn user_shares(&self) -> &ShareMat {
        &self.users
    }

    pub fn item_shares(&self) -> &ShareMat {
        &self.items
    }

    /// Consume the session, yielding the updated (U, V) shares.
    pub fn into_shares(self) -> (ShareMat, ShareMat) {
        (self.users, self.items)
    }

    /// Process the whole query stream.
    pub fn run<C, D>(
        &mut self,
        peer: &mut C,
        helper: &mut D,
        queries: &[Query],
    ) -> Result<SessionReport, Error>
    where
        C: AbstractChannel,
        D: AbstractChannel,
    {
        let mut report = SessionReport::default();
        for (number, query) in queries.iter().enumerate() {
            info!(
                "{}: starting query {} (user {})",
                self.role, number, query.user_index
            );
            let user = query.user_index as usize;
            if user >= self.users.len() {
                return Err(Error::IndexOutOfRange {
                    index: user,
                    bound: self.users.len(),
                });
            }
            // Both phases consume the pre-update user profile.
            let profile = self.users[user].clone();

            let start = Instant::now();
            let item_profile = gadgets::oblivious_lookup(
                peer,
                helper,
                self.role,
                query.item_share,
                &self.items,
            )?;
            let dot = gadgets::secure_dot(peer, helper, self.role, &profile, &item_profile)?;
            let scaled =
                gadgets::secure_scalar_vec(peer, helper, self.role, dot, &item_profile)?;
            self.users[user] = ring::sub(&ring::add(&profile, &item_profile), &scaled);
            report.user_seconds.push(start.elapsed().as_secs_f64());

            let start = Instant::now();
            // The role indices sum to 1, so this is an additive sharing of
            // 1 - <u, v>.
            let complement = (self.role.index() as i64).wrapping_sub(dot);
            let update =
                gadgets::secure_scalar_vec(peer, helper, self.role, complement, &profile)?;
            self.add_hidden_item_update(peer, query, &update)?;
            report.item_seconds.push(start.elapsed().as_secs_f64());

            debug!("{}: finished query {}", self.role, number);
        }
        Ok(report)
    }

    /// Add `update` into row j of V without learning j: per feature, repair
    /// the query's DPF key to encode this party's share of the update
    /// component, expand it over the whole item domain, and add the expanded
    /// column into V.
    fn add_hidden_item_update<C: AbstractChannel>(
        &mut self,
        peer: &mut C,
        query: &Query,
        update: &[i64],
    ) -> Result<(), Error> {
        let prg = TwisterPrg;
        let items = self.items.len() as u64;
        for (feature, component) in update.iter().enumerate() {
            let masked = component.wrapping_sub(query.key.fcw);
            let peer_masked = gadgets::exchange_i64(peer, self.role, masked)?;
            let repaired = query.key.with_fcw(masked.wrapping_add(peer_masked));

            let column = point::eval_full(&prg, &repaired, items);
            for (row, delta) in column.iter().enumerate() {
                self.items[row][feature] = self.items[row][feature].wrapping_add(*delta);
            }
        }
        Ok(())
    }
}
