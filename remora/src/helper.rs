//! The correlated-randomness helper.
//!
//! Stateless per query: nothing survives from one deal to the next, and the
//! helper never sees a share. Its only session input is the dimensions.

use crate::config::Params;
use crate::errors::Error;
use crate::triples::{DotTriple, LookupMask, ScalarTriple};
use crate::Role;
use halyard::AbstractChannel;
use log::{debug, info};
use rand::{CryptoRng, Rng};

/// Read the one-byte role a connecting server announces.
pub fn read_role<C: AbstractChannel>(ch: &mut C) -> Result<Role, Error> {
    Role::try_from(ch.read_u8()?)
}

/// Deal every query's correlated randomness, in exactly the order the
/// servers consume it:
///
/// 1. one oblivious-lookup bundle,
/// 2. `k` dot triples of length `n` (the lookup's column products),
/// 3. one dot triple of length `k` (`⟨u, v⟩`),
/// 4. two scalar·vector triples of length `k` (`v·dot` and `u·(1−dot)`).
pub fn serve<C0, C1, RNG>(
    ch0: &mut C0,
    ch1: &mut C1,
    params: &Params,
    rng: &mut RNG,
) -> Result<(), Error>
where
    C0: AbstractChannel,
    C1: AbstractChannel,
    RNG: CryptoRng + Rng,
{
    let items = params.items as usize;
    let features = params.features as usize;

    info!("dealing materials for {} queries", params.queries);
    for number in 0..params.queries {
        debug!("dealing materials for query {}", number);
        LookupMask::deal(ch0, ch1, items, rng)?;
        for _ in 0..features {
            DotTriple::deal(ch0, ch1, items, rng)?;
        }
        DotTriple::deal(ch0, ch1, features, rng)?;
        ScalarTriple::deal(ch0, ch1, features, rng)?;
        ScalarTriple::deal(ch0, ch1, features, rng)?;
    }
    info!("helper session finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triples;
    use halyard::{unix_channel_pair, AesRng};
    use std::thread;

    // The dealt stream must parse as exactly the bundles the servers will
    // ask for, in order, with nothing left over.
    #[test]
    fn test_deal_order_matches_consumption_order() {
        let params = Params {
            users: 2,
            items: 4,
            features: 3,
            queries: 2,
        };
        let (mut d0, mut r0) = unix_channel_pair();
        let (mut d1, mut r1) = unix_channel_pair();
        let dealer = thread::spawn(move || {
            serve(&mut d0, &mut d1, &params, &mut AesRng::new()).unwrap();
        });

        for ch in [&mut r0, &mut r1] {
            for _ in 0..params.queries {
                triples::LookupMask::receive(ch, 4).unwrap();
                for _ in 0..3 {
                    triples::DotTriple::receive(ch, 4).unwrap();
                }
                triples::DotTriple::receive(ch, 3).unwrap();
                triples::ScalarTriple::receive(ch, 3).unwrap();
                triples::ScalarTriple::receive(ch, 3).unwrap();
            }
        }
        dealer.join().unwrap();
    }

    #[test]
    fn test_read_role() {
        let (mut a, mut b) = unix_channel_pair();
        a.write_u8(1).unwrap();
        a.flush().unwrap();
        assert_eq!(read_role(&mut b).unwrap(), Role::P1);

        a.write_u8(7).unwrap();
        a.flush().unwrap();
        assert!(matches!(read_role(&mut b), Err(Error::InvalidRole(7))));
    }
}
