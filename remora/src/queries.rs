//! Query records, the binary query files, and the session generator.
//!
//! The two per-server query files are correlated: `user_index` is identical,
//! the two `item_share`s sum to the item index, the correction words are
//! bit-identical, and the root seed / flag / FCW / sign differ. Keys are
//! generated pointing at the item with encoded value 0; the real update
//! value is inserted online via FCW repair.

use crate::config::{self, Params};
use crate::errors::Error;
use crate::{matrix, Role};
use halyard::ring::ShareMat;
use pharos::{point, DpfKey, TwisterPrg};
use rand::{CryptoRng, Rng};
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// One server's view of a query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    pub user_index: u32,
    pub item_share: i64,
    pub key: DpfKey<u64>,
}

impl Query {
    pub fn write_into<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.user_index.to_le_bytes())?;
        w.write_all(&self.item_share.to_le_bytes())?;
        self.key.write_into(w)
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        let mut buf4 = [0u8; 4];
        r.read_exact(&mut buf4)?;
        let user_index = u32::from_le_bytes(buf4);
        let mut buf8 = [0u8; 8];
        r.read_exact(&mut buf8)?;
        let item_share = i64::from_le_bytes(buf8);
        let key = DpfKey::read_from(r)?;
        Ok(Self {
            user_index,
            item_share,
            key,
        })
    }
}

/// Read a whole query file; the record count is implied by the file length.
pub fn read_queries(path: &Path) -> Result<Vec<Query>, Error> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut queries = Vec::new();
    loop {
        // Distinguish a clean end-of-file from a record truncated mid-way.
        let mut first = [0u8; 4];
        let mut filled = 0;
        while filled < first.len() {
            let n = reader.read(&mut first[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled == 0 {
            break;
        }
        if filled < first.len() {
            return Err(Error::Desync(format!(
                "{}: truncated query record",
                path.display()
            )));
        }
        let user_index = u32::from_le_bytes(first);

        let mut buf8 = [0u8; 8];
        reader.read_exact(&mut buf8)?;
        let item_share = i64::from_le_bytes(buf8);
        let key = DpfKey::read_from(&mut reader)?;
        queries.push(Query {
            user_index,
            item_share,
            key,
        });
    }
    Ok(queries)
}

pub fn write_queries(path: &Path, queries: &[Query]) -> Result<(), Error> {
    let mut writer = BufWriter::new(File::create(path)?);
    for query in queries {
        query.write_into(&mut writer)?;
    }
    writer.flush()?;
    Ok(())
}

/// Everything one session needs on disk: both parties' initial matrix shares
/// and query files, plus the cleartext query list for the checker.
pub struct Dataset {
    pub user_shares: [ShareMat; 2],
    pub item_shares: [ShareMat; 2],
    pub queries: [Vec<Query>; 2],
    pub cleartext: Vec<(u32, u32)>,
}

fn split_matrix<R: Rng + CryptoRng>(rows: usize, cols: usize, rng: &mut R) -> (ShareMat, ShareMat) {
    let mut share0 = Vec::with_capacity(rows);
    let mut share1 = Vec::with_capacity(rows);
    for _ in 0..rows {
        let mut row0 = Vec::with_capacity(cols);
        let mut row1 = Vec::with_capacity(cols);
        for _ in 0..cols {
            let value = rng.gen_range(-128i64..128);
            let half = rng.gen_range(-128i64..128);
            row0.push(half);
            row1.push(value.wrapping_sub(half));
        }
        share0.push(row0);
        share1.push(row1);
    }
    (share0, share1)
}

/// Draw fresh matrices and a query stream for the given dimensions.
pub fn generate<R: Rng + CryptoRng>(params: &Params, rng: &mut R) -> Dataset {
    let m = params.users as usize;
    let n = params.items as usize;
    let k = params.features as usize;

    let (u0, u1) = split_matrix(m, k, rng);
    let (v0, v1) = split_matrix(n, k, rng);

    let prg = TwisterPrg;
    let mut queries0 = Vec::with_capacity(params.queries as usize);
    let mut queries1 = Vec::with_capacity(params.queries as usize);
    let mut cleartext = Vec::with_capacity(params.queries as usize);
    for _ in 0..params.queries {
        let user = rng.gen_range(0..params.users);
        let item = rng.gen_range(0..params.items);

        let item_share0 = rng.gen::<i32>() as i64;
        let item_share1 = (item as i64).wrapping_sub(item_share0);
        let (k0, k1) = point::gen(&prg, item as u64, 0, params.items as u64, rng);

        queries0.push(Query {
            user_index: user,
            item_share: item_share0,
            key: k0,
        });
        queries1.push(Query {
            user_index: user,
            item_share: item_share1,
            key: k1,
        });
        cleartext.push((user, item));
    }

    Dataset {
        user_shares: [u0, u1],
        item_shares: [v0, v1],
        queries: [queries0, queries1],
        cleartext,
    }
}

impl Dataset {
    /// Write the session files into `dir` under their conventional names.
    pub fn write_to(&self, dir: &Path) -> Result<(), Error> {
        for role in [Role::P0, Role::P1] {
            let b = role.index();
            matrix::save(&config::user_share_path(dir, role), &self.user_shares[b])?;
            matrix::save(&config::item_share_path(dir, role), &self.item_shares[b])?;
            write_queries(&config::query_path(dir, role), &self.queries[b])?;
        }
        let mut writer = BufWriter::new(File::create(config::cleartext_query_path(dir))?);
        for (user, item) in &self.cleartext {
            writeln!(writer, "{} {}", user, item)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Load the cleartext query list written by the generator.
pub fn read_cleartext_queries(path: &Path, expected: usize) -> Result<Vec<(u32, u32)>, Error> {
    let reader = BufReader::new(File::open(path)?);
    let mut queries = Vec::with_capacity(expected);
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let mut fields = line.split_whitespace();
        let parse = |field: Option<&str>| -> Result<u32, Error> {
            field
                .and_then(|t| t.parse::<u32>().ok())
                .ok_or_else(|| Error::Parse(format!("{}: bad query line {:?}", path.display(), line)))
        };
        let user = parse(fields.next())?;
        let item = parse(fields.next())?;
        queries.push((user, item));
        if queries.len() == expected {
            break;
        }
    }
    if queries.len() != expected {
        return Err(Error::DimensionMismatch {
            expected,
            got: queries.len(),
        });
    }
    Ok(queries)
}
