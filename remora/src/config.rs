//! Session parameters and the data-directory layout.

use crate::Role;
use std::path::{Path, PathBuf};

pub const DEFAULT_USERS: u32 = 10;
pub const DEFAULT_ITEMS: u32 = 50;
pub const DEFAULT_FEATURES: u32 = 3;
pub const DEFAULT_QUERIES: u32 = 10;

/// Where server `P1` listens for `P0`.
pub const DEFAULT_PEER_ADDR: &str = "127.0.0.1:9001";
/// Where the helper listens for both servers.
pub const DEFAULT_HELPER_ADDR: &str = "127.0.0.1:9002";

/// The session dimensions. All three processes must agree on these; a
/// disagreement is not detectable on the wire and produces wrong output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    /// Number of users (rows of U).
    pub users: u32,
    /// Number of items (rows of V).
    pub items: u32,
    /// Number of features (columns of U and V).
    pub features: u32,
    /// Number of queries in the session.
    pub queries: u32,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            users: DEFAULT_USERS,
            items: DEFAULT_ITEMS,
            features: DEFAULT_FEATURES,
            queries: DEFAULT_QUERIES,
        }
    }
}

pub fn user_share_path(dir: &Path, role: Role) -> PathBuf {
    dir.join(format!("U{}.txt", role.index()))
}

pub fn item_share_path(dir: &Path, role: Role) -> PathBuf {
    dir.join(format!("V{}.txt", role.index()))
}

pub fn query_path(dir: &Path, role: Role) -> PathBuf {
    dir.join(format!("queries_p{}.bin", role.index()))
}

pub fn cleartext_query_path(dir: &Path) -> PathBuf {
    dir.join("queries_cleartext.txt")
}

pub fn updated_user_share_path(dir: &Path, role: Role) -> PathBuf {
    dir.join(format!("U{}_updated.txt", role.index()))
}

pub fn updated_item_share_path(dir: &Path, role: Role) -> PathBuf {
    dir.join(format!("V{}_updated.txt", role.index()))
}
