// -*- mode: rust; -*-
//
// This file is part of `halyard`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! Communication channels and ℤ₂⁶⁴ ring utilities shared by the `remora`
//! protocol suite.

pub mod channel;
mod rand_aes;
pub mod ring;

pub use crate::{
    channel::{AbstractChannel, Channel, SyncChannel, TrackChannel},
    rand_aes::AesRng,
};

#[cfg(unix)]
pub use crate::channel::{unix_channel_pair, UnixChannel};
