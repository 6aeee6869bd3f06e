// -*- mode: rust; -*-
//
// This file is part of `halyard`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

use crate::AbstractChannel;
use std::io::{Read, Result, Write};
use std::sync::{Arc, Mutex};

struct Endpoints<R, W> {
    reader: R,
    writer: W,
}

/// The `Send + Sync` channel variant, for ends that move into spawned
/// protocol threads.
///
/// Both directions sit behind one shared lock, taken per operation. Each
/// protocol party owns its channel end outright and drives it sequentially;
/// clones that read and write the same end concurrently will contend on
/// that lock. Prefer [`crate::Channel`] when the channel stays on one
/// thread.
pub struct SyncChannel<R, W> {
    endpoints: Arc<Mutex<Endpoints<R, W>>>,
}

impl<R: Read, W: Write> SyncChannel<R, W> {
    /// Wrap a reader/writer pair.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            endpoints: Arc::new(Mutex::new(Endpoints { reader, writer })),
        }
    }
}

impl<R: Read, W: Write> AbstractChannel for SyncChannel<R, W> {
    fn read_bytes(&mut self, bytes: &mut [u8]) -> Result<()> {
        self.endpoints.lock().unwrap().reader.read_exact(bytes)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.endpoints.lock().unwrap().writer.write_all(bytes)
    }

    fn flush(&mut self) -> Result<()> {
        self.endpoints.lock().unwrap().writer.flush()
    }

    fn clone(&self) -> Self {
        Self {
            endpoints: self.endpoints.clone(),
        }
    }
}
