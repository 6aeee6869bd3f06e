// -*- mode: rust; -*-
//
// This file is part of `halyard`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

use crate::AbstractChannel;
use std::io::Result;

/// Wraps any channel and counts the traffic crossing it, in bytes.
///
/// Sampling the counters between protocol phases (with a [`reset`] in
/// between) yields per-phase communication figures.
///
/// [`reset`]: TrackChannel::reset
pub struct TrackChannel<C> {
    inner: C,
    read: u64,
    written: u64,
}

impl<C: AbstractChannel> TrackChannel<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            read: 0,
            written: 0,
        }
    }

    /// Bytes read so far.
    pub fn bytes_read(&self) -> u64 {
        self.read
    }

    /// Bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Combined traffic in kilobits, both directions.
    pub fn total_kilobits(&self) -> f64 {
        (self.read + self.written) as f64 * 8.0 / 1000.0
    }

    /// Zero the counters.
    pub fn reset(&mut self) {
        self.read = 0;
        self.written = 0;
    }
}

impl<C: AbstractChannel> AbstractChannel for TrackChannel<C> {
    fn read_bytes(&mut self, bytes: &mut [u8]) -> Result<()> {
        self.read += bytes.len() as u64;
        self.inner.read_bytes(bytes)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.written += bytes.len() as u64;
        self.inner.write_bytes(bytes)
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }

    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            read: self.read,
            written: self.written,
        }
    }
}
