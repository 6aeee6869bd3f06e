// -*- mode: rust; -*-
//
// This file is part of `halyard`.
// Copyright © 2019 Galois, Inc.
// See LICENSE for licensing information.

//! Fixed-key AES random number generator.

use aes::cipher::{generic_array::GenericArray, BlockEncrypt, KeyInit};
use aes::Aes128;
use rand::{CryptoRng, Error, RngCore, SeedableRng};

/// Implementation of a random number generator based on AES-128 in counter
/// mode, with the seed as the key and the counter starting at zero.
#[derive(Clone)]
pub struct AesRng {
    cipher: Aes128,
    counter: u128,
    buffer: [u8; 16],
    used: usize,
}

impl AesRng {
    /// Create a new random number generator using a random seed from
    /// `rand::random`.
    pub fn new() -> Self {
        let seed = rand::random::<[u8; 16]>();
        Self::from_seed(seed)
    }

    fn refill(&mut self) {
        let mut block = GenericArray::clone_from_slice(&self.counter.to_le_bytes());
        self.cipher.encrypt_block(&mut block);
        self.buffer.copy_from_slice(&block);
        self.counter = self.counter.wrapping_add(1);
        self.used = 0;
    }
}

impl Default for AesRng {
    fn default() -> Self {
        Self::new()
    }
}

impl RngCore for AesRng {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        let mut data = [0u8; 4];
        self.fill_bytes(&mut data);
        u32::from_le_bytes(data)
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        let mut data = [0u8; 8];
        self.fill_bytes(&mut data);
        u64::from_le_bytes(data)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let mut filled = 0;
        while filled < dest.len() {
            if self.used == self.buffer.len() {
                self.refill();
            }
            let take = (dest.len() - filled).min(self.buffer.len() - self.used);
            dest[filled..filled + take].copy_from_slice(&self.buffer[self.used..self.used + take]);
            self.used += take;
            filled += take;
        }
    }

    #[inline]
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for AesRng {
    type Seed = [u8; 16];

    fn from_seed(seed: Self::Seed) -> Self {
        let cipher = Aes128::new(GenericArray::from_slice(&seed));
        Self {
            cipher,
            counter: 0,
            buffer: [0u8; 16],
            used: 16,
        }
    }
}

impl CryptoRng for AesRng {}
