// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Stateless action tokens.
//!
//! A token is `{fragment id}:{hex HMAC-SHA256}` where the MAC covers the
//! session, the editing user and the fragment id. Nothing is stored; every
//! check recomputes the MAC.

use crate::fragments::FragmentId;
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_DOMAIN: &[u8] = b"textplugin.action-token.v1";

#[derive(Clone)]
pub struct ActionTokens {
    mac: HmacSha256,
}

impl ActionTokens {
    pub fn new(secret: &[u8]) -> Result<Self, InvalidLength> {
        Ok(Self {
            mac: HmacSha256::new_from_slice(secret)?,
        })
    }

    /// Same inputs always give the same token.
    pub fn issue(&self, session: &str, user: &str, fragment: FragmentId) -> String {
        format!("{}:{}", fragment, hex::encode(self.digest(session, user, fragment)))
    }

    pub fn validate(&self, token: &str, session: &str, user: &str, fragment: FragmentId) -> bool {
        self.decode(token, session, user) == Some(fragment)
    }

    /// Fragment a token was issued for, provided it verifies for this session and user.
    pub fn decode(&self, token: &str, session: &str, user: &str) -> Option<FragmentId> {
        let (id, signature) = token.split_once(':')?;
        let fragment = FragmentId::parse(id)?;
        let provided = hex::decode(signature).ok()?;
        let expected = self.digest(session, user, fragment);
        if provided.len() != expected.len() {
            return None;
        }
        bool::from(expected.as_slice().ct_eq(provided.as_slice())).then_some(fragment)
    }

    /// Fragment a token names, without verifying it.
    pub fn claimed_fragment(token: &str) -> Option<FragmentId> {
        token.split_once(':').and_then(|(id, _)| FragmentId::parse(id))
    }

    fn digest(&self, session: &str, user: &str, fragment: FragmentId) -> Vec<u8> {
        let mut mac = self.mac.clone();
        let id = fragment.to_string();
        for part in [TOKEN_DOMAIN, session.as_bytes(), user.as_bytes(), id.as_bytes()] {
            mac.update(&(part.len() as u64).to_be_bytes());
            mac.update(part);
        }
        mac.finalize().into_bytes().to_vec()
    }
}
