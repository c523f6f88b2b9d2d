//! Verification policy handed to the verifier.

use crate::trust::{fulcio_roots, PublicKey, RootCertificates};

/// Immutable (root certificates, key, claims flag) triple.
///
/// Built fresh for every request; there is no way to change it afterwards.
#[derive(Debug, Clone)]
pub struct CheckOpts {
    root_certs: &'static RootCertificates,
    key: PublicKey,
    claims: bool,
}

impl CheckOpts {
    /// Combine the compiled-in roots, `key`, and mandatory claims checking.
    pub fn assemble(key: PublicKey) -> Self {
        Self {
            root_certs: fulcio_roots(),
            key,
            claims: true,
        }
    }

    pub fn root_certs(&self) -> &RootCertificates {
        self.root_certs
    }

    pub fn key(&self) -> &PublicKey {
        &self.key
    }

    /// Whether signed claims must match the image digest.
    pub fn claims(&self) -> bool {
        self.claims
    }
}
