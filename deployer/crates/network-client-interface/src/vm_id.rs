use std::fmt;

use sha2::{Digest, Sha256};

const ID_LEN: usize = 32;
const CHECKSUM_LEN: usize = 4;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VmIdError {
    #[error("VM name {name:?} is {len} bytes long, at most {max} bytes are allowed")]
    NameTooLong { name: String, len: usize, max: usize },
}

/// Identifier of a virtual machine, derived from its name.
///
/// The name is right-padded with zero bytes to 32 bytes. The textual form is CB58: base58 of the
/// 32 bytes followed by the last four bytes of their SHA-256 digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VmId([u8; ID_LEN]);

impl VmId {
    pub fn from_name(name: &str) -> Result<Self, VmIdError> {
        let bytes = name.as_bytes();
        if bytes.len() > ID_LEN {
            return Err(VmIdError::NameTooLong { name: name.to_string(), len: bytes.len(), max: ID_LEN });
        }
        let mut id = [0u8; ID_LEN];
        id[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(id))
    }

    pub fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }
}

impl fmt::Display for VmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digest = Sha256::digest(self.0);
        let mut payload = Vec::with_capacity(ID_LEN + CHECKSUM_LEN);
        payload.extend_from_slice(&self.0);
        payload.extend_from_slice(&digest[digest.len() - CHECKSUM_LEN..]);
        f.write_str(&bs58::encode(payload).into_string())
    }
}
