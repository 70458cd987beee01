//! Certificate templates
//!
//! A template is everything the signer needs except the keys: serial, subject, validity
//! window and the role-derived extension set.
//!
//! ```text
//! Root CA (self-signed, pathlen=2)
//!   └── Intermediate CA (signed by parent, pathlen=1)
//!       └── Leaf (signed by parent, CA=false, SAN DNS names)
//! ```

use chrono::{DateTime, Utc};
use openssl::bn::BigNum;
use openssl::error::ErrorStack;

const ROOT_CA_PATH_LENGTH: u32 = 2;
const INTERMEDIATE_CA_PATH_LENGTH: u32 = 1;

/// Size of a serial number in bytes.
pub const SERIAL_NUMBER_LEN: usize = 20;

/// Identity fields copied verbatim into the certificate subject.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectIdentity {
    pub country: String,
    pub organization: String,
    pub common_name: String,
}

/// The `(not_before, not_after)` pair of a certificate.
///
/// Nothing checks that `not_after` is later than `not_before`. An inverted window
/// yields a certificate that is never valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityWindow {
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

impl ValidityWindow {
    pub fn new(not_before: DateTime<Utc>, not_after: DateTime<Utc>) -> Self {
        Self {
            not_before,
            not_after,
        }
    }

    /// True when `not_after` precedes `not_before`, so the certificate is never valid.
    pub fn is_inverted(&self) -> bool {
        self.not_after < self.not_before
    }
}

/// Role-agnostic input to every certificate creation operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateData {
    pub subject: SubjectIdentity,
    pub validity: ValidityWindow,
}

/// A non-negative serial number stored as big-endian magnitude bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SerialNumber(Vec<u8>);

impl SerialNumber {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        SerialNumber(bytes.to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_bignum(&self) -> Result<BigNum, ErrorStack> {
        BigNum::from_slice(&self.0)
    }

    /// Lowercase hex without leading zero bytes, as OpenSSL prints it.
    pub fn to_hex(&self) -> String {
        let trimmed: Vec<u8> = self.0.iter().copied().skip_while(|b| *b == 0).collect();
        if trimmed.is_empty() {
            return "00".to_string();
        }
        trimmed.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

/// Key usage bits set on generated certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyUsage {
    CertSign,
    CrlSign,
}

/// Extended key usage purposes set on generated certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtKeyUsage {
    ServerAuth,
}

/// Basic constraints as the certificate role describes them.
///
/// A CA with `max_path_len == 0` and `max_path_len_zero == false` has no path length
/// limit; set `max_path_len_zero` to ask for an explicit zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicConstraints {
    pub is_ca: bool,
    pub max_path_len: u32,
    pub max_path_len_zero: bool,
}

impl BasicConstraints {
    /// The path length to encode, if any. End entities never carry one.
    pub fn path_len(&self) -> Option<u32> {
        if !self.is_ca {
            return None;
        }
        match (self.max_path_len, self.max_path_len_zero) {
            (0, false) => None,
            (n, _) => Some(n),
        }
    }
}

/// The three certificate roles in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Root,
    Intermediate,
    Leaf,
}

impl Role {
    pub fn key_usage(self) -> Vec<KeyUsage> {
        match self {
            Role::Root | Role::Intermediate => vec![KeyUsage::CertSign, KeyUsage::CrlSign],
            Role::Leaf => vec![KeyUsage::CrlSign],
        }
    }

    pub fn ext_key_usage(self) -> Vec<ExtKeyUsage> {
        vec![ExtKeyUsage::ServerAuth]
    }

    pub fn basic_constraints(self) -> BasicConstraints {
        match self {
            Role::Root => BasicConstraints {
                is_ca: true,
                max_path_len: ROOT_CA_PATH_LENGTH,
                max_path_len_zero: false,
            },
            Role::Intermediate => BasicConstraints {
                is_ca: true,
                max_path_len: INTERMEDIATE_CA_PATH_LENGTH,
                max_path_len_zero: false,
            },
            Role::Leaf => BasicConstraints {
                is_ca: false,
                max_path_len: 0,
                max_path_len_zero: true,
            },
        }
    }
}

/// An unsigned certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateTemplate {
    pub role: Role,
    pub serial_number: SerialNumber,
    pub subject: SubjectIdentity,
    pub validity: ValidityWindow,
    pub key_usage: Vec<KeyUsage>,
    pub ext_key_usage: Vec<ExtKeyUsage>,
    pub basic_constraints: BasicConstraints,
    pub dns_names: Vec<String>,
}

impl CertificateTemplate {
    /// Build the template for `role`. `dns_names` only ends up in leaf certificates.
    pub fn for_role(
        role: Role,
        data: &CertificateData,
        serial_number: SerialNumber,
        dns_names: Vec<String>,
    ) -> Self {
        let dns_names = match role {
            Role::Leaf => dns_names,
            Role::Root | Role::Intermediate => Vec::new(),
        };
        Self {
            role,
            serial_number,
            subject: data.subject.clone(),
            validity: data.validity,
            key_usage: role.key_usage(),
            ext_key_usage: role.ext_key_usage(),
            basic_constraints: role.basic_constraints(),
            dns_names,
        }
    }

    pub fn is_ca(&self) -> bool {
        self.basic_constraints.is_ca
    }
}
