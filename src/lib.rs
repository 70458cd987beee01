//! mini-ca - a small certificate authority toolkit
//!
//! Builds and persists a three-level CA hierarchy with RSA-2048 keys and SHA-256
//! signatures:
//!
//! ```text
//! Root CA (self-signed, pathlen=2)
//!   └── Intermediate CA (signed by parent, pathlen=1)
//!       └── Leaf certificate (signed by parent, CA=false, SAN DNS names)
//! ```
//!
//! # Module Overview
//!
//! - [`codec`]: PEM encoding of PKCS#1 keys and DER certificates, and the signing primitive
//! - [`template`]: subject, validity and the role-derived extension set of a certificate
//! - [`authority`]: root/intermediate/leaf creation, load and save
//! - [`random`]: the secure randomness provider passed to key and serial generation
//! - [`prompt`], [`configs`], [`commands`]: the interactive `mini-ca` command line
//!
//! # Example
//!
//! ```no_run
//! use chrono::{Duration, Utc};
//! use mini_ca::authority::{make_intermediate, make_root};
//! use mini_ca::random::OsRandom;
//! use mini_ca::template::{CertificateData, SubjectIdentity, ValidityWindow};
//!
//! fn main() -> Result<(), mini_ca::CaError> {
//!     let now = Utc::now();
//!     let data = CertificateData {
//!         subject: SubjectIdentity {
//!             country: "US".to_string(),
//!             organization: "Acme".to_string(),
//!             common_name: "Acme Root".to_string(),
//!         },
//!         validity: ValidityWindow::new(now, now + Duration::days(365)),
//!     };
//!
//!     let root = make_root(&data, &OsRandom)?;
//!     root.save("ca", "root")?;
//!
//!     let mut mid_data = data.clone();
//!     mid_data.subject.common_name = "Acme Issuing CA".to_string();
//!     let mid = make_intermediate(&mid_data, &root, &OsRandom)?;
//!     mid.save("ca", "mid")?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! Library functions return [`CaError`]. [`CaError::EntropyExhausted`] is never
//! recovered from; the binary exits on it.

pub mod authority;
pub mod codec;
pub mod commands;
pub mod configs;
pub mod error;
pub mod prompt;
pub mod random;
pub mod template;

pub use error::CaError;
