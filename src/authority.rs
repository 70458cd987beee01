//! Certificate authorities: creation, loading and saving
//!
//! An authority is a private key plus its certificate. Authorities created here are
//! [`FreshAuthority`] values and carry the signed DER bytes needed to persist them.
//! Authorities read back from disk are [`LoadedAuthority`] values: they can sign children
//! but cannot be saved again.
//!
//! # Bundle Layout
//! ```text
//! <directory>/<name>.pem   RSA PRIVATE KEY (PKCS#1), mode 0600
//! <directory>/<name>.crt   CERTIFICATE (DER), mode 0644
//! ```
//!
//! # Example
//! ```rust,no_run
//! # use mini_ca::authority::{load, make_intermediate};
//! # use mini_ca::random::OsRandom;
//! # use mini_ca::template::CertificateData;
//! # fn example(data: CertificateData) -> Result<(), mini_ca::CaError> {
//! let (root, _) = load("ca", "root")?;
//! let mid = make_intermediate(&data, &root, &OsRandom)?;
//! let paths = mid.save("ca", "mid")?;
//! println!("{}", paths.cert_path.display());
//! # Ok(())
//! # }
//! ```

use openssl::pkey::{PKey, PKeyRef, Private};
use openssl::x509::{X509Ref, X509};
use std::fs::{self, DirBuilder, OpenOptions};
use std::io::Write;
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::codec::{self, Issuer, RSA_KEY_BITS};
use crate::error::CaError;
use crate::random::SecureRandom;
use crate::template::{CertificateData, CertificateTemplate, Role};

const KEY_EXTENSION: &str = "pem";
const CERT_EXTENSION: &str = "crt";
const DIRECTORY_MODE: u32 = 0o777;
const KEY_FILE_MODE: u32 = 0o600;
const CERT_FILE_MODE: u32 = 0o644;

/// The key and certificate files of a named authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundlePaths {
    pub key_path: PathBuf,
    pub cert_path: PathBuf,
}

impl BundlePaths {
    pub fn new(directory: impl AsRef<Path>, name: &str) -> Self {
        let directory = directory.as_ref();
        Self {
            key_path: directory.join(format!("{}.{}", name, KEY_EXTENSION)),
            cert_path: directory.join(format!("{}.{}", name, CERT_EXTENSION)),
        }
    }
}

/// Anything that can sign a child certificate.
pub trait IssuingAuthority {
    fn private_key(&self) -> &PKeyRef<Private>;
    fn certificate(&self) -> &X509Ref;
}

/// An authority created in this process.
pub struct FreshAuthority {
    key: PKey<Private>,
    template: CertificateTemplate,
    certificate: X509,
    signed: Vec<u8>,
}

impl FreshAuthority {
    /// The unsigned template the certificate was built from.
    pub fn template(&self) -> &CertificateTemplate {
        &self.template
    }

    /// DER bytes of the signed certificate.
    pub fn signed_bytes(&self) -> &[u8] {
        &self.signed
    }

    /// Persist the key and certificate as `<name>.pem` and `<name>.crt` in `directory`.
    ///
    /// The directory is created when missing. The key file is written first; if writing the
    /// certificate then fails the key file is left behind and the bundle is incomplete.
    pub fn save(&self, directory: impl AsRef<Path>, name: &str) -> Result<BundlePaths, CaError> {
        let directory = directory.as_ref();
        if !directory.is_dir() {
            DirBuilder::new()
                .recursive(true)
                .mode(DIRECTORY_MODE)
                .create(directory)
                .map_err(|e| CaError::io("ca directory creation", e))?;
            debug!(directory = %directory.display(), "created ca directory");
        }

        let paths = BundlePaths::new(directory, name);

        let key_pem = codec::encode_key(&self.key)?;
        write_bundle_file(&paths.key_path, &key_pem, KEY_FILE_MODE, "ca key")?;

        let cert_pem = codec::encode_certificate(&self.signed);
        write_bundle_file(&paths.cert_path, &cert_pem, CERT_FILE_MODE, "ca cert")?;

        info!(
            key = %paths.key_path.display(),
            cert = %paths.cert_path.display(),
            "saved certificate authority"
        );
        Ok(paths)
    }
}

impl IssuingAuthority for FreshAuthority {
    fn private_key(&self) -> &PKeyRef<Private> {
        &self.key
    }

    fn certificate(&self) -> &X509Ref {
        &self.certificate
    }
}

/// An authority read back from disk. Usable as a parent, never saved.
pub struct LoadedAuthority {
    key: PKey<Private>,
    certificate: X509,
}

impl IssuingAuthority for LoadedAuthority {
    fn private_key(&self) -> &PKeyRef<Private> {
        &self.key
    }

    fn certificate(&self) -> &X509Ref {
        &self.certificate
    }
}

/// Either kind of authority, for callers that hold both.
pub enum Authority {
    Fresh(FreshAuthority),
    Loaded(LoadedAuthority),
}

impl Authority {
    /// Signed DER bytes, present only for freshly created authorities.
    pub fn signed_bytes(&self) -> Option<&[u8]> {
        match self {
            Authority::Fresh(fresh) => Some(fresh.signed_bytes()),
            Authority::Loaded(_) => None,
        }
    }

    /// Save a fresh authority. A loaded one fails with [`CaError::NoSignedBytes`]
    /// before anything touches the filesystem.
    pub fn save(&self, directory: impl AsRef<Path>, name: &str) -> Result<BundlePaths, CaError> {
        match self {
            Authority::Fresh(fresh) => fresh.save(directory, name),
            Authority::Loaded(_) => Err(CaError::NoSignedBytes),
        }
    }
}

impl IssuingAuthority for Authority {
    fn private_key(&self) -> &PKeyRef<Private> {
        match self {
            Authority::Fresh(fresh) => fresh.private_key(),
            Authority::Loaded(loaded) => loaded.private_key(),
        }
    }

    fn certificate(&self) -> &X509Ref {
        match self {
            Authority::Fresh(fresh) => fresh.certificate(),
            Authority::Loaded(loaded) => loaded.certificate(),
        }
    }
}

impl From<FreshAuthority> for Authority {
    fn from(fresh: FreshAuthority) -> Self {
        Authority::Fresh(fresh)
    }
}

impl From<LoadedAuthority> for Authority {
    fn from(loaded: LoadedAuthority) -> Self {
        Authority::Loaded(loaded)
    }
}

fn write_bundle_file(path: &Path, contents: &[u8], mode: u32, what: &str) -> Result<(), CaError> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(mode)
        .open(path)
        .map_err(|e| CaError::io(format!("{} creation", what), e))?;

    // open() honours the umask and leaves existing files alone
    file.set_permissions(fs::Permissions::from_mode(mode))
        .map_err(|e| CaError::io(format!("{} chmod", what), e))?;

    file.write_all(contents)
        .map_err(|e| CaError::io(format!("{} write", what), e))?;
    Ok(())
}

fn create(
    role: Role,
    data: &CertificateData,
    parent: Option<(&X509Ref, &PKeyRef<Private>)>,
    dns_names: Vec<String>,
    rng: &dyn SecureRandom,
) -> Result<FreshAuthority, CaError> {
    let key = codec::generate_key(rng, RSA_KEY_BITS)?;
    let serial_number = codec::new_serial_number(rng)?;
    let template = CertificateTemplate::for_role(role, data, serial_number, dns_names);

    let signed = match parent {
        None => codec::sign(&template, Issuer::Template, &key, &key)?,
        Some((parent_cert, parent_key)) => codec::sign(
            &template,
            Issuer::Certificate(parent_cert),
            &key,
            parent_key,
        )?,
    };
    let certificate =
        X509::from_der(&signed).map_err(CaError::signing("parse signed certificate"))?;

    info!(
        role = ?role,
        subject = %data.subject.common_name,
        serial = %template.serial_number.to_hex(),
        "created certificate authority"
    );
    Ok(FreshAuthority {
        key,
        template,
        certificate,
        signed,
    })
}

/// Create a self-signed root CA.
pub fn make_root(data: &CertificateData, rng: &dyn SecureRandom) -> Result<FreshAuthority, CaError> {
    create(Role::Root, data, None, Vec::new(), rng)
}

/// Create an intermediate CA signed by `parent`.
pub fn make_intermediate<P: IssuingAuthority + ?Sized>(
    data: &CertificateData,
    parent: &P,
    rng: &dyn SecureRandom,
) -> Result<FreshAuthority, CaError> {
    create(
        Role::Intermediate,
        data,
        Some((parent.certificate(), parent.private_key())),
        Vec::new(),
        rng,
    )
}

/// Create a leaf certificate signed by `parent`, valid for `dns_names` in that order.
pub fn make_leaf<P: IssuingAuthority + ?Sized>(
    data: &CertificateData,
    parent: &P,
    dns_names: &[String],
    rng: &dyn SecureRandom,
) -> Result<FreshAuthority, CaError> {
    create(
        Role::Leaf,
        data,
        Some((parent.certificate(), parent.private_key())),
        dns_names.to_vec(),
        rng,
    )
}

/// Read `<directory>/<name>.pem` and `<directory>/<name>.crt`.
pub fn load(
    directory: impl AsRef<Path>,
    name: &str,
) -> Result<(LoadedAuthority, BundlePaths), CaError> {
    let paths = BundlePaths::new(directory, name);

    let key_pem = fs::read(&paths.key_path).map_err(|e| {
        CaError::io(format!("read key file {}", paths.key_path.display()), e)
    })?;
    let key = codec::decode_key(&key_pem).map_err(|e| match e {
        CaError::MalformedKey(msg) => {
            CaError::MalformedKey(format!("read key file {}: {}", paths.key_path.display(), msg))
        }
        other => other,
    })?;

    let cert_pem = fs::read(&paths.cert_path).map_err(|e| {
        CaError::io(format!("read cert file {}", paths.cert_path.display()), e)
    })?;
    let certificate = codec::decode_certificate(&cert_pem).map_err(|e| match e {
        CaError::MalformedCertificate(msg) => CaError::MalformedCertificate(format!(
            "read cert file {}: {}",
            paths.cert_path.display(),
            msg
        )),
        other => other,
    })?;

    debug!(
        key = %paths.key_path.display(),
        cert = %paths.cert_path.display(),
        "loaded certificate authority"
    );
    Ok((LoadedAuthority { key, certificate }, paths))
}
