use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::authority::{self, BundlePaths, FreshAuthority};
use crate::configs::MiniCaConfig;
use crate::prompt::Prompter;
use crate::random::SecureRandom;

/// Which kind of key/certificate pair to create
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CertType {
    /// Self-signed root certificate authority
    Root,
    /// Intermediate certificate authority signed by a parent
    Mid,
    /// Leaf certificate signed by a parent
    Leaf,
}

impl CertType {
    fn name(self) -> &'static str {
        match self {
            CertType::Root => "root",
            CertType::Mid => "mid",
            CertType::Leaf => "leaf",
        }
    }

    fn description(self) -> &'static str {
        match self {
            CertType::Root => "root certificate authority",
            CertType::Mid => "intermediate certificate authority",
            CertType::Leaf => "leaf certificate",
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct NewArgs {
    /// Type of pair to create
    #[arg(value_enum, value_name = "TYPE")]
    pub cert_type: CertType,

    /// The name for the key/certificate pair
    #[arg(long)]
    pub name: String,

    /// The output directory for the key/certificate pair [default: current directory]
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// The name for the parent key/certificate pair (if not self-signed)
    #[arg(long)]
    pub parent: Option<String>,

    /// The input directory for the parent key/certificate pair [default: current directory]
    #[arg(long = "in")]
    pub input: Option<PathBuf>,
}

/// Handle `mini-ca new <type>`
///
/// Loads the parent (for `mid` and `leaf`), prompts for the certificate data, creates the
/// pair and saves it. Returns where the key and certificate were written.
pub fn handle_new<R: BufRead, W: Write>(
    args: &NewArgs,
    config: &MiniCaConfig,
    prompter: &mut Prompter<R, W>,
    rng: &dyn SecureRandom,
) -> Result<BundlePaths> {
    let parent_name = match (args.cert_type, args.parent.as_deref()) {
        (CertType::Root, Some(_)) => {
            writeln!(
                prompter.output(),
                "Warning: \"parent\" flag has no effect for root certificates"
            )?;
            None
        }
        (CertType::Root, None) => None,
        (_, Some(parent)) => Some(parent),
        (_, None) => bail!(
            "Flag \"parent\" must be set for {:?} certificates",
            args.cert_type.name()
        ),
    };

    writeln!(
        prompter.output(),
        "Creating a new {}\n",
        args.cert_type.description()
    )?;

    let output_dir = args.out.as_ref().unwrap_or(&config.directories.output);
    let input_dir = args.input.as_ref().unwrap_or(&config.directories.input);
    let date_format = config.prompt.date_format.as_str();

    let created: FreshAuthority = match parent_name {
        None => {
            let data = prompter.prompt_certificate_data(date_format)?;
            authority::make_root(&data, rng).context("creating ca")?
        }
        Some(parent_name) => {
            let (parent, _) = authority::load(input_dir, parent_name)
                .with_context(|| format!("loading parent {:?}", parent_name))?;
            let data = prompter.prompt_certificate_data(date_format)?;

            if args.cert_type == CertType::Mid {
                authority::make_intermediate(&data, &parent, rng).context("creating ca")?
            } else {
                writeln!(prompter.output())?;
                let dns_names = prompter.prompt_dns_names()?;
                authority::make_leaf(&data, &parent, &dns_names, rng).context("creating ca")?
            }
        }
    };

    let paths = created.save(output_dir, &args.name)?;

    let out = prompter.output();
    writeln!(out, "\nSuccessfully created new {}", args.cert_type.description())?;
    writeln!(out, "Saved private key to {:?}", paths.key_path.display().to_string())?;
    writeln!(out, "Saved certificate to {:?}", paths.cert_path.display().to_string())?;

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::OsRandom;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn args(cert_type: CertType, name: &str, parent: Option<&str>, dir: &TempDir) -> NewArgs {
        NewArgs {
            cert_type,
            name: name.to_string(),
            out: Some(dir.path().to_path_buf()),
            parent: parent.map(str::to_string),
            input: Some(dir.path().to_path_buf()),
        }
    }

    fn run(args: &NewArgs, input: &str) -> (Result<BundlePaths>, String) {
        let mut prompter = Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let result = handle_new(args, &MiniCaConfig::default(), &mut prompter, &OsRandom);
        let shown = String::from_utf8(prompter.output().clone()).unwrap();
        (result, shown)
    }

    #[test]
    fn test_root_then_leaf() {
        let dir = TempDir::new().unwrap();

        let (root, shown) = run(
            &args(CertType::Root, "root", None, &dir),
            "US\nAcme\nAcme Root\n\n2035-01-01 00:00:00 UTC\n",
        );
        let root = root.unwrap();
        assert!(root.key_path.is_file());
        assert!(shown.contains("Creating a new root certificate authority"));
        assert!(shown.contains("Successfully created new root certificate authority"));

        let (leaf, shown) = run(
            &args(CertType::Leaf, "leaf1", Some("root"), &dir),
            "US\nAcme\nexample.com\n\n\nexample.com\n\n",
        );
        assert!(leaf.unwrap().cert_path.is_file());
        assert!(shown.contains("DNS.1 = "));
    }

    #[test]
    fn test_parent_required_for_mid() {
        let dir = TempDir::new().unwrap();
        let (result, _) = run(&args(CertType::Mid, "mid", None, &dir), "");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("\"parent\" must be set"));
        assert!(!dir.path().join("mid.pem").exists());
    }

    #[test]
    fn test_parent_ignored_for_root() {
        let dir = TempDir::new().unwrap();
        let (result, shown) = run(
            &args(CertType::Root, "root", Some("whatever"), &dir),
            "US\nAcme\nAcme Root\n\n\n",
        );
        assert!(result.is_ok());
        assert!(shown.contains("Warning: \"parent\" flag has no effect"));
    }

    #[test]
    fn test_missing_parent_bundle() {
        let dir = TempDir::new().unwrap();
        let (result, _) = run(&args(CertType::Mid, "mid", Some("absent"), &dir), "");
        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains("loading parent"));
    }
}
