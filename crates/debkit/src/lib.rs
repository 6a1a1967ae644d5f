//! # debkit
//!
//! Builds Debian binary packages (`.deb`) from a [`PackageDescriptor`] and a
//! list of [`PackageEntry`] payload files.
//!
//! A package is an `ar` archive with exactly three members, in order:
//!
//! 1. `debian-binary`, the format version `2.0`
//! 2. `control.tar.gz`, the `control` file, `conffiles` and maintainer scripts
//! 3. `data.tar.gz`, the payload with per-file owner, group and mode
//!
//! With a [`PackageSigner`], detached Ed25519 signatures over the control
//! and data members follow as `_sigcontrol` and `_sigdata`.
//!
//! ```no_run
//! use debkit::{PackageBuilder, PackageDescriptor, PackageEntry};
//! use std::path::Path;
//!
//! let descriptor = PackageDescriptor::new("svc", debkit::debian_version("1.0.0-SNAPSHOT"));
//! let entries = vec![PackageEntry {
//!     source: "target/svc.jar".into(),
//!     destination: "/usr/share/java/svc.jar".to_string(),
//!     owner: "svc".to_string(),
//!     group: "svc".to_string(),
//!     mode: 0o644,
//! }];
//! PackageBuilder::new(descriptor).build(&entries, Path::new("target/svc-1.0.0.deb"))?;
//! # Ok::<(), debkit::Error>(())
//! ```

#![warn(missing_docs)]

pub mod archive;
pub mod builder;
pub mod descriptor;
pub mod error;
pub mod signing;
pub mod verify;

pub use archive::PackageEntry;
pub use builder::{PackageBuilder, source_date_epoch};
pub use descriptor::{
    LifecycleScripts, PackageDescriptor, debian_version, host_architecture, validate_name,
    validate_version,
};
pub use error::{Error, ErrorCategory, Result};
pub use signing::{PackageSigner, load_verifying_key, maybe_sign};
pub use verify::{read_members, verify_package};

pub use ed25519_dalek::{SigningKey, VerifyingKey};
