//! Reading packages back and checking their signatures.

use crate::builder::MEMBER_ORDER;
use crate::error::{Error, Result};
use crate::signing::{CONTROL_SIGNATURE, DATA_SIGNATURE, Member, verify_member};
use ed25519_dalek::VerifyingKey;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read every `ar` member of a package, in archive order.
pub fn read_members(path: &Path) -> Result<Vec<Member>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut archive = ar::Archive::new(file);
    let mut members = Vec::new();

    while let Some(entry) = archive.next_entry() {
        let mut entry = entry.map_err(|e| Error::format(path, e.to_string()))?;
        let name = String::from_utf8_lossy(entry.header().identifier())
            .trim_end_matches('/')
            .to_string();
        let mut data = Vec::new();
        entry
            .read_to_end(&mut data)
            .map_err(|e| Error::format(path, format!("member {name}: {e}")))?;
        members.push(Member::new(name, data));
    }

    Ok(members)
}

/// Check that the mandatory members come first and in order.
pub fn check_layout(path: &Path, members: &[Member]) -> Result<()> {
    for (index, expected) in MEMBER_ORDER.iter().enumerate() {
        match members.get(index) {
            Some(member) if member.name == *expected => {}
            Some(member) => {
                return Err(Error::format(
                    path,
                    format!("member {} is {}, expected {expected}", index + 1, member.name),
                ));
            }
            None => {
                return Err(Error::format(path, format!("missing member {expected}")));
            }
        }
    }
    Ok(())
}

/// Verify the detached signatures of the package at `path` against `key`.
pub fn verify_package(path: &Path, key: &VerifyingKey) -> Result<()> {
    let members = read_members(path)?;
    check_layout(path, &members)?;

    let find = |name: &str| members.iter().find(|m| m.name == name);
    let (control_sig, data_sig) = match (find(CONTROL_SIGNATURE), find(DATA_SIGNATURE)) {
        (Some(control), Some(data)) => (control, data),
        (None, None) => {
            return Err(Error::Unsigned {
                path: path.to_path_buf(),
            });
        }
        (Some(_), None) => return Err(Error::format(path, format!("missing {DATA_SIGNATURE}"))),
        (None, Some(_)) => {
            return Err(Error::format(path, format!("missing {CONTROL_SIGNATURE}")));
        }
    };

    verify_member(key, CONTROL_SIGNATURE, &control_sig.data, &members[1].data)?;
    verify_member(key, DATA_SIGNATURE, &data_sig.data, &members[2].data)?;
    log::debug!("Signatures of {} verified", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::PackageBuilder;
    use crate::descriptor::PackageDescriptor;
    use crate::signing::PackageSigner;
    use crate::signing::tests::test_key;
    use ed25519_dalek::SigningKey;
    use std::fs;

    fn build(dir: &Path, signer: Option<PackageSigner>) -> std::path::PathBuf {
        let payload = dir.join("svc.jar");
        fs::write(&payload, b"payload").unwrap();
        let entry = crate::archive::PackageEntry {
            source: payload,
            destination: "/usr/share/java/svc.jar".to_string(),
            owner: "root".to_string(),
            group: "root".to_string(),
            mode: 0o644,
        };
        let output = dir.join("svc.deb");
        PackageBuilder::new(PackageDescriptor::new("svc", "1.0"))
            .with_signer(signer)
            .with_mtime(0)
            .build(&[entry], &output)
            .unwrap()
    }

    #[test]
    fn test_unsigned_package_reports_unsigned() {
        let dir = tempfile::tempdir().unwrap();
        let deb = build(dir.path(), None);
        let result = verify_package(&deb, &test_key().verifying_key());
        assert!(matches!(result, Err(Error::Unsigned { .. })));
    }

    #[test]
    fn test_wrong_key_fails() {
        let dir = tempfile::tempdir().unwrap();
        let deb = build(dir.path(), Some(PackageSigner::new(test_key())));
        let other = SigningKey::from_bytes(&[9u8; 32]).verifying_key();
        assert!(matches!(
            verify_package(&deb, &other),
            Err(Error::Signature { .. })
        ));
    }

    #[test]
    fn test_tampered_data_fails() {
        let dir = tempfile::tempdir().unwrap();
        let deb = build(dir.path(), Some(PackageSigner::new(test_key())));

        let mut bytes = fs::read(&deb).unwrap();
        let needle = b"data.tar.gz";
        let at = bytes
            .windows(needle.len())
            .position(|w| w == needle)
            .unwrap();
        // Flip a byte past the 60-byte member header.
        bytes[at + 60 + 20] ^= 0xff;
        fs::write(&deb, bytes).unwrap();

        assert!(verify_package(&deb, &test_key().verifying_key()).is_err());
    }

    #[test]
    fn test_layout_checks_order() {
        let members = vec![
            Member::new("control.tar.gz", Vec::new()),
            Member::new("debian-binary", b"2.0\n".to_vec()),
        ];
        let err = check_layout(Path::new("x.deb"), &members).unwrap_err();
        assert!(err.to_string().contains("expected debian-binary"));

        let short = vec![Member::new("debian-binary", b"2.0\n".to_vec())];
        let err = check_layout(Path::new("x.deb"), &short).unwrap_err();
        assert!(err.to_string().contains("missing member control.tar.gz"));
    }

    #[test]
    fn test_read_members_rejects_non_ar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.deb");
        fs::write(&path, b"definitely not an archive").unwrap();
        assert!(read_members(&path).is_err());
    }
}
