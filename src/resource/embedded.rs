//! Files bundled into the binary

/// Upstart job
pub const UPSTART: &str = "upstart.conf";
/// systemd unit
pub const SYSTEMD: &str = "systemd.service";
/// JVM options sourced by the service
pub const JVM_CONFIG: &str = "jvm.conf";

const FILES: &[(&str, &str)] = &[
    (UPSTART, include_str!("../files/upstart.conf")),
    (SYSTEMD, include_str!("../files/systemd.service")),
    (JVM_CONFIG, include_str!("../files/jvm.conf")),
    ("scripts/preinst", include_str!("../files/scripts/preinst")),
    ("scripts/postinst", include_str!("../files/scripts/postinst")),
    ("scripts/prerm", include_str!("../files/scripts/prerm")),
    ("scripts/postrm", include_str!("../files/scripts/postrm")),
];

/// Contents of the bundled file `name`.
pub fn get(name: &str) -> Option<&'static str> {
    FILES
        .iter()
        .find(|(id, _)| *id == name)
        .map(|(_, content)| *content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_file_is_bundled() {
        for (name, content) in FILES {
            assert!(!content.is_empty(), "{name} is empty");
        }
        assert!(get(UPSTART).is_some());
        assert!(get("scripts/postrm").is_some());
        assert!(get("missing").is_none());
    }
}
