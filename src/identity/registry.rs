//! passwd/group registry parsing.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{HoundError, Result};

/// Minimum field count of a passwd record (`name:pw:uid:gid:gecos:home:shell`).
const PASSWD_FIELDS: usize = 7;
/// Minimum field count of a group record (`name:pw:gid[:members]`).
const GROUP_FIELDS: usize = 3;

/// A user account from the passwd registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub uid: u32,
    /// Primary group.
    pub gid: u32,
    pub home: String,
    pub shell: String,
}

/// A group from the group registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub gid: u32,
    /// Supplementary member usernames, in registry order.
    pub members: Vec<String>,
}

/// Split one registry line into its colon-delimited fields.
///
/// Returns `None` for blank lines and `#` comments.
pub(crate) fn registry_fields(line: &str) -> Option<Vec<&str>> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() || line.starts_with('#') {
        return None;
    }
    Some(line.split(':').collect())
}

/// Decode one raw registry line. Bytes that are not UTF-8 (a Latin-1
/// GECOS field, say) are replaced rather than failing the file.
pub(crate) fn decode_line(bytes: Vec<u8>, line: usize) -> String {
    String::from_utf8(bytes).unwrap_or_else(|e| {
        warn!(line, "registry line is not valid UTF-8, decoding lossily");
        String::from_utf8_lossy(e.as_bytes()).into_owned()
    })
}

/// Read every line of a registry file, mapping open/read failures to
/// `HoundError::IdentitySource`.
fn read_registry(path: &Path) -> Result<Vec<String>> {
    let identity_err = |source| HoundError::IdentitySource {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(identity_err)?;

    let mut lines = Vec::new();
    for (idx, raw) in BufReader::new(file).split(b'\n').enumerate() {
        lines.push(decode_line(raw.map_err(identity_err)?, idx + 1));
    }
    Ok(lines)
}

/// Load all users from a passwd-style registry.
///
/// Short records are skipped silently, records with a non-numeric UID or
/// GID are skipped with a warning.
pub fn load_users(path: &Path) -> Result<Vec<User>> {
    let mut users = Vec::new();

    for (idx, line) in read_registry(path)?.iter().enumerate() {
        let Some(fields) = registry_fields(line) else {
            continue;
        };
        if fields.len() < PASSWD_FIELDS {
            debug!(line = idx + 1, "skipping short passwd record");
            continue;
        }

        let uid = match fields[2].parse::<u32>() {
            Ok(uid) => uid,
            Err(e) => {
                warn!(line = idx + 1, user = fields[0], error = %e, "invalid UID, skipping user");
                continue;
            }
        };
        let gid = match fields[3].parse::<u32>() {
            Ok(gid) => gid,
            Err(e) => {
                warn!(line = idx + 1, user = fields[0], error = %e, "invalid GID, skipping user");
                continue;
            }
        };

        users.push(User {
            username: fields[0].to_string(),
            uid,
            gid,
            home: fields[5].to_string(),
            shell: fields[6].to_string(),
        });
    }

    debug!(path = %path.display(), count = users.len(), "loaded users");
    Ok(users)
}

/// Load all groups from a group-style registry.
pub fn load_groups(path: &Path) -> Result<Vec<Group>> {
    let mut groups = Vec::new();

    for (idx, line) in read_registry(path)?.iter().enumerate() {
        let Some(fields) = registry_fields(line) else {
            continue;
        };
        if fields.len() < GROUP_FIELDS {
            debug!(line = idx + 1, "skipping short group record");
            continue;
        }

        let gid = match fields[2].parse::<u32>() {
            Ok(gid) => gid,
            Err(e) => {
                warn!(line = idx + 1, group = fields[0], error = %e, "invalid GID, skipping group");
                continue;
            }
        };

        let members = match fields.get(3) {
            Some(list) if !list.is_empty() => list.split(',').map(str::to_string).collect(),
            _ => Vec::new(),
        };

        groups.push(Group {
            name: fields[0].to_string(),
            gid,
            members,
        });
    }

    debug!(path = %path.display(), count = groups.len(), "loaded groups");
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn registry(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_users() {
        let file = registry(
            "# comment\n\
             root:x:0:0:root:/root:/bin/bash\n\
             \n\
             alice:x:1000:1000:Alice:/home/alice:/bin/zsh\n",
        );
        let users = load_users(file.path()).unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].username, "root");
        assert_eq!(users[0].uid, 0);
        assert_eq!(users[1].username, "alice");
        assert_eq!(users[1].gid, 1000);
        assert_eq!(users[1].home, "/home/alice");
        assert_eq!(users[1].shell, "/bin/zsh");
    }

    #[test]
    fn test_short_user_line_skipped() {
        let file = registry(
            "broken:x\n\
             bob:x:1001:1001::/home/bob:/bin/sh\n",
        );
        let users = load_users(file.path()).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "bob");
    }

    #[test]
    fn test_bad_uid_skipped_and_loading_continues() {
        let file = registry(
            "mallory:x:abc:1000::/home/mallory:/bin/sh\n\
             eve:x:1002:notanumber::/home/eve:/bin/sh\n\
             carol:x:1003:1003::/home/carol:/bin/sh\n",
        );
        let users = load_users(file.path()).unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].username, "carol");
    }

    #[test]
    fn test_missing_registry_is_error() {
        let err = load_users(Path::new("/nonexistent/passwd")).unwrap_err();
        assert!(matches!(err, HoundError::IdentitySource { .. }));

        let err = load_groups(Path::new("/nonexistent/group")).unwrap_err();
        assert!(matches!(err, HoundError::IdentitySource { .. }));
    }

    #[test]
    fn test_load_groups_members() {
        let file = registry(
            "root:x:0:\n\
             wheel:x:10:alice,bob\n\
             staff:x:50\n\
             bad:x:zz:alice\n\
             x:y\n",
        );
        let groups = load_groups(file.path()).unwrap();
        assert_eq!(groups.len(), 3);
        assert!(groups[0].members.is_empty());
        assert_eq!(groups[1].name, "wheel");
        assert_eq!(groups[1].members, vec!["alice", "bob"]);
        assert_eq!(groups[2].gid, 50);
        assert!(groups[2].members.is_empty());
    }

    #[test]
    fn test_non_utf8_line_does_not_fail_registry() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"root:x:0:0:root:/root:/bin/bash\n").unwrap();
        file.write_all(b"jose:x:1000:1000:Jos\xe9:/home/jose:/bin/sh\n").unwrap();
        file.write_all(b"bob:x:1001:1001::/home/bob:/bin/sh\n").unwrap();

        let users = load_users(file.path()).unwrap();
        let names: Vec<_> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["root", "jose", "bob"]);
        assert_eq!(users[1].uid, 1000);
        assert_eq!(users[1].home, "/home/jose");
    }

    #[test]
    fn test_registry_fields() {
        assert!(registry_fields("").is_none());
        assert!(registry_fields("   ").is_none());
        assert!(registry_fields("#root:x:0:0").is_none());
        assert_eq!(registry_fields("a:b:c\r").unwrap(), vec!["a", "b", "c"]);
    }
}
