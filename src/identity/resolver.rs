//! UID/GID → name resolution.
//!
//! One capability per id space: ask the system (NSS via `getpwuid_r` /
//! `getgrgid_r`) first, then retry against the raw registry file by
//! matching the third field. Unresolvable ids yield `None`.

use std::ffi::CStr;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use super::registry::{decode_line, registry_fields};
use crate::config::ScanConfig;

/// Upper bound for the NSS scratch buffer.
const MAX_LOOKUP_BUF: usize = 1 << 20;

/// Resolves numeric owner ids to user and group names.
#[derive(Debug, Clone)]
pub struct NameResolver {
    passwd_path: PathBuf,
    group_path: PathBuf,
    system_lookup: bool,
}

impl NameResolver {
    pub fn new(passwd_path: impl Into<PathBuf>, group_path: impl Into<PathBuf>) -> Self {
        Self {
            passwd_path: passwd_path.into(),
            group_path: group_path.into(),
            system_lookup: true,
        }
    }

    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(&config.passwd_path, &config.group_path).with_system_lookup(config.system_lookup)
    }

    /// Enable or disable the NSS lookup that precedes the file scan.
    pub fn with_system_lookup(mut self, enabled: bool) -> Self {
        self.system_lookup = enabled;
        self
    }

    pub fn user_name(&self, uid: u32) -> Option<String> {
        self.system_lookup
            .then(|| system_user_name(uid))
            .flatten()
            .or_else(|| scan_registry(&self.passwd_path, uid))
    }

    pub fn group_name(&self, gid: u32) -> Option<String> {
        self.system_lookup
            .then(|| system_group_name(gid))
            .flatten()
            .or_else(|| scan_registry(&self.group_path, gid))
    }
}

impl Default for NameResolver {
    fn default() -> Self {
        Self::from_config(&ScanConfig::default())
    }
}

/// First-field of the first record whose third field equals `id`.
fn scan_registry(path: &Path, id: u32) -> Option<String> {
    let file = File::open(path).ok()?;
    let id = id.to_string();

    BufReader::new(file)
        .split(b'\n')
        .map_while(std::result::Result::ok)
        .enumerate()
        .map(|(idx, raw)| decode_line(raw, idx + 1))
        .find_map(|line| {
            let fields = registry_fields(&line)?;
            (fields.len() >= 3 && fields[2] == id).then(|| fields[0].to_string())
        })
}

fn system_user_name(uid: u32) -> Option<String> {
    let mut buf: Vec<libc::c_char> = vec![0; 1024];
    loop {
        // SAFETY: all pointers reference live locals; `buf.len()` is the
        // exact capacity handed to libc.
        let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
        let mut result: *mut libc::passwd = std::ptr::null_mut();
        let rc = unsafe {
            libc::getpwuid_r(
                uid as libc::uid_t,
                &mut pwd,
                buf.as_mut_ptr(),
                buf.len(),
                &mut result,
            )
        };
        if rc == libc::ERANGE && buf.len() < MAX_LOOKUP_BUF {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 || result.is_null() || pwd.pw_name.is_null() {
            return None;
        }
        // SAFETY: on success pw_name points into `buf`, NUL-terminated.
        let name = unsafe { CStr::from_ptr(pwd.pw_name) };
        return Some(name.to_string_lossy().into_owned());
    }
}

fn system_group_name(gid: u32) -> Option<String> {
    let mut buf: Vec<libc::c_char> = vec![0; 1024];
    loop {
        // SAFETY: see system_user_name.
        let mut grp: libc::group = unsafe { std::mem::zeroed() };
        let mut result: *mut libc::group = std::ptr::null_mut();
        let rc = unsafe {
            libc::getgrgid_r(
                gid as libc::gid_t,
                &mut grp,
                buf.as_mut_ptr(),
                buf.len(),
                &mut result,
            )
        };
        if rc == libc::ERANGE && buf.len() < MAX_LOOKUP_BUF {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 || result.is_null() || grp.gr_name.is_null() {
            return None;
        }
        // SAFETY: on success gr_name points into `buf`, NUL-terminated.
        let name = unsafe { CStr::from_ptr(grp.gr_name) };
        return Some(name.to_string_lossy().into_owned());
    }
}
