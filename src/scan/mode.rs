//! Permission bits: masks, class/access tests, and `ls`-style rendering.

use std::fmt;

pub const S_ISUID: u32 = 0o4000;
pub const S_ISGID: u32 = 0o2000;
pub const S_ISVTX: u32 = 0o1000;

/// The 12 permission bits (rwx triads plus setuid/setgid/sticky).
pub const PERMISSION_MASK: u32 = 0o7777;

/// Who a permission triad applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Class {
    Owner,
    Group,
    Other,
}

/// One bit of a permission triad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Read,
    Write,
    Execute,
}

impl Class {
    pub const ALL: [Class; 3] = [Class::Owner, Class::Group, Class::Other];

    fn shift(self) -> u32 {
        match self {
            Class::Owner => 6,
            Class::Group => 3,
            Class::Other => 0,
        }
    }

    /// Mask of `access` for this class, e.g. `Owner`/`Write` ⇒ `0o200`.
    pub fn mask(self, access: Access) -> u32 {
        let bit = match access {
            Access::Read => 0o4,
            Access::Write => 0o2,
            Access::Execute => 0o1,
        };
        bit << self.shift()
    }
}

impl Access {
    pub const ALL: [Access; 3] = [Access::Read, Access::Write, Access::Execute];
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Read => write!(f, "read"),
            Access::Write => write!(f, "write"),
            Access::Execute => write!(f, "execute"),
        }
    }
}

pub fn allows(mode: u32, class: Class, access: Access) -> bool {
    mode & class.mask(access) != 0
}

/// Render the 9-character symbolic form (`rwsr-xr-x`).
///
/// setuid/setgid show as `s` over an execute bit and `S` without one;
/// sticky shows as `t`/`T` in the other-execute slot.
pub fn mode_string(mode: u32) -> String {
    let mut out = [b'-'; 9];
    for (i, class) in Class::ALL.iter().enumerate() {
        for (j, access) in Access::ALL.iter().enumerate() {
            if allows(mode, *class, *access) {
                out[i * 3 + j] = b"rwx"[j];
            }
        }
    }

    for (bit, slot, set_char) in [(S_ISUID, 2, b's'), (S_ISGID, 5, b's'), (S_ISVTX, 8, b't')] {
        if mode & bit != 0 {
            out[slot] = if out[slot] == b'x' {
                set_char
            } else {
                set_char.to_ascii_uppercase()
            };
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

/// Octal form of the 12 permission bits with a leading zero (`04755`).
pub fn mode_octal(mode: u32) -> String {
    match mode & PERMISSION_MASK {
        0 => "0".to_string(),
        bits => format!("0{:o}", bits),
    }
}
