//! IP address normalization.
//!
//! Turns an arbitrary input string into the numeric form used by the range
//! lookup. IPv6 addresses that embed an IPv4 address (IPv4-mapped, 6to4 and
//! Teredo) are unwrapped so they are looked up in the IPv4 table.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// First address of `2002::/16`.
pub const FROM_6TO4: u128 = 42545680458834377588178886921629466624;
/// Last address of `2002::/16`.
pub const TO_6TO4: u128 = 42550872755692912415807417417958686719;
/// First address of `2001:0000::/32`.
pub const FROM_TEREDO: u128 = 42540488161975842760550356425300246528;
/// Last address of `2001:0000::/32`.
pub const TO_TEREDO: u128 = 42540488241204005274814694018844196863;

const LAST_32_BITS: u128 = 0xFFFF_FFFF;

/// `::FFFF:a.b.c.d`, with any run of leading zero groups.
static MAPPED_DOTTED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[:0]+:F{4}:(\d+\.){3}\d+$").expect("valid regex"));
static MAPPED_DOTTED_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[:0]+:F{4}:").expect("valid regex"));

/// `::FFFF:hhhh:hhhh`, the hextet spelling of an IPv4-mapped address.
static MAPPED_HEXTET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[:0]+F{4}(:[\dA-Z]{4}){2}$").expect("valid regex"));
static MAPPED_HEXTET_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[:0]+F{4}:").expect("valid regex"));

/// Address family of a normalized address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum IpFamily {
    /// Not an IP address
    #[default]
    Invalid = 0,
    /// IPv4, or IPv6 carrying an embedded IPv4 address
    V4 = 4,
    /// IPv6
    V6 = 6,
}

impl IpFamily {
    /// Convert to the numeric family (0, 4 or 6).
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// A normalized IP address, produced fresh for every query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressValue {
    /// The input as given by the caller
    pub input: String,
    /// The address as reported back; IPv4-mapped literals become dotted-quad
    pub display: String,
    /// Effective family used for the table lookup
    pub family: IpFamily,
    /// Numeric address; 0 when `family` is `Invalid`
    pub value: u128,
}

impl AddressValue {
    /// Whether the input parsed as an address.
    pub fn is_valid(&self) -> bool {
        self.family != IpFamily::Invalid
    }

    /// Decimal string of the numeric value.
    pub fn ip_no(&self) -> String {
        self.value.to_string()
    }
}

/// Normalize an IP address string.
///
/// Never fails: unparseable input yields family `Invalid` and value 0.
///
/// # Examples
/// ```
/// use ip2l::{normalize, IpFamily};
///
/// let addr = normalize("::FFFF:8.8.8.8");
/// assert_eq!(addr.family, IpFamily::V4);
/// assert_eq!(addr.display, "8.8.8.8");
/// assert_eq!(addr.value, 134744072);
/// ```
pub fn normalize(ip: &str) -> AddressValue {
    let mut display = ip.to_string();
    let mut family = detect(&display);

    if family == IpFamily::V6 {
        if MAPPED_DOTTED.is_match(&display) {
            display = MAPPED_DOTTED_PREFIX.replace(&display, "").into_owned();
            family = detect(&display);
        } else if MAPPED_HEXTET.is_match(&display) {
            let hex = MAPPED_HEXTET_PREFIX.replace(&display, "").replacen(':', "", 1);
            if let Some(dotted) = hex_to_dotted_quad(&hex) {
                display = dotted;
                family = detect(&display);
            }
        }
    }

    let (family, value) = match family {
        IpFamily::V4 => match display.parse::<Ipv4Addr>() {
            Ok(v4) => (IpFamily::V4, u32::from(v4) as u128),
            Err(_) => (IpFamily::Invalid, 0),
        },
        IpFamily::V6 => match strip_zone(&display).parse::<Ipv6Addr>() {
            Ok(v6) => unwrap_embedded_v4(u128::from(v6)),
            Err(_) => (IpFamily::Invalid, 0),
        },
        IpFamily::Invalid => (IpFamily::Invalid, 0),
    };

    AddressValue {
        input: ip.to_string(),
        display,
        family,
        value,
    }
}

/// Syntactic family check.
fn detect(ip: &str) -> IpFamily {
    if ip.parse::<Ipv4Addr>().is_ok() {
        IpFamily::V4
    } else if strip_zone(ip).parse::<Ipv6Addr>().is_ok() {
        IpFamily::V6
    } else {
        IpFamily::Invalid
    }
}

/// Drop a `%zone` suffix from a link-local IPv6 literal.
fn strip_zone(ip: &str) -> &str {
    match ip.find('%') {
        Some(idx) if idx > 0 && idx + 1 < ip.len() => &ip[..idx],
        _ => ip,
    }
}

/// "08080808" -> "8.8.8.8"
fn hex_to_dotted_quad(hex: &str) -> Option<String> {
    if hex.len() != 8 || !hex.is_ascii() {
        return None;
    }
    let mut octets = [0u8; 4];
    for (i, octet) in octets.iter_mut().enumerate() {
        *octet = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(Ipv4Addr::from(octets).to_string())
}

/// Extract the IPv4 address carried by a 6to4 or Teredo address.
fn unwrap_embedded_v4(value: u128) -> (IpFamily, u128) {
    if (FROM_6TO4..=TO_6TO4).contains(&value) {
        // 2002:AABB:CCDD:: carries AA.BB.CC.DD in bits 80..111
        (IpFamily::V4, (value >> 80) & LAST_32_BITS)
    } else if (FROM_TEREDO..=TO_TEREDO).contains(&value) {
        // Teredo stores the client address inverted in the low 32 bits
        (IpFamily::V4, !value & LAST_32_BITS)
    } else {
        (IpFamily::V6, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4() {
        let addr = normalize("8.8.8.8");
        assert_eq!(addr.display, "8.8.8.8");
        assert_eq!(addr.family, IpFamily::V4);
        assert_eq!(addr.value, 134744072);
        assert_eq!(addr.ip_no(), "134744072");
    }

    #[test]
    fn test_ipv4_round_trip() {
        for ip in [
            "0.0.0.0",
            "1.2.3.4",
            "10.0.0.1",
            "127.0.0.1",
            "192.168.255.254",
            "255.255.255.255",
        ] {
            let addr = normalize(ip);
            assert_eq!(addr.family, IpFamily::V4, "{}", ip);
            let back = Ipv4Addr::from(addr.value as u32).to_string();
            assert_eq!(back, ip);
        }
    }

    #[test]
    fn test_ipv6() {
        let addr = normalize("2001:4860:4860::8888");
        assert_eq!(addr.display, "2001:4860:4860::8888");
        assert_eq!(addr.family, IpFamily::V6);
        assert_eq!(addr.ip_no(), "42541956123769884636017138956568135816");
    }

    #[test]
    fn test_ipv6_group_assembly() {
        // left-hand groups count from the most significant end,
        // right-hand groups from the least significant end
        assert_eq!(normalize("::1").value, 1);
        assert_eq!(normalize("1::").value, 1u128 << 112);
        assert_eq!(normalize("1:2::3:4").value, (1u128 << 112) | (2u128 << 96) | (3 << 16) | 4);
        assert_eq!(normalize("ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff").value, u128::MAX);
    }

    #[test]
    fn test_ipv4_mapped() {
        let addr = normalize("::FFFF:8.8.8.8");
        assert_eq!(addr.input, "::FFFF:8.8.8.8");
        assert_eq!(addr.display, "8.8.8.8");
        assert_eq!(addr.family, IpFamily::V4);
        assert_eq!(addr.value, 134744072);

        let addr = normalize("0:0:0:0:0:ffff:1.2.3.4");
        assert_eq!(addr.display, "1.2.3.4");
        assert_eq!(addr.family, IpFamily::V4);
    }

    #[test]
    fn test_ipv4_mapped_hextets() {
        let addr = normalize("::FFFF:0808:0808");
        assert_eq!(addr.display, "8.8.8.8");
        assert_eq!(addr.family, IpFamily::V4);
        assert_eq!(addr.value, 134744072);
    }

    #[test]
    fn test_6to4() {
        let addr = normalize("2002:808:808::");
        assert_eq!(addr.display, "2002:808:808::");
        assert_eq!(addr.family, IpFamily::V4);
        assert_eq!(addr.value, 134744072);
    }

    #[test]
    fn test_teredo() {
        let addr = normalize("2001:0000:4136:E378:8000:63BF:F7F7:F7F7");
        assert_eq!(addr.display, "2001:0000:4136:E378:8000:63BF:F7F7:F7F7");
        assert_eq!(addr.family, IpFamily::V4);
        assert_eq!(addr.value, 134744072);
    }

    #[test]
    fn test_embedded_ranges_are_inclusive() {
        assert_eq!(unwrap_embedded_v4(FROM_6TO4).0, IpFamily::V4);
        assert_eq!(unwrap_embedded_v4(TO_6TO4).0, IpFamily::V4);
        assert_eq!(unwrap_embedded_v4(TO_6TO4 + 1).0, IpFamily::V6);
        assert_eq!(unwrap_embedded_v4(FROM_TEREDO).0, IpFamily::V4);
        assert_eq!(unwrap_embedded_v4(TO_TEREDO).0, IpFamily::V4);
        assert_eq!(unwrap_embedded_v4(FROM_TEREDO - 1).0, IpFamily::V6);
    }

    #[test]
    fn test_zone_index() {
        let addr = normalize("fe80::1%eth0");
        assert_eq!(addr.family, IpFamily::V6);
        assert_eq!(addr.value, normalize("fe80::1").value);
    }

    #[test]
    fn test_invalid() {
        for ip in ["255.255.255.256", "FFFF::FFFG", "", "example.com", "1.2.3", "%eth0"] {
            let addr = normalize(ip);
            assert_eq!(addr.family, IpFamily::Invalid, "{}", ip);
            assert_eq!(addr.value, 0);
            assert_eq!(addr.display, ip);
            assert!(!addr.is_valid());
        }
    }
}
