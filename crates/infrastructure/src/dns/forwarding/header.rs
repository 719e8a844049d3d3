//! Raw access to the two flag bytes of a DNS header.
//!
//! ```text
//! byte 2: QR | OPCODE(4) | AA | TC | RD
//! byte 3: RA | Z | AD | CD | RCODE(4)
//! ```

use super::DNS_HEADER_LEN;
use cachedns_domain::HeaderFlags;

const QR_BIT: u8 = 0x80;
const RD_BIT: u8 = 0x01;
const RA_BIT: u8 = 0x80;
const OPCODE_MASK: u8 = 0x0F;
const RCODE_MASK: u8 = 0x0F;

pub fn message_id(buf: &[u8]) -> Option<u16> {
    if buf.len() < 2 {
        return None;
    }
    Some(u16::from_be_bytes([buf[0], buf[1]]))
}

/// Reads the flag snapshot kept in the cache. `None` for a short buffer.
pub fn read_flags(buf: &[u8]) -> Option<HeaderFlags> {
    if buf.len() < DNS_HEADER_LEN {
        return None;
    }
    Some(HeaderFlags {
        response: buf[2] & QR_BIT != 0,
        opcode: (buf[2] >> 3) & OPCODE_MASK,
        rcode: u16::from(buf[3] & RCODE_MASK),
        recursion_desired: buf[2] & RD_BIT != 0,
    })
}

/// Overwrites the flag bytes of an encoded message with a cached snapshot.
/// AA, TC and the Z bits are cleared, RA is always set.
pub fn write_flags(buf: &mut [u8], flags: &HeaderFlags) {
    if buf.len() < DNS_HEADER_LEN {
        return;
    }
    let mut b2 = (flags.opcode & OPCODE_MASK) << 3;
    if flags.response {
        b2 |= QR_BIT;
    }
    if flags.recursion_desired {
        b2 |= RD_BIT;
    }
    buf[2] = b2;
    buf[3] = RA_BIT | (flags.rcode as u8 & RCODE_MASK);
}
