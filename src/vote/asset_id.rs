//! 32-bit asset identifiers.
//!
//! The two high bits select the encoding: `00` raw number, `01` letters
//! only (5 bits per character), `10` letters and digits (6 bits per
//! character), `11` reserved. `0xFFFFFFFF` is the invalid id.

pub const ASSET_ID_INVALID: u32 = 0xFFFF_FFFF;
pub const ASSET_ID_INVALID_STR: &str = "INVALID_ID";

const HEADER_SHIFT: u32 = 30;
const HEADER_RAW: u32 = 0b00;
const HEADER_ALPHA: u32 = 0b01;
const HEADER_ALPHANUM: u32 = 0b10;

const ALPHA_MAX_CHARS: usize = 6;
const ALPHA_BITS: u32 = 5;
const ALPHANUM_MAX_CHARS: usize = 5;
const ALPHANUM_BITS: u32 = 6;

/// 'A'..='Z' encode to 0x01..=0x1A, '0'..='9' to 0x20..=0x29.
const LETTER_BASE: u8 = 0x40;
const DIGIT_BASE: u8 = 0x10;

const RAW_PREFIX: &str = "ID";
const RAW_DIGITS: usize = 10;
const RAW_MAX: u32 = 0x3FFF_FFFF;

fn header(id: u32) -> u32 {
    id >> HEADER_SHIFT
}

/// Encode a raw numeric id. Returns the invalid id for zero or when the
/// header bits are in use.
pub fn encode_raw(raw: u32) -> u32 {
    if header(raw) == HEADER_RAW && raw != 0 {
        raw
    } else {
        ASSET_ID_INVALID
    }
}

/// Encode a symbol (`"BTC"`, `"ABC09"`) or a raw id string (`"ID0000000123"`).
pub fn encode(symbol: &str) -> u32 {
    if let Some(digits) = symbol.strip_prefix(RAW_PREFIX) {
        if digits.len() == RAW_DIGITS && digits.bytes().all(|b| b.is_ascii_digit()) {
            return match digits.parse::<u64>() {
                Ok(raw) if raw <= u64::from(RAW_MAX) => encode_raw(raw as u32),
                _ => ASSET_ID_INVALID,
            };
        }
    }

    let bytes = symbol.as_bytes();
    if bytes.is_empty() {
        return ASSET_ID_INVALID;
    }

    if bytes.len() <= ALPHA_MAX_CHARS && bytes.iter().all(u8::is_ascii_uppercase) {
        let body = bytes
            .iter()
            .fold(0u32, |acc, b| (acc << ALPHA_BITS) | u32::from(b - LETTER_BASE));
        return (HEADER_ALPHA << HEADER_SHIFT) | body;
    }

    let alphanumeric = bytes
        .iter()
        .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit());
    if bytes.len() <= ALPHANUM_MAX_CHARS && alphanumeric {
        let body = bytes.iter().fold(0u32, |acc, b| {
            let code = if b.is_ascii_digit() {
                b - DIGIT_BASE
            } else {
                b - LETTER_BASE
            };
            (acc << ALPHANUM_BITS) | u32::from(code)
        });
        return (HEADER_ALPHANUM << HEADER_SHIFT) | body;
    }

    ASSET_ID_INVALID
}

fn decode_symbol(id: u32, bits: u32, max_chars: usize, alphanumeric: bool) -> Option<String> {
    let mask = (1u32 << bits) - 1;
    let mut symbol = String::with_capacity(max_chars);
    let mut has_digit = false;

    for position in (0..max_chars).rev() {
        let code = ((id >> (position as u32 * bits)) & mask) as u8;
        if code == 0 {
            // Leading positions may be empty, inner ones may not.
            if symbol.is_empty() {
                continue;
            }
            return None;
        }
        let c = match code {
            0x01..=0x1A => char::from(code + LETTER_BASE),
            0x20..=0x29 if alphanumeric => {
                has_digit = true;
                char::from(code + DIGIT_BASE)
            }
            _ => return None,
        };
        symbol.push(c);
    }

    // A letters-only symbol in the alphanumeric space has a canonical
    // letters-only id instead.
    if symbol.is_empty() || (alphanumeric && !has_digit) {
        return None;
    }
    Some(symbol)
}

/// Decode an id into its string form, if the id is valid.
pub fn decode(id: u32) -> Option<String> {
    if id == ASSET_ID_INVALID {
        return None;
    }
    match header(id) {
        HEADER_RAW if id != 0 => Some(format!("{RAW_PREFIX}{id:010}")),
        HEADER_ALPHA => decode_symbol(id, ALPHA_BITS, ALPHA_MAX_CHARS, false),
        HEADER_ALPHANUM => decode_symbol(id, ALPHANUM_BITS, ALPHANUM_MAX_CHARS, true),
        _ => None,
    }
}

pub fn is_valid(id: u32) -> bool {
    decode(id).is_some()
}

/// String form of an id, `INVALID_ID` for invalid ones.
pub fn to_display(id: u32) -> String {
    decode(id).unwrap_or_else(|| ASSET_ID_INVALID_STR.to_string())
}

/// Display metadata of a known asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinMetadata {
    pub symbol: &'static str,
    pub name: &'static str,
    pub unit_exponent: u8,
}

const COIN_METADATA: &[CoinMetadata] = &[
    CoinMetadata { symbol: "BKS", name: "Blockshares", unit_exponent: 4 },
    CoinMetadata { symbol: "BKC", name: "Blockcredits", unit_exponent: 4 },
    CoinMetadata { symbol: "BTC", name: "Bitcoin", unit_exponent: 8 },
    CoinMetadata { symbol: "LTC", name: "Litecoin", unit_exponent: 8 },
    CoinMetadata { symbol: "DOGE", name: "Dogecoin", unit_exponent: 8 },
    CoinMetadata { symbol: "RDD", name: "Reddcoin", unit_exponent: 8 },
    CoinMetadata { symbol: "DASH", name: "Dash", unit_exponent: 8 },
    CoinMetadata { symbol: "PPC", name: "Peercoin", unit_exponent: 6 },
    CoinMetadata { symbol: "NMC", name: "Namecoin", unit_exponent: 8 },
    CoinMetadata { symbol: "FTC", name: "Feathercoin", unit_exponent: 8 },
    CoinMetadata { symbol: "XCP", name: "Counterparty", unit_exponent: 8 },
    CoinMetadata { symbol: "BLK", name: "Blackcoin", unit_exponent: 8 },
    CoinMetadata { symbol: "NSR", name: "NuShares", unit_exponent: 8 },
    CoinMetadata { symbol: "NBT", name: "NuBits", unit_exponent: 4 },
    CoinMetadata { symbol: "MZC", name: "Mazacoin", unit_exponent: 8 },
    CoinMetadata { symbol: "VIA", name: "Viacoin", unit_exponent: 8 },
    CoinMetadata { symbol: "RBY", name: "Rubycoin", unit_exponent: 8 },
    CoinMetadata { symbol: "GRS", name: "Groestlcoin", unit_exponent: 8 },
    CoinMetadata { symbol: "DGC", name: "Digitalcoin", unit_exponent: 8 },
    CoinMetadata { symbol: "CCN", name: "Cannacoin", unit_exponent: 8 },
    CoinMetadata { symbol: "DGB", name: "DigiByte", unit_exponent: 8 },
    CoinMetadata { symbol: "NVC", name: "Novacoin", unit_exponent: 6 },
    CoinMetadata { symbol: "MONA", name: "Monacoin", unit_exponent: 8 },
    CoinMetadata { symbol: "CLAM", name: "Clams", unit_exponent: 6 },
    CoinMetadata { symbol: "XPM", name: "Primecoin", unit_exponent: 6 },
    CoinMetadata { symbol: "NEOS", name: "Neoscoin", unit_exponent: 8 },
    CoinMetadata { symbol: "JBS", name: "Jumbucks", unit_exponent: 8 },
    CoinMetadata { symbol: "PND", name: "Pandacoin", unit_exponent: 8 },
    CoinMetadata { symbol: "VTC", name: "Vertcoin", unit_exponent: 8 },
    CoinMetadata { symbol: "NXT", name: "NXT", unit_exponent: 8 },
    CoinMetadata { symbol: "BURST", name: "Burst", unit_exponent: 8 },
    CoinMetadata { symbol: "VPN", name: "Vpncoin", unit_exponent: 8 },
    CoinMetadata { symbol: "CDN", name: "Canada eCoin", unit_exponent: 8 },
    CoinMetadata { symbol: "SDC", name: "ShadowCash", unit_exponent: 8 },
];

/// Look up display metadata for a known asset id.
pub fn metadata(id: u32) -> Option<&'static CoinMetadata> {
    COIN_METADATA.iter().find(|m| encode(m.symbol) == id)
}
