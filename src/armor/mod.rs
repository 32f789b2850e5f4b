//! ASCII armor encoding and decoding for keys and signatures.
//!
//! Implements the RFC 4880 armor format so binary key and signature
//! material can travel through text-only channels. Posts carry their public
//! key and detached signature as armored blocks.

use crate::error::{Result, SnarlError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::collections::HashMap;

/// CRC-24 polynomial used for armor checksums (RFC 4880 §6.1).
const CRC24_POLY: u32 = 0x1864CFB;
const CRC24_INIT: u32 = 0xB704CE;

/// Width of the base64 body lines.
const LINE_WIDTH: usize = 64;

/// ASCII armor block types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArmorType {
    /// Generic message block
    Message,
    /// Public key block
    PublicKey,
    /// Private key block
    PrivateKey,
    /// Detached signature block
    Signature,
}

impl ArmorType {
    /// Returns the armor header label for this type.
    pub fn label(&self) -> &'static str {
        match self {
            ArmorType::Message => "PGP MESSAGE",
            ArmorType::PublicKey => "PGP PUBLIC KEY BLOCK",
            ArmorType::PrivateKey => "PGP PRIVATE KEY BLOCK",
            ArmorType::Signature => "PGP SIGNATURE",
        }
    }

    /// Parses an armor type from its header label.
    pub fn from_label(label: &str) -> Result<Self> {
        match label {
            "PGP MESSAGE" => Ok(ArmorType::Message),
            "PGP PUBLIC KEY BLOCK" => Ok(ArmorType::PublicKey),
            "PGP PRIVATE KEY BLOCK" => Ok(ArmorType::PrivateKey),
            "PGP SIGNATURE" => Ok(ArmorType::Signature),
            other => Err(SnarlError::armor(format!(
                "unknown armor block type: {}",
                other
            ))),
        }
    }
}

/// A decoded armor block: type, headers and binary body.
#[derive(Debug, Clone)]
pub struct ArmoredData {
    /// The block type
    pub armor_type: ArmorType,
    /// Armor headers (key-value pairs)
    pub headers: HashMap<String, String>,
    /// The decoded binary data
    pub data: Vec<u8>,
}

/// Calculates the CRC-24 checksum used in armor trailers.
pub fn crc24(data: &[u8]) -> u32 {
    let mut crc = CRC24_INIT;
    for &byte in data {
        crc ^= (byte as u32) << 16;
        for _ in 0..8 {
            if (crc & 0x800000) != 0 {
                crc = (crc << 1) ^ CRC24_POLY;
            } else {
                crc <<= 1;
            }
            crc &= 0xFFFFFF;
        }
    }
    crc
}

/// Encodes binary data as an ASCII armored block.
pub fn encode(data: &[u8], armor_type: ArmorType) -> String {
    let label = armor_type.label();
    let mut output = format!("-----BEGIN {}-----\n\n", label);

    let body = STANDARD.encode(data);
    for chunk in body.as_bytes().chunks(LINE_WIDTH) {
        // chunks of an ASCII string are valid UTF-8
        output.push_str(std::str::from_utf8(chunk).unwrap());
        output.push('\n');
    }

    let checksum = crc24(data);
    let checksum_bytes = [
        ((checksum >> 16) & 0xFF) as u8,
        ((checksum >> 8) & 0xFF) as u8,
        (checksum & 0xFF) as u8,
    ];
    output.push('=');
    output.push_str(&STANDARD.encode(checksum_bytes));
    output.push('\n');

    output.push_str(&format!("-----END {}-----\n", label));
    output
}

/// Decodes an ASCII armored block.
///
/// Verifies the CRC-24 trailer when present and checks that the END line
/// matches the BEGIN line.
pub fn decode(armored: &str) -> Result<ArmoredData> {
    let mut lines = armored.lines();

    // Locate the BEGIN line
    let armor_type = loop {
        let line = lines
            .next()
            .ok_or_else(|| SnarlError::armor("no armor header found"))?;
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix("-----BEGIN ") {
            if let Some(label) = rest.strip_suffix("-----") {
                break ArmorType::from_label(label)?;
            }
        }
    };

    let mut headers = HashMap::new();
    let mut body = String::new();
    let mut checksum: Option<String> = None;
    let mut end_seen = false;
    let mut in_headers = true;

    for line in lines {
        let trimmed = line.trim();

        if trimmed == format!("-----END {}-----", armor_type.label()) {
            end_seen = true;
            break;
        }
        if trimmed.starts_with("-----END ") {
            return Err(SnarlError::armor("mismatched armor END line"));
        }

        if in_headers {
            if trimmed.is_empty() {
                in_headers = false;
                continue;
            }
            if let Some((key, value)) = trimmed.split_once(':') {
                headers.insert(key.trim().to_string(), value.trim().to_string());
                continue;
            }
            // No colon: this is already body data
            in_headers = false;
        }

        if let Some(rest) = trimmed.strip_prefix('=') {
            checksum = Some(rest.to_string());
        } else if !trimmed.is_empty() {
            body.push_str(trimmed);
        }
    }

    if !end_seen {
        return Err(SnarlError::armor("missing armor END line"));
    }

    let data = STANDARD
        .decode(body.as_bytes())
        .map_err(|e| SnarlError::armor(format!("invalid armor body: {}", e)))?;

    if let Some(checksum_b64) = checksum {
        let checksum_bytes = STANDARD
            .decode(checksum_b64.as_bytes())
            .map_err(|e| SnarlError::armor(format!("invalid armor checksum: {}", e)))?;
        if checksum_bytes.len() != 3 {
            return Err(SnarlError::armor("invalid armor checksum length"));
        }
        let expected = ((checksum_bytes[0] as u32) << 16)
            | ((checksum_bytes[1] as u32) << 8)
            | (checksum_bytes[2] as u32);
        let actual = crc24(&data);
        if actual != expected {
            return Err(SnarlError::armor(format!(
                "armor checksum mismatch: expected {:06X}, got {:06X}",
                expected, actual
            )));
        }
    }

    Ok(ArmoredData {
        armor_type,
        headers,
        data,
    })
}

/// Encodes a public key as an armored block.
pub fn encode_public_key(key_data: &[u8]) -> String {
    encode(key_data, ArmorType::PublicKey)
}

/// Encodes a detached signature as an armored block.
pub fn encode_signature(signature_data: &[u8]) -> String {
    encode(signature_data, ArmorType::Signature)
}
