//! Micro-segment (uSID) compression codec.
//!
//! A uSID block is a single 128-bit address packing a shared locator
//! followed by the node identifiers of up to
//! `(128 - locator_bits) / usid_id_bits` SIDs, zero-padded at the tail.
//! Compression is lossless and order-preserving; no decompression is
//! performed anywhere in the control plane.

use crate::error::CodecError;
use crate::sid::{Locator, Sid};

/// Default number of bits of the SID locator.
pub const DEFAULT_LOCATOR_BITS: u8 = 32;

/// Default number of bits of a uSID identifier.
pub const DEFAULT_USID_ID_BITS: u8 = 16;

/// Number of identifiers one uSID block can hold.
pub fn block_capacity(locator_bits: u8, usid_id_bits: u8) -> Result<usize, CodecError> {
    if locator_bits == 0
        || usid_id_bits == 0
        || (locator_bits as u16) + (usid_id_bits as u16) > 128
    {
        return Err(CodecError::InvalidWidths {
            locator_bits,
            usid_id_bits,
        });
    }
    Ok((128 - locator_bits as usize) / usid_id_bits as usize)
}

/// Mask selecting the locator part of an address.
pub fn locator_mask(locator_bits: u8) -> u128 {
    if locator_bits == 0 {
        return 0;
    }
    !0u128 << (128 - locator_bits.min(128) as u32)
}

/// Returns the locator shared by every SID in the list.
///
/// Fails with [`CodecError::LocatorMismatch`] as soon as a SID disagrees
/// with the locator of the first one; inconsistent lists are never
/// silently truncated.
pub fn get_locator(segments: &[Sid], locator_bits: u8) -> Result<Locator, CodecError> {
    if locator_bits == 0 || locator_bits > 128 {
        return Err(CodecError::InvalidWidths {
            locator_bits,
            usid_id_bits: 0,
        });
    }
    let first = segments.first().ok_or(CodecError::EmptySegmentList)?;
    let mask = locator_mask(locator_bits);
    let locator = Locator::from_bits(first.bits() & mask);
    for sid in segments {
        if sid.bits() & mask != locator.bits() {
            return Err(CodecError::LocatorMismatch {
                sid: *sid,
                locator,
            });
        }
    }
    Ok(locator)
}

/// Packs one group of SIDs into a single uSID block under a known locator.
fn compress_with_locator(
    locator: Locator,
    segments: &[Sid],
    locator_bits: u8,
    usid_id_bits: u8,
) -> Result<Sid, CodecError> {
    let capacity = block_capacity(locator_bits, usid_id_bits)?;
    if segments.len() > capacity {
        return Err(CodecError::TooManySegments {
            count: segments.len(),
            capacity,
        });
    }
    let mask = locator_mask(locator_bits);
    let mut usid = locator.bits();
    // First identifier lands right after the locator, the next one one
    // identifier-width further, and so on.
    let mut offset = locator_bits as u32;
    for sid in segments {
        let bits = sid.bits();
        if bits & mask != locator.bits() {
            return Err(CodecError::LocatorMismatch {
                sid: *sid,
                locator,
            });
        }
        // Bits below the identifier field must be zero, otherwise part of
        // the SID would be dropped by the compression.
        let tail_shift = locator_bits as u32 + usid_id_bits as u32;
        if tail_shift < 128 && (bits << tail_shift) != 0 {
            return Err(CodecError::InvalidSid { sid: *sid });
        }
        let id = (bits << locator_bits as u32) >> (128 - usid_id_bits as u32);
        usid |= id << (128 - offset - usid_id_bits as u32);
        offset += usid_id_bits as u32;
    }
    Ok(Sid::from_bits(usid))
}

/// Compresses a segment list into a single uSID block.
///
/// Valid only when the list fits one block; longer lists go through
/// [`compress_list`]. All SIDs must share one locator.
pub fn compress(segments: &[Sid], locator_bits: u8, usid_id_bits: u8) -> Result<Sid, CodecError> {
    block_capacity(locator_bits, usid_id_bits)?;
    let locator = get_locator(segments, locator_bits)?;
    compress_with_locator(locator, segments, locator_bits, usid_id_bits)
}

/// Compresses a segment list of any length into an ordered uSID list.
///
/// The list is split into consecutive chunks of the block capacity (the
/// last chunk may be shorter) and each chunk becomes one block, so the
/// output holds `ceil(n / capacity)` blocks in the original order.
pub fn compress_list(
    segments: &[Sid],
    locator_bits: u8,
    usid_id_bits: u8,
) -> Result<Vec<Sid>, CodecError> {
    let capacity = block_capacity(locator_bits, usid_id_bits)?;
    let locator = get_locator(segments, locator_bits)?;
    segments
        .chunks(capacity)
        .map(|chunk| compress_with_locator(locator, chunk, locator_bits, usid_id_bits))
        .collect()
}

/// Compresses a segment list followed by a group of decap SIDs.
///
/// This is the form used by uSID policies: the trailing decap SIDs
/// (egress uN + uDT pair) must all land in the same block, so segments
/// are grouped with one slot of each block kept free and the decap group
/// is appended unsplit to the first block with enough room.
pub fn compress_list_with_decap(
    segments: &[Sid],
    decap_sids: &[Sid],
    locator_bits: u8,
    usid_id_bits: u8,
) -> Result<Vec<Sid>, CodecError> {
    let capacity = block_capacity(locator_bits, usid_id_bits)?;
    // Keep the last slot free so a block can always be continued.
    let group_size = capacity.saturating_sub(1);
    if group_size == 0 || decap_sids.len() > group_size {
        return Err(CodecError::TooManySegments {
            count: decap_sids.len(),
            capacity: group_size,
        });
    }
    let all: Vec<Sid> = segments.iter().chain(decap_sids).copied().collect();
    let locator = get_locator(&all, locator_bits)?;

    let mut usid_list = Vec::new();
    let mut remaining = segments;
    let mut decap = decap_sids;
    while !remaining.is_empty() || !decap.is_empty() {
        let take = remaining.len().min(group_size);
        let mut group: Vec<Sid> = remaining[..take].to_vec();
        // The decap group cannot be split across blocks: append it only
        // once the rest of the list fits alongside it.
        if remaining.len() + decap.len() <= group_size {
            group.extend_from_slice(decap);
            decap = &[];
        }
        usid_list.push(compress_with_locator(
            locator,
            &group,
            locator_bits,
            usid_id_bits,
        )?);
        remaining = &remaining[take..];
    }
    Ok(usid_list)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sids(addrs: &[&str]) -> Vec<Sid> {
        addrs.iter().map(|a| a.parse().unwrap()).collect()
    }

    fn sid(addr: &str) -> Sid {
        addr.parse().unwrap()
    }

    #[test]
    fn test_block_capacity_defaults() {
        assert_eq!(
            block_capacity(DEFAULT_LOCATOR_BITS, DEFAULT_USID_ID_BITS).unwrap(),
            6
        );
    }

    #[test]
    fn test_block_capacity_invalid_widths() {
        assert!(matches!(
            block_capacity(120, 16),
            Err(CodecError::InvalidWidths { .. })
        ));
        assert!(matches!(
            block_capacity(32, 0),
            Err(CodecError::InvalidWidths { .. })
        ));
    }

    #[test]
    fn test_get_locator() {
        let list = sids(&[
            "fcbb:bb00:0001::",
            "FCBB:BB00:0002::",
            "FCBB:BB00:0003::",
        ]);
        let locator = get_locator(&list, DEFAULT_LOCATOR_BITS).unwrap();
        assert_eq!(locator.to_string(), "fcbb:bb00::");
    }

    #[test]
    fn test_get_locator_mismatch() {
        let list = sids(&["fcbb:bb00:0001::", "fcbb:cc00:0002::"]);
        assert!(matches!(
            get_locator(&list, DEFAULT_LOCATOR_BITS),
            Err(CodecError::LocatorMismatch { .. })
        ));
    }

    #[test]
    fn test_get_locator_empty() {
        assert!(matches!(
            get_locator(&[], DEFAULT_LOCATOR_BITS),
            Err(CodecError::EmptySegmentList)
        ));
    }

    #[test]
    fn test_compress_three_sids() {
        let list = sids(&[
            "fcbb:bb00:0001::",
            "FCBB:BB00:0002::",
            "FCBB:BB00:0003::",
        ]);
        let usid = compress(&list, DEFAULT_LOCATOR_BITS, DEFAULT_USID_ID_BITS).unwrap();
        assert_eq!(usid, sid("fcbb:bb00:0001:0002:0003::"));
        // Lower-case canonical output
        assert_eq!(usid.to_string(), "fcbb:bb00:1:2:3::");
    }

    #[test]
    fn test_compress_full_block() {
        let list = sids(&[
            "fcbb:bb00:0001::",
            "fcbb:bb00:0002::",
            "fcbb:bb00:0003::",
            "fcbb:bb00:0004::",
            "fcbb:bb00:0005::",
            "fcbb:bb00:0006::",
        ]);
        let usid = compress(&list, DEFAULT_LOCATOR_BITS, DEFAULT_USID_ID_BITS).unwrap();
        assert_eq!(usid, sid("fcbb:bb00:0001:0002:0003:0004:0005:0006"));
    }

    #[test]
    fn test_compress_too_many_segments() {
        let list = sids(&[
            "fcbb:bb00:0001::",
            "fcbb:bb00:0002::",
            "fcbb:bb00:0003::",
            "fcbb:bb00:0004::",
            "fcbb:bb00:0005::",
            "fcbb:bb00:0006::",
            "fcbb:bb00:0007::",
        ]);
        assert!(matches!(
            compress(&list, DEFAULT_LOCATOR_BITS, DEFAULT_USID_ID_BITS),
            Err(CodecError::TooManySegments {
                count: 7,
                capacity: 6
            })
        ));
    }

    #[test]
    fn test_compress_case_insensitive() {
        let upper = sids(&["FCBB:BB00:0001::", "FCBB:BB00:0002::"]);
        let lower = sids(&["fcbb:bb00:0001::", "fcbb:bb00:0002::"]);
        let a = compress(&upper, DEFAULT_LOCATOR_BITS, DEFAULT_USID_ID_BITS).unwrap();
        let b = compress(&lower, DEFAULT_LOCATOR_BITS, DEFAULT_USID_ID_BITS).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), a.to_string().to_lowercase());
    }

    #[test]
    fn test_compress_rejects_dirty_tail() {
        // Bits below the identifier field must be zero.
        let list = sids(&["fcbb:bb00:0001:0099::"]);
        assert!(matches!(
            compress(&list, DEFAULT_LOCATOR_BITS, DEFAULT_USID_ID_BITS),
            Err(CodecError::InvalidSid { .. })
        ));
    }

    #[test]
    fn test_compress_list_round_count() {
        for n in 1..=14usize {
            let list: Vec<Sid> = (1..=n)
                .map(|i| format!("fcbb:bb00:{:04x}::", i).parse().unwrap())
                .collect();
            let usids =
                compress_list(&list, DEFAULT_LOCATOR_BITS, DEFAULT_USID_ID_BITS).unwrap();
            assert_eq!(usids.len(), n.div_ceil(6), "wrong block count for {} SIDs", n);
        }
    }

    #[test]
    fn test_compress_list_chunking() {
        let list: Vec<Sid> = (1..=8)
            .map(|i| format!("fcbb:bb00:{:04x}::", i).parse().unwrap())
            .collect();
        let usids = compress_list(&list, DEFAULT_LOCATOR_BITS, DEFAULT_USID_ID_BITS).unwrap();
        assert_eq!(
            usids,
            vec![
                sid("fcbb:bb00:0001:0002:0003:0004:0005:0006"),
                sid("fcbb:bb00:0007:0008::"),
            ]
        );
    }

    #[test]
    fn test_compress_list_locator_mismatch_across_chunks() {
        let mut list: Vec<Sid> = (1..=7)
            .map(|i| format!("fcbb:bb00:{:04x}::", i).parse().unwrap())
            .collect();
        list.push(sid("fcbb:cc00:0008::"));
        assert!(matches!(
            compress_list(&list, DEFAULT_LOCATOR_BITS, DEFAULT_USID_ID_BITS),
            Err(CodecError::LocatorMismatch { .. })
        ));
    }

    #[test]
    fn test_compress_list_with_decap_fits_one_block() {
        let inner = sids(&["fcbb:bb00:0002::", "fcbb:bb00:0003::"]);
        let decap = sids(&["fcbb:bb00:0004::", "fcbb:bb00:0d04::"]);
        let usids = compress_list_with_decap(
            &inner,
            &decap,
            DEFAULT_LOCATOR_BITS,
            DEFAULT_USID_ID_BITS,
        )
        .unwrap();
        assert_eq!(usids, vec![sid("fcbb:bb00:0002:0003:0004:0d04::")]);
    }

    #[test]
    fn test_compress_list_with_decap_group_not_split() {
        // Five inner segments fill a whole group, so the decap pair must
        // move to a second block in one piece.
        let inner: Vec<Sid> = (1..=5)
            .map(|i| format!("fcbb:bb00:{:04x}::", i).parse().unwrap())
            .collect();
        let decap = sids(&["fcbb:bb00:0006::", "fcbb:bb00:0d06::"]);
        let usids = compress_list_with_decap(
            &inner,
            &decap,
            DEFAULT_LOCATOR_BITS,
            DEFAULT_USID_ID_BITS,
        )
        .unwrap();
        assert_eq!(
            usids,
            vec![
                sid("fcbb:bb00:0001:0002:0003:0004:0005::"),
                sid("fcbb:bb00:0006:0d06::"),
            ]
        );
    }

    #[test]
    fn test_compress_list_with_decap_oversized_decap_group() {
        let decap: Vec<Sid> = (1..=6)
            .map(|i| format!("fcbb:bb00:{:04x}::", i).parse().unwrap())
            .collect();
        assert!(matches!(
            compress_list_with_decap(&[], &decap, DEFAULT_LOCATOR_BITS, DEFAULT_USID_ID_BITS),
            Err(CodecError::TooManySegments { .. })
        ));
    }
}
