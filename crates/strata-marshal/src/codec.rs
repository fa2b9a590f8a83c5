//! Byte packing for strings stored as codepoint or fixed-width datasets.

use strata_store::{Dataset, Dtype};
use strata_types::{ElementKind, Shape};

use crate::error::{MarshalError, MarshalResult};

/// Codepoints of each element padded with NULs to `width`, concatenated.
pub fn padded_codepoints<'a>(
    elements: impl IntoIterator<Item = &'a str>,
    width: usize,
) -> Vec<u32> {
    let mut out = Vec::new();
    for element in elements {
        let start = out.len();
        out.extend(element.chars().map(u32::from));
        out.resize(start + width, 0);
    }
    out
}

/// Each element padded with NULs to `width` octets, concatenated.
pub fn padded_bytes<'a>(
    elements: impl IntoIterator<Item = &'a [u8]>,
    width: usize,
) -> Vec<u8> {
    let mut out = Vec::new();
    for element in elements {
        let start = out.len();
        out.extend_from_slice(element);
        out.resize(start + width, 0);
    }
    out
}

pub fn u32_le(codepoints: &[u32]) -> Vec<u8> {
    codepoints.iter().flat_map(|c| c.to_le_bytes()).collect()
}

pub fn u16_le(codepoints: &[u32]) -> Vec<u8> {
    codepoints.iter().flat_map(|c| (*c as u16).to_le_bytes()).collect()
}

/// A uint32 codepoint dataset.
pub fn codepoint_dataset(shape: Shape, codepoints: &[u32]) -> MarshalResult<Dataset> {
    Ok(Dataset::new(
        Dtype::Numeric(ElementKind::UInt32),
        shape,
        u32_le(codepoints),
    )?)
}

/// Read the codepoints of a uint8, uint16 or uint32 dataset.
pub fn read_codepoints(dataset: &Dataset) -> Option<Vec<u32>> {
    let data = dataset.data();
    match dataset.dtype() {
        Dtype::Numeric(ElementKind::UInt8) => Some(data.iter().map(|b| u32::from(*b)).collect()),
        Dtype::Numeric(ElementKind::UInt16) => Some(
            data.chunks_exact(2)
                .map(|c| u32::from(u16::from_le_bytes([c[0], c[1]])))
                .collect(),
        ),
        Dtype::Numeric(ElementKind::UInt32) => Some(
            data.chunks_exact(4)
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        ),
        _ => None,
    }
}

/// Build a string from codepoints, failing on values that are not Unicode
/// scalar values.
pub fn string_from_codepoints(codepoints: &[u32], path: &impl ToString) -> MarshalResult<String> {
    codepoints
        .iter()
        .map(|c| {
            char::from_u32(*c).ok_or_else(|| {
                MarshalError::corrupt(path.to_string(), format!("invalid codepoint {c:#x}"))
            })
        })
        .collect()
}

/// Narrow byte-widened codepoints back to octets, failing on codes above
/// `0xff`.
pub fn bytes_from_codepoints(codepoints: &[u32], path: &impl ToString) -> MarshalResult<Vec<u8>> {
    codepoints
        .iter()
        .map(|c| {
            u8::try_from(*c).map_err(|_| {
                MarshalError::corrupt(path.to_string(), format!("code {c:#x} is not a byte"))
            })
        })
        .collect()
}

/// Split `data` into `count` chunks of `width` bytes. Zero-width chunks are
/// allowed.
pub fn split_fixed(data: &[u8], width: usize, count: usize) -> Option<Vec<Vec<u8>>> {
    if data.len() != width * count {
        return None;
    }
    if width == 0 {
        return Some(vec![Vec::new(); count]);
    }
    Some(data.chunks_exact(width).map(<[u8]>::to_vec).collect())
}

/// Split codepoints into `width`-sized strings. Zero-width strings are allowed.
pub fn split_codepoints(
    codepoints: &[u32],
    width: usize,
    count: usize,
    path: &impl ToString,
) -> MarshalResult<Vec<String>> {
    if codepoints.len() != width * count {
        return Err(MarshalError::corrupt(
            path.to_string(),
            format!(
                "{} codepoints cannot hold {count} strings of width {width}",
                codepoints.len()
            ),
        ));
    }
    if width == 0 {
        return Ok(vec![String::new(); count]);
    }
    codepoints
        .chunks_exact(width)
        .map(|chunk| string_from_codepoints(chunk, path))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_each_element_to_width() {
        assert_eq!(padded_codepoints(["ab", "c"], 3), vec![97, 98, 0, 99, 0, 0]);
        assert_eq!(padded_bytes([&b"x"[..], &b""[..]], 2), b"x\0\0\0".to_vec());
    }

    #[test]
    fn codepoints_roundtrip_all_widths() {
        let cps = vec![0x41, 0x3a9, 0x1f600];
        let ds = codepoint_dataset(Shape::from([3]), &cps).unwrap();
        assert_eq!(read_codepoints(&ds).unwrap(), cps);

        let narrow = u16_le(&[0x41, 0x3a9]);
        let ds = Dataset::new(Dtype::Numeric(ElementKind::UInt16), [2], narrow).unwrap();
        assert_eq!(read_codepoints(&ds).unwrap(), vec![0x41, 0x3a9]);

        let ds = Dataset::new(Dtype::Numeric(ElementKind::Float32), [1], vec![0; 4]).unwrap();
        assert_eq!(read_codepoints(&ds), None);
    }

    #[test]
    fn surrogates_are_corrupt() {
        let err = string_from_codepoints(&[0xd800], &"/s").unwrap_err();
        assert!(matches!(err, MarshalError::CorruptMetadata { .. }));
        assert_eq!(string_from_codepoints(&[0x68, 0x69], &"/s").unwrap(), "hi");
    }

    #[test]
    fn widened_bytes_narrow_back() {
        assert_eq!(bytes_from_codepoints(&[0x41, 0xff], &"/b").unwrap(), vec![0x41, 0xff]);
        let err = bytes_from_codepoints(&[0x100], &"/b").unwrap_err();
        assert!(matches!(err, MarshalError::CorruptMetadata { .. }));
    }

    #[test]
    fn split_handles_zero_width() {
        assert_eq!(split_fixed(&[], 0, 3).unwrap(), vec![Vec::<u8>::new(); 3]);
        let halves = vec![b"ab".to_vec(), b"cd".to_vec()];
        assert_eq!(split_fixed(b"abcd", 2, 2).unwrap(), halves);
        assert_eq!(split_fixed(b"abc", 2, 2), None);
        let blanks = vec![String::new(), String::new()];
        assert_eq!(split_codepoints(&[], 0, 2, &"/t").unwrap(), blanks);
        assert!(split_codepoints(&[97], 2, 1, &"/t").is_err());
    }
}
