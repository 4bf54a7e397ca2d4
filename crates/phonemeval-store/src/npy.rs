//! NumPy `.npy` reader for single embedding vectors.
//!
//! Layout: the 6-byte magic `\x93NUMPY`, major/minor version bytes, a header
//! length (u16 LE for v1, u32 LE for v2/v3), an ASCII Python dict literal
//! with `descr`, `fortran_order` and `shape`, then the raw array data.

use std::path::Path;

use thiserror::Error;

use crate::StoreError;

const MAGIC: &[u8; 6] = b"\x93NUMPY";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NpyError {
    #[error("missing \\x93NUMPY magic")]
    BadMagic,

    #[error("unsupported format version {0}.{1}")]
    UnsupportedVersion(u8, u8),

    #[error("file truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("malformed header: {0}")]
    Header(String),

    #[error("unsupported dtype '{0}' (expected <f4, >f4, <f8 or >f8)")]
    UnsupportedDtype(String),

    #[error("array of shape {0:?} is not a vector")]
    NotAVector(Vec<usize>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dtype {
    F32Le,
    F32Be,
    F64Le,
    F64Be,
}

impl Dtype {
    fn parse(descr: &str) -> Result<Self, NpyError> {
        match descr {
            "<f4" => Ok(Self::F32Le),
            ">f4" => Ok(Self::F32Be),
            "<f8" => Ok(Self::F64Le),
            ">f8" => Ok(Self::F64Be),
            other => Err(NpyError::UnsupportedDtype(other.to_string())),
        }
    }

    fn size(self) -> usize {
        match self {
            Self::F32Le | Self::F32Be => 4,
            Self::F64Le | Self::F64Be => 8,
        }
    }

    fn decode(self, b: &[u8]) -> f32 {
        match self {
            Self::F32Le => f32::from_le_bytes([b[0], b[1], b[2], b[3]]),
            Self::F32Be => f32::from_be_bytes([b[0], b[1], b[2], b[3]]),
            Self::F64Le => f64::from_le_bytes(bytes8(b)) as f32,
            Self::F64Be => f64::from_be_bytes(bytes8(b)) as f32,
        }
    }
}

fn bytes8(b: &[u8]) -> [u8; 8] {
    let mut out = [0u8; 8];
    out.copy_from_slice(&b[..8]);
    out
}

struct Header {
    dtype: Dtype,
    shape: Vec<usize>,
}

/// Read a `.npy` file holding one embedding vector.
pub fn read_vector(path: &Path) -> Result<Vec<f32>, StoreError> {
    let bytes = std::fs::read(path)?;
    parse_vector(&bytes).map_err(|source| StoreError::Npy {
        path: path.to_path_buf(),
        source,
    })
}

/// Decode an in-memory `.npy` payload into an `f32` vector.
///
/// Accepts 1-D arrays, and N-D arrays with at most one non-unit axis
/// (e.g. `(1, 192)`), which are flattened.
pub fn parse_vector(bytes: &[u8]) -> Result<Vec<f32>, NpyError> {
    if bytes.len() < MAGIC.len() || &bytes[..MAGIC.len()] != MAGIC {
        return Err(NpyError::BadMagic);
    }
    ensure_len(bytes, 8)?;
    let (major, minor) = (bytes[6], bytes[7]);

    let (header_len, offset) = match major {
        1 => {
            ensure_len(bytes, 10)?;
            (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10)
        }
        2 | 3 => {
            ensure_len(bytes, 12)?;
            let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
            (len as usize, 12)
        }
        _ => return Err(NpyError::UnsupportedVersion(major, minor)),
    };

    let header_end = offset + header_len;
    ensure_len(bytes, header_end)?;
    let text = std::str::from_utf8(&bytes[offset..header_end])
        .map_err(|_| NpyError::Header("header is not valid UTF-8".into()))?;
    let header = parse_header(text)?;

    let count = vector_len(&header.shape)?;
    let size = header.dtype.size();
    let data_end = count
        .checked_mul(size)
        .and_then(|len| len.checked_add(header_end))
        .ok_or_else(|| NpyError::Header(format!("shape {:?} too large", header.shape)))?;
    ensure_len(bytes, data_end)?;

    Ok(bytes[header_end..data_end]
        .chunks_exact(size)
        .map(|chunk| header.dtype.decode(chunk))
        .collect())
}

/// Write `values` as a version 1.0 little-endian `f32` `.npy` file.
///
/// Produces the same layout as `numpy.save` for a 1-D `float32` array.
pub fn write_vector(path: &Path, values: &[f32]) -> std::io::Result<()> {
    let dict = format!(
        "{{'descr': '<f4', 'fortran_order': False, 'shape': ({},), }}",
        values.len()
    );
    // magic + version + u16 length + dict + '\n' must be a multiple of 64.
    let unpadded = MAGIC.len() + 2 + 2 + dict.len() + 1;
    let padding = (64 - unpadded % 64) % 64;

    let mut header = dict;
    header.push_str(&" ".repeat(padding));
    header.push('\n');

    let mut out = Vec::with_capacity(10 + header.len() + values.len() * 4);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    std::fs::write(path, out)
}

fn ensure_len(bytes: &[u8], needed: usize) -> Result<(), NpyError> {
    if bytes.len() < needed {
        return Err(NpyError::Truncated {
            needed,
            available: bytes.len(),
        });
    }
    Ok(())
}

fn parse_header(text: &str) -> Result<Header, NpyError> {
    let text = text.replace('"', "'");

    let descr = dict_value(&text, "descr")?
        .strip_prefix('\'')
        .and_then(|rest| rest.split('\'').next())
        .ok_or_else(|| NpyError::Header("'descr' is not a string".into()))?;
    let dtype = Dtype::parse(descr)?;

    let shape_src = dict_value(&text, "shape")?;
    let inner = shape_src
        .strip_prefix('(')
        .and_then(|rest| rest.split(')').next())
        .ok_or_else(|| NpyError::Header("'shape' is not a tuple".into()))?;
    let shape = inner
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| NpyError::Header(format!("bad shape entry '{s}'")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Header { dtype, shape })
}

/// Text following `'key':` in the header dict, leading whitespace trimmed.
fn dict_value<'a>(text: &'a str, key: &str) -> Result<&'a str, NpyError> {
    let needle = format!("'{key}':");
    let start = text
        .find(&needle)
        .ok_or_else(|| NpyError::Header(format!("missing '{key}'")))?;
    Ok(text[start + needle.len()..].trim_start())
}

fn vector_len(shape: &[usize]) -> Result<usize, NpyError> {
    let non_unit = shape.iter().filter(|&&d| d != 1).count();
    if shape.is_empty() || non_unit > 1 {
        return Err(NpyError::NotAVector(shape.to_vec()));
    }
    shape
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| NpyError::Header(format!("shape {shape:?} too large")))
}
