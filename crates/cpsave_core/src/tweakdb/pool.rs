//! Typed pool payloads.
//!
//! Every payload starts with a `u32` element count. What follows depends on
//! the pool's type name:
//!
//! | type                | element                          |
//! |---------------------|----------------------------------|
//! | `String`            | packed string                    |
//! | fixed-width scalar  | `width` raw bytes                |
//! | `array:<scalar>`    | `u32 n` then `n * width` bytes   |
//! | `array:String`      | `u32 n` then `n` packed strings  |
//!
//! Anything else is kept as opaque bytes.

use crate::error::{CoreError, CoreResult};
use crate::string_pool::StringPool;
use crate::value_pool::ValuePool;
use cpsave_codec::{Archive, ArchiveReader, ArchiveWriter};
use serde::Serialize;

const ARRAY_PREFIX: &str = "array:";

/// Byte width of a scalar TweakDB type.
fn scalar_width(type_name: &str) -> Option<usize> {
    let width = match type_name {
        "Bool" => 1,
        "Int32" | "Float" => 4,
        "CName" | "TweakDBID" | "raRef:CResource" | "gamedataLocKeyWrapper" | "Vector2" => 8,
        "Vector3" | "EulerAngles" => 12,
        "Quaternion" => 16,
        _ => return None,
    };
    Some(width)
}

/// Shape of one record in a record pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordLayout {
    /// A scalar of fixed width.
    Scalar(usize),
    /// A counted array of fixed-width scalars.
    ScalarArray(usize),
    /// A counted array of packed strings.
    StringArray,
}

impl RecordLayout {
    /// Smallest encoded size of one record.
    #[must_use]
    pub const fn min_size(self) -> usize {
        match self {
            Self::Scalar(width) => width,
            Self::ScalarArray(_) | Self::StringArray => 4,
        }
    }

    /// Reads one record and returns its raw bytes.
    fn read_record<'a>(self, reader: &mut ArchiveReader<'a>) -> CoreResult<&'a [u8]> {
        let start = reader.remaining_bytes();
        let before = reader.remaining_len();
        match self {
            Self::Scalar(width) => {
                reader.skip(width)?;
            }
            Self::ScalarArray(width) => {
                let pos = reader.position();
                let n = reader.read_u32()?;
                let size = (n as usize).checked_mul(width).ok_or_else(|| {
                    CoreError::structural(pos, format!("array of {n} elements overflows"))
                })?;
                reader.skip(size)?;
            }
            Self::StringArray => {
                let pos = reader.position();
                let n = reader.read_u32()?;
                if n as usize > reader.remaining_len() {
                    return Err(CoreError::structural(
                        pos,
                        format!(
                            "{n} strings declared but only {} bytes remain",
                            reader.remaining_len()
                        ),
                    ));
                }
                for _ in 0..n {
                    reader.read_string()?;
                }
            }
        }
        Ok(&start[..before - reader.remaining_len()])
    }

    /// Checks that `record` is exactly one well-formed record.
    fn check(self, record: &[u8]) -> CoreResult<()> {
        let mut reader = ArchiveReader::new(record);
        self.read_record(&mut reader)?;
        if !reader.is_empty() {
            return Err(CoreError::structural(
                reader.position(),
                format!("{} bytes after record", reader.remaining_len()),
            ));
        }
        Ok(())
    }
}

/// How a pool's payload is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PoolKind {
    /// Unique strings.
    Strings,
    /// Unique raw records of the given layout.
    Records(RecordLayout),
    /// Undecoded bytes.
    Opaque,
}

impl PoolKind {
    /// The decoder for a type name, or `None` if the type is unknown.
    #[must_use]
    pub fn for_type(type_name: &str) -> Option<Self> {
        if type_name == "String" {
            return Some(Self::Strings);
        }
        if let Some(inner) = type_name.strip_prefix(ARRAY_PREFIX) {
            if inner == "String" {
                return Some(Self::Records(RecordLayout::StringArray));
            }
            return scalar_width(inner).map(|w| Self::Records(RecordLayout::ScalarArray(w)));
        }
        scalar_width(type_name).map(|w| Self::Records(RecordLayout::Scalar(w)))
    }
}

/// One decoded pool.
#[derive(Debug, Clone)]
pub enum Pool {
    /// A `String` pool.
    Strings(StringPool),
    /// A pool of raw records, deduplicated and sorted by their bytes.
    Records {
        /// Record shape.
        layout: RecordLayout,
        /// The records in file order.
        values: ValuePool<Vec<u8>>,
    },
    /// A pool of unknown type, kept verbatim.
    Opaque(Vec<u8>),
}

impl Pool {
    /// An empty pool of the given kind.
    #[must_use]
    pub fn empty(kind: PoolKind) -> Self {
        match kind {
            PoolKind::Strings => Self::Strings(StringPool::new()),
            PoolKind::Records(layout) => Self::Records {
                layout,
                values: ValuePool::default(),
            },
            // an opaque payload still carries its count
            PoolKind::Opaque => Self::Opaque(vec![0; 4]),
        }
    }

    /// The decoder this pool was read with.
    #[must_use]
    pub fn kind(&self) -> PoolKind {
        match self {
            Self::Strings(_) => PoolKind::Strings,
            Self::Records { layout, .. } => PoolKind::Records(*layout),
            Self::Opaque(_) => PoolKind::Opaque,
        }
    }

    /// Number of values, or `None` for opaque pools.
    #[must_use]
    pub fn value_count(&self) -> Option<usize> {
        match self {
            Self::Strings(strings) => Some(strings.len()),
            Self::Records { values, .. } => Some(values.len()),
            Self::Opaque(_) => None,
        }
    }

    /// The string pool, if this is one.
    #[must_use]
    pub fn as_strings(&self) -> Option<&StringPool> {
        match self {
            Self::Strings(strings) => Some(strings),
            _ => None,
        }
    }

    /// The records, if this is a record pool.
    #[must_use]
    pub fn as_records(&self) -> Option<&ValuePool<Vec<u8>>> {
        match self {
            Self::Records { values, .. } => Some(values),
            _ => None,
        }
    }

    /// Adds a string to a `String` pool and returns its index.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidOperation` on other pools, or `StringTooLong`.
    pub fn insert_string(&mut self, text: &str) -> CoreResult<usize> {
        match self {
            Self::Strings(strings) => strings.register(text),
            _ => Err(CoreError::InvalidOperation(
                "not a string pool".to_string(),
            )),
        }
    }

    /// Adds an encoded record to a record pool and returns its index.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidOperation` on other pools, or a structural error
    /// if `record` does not match the pool's layout.
    pub fn insert_record(&mut self, record: Vec<u8>) -> CoreResult<usize> {
        match self {
            Self::Records { layout, values } => {
                layout.check(&record)?;
                Ok(values.insert(record))
            }
            _ => Err(CoreError::InvalidOperation(
                "not a record pool".to_string(),
            )),
        }
    }

    /// Decodes one payload. The reader must cover exactly the payload; bytes
    /// left over are the caller's to report.
    pub(crate) fn read(
        reader: &mut ArchiveReader<'_>,
        kind: PoolKind,
        reject_duplicates: bool,
    ) -> CoreResult<Self> {
        match kind {
            PoolKind::Strings => Ok(Self::Strings(StringPool::read_payload(
                reader,
                reject_duplicates,
            )?)),
            PoolKind::Records(layout) => {
                let values = read_records(reader, layout, reject_duplicates)?;
                Ok(Self::Records { layout, values })
            }
            PoolKind::Opaque => {
                let bytes = reader.read_bytes(reader.remaining_len())?;
                Ok(Self::Opaque(bytes.to_vec()))
            }
        }
    }

    /// Encodes the payload.
    pub(crate) fn write(&self, writer: &mut ArchiveWriter) -> CoreResult<()> {
        match self {
            Self::Strings(strings) => strings.write_payload(writer),
            Self::Records { values, .. } => {
                let count = u32::try_from(values.len()).map_err(|_| {
                    CoreError::structural(writer.len() as u64, "too many records")
                })?;
                writer.write_u32(count);
                for record in values {
                    writer.write_bytes(record);
                }
                Ok(())
            }
            Self::Opaque(bytes) => {
                writer.write_bytes(bytes);
                Ok(())
            }
        }
    }
}

fn read_records(
    reader: &mut ArchiveReader<'_>,
    layout: RecordLayout,
    reject_duplicates: bool,
) -> CoreResult<ValuePool<Vec<u8>>> {
    let count_pos = reader.position();
    let count = reader.read_u32()? as usize;
    let min = layout.min_size().max(1);
    if count > reader.remaining_len() / min {
        return Err(CoreError::structural(
            count_pos,
            format!(
                "{count} records declared but only {} bytes remain",
                reader.remaining_len()
            ),
        ));
    }

    let mut values = ValuePool::with_capacity(count);
    for _ in 0..count {
        let pos = reader.position();
        let record = layout.read_record(reader)?.to_vec();
        if values.has_value(&record) {
            if reject_duplicates {
                return Err(CoreError::structural(pos, "record appears twice"));
            }
            continue;
        }
        values.push_back(record);
    }
    Ok(values)
}
