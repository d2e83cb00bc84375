//! Full string table dumps carried by `StringTables` frames.

use bitstream::BitReader;

use crate::error::{CodecError, CodecResult, LimitKind};
use crate::limits::DecodeLimits;
use crate::stringtable::StringTableClass;

/// Every table in a dump, in dump order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StringTablesSnapshot {
    pub tables: Vec<DumpedTable>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DumpedTable {
    pub name: String,
    pub entries: Vec<DumpedEntry>,
    /// `None` when the dump carries no class section for this table.
    pub classes: Option<Vec<StringTableClass>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DumpedEntry {
    pub name: String,
    pub data: Option<Vec<u8>>,
}

/// Decodes a full table dump.
pub fn decode_string_tables(reader: &mut BitReader<'_>, limits: &DecodeLimits) -> CodecResult<StringTablesSnapshot> {
    let count = usize::from(reader.read_u8()?);
    check(LimitKind::Tables, limits.max_tables, count)?;

    let mut tables = Vec::with_capacity(count);
    for _ in 0..count {
        let name = reader.read_cstring()?;

        let entry_count = usize::from(reader.read_u16()?);
        check(LimitKind::TableEntries, limits.max_table_entries, entry_count)?;
        let mut entries = Vec::with_capacity(entry_count);
        for _ in 0..entry_count {
            let name = reader.read_cstring()?;
            let data = if reader.read_bit()? {
                let len = usize::from(reader.read_u16()?);
                Some(reader.read_bytes(len)?)
            } else {
                None
            };
            entries.push(DumpedEntry { name, data });
        }

        let classes = if reader.read_bit()? {
            let class_count = usize::from(reader.read_u16()?);
            check(LimitKind::TableClasses, limits.max_table_classes, class_count)?;
            let mut classes = Vec::with_capacity(class_count);
            for _ in 0..class_count {
                let name = reader.read_cstring()?;
                let data = if reader.read_bit()? {
                    let len = usize::from(reader.read_u16()?);
                    Some(reader.read_string_of_length(len)?)
                } else {
                    None
                };
                classes.push(StringTableClass { name, data });
            }
            Some(classes)
        } else {
            None
        };

        tables.push(DumpedTable {
            name,
            entries,
            classes,
        });
    }
    Ok(StringTablesSnapshot { tables })
}

fn check(kind: LimitKind, limit: usize, actual: usize) -> CodecResult<()> {
    if actual > limit {
        return Err(CodecError::LimitsExceeded {
            kind,
            limit,
            actual,
        });
    }
    Ok(())
}
