//! String table replica.
//!
//! Tables are created once by `SvcCreateStringTable`, then grow and change
//! through incremental update batches or a full snapshot dump. The replica
//! is owned by the decode session and mutated strictly in recording order.
//!
//! A table whose update fails is marked unreadable for the rest of the
//! session. Updates and lookups against it are refused from then on.

use std::collections::{HashMap, HashSet};
use std::fmt;

use bitstream::{highest_bit_index, BitReader};
use tracing::{debug, warn};
use wire::{ProtocolSettings, MAX_USER_DATA_BITS, SUB_STRING_BITS};

use crate::entry::{decode_entry_payload, EntryPayload};
use crate::error::{CodecError, CodecResult, LimitKind};
use crate::history::NameHistory;
use crate::limits::DecodeLimits;
use crate::session::Diagnostics;
use crate::snapshot::{DumpedTable, StringTablesSnapshot};

/// Table schema as announced by its creation message.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StringTableSchema {
    pub name: String,
    pub max_entries: u16,
    pub user_data_fixed_size: bool,
    /// Fixed payload size in bytes.
    pub user_data_size: u32,
    /// Fixed payload size in bits.
    pub user_data_size_bits: u32,
    /// Only present from network protocol 15.
    pub flags: Option<u32>,
}

impl StringTableSchema {
    /// A variable-size table with no flags.
    #[must_use]
    pub fn new(name: impl Into<String>, max_entries: u16) -> Self {
        Self {
            name: name.into(),
            max_entries,
            user_data_fixed_size: false,
            user_data_size: 0,
            user_data_size_bits: 0,
            flags: None,
        }
    }

    /// Marks the table's payloads as `bits` wide.
    #[must_use]
    pub fn with_fixed_size(mut self, bytes: u32, bits: u32) -> Self {
        self.user_data_fixed_size = true;
        self.user_data_size = bytes;
        self.user_data_size_bits = bits;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StringTableEntry {
    pub name: String,
    pub payload: Option<EntryPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StringTableClass {
    pub name: String,
    pub data: Option<String>,
}

/// Current contents of one table.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StringTable {
    /// Creation order; update messages address tables by this id.
    pub id: usize,
    pub schema: StringTableSchema,
    pub entries: Vec<StringTableEntry>,
    pub classes: Vec<StringTableClass>,
}

impl StringTable {
    fn new(id: usize, schema: StringTableSchema) -> Self {
        Self {
            id,
            schema,
            entries: Vec::new(),
            classes: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    /// Returns the index of the first entry named `name`.
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.name == name)
    }
}

/// What an update did to the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TableUpdateKind {
    NewEntry,
    ChangeEntryData,
}

impl fmt::Display for TableUpdateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NewEntry => f.write_str("new entry"),
            Self::ChangeEntryData => f.write_str("change entry data"),
        }
    }
}

/// One applied update.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TableUpdate {
    pub kind: TableUpdateKind,
    pub index: usize,
    pub name: String,
}

impl fmt::Display for TableUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.index, self.kind, self.name)
    }
}

/// What an update batch needs besides the table itself.
#[derive(Debug)]
pub struct UpdateContext<'s> {
    pub settings: &'s ProtocolSettings,
    pub limits: &'s DecodeLimits,
    pub diagnostics: &'s mut Diagnostics,
}

impl<'s> UpdateContext<'s> {
    pub fn new(
        settings: &'s ProtocolSettings,
        limits: &'s DecodeLimits,
        diagnostics: &'s mut Diagnostics,
    ) -> Self {
        Self {
            settings,
            limits,
            diagnostics,
        }
    }
}

/// Replica of every string table in the session.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StringTableReplica {
    tables: Vec<StringTable>,
    #[cfg_attr(feature = "serde", serde(skip))]
    by_name: HashMap<String, usize>,
    unreadable: HashSet<String>,
    creations: Vec<StringTableSchema>,
}

impl StringTableReplica {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table and returns its id.
    ///
    /// Re-creating an existing name replaces the schema and clears the
    /// entries in place, keeping the id. An unreadable mark is kept.
    pub fn create_table(&mut self, schema: StringTableSchema, limits: &DecodeLimits) -> CodecResult<usize> {
        if let Some(&id) = self.by_name.get(&schema.name) {
            debug!(table = %schema.name, id, "string table re-created");
            self.creations[id] = schema.clone();
            self.tables[id] = StringTable::new(id, schema);
            return Ok(id);
        }
        if self.tables.len() >= limits.max_tables {
            return Err(CodecError::LimitsExceeded {
                kind: LimitKind::Tables,
                limit: limits.max_tables,
                actual: self.tables.len() + 1,
            });
        }
        let id = self.tables.len();
        debug!(table = %schema.name, id, max_entries = schema.max_entries, "string table created");
        self.by_name.insert(schema.name.clone(), id);
        self.creations.push(schema.clone());
        self.tables.push(StringTable::new(id, schema));
        Ok(id)
    }

    /// Returns true if the table exists and was never marked unreadable.
    #[must_use]
    pub fn is_readable(&self, name: &str) -> bool {
        self.by_name.contains_key(name) && !self.unreadable.contains(name)
    }

    /// Marks a table unreadable for the rest of the session.
    pub fn mark_unreadable(&mut self, name: &str) {
        if self.unreadable.insert(name.to_string()) {
            warn!(table = name, "string table marked unreadable");
        }
    }

    /// Marks every known table unreadable.
    pub fn mark_all_unreadable(&mut self) {
        let names: Vec<String> = self.by_name.keys().cloned().collect();
        for name in names {
            self.mark_unreadable(&name);
        }
    }

    /// Looks up a readable table by name.
    pub fn table(&self, name: &str) -> CodecResult<&StringTable> {
        let id = *self
            .by_name
            .get(name)
            .ok_or_else(|| CodecError::TableNotFound {
                table: name.to_string(),
            })?;
        if self.unreadable.contains(name) {
            return Err(CodecError::TableUnreadable {
                table: name.to_string(),
            });
        }
        Ok(&self.tables[id])
    }

    /// Looks up a table's name by creation order, readable or not.
    pub fn table_name_by_id(&self, id: usize) -> CodecResult<&str> {
        self.tables
            .get(id)
            .map(StringTable::name)
            .ok_or(CodecError::TableIdNotFound { id })
    }

    /// Looks up a readable table by creation order.
    pub fn table_by_id(&self, id: usize) -> CodecResult<&StringTable> {
        let name = self.table_name_by_id(id)?;
        self.table(name)
    }

    /// Returns an entry's name from a readable table.
    pub fn entry_name(&self, table: &str, index: usize) -> CodecResult<Option<&str>> {
        Ok(self
            .table(table)?
            .entries
            .get(index)
            .map(|entry| entry.name.as_str()))
    }

    /// All tables in creation order, readable or not.
    pub fn tables(&self) -> impl Iterator<Item = &StringTable> {
        self.tables.iter()
    }

    /// Schemas in creation order.
    #[must_use]
    pub fn creations(&self) -> &[StringTableSchema] {
        &self.creations
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Applies a batch of `changed` entry updates read from `reader`.
    ///
    /// On failure the table is marked unreadable, one diagnostic is logged,
    /// and the updates applied before the failure are kept.
    pub fn apply_update(
        &mut self,
        table: &str,
        changed: usize,
        reader: &mut BitReader<'_>,
        ctx: &mut UpdateContext<'_>,
    ) -> CodecResult<Vec<TableUpdate>> {
        let id = match self.table(table) {
            Ok(t) => t.id,
            Err(e) => {
                ctx.diagnostics
                    .push(format!("can't update table {table}: {e}"));
                return Err(e);
            }
        };

        let mut history = NameHistory::new();
        let mut updates = Vec::with_capacity(changed.min(ctx.limits.max_table_entries));
        let mut next_index = 0;
        for _ in 0..changed {
            match self.tables[id].apply_one(next_index, &mut history, reader, ctx) {
                Ok((wire_index, update)) => {
                    next_index = wire_index + 1;
                    updates.push(update);
                }
                Err(e) => {
                    ctx.diagnostics.push(format!(
                        "error while updating table {table} after {} of {changed} entries: {e} ({} bits left)",
                        updates.len(),
                        reader.bits_remaining()
                    ));
                    self.mark_unreadable(table);
                    return Err(e);
                }
            }
        }
        debug!(table, changed, entries = self.tables[id].entries.len(), "string table updated");
        Ok(updates)
    }

    /// Rebuilds tables from a full dump and the recorded creation schemas.
    ///
    /// Every dumped table is reset to its recorded schema and refilled
    /// through the same path as incremental updates. Unreadable marks are
    /// kept; a dumped table with no creation record becomes unreadable.
    pub fn apply_full_snapshot(&mut self, snapshot: &StringTablesSnapshot, ctx: &mut UpdateContext<'_>) {
        for dumped in &snapshot.tables {
            let Some(&id) = self.by_name.get(&dumped.name) else {
                ctx.diagnostics.push(format!(
                    "table {} in string tables dump was never created",
                    dumped.name
                ));
                self.unreadable.insert(dumped.name.clone());
                continue;
            };
            if self.unreadable.contains(&dumped.name) {
                continue;
            }

            let mut table = StringTable::new(id, self.creations[id].clone());
            if let Err(e) = table.fill_from_dump(dumped, ctx) {
                ctx.diagnostics.push(format!(
                    "error while rebuilding table {} from string tables dump: {e}",
                    dumped.name
                ));
                self.mark_unreadable(&dumped.name);
                continue;
            }
            debug!(table = %dumped.name, entries = table.entries.len(), "string table rebuilt");
            self.tables[id] = table;
        }
    }
}

impl StringTable {
    /// Applies one entry update, returning the index read (or inferred)
    /// from the stream together with the update. The two differ when a
    /// grown name matches an existing entry.
    fn apply_one(
        &mut self,
        mut index: usize,
        history: &mut NameHistory,
        reader: &mut BitReader<'_>,
        ctx: &mut UpdateContext<'_>,
    ) -> CodecResult<(usize, TableUpdate)> {
        if !reader.read_bit()? {
            if !ctx.settings.supports_explicit_entry_index() {
                return Err(CodecError::UnsupportedVariant {
                    what: "dictionary-encoded string table entry",
                });
            }
            let bits = highest_bit_index(u32::from(self.schema.max_entries));
            index = reader.read_bits(bits)? as usize;
        }

        let new_name = if reader.read_bit()? {
            Some(read_entry_name(reader, history)?)
        } else {
            None
        };

        let payload_reader = if reader.read_bit()? {
            let bits = if self.schema.user_data_fixed_size {
                self.schema.user_data_size_bits as usize
            } else {
                reader.read_bits(MAX_USER_DATA_BITS)? as usize * 8
            };
            Some(reader.split_and_skip(bits)?)
        } else {
            None
        };

        let wire_index = index;
        let len = self.entries.len();
        if index >= usize::from(self.schema.max_entries) {
            return Err(CodecError::EntryIndexOutOfRange {
                table: self.schema.name.clone(),
                index,
                len,
            });
        }
        // Any index at or past the end grows the table. It may run ahead of
        // `len` once a grown name has matched an existing entry.
        let (kind, index) = if index < len {
            (TableUpdateKind::ChangeEntryData, index)
        } else {
            let name = new_name.unwrap_or_default();
            match self.position(&name) {
                Some(existing) => (TableUpdateKind::ChangeEntryData, existing),
                None => {
                    self.push_entry(name, ctx)?;
                    (TableUpdateKind::NewEntry, len)
                }
            }
        };

        if let Some(payload_reader) = payload_reader {
            let entry = &self.entries[index];
            let payload = decode_entry_payload(
                &self.schema.name,
                &entry.name,
                &payload_reader,
                ctx.settings,
                ctx.diagnostics,
            )?;
            self.entries[index].payload = Some(payload);
        }

        let name = self.entries[index].name.clone();
        history.push(name.clone());
        Ok((wire_index, TableUpdate { kind, index, name }))
    }

    fn push_entry(&mut self, name: String, ctx: &UpdateContext<'_>) -> CodecResult<()> {
        let len = self.entries.len();
        if len >= usize::from(self.schema.max_entries) {
            return Err(CodecError::TableFull {
                table: self.schema.name.clone(),
                max_entries: usize::from(self.schema.max_entries),
            });
        }
        if len >= ctx.limits.max_table_entries {
            return Err(CodecError::LimitsExceeded {
                kind: LimitKind::TableEntries,
                limit: ctx.limits.max_table_entries,
                actual: len + 1,
            });
        }
        self.entries.push(StringTableEntry {
            name,
            payload: None,
        });
        Ok(())
    }

    fn fill_from_dump(
        &mut self,
        dumped: &DumpedTable,
        ctx: &mut UpdateContext<'_>,
    ) -> CodecResult<()> {
        for entry in &dumped.entries {
            self.push_entry(entry.name.clone(), ctx)?;
            if let Some(data) = &entry.data {
                let reader = BitReader::new(data);
                let payload =
                    decode_entry_payload(&self.schema.name, &entry.name, &reader, ctx.settings, ctx.diagnostics)?;
                if let Some(last) = self.entries.last_mut() {
                    last.payload = Some(payload);
                }
            }
        }
        if let Some(classes) = &dumped.classes {
            if classes.len() > ctx.limits.max_table_classes {
                return Err(CodecError::LimitsExceeded {
                    kind: LimitKind::TableClasses,
                    limit: ctx.limits.max_table_classes,
                    actual: classes.len(),
                });
            }
            self.classes.clone_from(classes);
        }
        Ok(())
    }
}

/// Reads a literal name, or a prefix of a history name plus a literal suffix.
fn read_entry_name(reader: &mut BitReader<'_>, history: &NameHistory) -> CodecResult<String> {
    if !reader.read_bit()? {
        return Ok(reader.read_cstring()?);
    }
    let index = reader.read_bits(SUB_STRING_BITS)? as usize;
    let length = reader.read_bits(SUB_STRING_BITS)? as usize;
    let base = history
        .get(index)
        .ok_or(CodecError::HistoryIndexOutOfRange {
            index,
            len: history.len(),
        })?;
    let prefix = base
        .as_bytes()
        .get(..length)
        .ok_or_else(|| CodecError::SubstringTooLong {
            length,
            name: base.to_string(),
        })?;
    let mut name = String::from_utf8_lossy(prefix).into_owned();
    name.push_str(&reader.read_cstring()?);
    Ok(name)
}
