mod common;

use bitstream::{BitReader, BitWriter};
use codec::{
    decode_message_stream, CodecError, DecodeLimits, DecodeSession, MessageKind, MessagePayload,
    TableUpdateKind, NAME_HISTORY_CAPACITY,
};
use common::{create_table_message, update_table_message, EntryUpdate, Name};
use wire::ProtocolSettings;

fn non_nop_records(stream: &codec::MessageStream) -> usize {
    stream
        .records
        .iter()
        .filter(|record| record.kind != MessageKind::NetNop)
        .count()
}

fn session() -> DecodeSession {
    DecodeSession::new(ProtocolSettings::old_engine(), DecodeLimits::default())
}

#[test]
fn created_table_gets_history_prefixed_names() {
    let settings = ProtocolSettings::old_engine();
    let mut w = BitWriter::new();
    create_table_message(
        &mut w,
        &settings,
        "testtable",
        4,
        &[
            EntryUpdate::named("alpha").with_payload(&[1, 2, 3]),
            EntryUpdate {
                index: None,
                name: Some(Name::FromHistory {
                    index: 0,
                    prefix: 3,
                    suffix: "ha2",
                }),
                payload: None,
            },
        ],
    );
    let bytes = w.finish();

    let mut session = session();
    let stream = decode_message_stream(&mut BitReader::new(&bytes), &mut session);
    assert!(!stream.ended_in_error);
    assert_eq!(non_nop_records(&stream), 1);

    let table = session.tables.table("testtable").unwrap();
    let names: Vec<_> = table.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["alpha", "alpha2"]);
    assert_eq!(table.entries[0].payload.as_ref().unwrap().bytes, [1, 2, 3]);
    assert!(table.entries[1].payload.is_none());
    assert!(session.tables.is_readable("testtable"));
    assert!(session.diagnostics.is_empty());

    let Some(MessagePayload::CreateStringTable { updates, .. }) = &stream.records[0].payload else {
        panic!("expected a table creation");
    };
    let kinds: Vec<_> = updates.as_ref().unwrap().iter().map(|u| u.kind).collect();
    assert_eq!(kinds, [TableUpdateKind::NewEntry, TableUpdateKind::NewEntry]);
}

#[test]
fn history_keeps_only_the_latest_names() {
    let settings = ProtocolSettings::old_engine();
    let names: Vec<String> = (0..40).map(|i| format!("name{i}")).collect();
    let mut entries: Vec<EntryUpdate<'_>> = names.iter().map(|n| EntryUpdate::named(n)).collect();
    entries.push(EntryUpdate {
        index: None,
        name: Some(Name::FromHistory {
            index: 0,
            prefix: 5,
            suffix: "x",
        }),
        payload: None,
    });

    let mut w = BitWriter::new();
    create_table_message(&mut w, &settings, "downloadables", 64, &entries);
    let bytes = w.finish();

    let mut session = session();
    let stream = decode_message_stream(&mut BitReader::new(&bytes), &mut session);
    assert!(!stream.ended_in_error);

    let table = session.tables.table("downloadables").unwrap();
    assert_eq!(table.entries.len(), 41);
    // 40 names pushed into a 32-slot window: the oldest left is name8.
    assert_eq!(NAME_HISTORY_CAPACITY, 32);
    assert_eq!(table.entries[40].name, "name8x");
}

#[test]
fn failed_batch_keeps_earlier_updates_and_blocks_the_table() {
    let settings = ProtocolSettings::old_engine();
    let mut w = BitWriter::new();
    create_table_message(&mut w, &settings, "broken", 8, &[]);
    create_table_message(&mut w, &settings, "healthy", 8, &[]);
    update_table_message(
        &mut w,
        &settings,
        0,
        8,
        &[
            EntryUpdate::named("first"),
            EntryUpdate {
                index: None,
                name: Some(Name::FromHistory {
                    index: 5,
                    prefix: 1,
                    suffix: "",
                }),
                payload: None,
            },
        ],
    );
    update_table_message(&mut w, &settings, 1, 8, &[EntryUpdate::named("ok")]);
    update_table_message(&mut w, &settings, 0, 8, &[EntryUpdate::named("late")]);
    let bytes = w.finish();

    let mut session = session();
    let stream = decode_message_stream(&mut BitReader::new(&bytes), &mut session);
    assert!(!stream.ended_in_error);
    assert_eq!(non_nop_records(&stream), 5);

    let updates: Vec<_> = stream
        .records
        .iter()
        .filter_map(|record| match &record.payload {
            Some(MessagePayload::UpdateStringTable { updates, .. }) => Some(updates.is_some()),
            _ => None,
        })
        .collect();
    assert_eq!(updates, [false, true, false]);

    assert!(!session.tables.is_readable("broken"));
    assert!(matches!(
        session.tables.table("broken"),
        Err(CodecError::TableUnreadable { .. })
    ));
    let broken = session.tables.tables().find(|t| t.name() == "broken").unwrap();
    assert_eq!(broken.entries.len(), 1);
    assert_eq!(broken.entries[0].name, "first");

    assert_eq!(session.tables.table("healthy").unwrap().entries[0].name, "ok");
    // One for the failed entry, one for the refused later batch.
    assert_eq!(session.diagnostics.len(), 2);
}

#[test]
fn existing_index_update_changes_payload_only() {
    let settings = ProtocolSettings::old_engine();
    let mut w = BitWriter::new();
    create_table_message(&mut w, &settings, "instancebaseline", 16, &[EntryUpdate::named("42")]);
    update_table_message(
        &mut w,
        &settings,
        0,
        16,
        &[EntryUpdate {
            index: Some(0),
            name: Some(Name::Literal("ignored")),
            payload: Some(&[0xAA, 0xBB]),
        }],
    );
    let bytes = w.finish();

    let mut session = session();
    let stream = decode_message_stream(&mut BitReader::new(&bytes), &mut session);
    assert!(!stream.ended_in_error);

    let table = session.tables.table("instancebaseline").unwrap();
    assert_eq!(table.entries.len(), 1);
    assert_eq!(table.entries[0].name, "42");
    assert_eq!(table.entries[0].payload.as_ref().unwrap().bytes, [0xAA, 0xBB]);

    let Some(MessagePayload::UpdateStringTable { updates, .. }) = &stream.records[1].payload else {
        panic!("expected a table update");
    };
    assert_eq!(updates.as_ref().unwrap()[0].kind, TableUpdateKind::ChangeEntryData);
}

#[test]
fn dictionary_encoded_entries_are_refused_on_newer_protocols() {
    let settings = ProtocolSettings::new(3, 15);
    let mut w = BitWriter::new();
    create_table_message(
        &mut w,
        &settings,
        "modelprecache",
        8,
        &[EntryUpdate {
            index: Some(0),
            name: Some(Name::Literal("models/props/cube.mdl")),
            payload: None,
        }],
    );
    let bytes = w.finish();

    let mut session = DecodeSession::new(settings, DecodeLimits::default());
    let stream = decode_message_stream(&mut BitReader::new(&bytes), &mut session);
    assert!(!stream.ended_in_error);
    assert_eq!(stream.records[0].kind, MessageKind::SvcCreateStringTable);
    assert!(!session.tables.is_readable("modelprecache"));
    assert_eq!(session.diagnostics.len(), 1);
}

#[test]
fn sequential_entry_after_a_matched_grow_name_is_appended() {
    let settings = ProtocolSettings::old_engine();
    let mut w = BitWriter::new();
    create_table_message(
        &mut w,
        &settings,
        "downloadables",
        8,
        &[EntryUpdate::named("a"), EntryUpdate::named("b")],
    );
    update_table_message(
        &mut w,
        &settings,
        0,
        8,
        &[
            EntryUpdate {
                index: Some(2),
                name: Some(Name::Literal("a")),
                payload: None,
            },
            EntryUpdate::named("c"),
        ],
    );
    let bytes = w.finish();

    let mut session = session();
    let stream = decode_message_stream(&mut BitReader::new(&bytes), &mut session);
    assert!(!stream.ended_in_error);
    assert!(session.diagnostics.is_empty());

    let table = session.tables.table("downloadables").unwrap();
    let names: Vec<_> = table.entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["a", "b", "c"]);

    let Some(MessagePayload::UpdateStringTable { updates, .. }) = &stream.records[1].payload else {
        panic!("expected a table update");
    };
    let reported: Vec<_> = updates
        .as_ref()
        .unwrap()
        .iter()
        .map(|u| (u.kind, u.index, u.name.as_str()))
        .collect();
    assert_eq!(
        reported,
        [
            (TableUpdateKind::ChangeEntryData, 0, "a"),
            (TableUpdateKind::NewEntry, 2, "c"),
        ]
    );
}
