use bitstream::{BitReader, BitWriter};
use codec::{decode_message_stream, DecodeLimits, DecodeSession, MessageKind};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use wire::ProtocolSettings;

fn build_stream(settings: &ProtocolSettings, messages: usize) -> Vec<u8> {
    let type_bits = settings.message_type_bits();
    let code = |kind: MessageKind| u64::from(kind.code(settings).unwrap_or(0));
    let mut w = BitWriter::new();
    for i in 0..messages {
        match i % 3 {
            0 => {
                w.write_bits(code(MessageKind::NetTick), type_bits).unwrap();
                w.write_u32(i as u32);
                w.write_u16(1500);
                w.write_u16(20);
            }
            1 => {
                w.write_bits(code(MessageKind::SvcFixAngle), type_bits).unwrap();
                w.write_bit(false);
                w.write_u16(0x1000);
                w.write_u16(0x2000);
                w.write_u16(0);
            }
            _ => {
                w.write_bits(code(MessageKind::SvcPrint), type_bits).unwrap();
                w.write_cstring("Sending full update to client\n");
            }
        }
    }
    w.finish()
}

fn bench_message_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("message_stream");

    for (name, settings) in [
        ("old_engine", ProtocolSettings::old_engine()),
        ("portal2", ProtocolSettings::new_engine_portal2()),
    ] {
        let bytes = build_stream(&settings, 3000);
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut session = DecodeSession::new(settings, DecodeLimits::unlimited());
                let mut reader = BitReader::new(black_box(&bytes));
                black_box(decode_message_stream(&mut reader, &mut session))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_message_stream);
criterion_main!(benches);
