#![no_main]

use bitstream::BitReader;
use codec::{decode_demo, decode_message_stream, DecodeLimits, DecodeSession};
use libfuzzer_sys::fuzz_target;
use wire::{DemoHeader, DemoWriter, FrameKind, Limits, ProtocolSettings};

fuzz_target!(|data: &[u8]| {
    let limits = DecodeLimits::for_testing();

    // Raw bytes as a whole recording: almost always a header error.
    let _ = decode_demo(data, &Limits::for_testing(), &limits);

    // Raw bytes as message streams for both engine generations.
    for settings in [ProtocolSettings::old_engine(), ProtocolSettings::new_engine_portal2()] {
        let mut session = DecodeSession::new(settings, limits.clone());
        let _ = decode_message_stream(&mut BitReader::new(data), &mut session);
    }

    // Raw bytes behind a valid header, so frame carving is exercised.
    let header = DemoHeader {
        demo_protocol: 3,
        network_protocol: 14,
        server_name: String::new(),
        client_name: String::new(),
        map_name: String::new(),
        game_directory: String::new(),
        playback_time: 0.0,
        tick_count: 0,
        frame_count: 0,
        sign_on_length: 0,
    };
    let mut demo = DemoWriter::new(&header);
    demo.packet(FrameKind::SignOn, 0, 0, 0, data);
    demo.raw(data);
    let _ = decode_demo(&demo.finish(), &Limits::for_testing(), &limits);
});
