#![no_main]

use bitstream::BitReader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut reader = BitReader::new(data);
    let mut idx = 0usize;

    // Use input bytes to drive a bounded sequence of operations.
    while idx < data.len() && idx < 1024 {
        let op = data[idx] % 8;
        let arg = u32::from(data[idx] / 8);
        idx += 1;

        match op {
            0 => {
                let _ = reader.read_bit();
            }
            1 => {
                let _ = reader.read_bits(arg.saturating_add(1).min(64));
            }
            2 => {
                let _ = reader.read_signed(arg.clamp(1, 32));
            }
            3 => {
                let _ = reader.read_cstring();
            }
            4 => {
                let _ = reader.read_ubit_var();
            }
            5 => {
                let _ = codec::read_bit_coord(&mut reader);
            }
            6 => {
                let _ = codec::read_bit_coord_mp(&mut reader, arg % 2 == 0, arg % 3 == 0);
            }
            _ => {
                if let Ok(mut sub) = reader.split_and_skip(arg as usize) {
                    let _ = sub.read_bit_run(sub.bits_remaining());
                }
            }
        }
    }
});
