use bitstream::{BitReader, BitWriter};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Bit(bool),
    Bits { bits: u32, value: u64 },
    Signed { bits: u32, value: i64 },
    U8(u8),
    U16(u16),
    U32(u32),
    CString(String),
}

fn mask_value(bits: u32, value: u64) -> u64 {
    if bits >= 64 {
        value
    } else {
        value & ((1u64 << bits) - 1)
    }
}

fn clamp_signed(bits: u32, value: i64) -> i64 {
    let half = 1i64 << (bits - 1);
    value.rem_euclid(half * 2) - half
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        any::<bool>().prop_map(Op::Bit),
        (1u32..=64, any::<u64>()).prop_map(|(bits, value)| Op::Bits {
            bits,
            value: mask_value(bits, value),
        }),
        (2u32..=32, any::<i64>()).prop_map(|(bits, value)| Op::Signed {
            bits,
            value: clamp_signed(bits, value),
        }),
        any::<u8>().prop_map(Op::U8),
        any::<u16>().prop_map(Op::U16),
        any::<u32>().prop_map(Op::U32),
        "[a-z]{0,12}".prop_map(Op::CString),
    ]
}

proptest! {
    #[test]
    fn prop_roundtrip_ops(ops in prop::collection::vec(op_strategy(), 1..64)) {
        let mut writer = BitWriter::new();

        for op in &ops {
            match op {
                Op::Bit(b) => writer.write_bit(*b),
                Op::Bits { bits, value } => writer.write_bits(*value, *bits).unwrap(),
                Op::Signed { bits, value } => writer.write_signed(*value, *bits).unwrap(),
                Op::U8(v) => writer.write_u8(*v),
                Op::U16(v) => writer.write_u16(*v),
                Op::U32(v) => writer.write_u32(*v),
                Op::CString(s) => writer.write_cstring(s),
            }
        }

        let bytes = writer.finish();
        let mut reader = BitReader::new(&bytes);

        for op in &ops {
            match op {
                Op::Bit(b) => prop_assert_eq!(reader.read_bit().unwrap(), *b),
                Op::Bits { bits, value } => {
                    prop_assert_eq!(reader.read_bits(*bits).unwrap(), *value);
                }
                Op::Signed { bits, value } => {
                    prop_assert_eq!(reader.read_signed(*bits).unwrap(), *value);
                }
                Op::U8(v) => prop_assert_eq!(reader.read_u8().unwrap(), *v),
                Op::U16(v) => prop_assert_eq!(reader.read_u16().unwrap(), *v),
                Op::U32(v) => prop_assert_eq!(reader.read_u32().unwrap(), *v),
                Op::CString(s) => prop_assert_eq!(&reader.read_cstring().unwrap(), s),
            }
        }
        prop_assert!(reader.bits_remaining() < 8);
    }

    #[test]
    fn prop_sub_reader_never_moves_parent(
        data in prop::collection::vec(any::<u8>(), 1..32),
        skip in 0usize..64,
        len in 0usize..64,
        reads in 0u32..80,
    ) {
        let total = data.len() * 8;
        let skip = skip.min(total);
        let len = len.min(total - skip);

        let mut parent = BitReader::new(&data);
        parent.skip_bits(skip).unwrap();
        let mut child = parent.sub_reader(len).unwrap();

        let result = child.read_bits(reads.min(64));
        prop_assert_eq!(parent.bit_position(), skip);
        if reads.min(64) as usize > len {
            prop_assert!(result.is_err());
        } else {
            prop_assert!(result.is_ok());
        }
    }

    #[test]
    fn prop_reader_never_panics(data in prop::collection::vec(any::<u8>(), 0..64), widths in prop::collection::vec(0u32..70, 0..40)) {
        let mut reader = BitReader::new(&data);
        for width in widths {
            let _ = reader.read_bits(width);
            let _ = reader.read_cstring();
            let _ = reader.read_ubit_var();
        }
    }
}
