//! Property-based tests for the codec laws.
//!
//! Round-trip and delta-apply must hold for every value in the wire's
//! representable ranges; signed generators stay inside the sign/magnitude
//! envelope (`±(2^(n-1) - 1)` for values, half that for delta operands so
//! the difference stays representable too).

use proptest::prelude::*;

use bitrec::field::Field;
use bitrec::link::FieldLink;
use bitrec::stream::BitStream;

fn build_link(
    enabled: bool,
    count: u32,
    name: &str,
    age: u8,
    code: i16,
    points: &[u32],
) -> FieldLink {
    let mut link = FieldLink::new();
    link.add(Field::bool(enabled));
    link.add(Field::u32(count));
    link.add(Field::string(name));
    link.add(Field::u8(age));
    link.add(Field::i16(code));
    let id = link.add(Field::array_u32(0, points.len()));
    for (index, &value) in points.iter().enumerate() {
        link[id]
            .as_array_mut()
            .unwrap()
            .set_unsigned(index, value.into());
    }
    link
}

proptest! {
    #[test]
    fn roundtrip_restores_every_field(
        enabled in any::<bool>(),
        count in any::<u32>(),
        name in "[a-zA-Z0-9 ]{0,63}",
        age in any::<u8>(),
        code in -32767i16..=32767,
        // Elements below 2^30 stay within the 32 bits per slot that
        // `need_total_bits` budgets for a u32 array.
        points in proptest::collection::vec(0u32..(1 << 30), 1..=32),
    ) {
        let source = build_link(enabled, count, &name, age, code, &points);
        let mut stream = BitStream::with_capacity(source.need_total_size());
        source.serialize(&mut stream).unwrap();
        prop_assert!(stream.size() <= source.need_total_size());

        stream.reset();
        let mut decoded = build_link(false, 0, "", 0, 0, &vec![0; points.len()]);
        decoded.deserialize(&mut stream).unwrap();
        prop_assert_eq!(decoded, source);
    }

    #[test]
    fn delta_apply_reaches_the_base(
        enabled_a in any::<bool>(), enabled_b in any::<bool>(),
        count_a in any::<u32>(), count_b in any::<u32>(),
        name_a in "[a-z]{0,16}", name_b in "[a-z]{0,16}",
        age_a in any::<u8>(), age_b in any::<u8>(),
        code_a in -16383i16..=16383, code_b in -16383i16..=16383,
        points_a in proptest::collection::vec(any::<u32>(), 8),
        points_b in proptest::collection::vec(any::<u32>(), 8),
    ) {
        let current = build_link(enabled_a, count_a, &name_a, age_a, code_a, &points_a);
        let base = build_link(enabled_b, count_b, &name_b, age_b, code_b, &points_b);

        let mut stream = BitStream::with_capacity(
            current.need_total_size() + base.need_total_size(),
        );
        current.serialize_diff(&mut stream, &base).unwrap();

        // Any receiver holding the current state reconstructs the base.
        let mut receiver = current.clone();
        stream.reset();
        receiver.deserialize_diff(&mut stream).unwrap();
        prop_assert_eq!(receiver, base);
    }

    #[test]
    fn zero_delta_shrinks_to_tags(
        count in any::<u32>(),
        name in "[a-z]{0,16}",
        code in -32767i16..=32767,
    ) {
        let a = build_link(true, count, &name, 9, code, &[7; 4]);
        let b = a.clone();

        let mut stream = BitStream::with_capacity(a.need_total_size());
        a.serialize_diff(&mut stream, &b).unwrap();

        // Five scalar fields collapse to their tags; the array keeps its
        // header and one minimal element per slot.
        prop_assert_eq!(stream.tell(), 5 * 2 + (2 + 6 + 8 + 4 * 8));
    }

    #[test]
    fn sign_magnitude_is_reversible_in_range(
        value in (i64::MIN + 1)..=i64::MAX,
    ) {
        let mut stream = BitStream::with_capacity(8);
        stream.write_signed(value, 64).unwrap();
        stream.reset();
        prop_assert_eq!(stream.read_signed(64).unwrap(), value);
    }

    #[test]
    fn sign_magnitude_is_reversible_at_narrow_widths(
        value in -127i64..=127,
    ) {
        let mut stream = BitStream::with_capacity(2);
        stream.write_signed(value, 8).unwrap();
        stream.reset();
        prop_assert_eq!(stream.read_signed(8).unwrap(), value);
    }

    #[test]
    fn failed_writes_never_move_the_cursor(
        preload in 0usize..=16,
        value in 1u32..,
    ) {
        let mut stream = BitStream::with_capacity(2);
        stream.write_bits(0, preload.min(16)).unwrap();
        let before = stream.tell();

        // 2 + 6 + 32 bits never fit in what remains of 16.
        prop_assert!(Field::u32(value).serialize(&mut stream).is_err());
        prop_assert_eq!(stream.tell(), before);
    }
}
