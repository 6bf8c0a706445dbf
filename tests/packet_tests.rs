use simlink::packet::*;

#[test]
fn test_ecef_encodes_little_endian_doubles() {
    let position = Ecef::new(1.0, -2.5, 0.0);
    let bytes = position.to_le_bytes();

    assert_eq!(bytes.len(), 24);
    assert_eq!(&bytes[0..8], &1.0f64.to_le_bytes());
    assert_eq!(&bytes[8..16], &(-2.5f64).to_le_bytes());
    assert_eq!(&bytes[16..24], &0.0f64.to_le_bytes());
    // 1.0 = 0x3FF0000000000000, most significant byte last
    assert_eq!(bytes[7], 0x3F);
    assert_eq!(bytes[6], 0xF0);

    assert_eq!(Ecef::from_le_bytes(&bytes), position);
}

#[test]
fn test_attitude_field_order() {
    let attitude = Attitude::new(0.1, -0.2, 3.0);
    let bytes = attitude.to_le_bytes();

    assert_eq!(&bytes[0..8], &0.1f64.to_le_bytes());
    assert_eq!(&bytes[8..16], &(-0.2f64).to_le_bytes());
    assert_eq!(&bytes[16..24], &3.0f64.to_le_bytes());
    assert_eq!(Attitude::from_le_bytes(&bytes), attitude);
}

#[test]
fn test_tags_are_single_bytes() {
    assert_eq!(MessageTag(0xA5).to_le_bytes(), [0xA5]);
    assert_eq!(DynamicType(3).to_le_bytes(), [3]);
}

#[test]
fn test_builder_concatenates_fields() {
    let position = Ecef::new(6_378_137.0, 0.0, 0.0);
    let attitude = Attitude::new(1.5, 0.0, -0.5);

    let mut builder = PacketBuilder::new();
    builder
        .message_tag(MessageTag(2))
        .unwrap()
        .f64(1234.5)
        .unwrap()
        .dynamic_type(DynamicType(1))
        .unwrap()
        .ecef(&position)
        .unwrap()
        .attitude(&attitude)
        .unwrap();
    assert_eq!(builder.len(), TAG_LEN + 8 + TAG_LEN + 2 * TRIPLET_LEN);

    let packet = builder.finish();
    assert_eq!(packet[0], 2);
    assert_eq!(&packet[1..9], &1234.5f64.to_le_bytes());
    assert_eq!(packet[9], 1);
    assert_eq!(&packet[10..34], &position.to_le_bytes());
    assert_eq!(&packet[34..58], &attitude.to_le_bytes());
}

#[test]
fn test_builder_overflow() {
    let mut builder = PacketBuilder::new();
    builder.bytes(&[0u8; MAX_PACKET_SIZE]).unwrap();
    assert!(matches!(builder.message_tag(MessageTag(1)), Err(PacketError::Overflow)));
    assert_eq!(builder.len(), MAX_PACKET_SIZE);
}
