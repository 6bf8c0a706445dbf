use simlink::has::phase::{self, PHASE_BIAS_RESOLUTION_M, PHASE_BIAS_WIDTH};
use simlink::has::tables::{Constellation, GALILEO_SIGNALS, GPS_SIGNALS};
use simlink::*;

fn mask(bits: &str) -> Field {
    Field::from_binary(bits, false, 1.0).unwrap()
}

fn bias(value: f64) -> Field {
    Field::from_decimal(value, PHASE_BIAS_WIDTH, true, PHASE_BIAS_RESOLUTION_M).unwrap()
}

/// Store for one system whose slot values encode their own counters:
/// phase bias = sat_counter + sig_counter / 10, discontinuity = sig_counter % 4.
fn single_system_store(gnss_id: u64, satellite_mask: &str, signal_mask: &str) -> ParameterStore {
    let mut store = ParameterStore::new();
    store.insert(FieldKey::PhaseValidityIntervalIndex, Field::unsigned(7, 4).unwrap());
    store.insert(FieldKey::NSys, Field::unsigned(1, 4).unwrap());
    store.insert(FieldKey::GnssId(1), Field::unsigned(gnss_id, 4).unwrap());
    store.insert(FieldKey::SatelliteMask(1), mask(satellite_mask));
    store.insert(FieldKey::SignalMask(1), mask(signal_mask));

    let sats = Bitmask::from_bits(satellite_mask).unwrap().count_ones() as u8;
    let sigs = Bitmask::from_bits(signal_mask).unwrap().count_ones() as u8;
    for sat in 1..=sats {
        for sig in 1..=sigs {
            let value = f64::from(sat) + f64::from(sig) / 10.0;
            store.insert(FieldKey::phase_bias(1, sat, sig), bias(value));
            store.insert(
                FieldKey::phase_discontinuity(1, sat, sig),
                Field::unsigned(u64::from(sig % 4), 2).unwrap(),
            );
        }
    }
    store
}

#[test]
fn test_satellite_entries_match_mask_population() {
    let store = single_system_store(2, "1001100000000000000000000000000000000001", "1");
    let biases = phase::decode(&store).unwrap();

    assert_eq!(biases.validity_interval_index, 7);
    assert_eq!(biases.systems.len(), 1);

    let system = &biases.systems[0];
    assert_eq!(system.gnss, Constellation::Galileo);
    let ids: Vec<u8> = system.satellites.iter().map(|s| s.sat).collect();
    assert_eq!(ids, vec![1, 4, 5, 40]);
}

#[test]
fn test_signal_labels_use_bit_positions() {
    // positions 0, 3 and 11 on GPS
    let store = single_system_store(0, "1", "1001000000010000");
    let biases = phase::decode(&store).unwrap();

    let signals = &biases.systems[0].satellites[0].signals;
    assert_eq!(signals.len(), 3);
    assert_eq!(signals[0].signal, "L1C/A");
    assert_eq!(signals[1].signal, "L1C(D)");
    assert_eq!(signals[2].signal, "L5 I");

    // field lookups use the compacted signal counter
    assert!((signals[0].phase_bias - 1.1).abs() < 1e-9);
    assert!((signals[1].phase_bias - 1.2).abs() < 1e-9);
    assert!((signals[2].phase_bias - 1.3).abs() < 1e-9);
    assert_eq!(signals[2].discontinuity_indicator, 3);
}

#[test]
fn test_satellite_keys_use_compacted_counter() {
    let store = single_system_store(2, "01101", "11");
    let biases = phase::decode(&store).unwrap();

    let satellites = &biases.systems[0].satellites;
    assert_eq!(satellites.len(), 3);

    // sat1, sat2, sat3 map to satellite IDs 2, 3, 5
    for (counter, (sat, expected_id)) in satellites.iter().zip([2u8, 3, 5]).enumerate() {
        assert_eq!(sat.sat, expected_id);
        assert_eq!(sat.signals.len(), 2);
        let expected_bias = (counter + 1) as f64 + 0.1;
        assert!((sat.signals[0].phase_bias - expected_bias).abs() < 1e-9);
    }
}

#[test]
fn test_every_satellite_gets_every_active_signal() {
    let store = single_system_store(0, "111", "0110011");
    let biases = phase::decode(&store).unwrap();

    for sat in &biases.systems[0].satellites {
        let labels: Vec<&str> = sat.signals.iter().map(|s| s.signal).collect();
        assert_eq!(labels, vec![GPS_SIGNALS[1], GPS_SIGNALS[2], GPS_SIGNALS[5], GPS_SIGNALS[6]]);
    }
}

#[test]
fn test_declared_schema_feeds_decoder() {
    let schema = phase::declare_schema(1, &[1], &[2]).unwrap();
    let keys: Vec<String> = schema.keys().map(ToString::to_string).collect();
    assert_eq!(
        keys,
        vec![
            "phase_validity_interval_index",
            "pb sys1 sat1 sig1",
            "pbi sys1 sat1 sig1",
            "pb sys1 sat1 sig2",
            "pbi sys1 sat1 sig2",
        ]
    );

    let mut store = ParameterStore::new();
    for spec in schema.fields() {
        let field = Field::from_decimal(1.0, spec.width, spec.signed, spec.scale).unwrap();
        store.insert(spec.key.clone(), field);
    }
    store.insert(FieldKey::NSys, Field::unsigned(1, 4).unwrap());
    store.insert(FieldKey::GnssId(1), Field::unsigned(2, 4).unwrap());
    store.insert(FieldKey::SatelliteMask(1), mask("1"));
    store.insert(FieldKey::SignalMask(1), mask("11"));

    let biases = phase::decode(&store).unwrap();
    assert_eq!(biases.systems.len(), 1);
    let satellites = &biases.systems[0].satellites;
    assert_eq!(satellites.len(), 1);
    assert_eq!(satellites[0].sat, 1);
    assert_eq!(satellites[0].signals.len(), 2);
    assert_eq!(satellites[0].signals[0].signal, GALILEO_SIGNALS[0]);
    assert_eq!(satellites[0].signals[1].signal, GALILEO_SIGNALS[1]);
    assert!((satellites[0].signals[1].phase_bias - 1.0).abs() < 1e-9);
    assert_eq!(satellites[0].signals[1].discontinuity_indicator, 1);
}

#[test]
fn test_unsupported_gnss_id_fails() {
    let store = single_system_store(1, "1", "1");
    let result = phase::decode(&store);
    assert!(matches!(result, Err(CodecError::UnsupportedGnssId(1))));
}

#[test]
fn test_missing_slot_aborts_decode() {
    let mut store = single_system_store(2, "11", "1");
    // drop the second satellite's bias by rebuilding without it
    let mut trimmed = ParameterStore::new();
    for (key, field) in store.iter() {
        if *key != FieldKey::phase_bias(1, 2, 1) {
            trimmed.insert(key.clone(), field.clone());
        }
    }
    store = trimmed;

    match phase::decode(&store) {
        Err(CodecError::MissingField(key)) => assert_eq!(key.to_string(), "pb sys1 sat2 sig1"),
        other => panic!("Expected missing field error, got {:?}", other),
    }
}

#[test]
fn test_missing_header_field_fails() {
    let mut store = ParameterStore::new();
    store.insert(FieldKey::PhaseValidityIntervalIndex, Field::unsigned(0, 4).unwrap());
    assert!(matches!(
        phase::decode(&store),
        Err(CodecError::MissingField(FieldKey::NSys))
    ));
}

#[test]
fn test_multiple_systems_decode_in_order() {
    let mut store = single_system_store(0, "1", "1");
    store.insert(FieldKey::NSys, Field::unsigned(2, 4).unwrap());
    store.insert(FieldKey::GnssId(2), Field::unsigned(2, 4).unwrap());
    store.insert(FieldKey::SatelliteMask(2), mask("001"));
    store.insert(FieldKey::SignalMask(2), mask("0000000000001"));
    store.insert(FieldKey::phase_bias(2, 1, 1), bias(-0.5));
    store.insert(FieldKey::phase_discontinuity(2, 1, 1), Field::unsigned(2, 2).unwrap());

    let biases = phase::decode(&store).unwrap();
    assert_eq!(biases.systems.len(), 2);
    assert_eq!(biases.systems[0].gnss, Constellation::Gps);
    assert_eq!(biases.systems[1].gnss, Constellation::Galileo);

    let sat = &biases.systems[1].satellites[0];
    assert_eq!(sat.sat, 3);
    assert_eq!(sat.signals[0].signal, "E6-B C/NAV HAS");
    assert!((sat.signals[0].phase_bias + 0.5).abs() < 1e-9);
    assert_eq!(sat.signals[0].discontinuity_indicator, 2);
}

#[test]
fn test_empty_masks_yield_empty_blocks() {
    let store = single_system_store(2, "0000", "0000");
    let biases = phase::decode(&store).unwrap();
    assert!(biases.systems[0].satellites.is_empty());

    let store = single_system_store(2, "0110", "0000");
    let biases = phase::decode(&store).unwrap();
    assert_eq!(biases.systems[0].satellites.len(), 2);
    assert!(biases.systems[0].satellites.iter().all(|s| s.signals.is_empty()));
}

#[test]
fn test_signal_mask_wider_than_table_fails() {
    let store = single_system_store(2, "1", "10000000000000001");
    assert!(matches!(
        phase::decode(&store),
        Err(CodecError::MaskTooWide { width: 17, capacity: 16, .. })
    ));
}

#[test]
fn test_decode_is_reentrant_across_threads() {
    let stores: Vec<ParameterStore> = (0..4)
        .map(|i| single_system_store(if i % 2 == 0 { 0 } else { 2 }, "1011", "11"))
        .collect();

    let handles: Vec<_> = stores
        .into_iter()
        .map(|store| std::thread::spawn(move || phase::decode(&store).map(|b| b.systems[0].satellites.len())))
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), 3);
    }
}
