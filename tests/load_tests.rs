//! Timing and stress checks for the hot paths of the NetIO engine

use netio::{
    DrParams, DrTable, EntitySnapshot, IoType, LoopbackTransport, NetIo, NetIoSettings, Nib,
    NibKey, NtmRegistry, Simulation, TypeDescriptor,
};
use pdu::{
    decode_pdu, encode_pdu, split_pdus, EntityId, EntityStatePdu, EntityTypeCode, EulerAngles,
    ProtocolVersion, Timestamp, Vec3,
};
use std::time::Instant;

struct Quiet;

impl Simulation for Quiet {
    fn publishable_entities(&self) -> Vec<EntitySnapshot> {
        Vec::new()
    }

    fn ownship_position(&self) -> Option<Vec3> {
        Some(Vec3::ZERO)
    }
}

fn state(entity: u16, x: f64) -> Vec<u8> {
    let pdu = EntityStatePdu {
        entity_id: EntityId::new(20, 1, entity),
        entity_type: EntityTypeCode::new(1, 2, 225, 1, 3, 0, 0),
        location: Vec3::new(x, 0.0, 0.0),
        ..Default::default()
    };
    encode_pdu(ProtocolVersion::Ieee1278_1A, 1, Timestamp(0), &pdu).unwrap()
}

/// Benchmarks entity-state decoding
#[test]
fn benchmark_entity_state_decode() {
    let bytes = state(1, 100.0);
    let iterations = 100_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let _ = decode_pdu::<EntityStatePdu>(&bytes).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "Entity-state decode: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // Should complete in under 2 seconds even in debug builds
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks splitting a full datagram of bundled PDUs
#[test]
fn benchmark_datagram_split() {
    let mut datagram = Vec::new();
    for entity in 1..=10 {
        datagram.extend(state(entity, 0.0));
    }
    let iterations = 50_000;
    let start = Instant::now();

    for _ in 0..iterations {
        assert_eq!(split_pdus(&datagram).count(), 10);
    }

    let duration = start.elapsed();
    println!("Datagram split: {} iterations in {:?}", iterations, duration);
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks type lookup against a large mapping table
#[test]
fn benchmark_ntm_lookup() {
    let mut registry = NtmRegistry::new();
    for category in 1..=50u8 {
        for subcategory in 0..=20u8 {
            registry
                .register(
                    EntityTypeCode::new(1, 2, 225, category, subcategory, 0, 0),
                    TypeDescriptor::new(format!("type {}-{}", category, subcategory)),
                )
                .unwrap();
        }
    }

    let query = EntityTypeCode::new(1, 2, 225, 50, 20, 3, 0);
    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        assert!(registry.lookup(&query).is_some());
    }

    let duration = start.elapsed();
    println!(
        "NTM lookup over {} entries: {} iterations in {:?}",
        registry.len(),
        iterations,
        duration
    );
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks the dead-reckoning accept predicate
#[test]
fn benchmark_dead_reckoning_accept() {
    let table = DrTable::new(DrParams::default());
    let mut nib = Nib::new(
        IoType::Input,
        NibKey::new(1, 20, 1),
        EntityTypeCode::new(1, 2, 225, 1, 3, 0, 0),
    );
    nib.dead_reckoning = Some(netio::DrState {
        velocity: Vec3::new(200.0, 0.0, 0.0),
        ..Default::default()
    });

    let iterations = 200_000;
    let start = Instant::now();
    let mut accepted = 0;

    for i in 0..iterations {
        let t = (i % 100) as f64 * 0.01;
        let candidate = Vec3::new(200.0 * t, 0.0, 0.0);
        if table.should_accept_update(&nib, &candidate, &EulerAngles::default(), t) {
            accepted += 1;
        }
    }

    let duration = start.elapsed();
    println!(
        "DR accept: {} iterations in {:?}, {} accepted",
        iterations, duration, accepted
    );
    assert_eq!(accepted, 0);
    assert!(duration.as_millis() < 2000);
}

/// Stress test: a full NIB table fed through the engine cycle after cycle
#[test]
fn stress_many_entities() {
    let transport = LoopbackTransport::new();
    let wire = transport.clone();
    let settings = NetIoSettings {
        max_nibs: 1000,
        max_receives_per_cycle: 500,
        ..Default::default()
    };
    let mut engine = NetIo::new(settings, transport, Quiet);
    engine.start().unwrap();

    let start = Instant::now();
    for cycle in 0..10 {
        let now = cycle as f64 * 0.1;
        for entity in 1..=1000u16 {
            wire.inject(state(entity, entity as f64 + cycle as f64 * 10.0));
        }
        while wire.pending() > 0 {
            engine.run_cycle(now).unwrap();
        }
    }
    let duration = start.elapsed();

    println!(
        "Processed {} PDUs for {} entities in {:?}",
        engine.stats().pdus_received,
        engine.nibs().len(IoType::Input),
        duration
    );
    assert_eq!(engine.nibs().len(IoType::Input), 1000);
    assert_eq!(engine.stats().pdus_received, 10_000);
    assert_eq!(engine.stats().capacity_rejected, 0);
    assert!(duration.as_secs() < 10);

    // Everything goes silent; one cycle reaps the whole table
    engine.run_cycle(100.0).unwrap();
    assert!(engine.nibs().is_empty(IoType::Input));
    assert_eq!(engine.stats().entities_reaped, 1000);
}
