use super::*;
use crate::sensors::SentenceCounters;

fn sample_status() -> StatusPacket {
    StatusPacket {
        gps_time: 21_594_500,
        uplink_age: AgeField::Seconds(0),
        time_age: AgeField::Seconds(0),
        location_age: AgeField::Seconds(0),
        altitude_age: AgeField::Seconds(0),
        speed_age: AgeField::Seconds(1),
        course_age: AgeField::Invalid,
        satellites: 6,
        hdop: 165,
        battery_centivolts: Some(532),
        counters: DeltaCounters {
            new_fix: 2,
            new_nofix: 1,
            new_badsum: 0,
        },
    }
}

#[test]
fn test_age_field_encoding() {
    assert_eq!(AgeField::from_age(Some(11_000), 10_000), AgeField::Invalid);
    assert_eq!(AgeField::from_age(Some(3_000), 10_000), AgeField::Seconds(3));
    assert_eq!(AgeField::from_age(Some(9_999), 10_000), AgeField::Seconds(9));
    assert_eq!(AgeField::from_age(Some(10_000), 10_000), AgeField::Invalid);
    assert_eq!(AgeField::from_age(None, 10_000), AgeField::Invalid);

    let mut s = heapless::String::<8>::new();
    write!(s, "{}{}", AgeField::Seconds(3), AgeField::Invalid).unwrap();
    assert_eq!(s.as_str(), "3X");
}

#[test]
fn test_ground_command_classification() {
    assert_eq!(GroundCommand::from_byte(b'P'), GroundCommand::Ping);
    assert_eq!(GroundCommand::from_byte(b'A'), GroundCommand::Arm);
    assert_eq!(GroundCommand::from_byte(b'p'), GroundCommand::Unknown(b'p'));
    assert_eq!(GroundCommand::from_byte(b'\n'), GroundCommand::Unknown(b'\n'));
    assert_eq!(GroundCommand::Arm.as_byte(), b'A');
}

#[test]
fn test_delta_counters() {
    let prev = SentenceCounters {
        with_fix: 10,
        passed_checksum: 12,
        failed_checksum: 1,
    };
    let cur = SentenceCounters {
        with_fix: 15,
        passed_checksum: 18,
        failed_checksum: 1,
    };
    let d = DeltaCounters::between(prev, cur);
    assert_eq!(
        d,
        DeltaCounters {
            new_fix: 5,
            new_nofix: 1,
            new_badsum: 0
        }
    );
}

#[test]
fn test_delta_counters_across_wrap() {
    let prev = SentenceCounters {
        with_fix: u32::MAX,
        passed_checksum: u32::MAX,
        failed_checksum: u32::MAX,
    };
    let cur = SentenceCounters {
        with_fix: 1,
        passed_checksum: 3,
        failed_checksum: 0,
    };
    let d = DeltaCounters::between(prev, cur);
    assert_eq!((d.new_fix, d.new_nofix, d.new_badsum), (2, 2, 1));
}

#[test]
fn test_telemetry_line_format() {
    let pkt = TelemetryPacket {
        latitude: 44.982719,
        longitude: -123.337142,
        altitude_m: 98.5,
        speed_kmph: 1.17,
    };
    let line = pkt.to_line().unwrap();
    assert_eq!(line.as_str(), "T,44.982719,-123.337142,98.50,1.17\r\n");
}

#[test]
fn test_status_line_format() {
    let line = sample_status().to_line().unwrap();
    assert_eq!(line.as_str(), "S,21594500,0,0,0,0,1,X,6,165,532,2/1/0\r\n");
}

#[test]
fn test_status_without_battery_prints_marker() {
    let mut pkt = sample_status();
    pkt.battery_centivolts = None;
    let line = pkt.to_line().unwrap();
    assert_eq!(line.as_str(), "S,21594500,0,0,0,0,1,X,6,165,X,2/1/0\r\n");
}

#[test]
fn test_parse_status_line() {
    let pkt = StatusPacket::parse("S,21594500,0,0,0,0,1,X,6,165,532,2/1/0\r\n").unwrap();
    assert_eq!(pkt, sample_status());
}

#[test]
fn test_parse_dispatches_on_tag() {
    match Packet::parse("T,44.982719,-123.337142,98.50,1.17\n") {
        Ok(Packet::Telemetry(t)) => {
            assert!((t.latitude - 44.982719).abs() < 1e-9);
            assert!((t.longitude + 123.337142).abs() < 1e-9);
            assert!((t.altitude_m - 98.5).abs() < 1e-4);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert!(matches!(
        Packet::parse("S,0,X,X,X,X,X,X,0,0,X,0/0/0"),
        Ok(Packet::Status(_))
    ));
}

#[test]
fn test_parse_errors() {
    assert_eq!(Packet::parse(""), Err(ProtocolError::Empty));
    assert_eq!(Packet::parse("\r\n"), Err(ProtocolError::Empty));
    assert_eq!(Packet::parse("Q,1,2"), Err(ProtocolError::UnknownTag));
    assert_eq!(
        TelemetryPacket::parse("T,1,2,3"),
        Err(ProtocolError::FieldCount {
            expected: 5,
            found: 4
        })
    );
    assert_eq!(
        TelemetryPacket::parse("T,north,2,3,4"),
        Err(ProtocolError::BadNumber)
    );
    assert_eq!(
        TelemetryPacket::parse("S,1,2,3,4"),
        Err(ProtocolError::UnknownTag)
    );
    assert_eq!(
        StatusPacket::parse("S,0,Y,X,X,X,X,X,0,0,X,0/0/0"),
        Err(ProtocolError::BadAge)
    );
    assert_eq!(
        StatusPacket::parse("S,0,X,X,X,X,X,X,0,0,X,0/0"),
        Err(ProtocolError::BadCounters)
    );
    assert_eq!(
        StatusPacket::parse("S,0,X,X,X,X,X,X,0,0,X,0/0/0/0"),
        Err(ProtocolError::BadCounters)
    );
}

#[test]
fn test_oversized_line_is_rejected() {
    let pkt = TelemetryPacket {
        latitude: 1e200,
        ..TelemetryPacket::default()
    };
    assert_eq!(pkt.to_line(), Err(ProtocolError::LineTooLong));
}
