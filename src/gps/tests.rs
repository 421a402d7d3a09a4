use super::{checksum_body, NmeaDecoder, NmeaError, NmeaFrame};
use crate::sensors::GpsReadings;

const GGA_FIX: &[u8] = b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n";
const GGA_NOFIX: &[u8] = b"$GPGGA,123520.50,4807.038,S,01131.000,W,0,00,99.9,,M,,M,,*6B\r\n";
const RMC_ACTIVE: &[u8] =
    b"$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n";
const RMC_VOID: &[u8] = b"$GPRMC,123521,V,,,,,,,230394,,*38\r\n";
const GSV: &[u8] = b"$GPGSV,1,1,01,01,40,083,46*44\r\n";

#[test]
fn test_checksum_body() {
    let s = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47";
    assert_eq!(
        checksum_body(s),
        Ok("GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,")
    );
    assert_eq!(
        checksum_body("$GPGGA,123519*00"),
        Err(NmeaError::BadChecksum)
    );
    assert_eq!(checksum_body("$GPGGA,123519"), Err(NmeaError::MissingChecksum));
}

#[test]
fn test_gga_with_fix_commits_fields() {
    let mut gps = NmeaDecoder::new();
    assert_eq!(gps.encode_all(GGA_FIX, 1_000), 1);

    let loc = gps.location();
    assert!(loc.valid);
    assert!((loc.value.lat - 48.1173).abs() < 1e-6);
    assert!((loc.value.lng - 11.516_666_7).abs() < 1e-6);

    let alt = gps.altitude_m();
    assert!(alt.valid);
    assert!((alt.value - 545.4).abs() < 1e-3);

    assert_eq!(gps.time().value, 12_351_900);
    assert_eq!(gps.satellites(), 8);
    assert_eq!(gps.hdop(), 90);

    let c = gps.counters();
    assert_eq!(c.with_fix, 1);
    assert_eq!(c.passed_checksum, 1);
    assert_eq!(c.failed_checksum, 0);

    // Ages follow the clock
    assert_eq!(gps.location().age(4_500), Some(3_500));
    // Speed and course only come from RMC
    assert_eq!(gps.speed_kmph().age(4_500), None);
    assert_eq!(gps.course_deg().age(4_500), None);
}

#[test]
fn test_gga_without_fix_keeps_last_position() {
    let mut gps = NmeaDecoder::new();
    gps.encode_all(GGA_FIX, 1_000);
    gps.encode_all(GGA_NOFIX, 2_000);

    // Position fields untouched by a no-fix sentence
    assert_eq!(gps.location().updated_at, 1_000);
    assert!(gps.location().value.lat > 0.0);
    assert_eq!(gps.altitude_m().updated_at, 1_000);

    // Time / quality fields always commit
    assert_eq!(gps.time().value, 12_352_050);
    assert_eq!(gps.time().updated_at, 2_000);
    assert_eq!(gps.satellites(), 0);
    assert_eq!(gps.hdop(), 9_990);

    let c = gps.counters();
    assert_eq!(c.with_fix, 1);
    assert_eq!(c.passed_checksum, 2);
}

#[test]
fn test_rmc_active_commits_speed_and_course() {
    let mut gps = NmeaDecoder::new();
    assert_eq!(gps.encode_all(RMC_ACTIVE, 500), 1);

    let speed = gps.speed_kmph();
    assert!(speed.valid);
    assert!((speed.value - 22.4 * 1.852).abs() < 1e-3);
    assert!((gps.course_deg().value - 84.4).abs() < 1e-3);
    assert!(gps.location().valid);
    assert_eq!(gps.counters().with_fix, 1);
}

#[test]
fn test_rmc_void_counts_as_no_fix() {
    let mut gps = NmeaDecoder::new();
    gps.encode_all(RMC_VOID, 500);
    assert!(!gps.speed_kmph().valid);
    assert!(!gps.location().valid);
    assert!(gps.time().valid);
    let c = gps.counters();
    assert_eq!((c.with_fix, c.passed_checksum, c.failed_checksum), (0, 1, 0));
}

#[test]
fn test_bad_checksum_commits_nothing() {
    let mut gps = NmeaDecoder::new();
    let corrupted = b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*48\r\n";
    assert_eq!(gps.encode_all(corrupted, 1_000), 0);
    assert!(!gps.location().valid);
    assert!(!gps.time().valid);
    let c = gps.counters();
    assert_eq!((c.with_fix, c.passed_checksum, c.failed_checksum), (0, 0, 1));
}

#[test]
fn test_unknown_sentence_passes_checksum() {
    let mut gps = NmeaDecoder::new();
    let mut frames = GSV.iter().filter_map(|&b| gps.encode(b, 0));
    assert_eq!(frames.next(), Some(NmeaFrame::Other));
    drop(frames);
    assert_eq!(gps.unknown_sentences(), 1);
    assert_eq!(gps.counters().passed_checksum, 1);
}

#[test]
fn test_noise_and_split_delivery() {
    let mut gps = NmeaDecoder::new();
    // Line noise before the first '$' is ignored
    assert_eq!(gps.encode_all(b"\x00\xffgarbage\r\n", 0), 0);
    let (head, tail) = GGA_FIX.split_at(20);
    assert_eq!(gps.encode_all(head, 0), 0);
    assert_eq!(gps.encode_all(tail, 10), 1);
    assert_eq!(gps.location().updated_at, 10);
    assert_eq!(gps.frame_errors(), 0);
    assert_eq!(gps.counters().failed_checksum, 0);
}

#[test]
fn test_overflow_resyncs_on_next_sentence() {
    let mut gps = NmeaDecoder::new();
    gps.encode(b'$', 0);
    for _ in 0..200 {
        gps.encode(b'A', 0);
    }
    gps.encode(b'\n', 0);
    assert_eq!(gps.frame_errors(), 1);

    assert_eq!(gps.encode_all(GGA_FIX, 100), 1);
    assert!(gps.location().valid);
}

#[test]
fn test_too_short_sentence_is_frame_error() {
    let mut gps = NmeaDecoder::new();
    gps.encode_all(b"$GP\r\n", 0);
    assert_eq!(gps.frame_errors(), 1);
    assert_eq!(gps.counters().failed_checksum, 0);
}
