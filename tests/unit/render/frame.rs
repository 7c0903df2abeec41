use super::*;

#[test]
fn filled_frame_has_expected_layout() {
    let f = VideoFrame::filled(3, 2, [1, 2, 3, 255]);
    assert_eq!(f.data.len(), 24);
    assert_eq!(f.expected_len(), 24);
    assert_eq!(f.pixel(2, 1), Some([1, 2, 3, 255]));
    assert_eq!(f.pixel(3, 0), None);
    assert_eq!(f.pixel(0, 2), None);
}

#[test]
fn over_transparent_source_keeps_destination() {
    let mut dst = vec![10u8, 20, 30, 255];
    premul_over_in_place(&mut dst, &[0, 0, 0, 0]).unwrap();
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn over_opaque_source_replaces_destination() {
    let mut dst = vec![10u8, 20, 30, 255];
    premul_over_in_place(&mut dst, &[200, 0, 100, 255]).unwrap();
    assert_eq!(dst, vec![200, 0, 100, 255]);
}

#[test]
fn over_half_coverage_blends_and_stays_opaque() {
    // Premultiplied red at 50% coverage over opaque white.
    let mut dst = vec![255u8, 255, 255, 255];
    premul_over_in_place(&mut dst, &[128, 0, 0, 128]).unwrap();
    assert_eq!(dst, vec![255, 127, 127, 255]);
}

#[test]
fn over_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(premul_over_in_place(&mut dst, &[0u8; 4]).is_err());
}
