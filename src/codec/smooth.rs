use super::format::SampleFormat;

/// # Description
/// Blurs the seam between two consecutive frames with a boxcar filter
/// ## Comments
/// - works on the last `overlap` samples of `first` and the first `overlap` of `second`
/// - operates on stored values, so for unsigned formats no centering happens
/// - `1 <= overlap <= ` sample count of either frame
pub fn smooth_edge(first: &mut [u8], second: &mut [u8], overlap: usize, format: SampleFormat) {
    let first_len = format.sample_count(first);
    let second_len = format.sample_count(second);
    assert!(overlap >= 1, "overlap must be at least one sample");
    assert!(
        overlap <= first_len && overlap <= second_len,
        "overlap of {} does not fit frames of {} and {} samples",
        overlap,
        first_len,
        second_len
    );

    let window = (first_len - overlap..first_len)
        .map(|k| format.read_raw(first, k))
        .chain((0..overlap).map(|k| format.read_raw(second, k)))
        .collect::<Vec<_>>();
    let mut smoothed = window.clone();

    // 16-bit sums over long windows overflow an i32
    let width = overlap as i64;
    let mut sum = window[..overlap].iter().map(|&v| v as i64).sum::<i64>();
    for i in 0..overlap {
        smoothed[i + overlap / 2] = (sum / width) as i32;
        sum += (window[i + overlap] - window[i]) as i64;
    }

    let (head, tail) = smoothed.split_at(overlap);
    for (k, &value) in head.iter().enumerate() {
        format.write_raw(first, first_len - overlap + k, value);
    }
    for (k, &value) in tail.iter().enumerate() {
        format.write_raw(second, k, value);
    }
}

mod tests {
    #[allow(unused_imports)]
    use super::*;

    #[test]
    fn step_becomes_a_ramp() {
        let mut first = [10u8; 8];
        let mut second = [20u8; 8];
        smooth_edge(&mut first, &mut second, 4, SampleFormat::U8);

        assert_eq!(&first[4..], &[10, 10, 10, 12]);
        assert_eq!(&second[..4], &[15, 17, 20, 20]);
        // nothing outside the window moves
        assert_eq!(&first[..4], &[10; 4]);
        assert_eq!(&second[4..], &[20; 4]);
    }

    #[test]
    fn ramp_is_monotone_in_every_format() {
        for &format in [
            SampleFormat::S8,
            SampleFormat::S16LE,
            SampleFormat::S16BE,
            SampleFormat::U16LE,
            SampleFormat::U16BE,
        ]
        .iter()
        {
            let bps = format.bytes_per_sample();
            let mut first = vec![0u8; 16 * bps];
            let mut second = vec![0u8; 16 * bps];
            let (lo, _) = format.stored_range();
            for k in 0..16 {
                format.write_raw(&mut first, k, lo + 10);
                format.write_raw(&mut second, k, lo + 110);
            }
            smooth_edge(&mut first, &mut second, 6, format);

            let joined = (0..16)
                .map(|k| format.read_raw(&first, k))
                .chain((0..16).map(|k| format.read_raw(&second, k)))
                .collect::<Vec<_>>();
            assert!(joined.windows(2).all(|w| w[0] <= w[1]), "{:?}", format);
            assert!(joined[15] > joined[0] && joined[16] < joined[31]);
        }
    }

    #[test]
    fn full_frame_overlap() {
        let mut first = [0u8, 0];
        let mut second = [100u8, 100];
        smooth_edge(&mut first, &mut second, 2, SampleFormat::U8);
        assert_eq!((first, second), ([0, 0], [50, 100]));
    }

    #[test]
    fn full_scale_wide_window() {
        let format = SampleFormat::U16LE;
        let mut first = vec![0xffu8; 2 * 65536];
        let mut second = vec![0xffu8; 2 * 65536];
        smooth_edge(&mut first, &mut second, 65536, format);
        assert!(first.iter().chain(second.iter()).all(|&b| b == 0xff));

        // a ramp that sums far past i32::MAX still averages correctly
        let mut low = vec![0u8; 2 * 65536];
        let mut high = vec![0xffu8; 2 * 65536];
        smooth_edge(&mut low, &mut high, 65536, format);
        assert_eq!(format.read_raw(&low, 65536 / 2 - 1), 0);
        assert_eq!(format.read_raw(&high, 0), 65535 / 2);
        assert_eq!(format.read_raw(&high, 65536 / 2), 65535);
    }

    #[test]
    #[should_panic]
    fn overlap_larger_than_frame() {
        smooth_edge(&mut [0; 4], &mut [0; 8], 5, SampleFormat::U8);
    }

    #[test]
    #[should_panic]
    fn empty_overlap() {
        smooth_edge(&mut [0; 4], &mut [0; 4], 0, SampleFormat::U8);
    }
}
