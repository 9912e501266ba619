use super::{
    format::SampleFormat,
    progressive::{decode_coefficients, encode_coefficients},
};
use crate::math::{forward_transform, inverse_transform, power_of_two};

/// # Description
/// Compresses one frame of raw PCM into at most `output.len()` bytes
/// ## Returns
/// bytes of `output` used, anything past that is left untouched
/// ## Comments
/// - the frame must hold a power of two (>= 2) samples, `output` at least one byte
/// - the result is progressive: any prefix of at least one byte decodes
pub fn encode_frame(samples: &[u8], format: SampleFormat, output: &mut [u8]) -> usize {
    assert!(!output.is_empty(), "frame budget must be at least one byte");
    assert_eq!(
        samples.len() % format.bytes_per_sample(),
        0,
        "frame ends in a partial sample"
    );

    let signal = format.to_signal(samples);
    power_of_two(signal.len());

    let coefs = forward_transform(&signal)
        .into_iter()
        // truncated toward zero, like the legacy encoder
        .map(|c| c.clamp(i32::MIN as f64, i32::MAX as f64) as i32)
        .collect::<Vec<_>>();

    encode_coefficients(&coefs, output)
}

/// # Description
/// Reconstructs a frame of raw PCM from the first `input.len()` bytes of an encoded frame
/// ## Comments
/// - the sample count is taken from `output`, it has to match the encoder's
/// - samples that overshoot the format's range are clamped
pub fn decode_frame(input: &[u8], format: SampleFormat, output: &mut [u8]) {
    assert!(!input.is_empty(), "encoded frame is empty");
    let len = format.sample_count(output);
    power_of_two(len);

    let coefs = decode_coefficients(input, len)
        .into_iter()
        .map(|c| c as f64)
        .collect::<Vec<_>>();
    let signal = inverse_transform(&coefs);
    format.from_signal(&signal, output);
}

mod tests {
    #[allow(unused_imports)]
    use super::*;

    #[allow(dead_code)]
    fn sine_frame(format: SampleFormat, len: usize, amplitude: f64) -> Vec<u8> {
        let signal = (0..len)
            .map(|k| {
                let t = k as f64;
                amplitude * ((t * 0.07).sin() * 0.7 + (t * 0.31).sin() * 0.3)
            })
            .collect::<Vec<_>>();
        let mut bytes = vec![0u8; len * format.bytes_per_sample()];
        format.from_signal(&signal, &mut bytes);
        bytes
    }

    #[allow(dead_code)]
    fn mse(format: SampleFormat, a: &[u8], b: &[u8]) -> f64 {
        let a = format.to_signal(a);
        let b = format.to_signal(b);
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f64>()
            / a.len() as f64
    }

    #[test]
    fn silence_stays_silent() {
        for &(format, silence) in [(SampleFormat::S16LE, 0u8), (SampleFormat::U8, 128u8)].iter() {
            let samples = vec![silence; 64 * format.bytes_per_sample()];
            let mut encoded = [0xaau8; 32];
            assert_eq!(encode_frame(&samples, format, &mut encoded), 1);
            assert_eq!(encoded[0], 0);

            let mut decoded = vec![0x55u8; samples.len()];
            decode_frame(&encoded[..1], format, &mut decoded);
            assert_eq!(decoded, samples);
        }
    }

    #[test]
    fn error_shrinks_as_budget_grows() {
        let format = SampleFormat::S16LE;
        let samples = sine_frame(format, 256, 8000.0);

        let mut previous = f64::INFINITY;
        for &budget in [4usize, 16, 64, 256, 4096].iter() {
            let mut encoded = vec![0u8; budget];
            let used = encode_frame(&samples, format, &mut encoded);
            assert!(used <= budget);

            let mut decoded = vec![0u8; samples.len()];
            decode_frame(&encoded[..used], format, &mut decoded);
            let error = mse(format, &samples, &decoded);
            assert!(error <= previous, "budget {}: {} > {}", budget, error, previous);
            previous = error;
        }
        // with room to spare only rounding is lost
        assert!(previous < 4.0, "{}", previous);
    }

    #[test]
    fn every_prefix_decodes() {
        let format = SampleFormat::U16BE;
        let samples = sine_frame(format, 64, 20000.0);
        let mut encoded = vec![0u8; 1024];
        let used = encode_frame(&samples, format, &mut encoded);
        assert!(used < encoded.len());

        let mut decoded = vec![0u8; samples.len()];
        for len in 1..=used {
            decode_frame(&encoded[..len], format, &mut decoded);
        }
        assert!(mse(format, &samples, &decoded) < 4.0);
    }

    #[test]
    fn eight_bit_frames() {
        for &format in [SampleFormat::U8, SampleFormat::S8].iter() {
            let samples = sine_frame(format, 128, 100.0);
            let mut encoded = vec![0u8; 512];
            let used = encode_frame(&samples, format, &mut encoded);
            assert!(used < encoded.len());

            let mut decoded = vec![0u8; samples.len()];
            decode_frame(&encoded[..used], format, &mut decoded);
            assert!(mse(format, &samples, &decoded) < 4.0, "{:?}", format);
        }
    }

    #[test]
    fn random_frames_respect_budget() {
        use rand::prelude::*;
        let mut rng = StdRng::seed_from_u64(0x6741);
        let format = SampleFormat::S16LE;
        for _ in 0..20 {
            let len: usize = 1 << rng.gen_range(1..10u32);
            let samples = (0..len * 2).map(|_| rng.gen::<u8>()).collect::<Vec<_>>();
            let budget = rng.gen_range(1..len * 2);
            let mut encoded = vec![0u8; budget];
            let used = encode_frame(&samples, format, &mut encoded);
            assert!(used >= 1 && used <= budget);

            let mut decoded = vec![0u8; samples.len()];
            decode_frame(&encoded[..used], format, &mut decoded);
        }
    }

    #[test]
    fn coefficients_truncate_toward_zero() {
        // a unit impulse spreads into coefficients that are all below one in magnitude
        for &impulse in [1i16, -1].iter() {
            let mut samples = vec![0u8; 16];
            samples[..2].copy_from_slice(&impulse.to_le_bytes());
            let mut encoded = [0xaau8; 8];
            assert_eq!(encode_frame(&samples, SampleFormat::S16LE, &mut encoded), 1);
            assert_eq!(encoded[0], 0);
        }

        // a step of 4 in an otherwise silent frame keeps its exact bytes
        let samples = [0u8, 0, 0, 0, 0, 0, 0, 0, 4, 4, 4, 4, 4, 4, 4, 4];
        let mut first = [0u8; 64];
        let mut second = [0u8; 64];
        let first_len = encode_frame(&samples, SampleFormat::U8, &mut first);
        let second_len = encode_frame(&samples, SampleFormat::U8, &mut second);
        assert_eq!(&first[..first_len], &second[..second_len]);
        let coefs = forward_transform(&SampleFormat::U8.to_signal(&samples))
            .into_iter()
            .map(|c| c as i32)
            .collect::<Vec<_>>();
        let mut expected = [0u8; 64];
        let expected_len = encode_coefficients(&coefs, &mut expected);
        assert_eq!(&first[..first_len], &expected[..expected_len]);
    }

    #[test]
    #[should_panic]
    fn three_samples() {
        encode_frame(&[0; 6], SampleFormat::S16LE, &mut [0; 16]);
    }

    #[test]
    #[should_panic]
    fn five_samples() {
        encode_frame(&[0; 5], SampleFormat::U8, &mut [0; 16]);
    }

    #[test]
    #[should_panic]
    fn thousand_samples() {
        encode_frame(&[0; 2000], SampleFormat::S16BE, &mut [0; 16]);
    }

    #[test]
    #[should_panic]
    fn zero_budget() {
        encode_frame(&[0; 8], SampleFormat::U8, &mut []);
    }

    #[test]
    #[should_panic]
    fn decode_into_odd_frame() {
        decode_frame(&[0], SampleFormat::U8, &mut [0; 12]);
    }

    #[test]
    #[should_panic]
    fn decode_into_three_samples() {
        decode_frame(&[0], SampleFormat::S16LE, &mut [0; 6]);
    }

    #[test]
    #[should_panic]
    fn decode_into_five_samples() {
        decode_frame(&[0], SampleFormat::U8, &mut [0; 5]);
    }

    #[test]
    #[should_panic]
    fn decode_into_thousand_samples() {
        decode_frame(&[0], SampleFormat::S16BE, &mut [0; 2000]);
    }
}
