//! Biorthogonal 9/7 wavelet built from lifting steps
//!
//! ```text
//!  analysis:  odd += α(..)  even += β(..)  odd += γ(..)  even = ε(even + δ(..))  odd /= -ε
//!  synthesis: the same ladder walked backwards with the signs flipped
//! ```
//!
//! Both ends of the signal are handled by reflection, the missing neighbour
//! of an edge sample is replaced by the neighbour on the other side (hence the `2.0 *`).

use super::power_of_two;

const ALPHA: f64 = -1.58615986717275;
const BETA: f64 = -0.05297864003258;
const GAMMA: f64 = 0.88293362717904;
const DELTA: f64 = 0.44350482244527;
const EPSILON: f64 = 1.14960430535816;

/// # Description
/// Multi-scale forward transform
/// ## Returns
/// coefficients ordered coarsest first, `result[0]` is the DC-like term
/// ## Comments
/// `signal.len()` has to be a power of two >= 2
pub fn forward_transform(signal: &[f64]) -> Vec<f64> {
    let mut coefs = signal.to_vec();
    forward_transform_in_place(&mut coefs);
    coefs
}

/// # Description
/// Multi-scale inverse transform, undoes `forward_transform`
pub fn inverse_transform(coefs: &[f64]) -> Vec<f64> {
    let mut signal = coefs.to_vec();
    inverse_transform_in_place(&mut signal);
    signal
}

pub fn forward_transform_in_place(signal: &mut [f64]) {
    let scales = power_of_two(signal.len());
    let mut scratch = vec![0.0; signal.len()];
    let mut len = signal.len();

    for _ in 0..scales {
        analysis_filter(&mut signal[..len]);
        deinterlace(&signal[..len], &mut scratch[..len]);
        signal[..len].copy_from_slice(&scratch[..len]);
        len /= 2;
    }
}

pub fn inverse_transform_in_place(signal: &mut [f64]) {
    let scales = power_of_two(signal.len());
    let mut scratch = vec![0.0; signal.len()];
    let mut len = 2;

    for _ in 0..scales {
        interlace(&signal[..len], &mut scratch[..len]);
        synthesis_filter(&mut scratch[..len]);
        signal[..len].copy_from_slice(&scratch[..len]);
        len *= 2;
    }
}

/// `[s0 s1 s2 s3 ..]` -> `[s0 s2 .. | s1 s3 ..]`
fn deinterlace(input: &[f64], output: &mut [f64]) {
    let half = input.len() / 2;
    for i in 0..half {
        output[i] = input[2 * i];
        output[i + half] = input[2 * i + 1];
    }
}

fn interlace(input: &[f64], output: &mut [f64]) {
    let half = input.len() / 2;
    for i in 0..half {
        output[2 * i] = input[i];
        output[2 * i + 1] = input[i + half];
    }
}

fn analysis_filter(s: &mut [f64]) {
    let n = s.len();

    predict(s, ALPHA);
    update(s, BETA);
    predict(s, GAMMA);

    s[0] = EPSILON * (s[0] + 2.0 * DELTA * s[1]);
    for i in (2..n).step_by(2) {
        s[i] = EPSILON * (s[i] + DELTA * (s[i + 1] + s[i - 1]));
    }

    for i in (1..n).step_by(2) {
        s[i] /= -EPSILON;
    }
}

fn synthesis_filter(s: &mut [f64]) {
    let n = s.len();

    for i in (1..n).step_by(2) {
        s[i] *= -EPSILON;
    }

    s[0] = s[0] / EPSILON - 2.0 * DELTA * s[1];
    for i in (2..n).step_by(2) {
        s[i] = s[i] / EPSILON - DELTA * (s[i + 1] + s[i - 1]);
    }

    predict(s, -GAMMA);
    update(s, -BETA);
    predict(s, -ALPHA);
}

/// odd samples take a weighted sum of their even neighbours
fn predict(s: &mut [f64], weight: f64) {
    let n = s.len();
    for i in (1..n.saturating_sub(2)).step_by(2) {
        s[i] += weight * (s[i - 1] + s[i + 1]);
    }
    s[n - 1] += 2.0 * weight * s[n - 2];
}

/// even samples take a weighted sum of their odd neighbours
fn update(s: &mut [f64], weight: f64) {
    let n = s.len();
    s[0] += 2.0 * weight * s[1];
    for i in (2..n).step_by(2) {
        s[i] += weight * (s[i + 1] + s[i - 1]);
    }
}

mod tests {
    #[allow(unused_imports)]
    use super::*;

    #[allow(dead_code)]
    fn assert_invertible(signal: &[f64]) {
        let coefs = forward_transform(signal);
        assert_eq!(coefs.len(), signal.len());
        let restored = inverse_transform(&coefs);

        let scale = signal.iter().fold(1.0f64, |acc, s| acc.max(s.abs()));
        for (k, (&expected, &got)) in signal.iter().zip(restored.iter()).enumerate() {
            assert!(
                (expected - got).abs() <= 1e-9 * scale,
                "sample {}: expected {} got {}",
                k,
                expected,
                got
            );
        }
    }

    #[test]
    fn impulse() {
        let mut signal = vec![0.0; 64];
        signal[17] = 1.0;
        assert_invertible(&signal);
    }

    #[test]
    fn ramp() {
        let signal = (0..256)
            .map(|k| k as f64 * 256.0 - 32768.0)
            .collect::<Vec<_>>();
        assert_invertible(&signal);
    }

    #[test]
    fn sine_block() {
        let signal = (0..1024)
            .map(|k| (k as f64 * 0.05).sin() * 20000.0)
            .collect::<Vec<_>>();
        assert_invertible(&signal);
    }

    #[test]
    fn shortest_frames() {
        assert_invertible(&[3.0, -7.0]);
        assert_invertible(&[1.0, 2.0, 4.0, -8.0]);
    }

    #[test]
    fn constant_signal_packs_into_dc() {
        let coefs = forward_transform(&[100.0; 32]);
        // a flat signal leaves (almost) nothing in the detail bands
        let detail_energy = coefs[1..].iter().map(|c| c * c).sum::<f64>();
        assert!(coefs[0].abs() > 100.0);
        assert!(detail_energy < 1e-6 * coefs[0] * coefs[0]);
    }

    #[test]
    #[should_panic]
    fn rejects_non_power_of_two() {
        forward_transform(&[0.0; 12]);
    }
}
