use agress::{
    decode_stream, encode_stream, ChannelMode, DecoderConfig, EncoderConfig, SampleBits,
    StreamInfo, WavCodec,
};

fn main() {
    println!("synthesizing two seconds of a stereo chord...");

    let info = StreamInfo::new(22050, 2, SampleBits::Sixteen);
    let format = info.format();
    let samples_per_channel = 2 * info.sample_rate as usize;

    //left gets an A, right gets the E above it
    let signal = (0..samples_per_channel * 2)
        .map(|i| {
            let t = (i / 2) as f64 / info.sample_rate as f64;
            let f = if i % 2 == 0 { 440.0 } else { 659.25 };
            8000.0 * (2.0 * std::f64::consts::PI * f * t).sin()
        })
        .collect::<Vec<_>>();
    let mut pcm = vec![0u8; samples_per_channel * info.block_align()];
    format.from_signal(&signal, &mut pcm);
    let wav = WavCodec::with_pcm(info, pcm);

    for &(mode, ratio) in [
        (ChannelMode::JointStereo, 4.0),
        (ChannelMode::Stereo, 4.0),
        (ChannelMode::JointStereo, 12.0),
        (ChannelMode::Mono, 8.0),
    ]
    .iter()
    {
        let config = EncoderConfig::default().with_mode(mode).with_ratio(ratio);

        //compress into main memory
        let mut agr = Vec::new();
        encode_stream(&wav, &config, &mut agr).unwrap();

        //and straight back out again
        let decoded = decode_stream(&agr[..], &DecoderConfig::default()).unwrap();

        let snr = if mode == ChannelMode::Mono {
            //downmixed, nothing to compare against
            None
        } else {
            let a = format.to_signal(wav.pcm());
            let b = format.to_signal(&decoded.pcm()[..wav.pcm().len()]);
            let signal = a.iter().map(|x| x * x).sum::<f64>();
            let noise = a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f64>();
            Some(10.0 * (signal / noise.max(1e-9)).log10())
        };

        println!(
            "{:?} at {}:1 -> {} of {} bytes, snr = {}",
            mode,
            ratio,
            agr.len(),
            wav.pcm().len(),
            snr.map(|db| format!("{:.1} dB", db))
                .unwrap_or_else(|| "n/a".to_string())
        );
    }
}
