use std::{
    fs::File,
    io::{BufReader, BufWriter},
    process,
};

use agress::{
    decode_stream, encode_stream, AgressError, ChannelMode, DecoderConfig, EncoderConfig, WavCodec,
};
use clap::{App, Arg, ArgGroup, ArgMatches};

fn main() {
    let matches = App::new("agress")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Progressive wavelet audio codec: wav <-> agr")
        .arg(Arg::with_name("encode").short("e").long("encode").help("Encode a wav file"))
        .arg(Arg::with_name("decode").short("d").long("decode").help("Decode an agr file"))
        .group(
            ArgGroup::with_name("direction")
                .args(&["encode", "decode"])
                .required(true),
        )
        .arg(
            Arg::with_name("input")
                .short("i")
                .long("input")
                .value_name("PATHNAME")
                .help("Input file")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .value_name("PATHNAME")
                .help("Output file")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("ratio")
                .short("r")
                .long("ratio")
                .value_name("NUMBER")
                .help("Compression ratio [default: 4]")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("frame")
                .short("f")
                .long("frame")
                .value_name("NUMBER")
                .help("Frame size, a power of 2 [default: 1024]")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("smooth")
                .short("w")
                .long("smooth")
                .value_name("NUMBER")
                .help("Smooth factor applied across frame edges when decoding [default: 5]")
                .takes_value(true),
        )
        .arg(Arg::with_name("mono").short("m").long("mono").help("Downmix to mono"))
        .arg(Arg::with_name("stereo").short("s").long("stereo").help("Full stereo"))
        .arg(
            Arg::with_name("jstereo")
                .short("j")
                .long("jstereo")
                .help("Joint stereo (default)"),
        )
        .group(ArgGroup::with_name("channels").args(&["mono", "stereo", "jstereo"]))
        .arg(
            Arg::with_name("mid-side-ratio")
                .short("R")
                .long("mid-side-ratio")
                .value_name("NUMBER")
                .help("Percent of a joint stereo budget spent on the mid channel [default: 70]")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("More logging, repeat for more"),
        )
        .get_matches();

    let level = match matches.occurrences_of("verbose") {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    if let Ok(()) = log::set_logger(&LOGGER) {
        log::set_max_level(level);
    }

    if let Err(err) = run(&matches) {
        log::error!("{}", err);
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<(), AgressError> {
    // both are required
    let input = matches.value_of("input").unwrap_or_default();
    let output = matches.value_of("output").unwrap_or_default();

    if matches.is_present("encode") {
        let config = encoder_config(matches)?;
        config.validate()?;
        let wav = WavCodec::load(BufReader::new(File::open(input)?))?;
        let header = encode_stream(&wav, &config, BufWriter::new(File::create(output)?))?;
        log::info!("{} -> {}: {:?}", input, output, header);
    } else {
        let config = decoder_config(matches)?;
        let wav = decode_stream(BufReader::new(File::open(input)?), &config)?;
        wav.save_to(BufWriter::new(File::create(output)?))?;
        log::info!(
            "{} -> {}: {} samples per channel",
            input,
            output,
            wav.samples_per_channel()
        );
    }
    Ok(())
}

fn encoder_config(matches: &ArgMatches) -> Result<EncoderConfig, AgressError> {
    let mut config = EncoderConfig::default();
    if let Some(ratio) = parse_arg(matches, "ratio")? {
        config = config.with_ratio(ratio);
    }
    if let Some(frame) = parse_arg(matches, "frame")? {
        config = config.with_frame_size(frame);
    }
    if let Some(ms_ratio) = parse_arg(matches, "mid-side-ratio")? {
        config = config.with_mid_side_ratio(ms_ratio);
    }
    if matches.is_present("mono") {
        config = config.with_mode(ChannelMode::Mono);
    } else if matches.is_present("stereo") {
        config = config.with_mode(ChannelMode::Stereo);
    } else if matches.is_present("jstereo") {
        config = config.with_mode(ChannelMode::JointStereo);
    }
    Ok(config)
}

fn decoder_config(matches: &ArgMatches) -> Result<DecoderConfig, AgressError> {
    let mut config = DecoderConfig::default();
    if let Some(smooth) = parse_arg(matches, "smooth")? {
        config = config.with_smooth(smooth);
    }
    Ok(config)
}

fn parse_arg<T>(matches: &ArgMatches, name: &str) -> Result<Option<T>, AgressError>
where
    T: std::str::FromStr,
{
    matches
        .value_of(name)
        .map(|value| {
            value.parse::<T>().map_err(|_| {
                AgressError::InvalidConfig(format!("--{} expects a number, got {:?}", name, value))
            })
        })
        .transpose()
}

/// A simple stderr logger.
static LOGGER: SimpleLogger = SimpleLogger;
struct SimpleLogger;
impl log::Log for SimpleLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            let target = if !record.target().is_empty() {
                record.target()
            } else {
                record.module_path().unwrap_or_default()
            };

            match record.level() {
                log::Level::Error => eprintln!("error: {}", record.args()),
                log::Level::Warn => eprintln!("Warning (in {}): {}", target, record.args()),
                log::Level::Info => eprintln!("Info (in {}): {}", target, record.args()),
                log::Level::Debug => eprintln!("Debug (in {}): {}", target, record.args()),
                log::Level::Trace => eprintln!("Trace (in {}): {}", target, record.args()),
            }
        }
    }

    fn flush(&self) {}
}
