use std::io::{self, Write};

use anyhow::Context;
use clap::{Parser, Subcommand};

use arg_ir::{
    arg::{self, climate::clamp_temperature, Fan, Mode, Swing, ThermostatState},
    broadlink::Recording,
    modem::{create_codec, CodecType},
    remote::{ReceiveData, TransmitData, DEFAULT_TOLERANCE},
    smartir,
};

#[derive(Parser)]
#[command(about = "Encode and decode ARG air conditioner IR frames")]
struct Opt {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Prints the frame for a state
    Encode {
        #[arg(short, long, default_value = "auto")]
        mode: Mode,
        #[arg(short, long, default_value_t = 24.0)]
        temperature: f32,
        #[arg(long, default_value = "auto")]
        fan: Fan,
        #[arg(long, default_value = "off")]
        swing: Swing,
        #[arg(short, long, default_value = "base64")]
        format: CodecType,
    },

    /// Reads one frame per line from stdin and prints each decoded state as JSON
    Decode {
        #[arg(short, long, default_value = "base64")]
        format: CodecType,
        /// Accepted deviation from the nominal pulse durations, in percent
        #[arg(short, long, default_value_t = DEFAULT_TOLERANCE)]
        tolerance: u32,
    },

    /// Prints a SmartIR code file covering every state
    Smartir,
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(default_log_level())
        .parse_default_env()
        .init();

    match Opt::parse().command {
        Command::Encode {
            mode,
            temperature,
            fan,
            swing,
            format,
        } => {
            let state = ThermostatState {
                mode,
                target_temperature: clamp_temperature(temperature),
                fan,
                swing,
            };
            let mut data = TransmitData::new();
            let packet = arg::encode(&state, &mut data);
            log::info!("{:?}: {}", state, packet);

            println!("{}", create_codec(format).encode(&Recording::from(data))?);
        }
        Command::Decode { format, tolerance } => decode(format, tolerance)?,
        Command::Smartir => {
            let file = smartir::code_file()?;
            println!("{}", serde_json::to_string_pretty(&file)?);
        }
    }

    Ok(())
}

fn decode(format: CodecType, tolerance: u32) -> anyhow::Result<()> {
    let codec = create_codec(format);
    let mut state = ThermostatState::default();

    for line in io::stdin().lines() {
        let line = line.context("reading stdin")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let recording = match codec.decode(line) {
            Ok(recording) => recording,
            Err(err) => {
                log::warn!("skipping line: {err}");
                continue;
            }
        };

        match arg::decode(
            &mut ReceiveData::with_tolerance(&recording.pulses, tolerance),
            &state,
        ) {
            Ok(decoded) => {
                state = decoded;
                println!("{}", serde_json::to_string(&state)?);
            }
            Err(err) => log::warn!("not an ARG frame: {err}"),
        }
        io::stdout().flush()?;
    }

    Ok(())
}

fn default_log_level() -> log::LevelFilter {
    if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    }
}
