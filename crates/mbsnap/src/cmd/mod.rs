use clap::{Args, Subcommand, ValueEnum};
use std::net::IpAddr;
use std::path::PathBuf;

use mbsnap_registers::{ByteOrder, ChannelGroup, DecodePolicy, ValueType, WordOrder};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod channels;
pub mod decode;
pub mod encode;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the register-write endpoint.
    Serve(ServeArgs),
    /// Decode one register pair.
    Decode(DecodeArgs),
    /// Show the register pair a device sends for a value.
    Encode(EncodeArgs),
    /// Print the channel table.
    Channels(ChannelsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Channels(args) => channels::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// JSON config file. Flags below override its values.
    #[arg(long, value_name = "FILE", env = "MBSNAP_CONFIG")]
    pub config: Option<PathBuf>,
    /// Address to listen on.
    #[arg(long, value_name = "IP", env = "MBSNAP_LISTEN")]
    pub listen: Option<IpAddr>,
    /// Port to listen on.
    #[arg(long, short = 'p', env = "MBSNAP_PORT")]
    pub port: Option<u16>,
    /// Snapshot file path.
    #[arg(long, short = 'o', value_name = "FILE", env = "MBSNAP_OUTPUT")]
    pub output: Option<PathBuf>,
    /// Protocol address of engineering offset 0 (40001 or 0).
    #[arg(long, value_name = "ADDR", env = "MBSNAP_ADDRESS_BASE")]
    pub address_base: Option<u16>,
    /// Peer addresses allowed to connect (comma-separated).
    #[arg(long, value_name = "IPS", value_delimiter = ',', env = "MBSNAP_ALLOW")]
    pub allow: Option<Vec<String>>,
    #[command(flatten)]
    pub decode: DecodeFlags,
    /// Scale for int16 fallback on analog inputs.
    #[arg(long, value_name = "FACTOR")]
    pub scale_ai: Option<f64>,
    /// Scale for int16 fallback on analog outputs.
    #[arg(long, value_name = "FACTOR")]
    pub scale_ao: Option<f64>,
    /// Scale for int16 fallback on tank volumes.
    #[arg(long, value_name = "FACTOR")]
    pub scale_tk: Option<f64>,
    /// Minimum spacing between snapshot writes (e.g. 200ms, 1s, 0).
    #[arg(long, value_name = "DURATION", env = "MBSNAP_FLUSH_INTERVAL")]
    pub flush_interval: Option<String>,
    /// Register store size in words.
    #[arg(long, value_name = "WORDS")]
    pub register_count: Option<usize>,
}

/// Decoding flags shared by `serve`, `decode` and `encode`.
#[derive(Args, Debug, Default)]
pub struct DecodeFlags {
    /// Word order of a register pair (big or little).
    #[arg(long, value_name = "ORDER", env = "MBSNAP_WORD_ORDER")]
    pub word_order: Option<WordOrder>,
    /// Byte order within each word (big or little).
    #[arg(long, value_name = "ORDER", env = "MBSNAP_BYTE_ORDER")]
    pub byte_order: Option<ByteOrder>,
    /// Float decoding policy (strict or heuristic).
    #[arg(long, value_name = "POLICY", env = "MBSNAP_POLICY")]
    pub policy: Option<DecodePolicy>,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// First word in wire order (decimal or 0x-prefixed hex).
    #[arg(value_parser = parse_word)]
    pub w0: u16,
    /// Second word in wire order.
    #[arg(value_parser = parse_word)]
    pub w1: u16,
    /// Value type (float32 or uint32).
    #[arg(long = "type", value_name = "TYPE", default_value = "float32")]
    pub value_type: ValueType,
    /// Scale applied to an int16 fallback.
    #[arg(long, default_value_t = 1.0)]
    pub scale: f64,
    #[command(flatten)]
    pub decode: DecodeFlags,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Value to encode.
    #[arg(allow_hyphen_values = true)]
    pub value: String,
    /// Value type (float32 or uint32).
    #[arg(long = "type", value_name = "TYPE", default_value = "float32")]
    pub value_type: ValueType,
    #[command(flatten)]
    pub decode: DecodeFlags,
}

#[derive(Args, Debug)]
pub struct ChannelsArgs {
    /// Only list one group.
    #[arg(long, value_name = "GROUP")]
    pub group: Option<GroupArg>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum GroupArg {
    Ai,
    Ao,
    Hc,
    Tk,
}

impl From<GroupArg> for ChannelGroup {
    fn from(arg: GroupArg) -> Self {
        match arg {
            GroupArg::Ai => ChannelGroup::AnalogInput,
            GroupArg::Ao => ChannelGroup::AnalogOutput,
            GroupArg::Hc => ChannelGroup::HourCounter,
            GroupArg::Tk => ChannelGroup::Tank,
        }
    }
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse a register word given as decimal or `0x` hex.
fn parse_word(input: &str) -> Result<u16, String> {
    let input = input.trim();
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => input.parse(),
    };
    parsed.map_err(|_| format!("not a 16-bit word: {input}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_word_accepts_hex_and_decimal() {
        assert_eq!(parse_word("0x4049").unwrap(), 0x4049);
        assert_eq!(parse_word("0XFFFF").unwrap(), 0xFFFF);
        assert_eq!(parse_word("4059").unwrap(), 4059);
    }

    #[test]
    fn parse_word_rejects_out_of_range() {
        assert!(parse_word("65536").is_err());
        assert!(parse_word("0x1_0000").is_err());
        assert!(parse_word("-1").is_err());
        assert!(parse_word("").is_err());
    }
}
