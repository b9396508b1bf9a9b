mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "mbsnap", version, about = "Register-write bridge CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "info",
        env = "MBSNAP_LOG_LEVEL",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_serve_subcommand() {
        let cli = Cli::try_parse_from([
            "mbsnap",
            "serve",
            "--port",
            "1502",
            "--allow",
            "10.0.0.5,10.0.0.6",
            "--flush-interval",
            "500ms",
        ])
        .expect("serve args should parse");

        match cli.command {
            Command::Serve(args) => {
                assert_eq!(args.port, Some(1502));
                assert_eq!(args.allow.as_deref().map(<[String]>::len), Some(2));
                assert_eq!(args.flush_interval.as_deref(), Some("500ms"));
            }
            other => panic!("expected serve, got {other:?}"),
        }
    }

    #[test]
    fn parses_decode_words_in_hex_and_decimal() {
        let cli = Cli::try_parse_from(["mbsnap", "decode", "0x4048", "62915"])
            .expect("decode args should parse");
        match cli.command {
            Command::Decode(args) => {
                assert_eq!(args.w0, 0x4048);
                assert_eq!(args.w1, 0xF5C3);
            }
            other => panic!("expected decode, got {other:?}"),
        }
    }

    #[test]
    fn rejects_word_out_of_range() {
        let err = Cli::try_parse_from(["mbsnap", "decode", "0x10000", "0"])
            .expect_err("oversized word should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn rejects_unknown_word_order() {
        let err = Cli::try_parse_from(["mbsnap", "decode", "1", "2", "--word-order", "middle"])
            .expect_err("unknown order should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
