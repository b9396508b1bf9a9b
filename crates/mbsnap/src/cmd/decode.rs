use mbsnap_registers::{decode, DecodeOptions, EngineeringValue};
use serde::Serialize;

use crate::cmd::{DecodeArgs, DecodeFlags};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{hex_word, print_json, print_table, OutputFormat};

#[derive(Serialize)]
struct DecodeOutput {
    w0: String,
    w1: String,
    value_type: &'static str,
    word_order: &'static str,
    byte_order: &'static str,
    policy: &'static str,
    value: EngineeringValue,
    text: String,
}

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let options = options_from_flags(&args.decode);
    let value = decode(args.w0, args.w1, args.value_type, args.scale, &options);

    let out = DecodeOutput {
        w0: hex_word(args.w0),
        w1: hex_word(args.w1),
        value_type: args.value_type.as_str(),
        word_order: options.word_order.as_str(),
        byte_order: options.byte_order.as_str(),
        policy: options.policy.as_str(),
        value,
        text: value.to_string(),
    };

    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => print_table(
            &["W0", "W1", "TYPE", "ORDER (word/byte)", "POLICY", "VALUE"],
            [vec![
                out.w0.clone(),
                out.w1.clone(),
                out.value_type.to_string(),
                format!("{}/{}", out.word_order, out.byte_order),
                out.policy.to_string(),
                out.text.clone(),
            ]],
        ),
        OutputFormat::Pretty => println!(
            "{} {} as {} (word={}, byte={}, policy={}) = {}",
            out.w0, out.w1, out.value_type, out.word_order, out.byte_order, out.policy, out.text
        ),
        OutputFormat::Raw => println!("{}", out.text),
    }

    Ok(SUCCESS)
}

/// Unset flags keep the endpoint defaults.
pub fn options_from_flags(flags: &DecodeFlags) -> DecodeOptions {
    let defaults = DecodeOptions::default();
    DecodeOptions {
        word_order: flags.word_order.unwrap_or(defaults.word_order),
        byte_order: flags.byte_order.unwrap_or(defaults.byte_order),
        policy: flags.policy.unwrap_or(defaults.policy),
        scales: defaults.scales,
    }
}
