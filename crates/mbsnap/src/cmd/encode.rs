use mbsnap_registers::{encode_f32, encode_u32, ValueType};
use serde::Serialize;

use crate::cmd::decode::options_from_flags;
use crate::cmd::EncodeArgs;
use crate::exit::{CliError, CliResult, SUCCESS, USAGE};
use crate::output::{hex_word, print_json, print_table, OutputFormat};

#[derive(Serialize)]
struct EncodeOutput {
    value: String,
    value_type: &'static str,
    word_order: &'static str,
    byte_order: &'static str,
    w0: String,
    w1: String,
}

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let options = options_from_flags(&args.decode);
    let input = args.value.trim();

    let (w0, w1) = match args.value_type {
        ValueType::Float32 => {
            let value: f32 = input
                .parse()
                .map_err(|_| CliError::new(USAGE, format!("not a float32 value: {input}")))?;
            encode_f32(value, options.word_order, options.byte_order)
        }
        ValueType::Uint32 => {
            let value: u32 = input
                .parse()
                .map_err(|_| CliError::new(USAGE, format!("not a uint32 value: {input}")))?;
            encode_u32(value, options.word_order, options.byte_order)
        }
    };

    let out = EncodeOutput {
        value: input.to_string(),
        value_type: args.value_type.as_str(),
        word_order: options.word_order.as_str(),
        byte_order: options.byte_order.as_str(),
        w0: hex_word(w0),
        w1: hex_word(w1),
    };

    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => print_table(
            &["VALUE", "TYPE", "ORDER (word/byte)", "W0", "W1"],
            [vec![
                out.value.clone(),
                out.value_type.to_string(),
                format!("{}/{}", out.word_order, out.byte_order),
                out.w0.clone(),
                out.w1.clone(),
            ]],
        ),
        OutputFormat::Pretty => println!(
            "{} as {} (word={}, byte={}) = {} {}",
            out.value, out.value_type, out.word_order, out.byte_order, out.w0, out.w1
        ),
        OutputFormat::Raw => println!("{} {}", out.w0, out.w1),
    }

    Ok(SUCCESS)
}
