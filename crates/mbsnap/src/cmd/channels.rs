use mbsnap_registers::{ChannelDescriptor, ChannelGroup, ChannelMap};
use serde::Serialize;

use crate::cmd::ChannelsArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_json, print_table, OutputFormat};

#[derive(Serialize)]
struct ChannelsOutput<'a> {
    count: usize,
    register_span: usize,
    channels: Vec<&'a ChannelDescriptor>,
}

pub fn run(args: ChannelsArgs, format: OutputFormat) -> CliResult<i32> {
    let map = ChannelMap::standard();
    let group = args.group.map(ChannelGroup::from);
    let channels: Vec<&ChannelDescriptor> = map
        .iter()
        .filter(|c| group.is_none_or(|g| c.group == g))
        .collect();

    match format {
        OutputFormat::Json => print_json(&ChannelsOutput {
            count: channels.len(),
            register_span: map.register_span(),
            channels,
        }),
        OutputFormat::Table => print_table(
            &["ID", "OFFSET", "TYPE", "GROUP"],
            channels.iter().map(|c| {
                vec![
                    c.id.clone(),
                    c.offset.to_string(),
                    c.value_type.to_string(),
                    c.group.label().to_string(),
                ]
            }),
        ),
        OutputFormat::Pretty => {
            for c in &channels {
                println!(
                    "{} offset={}..={} type={} group={}",
                    c.id,
                    c.offset,
                    c.offset + ChannelDescriptor::WIDTH - 1,
                    c.value_type,
                    c.group.prefix()
                );
            }
        }
        OutputFormat::Raw => {
            for c in &channels {
                println!("{}", c.id);
            }
        }
    }

    Ok(SUCCESS)
}
