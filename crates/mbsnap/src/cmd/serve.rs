use std::time::Duration;

use mbsnap_registers::AddressBase;
use mbsnap_server::{BridgeConfig, Server, ServerHandle};
use mbsnap_transport::AllowList;
use serde::Serialize;
use tracing::info;

use crate::cmd::{DecodeFlags, ServeArgs};
use crate::exit::{server_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS, USAGE};
use crate::output::{print_json, print_table, OutputFormat};

#[derive(Serialize)]
struct ListeningOutput {
    event: &'static str,
    addr: String,
    output: String,
    address_base: u16,
    flush_interval_ms: u64,
    allowed_peers: Vec<String>,
}

pub fn run(args: ServeArgs, format: OutputFormat) -> CliResult<i32> {
    let config = build_config(args)?;
    let server = Server::bind(&config).map_err(|err| server_error("bind failed", err))?;

    install_ctrlc_handler(server.handle())?;
    print_listening(&server, &config, format);

    server
        .serve()
        .map_err(|err| server_error("serve failed", err))?;
    info!(
        flushes = server.bridge().snapshots().flush_count(),
        "endpoint stopped"
    );
    Ok(SUCCESS)
}

/// Config file first, then flags on top.
fn build_config(args: ServeArgs) -> CliResult<BridgeConfig> {
    let mut config = match &args.config {
        Some(path) => {
            BridgeConfig::from_json_file(path).map_err(|err| server_error("config", err))?
        }
        None => BridgeConfig::default(),
    };

    if let Some(listen) = args.listen {
        config.listen = listen;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(output) = args.output {
        config.output = output;
    }
    if let Some(base) = args.address_base {
        config.address_base = AddressBase(base);
    }
    if let Some(entries) = &args.allow {
        let allow = AllowList::parse(entries).map_err(|err| transport_error("--allow", err))?;
        config.allowed_peers = allow.peers().to_vec();
    }
    apply_decode_flags(&mut config, &args.decode);
    if let Some(ai) = args.scale_ai {
        config.decode.scales.ai = ai;
    }
    if let Some(ao) = args.scale_ao {
        config.decode.scales.ao = ao;
    }
    if let Some(tk) = args.scale_tk {
        config.decode.scales.tk = tk;
    }
    if let Some(interval) = &args.flush_interval {
        config.flush_interval_ms = duration_millis(parse_interval(interval)?);
    }
    if let Some(count) = args.register_count {
        config.register_count = count;
    }

    config
        .validate()
        .map_err(|err| server_error("config", err))?;
    Ok(config)
}

fn apply_decode_flags(config: &mut BridgeConfig, flags: &DecodeFlags) {
    if let Some(word_order) = flags.word_order {
        config.decode.word_order = word_order;
    }
    if let Some(byte_order) = flags.byte_order {
        config.decode.byte_order = byte_order;
    }
    if let Some(policy) = flags.policy {
        config.decode.policy = policy;
    }
}

fn print_listening(server: &Server, config: &BridgeConfig, format: OutputFormat) {
    let out = ListeningOutput {
        event: "listening",
        addr: server.local_addr().to_string(),
        output: config.output.display().to_string(),
        address_base: config.address_base.value(),
        flush_interval_ms: config.flush_interval_ms,
        allowed_peers: config
            .allowed_peers
            .iter()
            .map(ToString::to_string)
            .collect(),
    };

    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => print_table(
            &["ADDR", "OUTPUT", "BASE", "FLUSH (ms)", "ALLOWED"],
            [vec![
                out.addr.clone(),
                out.output.clone(),
                out.address_base.to_string(),
                out.flush_interval_ms.to_string(),
                allowed_label(&out.allowed_peers),
            ]],
        ),
        OutputFormat::Pretty => println!(
            "listening on {} writing {} (base={}, flush={}ms, allowed={})",
            out.addr,
            out.output,
            out.address_base,
            out.flush_interval_ms,
            allowed_label(&out.allowed_peers)
        ),
        OutputFormat::Raw => println!("{}", out.addr),
    }
}

fn allowed_label(peers: &[String]) -> String {
    if peers.is_empty() {
        "any".to_string()
    } else {
        peers.join(",")
    }
}

fn install_ctrlc_handler(handle: ServerHandle) -> CliResult<()> {
    ctrlc::set_handler(move || {
        handle.shutdown();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

/// Like a timeout, but zero is allowed and means "no throttle".
fn parse_interval(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "flush interval must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "ms")
    };

    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid flush interval: {input}")))?;

    match unit {
        "s" => Ok(Duration::from_secs(value)),
        _ => Ok(Duration::from_millis(value)),
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
