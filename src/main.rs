//! modem-emu - AT channel of a virtual cellular modem
//!
//! Usage:
//!   modem-emu                     Run until SIGINT/SIGTERM
//!   modem-emu send AT+CSQ         Send one command and print the reply
//!   modem-emu status --json       Query registration and signal state

mod cli;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use at_modem::at::payload::network::UNKNOWN;
use at_modem::at::payload::Registration;
use at_modem::at::Response;
use at_modem::channel::{Channel, ChannelOptions, FatalHandler};
use at_modem::config::{self, Config};
use at_modem::error::FatalError;
use at_modem::services::NetworkState;
use at_modem::{logging, transport};
use clap::Parser;
use parking_lot::Mutex;
use tracing::{debug, error, info};

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            config::load(path).with_context(|| format!("Failed to load {}", path.display()))?
        }
        None => config::load_or_default(None),
    };
    config.apply_env();
    cli.apply(&mut config);
    config.validate()?;

    logging::init_tracing(cli.verbose, &config.logging.level);

    match cli.command.clone().unwrap_or(Command::Run) {
        Command::Run => run(&config),
        Command::Send {
            command,
            json,
            timeout_ms,
        } => send(&config, &command, json, timeout_ms),
        Command::Status { json } => status(&config, json),
    }
}

/// One-shot commands exit instead of aborting
fn exit_on_fatal() -> FatalHandler {
    Arc::new(|e: FatalError| {
        error!("{}", e);
        std::process::exit(1);
    })
}

fn open_channel(config: &Config, options: ChannelOptions) -> Result<Channel> {
    info!(
        "Modem device: {} ({:?})",
        config.device.path, config.device.kind
    );
    let device = transport::from_config(&config.device);
    Ok(Channel::spawn(device, options)?)
}

// =============================================================================
// run
// =============================================================================

fn run(config: &Config) -> Result<()> {
    let channel = open_channel(config, ChannelOptions::from_config(&config.channel))?;

    let network = NetworkState::shared();
    channel.attach(&network);
    channel.subscribe(|response| {
        if response.is_final() {
            debug!("Unclaimed {}", response.what());
        } else {
            info!("Unsolicited {}", response.what());
        }
        true
    });

    // First request opens the link and runs the init sequence
    network.queue_refresh(&channel);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(wait_for_shutdown())?;

    info!("Shutting down");
    drop(channel);
    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        tokio::select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv() => {},
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;

    Ok(())
}

// =============================================================================
// send
// =============================================================================

fn send(config: &Config, command: &str, json: bool, timeout_ms: Option<u64>) -> Result<()> {
    let options =
        ChannelOptions::from_config(&config.channel).with_fatal_handler(exit_on_fatal());
    let channel = open_channel(config, options)?;
    let timeout = timeout_ms.map_or(config.channel.request_timeout(), Duration::from_millis);

    // Intermediate lines arrive unclaimed, before the final result
    let transcript = Arc::new(Transcript::default());
    let sink = Arc::clone(&transcript);
    channel.subscribe(move |response| {
        sink.record(response);
        true
    });

    let request = command.to_string();
    let recorder = Arc::clone(&transcript);
    let reply = channel.call(move |pipe, conversation| {
        // Link is open and initialized by now
        recorder.start();
        conversation.exchange_with_timeout(pipe, &request, Response::is_final, timeout)
    })?;

    let lines = transcript.lines();
    if json {
        let value = serde_json::json!({
            "command": command,
            "responses": lines.iter().map(|r| r.as_ref()).collect::<Vec<&Response>>(),
            "final": reply.as_ref(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        for line in &lines {
            println!("{:?}", line);
        }
        println!("{}", reply.what());
    }

    if reply.is_error() {
        bail!("'{}' failed: {:?}", command, reply);
    }
    Ok(())
}

/// Unclaimed responses seen while one request is in flight
#[derive(Default)]
struct Transcript {
    recording: AtomicBool,
    lines: Mutex<Vec<Arc<Response>>>,
}

impl Transcript {
    fn start(&self) {
        self.recording.store(true, Ordering::SeqCst);
    }

    fn record(&self, response: &Arc<Response>) {
        if self.recording.load(Ordering::SeqCst) {
            self.lines.lock().push(Arc::clone(response));
        }
    }

    fn lines(&self) -> Vec<Arc<Response>> {
        self.lines.lock().clone()
    }
}

// =============================================================================
// status
// =============================================================================

fn status(config: &Config, json: bool) -> Result<()> {
    let options =
        ChannelOptions::from_config(&config.channel).with_fatal_handler(exit_on_fatal());
    let channel = open_channel(config, options)?;

    let network = NetworkState::shared();
    let handler = Arc::clone(&network);
    channel.call(move |pipe, conversation| handler.refresh(pipe, conversation))?;

    let snapshot = network.snapshot();
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let radio = match snapshot.radio_on {
        Some(true) => "on",
        Some(false) => "off",
        None => "unknown",
    };
    println!("radio:      {}", radio);
    println!("voice:      {}", describe(snapshot.voice.as_ref()));
    println!("data:       {}", describe(snapshot.data.as_ref()));
    println!("eps:        {}", describe(snapshot.eps.as_ref()));

    let gsm = snapshot.reported_signal().gsm;
    if gsm.signal_strength == UNKNOWN {
        println!("signal:     unknown");
    } else {
        println!(
            "signal:     {} (ber {})",
            gsm.signal_strength, gsm.bit_error_rate
        );
    }
    Ok(())
}

fn describe(registration: Option<&Registration>) -> String {
    match registration {
        None => "unknown".to_string(),
        Some(r) => match (r.area_code, r.cell_id) {
            (Some(area), Some(cell)) => format!("{:?} (area {:X}, cell {:X})", r.state, area, cell),
            _ => format!("{:?}", r.state),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_ignores_traffic_before_start() {
        let transcript = Transcript::default();
        transcript.record(&Arc::new(Response::Ring));

        transcript.start();
        transcript.record(&Arc::new(Response::Text("358240051111110".into())));

        let lines = transcript.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].what(), "Text");
    }

    #[test]
    fn test_describe_registration() {
        assert_eq!(describe(None), "unknown");
    }
}
