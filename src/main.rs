use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use hidscript::pty::PtySession;
use hidscript::pty_link::PtyLink;
use hidscript::pty_reader::spawn_reader;
use hidscript::transport::{shared, usb_events};
use hidscript::{
    BindStatus, Clock, DirectTransport, PreflightConfig, Scheduler, SchedulerConfig,
    SharedTransport, SystemClock, WirelessTransport, verify_connection,
};
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pause between ticks on the wireless link so the radio stack gets time to
/// service its own events.
const WIRELESS_TICK_PAUSE: Duration = Duration::from_millis(50);

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Link {
    /// Wired USB keyboard
    Usb,
    /// Bluetooth LE keyboard
    Ble,
}

#[derive(Parser, Debug)]
#[command(
    name = "hidscript",
    about = "Type a keystroke script into an interactive terminal program",
    version
)]
struct Args {
    /// Path to the script file
    #[arg(short, long)]
    script: String,

    /// Command to run in the PTY
    #[arg(short, long)]
    command: String,

    /// Keyboard link to emulate
    #[arg(long, value_enum, default_value_t = Link::Usb)]
    link: Link,

    /// Name advertised by the wireless link
    #[arg(long, default_value = "hidscript")]
    name: String,

    /// Pause after every command in milliseconds, until the script changes it
    #[arg(long, default_value_t = 100)]
    default_delay: u64,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Arguments to pass to the command
    #[arg(trailing_var_arg = true)]
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose {
        "hidscript=debug"
    } else {
        "hidscript=info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let script = std::fs::read_to_string(&args.script)
        .with_context(|| format!("Failed to read script file: {}", args.script))?;

    let (mut session, reader, writer) =
        PtySession::spawn(&args.command, &args.args).context("Failed to spawn command")?;
    let alive = Arc::new(AtomicBool::new(true));
    let output = spawn_reader(reader, Arc::clone(&alive));
    thread::spawn(move || forward_output(output));

    // Give the program time to start up before typing into it.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let abort = Arc::new(AtomicBool::new(false));
    {
        let abort = Arc::clone(&abort);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                abort.store(true, Ordering::SeqCst);
            }
        });
    }

    let link = PtyLink::new(writer, alive);
    let config = SchedulerConfig {
        default_delay: Duration::from_millis(args.default_delay),
    };
    let kind = args.link;
    let name = args.name;

    let result = tokio::task::spawn_blocking(move || {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        match kind {
            Link::Usb => run_direct(link, clock, &script, config, &abort),
            Link::Ble => run_wireless(link, clock, &name, &script, config, &abort),
        }
    })
    .await
    .context("Script runner panicked")?;

    // Let the program's last output arrive before tearing it down.
    tokio::time::sleep(Duration::from_millis(500)).await;
    session.terminate()?;

    result
}

fn run_direct(
    link: PtyLink,
    clock: Arc<dyn Clock>,
    script: &str,
    config: SchedulerConfig,
    abort: &AtomicBool,
) -> Result<()> {
    let transport = shared(DirectTransport::new(link, Arc::clone(&clock)));
    let events = transport.lock().event_sink();
    usb_events::install(&events);

    let result = run_script(transport, clock.as_ref(), script, config, abort, Duration::ZERO);
    usb_events::uninstall();
    result
}

fn run_wireless(
    link: PtyLink,
    clock: Arc<dyn Clock>,
    name: &str,
    script: &str,
    config: SchedulerConfig,
    abort: &AtomicBool,
) -> Result<()> {
    let transport = shared(WirelessTransport::new(link, Arc::clone(&clock)));

    let status = transport
        .lock()
        .bind(name)
        .context("Failed to bring up wireless link")?;
    match status {
        BindStatus::Started => info!("Wireless link up as {:?}", name),
        BindStatus::Reused => debug!("Wireless link already up"),
        BindStatus::IdentityKept { active } => {
            warn!("Wireless link keeps identity {:?}", active)
        }
    }

    if !verify_connection(
        &mut *transport.lock(),
        clock.as_ref(),
        &PreflightConfig::default(),
    ) {
        transport.lock().unbind();
        bail!("Wireless connection is not stable, script not started");
    }

    let result = run_script(
        transport.clone(),
        clock.as_ref(),
        script,
        config,
        abort,
        WIRELESS_TICK_PAUSE,
    );
    transport.lock().unbind();
    result
}

fn run_script(
    transport: SharedTransport,
    clock: &dyn Clock,
    script: &str,
    config: SchedulerConfig,
    abort: &AtomicBool,
    tick_pause: Duration,
) -> Result<()> {
    let mut scheduler = Scheduler::with_config(config);
    scheduler.set_transport(transport)?;
    scheduler.start(script);

    while !scheduler.is_complete() {
        if abort.load(Ordering::SeqCst) {
            scheduler.stop();
            break;
        }
        debug!(
            "[{}/{}] {}",
            scheduler.current_line_number(),
            scheduler.line_count(),
            scheduler.current_line_text().trim()
        );
        scheduler.tick();
        clock.sleep(tick_pause);
    }

    Ok(())
}

/// Copy program output to stdout until the PTY closes.
fn forward_output(output: Receiver<Vec<u8>>) {
    let mut stdout = std::io::stdout();
    for chunk in output {
        if stdout.write_all(&chunk).and_then(|()| stdout.flush()).is_err() {
            break;
        }
    }
}

