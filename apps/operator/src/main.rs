use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use shared::domain::UserId;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;
use trial_core::{
    format_elapsed, load_settings, present, HttpDeviceClient, TrialSessionController, TrialState,
    TrialView, ViewState,
};

mod console;

use console::{
    describe_error, is_available, parse_command, render_view, Command, RedrawThrottle, HELP,
};

const REDRAW_INTERVAL: Duration = Duration::from_millis(100);

/// Operator console for a left/right bicep EMG comparison trial.
#[derive(Parser, Debug)]
struct Args {
    /// Identity forwarded to the device with every start request.
    #[arg(long)]
    user_id: String,
    #[arg(long)]
    device_url: Option<String>,
    #[arg(long)]
    tick_ms: Option<u64>,
    #[arg(long)]
    timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(url) = args.device_url {
        settings.device_url = url;
    }
    if let Some(tick_ms) = args.tick_ms {
        settings.tick_ms = tick_ms;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        settings.request_timeout_ms = timeout_ms;
    }
    let user_id = UserId::new(args.user_id);

    let device = HttpDeviceClient::new(&settings)
        .with_context(|| format!("failed to set up device client for {}", settings.device_url))?;
    let controller = TrialSessionController::with_settings(Arc::new(device), &settings);
    let view_state = ViewState::default();
    info!(device_url = %settings.device_url, %user_id, "operator console ready");

    tokio::spawn(follow_elapsed(Arc::clone(&controller)));

    println!("{HELP}");
    print_view(&controller, &view_state);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let Some(command) = parse_command(&line) else {
            println!("unknown command '{}'; {HELP}", line.trim());
            continue;
        };
        if !is_available(command, &current_view(&controller, &view_state).actions) {
            println!("'{}' is not available now", line.trim());
            print_view(&controller, &view_state);
            continue;
        }

        let outcome = match command {
            Command::Begin(side) => controller.begin(side, &user_id),
            Command::Stop => controller.end().await.map(|_| ()),
            Command::Reset => controller.reset(),
            Command::Status => Ok(()),
            Command::Help => {
                println!("{HELP}");
                continue;
            }
            Command::Quit => break,
        };
        if let Err(err) = outcome {
            println!("{}", describe_error(&err));
        }
        print_view(&controller, &view_state);
    }

    Ok(())
}

fn current_view(controller: &TrialSessionController, view_state: &ViewState) -> TrialView {
    let failure = controller.last_failure();
    present(&controller.snapshot(), failure.as_ref(), view_state)
}

fn print_view(controller: &TrialSessionController, view_state: &ViewState) {
    println!("{}\n", render_view(&current_view(controller, view_state)));
}

/// Redraws the elapsed display in place while recording.
async fn follow_elapsed(controller: Arc<TrialSessionController>) {
    let mut elapsed = controller.subscribe_elapsed();
    let mut throttle = RedrawThrottle::new(REDRAW_INTERVAL);
    while elapsed.changed().await.is_ok() {
        let ms = *elapsed.borrow_and_update();
        if controller.state() == TrialState::Recording && throttle.should_draw(Instant::now()) {
            eprint!("\r{}  ", format_elapsed(ms));
        }
    }
}
