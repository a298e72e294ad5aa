//! Demo controller wiring: concurrent submitters, a render loop, and a
//! one-shot toast drained from the state stream.

use anyhow::Result;
use clap::Parser;
use store::{EventBox, ModelStore, StateStore};
use tracing::info;

#[derive(Parser, Debug)]
struct Cli {
    /// Number of concurrent submitters racing against each other.
    #[arg(long, default_value_t = 4)]
    callers: u32,
    /// Mutators each submitter queues.
    #[arg(long, default_value_t = 25)]
    submissions_per_caller: u32,
}

#[derive(Clone, Default)]
struct DashboardState {
    scans_recorded: u32,
    toast: EventBox<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let cli = Cli::parse();
    let total = cli.callers * cli.submissions_per_caller;

    let store = std::sync::Arc::new(StateStore::new(DashboardState::default()));
    let mut render_stream = store.subscribe();

    for caller in 0..cli.callers {
        let store = std::sync::Arc::clone(&store);
        let submissions = cli.submissions_per_caller;
        tokio::spawn(async move {
            for _ in 0..submissions {
                let outcome = store.submit(move |state: DashboardState| {
                    let scans_recorded = state.scans_recorded + 1;
                    let toast = if scans_recorded % 10 == 0 {
                        EventBox::new(format!("{scans_recorded} scans recorded"))
                    } else {
                        state.toast
                    };
                    DashboardState {
                        scans_recorded,
                        toast,
                    }
                });
                if let Err(error) = outcome {
                    info!(caller, %error, "submission rejected");
                    return;
                }
            }
        });
    }

    // Render loop: conflated under load, so intermediate snapshots may be
    // skipped, but the final one always arrives.
    while let Some(state) = render_stream.recv().await {
        state
            .toast
            .handle(|message| info!(toast = %message, "one-shot effect"));
        info!(scans = state.scans_recorded, "render");
        if state.scans_recorded == total {
            break;
        }
    }

    info!(final_scans = store.current().scans_recorded, "done");
    store.dispose();
    Ok(())
}
