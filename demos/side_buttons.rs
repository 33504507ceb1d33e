//! Side button remapping - run the hook until Ctrl+C.
//!
//! Run with: RUST_LOG=mousefix=debug cargo run --example side_buttons
//!
//! Button 3 (forward) sends Cmd+] and button 4 (back) sends Cmd+[ to the
//! focused application. The terminal running this needs accessibility
//! access; the first run shows the system prompt.

#[cfg(target_os = "macos")]
fn main() {
    use mousefix::permission::DEFAULT_POLL_INTERVAL;
    use mousefix::platform::macos::{self, MacPlatform, MacTrustStore};
    use mousefix::{Engine, EngineConfig, HookStatus, PermissionGate};
    use std::sync::Arc;
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = EngineConfig::default();
    let gate = Arc::new(PermissionGate::new(MacTrustStore));
    if !gate.query() {
        eprintln!("Accessibility access is required.");
        eprintln!("Grant it in System Settings > Privacy & Security > Accessibility, then rerun.");
        return;
    }

    // A revoked grant kills the tap, so bail out instead of idling.
    let _poll = match gate.poll(DEFAULT_POLL_INTERVAL, |granted| {
        if !granted {
            eprintln!("Accessibility access was revoked, exiting.");
            macos::stop_main_loop();
        }
    }) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Failed to start permission polling: {e}");
            return;
        }
    };

    let engine = match Engine::builder(Arc::new(MacPlatform), gate)
        .config(config)
        .status_handler(|status: &HookStatus| match status {
            HookStatus::ShortcutSent { rule, pid } => {
                println!("{} -> {} ({pid})", rule.name, rule.shortcut)
            }
            HookStatus::ShortcutFailed { rule, error } => {
                println!("{} dropped: {error}", rule.name)
            }
            other => println!("{other:?}"),
        })
        .build()
    {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            return;
        }
    };

    if let Err(e) = ctrlc::set_handler(macos::stop_main_loop) {
        eprintln!("Failed to install Ctrl+C handler: {e}");
        return;
    }

    if let Err(e) = engine.start() {
        eprintln!("Failed to start hook: {e}");
        return;
    }

    println!("Remapping side buttons. Press Ctrl+C to exit.");
    macos::run_current_loop();

    engine.stop();
    let stats = engine.statistics();
    println!(
        "\nRemapped {} presses ({} sent, {} failed), re-enabled {} times.",
        stats.remapped, stats.shortcuts_sent, stats.shortcuts_failed, stats.reenabled
    );
}

#[cfg(not(target_os = "macos"))]
fn main() {
    eprintln!("side_buttons only runs on macOS.");
}
