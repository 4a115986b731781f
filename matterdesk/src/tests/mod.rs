mod fake;
mod matter_tests;
mod navigator_tests;

use crate::clock::FakeClock;
use crate::config::AutomationConfig;
use crate::platforms::AccessibilityEngine;
use crate::session::Session;
use fake::FakeDesktop;
use std::sync::Arc;

// Initialize tracing for tests
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()))
        .with_target(true)
        .with_test_writer()
        .try_init();
}

/// Session over a fake desktop, with a fake clock so settles cost nothing.
pub fn connect(desktop: &Arc<FakeDesktop>) -> (Session, Arc<FakeClock>) {
    connect_with(desktop, AutomationConfig::default())
}

pub fn connect_with(
    desktop: &Arc<FakeDesktop>,
    config: AutomationConfig,
) -> (Session, Arc<FakeClock>) {
    init_tracing();
    let clock = Arc::new(FakeClock::new());
    let engine: Arc<dyn AccessibilityEngine> = desktop.clone();
    let session = Session::connect(engine, clock.clone(), Arc::new(config))
        .expect("fake desktop exposes the main window");
    (session, clock)
}
