#![allow(dead_code)]

pub use runasd_test_utils::builders;
pub use runasd_test_utils::{init_tracing, wait_until, with_timeout};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use runasd::command::{CommandBuilder, ExitListener};
use runasd::hooks::mock::{RecordingMailer, RecordingService};
use runasd::hooks::{MailTransport, ServiceControl};
use runasd::process::mock::FakeProcessManager;

/// A command builder backed by fake processes, plus a handle on the fakes.
pub fn fake_builder() -> (FakeProcessManager, CommandBuilder) {
    let manager = FakeProcessManager::new();
    let builder = CommandBuilder::new(Arc::new(manager.clone()));
    (manager, builder)
}

/// A recording service and the weak reference hooks bind to.
pub fn recording_service(name: &str) -> (Arc<RecordingService>, Weak<dyn ServiceControl>) {
    let service = Arc::new(RecordingService::new(name));
    let as_control: Arc<dyn ServiceControl> = service.clone();
    let weak = Arc::downgrade(&as_control);
    (service, weak)
}

pub fn recording_mailer() -> (Arc<RecordingMailer>, Arc<dyn MailTransport>) {
    let mailer = Arc::new(RecordingMailer::new());
    let transport: Arc<dyn MailTransport> = mailer.clone();
    (mailer, transport)
}

/// Exit listener that only counts how often it fired.
pub fn counting_listener() -> (Arc<AtomicUsize>, ExitListener) {
    let count = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&count);
    let listener: ExitListener = Arc::new(move || {
        inner.fetch_add(1, Ordering::SeqCst);
    });
    (count, listener)
}
