use super::{Continuation, PhaseRun};
use crate::probe::{ApiRequest, Expect};

pub(super) async fn run(run: &mut PhaseRun<'_>) -> Continuation {
    let request = ApiRequest::get("/actuator/health").timeout(run.config.health_timeout());
    let exchange = run.check("Application Health", request, Expect::ok()).await;
    if exchange.passed() {
        Continuation::Continue
    } else {
        Continuation::Abort
    }
}
