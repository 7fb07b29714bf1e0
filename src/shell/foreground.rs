use crate::common::Error;

use super::job_control::{Flow, GroupSignaller, JobControl};
use super::signals::SignalSource;

/// Block until no job runs in the foreground anymore.
///
/// Every signal that arrives meanwhile is handled on this thread. Signals delivered between the
/// check and the blocking receive wait in the stream, so none of them can be missed.
pub fn wait_for_foreground_clear<S: GroupSignaller>(
    control: &mut JobControl<S>,
    signals: &impl SignalSource,
) -> Result<Flow, Error> {
    while control.table().foreground_pid().is_some() {
        let signal = signals.next_signal().map_err(Error::SignalStream)?;
        if let Flow::Exit(code) = control.handle_signal(signal) {
            return Ok(Flow::Exit(code));
        }
    }

    Ok(Flow::Continue)
}
