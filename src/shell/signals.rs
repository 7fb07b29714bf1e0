use std::io;

use crate::common::Error;
use crate::log::{dev_info, dev_warn};
use crate::system::signal::{
    consts::*, register_handlers, SignalHandler, SignalNumber, SignalSet, SignalStream,
};

/// Signals the shell reacts to. All of them are funneled through the [`SignalStream`].
pub(crate) const HANDLED_SIGNALS: [SignalNumber; 4] = [SIGCHLD, SIGINT, SIGTSTP, SIGQUIT];

/// Signals that may change the job table and have to be held back while a job is registered.
pub(crate) const JOB_SIGNALS: [SignalNumber; 3] = [SIGCHLD, SIGINT, SIGTSTP];

/// Where the control loop gets the next signal to handle from.
pub trait SignalSource {
    /// Block until a signal arrives.
    fn next_signal(&self) -> io::Result<SignalNumber>;
}

impl SignalSource for SignalStream {
    fn next_signal(&self) -> io::Result<SignalNumber> {
        let info = self.recv()?;
        dev_info!("signal {} sent by {}", info.signal(), info.pid());
        Ok(info.signal())
    }
}

/// Route [`HANDLED_SIGNALS`] into the signal stream.
///
/// The original dispositions come back when the returned handlers are dropped.
pub(crate) fn install() -> Result<(&'static SignalStream, [SignalHandler; 4]), Error> {
    let stream = SignalStream::init().map_err(Error::SignalSetup)?;
    let handlers = register_handlers(HANDLED_SIGNALS).map_err(Error::SignalSetup)?;
    Ok((stream, handlers))
}

/// Keeps [`JOB_SIGNALS`] blocked until dropped.
pub(crate) struct BlockedJobSignals {
    previous: SignalSet,
}

impl BlockedJobSignals {
    pub(crate) fn block() -> io::Result<Self> {
        let previous = SignalSet::with(&JOB_SIGNALS)?.block()?;
        Ok(Self { previous })
    }

    /// The mask that was in place before blocking.
    pub(crate) fn previous(&self) -> &SignalSet {
        &self.previous
    }
}

impl Drop for BlockedJobSignals {
    fn drop(&mut self) {
        if let Err(err) = self.previous.set_mask() {
            dev_warn!("cannot restore signal mask: {err}");
        }
    }
}
