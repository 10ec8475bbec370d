//! Child supervision: stop-request forwarding and exit propagation.

use log::{debug, info};
use std::process::ExitStatus;
use std::time::Duration;
use tokio::process::Child;
use tokio::sync::mpsc;

/// A request, received by the parent, to stop the child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopRequest {
    /// Interrupt now, terminate after the grace period if still running.
    Interrupt,
    /// Terminate now.
    Terminate,
}

/// How the child finished. The parent finishes the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    ExitedWithCode(i32),
    KilledBySignal(i32),
}

impl ExitOutcome {
    pub fn from_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ExitOutcome::ExitedWithCode(code);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ExitOutcome::KilledBySignal(signal);
            }
        }

        ExitOutcome::ExitedWithCode(1)
    }
}

enum Action {
    Forward(StopRequest),
    Escalate,
}

/// Waits for `child` while relaying stop requests to it.
///
/// An [`StopRequest::Interrupt`] is forwarded as SIGINT and arms a timer;
/// if the child is still running when it fires, SIGTERM follows.
#[tracing::instrument(skip(child, requests))]
pub async fn supervise(
    mut child: Child,
    mut requests: mpsc::Receiver<StopRequest>,
    grace: Duration,
) -> std::io::Result<ExitOutcome> {
    let escalation = tokio::time::sleep(grace);
    tokio::pin!(escalation);
    let mut escalation_armed = false;

    loop {
        let action = tokio::select! {
            status = child.wait() => {
                let outcome = ExitOutcome::from_status(status?);
                debug!("Child finished: {:?}", outcome);
                return Ok(outcome);
            }
            Some(request) = requests.recv() => Action::Forward(request),
            () = &mut escalation, if escalation_armed => Action::Escalate,
        };

        match action {
            Action::Forward(StopRequest::Interrupt) => {
                deliver(&mut child, StopRequest::Interrupt);
                if !escalation_armed {
                    escalation
                        .as_mut()
                        .reset(tokio::time::Instant::now() + grace);
                    escalation_armed = true;
                }
            }
            Action::Forward(StopRequest::Terminate) => {
                deliver(&mut child, StopRequest::Terminate);
            }
            Action::Escalate => {
                info!(
                    "Child still running {}ms after interrupt, terminating",
                    grace.as_millis()
                );
                escalation_armed = false;
                deliver(&mut child, StopRequest::Terminate);
            }
        }
    }
}

#[cfg(unix)]
fn deliver(child: &mut Child, request: StopRequest) {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return;
    };
    let signal = match request {
        StopRequest::Interrupt => Signal::SIGINT,
        StopRequest::Terminate => Signal::SIGTERM,
    };

    debug!("Sending {} to child {}", signal, pid);
    if let Err(e) = kill(Pid::from_raw(pid as i32), signal) {
        // ESRCH: the child exited in the meantime
        debug!("Failed to send {} to child {}: {}", signal, pid, e);
    }
}

#[cfg(not(unix))]
fn deliver(child: &mut Child, request: StopRequest) {
    debug!("Stopping child ({:?})", request);
    if let Err(e) = child.start_kill() {
        debug!("Failed to stop child: {}", e);
    }
}

/// Exits the current process the way the child did.
///
/// A signal death is reproduced by restoring the default disposition and
/// raising the same signal on ourselves. Signals whose default action does
/// not terminate fall back to exit status `128 + signal`.
pub fn terminate(outcome: ExitOutcome) -> ! {
    match outcome {
        ExitOutcome::ExitedWithCode(code) => std::process::exit(code),
        ExitOutcome::KilledBySignal(signal) => {
            #[cfg(unix)]
            reraise(signal);
            std::process::exit(128 + signal)
        }
    }
}

#[cfg(unix)]
fn reraise(signal: i32) {
    use nix::sys::signal::{self as nix_signal, SigHandler, SigSet, SigmaskHow, Signal};

    let Ok(signal) = Signal::try_from(signal) else {
        return;
    };

    // SAFETY: restoring the default disposition installs no Rust handler.
    let _ = unsafe { nix_signal::signal(signal, SigHandler::SigDfl) };

    let mut mask = SigSet::empty();
    mask.add(signal);
    let _ = nix_signal::sigprocmask(SigmaskHow::SIG_UNBLOCK, Some(&mask), None);

    let _ = nix_signal::raise(signal);
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;
    use tokio::process::Command;

    fn sh(script: &str) -> Child {
        Command::new("sh").arg("-c").arg(script).spawn().unwrap()
    }

    async fn wait_for_file(path: &Path) {
        for _ in 0..200 {
            if path.exists() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        panic!("{:?} never appeared", path);
    }

    #[tokio::test]
    async fn test_exit_code_is_propagated() {
        let (_tx, rx) = mpsc::channel(1);
        let outcome = supervise(sh("exit 7"), rx, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(outcome, ExitOutcome::ExitedWithCode(7));
    }

    #[tokio::test]
    async fn test_signal_death_is_propagated() {
        let (_tx, rx) = mpsc::channel(1);
        let outcome = supervise(sh("kill -TERM $$"), rx, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(outcome, ExitOutcome::KilledBySignal(libc_sigterm()));
    }

    #[tokio::test]
    async fn test_closed_request_channel_keeps_waiting() {
        let (tx, rx) = mpsc::channel(1);
        drop(tx);
        let outcome = supervise(sh("sleep 0.2; exit 3"), rx, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(outcome, ExitOutcome::ExitedWithCode(3));
    }

    #[tokio::test]
    async fn test_interrupt_honoured_without_escalation() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("signals");
        let ready = dir.path().join("ready");
        let script = format!(
            "trap 'echo int >> {log}; exit 130' INT; trap 'echo term >> {log}; exit 143' TERM; \
             touch {ready}; while true; do sleep 0.05; done",
            log = log.display(),
            ready = ready.display()
        );

        let (tx, rx) = mpsc::channel(1);
        let supervisor = tokio::spawn(supervise(sh(&script), rx, Duration::from_secs(5)));

        wait_for_file(&ready).await;
        tx.send(StopRequest::Interrupt).await.unwrap();

        let outcome = supervisor.await.unwrap().unwrap();
        assert_eq!(outcome, ExitOutcome::ExitedWithCode(130));
        assert_eq!(std::fs::read_to_string(&log).unwrap(), "int\n");
    }

    #[tokio::test]
    async fn test_ignored_interrupt_escalates_to_terminate() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("signals");
        let ready = dir.path().join("ready");
        let script = format!(
            "trap 'echo int >> {log}' INT; trap 'echo term >> {log}; exit 143' TERM; \
             touch {ready}; while true; do sleep 0.05; done",
            log = log.display(),
            ready = ready.display()
        );

        let (tx, rx) = mpsc::channel(1);
        let supervisor = tokio::spawn(supervise(sh(&script), rx, Duration::from_millis(300)));

        wait_for_file(&ready).await;
        tx.send(StopRequest::Interrupt).await.unwrap();

        let outcome = supervisor.await.unwrap().unwrap();
        assert_eq!(outcome, ExitOutcome::ExitedWithCode(143));
        assert_eq!(std::fs::read_to_string(&log).unwrap(), "int\nterm\n");
    }

    #[tokio::test]
    async fn test_terminate_request_is_forwarded() {
        let dir = tempdir().unwrap();
        let ready = dir.path().join("ready");
        let script = format!(
            "touch {ready}; while true; do sleep 0.05; done",
            ready = ready.display()
        );

        let (tx, rx) = mpsc::channel(1);
        let supervisor = tokio::spawn(supervise(sh(&script), rx, Duration::from_secs(5)));

        wait_for_file(&ready).await;
        tx.send(StopRequest::Terminate).await.unwrap();

        let outcome = supervisor.await.unwrap().unwrap();
        assert_eq!(outcome, ExitOutcome::KilledBySignal(libc_sigterm()));
    }

    fn libc_sigterm() -> i32 {
        nix::sys::signal::Signal::SIGTERM as i32
    }
}
