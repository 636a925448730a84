use std::future::Future;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Interrupted,
    SchedulerExited,
}

/// Waits for the operator interrupt or for the dispatch loop to end on its own.
///
/// If the interrupt handler cannot be installed the process keeps dispatching and only the
/// loop ending stops it.
pub async fn wait_for_stop<F, R>(interrupt: F, scheduler: &mut JoinHandle<R>) -> StopReason
where
    F: Future<Output = std::io::Result<()>>,
{
    tokio::pin!(interrupt);
    let mut interrupt_armed = true;
    loop {
        tokio::select! {
            result = &mut interrupt, if interrupt_armed => match result {
                Ok(()) => {
                    tracing::info!("[!] Received Ctrl+C. Initiating graceful shutdown...");
                    return StopReason::Interrupted;
                }
                Err(err) => {
                    tracing::error!(
                        "[!] Ctrl+C handler unavailable: {err}; dispatching until the loop exits"
                    );
                    interrupt_armed = false;
                }
            },
            joined = &mut *scheduler => {
                match joined {
                    Ok(_) => tracing::error!("[SCHED] dispatch loop exited unexpectedly"),
                    Err(err) => tracing::error!("[SCHED] dispatch loop task failed: {err}"),
                }
                return StopReason::SchedulerExited;
            }
        }
    }
}
