use tokio::select;
use tokio_util::sync::CancellationToken;

/// Waits for Ctrl+C and cancels the mover loop in response. Also completes
/// when another component cancels the token, so a fatal mover error does not
/// leave this task blocking the process.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
        _ = cancelation.cancelled() => (),
    };
}
