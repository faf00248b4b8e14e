//! Background sort worker and its message protocol.
//!
//! Each splat instance owns one worker thread. All communication is
//! message passing over channels; the render thread never blocks on the
//! worker. The worker announces readiness once its engine is constructed,
//! accepts the model arrays exactly once, and answers each sort request
//! with reordered buffers tagged with the matrix they were computed
//! against.

use std::sync::mpsc;

use glam::Mat4;
use web_time::Instant;

use super::engine::{SortEngine, SortResult};

/// Requests accepted by a sort worker.
pub enum SorterRequest {
    /// Upload the model arrays. Sent exactly once, after readiness.
    SetBuffers {
        /// Splat centers, xyz per splat.
        positions: Vec<f32>,
        /// Splat orientations, one quaternion per splat.
        rotations: Vec<f32>,
        /// Log-space splat scales, xyz per splat.
        scales: Vec<f32>,
        /// Splat colors, RGBA per splat.
        colors: Vec<f32>,
    },
    /// Reorder the model against the given matrix.
    PerformSort {
        /// View-projection snapshot to sort against.
        view_projection: Mat4,
    },
    /// Tear down the worker thread.
    Shutdown,
}

/// Responses produced by a sort worker.
pub enum SorterResponse {
    /// The sort engine is constructed; `SetBuffers` may be sent.
    WorkerReady,
    /// A completed reorder.
    SortResults(SortResult),
}

/// Handle to a dedicated background sorting thread.
pub struct SortWorker {
    request_tx: mpsc::Sender<SorterRequest>,
    response_rx: mpsc::Receiver<SorterResponse>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl SortWorker {
    /// Spawn the background sorting thread.
    ///
    /// # Errors
    ///
    /// Returns [`std::io::Error`] if the background thread fails to spawn.
    pub fn spawn() -> Result<Self, std::io::Error> {
        let (request_tx, request_rx) = mpsc::channel::<SorterRequest>();
        let (response_tx, response_rx) = mpsc::channel::<SorterResponse>();

        let thread = std::thread::Builder::new()
            .name("splat-sorter".into())
            .spawn(move || {
                Self::thread_loop(request_rx, &response_tx);
            })?;

        Ok(Self {
            request_tx,
            response_rx,
            thread: Some(thread),
        })
    }

    /// Submit a request (non-blocking send).
    pub fn submit(&self, request: SorterRequest) {
        let _ = self.request_tx.send(request);
    }

    /// Non-blocking poll for the next response, in arrival order.
    pub fn try_recv(&self) -> Option<SorterResponse> {
        self.response_rx.try_recv().ok()
    }

    /// Shut down the background thread and wait for it to finish.
    ///
    /// A sort already running completes in the worker and its result is
    /// discarded.
    pub fn shutdown(&mut self) {
        let _ = self.request_tx.send(SorterRequest::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }

    /// Background thread main loop.
    #[allow(clippy::needless_pass_by_value)]
    fn thread_loop(
        request_rx: mpsc::Receiver<SorterRequest>,
        response_tx: &mpsc::Sender<SorterResponse>,
    ) {
        let mut engine = SortEngine::new();

        if response_tx.send(SorterResponse::WorkerReady).is_err() {
            return;
        }

        while let Ok(request) = request_rx.recv() {
            match request {
                SorterRequest::Shutdown => break,
                SorterRequest::SetBuffers {
                    positions,
                    rotations,
                    scales,
                    colors,
                } => {
                    if let Err(e) = engine
                        .set_buffers(positions, rotations, scales, colors)
                    {
                        // The instance keeps rendering its unsorted data.
                        log::error!(
                            "sort worker rejected model buffers: {e}"
                        );
                    }
                }
                SorterRequest::PerformSort { view_projection } => {
                    if !engine.has_model() {
                        continue;
                    }
                    let start = Instant::now();
                    let result = engine.sort(view_projection);
                    log::debug!(
                        "sorted {} splats ({} visible) in {:.2?}",
                        engine.num_splats(),
                        result.visible_count,
                        start.elapsed()
                    );
                    if response_tx
                        .send(SorterResponse::SortResults(result))
                        .is_err()
                    {
                        break;
                    }
                }
            }
        }
    }
}

impl Drop for SortWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    const RECV_TIMEOUT: Duration = Duration::from_secs(5);

    fn spawn_worker() -> SortWorker {
        match SortWorker::spawn() {
            Ok(worker) => worker,
            Err(e) => unreachable!("worker failed to spawn: {e}"),
        }
    }

    fn recv_blocking(worker: &SortWorker) -> Option<SorterResponse> {
        worker.response_rx.recv_timeout(RECV_TIMEOUT).ok()
    }

    fn set_test_buffers(worker: &SortWorker) {
        worker.submit(SorterRequest::SetBuffers {
            positions: vec![0.0, 0.0, 0.2, 0.0, 0.0, 0.8],
            rotations: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
            scales: vec![0.0; 6],
            colors: vec![0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0],
        });
    }

    #[test]
    fn test_ready_precedes_results() {
        let mut worker = spawn_worker();
        set_test_buffers(&worker);
        worker.submit(SorterRequest::PerformSort {
            view_projection: Mat4::IDENTITY,
        });

        assert!(matches!(
            recv_blocking(&worker),
            Some(SorterResponse::WorkerReady)
        ));
        match recv_blocking(&worker) {
            Some(SorterResponse::SortResults(result)) => {
                assert_eq!(result.visible_count, 2);
                assert_eq!(result.view_projection, Mat4::IDENTITY);
            }
            _ => unreachable!("expected sort results"),
        }
        worker.shutdown();
    }

    #[test]
    fn test_results_arrive_in_request_order() {
        let mut worker = spawn_worker();
        set_test_buffers(&worker);

        let first = Mat4::IDENTITY;
        let second = Mat4::from_translation(glam::Vec3::new(0.0, 0.0, 0.5));
        worker.submit(SorterRequest::PerformSort {
            view_projection: first,
        });
        worker.submit(SorterRequest::PerformSort {
            view_projection: second,
        });

        assert!(matches!(
            recv_blocking(&worker),
            Some(SorterResponse::WorkerReady)
        ));
        match recv_blocking(&worker) {
            Some(SorterResponse::SortResults(result)) => {
                assert_eq!(result.view_projection, first);
            }
            _ => unreachable!("expected first sort results"),
        }
        match recv_blocking(&worker) {
            Some(SorterResponse::SortResults(result)) => {
                assert_eq!(result.view_projection, second);
            }
            _ => unreachable!("expected second sort results"),
        }
        worker.shutdown();
    }

    #[test]
    fn test_degraded_mode_on_bad_buffers() {
        let mut worker = spawn_worker();
        worker.submit(SorterRequest::SetBuffers {
            positions: vec![0.0, 0.0, 0.0],
            rotations: vec![0.0; 8],
            scales: vec![0.0; 3],
            colors: vec![0.0; 4],
        });
        worker.submit(SorterRequest::PerformSort {
            view_projection: Mat4::IDENTITY,
        });
        worker.submit(SorterRequest::Shutdown);

        assert!(matches!(
            recv_blocking(&worker),
            Some(SorterResponse::WorkerReady)
        ));
        // The rejected model produces no results; the channel closes once
        // the worker processes the shutdown.
        assert!(worker
            .response_rx
            .recv_timeout(RECV_TIMEOUT)
            .is_err());
        worker.shutdown();
    }

    #[test]
    fn test_sort_before_buffers_is_ignored() {
        let mut worker = spawn_worker();
        worker.submit(SorterRequest::PerformSort {
            view_projection: Mat4::IDENTITY,
        });
        worker.submit(SorterRequest::Shutdown);

        assert!(matches!(
            recv_blocking(&worker),
            Some(SorterResponse::WorkerReady)
        ));
        assert!(worker
            .response_rx
            .recv_timeout(RECV_TIMEOUT)
            .is_err());
        worker.shutdown();
    }

    #[test]
    fn test_shutdown_joins_thread() {
        let mut worker = spawn_worker();
        worker.shutdown();
        assert!(worker.thread.is_none());
    }
}
