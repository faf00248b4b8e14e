//! Sort-request coalescing for one splat instance.
//!
//! At most one sort is ever in flight per instance. While one runs, only
//! the newest requested matrix is retained; completion dispatches at most
//! one trailing sort with it. Requests arriving before the worker signals
//! readiness are retained the same way instead of being dropped. A burst
//! of camera motion therefore costs at most two sorts, and the rendered
//! order always converges to the latest camera state once motion stops.

use glam::Mat4;

/// What the caller should do after observing the camera for a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortDispatch {
    /// Start a sort with this matrix now.
    Start(Mat4),
    /// The request was retained; a sort is in flight or the worker is not
    /// ready yet.
    Deferred,
    /// Camera unchanged; nothing to do.
    Unchanged,
}

/// Coalescing state machine for sort requests.
#[derive(Debug, Default)]
pub struct SortCoordinator {
    worker_ready: bool,
    sort_in_flight: bool,
    pending: Option<Mat4>,
    last_view: Option<Mat4>,
}

impl SortCoordinator {
    /// Coordinator for a worker that has not signaled readiness yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe the camera state for this frame.
    ///
    /// `effective_view` is the camera view matrix with any parent
    /// transform folded in; change detection compares it by value against
    /// the last observed one. An unchanged camera is a no-op unless
    /// `instance_count_changed` forces a re-sort.
    pub fn observe(
        &mut self,
        effective_view: Mat4,
        instance_count_changed: bool,
        view_projection: Mat4,
    ) -> SortDispatch {
        if !instance_count_changed && self.last_view == Some(effective_view)
        {
            return SortDispatch::Unchanged;
        }
        self.last_view = Some(effective_view);

        if self.worker_ready && !self.sort_in_flight {
            self.sort_in_flight = true;
            SortDispatch::Start(view_projection)
        } else {
            // Only the newest matrix survives a burst.
            self.pending = Some(view_projection);
            SortDispatch::Deferred
        }
    }

    /// The worker acknowledged readiness. Returns a retained matrix to
    /// dispatch immediately, if any request arrived in the meantime.
    pub fn worker_ready(&mut self) -> Option<Mat4> {
        self.worker_ready = true;
        self.take_pending()
    }

    /// A sort completed. Returns the trailing matrix to dispatch, if a
    /// newer request arrived while the sort was running.
    pub fn sort_completed(&mut self) -> Option<Mat4> {
        self.sort_in_flight = false;
        self.take_pending()
    }

    fn take_pending(&mut self) -> Option<Mat4> {
        let next = self.pending.take()?;
        self.sort_in_flight = true;
        Some(next)
    }

    /// Whether a sort is currently running.
    #[must_use]
    pub const fn is_sort_in_flight(&self) -> bool {
        self.sort_in_flight
    }

    /// Whether the worker has signaled readiness.
    #[must_use]
    pub const fn is_worker_ready(&self) -> bool {
        self.worker_ready
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;

    fn view(z: f32) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, z))
    }

    fn ready_coordinator() -> SortCoordinator {
        let mut coordinator = SortCoordinator::new();
        assert_eq!(coordinator.worker_ready(), None);
        coordinator
    }

    #[test]
    fn test_leading_edge_dispatches_immediately() {
        let mut coordinator = ready_coordinator();
        let dispatch = coordinator.observe(view(1.0), false, view(1.0));
        assert_eq!(dispatch, SortDispatch::Start(view(1.0)));
        assert!(coordinator.is_sort_in_flight());
    }

    #[test]
    fn test_burst_coalesces_to_two_sorts() {
        let mut coordinator = ready_coordinator();
        let mut dispatched = Vec::new();

        if let SortDispatch::Start(m) =
            coordinator.observe(view(0.0), false, view(0.0))
        {
            dispatched.push(m);
        }

        // Many camera moves while the first sort is still running.
        for i in 1..10 {
            let m = view(i as f32);
            assert_eq!(
                coordinator.observe(m, false, m),
                SortDispatch::Deferred
            );
        }

        // Completion dispatches exactly one trailing sort with the newest
        // matrix.
        if let Some(m) = coordinator.sort_completed() {
            dispatched.push(m);
        }
        assert_eq!(dispatched, vec![view(0.0), view(9.0)]);

        // The trailing sort's completion finds nothing further to do.
        assert_eq!(coordinator.sort_completed(), None);
        assert!(!coordinator.is_sort_in_flight());
    }

    #[test]
    fn test_unchanged_camera_is_idempotent() {
        let mut coordinator = ready_coordinator();
        assert_eq!(
            coordinator.observe(view(1.0), false, view(1.0)),
            SortDispatch::Start(view(1.0))
        );
        let _ = coordinator.sort_completed();

        assert_eq!(
            coordinator.observe(view(1.0), false, view(1.0)),
            SortDispatch::Unchanged
        );
        assert_eq!(
            coordinator.observe(view(1.0), false, view(1.0)),
            SortDispatch::Unchanged
        );
    }

    #[test]
    fn test_instance_count_change_forces_resort() {
        let mut coordinator = ready_coordinator();
        let _ = coordinator.observe(view(1.0), false, view(1.0));
        let _ = coordinator.sort_completed();

        assert_eq!(
            coordinator.observe(view(1.0), true, view(1.0)),
            SortDispatch::Start(view(1.0))
        );
    }

    #[test]
    fn test_requests_before_readiness_are_retained() {
        let mut coordinator = SortCoordinator::new();
        assert_eq!(
            coordinator.observe(view(1.0), false, view(1.0)),
            SortDispatch::Deferred
        );
        assert_eq!(
            coordinator.observe(view(2.0), false, view(2.0)),
            SortDispatch::Deferred
        );

        // Readiness dispatches the newest retained request.
        assert_eq!(coordinator.worker_ready(), Some(view(2.0)));
        assert!(coordinator.is_sort_in_flight());
    }

    #[test]
    fn test_never_ready_never_dispatches() {
        let mut coordinator = SortCoordinator::new();
        for i in 0..5 {
            let m = view(i as f32);
            assert_eq!(
                coordinator.observe(m, false, m),
                SortDispatch::Deferred
            );
        }
        assert!(!coordinator.is_worker_ready());
        assert!(!coordinator.is_sort_in_flight());
    }

    #[test]
    fn test_trailing_sort_uses_newest_matrix_only() {
        let mut coordinator = ready_coordinator();
        let _ = coordinator.observe(view(0.0), false, view(0.0));
        let _ = coordinator.observe(view(1.0), false, view(1.0));
        let _ = coordinator.observe(view(2.0), false, view(2.0));

        assert_eq!(coordinator.sort_completed(), Some(view(2.0)));
        assert!(coordinator.is_sort_in_flight());
        assert_eq!(coordinator.sort_completed(), None);
    }
}
