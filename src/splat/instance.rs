//! One renderable splat model with its dedicated sort worker.
//!
//! The instance uploads its raw (unsorted) arrays at initialization so it
//! is immediately renderable, spawns a background sort worker, and sends
//! it the model exactly once. Every camera change requests a reorder; the
//! coalescing policy in [`SortCoordinator`] keeps at most one sort in
//! flight and at most one trailing request behind it. Results are applied
//! when the next `update` polls them in, never inside the call that
//! requested the sort, and the render thread never blocks on the worker.

use glam::Mat4;

use crate::camera::Camera;
use crate::error::LusterError;
use crate::gpu::lifecycle::Lifecycle;
use crate::gpu::render_context::RenderContext;
use crate::sort::engine::SortResult;
use crate::sort::worker::{SortWorker, SorterRequest, SorterResponse};
use crate::splat::attributes::SplatAttribute;
use crate::splat::coordinator::{SortCoordinator, SortDispatch};
use crate::splat::model::SplatModel;
use crate::splat::quad_mesh::QuadMesh;

/// The per-instance attributes every splat quad declares.
pub const INSTANCE_ATTRIBUTES: [SplatAttribute; 4] = [
    SplatAttribute::Center,
    SplatAttribute::Rotation,
    SplatAttribute::Scale,
    SplatAttribute::Color,
];

/// One splat model, its quad mesh, and its sort worker.
pub struct SplatInstance {
    model: SplatModel,
    quad_mesh: QuadMesh,
    worker: Option<SortWorker>,
    coordinator: SortCoordinator,
    num_instances: usize,
    num_instances_to_render: u32,
    last_sorted_view_projection: Option<Mat4>,
    lifecycle: Lifecycle,
}

impl SplatInstance {
    /// Instance for the given model. No GPU or worker resources exist
    /// until [`acquire`].
    ///
    /// [`acquire`]: Self::acquire
    #[must_use]
    pub fn new(model: SplatModel) -> Self {
        Self {
            model,
            quad_mesh: QuadMesh::new(&INSTANCE_ATTRIBUTES),
            worker: None,
            coordinator: SortCoordinator::new(),
            num_instances: 0,
            num_instances_to_render: 0,
            last_sorted_view_projection: None,
            lifecycle: Lifecycle::new(),
        }
    }

    /// Register an owner. The first acquire builds the quad mesh, uploads
    /// the model's unsorted arrays, and spawns the sort worker.
    ///
    /// If the worker fails to spawn the instance stays renderable with
    /// its unsorted data indefinitely; there is no retry.
    ///
    /// # Errors
    ///
    /// Returns [`LusterError::Mesh`] if the initial attribute upload
    /// violates the mesh contract.
    pub fn acquire(
        &mut self,
        context: &RenderContext,
    ) -> Result<(), LusterError> {
        if !self.lifecycle.acquire() {
            return Ok(());
        }

        self.quad_mesh.acquire(context);
        self.upload_model_arrays(context)?;

        self.num_instances = self.model.len();
        self.num_instances_to_render = self.model.len() as u32;

        match SortWorker::spawn() {
            Ok(worker) => self.worker = Some(worker),
            Err(e) => {
                log::error!(
                    "sort worker failed to start; rendering unsorted: {e}"
                );
            }
        }
        Ok(())
    }

    /// Drop one owner. The final release terminates the worker (a sort
    /// still running is discarded) and frees the quad mesh.
    ///
    /// # Errors
    ///
    /// Returns [`LusterError::Lifecycle`] on over-release.
    pub fn release(&mut self) -> Result<(), LusterError> {
        if !self.lifecycle.release("splat instance")? {
            return Ok(());
        }

        if let Some(mut worker) = self.worker.take() {
            worker.shutdown();
        }
        self.quad_mesh.release()?;
        self.coordinator = SortCoordinator::new();
        self.num_instances = 0;
        self.num_instances_to_render = 0;
        self.last_sorted_view_projection = None;
        Ok(())
    }

    /// Observe the camera for this frame and drive the sort protocol.
    ///
    /// Applies any sort results the worker delivered since the last call,
    /// then requests a reorder if the effective view matrix (with
    /// `parent_transform` folded in) changed by value or the instance
    /// count did. An unchanged camera is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`LusterError::Lifecycle`] if the instance is not
    /// initialized, or [`LusterError::Mesh`] if applying a result
    /// violates the mesh contract.
    pub fn update(
        &mut self,
        context: &RenderContext,
        camera: &Camera,
        parent_transform: Option<&Mat4>,
    ) -> Result<(), LusterError> {
        self.lifecycle.ensure_initialized("splat instance")?;
        self.pump_worker(context)?;

        let effective_view = parent_transform.map_or_else(
            || camera.view_matrix(),
            |parent| camera.view_matrix() * *parent,
        );
        let view_projection = parent_transform.map_or_else(
            || camera.view_projection_matrix(),
            |parent| camera.view_projection_matrix() * *parent,
        );
        let count_changed = self.model.len() != self.num_instances;

        match self.coordinator.observe(
            effective_view,
            count_changed,
            view_projection,
        ) {
            SortDispatch::Start(matrix) => self.dispatch_sort(matrix),
            SortDispatch::Deferred | SortDispatch::Unchanged => {}
        }
        Ok(())
    }

    /// Issue the instanced draw: 6 indices over
    /// [`num_instances_to_render`] instances, using whichever attribute
    /// data is currently bound (unsorted before the first sort completes,
    /// the latest completed ordering thereafter).
    ///
    /// [`num_instances_to_render`]: Self::num_instances_to_render
    ///
    /// # Errors
    ///
    /// Returns [`LusterError::Mesh`] if the mesh is not initialized or a
    /// per-instance buffer is unset.
    pub fn render<'a>(
        &'a self,
        render_pass: &mut wgpu::RenderPass<'a>,
    ) -> Result<(), LusterError> {
        self.lifecycle.ensure_initialized("splat instance")?;
        if self.num_instances_to_render == 0 {
            return Ok(());
        }

        self.quad_mesh.bind(render_pass)?;
        render_pass.draw_indexed(
            0..self.quad_mesh.num_indices(),
            0,
            0..self.num_instances_to_render,
        );
        Ok(())
    }

    /// Number of splats in the model.
    #[must_use]
    pub const fn num_instances(&self) -> usize {
        self.num_instances
    }

    /// Number of splats the next draw will cover.
    #[must_use]
    pub const fn num_instances_to_render(&self) -> u32 {
        self.num_instances_to_render
    }

    /// The matrix of the most recently applied ordering, if any sort has
    /// completed.
    #[must_use]
    pub const fn last_sorted_view_projection(&self) -> Option<Mat4> {
        self.last_sorted_view_projection
    }

    /// Whether a sort is currently running in the worker.
    #[must_use]
    pub const fn is_sort_in_flight(&self) -> bool {
        self.coordinator.is_sort_in_flight()
    }

    /// Upload the model's raw arrays so the instance renders before the
    /// first sort completes.
    fn upload_model_arrays(
        &mut self,
        context: &RenderContext,
    ) -> Result<(), LusterError> {
        let device = &context.device;
        let queue = &context.queue;
        self.quad_mesh.set_attribute_data(
            device,
            queue,
            SplatAttribute::Center,
            self.model.positions(),
        )?;
        self.quad_mesh.set_attribute_data(
            device,
            queue,
            SplatAttribute::Rotation,
            self.model.rotations(),
        )?;
        self.quad_mesh.set_attribute_data(
            device,
            queue,
            SplatAttribute::Scale,
            self.model.scales(),
        )?;
        self.quad_mesh.set_attribute_data(
            device,
            queue,
            SplatAttribute::Color,
            self.model.colors(),
        )?;
        Ok(())
    }

    /// Drain worker responses delivered since the last frame, in arrival
    /// order.
    fn pump_worker(
        &mut self,
        context: &RenderContext,
    ) -> Result<(), LusterError> {
        loop {
            let response = match &self.worker {
                Some(worker) => worker.try_recv(),
                None => None,
            };
            let Some(response) = response else {
                return Ok(());
            };

            match response {
                SorterResponse::WorkerReady => {
                    self.send_model_to_worker();
                    if let Some(matrix) = self.coordinator.worker_ready() {
                        self.dispatch_sort(matrix);
                    }
                }
                SorterResponse::SortResults(result) => {
                    self.apply_sort_result(context, result)?;
                    if let Some(matrix) = self.coordinator.sort_completed() {
                        self.dispatch_sort(matrix);
                    }
                }
            }
        }
    }

    /// Transfer the model arrays to the worker. Called exactly once, when
    /// the worker acknowledges readiness.
    fn send_model_to_worker(&self) {
        if let Some(worker) = &self.worker {
            worker.submit(SorterRequest::SetBuffers {
                positions: self.model.positions().to_vec(),
                rotations: self.model.rotations().to_vec(),
                scales: self.model.scales().to_vec(),
                colors: self.model.colors().to_vec(),
            });
        }
    }

    fn dispatch_sort(&self, matrix: Mat4) {
        if let Some(worker) = &self.worker {
            worker.submit(SorterRequest::PerformSort {
                view_projection: matrix,
            });
        }
    }

    /// Swap a completed ordering into the GPU buffers.
    ///
    /// All four attributes are replaced before the visible count is
    /// updated, on the render thread, so a draw never observes buffers
    /// whose element count disagrees with `num_instances_to_render`.
    fn apply_sort_result(
        &mut self,
        context: &RenderContext,
        result: SortResult,
    ) -> Result<(), LusterError> {
        let device = &context.device;
        let queue = &context.queue;
        self.quad_mesh.set_attribute_data(
            device,
            queue,
            SplatAttribute::Center,
            &result.positions,
        )?;
        self.quad_mesh.set_attribute_data(
            device,
            queue,
            SplatAttribute::Rotation,
            &result.rotations,
        )?;
        self.quad_mesh.set_attribute_data(
            device,
            queue,
            SplatAttribute::Scale,
            &result.scales,
        )?;
        self.quad_mesh.set_attribute_data(
            device,
            queue,
            SplatAttribute::Color,
            &result.colors,
        )?;

        self.num_instances_to_render = result.visible_count;
        self.last_sorted_view_projection = Some(result.view_projection);
        Ok(())
    }
}
