//! Command recording into a Vulkan command buffer.

use ash::vk;

use super::conversion::*;
use super::device::VulkanDevice;
use crate::backend::traits::*;
use crate::backend::types::*;
use crate::render_graph::PassDefinition;
use crate::resources::{Attachment, RenderTarget};

/// Scene drawing supplied by the host framework.
///
/// Pipelines, descriptor sets and geometry belong to the host; the recorder
/// only opens the render pass and asks for each subpass's draws.
pub trait PassDrawer {
    /// Record the draws of subpass `subpass` of `pass`
    fn draw_subpass(
        &mut self,
        command_buffer: vk::CommandBuffer,
        pass: &PassDefinition,
        subpass: usize,
    ) -> BackendResult<()>;

    /// Record the UI overlay into the current subpass
    fn draw_overlay(&mut self, command_buffer: vk::CommandBuffer) -> BackendResult<()>;
}

/// [`CommandRecorder`] over a command buffer in the recording state
pub struct VulkanRecorder<'a> {
    device: &'a mut VulkanDevice,
    command_buffer: vk::CommandBuffer,
    drawer: &'a mut dyn PassDrawer,
}

impl<'a> VulkanRecorder<'a> {
    pub fn new(
        device: &'a mut VulkanDevice,
        command_buffer: vk::CommandBuffer,
        drawer: &'a mut dyn PassDrawer,
    ) -> Self {
        Self {
            device,
            command_buffer,
            drawer,
        }
    }

    pub fn command_buffer(&self) -> vk::CommandBuffer {
        self.command_buffer
    }
}

impl CommandRecorder for VulkanRecorder<'_> {
    fn set_viewport(&mut self, x: f32, y: f32, width: f32, height: f32, min_depth: f32, max_depth: f32) {
        let viewport = vk::Viewport {
            x,
            y,
            width,
            height,
            min_depth,
            max_depth,
        };
        unsafe {
            self.device
                .device()
                .cmd_set_viewport(self.command_buffer, 0, &[viewport]);
        }
    }

    fn set_scissor_rect(&mut self, x: u32, y: u32, width: u32, height: u32) {
        let scissor = vk::Rect2D {
            offset: vk::Offset2D { x: x as i32, y: y as i32 },
            extent: vk::Extent2D { width, height },
        };
        unsafe {
            self.device
                .device()
                .cmd_set_scissor(self.command_buffer, 0, &[scissor]);
        }
    }

    fn begin_render_pass(&mut self, pass: &PassDefinition, target: &RenderTarget) -> BackendResult<()> {
        let render_pass = self.device.render_pass(pass, target)?;
        let framebuffer = self.device.framebuffer(render_pass, target)?;

        let clear_values: Vec<vk::ClearValue> = (0..target.attachments().len())
            .map(|index| convert_clear_value(pass.clear_value(index)))
            .collect();
        let extent = target.extent();
        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(render_pass)
            .framebuffer(framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: vk::Extent2D {
                    width: extent.width,
                    height: extent.height,
                },
            })
            .clear_values(&clear_values);

        unsafe {
            self.device.device().cmd_begin_render_pass(
                self.command_buffer,
                &begin_info,
                vk::SubpassContents::INLINE,
            );
        }
        Ok(())
    }

    fn draw_pass(&mut self, pass: &PassDefinition, _target: &RenderTarget) -> BackendResult<()> {
        for subpass in 0..pass.subpasses().len() {
            if subpass > 0 {
                unsafe {
                    self.device
                        .device()
                        .cmd_next_subpass(self.command_buffer, vk::SubpassContents::INLINE);
                }
            }
            self.drawer.draw_subpass(self.command_buffer, pass, subpass)?;
        }
        Ok(())
    }

    fn draw_overlay(&mut self) -> BackendResult<()> {
        self.drawer.draw_overlay(self.command_buffer)
    }

    fn end_render_pass(&mut self) -> BackendResult<()> {
        unsafe {
            self.device.device().cmd_end_render_pass(self.command_buffer);
        }
        Ok(())
    }

    fn image_memory_barrier(
        &mut self,
        attachment: &Attachment,
        barrier: &ImageMemoryBarrier,
    ) -> BackendResult<()> {
        let image = self.device.image(attachment.texture()).ok_or_else(|| {
            BackendError::SubmissionFailed(format!("{} attachment has no image", attachment.role()))
        })?;

        let image_barrier = vk::ImageMemoryBarrier::default()
            .old_layout(convert_image_layout(barrier.old_layout))
            .new_layout(convert_image_layout(barrier.new_layout))
            .src_access_mask(convert_access_flags(barrier.src_access_mask))
            .dst_access_mask(convert_access_flags(barrier.dst_access_mask))
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: aspect_mask(attachment.format()),
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });

        unsafe {
            self.device.device().cmd_pipeline_barrier(
                self.command_buffer,
                convert_pipeline_stages(barrier.src_stage_mask),
                convert_pipeline_stages(barrier.dst_stage_mask),
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[image_barrier],
            );
        }
        Ok(())
    }
}
