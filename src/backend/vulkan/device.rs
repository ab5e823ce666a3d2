//! Vulkan device wrapper: attachment images, render passes and framebuffers.

use std::collections::HashMap;
use std::sync::Arc;

use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme, Allocator, AllocatorCreateDesc};
use gpu_allocator::MemoryLocation;
use parking_lot::Mutex;

use super::conversion::*;
use crate::backend::traits::*;
use crate::backend::types::*;
use crate::render_graph::{PassDefinition, PassRole};
use crate::resources::{AttachmentRole, RenderTarget, ATTACHMENT_COUNT};

struct VkTexture {
    image: vk::Image,
    view: vk::ImageView,
    /// `None` for images owned by the swapchain
    allocation: Option<Allocation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct RenderPassKey {
    role: PassRole,
    formats: [TextureFormat; ATTACHMENT_COUNT],
    initial_layouts: [ImageLayout; ATTACHMENT_COUNT],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FramebufferKey {
    render_pass: vk::RenderPass,
    textures: [TextureHandle; ATTACHMENT_COUNT],
}

/// Attachment allocation and render pass objects on a host-owned device.
///
/// The instance and device stay owned by the host; they must outlive this
/// wrapper.
pub struct VulkanDevice {
    instance: ash::Instance,
    physical_device: vk::PhysicalDevice,
    device: ash::Device,
    allocator: Option<Arc<Mutex<Allocator>>>,
    textures: HashMap<u64, VkTexture>,
    render_passes: HashMap<RenderPassKey, vk::RenderPass>,
    framebuffers: HashMap<FramebufferKey, vk::Framebuffer>,
    next_texture_id: u64,
}

impl VulkanDevice {
    pub fn new(
        instance: &ash::Instance,
        physical_device: vk::PhysicalDevice,
        device: &ash::Device,
    ) -> BackendResult<Self> {
        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: instance.clone(),
            device: device.clone(),
            physical_device,
            debug_settings: Default::default(),
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        })
        .map_err(|e| BackendError::TextureCreationFailed(format!("Failed to create allocator: {e}")))?;

        Ok(Self {
            instance: instance.clone(),
            physical_device,
            device: device.clone(),
            allocator: Some(Arc::new(Mutex::new(allocator))),
            textures: HashMap::new(),
            render_passes: HashMap::new(),
            framebuffers: HashMap::new(),
            next_texture_id: 1,
        })
    }

    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    pub fn image(&self, texture: TextureHandle) -> Option<vk::Image> {
        self.textures.get(&texture.raw()).map(|t| t.image)
    }

    pub fn image_view(&self, texture: TextureHandle) -> Option<vk::ImageView> {
        self.textures.get(&texture.raw()).map(|t| t.view)
    }

    fn create_view(&self, image: vk::Image, format: TextureFormat) -> BackendResult<vk::ImageView> {
        let view_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(convert_texture_format(format))
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: aspect_mask(format),
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });

        unsafe {
            self.device
                .create_image_view(&view_info, None)
                .map_err(|e| BackendError::TextureCreationFailed(e.to_string()))
        }
    }

    fn register(&mut self, texture: VkTexture) -> TextureHandle {
        let id = self.next_texture_id;
        self.next_texture_id += 1;
        self.textures.insert(id, texture);
        TextureHandle::from_raw(id)
    }

    /// Wrap a swapchain image so it can serve as the presentable attachment.
    ///
    /// The image stays owned by the swapchain; destroying the handle only
    /// destroys the view created here.
    pub fn import_image(
        &mut self,
        image: vk::Image,
        format: vk::Format,
        extent: Extent2d,
        usage: TextureUsage,
    ) -> BackendResult<SurfaceImage> {
        let format = convert_surface_format(format).ok_or_else(|| {
            BackendError::TextureCreationFailed(format!("Unsupported surface format {format:?}"))
        })?;
        let view = self.create_view(image, format)?;
        let texture = self.register(VkTexture {
            image,
            view,
            allocation: None,
        });
        Ok(SurfaceImage::new(texture, extent, format, usage))
    }

    fn image_view_of(&self, texture: TextureHandle) -> BackendResult<vk::ImageView> {
        self.image_view(texture)
            .ok_or_else(|| BackendError::SubmissionFailed(format!("Unknown texture {}", texture.raw())))
    }

    /// Render pass object for `pass` over `target`, created on first use.
    ///
    /// Attachments start in their tracked layouts and finish in their write
    /// layouts, matching the scheduler's bookkeeping.
    pub fn render_pass(
        &mut self,
        pass: &PassDefinition,
        target: &RenderTarget,
    ) -> BackendResult<vk::RenderPass> {
        let mut formats = [TextureFormat::Rgba8Unorm; ATTACHMENT_COUNT];
        for (slot, attachment) in formats.iter_mut().zip(target.attachments()) {
            *slot = attachment.format();
        }

        let key = RenderPassKey {
            role: pass.role(),
            formats,
            initial_layouts: target.layouts(),
        };
        if let Some(&render_pass) = self.render_passes.get(&key) {
            return Ok(render_pass);
        }

        let render_pass = self.create_render_pass(pass, &key)?;
        log::debug!(
            "Created {} render pass for initial layouts {:?}",
            pass.name(),
            key.initial_layouts
        );
        self.render_passes.insert(key, render_pass);
        Ok(render_pass)
    }

    fn create_render_pass(&self, pass: &PassDefinition, key: &RenderPassKey) -> BackendResult<vk::RenderPass> {
        let attachments: Vec<vk::AttachmentDescription> = AttachmentRole::ALL
            .iter()
            .map(|role| {
                let index = role.index();
                let ops = pass.load_store(index);
                vk::AttachmentDescription::default()
                    .format(convert_texture_format(key.formats[index]))
                    .samples(vk::SampleCountFlags::TYPE_1)
                    .load_op(convert_load_op(ops.load_op))
                    .store_op(convert_store_op(ops.store_op))
                    .stencil_load_op(convert_load_op(ops.load_op))
                    .stencil_store_op(convert_store_op(ops.store_op))
                    .initial_layout(convert_image_layout(key.initial_layouts[index]))
                    .final_layout(convert_image_layout(role.write_layout()))
            })
            .collect();

        struct SubpassRefs {
            inputs: Vec<vk::AttachmentReference>,
            colors: Vec<vk::AttachmentReference>,
            depth: Option<vk::AttachmentReference>,
        }

        let refs: Vec<SubpassRefs> = pass
            .subpasses()
            .iter()
            .map(|subpass| {
                let reference = |index: usize, layout: ImageLayout| vk::AttachmentReference {
                    attachment: index as u32,
                    layout: convert_image_layout(layout),
                };
                let role = |index: usize| AttachmentRole::ALL[index];

                SubpassRefs {
                    inputs: subpass
                        .inputs()
                        .iter()
                        .map(|&i| reference(i, role(i).read_layout()))
                        .collect(),
                    colors: subpass
                        .outputs()
                        .iter()
                        .filter(|&&i| !role(i).is_depth())
                        .map(|&i| reference(i, role(i).write_layout()))
                        .collect(),
                    depth: subpass
                        .outputs()
                        .iter()
                        .find(|&&i| role(i).is_depth())
                        .map(|&i| reference(i, role(i).write_layout())),
                }
            })
            .collect();

        let subpasses: Vec<vk::SubpassDescription> = refs
            .iter()
            .map(|r| {
                let description = vk::SubpassDescription::default()
                    .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
                    .input_attachments(&r.inputs)
                    .color_attachments(&r.colors);
                match &r.depth {
                    Some(depth) => description.depth_stencil_attachment(depth),
                    None => description,
                }
            })
            .collect();

        // Chained subpasses read their predecessor's outputs as input attachments
        let dependencies: Vec<vk::SubpassDependency> = (1..subpasses.len() as u32)
            .map(|dst| {
                vk::SubpassDependency::default()
                    .src_subpass(dst - 1)
                    .dst_subpass(dst)
                    .src_stage_mask(
                        vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                            | vk::PipelineStageFlags::LATE_FRAGMENT_TESTS,
                    )
                    .dst_stage_mask(vk::PipelineStageFlags::FRAGMENT_SHADER)
                    .src_access_mask(
                        vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                            | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
                    )
                    .dst_access_mask(vk::AccessFlags::INPUT_ATTACHMENT_READ)
                    .dependency_flags(vk::DependencyFlags::BY_REGION)
            })
            .collect();

        let render_pass_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);

        unsafe {
            self.device
                .create_render_pass(&render_pass_info, None)
                .map_err(|e| BackendError::SubmissionFailed(format!("Failed to create render pass: {e}")))
        }
    }

    /// Framebuffer binding every attachment of `target`, created on first use
    pub fn framebuffer(
        &mut self,
        render_pass: vk::RenderPass,
        target: &RenderTarget,
    ) -> BackendResult<vk::Framebuffer> {
        let mut textures = [TextureHandle::from_raw(0); ATTACHMENT_COUNT];
        for (slot, attachment) in textures.iter_mut().zip(target.attachments()) {
            *slot = attachment.texture();
        }

        let key = FramebufferKey {
            render_pass,
            textures,
        };
        if let Some(&framebuffer) = self.framebuffers.get(&key) {
            return Ok(framebuffer);
        }

        let views = textures
            .iter()
            .map(|&t| self.image_view_of(t))
            .collect::<BackendResult<Vec<_>>>()?;
        let extent = target.extent();
        let framebuffer_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass)
            .attachments(&views)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let framebuffer = unsafe {
            self.device
                .create_framebuffer(&framebuffer_info, None)
                .map_err(|e| BackendError::SubmissionFailed(format!("Failed to create framebuffer: {e}")))?
        };
        self.framebuffers.insert(key, framebuffer);
        Ok(framebuffer)
    }

    /// Destroy framebuffers that reference `texture`
    fn evict_framebuffers(&mut self, texture: TextureHandle) {
        let device = &self.device;
        self.framebuffers.retain(|key, framebuffer| {
            let stale = key.textures.contains(&texture);
            if stale {
                unsafe { device.destroy_framebuffer(*framebuffer, None) };
            }
            !stale
        });
    }
}

impl GraphicsDevice for VulkanDevice {
    fn supports_depth_attachment(&self, format: TextureFormat) -> bool {
        if !format.is_depth() {
            return false;
        }
        let props = unsafe {
            self.instance
                .get_physical_device_format_properties(self.physical_device, convert_texture_format(format))
        };
        props
            .optimal_tiling_features
            .contains(vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT)
    }

    fn create_texture(&mut self, desc: &TextureDescriptor) -> BackendResult<TextureHandle> {
        let allocator = self
            .allocator
            .as_ref()
            .ok_or_else(|| BackendError::TextureCreationFailed("Allocator not available".into()))?
            .clone();

        unsafe {
            let image_info = vk::ImageCreateInfo::default()
                .image_type(vk::ImageType::TYPE_2D)
                .format(convert_texture_format(desc.format))
                .extent(vk::Extent3D {
                    width: desc.extent.width,
                    height: desc.extent.height,
                    depth: 1,
                })
                .mip_levels(1)
                .array_layers(1)
                .samples(vk::SampleCountFlags::TYPE_1)
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(convert_texture_usage(desc.usage))
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);

            let image = self
                .device
                .create_image(&image_info, None)
                .map_err(|e| BackendError::TextureCreationFailed(e.to_string()))?;

            let requirements = self.device.get_image_memory_requirements(image);

            let allocation = match allocator.lock().allocate(&AllocationCreateDesc {
                name: desc.label.as_deref().unwrap_or("attachment"),
                requirements,
                location: MemoryLocation::GpuOnly,
                linear: false,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            }) {
                Ok(allocation) => allocation,
                Err(e) => {
                    self.device.destroy_image(image, None);
                    return Err(BackendError::TextureCreationFailed(e.to_string()));
                }
            };

            if let Err(e) = self
                .device
                .bind_image_memory(image, allocation.memory(), allocation.offset())
            {
                self.device.destroy_image(image, None);
                let _ = allocator.lock().free(allocation);
                return Err(BackendError::TextureCreationFailed(e.to_string()));
            }

            let view = match self.create_view(image, desc.format) {
                Ok(view) => view,
                Err(e) => {
                    self.device.destroy_image(image, None);
                    let _ = allocator.lock().free(allocation);
                    return Err(e);
                }
            };

            log::trace!(
                "VulkanDevice: created {:?} ({}x{}, {:?})",
                desc.label,
                desc.extent.width,
                desc.extent.height,
                desc.format
            );

            Ok(self.register(VkTexture {
                image,
                view,
                allocation: Some(allocation),
            }))
        }
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        self.evict_framebuffers(texture);
        if let Some(vk_texture) = self.textures.remove(&texture.raw()) {
            unsafe {
                self.device.destroy_image_view(vk_texture.view, None);
                if let Some(allocation) = vk_texture.allocation {
                    self.device.destroy_image(vk_texture.image, None);
                    if let Some(ref allocator) = self.allocator {
                        let _ = allocator.lock().free(allocation);
                    }
                }
            }
        }
    }
}

impl Drop for VulkanDevice {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();

            for (_, framebuffer) in self.framebuffers.drain() {
                self.device.destroy_framebuffer(framebuffer, None);
            }
            for (_, render_pass) in self.render_passes.drain() {
                self.device.destroy_render_pass(render_pass, None);
            }

            for (_, texture) in self.textures.drain() {
                self.device.destroy_image_view(texture.view, None);
                if let Some(allocation) = texture.allocation {
                    self.device.destroy_image(texture.image, None);
                    if let Some(ref allocator) = self.allocator {
                        let _ = allocator.lock().free(allocation);
                    }
                }
            }

            // Drop the allocator before the host destroys the device
            drop(self.allocator.take());
        }
    }
}
