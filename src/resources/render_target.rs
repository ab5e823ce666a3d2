//! The shared G-buffer render target and the builder that assembles it

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::config::MultipassConfig;
use crate::error::{MultipassError, MultipassResult};
use crate::resources::attachment::{Attachment, AttachmentRole};

/// Number of attachments every render target carries
pub const ATTACHMENT_COUNT: usize = 5;

/// Index-addressed set of the five attachments shared by all passes.
///
/// Attachment `i` always has role `AttachmentRole::ALL[i]`, and every
/// attachment has the extent of the presentable image.
///
/// Dropping a target frees nothing; the device owns the textures. Call
/// [`RenderTarget::release`] before building the next one.
#[derive(Debug)]
pub struct RenderTarget {
    attachments: Vec<Attachment>,
    extent: Extent2d,
}

impl RenderTarget {
    /// Wrap attachments built elsewhere, checking order and extents
    pub fn from_attachments(attachments: Vec<Attachment>) -> MultipassResult<Self> {
        if attachments.len() != ATTACHMENT_COUNT {
            return Err(MultipassError::InvalidRenderTarget(format!(
                "expected {ATTACHMENT_COUNT} attachments, got {}",
                attachments.len()
            )));
        }

        let extent = attachments[0].extent();
        for (index, attachment) in attachments.iter().enumerate() {
            if attachment.role().index() != index {
                return Err(MultipassError::InvalidRenderTarget(format!(
                    "attachment {index} has role {}",
                    attachment.role()
                )));
            }
            if attachment.extent() != extent {
                return Err(MultipassError::InvalidRenderTarget(format!(
                    "{} attachment is {}x{}, presentable is {}x{}",
                    attachment.role(),
                    attachment.extent().width,
                    attachment.extent().height,
                    extent.width,
                    extent.height
                )));
            }
        }

        Ok(Self {
            attachments,
            extent,
        })
    }

    pub fn extent(&self) -> Extent2d {
        self.extent
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    /// Get an attachment by index
    ///
    /// # Panics
    ///
    /// Panics if `index >= ATTACHMENT_COUNT`; pass definitions are validated
    /// against that bound at construction.
    pub fn attachment(&self, index: usize) -> &Attachment {
        &self.attachments[index]
    }

    pub(crate) fn attachment_mut(&mut self, index: usize) -> &mut Attachment {
        &mut self.attachments[index]
    }

    pub fn get(&self, role: AttachmentRole) -> &Attachment {
        self.attachment(role.index())
    }

    pub fn presentable(&self) -> &Attachment {
        self.get(AttachmentRole::Presentable)
    }

    /// Current layout of every attachment, in index order
    pub fn layouts(&self) -> [ImageLayout; ATTACHMENT_COUNT] {
        let mut layouts = [ImageLayout::Undefined; ATTACHMENT_COUNT];
        for (slot, attachment) in layouts.iter_mut().zip(&self.attachments) {
            *slot = attachment.layout();
        }
        layouts
    }

    /// Destroy the transient attachments and give the presentable image back.
    ///
    /// Must be called when the surface is resized or torn down, otherwise the
    /// transients stay allocated on the device.
    pub fn release<D: GraphicsDevice + ?Sized>(self, device: &mut D) -> SurfaceImage {
        let mut attachments = self.attachments.into_iter();
        let presentable = attachments
            .next()
            .expect("render target always holds a presentable attachment");

        for attachment in attachments {
            device.destroy_texture(attachment.texture());
        }

        SurfaceImage::new(
            presentable.texture(),
            presentable.extent(),
            presentable.format(),
            presentable.usage(),
        )
    }
}

/// Pick the first depth format the device can attach
pub fn select_depth_format<D: GraphicsDevice + ?Sized>(
    device: &D,
    candidates: &[TextureFormat],
) -> MultipassResult<TextureFormat> {
    candidates
        .iter()
        .copied()
        .find(|&format| format.is_depth() && device.supports_depth_attachment(format))
        .ok_or_else(|| MultipassError::UnsupportedFormat {
            candidates: candidates.to_vec(),
        })
}

/// Builds a [`RenderTarget`] from the surface image of one configuration.
///
/// Colour attachments are kept at 32 bits per pixel each so the driver can
/// merge the geometry and lighting subpasses into tile memory:
///
/// - Presentable (surface format)
/// - Depth (best supported depth format)
/// - Albedo RGBA8
/// - Normal RGB10A2
/// - PostInput RGBA8
pub struct RenderTargetBuilder<'a> {
    config: &'a MultipassConfig,
}

impl<'a> RenderTargetBuilder<'a> {
    pub fn new(config: &'a MultipassConfig) -> Self {
        Self { config }
    }

    pub fn build<D: GraphicsDevice + ?Sized>(
        &self,
        device: &mut D,
        image: SurfaceImage,
    ) -> MultipassResult<RenderTarget> {
        self.config.validate()?;

        let required = TextureUsage::COLOR_ATTACHMENT | TextureUsage::INPUT_ATTACHMENT;
        if !image.usage().contains(required) {
            return Err(MultipassError::MissingUsage {
                role: AttachmentRole::Presentable,
                usage: required,
            });
        }

        let depth_format = select_depth_format(device, &self.config.depth_format_candidates)?;
        let extent = image.extent();

        log::debug!(
            "Creating render target {}x{}: depth {:?}, albedo {:?}, normal {:?}, post-input {:?}",
            extent.width,
            extent.height,
            depth_format,
            self.config.albedo_format,
            self.config.normal_format,
            self.config.post_input_format
        );

        let [albedo, normal, post_input] = self.config.color_formats();
        let plan = [
            (AttachmentRole::Depth, depth_format),
            albedo,
            normal,
            post_input,
        ];

        let mut attachments = Vec::with_capacity(ATTACHMENT_COUNT);
        attachments.push(Attachment::new(
            AttachmentRole::Presentable,
            image.texture(),
            image.format(),
            extent,
            image.usage(),
        ));

        for (role, format) in plan {
            let usage = self.attachment_usage(role);
            let desc = TextureDescriptor {
                label: Some(format!("{role} attachment")),
                extent,
                format,
                usage,
            };

            match device.create_texture(&desc) {
                Ok(texture) => {
                    attachments.push(Attachment::new(role, texture, format, extent, usage))
                }
                Err(err) => {
                    for created in attachments.iter().skip(1) {
                        device.destroy_texture(created.texture());
                    }
                    return Err(err.into());
                }
            }
        }

        RenderTarget::from_attachments(attachments)
    }

    fn attachment_usage(&self, role: AttachmentRole) -> TextureUsage {
        let attachment_bit = if role.is_depth() {
            TextureUsage::DEPTH_STENCIL_ATTACHMENT
        } else {
            TextureUsage::COLOR_ATTACHMENT
        };
        attachment_bit | self.config.attachment_usage
    }
}
