//! Export encoder
//!
//! Turns one texture snapshot into DDS or per-slice PNG files in the output
//! directory. Every file write is bracketed by a registry reservation so the
//! reload watcher can tell our writes from external edits.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::codec::PixelCodec;
use crate::config::OutputFormat;
use crate::container::{dds, png, ImageParameters};
use crate::error::{log_failure, DiskTextureError, DiskTextureResult, IoResultExt};
use crate::format::ImageFormat;
use crate::persistence::naming::TextureName;
use crate::persistence::registry::Registry;
use crate::texture::{TextureHandle, TextureRequest};

/// One queued export
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub handle: TextureHandle,
    pub request: TextureRequest,
    pub output_directory: PathBuf,
    pub output_format: OutputFormat,
}

/// Writes texture snapshots to disk
pub struct ExportEncoder {
    registry: Arc<Registry>,
    codec: Arc<dyn PixelCodec>,
}

impl ExportEncoder {
    pub fn new(registry: Arc<Registry>, codec: Arc<dyn PixelCodec>) -> Self {
        Self { registry, codec }
    }

    /// Run one job. Failures are logged per file and never returned.
    pub fn export(&self, job: &ExportJob) {
        let format = job.request.format;

        if !format.is_supported() {
            log::debug!("[ExportEncoder::export] Skipping texture in unsupported format {:?}", format);
            return;
        }

        match job.output_format {
            OutputFormat::Dds => self.export_dds(job),
            OutputFormat::Png => self.export_png(job),
        }
    }

    fn export_dds(&self, job: &ExportJob) {
        let request = &job.request;

        let Some(dimensions) = request.target.image_dimensions() else {
            log::debug!(
                "[ExportEncoder::export_dds] {:?} textures cannot be stored as DDS",
                request.target
            );
            return;
        };

        let native = ImageFormat::from_native(request.format)
            .filter(|image_format| dds::can_store(*image_format, dimensions));

        let (image_format, converted) = match native {
            Some(image_format) => (image_format, None),
            None => match self.codec.decode_to_rgba8(request) {
                Ok(data) => (ImageFormat::R8G8B8A8Unorm, Some(data)),
                Err(error) => {
                    log_failure(&DiskTextureError::from(error));
                    return;
                }
            },
        };

        let parameters = ImageParameters::new(
            request.width,
            request.height,
            request.depth_or_layers(),
            request.levels,
            image_format,
            dimensions,
        );

        let data = converted.as_deref().unwrap_or(request.data.as_slice());
        let required = dds::calculate_size(&parameters);

        if data.len() < required {
            log::error!(
                "[ExportEncoder::export_dds] Texture data is {} bytes, {} required",
                data.len(),
                required
            );
            return;
        }

        let name = TextureName::for_request(request);
        let file_name = name.file_name(OutputFormat::Dds.extension());
        let path = job.output_directory.join(&file_name);

        let result = self
            .registry
            .with_reservation(&path, || write_file(&path, |writer| dds::save(writer, &parameters, data)));

        match result {
            Ok(()) => self.registry.associate(&file_name, job.handle),
            Err(error) => log_failure(&error),
        }
    }

    fn export_png(&self, job: &ExportJob) {
        let request = &job.request;

        let data = match self.codec.decode_to_rgba8(request) {
            Ok(data) => data,
            Err(error) => {
                log_failure(&DiskTextureError::from(error));
                return;
            }
        };

        let name = TextureName::for_request(request);

        for slice in request.rgba8_slices() {
            let file_name =
                name.slice_file_name(slice.level, slice.index, OutputFormat::Png.extension());
            let path = job.output_directory.join(&file_name);
            let pixels = &data[slice.offset..slice.offset + slice.size];

            let result = self.registry.with_reservation(&path, || {
                write_file(&path, |writer| png::save(writer, slice.width, slice.height, pixels))
            });

            match result {
                Ok(()) => self.registry.associate(&file_name, job.handle),
                Err(error) => log_failure(&error),
            }
        }
    }
}

/// Create `path` and stream `save` into it
fn write_file(
    path: &Path,
    save: impl FnOnce(&mut BufWriter<File>) -> io::Result<()>,
) -> DiskTextureResult<()> {
    let file = File::create(path).write_context(path)?;
    let mut writer = BufWriter::new(file);
    save(&mut writer).and_then(|()| writer.flush()).write_context(path)
}
