//! Import scanner
//!
//! Looks for a replacement of a texture in the search directories, DDS
//! first, then per-slice PNG. The first directory holding a matching file
//! wins even when that file turns out to be unusable.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::codec::packed::swap_red_blue;
use crate::config::OutputFormat;
use crate::container::{dds, png};
use crate::error::{log_failure, IoResultExt, LoadResultExt};
use crate::format::{FormatInfo, ImageFormat, TextureInfoOverride};
use crate::persistence::naming::TextureName;
use crate::persistence::registry::Registry;
use crate::texture::{mip_extent, rgba8_size, LevelIter, TextureHandle, TextureRequest};

/// Replacement found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedTexture {
    pub info: TextureInfoOverride,
    /// Level-major payload in `info.format_info.format`
    pub data: Vec<u8>,
}

/// Searches directories for replacements and loads them
pub struct ImportScanner {
    registry: Arc<Registry>,
}

impl ImportScanner {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Find a replacement for `request` in `directories`, searched in order
    pub fn try_import(
        &self,
        directories: &[PathBuf],
        handle: TextureHandle,
        request: &TextureRequest,
    ) -> Option<ImportedTexture> {
        if !request.format.is_supported() || directories.is_empty() {
            return None;
        }

        let name = TextureName::for_request(request);

        self.import_dds(directories, &name, handle, request)
            .or_else(|| self.import_png(directories, &name, handle, request))
    }

    fn import_dds(
        &self,
        directories: &[PathBuf],
        name: &TextureName,
        handle: TextureHandle,
        request: &TextureRequest,
    ) -> Option<ImportedTexture> {
        let file_name = name.file_name(OutputFormat::Dds.extension());
        let (path, file) = self.read_first_match(directories, &file_name, handle)?;

        let parameters = match dds::load_header(&file).load_context(&path) {
            Ok(parameters) => parameters,
            Err(error) => {
                log_failure(&error);
                return None;
            }
        };

        let mut data = vec![0u8; dds::calculate_size(&parameters)];

        if let Err(error) = dds::load_data(&file, &mut data).load_context(&path) {
            log_failure(&error);
            return None;
        }

        if parameters.format == ImageFormat::B8G8R8A8Unorm {
            swap_red_blue(&mut data);
        }

        log::debug!("[ImportScanner::import_dds] Replacing texture {:?} with {}", handle, file_name);

        Some(ImportedTexture {
            info: TextureInfoOverride {
                width: parameters.width,
                height: parameters.height,
                depth_or_layers: parameters.depth_or_layers,
                levels: parameters.levels,
                format_info: FormatInfo::for_import(parameters.format, request.format.is_srgb()),
            },
            data,
        })
    }

    /// Load slices in level-major order until the first one that is missing,
    /// unreadable or not the size implied by slice (0, 0).
    fn import_png(
        &self,
        directories: &[PathBuf],
        name: &TextureName,
        handle: TextureHandle,
        request: &TextureRequest,
    ) -> Option<ImportedTexture> {
        let mut scan = PngScan::default();

        let levels = LevelIter::new(
            request.width,
            request.height,
            request.depth,
            request.layers,
            request.levels,
        );

        'scan: for level in levels {
            for slice in 0..level.slices {
                let file_name = name.slice_file_name(level.level, slice, OutputFormat::Png.extension());

                let Some((path, file)) = self.read_first_match(directories, &file_name, handle) else {
                    break 'scan;
                };

                let header = match png::load_header(&file).load_context(&path) {
                    Ok(header) => header,
                    Err(error) => {
                        log_failure(&error);
                        break 'scan;
                    }
                };

                let (base_width, base_height) = *scan.base.get_or_insert_with(|| {
                    let size = rgba8_size(
                        header.width,
                        header.height,
                        request.depth,
                        request.layers,
                        request.levels,
                    );
                    scan.buffer = vec![0u8; size];
                    (header.width, header.height)
                });

                let width = mip_extent(base_width, level.level);
                let height = mip_extent(base_height, level.level);

                if header.width != width || header.height != height {
                    log::warn!(
                        "[ImportScanner::import_png] \"{}\" is {}x{}, expected {}x{}",
                        file_name,
                        header.width,
                        header.height,
                        width,
                        height
                    );
                    break 'scan;
                }

                let size = width as usize * height as usize * 4;
                let target = &mut scan.buffer[scan.written..scan.written + size];

                if let Err(error) = png::load_data(&file, target).load_context(&path) {
                    log_failure(&error);
                    break 'scan;
                }

                scan.written += size;

                if level.level == 0 {
                    scan.base_slices = slice + 1;
                }

                if slice + 1 == level.slices {
                    scan.complete_levels += 1;
                    scan.complete_size = scan.written;
                }
            }
        }

        let (width, height) = scan.base?;

        // A partially filled top level still imports as a single level
        let (levels, size) = if scan.complete_levels == 0 {
            (1, scan.written)
        } else {
            (scan.complete_levels, scan.complete_size)
        };

        let mut data = scan.buffer;
        data.truncate(size);

        log::debug!(
            "[ImportScanner::import_png] Replacing texture {:?} with {} level(s) of {} slice(s)",
            handle,
            levels,
            scan.base_slices
        );

        Some(ImportedTexture {
            info: TextureInfoOverride {
                width,
                height,
                depth_or_layers: scan.base_slices,
                levels,
                format_info: FormatInfo::rgba8(request.format.is_srgb()),
            },
            data,
        })
    }

    /// Read `file_name` from the first directory that has it.
    ///
    /// A match is associated with `handle` before it is read, so a broken
    /// replacement still reloads once it is fixed.
    fn read_first_match(
        &self,
        directories: &[PathBuf],
        file_name: &str,
        handle: TextureHandle,
    ) -> Option<(PathBuf, Vec<u8>)> {
        let path = directories
            .iter()
            .map(|directory| directory.join(file_name))
            .find(|path| path.is_file())?;

        self.registry.associate(file_name, handle);

        match fs::read(&path).read_context(&path) {
            Ok(file) => Some((path, file)),
            Err(error) => {
                log_failure(&error);
                None
            }
        }
    }
}

#[derive(Default)]
struct PngScan {
    /// Size of slice (0, 0)
    base: Option<(u32, u32)>,
    buffer: Vec<u8>,
    written: usize,
    base_slices: u32,
    complete_levels: u32,
    complete_size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::ImageParameters;
    use crate::format::{Format, ImageDimensions, Target};
    use std::path::Path;
    use tempfile::TempDir;

    fn write_png(dir: &Path, file_name: &str, width: u32, height: u32, value: u8) {
        let mut file = Vec::new();
        png::save(&mut file, width, height, &vec![value; (width * height * 4) as usize])
            .expect("Failed to encode png");
        fs::write(dir.join(file_name), file).expect("Failed to write png");
    }

    fn array_request(levels: u32, layers: u32) -> TextureRequest {
        let size = rgba8_size(8, 8, 1, layers, levels);
        TextureRequest::new(8, 8, 1, layers, levels, Format::R8G8B8A8Srgb, Target::Texture2DArray, vec![3; size])
    }

    #[test]
    fn test_nothing_on_disk_is_none() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let registry = Arc::new(Registry::new());
        let scanner = ImportScanner::new(registry.clone());

        let request = array_request(2, 1);
        assert!(scanner
            .try_import(&[dir.path().to_path_buf()], TextureHandle(1), &request)
            .is_none());
        assert_eq!(registry.association_count(), 0);
    }

    #[test]
    fn test_png_missing_second_level_imports_one_level() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let scanner = ImportScanner::new(Arc::new(Registry::new()));
        let request = array_request(3, 1);
        let name = TextureName::for_request(&request);

        write_png(dir.path(), &name.slice_file_name(0, 0, "png"), 8, 8, 9);
        write_png(dir.path(), &name.slice_file_name(2, 0, "png"), 2, 2, 9);

        let imported = scanner
            .try_import(&[dir.path().to_path_buf()], TextureHandle(1), &request)
            .expect("import");

        assert_eq!(imported.info.levels, 1);
        assert_eq!(imported.info.depth_or_layers, 1);
        assert_eq!(imported.info.format_info.format, Format::R8G8B8A8Srgb);
        assert_eq!(imported.data, vec![9u8; 8 * 8 * 4]);
    }

    #[test]
    fn test_png_upscaled_replacement_keeps_its_size() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let scanner = ImportScanner::new(Arc::new(Registry::new()));
        let request = array_request(2, 2);
        let name = TextureName::for_request(&request);

        for slice in 0..2 {
            write_png(dir.path(), &name.slice_file_name(0, slice, "png"), 32, 16, 1);
            write_png(dir.path(), &name.slice_file_name(1, slice, "png"), 16, 8, 2);
        }

        let imported = scanner
            .try_import(&[dir.path().to_path_buf()], TextureHandle(1), &request)
            .expect("import");

        assert_eq!((imported.info.width, imported.info.height), (32, 16));
        assert_eq!((imported.info.depth_or_layers, imported.info.levels), (2, 2));
        assert_eq!(imported.data.len(), rgba8_size(32, 16, 1, 2, 2));
    }

    #[test]
    fn test_png_size_mismatch_truncates_to_complete_levels() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let scanner = ImportScanner::new(Arc::new(Registry::new()));
        let request = array_request(2, 2);
        let name = TextureName::for_request(&request);

        write_png(dir.path(), &name.slice_file_name(0, 0, "png"), 8, 8, 1);
        write_png(dir.path(), &name.slice_file_name(0, 1, "png"), 8, 8, 1);
        write_png(dir.path(), &name.slice_file_name(1, 0, "png"), 4, 4, 2);
        write_png(dir.path(), &name.slice_file_name(1, 1, "png"), 3, 4, 2);

        let imported = scanner
            .try_import(&[dir.path().to_path_buf()], TextureHandle(1), &request)
            .expect("import");

        assert_eq!((imported.info.depth_or_layers, imported.info.levels), (2, 1));
        assert_eq!(imported.data.len(), 2 * 8 * 8 * 4);
    }

    #[test]
    fn test_png_partial_top_level() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let scanner = ImportScanner::new(Arc::new(Registry::new()));
        let request = array_request(1, 3);
        let name = TextureName::for_request(&request);

        write_png(dir.path(), &name.slice_file_name(0, 0, "png"), 8, 8, 1);
        write_png(dir.path(), &name.slice_file_name(0, 1, "png"), 8, 8, 1);

        let imported = scanner
            .try_import(&[dir.path().to_path_buf()], TextureHandle(1), &request)
            .expect("import");

        assert_eq!((imported.info.depth_or_layers, imported.info.levels), (2, 1));
        assert_eq!(imported.data.len(), 2 * 8 * 8 * 4);
    }

    #[test]
    fn test_dds_bgra_is_swapped_and_srgb_follows_texture() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let registry = Arc::new(Registry::new());
        let scanner = ImportScanner::new(registry.clone());

        let request = TextureRequest::texture_2d(1, 1, Format::R8G8B8A8Srgb, vec![0; 4]);
        let file_name = TextureName::for_request(&request).file_name("dds");

        let parameters =
            ImageParameters::new(1, 1, 1, 1, ImageFormat::B8G8R8A8Unorm, ImageDimensions::Dim2D);
        let mut file = Vec::new();
        dds::save(&mut file, &parameters, &[10, 20, 30, 40]).expect("Failed to encode dds");
        fs::write(dir.path().join(&file_name), file).expect("Failed to write dds");

        let imported = scanner
            .try_import(&[dir.path().to_path_buf()], TextureHandle(5), &request)
            .expect("import");

        assert_eq!(imported.data, vec![30, 20, 10, 40]);
        assert_eq!(imported.info.format_info.format, Format::R8G8B8A8Srgb);
        assert_eq!(registry.association(&file_name), Some(TextureHandle(5)));
    }

    #[test]
    fn test_first_matching_directory_wins_even_if_broken() {
        let first = TempDir::new().expect("Failed to create temp directory");
        let second = TempDir::new().expect("Failed to create temp directory");
        let scanner = ImportScanner::new(Arc::new(Registry::new()));

        let request = TextureRequest::texture_2d(1, 1, Format::R8G8B8A8Unorm, vec![0; 4]);
        let file_name = TextureName::for_request(&request).file_name("dds");

        fs::write(first.path().join(&file_name), b"not a dds").expect("Failed to write");
        let parameters = ImageParameters::rgba8_2d(1, 1);
        let mut file = Vec::new();
        dds::save(&mut file, &parameters, &[1, 2, 3, 4]).expect("Failed to encode dds");
        fs::write(second.path().join(&file_name), file).expect("Failed to write dds");

        let directories = [first.path().to_path_buf(), second.path().to_path_buf()];
        assert!(scanner.try_import(&directories, TextureHandle(1), &request).is_none());

        let reversed = [second.path().to_path_buf(), first.path().to_path_buf()];
        assert!(scanner.try_import(&reversed, TextureHandle(1), &request).is_some());
    }

    #[test]
    fn test_dds_with_oversized_header_is_skipped() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let registry = Arc::new(Registry::new());
        let scanner = ImportScanner::new(registry.clone());

        let request = TextureRequest::texture_2d(4, 4, Format::R8G8B8A8Unorm, vec![0; 64]);
        let file_name = TextureName::for_request(&request).file_name("dds");

        let mut file = Vec::new();
        dds::save(&mut file, &ImageParameters::rgba8_2d(4, 4), &[0u8; 64]).expect("Failed to encode dds");
        file[12..16].copy_from_slice(&u32::MAX.to_le_bytes());
        file[16..20].copy_from_slice(&u32::MAX.to_le_bytes());
        fs::write(dir.path().join(&file_name), file).expect("Failed to write dds");

        let directories = [dir.path().to_path_buf()];
        assert!(scanner.try_import(&directories, TextureHandle(2), &request).is_none());
        // Still tracked so fixing the file reloads the texture
        assert_eq!(registry.association(&file_name), Some(TextureHandle(2)));
    }

    #[test]
    fn test_unsupported_format_touches_nothing() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let registry = Arc::new(Registry::new());
        let scanner = ImportScanner::new(registry.clone());

        let request = TextureRequest::texture_2d(4, 4, Format::Bc5Snorm, vec![0; 16]);
        let name = TextureName::for_request(&request);
        write_png(dir.path(), &name.slice_file_name(0, 0, "png"), 4, 4, 0);

        assert!(scanner
            .try_import(&[dir.path().to_path_buf()], TextureHandle(1), &request)
            .is_none());
        assert_eq!(registry.association_count(), 0);
    }
}
