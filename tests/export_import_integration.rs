// End to end behaviour of the disk texture storage: dump through the
// export queue, then import the files back from the same directory.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use disk_texture_storage::codec::{CodecBridge, CodecResult, PixelCodec};
use disk_texture_storage::container::png;
use disk_texture_storage::hot_reload::{ReloadHandler, ReloadOutcome};
use disk_texture_storage::persistence::{content_hash, TextureName};
use disk_texture_storage::texture::rgba8_size;
use disk_texture_storage::{
    DiskTextureConfig, DiskTextureStorage, Format, OutputFormat, Target, TextureHandle,
    TextureReloader, TextureRequest,
};
use tempfile::TempDir;

#[derive(Default)]
struct CountingReloader {
    calls: AtomicUsize,
}

impl TextureReloader for CountingReloader {
    fn force_reimport(&self, _handle: TextureHandle) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct CountingCodec {
    calls: AtomicUsize,
}

impl PixelCodec for CountingCodec {
    fn decode_to_rgba8(&self, request: &TextureRequest) -> CodecResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        CodecBridge.decode_to_rgba8(request)
    }
}

fn dump_config(dir: &Path, output_format: OutputFormat) -> DiskTextureConfig {
    DiskTextureConfig {
        output_directory: Some(dir.to_path_buf()),
        enable_dump: true,
        output_format,
        ..DiskTextureConfig::default()
    }
}

fn create_storage(dir: &Path, output_format: OutputFormat) -> DiskTextureStorage {
    DiskTextureStorage::new(dump_config(dir, output_format), Arc::new(CountingReloader::default()))
        .expect("Failed to create disk texture storage")
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("Failed to list output directory")
        .map(|entry| entry.expect("Failed to read entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_all_zero_texture_png_dump_and_reimport() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let storage = create_storage(dir.path(), OutputFormat::Png);

    let data = vec![0u8; 64 * 64 * 4];
    let request = TextureRequest::texture_2d(64, 64, Format::R8G8B8A8Unorm, data.clone());

    storage.enqueue_export(TextureHandle(1), request.clone());
    storage.flush_exports();

    let expected = format!("tex2d_{}_64x64x1_0x0.png", content_hash(&data));
    assert_eq!(file_names(dir.path()), vec![expected.clone()]);

    let file = fs::read(dir.path().join(&expected)).expect("Failed to read dumped png");
    let header = png::load_header(&file).expect("Failed to read png header");
    assert_eq!((header.width, header.height), (64, 64));
    let mut pixels = vec![0xffu8; 64 * 64 * 4];
    png::load_data(&file, &mut pixels).expect("Failed to decode png");
    assert!(pixels.iter().all(|&byte| byte == 0));

    let imported = storage
        .try_import(TextureHandle(1), &request)
        .expect("Dumped texture should import");
    assert_eq!(
        (imported.info.width, imported.info.height, imported.info.depth_or_layers, imported.info.levels),
        (64, 64, 1, 1)
    );
    assert_eq!(imported.info.format_info.format, Format::R8G8B8A8Unorm);
    assert_eq!(imported.data, data);

    // Same bytes bound as an sRGB texture keep the sRGB flavour
    let srgb = TextureRequest::texture_2d(64, 64, Format::R8G8B8A8Srgb, data);
    let imported = storage
        .try_import(TextureHandle(2), &srgb)
        .expect("Dumped texture should import");
    assert_eq!(imported.info.format_info.format, Format::R8G8B8A8Srgb);
}

#[test]
fn test_dds_round_trip_keeps_shape_and_format() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let storage = create_storage(dir.path(), OutputFormat::Dds);

    // 8x8, 4x4 and 2x2 levels: 4 + 1 + 1 blocks
    let data: Vec<u8> = (0..48).map(|i| (i * 5) as u8).collect();
    let request = TextureRequest::new(8, 8, 1, 1, 3, Format::Bc1RgbaSrgb, Target::Texture2D, data.clone());

    storage.enqueue_export(TextureHandle(3), request.clone());
    storage.flush_exports();

    let imported = storage
        .try_import(TextureHandle(3), &request)
        .expect("Dumped texture should import");

    assert_eq!(
        (imported.info.width, imported.info.height, imported.info.depth_or_layers, imported.info.levels),
        (8, 8, 1, 3)
    );
    assert_eq!(imported.info.format_info.format, Format::Bc1RgbaSrgb);
    assert_eq!(imported.data, data);
}

#[test]
fn test_dds_cubemap_with_mips_round_trips_layout() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let storage = create_storage(dir.path(), OutputFormat::Dds);

    let size = rgba8_size(4, 4, 1, 6, 2);
    let data: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
    let request = TextureRequest::new(4, 4, 1, 6, 2, Format::R8G8B8A8Unorm, Target::Cubemap, data.clone());

    storage.enqueue_export(TextureHandle(4), request.clone());
    storage.flush_exports();

    let imported = storage
        .try_import(TextureHandle(4), &request)
        .expect("Dumped cubemap should import");

    assert_eq!((imported.info.depth_or_layers, imported.info.levels), (6, 2));
    assert_eq!(imported.data, data);
}

#[test]
fn test_converted_formats_import_as_rgba8() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let storage = create_storage(dir.path(), OutputFormat::Dds);

    // Opaque white in A1B5G5R5
    let request = TextureRequest::texture_2d(2, 2, Format::A1B5G5R5Unorm, 0xffffu16.to_le_bytes().repeat(4));

    storage.enqueue_export(TextureHandle(5), request.clone());
    storage.flush_exports();

    let imported = storage
        .try_import(TextureHandle(5), &request)
        .expect("Converted texture should import");
    assert_eq!(imported.info.format_info.format, Format::R8G8B8A8Unorm);
    assert_eq!(imported.data, vec![0xff; 16]);
}

#[test]
fn test_png_rescan_is_idempotent() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let storage = create_storage(dir.path(), OutputFormat::Png);

    let size = rgba8_size(8, 8, 1, 2, 3);
    let request = TextureRequest::new(8, 8, 1, 2, 3, Format::R8G8B8A8Unorm, Target::Texture2DArray, vec![7; size]);

    storage.enqueue_export(TextureHandle(6), request.clone());
    storage.flush_exports();
    assert_eq!(file_names(dir.path()).len(), 6);

    let first = storage.try_import(TextureHandle(6), &request).expect("First scan");
    let second = storage.try_import(TextureHandle(6), &request).expect("Second scan");

    assert_eq!((first.info.depth_or_layers, first.info.levels), (2, 3));
    assert_eq!(first, second);
}

#[test]
fn test_missing_second_level_imports_single_level() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let storage = create_storage(dir.path(), OutputFormat::Png);

    let size = rgba8_size(16, 16, 1, 1, 2);
    let request = TextureRequest::new(16, 16, 1, 1, 2, Format::R8G8B8A8Unorm, Target::Texture2D, vec![1; size]);

    storage.enqueue_export(TextureHandle(7), request.clone());
    storage.flush_exports();

    let name = TextureName::for_request(&request);
    fs::remove_file(dir.path().join(name.slice_file_name(1, 0, "png"))).expect("Failed to remove level 1");

    let imported = storage
        .try_import(TextureHandle(7), &request)
        .expect("Level 0 alone should import");
    assert_eq!(imported.info.levels, 1);
    assert_eq!(imported.data.len(), 16 * 16 * 4);
}

#[test]
fn test_own_export_does_not_trigger_reload() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let storage = create_storage(dir.path(), OutputFormat::Dds);
    let reloader = Arc::new(CountingReloader::default());
    let handler = ReloadHandler::new(storage.registry().clone(), reloader.clone(), &DiskTextureConfig::default());

    let request = TextureRequest::texture_2d(4, 4, Format::R8G8B8A8Unorm, vec![2; 64]);
    storage.enqueue_export(TextureHandle(8), request.clone());
    storage.flush_exports();

    let path = storage
        .output_directory()
        .expect("Output directory should be set")
        .join(TextureName::for_request(&request).file_name("dds"));
    assert!(path.is_file());

    assert_eq!(handler.handle_change(&path), ReloadOutcome::SelfWrite);
    assert_eq!(reloader.calls.load(Ordering::SeqCst), 0);

    // Once the texture is gone its files no longer reload anything
    storage.release_texture(TextureHandle(8));
    assert_eq!(handler.handle_change(&path), ReloadOutcome::Untracked);
}

#[test]
fn test_bc5_has_no_side_effects() {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let codec = Arc::new(CountingCodec::default());

    for output_format in [OutputFormat::Png, OutputFormat::Dds] {
        let storage = DiskTextureStorage::with_codec(
            dump_config(dir.path(), output_format),
            Arc::new(CountingReloader::default()),
            codec.clone(),
        )
        .expect("Failed to create disk texture storage");

        let request = TextureRequest::texture_2d(8, 8, Format::Bc5Unorm, vec![0; 64]);
        storage.enqueue_export(TextureHandle(9), request.clone());
        storage.flush_exports();

        assert!(storage.try_import(TextureHandle(9), &request).is_none());
        assert_eq!(storage.registry().association_count(), 0);
    }

    assert_eq!(codec.calls.load(Ordering::SeqCst), 0);
    assert!(file_names(dir.path()).is_empty());
}

#[test]
fn test_input_directory_replacement_is_found() {
    let output = TempDir::new().expect("Failed to create temp directory");
    let mods = TempDir::new().expect("Failed to create temp directory");

    let storage = DiskTextureStorage::new(
        DiskTextureConfig {
            output_directory: Some(output.path().to_path_buf()),
            input_directories: vec![mods.path().to_path_buf()],
            ..DiskTextureConfig::default()
        },
        Arc::new(CountingReloader::default()),
    )
    .expect("Failed to create disk texture storage");

    let request = TextureRequest::texture_2d(2, 2, Format::Bc3Unorm, vec![0; 16]);
    let file_name = TextureName::for_request(&request).slice_file_name(0, 0, "png");

    let mut file = Vec::new();
    png::save(&mut file, 4, 4, &[200u8; 64]).expect("Failed to encode png");
    fs::write(mods.path().join(&file_name), file).expect("Failed to write replacement");

    let imported = storage
        .try_import(TextureHandle(10), &request)
        .expect("Replacement should import");

    assert_eq!((imported.info.width, imported.info.height), (4, 4));
    assert_eq!(imported.info.format_info.format, Format::R8G8B8A8Unorm);
    assert_eq!(storage.registry().association(&file_name), Some(TextureHandle(10)));
}
