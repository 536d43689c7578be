//! Texture snapshots and the GPU layer seam
//!
//! Texture data is stored level-major: every slice of level 0, then every
//! slice of level 1 and so on. A 3D texture has `max(1, depth >> level)`
//! slices per level, anything else has `layers` slices per level.

use crate::format::{Format, Target};

/// Non-owning key into the GPU layer's texture table.
///
/// The GPU layer decides what the number means; this crate only stores it
/// and hands it back on reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u64);

/// Callback into the GPU layer used by the reload watcher
pub trait TextureReloader: Send + Sync {
    /// Ask the GPU layer to run import again for `handle` the next time it is bound
    fn force_reimport(&self, handle: TextureHandle);
}

/// Immutable snapshot of one texture, owned by a single export or import call
#[derive(Debug, Clone)]
pub struct TextureRequest {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub layers: u32,
    pub levels: u32,
    pub format: Format,
    pub target: Target,
    pub data: Vec<u8>,
}

impl TextureRequest {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        width: u32,
        height: u32,
        depth: u32,
        layers: u32,
        levels: u32,
        format: Format,
        target: Target,
        data: Vec<u8>,
    ) -> Self {
        Self {
            width,
            height,
            depth,
            layers,
            levels,
            format,
            target,
            data,
        }
    }

    /// Single level, single layer 2D texture
    pub fn texture_2d(width: u32, height: u32, format: Format, data: Vec<u8>) -> Self {
        Self::new(width, height, 1, 1, 1, format, Target::Texture2D, data)
    }

    pub fn is_3d(&self) -> bool {
        self.depth > 1
    }

    /// Depth times layers, the `D` of the file name
    pub fn depth_or_layers(&self) -> u32 {
        self.depth * self.layers
    }

    /// Walk every mip level and slice in canonical order, RGBA8 layout
    pub fn rgba8_slices(&self) -> SliceIter {
        SliceIter::new(self.width, self.height, self.depth, self.layers, self.levels)
    }

    /// Walk every mip level and slice in canonical order in the native format
    pub fn native_slices(&self) -> impl Iterator<Item = Slice> + '_ {
        let format = self.format;
        let mut offset = 0;
        LevelIter::new(self.width, self.height, self.depth, self.layers, self.levels).flat_map(
            move |level| {
                let size = format.slice_size(level.width as usize, level.height as usize);
                let slices = (0..level.slices)
                    .map(|index| {
                        let slice = Slice {
                            level: level.level,
                            index,
                            width: level.width,
                            height: level.height,
                            offset,
                            size,
                        };
                        offset += size;
                        slice
                    })
                    .collect::<Vec<_>>();
                slices
            },
        )
    }
}

/// Size of a level-major RGBA8 buffer for the given shape
pub fn rgba8_size(width: u32, height: u32, depth: u32, layers: u32, levels: u32) -> usize {
    LevelIter::new(width, height, depth, layers, levels)
        .map(|level| level.width as usize * level.height as usize * 4 * level.slices as usize)
        .sum()
}

/// One mip level of a texture shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Level {
    pub level: u32,
    pub width: u32,
    pub height: u32,
    pub slices: u32,
}

/// Iterator over the mip levels of a texture shape
#[derive(Debug, Clone)]
pub struct LevelIter {
    width: u32,
    height: u32,
    depth: u32,
    layers: u32,
    levels: u32,
    next: u32,
}

impl LevelIter {
    pub fn new(width: u32, height: u32, depth: u32, layers: u32, levels: u32) -> Self {
        Self {
            width,
            height,
            depth,
            layers,
            levels,
            next: 0,
        }
    }
}

impl Iterator for LevelIter {
    type Item = Level;

    fn next(&mut self) -> Option<Level> {
        if self.next >= self.levels {
            return None;
        }

        let level = self.next;
        self.next += 1;

        let slices = if self.depth > 1 {
            mip_extent(self.depth, level)
        } else {
            self.layers
        };

        Some(Level {
            level,
            width: mip_extent(self.width, level),
            height: mip_extent(self.height, level),
            slices,
        })
    }
}

/// One (level, slice) unit and where it lives in a level-major buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slice {
    pub level: u32,
    pub index: u32,
    pub width: u32,
    pub height: u32,
    pub offset: usize,
    pub size: usize,
}

/// Iterator over RGBA8 slices, level-major then slice-minor
#[derive(Debug, Clone)]
pub struct SliceIter {
    levels: LevelIter,
    current: Option<Level>,
    index: u32,
    offset: usize,
}

impl SliceIter {
    pub fn new(width: u32, height: u32, depth: u32, layers: u32, levels: u32) -> Self {
        Self {
            levels: LevelIter::new(width, height, depth, layers, levels),
            current: None,
            index: 0,
            offset: 0,
        }
    }
}

impl Iterator for SliceIter {
    type Item = Slice;

    fn next(&mut self) -> Option<Slice> {
        loop {
            match self.current {
                Some(level) if self.index < level.slices => {
                    let size = level.width as usize * level.height as usize * 4;
                    let slice = Slice {
                        level: level.level,
                        index: self.index,
                        width: level.width,
                        height: level.height,
                        offset: self.offset,
                        size,
                    };
                    self.index += 1;
                    self.offset += size;
                    return Some(slice);
                }
                _ => {
                    self.current = Some(self.levels.next()?);
                    self.index = 0;
                }
            }
        }
    }
}

/// Extent of a dimension at a mip level, never below one
pub fn mip_extent(size: u32, level: u32) -> u32 {
    size.checked_shr(level).unwrap_or(0).max(1)
}
