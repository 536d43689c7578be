//! Content addressed file names
//!
//! `<prefix>_<xxh3-128 hex>_<W>x<H>x<D>[_<level>x<slice>].<ext>`, where the
//! hash covers the raw texture bytes and `D` is depth times layers.

use xxhash_rust::xxh3::xxh3_128;

use crate::texture::TextureRequest;

/// Prefixes a valid name may start with
pub const NAME_PREFIXES: [&str; 6] = ["tex2d", "texa2d", "tex3d", "texcube", "texacube", "tex"];

/// Lowercase hex of the 128-bit content hash, high half first
pub fn content_hash(data: &[u8]) -> String {
    format!("{:032x}", xxh3_128(data))
}

/// Name parts shared by every file of one texture, hashed once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureName {
    prefix: &'static str,
    hash: String,
    width: u32,
    height: u32,
    depth_or_layers: u32,
}

impl TextureName {
    pub fn for_request(request: &TextureRequest) -> Self {
        Self {
            prefix: request.target.name_prefix(),
            hash: content_hash(&request.data),
            width: request.width,
            height: request.height,
            depth_or_layers: request.depth_or_layers(),
        }
    }

    /// Name of a whole-texture file
    pub fn file_name(&self, extension: &str) -> String {
        format!(
            "{}_{}_{}x{}x{}.{}",
            self.prefix, self.hash, self.width, self.height, self.depth_or_layers, extension
        )
    }

    /// Name of a single-slice file
    pub fn slice_file_name(&self, level: u32, slice: u32, extension: &str) -> String {
        format!(
            "{}_{}_{}x{}x{}_{}x{}.{}",
            self.prefix, self.hash, self.width, self.height, self.depth_or_layers, level, slice, extension
        )
    }
}

/// Parts of a name produced by [`TextureName`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFileName {
    pub prefix: String,
    pub hash: String,
    pub width: u32,
    pub height: u32,
    pub depth_or_layers: u32,
    /// `(level, slice)` for per-slice files
    pub slice: Option<(u32, u32)>,
    pub extension: String,
}

/// Recognise a cache file name, `None` for anything else
pub fn parse_file_name(name: &str) -> Option<ParsedFileName> {
    let (stem, extension) = name.rsplit_once('.')?;
    if extension != "dds" && extension != "png" {
        return None;
    }

    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }

    let prefix = parts[0];
    if !NAME_PREFIXES.contains(&prefix) {
        return None;
    }

    let hash = parts[1];
    if hash.len() != 32 || !hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return None;
    }

    let (width, height, depth_or_layers) = match parse_numbers(parts[2])?.as_slice() {
        [width, height, depth_or_layers] => (*width, *height, *depth_or_layers),
        _ => return None,
    };

    let slice = match parts.get(3) {
        Some(part) => match parse_numbers(part)?.as_slice() {
            [level, slice] => Some((*level, *slice)),
            _ => return None,
        },
        None => None,
    };

    Some(ParsedFileName {
        prefix: prefix.to_string(),
        hash: hash.to_string(),
        width,
        height,
        depth_or_layers,
        slice,
        extension: extension.to_string(),
    })
}

fn parse_numbers(part: &str) -> Option<Vec<u32>> {
    part.split('x').map(|number| number.parse().ok()).collect()
}
