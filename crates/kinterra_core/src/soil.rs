use anyhow::Context;
use std::path::Path;

/// Read-only soil/grass bitmap. Soil cells are the only ones that grow crops.
///
/// The on-disk format is a flat row-major byte array of exactly
/// `width * height` entries, zero meaning grass; conventionally named
/// `is_soil_{width}_{height}.bin`. A missing or mis-sized file is a hard
/// init error.
#[derive(Debug, Clone)]
pub struct SoilMap {
    width: u16,
    height: u16,
    cells: Vec<bool>,
}

impl SoilMap {
    #[must_use]
    pub fn all_soil(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![true; width as usize * height as usize],
        }
    }

    pub fn from_bytes(width: u16, height: u16, bytes: &[u8]) -> anyhow::Result<Self> {
        let expected = width as usize * height as usize;
        anyhow::ensure!(
            bytes.len() == expected,
            "Soil map holds {} cells, expected {}x{}={}",
            bytes.len(),
            width,
            height,
            expected
        );
        Ok(Self {
            width,
            height,
            cells: bytes.iter().map(|&b| b != 0).collect(),
        })
    }

    pub fn load(path: &Path, width: u16, height: u16) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read soil map {}", path.display()))?;
        Self::from_bytes(width, height, &bytes)
    }

    /// Coordinates must already be wrapped into range.
    #[must_use]
    pub fn is_soil(&self, row: u16, col: u16) -> bool {
        self.cells[row as usize * self.width as usize + col as usize]
    }

    #[must_use]
    pub fn width(&self) -> u16 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u16 {
        self.height
    }
}
