// src/datamap.rs
//! Карта высот: доступ к клеткам, соседям и географической привязке
//!
//! Все высоты хранятся в метрах. Клетки со значением `nodata` считаются пустотами:
//! у них нет высоты, они не классифицируются и не проходятся при подъёме.

use std::fs::File;
use std::hash::Hasher;
use std::io::Read;
use std::path::Path;

use image::{ImageBuffer, Luma};
use rustc_hash::FxHasher;

use crate::config::{ElevationUnit, GeoSettings};
use crate::error::{Result, SurfaceError};
use crate::point::GridPoint;

/// Восемь направлений по часовой стрелке от северо-запада, `(dx, dy)`.
///
/// Порядок фиксирован: при равных высотах подъём выбирает первого соседа в этом порядке.
pub const FULL_DIRECTIONS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
];

pub const ORTHOGONAL_DIRECTIONS: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

pub const DIAGONAL_DIRECTIONS: [(i32, i32); 4] = [(-1, -1), (1, -1), (1, 1), (-1, 1)];

const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Сосед клетки. `elevation == None` — за пределами карты или пустота.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub x: i32,
    pub y: i32,
    pub elevation: Option<f32>,
}

impl Neighbor {
    #[must_use]
    pub fn point(&self) -> Option<GridPoint> {
        self.elevation.map(|e| GridPoint::new(self.x, self.y, e))
    }
}

/// Растр высот с географической привязкой
#[derive(Debug, Clone)]
pub struct DataMap {
    pub width: usize,
    pub height: usize,
    pub geo: GeoSettings,
    nodata: f32,
    data: Vec<f32>,
}

impl DataMap {
    pub fn new(
        width: usize,
        height: usize,
        data: Vec<f32>,
        nodata: f32,
        geo: GeoSettings,
    ) -> Result<Self> {
        if width == 0 || height == 0 || data.len() != width * height {
            return Err(SurfaceError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            geo,
            nodata,
            data,
        })
    }

    /// Построчная сборка (удобно в тестах). Высоты — в метрах.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != width) {
            return Err(SurfaceError::InvalidDimensions { width, height });
        }
        let data = rows.into_iter().flatten().collect();
        Self::new(width, height, data, -32768.0, GeoSettings::default())
    }

    /// Загружает 16-битный одноканальный PNG
    pub fn load_png16(
        path: impl AsRef<Path>,
        units: ElevationUnit,
        nodata: f32,
        geo: GeoSettings,
    ) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Загрузка PNG: {}", path.display());
        let img = image::open(path)?.into_luma16();
        let (width, height) = (img.width() as usize, img.height() as usize);
        let data = img
            .into_raw()
            .into_iter()
            .map(|v| normalize(f32::from(v), units, nodata))
            .collect();
        Self::new(width, height, data, nodata, geo)
    }

    /// Загружает сырой тайл little-endian i16
    pub fn load_raw_i16(
        path: impl AsRef<Path>,
        width: usize,
        height: usize,
        units: ElevationUnit,
        nodata: f32,
        geo: GeoSettings,
    ) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Загрузка тайла i16: {}", path.display());
        let mut buffer = Vec::new();
        File::open(path)?.read_to_end(&mut buffer)?;

        if buffer.len() != width * height * 2 {
            return Err(SurfaceError::InvalidDimensions { width, height });
        }
        let data = buffer
            .chunks_exact(2)
            .map(|c| normalize(f32::from(i16::from_le_bytes([c[0], c[1]])), units, nodata))
            .collect();
        Self::new(width, height, data, nodata, geo)
    }

    #[must_use]
    pub fn nodata(&self) -> f32 {
        self.nodata
    }

    #[must_use]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Высота клетки или `nodata`, если клетка за пределами карты.
    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> f32 {
        if self.in_bounds(x, y) {
            self.data[y as usize * self.width + x as usize]
        } else {
            self.nodata
        }
    }

    /// Высота клетки, `None` для пустот и клеток вне карты.
    #[must_use]
    pub fn elevation(&self, x: i32, y: i32) -> Option<f32> {
        let e = self.get(x, y);
        (self.in_bounds(x, y) && e != self.nodata).then_some(e)
    }

    #[must_use]
    pub fn point(&self, x: i32, y: i32) -> Option<GridPoint> {
        self.elevation(x, y).map(|e| GridPoint::new(x, y, e))
    }

    fn neighbors<'a>(
        &'a self,
        x: i32,
        y: i32,
        directions: &'a [(i32, i32)],
    ) -> impl Iterator<Item = Neighbor> + 'a {
        directions.iter().map(move |&(dx, dy)| Neighbor {
            x: x + dx,
            y: y + dy,
            elevation: self.elevation(x + dx, y + dy),
        })
    }

    /// Все 8 соседей в порядке `FULL_DIRECTIONS`
    pub fn iterate_full(&self, x: i32, y: i32) -> impl Iterator<Item = Neighbor> + '_ {
        self.neighbors(x, y, &FULL_DIRECTIONS)
    }

    pub fn iterate_orthogonal(&self, x: i32, y: i32) -> impl Iterator<Item = Neighbor> + '_ {
        self.neighbors(x, y, &ORTHOGONAL_DIRECTIONS)
    }

    pub fn iterate_diagonal(&self, x: i32, y: i32) -> impl Iterator<Item = Neighbor> + '_ {
        self.neighbors(x, y, &DIAGONAL_DIRECTIONS)
    }

    #[must_use]
    pub fn is_map_edge(&self, x: i32, y: i32) -> bool {
        x == 0 || y == 0 || x as usize == self.width - 1 || y as usize == self.height - 1
    }

    /// Четыре угла карты: СЗ, СВ, ЮВ, ЮЗ
    #[must_use]
    pub fn corners(&self) -> [(i32, i32); 4] {
        let (w, h) = (self.width as i32 - 1, self.height as i32 - 1);
        [(0, 0), (w, 0), (w, h), (0, h)]
    }

    /// Позиция граничной клетки при обходе края по часовой стрелке от угла (0, 0).
    ///
    /// Для внутренних клеток значение не определено.
    #[must_use]
    pub fn boundary_position(&self, x: i32, y: i32) -> i64 {
        let (w, h) = (self.width as i64 - 1, self.height as i64 - 1);
        let (x, y) = (i64::from(x), i64::from(y));
        if y == 0 {
            x
        } else if x == w {
            w + y
        } else if y == h {
            w + h + (w - x)
        } else {
            2 * w + h + (h - y)
        }
    }

    #[must_use]
    pub fn xy_to_latlon(&self, x: i32, y: i32) -> (f64, f64) {
        (
            self.geo.north - f64::from(y) * self.geo.cell_size_deg,
            self.geo.west + f64::from(x) * self.geo.cell_size_deg,
        )
    }

    #[must_use]
    pub fn latlon_to_xy(&self, latitude: f64, longitude: f64) -> (i32, i32) {
        (
            ((longitude - self.geo.west) / self.geo.cell_size_deg).round() as i32,
            ((self.geo.north - latitude) / self.geo.cell_size_deg).round() as i32,
        )
    }

    /// Расстояние по большому кругу между двумя клетками, в метрах
    #[must_use]
    pub fn distance(&self, a: (i32, i32), b: (i32, i32)) -> f64 {
        let (lat1, lon1) = self.xy_to_latlon(a.0, a.1);
        let (lat2, lon2) = self.xy_to_latlon(b.0, b.1);
        let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
        let dphi = (lat2 - lat1).to_radians();
        let dlambda = (lon2 - lon1).to_radians();
        let h = (dphi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * h.sqrt().asin()
    }

    /// Контрольная сумма размеров, привязки и высот.
    ///
    /// Сохранённая сеть хранит её, чтобы не загрузить сеть поверх чужой карты.
    #[must_use]
    pub fn checksum(&self) -> String {
        let mut hasher = FxHasher::default();
        hasher.write_usize(self.width);
        hasher.write_usize(self.height);
        hasher.write_u64(self.geo.north.to_bits());
        hasher.write_u64(self.geo.west.to_bits());
        hasher.write_u64(self.geo.cell_size_deg.to_bits());
        hasher.write_u32(self.nodata.to_bits());
        for v in &self.data {
            hasher.write_u32(v.to_bits());
        }
        format!("{:016x}", hasher.finish())
    }

    /// Диапазон высот без учёта пустот
    #[must_use]
    pub fn elevation_range(&self) -> Option<(f32, f32)> {
        self.data
            .iter()
            .filter(|&&v| v != self.nodata)
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Высоты в оттенках серого (пустоты — чёрные)
    #[must_use]
    pub fn to_grayscale_image(&self) -> ImageBuffer<Luma<u8>, Vec<u8>> {
        let (lo, hi) = self.elevation_range().unwrap_or((0.0, 1.0));
        let span = (hi - lo).max(f32::EPSILON);
        let pixels = self
            .data
            .iter()
            .map(|&v| {
                if v == self.nodata {
                    0
                } else {
                    (((v - lo) / span).clamp(0.0, 1.0) * 254.0) as u8 + 1
                }
            })
            .collect();
        ImageBuffer::from_raw(self.width as u32, self.height as u32, pixels)
            .unwrap_or_else(|| ImageBuffer::new(self.width as u32, self.height as u32))
    }
}

fn normalize(raw: f32, units: ElevationUnit, nodata: f32) -> f32 {
    if raw == nodata {
        raw
    } else {
        raw * units.to_meters_factor()
    }
}
