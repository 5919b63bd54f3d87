// src/config.rs
//! Конфигурация анализа
//!
//! Этот модуль определяет параметры, управляющие построением поверхностной сети:
//! - Источник растра (PNG 16 бит или сырой тайл i16) и единицы высот
//! - Географическая привязка сетки (широта/долгота верхнего левого угла)
//! - Пути для сохранения сети и оверлея
//! - Параметры синтетического рельефа (вместо загрузки файла)
//!
//! Все структуры поддерживают сериализацию в TOML/JSON для удобной настройки
//! через конфигурационные файлы.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::error::Result;

/// Формат входного растра
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum RasterFormat {
    /// Одноканальный 16-битный PNG, значение пикселя = высота
    #[default]
    Png16,
    /// Сырой little-endian i16 без заголовка (SRTM `.hgt`-подобные тайлы)
    RawI16,
}

/// Единицы высот во входном растре. Внутри всё хранится в метрах.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum ElevationUnit {
    #[default]
    Meters,
    Feet,
}

impl ElevationUnit {
    /// Множитель перевода в метры.
    ///
    /// ```
    /// use surfnet::config::ElevationUnit;
    /// assert_eq!(ElevationUnit::Meters.to_meters_factor(), 1.0);
    /// assert_eq!(ElevationUnit::Feet.to_meters_factor(), 0.3048);
    /// ```
    #[must_use]
    pub fn to_meters_factor(self) -> f32 {
        match self {
            ElevationUnit::Meters => 1.0,
            ElevationUnit::Feet => 0.3048,
        }
    }
}

/// Источник карты высот
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSettings {
    /// Путь к растру
    pub path: PathBuf,

    #[serde(default)]
    pub format: RasterFormat,

    /// Ширина тайла (только для `RawI16`; для PNG берётся из файла)
    #[serde(default)]
    pub width: usize,

    /// Высота тайла (только для `RawI16`)
    #[serde(default)]
    pub height: usize,

    #[serde(default)]
    pub units: ElevationUnit,

    /// Значение «нет данных» (пустоты не классифицируются и не проходятся)
    #[serde(default = "default_nodata")]
    pub nodata: f32,
}

fn default_nodata() -> f32 {
    -32768.0
}

/// Географическая привязка сетки
///
/// Клетка `(x, y)` лежит в точке `(north - y * cell_size_deg, west + x * cell_size_deg)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoSettings {
    /// Широта верхней строки
    #[serde(default)]
    pub north: f64,

    /// Долгота левого столбца
    #[serde(default)]
    pub west: f64,

    /// Размер клетки в градусах (по умолчанию 1 угловая секунда)
    #[serde(default = "default_cell_size_deg")]
    pub cell_size_deg: f64,
}

fn default_cell_size_deg() -> f64 {
    1.0 / 3600.0
}

impl Default for GeoSettings {
    fn default() -> Self {
        Self {
            north: 0.0,
            west: 0.0,
            cell_size_deg: default_cell_size_deg(),
        }
    }
}

/// Куда сохранять результат
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// JSON с поверхностной сетью
    #[serde(default = "default_network_path")]
    pub network: PathBuf,

    /// PNG с нанесёнными вершинами и седловинами (необязательно)
    #[serde(default)]
    pub overlay: Option<PathBuf>,
}

fn default_network_path() -> PathBuf {
    PathBuf::from("network.json")
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            network: default_network_path(),
            overlay: None,
        }
    }
}

/// Параметры синтетического рельефа
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyntheticSettings {
    /// Сид генератора (детерминированная генерация)
    pub seed: u64,

    #[serde(default = "default_synthetic_size")]
    pub width: usize,

    #[serde(default = "default_synthetic_size")]
    pub height: usize,

    /// Число октав фрактального шума
    #[serde(default = "default_octaves")]
    pub octaves: i32,

    #[serde(default = "default_frequency")]
    pub frequency: f32,

    /// Перепад высот в метрах между самой низкой и самой высокой точкой
    #[serde(default = "default_relief_m")]
    pub relief_m: f32,
}

fn default_synthetic_size() -> usize {
    256
}
fn default_octaves() -> i32 {
    4
}
fn default_frequency() -> f32 {
    0.02
}
fn default_relief_m() -> f32 {
    800.0
}

impl Default for SyntheticSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            width: default_synthetic_size(),
            height: default_synthetic_size(),
            octaves: default_octaves(),
            frequency: default_frequency(),
            relief_m: default_relief_m(),
        }
    }
}

/// Полная конфигурация одного прогона анализа
///
/// Должен быть задан либо `input`, либо `synthetic`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AnalysisParams {
    #[serde(default)]
    pub input: Option<InputSettings>,

    #[serde(default)]
    pub geo: GeoSettings,

    #[serde(default)]
    pub output: OutputSettings,

    #[serde(default)]
    pub synthetic: Option<SyntheticSettings>,
}

impl AnalysisParams {
    /// Загружает параметры из TOML-файла
    ///
    /// # Пример
    /// ```toml
    /// # analysis.toml
    /// [input]
    /// path = "N46W122.png"
    /// units = "Feet"
    ///
    /// [geo]
    /// north = 47.0
    /// west = -122.0
    /// ```
    pub fn from_toml_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let params: Self = toml::from_str(contents)?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_input_config() {
        let params = AnalysisParams::from_toml_str(
            r#"
            [input]
            path = "tile.hgt"
            format = "RawI16"
            width = 1201
            height = 1201
            units = "Feet"
            "#,
        )
        .unwrap();

        let input = params.input.unwrap();
        assert_eq!(input.format, RasterFormat::RawI16);
        assert_eq!(input.units, ElevationUnit::Feet);
        assert_eq!(input.nodata, -32768.0);
        assert_eq!(params.output.network, PathBuf::from("network.json"));
        assert!(params.synthetic.is_none());
    }

    #[test]
    fn synthetic_section_fills_defaults() {
        let params = AnalysisParams::from_toml_str(
            r"
            [synthetic]
            seed = 7
            width = 64
            ",
        )
        .unwrap();

        let synthetic = params.synthetic.unwrap();
        assert_eq!(synthetic.seed, 7);
        assert_eq!(synthetic.width, 64);
        assert_eq!(synthetic.height, 256);
        assert_eq!(synthetic.octaves, 4);
    }
}
