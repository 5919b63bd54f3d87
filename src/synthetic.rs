// src/synthetic.rs
//! Синтетический рельеф для тестов и демонстрации
//!
//! Фрактальный шум OpenSimplex2 (FBm), растянутый на `relief_m` метров и
//! округлённый до целых метров: как и в реальных DEM, появляются плато.

use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::{GeoSettings, SyntheticSettings};
use crate::datamap::DataMap;
use crate::error::Result;

const NODATA: f32 = -32768.0;

/// Генерирует карту высот. Одинаковые настройки дают одинаковую карту.
pub fn generate(settings: &SyntheticSettings, geo: GeoSettings) -> Result<DataMap> {
    let mut rng = ChaCha8Rng::seed_from_u64(settings.seed);
    // Сдвиг окна выборки, чтобы соседние сиды не давали похожих карт
    let offset_x: f32 = rng.gen_range(-10_000.0..10_000.0);
    let offset_y: f32 = rng.gen_range(-10_000.0..10_000.0);

    let mut noise = FastNoiseLite::new();
    noise.set_seed(Some(rng.r#gen::<i32>()));
    noise.set_noise_type(Some(NoiseType::OpenSimplex2));
    noise.set_fractal_type(Some(FractalType::FBm));
    noise.set_fractal_octaves(Some(settings.octaves));
    noise.set_frequency(Some(settings.frequency));

    let width = settings.width;
    let relief = settings.relief_m;
    let sample = |i: usize| {
        let x = (i % width) as f32 + offset_x;
        let y = (i / width) as f32 + offset_y;
        let value = (noise.get_noise_2d(x, y) + 1.0) * 0.5;
        (value.clamp(0.0, 1.0) * relief).round()
    };

    let cells = settings.width * settings.height;
    #[cfg(feature = "parallel")]
    let data: Vec<f32> = (0..cells).into_par_iter().map(sample).collect();
    #[cfg(not(feature = "parallel"))]
    let data: Vec<f32> = (0..cells).map(sample).collect();

    log::debug!(
        "Синтетический рельеф {}×{} (сид {})",
        settings.width,
        settings.height,
        settings.seed
    );
    DataMap::new(settings.width, settings.height, data, NODATA, geo)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(seed: u64) -> SyntheticSettings {
        SyntheticSettings {
            seed,
            width: 48,
            height: 32,
            ..SyntheticSettings::default()
        }
    }

    #[test]
    fn same_seed_same_map() {
        let a = generate(&small(7), GeoSettings::default()).unwrap();
        let b = generate(&small(7), GeoSettings::default()).unwrap();
        let c = generate(&small(8), GeoSettings::default()).unwrap();
        assert_eq!(a.checksum(), b.checksum());
        assert_ne!(a.checksum(), c.checksum());
    }

    #[test]
    fn elevations_are_whole_meters_within_relief() {
        let settings = small(3);
        let map = generate(&settings, GeoSettings::default()).unwrap();
        for y in 0..map.height as i32 {
            for x in 0..map.width as i32 {
                let e = map.elevation(x, y).unwrap();
                assert_eq!(e, e.round());
                assert!((0.0..=settings.relief_m).contains(&e));
            }
        }
    }
}
