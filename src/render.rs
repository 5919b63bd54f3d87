// src/render.rs
//! Оверлей сети поверх карты высот
//!
//! Рельеф рисуется в оттенках серого, объекты — цветными кругами:
//! вершины красным, седловины синим, стоки зелёным, отбракованные седловины серым.

use std::path::Path;

use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_filled_circle_mut;

use crate::datamap::DataMap;
use crate::error::Result;
use crate::feature::SurfaceNetwork;

const SUMMIT: Rgb<u8> = Rgb([220, 40, 40]);
const SADDLE: Rgb<u8> = Rgb([40, 90, 230]);
const RUNOFF: Rgb<u8> = Rgb([40, 190, 70]);
const DISQUALIFIED: Rgb<u8> = Rgb([150, 150, 150]);

/// Радиус круга: примерно 1/200 стороны карты, не меньше 1 пикселя
fn marker_radius(map: &DataMap) -> i32 {
    (map.width.max(map.height) / 200).max(1) as i32
}

/// Рисует оверлей в памяти
#[must_use]
pub fn overlay_image(map: &DataMap, network: &SurfaceNetwork) -> RgbImage {
    let mut img = DynamicImage::ImageLuma8(map.to_grayscale_image()).to_rgb8();
    let radius = marker_radius(map);

    // Отбракованные снизу, чтобы не закрывать живые объекты
    for (_, saddle) in network.saddles.iter().filter(|(_, s)| s.disqualified()) {
        draw_filled_circle_mut(&mut img, saddle.spot.coord(), radius, DISQUALIFIED);
    }
    for (_, saddle) in network.saddles.iter().filter(|(_, s)| !s.disqualified()) {
        let color = if saddle.is_runoff() { RUNOFF } else { SADDLE };
        draw_filled_circle_mut(&mut img, saddle.spot.coord(), radius, color);
    }
    for (_, summit) in network.summits.iter() {
        draw_filled_circle_mut(&mut img, summit.spot.coord(), radius, SUMMIT);
    }
    img
}

/// Сохраняет оверлей в PNG
pub fn render_overlay(
    map: &DataMap,
    network: &SurfaceNetwork,
    path: impl AsRef<Path>,
) -> Result<()> {
    overlay_image(map, network).save(path)?;
    Ok(())
}
