// src/discovery/prescan.rs
//! Предварительный проход по клеткам
//!
//! Большинство клеток растра — обычный склон: ровно одна группа более высоких
//! соседей, нет соседей той же высоты, не на краю. Такие клетки не порождают
//! ни вершин, ни седловин, и основной проход их пропускает. Проверка каждой
//! клетки независима, поэтому с фичей `parallel` она выполняется через rayon.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::datamap::DataMap;

/// Число групп более высоких соседей одиночной клетки при обходе кольца соседей.
///
/// Соседи без данных считаются не более высокими.
#[must_use]
pub fn ring_high_groups(map: &DataMap, x: i32, y: i32, elevation: f32) -> usize {
    let higher: Vec<bool> = map
        .iterate_full(x, y)
        .map(|n| n.elevation.is_some_and(|e| e > elevation))
        .collect();
    if higher.iter().all(|&h| h) {
        return 1;
    }
    (0..higher.len())
        .filter(|&i| higher[i] && !higher[(i + higher.len() - 1) % higher.len()])
        .count()
}

fn is_slope(map: &DataMap, x: i32, y: i32) -> bool {
    let Some(elevation) = map.elevation(x, y) else {
        return false;
    };
    !map.is_map_edge(x, y)
        && map.iterate_full(x, y).all(|n| n.elevation != Some(elevation))
        && ring_high_groups(map, x, y, elevation) == 1
}

/// Маска клеток, которые основному проходу нужно классифицировать.
///
/// `false` — обычный склон или пустота.
#[must_use]
pub fn cells_to_classify(map: &DataMap) -> Vec<bool> {
    let width = map.width;
    let classify = |i: usize| {
        let (x, y) = ((i % width) as i32, (i / width) as i32);
        map.elevation(x, y).is_some() && !is_slope(map, x, y)
    };

    #[cfg(feature = "parallel")]
    let mask = (0..map.width * map.height)
        .into_par_iter()
        .map(classify)
        .collect();
    #[cfg(not(feature = "parallel"))]
    let mask = (0..map.width * map.height).map(classify).collect();

    mask
}
