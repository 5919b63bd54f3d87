// src/point.rs
//! Точки сетки и операции над наборами точек
//!
//! - `GridPoint` — клетка растра с высотой (x = столбец, y = строка)
//! - поиск ближайшей пары между двумя наборами
//! - разбиение набора на связные группы (для «высоких берегов» и краевых сегментов)

use std::cmp::Ordering;
use std::collections::VecDeque;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Клетка растра с высотой в метрах
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
    pub elevation: f32,
}

impl GridPoint {
    #[must_use]
    pub fn new(x: i32, y: i32, elevation: f32) -> Self {
        Self { x, y, elevation }
    }

    #[must_use]
    pub fn coord(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Сравнение только по высоте: координаты в упорядочивании не участвуют.
    #[must_use]
    pub fn cmp_elevation(&self, other: &Self) -> Ordering {
        self.elevation.total_cmp(&other.elevation)
    }

    /// Квадрат евклидова расстояния в клетках
    #[must_use]
    pub fn dist2(&self, other: &Self) -> i64 {
        dist2((self.x, self.y), (other.x, other.y))
    }

    /// Соседство по 8 направлениям (сама точка соседом не считается)
    #[must_use]
    pub fn touches(&self, other: &Self) -> bool {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        dx <= 1 && dy <= 1 && (dx, dy) != (0, 0)
    }
}

#[must_use]
pub fn dist2(a: (i32, i32), b: (i32, i32)) -> i64 {
    let dx = i64::from(a.0 - b.0);
    let dy = i64::from(a.1 - b.1);
    dx * dx + dy * dy
}

/// Целочисленная середина отрезка
#[must_use]
pub fn midpoint(a: (i32, i32), b: (i32, i32)) -> (i32, i32) {
    ((a.0 + b.0).div_euclid(2), (a.1 + b.1).div_euclid(2))
}

/// Самая высокая точка набора; при равенстве — первая встреченная.
#[must_use]
pub fn highest(points: &[GridPoint]) -> Option<&GridPoint> {
    points.iter().fold(None, |best: Option<&GridPoint>, p| match best {
        Some(b) if p.cmp_elevation(b) != Ordering::Greater => Some(b),
        _ => Some(p),
    })
}

/// Точка набора, ближайшая к `target`; при равенстве — первая встреченная.
#[must_use]
pub fn closest_to(points: &[GridPoint], target: (i32, i32)) -> Option<&GridPoint> {
    points.iter().fold(None, |best: Option<&GridPoint>, p| match best {
        Some(b) if dist2(b.coord(), target) <= dist2(p.coord(), target) => Some(b),
        _ => Some(p),
    })
}

/// Ближайшая пара точек между двумя наборами перебором.
///
/// Возвращает `(точка из a, точка из b, квадрат расстояния)`; при равенстве расстояний
/// выигрывает первая найденная пара.
#[must_use]
pub fn nearest_pair(a: &[GridPoint], b: &[GridPoint]) -> Option<(GridPoint, GridPoint, i64)> {
    let mut best: Option<(GridPoint, GridPoint, i64)> = None;
    for pa in a {
        for pb in b {
            let d = pa.dist2(pb);
            if best.is_none_or(|(_, _, bd)| d < bd) {
                best = Some((*pa, *pb, d));
            }
        }
    }
    best
}

/// Разбивает точки на связные группы.
///
/// Связность — 8 соседей, дополнительно отфильтрованная предикатом `linked`.
/// Группы упорядочены по первой точке во входном порядке, точки внутри группы
/// сохраняют входной порядок.
pub fn group_connected<F>(points: &[GridPoint], linked: F) -> Vec<Vec<GridPoint>>
where
    F: Fn(&GridPoint, &GridPoint) -> bool,
{
    let index: FxHashMap<(i32, i32), usize> = points
        .iter()
        .enumerate()
        .map(|(i, p)| (p.coord(), i))
        .collect();
    let mut group_of = vec![usize::MAX; points.len()];
    let mut groups: Vec<Vec<usize>> = Vec::new();

    for start in 0..points.len() {
        if group_of[start] != usize::MAX {
            continue;
        }
        let gid = groups.len();
        let mut members = vec![start];
        group_of[start] = gid;
        let mut queue = VecDeque::from([start]);

        while let Some(i) = queue.pop_front() {
            let p = &points[i];
            for dy in -1..=1 {
                for dx in -1..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let Some(&j) = index.get(&(p.x + dx, p.y + dy)) else {
                        continue;
                    };
                    if group_of[j] == usize::MAX && linked(p, &points[j]) {
                        group_of[j] = gid;
                        members.push(j);
                        queue.push_back(j);
                    }
                }
            }
        }
        members.sort_unstable();
        groups.push(members);
    }

    groups
        .into_iter()
        .map(|g| g.into_iter().map(|i| points[i]).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i32, y: i32, e: f32) -> GridPoint {
        GridPoint::new(x, y, e)
    }

    #[test]
    fn highest_prefers_first_on_ties() {
        let points = [p(0, 0, 5.0), p(1, 0, 9.0), p(2, 0, 9.0)];
        assert_eq!(highest(&points).unwrap().coord(), (1, 0));
        assert!(highest(&[]).is_none());
    }

    #[test]
    fn nearest_pair_finds_minimum_distance() {
        let a = [p(0, 0, 1.0), p(5, 5, 1.0)];
        let b = [p(9, 9, 1.0), p(6, 7, 1.0)];
        let (pa, pb, d) = nearest_pair(&a, &b).unwrap();
        assert_eq!(pa.coord(), (5, 5));
        assert_eq!(pb.coord(), (6, 7));
        assert_eq!(d, 5);
    }

    #[test]
    fn grouping_splits_on_gaps_and_respects_predicate() {
        let points = [p(0, 0, 1.0), p(1, 1, 1.0), p(4, 0, 1.0)];
        let groups = group_connected(&points, |_, _| true);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 2);

        let orthogonal_only = group_connected(&points, |a, b| a.x == b.x || a.y == b.y);
        assert_eq!(orthogonal_only.len(), 3);
    }

    #[test]
    fn midpoint_rounds_down() {
        assert_eq!(midpoint((1, 1), (4, 2)), (2, 1));
        assert_eq!(midpoint((3, 3), (3, 3)), (3, 3));
    }
}
