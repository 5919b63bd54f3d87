// src/discovery/mod.rs
//! Поиск объектов поверхностной сети
//!
//! Один построчный проход по растру. Каждая ещё не исследованная клетка (или всё
//! плато, которому она принадлежит) классифицируется по периметру:
//!
//! - нет более высоких соседей → вершина;
//! - две и более несвязных групп более высоких соседей («высоких берегов») → седловина;
//! - объект на краю карты дополнительно проходит разбор в [`edge`], который может
//!   добавить стоки.
//!
//! После прохода седловины перестраиваются: у двусторонней выбирается положение
//! между берегами, многосторонняя разбивается на двусторонние ([`splitter`]).

pub mod edge;
pub mod plateau;
pub mod prescan;
pub mod splitter;

use rustc_hash::FxHashSet;

use crate::datamap::DataMap;
use crate::feature::{Saddle, SpotElevation, Summit, SurfaceNetwork};
use crate::point::{GridPoint, closest_to, group_connected, midpoint, nearest_pair};
use crate::timing::Timed;

use plateau::{Explored, ExploredMap, fill_plateau};

/// Клетка или плато вместе с окружением
#[derive(Debug, Clone)]
pub struct FeatureShape {
    pub elevation: f32,
    pub members: Vec<GridPoint>,
    /// Все соседи объекта с данными (выше и ниже), без повторов
    pub perimeter: Vec<GridPoint>,
    pub high_shores: Vec<Vec<GridPoint>>,
    pub edge: bool,
}

impl FeatureShape {
    /// Собирает объект из уже найденных клеток
    #[must_use]
    pub fn from_members(map: &DataMap, members: Vec<GridPoint>) -> Self {
        let elevation = members.first().map_or(0.0, |p| p.elevation);
        let member_set: FxHashSet<(i32, i32)> = members.iter().map(GridPoint::coord).collect();

        let mut seen = FxHashSet::default();
        let mut perimeter = Vec::new();
        for m in &members {
            for n in map.iterate_full(m.x, m.y) {
                let Some(p) = n.point() else { continue };
                if !member_set.contains(&p.coord()) && seen.insert(p.coord()) {
                    perimeter.push(p);
                }
            }
        }

        let higher: Vec<GridPoint> = perimeter
            .iter()
            .copied()
            .filter(|p| p.elevation > elevation)
            .collect();
        // Диагональная связь не считается, если квадрат 2×2, который она пересекает,
        // содержит клетку объекта: группы разделены самим объектом.
        let high_shores = group_connected(&higher, |a, b| {
            a.x == b.x
                || a.y == b.y
                || !(member_set.contains(&(a.x, b.y)) || member_set.contains(&(b.x, a.y)))
        });
        let edge = members.iter().any(|p| map.is_map_edge(p.x, p.y));

        Self {
            elevation,
            members,
            perimeter,
            high_shores,
            edge,
        }
    }

    /// Объект, которому принадлежит клетка (удобно в тестах)
    #[must_use]
    pub fn at(map: &DataMap, x: i32, y: i32) -> Self {
        let mut explored = ExploredMap::for_map(map);
        let members = match map.point(x, y) {
            Some(seed) => fill_plateau(map, seed, &mut explored).points,
            None => Vec::new(),
        };
        Self::from_members(map, members)
    }

    #[must_use]
    pub fn is_plateau(&self) -> bool {
        self.members.len() > 1
    }

    #[must_use]
    pub fn plateau(&self) -> Option<Vec<GridPoint>> {
        self.is_plateau().then(|| self.members.clone())
    }

    /// Клетка объекта, ближайшая к его центру масс
    #[must_use]
    pub fn anchor(&self) -> (i32, i32) {
        let n = self.members.len().max(1) as f64;
        let cx = self.members.iter().map(|p| f64::from(p.x)).sum::<f64>() / n;
        let cy = self.members.iter().map(|p| f64::from(p.y)).sum::<f64>() / n;
        let centroid = (cx.round() as i32, cy.round() as i32);
        closest_to(&self.members, centroid).map_or(centroid, GridPoint::coord)
    }

    #[must_use]
    pub fn spot(&self, map: &DataMap, (x, y): (i32, i32)) -> SpotElevation {
        SpotElevation::at(map, x, y, self.elevation)
    }

    #[must_use]
    pub fn summit(&self, map: &DataMap) -> Summit {
        Summit::new(self.spot(map, self.anchor()), self.plateau(), self.edge)
    }

    /// Седловина со всеми берегами (положение уточняется при перестройке)
    #[must_use]
    pub fn saddle(&self, map: &DataMap) -> Saddle {
        Saddle::new(self.spot(map, self.anchor()), self.high_shores.clone())
            .with_plateau(self.plateau())
    }
}

/// Сырые результаты прохода до перестройки седловин
#[derive(Debug, Default)]
pub struct RawFeatures {
    pub summits: Vec<Summit>,
    /// Седловины и стоки в порядке обнаружения
    pub saddles: Vec<Saddle>,
}

/// Поиск объектов: владеет картой исследованных клеток на время прохода
pub struct FeatureDiscovery<'a> {
    map: &'a DataMap,
    explored: ExploredMap,
}

impl<'a> FeatureDiscovery<'a> {
    #[must_use]
    pub fn new(map: &'a DataMap) -> Self {
        Self {
            map,
            explored: ExploredMap::for_map(map),
        }
    }

    /// Построчный проход: классифицирует все клетки и добавляет угловые стоки
    #[must_use]
    pub fn scan(mut self) -> RawFeatures {
        let _t = Timed::info("Поиск объектов");
        let mask = prescan::cells_to_classify(self.map);
        let mut raw = RawFeatures::default();

        for y in 0..self.map.height as i32 {
            for x in 0..self.map.width as i32 {
                if self.explored.is_explored(x, y) {
                    continue;
                }
                if !mask[y as usize * self.map.width + x as usize] {
                    self.explored.mark(x, y);
                    continue;
                }
                self.classify(x, y, &mut raw);
            }
        }

        self.add_corner_runoffs(&mut raw);
        log::info!(
            "Найдено: {} вершин, {} седловин и стоков до перестройки",
            raw.summits.len(),
            raw.saddles.len()
        );
        raw
    }

    fn classify(&mut self, x: i32, y: i32, raw: &mut RawFeatures) {
        let Some(seed) = self.map.point(x, y) else {
            self.explored.mark(x, y);
            return;
        };
        let flat = self
            .map
            .iterate_full(x, y)
            .any(|n| n.elevation == Some(seed.elevation) && !self.explored.is_explored(n.x, n.y));
        let members = if flat {
            fill_plateau(self.map, seed, &mut self.explored).points
        } else {
            self.explored.mark(x, y);
            vec![seed]
        };

        let shape = FeatureShape::from_members(self.map, members);
        if shape.high_shores.is_empty() {
            raw.summits.push(shape.summit(self.map));
        }
        if shape.edge {
            raw.saddles.extend(edge::analyze_edge(self.map, &shape));
        } else if shape.high_shores.len() > 1 {
            raw.saddles.push(shape.saddle(self.map));
        }
    }

    fn add_corner_runoffs(&self, raw: &mut RawFeatures) {
        for (x, y) in self.map.corners() {
            let Some(elevation) = self.map.elevation(x, y) else {
                continue;
            };
            let spot = SpotElevation::at(self.map, x, y, elevation);
            raw.saddles.push(Saddle::runoff(spot, Vec::new()));
        }
    }
}

/// Положение двусторонней седловины: середина ближайшей пары точек двух берегов,
/// притянутая к ближайшей клетке седловины
fn reposition(map: &DataMap, saddle: &mut Saddle) {
    let Some((a, b, _)) = nearest_pair(&saddle.high_shores[0], &saddle.high_shores[1]) else {
        return;
    };
    let members = saddle.members();
    let mid = midpoint(a.coord(), b.coord());
    if let Some(at) = closest_to(&members, mid) {
        saddle.spot = SpotElevation::at(map, at.x, at.y, saddle.spot.elevation);
    }
}

/// Перестраивает седловины и складывает всё в арену.
///
/// Многосторонняя седловина заменяется детьми; краевая остаётся в арене
/// отбракованной (явно) и хранит ссылки на детей.
#[must_use]
pub fn rebuild(map: &DataMap, raw: RawFeatures) -> SurfaceNetwork {
    let _t = Timed::debug("Перестройка седловин");
    let mut network = SurfaceNetwork::new();
    for summit in raw.summits {
        network.summits.push(summit);
    }

    let mut split = 0;
    for mut saddle in raw.saddles {
        let shores = saddle.high_shores.len();
        if saddle.is_runoff() || shores < 2 {
            if !saddle.is_runoff() {
                log::warn!(
                    "Седловина в {:?} с {} берегами оставлена без изменений",
                    saddle.spot.coord(),
                    shores
                );
            }
            network.saddles.push(saddle);
        } else if shores == 2 {
            reposition(map, &mut saddle);
            network.saddles.push(saddle);
        } else {
            split += 1;
            let children = splitter::split_saddle(map, &saddle);
            if saddle.edge {
                saddle.disqualified_override = Some(true);
                let parent = network.saddles.push(saddle);
                for mut child in children {
                    child.parent = Some(parent);
                    let id = network.saddles.push(child);
                    network.saddles[parent].children.push(id);
                }
            } else {
                for child in children {
                    network.saddles.push(child);
                }
            }
        }
    }

    log::info!("Разбито многосторонних седловин: {split}");
    network
}

/// Полный поиск объектов: проход по растру и перестройка седловин
#[must_use]
pub fn discover(map: &DataMap) -> SurfaceNetwork {
    let raw = FeatureDiscovery::new(map).scan();
    rebuild(map, raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::SaddleKind;

    #[test]
    fn single_peak_is_one_summit() {
        let map = DataMap::from_rows(vec![
            vec![1.0, 1.0, 1.0, 1.0, 1.0],
            vec![1.0, 2.0, 3.0, 2.0, 1.0],
            vec![1.0, 3.0, 7.0, 3.0, 1.0],
            vec![1.0, 2.0, 3.0, 2.0, 1.0],
            vec![1.0, 1.0, 1.0, 1.0, 1.0],
        ])
        .unwrap();
        let network = discover(&map);
        assert_eq!(network.summits.len(), 1);
        assert_eq!(network.summits.iter().next().unwrap().1.spot.coord(), (2, 2));
        assert!(network.saddles.iter().all(|(_, s)| s.kind == SaddleKind::Runoff));
    }

    #[test]
    fn interior_saddle_between_two_peaks() {
        let map = DataMap::from_rows(vec![
            vec![0.0, 0.0, 0.0, 0.0, 0.0],
            vec![0.0, 5.0, 2.0, 6.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0, 0.0],
        ])
        .unwrap();
        let network = discover(&map);
        let summits: Vec<_> = network.summits.iter().map(|(_, s)| s.spot.coord()).collect();
        assert_eq!(summits, vec![(1, 1), (3, 1)]);

        let saddles: Vec<_> = network
            .saddles
            .iter()
            .filter(|(_, s)| s.kind == SaddleKind::Saddle)
            .collect();
        assert_eq!(saddles.len(), 1);
        assert_eq!(saddles[0].1.spot.coord(), (2, 1));
        assert_eq!(saddles[0].1.high_shores.len(), 2);
    }

    #[test]
    fn four_way_saddle_is_split_into_three() {
        let map = DataMap::from_rows(vec![
            vec![0.0, 0.0, 0.0, 0.0, 0.0],
            vec![0.0, 1.0, 9.0, 1.0, 0.0],
            vec![0.0, 9.0, 5.0, 9.0, 0.0],
            vec![0.0, 1.0, 9.0, 1.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0, 0.0],
        ])
        .unwrap();
        let network = discover(&map);
        let saddles: Vec<_> = network
            .saddles
            .iter()
            .filter(|(_, s)| s.kind == SaddleKind::Saddle)
            .collect();
        assert_eq!(saddles.len(), 3);
        assert!(saddles.iter().all(|(_, s)| s.high_shores.len() == 2));
        assert!(saddles.iter().all(|(_, s)| s.spot.coord() == (2, 2)));
        assert!(saddles.iter().all(|(_, s)| s.parent.is_none()));
    }

    #[test]
    fn plateau_saddle_is_positioned_between_shores() {
        let map = DataMap::from_rows(vec![
            vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            vec![0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0],
            vec![0.0, 9.0, 4.0, 4.0, 4.0, 8.0, 0.0],
            vec![0.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ])
        .unwrap();
        let network = discover(&map);
        let (_, saddle) = network
            .saddles
            .iter()
            .find(|(_, s)| s.kind == SaddleKind::Saddle)
            .unwrap();
        assert_eq!(saddle.plateau.as_ref().unwrap().len(), 3);
        assert_eq!(saddle.spot.coord(), (3, 2));
        assert_eq!(saddle.spot.elevation, 4.0);
    }

    #[test]
    fn corners_are_always_runoffs() {
        let map = DataMap::from_rows(vec![
            vec![3.0, 2.0, 3.0],
            vec![2.0, 1.0, 2.0],
            vec![3.0, 2.0, 3.0],
        ])
        .unwrap();
        let network = discover(&map);
        let runoffs: Vec<_> = network
            .saddles
            .iter()
            .filter(|(_, s)| s.is_runoff())
            .map(|(_, s)| s.spot.coord())
            .collect();
        // каждый угол — краевая вершина со своим стоком, плюс угловой сток
        for corner in map.corners() {
            assert_eq!(runoffs.iter().filter(|&&c| c == corner).count(), 2);
        }
        assert_eq!(&runoffs[runoffs.len() - 4..], &map.corners()[..]);
        assert!(
            network
                .saddles
                .iter()
                .filter(|(_, s)| s.is_runoff())
                .all(|(_, s)| s.high_shores.is_empty())
        );
    }

    #[test]
    fn void_corner_gets_no_runoff() {
        let map = DataMap::from_rows(vec![
            vec![-32768.0, 1.0, 1.0],
            vec![1.0, 1.0, 1.0],
        ])
        .unwrap();
        let network = discover(&map);
        assert!(network.saddles.iter().all(|(_, s)| s.spot.coord() != (0, 0)));
    }

    #[test]
    fn every_cell_is_explored_once() {
        let map = DataMap::from_rows(vec![
            vec![1.0, 1.0, 2.0, 2.0],
            vec![1.0, 3.0, 3.0, 2.0],
            vec![4.0, 3.0, 1.0, 1.0],
        ])
        .unwrap();
        let mut discovery = FeatureDiscovery::new(&map);
        let mut raw = RawFeatures::default();
        for y in 0..3 {
            for x in 0..4 {
                if !discovery.explored.is_explored(x, y) {
                    discovery.classify(x, y, &mut raw);
                }
            }
        }
        assert_eq!(discovery.explored.count(), 12);
    }
}
