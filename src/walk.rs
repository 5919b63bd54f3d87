// src/walk.rs
//! Подъём от седловин к вершинам
//!
//! Из каждого высокого берега каждой неотбракованной седловины (и стока)
//! выполняется жадный подъём: на каждом шаге — самый высокий сосед, плато
//! проходится целиком и покидается через самую высокую точку своего периметра.
//! Достигнутая вершина соединяется с седловиной ребром (`Linker`), путь
//! подъёма сохраняется в ребре.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::datamap::DataMap;
use crate::discovery::plateau::fill_plateau;
use crate::feature::{SaddleId, SummitId, SurfaceNetwork};
use crate::point::{GridPoint, highest};
use crate::timing::Timed;

pub struct Walk<'a> {
    map: &'a DataMap,
    /// Клетка (включая клетки плато) → вершина
    summits: FxHashMap<(i32, i32), SummitId>,
}

impl<'a> Walk<'a> {
    #[must_use]
    pub fn new(map: &'a DataMap, network: &SurfaceNetwork) -> Self {
        let mut summits = FxHashMap::default();
        for (id, summit) in network.summits.iter() {
            for cell in summit.cells() {
                summits.insert(cell, id);
            }
        }
        Self { map, summits }
    }

    fn steepest_neighbor(&self, from: GridPoint) -> Option<GridPoint> {
        let higher: Vec<GridPoint> = self
            .map
            .iterate_full(from.x, from.y)
            .filter_map(|n| n.point())
            .filter(|p| p.elevation > from.elevation)
            .collect();
        highest(&higher).copied()
    }

    /// Подъём от одной точки. Возвращает найденные вершины с путями.
    #[must_use]
    pub fn climb(&self, start: GridPoint) -> Vec<(SummitId, Vec<GridPoint>)> {
        let mut explored: FxHashSet<(i32, i32)> = FxHashSet::default();
        let mut stack = vec![start];
        let mut path = Vec::new();
        let mut found = Vec::new();

        while let Some(current) = stack.pop() {
            if !explored.insert(current.coord()) {
                continue;
            }
            path.push(current);

            if let Some(&summit) = self.summits.get(&current.coord()) {
                found.push((summit, std::mem::take(&mut path)));
                continue;
            }

            let flat = self
                .map
                .iterate_full(current.x, current.y)
                .any(|n| n.elevation == Some(current.elevation));
            let next = if flat {
                let plateau = fill_plateau(self.map, current, &mut explored);
                path.extend(plateau.points.iter().skip(1).copied());
                plateau.highest_exit()
            } else {
                self.steepest_neighbor(current)
            };

            match next {
                Some(p) => stack.push(p),
                None => log::debug!(
                    "Подъём от {:?} оборвался в {:?}: нет более высоких соседей",
                    start.coord(),
                    current.coord()
                ),
            }
        }
        found
    }

    fn walk_saddle(&self, network: &mut SurfaceNetwork, id: SaddleId) -> usize {
        let mut starts: Vec<GridPoint> = network.saddles[id]
            .high_shores
            .iter()
            .filter_map(|shore| highest(shore).copied())
            .collect();
        starts.sort_by(|a, b| b.cmp_elevation(a));

        let mut created = 0;
        for start in starts {
            for (summit, path) in self.climb(start) {
                if network.link(summit, id, path).is_some() {
                    created += 1;
                }
            }
        }
        created
    }

    /// Проходит все неотбракованные седловины и стоки в порядке арены
    pub fn run(&self, network: &mut SurfaceNetwork) -> usize {
        let _t = Timed::info("Подъём к вершинам");
        let mut created = 0;
        for id in network.saddles.ids() {
            if network.saddles[id].disqualified() {
                continue;
            }
            created += self.walk_saddle(network, id);
        }
        log::info!("Создано рёбер: {created}");
        created
    }
}

/// Соединяет седловины и стоки с вершинами
pub fn walk(map: &DataMap, network: &mut SurfaceNetwork) -> usize {
    Walk::new(map, network).run(network)
}
