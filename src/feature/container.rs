// src/feature/container.rs
//! Арена объектов сети и операции над связями

use std::ops::{Index, IndexMut};

use petgraph::graph::{NodeIndex, UnGraph};
use rustc_hash::FxHashMap;

use crate::error::{Result, SurfaceError};
use crate::feature::{
    Disqualification, Feature, FeatureKind, FeatureRef, Linker, LinkerId, Saddle, SaddleId,
    Summit, SummitId,
};
use crate::point::GridPoint;

/// Вершины в порядке обнаружения
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummitsContainer {
    items: Vec<Summit>,
}

impl SummitsContainer {
    pub fn push(&mut self, summit: Summit) -> SummitId {
        self.items.push(summit);
        SummitId(self.items.len() as u32 - 1)
    }

    /// Добавляет объект, отвергая всё, что не является вершиной
    pub fn append(&mut self, feature: Feature) -> Result<SummitId> {
        match feature {
            Feature::Summit(summit) => Ok(self.push(summit)),
            other => Err(SurfaceError::TypeMismatch {
                expected: FeatureKind::Summit,
                found: other.kind(),
            }),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: SummitId) -> Option<&Summit> {
        self.items.get(id.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = (SummitId, &Summit)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, s)| (SummitId(i as u32), s))
    }
}

impl Index<SummitId> for SummitsContainer {
    type Output = Summit;

    fn index(&self, id: SummitId) -> &Summit {
        &self.items[id.index()]
    }
}

impl IndexMut<SummitId> for SummitsContainer {
    fn index_mut(&mut self, id: SummitId) -> &mut Summit {
        &mut self.items[id.index()]
    }
}

/// Седловины и стоки в порядке построчного обхода растра.
///
/// Стоки — вариант седловины, поэтому лежат в той же арене; порядок вставки
/// определяет порядок обработки при подъёме и поиске котловин.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaddlesContainer {
    items: Vec<Saddle>,
}

impl SaddlesContainer {
    pub fn push(&mut self, saddle: Saddle) -> SaddleId {
        self.items.push(saddle);
        SaddleId(self.items.len() as u32 - 1)
    }

    /// Добавляет седловину или сток ожидаемого вида
    pub fn append(&mut self, feature: Feature, expected: FeatureKind) -> Result<SaddleId> {
        match feature {
            Feature::Saddle(saddle) if saddle.feature_kind() == expected => Ok(self.push(saddle)),
            other => Err(SurfaceError::TypeMismatch {
                expected,
                found: other.kind(),
            }),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: SaddleId) -> Option<&Saddle> {
        self.items.get(id.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = (SaddleId, &Saddle)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, s)| (SaddleId(i as u32), s))
    }

    pub fn ids(&self) -> impl Iterator<Item = SaddleId> + use<> {
        (0..self.items.len() as u32).map(SaddleId)
    }
}

impl Index<SaddleId> for SaddlesContainer {
    type Output = Saddle;

    fn index(&self, id: SaddleId) -> &Saddle {
        &self.items[id.index()]
    }
}

impl IndexMut<SaddleId> for SaddlesContainer {
    fn index_mut(&mut self, id: SaddleId) -> &mut Saddle {
        &mut self.items[id.index()]
    }
}

/// Сводка по сети (для логов и CLI)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkStats {
    pub summits: usize,
    pub saddles: usize,
    pub runoffs: usize,
    pub disqualified_saddles: usize,
    pub linkers: usize,
    pub disqualified_linkers: usize,
}

/// Поверхностная сеть: вершины, седловины/стоки и рёбра между ними
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurfaceNetwork {
    pub summits: SummitsContainer,
    pub saddles: SaddlesContainer,
    pub linkers: Vec<Linker>,
}

impl SurfaceNetwork {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn linker(&self, id: LinkerId) -> &Linker {
        &self.linkers[id.index()]
    }

    /// Строковый id седловины или стока (`sa:N` / `ru:N`)
    #[must_use]
    pub fn saddle_label(&self, id: SaddleId) -> String {
        format!("{}:{}", self.saddles[id].feature_kind().prefix(), id.0)
    }

    #[must_use]
    pub fn summit_label(id: SummitId) -> String {
        format!("{}:{}", FeatureKind::Summit.prefix(), id.0)
    }

    /// Соединяет вершину и седловину. Повторная пара не создаёт второго ребра.
    pub fn link(
        &mut self,
        summit: SummitId,
        saddle: SaddleId,
        path: Vec<GridPoint>,
    ) -> Option<LinkerId> {
        let exists = self.saddles[saddle]
            .summits
            .iter()
            .any(|&l| self.linkers[l.index()].summit == summit);
        if exists {
            return None;
        }
        let id = LinkerId(self.linkers.len() as u32);
        self.linkers.push(Linker {
            summit,
            saddle,
            path,
            disqualified: false,
        });
        self.summits[summit].saddles.push(id);
        self.saddles[saddle].summits.push(id);
        Some(id)
    }

    /// Отбраковывает седловину и все её рёбра. Повторный вызов ничего не меняет.
    pub fn disqualify_saddle(&mut self, id: SaddleId, reason: Disqualification) {
        let saddle = &mut self.saddles[id];
        match reason {
            Disqualification::SingleSummit => saddle.single_summit = true,
            Disqualification::BasinSaddle => saddle.basin_saddle = true,
        }
        let disqualified = saddle.disqualified();
        if disqualified {
            for &l in &self.saddles[id].summits {
                self.linkers[l.index()].disqualified = true;
            }
        }
    }

    /// Рёбра седловины, ещё не отбракованные
    pub fn live_linkers(&self, id: SaddleId) -> impl Iterator<Item = LinkerId> + '_ {
        self.saddles[id]
            .summits
            .iter()
            .copied()
            .filter(|l| !self.linkers[l.index()].disqualified)
    }

    /// Число разных вершин, с которыми седловина связана живыми рёбрами
    #[must_use]
    pub fn distinct_summits(&self, id: SaddleId) -> usize {
        let mut seen: Vec<SummitId> = self
            .live_linkers(id)
            .map(|l| self.linkers[l.index()].summit)
            .collect();
        seen.sort_unstable();
        seen.dedup();
        seen.len()
    }

    #[must_use]
    pub fn stats(&self) -> NetworkStats {
        let mut stats = NetworkStats {
            summits: self.summits.len(),
            linkers: self.linkers.len(),
            ..NetworkStats::default()
        };
        for (_, saddle) in self.saddles.iter() {
            if saddle.is_runoff() {
                stats.runoffs += 1;
            } else {
                stats.saddles += 1;
            }
            if saddle.disqualified() {
                stats.disqualified_saddles += 1;
            }
        }
        stats.disqualified_linkers = self.linkers.iter().filter(|l| l.disqualified).count();
        stats
    }

    /// Граф из всех вершин, неотбракованных седловин и живых рёбер.
    ///
    /// Вес ребра — его `LinkerId`, чтобы потребитель мог достать путь подъёма.
    #[must_use]
    pub fn to_graph(&self) -> UnGraph<FeatureRef, LinkerId> {
        let mut graph = UnGraph::new_undirected();
        let mut summit_nodes: FxHashMap<SummitId, NodeIndex> = FxHashMap::default();
        let mut saddle_nodes: FxHashMap<SaddleId, NodeIndex> = FxHashMap::default();

        for (id, _) in self.summits.iter() {
            summit_nodes.insert(id, graph.add_node(FeatureRef::Summit(id)));
        }
        for (id, saddle) in self.saddles.iter() {
            if !saddle.disqualified() {
                saddle_nodes.insert(id, graph.add_node(FeatureRef::Saddle(id)));
            }
        }
        for (i, linker) in self.linkers.iter().enumerate() {
            if linker.disqualified {
                continue;
            }
            if let (Some(&a), Some(&b)) = (
                summit_nodes.get(&linker.summit),
                saddle_nodes.get(&linker.saddle),
            ) {
                graph.add_edge(a, b, LinkerId(i as u32));
            }
        }
        graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::SpotElevation;

    fn spot(x: i32, elevation: f32) -> SpotElevation {
        SpotElevation {
            latitude: 0.0,
            longitude: f64::from(x),
            elevation,
            x,
            y: 0,
        }
    }

    #[test]
    fn containers_reject_foreign_kinds() {
        let mut summits = SummitsContainer::default();
        let saddle = Feature::Saddle(Saddle::new(spot(0, 1.0), vec![]));
        let err = summits.append(saddle.clone()).unwrap_err();
        assert!(matches!(
            err,
            SurfaceError::TypeMismatch {
                expected: FeatureKind::Summit,
                found: FeatureKind::Saddle
            }
        ));
        assert!(summits.is_empty());

        let mut saddles = SaddlesContainer::default();
        let summit = Feature::Summit(Summit::new(spot(0, 1.0), None, false));
        assert!(saddles.append(summit, FeatureKind::Saddle).is_err());
        assert!(saddles.append(saddle.clone(), FeatureKind::Runoff).is_err());
        assert_eq!(saddles.append(saddle, FeatureKind::Saddle).unwrap(), SaddleId(0));
    }

    #[test]
    fn link_skips_duplicate_pairs() {
        let mut net = SurfaceNetwork::new();
        let su = net.summits.push(Summit::new(spot(0, 10.0), None, false));
        let sa = net.saddles.push(Saddle::new(spot(1, 5.0), vec![]));

        assert!(net.link(su, sa, vec![]).is_some());
        assert!(net.link(su, sa, vec![]).is_none());
        assert_eq!(net.linkers.len(), 1);
        assert_eq!(net.summits[su].saddles.len(), 1);
        assert_eq!(net.saddles[sa].summits.len(), 1);
    }

    #[test]
    fn disqualify_is_idempotent_and_reaches_linkers() {
        let mut net = SurfaceNetwork::new();
        let a = net.summits.push(Summit::new(spot(0, 10.0), None, false));
        let b = net.summits.push(Summit::new(spot(2, 12.0), None, false));
        let sa = net.saddles.push(Saddle::new(spot(1, 5.0), vec![]));
        net.link(a, sa, vec![]);
        net.link(b, sa, vec![]);

        net.disqualify_saddle(sa, Disqualification::BasinSaddle);
        let once = net.clone();
        net.disqualify_saddle(sa, Disqualification::BasinSaddle);

        assert_eq!(net, once);
        assert!(net.saddles[sa].disqualified());
        assert!(net.linkers.iter().all(|l| l.disqualified));
        assert_eq!(net.distinct_summits(sa), 0);
        assert_eq!(net.to_graph().edge_count(), 0);
    }

    #[test]
    fn explicit_override_keeps_linkers_alive() {
        let mut net = SurfaceNetwork::new();
        let a = net.summits.push(Summit::new(spot(0, 10.0), None, false));
        let mut saddle = Saddle::new(spot(1, 5.0), vec![]);
        saddle.disqualified_override = Some(false);
        let sa = net.saddles.push(saddle);
        net.link(a, sa, vec![]);

        net.disqualify_saddle(sa, Disqualification::SingleSummit);
        assert!(net.saddles[sa].single_summit);
        assert!(!net.saddles[sa].disqualified());
        assert!(!net.linkers[0].disqualified);
    }
}
