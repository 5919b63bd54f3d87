// src/basin.rs
//! Отбраковка лишних седловин
//!
//! Граф «седловина — вершина» должен быть деревом. Каждый цикл в нём означает,
//! что две вершины связаны более чем одним путём; самая низкая седловина такого
//! цикла лежит на дне котловины и отбраковывается (`Disqualification::BasinSaddle`).
//! Седловина, связанная не более чем с одной вершиной, отбраковывается как
//! `Disqualification::SingleSummit`.
//!
//! Обход выполняется в ширину от каждой неотбракованной седловины по очереди.
//! `lookback` хранит, из какой седловины и через какую вершину мы пришли,
//! так что при повторной встрече оба плеча цикла восстанавливаются до общего предка.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::feature::{Disqualification, LinkerId, SaddleId, SummitId, SurfaceNetwork};
use crate::timing::Timed;

type Lookback = FxHashMap<SaddleId, Option<(SaddleId, SummitId)>>;

/// Цепочка от седловины до корня обхода
fn chain(lookback: &Lookback, from: SaddleId) -> Vec<SaddleId> {
    let mut chain = vec![from];
    let mut current = from;
    while let Some(Some((parent, _))) = lookback.get(&current) {
        chain.push(*parent);
        current = *parent;
    }
    chain
}

/// Вершина, через которую плечо цикла покидает общего предка
fn leaves_via(
    lookback: &Lookback,
    chain: &[SaddleId],
    ancestor_pos: usize,
    current: SummitId,
) -> Option<SummitId> {
    if ancestor_pos == 0 {
        return Some(current);
    }
    lookback
        .get(&chain[ancestor_pos - 1])
        .copied()
        .flatten()
        .map(|(_, via)| via)
}

pub struct BasinSaddleFinder<'a> {
    network: &'a mut SurfaceNetwork,
}

impl<'a> BasinSaddleFinder<'a> {
    pub fn new(network: &'a mut SurfaceNetwork) -> Self {
        Self { network }
    }

    /// Седловины цикла, замкнутого ребром `saddle` —(`summit`)— `next`
    fn cycle_members(
        lookback: &Lookback,
        saddle: SaddleId,
        next: SaddleId,
        summit: SummitId,
    ) -> Vec<SaddleId> {
        let left = chain(lookback, saddle);
        let right = chain(lookback, next);
        let Some(right_pos) = right.iter().position(|s| left.contains(s)) else {
            return Vec::new();
        };
        let ancestor = right[right_pos];
        let Some(left_pos) = left.iter().position(|&s| s == ancestor) else {
            return Vec::new();
        };

        let mut members: Vec<SaddleId> = left[..left_pos]
            .iter()
            .chain(&right[..right_pos])
            .copied()
            .collect();
        let left_via = leaves_via(lookback, &left, left_pos, summit);
        let right_via = leaves_via(lookback, &right, right_pos, summit);
        if left_via != right_via {
            members.push(ancestor);
        }
        members
    }

    fn break_cycle(&mut self, members: &[SaddleId]) {
        let saddles = &self.network.saddles;
        if members.iter().any(|&s| saddles[s].disqualified()) {
            log::debug!("Цикл {members:?} уже разорван");
            return;
        }
        let Some(lowest) = members
            .iter()
            .map(|&s| saddles[s].spot.elevation)
            .min_by(f32::total_cmp)
        else {
            return;
        };
        let tied: Vec<SaddleId> = members
            .iter()
            .copied()
            .filter(|&s| saddles[s].spot.elevation == lowest)
            .collect();

        if let &[single] = tied.as_slice() {
            log::debug!(
                "Отбракована {} ({lowest} м) в цикле из {}",
                self.network.saddle_label(single),
                members.len()
            );
            self.network
                .disqualify_saddle(single, Disqualification::BasinSaddle);
            return;
        }

        for &a in &tied {
            for &b in &tied {
                let alternatives = &mut self.network.saddles[a].basin_saddle_alternatives;
                if a != b && !alternatives.contains(&b) {
                    alternatives.push(b);
                }
            }
        }
    }

    fn run(&mut self, root: SaddleId) {
        let mut lookback: Lookback = FxHashMap::default();
        lookback.insert(root, None);
        let mut queue = VecDeque::from([root]);
        let mut consumed: FxHashSet<LinkerId> = FxHashSet::default();

        while let Some(saddle) = queue.pop_front() {
            if self.network.saddles[saddle].disqualified() {
                continue;
            }

            'expand: for linker in self.network.saddles[saddle].summits.clone() {
                if self.network.linker(linker).disqualified || !consumed.insert(linker) {
                    continue;
                }
                let summit = self.network.linker(linker).summit;

                for other in self.network.summits[summit].saddles.clone() {
                    if other == linker
                        || consumed.contains(&other)
                        || self.network.linker(other).disqualified
                    {
                        continue;
                    }
                    let next = self.network.linker(other).saddle;
                    if self.network.saddles[next].disqualified() {
                        continue;
                    }
                    consumed.insert(other);

                    if next == saddle {
                        self.network
                            .disqualify_saddle(saddle, Disqualification::SingleSummit);
                    } else if lookback.contains_key(&next) {
                        let members = Self::cycle_members(&lookback, saddle, next, summit);
                        self.break_cycle(&members);
                    } else {
                        lookback.insert(next, Some((saddle, summit)));
                        queue.push_back(next);
                    }

                    if self.network.saddles[saddle].disqualified() {
                        break 'expand;
                    }
                }
            }

            let current = &self.network.saddles[saddle];
            if !current.is_runoff()
                && !current.disqualified()
                && self.network.distinct_summits(saddle) <= 1
            {
                self.network
                    .disqualify_saddle(saddle, Disqualification::SingleSummit);
            }
        }
    }

    /// Обходит граф от каждой неотбракованной седловины и стока.
    /// Возвращает число отбракованных за этот вызов.
    pub fn find(mut self) -> usize {
        let _t = Timed::info("Поиск седловин котловин");
        let before = self.disqualified_count();
        for root in self.network.saddles.ids() {
            if !self.network.saddles[root].disqualified() {
                self.run(root);
            }
        }
        let removed = self.disqualified_count() - before;
        log::info!("Отбраковано седловин: {removed}");
        removed
    }

    fn disqualified_count(&self) -> usize {
        self.network
            .saddles
            .iter()
            .filter(|(_, s)| s.disqualified())
            .count()
    }
}

/// Отбраковывает седловины котловин и седловины с одной вершиной
pub fn find_basin_saddles(network: &mut SurfaceNetwork) -> usize {
    BasinSaddleFinder::new(network).find()
}
