// src/discovery/splitter.rs
//! Разбиение многосторонней седловины на двусторонние
//!
//! Седловина с k ≥ 3 высокими берегами заменяется k−1 седловинами, у каждой
//! ровно два берега. Какие берега соединять, решает связующее дерево:
//!
//! 1. Для каждой пары берегов ищется ближайшая пара точек (полный граф на k узлах).
//! 2. Дерево растёт от берега 0. Для снятого с фронта узла каждый ещё не
//!    исследованный берег B принимается, если ближайший к B берег среди узла и
//!    неисследованных (на начало прохода) — этот узел.
//! 3. Если фронт опустел, а берега остались, присоединяется кратчайшее ребро
//!    между исследованными и неисследованными (как в алгоритме Прима), и обход
//!    продолжается.

use std::collections::VecDeque;

use crate::datamap::DataMap;
use crate::feature::{Saddle, SpotElevation};
use crate::point::{GridPoint, closest_to, midpoint, nearest_pair};

/// Ребро связующего дерева между берегами `from` и `to`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeEdge {
    pub from: usize,
    pub to: usize,
    /// Ближайшая точка берега `from`
    pub a: GridPoint,
    /// Ближайшая точка берега `to`
    pub b: GridPoint,
}

#[derive(Debug, Clone, Copy)]
struct Link {
    a: GridPoint,
    b: GridPoint,
    dist2: i64,
}

fn link_table(neighborhoods: &[Vec<GridPoint>]) -> Vec<Vec<Option<Link>>> {
    let k = neighborhoods.len();
    let mut links = vec![vec![None; k]; k];
    for i in 0..k {
        for j in (i + 1)..k {
            if let Some((a, b, dist2)) = nearest_pair(&neighborhoods[i], &neighborhoods[j]) {
                links[i][j] = Some(Link { a, b, dist2 });
                links[j][i] = Some(Link { a: b, b: a, dist2 });
            }
        }
    }
    links
}

fn distance(links: &[Vec<Option<Link>>], i: usize, j: usize) -> i64 {
    links[i][j].map_or(i64::MAX, |l| l.dist2)
}

/// Строит связующее дерево: ровно `k − 1` рёбер для `k` берегов.
#[must_use]
pub fn connecting_tree(neighborhoods: &[Vec<GridPoint>]) -> Vec<TreeEdge> {
    let k = neighborhoods.len();
    if k < 2 {
        return Vec::new();
    }
    let links = link_table(neighborhoods);
    let edge = |from: usize, to: usize| {
        let link = links[from][to].unwrap_or(Link {
            a: neighborhoods[from][0],
            b: neighborhoods[to][0],
            dist2: i64::MAX,
        });
        TreeEdge {
            from,
            to,
            a: link.a,
            b: link.b,
        }
    };

    let mut explored = vec![false; k];
    explored[0] = true;
    let mut frontier = VecDeque::from([0]);
    let mut edges = Vec::with_capacity(k - 1);

    loop {
        while let Some(node) = frontier.pop_front() {
            let unexplored: Vec<usize> = (0..k).filter(|&i| !explored[i]).collect();
            for &remote in &unexplored {
                let nearest = unexplored
                    .iter()
                    .copied()
                    .filter(|&c| c != remote)
                    .chain(std::iter::once(node))
                    .min_by_key(|&c| (distance(&links, remote, c), c));
                if nearest == Some(node) {
                    explored[remote] = true;
                    edges.push(edge(node, remote));
                    frontier.push_back(remote);
                }
            }
        }

        if edges.len() == k - 1 {
            break;
        }

        // Фронт опустел: присоединяем кратчайшее ребро к исследованной части
        let fallback = (0..k)
            .filter(|&i| explored[i])
            .flat_map(|i| (0..k).filter(|&j| !explored[j]).map(move |j| (i, j)))
            .min_by_key(|&(i, j)| (distance(&links, i, j), i, j));
        let Some((from, to)) = fallback else { break };
        explored[to] = true;
        edges.push(edge(from, to));
        frontier.push_back(to);
    }

    edges
}

/// Разбивает седловину на `k − 1` двусторонних.
///
/// Каждая новая седловина стоит в целочисленной середине своего ребра дерева,
/// притянутой к ближайшей клетке исходной седловины (у одиночной клетки — к ней самой).
/// Связи `parent`/`children` проставляет вызывающий код при вставке в арену.
#[must_use]
pub fn split_saddle(map: &DataMap, saddle: &Saddle) -> Vec<Saddle> {
    let members = saddle.members();
    connecting_tree(&saddle.high_shores)
        .into_iter()
        .map(|e| {
            let mid = midpoint(e.a.coord(), e.b.coord());
            let (x, y) = closest_to(&members, mid).map_or(saddle.spot.coord(), GridPoint::coord);
            let spot = SpotElevation::at(map, x, y, saddle.spot.elevation);
            Saddle::new(spot, vec![vec![e.a], vec![e.b]]).with_edge(saddle.edge)
        })
        .collect()
}
