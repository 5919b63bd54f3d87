// src/feature/mod.rs
//! Объекты поверхностной сети
//!
//! Сеть состоит из трёх видов точек и рёбер между ними:
//!
//! 1. **`Summit`** — вершина: локальный максимум (клетка или плато без более высоких соседей).
//! 2. **`Saddle`** — седловина: вокруг неё два «высоких берега», не связанных друг с другом.
//!    Вариант `SaddleKind::Runoff` — сток на краю карты, заменяющий седловину или вершину,
//!    обрезанную границей растра.
//! 3. **`Linker`** — ребро «вершина — седловина» с путём подъёма.
//!
//! ## Хранение
//!
//! Все объекты живут в арене `SurfaceNetwork` и ссылаются друг на друга только через
//! индексы (`SummitId`, `SaddleId`, `LinkerId`). Удаления нет: отбраковка — это флаг,
//! поэтому связи `parent`/`children` и альтернативы котловинных седловин остаются
//! доступными для разбора после анализа.

pub mod container;
pub mod record;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::datamap::DataMap;
use crate::point::GridPoint;

pub use container::{NetworkStats, SaddlesContainer, SummitsContainer, SurfaceNetwork};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SummitId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SaddleId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkerId(pub u32);

impl SummitId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl SaddleId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl LinkerId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Вид объекта сети (для проверки типов на границах контейнеров и в строковых id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureKind {
    Summit,
    Saddle,
    Runoff,
}

impl FeatureKind {
    /// Префикс строкового id
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            FeatureKind::Summit => "su",
            FeatureKind::Saddle => "sa",
            FeatureKind::Runoff => "ru",
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FeatureKind::Summit => "summit",
            FeatureKind::Saddle => "saddle",
            FeatureKind::Runoff => "runoff",
        };
        f.write_str(name)
    }
}

/// Точка с высотой и географическими координатами
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpotElevation {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: f32,
    pub x: i32,
    pub y: i32,
}

impl SpotElevation {
    #[must_use]
    pub fn at(map: &DataMap, x: i32, y: i32, elevation: f32) -> Self {
        let (latitude, longitude) = map.xy_to_latlon(x, y);
        Self {
            latitude,
            longitude,
            elevation,
            x,
            y,
        }
    }

    #[must_use]
    pub fn coord(&self) -> (i32, i32) {
        (self.x, self.y)
    }
}

/// Вершина
#[derive(Debug, Clone, PartialEq)]
pub struct Summit {
    pub spot: SpotElevation,
    /// Все клетки плато, если вершина — плато
    pub plateau: Option<Vec<GridPoint>>,
    pub edge: bool,
    /// Рёбра к седловинам и стокам
    pub saddles: Vec<LinkerId>,
}

impl Summit {
    #[must_use]
    pub fn new(spot: SpotElevation, plateau: Option<Vec<GridPoint>>, edge: bool) -> Self {
        Self {
            spot,
            plateau,
            edge,
            saddles: Vec::new(),
        }
    }

    /// Все клетки, занимаемые вершиной
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        let single = self.plateau.is_none().then_some(self.spot.coord());
        single
            .into_iter()
            .chain(self.plateau.iter().flatten().map(GridPoint::coord))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaddleKind {
    Saddle,
    Runoff,
}

impl From<SaddleKind> for FeatureKind {
    fn from(kind: SaddleKind) -> Self {
        match kind {
            SaddleKind::Saddle => FeatureKind::Saddle,
            SaddleKind::Runoff => FeatureKind::Runoff,
        }
    }
}

/// Причина отбраковки седловины
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disqualification {
    /// Связана не более чем с одной вершиной
    SingleSummit,
    /// Самая низкая в цикле графа
    BasinSaddle,
}

/// Седловина или сток
#[derive(Debug, Clone, PartialEq)]
pub struct Saddle {
    pub spot: SpotElevation,
    pub kind: SaddleKind,
    pub edge: bool,
    pub plateau: Option<Vec<GridPoint>>,
    /// Группы более высоких соседей; после разбиения их ровно две
    pub high_shores: Vec<Vec<GridPoint>>,
    /// Краевые клетки, не ставшие стоками (только у краевых седловин)
    pub edge_points: Vec<GridPoint>,
    /// Рёбра к вершинам
    pub summits: Vec<LinkerId>,
    pub single_summit: bool,
    pub basin_saddle: bool,
    /// Явное значение `disqualified`; `None` — вычисляется из флагов
    pub disqualified_override: Option<bool>,
    pub parent: Option<SaddleId>,
    pub children: Vec<SaddleId>,
    pub basin_saddle_alternatives: Vec<SaddleId>,
}

impl Saddle {
    #[must_use]
    pub fn new(spot: SpotElevation, high_shores: Vec<Vec<GridPoint>>) -> Self {
        Self {
            spot,
            kind: SaddleKind::Saddle,
            edge: false,
            plateau: None,
            high_shores,
            edge_points: Vec::new(),
            summits: Vec::new(),
            single_summit: false,
            basin_saddle: false,
            disqualified_override: None,
            parent: None,
            children: Vec::new(),
            basin_saddle_alternatives: Vec::new(),
        }
    }

    /// Сток всегда помечен как краевой
    #[must_use]
    pub fn runoff(spot: SpotElevation, high_shores: Vec<Vec<GridPoint>>) -> Self {
        Self {
            kind: SaddleKind::Runoff,
            edge: true,
            ..Self::new(spot, high_shores)
        }
    }

    #[must_use]
    pub fn with_plateau(mut self, plateau: Option<Vec<GridPoint>>) -> Self {
        self.plateau = plateau;
        self
    }

    #[must_use]
    pub fn with_edge(mut self, edge: bool) -> Self {
        self.edge = edge || self.kind == SaddleKind::Runoff;
        self
    }

    #[must_use]
    pub fn is_runoff(&self) -> bool {
        self.kind == SaddleKind::Runoff
    }

    #[must_use]
    pub fn feature_kind(&self) -> FeatureKind {
        self.kind.into()
    }

    #[must_use]
    pub fn disqualified(&self) -> bool {
        self.disqualified_override
            .unwrap_or(self.single_summit || self.basin_saddle)
    }

    /// Клетки, по которым ищется ближайшая точка при выборе положения седловины
    #[must_use]
    pub fn members(&self) -> Vec<GridPoint> {
        match &self.plateau {
            Some(points) => points.clone(),
            None => vec![GridPoint::new(self.spot.x, self.spot.y, self.spot.elevation)],
        }
    }
}

/// Ребро между вершиной и седловиной (стоком)
#[derive(Debug, Clone, PartialEq)]
pub struct Linker {
    pub summit: SummitId,
    pub saddle: SaddleId,
    /// Путь подъёма от высокого берега до вершины
    pub path: Vec<GridPoint>,
    pub disqualified: bool,
}

/// Ссылка на объект сети (узел экспортируемого графа)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureRef {
    Summit(SummitId),
    Saddle(SaddleId),
}

/// Объект, передаваемый в контейнер (проверка типа на входе)
#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    Summit(Summit),
    Saddle(Saddle),
}

impl Feature {
    #[must_use]
    pub fn kind(&self) -> FeatureKind {
        match self {
            Feature::Summit(_) => FeatureKind::Summit,
            Feature::Saddle(s) => s.feature_kind(),
        }
    }
}
