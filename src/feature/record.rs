// src/feature/record.rs
//! Сохранение и загрузка сети
//!
//! Каждый объект сериализуется в запись со строковым id (`su:N`, `sa:N`, `ru:N`);
//! связи между объектами хранятся только как id и восстанавливаются через таблицу
//! id → индекс. Сеть целиком несёт контрольную сумму карты высот, по которой
//! она была построена: загрузка поверх другой карты — фатальная ошибка.

use std::fs;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::datamap::DataMap;
use crate::error::{Result, SurfaceError};
use crate::feature::{
    Feature, FeatureKind, Linker, Saddle, SaddleId, SaddleKind, SpotElevation, Summit, SummitId,
    SurfaceNetwork,
};
use crate::point::GridPoint;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummitRecord {
    pub id: String,
    #[serde(flatten)]
    pub spot: SpotElevation,
    #[serde(default)]
    pub edge: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plateau: Option<Vec<GridPoint>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaddleRecord {
    pub id: String,
    #[serde(flatten)]
    pub spot: SpotElevation,
    #[serde(default)]
    pub edge: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plateau: Option<Vec<GridPoint>>,
    #[serde(rename = "highShores")]
    pub high_shores: Vec<Vec<GridPoint>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edge_points: Vec<GridPoint>,
    #[serde(rename = "singleSummit", default)]
    pub single_summit: bool,
    #[serde(rename = "basinSaddle", default)]
    pub basin_saddle: bool,
    /// Явное значение `disqualified`, если задано
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disqualified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<String>,
    #[serde(
        rename = "basinSaddleAlternatives",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub basin_saddle_alternatives: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkerRecord {
    pub summit: String,
    pub saddle: String,
    #[serde(default)]
    pub disqualified: bool,
    pub path: Vec<GridPoint>,
}

/// Сеть целиком
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkRecord {
    pub checksum: String,
    pub summits: Vec<SummitRecord>,
    pub saddles: Vec<SaddleRecord>,
    pub runoffs: Vec<SaddleRecord>,
    pub linkers: Vec<LinkerRecord>,
}

/// Разбирает `prefix:N` и проверяет вид объекта
fn parse_id(id: &str, expected: FeatureKind) -> Result<u32> {
    let (prefix, number) = id
        .split_once(':')
        .ok_or_else(|| SurfaceError::MalformedId(id.to_string()))?;
    let found = match prefix {
        "su" => FeatureKind::Summit,
        "sa" => FeatureKind::Saddle,
        "ru" => FeatureKind::Runoff,
        _ => return Err(SurfaceError::MalformedId(id.to_string())),
    };
    if found != expected {
        return Err(SurfaceError::TypeMismatch { expected, found });
    }
    number
        .parse()
        .map_err(|_| SurfaceError::MalformedId(id.to_string()))
}

impl Summit {
    #[must_use]
    pub fn to_record(&self, id: SummitId) -> SummitRecord {
        SummitRecord {
            id: SurfaceNetwork::summit_label(id),
            spot: self.spot,
            edge: self.edge,
            plateau: self.plateau.clone(),
        }
    }

    /// Связи (`saddles`) восстанавливает контейнер по записям рёбер
    #[must_use]
    pub fn from_record(record: &SummitRecord) -> Self {
        Summit::new(record.spot, record.plateau.clone(), record.edge)
    }
}

impl Saddle {
    #[must_use]
    pub fn to_record(&self, id: SaddleId, network: &SurfaceNetwork) -> SaddleRecord {
        let label = |s: &SaddleId| network.saddle_label(*s);
        SaddleRecord {
            id: network.saddle_label(id),
            spot: self.spot,
            edge: self.edge,
            plateau: self.plateau.clone(),
            high_shores: self.high_shores.clone(),
            edge_points: self.edge_points.clone(),
            single_summit: self.single_summit,
            basin_saddle: self.basin_saddle,
            disqualified: self.disqualified_override,
            parent: self.parent.as_ref().map(label),
            children: self.children.iter().map(label).collect(),
            basin_saddle_alternatives: self.basin_saddle_alternatives.iter().map(label).collect(),
        }
    }

    /// Ссылки на другие седловины разрешаются через `ids`
    pub fn from_record(
        record: &SaddleRecord,
        kind: SaddleKind,
        ids: &FxHashMap<String, SaddleId>,
    ) -> Result<Self> {
        let resolve = |s: &String| {
            ids.get(s)
                .copied()
                .ok_or_else(|| SurfaceError::UnknownId(s.clone()))
        };
        let base = match kind {
            SaddleKind::Saddle => Saddle::new(record.spot, record.high_shores.clone()),
            SaddleKind::Runoff => Saddle::runoff(record.spot, record.high_shores.clone()),
        };
        Ok(Saddle {
            plateau: record.plateau.clone(),
            edge_points: record.edge_points.clone(),
            single_summit: record.single_summit,
            basin_saddle: record.basin_saddle,
            disqualified_override: record.disqualified,
            parent: record.parent.as_ref().map(resolve).transpose()?,
            children: record.children.iter().map(resolve).collect::<Result<_>>()?,
            basin_saddle_alternatives: record
                .basin_saddle_alternatives
                .iter()
                .map(resolve)
                .collect::<Result<_>>()?,
            ..base.with_edge(record.edge)
        })
    }
}

impl Linker {
    #[must_use]
    pub fn to_record(&self, network: &SurfaceNetwork) -> LinkerRecord {
        LinkerRecord {
            summit: SurfaceNetwork::summit_label(self.summit),
            saddle: network.saddle_label(self.saddle),
            disqualified: self.disqualified,
            path: self.path.clone(),
        }
    }
}

impl SurfaceNetwork {
    #[must_use]
    pub fn to_record(&self, map: &DataMap) -> NetworkRecord {
        let (runoffs, saddles): (Vec<_>, Vec<_>) = self
            .saddles
            .iter()
            .map(|(id, s)| (s.is_runoff(), s.to_record(id, self)))
            .partition(|(is_runoff, _)| *is_runoff);
        NetworkRecord {
            checksum: map.checksum(),
            summits: self.summits.iter().map(|(id, s)| s.to_record(id)).collect(),
            saddles: saddles.into_iter().map(|(_, r)| r).collect(),
            runoffs: runoffs.into_iter().map(|(_, r)| r).collect(),
            linkers: self.linkers.iter().map(|l| l.to_record(self)).collect(),
        }
    }

    /// Восстанавливает сеть из записи, проверяя, что она построена по этой карте
    pub fn from_record(record: &NetworkRecord, map: &DataMap) -> Result<Self> {
        let actual = map.checksum();
        if record.checksum != actual {
            return Err(SurfaceError::ChecksumMismatch {
                saved: record.checksum.clone(),
                actual,
            });
        }

        let mut network = SurfaceNetwork::new();

        let mut summit_ids: FxHashMap<String, SummitId> = FxHashMap::default();
        let mut summit_order = Vec::with_capacity(record.summits.len());
        for r in &record.summits {
            summit_order.push((parse_id(&r.id, FeatureKind::Summit)?, r));
        }
        summit_order.sort_by_key(|(n, _)| *n);
        for (_, r) in summit_order {
            let id = network
                .summits
                .append(Feature::Summit(Summit::from_record(r)))?;
            summit_ids.insert(r.id.clone(), id);
        }

        // Седловины и стоки делят одну арену: порядок восстанавливается по номеру id
        let mut saddle_order = Vec::with_capacity(record.saddles.len() + record.runoffs.len());
        for r in &record.saddles {
            saddle_order.push((parse_id(&r.id, FeatureKind::Saddle)?, SaddleKind::Saddle, r));
        }
        for r in &record.runoffs {
            saddle_order.push((parse_id(&r.id, FeatureKind::Runoff)?, SaddleKind::Runoff, r));
        }
        saddle_order.sort_by_key(|(n, _, _)| *n);
        let saddle_ids: FxHashMap<String, SaddleId> = saddle_order
            .iter()
            .enumerate()
            .map(|(i, (_, _, r))| (r.id.clone(), SaddleId(i as u32)))
            .collect();
        for (_, kind, r) in &saddle_order {
            let saddle = Saddle::from_record(r, *kind, &saddle_ids)?;
            network
                .saddles
                .append(Feature::Saddle(saddle), (*kind).into())?;
        }

        for r in &record.linkers {
            let summit = *summit_ids
                .get(&r.summit)
                .ok_or_else(|| SurfaceError::UnknownId(r.summit.clone()))?;
            let saddle = *saddle_ids
                .get(&r.saddle)
                .ok_or_else(|| SurfaceError::UnknownId(r.saddle.clone()))?;
            if let Some(id) = network.link(summit, saddle, r.path.clone()) {
                network.linkers[id.index()].disqualified = r.disqualified;
            }
        }

        Ok(network)
    }

    pub fn save_json(&self, map: &DataMap, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string(&self.to_record(map))?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn load_json(path: impl AsRef<Path>, map: &DataMap) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let record: NetworkRecord = serde_json::from_str(&contents)?;
        Self::from_record(&record, map)
    }
}
