// src/discovery/edge.rs
//! Разбор объектов, касающихся края карты
//!
//! За краем растра рельеф неизвестен, поэтому объект на границе может оказаться
//! седловиной, вторая половина которой обрезана. Такие места заменяются стоками
//! (`SaddleKind::Runoff`):
//!
//! - краевые клетки объекта группируются в связные участки границы;
//! - связные участки более низких клеток периметра на границе — кандидаты в выходы;
//! - участок объекта, зажатый ровно между двумя выходами, становится стоком.

use crate::datamap::DataMap;
use crate::discovery::FeatureShape;
use crate::feature::Saddle;
use crate::point::{GridPoint, closest_to, group_connected};

/// Участки объекта на границе карты, каждый упорядочен вдоль края по часовой стрелке
fn edge_neighborhoods(map: &DataMap, shape: &FeatureShape) -> Vec<Vec<GridPoint>> {
    let edge_points: Vec<GridPoint> = shape
        .members
        .iter()
        .copied()
        .filter(|p| map.is_map_edge(p.x, p.y))
        .collect();
    let mut hoods = group_connected(&edge_points, |_, _| true);
    for hood in &mut hoods {
        hood.sort_by_key(|p| map.boundary_position(p.x, p.y));
    }
    hoods
}

/// Связные участки более низкого периметра на границе карты.
///
/// Более высокие клетки границы разделяют участки, а не входят в них.
fn outlet_segments(map: &DataMap, shape: &FeatureShape) -> Vec<Vec<GridPoint>> {
    let lower: Vec<GridPoint> = shape
        .perimeter
        .iter()
        .copied()
        .filter(|p| map.is_map_edge(p.x, p.y) && p.elevation < shape.elevation)
        .collect();
    group_connected(&lower, |_, _| true)
}

fn middle(points: &[GridPoint]) -> Option<GridPoint> {
    points.get(points.len() / 2).copied()
}

/// Разбирает краевой объект. Возвращает стоки и седловину (если она есть)
/// в порядке добавления в арену.
pub(crate) fn analyze_edge(map: &DataMap, shape: &FeatureShape) -> Vec<Saddle> {
    let hoods = edge_neighborhoods(map, shape);

    if shape.high_shores.is_empty() {
        // Вершина, обрезанная краем: один сток без берегов
        let mut all: Vec<GridPoint> = hoods.into_iter().flatten().collect();
        all.sort_by_key(|p| map.boundary_position(p.x, p.y));
        let Some(mid) = middle(&all) else {
            return Vec::new();
        };
        return vec![Saddle::runoff(shape.spot(map, mid.coord()), Vec::new())];
    }

    let multi_shore = shape.high_shores.len() >= 2;
    let outlets = outlet_segments(map, shape);

    if outlets.len() <= 1 {
        if multi_shore {
            let mut saddle = shape.saddle(map).with_edge(true);
            saddle.edge_points = hoods.into_iter().flatten().collect();
            return vec![saddle];
        }
        return Vec::new();
    }

    let higher: Vec<GridPoint> = shape.high_shores.iter().flatten().copied().collect();
    let mut features = Vec::new();
    let mut unconverted = Vec::new();

    for hood in hoods {
        let adjacent = outlets
            .iter()
            .filter(|segment| segment.iter().any(|s| hood.iter().any(|h| h.touches(s))))
            .count();
        let Some(mid) = middle(&hood).filter(|_| adjacent == 2) else {
            unconverted.extend(hood);
            continue;
        };
        let shores = closest_to(&higher, mid.coord())
            .map(|p| vec![vec![*p]])
            .unwrap_or_default();
        features.push(Saddle::runoff(shape.spot(map, mid.coord()), shores));
    }

    if multi_shore {
        if unconverted.is_empty() {
            features.push(shape.saddle(map));
        } else {
            let mut saddle = shape.saddle(map).with_edge(true);
            saddle.edge_points = unconverted;
            features.push(saddle);
        }
    }
    features
}

#[cfg(test)]
mod tests {
    use crate::datamap::DataMap;
    use crate::discovery::FeatureShape;
    use crate::discovery::edge::{analyze_edge, outlet_segments};
    use crate::feature::SaddleKind;

    #[test]
    fn edge_cell_between_two_low_neighbors_becomes_runoff() {
        // (2, 0) выше соседей вдоль края, ниже двух отдельных гребней
        let map = DataMap::from_rows(vec![
            vec![1.0, 1.0, 5.0, 1.0, 1.0],
            vec![9.0, 1.0, 1.0, 1.0, 8.0],
            vec![9.0, 9.0, 1.0, 8.0, 8.0],
        ])
        .unwrap();
        let shape = FeatureShape::at(&map, 2, 0);
        assert!(shape.high_shores.is_empty());

        let features = analyze_edge(&map, &shape);
        assert_eq!(features.len(), 1);
        assert_eq!(features[0].kind, SaddleKind::Runoff);
        assert!(features[0].high_shores.is_empty());
    }

    #[test]
    fn flanked_edge_saddle_yields_runoff_and_plain_saddle() {
        let map = DataMap::from_rows(vec![
            vec![1.0, 4.0, 5.0, 4.0, 1.0],
            vec![1.0, 9.0, 2.0, 8.0, 1.0],
            vec![1.0, 9.0, 1.0, 8.0, 1.0],
        ])
        .unwrap();
        // (2, 0) = 5: вдоль края ниже (4 и 4), снизу два гребня (1, 1) = 9 и (3, 1) = 8
        let shape = FeatureShape::at(&map, 2, 0);
        assert_eq!(shape.high_shores.len(), 2);

        let features = analyze_edge(&map, &shape);
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].kind, SaddleKind::Runoff);
        assert_eq!(features[0].high_shores.len(), 1);
        assert_eq!(features[1].kind, SaddleKind::Saddle);
        assert!(!features[1].edge);
        assert_eq!(features[1].high_shores.len(), 2);
    }

    #[test]
    fn edge_saddle_without_outlets_keeps_edge_points() {
        let map = DataMap::from_rows(vec![
            vec![9.0, 5.0, 8.0],
            vec![9.0, 1.0, 1.0],
            vec![1.0, 1.0, 1.0],
        ])
        .unwrap();
        let shape = FeatureShape::at(&map, 1, 0);
        assert_eq!(shape.high_shores.len(), 2);

        let features = analyze_edge(&map, &shape);
        assert_eq!(features.len(), 1);
        assert!(features[0].edge);
        assert_eq!(features[0].kind, SaddleKind::Saddle);
        assert_eq!(features[0].edge_points.len(), 1);
    }

    #[test]
    fn partly_converted_edge_plateau_keeps_remaining_edge_points() {
        // плато 5: (1, 0) зажата выходами (0, 0) и (2, 0), участок (5, 0)–(6, 0)
        // касается только выхода (4, 0)
        let map = DataMap::from_rows(vec![
            vec![1.0, 5.0, 1.0, 9.0, 1.0, 5.0, 5.0, 9.0, 9.0],
            vec![9.0, 5.0, 5.0, 5.0, 5.0, 5.0, 9.0, 9.0, 9.0],
            vec![9.0, 9.0, 1.0, 1.0, 1.0, 9.0, 9.0, 9.0, 9.0],
            vec![0.0; 9],
        ])
        .unwrap();
        let shape = FeatureShape::at(&map, 1, 0);
        assert_eq!(shape.members.len(), 8);
        assert_eq!(shape.high_shores.len(), 3);

        let features = analyze_edge(&map, &shape);
        assert_eq!(features.len(), 2);

        let runoff = &features[0];
        assert_eq!(runoff.kind, SaddleKind::Runoff);
        assert_eq!(runoff.spot.coord(), (1, 0));
        assert_eq!(runoff.high_shores.len(), 1);
        assert_eq!(runoff.high_shores[0][0].coord(), (0, 1));

        let saddle = &features[1];
        assert_eq!(saddle.kind, SaddleKind::Saddle);
        assert!(saddle.edge);
        assert_eq!(saddle.high_shores.len(), 3);
        let edge_points: Vec<_> = saddle.edge_points.iter().map(|p| p.coord()).collect();
        assert_eq!(edge_points, vec![(5, 0), (6, 0)]);
    }

    #[test]
    fn higher_boundary_cells_split_outlets() {
        let map = DataMap::from_rows(vec![
            vec![1.0, 5.0, 1.0, 9.0, 1.0, 5.0, 5.0, 9.0, 9.0],
            vec![9.0, 5.0, 5.0, 5.0, 5.0, 5.0, 9.0, 9.0, 9.0],
            vec![9.0, 9.0, 1.0, 1.0, 1.0, 9.0, 9.0, 9.0, 9.0],
            vec![0.0; 9],
        ])
        .unwrap();
        let shape = FeatureShape::at(&map, 1, 0);
        let outlets = outlet_segments(&map, &shape);
        assert_eq!(outlets.len(), 3);
        assert!(outlets.iter().flatten().all(|p| p.elevation < 5.0));
    }
}
